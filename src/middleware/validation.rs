//! # 검증 미들웨어
//!
//! POST 요청의 본문으로 후보 객체를 만들어 라우트의 Schema로 검증합니다.
//!
//! 후보는 얕은 병합으로 구성됩니다 (뒤의 소스가 같은 키를 덮어씁니다):
//! 제출된 본문 → 경로 파라미터 → 쿼리 파라미터 → 라우트가 선언한
//! 여정 조각들. 어떤 조각을 병합할지는 라우트 등록 시 명시적으로
//! 전달합니다 — 검증기는 기능 이름을 하드코딩하지 않습니다.
//!
//! 결과:
//! - 에러 0개: 강제 변환이 반영된 후보를 `ValidatedBody` extension으로
//!   설치하고 체인을 계속합니다.
//! - 에러 1개 이상: `validationErrors`와 원본 본문(`formResponses`)을
//!   플래시로 저장한 뒤 Referer로 302 리다이렉트합니다 (Referer가 없으면
//!   설정된 폴백 경로). 핸들러는 실행되지 않습니다.

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::http::{header::REFERER, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{FlashPayload, JourneyHandle, ValidatedBody};
use crate::routes::AppState;
use crate::services::flash::FlashService;
use crate::services::validation::Schema;

use super::redirect_found;

/// 폼 본문 크기 상한. 다단계 폼 한 페이지 분량이면 충분합니다.
const BODY_LIMIT: usize = 256 * 1024;

pub async fn handle(
    state: AppState,
    schema: Schema,
    context_slots: &'static [&'static str],
    user: AuthUser,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::BadRequest("unreadable request body".to_string()).into_response()
        }
    };

    // 본문이 비었거나 JSON 객체가 아니면 빈 후보에서 시작합니다
    let raw_body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Object(Map::new()));
    let mut candidate = match raw_body.clone() {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if let Ok(params) = RawPathParams::from_request_parts(&mut parts, &state).await {
        for (name, value) in &params {
            candidate.insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    if let Some(query) = parts.uri.query() {
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            candidate.insert(name.into_owned(), Value::String(value.into_owned()));
        }
    }

    if let Some(journey) = parts.extensions.get::<JourneyHandle>() {
        for slot in context_slots {
            if let Some(fragment) = journey.get(slot) {
                candidate.insert((*slot).to_string(), fragment);
            }
        }
    }

    let errors = schema.validate(&mut candidate);

    if errors.is_empty() {
        parts.extensions.insert(ValidatedBody(Value::Object(candidate)));
        let req = Request::from_parts(parts, Body::from(bytes));
        return next.run(req).await;
    }

    let payload = FlashPayload {
        validation_errors: errors,
        form_responses: raw_body,
    };
    if let Err(e) = FlashService::new(state.store.clone()).set(&user.username, &payload).await {
        // 플래시를 잃으면 에러 재표시만 불가능할 뿐, 흐름은 계속됩니다
        tracing::warn!(user = %user.username, error = %e, "failed to flash validation errors");
    }

    let back = parts
        .headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(&state.config.journey_fallback_path);
    redirect_found(back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::middleware::auth::AUTH_USERNAME_HEADER;
    use crate::models::FieldError;
    use crate::services::token_store::MemoryTokenStore;
    use crate::services::validation::Rule;
    use axum::extract::State;
    use axum::http::{header::LOCATION, Request as HttpRequest, StatusCode};
    use axum::routing::post;
    use axum::{middleware, Extension, Json, Router};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_schema() -> Schema {
        Schema::new()
            .field("id", vec![Rule::not_empty("not empty")])
            .field(
                "child",
                vec![Rule::nested(
                    Schema::new().field("name", vec![Rule::not_empty("not empty")]),
                )],
            )
    }

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryTokenStore::new()),
            config: config::test_config(),
        }
    }

    fn app(state: AppState, journey: JourneyHandle) -> Router {
        async fn submit(Extension(ValidatedBody(body)): Extension<ValidatedBody>) -> Json<Value> {
            Json(body)
        }

        Router::new()
            .route("/submit", post(submit))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>,
                 user: AuthUser,
                 req: Request,
                 next: Next| {
                    handle(state, test_schema(), &["appointmentJourney"], user, req, next)
                },
            ))
            .layer(Extension(journey))
            .with_state(state)
    }

    async fn send_json(
        app: &Router,
        body: Value,
        referer: Option<&str>,
    ) -> axum::http::Response<Body> {
        let mut builder = HttpRequest::builder()
            .method(Method::POST)
            .uri("/submit")
            .header(AUTH_USERNAME_HEADER, "jsmith")
            .header("content-type", "application/json");
        if let Some(referer) = referer {
            builder = builder.header(REFERER, referer);
        }
        app.clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_reaches_the_handler_with_context_merged() {
        let journey = JourneyHandle::new();
        journey.put("appointmentJourney", json!({"name": "Chaplaincy"}));
        let app = app(state(), journey);

        let response =
            send_json(&app, json!({"id": "abc", "child": {"name": "ok"}}), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["id"], json!("abc"));
        assert_eq!(body["appointmentJourney"], json!({"name": "Chaplaincy"}));
    }

    #[tokio::test]
    async fn nested_failure_flashes_flattened_error_and_redirects_back() {
        let state = state();
        let store = state.store.clone();
        let app = app(state, JourneyHandle::new());

        let response = send_json(
            &app,
            json!({"id": "abc", "child": {"name": ""}}),
            Some("/appointments/create/x/details"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION],
            "/appointments/create/x/details"
        );

        let flash = FlashService::new(store).take("jsmith").await.unwrap().unwrap();
        assert_eq!(
            flash.validation_errors,
            vec![FieldError::new("child-name", "not empty")]
        );
        assert_eq!(
            flash.form_responses,
            json!({"id": "abc", "child": {"name": ""}})
        );
    }

    #[tokio::test]
    async fn top_level_failure_never_invokes_the_handler() {
        let app = app(state(), JourneyHandle::new());

        let response = send_json(
            &app,
            json!({"id": "", "child": {"name": "valid"}}),
            Some("/back"),
        )
        .await;

        // 핸들러가 실행됐다면 200과 JSON 본문이 왔을 것입니다
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn missing_referer_falls_back_to_configured_path() {
        let app = app(state(), JourneyHandle::new());

        let response = send_json(&app, json!({"id": ""}), None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/");
    }

    #[tokio::test]
    async fn get_requests_pass_through_untouched() {
        let journey = JourneyHandle::new();
        let state = state();

        let app = Router::new()
            .route("/submit", axum::routing::get(|| async { "page" }).post(
                |Extension(ValidatedBody(_)): Extension<ValidatedBody>| async { "posted" },
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                |State(state): State<AppState>,
                 user: AuthUser,
                 req: Request,
                 next: Next| {
                    handle(state, test_schema(), &[], user, req, next)
                },
            ))
            .layer(Extension(journey))
            .with_state(state);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/submit")
                    .header(AUTH_USERNAME_HEADER, "jsmith")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
