//! # 예약(Appointment) 여정 라우트 핸들러
//!
//! 여정 엔진 전체 체인을 사용하는 다단계 예약 생성 위저드입니다.
//! 핸들러 자체는 얇게 유지됩니다 — 세션/여정 상태와 외부 협력자 사이에서
//! 데이터를 옮길 뿐, 실질 로직은 미들웨어와 서비스 계층에 있습니다.
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /appointments | 예약 목록 (페이지 윈도우 포함) |
//! | GET | /appointments/create/{id}/start | 여정 시작 |
//! | GET/POST | /appointments/create/{id}/details | 이름/분류/주관자 입력 |
//! | GET/POST | /appointments/create/{id}/schedule | 일정/인원 입력 |
//! | GET/POST | /appointments/create/{id}/check-answers | 확인 및 제출 |
//!
//! start를 제외한 모든 단계는 활성 여정을 요구하며, 없으면
//! `/appointments`로 돌려보냅니다.

use axum::extract::{OriginalUri, Path, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::{self as mw, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::middleware::{journey_guard, redirect_found, validation as validation_mw};
use crate::models::{JourneyHandle, ValidatedBody};
use crate::routes::AppState;
use crate::services::flash::FlashService;
use crate::services::pagination::paginate;
use crate::services::validation::{Rule, Schema};

/// 여정 식별자 미들웨어가 감시하는 라우트 프리픽스
pub const CREATE_PREFIX: &str = "/appointments/create/";

/// 이 기능이 여정 데이터에서 쓰는 슬롯 이름
const APPOINTMENT_JOURNEY: &str = "appointmentJourney";

/// 활성 여정 없이 단계에 접근했을 때의 기능별 랜딩 페이지
const LANDING_PATH: &str = "/appointments";

/// 목록 페이지 크기
const PAGE_SIZE: u64 = 10;

const CATEGORIES: [&str; 4] = ["CHAPLAINCY", "EDUCATION", "GYM_SPORTS", "MEDICAL"];

// ── 라우터 조립 ──

/// start 이후의 보호된 단계들 (가드 + 단계별 검증)
pub fn guarded_steps(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/{journey_id}/details",
            get(details_page)
                .post(submit_details)
                .layer(mw::from_fn_with_state(state.clone(), validate_details)),
        )
        .route(
            "/{journey_id}/schedule",
            get(schedule_page)
                .post(submit_schedule)
                .layer(mw::from_fn_with_state(state.clone(), validate_schedule)),
        )
        .route(
            "/{journey_id}/check-answers",
            get(check_answers_page).post(confirm),
        )
        .route_layer(mw::from_fn(guard))
}

async fn guard(req: Request, next: Next) -> Response {
    journey_guard::require(APPOINTMENT_JOURNEY, true, LANDING_PATH, req, next).await
}

// ── 검증 스키마 ──

fn details_schema() -> Schema {
    Schema::new()
        .field("name", vec![Rule::not_empty("Enter a name for the appointment")])
        .field(
            "category",
            vec![
                Rule::not_empty("Select a category"),
                Rule::is_in(CATEGORIES, "Select a category from the list"),
            ],
        )
        .field(
            "host",
            vec![Rule::nested(
                Schema::new()
                    .field("name", vec![Rule::not_empty("Enter the host's name")])
                    .field(
                        "email",
                        vec![
                            Rule::not_empty("Enter the host's email address"),
                            Rule::length(None, Some(100), "Email must be 100 characters or less"),
                        ],
                    ),
            )],
        )
}

fn schedule_schema(max_instances: u64) -> Schema {
    Schema::new()
        .field("date", vec![Rule::not_empty("Enter a date for the appointment")])
        .field(
            "attendees",
            vec![Rule::number(Some(1.0), None, "Enter how many people are attending")],
        )
        .field(
            "repeat_count",
            vec![
                Rule::number(Some(1.0), None, "Enter how many times the appointment repeats"),
                // 참석자 수 × 반복 횟수 상한 (일괄 예약 폭주 방지)
                Rule::check(
                    move |value, candidate| {
                        let repeats = value.as_f64().unwrap_or(0.0);
                        let attendees = candidate
                            .get("attendees")
                            .and_then(Value::as_f64)
                            .unwrap_or(0.0);
                        attendees * repeats <= max_instances as f64
                    },
                    format!("You cannot schedule more than {max_instances} appointment instances"),
                ),
            ],
        )
}

async fn validate_details(
    State(state): State<AppState>,
    user: AuthUser,
    req: Request,
    next: Next,
) -> Response {
    validation_mw::handle(state, details_schema(), &[], user, req, next).await
}

async fn validate_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    req: Request,
    next: Next,
) -> Response {
    let schema = schedule_schema(state.config.max_schedule_instances);
    validation_mw::handle(state, schema, &[APPOINTMENT_JOURNEY], user, req, next).await
}

// ── 위저드 단계 핸들러 ──

/// `GET /appointments/create/{id}/start` — 빈 여정 조각을 만들고 첫 단계로
pub async fn start(
    Path(journey_id): Path<String>,
    Extension(journey): Extension<JourneyHandle>,
) -> Response {
    journey.put(APPOINTMENT_JOURNEY, json!({}));
    redirect_found(&format!("{CREATE_PREFIX}{journey_id}/details"))
}

/// 단계 렌더링용 공통 응답: 현재 여정 조각 + 플래시(있다면)
async fn step_view(
    state: &AppState,
    user: &AuthUser,
    journey: &JourneyHandle,
) -> Result<Json<Value>, AppError> {
    let flash = FlashService::new(state.store.clone()).take(&user.username).await?;
    Ok(Json(json!({
        "appointmentJourney": journey.get(APPOINTMENT_JOURNEY),
        "validationErrors": flash.as_ref().map(|f| f.validation_errors.clone()),
        "formResponses": flash.map(|f| f.form_responses),
    })))
}

pub async fn details_page(
    State(state): State<AppState>,
    user: AuthUser,
    Extension(journey): Extension<JourneyHandle>,
) -> Result<Json<Value>, AppError> {
    step_view(&state, &user, &journey).await
}

pub async fn submit_details(
    Path(journey_id): Path<String>,
    Extension(journey): Extension<JourneyHandle>,
    Extension(ValidatedBody(body)): Extension<ValidatedBody>,
) -> Response {
    merge_into_journey(&journey, &body, &["name", "category", "host"]);
    redirect_found(&format!("{CREATE_PREFIX}{journey_id}/schedule"))
}

pub async fn schedule_page(
    State(state): State<AppState>,
    user: AuthUser,
    Extension(journey): Extension<JourneyHandle>,
) -> Result<Json<Value>, AppError> {
    step_view(&state, &user, &journey).await
}

pub async fn submit_schedule(
    Path(journey_id): Path<String>,
    Extension(journey): Extension<JourneyHandle>,
    Extension(ValidatedBody(body)): Extension<ValidatedBody>,
) -> Response {
    merge_into_journey(&journey, &body, &["date", "attendees", "repeat_count"]);
    redirect_found(&format!("{CREATE_PREFIX}{journey_id}/check-answers"))
}

pub async fn check_answers_page(
    Extension(journey): Extension<JourneyHandle>,
) -> Json<Value> {
    Json(json!({
        "appointmentJourney": journey.get(APPOINTMENT_JOURNEY),
    }))
}

/// `POST .../check-answers` — 예약 확정.
///
/// 실제 예약 생성은 외부 activities API 호출(범위 밖)이고,
/// 이 계층의 몫은 여정을 비워 토큰이 삭제되게 하는 것입니다.
pub async fn confirm(Extension(journey): Extension<JourneyHandle>) -> Response {
    journey.clear();
    redirect_found(LANDING_PATH)
}

/// 검증된 본문에서 이 단계 소유의 키만 여정 조각으로 복사합니다.
fn merge_into_journey(journey: &JourneyHandle, body: &Value, keys: &[&str]) {
    let mut fragment = journey.get(APPOINTMENT_JOURNEY).unwrap_or_else(|| json!({}));
    if let (Some(fragment), Some(body)) = (fragment.as_object_mut(), body.as_object()) {
        for key in keys {
            if let Some(value) = body.get(*key) {
                fragment.insert((*key).to_string(), value.clone());
            }
        }
    }
    journey.put(APPOINTMENT_JOURNEY, fragment);
}

// ── 목록 ──

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: u64,
}

/// `GET /appointments?page=N` — 예약 검색 결과와 페이지 윈도우
pub async fn list(
    _user: AuthUser,
    Query(query): Query<ListQuery>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let (total, results) = search_results(query.page);

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let base_url = Url::parse(&format!("http://{host}{uri}"))
        .map_err(|e| AppError::Internal(format!("cannot build pagination base url: {e}")))?;

    Ok(Json(json!({
        "results": results,
        "pagination": paginate(total, query.page, PAGE_SIZE, &base_url),
    })))
}

/// 외부 activities API의 검색 응답을 대신하는 스텁.
/// 실제 연동은 이 크레이트 바깥의 협력자입니다.
fn search_results(page: u64) -> (u64, Vec<Value>) {
    let total: u64 = 42;
    let from = (page * PAGE_SIZE).min(total);
    let to = (from + PAGE_SIZE).min(total);
    let results = (from..to)
        .map(|i| json!({"id": i + 1, "summary": format!("Appointment {}", i + 1)}))
        .collect();
    (total, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::middleware::auth::AUTH_USERNAME_HEADER;
    use crate::middleware::journey_id::is_journey_id;
    use crate::routes::router;
    use crate::services::journey_data::journey_key;
    use crate::services::token_store::{MemoryTokenStore, TokenStore};
    use axum::body::Body;
    use axum::http::{header::LOCATION, header::REFERER, Method, Request as HttpRequest, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryTokenStore::new()),
            config: config::test_config(),
        }
    }

    async fn send(
        app: &axum::Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::http::Response<Body> {
        let mut builder = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(AUTH_USERNAME_HEADER, "jsmith")
            .header(REFERER, uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        app.clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &axum::http::Response<Body>) -> String {
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    /// 지연 저장 태스크가 여정 토큰을 기대 상태로 쓸 때까지 기다립니다.
    /// 토큰은 앞 단계에서 이미 존재할 수 있으므로 존재 여부가 아니라
    /// 내용으로 판정해야 합니다.
    async fn wait_for_token(
        store: &Arc<dyn TokenStore>,
        key: &str,
        pred: impl Fn(Option<&str>) -> bool,
    ) {
        for _ in 0..100 {
            let value = store.get(key).await.unwrap();
            if pred(value.as_deref()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("journey token never reached the expected state");
    }

    #[tokio::test]
    async fn full_wizard_happy_path() {
        let state = state();
        let store = state.store.clone();
        let app = router(state);

        // 식별자 없는 진입은 UUID를 끼워 넣은 URL로 교정됩니다
        let response = send(&app, Method::GET, "/appointments/create/start", None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let start_url = location(&response);
        let journey_id = start_url
            .strip_prefix(CREATE_PREFIX)
            .and_then(|rest| rest.split('/').next())
            .unwrap()
            .to_string();
        assert!(is_journey_id(&journey_id));

        // start: 여정 생성 후 details로
        let response = send(&app, Method::GET, &start_url, None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let details_url = location(&response);
        assert!(details_url.ends_with("/details"));

        let key = journey_key("jsmith", &journey_id);
        wait_for_token(&store, &key, |v| v.is_some()).await;

        // details 제출 → schedule로
        let response = send(
            &app,
            Method::POST,
            &details_url,
            Some(json!({
                "name": "Chaplaincy",
                "category": "CHAPLAINCY",
                "host": {"name": "J. Doe", "email": "chaplain@example.gov"}
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let schedule_url = location(&response);
        assert!(schedule_url.ends_with("/schedule"));
        wait_for_token(&store, &key, |v| v.is_some_and(|s| s.contains("Chaplaincy"))).await;

        // schedule 제출 (문자열 숫자가 강제 변환됩니다) → check-answers로
        let response = send(
            &app,
            Method::POST,
            &schedule_url,
            Some(json!({"date": "2026-09-01", "attendees": "4", "repeat_count": "2"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let check_url = location(&response);
        assert!(check_url.ends_with("/check-answers"));
        wait_for_token(&store, &key, |v| v.is_some_and(|s| s.contains("attendees"))).await;

        // 확인 페이지에 누적된 여정이 보입니다
        let response = send(&app, Method::GET, &check_url, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 8192).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["appointmentJourney"]["name"], json!("Chaplaincy"));
        assert_eq!(value["appointmentJourney"]["attendees"], json!(4.0));

        // 확정: 여정이 비워지고 토큰이 삭제됩니다
        let response = send(&app, Method::POST, &check_url, None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/appointments");
        wait_for_token(&store, &key, |v| v.is_none()).await;
    }

    #[tokio::test]
    async fn steps_without_a_journey_redirect_to_landing() {
        let app = router(state());
        let id = uuid::Uuid::new_v4();

        let response = send(
            &app,
            Method::GET,
            &format!("{CREATE_PREFIX}{id}/check-answers"),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), "/appointments");
    }

    #[tokio::test]
    async fn invalid_details_flash_and_redirect_back() {
        let state = state();
        let store = state.store.clone();
        let app = router(state);

        // start로 여정을 만들어 가드를 통과시킵니다
        let response = send(&app, Method::GET, "/appointments/create/start", None).await;
        let start_url = location(&response);
        let response = send(&app, Method::GET, &start_url, None).await;
        let details_url = location(&response);
        let journey_id = start_url
            .strip_prefix(CREATE_PREFIX)
            .and_then(|rest| rest.split('/').next())
            .unwrap();
        wait_for_token(&store, &journey_key("jsmith", journey_id), |v| v.is_some()).await;

        let response = send(
            &app,
            Method::POST,
            &details_url,
            Some(json!({
                "name": "Chaplaincy",
                "category": "CHAPLAINCY",
                "host": {"name": "J. Doe", "email": ""}
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), details_url);

        let flash = FlashService::new(store).take("jsmith").await.unwrap().unwrap();
        assert_eq!(flash.validation_errors.len(), 1);
        assert_eq!(flash.validation_errors[0].field, "host-email");
    }

    #[tokio::test]
    async fn schedule_rejects_too_many_instances() {
        let state = state();
        let store = state.store.clone();
        let app = router(state);

        let response = send(&app, Method::GET, "/appointments/create/start", None).await;
        let start_url = location(&response);
        let response = send(&app, Method::GET, &start_url, None).await;
        let journey_id = start_url
            .strip_prefix(CREATE_PREFIX)
            .and_then(|rest| rest.split('/').next())
            .unwrap()
            .to_string();
        assert_eq!(response.status(), StatusCode::FOUND);
        wait_for_token(&store, &journey_key("jsmith", &journey_id), |v| v.is_some()).await;

        let schedule_url = format!("{CREATE_PREFIX}{journey_id}/schedule");
        let response = send(
            &app,
            Method::POST,
            &schedule_url,
            Some(json!({"date": "2026-09-01", "attendees": 500, "repeat_count": 50})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let flash = FlashService::new(store).take("jsmith").await.unwrap().unwrap();
        assert_eq!(flash.validation_errors[0].field, "repeat_count");
        assert!(flash.validation_errors[0].message.contains("20000"));
    }

    #[tokio::test]
    async fn listing_includes_pagination_window() {
        let app = router(state());

        let response = send(&app, Method::GET, "/appointments?page=1", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 16384).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["results"].as_array().unwrap().len(), 10);
        assert_eq!(value["pagination"]["results"]["count"], json!(42));
        assert_eq!(value["pagination"]["items"].as_array().unwrap().len(), 5);
    }
}
