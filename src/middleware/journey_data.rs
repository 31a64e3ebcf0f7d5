//! # 여정 데이터 미들웨어
//!
//! 여정 스코프 요청마다:
//! 1. `journey.<username>.<journeyId>` 토큰을 읽어 요청의 `JourneyHandle`에
//!    적재합니다 (이전 미들웨어가 부착한 여정이 있어도 덮어씁니다).
//!    최상위 키들은 `TemplateLocals`로도 복사되어 뷰가 바로 읽을 수 있습니다.
//! 2. 핸들러 체인을 실행합니다.
//! 3. 응답이 만들어진 뒤 최종 스냅샷을 fire-and-forget 태스크로 영속화합니다.
//!    비어 있으면 토큰 삭제, 아니면 TTL을 갱신하며 다시 쓰기.
//!
//! 영속화가 응답 경로 밖에서 일어나므로 지연이 체감 응답 시간에 더해지지
//! 않지만, 빠른 후속 요청이 아직 끝나지 않은 쓰기를 놓칠 수 있습니다
//! (잠금 없는 last-writer-wins, 수용된 위험).

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::middleware::auth::AuthUser;
use crate::models::{JourneyHandle, TemplateLocals};
use crate::routes::AppState;
use crate::services::journey_data::{JourneyDataService, DEFAULT_JOURNEY_ID};

pub async fn hydrate(
    State(state): State<AppState>,
    user: AuthUser,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Response {
    let journey_id = params
        .iter()
        .find(|(name, _)| *name == "journey_id")
        .map(|(_, value)| value.to_string())
        .unwrap_or_else(|| DEFAULT_JOURNEY_ID.to_string());

    let service = JourneyDataService::new(state.store.clone(), state.config.journey_ttl_seconds());

    let journey = req
        .extensions()
        .get::<JourneyHandle>()
        .cloned()
        .unwrap_or_default();

    match service.load(&user.username, &journey_id).await {
        Ok(Some(data)) => {
            req.extensions_mut().insert(TemplateLocals(data.clone()));
            journey.replace(Some(data));
        }
        // 토큰이 없으면 이미 부착된(혹은 빈) 여정을 그대로 씁니다
        Ok(None) => {
            req.extensions_mut().insert(TemplateLocals::default());
        }
        Err(e) => {
            tracing::warn!(user = %user.username, error = %e, "failed to load journey data");
            req.extensions_mut().insert(TemplateLocals::default());
        }
    }
    req.extensions_mut().insert(journey.clone());

    let response = next.run(req).await;

    // 응답 경로 밖에서의 지연 영속화
    let snapshot = journey.snapshot();
    let username = user.username;
    tokio::spawn(async move {
        service.commit(&username, &journey_id, snapshot).await;
    });

    response
}
