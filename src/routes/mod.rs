//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 라우터 조립을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `appointments`: 예약 생성 여정 (여정 엔진 전체 체인을 사용하는 기능)
//! - `health`: 서버 상태 확인 (헬스체크)
//!
//! 여정 스코프 라우트의 미들웨어 순서 (바깥 → 안):
//! 여정 식별자 검사 → 여정 데이터 적재/저장 → 빈 여정 가드 → 폼 검증 → 핸들러

pub mod appointments;
pub mod health;

use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::routing::get;
use axum::{middleware as mw, Router};

use crate::config::Config;
use crate::middleware::{journey_data, journey_id};
use crate::services::token_store::TokenStore;

/// 모든 핸들러가 공유하는 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TokenStore>,
    pub config: Config,
}

/// 전체 API 라우터를 조립합니다.
pub fn router(state: AppState) -> Router {
    let wizard = Router::new()
        .route("/{journey_id}/start", get(appointments::start))
        .merge(appointments::guarded_steps(state.clone()))
        .layer(mw::from_fn_with_state(state.clone(), journey_data::hydrate))
        // 마지막에 추가한 레이어가 가장 바깥입니다: 식별자 검사가 최우선
        .layer(mw::from_fn(|req: Request, next: Next| {
            journey_id::verify(appointments::CREATE_PREFIX, req, next)
        }));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/appointments", get(appointments::list))
        .nest("/appointments/create", wizard)
        .with_state(state)
}
