//! # 미들웨어 모듈
//!
//! 여정 스코프 라우트의 요청 처리 체인을 이루는 미들웨어들입니다.
//! 바깥쪽부터 안쪽 순서로:
//!
//! 1. `journey_id` — URL의 여정 식별자(UUID) 보장
//! 2. `journey_data` — 토큰 스토어에서 여정 상태 적재 + 응답 후 지연 저장
//! 3. `journey_guard` — 활성 여정이 없는 단계 접근 차단
//! 4. `validation` — POST 본문 검증, 실패 시 플래시 + 리다이렉트
//!
//! `auth`는 업스트림 프록시가 인증한 사용자 식별자를 꺼내는 extractor입니다.

pub mod auth;
pub mod journey_data;
pub mod journey_guard;
pub mod journey_id;
pub mod validation;

use axum::body::Body;
use axum::http::{header::LOCATION, StatusCode};
use axum::response::{IntoResponse, Response};

/// `302 Found` 리다이렉트 응답을 만듭니다.
///
/// `axum::response::Redirect`는 303/307/308만 제공하는데, 이 엔진의 HTTP
/// 계약은 전통적인 폼 흐름 그대로 302입니다.
pub fn redirect_found(location: &str) -> Response {
    match Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location)
        .body(Body::empty())
    {
        Ok(response) => response,
        // location이 헤더 값으로 쓸 수 없는 문자열이면 루트로 돌려보냅니다
        Err(_) => (StatusCode::FOUND, [(LOCATION, "/")]).into_response(),
    }
}
