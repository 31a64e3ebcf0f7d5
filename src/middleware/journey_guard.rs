//! # 빈 여정 가드
//!
//! 활성 여정 없이는 의미가 없는 단계(확인 페이지 등)를 보호하는
//! 순수 전제조건 검사입니다. 아무것도 수정하지 않습니다.
//!
//! 요청에 적재된 여정 상태(`JourneyHandle`)에서 이름으로 슬롯을 찾고,
//! 단계가 여정을 요구하는데 슬롯이 없거나 falsy면 지정된 폴백 경로로
//! 302 리다이렉트하며 핸들러를 호출하지 않습니다.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

use crate::models::JourneyHandle;

use super::redirect_found;

/// null / false / 빈 문자열은 활성 여정으로 치지 않습니다.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// `slot` 이름의 여정 조각이 있어야 통과하는 가드.
///
/// `requires_journey`가 false인 단계는 무조건 통과합니다.
/// `fallback`은 기능별 랜딩 페이지(없으면 애플리케이션 루트)입니다.
pub async fn require(
    slot: &str,
    requires_journey: bool,
    fallback: &str,
    req: Request,
    next: Next,
) -> Response {
    if !requires_journey {
        return next.run(req).await;
    }

    let active = req
        .extensions()
        .get::<JourneyHandle>()
        .and_then(|journey| journey.get(slot))
        .is_some_and(|value| is_truthy(&value));

    if active {
        next.run(req).await
    } else {
        tracing::debug!(slot = %slot, to = %fallback, "no active journey, redirecting");
        redirect_found(fallback)
    }
}
