//! # 여정 식별자 미들웨어
//!
//! 여정 스코프 라우트의 URL에는 설정된 프리픽스 바로 뒤에 유효한 UUID
//! 경로 세그먼트가 있어야 합니다. 없거나 형식이 틀리면 새 UUID(v4)를
//! 그 자리에 끼워 넣은 URL로 302 리다이렉트하고, 그 요청 사이클에서는
//! 핸들러를 실행하지 않습니다.
//!
//! 리다이렉트는 프리픽스 뒤에 `<uuid>/`를 삽입할 뿐, 기존의 나머지 경로
//! (단계 이름 등)는 그대로 보존합니다. 따라서 `/appointments/create/start`는
//! `/appointments/create/<uuid>/start`가 되어 두 번째 요청에서 통과합니다.

use axum::extract::{OriginalUri, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use super::redirect_found;

/// 세그먼트가 하이픈 형식의 UUID인지 검사합니다 (버전 무관).
///
/// `Uuid::try_parse`는 하이픈 없는 32자 형식 등도 받아들이므로
/// 길이 36을 함께 요구해 `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`
/// 형식만 통과시킵니다.
pub fn is_journey_id(segment: &str) -> bool {
    segment.len() == 36 && Uuid::try_parse(segment).is_ok()
}

/// 프리픽스 뒤 세그먼트를 검사하고, UUID가 아니면 삽입 후 리다이렉트합니다.
///
/// `prefix`는 `/`로 끝나는 경로 조각이어야 합니다 (예: "/appointments/create/").
/// 프리픽스가 경로에 없으면 설정 오류로 보고 그대로 통과시킵니다.
pub async fn verify(prefix: &'static str, req: Request, next: Next) -> Response {
    // 중첩 라우터 안에서는 req.uri()가 프리픽스를 잃으므로 원본 URI를 씁니다
    let original = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.0.clone())
        .unwrap_or_else(|| req.uri().clone());
    let path = original.path();

    let Some(index) = path.find(prefix) else {
        return next.run(req).await;
    };

    let rest = &path[index + prefix.len()..];
    let segment = rest.split('/').next().unwrap_or("");
    if is_journey_id(segment) {
        return next.run(req).await;
    }

    let mut location = format!(
        "{}{}/{}",
        &path[..index + prefix.len()],
        Uuid::new_v4(),
        rest
    );
    if let Some(query) = original.query() {
        location.push('?');
        location.push_str(query);
    }

    tracing::debug!(from = %original, to = %location, "inserting journey identifier");
    redirect_found(&location)
}
