use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// 업스트림 인증 프록시가 채워 넣는 사용자 식별자 헤더.
/// 실제 자격 증명 검증은 이 애플리케이션 앞단의 책임입니다.
pub const AUTH_USERNAME_HEADER: &str = "x-auth-username";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(AUTH_USERNAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AuthError::MissingIdentity)?;

        Ok(AuthUser {
            username: username.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingIdentity,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "missing_identity",
                "An authenticated user identity is required",
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
