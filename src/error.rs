//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 주의: 폼 검증 실패는 에러가 아닙니다. 검증 실패는 플래시 + 리다이렉트
//! 채널로만 보고되며 (`middleware::validation`), 이 타입을 거치지 않습니다.
//! 지연 저장 실패 역시 warn 로그 후 무시되므로 여기로 전파되지 않습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 에러 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수의 에러에 `?`를 쓰면 자동으로 이 variant로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON 직렬화/역직렬화 오류 (HTTP 500)
    /// 토큰 스토어의 여정 페이로드가 손상된 경우 등
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Database, Serialization, Internal)는 실제 에러 내용을
    /// 로그에만 기록하고, 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    "An internal error occurred".to_string(),
                )
            }
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
