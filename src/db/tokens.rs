//! # 토큰 스토어 데이터베이스 쿼리 모듈
//!
//! Redis 유사 key/value 캐시의 SQLite 구현을 받치는 SQL 쿼리 함수들입니다.
//! 값은 JSON 직렬화된 여정 페이로드이고, 키는 불투명한 문자열입니다.
//!
//! ## 만료 처리
//! `expires_at`은 RFC3339 UTC 문자열입니다. 같은 포맷끼리는 사전순 비교가
//! 시간순 비교와 일치하므로, 조회 시 현재 시각 문자열과 비교하는 것만으로
//! 만료된 행을 걸러냅니다. 만료된 행은 조회 시 결코 반환되지 않으며,
//! 실제 삭제는 다음 upsert 또는 `purge_expired`가 수행합니다.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;

/// 키로 토큰 값을 조회합니다. 없거나 만료되었으면 `None`을 반환합니다.
pub async fn get_token(pool: &SqlitePool, key: &str) -> Result<Option<String>, AppError> {
    let now = Utc::now().to_rfc3339();

    let value: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT value
        FROM tokens
        WHERE token_key = ? AND expires_at > ?
        "#,
    )
    .bind(key)
    .bind(&now)
    .fetch_optional(pool)
    .await?;

    Ok(value.map(|(v,)| v))
}

/// 토큰을 upsert하고 만료 시각을 현재 + `ttl_seconds`로 갱신합니다.
///
/// 살아 있는 여정을 가진 응답마다 호출되므로 토큰 수명은 쓰기 때마다
/// 연장됩니다 (sliding expiry).
pub async fn set_token(
    pool: &SqlitePool,
    key: &str,
    value: &str,
    ttl_seconds: u64,
) -> Result<(), AppError> {
    let expires_at = (Utc::now() + Duration::seconds(ttl_seconds as i64)).to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO tokens (token_key, value, expires_at)
        VALUES (?, ?, ?)
        ON CONFLICT (token_key) DO UPDATE SET
            value = excluded.value,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(&expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// 키로 토큰을 삭제합니다. 없는 키를 삭제해도 에러가 아닙니다.
pub async fn delete_token(pool: &SqlitePool, key: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM tokens WHERE token_key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}

/// 만료된 행을 일괄 삭제하고 삭제한 행 수를 반환합니다.
/// 조회 경로는 만료 행을 이미 걸러내므로 주기적 정리 용도입니다.
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, AppError> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= ?")
        .bind(&now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
