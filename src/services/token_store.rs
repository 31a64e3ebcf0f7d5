//! # 토큰 스토어
//!
//! 여정 상태와 플래시 페이로드를 요청 간에 보존하는 key/value + TTL
//! 저장소입니다. 실제 배포에서는 분산 캐시가 이 자리를 차지하며,
//! 이 크레이트는 같은 계약의 SQLite 구현과 테스트용 메모리 구현을 둡니다.
//!
//! 키는 불투명한 문자열, 값은 JSON 직렬화된 페이로드입니다.
//! 서로 다른 키에 대한 동시 호출은 안전해야 하고, 같은 키에 대한 동시
//! 쓰기는 순서를 보장하지 않습니다 (last-writer-wins).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::db;
use crate::error::AppError;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// 키로 값을 조회합니다. 없거나 만료되었으면 `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// 값을 쓰고 만료를 현재 + `ttl_seconds`로 설정합니다 (upsert).
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), AppError>;

    /// 키를 삭제합니다. 없는 키여도 에러가 아닙니다.
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// SQLite 기반 토큰 스토어 (db::tokens에 위임)
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        db::tokens::get_token(&self.pool, key).await
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), AppError> {
        db::tokens::set_token(&self.pool, key, value, ttl_seconds).await
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        db::tokens::delete_token(&self.pool, key).await
    }
}

/// 테스트와 로컬 개발용 인메모리 토큰 스토어
#[derive(Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), AppError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds as i64);
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
