//! # 여정 데이터 서비스
//!
//! 여정 상태를 토큰 스토어에 싣고 내리는 계층입니다.
//!
//! ## 토큰 키 형식
//! `journey.<username>.<journeyId>` — journeyId가 URL에 없으면 `"default"`.
//!
//! ## 커밋 의미론
//! `commit`은 응답이 클라이언트로 나간 뒤 실행되는 fire-and-forget 단계입니다.
//! 여정이 비었으면 토큰을 삭제하고, 남아 있으면 TTL을 갱신하며 다시 씁니다.
//! 쓰기 실패는 warn 로그 후 무시됩니다 — 응답은 이미 전송되었으므로
//! 실패를 요청에 반영할 방법이 없고, 다음 요청에서 진행 상태가 일부
//! 유실될 수 있다는 것이 수용된 위험입니다.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::error::AppError;
use crate::models::JourneyData;
use crate::services::token_store::TokenStore;

/// URL에 journeyId 경로 파라미터가 없을 때 쓰는 기본값
pub const DEFAULT_JOURNEY_ID: &str = "default";

/// (사용자, 여정 ID) 스코프의 토큰 키를 만듭니다.
pub fn journey_key(username: &str, journey_id: &str) -> String {
    format!("journey.{username}.{journey_id}")
}

#[derive(Clone)]
pub struct JourneyDataService {
    store: Arc<dyn TokenStore>,
    ttl_seconds: u64,
}

impl JourneyDataService {
    pub fn new(store: Arc<dyn TokenStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    /// 저장된 여정을 읽어 파싱합니다. 토큰이 없으면 `None`.
    pub async fn load(
        &self,
        username: &str,
        journey_id: &str,
    ) -> Result<Option<JourneyData>, AppError> {
        let key = journey_key(username, journey_id);
        match self.store.get(&key).await? {
            Some(raw) => {
                let value: Value = serde_json::from_str(&raw)?;
                match value {
                    Value::Object(map) => Ok(Some(map)),
                    // 객체가 아닌 페이로드는 손상으로 간주하고 버립니다
                    _ => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// 여정을 직렬화해 쓰고 TTL을 갱신합니다.
    pub async fn save(
        &self,
        username: &str,
        journey_id: &str,
        data: &JourneyData,
    ) -> Result<(), AppError> {
        let key = journey_key(username, journey_id);
        let raw = serde_json::to_string(data)?;
        self.store.set(&key, &raw, self.ttl_seconds).await
    }

    pub async fn delete(&self, username: &str, journey_id: &str) -> Result<(), AppError> {
        let key = journey_key(username, journey_id);
        self.store.delete(&key).await
    }

    /// 응답 종료 후의 영속화 단계.
    ///
    /// 비어 있으면 삭제, 아니면 저장. 실패는 warn 로그 후 무시하고,
    /// 소요 시간은 debug 레벨로 남깁니다.
    pub async fn commit(&self, username: &str, journey_id: &str, snapshot: Option<JourneyData>) {
        let started = Instant::now();

        let result = match snapshot {
            Some(ref data) if !data.is_empty() => self.save(username, journey_id, data).await,
            _ => self.delete(username, journey_id).await,
        };

        match result {
            Ok(()) => tracing::debug!(
                user = %username,
                journey_id = %journey_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "journey data committed"
            ),
            Err(e) => tracing::warn!(
                user = %username,
                journey_id = %journey_id,
                error = %e,
                "failed to persist journey data"
            ),
        }
    }
}
