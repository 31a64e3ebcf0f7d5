//! # 플래시 채널
//!
//! 검증 실패 페이로드를 리다이렉트 너머의 다음 렌더링에 1회성으로 전달합니다.
//! 별도 세션 프레임워크 없이 토큰 스토어를 그대로 타며,
//! 키는 `flash.<username>`, TTL은 짧게 고정되어 있습니다.
//!
//! 쓰기는 리다이렉트 응답 전에 동기적으로 수행됩니다 — 바로 다음 GET이
//! 읽어야 하므로 여정 데이터처럼 지연 저장할 수 없습니다.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::FlashPayload;
use crate::services::token_store::TokenStore;

/// 읽히지 않은 플래시가 살아 있는 시간 (초)
const FLASH_TTL_SECONDS: u64 = 600;

fn flash_key(username: &str) -> String {
    format!("flash.{username}")
}

#[derive(Clone)]
pub struct FlashService {
    store: Arc<dyn TokenStore>,
}

impl FlashService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// 검증 실패 페이로드를 저장합니다. 기존 플래시는 덮어씁니다.
    pub async fn set(&self, username: &str, payload: &FlashPayload) -> Result<(), AppError> {
        let raw = serde_json::to_string(payload)?;
        self.store.set(&flash_key(username), &raw, FLASH_TTL_SECONDS).await
    }

    /// 플래시를 읽고 즉시 지웁니다 (1회성 채널).
    pub async fn take(&self, username: &str) -> Result<Option<FlashPayload>, AppError> {
        let key = flash_key(username);
        match self.store.get(&key).await? {
            Some(raw) => {
                self.store.delete(&key).await?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }
}
