//! # 여정(Journey) 모델 정의
//!
//! 여정은 다단계 폼 위저드가 축적하는 상태입니다.
//! (사용자, 여정 이름, 여정 ID)로 스코프가 정해지며,
//! 내용은 문자열 키 → 임의의 직렬화 가능한 값의 불투명한 매핑입니다.
//!
//! ## 생명주기
//! 1. 첫 쓰기 시 암묵적으로 생성
//! 2. 단계를 소유한 핸들러만 해당 슬롯을 수정
//! 3. 명시적 비우기(`clear` 또는 null 쓰기) 혹은 토큰 스토어 TTL 만료로 소멸

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

/// 여정 본문: 최상위 슬롯 이름 → 단계별 조각(fragment)의 매핑
pub type JourneyData = Map<String, Value>;

/// 요청 스코프의 여정 핸들
///
/// `middleware::journey_data`가 요청마다 하나씩 request extension으로
/// 부착합니다. 핸들러는 이 핸들을 통해서만 여정을 읽고 씁니다.
/// 응답이 만들어진 뒤 같은 미들웨어가 최종 스냅샷을 토큰 스토어에 씁니다.
///
/// 내부는 `Option<JourneyData>`입니다: `None`은 "활성 여정 없음"을 뜻하며
/// 응답 후 토큰 삭제로 이어집니다.
#[derive(Debug, Clone, Default)]
pub struct JourneyHandle(Arc<Mutex<Option<JourneyData>>>);

impl JourneyHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰 스토어에서 읽어온 여정으로 교체합니다.
    /// 이전 미들웨어가 부착한 여정이 있어도 덮어씁니다.
    pub fn replace(&self, data: Option<JourneyData>) {
        *self.lock() = data;
    }

    /// 이름으로 슬롯 하나를 복제하여 반환합니다.
    pub fn get(&self, slot: &str) -> Option<Value> {
        self.lock().as_ref().and_then(|data| data.get(slot).cloned())
    }

    /// 슬롯에 값을 씁니다. 여정이 없으면 이 시점에 생성됩니다.
    /// `Value::Null`을 쓰면 해당 슬롯이 제거됩니다 (null 쓰기 = 비우기).
    pub fn put(&self, slot: &str, value: Value) {
        let mut guard = self.lock();
        let data = guard.get_or_insert_with(JourneyData::new);
        if value.is_null() {
            data.remove(slot);
        } else {
            data.insert(slot.to_string(), value);
        }
    }

    /// 여정 전체를 비웁니다. 응답 후 영속 토큰도 삭제됩니다.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// 현재 상태의 사본을 반환합니다 (지연 저장 태스크용).
    pub fn snapshot(&self) -> Option<JourneyData> {
        self.lock().clone()
    }

    /// 여정이 없거나 슬롯이 하나도 없으면 true
    pub fn is_empty(&self) -> bool {
        match self.lock().as_ref() {
            Some(data) => data.is_empty(),
            None => true,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JourneyData>> {
        // 락 보유 중 패닉한 스레드가 있어도 여정 상태는 복구해 계속 사용합니다
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 뷰 레이어(범위 밖)가 여정 필드를 바로 읽을 수 있도록
/// 여정의 최상위 키들을 복사해 두는 response extension
#[derive(Debug, Clone, Default)]
pub struct TemplateLocals(pub Map<String, Value>);
