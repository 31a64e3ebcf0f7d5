use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 평탄화된 필드 검증 에러 하나
///
/// 중첩 객체에서 실패하면 `field`는 루트부터 실패한 말단 속성까지의 경로를
/// `-`로 이어붙인 값입니다 (예: `host-email`). 부모 객체 자체는 에러를
/// 내지 않고 자식의 에러만 전파됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 검증을 통과한 후보 객체
///
/// 검증 미들웨어가 성공 시 request extension으로 설치하며,
/// 핸들러는 원본 본문 대신 이 값을 입력으로 사용합니다
/// (숫자 강제 변환 결과가 반영된 상태).
#[derive(Debug, Clone)]
pub struct ValidatedBody(pub Value);

/// 검증 실패 시 다음 페이지로 전달되는 플래시 페이로드
///
/// `validationErrors`는 인라인 에러 표시용, `formResponses`는 사용자가
/// 제출한 값을 그대로 다시 채워 넣기 위한 원본 본문입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashPayload {
    pub validation_errors: Vec<FieldError>,
    pub form_responses: Value,
}
