//! # 검증 엔진
//!
//! 후보(candidate) 객체를 선언적 규칙 테이블(Schema)로 검증합니다.
//!
//! ## 의미론
//! - 필드는 선언된 순서대로, 필드의 규칙도 선언된 순서대로 평가합니다.
//! - 한 필드에서 여러 규칙이 실패하면 마지막으로 실패한 규칙의 메시지가
//!   이깁니다 (가장 구체적인 제약이 나중에 선언된다는 관례).
//! - 실패한 말단 필드마다 에러는 정확히 하나씩 나옵니다.
//! - 중첩 객체 필드는 `Nested` 규칙으로 재귀하며, 경로는 `-`로 이어붙입니다.
//!   자식이 실패해도 부모 객체 자체는 에러를 내지 않습니다.
//! - 후보에 있지만 Schema에 없는 필드는 무시합니다 (거부하지 않음).
//! - 숫자 규칙은 문자열을 숫자로 강제 변환(coerce)하며, 변환 실패는
//!   해당 필드의 검증 실패일 뿐 패닉이나 에러 전파가 아닙니다.
//!   변환에 성공하면 후보의 값이 숫자로 교체되므로, 이미 검증을 통과한
//!   후보를 다시 검증해도 결과가 같습니다 (멱등).

use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::models::FieldError;

/// 후보 객체 타입 별칭 (요청 본문 + 컨텍스트 조각의 얕은 병합 결과)
pub type Candidate = Map<String, Value>;

/// 필드 하나에 적용되는 검증 규칙
#[derive(Clone)]
pub enum Rule {
    /// 값이 없거나(null/누락) 빈 문자열이면 실패
    NotEmpty { message: String },
    /// 열거된 값 중 하나가 아니면 실패
    IsIn { allowed: Vec<String>, message: String },
    /// 숫자가 아니거나 범위를 벗어나면 실패. 문자열은 숫자로 강제 변환.
    IsNumber {
        min: Option<f64>,
        max: Option<f64>,
        message: String,
    },
    /// 문자열 길이(문자 수)가 범위를 벗어나면 실패
    Length {
        min: Option<usize>,
        max: Option<usize>,
        message: String,
    },
    /// 다른 필드와 값이 같지 않으면 실패 (교차 필드 비교)
    MatchesField { other: String, message: String },
    /// 후보 전체를 보는 임의 술어. false를 반환하면 실패.
    Check {
        test: Arc<dyn Fn(&Value, &Candidate) -> bool + Send + Sync>,
        message: String,
    },
    /// 객체 값 필드를 하위 Schema로 위임
    Nested { schema: Arc<Schema> },
}

impl Rule {
    pub fn not_empty(message: impl Into<String>) -> Self {
        Rule::NotEmpty { message: message.into() }
    }

    pub fn is_in<I, S>(allowed: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::IsIn {
            allowed: allowed.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    pub fn number(min: Option<f64>, max: Option<f64>, message: impl Into<String>) -> Self {
        Rule::IsNumber { min, max, message: message.into() }
    }

    pub fn length(min: Option<usize>, max: Option<usize>, message: impl Into<String>) -> Self {
        Rule::Length { min, max, message: message.into() }
    }

    pub fn matches_field(other: impl Into<String>, message: impl Into<String>) -> Self {
        Rule::MatchesField { other: other.into(), message: message.into() }
    }

    pub fn check<F>(test: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value, &Candidate) -> bool + Send + Sync + 'static,
    {
        Rule::Check { test: Arc::new(test), message: message.into() }
    }

    pub fn nested(schema: Schema) -> Self {
        Rule::Nested { schema: Arc::new(schema) }
    }
}

/// 후보 타입 하나에 대한 규칙 테이블
///
/// 빌더 스타일로 선언합니다:
/// ```ignore
/// Schema::new()
///     .field("name", vec![Rule::not_empty("Enter a name")])
///     .field("host", vec![Rule::nested(
///         Schema::new().field("email", vec![Rule::not_empty("Enter an email")]),
///     )])
/// ```
#[derive(Clone, Default)]
pub struct Schema {
    fields: Vec<(String, Vec<Rule>)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.fields.push((name.into(), rules));
        self
    }

    /// 후보를 검증하고 평탄화된 에러 목록을 반환합니다.
    /// 숫자 강제 변환 결과는 후보에 다시 기록됩니다.
    pub fn validate(&self, candidate: &mut Candidate) -> Vec<FieldError> {
        self.validate_at("", candidate)
    }

    fn validate_at(&self, prefix: &str, candidate: &mut Candidate) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (name, rules) in &self.fields {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}-{name}")
            };

            // 객체 값 + Nested 규칙이면 하위 Schema로 위임하고,
            // 부모 필드 자체의 말단 규칙은 건너뜁니다.
            let nested = rules.iter().find_map(|rule| match rule {
                Rule::Nested { schema } => Some(Arc::clone(schema)),
                _ => None,
            });
            if let Some(schema) = nested {
                if let Some(Value::Object(child)) = candidate.get_mut(name) {
                    errors.extend(schema.validate_at(&path, child));
                    continue;
                }
            }

            let mut value = candidate.get(name).cloned().unwrap_or(Value::Null);
            let mut failure: Option<&str> = None;

            for rule in rules {
                if let Some(message) = apply(rule, &mut value, candidate) {
                    failure = Some(message); // 마지막 실패 메시지가 이깁니다
                }
            }

            match failure {
                Some(message) => errors.push(FieldError::new(&path, message)),
                // 강제 변환된 값을 후보에 반영
                None if !value.is_null() => {
                    candidate.insert(name.clone(), value);
                }
                None => {}
            }
        }

        errors
    }
}

/// 규칙 하나를 평가합니다. 실패하면 메시지를 반환합니다.
/// `IsNumber`는 성공 시 `value`를 숫자로 교체합니다.
fn apply<'a>(rule: &'a Rule, value: &mut Value, candidate: &Candidate) -> Option<&'a str> {
    match rule {
        Rule::NotEmpty { message } => {
            let empty = match value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                _ => false,
            };
            empty.then_some(message.as_str())
        }

        Rule::IsIn { allowed, message } => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => None,
            _ => Some(message.as_str()),
        },

        Rule::IsNumber { min, max, message } => {
            let number = match &*value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(n) = number else {
                return Some(message.as_str());
            };
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Some(message.as_str());
            }
            match Number::from_f64(n) {
                Some(coerced) => {
                    *value = Value::Number(coerced);
                    None
                }
                // NaN 등 표현 불가능한 값은 검증 실패로 처리
                None => Some(message.as_str()),
            }
        }

        Rule::Length { min, max, message } => match value.as_str() {
            Some(s) => {
                let len = s.chars().count();
                let out_of_bounds =
                    min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m);
                out_of_bounds.then_some(message.as_str())
            }
            None => Some(message.as_str()),
        },

        Rule::MatchesField { other, message } => {
            let other_value = candidate.get(other).cloned().unwrap_or(Value::Null);
            (*value != other_value).then_some(message.as_str())
        }

        Rule::Check { test, message } => (!test(value, candidate)).then_some(message.as_str()),

        // 객체가 아닌 값에 대한 Nested는 여기서 평가하지 않습니다
        Rule::Nested { .. } => None,
    }
}
