//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 값 객체(value object)들을 정의합니다.
//! - `journey`: 다단계 폼 여정 상태와 요청 스코프 핸들
//! - `pagination`: 페이지 윈도우 뷰 모델
//! - `validation`: 검증 에러와 플래시 페이로드
//!
//! `pub use X::*;`로 하위 모듈의 공개 항목을 재공개하여
//! `crate::models::JourneyHandle`처럼 짧게 접근할 수 있게 합니다.

pub mod journey;
pub mod pagination;
pub mod validation;

pub use journey::*;
pub use pagination::*;
pub use validation::*;
