//! # 서비스 계층
//!
//! 미들웨어와 라우트 핸들러가 공유하는 핵심 로직을 모아둔 모듈입니다.
//!
//! 각 하위 모듈:
//! - `token_store`: key/value + TTL 저장소 트레이트와 구현 (SQLite / 메모리)
//! - `journey_data`: 여정 상태의 토큰 키 계산과 로드/저장/삭제
//! - `flash`: 검증 실패 페이로드의 1회성 전달 채널
//! - `validation`: 선언적 규칙 테이블 검증 엔진 + 에러 평탄화
//! - `pagination`: 페이지 윈도우 계산기 (순수 함수)

pub mod flash;
pub mod journey_data;
pub mod pagination;
pub mod token_store;
pub mod validation;
