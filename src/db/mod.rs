//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스 계층(services/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `tokens`: 토큰 스토어(key/value + 만료) 쿼리

pub mod tokens;

pub use tokens::*;
