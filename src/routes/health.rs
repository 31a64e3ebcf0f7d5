//! # 헬스체크(Health Check) 핸들러
//!
//! 서버가 정상적으로 동작하는지 확인하는 엔드포인트입니다.
//! 로드밸런서와 컨테이너 오케스트레이터의 상태 확인용입니다.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health` — 서버 상태를 확인합니다.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}
