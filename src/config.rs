//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: 토큰 스토어로 쓰는 SQLite 데이터베이스 경로
//! - `HOST` / `PORT`: 서버 바인딩 주소와 포트
//! - `JOURNEY_TTL_HOURS`: 여정(journey) 데이터의 보존 시간 (시간 단위)
//! - `JOURNEY_FALLBACK_PATH`: 여정 없이 단계에 접근했을 때 돌려보낼 경로
//! - `MAX_SCHEDULE_INSTANCES`: 일괄 예약 검증의 상한 (참석자 수 × 반복 횟수)

use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/giljabi.db")
    pub database_url: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 여정 데이터 TTL (시간 단위, 기본값: 1)
    /// 토큰 스토어에는 초 단위로 변환되어 전달됩니다.
    pub journey_ttl_hours: u64,
    /// 활성 여정 없이 보호된 단계에 접근했을 때의 기본 리다이렉트 경로
    pub journey_fallback_path: String,
    /// 일괄 예약 검증 상한: 참석자 수 × 반복 횟수가 이 값을 넘으면 검증 실패
    pub max_schedule_instances: u64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// `DATABASE_URL`은 필수이며 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?, // 필수: 없으면 에러

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000), // 파싱 실패 시 기본값 3000 사용

            journey_ttl_hours: env::var("JOURNEY_TTL_HOURS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            journey_fallback_path: env::var("JOURNEY_FALLBACK_PATH")
                .unwrap_or_else(|_| "/".to_string()),
            max_schedule_instances: env::var("MAX_SCHEDULE_INSTANCES")
                .unwrap_or_else(|_| "20000".to_string())
                .parse()
                .unwrap_or(20000),
        })
    }

    /// 여정 TTL을 토큰 스토어가 받는 초 단위로 변환합니다.
    pub fn journey_ttl_seconds(&self) -> u64 {
        self.journey_ttl_hours * 3600
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        journey_ttl_hours: 1,
        journey_fallback_path: "/".to_string(),
        max_schedule_instances: 20000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_converts_hours_to_seconds() {
        let mut config = test_config();
        config.journey_ttl_hours = 2;
        assert_eq!(config.journey_ttl_seconds(), 7200);
    }
}
