//! # giljabi 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성 (토큰 스토어 백엔드)
//! 4. 데이터베이스 마이그레이션 실행
//! 5. 라우터 조립
//! 6. HTTP 서버 시작

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use std::sync::Arc;

use anyhow::Result;
use config::Config;
use routes::AppState;
use services::token_store::SqliteTokenStore;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giljabi=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting giljabi server on {}:{}", config.host, config.port);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    // 만료된 토큰을 주기적으로 비웁니다
    let purge_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match db::tokens::purge_expired(&purge_pool).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("purged {} expired tokens", n),
                Err(e) => tracing::warn!("token purge failed: {}", e),
            }
        }
    });

    let state = AppState {
        store: Arc::new(SqliteTokenStore::new(pool)),
        config: config.clone(),
    };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
