use std::{sync::Arc, time::Duration};

mod app;
mod auth;
mod config;
mod dashboard;
mod db;
mod error;
mod state;
mod views;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "gatekeep=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let state = AppState::postgres(pool, config.clone());
    tokio::spawn(auth::session::purge_loop(
        state.sessions.clone(),
        Duration::from_secs(config.session.purge_interval_secs.max(1)),
    ));

    let app = app::build_app(state);
    app::serve(app, &config).await
}
