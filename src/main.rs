// src/main.rs

use std::net::SocketAddr;

use dotenvy::dotenv;
use sqlgrade::config::Config;
use sqlgrade::engine::{Evaluator, PracticeDatabase};
use sqlgrade::routes;
use sqlgrade::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "sqlgrade.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    for var in &config.malformed_vars {
        tracing::warn!("Ignoring malformed environment variable {}", var);
    }

    // The practice database is shared and read-only; ephemeral grading
    // databases are created per request by the evaluator.
    let practice = PracticeDatabase::open(&config.practice_db_path, config.stage_timeout())
        .await
        .map_err(|e| {
            tracing::error!("Failed to open practice database {}: {}", config.practice_db_path, e);
            e
        })?
        .with_max_rows(config.max_rows);

    tracing::info!("Practice database opened read-only: {}", config.practice_db_path);
    tracing::info!(
        "Evaluation limits: {} ms per stage, {} concurrent, {} rows",
        config.stage_timeout_ms,
        config.max_concurrency,
        config.max_rows
    );

    let addr = config.bind_addr;
    let state = AppState::new(practice, config);
    let evaluator = state.evaluator.clone();

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Peer addresses are needed by the rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(evaluator))
    .await?;

    Ok(())
}

/// Resolves on Ctrl-C, after refusing further evaluations.
async fn shutdown_signal(evaluator: Evaluator) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down");
    evaluator.close();
}
