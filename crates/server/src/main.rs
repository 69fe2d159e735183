mod api;
mod db;
mod entity;
mod repository;

use std::env;
use std::sync::Arc;

use anyhow::Context;
use api::AppState;
use judge_orchestrator::{HttpJudgeClient, JudgeConfig, JudgeService};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    info!("starting arena server");
    let config_path = env::var("JUDGE_CONFIG").unwrap_or_else(|_| "judge.toml".to_string());
    info!(path = %config_path, "loading judge config");
    let config = JudgeConfig::from_file_or_default(&config_path)
        .with_context(|| format!("failed to load judge config from {config_path}"))?;

    let db = db::init_pool_and_migrate()
        .await
        .context("failed to initialize database")?;
    let client =
        HttpJudgeClient::new(config.judge.clone()).context("failed to build judge client")?;
    info!(base_url = %config.judge.base_url, "judge client configured");

    let service = Arc::new(JudgeService::new(
        config,
        Arc::new(client),
        repository::stores(db),
    ));
    let mut event_stream = service.subscribe_events();
    info!("subscribed to judge event stream");

    let resumed = service
        .resume_pending()
        .await
        .context("failed to resume pending submissions")?;
    info!(resumed, "pending submissions resumed");

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let app = api::create_router(Arc::new(AppState::new(service.clone())));
    let server = tokio::spawn(async move { axum::serve(listener, app).await });
    info!(%bind_addr, "server is ready, press Ctrl+C to shut down");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, stopping server");
                break;
            }
            event = event_stream.recv() => {
                match event {
                    Ok(event) => info!(?event, "judge event"),
                    Err(err) => match err.downcast_ref::<RecvError>() {
                        Some(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "judge event stream lagged");
                        }
                        _ => {
                            warn!(error = %err, "failed to receive judge event");
                            break;
                        }
                    },
                }
            }
        }
    }

    service.shutdown().await;
    server.abort();
    info!("server shutdown complete");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}
