use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fare_estimator::{
    artifacts::Artifacts, config::AppConfig, route::OsrmClient, server, service::FareService,
    session::SessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fare_estimator=info")),
        )
        .init();

    let cfg = AppConfig::from_env()?;

    let artifacts = match Artifacts::load(&cfg.artifact_dir) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("model/preprocessor artifacts unavailable: {:#}", e);
            return Err(e);
        }
    };
    // Warmup so a broken model fails here rather than on the first request
    let width = artifacts.model.feature_names().len();
    artifacts
        .model
        .predict(&vec![0.0; width])
        .context("model warmup failed")?;
    tracing::info!("warmup predict ok");

    tracing::info!(
        "loaded model {}; feature_names[{}]: {:?}",
        artifacts.model.name(),
        artifacts.model.feature_names().len(),
        artifacts.model.feature_names()
    );

    let router = OsrmClient::new(&cfg.osrm_url, cfg.osrm_timeout()).context("failed to build routing client")?;
    let service = FareService::new(artifacts.pipeline, artifacts.model, router);
    let state = server::AppState::with_sessions(service, SessionStore::with_idle_timeout(cfg.session_idle()));

    // sweep at least once per idle window even when no new sessions arrive
    let sessions = state.sessions.clone();
    let period = cfg.session_idle().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sessions.evict_idle();
        }
    });

    let app = server::router(state);

    let addr = cfg.socket_addr()?;
    tracing::info!("listening on {} (routing via {})", addr, cfg.osrm_url);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
