use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use health_service_rs::utils::ensure_artifacts;
use health_service_rs::{router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let http = reqwest::Client::builder()
        .timeout(config.outbound_timeout)
        .user_agent(concat!("health_service_rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    ensure_artifacts(&http, &config.model_dir, config.artifact_base_url.as_deref()).await?;
    let state = AppState::load(&config, http).context("failed to load models")?;

    let app = router(state, config.body_limit_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
