pub mod routes;

use crate::config::Config;
use anyhow::{Context, Result};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub async fn run_server(config: Arc<Config>) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.api_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server: {addr}"))?;

    info!(address = %addr, "SiteTime API server started");
    serve(listener, config).await
}

pub async fn serve(listener: TcpListener, config: Arc<Config>) -> Result<()> {
    let state = routes::ApiState { config };
    let app: Router = routes::router(state);

    axum::serve(listener, app)
        .await
        .context("API server failed")?;

    Ok(())
}
