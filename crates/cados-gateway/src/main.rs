use std::env;
use std::net::SocketAddr;

use cados_upstream::{CadService, UpstreamConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let address: SocketAddr = env::var("GATEWAY_ADDR")
        .unwrap_or_else(|_| DEFAULT_GATEWAY_ADDR.to_string())
        .parse()?;
    let upstream = CadService::new(UpstreamConfig::from_env())?;
    tracing::info!(%address, upstream = upstream.base_url(), "starting CAD-OS API gateway");

    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, cados_gateway::app(upstream)).await?;
    Ok(())
}
