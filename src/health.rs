//! Liveness endpoint for external uptime monitors.

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::info;

use crate::core::config::HealthConfig;

pub const ALIVE: &str = "I am alive! Robot is running...";

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE
}

pub async fn serve(config: &HealthConfig) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    serve_on(listener).await
}

pub async fn serve_on(listener: TcpListener) -> Result<()> {
    info!(addr = ?listener.local_addr().ok(), "Liveness endpoint listening");
    axum::serve(listener, router())
        .await
        .context("Liveness endpoint stopped")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_alive_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_on(listener));

        let body = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, ALIVE);

        server.abort();
    }
}
