// main.rs
// Payment portal server: loads .env, sets up logging, connects the backend
// client and serves the router.
//
// Pages:
// - GET  /login, POST /login, POST /logout
// - GET  /dashboard
// - GET  /payment-plans (+ /new, /preview, /{id} and status/cancel/delete actions)
// - GET  /invoices (+ /{id} and mark-paid/status/delete actions)
// - GET  /transactions
// - GET  /payment-portal

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payportal::{config::PortalConfig, routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PortalConfig::from_env();
    let addr = config.bind_addr;
    info!(api_url = %config.api_url, "using payment backend");

    let state = Arc::new(
        state::init_state(config)
            .await
            .context("failed to initialize portal state")?,
    );
    let app = routes::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
