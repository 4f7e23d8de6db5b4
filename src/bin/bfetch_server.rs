//! bfetch-server: demo server exposing a few batch routes
//!
//! Usage:
//!   bfetch-server [config.yaml]
//!
//! Routes (under the configured base path, `/bfetch` by default):
//!   POST echo     every item comes back unchanged
//!   POST upper    strings are upper-cased, anything else is an item error
//!   POST divide   `10 / x` for integer items, division by zero is an item error
//!
//! Environment:
//!   BFETCH_BIND_ADDR, BFETCH_BASE_PATH, BFETCH_MAX_BODY_BYTES override the
//!   config file. RUST_LOG sets the log filter (default `info`).

use anyhow::Context;
use axum::http::request::Parts;
use bfetch::batch::ErrorLike;
use bfetch::server::{BfetchServer, ServerConfig};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_yaml_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => ServerConfig::default(),
    }
    .with_env_overrides()
    .context("applying environment overrides")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;

    BfetchServer::new(config)
        .add_batch_processing_route("echo", |_: &Parts| {
            |item: Value| async move { Ok::<_, ErrorLike>(item) }
        })
        .add_batch_processing_route("upper", |_: &Parts| {
            |item: Value| async move {
                match item {
                    Value::String(s) => Ok(Value::String(s.to_uppercase())),
                    other => Err(ErrorLike::new("expected a string").with_field("item", other)),
                }
            }
        })
        .add_batch_processing_route("divide", |_: &Parts| {
            |x: i64| async move {
                10_i64
                    .checked_div(x)
                    .ok_or_else(|| ErrorLike::new("attempt to divide by zero"))
            }
        })
        .serve_on(listener, shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested, draining open responses");
    }
}
