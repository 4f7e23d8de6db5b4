//! HTTP route binding.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BfetchServer`] | Registers batch and streaming routes on an [`axum::Router`] |
//! | [`ServerConfig`] | Bind address, route prefix and body limit |
//! | [`ndjson_response`] | Chunked `application/x-ndjson` response around an encoded stream |
//!
//! A batch route validates the `{"batch": [...]}` envelope before any item
//! runs. A malformed body gets a `400` JSON error of the form
//! `{"statusCode": 400, "error": "Bad Request", "message": "..."}`. Once
//! streaming has started the status is fixed at `200`; item failures travel
//! as `error` records inside the stream.
//!
//! ```rust,no_run
//! use axum::http::request::Parts;
//! use bfetch::batch::ErrorLike;
//! use bfetch::server::{BfetchServer, ServerConfig};
//!
//! # async fn run() -> bfetch::Result<()> {
//! let router = BfetchServer::new(ServerConfig::default())
//!     .add_batch_processing_route("upper", |_head: &Parts| {
//!         |s: String| async move { Ok::<_, ErrorLike>(s.to_uppercase()) }
//!     })
//!     .into_router();
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

mod config;
mod response;
mod routes;

pub use config::ServerConfig;
pub use response::ndjson_response;
pub use routes::BfetchServer;
