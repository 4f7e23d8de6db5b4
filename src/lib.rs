//! # bfetch
//!
//! Streaming batch-response multiplexer: one HTTP request carries a batch of
//! independent items, every item runs concurrently, and each result is streamed
//! back as a newline-delimited JSON record the moment it completes.
//!
//! ## Overview
//!
//! A slow item never holds back a fast one. Records are emitted in completion
//! order and tagged with the index of the item that produced them, so callers
//! demultiplex by `id` rather than by arrival position. One item failing only
//! turns that item's record into an `error` record; the rest of the batch and
//! the response stream carry on.
//!
//! ```text
//! {"batch": [a, b, c]}
//!        │
//!   ResponseMultiplexer ── attempt(0, a) ─┐
//!        │              ── attempt(1, b) ─┼─► completion channel ─► encode() ─► NDJSON body
//!        │              ── attempt(2, c) ─┘
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Wire types, item executor contract and the response multiplexer |
//! | [`codec`] | NDJSON stream encoder and decoder |
//! | [`server`] | axum route binding for batch and streaming routes |
//! | [`client`] | Streaming batched function (client-side batching + demux) |
//! | [`transport`] | HTTP transport used by the client |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bfetch::batch::ErrorLike;
//! use bfetch::server::{BfetchServer, ServerConfig};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> bfetch::Result<()> {
//!     BfetchServer::new(ServerConfig::default())
//!         .add_batch_processing_route("echo", |_head: &axum::http::request::Parts| {
//!             |item: Value| async move { Ok::<Value, ErrorLike>(item) }
//!         })
//!         .serve()
//!         .await
//! }
//! ```

pub mod batch;
pub mod client;
pub mod codec;
pub mod server;
pub mod transport;

mod utils;

pub use batch::{BatchItemHandler, BatchRequest, BatchResponseItem, ErrorLike, ResponseMultiplexer};
pub use client::{BatchedFunctionConfig, StreamingBatchedFunction};
pub use server::{BfetchServer, ServerConfig};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// A pinned, boxed stream whose items cannot fail
pub type ItemStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
