//! Batch processing core: wire types, the item executor contract and the
//! response multiplexer.
//!
//! # Batch Processing Module
//!
//! A batch is an ordered list of independent items. Every item is handed to a
//! [`BatchItemHandler`] concurrently, and each outcome becomes one
//! [`BatchResponseItem`] tagged with the item's index.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchRequest`] | `{"batch": [...]}` envelope, items identified by position |
//! | [`BatchResponseItem`] | `{"id", "result"}` or `{"id", "error"}` record |
//! | [`ErrorLike`] | Normalized failure: a `message` plus any extra fields |
//! | [`BatchItemHandler`] | Per-item async handler supplied by the route owner |
//! | [`Decoded`] | Deserializes each raw JSON item inside its own task before handing it on |
//! | [`attempt`] | Runs one item and captures every failure path as a record |
//! | [`ResponseMultiplexer`] | Dispatches a batch and streams records in completion order |
//!
//! ## Example
//!
//! ```rust
//! use bfetch::batch::{BatchRequest, ErrorLike, ResponseMultiplexer};
//! use futures::StreamExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mux = ResponseMultiplexer::new(|x: i64| async move {
//!     10_i64.checked_div(x).ok_or_else(|| ErrorLike::new("division by zero"))
//! });
//!
//! let mut records: Vec<_> = mux.process(BatchRequest::new(vec![1, 0, 2])).collect().await;
//! records.sort_by_key(|r| r.id());
//!
//! assert_eq!(records[0].result(), Some(&10));
//! assert!(records[1].is_error());
//! assert_eq!(records[2].result(), Some(&5));
//! # }
//! ```
//!
//! ## Ordering
//!
//! Records come out in the order items *finish*, not the order they were
//! submitted. Consumers that need input order sort or index by `id`.

mod error_like;
mod executor;
mod multiplexer;
mod types;

pub use error_like::ErrorLike;
pub use executor::{attempt, BatchItemHandler, Decoded};
pub use multiplexer::ResponseMultiplexer;
pub use types::{BatchRequest, BatchResponseItem};
