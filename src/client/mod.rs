//! Client side of a batch route.
//!
//! [`StreamingBatchedFunction`] turns single-item calls into batches, posts
//! them through [`HttpTransport`](crate::transport::HttpTransport), and routes
//! every streamed record back to its caller by `id`.
//!
//! ```rust,no_run
//! use bfetch::client::{BatchedFunctionConfig, StreamingBatchedFunction};
//! use serde_json::{json, Value};
//!
//! # async fn run() -> bfetch::Result<()> {
//! let upper: StreamingBatchedFunction<Value, Value> = StreamingBatchedFunction::new(
//!     "http://127.0.0.1:5601/bfetch/upper",
//!     BatchedFunctionConfig::from_env()?,
//! )?;
//!
//! let (a, b) = tokio::join!(upper.call(json!("a")), upper.call(json!("b")));
//! assert_eq!(a?, json!("A"));
//! assert_eq!(b?, json!("B"));
//! # Ok(())
//! # }
//! ```

mod batched;
mod config;

pub use batched::StreamingBatchedFunction;
pub use config::BatchedFunctionConfig;
