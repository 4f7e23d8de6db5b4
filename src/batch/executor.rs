//! Batch item executor.

use super::error_like::ErrorLike;
use super::types::BatchResponseItem;
use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Runs one batch item.
///
/// Implementations may suspend on I/O and may fail; a failure only affects the
/// item being handled. Retrying, if wanted, is the handler's own business: the
/// multiplexer calls it exactly once per item.
///
/// Any `Fn(T) -> impl Future<Output = Result<R, E>>` with `E: Into<ErrorLike>`
/// is a handler.
#[async_trait]
pub trait BatchItemHandler<T: Send + 'static, R: Send + 'static>: Send + Sync {
    async fn on_batch_item(&self, item: T) -> std::result::Result<R, ErrorLike>;
}

#[async_trait]
impl<T, R, E, F, Fut> BatchItemHandler<T, R> for F
where
    T: Send + 'static,
    R: Send + 'static,
    E: Into<ErrorLike> + Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
{
    async fn on_batch_item(&self, item: T) -> std::result::Result<R, ErrorLike> {
        (self)(item).await.map_err(Into::into)
    }
}

/// Adapts a handler of typed items to raw JSON items.
///
/// Each item is deserialized inside its own task, so an item that does not
/// fit `T` becomes an `error` record for that item alone.
pub struct Decoded<H, T> {
    inner: H,
    _item: PhantomData<fn() -> T>,
}

impl<H, T> Decoded<H, T> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _item: PhantomData,
        }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

#[async_trait]
impl<H, T, R> BatchItemHandler<Value, R> for Decoded<H, T>
where
    H: BatchItemHandler<T, R>,
    T: DeserializeOwned + Send + 'static,
    R: Send + 'static,
{
    async fn on_batch_item(&self, item: Value) -> std::result::Result<R, ErrorLike> {
        let item = serde_json::from_value::<T>(item).map_err(ErrorLike::from)?;
        self.inner.on_batch_item(item).await
    }
}

/// Execute one item and capture its outcome as a record. Never fails.
///
/// Handler errors are normalized into [`ErrorLike`]; a panic inside the
/// handler is caught and normalized the same way, including one raised
/// while the handler builds its future.
pub async fn attempt<T, R, H>(index: usize, payload: T, handler: &H) -> BatchResponseItem<R>
where
    T: Send + 'static,
    R: Send + 'static,
    H: BatchItemHandler<T, R> + ?Sized,
{
    match AssertUnwindSafe(async move { handler.on_batch_item(payload).await })
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => BatchResponseItem::success(index, result),
        Ok(Err(error)) => {
            debug!(item = index, error = %error, "batch item failed");
            BatchResponseItem::failure(index, error)
        }
        Err(panic) => {
            let error = ErrorLike::from_panic(panic);
            warn!(item = index, error = %error, "batch item handler panicked");
            BatchResponseItem::failure(index, error)
        }
    }
}
