//! Response multiplexer: fan a batch out, fan completions back in.

use super::executor::{attempt, BatchItemHandler};
use super::types::{BatchRequest, BatchResponseItem};
use crate::ItemStream;
use futures::stream;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Runs every item of a batch concurrently and streams one record per item in
/// completion order.
///
/// The handler is shared by all items of all batches processed through this
/// multiplexer.
pub struct ResponseMultiplexer<H> {
    handler: Arc<H>,
}

impl<H> Clone for ResponseMultiplexer<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H> ResponseMultiplexer<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn from_arc(handler: Arc<H>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Dispatch all items and return the stream of their records.
    ///
    /// Every item is spawned onto the tokio runtime before this returns, so it
    /// must be called from within a runtime. The stream yields exactly
    /// `batch.len()` records, each `id` unique in `[0, len)`, then ends. An
    /// empty batch yields an already-closed stream.
    ///
    /// Dropping the stream does not cancel items that are already running.
    pub fn process<T, R>(&self, batch: BatchRequest<T>) -> ItemStream<'static, BatchResponseItem<R>>
    where
        H: BatchItemHandler<T, R> + 'static,
        T: Send + 'static,
        R: Send + 'static,
    {
        let batch_id = Uuid::new_v4();
        let total = batch.len();
        if total == 0 {
            debug!(batch_id = %batch_id, "empty batch, closing stream");
            return Box::pin(stream::empty());
        }

        info!(batch_id = %batch_id, items = total, "dispatching batch");
        let (tx, rx) = mpsc::unbounded_channel();
        for (index, payload) in batch.batch.into_iter().enumerate() {
            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            tokio::spawn(async move {
                let record = attempt(index, payload, handler.as_ref()).await;
                // A closed channel means the response went away; the item has
                // still run to completion.
                let _ = tx.send(record);
            });
        }
        drop(tx);

        let countdown = Countdown {
            batch_id,
            total,
            remaining: total,
            failures: 0,
            started: Instant::now(),
            rx,
        };
        Box::pin(stream::unfold(countdown, |mut countdown| async move {
            if countdown.remaining == 0 {
                return None;
            }
            let record = match countdown.rx.recv().await {
                Some(record) => record,
                None => {
                    // `attempt` never panics, so a task only goes missing when
                    // the runtime shuts down under it.
                    warn!(
                        batch_id = %countdown.batch_id,
                        missing = countdown.remaining,
                        "batch tasks stopped before every item completed"
                    );
                    return None;
                }
            };
            countdown.record(&record);
            Some((record, countdown))
        }))
    }
}

/// Consumer-side bookkeeping. Only the stream consumer touches it, so the
/// concurrent item tasks share nothing but the channel sender.
struct Countdown<R> {
    batch_id: Uuid,
    total: usize,
    remaining: usize,
    failures: usize,
    started: Instant,
    rx: mpsc::UnboundedReceiver<BatchResponseItem<R>>,
}

impl<R> Countdown<R> {
    fn record(&mut self, record: &BatchResponseItem<R>) {
        self.remaining -= 1;
        if record.is_error() {
            self.failures += 1;
        }
        if self.remaining == 0 {
            info!(
                batch_id = %self.batch_id,
                items = self.total,
                failures = self.failures,
                duration_ms = self.started.elapsed().as_millis() as u64,
                "batch completed"
            );
        }
    }
}
