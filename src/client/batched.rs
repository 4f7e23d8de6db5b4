//! Streaming batched function.

use super::config::BatchedFunctionConfig;
use crate::batch::BatchRequest;
use crate::codec::{decode_items, typed};
use crate::transport::{HttpTransport, TransportError};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

struct PendingCall<T, R> {
    payload: T,
    reply: oneshot::Sender<Result<R>>,
}

/// Call a remote batch route one item at a time.
///
/// Calls are queued by a background task and sent together according to
/// [`BatchedFunctionConfig`]. Each call resolves as soon as the record with its
/// `id` arrives, regardless of where that record sits in the response stream.
/// Several batches can be in flight at once.
///
/// Cloning is cheap; all clones feed the same queue. The background task
/// stops once every clone is dropped and the last batch has been flushed.
pub struct StreamingBatchedFunction<T, R> {
    calls: mpsc::UnboundedSender<PendingCall<T, R>>,
}

impl<T, R> Clone for StreamingBatchedFunction<T, R> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
        }
    }
}

impl<T, R> StreamingBatchedFunction<T, R>
where
    T: Serialize + Send + Sync + 'static,
    R: DeserializeOwned + Send + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(endpoint: &str, config: BatchedFunctionConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(endpoint)?);
        Ok(Self::with_transport(transport, config))
    }

    pub fn with_transport(transport: Arc<HttpTransport>, config: BatchedFunctionConfig) -> Self {
        let (calls, queue) = mpsc::unbounded_channel();
        tokio::spawn(run_batcher(queue, transport, config));
        Self { calls }
    }

    /// Queue one item and wait for its result.
    ///
    /// An `error` record resolves to [`Error::Item`]. If the batch as a whole
    /// fails, or its stream ends without this item's record, the call resolves
    /// to [`Error::Transport`].
    pub async fn call(&self, payload: T) -> Result<R> {
        let (reply, result) = oneshot::channel();
        self.calls
            .send(PendingCall { payload, reply })
            .map_err(|_| Error::runtime("batched function is no longer running"))?;
        result
            .await
            .map_err(|_| Error::runtime("batch was dropped before this item resolved"))?
    }
}

async fn run_batcher<T, R>(
    queue: mpsc::UnboundedReceiver<PendingCall<T, R>>,
    transport: Arc<HttpTransport>,
    config: BatchedFunctionConfig,
) where
    T: Serialize + Send + Sync + 'static,
    R: DeserializeOwned + Send + 'static,
{
    let batches = UnboundedReceiverStream::new(queue)
        .chunks_timeout(config.flush_on_max_items, config.max_item_age);
    tokio::pin!(batches);

    while let Some(batch) = batches.next().await {
        tokio::spawn(flush(Arc::clone(&transport), batch));
    }
    debug!(endpoint = %transport.endpoint(), "batched function closed");
}

async fn flush<T, R>(transport: Arc<HttpTransport>, calls: Vec<PendingCall<T, R>>)
where
    T: Serialize + Send + Sync + 'static,
    R: DeserializeOwned + Send + 'static,
{
    let (payloads, mut replies): (Vec<T>, Vec<Option<oneshot::Sender<Result<R>>>>) = calls
        .into_iter()
        .map(|call| (call.payload, Some(call.reply)))
        .unzip();
    let request = BatchRequest::new(payloads);

    let body = match transport.post_batch(&request).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, items = replies.len(), "batch request failed");
            fail_pending(&mut replies, &e);
            return;
        }
    };

    let mut records = decode_items::<Value>(body);
    while let Some(record) = records.next().await {
        match record {
            Ok(record) => {
                let (id, outcome) = typed::<R>(record);
                match replies.get_mut(id).and_then(Option::take) {
                    // The caller may have given up; nothing to do then.
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => warn!(id, "ignoring record for an unknown or already resolved item"),
                }
            }
            Err(Error::Serialization(e)) => {
                // The id of a malformed line is unknown; its caller ends up Incomplete.
                warn!(error = %e, "skipping malformed record");
            }
            Err(e) => {
                warn!(error = %e, "batch response stream failed");
                fail_pending(&mut replies, &e);
                return;
            }
        }
    }

    for (id, reply) in replies.iter_mut().enumerate() {
        if let Some(reply) = reply.take() {
            let _ = reply.send(Err(Error::Transport(TransportError::Incomplete { id })));
        }
    }
}

fn fail_pending<R>(replies: &mut [Option<oneshot::Sender<Result<R>>>], error: &Error) {
    for reply in replies.iter_mut().filter_map(Option::take) {
        let _ = reply.send(Err(shared_failure(error)));
    }
}

fn shared_failure(error: &Error) -> Error {
    match error {
        Error::Transport(e) => Error::Transport(e.share()),
        other => Error::Transport(TransportError::Other(other.to_string())),
    }
}
