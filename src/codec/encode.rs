//! Stream encoder (records -> NDJSON bytes)

use super::DELIMITER;
use crate::{BoxStream, Result};
use bytes::Bytes;
use futures::{future, Stream, StreamExt};
use serde::Serialize;
use tracing::error;

/// Serialize one record as a single JSON line, delimiter included.
pub fn encode_record<I>(record: &I) -> Result<Bytes>
where
    I: Serialize + ?Sized,
{
    let mut line = serde_json::to_vec(record)?;
    line.push(DELIMITER);
    Ok(Bytes::from(line))
}

/// Encode a record stream as NDJSON.
///
/// Each record becomes its own chunk as soon as the source yields it, so the
/// transport can flush it without waiting for siblings. A record that cannot
/// be serialized is logged and skipped. The output ends when the source ends.
pub fn encode<S, I>(records: S) -> BoxStream<'static, Bytes>
where
    S: Stream<Item = I> + Send + 'static,
    I: Serialize,
{
    Box::pin(records.filter_map(|record| {
        future::ready(match encode_record(&record) {
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                error!(error = %e, "could not serialize a streamed record, skipping it");
                None
            }
        })
    }))
}
