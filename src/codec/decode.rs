//! Stream decoder (NDJSON bytes -> JSON values)

use super::DELIMITER;
use crate::batch::BatchResponseItem;
use crate::{BoxStream, Error};
use bytes::{Buf, Bytes, BytesMut};
use futures::{stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Split an NDJSON byte stream into JSON values.
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte
/// character. Blank lines are skipped. A line that is not valid JSON yields a
/// `Serialization` error and decoding continues with the next line. A final
/// line without a trailing delimiter is still decoded at end of input.
pub fn decode(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
    // `scanned` bytes of `buf` are known to hold no delimiter.
    let stream = stream::unfold(
        (input, BytesMut::new(), 0_usize, false),
        |(mut input, mut buf, mut scanned, mut eof)| async move {
            loop {
                if let Some(offset) = buf[scanned..].iter().position(|b| *b == DELIMITER) {
                    let line = buf.split_to(scanned + offset);
                    buf.advance(1);
                    scanned = 0;
                    match parse_line(&line) {
                        Some(parsed) => return Some((parsed, (input, buf, scanned, eof))),
                        None => continue,
                    }
                }
                scanned = buf.len();

                if eof {
                    if buf.is_empty() {
                        return None;
                    }
                    let rest = buf.split();
                    scanned = 0;
                    match parse_line(&rest) {
                        Some(parsed) => return Some((parsed, (input, buf, scanned, eof))),
                        None => return None,
                    }
                }

                match input.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => return Some((Err(e), (input, buf, scanned, eof))),
                    None => eof = true,
                }
            }
        },
    );

    Box::pin(stream)
}

/// `None` for blank lines.
fn parse_line(line: &[u8]) -> Option<crate::Result<Value>> {
    let start = line.iter().position(|b| !b.is_ascii_whitespace())?;
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(line.len(), |i| i + 1);
    Some(serde_json::from_slice::<Value>(&line[start..end]).map_err(Error::Serialization))
}

/// Decode an NDJSON response body into batch records.
///
/// With `R = Value` records stay loosely typed and [`typed`] applies the
/// caller's result type later, so a result that does not fit only affects its
/// own item.
pub fn decode_items<R>(input: BoxStream<'static, Bytes>) -> BoxStream<'static, BatchResponseItem<R>>
where
    R: DeserializeOwned + Send + 'static,
{
    Box::pin(decode(input).map(|value| {
        value.and_then(|v| serde_json::from_value::<BatchResponseItem<R>>(v).map_err(Error::from))
    }))
}

/// Apply the caller's result type to a decoded record.
pub fn typed<R: DeserializeOwned>(
    record: BatchResponseItem<Value>,
) -> (usize, crate::Result<R>) {
    let id = record.id();
    let outcome = match record.into_result() {
        Ok(value) => serde_json::from_value(value).map_err(Error::from),
        Err(error) => Err(Error::Item(error)),
    };
    (id, outcome)
}
