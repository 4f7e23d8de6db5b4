//! Batch wire types.

use super::error_like::ErrorLike;
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered batch of opaque item payloads, identified by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest<T> {
    pub batch: Vec<T>,
}

impl<T> BatchRequest<T> {
    pub fn new(batch: Vec<T>) -> Self {
        Self { batch }
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

impl<T> From<Vec<T>> for BatchRequest<T> {
    fn from(batch: Vec<T>) -> Self {
        Self::new(batch)
    }
}

impl<T: DeserializeOwned> BatchRequest<T> {
    /// Validate a raw request body and extract its items.
    ///
    /// Checks the envelope (an object whose `batch` is an array) and
    /// deserializes every item into `T`. With `T = Value` only the envelope
    /// can fail; batch routes use that and leave item schemas to the
    /// handler, see [`Decoded`](super::Decoded).
    pub fn from_payload(payload: Value) -> Result<Self> {
        let context = || ErrorContext::new().with_source("batch_request");
        let mut fields = match payload {
            Value::Object(fields) => fields,
            other => {
                return Err(Error::validation_with_context(
                    format!("expected a JSON object, got {}", json_type(&other)),
                    context(),
                ))
            }
        };
        let items = match fields.remove("batch") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::validation_with_context(
                    format!("expected value of type [array] but got [{}]", json_type(&other)),
                    context().with_field_path("batch"),
                ))
            }
            None => {
                return Err(Error::validation_with_context(
                    "expected value of type [array] but got [undefined]",
                    context().with_field_path("batch"),
                ))
            }
        };

        let batch = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| {
                    Error::validation_with_context(
                        e.to_string(),
                        context().with_field_path(format!("batch[{}]", index)),
                    )
                })
            })
            .collect::<Result<Vec<T>>>()?;
        Ok(Self { batch })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One streamed record: the outcome of the item at index `id`.
///
/// Serialized as `{"id": 0, "result": ...}` or `{"id": 0, "error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResponseItem<R> {
    // Must stay before `Result`: untagged matching is first-fit, and an
    // `Option` result type accepts a record with no `result` key.
    Error { id: usize, error: ErrorLike },
    Result { id: usize, result: R },
}

impl<R> BatchResponseItem<R> {
    pub fn success(id: usize, result: R) -> Self {
        Self::Result { id, result }
    }

    pub fn failure(id: usize, error: ErrorLike) -> Self {
        Self::Error { id, error }
    }

    /// Index of the originating item.
    pub fn id(&self) -> usize {
        match self {
            Self::Result { id, .. } | Self::Error { id, .. } => *id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn result(&self) -> Option<&R> {
        match self {
            Self::Result { result, .. } => Some(result),
            Self::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorLike> {
        match self {
            Self::Error { error, .. } => Some(error),
            Self::Result { .. } => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<R, ErrorLike> {
        match self {
            Self::Result { result, .. } => Ok(result),
            Self::Error { error, .. } => Err(error),
        }
    }
}
