//! Normalized, serializable failure representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;

const UNKNOWN_ERROR: &str = "Unknown error";

/// A failure as it travels on the wire: always a JSON object with a
/// `message`, plus whatever other fields an object-shaped failure carried.
///
/// Normalization is a pure function of its input, so the same failure always
/// produces the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLike {
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorLike {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Attach an additional field (e.g. `code`, `statusCode`).
    ///
    /// A `message` key is ignored; the message lives in its own field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "message" {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Normalize any Rust error by its display text.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(non_empty(error.to_string()))
    }

    /// Normalize an arbitrary JSON failure value.
    ///
    /// - `null` becomes `Unknown error`
    /// - objects keep their fields; a missing, empty or non-string `message`
    ///   becomes `Unknown error`
    /// - strings become the message
    /// - anything else is rendered as JSON text
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::new(UNKNOWN_ERROR),
            Value::String(s) => Self::new(non_empty(s)),
            Value::Object(mut fields) => {
                let message = match fields.remove("message") {
                    Some(Value::String(s)) => non_empty(s),
                    _ => UNKNOWN_ERROR.to_string(),
                };
                Self {
                    message,
                    extra: fields,
                }
            }
            other => Self::new(other.to_string()),
        }
    }

    /// Normalize a panic payload caught from an item handler.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "batch item handler panicked".to_string()
        };
        Self::new(non_empty(message))
    }
}

fn non_empty(message: String) -> String {
    if message.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

impl fmt::Display for ErrorLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorLike {}

impl From<String> for ErrorLike {
    fn from(message: String) -> Self {
        Self::new(non_empty(message))
    }
}

impl From<&str> for ErrorLike {
    fn from(message: &str) -> Self {
        Self::from(message.to_string())
    }
}

impl From<Value> for ErrorLike {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<crate::Error> for ErrorLike {
    fn from(error: crate::Error) -> Self {
        match error {
            crate::Error::Item(inner) => inner,
            other => Self::from_error(&other),
        }
    }
}

impl From<anyhow::Error> for ErrorLike {
    fn from(error: anyhow::Error) -> Self {
        Self::new(non_empty(error.to_string()))
    }
}

impl From<std::io::Error> for ErrorLike {
    fn from(error: std::io::Error) -> Self {
        Self::from_error(&error)
    }
}

impl From<serde_json::Error> for ErrorLike {
    fn from(error: serde_json::Error) -> Self {
        Self::from_error(&error)
    }
}
