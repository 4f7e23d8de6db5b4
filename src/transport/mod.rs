//! Client-side HTTP transport for batch routes.

mod http;

pub use http::HttpTransport;

/// Failures between the client and a batch route.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Batch route responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response stream ended before the result for item {id} arrived")]
    Incomplete { id: usize },

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// A copy of this error for every caller sharing one failed batch.
    ///
    /// `reqwest::Error` is not `Clone`, so it is carried over by its message.
    pub fn share(&self) -> TransportError {
        match self {
            TransportError::Http(e) => TransportError::Other(e.to_string()),
            TransportError::Status { status, body } => TransportError::Status {
                status: *status,
                body: body.clone(),
            },
            TransportError::Incomplete { id } => TransportError::Incomplete { id: *id },
            TransportError::Other(message) => TransportError::Other(message.clone()),
        }
    }
}
