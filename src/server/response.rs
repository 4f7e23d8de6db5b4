//! HTTP responses: the NDJSON body and request-level error bodies.

use crate::codec::NDJSON_CONTENT_TYPE;
use crate::{BoxStream, Error};
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::json;

/// Wrap an encoded record stream in a `200` chunked NDJSON response.
///
/// Records are written as they are produced; nothing is buffered.
pub fn ndjson_response(body: BoxStream<'static, Bytes>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CONNECTION, "keep-alive"),
            (header::TRANSFER_ENCODING, "chunked"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

impl Error {
    /// Status code used when this error ends a request before streaming starts.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::Serialization(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Error::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let body = Json(json!({
            "statusCode": status.as_u16(),
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
        }));

        (status, body).into_response()
    }
}
