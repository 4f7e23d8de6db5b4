use super::TransportError;
use crate::batch::BatchRequest;
use crate::codec::NDJSON_CONTENT_TYPE;
use crate::utils::env_parse;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const SOURCE: &str = "http_transport";

/// Posts batches to one batch route and hands back the raw response body.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid batch endpoint: {}", e),
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(endpoint.to_string()),
            )
        })?;

        // Minimal production-friendly defaults (env-overridable).
        let connect_timeout_secs =
            env_parse::<u64>("BFETCH_HTTP_CONNECT_TIMEOUT_SECS", SOURCE)?.unwrap_or(10);
        let pool_max_idle =
            env_parse::<usize>("BFETCH_HTTP_POOL_MAX_IDLE_PER_HOST", SOURCE)?.unwrap_or(32);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_max_idle_per_host(pool_max_idle);

        // A response streams for as long as its slowest item, so the overall
        // timeout is opt-in.
        if let Some(secs) = env_parse::<u64>("BFETCH_HTTP_TIMEOUT_SECS", SOURCE)? {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        info!(endpoint = %endpoint, "batch transport ready");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one batch and return its NDJSON body as a byte stream.
    ///
    /// Non-2xx responses are turned into [`TransportError::Status`] with the
    /// response text.
    pub async fn post_batch<T: Serialize>(
        &self,
        request: &BatchRequest<T>,
    ) -> Result<BoxStream<'static, Bytes>> {
        debug!(endpoint = %self.endpoint, items = request.len(), "posting batch");
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("accept", NDJSON_CONTENT_TYPE)
            .json(request)
            .send()
            .await
            .map_err(TransportError::Http)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Transport(TransportError::Status {
                status: status.as_u16(),
                body,
            }));
        }

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}
