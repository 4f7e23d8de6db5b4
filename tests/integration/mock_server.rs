//! Mock batch route for client tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Respond to every matching POST with the given NDJSON lines.
    pub async fn mock_ndjson(&self, path: &str, lines: &[&str], hits: usize) -> Mock {
        let body: String = lines.iter().map(|line| format!("{}\n", line)).collect();
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Like [`Self::mock_ndjson`], but only for a request whose body equals `batch`.
    pub async fn mock_ndjson_for(&self, path: &str, batch: Value, lines: &[&str]) -> Mock {
        let body: String = lines.iter().map(|line| format!("{}\n", line)).collect();
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(Matcher::Json(batch))
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(body)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(&self, path: &str, status: usize, error_body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
            .create_async()
            .await
    }
}
