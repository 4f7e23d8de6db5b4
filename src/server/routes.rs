//! Route binding.

use super::config::ServerConfig;
use super::response::ndjson_response;
use crate::batch::{BatchItemHandler, BatchRequest, Decoded, ResponseMultiplexer};
use crate::codec::encode;
use crate::{Error, ErrorContext, Result};
use axum::extract::rejection::BytesRejection;
use axum::extract::DefaultBodyLimit;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Collects streaming routes and serves them.
///
/// Every route is a `POST` mounted under [`ServerConfig::base_path`]. Request
/// bodies larger than [`ServerConfig::max_body_bytes`] are rejected with
/// `413` before any factory runs.
///
/// Registering the same path twice panics, as it does for a plain
/// [`axum::Router`].
pub struct BfetchServer {
    config: ServerConfig,
    router: Router,
    routes: Vec<String>,
}

impl BfetchServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
            routes: Vec::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Full paths of the registered routes, in registration order.
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    /// Register a route whose response is an NDJSON stream of records.
    ///
    /// `factory` receives the request head and the parsed JSON body and
    /// returns the record stream. Returning an error ends the request with
    /// that error's status (`400` for validation errors) and nothing is
    /// streamed. Otherwise the response is `200` and each record is written
    /// as soon as the stream yields it.
    pub fn add_streaming_response_route<F, S, I>(mut self, path: &str, factory: F) -> Self
    where
        F: Fn(Parts, Value) -> Result<S> + Clone + Send + Sync + 'static,
        S: Stream<Item = I> + Send + 'static,
        I: Serialize + Send + 'static,
    {
        let full_path = self.config.route_path(path);
        let route = full_path.clone();
        let handler = move |head: Parts, body: std::result::Result<Bytes, BytesRejection>| {
            let factory = factory.clone();
            let route = route.clone();
            async move { streaming_response(&route, head, body, &factory) }
        };

        self.router = self.router.route(
            &full_path,
            post(handler).layer(DefaultBodyLimit::max(self.config.max_body_bytes)),
        );
        info!(path = %full_path, "registered streaming response route");
        self.routes.push(full_path);
        self
    }

    /// Register a batch route.
    ///
    /// The body must be `{"batch": [...]}`; anything else is a `400`.
    /// `factory` is called once per request with the request head and
    /// returns the handler every item of that request runs through. Items
    /// run concurrently and their records are streamed back in completion
    /// order. An item that does not deserialize into `T` gets an `error`
    /// record; its siblings are unaffected.
    pub fn add_batch_processing_route<F, H, T, R>(self, path: &str, factory: F) -> Self
    where
        F: Fn(&Parts) -> H + Clone + Send + Sync + 'static,
        H: BatchItemHandler<T, R> + 'static,
        T: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.add_streaming_response_route(path, move |head: Parts, payload: Value| {
            let request = BatchRequest::<Value>::from_payload(payload)?;
            let handler = Decoded::<H, T>::new(factory(&head));
            Ok(ResponseMultiplexer::new(handler).process::<Value, R>(request))
        })
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Bind [`ServerConfig::bind_addr`] and serve until the process stops.
    pub async fn serve(self) -> Result<()> {
        self.config.validate()?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, std::future::pending()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// In-flight responses are allowed to finish after `shutdown` fires.
    pub async fn serve_on<S>(self, listener: TcpListener, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, routes = ?self.routes, "bfetch server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!(addr = %addr, "bfetch server stopped");
        Ok(())
    }
}

fn streaming_response<F, S, I>(
    route: &str,
    head: Parts,
    body: std::result::Result<Bytes, BytesRejection>,
    factory: &F,
) -> Response
where
    F: Fn(Parts, Value) -> Result<S>,
    S: Stream<Item = I> + Send + 'static,
    I: Serialize + Send + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(path = %route, status = %rejection.status(), "request body rejected");
            return rejection.into_response();
        }
    };

    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(path = %route, error = %e, "request body is not valid JSON");
            return Error::validation_with_context(
                e.to_string(),
                ErrorContext::new().with_source("request_body"),
            )
            .into_response();
        }
    };

    match factory(head, payload) {
        Ok(records) => {
            debug!(path = %route, "streaming response");
            ndjson_response(encode(records))
        }
        Err(e) => {
            warn!(path = %route, error = %e, "request rejected");
            e.into_response()
        }
    }
}
