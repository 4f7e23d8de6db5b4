//! Batched client against a real server on a loopback port

use axum::http::request::Parts;
use bfetch::batch::ErrorLike;
use bfetch::server::{BfetchServer, ServerConfig};
use bfetch::{BatchedFunctionConfig, Error, StreamingBatchedFunction};
use futures::future::join_all;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<bfetch::Result<()>>,
}

impl RunningServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let server = BfetchServer::new(ServerConfig::default())
            .add_batch_processing_route("divide", |_: &Parts| {
                |x: i64| async move {
                    // Larger divisors answer sooner.
                    tokio::time::sleep(Duration::from_millis(50_u64.saturating_sub(x.unsigned_abs() * 5))).await;
                    10_i64
                        .checked_div(x)
                        .ok_or_else(|| ErrorLike::new("attempt to divide by zero"))
                }
            });
        let task = tokio::spawn(server.serve_on(listener, async move {
            let _ = stopped.await;
        }));

        Self { addr, stop, task }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_round_trip_through_real_server() {
    let server = RunningServer::start().await;
    let config = BatchedFunctionConfig::new()
        .with_flush_on_max_items(4)
        .with_max_item_age(Duration::from_millis(10));
    let divide: StreamingBatchedFunction<i64, i64> =
        StreamingBatchedFunction::new(&server.url("/bfetch/divide"), config).unwrap();

    let inputs = [1_i64, 0, 2, 5, 10, -2];
    let results = join_all(inputs.iter().map(|x| divide.call(*x))).await;

    for (x, result) in inputs.iter().zip(&results) {
        match x {
            0 => assert!(
                matches!(result, Err(Error::Item(e)) if e.message == "attempt to divide by zero")
            ),
            x => assert_eq!(result.as_ref().unwrap(), &(10 / x)),
        }
    }

    drop(divide);
    server.stop().await;
}

#[tokio::test]
async fn test_unknown_route_fails_calls_with_status() {
    let server = RunningServer::start().await;
    let missing: StreamingBatchedFunction<i64, i64> = StreamingBatchedFunction::new(
        &server.url("/bfetch/missing"),
        BatchedFunctionConfig::default(),
    )
    .unwrap();

    let result = missing.call(1).await;
    assert!(matches!(
        result,
        Err(Error::Transport(bfetch::transport::TransportError::Status { status: 404, .. }))
    ));

    server.stop().await;
}
