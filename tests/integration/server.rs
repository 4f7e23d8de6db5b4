//! Route binding tests driven through the axum router

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bfetch::batch::ErrorLike;
use bfetch::server::{BfetchServer, ServerConfig};
use futures::stream;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tower::ServiceExt;

fn router() -> Router {
    BfetchServer::new(ServerConfig::default().with_max_body_bytes(1024))
        .add_batch_processing_route("upper", |_: &Parts| {
            |s: String| async move {
                // Later items finish first.
                let delay = 30_u64.saturating_sub(s.len() as u64 * 10);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<_, ErrorLike>(s.to_uppercase())
            }
        })
        .add_batch_processing_route("divide", |_: &Parts| {
            |x: i64| async move {
                10_i64
                    .checked_div(x)
                    .ok_or_else(|| ErrorLike::new("attempt to divide by zero"))
            }
        })
        .add_batch_processing_route("whoami", |head: &Parts| {
            let user = head
                .headers
                .get("x-user")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("anonymous")
                .to_string();
            move |_: Value| {
                let user = user.clone();
                async move { Ok::<_, ErrorLike>(user) }
            }
        })
        .add_streaming_response_route("count", |_: Parts, payload: Value| {
            let to = payload["to"].as_u64().unwrap_or(0);
            Ok(stream::iter((1..=to).map(|n| json!({ "n": n }))))
        })
        .into_router()
}

fn post(path: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_lines(response: Response) -> Vec<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.is_empty() || text.ends_with('\n'));
    text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn by_id(records: Vec<Value>) -> BTreeMap<u64, Value> {
    records
        .into_iter()
        .map(|r| (r["id"].as_u64().unwrap(), r))
        .collect()
}

#[tokio::test]
async fn test_batch_route_streams_ndjson() {
    let response = router()
        .oneshot(post("/bfetch/upper", r#"{"batch":["a","bb","ccc"]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/x-ndjson");
    assert_eq!(headers[header::CONNECTION], "keep-alive");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    assert_eq!(headers[header::TRANSFER_ENCODING], "chunked");

    let records = body_lines(response).await;
    assert_eq!(records.len(), 3);
    // "ccc" sleeps the least, "a" the most.
    assert_eq!(records[0], json!({"id": 2, "result": "CCC"}));

    let records = by_id(records);
    assert_eq!(records[&0], json!({"id": 0, "result": "A"}));
    assert_eq!(records[&1], json!({"id": 1, "result": "BB"}));
}

#[tokio::test]
async fn test_item_failure_is_an_error_record() {
    let response = router()
        .oneshot(post("/bfetch/divide", r#"{"batch":[1,0,2]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let records = by_id(body_lines(response).await);
    assert_eq!(records.len(), 3);
    assert_eq!(records[&0], json!({"id": 0, "result": 10}));
    assert_eq!(
        records[&1],
        json!({"id": 1, "error": {"message": "attempt to divide by zero"}})
    );
    assert_eq!(records[&2], json!({"id": 2, "result": 5}));
}

#[tokio::test]
async fn test_empty_batch_is_an_empty_stream() {
    let response = router()
        .oneshot(post("/bfetch/upper", r#"{"batch":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_lines(response).await.is_empty());
}

#[tokio::test]
async fn test_malformed_payloads_are_rejected() {
    for body in [r#"{"batch":"a"}"#, r#"{}"#, r#"["a"]"#, "not json", r#"{"batch":null}"#] {
        let response = router()
            .oneshot(post("/bfetch/divide", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let error = body_json(response).await;
        assert_eq!(error["statusCode"], 400);
        assert_eq!(error["error"], "Bad Request");
        assert!(error["message"].is_string());
    }
}

#[tokio::test]
async fn test_item_of_wrong_type_is_an_error_record() {
    let response = router()
        .oneshot(post("/bfetch/divide", r#"{"batch":[1,"x",2]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let records = by_id(body_lines(response).await);
    assert_eq!(records.len(), 3);
    assert_eq!(records[&0], json!({"id": 0, "result": 10}));
    assert_eq!(records[&2], json!({"id": 2, "result": 5}));
    let message = records[&1]["error"]["message"].as_str().unwrap();
    assert!(message.contains("expected i64"), "{}", message);
    assert!(records[&1].get("result").is_none());
}

#[tokio::test]
async fn test_missing_batch_message_names_expected_type() {
    let response = router()
        .oneshot(post("/bfetch/divide", r#"{"items":[1]}"#))
        .await
        .unwrap();
    let error = body_json(response).await;
    assert_eq!(
        error["message"],
        "expected value of type [array] but got [undefined]"
    );
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let items: Vec<String> = (0..200).map(|i| format!("item-{}", i)).collect();
    let body = serde_json::to_string(&json!({ "batch": items })).unwrap();
    assert!(body.len() > 1024);

    let response = router()
        .oneshot(post("/bfetch/upper", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_handler_factory_sees_request_head() {
    let request = Request::builder()
        .method("POST")
        .uri("/bfetch/whoami")
        .header("x-user", "ada")
        .body(Body::from(r#"{"batch":[null,null]}"#))
        .unwrap();
    let records = body_lines(router().oneshot(request).await.unwrap()).await;

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r["result"] == "ada"));
}

#[tokio::test]
async fn test_streaming_route_encodes_any_records() {
    let response = router()
        .oneshot(post("/bfetch/count", r#"{"to":3}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_lines(response).await,
        vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]
    );
}

#[tokio::test]
async fn test_only_post_is_routed() {
    let request = Request::builder()
        .method("GET")
        .uri("/bfetch/upper")
        .body(Body::empty())
        .unwrap();
    let response = router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = router()
        .oneshot(post("/elsewhere/upper", r#"{"batch":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
