//! API Integration Tests
//!
//! These tests load real files into an in-memory store and exercise the
//! query endpoint through the HTTP layer via `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use csvserve::server::create_query_router;
use csvserve::{AppContext, Server, ServiceConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PEOPLE_CSV: &str = "\
Id,Full Name,City,Balance
1,\"Smith, Jr.\",Oslo,\"1,234\"
2,Ann Lee,Bergen,99.5
3,Bob Ray,Oslo,n/a
";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp file");
    file
}

fn load_context(file: &NamedTempFile, parse_numbers: bool) -> Arc<AppContext> {
    let mut config = ServiceConfig::for_file(file.path());
    config.parse_numbers = parse_numbers;
    config.reader_connections = 2;
    Arc::new(AppContext::load(&config).expect("failed to load CSV"))
}

fn create_test_app(parse_numbers: bool) -> (Router, NamedTempFile) {
    let file = write_csv(PEOPLE_CSV);
    let app = create_query_router(load_context(&file, parse_numbers));
    (app, file)
}

/// Send a GET request and return (status, parsed JSON body).
async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "body is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&body)
        )
    });
    (status, value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_equality_filter() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?city=Bergen").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 2, "fullname": "Ann Lee", "city": "Bergen", "balance": 99.5}])
    );
}

#[tokio::test]
async fn test_response_body_is_compact_json() {
    let (app, _file) = create_test_app(true);
    let req = Request::builder()
        .uri("/?city=Bergen")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains('\n'), "body should be on one line: {}", text);
    assert!(text.starts_with("[{\"balance\":99.5,"), "{}", text);
}

#[tokio::test]
async fn test_results_follow_insertion_order() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?city=Oslo").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = body.as_array().unwrap().iter().map(|r| &r["id"]).collect();
    assert_eq!(ids, vec![&json!(1), &json!(3)]);
}

#[tokio::test]
async fn test_numeric_coercion_and_comma_quirk() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["balance"], json!(1234));
    assert_eq!(body[0]["fullname"], json!("Smith, Jr."));
}

#[tokio::test]
async fn test_numeric_parsing_disabled() {
    let (app, _file) = create_test_app(false);
    let (status, body) = get_json(app, "/?id=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], json!("1"));
    assert_eq!(body[0]["balance"], json!("1,234"));
}

#[tokio::test]
async fn test_values_are_url_decoded() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?fullname=Smith%2C%20Jr.").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["city"], json!("Oslo"));
}

#[tokio::test]
async fn test_multiple_columns_are_anded() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?city=Oslo&fullname=Bob%20Ray").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], json!(3));
}

#[tokio::test]
async fn test_repeated_key_matches_nothing() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?id=1&id=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_no_match_is_empty_array() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?city=Paris").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_no_parameters_is_bad_request() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_string(), "error body should be a JSON string");
}

#[tokio::test]
async fn test_unknown_column_is_bad_request() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?country=NO").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.as_str().unwrap().contains("country"));
}

#[tokio::test]
async fn test_column_lookup_ignores_case() {
    let (app, _file) = create_test_app(true);
    let (status, body) = get_json(app, "/?CITY=Bergen").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cors_header_on_cross_origin_request() {
    let (app, _file) = create_test_app(true);
    let req = Request::builder()
        .method("GET")
        .uri("/?id=2")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_only_get_is_routed() {
    let (app, _file) = create_test_app(true);
    let req = Request::builder()
        .method("POST")
        .uri("/?id=1")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_server_serves_and_shuts_down() {
    let file = write_csv(PEOPLE_CSV);
    let server = Server::with_context(load_context(&file, true), Duration::from_secs(2));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /?city=Bergen HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("Ann Lee"));

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop in time")
        .unwrap();
    assert!(result.is_ok());
}
