//! HTTP API tests
//!
//! Drive the warp routes end to end: multipart parsing, classification,
//! canned answers, resolver delegation, uploads and error bodies.


use answer_desk::resolver::{HttpResolver, HttpResolverConfig, StaticResolver};
use answer_desk::server::routes;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    table: tempfile::NamedTempFile,
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            table: write_tasks_csv(TASKS_CSV),
            dir: TempDir::new().unwrap(),
        }
    }

    fn upload_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }

    fn index_html(&self) -> std::path::PathBuf {
        self.dir.path().join("index.html")
    }

    fn state_with(
        &self,
        resolver: Arc<dyn answer_desk::AnswerResolver>,
        max_upload_bytes: usize,
    ) -> Arc<answer_desk::server::AppState> {
        test_state(
            self.table.path(),
            resolver,
            &self.upload_dir(),
            &self.index_html(),
            max_upload_bytes,
        )
    }

    fn state(&self) -> Arc<answer_desk::server::AppState> {
        let resolver = StaticResolver::new()
            .with_answer("GA1.3", "sha-from-resolver")
            .with_answer("GA1.8", "csv-from-zip");
        self.state_with(Arc::new(resolver), 1024 * 1024)
    }
}

async fn post_question(
    state: Arc<answer_desk::server::AppState>,
    body: Vec<u8>,
    path: &str,
) -> (u16, Value) {
    let response = warp::test::request()
        .method("POST")
        .path(path)
        .header("content-type", multipart_content_type())
        .body(body)
        .reply(&routes(state))
        .await;

    let status = response.status().as_u16();
    let value = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_question_answered_from_table() {
    let fixture = Fixture::new();

    let (status, body) = post_question(
        fixture.state(),
        multipart_body(Some("What is the output of code -s?"), None),
        "/api/",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "question": "What is the output of code -s?",
            "task": "GA1.1",
            "answer": "Version:          Code 1.96.2",
            "file_received": "No file uploaded"
        })
    );
}

#[tokio::test]
async fn test_api_path_without_trailing_slash() {
    let fixture = Fixture::new();

    let (status, body) = post_question(
        fixture.state(),
        multipart_body(Some("send a request to httpbin"), None),
        "/api",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["task"], "GA1.2");
    assert_eq!(body["answer"], r#"{"args": {}}"#);
}

async fn post_urlencoded(
    state: Arc<answer_desk::server::AppState>,
    body: &str,
) -> (u16, Value) {
    let response = warp::test::request()
        .method("POST")
        .path("/api/")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body.to_string())
        .reply(&routes(state))
        .await;

    let status = response.status().as_u16();
    let value = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_urlencoded_question_answered_from_table() {
    let fixture = Fixture::new();

    let (status, body) = post_urlencoded(
        fixture.state(),
        "question=What+is+the+output+of+code+-s%3F",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "question": "What is the output of code -s?",
            "task": "GA1.1",
            "answer": "Version:          Code 1.96.2",
            "file_received": "No file uploaded"
        })
    );
}

#[tokio::test]
async fn test_urlencoded_without_question_is_unknown() {
    let fixture = Fixture::new();

    let (status, body) = post_urlencoded(fixture.state(), "note=hi").await;

    assert_eq!(status, 200);
    assert_eq!(body["question"], "");
    assert_eq!(body["task"], "Unknown");
}

#[tokio::test]
async fn test_unsupported_body_gets_fixed_details() {
    let fixture = Fixture::new();

    let response = warp::test::request()
        .method("POST")
        .path("/api/")
        .header("content-type", "application/json")
        .body(r#"{"question": "vs code"}"#)
        .reply(&routes(fixture.state()))
        .await;

    assert!(response.status().is_client_error());
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("urlencoded form"), "details: {details}");
    assert!(!details.contains("Rejection"));
}

#[tokio::test]
async fn test_unknown_question() {
    let fixture = Fixture::new();

    let (status, body) = post_question(
        fixture.state(),
        multipart_body(Some("What is the capital of France?"), None),
        "/api/",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["task"], "Unknown");
    assert_eq!(body["answer"], "No answer found for this task.");
}

#[tokio::test]
async fn test_task_without_canned_answer() {
    let fixture = Fixture::new();

    let (_, body) = post_question(
        fixture.state(),
        multipart_body(Some("Write documentation in Markdown"), None),
        "/api/",
    )
    .await;

    assert_eq!(body["task"], "GA2.1");
    assert_eq!(body["answer"], "No answer found for this task.");
}

#[tokio::test]
async fn test_missing_question_field_is_treated_as_empty() {
    let fixture = Fixture::new();

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhi\r\n--{BOUNDARY}--\r\n"
    );
    let (status, body) = post_question(fixture.state(), body.into_bytes(), "/api/").await;

    assert_eq!(status, 200);
    assert_eq!(body["question"], "");
    assert_eq!(body["task"], "Unknown");
}

#[tokio::test]
async fn test_computed_task_with_upload() {
    let fixture = Fixture::new();

    let (status, body) = post_question(
        fixture.state(),
        multipart_body(
            Some("Download and unzip the file, what is in extract.csv?"),
            Some(("q-extract-csv-zip.zip", b"PK\x03\x04fake")),
        ),
        "/api/",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["task"], "GA1.8");
    assert_eq!(body["answer"], "csv-from-zip");
    assert_eq!(body["file_received"], "q-extract-csv-zip.zip");

    let saved = fixture.upload_dir().join("q-extract-csv-zip.zip");
    assert_eq!(std::fs::read(saved).unwrap(), b"PK\x03\x04fake");
}

#[tokio::test]
async fn test_upload_name_cannot_escape_upload_dir() {
    let fixture = Fixture::new();

    let (status, _) = post_question(
        fixture.state(),
        multipart_body(Some("vs code"), Some(("../../evil.txt", b"x"))),
        "/api/",
    )
    .await;

    assert_eq!(status, 200);
    assert!(fixture.upload_dir().join("evil.txt").exists());
    assert!(!fixture.dir.path().parent().unwrap().join("evil.txt").exists());
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let fixture = Fixture::new();
    let state = fixture.state_with(Arc::new(StaticResolver::new()), 8);

    let (status, body) = post_question(
        state,
        multipart_body(Some("vs code"), Some(("big.bin", b"0123456789"))),
        "/api/",
    )
    .await;

    assert_eq!(status, 413);
    assert_eq!(body["error"], "Payload Too Large");
    assert!(!fixture.upload_dir().join("big.bin").exists());
}

#[tokio::test]
async fn test_resolver_failure_returns_500_body() {
    let fixture = Fixture::new();
    let state = fixture.state_with(Arc::new(StaticResolver::new()), 1024);

    let (status, body) = post_question(
        state,
        multipart_body(Some("run prettier then sha256sum"), None),
        "/api/",
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Internal Server Error");
    assert!(body["details"].as_str().unwrap().contains("GA1.3"));
}

#[tokio::test]
async fn test_http_resolver_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "a1b2c3"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fixture = Fixture::new();
    let resolver = HttpResolver::new(
        HttpResolverConfig::new(format!("{}/answer", mock_server.uri())).with_retry_attempts(0),
    );
    let state = fixture.state_with(Arc::new(resolver), 1024);

    let (status, body) = post_question(
        state,
        multipart_body(Some("npx -y prettier@3.4.2 README.md | sha256sum"), None),
        "/api/",
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["task"], "GA1.3");
    assert_eq!(body["answer"], "a1b2c3");
}

#[tokio::test]
async fn test_index_page_served() {
    let fixture = Fixture::new();
    std::fs::write(fixture.index_html(), "<form>ask</form>").unwrap();

    let response = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&routes(fixture.state()))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"<form>ask</form>");
}

#[tokio::test]
async fn test_missing_index_page_is_404() {
    let fixture = Fixture::new();

    let response = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&routes(fixture.state()))
        .await;

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.body().as_ref(),
        b"<h1>index.html not found</h1>"
    );
}

#[tokio::test]
async fn test_health_reports_catalog() {
    let fixture = Fixture::new();

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes(fixture.state()))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["resolver"], "static");
    assert_eq!(body["catalog"]["entries"], 5);
    assert_eq!(body["catalog"]["answers"], 2);
}

#[tokio::test]
async fn test_health_degraded_for_empty_table() {
    let table = write_tasks_csv("task,keywords,answer\n");
    let dir = TempDir::new().unwrap();
    let state = test_state(
        table.path(),
        Arc::new(StaticResolver::new()),
        dir.path(),
        &dir.path().join("index.html"),
        1024,
    );

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes(state))
        .await;

    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = Fixture::new();
    let state = fixture.state();

    post_question(state.clone(), multipart_body(Some("vs code"), None), "/api/").await;

    let response = warp::test::request()
        .method("GET")
        .path("/metrics")
        .reply(&routes(state))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert!(body["questions_received"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let fixture = Fixture::new();

    let response = warp::test::request()
        .method("GET")
        .path("/nope")
        .reply(&routes(fixture.state()))
        .await;

    assert_eq!(response.status(), 404);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["details"], "No route matches the request");
}
