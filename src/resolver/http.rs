//! HTTP answer resolver
//!
//! Forwards computed-task requests to an external answer service.
//!
//! # Request Format
//!
//! ```json
//! {
//!   "task_id": "GA1.3",
//!   "question": "Run npx -y prettier@3.4.2 README.md | sha256sum",
//!   "file_path": "/srv/answer-desk/uploads/README.md"
//! }
//! ```
//!
//! # Response Format
//!
//! ```json
//! { "answer": "f1b2..." }
//! ```
//!
//! Server errors (5xx) and network failures are retried with exponential
//! backoff. Client errors, timeouts and malformed bodies fail immediately.
//!
//! # Example
//!
//! ```no_run
//! use answer_desk::resolver::{HttpResolver, HttpResolverConfig};
//!
//! let config = HttpResolverConfig::new("http://localhost:9000/answer")
//!     .with_timeout_ms(10_000)
//!     .with_retry_attempts(2);
//!
//! let resolver = HttpResolver::new(config);
//! ```

use super::{AnswerResolver, ResolveRequest, ResolverError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connection settings for the answer service
#[derive(Debug, Clone)]
pub struct HttpResolverConfig {
    /// Full endpoint URL
    pub url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries for 5xx responses and network errors
    pub retry_attempts: usize,
}

impl HttpResolverConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: 30_000,
            retry_attempts: 2,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
struct ResolverResponse {
    answer: serde_json::Value,
}

/// Resolver backed by an external HTTP service
pub struct HttpResolver {
    config: HttpResolverConfig,
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new(config: HttpResolverConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &HttpResolverConfig {
        &self.config
    }

    async fn call_service(&self, request: &ResolveRequest) -> Result<String, ResolverError> {
        let url = &self.config.url;
        let timeout = self.config.timeout();
        let retry_attempts = self.config.retry_attempts;
        let mut last_error = None;

        for attempt in 0..=retry_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = retry_attempts + 1,
                url = %url,
                task_id = %request.task_id,
                "Calling answer resolver"
            );

            match self
                .client
                .post(url)
                .json(request)
                .timeout(timeout)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .map_err(|e| ResolverError::Request(format!("failed to read body: {e}")))?;
                        let answer = parse_answer(&body)?;

                        info!(task_id = %request.task_id, "Received resolver answer");
                        return Ok(answer);
                    } else if status.is_server_error() && attempt < retry_attempts {
                        warn!(
                            status = %status,
                            attempt = attempt + 1,
                            "Resolver returned server error, retrying..."
                        );
                        backoff(attempt).await;
                        last_error = Some(ResolverError::Status {
                            status: status.as_u16(),
                        });
                        continue;
                    } else {
                        return Err(ResolverError::Status {
                            status: status.as_u16(),
                        });
                    }
                }
                Err(e) if e.is_timeout() => {
                    return Err(ResolverError::Timeout(timeout));
                }
                Err(e) if attempt < retry_attempts => {
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        "Resolver network error, retrying..."
                    );
                    backoff(attempt).await;
                    last_error = Some(ResolverError::Request(e.to_string()));
                    continue;
                }
                Err(e) => {
                    return Err(ResolverError::Request(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ResolverError::Request("retries exhausted".to_string())))
    }
}

async fn backoff(attempt: usize) {
    let backoff_ms = 100 * 2_u64.pow(attempt as u32);
    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
}

/// Extract the answer from a response body. Non-string answers are
/// returned as their JSON text.
fn parse_answer(body: &str) -> Result<String, ResolverError> {
    let parsed: ResolverResponse = serde_json::from_str(body)
        .map_err(|e| ResolverError::InvalidResponse(format!("invalid JSON: {e}")))?;

    match parsed.answer {
        serde_json::Value::String(answer) => Ok(answer),
        serde_json::Value::Null => Err(ResolverError::InvalidResponse(
            "answer is null".to_string(),
        )),
        other => Ok(other.to_string()),
    }
}

#[async_trait]
impl AnswerResolver for HttpResolver {
    async fn fetch_answer(&self, request: &ResolveRequest) -> Result<String, ResolverError> {
        self.call_service(request).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer, retry_attempts: usize) -> HttpResolver {
        HttpResolver::new(
            HttpResolverConfig::new(format!("{}/answer", server.uri()))
                .with_timeout_ms(2000)
                .with_retry_attempts(retry_attempts),
        )
    }

    #[test]
    fn test_parse_answer_variants() {
        assert_eq!(parse_answer(r#"{"answer": "abc"}"#).unwrap(), "abc");
        assert_eq!(parse_answer(r#"{"answer": 42}"#).unwrap(), "42");
        assert!(matches!(
            parse_answer(r#"{"answer": null}"#),
            Err(ResolverError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_answer("not json"),
            Err(ResolverError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_resolver_success_sends_request_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .and(body_json(json!({
                "task_id": "GA1.3",
                "question": "hash it",
                "file_path": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "deadbeef"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server, 0);
        let answer = resolver
            .fetch_answer(&ResolveRequest::new("GA1.3", "hash it"))
            .await
            .unwrap();

        assert_eq!(answer, "deadbeef");
    }

    #[tokio::test]
    async fn test_resolver_retries_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "ok"})))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server, 2);
        let answer = resolver
            .fetch_answer(&ResolveRequest::new("GA1.4", "sum"))
            .await
            .unwrap();

        assert_eq!(answer, "ok");
    }

    #[tokio::test]
    async fn test_resolver_client_error_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server, 3);
        let result = resolver
            .fetch_answer(&ResolveRequest::new("GA1.5", "q"))
            .await;

        assert!(matches!(result, Err(ResolverError::Status { status: 400 })));
    }

    #[tokio::test]
    async fn test_resolver_exhausts_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server, 1);
        let result = resolver
            .fetch_answer(&ResolveRequest::new("GA1.7", "q"))
            .await;

        assert!(matches!(result, Err(ResolverError::Status { status: 500 })));
    }

    #[tokio::test]
    async fn test_resolver_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/answer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let resolver = HttpResolver::new(
            HttpResolverConfig::new(format!("{}/answer", mock_server.uri()))
                .with_timeout_ms(50)
                .with_retry_attempts(0),
        );
        let result = resolver
            .fetch_answer(&ResolveRequest::new("GA1.8", "q"))
            .await;

        assert!(matches!(result, Err(ResolverError::Timeout(_))));
    }
}
