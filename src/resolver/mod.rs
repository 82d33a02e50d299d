//! Answer resolution for computed tasks
//!
//! Some task ids cannot be answered from the canned answer table: the answer
//! depends on the question text or an uploaded file. Those are delegated to an
//! [`AnswerResolver`]. The production implementation is [`HttpResolver`],
//! which forwards the request to an external service.

pub mod http;

pub use http::{HttpResolver, HttpResolverConfig};

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Request handed to a resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveRequest {
    pub task_id: String,
    pub question: String,
    /// Path of the saved upload, empty when no file was sent
    #[serde(serialize_with = "serialize_file_path")]
    pub file_path: Option<String>,
}

fn serialize_file_path<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

impl ResolveRequest {
    pub fn new(task_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            question: question.into(),
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, file_path: Option<String>) -> Self {
        self.file_path = file_path;
        self
    }
}

/// Resolver failures
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Resolver request failed: {0}")]
    Request(String),

    #[error("Resolver timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Resolver returned status {status}")]
    Status { status: u16 },

    #[error("Invalid resolver response: {0}")]
    InvalidResponse(String),

    #[error("No resolver answer for task '{0}'")]
    Unsupported(String),
}

/// External source of answers for computed tasks
#[async_trait]
pub trait AnswerResolver: Send + Sync {
    /// Produce an answer for the given task
    async fn fetch_answer(&self, request: &ResolveRequest) -> Result<String, ResolverError>;

    /// Resolver name for logs
    fn name(&self) -> &str;
}

/// Resolver with fixed answers per task id
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    answers: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, task_id: impl Into<String>, answer: impl Into<String>) -> Self {
        self.answers.insert(task_id.into(), answer.into());
        self
    }
}

#[async_trait]
impl AnswerResolver for StaticResolver {
    async fn fetch_answer(&self, request: &ResolveRequest) -> Result<String, ResolverError> {
        self.answers
            .get(&request.task_id)
            .cloned()
            .ok_or_else(|| ResolverError::Unsupported(request.task_id.clone()))
    }

    fn name(&self) -> &str {
        "static"
    }
}
