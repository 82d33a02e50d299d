//! Question answering: classify, then answer from the table or the resolver

use crate::catalog::TaskCatalog;
use crate::classifier::{classify, is_unknown};
use crate::error::DeskResult;
use crate::observability::metrics;
use crate::resolver::{AnswerResolver, ResolveRequest};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fallback when a task has no canned answer
pub const NO_ANSWER: &str = "No answer found for this task.";

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Table,
    Resolver,
    Fallback,
}

/// Result of answering one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub task_id: String,
    pub answer: String,
    pub source: AnswerSource,
}

pub struct AnswerService {
    catalog: Arc<TaskCatalog>,
    resolver: Arc<dyn AnswerResolver>,
    computed_tasks: BTreeSet<String>,
}

impl AnswerService {
    pub fn new(
        catalog: Arc<TaskCatalog>,
        resolver: Arc<dyn AnswerResolver>,
        computed_tasks: BTreeSet<String>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            computed_tasks,
        }
    }

    pub fn catalog(&self) -> &Arc<TaskCatalog> {
        &self.catalog
    }

    pub fn is_computed(&self, task_id: &str) -> bool {
        self.computed_tasks.contains(task_id)
    }

    /// Classify against the current snapshot only
    pub fn classify(&self, question: &str) -> String {
        classify(&self.catalog.snapshot().keywords, question)
    }

    /// Answer a question, optionally with the path of a saved upload.
    ///
    /// Computed tasks go to the resolver; resolver failures are returned as
    /// errors. Everything else, including unknown questions, is answered from
    /// the table with [`NO_ANSWER`] as the fallback.
    pub async fn answer(&self, question: &str, file_path: Option<&str>) -> DeskResult<AnswerOutcome> {
        let table = self.catalog.snapshot();
        let task_id = classify(&table.keywords, question);

        metrics().question_classified(is_unknown(&task_id));
        debug!(task_id = %task_id, "Classified question");

        if self.is_computed(&task_id) {
            let request = ResolveRequest::new(task_id.clone(), question)
                .with_file_path(file_path.map(str::to_string));

            let result = self.resolver.fetch_answer(&request).await;
            metrics().resolver_call(result.is_ok());

            let answer = result.map_err(|e| {
                warn!(task_id = %task_id, resolver = self.resolver.name(), error = %e, "Resolver failed");
                e
            })?;

            info!(task_id = %task_id, resolver = self.resolver.name(), "Answered from resolver");
            return Ok(AnswerOutcome {
                task_id,
                answer,
                source: AnswerSource::Resolver,
            });
        }

        let outcome = match table.answer_for(&task_id) {
            Some(answer) => AnswerOutcome {
                answer: answer.to_string(),
                task_id,
                source: AnswerSource::Table,
            },
            None => AnswerOutcome {
                answer: NO_ANSWER.to_string(),
                task_id,
                source: AnswerSource::Fallback,
            },
        };

        metrics().canned_answer(outcome.source == AnswerSource::Table);
        Ok(outcome)
    }
}
