//! Task catalog: the keyword table plus canned answers
//!
//! The catalog is loaded once at startup and handed to request handlers as an
//! immutable [`TaskTable`] snapshot. Reloading builds a complete new table and
//! swaps the `Arc`, so a request always sees one consistent version.

pub mod loader;

pub use loader::load_table;

use crate::classifier::KeywordSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Task table loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Task table not found: {0}")]
    NotFound(String),
    #[error("Unsupported task table format: '{0}'")]
    UnsupportedFormat(String),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read task table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Workbook contains no sheets")]
    EmptySheet,
}

/// One data row of the task table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_id: String,
    pub keywords: Option<String>,
    pub answer: Option<String>,
}

impl TaskRecord {
    /// Build a record from the first three cells of a row; blank cells are `None`.
    ///
    /// Id and keyword cells are trimmed. Answer text is kept exactly as stored.
    pub fn from_cells(cells: &[String]) -> Self {
        let raw = |idx: usize| cells.get(idx).filter(|value| !value.trim().is_empty());
        let trimmed = |idx: usize| raw(idx).map(|value| value.trim().to_string());

        Self {
            task_id: trimmed(0).unwrap_or_default(),
            keywords: trimmed(1),
            answer: raw(2).cloned(),
        }
    }
}

/// Immutable keyword table and canned answers
#[derive(Debug, Clone, Default)]
pub struct TaskTable {
    pub keywords: KeywordSpec,
    pub answers: BTreeMap<String, String>,
}

impl TaskTable {
    /// Build a table from data rows.
    ///
    /// Rows without a task id are skipped. A row only contributes a keyword
    /// entry when it has keywords, and only an answer when it has one.
    pub fn from_records<I: IntoIterator<Item = TaskRecord>>(records: I) -> Self {
        let mut table = Self::default();

        for record in records {
            if record.task_id.is_empty() {
                continue;
            }
            if let Some(keywords) = &record.keywords {
                table.keywords.insert(record.task_id.clone(), keywords);
            }
            if let Some(answer) = record.answer {
                table.answers.insert(record.task_id, answer);
            }
        }

        table
    }

    pub fn answer_for(&self, task_id: &str) -> Option<&str> {
        self.answers.get(task_id).map(String::as_str)
    }
}

/// Summary of the active snapshot, served by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub source: Option<String>,
    pub entries: usize,
    pub answers: usize,
    pub loaded_at: Option<DateTime<Utc>>,
    pub reloads: u64,
}

struct CatalogState {
    table: Arc<TaskTable>,
    source: Option<PathBuf>,
    loaded_at: Option<DateTime<Utc>>,
    reloads: u64,
}

/// Shared holder for the current task table snapshot
pub struct TaskCatalog {
    state: RwLock<CatalogState>,
}

impl TaskCatalog {
    /// Wrap an already built table
    pub fn new(table: TaskTable) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                table: Arc::new(table),
                source: None,
                loaded_at: Some(Utc::now()),
                reloads: 0,
            }),
        }
    }

    /// Load the table from disk and remember the source for reloads
    pub fn load(path: &Path, sheet: Option<&str>) -> Result<Self, CatalogError> {
        let table = load_table(path, sheet)?;
        let catalog = Self::new(table);
        catalog.write_state().source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Current snapshot; cheap to call per request
    pub fn snapshot(&self) -> Arc<TaskTable> {
        self.read_state().table.clone()
    }

    /// Swap in a new table
    pub fn replace(&self, table: TaskTable) {
        self.swap(table, None);
    }

    /// Install `table`, and `source` when given, under a single write guard
    fn swap(&self, table: TaskTable, source: Option<PathBuf>) {
        let mut state = self.write_state();
        state.table = Arc::new(table);
        if source.is_some() {
            state.source = source;
        }
        state.loaded_at = Some(Utc::now());
        state.reloads += 1;
    }

    /// Re-read the table from `path`. On failure the current snapshot stays.
    pub fn reload(&self, path: &Path, sheet: Option<&str>) -> Result<(), CatalogError> {
        match load_table(path, sheet) {
            Ok(table) => {
                self.swap(table, Some(path.to_path_buf()));
                info!(path = %path.display(), "Task catalog reloaded");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Task catalog reload failed, keeping previous table");
                Err(e)
            }
        }
    }

    pub fn status(&self) -> CatalogStatus {
        let state = self.read_state();
        CatalogStatus {
            source: state.source.as_ref().map(|p| p.display().to_string()),
            entries: state.table.keywords.len(),
            answers: state.table.answers.len(),
            loaded_at: state.loaded_at,
            reloads: state.reloads,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TaskCatalog {
    fn default() -> Self {
        Self::new(TaskTable::default())
    }
}
