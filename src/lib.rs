//! Answer Desk
//!
//! A keyword-routed question answering service. Questions are classified
//! against an ordered keyword table loaded from a spreadsheet; the matching
//! task is answered either from the table's canned answers or by an external
//! resolver.
//!
//! # Overview
//!
//! - [`classifier`]: first-match-wins keyword classification
//! - [`catalog`]: task table loading (xlsx/xls/ods/csv) and snapshot reloads
//! - [`resolver`]: external answer resolution for computed tasks
//! - [`answer`]: picks canned or resolved answers
//! - [`uploads`]: local persistence of uploaded files
//! - [`server`]: warp HTTP routes
//!
//! # Quick Start
//!
//! ```rust
//! use answer_desk::classifier::{classify, KeywordSpec};
//!
//! let spec = KeywordSpec::from_pairs([
//!     ("GA1.1", "code -s, vs code"),
//!     ("GA1.2", "httpbin"),
//! ]);
//!
//! assert_eq!(classify(&spec, "What is the output of code -s?"), "GA1.1");
//! assert_eq!(classify(&spec, "Something else"), "Unknown");
//! ```

pub mod answer;
pub mod bootstrap;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod observability;
pub mod resolver;
pub mod server;
pub mod uploads;

pub use answer::{AnswerOutcome, AnswerService, AnswerSource, NO_ANSWER};
pub use catalog::{CatalogError, TaskCatalog, TaskTable};
pub use classifier::{classify, KeywordSpec, UNKNOWN_TASK};
pub use config::{ConfigError, DeskConfig};
pub use error::{DeskError, DeskResult};
pub use resolver::{AnswerResolver, ResolveRequest, ResolverError};
pub use uploads::{UploadError, UploadStore};
