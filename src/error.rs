//! Error types for the answer desk
//!
//! Each subsystem has its own error enum; [`DeskError`] folds them together for
//! request handling and maps them to the public JSON error body.

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::resolver::ResolverError;
use crate::uploads::UploadError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const MAX_DETAILS_LEN: usize = 500;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

/// Main error type for request handling
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Answer resolver failed: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// JSON body returned for failed requests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl DeskError {
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            DeskError::InvalidRequest { .. } => 400,
            DeskError::Upload(UploadError::TooLarge { .. }) => 413,
            _ => 500,
        }
    }

    /// Public error body with sanitized details
    pub fn to_error_body(&self) -> ErrorBody {
        let error = match self.status_code() {
            400 => "Bad Request",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        };

        ErrorBody {
            error: error.to_string(),
            details: sanitize_error_message(&self.to_string()),
        }
    }
}

/// Redact secrets and sensitive paths, and cap the length
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_DETAILS_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_DETAILS_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for answer desk operations
pub type DeskResult<T> = Result<T, DeskError>;
