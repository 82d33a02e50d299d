//! Local storage for files uploaded alongside questions

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Upload persistence errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("File too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Error saving file: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploads into a single directory, keyed by client file name
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `bytes` under the final component of `filename`.
    ///
    /// An existing file with the same name is overwritten.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, UploadError> {
        let name = sanitize_file_name(filename)?;

        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(&name);
        debug!(path = %path.display(), size = bytes.len(), "Writing upload");
        tokio::fs::write(&path, bytes).await?;

        info!(file = %name, size = bytes.len(), "Saved uploaded file");
        Ok(path)
    }
}

/// Keep only the last path component of a client-supplied name
fn sanitize_file_name(filename: &str) -> Result<String, UploadError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(UploadError::NoFile);
    }

    let name = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(UploadError::InvalidFileName(filename.to_string()));
    }

    Ok(name.to_string())
}
