//! Error types for imgharvest.
//!
//! [`HarvestError`] covers fatal setup failures (missing document, bad
//! configuration) as well as the per-item failures that the pipelines catch,
//! count and report without aborting.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// The source document does not exist.
    #[error("PDF file not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The configuration file could not be parsed or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF backend could not parse or decode something.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// An embedded image uses an encoding that cannot be written out.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
}

impl HarvestError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        HarvestError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the error stops a run before any work is done.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarvestError::DocumentNotFound(_) | HarvestError::Config(_)
        )
    }
}
