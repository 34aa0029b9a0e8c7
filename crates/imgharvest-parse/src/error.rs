//! Error types for the parsing layer.
//!
//! Provides [`BackendError`] for lopdf-level failures and its conversion into
//! [`HarvestError`] so callers handle a single error type.

use imgharvest_core::HarvestError;
use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while walking a content stream.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// The image payload uses an encoding that cannot be written out.
    #[error("{0}")]
    Unsupported(String),
}

impl From<BackendError> for HarvestError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) | BackendError::Interpreter(msg) => HarvestError::Pdf(msg),
            BackendError::Io(e) => HarvestError::Pdf(e.to_string()),
            BackendError::Unsupported(msg) => HarvestError::UnsupportedImage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_parse() {
        let err = BackendError::Parse("invalid xref table".to_string());
        assert_eq!(err.to_string(), "PDF parse error: invalid xref table");
    }

    #[test]
    fn backend_error_io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn parse_and_interpreter_become_pdf_errors() {
        let err: HarvestError = BackendError::Parse("bad syntax".to_string()).into();
        assert!(matches!(err, HarvestError::Pdf(ref m) if m == "bad syntax"));

        let err: HarvestError = BackendError::Interpreter("unterminated array".to_string()).into();
        assert!(matches!(err, HarvestError::Pdf(_)));
    }

    #[test]
    fn unsupported_becomes_unsupported_image() {
        let err: HarvestError =
            BackendError::Unsupported("CCITTFaxDecode image /Im3".to_string()).into();
        assert!(matches!(err, HarvestError::UnsupportedImage(_)));
        assert!(err.to_string().contains("CCITTFaxDecode"));
    }
}
