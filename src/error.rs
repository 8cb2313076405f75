//! Error types for the ebook corpus toolkit
//!
//! This module provides the error hierarchy used across extraction,
//! source acquisition and corpus assembly, built on `thiserror`.

use thiserror::Error;

/// The main error type for corpus operations
#[derive(Error, Debug)]
pub enum Error {
    /// Markup or metadata extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Repository listing and cloning errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Unusable concordance keyword
    #[error("Invalid search query: {0}")]
    Query(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Markup and metadata extraction errors
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Document bytes are not valid UTF-8
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Element not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid selector
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Repository listing and acquisition errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// GITHUB_TOKEN is not set
    #[error("GITHUB_TOKEN environment variable not set")]
    MissingToken,

    /// Invalid API URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Non-success HTTP response
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Response payload did not have the expected shape
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// `git clone` exited unsuccessfully
    #[error("git clone of {repo} failed: {stderr}")]
    CloneFailed {
        /// Repository that failed to clone
        repo: String,
        /// Captured stderr of the git process
        stderr: String,
    },
}

/// Result type alias for corpus operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Extraction(ExtractionError::ElementNotFound("dc:title".to_string()));
        assert!(err.to_string().contains("Element not found"));
        assert!(err.to_string().contains("dc:title"));
    }

    #[test]
    fn test_source_error() {
        let err = SourceError::Http {
            status: 403,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 403: rate limited");
    }

    #[test]
    fn test_clone_failed() {
        let err = SourceError::CloneFailed {
            repo: "jane-austen_emma".to_string(),
            stderr: "not found".to_string(),
        };
        assert!(err.to_string().contains("jane-austen_emma"));
    }

    #[test]
    fn test_encoding_error_converts() {
        let bytes = [0x66, 0xff, 0x6f];
        let utf8 = std::str::from_utf8(&bytes).unwrap_err();
        let err: Error = ExtractionError::from(utf8).into();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn test_generic_error() {
        let err = Error::generic("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
