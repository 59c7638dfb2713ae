//! Error types for propeval.

use thiserror::Error;

/// Result type for propeval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for propeval operations.
///
/// Malformed annotation payloads are NOT errors: the normalizer degrades
/// them to empty annotation sets so a comparison always produces a
/// well-defined metric. These variants cover genuine misuse of the API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A span with impossible bounds or missing content.
    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    /// Taxonomy configuration error.
    #[error("Taxonomy error: {0}")]
    Taxonomy(String),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid span error.
    pub fn invalid_span(msg: impl Into<String>) -> Self {
        Error::InvalidSpan(msg.into())
    }

    /// Create a taxonomy error.
    pub fn taxonomy(msg: impl Into<String>) -> Self {
        Error::Taxonomy(msg.into())
    }
}
