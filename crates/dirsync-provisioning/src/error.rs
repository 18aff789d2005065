//! Provisioning error types

use thiserror::Error;

/// Errors raised while building entities from upstream input.
///
/// These are raised before any directory I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A required identifier normalized to nothing.
    #[error("{field} is empty after normalization (input: {input:?})")]
    EmptyField { field: &'static str, input: String },
}

impl ModelError {
    pub(crate) fn empty(field: &'static str, input: &str) -> Self {
        ModelError::EmptyField {
            field,
            input: input.to_string(),
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::EmptyField { .. } => "CONSTRUCTION_ERROR",
        }
    }
}

/// Result type for entity construction.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while turning a change document into an intent.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document is not well-formed XML.
    #[error("malformed document: {message}")]
    Malformed { message: String },

    /// The document does not describe any supported intent.
    #[error("unsupported document: no user, group or membership change found")]
    Unsupported,

    /// A required field is absent.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// The document could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractError::Malformed { .. } => "MALFORMED_DOCUMENT",
            ExtractError::Unsupported => "UNSUPPORTED_DOCUMENT",
            ExtractError::MissingField { .. } => "MISSING_FIELD",
            ExtractError::Io { .. } => "IO_ERROR",
        }
    }

    pub(crate) fn malformed(message: impl std::fmt::Display) -> Self {
        ExtractError::Malformed {
            message: message.to_string(),
        }
    }
}

/// Result type for intent extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;
