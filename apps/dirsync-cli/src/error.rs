//! CLI error types and exit codes

use dirsync_provisioning::ExtractError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: One or more operations did not succeed
/// - 3: Directory unreachable or listing incomplete
/// - 4: Invalid change document
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid change document {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: ExtractError,
    },

    #[error("Directory error: {0}\n\nTroubleshooting:\n  - Check host and port in the configuration\n  - Verify the bind DN and password\n  - Set RUST_LOG=debug for connection details")]
    Directory(String),

    #[error("Directory listing incomplete: {0}")]
    Listing(String),

    #[error("{failed} operation(s) did not succeed")]
    OperationsFailed { failed: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Json(_) => 1,
            CliError::OperationsFailed { .. } => 2,
            CliError::Directory(_) | CliError::Listing(_) => 3,
            CliError::Document { .. } => 4,
        }
    }

    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("missing".into()).exit_code(), 1);
        assert_eq!(CliError::OperationsFailed { failed: 2 }.exit_code(), 2);
        assert_eq!(CliError::Directory("refused".into()).exit_code(), 3);
        assert_eq!(CliError::Listing("groups: code 51".into()).exit_code(), 3);
        assert_eq!(
            CliError::Document {
                path: "a.xml".into(),
                source: ExtractError::Unsupported,
            }
            .exit_code(),
            4
        );
    }

    #[test]
    fn test_listing_error_has_no_connection_advice() {
        let err = CliError::Listing("groups: search failed with code 51: busy".into());
        assert_eq!(
            err.to_string(),
            "Directory listing incomplete: groups: search failed with code 51: busy"
        );
        assert!(!err.to_string().contains("Troubleshooting"));
    }

    #[test]
    fn test_document_error_message() {
        let err = CliError::Document {
            path: "inputs/AddUsuario1.xml".into(),
            source: ExtractError::MissingField { field: "Login" },
        };
        assert_eq!(
            err.to_string(),
            "Invalid change document inputs/AddUsuario1.xml: missing required field 'Login'"
        );
    }
}
