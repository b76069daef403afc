//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Autodoc.
//! Every error maps to a stable error code used by the `--json` run summary.
//!
//! # Error Categories
//! - `InvalidInput`: Missing or malformed connection parameters
//! - `ConnectionFailed`: Database connection errors
//! - `EngineError`: Engine-specific introspection errors
//! - `ConfigError`: Settings file or environment errors
//! - `ToolNotFound` / `ToolFailed` / `OutputMissing`: External process failures
//! - `DocumentError`: Spreadsheet or DOCX generation errors

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Autodoc operations
#[derive(Error, Debug)]
pub enum AutodocError {
    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Configuration error (invalid settings file, unset environment variable, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// External binary is not installed or not on `PATH`
    #[error("'{tool}' command not found. Please install {package}.")]
    ToolNotFound { tool: String, package: String },

    /// External process ran but reported failure
    #[error("'{tool}' failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    /// External process exited cleanly but its output file is absent
    #[error("Expected output file not found: {}", .0.display())]
    OutputMissing(PathBuf),

    /// Spreadsheet or document generation error
    #[error("Document error: {0}")]
    DocumentError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutodocError {
    /// Convert error to error code string for JSON output
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ToolNotFound { .. } => "TOOL_NOT_FOUND",
            Self::ToolFailed { .. } => "TOOL_FAILED",
            Self::OutputMissing(_) => "OUTPUT_MISSING",
            Self::DocumentError(_) => "DOCUMENT_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Get human-readable error message
    ///
    /// Messages never contain the database password.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a tool-not-found error
    pub fn tool_not_found(tool: impl Into<String>, package: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into(), package: package.into() }
    }

    /// Create a tool failure error
    pub fn tool_failed(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ToolFailed { tool: tool.into(), detail: detail.into() }
    }

    /// Create a document generation error
    pub fn document_error(message: impl Into<String>) -> Self {
        Self::DocumentError(message.into())
    }
}

/// Result type alias for Autodoc operations
pub type Result<T> = std::result::Result<T, AutodocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AutodocError::invalid_input("test").error_code(), "INVALID_INPUT");
        assert_eq!(AutodocError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(AutodocError::engine_error("postgres", "test").error_code(), "ENGINE_ERROR");
        assert_eq!(AutodocError::config_error("test").error_code(), "CONFIG_ERROR");
        assert_eq!(AutodocError::tool_not_found("dot", "Graphviz").error_code(), "TOOL_NOT_FOUND");
        assert_eq!(AutodocError::tool_failed("dot", "exit 1").error_code(), "TOOL_FAILED");
        assert_eq!(
            AutodocError::OutputMissing(PathBuf::from("/tmp/x.pdf")).error_code(),
            "OUTPUT_MISSING"
        );
        assert_eq!(AutodocError::document_error("test").error_code(), "DOCUMENT_ERROR");
    }

    #[test]
    fn test_tool_not_found_is_actionable() {
        let err = AutodocError::tool_not_found("soffice", "LibreOffice");
        assert_eq!(err.message(), "'soffice' command not found. Please install LibreOffice.");
    }

    #[test]
    fn test_error_messages() {
        let err = AutodocError::engine_error("postgres", "connection timeout");
        assert!(err.message().contains("postgres"));
        assert!(err.message().contains("connection timeout"));

        let err = AutodocError::OutputMissing(PathBuf::from("/tmp/out/report.pdf"));
        assert!(err.message().contains("/tmp/out/report.pdf"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AutodocError = io.into();
        assert!(matches!(err, AutodocError::Io(_)));
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
