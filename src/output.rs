//! Run Summary Output
//!
//! A run ends with a summary on stdout: plain status lines by default, or a
//! single JSON envelope with `--json`.
//!
//! # Output Contract
//! - Success: `{"ok": true, "command": "generate", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "command": "generate", "error": {"code": "...", "message": "..."}, "meta": {...}}`

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AutodocError;
use crate::pipeline::{RunOutcome, Section, Stage};

/// Command name reported in envelopes
pub const COMMAND: &str = "generate";

/// Success envelope for a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,
    pub command: String,
    pub data: T,
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, command: command.into(), data, meta }
    }
}

/// Error envelope for a run that produced no report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,
    pub command: String,
    pub error: ErrorInfo,
    pub meta: Metadata,
}

impl ErrorEnvelope {
    pub fn new(command: impl Into<String>, error: ErrorInfo, meta: Metadata) -> Self {
        Self { ok: false, command: command.into(), error, meta }
    }

    /// Create error envelope from an `AutodocError`
    pub fn from_error(command: impl Into<String>, err: &AutodocError, meta: Metadata) -> Self {
        Self::new(command, ErrorInfo::from_error(err, None), meta)
    }
}

/// Error information structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g. "TOOL_NOT_FOUND")
    pub code: String,

    /// Human-readable message, never containing the password
    pub message: String,

    /// Pipeline stage the error happened in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ErrorInfo {
    #[must_use]
    pub fn from_error(err: &AutodocError, stage: Option<Stage>) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.message(),
            stage: stage.map(|s| s.as_str().to_string()),
        }
    }
}

/// Execution metadata included in every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Wall-clock time of the run in milliseconds
    pub execution_ms: u64,
}

impl Metadata {
    #[must_use]
    pub const fn new(execution_ms: u64) -> Self {
        Self { execution_ms }
    }
}

/// Data of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub report: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dictionary: Option<PathBuf>,

    pub sections: Vec<Section>,
    pub tables: Vec<String>,

    /// Non-fatal problems (a skipped data dictionary)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ErrorInfo>,
}

/// Serialize the outcome of a run as a JSON envelope
pub fn render_json(outcome: &RunOutcome, meta: Metadata) -> serde_json::Result<String> {
    match (&outcome.report, &outcome.failure) {
        (Some(report), _) => {
            let warnings = outcome
                .dictionary_error
                .iter()
                .map(|e| ErrorInfo::from_error(e, Some(Stage::Dictionary)))
                .collect();
            let data = RunReport {
                report: report.clone(),
                data_dictionary: outcome.data_dictionary.clone(),
                sections: outcome.sections.clone(),
                tables: outcome.tables.clone(),
                warnings,
            };
            serde_json::to_string_pretty(&SuccessEnvelope::new(COMMAND, data, meta))
        }
        (None, Some(failure)) => {
            let error = ErrorInfo::from_error(&failure.error, Some(failure.stage));
            serde_json::to_string_pretty(&ErrorEnvelope::new(COMMAND, error, meta))
        }
        (None, None) => {
            let error = ErrorInfo {
                code: "NO_REPORT".to_string(),
                message: "No report was produced".to_string(),
                stage: None,
            };
            serde_json::to_string_pretty(&ErrorEnvelope::new(COMMAND, error, meta))
        }
    }
}

/// Serialize an error raised before the pipeline started
pub fn render_json_error(err: &AutodocError, meta: Metadata) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ErrorEnvelope::from_error(COMMAND, err, meta))
}

/// Plain status lines for a finished run
#[must_use]
pub fn render_human(outcome: &RunOutcome) -> String {
    let mut out = String::new();

    if let Some(err) = &outcome.dictionary_error {
        let _ = writeln!(out, "Warning: data dictionary skipped: {}", err.message());
    }

    if let Some(failure) = &outcome.failure {
        let _ = writeln!(out, "Error: {}", failure.error.message());
        let summary = match failure.stage {
            Stage::Diagram => "Aborting: ER Diagram generation failed.",
            Stage::Dictionary => "Aborting: data dictionary generation failed.",
            Stage::Cover => "Failed to convert intro document to PDF.",
            Stage::Merge => "Failed to merge PDFs.",
        };
        let _ = writeln!(out, "{summary}");
    }

    if let Some(report) = &outcome.report {
        let _ = writeln!(out, "\nSUCCESS! Final Report saved to: {}", report.display());
    }

    if let Some(xlsx) = &outcome.data_dictionary {
        let _ = writeln!(out, "Data dictionary spreadsheet: {}", xlsx.display());
    }

    out
}
