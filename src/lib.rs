//! Autodoc - Database Documentation Generator
//!
//! Autodoc documents a `PostgreSQL` schema as a single PDF report: a cover page,
//! a data dictionary and an entity-relationship diagram, in that order.
//!
//! # Architecture
//! The schema is introspected once into an in-memory [`SchemaInfo`]. Each
//! later stage writes one file, and layout and PDF rendering are delegated to
//! external programs (Graphviz, LibreOffice, poppler).
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - Settings files and sidecar inputs
//! - [`engine`] - Schema types and `PostgreSQL` introspection
//! - [`diagram`] - ER diagram as DOT, rendered with `dot`
//! - [`dictionary`] - Data-dictionary spreadsheet
//! - [`cover`] - Cover-page document
//! - [`tools`] - Office conversion and PDF merging
//! - [`pipeline`] - Stage orchestration and cleanup
//! - [`intake`] - Connection parameters from flags, settings and prompts
//! - [`output`] - Run summaries (plain text and JSON envelopes)
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod cover;
pub mod diagram;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod intake;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod tools;

pub use config::{ExclusionList, ReportDetails, Settings, StoredConnection};
pub use engine::postgres::PostgresEngine;
pub use engine::{
    ColumnInfo, ConnectionConfig, ForeignKeyInfo, IndexInfo, SchemaInfo, SchemaSource, TableInfo,
    UniqueConstraintInfo,
};
pub use error::{AutodocError, Result};
pub use intake::{resolve_connection, ConnectionArgs, NoPrompt, Prompter, TerminalPrompter};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use pipeline::{Pipeline, RunOutcome, RunPaths, Section, Stage, StageFailure};
pub use tools::{ToolCommand, Toolchain};
