//! Report Pipeline
//!
//! Runs the documentation stages in order and assembles the final report.
//!
//! # Stages
//! 1. Load the schema and drop excluded tables
//! 2. Render the ER diagram (a failure aborts the run)
//! 3. Write the data dictionary and convert it to PDF (a failure drops the section)
//! 4. Build the cover page and convert it to PDF (a failure aborts the run)
//! 5. Merge cover, dictionary and diagram into the report
//!
//! Intermediate files are removed once the run ends, whatever the outcome.
//! The spreadsheet is kept next to the report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::sidecar::{COVER_TEMPLATE_FILE, DETAILS_FILE, EXCLUDED_TABLES_FILE};
use crate::config::{ExclusionList, ReportDetails};
use crate::cover;
use crate::diagram;
use crate::dictionary;
use crate::engine::{SchemaInfo, SchemaSource};
use crate::error::AutodocError;
use crate::tools::{convert_to_pdf, merge_pdfs, Toolchain};

/// Timestamp format qualifying every file of a run
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Locations of every file a run reads or writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunPaths {
    pub dir: PathBuf,
    pub diagram_pdf: PathBuf,
    pub cover_docx: PathBuf,
    pub cover_pdf: PathBuf,
    pub dictionary_xlsx: PathBuf,
    pub dictionary_pdf: PathBuf,
    pub report: PathBuf,
}

impl RunPaths {
    /// Paths for a run against `database` at `timestamp`
    #[must_use]
    pub fn new(dir: &Path, database: &str, timestamp: &str) -> Self {
        let file = |name: String| dir.join(name);
        Self {
            dir: dir.to_path_buf(),
            diagram_pdf: file(format!("temp_er_{timestamp}.pdf")),
            cover_docx: file(format!("temp_intro_{timestamp}.docx")),
            cover_pdf: file(format!("temp_intro_{timestamp}.pdf")),
            dictionary_xlsx: file(format!("Autodoc_DataDictionary_{timestamp}.xlsx")),
            dictionary_pdf: file(format!("Autodoc_DataDictionary_{timestamp}.pdf")),
            report: file(format!("Autodoc_{database}_{timestamp}.pdf")),
        }
    }

    /// Paths for a run starting now
    #[must_use]
    pub fn for_run(dir: &Path, database: &str) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::new(dir, database, &timestamp)
    }

    /// Files removed when the run ends
    #[must_use]
    pub fn intermediates(&self) -> [&Path; 4] {
        [&self.diagram_pdf, &self.cover_docx, &self.cover_pdf, &self.dictionary_pdf]
    }
}

/// Pipeline stage, as reported on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Diagram,
    Dictionary,
    Cover,
    Merge,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diagram => "diagram",
            Self::Dictionary => "dictionary",
            Self::Cover => "cover",
            Self::Merge => "merge",
        }
    }

    fn failed(self) -> impl FnOnce(AutodocError) -> StageFailure {
        move |error| StageFailure { stage: self, error }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section of the merged report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Cover,
    DataDictionary,
    Diagram,
}

/// Error that ended a run, with the stage it happened in
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: AutodocError,
}

/// Result of one pipeline run
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Final report, present only when the merge succeeded
    pub report: Option<PathBuf>,

    /// Spreadsheet left in the output directory
    pub data_dictionary: Option<PathBuf>,

    /// Sections merged into the report, in page order
    pub sections: Vec<Section>,

    /// Tables documented after exclusions
    pub tables: Vec<String>,

    /// Soft failure of the dictionary stage
    pub dictionary_error: Option<AutodocError>,

    /// Failure that ended the run
    pub failure: Option<StageFailure>,
}

impl RunOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.report.is_some()
    }
}

/// Configured report pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    toolchain: Toolchain,
    details: ReportDetails,
    exclusions: ExclusionList,
    template: PathBuf,
}

impl Pipeline {
    #[must_use]
    pub const fn new(
        toolchain: Toolchain,
        details: ReportDetails,
        exclusions: ExclusionList,
        template: PathBuf,
    ) -> Self {
        Self { toolchain, details, exclusions, template }
    }

    /// Pipeline reading its sidecar files from `dir`
    #[must_use]
    pub fn from_dir(dir: &Path, toolchain: Toolchain) -> Self {
        let exclusions = ExclusionList::load(&dir.join(EXCLUDED_TABLES_FILE));
        let details = ReportDetails::load(&dir.join(DETAILS_FILE));
        tracing::info!(project = %details.project, title = %details.title, "Report details");
        if !exclusions.is_empty() {
            let excluded: Vec<&str> = exclusions.iter().collect();
            tracing::info!(excluded = ?excluded, "Excluding tables");
        }
        Self::new(toolchain, details, exclusions, dir.join(COVER_TEMPLATE_FILE))
    }

    #[must_use]
    pub const fn details(&self) -> &ReportDetails {
        &self.details
    }

    #[must_use]
    pub const fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// Run every stage, then remove the intermediate files
    pub async fn run<S: SchemaSource>(&self, source: &S, paths: &RunPaths) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        if let Err(failure) = self.execute(source, paths, &mut outcome).await {
            tracing::error!(stage = %failure.stage, "Aborting: {}", failure.error);
            outcome.failure = Some(failure);
        }

        cleanup(paths);
        if paths.dictionary_xlsx.exists() {
            outcome.data_dictionary = Some(paths.dictionary_xlsx.clone());
        }
        outcome
    }

    async fn execute<S: SchemaSource>(
        &self,
        source: &S,
        paths: &RunPaths,
        outcome: &mut RunOutcome,
    ) -> Result<(), StageFailure> {
        let schema = source.load_schema().await.map_err(Stage::Diagram.failed())?;
        let schema = schema.excluding(&self.exclusions);
        outcome.tables = schema.table_names().map(str::to_string).collect();
        tracing::info!(tables = outcome.tables.len(), "Schema loaded");

        diagram::render_pdf(&schema, &self.toolchain.dot, &paths.diagram_pdf)
            .await
            .map_err(Stage::Diagram.failed())?;

        let dictionary_pdf = match self.build_dictionary(&schema, paths).await {
            Ok(pdf) => Some(pdf),
            Err(e) => {
                tracing::warn!("Data dictionary skipped: {e}");
                outcome.dictionary_error = Some(e);
                None
            }
        };

        cover::write_cover(&self.template, &self.details, &paths.cover_docx)
            .map_err(Stage::Cover.failed())?;
        let cover_pdf = convert_to_pdf(&self.toolchain.soffice, &paths.cover_docx, &paths.dir)
            .await
            .map_err(Stage::Cover.failed())?;

        let mut inputs = vec![cover_pdf];
        let mut sections = vec![Section::Cover];
        if let Some(pdf) = dictionary_pdf {
            inputs.push(pdf);
            sections.push(Section::DataDictionary);
        }
        inputs.push(paths.diagram_pdf.clone());
        sections.push(Section::Diagram);

        merge_pdfs(&self.toolchain.pdfunite, &inputs, &paths.report)
            .await
            .map_err(Stage::Merge.failed())?;

        tracing::info!(path = %paths.report.display(), "Final report saved");
        outcome.report = Some(paths.report.clone());
        outcome.sections = sections;
        Ok(())
    }

    async fn build_dictionary(
        &self,
        schema: &SchemaInfo,
        paths: &RunPaths,
    ) -> crate::Result<PathBuf> {
        dictionary::write_xlsx(schema, &self.details, &paths.dictionary_xlsx)?;
        convert_to_pdf(&self.toolchain.soffice, &paths.dictionary_xlsx, &paths.dir).await
    }
}

/// Remove intermediate files, ignoring the ones that were never created
fn cleanup(paths: &RunPaths) {
    for path in paths.intermediates() {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed intermediate file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), "Could not remove intermediate file: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TableInfo;
    use crate::tools::ToolCommand;
    use pretty_assertions::assert_eq;

    struct FailingSource;

    impl SchemaSource for FailingSource {
        async fn load_schema(&self) -> crate::Result<SchemaInfo> {
            Err(AutodocError::connection_failed("connection refused"))
        }
    }

    struct FixedSource(Vec<&'static str>);

    impl SchemaSource for FixedSource {
        async fn load_schema(&self) -> crate::Result<SchemaInfo> {
            Ok(SchemaInfo::new(
                self.0
                    .iter()
                    .map(|name| TableInfo { name: (*name).to_string(), ..Default::default() })
                    .collect(),
            ))
        }
    }

    fn missing_tools() -> Toolchain {
        Toolchain {
            dot: ToolCommand::new("autodoc-test-missing-dot"),
            soffice: ToolCommand::new("autodoc-test-missing-soffice"),
            pdfunite: ToolCommand::new("autodoc-test-missing-pdfunite"),
        }
    }

    #[test]
    fn test_run_paths_naming() {
        let paths = RunPaths::new(Path::new("/out"), "shop", "20240102_030405");
        assert_eq!(paths.diagram_pdf, Path::new("/out/temp_er_20240102_030405.pdf"));
        assert_eq!(paths.cover_docx, Path::new("/out/temp_intro_20240102_030405.docx"));
        assert_eq!(paths.cover_pdf, Path::new("/out/temp_intro_20240102_030405.pdf"));
        assert_eq!(
            paths.dictionary_xlsx,
            Path::new("/out/Autodoc_DataDictionary_20240102_030405.xlsx")
        );
        assert_eq!(
            paths.dictionary_pdf,
            Path::new("/out/Autodoc_DataDictionary_20240102_030405.pdf")
        );
        assert_eq!(paths.report, Path::new("/out/Autodoc_shop_20240102_030405.pdf"));
    }

    #[test]
    fn test_intermediates_exclude_outputs() {
        let paths = RunPaths::new(Path::new("/out"), "shop", "ts");
        let intermediates = paths.intermediates();
        assert!(!intermediates.contains(&paths.report.as_path()));
        assert!(!intermediates.contains(&paths.dictionary_xlsx.as_path()));
    }

    #[test]
    fn test_timestamp_format_shape() {
        let paths = RunPaths::for_run(Path::new("/out"), "shop");
        let name = paths.report.file_name().unwrap().to_string_lossy().into_owned();
        // Autodoc_shop_YYYYMMDD_HHMMSS.pdf
        assert_eq!(name.len(), "Autodoc_shop_".len() + 15 + ".pdf".len());
    }

    #[tokio::test]
    async fn test_schema_failure_is_diagram_stage() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), "shop", "ts");
        let pipeline = Pipeline::from_dir(dir.path(), missing_tools());

        let outcome = pipeline.run(&FailingSource, &paths).await;

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.stage, Stage::Diagram);
        assert_eq!(failure.error.error_code(), "CONNECTION_FAILED");
        assert!(outcome.report.is_none());
    }

    #[tokio::test]
    async fn test_missing_graphviz_aborts_before_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), "shop", "ts");
        let pipeline = Pipeline::from_dir(dir.path(), missing_tools());

        let outcome = pipeline.run(&FixedSource(vec!["users"]), &paths).await;

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.stage, Stage::Diagram);
        assert!(failure.error.message().contains("Please install Graphviz"));
        assert!(outcome.data_dictionary.is_none());
        assert!(!paths.dictionary_xlsx.exists());
    }

    #[tokio::test]
    async fn test_exclusions_applied_from_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(EXCLUDED_TABLES_FILE), "audit_log, sessions").unwrap();
        let paths = RunPaths::new(dir.path(), "shop", "ts");
        let pipeline = Pipeline::from_dir(dir.path(), missing_tools());

        let source = FixedSource(vec!["users", "sessions", "audit_log", "orders"]);
        let outcome = pipeline.run(&source, &paths).await;

        assert_eq!(outcome.tables, vec!["orders", "users"]);
        let excluded: Vec<&str> = pipeline.exclusions().iter().collect();
        assert_eq!(excluded, vec!["audit_log", "sessions"]);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Dictionary.to_string(), "dictionary");
        assert_eq!(serde_json::to_string(&Section::DataDictionary).unwrap(), "\"data_dictionary\"");
    }
}
