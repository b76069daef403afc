//! Headless office-document conversion via LibreOffice

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::{AutodocError, Result};
use crate::tools::{launch_error, ToolCommand, OFFICE_PACKAGE};

/// Stderr noise LibreOffice prints on systems without a Java runtime
const BENIGN_STDERR: &str = "javaldx";

/// Convert `input` to PDF inside `output_dir`
///
/// Runs `soffice --headless --convert-to pdf <input> --outdir <output_dir>` and
/// returns the path of the produced PDF, `<output_dir>/<input stem>.pdf`.
pub async fn convert_to_pdf(
    tool: &ToolCommand,
    input: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    tracing::info!(input = %input.display(), "Converting to PDF");

    let output = tool
        .command()
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg(input)
        .arg("--outdir")
        .arg(output_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| launch_error(tool, OFFICE_PACKAGE, e))?;

    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(AutodocError::tool_failed(
            tool.program(),
            format!("{} {}", output.status, stderr.trim()).trim_end().to_string(),
        ));
    }

    if let Some(message) = surfaced_stderr(&stderr) {
        tracing::warn!(tool = tool.program(), "LibreOffice output: {message}");
    }

    let pdf_path = expected_pdf_path(input, output_dir)?;
    if !pdf_path.exists() {
        return Err(AutodocError::OutputMissing(pdf_path));
    }

    tracing::info!(output = %pdf_path.display(), "Converted to PDF");
    Ok(pdf_path)
}

/// Path LibreOffice writes the PDF rendering of `input` to
pub fn expected_pdf_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        AutodocError::invalid_input(format!("Not a file path: {}", input.display()))
    })?;

    let mut file_name = stem.to_os_string();
    file_name.push(".pdf");
    Ok(output_dir.join(file_name))
}

/// Stderr worth showing to the user, if any
fn surfaced_stderr(stderr: &str) -> Option<&str> {
    let trimmed = stderr.trim();
    if trimmed.is_empty() || trimmed.contains(BENIGN_STDERR) {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_pdf_path() {
        let pdf = expected_pdf_path(
            Path::new("/work/Autodoc_DataDictionary_20240101_120000.xlsx"),
            Path::new("/out"),
        )
        .unwrap();
        assert_eq!(pdf, PathBuf::from("/out/Autodoc_DataDictionary_20240101_120000.pdf"));

        let pdf = expected_pdf_path(Path::new("temp_intro.docx"), Path::new("/out")).unwrap();
        assert_eq!(pdf, PathBuf::from("/out/temp_intro.pdf"));
    }

    #[test]
    fn test_expected_pdf_path_rejects_root() {
        assert!(expected_pdf_path(Path::new("/"), Path::new("/out")).is_err());
    }

    #[test]
    fn test_benign_stderr_suppressed() {
        assert_eq!(surfaced_stderr(""), None);
        assert_eq!(surfaced_stderr("  \n"), None);
        assert_eq!(
            surfaced_stderr("javaldx: Could not find a Java Runtime Environment!\n"),
            None
        );
        assert_eq!(surfaced_stderr("Error: source file could not be loaded\n"), Some("Error: source file could not be loaded"));
    }

    #[tokio::test]
    async fn test_missing_converter_reports_install_hint() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cover.docx");
        std::fs::write(&input, b"docx").unwrap();

        let tool = ToolCommand::new("autodoc-test-missing-soffice");
        let err = convert_to_pdf(&tool, &input, dir.path()).await.unwrap_err();
        assert!(matches!(err, AutodocError::ToolNotFound { .. }));
        assert!(err.message().contains("Please install LibreOffice"));
    }
}
