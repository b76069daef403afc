//! PDF concatenation via poppler's `pdfunite`

use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::{AutodocError, Result};
use crate::tools::{launch_error, ToolCommand, POPPLER_PACKAGE};

/// Concatenate `inputs` into `output`, preserving their order
pub async fn merge_pdfs(tool: &ToolCommand, inputs: &[PathBuf], output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(AutodocError::invalid_input("No PDFs to merge"));
    }

    tracing::info!(count = inputs.len(), output = %output.display(), "Merging PDFs");

    let result = tool
        .command()
        .args(inputs)
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| launch_error(tool, POPPLER_PACKAGE, e))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AutodocError::tool_failed(
            tool.program(),
            format!("{} {}", result.status, stderr.trim()).trim_end().to_string(),
        ));
    }

    if !output.exists() {
        return Err(AutodocError::OutputMissing(output.to_path_buf()));
    }

    Ok(())
}
