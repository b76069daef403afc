//! Cover-page document
//!
//! The cover page starts from the optional `model.docx` template (letterhead,
//! margins, styles) or a blank document. Every top-level paragraph of the
//! template is removed, then the title and description paragraphs are appended.
//! The template file itself is only ever read.

use std::fs::{self, File};
use std::path::Path;

use docx_rs::{read_docx, AlignmentType, DocumentChild, Docx, Paragraph, Run, RunFonts};

use crate::config::ReportDetails;
use crate::error::{AutodocError, Result};

const FONT: &str = "Arial";

/// 14pt, in the half-points DOCX uses for run sizes
const FONT_SIZE_HALF_POINTS: usize = 28;

/// Load `template` if it exists, otherwise start from a blank document
pub fn load_template(template: &Path) -> Result<Docx> {
    if !template.exists() {
        tracing::warn!(
            template = %template.display(),
            "Model file not found, using default blank document"
        );
        return Ok(Docx::new());
    }

    let bytes = fs::read(template)?;
    read_docx(&bytes).map_err(|e| {
        AutodocError::document_error(format!(
            "Could not read template {}: {e}",
            template.display()
        ))
    })
}

/// Remove every top-level paragraph, keeping tables and section settings
#[must_use]
pub fn clear_paragraphs(mut docx: Docx) -> Docx {
    docx.document.children.retain(|child| !matches!(child, DocumentChild::Paragraph(_)));
    docx
}

/// Replace the document body with the title and description paragraphs
#[must_use]
pub fn compose(docx: Docx, details: &ReportDetails) -> Docx {
    let title = Paragraph::new()
        .align(AlignmentType::Center)
        .add_run(styled_run(&details.title).bold());
    let description = Paragraph::new()
        .align(AlignmentType::Both)
        .add_run(styled_run(&details.description));

    clear_paragraphs(docx).add_paragraph(title).add_paragraph(description)
}

fn styled_run(text: &str) -> Run {
    Run::new()
        .add_text(text)
        .size(FONT_SIZE_HALF_POINTS)
        .fonts(RunFonts::new().ascii(FONT).hi_ansi(FONT).cs(FONT).east_asia(FONT))
}

/// Build the cover page from `template` and save it to `output`
pub fn write_cover(template: &Path, details: &ReportDetails, output: &Path) -> Result<()> {
    let docx = compose(load_template(template)?, details);

    let file = File::create(output)?;
    docx.build().pack(file).map_err(|e| {
        AutodocError::document_error(format!("Could not write {}: {e}", output.display()))
    })?;

    tracing::info!(path = %output.display(), "Intro document created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{ParagraphChild, RunChild, Table, TableCell, TableRow};
    use pretty_assertions::assert_eq;

    fn paragraph_texts(docx: &Docx) -> Vec<String> {
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
                _ => None,
            })
            .collect()
    }

    fn paragraph_text(paragraph: &Paragraph) -> String {
        let mut text = String::new();
        for child in &paragraph.children {
            if let ParagraphChild::Run(run) = child {
                for run_child in &run.children {
                    if let RunChild::Text(t) = run_child {
                        text.push_str(&t.text);
                    }
                }
            }
        }
        text
    }

    fn sales_details() -> ReportDetails {
        ReportDetails::parse("Title: Sales DB\nDescription: Monthly sales schema")
    }

    fn save(docx: Docx, path: &Path) {
        docx.build().pack(File::create(path).unwrap()).unwrap();
    }

    #[test]
    fn test_compose_blank_has_two_paragraphs() {
        let docx = compose(Docx::new(), &sales_details());
        assert_eq!(paragraph_texts(&docx), vec!["Sales DB", "Monthly sales schema"]);
    }

    #[test]
    fn test_compose_alignment_and_font() {
        let docx = compose(Docx::new(), &sales_details());
        let xml = String::from_utf8(docx.build().document).unwrap();
        assert!(xml.contains("\"center\""));
        assert!(xml.contains("\"both\""));
        assert!(xml.contains("Arial"));
        assert!(xml.contains("\"28\""));
    }

    #[test]
    fn test_compose_replaces_template_paragraphs() {
        let template = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("{{title}}")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("placeholder")))
            .add_table(Table::new(vec![TableRow::new(vec![TableCell::new()
                .add_paragraph(Paragraph::new().add_run(Run::new().add_text("letterhead")))])]));

        let docx = compose(template, &sales_details());
        assert_eq!(paragraph_texts(&docx), vec!["Sales DB", "Monthly sales schema"]);
        assert!(docx
            .document
            .children
            .iter()
            .any(|child| matches!(child, DocumentChild::Table(_))));
    }

    #[test]
    fn test_write_cover_from_template_leaves_template_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("model.docx");
        let output = dir.path().join("cover.docx");
        save(
            Docx::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text("old intro"))),
            &template,
        );
        let before = fs::read(&template).unwrap();

        write_cover(&template, &sales_details(), &output).unwrap();

        assert_eq!(fs::read(&template).unwrap(), before);
        let written = read_docx(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(paragraph_texts(&written), vec!["Sales DB", "Monthly sales schema"]);
    }

    #[test]
    fn test_write_cover_without_template() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("cover.docx");

        write_cover(&dir.path().join("model.docx"), &ReportDetails::default(), &output).unwrap();

        let written = read_docx(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(paragraph_texts(&written), vec!["Database Documentation", ""]);
    }

    #[test]
    fn test_corrupt_template_is_document_error() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("model.docx");
        fs::write(&template, b"not a zip").unwrap();

        let err = load_template(&template).unwrap_err();
        assert!(matches!(err, AutodocError::DocumentError(_)));
    }
}
