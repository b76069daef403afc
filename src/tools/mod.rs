//! External Tool Wrappers
//!
//! Autodoc delegates rendering to three external programs:
//! - `dot` (Graphviz) renders the ER diagram
//! - `soffice` (LibreOffice) converts the spreadsheet and cover page to PDF
//! - `pdfunite` (poppler-utils) concatenates the PDFs
//!
//! Each program is described by a [`ToolCommand`] so that settings files can
//! point at a different binary or a wrapper (e.g. `flatpak run ...`).
//! A binary missing from `PATH` is reported as [`AutodocError::ToolNotFound`]
//! naming the package to install.

pub mod office;
pub mod pdfunite;

use std::io;

use tokio::process::Command;

use crate::error::AutodocError;

pub use office::convert_to_pdf;
pub use pdfunite::merge_pdfs;

pub const GRAPHVIZ_PACKAGE: &str = "Graphviz";
pub const OFFICE_PACKAGE: &str = "LibreOffice";
pub const POPPLER_PACKAGE: &str = "poppler-utils";

/// Program plus leading arguments for an external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    /// Append leading arguments placed before the tool-specific ones
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn leading_args(&self) -> &[String] {
        &self.args
    }

    /// Build a process command with the leading arguments applied
    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        command
    }
}

/// The set of external tools used by one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub dot: ToolCommand,
    pub soffice: ToolCommand,
    pub pdfunite: ToolCommand,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            dot: ToolCommand::new("dot"),
            soffice: ToolCommand::new("soffice"),
            pdfunite: ToolCommand::new("pdfunite"),
        }
    }
}

/// Map a spawn failure to an actionable error
pub(crate) fn launch_error(tool: &ToolCommand, package: &str, err: io::Error) -> AutodocError {
    if err.kind() == io::ErrorKind::NotFound {
        AutodocError::tool_not_found(tool.program(), package)
    } else {
        AutodocError::tool_failed(tool.program(), format!("could not start process: {err}"))
    }
}
