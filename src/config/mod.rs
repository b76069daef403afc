//! Configuration Management
//!
//! This module loads optional settings files that pre-fill connection parameters
//! and override the external tool commands.
//!
//! # Configuration Locations
//! - Local: `<dir>/.autodoc/config.json` (per working directory)
//! - Global: `~/.config/autodoc/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit command-line flags (highest priority)
//! 2. Local settings file
//! 3. Global settings file
//! 4. Interactive prompt or built-in default
//!
//! # Example
//! ```json
//! {
//!   "connection": { "host": "db.internal", "user": "docs", "password_env": "DOCS_PG_PASSWORD" },
//!   "tools": { "soffice": ["flatpak", "run", "org.libreoffice.LibreOffice"] }
//! }
//! ```

pub mod sidecar;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AutodocError, Result};
use crate::tools::{ToolCommand, Toolchain};

pub use sidecar::{ExclusionList, ReportDetails};

/// Stored connection defaults
///
/// The password itself is never stored: `password_env` names an environment
/// variable to read it from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Schema to document (defaults to the server's `current_schema()`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Environment variable name for password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl StoredConnection {
    /// Resolve `password_env` into a password
    ///
    /// Returns `Ok(None)` when no variable is configured and an error when the
    /// variable is configured but unset.
    pub fn resolve_password(&self) -> Result<Option<String>> {
        let Some(env_var) = &self.password_env else {
            return Ok(None);
        };

        std::env::var(env_var).map(Some).map_err(|_| {
            AutodocError::config_error(format!(
                "Environment variable {env_var} not found for password"
            ))
        })
    }

    /// Fill unset fields from `fallback`
    fn merge_from(&mut self, fallback: Self) {
        self.host = self.host.take().or(fallback.host);
        self.port = self.port.or(fallback.port);
        self.user = self.user.take().or(fallback.user);
        self.database = self.database.take().or(fallback.database);
        self.schema = self.schema.take().or(fallback.schema);
        self.password_env = self.password_env.take().or(fallback.password_env);
    }
}

/// External tool command overrides
///
/// Each entry is a command vector: the program followed by any leading arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dot: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soffice: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfunite: Option<Vec<String>>,
}

impl ToolSettings {
    fn merge_from(&mut self, fallback: Self) {
        self.dot = self.dot.take().or(fallback.dot);
        self.soffice = self.soffice.take().or(fallback.soffice);
        self.pdfunite = self.pdfunite.take().or(fallback.pdfunite);
    }

    /// Build the toolchain, applying overrides over the default binaries
    pub fn toolchain(&self) -> Result<Toolchain> {
        let mut toolchain = Toolchain::default();

        if let Some(argv) = &self.dot {
            toolchain.dot = tool_from_argv("dot", argv)?;
        }
        if let Some(argv) = &self.soffice {
            toolchain.soffice = tool_from_argv("soffice", argv)?;
        }
        if let Some(argv) = &self.pdfunite {
            toolchain.pdfunite = tool_from_argv("pdfunite", argv)?;
        }

        Ok(toolchain)
    }
}

fn tool_from_argv(key: &str, argv: &[String]) -> Result<ToolCommand> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        AutodocError::config_error(format!("tools.{key} must name at least a program"))
    })?;
    Ok(ToolCommand::new(program).with_args(args.iter().cloned()))
}

/// Settings file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: StoredConnection,

    #[serde(default)]
    pub tools: ToolSettings,
}

impl Settings {
    /// Overlay `self` (higher priority) on top of `fallback`
    #[must_use]
    pub fn merged_over(mut self, fallback: Self) -> Self {
        self.connection.merge_from(fallback.connection);
        self.tools.merge_from(fallback.tools);
        self
    }
}

/// Get path to local settings file (`<dir>/.autodoc/config.json`)
#[must_use]
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".autodoc").join("config.json")
}

/// Get path to global settings file (`~/.config/autodoc/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AutodocError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("autodoc").join("config.json"))
}

/// Load settings from a file
///
/// A missing file is not an error and yields empty settings.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| AutodocError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents).map_err(|e| {
        AutodocError::config_error(format!(
            "Invalid config file format in {}: {e}",
            path.display()
        ))
    })
}

/// Load settings with precedence (local first, then global)
pub fn load_with_precedence(dir: &Path) -> Result<Settings> {
    let local = load_settings(&local_config_path(dir))?;

    // A missing home config directory only disables the global layer
    let global = match global_config_path() {
        Ok(path) => load_settings(&path)?,
        Err(e) => {
            tracing::debug!("Skipping global settings: {e}");
            Settings::default()
        }
    };

    Ok(local.merged_over(global))
}
