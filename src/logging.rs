//! Logging setup
//!
//! Events are written to stderr so that `--json` output on stdout stays
//! machine-readable. The level comes from `-v` flags unless `RUST_LOG` is set,
//! and `AUTODOC_LOG_FORMAT` selects the output format.

use std::io::IsTerminal;

use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format
pub const LOG_FORMAT_ENV: &str = "AUTODOC_LOG_FORMAT";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable events
    Compact,
    /// Multi-line events with source locations
    Full,
    /// JSON lines
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" => Some(Self::Full),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact, source_location: false }
    }
}

impl LoggingConfig {
    /// Create logging config from the number of `-v` flags
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();
        match verbosity {
            0 => {}
            1 => config.level = "debug".to_string(),
            _ => {
                config.level = "trace".to_string();
                config.source_location = true;
            }
        }
        config
    }

    /// Apply `AUTODOC_LOG_FORMAT` if set to a known format
    #[must_use]
    pub fn with_format_env(mut self, value: Option<&str>) -> Self {
        if let Some(format) = value.and_then(LogFormat::parse) {
            self.format = format;
        }
        self
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives).context("Invalid RUST_LOG directives")?,
        Err(_) => EnvFilter::try_new(&config.level).context("Invalid log level")?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => builder
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .try_init(),
        LogFormat::Full => builder.with_ansi(std::io::stderr().is_terminal()).try_init(),
        LogFormat::Json => builder.with_ansi(false).json().try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LoggingConfig::from_verbosity(0).level, "info");
        assert_eq!(LoggingConfig::from_verbosity(1).level, "debug");

        let trace = LoggingConfig::from_verbosity(4);
        assert_eq!(trace.level, "trace");
        assert!(trace.source_location);
    }

    #[test]
    fn test_format_env() {
        let config = LoggingConfig::default().with_format_env(Some("JSON"));
        assert_eq!(config.format, LogFormat::Json);

        let config = LoggingConfig::default().with_format_env(Some("xml"));
        assert_eq!(config.format, LogFormat::Compact);

        let config = LoggingConfig::default().with_format_env(None);
        assert_eq!(config.format, LogFormat::Compact);
    }
}
