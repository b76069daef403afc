//! Autodoc CLI Entry Point
//!
//! Collects the connection parameters, runs the report pipeline and prints a
//! summary. Logs go to stderr; with `--json` stdout carries one JSON envelope.
//! The process exits normally in every handled case.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;

use autodoc::config::load_with_precedence;
use autodoc::logging::{init_logging, LoggingConfig, LOG_FORMAT_ENV};
use autodoc::output::{self, Metadata};
use autodoc::{
    resolve_connection, AutodocError, ConnectionArgs, ConnectionConfig, NoPrompt, Pipeline,
    PostgresEngine, RunPaths, Settings, TerminalPrompter,
};

/// Autodoc - PostgreSQL documentation report generator
#[derive(Parser)]
#[command(name = "autodoc")]
#[command(about = "Generate a PDF documentation report for a PostgreSQL database")]
#[command(version)]
struct Cli {
    /// Directory holding the sidecar files and receiving the outputs
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Database host (default: localhost)
    #[arg(long)]
    host: Option<String>,

    /// Database port (default: 5432)
    #[arg(long)]
    port: Option<u16>,

    /// Database user
    #[arg(long)]
    user: Option<String>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Schema to document (default: the server's current schema)
    #[arg(long)]
    schema: Option<String>,

    /// Never prompt; missing parameters are an error
    #[arg(long)]
    no_input: bool,

    /// Print the run summary as a JSON envelope
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn connection_args(&self) -> ConnectionArgs {
        ConnectionArgs {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            database: self.database.clone(),
            schema: self.schema.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let format = std::env::var(LOG_FORMAT_ENV).ok();
    let logging = LoggingConfig::from_verbosity(cli.verbose).with_format_env(format.as_deref());
    if let Err(e) = init_logging(&logging) {
        eprintln!("{e:#}");
        return;
    }

    let started = Instant::now();
    if !cli.json {
        println!("=== Database Documentation Generator ===");
    }

    match run(&cli).await {
        Ok(outcome) => {
            let meta = Metadata::new(elapsed_ms(started));
            if cli.json {
                print_json(output::render_json(&outcome, meta));
            } else {
                print!("{}", output::render_human(&outcome));
            }
        }
        Err(e) => {
            tracing::debug!(code = e.error_code(), "Run not started");
            if cli.json {
                print_json(output::render_json_error(&e, Metadata::new(elapsed_ms(started))));
            } else {
                println!("Error: {}", setup_message(&e));
            }
        }
    }
}

async fn run(cli: &Cli) -> autodoc::Result<autodoc::RunOutcome> {
    let dir = output_dir(&cli.dir)?;
    let settings: Settings = load_with_precedence(&dir)?;
    let toolchain = settings.tools.toolchain()?;

    let config: ConnectionConfig = if cli.no_input {
        resolve_connection(&cli.connection_args(), &settings.connection, &mut NoPrompt)?
    } else {
        resolve_connection(&cli.connection_args(), &settings.connection, &mut TerminalPrompter)?
    };

    let pipeline = Pipeline::from_dir(&dir, toolchain);
    if !cli.json {
        println!("Project: {}", pipeline.details().project);
        println!("Report Title: {}", pipeline.details().title);
        let excluded: Vec<&str> = pipeline.exclusions().iter().collect();
        if !excluded.is_empty() {
            println!("Excluded Tables: {}", excluded.join(", "));
        }
    }

    let paths = RunPaths::for_run(&dir, &config.database);
    let engine = PostgresEngine::new(config);
    Ok(pipeline.run(&engine, &paths).await)
}

fn output_dir(dir: &Path) -> autodoc::Result<PathBuf> {
    if !dir.is_dir() {
        return Err(AutodocError::invalid_input(format!(
            "Output directory does not exist: {}",
            dir.display()
        )));
    }
    Ok(dir.canonicalize()?)
}

/// Messages for errors raised before the pipeline starts
fn setup_message(err: &AutodocError) -> String {
    match err {
        AutodocError::InvalidInput(message) => message.clone(),
        other => other.message(),
    }
}

fn print_json(rendered: serde_json::Result<String>) {
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not serialize run summary: {e}"),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
