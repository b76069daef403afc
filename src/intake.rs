//! Connection parameter intake
//!
//! Each parameter is taken from the first source that provides it:
//! command-line flag, settings file, then an interactive prompt. Host and
//! port fall back to `localhost:5432` when neither is given.

use dialoguer::{Input, Password};

use crate::config::StoredConnection;
use crate::engine::{ConnectionConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::error::{AutodocError, Result};

const REQUIRED_MESSAGE: &str = "Username, Password and Database Name are required.";

/// Connection parameters supplied on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

/// Source of interactive answers
pub trait Prompter {
    /// Ask for a visible value; an empty answer selects `default`
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String>;

    /// Ask for a hidden value
    fn password(&mut self, prompt: &str) -> Result<String>;
}

/// Prompts on the terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .map_err(|e| AutodocError::invalid_input(format!("Could not read {prompt}: {e}")))
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| AutodocError::invalid_input(format!("Could not read {prompt}: {e}")))
    }
}

/// Never asks; every prompt yields its default or nothing
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn input(&mut self, _prompt: &str, default: Option<&str>) -> Result<String> {
        Ok(default.unwrap_or_default().to_string())
    }

    fn password(&mut self, _prompt: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Resolve the connection from flags, stored settings and prompts
///
/// Fails with `InvalidInput` before any work is done when the user,
/// password or database name is still missing.
pub fn resolve_connection(
    args: &ConnectionArgs,
    stored: &StoredConnection,
    prompter: &mut impl Prompter,
) -> Result<ConnectionConfig> {
    let host = match first_of(&args.host, &stored.host) {
        Some(host) => host,
        None => non_empty(prompter.input("Host", Some(DEFAULT_HOST))?)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
    };

    let port = match args.port.or(stored.port) {
        Some(port) => port,
        None => {
            let default = DEFAULT_PORT.to_string();
            parse_port(&prompter.input("Port", Some(default.as_str()))?)?
        }
    };

    let user = match first_of(&args.user, &stored.user) {
        Some(user) => Some(user),
        None => non_empty(prompter.input("Username", None)?),
    };

    let password = match stored.resolve_password()? {
        Some(password) => Some(password),
        None => non_empty(prompter.password("Password")?),
    };

    let database = match first_of(&args.database, &stored.database) {
        Some(database) => Some(database),
        None => non_empty(prompter.input("Database Name", None)?),
    };

    let (Some(user), Some(password), Some(database)) = (user, password, database) else {
        return Err(AutodocError::invalid_input(REQUIRED_MESSAGE));
    };

    let schema = first_of(&args.schema, &stored.schema);
    tracing::debug!(host = %host, port, user = %user, database = %database, "Connection resolved");

    Ok(ConnectionConfig::postgres(host, port, user, password, database).with_schema(schema))
}

fn first_of(flag: &Option<String>, stored: &Option<String>) -> Option<String> {
    flag.iter().chain(stored.iter()).find_map(|v| non_empty(v.clone()))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_port(value: &str) -> Result<u16> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(DEFAULT_PORT);
    }
    value
        .parse()
        .map_err(|_| AutodocError::invalid_input(format!("Invalid port: {value}")))
}
