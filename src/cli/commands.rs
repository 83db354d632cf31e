//! Command dispatch for the argtree binary.

use std::path::Path;

use tracing::{debug, instrument};

use crate::application::{bind_schema, BoundSchema, Schema};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{ErrorReporter, ParseError, ParseOutcome};
use crate::exitcode;
use crate::tree_traits::TreeNodeConvert;

/// Run the selected command; returns the process exit code.
pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Some(Commands::Check { schema, tokens }) => check(schema, tokens),
        Some(Commands::Tree { schema }) => tree(schema),
        Some(Commands::Config { command }) => config(command),
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn load(schema: &Path) -> CliResult<(Settings, BoundSchema)> {
    let settings = Settings::load(schema.parent())?;
    let path = settings.resolve_schema(schema);
    debug!("schema resolved to {}", path.display());
    let parsed = Schema::from_path(&path)?;
    let mut bound = bind_schema(&parsed)?;
    bound.tree.set_default_thresholds(settings.thresholds());
    Ok((settings, bound))
}

#[instrument(skip(tokens))]
fn check(schema: &Path, tokens: &[String]) -> CliResult<i32> {
    let (_, bound) = load(schema)?;
    let outcome = bound.tree.parse(tokens.iter().cloned());
    render_outcome(&bound, &outcome);
    Ok(outcome.exit_code())
}

fn render_outcome(bound: &BoundSchema, outcome: &ParseOutcome) {
    output::header("Tokens");
    output::detail(&outcome.tokens().join(" "));

    output::header("Values");
    for argument in &bound.arguments {
        if !outcome.was_invoked(argument.command) {
            continue;
        }
        if let Some(value) = outcome.value(argument.id) {
            let source = if outcome.is_used(argument.id) { "" } else { " (default)" };
            output::action(&argument.path, &format!("{:?}{}", value, source));
        }
    }

    let shown = outcome.errors_under_display_level();
    if !shown.is_empty() {
        output::header("Diagnostics");
        for error in shown {
            output::diagnostic(error.level, &describe(bound, outcome, error));
        }
    }

    if outcome.is_ok() {
        output::success("parse succeeded");
    } else {
        output::failure(&format!("parse failed (exit code {})", outcome.exit_code()));
    }
}

fn describe(bound: &BoundSchema, outcome: &ParseOutcome, error: &ParseError) -> String {
    let token = outcome
        .tokens()
        .get(error.token_index)
        .map(|t| format!(" near '{}'", t))
        .unwrap_or_default();
    let command = bound
        .tree
        .command(error.command)
        .map(|c| c.display_name().to_string())
        .unwrap_or_default();
    format!("[{}] {}{}", command, error.kind, token)
}

#[instrument]
fn tree(schema: &Path) -> CliResult<i32> {
    let (_, bound) = load(schema)?;
    output::info(&bound.tree.to_tree_string());
    Ok(exitcode::OK)
}

fn config(command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(None)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory available on this platform"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(exitcode::OK)
}
