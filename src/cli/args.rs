//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Declarative command-tree parser: check token lists against TOML schemas
#[derive(Parser, Debug)]
#[command(name = "argtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse tokens against a schema and report values and errors
    Check {
        /// Schema file (bare names are looked up in the configured schema_dir)
        #[arg(value_hint = ValueHint::FilePath)]
        schema: PathBuf,

        /// Tokens to parse; use `--` before tokens that look like argtree options
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// Show the command tree declared by a schema
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        schema: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show the global config path
    Path,
    /// Print a config template
    Template,
}
