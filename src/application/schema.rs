//! Declarative TOML schema for command trees.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::ErrorLevel;

/// Top-level schema file: a single root `[command]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    pub command: CommandSchema,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandSchema {
    pub names: Vec<String>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
    pub display_level: Option<ErrorLevel>,
    pub exit_level: Option<ErrorLevel>,
    pub arguments: Vec<ArgumentSchema>,
    pub groups: Vec<GroupSchema>,
    pub subcommands: Vec<CommandSchema>,
}

/// Value type of an argument.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ArgumentKind {
    Bool,
    Int,
    Float,
    #[default]
    String,
    IntRange,
    Choice,
    Multiple,
    Stdin,
}

/// Element type of a `multiple` argument.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Int,
    Float,
    #[default]
    String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArgumentSchema {
    pub names: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ArgumentKind,
    pub description: Option<String>,
    pub obligatory: bool,
    pub positional: bool,
    pub allow_unique: bool,
    pub prefix: Option<char>,
    pub default: Option<toml::Value>,
    /// Bounds for `int-range`, value count bounds for `multiple`.
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub choices: Vec<String>,
    pub case_insensitive: bool,
    pub of: Option<ElementKind>,
    pub display_level: Option<ErrorLevel>,
    pub exit_level: Option<ErrorLevel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroupSchema {
    pub name: String,
    pub description: Option<String>,
    pub exclusive: bool,
    pub arguments: Vec<ArgumentSchema>,
    pub groups: Vec<GroupSchema>,
}

impl Schema {
    /// Read and parse a schema file.
    #[instrument(level = "debug")]
    pub fn from_path(path: &Path) -> ApplicationResult<Self> {
        let content = fs::read_to_string(path).with_path_context("read schema", path)?;
        let schema: Schema = toml::from_str(&content)
            .map_err(|e| ApplicationError::schema(path.display().to_string(), e.to_string()))?;
        debug!("loaded schema for '{}'", schema.command.names.join("|"));
        Ok(schema)
    }
}

impl FromStr for Schema {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|e| ApplicationError::schema("<inline>", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_minimal_schema_when_parsing_then_fills_defaults() {
        let schema: Schema = r#"
[command]
names = ["cmd1"]

[[command.arguments]]
names = ["number"]
type = "int"
"#
        .parse()
        .unwrap();

        let arg = &schema.command.arguments[0];
        assert_eq!(arg.kind, ArgumentKind::Int);
        assert!(!arg.obligatory);
        assert_eq!(arg.prefix, None);
        assert!(schema.command.subcommands.is_empty());
    }

    #[test]
    fn given_kebab_case_type_and_levels_when_parsing_then_deserializes() {
        let schema: Schema = r#"
[command]
names = ["app"]
exit_level = "warning"

[[command.arguments]]
names = ["level"]
type = "int-range"
min = 1
max = 5
prefix = "+"
"#
        .parse()
        .unwrap();

        assert_eq!(schema.command.exit_level, Some(ErrorLevel::Warning));
        assert_eq!(schema.command.arguments[0].kind, ArgumentKind::IntRange);
        assert_eq!(schema.command.arguments[0].prefix, Some('+'));
    }

    #[test]
    fn given_unknown_type_when_parsing_then_schema_error() {
        let result: ApplicationResult<Schema> = r#"
[command]
names = ["app"]
[[command.arguments]]
names = ["x"]
type = "complex"
"#
        .parse();

        assert!(matches!(result, Err(ApplicationError::Schema { .. })));
    }
}
