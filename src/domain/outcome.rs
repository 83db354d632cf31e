//! Parse results: severity-tagged errors and the values of one parse.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::domain::arena::{ArgId, CommandId};
use crate::domain::arg_type::ValueCount;
use crate::domain::argument::{AnyValue, ArgHandle};
use crate::domain::severity::{ErrorLevel, ErrorReporter, ResolvedThresholds};

/// What went wrong while matching tokens or coercing values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("unrecognized token '{token}'")]
    UnrecognizedToken { token: String },

    #[error("unknown argument '{name}'")]
    UnknownArgument { name: String },

    #[error("obligatory argument '{argument}' not used")]
    ObligatoryArgumentNotUsed { argument: String },

    #[error("group '{group}' allows only one of: {}", .arguments.join(", "))]
    MultipleExclusiveArgumentsUsed { group: String, arguments: Vec<String> },

    #[error("argument '{argument}' expects {expected}, received {received}")]
    IncorrectValueNumber {
        argument: String,
        expected: ValueCount,
        received: usize,
    },

    #[error("argument '{argument}' used more than once")]
    ArgumentUsedTooManyTimes { argument: String },

    #[error("invalid value '{value}': {reason}")]
    InvalidValue { value: String, reason: String },

    #[error("{message}")]
    Custom { message: String },
}

/// An accumulated parse-time error.
///
/// The display and exit decisions are taken when the error is recorded, from
/// the thresholds of the component that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub level: ErrorLevel,
    pub token_index: usize,
    pub command: CommandId,
    pub argument: Option<ArgId>,
    displayed: bool,
    fatal: bool,
}

impl ParseError {
    pub(crate) fn new(
        kind: ParseErrorKind,
        level: ErrorLevel,
        token_index: usize,
        command: CommandId,
        argument: Option<ArgId>,
        thresholds: ResolvedThresholds,
    ) -> Self {
        Self {
            kind,
            level,
            token_index,
            command,
            argument,
            displayed: thresholds.displays(level),
            fatal: thresholds.exits(level),
        }
    }

    /// At or above the owner's display threshold.
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    /// At or above the owner's exit threshold.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at token {}: {}", self.level, self.token_index, self.kind)
    }
}

/// Result of one [`CommandTree::parse`](crate::domain::CommandTree::parse).
///
/// Holds every value that could be parsed, even when the parse failed.
#[derive(Debug)]
pub struct ParseOutcome {
    pub(crate) tokens: Vec<String>,
    pub(crate) values: HashMap<ArgId, Box<dyn AnyValue>>,
    pub(crate) usage: HashMap<ArgId, usize>,
    pub(crate) names: HashMap<ArgId, String>,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) command_path: Vec<CommandId>,
    pub(crate) exit_code: i32,
}

impl ParseOutcome {
    /// Typed value of the argument behind `handle`: the parsed value, or the
    /// default when the argument was not used.
    pub fn get<T: 'static>(&self, handle: &ArgHandle<T>) -> Option<&T> {
        self.values
            .get(&handle.id())
            .and_then(|v| (**v).downcast_ref::<T>())
    }

    pub fn value(&self, id: ArgId) -> Option<&dyn AnyValue> {
        self.values.get(&id).map(|v| &**v)
    }

    pub fn usage_count(&self, id: ArgId) -> usize {
        self.usage.get(&id).copied().unwrap_or(0)
    }

    pub fn is_used(&self, id: ArgId) -> bool {
        self.usage_count(id) > 0
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Matched commands, root first.
    pub fn command_path(&self) -> &[CommandId] {
        &self.command_path
    }

    pub fn was_invoked(&self, command: CommandId) -> bool {
        self.command_path.contains(&command)
    }

    /// Bitwise OR of the error codes of matched commands with exit-level
    /// errors; 0 when the parse succeeded.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn is_ok(&self) -> bool {
        !self.has_exit_errors()
    }

    pub fn command_errors(&self, command: CommandId) -> Vec<&ParseError> {
        self.errors.iter().filter(|e| e.command == command).collect()
    }

    /// Usage and errors of a single argument.
    pub fn argument_report(&self, id: ArgId) -> ArgumentReport {
        ArgumentReport {
            id,
            name: self.names.get(&id).cloned().unwrap_or_default(),
            usage_count: self.usage_count(id),
            errors: self
                .errors
                .iter()
                .filter(|e| e.argument == Some(id))
                .cloned()
                .collect(),
        }
    }
}

impl ErrorReporter for ParseOutcome {
    fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

/// Per-argument slice of a [`ParseOutcome`], handed to error callbacks.
#[derive(Debug, Clone)]
pub struct ArgumentReport {
    id: ArgId,
    name: String,
    usage_count: usize,
    errors: Vec<ParseError>,
}

impl ArgumentReport {
    pub fn id(&self) -> ArgId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_count(&self) -> usize {
        self.usage_count
    }
}

impl ErrorReporter for ArgumentReport {
    fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}
