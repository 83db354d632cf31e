//! Domain layer: the parsing engine
//!
//! This layer is independent of external concerns (no file I/O, no CLI, no config loading).

pub mod arena;
pub mod arg_type;
pub mod argument;
pub mod command;
pub mod error;
pub mod group;
pub mod names;
pub mod outcome;
pub mod severity;
pub mod state;
pub mod types;

pub use arena::{ArgId, CommandId, CommandTree, GroupId};
pub use arg_type::{ArgumentType, ValueContext, ValueCount, ValueError};
pub use argument::{AnyValue, ArgHandle, Argument, ArgumentSpec, DEFAULT_PREFIX};
pub use command::{Command, DEFAULT_ERROR_CODE};
pub use error::{DomainError, DomainResult};
pub use group::ArgumentGroup;
pub use outcome::{ArgumentReport, ParseError, ParseErrorKind, ParseOutcome};
pub use severity::{ErrorLevel, ErrorLevelConfig, ErrorReporter, ErrorThresholds, ResolvedThresholds};
pub use state::ParsingState;
pub use types::{
    BoolType, ChoiceType, FloatType, FromStrType, IntRangeType, IntType, MultipleType, StdinType,
    StringType, WithThresholds,
};
