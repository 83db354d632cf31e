//! Arguments: names and flags bound to an [`ArgumentType`].

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::domain::arg_type::{ArgumentType, ValueContext, ValueCount};
use crate::domain::arena::{ArgId, CommandId, GroupId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::names::push_names;
use crate::domain::outcome::ArgumentReport;
use crate::domain::severity::{ErrorLevel, ErrorLevelConfig, ErrorThresholds};
use crate::domain::types::BoolType;

pub const DEFAULT_PREFIX: char = '-';

/// A parsed value with its concrete type erased.
pub trait AnyValue: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> AnyValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'a> dyn AnyValue + 'a {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

type OkCallback<T> = Box<dyn Fn(&T)>;
type ErrCallback = Box<dyn Fn(&ArgumentReport)>;

/// Declaration of a single argument, built before it is attached to a tree.
pub struct Argument<A: ArgumentType> {
    arg_type: A,
    names: Vec<String>,
    prefix: char,
    obligatory: bool,
    positional: bool,
    allow_unique: bool,
    default: Option<A::Value>,
    description: Option<String>,
    thresholds: ErrorThresholds,
    on_ok: Option<OkCallback<A::Value>>,
    on_err: Option<ErrCallback>,
}

impl Argument<BoolType> {
    /// Flag argument: no values, `true` when used.
    pub fn flag<I, S>(names: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(BoolType, names)
    }
}

impl<A: ArgumentType> Argument<A> {
    pub fn new<I, S>(arg_type: A, names: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let argument = Self {
            arg_type,
            names: Vec::new(),
            prefix: DEFAULT_PREFIX,
            obligatory: false,
            positional: false,
            allow_unique: false,
            default: None,
            description: None,
            thresholds: ErrorThresholds::default(),
            on_ok: None,
            on_err: None,
        }
        .bind(names)?;

        if argument.names.is_empty() {
            return Err(DomainError::InvalidConfiguration {
                name: String::from("<unnamed>"),
                reason: "an argument needs at least one name".to_string(),
            });
        }
        Ok(argument)
    }

    /// Register additional names.
    pub fn bind<I, S>(mut self, names: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owner = match self.names.first() {
            Some(n) => format!("argument '{}'", n),
            None => "this argument".to_string(),
        };
        push_names(&mut self.names, names, &owner)?;
        Ok(self)
    }

    /// The argument must always be used, unless an allow-unique argument of
    /// the same command fired.
    pub fn obligatory(mut self) -> Self {
        self.obligatory = true;
        self
    }

    /// Values may be given without the name, in declaration order.
    pub fn positional(mut self) -> DomainResult<Self> {
        if self.arg_type.value_count().is_none() {
            return Err(DomainError::InvalidConfiguration {
                name: self.display_name().to_string(),
                reason: "an argument that takes no values cannot be positional".to_string(),
            });
        }
        self.positional = true;
        Ok(self)
    }

    pub fn prefix(mut self, prefix: char) -> Self {
        self.prefix = prefix;
        self
    }

    /// When this argument is used, unused obligatory arguments of the same
    /// command are not reported and other arguments' success callbacks are
    /// suppressed.
    pub fn allow_unique(mut self) -> Self {
        self.allow_unique = true;
        self
    }

    pub fn default_value(mut self, value: A::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn display_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_display_level(level);
        self
    }

    pub fn exit_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_exit_level(level);
        self
    }

    /// Called with the parsed value after a successful use.
    pub fn on_ok(mut self, callback: impl Fn(&A::Value) + 'static) -> Self {
        self.on_ok = Some(Box::new(callback));
        self
    }

    /// Called when this argument has exit-level errors.
    pub fn on_err(mut self, callback: impl Fn(&ArgumentReport) + 'static) -> Self {
        self.on_err = Some(Box::new(callback));
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arg_type(&self) -> &A {
        &self.arg_type
    }
}

impl<A: ArgumentType> ErrorLevelConfig for Argument<A> {
    fn thresholds(&self) -> ErrorThresholds {
        self.thresholds
    }

    fn thresholds_mut(&mut self) -> &mut ErrorThresholds {
        &mut self.thresholds
    }
}

/// Read-only view of an attached argument.
pub trait ArgumentSpec {
    fn names(&self) -> &[String];
    fn prefix(&self) -> char;
    fn is_obligatory(&self) -> bool;
    fn is_positional(&self) -> bool;
    fn allows_unique(&self) -> bool;
    fn has_default(&self) -> bool;
    fn value_count(&self) -> ValueCount;
    fn description(&self) -> Option<&str>;
    fn representation(&self) -> Option<String>;
    fn error_thresholds(&self) -> ErrorThresholds;

    fn display_name(&self) -> &str {
        self.names().first().map(String::as_str).unwrap_or_default()
    }

    fn has_name(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }

    /// Single-character name lookup used by grouped short forms.
    fn has_short_name(&self, name: char) -> bool {
        self.names().iter().any(|n| {
            let mut chars = n.chars();
            chars.next() == Some(name) && chars.next().is_none()
        })
    }

    /// `--name` form for this argument's prefix.
    fn long_form(&self) -> String {
        let p = self.prefix();
        format!("{}{}{}", p, p, self.display_name())
    }
}

/// Engine side of an argument: value coercion and callbacks with the value
/// type erased.
pub(crate) trait AnyArgument: ArgumentSpec {
    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<Box<dyn AnyValue>>;
    fn default_value(&self) -> Option<Box<dyn AnyValue>>;
    fn type_thresholds(&self) -> ErrorThresholds;
    fn invoke_ok(&self, value: &dyn AnyValue);
    fn invoke_err(&self, report: &ArgumentReport);
    fn as_spec(&self) -> &dyn ArgumentSpec;
}

impl<A: ArgumentType> ArgumentSpec for Argument<A> {
    fn names(&self) -> &[String] {
        &self.names
    }

    fn prefix(&self) -> char {
        self.prefix
    }

    fn is_obligatory(&self) -> bool {
        self.obligatory
    }

    fn is_positional(&self) -> bool {
        self.positional
    }

    fn allows_unique(&self) -> bool {
        self.allow_unique
    }

    fn has_default(&self) -> bool {
        self.default.is_some()
    }

    fn value_count(&self) -> ValueCount {
        self.arg_type.value_count()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn representation(&self) -> Option<String> {
        self.arg_type.representation()
    }

    fn error_thresholds(&self) -> ErrorThresholds {
        self.thresholds
    }
}

impl<A: ArgumentType> AnyArgument for Argument<A> {
    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<Box<dyn AnyValue>> {
        self.arg_type
            .parse_values(values, ctx)
            .map(|v| Box::new(v) as Box<dyn AnyValue>)
    }

    fn default_value(&self) -> Option<Box<dyn AnyValue>> {
        self.default
            .clone()
            .map(|v| Box::new(v) as Box<dyn AnyValue>)
    }

    fn type_thresholds(&self) -> ErrorThresholds {
        self.arg_type.error_thresholds()
    }

    fn invoke_ok(&self, value: &dyn AnyValue) {
        if let (Some(callback), Some(value)) = (&self.on_ok, value.downcast_ref::<A::Value>()) {
            callback(value);
        }
    }

    fn invoke_err(&self, report: &ArgumentReport) {
        if let Some(callback) = &self.on_err {
            callback(report);
        }
    }

    fn as_spec(&self) -> &dyn ArgumentSpec {
        self
    }
}

/// Arena entry for an argument.
pub(crate) struct ArgumentNode {
    pub(crate) argument: Box<dyn AnyArgument>,
    pub(crate) command: Option<CommandId>,
    pub(crate) group: Option<GroupId>,
}

/// Typed reference to an argument inside a [`CommandTree`](crate::domain::CommandTree).
///
/// Carries the value type so parsed values come back without casts.
pub struct ArgHandle<T> {
    id: ArgId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArgHandle<T> {
    pub(crate) fn new(id: ArgId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ArgId {
        self.id
    }
}

impl<T> Clone for ArgHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArgHandle<T> {}

impl<T> fmt::Debug for ArgHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgHandle").field(&self.id).finish()
    }
}

impl<T> From<ArgHandle<T>> for ArgId {
    fn from(handle: ArgHandle<T>) -> Self {
        handle.id
    }
}
