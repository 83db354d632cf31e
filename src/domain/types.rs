//! Built-in argument types.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::marker::PhantomData;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::domain::arg_type::{ArgumentType, ValueContext, ValueCount};
use crate::domain::severity::{ErrorLevel, ErrorLevelConfig, ErrorThresholds};

/// Pure flag: consumes no tokens and is `true` whenever used.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolType;

impl ArgumentType for BoolType {
    type Value = bool;

    fn value_count(&self) -> ValueCount {
        ValueCount::NONE
    }

    fn parse_values(&self, _values: &[String], _ctx: &mut ValueContext) -> Option<bool> {
        Some(true)
    }
}

/// Single value coerced through [`FromStr`].
pub struct FromStrType<T> {
    label: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrType<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for FromStrType<T> {
    fn clone(&self) -> Self {
        Self::new(self.label)
    }
}

impl<T> fmt::Debug for FromStrType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromStrType").field("label", &self.label).finish()
    }
}

pub type IntType = FromStrType<i64>;
pub type FloatType = FromStrType<f64>;
pub type StringType = FromStrType<String>;

impl Default for IntType {
    fn default() -> Self {
        Self::new("int")
    }
}

impl Default for FloatType {
    fn default() -> Self {
        Self::new("float")
    }
}

impl Default for StringType {
    fn default() -> Self {
        Self::new("string")
    }
}

fn coerce<T>(value: &str, offset: usize, label: &str, ctx: &mut ValueContext) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            ctx.invalid(offset, value, format!("expected {}: {}", label, e));
            None
        }
    }
}

impl<T> ArgumentType for FromStrType<T>
where
    T: FromStr + Clone + fmt::Debug + 'static,
    T::Err: fmt::Display,
{
    type Value = T;

    fn value_count(&self) -> ValueCount {
        ValueCount::ONE
    }

    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<T> {
        let value = values.first()?;
        coerce(value, 0, self.label, ctx)
    }

    fn representation(&self) -> Option<String> {
        Some(format!("<{}>", self.label))
    }
}

/// Integer restricted to an inclusive range.
#[derive(Debug, Clone, Copy)]
pub struct IntRangeType {
    pub min: i64,
    pub max: i64,
}

impl IntRangeType {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }
}

impl ArgumentType for IntRangeType {
    type Value = i64;

    fn value_count(&self) -> ValueCount {
        ValueCount::ONE
    }

    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<i64> {
        let raw = values.first()?;
        let value: i64 = coerce(raw, 0, "int", ctx)?;
        if value < self.min || value > self.max {
            ctx.invalid(
                0,
                raw,
                format!("must be between {} and {}", self.min, self.max),
            );
            return None;
        }
        Some(value)
    }

    fn representation(&self) -> Option<String> {
        Some(format!("<{}..{}>", self.min, self.max))
    }
}

/// One string out of a fixed set.
#[derive(Debug, Clone)]
pub struct ChoiceType {
    choices: Vec<String>,
    case_sensitive: bool,
}

impl ChoiceType {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }
}

impl ArgumentType for ChoiceType {
    type Value = String;

    fn value_count(&self) -> ValueCount {
        ValueCount::ONE
    }

    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<String> {
        let raw = values.first()?;
        let found = self.choices.iter().find(|c| {
            if self.case_sensitive {
                *c == raw
            } else {
                c.eq_ignore_ascii_case(raw)
            }
        });
        match found {
            Some(choice) => Some(choice.clone()),
            None => {
                ctx.invalid(
                    0,
                    raw,
                    format!("expected one of: {}", self.choices.join(", ")),
                );
                None
            }
        }
    }

    fn representation(&self) -> Option<String> {
        Some(format!("{{{}}}", self.choices.join("|")))
    }
}

/// Several values of the same inner type.
#[derive(Debug, Clone)]
pub struct MultipleType<T> {
    inner: FromStrType<T>,
    count: ValueCount,
}

impl<T> MultipleType<T> {
    pub fn new(label: &'static str, count: ValueCount) -> Self {
        Self {
            inner: FromStrType::new(label),
            count,
        }
    }
}

impl<T> ArgumentType for MultipleType<T>
where
    T: FromStr + Clone + fmt::Debug + 'static,
    T::Err: fmt::Display,
{
    type Value = Vec<T>;

    fn value_count(&self) -> ValueCount {
        self.count
    }

    /// Every value is coerced so all bad values get reported, not just the first.
    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<Vec<T>> {
        let parsed: Vec<Option<T>> = values
            .iter()
            .enumerate()
            .map(|(offset, v)| coerce(v, offset, self.inner.label, ctx))
            .collect();
        parsed.into_iter().collect()
    }

    fn representation(&self) -> Option<String> {
        Some(format!("<{}>...", self.inner.label))
    }
}

type ReaderFactory = Box<dyn Fn() -> Box<dyn Read> + Send + Sync>;

/// Reads all of standard input (or an injected source) when used.
///
/// Consumes no tokens. Each parse opens the source afresh, so the type holds
/// no per-parse state. Read failures are reported as warnings and whatever
/// was read so far is kept.
pub struct StdinType {
    source: ReaderFactory,
}

impl Default for StdinType {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdinType").finish_non_exhaustive()
    }
}

impl StdinType {
    pub fn new() -> Self {
        Self::from_fn(io::stdin)
    }

    /// Read from a reader produced by `open` on every use instead of the
    /// process stdin.
    pub fn from_fn<R, F>(open: F) -> Self
    where
        R: Read + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            source: Box::new(move || Box::new(open()) as Box<dyn Read>),
        }
    }

    /// Serve `text` as the input of every parse.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::from_fn(move || io::Cursor::new(text.clone().into_bytes()))
    }

    fn read_lines(reader: impl BufRead, ctx: &mut ValueContext) -> String {
        let mut lines = Vec::new();
        for line in reader.lines() {
            match line {
                Ok(line) => lines.push(line),
                Err(e) => {
                    warn!("stdin read failed: {}", e);
                    ctx.warning(0, format!("failed to read input: {}", e));
                    break;
                }
            }
        }
        debug!("read {} lines from input", lines.len());
        lines.join("\n")
    }
}

impl ArgumentType for StdinType {
    type Value = String;

    fn value_count(&self) -> ValueCount {
        ValueCount::NONE
    }

    fn parse_values(&self, _values: &[String], ctx: &mut ValueContext) -> Option<String> {
        let reader = (self.source)();
        Some(Self::read_lines(BufReader::new(reader), ctx))
    }
}

/// Gives any argument type its own display and exit thresholds.
///
/// Errors the inner type reports are judged against these first, then
/// against the owning argument's.
#[derive(Debug, Clone)]
pub struct WithThresholds<A> {
    inner: A,
    thresholds: ErrorThresholds,
}

impl<A: ArgumentType> WithThresholds<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            thresholds: ErrorThresholds::default(),
        }
    }

    pub fn display_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_display_level(level);
        self
    }

    pub fn exit_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_exit_level(level);
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A> ErrorLevelConfig for WithThresholds<A> {
    fn thresholds(&self) -> ErrorThresholds {
        self.thresholds
    }

    fn thresholds_mut(&mut self) -> &mut ErrorThresholds {
        &mut self.thresholds
    }
}

impl<A: ArgumentType> ArgumentType for WithThresholds<A> {
    type Value = A::Value;

    fn value_count(&self) -> ValueCount {
        self.inner.value_count()
    }

    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<A::Value> {
        self.inner.parse_values(values, ctx)
    }

    fn representation(&self) -> Option<String> {
        self.inner.representation()
    }

    fn error_thresholds(&self) -> ErrorThresholds {
        self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::ParseErrorKind;
    use crate::domain::severity::ErrorLevel;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn ctx_for(n: usize) -> ValueContext {
        ValueContext::new(0, (1..=n).collect())
    }

    #[test]
    fn given_flag_with_tokens_when_parsing_then_ignores_them() {
        let mut ctx = ctx_for(1);
        let value = BoolType.parse_values(&strings(&["ignored"]), &mut ctx);
        assert_eq!(value, Some(true));
        assert!(ctx.errors().is_empty());
    }

    #[test]
    fn given_non_numeric_input_when_parsing_int_then_reports_invalid_value() {
        let mut ctx = ctx_for(1);
        let value = IntType::default().parse_values(&strings(&["five"]), &mut ctx);

        assert_eq!(value, None);
        assert_eq!(ctx.errors().len(), 1);
        assert_eq!(ctx.errors()[0].level, ErrorLevel::Error);
        assert_eq!(ctx.errors()[0].token_index, 1);
        assert!(matches!(
            &ctx.errors()[0].kind,
            ParseErrorKind::InvalidValue { value, .. } if value == "five"
        ));
    }

    #[test]
    fn given_value_outside_range_when_parsing_then_errors() {
        let ty = IntRangeType::new(1, 10);
        let mut ctx = ctx_for(1);
        assert_eq!(ty.parse_values(&strings(&["11"]), &mut ctx), None);
        assert_eq!(ctx.errors().len(), 1);

        let mut ctx = ctx_for(1);
        assert_eq!(ty.parse_values(&strings(&["10"]), &mut ctx), Some(10));
    }

    #[test]
    fn given_case_insensitive_choice_when_parsing_then_returns_declared_spelling() {
        let ty = ChoiceType::new(["Fast", "Slow"]).case_insensitive();
        let mut ctx = ctx_for(1);
        assert_eq!(
            ty.parse_values(&strings(&["fast"]), &mut ctx),
            Some("Fast".to_string())
        );
    }

    #[test]
    fn given_several_bad_values_when_parsing_multiple_then_reports_each() {
        let ty: MultipleType<i64> = MultipleType::new("int", ValueCount::range(1, 4));
        let mut ctx = ctx_for(3);
        let value = ty.parse_values(&strings(&["1", "x", "y"]), &mut ctx);

        assert_eq!(value, None);
        let indices: Vec<usize> = ctx.errors().iter().map(|e| e.token_index).collect();
        assert_eq!(indices, vec![2, 3]);
    }

    #[test]
    fn given_injected_text_when_parsing_stdin_twice_then_same_lines() {
        let ty = StdinType::from_text("one\ntwo\n");
        let mut first = ctx_for(0);
        let mut second = ctx_for(0);
        assert_eq!(ty.parse_values(&[], &mut first), Some("one\ntwo".to_string()));
        assert_eq!(ty.parse_values(&[], &mut second), Some("one\ntwo".to_string()));
    }

    #[test]
    fn given_wrapped_type_when_setting_levels_then_reports_own_thresholds() {
        let ty = WithThresholds::new(IntType::default()).exit_level(ErrorLevel::Warning);
        assert_eq!(ty.error_thresholds().exit, Some(ErrorLevel::Warning));
        assert_eq!(ty.error_thresholds().display, None);
        assert_eq!(IntType::default().error_thresholds(), ErrorThresholds::default());
        assert_eq!(ty.representation(), Some("<int>".to_string()));
    }
}
