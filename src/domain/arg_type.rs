//! Value coercion contract shared by every argument type.

use std::fmt;

use crate::domain::outcome::ParseErrorKind;
use crate::domain::severity::{ErrorLevel, ErrorThresholds};

/// How many raw tokens an argument type consumes per use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueCount {
    pub min: usize,
    pub max: usize,
}

impl ValueCount {
    /// Flag-like: consumes nothing.
    pub const NONE: ValueCount = ValueCount { min: 0, max: 0 };
    pub const ONE: ValueCount = ValueCount { min: 1, max: 1 };

    pub fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    /// Bounded range. `min` and `max` are swapped if given in the wrong order.
    pub fn range(min: usize, max: usize) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self { min, max: usize::MAX }
    }

    pub fn is_none(&self) -> bool {
        self.max == 0
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

impl fmt::Display for ValueCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, 0) => write!(f, "no values"),
            (min, max) if min == max => write!(f, "{} value(s)", min),
            (min, usize::MAX) => write!(f, "at least {} value(s)", min),
            (min, max) => write!(f, "{} to {} values", min, max),
        }
    }
}

/// A single error reported by an argument type while coercing values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub level: ErrorLevel,
    pub token_index: usize,
    pub kind: ParseErrorKind,
}

/// Per-invocation state handed to [`ArgumentType::parse_values`].
///
/// Records where parsing began so errors can be attributed to the token that
/// caused them, and collects every error the type reports.
#[derive(Debug)]
pub struct ValueContext {
    token_indices: Vec<usize>,
    start: usize,
    errors: Vec<ValueError>,
}

impl ValueContext {
    /// `token_indices[i]` is the token the i-th value came from.
    pub fn new(start: usize, token_indices: Vec<usize>) -> Self {
        Self {
            token_indices,
            start,
            errors: Vec::new(),
        }
    }

    /// Index of the token that triggered this argument.
    pub fn token_index(&self) -> usize {
        self.start
    }

    /// Index of the token holding the value at `offset`.
    pub fn token_index_of(&self, offset: usize) -> usize {
        self.token_indices.get(offset).copied().unwrap_or(self.start)
    }

    pub fn report(&mut self, level: ErrorLevel, offset: usize, kind: ParseErrorKind) {
        let token_index = self.token_index_of(offset);
        self.errors.push(ValueError {
            level,
            token_index,
            kind,
        });
    }

    /// Report a value that could not be coerced.
    pub fn invalid(&mut self, offset: usize, value: &str, reason: impl Into<String>) {
        self.report(
            ErrorLevel::Error,
            offset,
            ParseErrorKind::InvalidValue {
                value: value.to_string(),
                reason: reason.into(),
            },
        );
    }

    pub fn warning(&mut self, offset: usize, message: impl Into<String>) {
        self.report(
            ErrorLevel::Warning,
            offset,
            ParseErrorKind::Custom {
                message: message.into(),
            },
        );
    }

    pub fn info(&mut self, offset: usize, message: impl Into<String>) {
        self.report(
            ErrorLevel::Info,
            offset,
            ParseErrorKind::Custom {
                message: message.into(),
            },
        );
    }

    pub fn errors(&self) -> &[ValueError] {
        &self.errors
    }

    pub(crate) fn into_errors(self) -> Vec<ValueError> {
        self.errors
    }
}

/// Turns raw tokens into a typed value.
///
/// Implementations are stateless: everything that varies per parse goes
/// through the [`ValueContext`].
pub trait ArgumentType {
    type Value: Clone + fmt::Debug + 'static;

    fn value_count(&self) -> ValueCount;

    /// Coerce `values`. Returns `None` when no value could be produced; the
    /// reason must have been reported on `ctx`.
    fn parse_values(&self, values: &[String], ctx: &mut ValueContext) -> Option<Self::Value>;

    /// Short hint such as `<int>` for a presentation layer.
    fn representation(&self) -> Option<String> {
        None
    }

    /// Thresholds for the errors this type reports. Unset levels fall back
    /// to the owning argument's.
    fn error_thresholds(&self) -> ErrorThresholds {
        ErrorThresholds::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_reversed_bounds_when_creating_range_then_normalizes() {
        let count = ValueCount::range(5, 2);
        assert_eq!(count, ValueCount { min: 2, max: 5 });
        assert!(count.accepts(3));
        assert!(!count.accepts(6));
    }

    #[test]
    fn given_inline_value_when_reporting_then_uses_value_token() {
        let mut ctx = ValueContext::new(3, vec![4, 5]);
        ctx.invalid(1, "x", "not a number");
        ctx.warning(7, "out of bounds offset");

        let errors = ctx.into_errors();
        assert_eq!(errors[0].token_index, 5);
        assert_eq!(errors[1].token_index, 3);
        assert_eq!(errors[1].level, ErrorLevel::Warning);
    }
}
