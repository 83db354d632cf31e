//! Error severity levels and the display/exit threshold contract.
//!
//! Every component that produces errors carries two thresholds: the minimum
//! level an error needs to be shown, and the minimum level that marks the
//! parse as failed. Unset thresholds are inherited from the owning component
//! (argument -> command -> parent command -> tree defaults).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::outcome::ParseError;

/// Ordered severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorLevel::Debug => "debug",
            ErrorLevel::Info => "info",
            ErrorLevel::Warning => "warning",
            ErrorLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ErrorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(ErrorLevel::Debug),
            "info" => Ok(ErrorLevel::Info),
            "warning" | "warn" => Ok(ErrorLevel::Warning),
            "error" => Ok(ErrorLevel::Error),
            other => Err(format!("unknown error level: {}", other)),
        }
    }
}

/// Thresholds as configured on a single component.
///
/// `None` means "inherit from the owner".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorThresholds {
    pub display: Option<ErrorLevel>,
    pub exit: Option<ErrorLevel>,
}

impl ErrorThresholds {
    pub fn new(display: ErrorLevel, exit: ErrorLevel) -> Self {
        Self {
            display: Some(display),
            exit: Some(exit),
        }
    }

    /// Fill unset thresholds from `parent`.
    pub fn resolve(&self, parent: ResolvedThresholds) -> ResolvedThresholds {
        ResolvedThresholds {
            display: self.display.unwrap_or(parent.display),
            exit: self.exit.unwrap_or(parent.exit),
        }
    }
}

/// Fully resolved thresholds, used to judge a single error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedThresholds {
    pub display: ErrorLevel,
    pub exit: ErrorLevel,
}

impl Default for ResolvedThresholds {
    fn default() -> Self {
        Self {
            display: ErrorLevel::Info,
            exit: ErrorLevel::Error,
        }
    }
}

impl ResolvedThresholds {
    pub fn displays(&self, level: ErrorLevel) -> bool {
        level >= self.display
    }

    pub fn exits(&self, level: ErrorLevel) -> bool {
        level >= self.exit
    }
}

/// Components whose errors are filtered by configurable thresholds.
pub trait ErrorLevelConfig {
    fn thresholds(&self) -> ErrorThresholds;
    fn thresholds_mut(&mut self) -> &mut ErrorThresholds;

    fn set_minimum_display_level(&mut self, level: ErrorLevel) {
        self.thresholds_mut().display = Some(level);
    }

    fn set_minimum_exit_level(&mut self, level: ErrorLevel) {
        self.thresholds_mut().exit = Some(level);
    }

    fn minimum_display_level(&self) -> Option<ErrorLevel> {
        self.thresholds().display
    }

    fn minimum_exit_level(&self) -> Option<ErrorLevel> {
        self.thresholds().exit
    }
}

/// Read side of the severity contract: anything holding accumulated errors.
pub trait ErrorReporter {
    fn errors(&self) -> &[ParseError];

    fn errors_under_display_level(&self) -> Vec<&ParseError> {
        self.errors().iter().filter(|e| e.is_displayed()).collect()
    }

    fn errors_under_exit_level(&self) -> Vec<&ParseError> {
        self.errors().iter().filter(|e| e.is_fatal()).collect()
    }

    fn has_exit_errors(&self) -> bool {
        self.errors().iter().any(|e| e.is_fatal())
    }

    fn has_display_errors(&self) -> bool {
        self.errors().iter().any(|e| e.is_displayed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_levels_when_compared_then_ordered_by_severity() {
        assert!(ErrorLevel::Debug < ErrorLevel::Info);
        assert!(ErrorLevel::Info < ErrorLevel::Warning);
        assert!(ErrorLevel::Warning < ErrorLevel::Error);
    }

    #[test]
    fn given_partial_thresholds_when_resolving_then_inherits_unset() {
        let parent = ResolvedThresholds::default();
        let own = ErrorThresholds {
            display: None,
            exit: Some(ErrorLevel::Warning),
        };

        let resolved = own.resolve(parent);

        assert_eq!(resolved.display, ErrorLevel::Info);
        assert_eq!(resolved.exit, ErrorLevel::Warning);
        assert!(resolved.exits(ErrorLevel::Warning));
        assert!(!resolved.exits(ErrorLevel::Info));
        assert!(resolved.displays(ErrorLevel::Info));
        assert!(!resolved.displays(ErrorLevel::Debug));
    }

    #[test]
    fn given_level_names_when_parsing_then_accepts_aliases() {
        assert_eq!("WARN".parse::<ErrorLevel>(), Ok(ErrorLevel::Warning));
        assert_eq!(" error ".parse::<ErrorLevel>(), Ok(ErrorLevel::Error));
        assert!("loud".parse::<ErrorLevel>().is_err());
    }
}
