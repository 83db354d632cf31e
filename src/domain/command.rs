//! Commands: named nodes owning arguments, groups and subcommands.

use crate::domain::arena::{ArgId, CommandId, GroupId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::names::push_names;
use crate::domain::severity::{ErrorLevel, ErrorLevelConfig, ErrorThresholds};

/// Error code used when a command does not set its own.
pub const DEFAULT_ERROR_CODE: i32 = 1;

/// Declaration of a command, built before it is placed in a tree.
#[derive(Debug, Clone)]
pub struct Command {
    names: Vec<String>,
    description: Option<String>,
    error_code: i32,
    thresholds: ErrorThresholds,
}

impl Command {
    pub fn new(name: impl AsRef<str>) -> DomainResult<Self> {
        Self {
            names: Vec::new(),
            description: None,
            error_code: DEFAULT_ERROR_CODE,
            thresholds: ErrorThresholds::default(),
        }
        .bind([name])
    }

    /// Register aliases.
    pub fn bind<I, S>(mut self, names: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owner = match self.names.first() {
            Some(n) => format!("command '{}'", n),
            None => "this command".to_string(),
        };
        push_names(&mut self.names, names, &owner)?;
        Ok(self)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Code contributed to the exit code when this command fails. Codes of all
    /// failing commands on the matched path are OR-ed together.
    pub fn error_code(mut self, code: i32) -> DomainResult<Self> {
        if code <= 0 {
            return Err(DomainError::InvalidConfiguration {
                name: self.display_name().to_string(),
                reason: format!("error code must be positive, got {}", code),
            });
        }
        self.error_code = code;
        Ok(self)
    }

    pub fn display_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_display_level(level);
        self
    }

    pub fn exit_level(mut self, level: ErrorLevel) -> Self {
        self.set_minimum_exit_level(level);
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn get_error_code(&self) -> i32 {
        self.error_code
    }
}

impl ErrorLevelConfig for Command {
    fn thresholds(&self) -> ErrorThresholds {
        self.thresholds
    }

    fn thresholds_mut(&mut self) -> &mut ErrorThresholds {
        &mut self.thresholds
    }
}

/// Arena entry for a command.
#[derive(Debug)]
pub(crate) struct CommandNode {
    pub(crate) command: Command,
    pub(crate) parent: Option<CommandId>,
    /// Declaration order, which is also positional order.
    pub(crate) arguments: Vec<ArgId>,
    /// Top-level groups only; nested groups hang off their parent group.
    pub(crate) groups: Vec<GroupId>,
    pub(crate) subcommands: Vec<CommandId>,
}

impl CommandNode {
    pub(crate) fn new(command: Command, parent: Option<CommandId>) -> Self {
        Self {
            command,
            parent,
            arguments: Vec::new(),
            groups: Vec::new(),
            subcommands: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_alias_when_binding_then_command_answers_to_both() {
        let cmd = Command::new("remove").unwrap().bind(["rm"]).unwrap();
        assert!(cmd.has_name("remove"));
        assert!(cmd.has_name("rm"));
        assert_eq!(cmd.display_name(), "remove");
    }

    #[test]
    fn given_zero_error_code_when_setting_then_rejected() {
        let result = Command::new("cmd").unwrap().error_code(0);
        assert!(matches!(
            result,
            Err(DomainError::InvalidConfiguration { .. })
        ));
    }
}
