//! The single-pass token scan.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::domain::arena::{ArgId, CommandId, CommandTree, GroupId};
use crate::domain::arg_type::{ValueContext, ValueCount};
use crate::domain::argument::{AnyValue, DEFAULT_PREFIX};
use crate::domain::outcome::{ParseError, ParseErrorKind, ParseOutcome};
use crate::domain::severity::ErrorLevel;

/// Parse-scoped record for one argument.
#[derive(Debug, Clone, Copy)]
struct ArgumentUsage {
    count: usize,
    /// Token that triggered the first use.
    token_index: usize,
}

/// What a token means to the command currently scanning.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Subcommand(CommandId),
    Long { argument: ArgId, inline: Option<String> },
    UnknownLong(String),
    ShortGroup { prefix: char, body: String },
    Plain,
}

/// Mutable context of one parse.
///
/// Borrows the tree read-only; everything that changes while scanning lives
/// here and is moved into the [`ParseOutcome`] at the end.
pub struct ParsingState<'t> {
    tree: &'t CommandTree,
    tokens: Vec<String>,
    cursor: usize,
    usage: HashMap<ArgId, ArgumentUsage>,
    values: HashMap<ArgId, Box<dyn AnyValue>>,
    errors: Vec<ParseError>,
    flagged_groups: HashSet<GroupId>,
    command_path: Vec<CommandId>,
}

impl<'t> ParsingState<'t> {
    pub fn new(tree: &'t CommandTree, tokens: Vec<String>) -> Self {
        Self {
            tree,
            tokens,
            cursor: 0,
            usage: HashMap::new(),
            values: HashMap::new(),
            errors: Vec::new(),
            flagged_groups: HashSet::new(),
            command_path: Vec::new(),
        }
    }

    /// Scan every token, delegating to subcommands as they are matched.
    pub fn run(mut self) -> ParseOutcome {
        let mut next = Some((self.tree.root(), 0));
        while let Some((command, origin)) = next {
            self.command_path.push(command);
            next = self.scan(command);
            self.finish_command(command, origin);
        }
        self.into_outcome()
    }

    /// Walk tokens for `command` until they run out or a subcommand takes
    /// over. Returns the subcommand and the index of its name token.
    fn scan(&mut self, command: CommandId) -> Option<(CommandId, usize)> {
        while self.cursor < self.tokens.len() {
            let index = self.cursor;
            let token = self.classify(command, index);
            trace!(index, ?token, "classified");
            match token {
                Token::Subcommand(child) => {
                    debug!("delegating remaining tokens to {:?}", child);
                    self.cursor += 1;
                    return Some((child, index));
                }
                Token::Long { argument, inline } => {
                    self.cursor += 1;
                    self.consume(command, argument, index, inline);
                }
                Token::UnknownLong(name) => {
                    self.cursor += 1;
                    self.command_error(command, index, ParseErrorKind::UnknownArgument { name });
                }
                Token::ShortGroup { prefix, body } => {
                    self.cursor += 1;
                    self.expand_short_group(command, index, prefix, &body);
                }
                Token::Plain => match self.next_positional(command) {
                    // cursor stays put: the positional takes this token as its first value
                    Some(argument) => self.consume(command, argument, index, None),
                    None => {
                        self.cursor += 1;
                        let token = self.tokens[index].clone();
                        self.command_error(command, index, ParseErrorKind::UnrecognizedToken { token });
                    }
                },
            }
        }
        None
    }

    fn classify(&self, command: CommandId, index: usize) -> Token {
        let token = self.tokens[index].as_str();
        if let Some(child) = self.tree.find_subcommand(command, token) {
            return Token::Subcommand(child);
        }

        let mut prefixes: Vec<char> = Vec::new();
        for &id in self.tree.arguments_of(command) {
            if let Some(argument) = self.tree.argument(id) {
                if !prefixes.contains(&argument.prefix()) {
                    prefixes.push(argument.prefix());
                }
            }
        }

        if prefixes.is_empty() {
            prefixes.push(DEFAULT_PREFIX);
        }

        for &prefix in &prefixes {
            let Some(rest) = token
                .strip_prefix(prefix)
                .and_then(|t| t.strip_prefix(prefix))
            else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let (name, inline) = match rest.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (rest, None),
            };
            let found = self.tree.arguments_of(command).iter().copied().find(|&id| {
                self.tree
                    .argument(id)
                    .is_some_and(|a| a.prefix() == prefix && a.has_name(name))
            });
            return match found {
                Some(argument) => Token::Long { argument, inline },
                None => Token::UnknownLong(format!("{}{}{}", prefix, prefix, name)),
            };
        }

        for &prefix in &prefixes {
            let Some(body) = token.strip_prefix(prefix) else {
                continue;
            };
            if let Some(first) = body.chars().next() {
                if self.find_short(command, prefix, first).is_some() {
                    return Token::ShortGroup {
                        prefix,
                        body: body.to_string(),
                    };
                }
            }
        }

        Token::Plain
    }

    fn find_short(&self, command: CommandId, prefix: char, name: char) -> Option<ArgId> {
        self.tree.arguments_of(command).iter().copied().find(|&id| {
            self.tree
                .argument(id)
                .is_some_and(|a| a.prefix() == prefix && a.has_short_name(name))
        })
    }

    /// Each character of `-abc` resolves on its own. A value-taking argument
    /// takes the rest of the token (`-n10`) or, if nothing is left, the
    /// following tokens; expansion stops there.
    fn expand_short_group(&mut self, command: CommandId, index: usize, prefix: char, body: &str) {
        for (pos, c) in body.char_indices() {
            let Some(argument) = self.find_short(command, prefix, c) else {
                self.command_error(
                    command,
                    index,
                    ParseErrorKind::UnknownArgument {
                        name: format!("{}{}", prefix, c),
                    },
                );
                continue;
            };
            let takes_values = self
                .tree
                .argument(argument)
                .is_some_and(|a| !a.value_count().is_none());
            if !takes_values {
                self.consume(command, argument, index, None);
                continue;
            }
            let rest = &body[pos + c.len_utf8()..];
            let inline = (!rest.is_empty()).then(|| rest.to_string());
            self.consume(command, argument, index, inline);
            break;
        }
    }

    fn next_positional(&self, command: CommandId) -> Option<ArgId> {
        self.tree.arguments_of(command).iter().copied().find(|&id| {
            self.usage_count(id) == 0 && self.tree.argument(id).is_some_and(|a| a.is_positional())
        })
    }

    /// Take value tokens from the cursor, up to `count.max`. Tokens that look
    /// like an argument always end the run. A subcommand name is taken only
    /// while fewer than `count.min` values have been collected.
    fn take_values(&mut self, command: CommandId, count: ValueCount) -> (Vec<String>, Vec<usize>) {
        let mut values = Vec::new();
        let mut indices = Vec::new();
        while values.len() < count.max && self.cursor < self.tokens.len() {
            let is_value = match self.classify(command, self.cursor) {
                Token::Plain => true,
                Token::Subcommand(_) => values.len() < count.min,
                _ => false,
            };
            if !is_value {
                break;
            }
            values.push(self.tokens[self.cursor].clone());
            indices.push(self.cursor);
            self.cursor += 1;
        }
        (values, indices)
    }

    /// One use of `argument`, triggered by the token at `index`.
    fn consume(&mut self, command: CommandId, argument: ArgId, index: usize, inline: Option<String>) {
        let tree = self.tree;
        let Some(entry) = tree.argument_entry(argument) else {
            return;
        };
        let count = entry.value_count();

        let mut ignored = None;
        let (values, indices) = match inline {
            Some(value) if count.is_none() => {
                ignored = Some(value);
                (Vec::new(), Vec::new())
            }
            Some(value) => (vec![value], vec![index]),
            None => self.take_values(command, count),
        };

        if let Some(usage) = self.usage.get_mut(&argument) {
            usage.count += 1;
            self.argument_error(
                command,
                argument,
                index,
                ErrorLevel::Error,
                ParseErrorKind::ArgumentUsedTooManyTimes {
                    argument: entry.display_name().to_string(),
                },
            );
            return;
        }
        self.check_exclusive_group(command, argument, index);
        self.usage.insert(argument, ArgumentUsage { count: 1, token_index: index });
        debug!("argument '{}' used at token {}", entry.display_name(), index);
        if let Some(value) = ignored {
            self.argument_error(
                command,
                argument,
                index,
                ErrorLevel::Info,
                ParseErrorKind::Custom {
                    message: format!(
                        "value '{}' ignored, '{}' takes no values",
                        value,
                        entry.display_name()
                    ),
                },
            );
        }

        if !count.accepts(values.len()) {
            self.incorrect_value_number(command, argument, index, count, values.len());
            return;
        }

        let mut ctx = ValueContext::new(index, indices);
        let value = entry.parse_values(&values, &mut ctx);
        let thresholds = entry
            .type_thresholds()
            .resolve(tree.argument_thresholds(argument));
        for e in ctx.into_errors() {
            self.errors.push(ParseError::new(
                e.kind,
                e.level,
                e.token_index,
                command,
                Some(argument),
                thresholds,
            ));
        }
        if let Some(value) = value {
            self.values.insert(argument, value);
        }
    }

    fn incorrect_value_number(
        &mut self,
        command: CommandId,
        argument: ArgId,
        index: usize,
        expected: ValueCount,
        received: usize,
    ) {
        let name = self
            .tree
            .argument(argument)
            .map(|a| a.display_name().to_string())
            .unwrap_or_default();
        self.argument_error(
            command,
            argument,
            index,
            ErrorLevel::Error,
            ParseErrorKind::IncorrectValueNumber {
                argument: name,
                expected,
                received,
            },
        );
    }

    /// Raise one error per exclusive group, when its second direct member is
    /// matched.
    fn check_exclusive_group(&mut self, command: CommandId, argument: ArgId, index: usize) {
        let tree = self.tree;
        let Some(group) = tree.argument_group(argument) else {
            return;
        };
        if self.flagged_groups.contains(&group) {
            return;
        }
        let Some(node) = tree.group_entry(group) else {
            return;
        };
        if !node.group.is_exclusive()
            || node.check_exclusivity(group, tree.argument_arena(), argument, |a| self.usage_count(a))
        {
            return;
        }

        let mut used: Vec<(usize, ArgId)> = node
            .direct_members(group, tree.argument_arena())
            .filter_map(|a| self.usage.get(&a).map(|u| (u.token_index, a)))
            .collect();
        used.sort_by_key(|(token_index, _)| *token_index);
        used.push((index, argument));
        let arguments = used
            .iter()
            .filter_map(|(_, a)| tree.argument(*a).map(|s| s.display_name().to_string()))
            .collect();

        self.flagged_groups.insert(group);
        self.command_error(
            command,
            index,
            ParseErrorKind::MultipleExclusiveArgumentsUsed {
                group: node.group.name().to_string(),
                arguments,
            },
        );
    }

    /// Apply defaults and report unused obligatory arguments.
    fn finish_command(&mut self, command: CommandId, origin: usize) {
        let tree = self.tree;
        let unique_fired = tree.unique_argument_used(command, |a| self.usage_count(a));
        for &argument in tree.arguments_of(command) {
            if self.usage_count(argument) > 0 {
                continue;
            }
            let Some(entry) = tree.argument_entry(argument) else {
                continue;
            };
            if entry.is_obligatory() && !unique_fired {
                self.argument_error(
                    command,
                    argument,
                    origin,
                    ErrorLevel::Error,
                    ParseErrorKind::ObligatoryArgumentNotUsed {
                        argument: entry.display_name().to_string(),
                    },
                );
            } else if let Some(value) = entry.default_value() {
                self.values.insert(argument, value);
            }
        }
    }

    fn command_error(&mut self, command: CommandId, index: usize, kind: ParseErrorKind) {
        let thresholds = self.tree.command_thresholds(command);
        self.errors.push(ParseError::new(
            kind,
            ErrorLevel::Error,
            index,
            command,
            None,
            thresholds,
        ));
    }

    fn argument_error(
        &mut self,
        command: CommandId,
        argument: ArgId,
        index: usize,
        level: ErrorLevel,
        kind: ParseErrorKind,
    ) {
        let thresholds = self.tree.argument_thresholds(argument);
        self.errors.push(ParseError::new(
            kind,
            level,
            index,
            command,
            Some(argument),
            thresholds,
        ));
    }

    fn usage_count(&self, argument: ArgId) -> usize {
        self.usage.get(&argument).map(|u| u.count).unwrap_or(0)
    }

    /// Errors are ordered by token index. Ties go to the command matched
    /// first, then to argument errors in declaration order, then to the
    /// command's own errors in the order they were raised.
    fn into_outcome(mut self) -> ParseOutcome {
        let tree = self.tree;
        let path = &self.command_path;
        self.errors.sort_by_cached_key(|e| {
            let command_rank = path.iter().position(|&c| c == e.command).unwrap_or(usize::MAX);
            let argument_rank = e
                .argument
                .and_then(|a| tree.arguments_of(e.command).iter().position(|&x| x == a))
                .unwrap_or(usize::MAX);
            (e.token_index, command_rank, argument_rank)
        });

        let mut exit_code = 0;
        let mut names = HashMap::new();
        for &command in &self.command_path {
            let failed = self
                .errors
                .iter()
                .any(|e| e.command == command && e.is_fatal());
            if failed {
                exit_code |= self
                    .tree
                    .command(command)
                    .map(|c| c.get_error_code())
                    .unwrap_or_default();
            }
            for &argument in self.tree.arguments_of(command) {
                if let Some(spec) = self.tree.argument(argument) {
                    names.insert(argument, spec.display_name().to_string());
                }
            }
        }
        debug!(errors = self.errors.len(), exit_code, "parse finished");

        ParseOutcome {
            tokens: self.tokens,
            values: self.values,
            usage: self.usage.into_iter().map(|(id, u)| (id, u.count)).collect(),
            names,
            errors: self.errors,
            command_path: self.command_path,
            exit_code,
        }
    }
}
