use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::arg_type::ArgumentType;
use crate::domain::argument::{AnyArgument, ArgHandle, Argument, ArgumentNode, ArgumentSpec};
use crate::domain::command::{Command, CommandNode};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::group::{ArgumentGroup, GroupNode};
use crate::domain::names::{first_duplicate, first_shared};
use crate::domain::outcome::ParseOutcome;
use crate::domain::severity::{ErrorLevelConfig, ErrorReporter, ResolvedThresholds};
use crate::domain::state::ParsingState;

/// Stable reference to a command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(Index);

/// Stable reference to an argument node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgId(Index);

/// Stable reference to a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(Index);

impl CommandId {
    pub(crate) fn index(&self) -> Index {
        self.0
    }
}

impl ArgId {
    pub(crate) fn index(&self) -> Index {
        self.0
    }
}

impl GroupId {
    pub(crate) fn index(&self) -> Index {
        self.0
    }
}

/// Arena-based command tree.
///
/// Owns every command, argument and group; nodes refer to each other by id
/// instead of back-pointers. Structure is fixed once built: parsing borrows
/// the tree immutably and keeps all per-parse state in a
/// [`ParsingState`](crate::domain::ParsingState), so one tree can be parsed
/// any number of times.
pub struct CommandTree {
    commands: Arena<CommandNode>,
    arguments: Arena<ArgumentNode>,
    groups: Arena<GroupNode>,
    root: CommandId,
    defaults: ResolvedThresholds,
}

impl CommandTree {
    pub fn new(root: Command) -> Self {
        let mut commands = Arena::new();
        let root = CommandId(commands.insert(CommandNode::new(root, None)));
        Self {
            commands,
            arguments: Arena::new(),
            groups: Arena::new(),
            root,
            defaults: ResolvedThresholds::default(),
        }
    }

    pub fn root(&self) -> CommandId {
        self.root
    }

    /// Thresholds used where neither an argument nor any enclosing command
    /// sets its own.
    pub fn set_default_thresholds(&mut self, defaults: ResolvedThresholds) {
        self.defaults = defaults;
    }

    pub fn default_thresholds(&self) -> ResolvedThresholds {
        self.defaults
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Add `command` as a child of `parent`. Its names must not clash with
    /// any sibling's names.
    #[instrument(level = "debug", skip(self, command), fields(name = command.display_name()))]
    pub fn define_subcommand(&mut self, parent: CommandId, command: Command) -> DomainResult<CommandId> {
        let parent_node = self.command_node(parent)?;
        for &sibling in &parent_node.subcommands {
            let sibling = self.command_node(sibling)?;
            if let Some(name) = first_shared(command.names(), sibling.command.names()) {
                return Err(DomainError::DuplicateName {
                    name: name.clone(),
                    owner: format!("command '{}'", sibling.command.display_name()),
                });
            }
        }

        let id = CommandId(self.commands.insert(CommandNode::new(command, Some(parent))));
        self.command_node_mut(parent)?.subcommands.push(id);
        debug!("defined subcommand {:?} under {:?}", id, parent);
        Ok(id)
    }

    /// Store `argument` without attaching it to a command yet.
    pub fn insert_argument<A>(&mut self, argument: Argument<A>) -> ArgHandle<A::Value>
    where
        A: ArgumentType + 'static,
    {
        let node = ArgumentNode {
            argument: Box::new(argument),
            command: None,
            group: None,
        };
        ArgHandle::new(ArgId(self.arguments.insert(node)))
    }

    /// Attach a stored argument to `command`. An argument is attached exactly
    /// once.
    pub fn attach_argument(&mut self, command: CommandId, argument: ArgId) -> DomainResult<()> {
        self.check_attachable(command, &[argument])?;
        self.attach_unchecked(command, argument)
    }

    /// Store `argument` and attach it to `command`.
    #[instrument(level = "debug", skip(self, argument), fields(name = argument.display_name()))]
    pub fn define_argument<A>(
        &mut self,
        command: CommandId,
        argument: Argument<A>,
    ) -> DomainResult<ArgHandle<A::Value>>
    where
        A: ArgumentType + 'static,
    {
        let handle = self.insert_argument(argument);
        if let Err(e) = self.attach_argument(command, handle.id()) {
            self.arguments.remove(handle.id().index());
            return Err(e);
        }
        Ok(handle)
    }

    /// Store a group that is not registered to any command yet.
    pub fn create_group(&mut self, group: ArgumentGroup) -> GroupId {
        GroupId(self.groups.insert(GroupNode::new(group)))
    }

    /// Store `argument` as a member of `group`. If the group is already
    /// registered, the argument is attached to the group's command as well.
    pub fn add_group_argument<A>(
        &mut self,
        group: GroupId,
        argument: Argument<A>,
    ) -> DomainResult<ArgHandle<A::Value>>
    where
        A: ArgumentType + 'static,
    {
        let handle = self.insert_argument(argument);
        if let Err(e) = self.add_argument_to_group(group, handle.id()) {
            self.arguments.remove(handle.id().index());
            return Err(e);
        }
        Ok(handle)
    }

    /// Make a stored argument a direct member of `group`. An argument belongs
    /// to at most one group.
    pub fn add_argument_to_group(&mut self, group: GroupId, argument: ArgId) -> DomainResult<()> {
        let arg_node = self.argument_node(argument)?;
        if arg_node.group.is_some() {
            return Err(DomainError::AlreadyOwned(format!(
                "argument '{}'",
                arg_node.argument.display_name()
            )));
        }
        let command = self.group_node(group)?.command;
        if let Some(command) = command {
            self.check_attachable(command, &[argument])?;
        }

        self.group_node_mut(group)?.arguments.push(argument);
        self.argument_node_mut(argument)?.group = Some(group);
        if let Some(command) = command {
            self.attach_unchecked(command, argument)?;
        }
        Ok(())
    }

    /// Nest `child` inside `parent`. A group has at most one parent.
    pub fn add_subgroup(&mut self, parent: GroupId, child: GroupId) -> DomainResult<()> {
        if parent == child || self.is_ancestor(child, parent)? {
            return Err(DomainError::InvalidConfiguration {
                name: self.group_node(child)?.group.name().to_string(),
                reason: "a group cannot contain itself".to_string(),
            });
        }
        let child_node = self.group_node(child)?;
        if child_node.parent.is_some() || child_node.command.is_some() {
            return Err(DomainError::AlreadyOwned(format!(
                "group '{}'",
                child_node.group.name()
            )));
        }
        let command = self.group_node(parent)?.command;
        if let Some(command) = command {
            let members = self.collect_group_arguments(child)?;
            self.check_attachable(command, &members)?;
        }

        self.group_node_mut(parent)?.subgroups.push(child);
        self.group_node_mut(child)?.parent = Some(parent);
        if let Some(command) = command {
            self.bind_group_to_command(child, command)?;
        }
        Ok(())
    }

    /// Register a top-level group with `command`, attaching every member
    /// argument (recursively through subgroups). A group is registered once.
    #[instrument(level = "debug", skip(self))]
    pub fn register_group(&mut self, group: GroupId, command: CommandId) -> DomainResult<()> {
        let node = self.group_node(group)?;
        if node.command.is_some() {
            return Err(DomainError::AlreadyBound(format!("group '{}'", node.group.name())));
        }
        if node.parent.is_some() {
            return Err(DomainError::AlreadyOwned(format!("group '{}'", node.group.name())));
        }
        let members = self.collect_group_arguments(group)?;
        self.check_attachable(command, &members)?;

        self.command_node_mut(command)?.groups.push(group);
        self.bind_group_to_command(group, command)
    }

    /// Create `group` and register it with `command`.
    pub fn define_group(&mut self, command: CommandId, group: ArgumentGroup) -> DomainResult<GroupId> {
        self.command_node(command)?;
        let id = self.create_group(group);
        self.register_group(id, command)?;
        Ok(id)
    }

    fn bind_group_to_command(&mut self, group: GroupId, command: CommandId) -> DomainResult<()> {
        let node = self.group_node_mut(group)?;
        node.command = Some(command);
        let arguments = node.arguments.clone();
        let subgroups = node.subgroups.clone();
        for argument in arguments {
            self.attach_unchecked(command, argument)?;
        }
        for subgroup in subgroups {
            self.bind_group_to_command(subgroup, command)?;
        }
        Ok(())
    }

    fn collect_group_arguments(&self, group: GroupId) -> DomainResult<Vec<ArgId>> {
        let node = self.group_node(group)?;
        let mut members = node.arguments.clone();
        for &subgroup in &node.subgroups {
            members.extend(self.collect_group_arguments(subgroup)?);
        }
        Ok(members)
    }

    fn is_ancestor(&self, candidate: GroupId, group: GroupId) -> DomainResult<bool> {
        let mut current = self.group_node(group)?.parent;
        while let Some(parent) = current {
            if parent == candidate {
                return Ok(true);
            }
            current = self.group_node(parent)?.parent;
        }
        Ok(false)
    }

    /// Verify that `arguments` can all be attached to `command`: none is
    /// attached yet, and no name clashes with the command's arguments or
    /// among the new arguments themselves.
    fn check_attachable(&self, command: CommandId, arguments: &[ArgId]) -> DomainResult<()> {
        let cmd_node = self.command_node(command)?;
        let mut taken: Vec<String> = Vec::new();
        for &existing in &cmd_node.arguments {
            taken.extend(self.argument_node(existing)?.argument.names().iter().cloned());
        }

        let mut incoming: Vec<String> = Vec::new();
        for &argument in arguments {
            let node = self.argument_node(argument)?;
            let spec = node.argument.as_spec();
            if node.command.is_some() {
                return Err(DomainError::AlreadyBound(format!(
                    "argument '{}'",
                    spec.display_name()
                )));
            }
            if let Some(name) = spec.names().iter().find(|n| n.starts_with(spec.prefix())) {
                return Err(DomainError::InvalidName {
                    name: name.clone(),
                    reason: format!("name starts with the prefix '{}'", spec.prefix()),
                });
            }
            if let Some(name) = first_shared(spec.names(), &taken) {
                return Err(DomainError::DuplicateName {
                    name: name.clone(),
                    owner: format!("command '{}'", cmd_node.command.display_name()),
                });
            }
            incoming.extend(spec.names().iter().cloned());
        }
        if let Some(name) = first_duplicate(&incoming) {
            return Err(DomainError::DuplicateName {
                name: name.clone(),
                owner: format!("command '{}'", cmd_node.command.display_name()),
            });
        }
        Ok(())
    }

    fn attach_unchecked(&mut self, command: CommandId, argument: ArgId) -> DomainResult<()> {
        self.argument_node_mut(argument)?.command = Some(command);
        self.command_node_mut(command)?.arguments.push(argument);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Parse `tokens` starting at the root command.
    #[instrument(level = "debug", skip_all)]
    pub fn parse<I, S>(&self, tokens: I) -> ParseOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        debug!("parsing {} tokens", tokens.len());
        let outcome = ParsingState::new(self, tokens).run();
        self.invoke_callbacks(&outcome);
        outcome
    }

    /// Fire callbacks along the matched command path, root first, arguments
    /// in declaration order.
    fn invoke_callbacks(&self, outcome: &ParseOutcome) {
        for &command in outcome.command_path() {
            let Some(node) = self.commands.get(command.index()) else {
                continue;
            };
            let unique_fired = self.unique_argument_used(command, |arg| outcome.usage_count(arg));
            for &arg in &node.arguments {
                let Some(arg_node) = self.arguments.get(arg.index()) else {
                    continue;
                };
                let argument = &arg_node.argument;
                if outcome.usage_count(arg) > 0 && (argument.allows_unique() || !unique_fired) {
                    if let Some(value) = outcome.value(arg) {
                        argument.invoke_ok(value);
                    }
                }
                let report = outcome.argument_report(arg);
                if report.has_exit_errors() {
                    argument.invoke_err(&report);
                }
            }
        }
    }

    /// Whether any allow-unique argument of `command` was used.
    pub(crate) fn unique_argument_used(&self, command: CommandId, usage_count: impl Fn(ArgId) -> usize) -> bool {
        self.commands.get(command.index()).is_some_and(|node| {
            node.arguments.iter().any(|&arg| {
                usage_count(arg) > 0
                    && self
                        .arguments
                        .get(arg.index())
                        .is_some_and(|n| n.argument.allows_unique())
            })
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.index()).map(|n| &n.command)
    }

    pub fn parent_of(&self, id: CommandId) -> Option<CommandId> {
        self.commands.get(id.index()).and_then(|n| n.parent)
    }

    pub fn subcommands(&self, id: CommandId) -> &[CommandId] {
        self.commands
            .get(id.index())
            .map(|n| n.subcommands.as_slice())
            .unwrap_or_default()
    }

    /// Arguments of `id` in declaration order.
    pub fn arguments_of(&self, id: CommandId) -> &[ArgId] {
        self.commands
            .get(id.index())
            .map(|n| n.arguments.as_slice())
            .unwrap_or_default()
    }

    /// Top-level groups registered with `id`.
    pub fn groups_of(&self, id: CommandId) -> &[GroupId] {
        self.commands
            .get(id.index())
            .map(|n| n.groups.as_slice())
            .unwrap_or_default()
    }

    pub fn argument(&self, id: ArgId) -> Option<&dyn ArgumentSpec> {
        self.arguments.get(id.index()).map(|n| n.argument.as_spec())
    }

    pub fn argument_command(&self, id: ArgId) -> Option<CommandId> {
        self.arguments.get(id.index()).and_then(|n| n.command)
    }

    pub fn argument_group(&self, id: ArgId) -> Option<GroupId> {
        self.arguments.get(id.index()).and_then(|n| n.group)
    }

    pub fn group(&self, id: GroupId) -> Option<&ArgumentGroup> {
        self.groups.get(id.index()).map(|n| &n.group)
    }

    pub fn group_arguments(&self, id: GroupId) -> &[ArgId] {
        self.groups
            .get(id.index())
            .map(|n| n.arguments.as_slice())
            .unwrap_or_default()
    }

    pub fn subgroups(&self, id: GroupId) -> &[GroupId] {
        self.groups
            .get(id.index())
            .map(|n| n.subgroups.as_slice())
            .unwrap_or_default()
    }

    pub fn find_subcommand(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.subcommands(id).iter().copied().find(|&child| {
            self.command(child).is_some_and(|c| c.has_name(name))
        })
    }

    pub fn find_argument(&self, id: CommandId, name: &str) -> Option<ArgId> {
        self.arguments_of(id)
            .iter()
            .copied()
            .find(|&arg| self.argument(arg).is_some_and(|a| a.has_name(name)))
    }

    /// Resolve a path of command names below the root, e.g. `["cmd1-1"]`.
    pub fn find_command_path<S: AsRef<str>>(&self, path: &[S]) -> Option<CommandId> {
        path.iter()
            .try_fold(self.root, |current, name| self.find_subcommand(current, name.as_ref()))
    }

    /// Thresholds of `id` with unset levels inherited from its ancestors.
    pub fn command_thresholds(&self, id: CommandId) -> ResolvedThresholds {
        match self.commands.get(id.index()) {
            Some(node) => {
                let parent = match node.parent {
                    Some(parent) => self.command_thresholds(parent),
                    None => self.defaults,
                };
                node.command.thresholds().resolve(parent)
            }
            None => self.defaults,
        }
    }

    /// Thresholds of `id` with unset levels inherited from its command.
    pub fn argument_thresholds(&self, id: ArgId) -> ResolvedThresholds {
        match self.arguments.get(id.index()) {
            Some(node) => {
                let parent = match node.command {
                    Some(command) => self.command_thresholds(command),
                    None => self.defaults,
                };
                node.argument.error_thresholds().resolve(parent)
            }
            None => self.defaults,
        }
    }

    pub(crate) fn argument_entry(&self, id: ArgId) -> Option<&dyn AnyArgument> {
        self.arguments.get(id.index()).map(|n| n.argument.as_ref())
    }

    pub(crate) fn group_entry(&self, id: GroupId) -> Option<&GroupNode> {
        self.groups.get(id.index())
    }

    pub(crate) fn argument_arena(&self) -> &Arena<ArgumentNode> {
        &self.arguments
    }

    fn command_node(&self, id: CommandId) -> DomainResult<&CommandNode> {
        self.commands
            .get(id.index())
            .ok_or(DomainError::UnknownNode("command"))
    }

    fn command_node_mut(&mut self, id: CommandId) -> DomainResult<&mut CommandNode> {
        self.commands
            .get_mut(id.index())
            .ok_or(DomainError::UnknownNode("command"))
    }

    fn argument_node(&self, id: ArgId) -> DomainResult<&ArgumentNode> {
        self.arguments
            .get(id.index())
            .ok_or(DomainError::UnknownNode("argument"))
    }

    fn argument_node_mut(&mut self, id: ArgId) -> DomainResult<&mut ArgumentNode> {
        self.arguments
            .get_mut(id.index())
            .ok_or(DomainError::UnknownNode("argument"))
    }

    fn group_node(&self, id: GroupId) -> DomainResult<&GroupNode> {
        self.groups
            .get(id.index())
            .ok_or(DomainError::UnknownNode("group"))
    }

    fn group_node_mut(&mut self, id: GroupId) -> DomainResult<&mut GroupNode> {
        self.groups
            .get_mut(id.index())
            .ok_or(DomainError::UnknownNode("group"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::IntType;

    #[test]
    fn given_sibling_with_same_alias_when_defining_subcommand_then_duplicate_name() {
        let mut tree = CommandTree::new(Command::new("app").unwrap());
        let root = tree.root();
        tree.define_subcommand(root, Command::new("remove").unwrap().bind(["rm"]).unwrap())
            .unwrap();

        let result = tree.define_subcommand(root, Command::new("rm").unwrap());

        assert!(matches!(result, Err(DomainError::DuplicateName { .. })));
        assert_eq!(tree.subcommands(root).len(), 1);
    }

    #[test]
    fn given_rejected_argument_when_defining_then_nothing_is_left_behind() {
        let mut tree = CommandTree::new(Command::new("app").unwrap());
        let root = tree.root();
        tree.define_argument(root, Argument::new(IntType::default(), ["n"]).unwrap())
            .unwrap();

        let result = tree.define_argument(root, Argument::flag(["n"]).unwrap());

        assert!(result.is_err());
        assert_eq!(tree.arguments_of(root).len(), 1);
        assert_eq!(tree.arguments.len(), 1);
    }

    #[test]
    fn given_nested_commands_when_resolving_thresholds_then_inherits_from_ancestors() {
        use crate::domain::severity::ErrorLevel;

        let mut tree = CommandTree::new(
            Command::new("app")
                .unwrap()
                .exit_level(ErrorLevel::Warning),
        );
        let root = tree.root();
        let child = tree
            .define_subcommand(root, Command::new("sub").unwrap().display_level(ErrorLevel::Error))
            .unwrap();
        let arg = tree
            .define_argument(child, Argument::flag(["x"]).unwrap())
            .unwrap();

        let resolved = tree.argument_thresholds(arg.id());

        assert_eq!(resolved.exit, ErrorLevel::Warning);
        assert_eq!(resolved.display, ErrorLevel::Error);
    }

    #[test]
    fn given_name_starting_with_prefix_when_attaching_then_invalid_name() {
        let mut tree = CommandTree::new(Command::new("app").unwrap());
        let root = tree.root();

        let result = tree.define_argument(root, Argument::flag(["-x"]).unwrap());

        assert!(matches!(result, Err(DomainError::InvalidName { .. })));
    }
}
