//! Argument groups and the exclusivity rule.

use generational_arena::Arena;

use crate::domain::argument::ArgumentNode;
use crate::domain::arena::{ArgId, CommandId, GroupId};
use crate::domain::error::DomainResult;
use crate::domain::names::sanitize_name;

/// Declaration of a group, built before it is placed in a tree.
#[derive(Debug, Clone)]
pub struct ArgumentGroup {
    name: String,
    description: Option<String>,
    exclusive: bool,
}

impl ArgumentGroup {
    pub fn new(name: impl AsRef<str>) -> DomainResult<Self> {
        Ok(Self {
            name: sanitize_name(name.as_ref())?,
            description: None,
            exclusive: false,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// At most one direct member may be used per parse. Idempotent.
    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

/// Arena entry for a group.
#[derive(Debug)]
pub(crate) struct GroupNode {
    pub(crate) group: ArgumentGroup,
    pub(crate) command: Option<CommandId>,
    pub(crate) parent: Option<GroupId>,
    pub(crate) arguments: Vec<ArgId>,
    pub(crate) subgroups: Vec<GroupId>,
}

impl GroupNode {
    pub(crate) fn new(group: ArgumentGroup) -> Self {
        Self {
            group,
            command: None,
            parent: None,
            arguments: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    /// Direct members whose immediate group is `id`.
    pub(crate) fn direct_members<'a>(
        &'a self,
        id: GroupId,
        arguments: &'a Arena<ArgumentNode>,
    ) -> impl Iterator<Item = ArgId> + 'a {
        self.arguments.iter().copied().filter(move |arg| {
            arguments
                .get(arg.index())
                .is_some_and(|node| node.group == Some(id))
        })
    }

    /// `false` iff a direct member other than `argument` has been used.
    pub(crate) fn check_exclusivity(
        &self,
        id: GroupId,
        arguments: &Arena<ArgumentNode>,
        argument: ArgId,
        usage_count: impl Fn(ArgId) -> usize,
    ) -> bool {
        !self
            .direct_members(id, arguments)
            .filter(|member| *member != argument)
            .any(|member| usage_count(member) > 0)
    }
}
