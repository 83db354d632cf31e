use termtree::Tree;
use tracing::instrument;

use crate::domain::{ArgId, ArgumentSpec, CommandId, CommandTree, GroupId};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for CommandTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        command_tree(self, self.root())
    }
}

fn command_tree(tree: &CommandTree, id: CommandId) -> Tree<String> {
    let label = match tree.command(id) {
        Some(command) => {
            let mut label = command.names().join(" | ");
            if let Some(description) = command.get_description() {
                label.push_str(&format!(" - {}", description));
            }
            label
        }
        None => "<unknown>".to_string(),
    };
    let mut node = Tree::new(label);

    for &arg in tree.arguments_of(id) {
        if tree.argument_group(arg).is_none() {
            node.push(argument_leaf(tree, arg));
        }
    }
    for &group in tree.groups_of(id) {
        node.push(group_tree(tree, group));
    }
    for &sub in tree.subcommands(id) {
        node.push(command_tree(tree, sub));
    }
    node
}

fn group_tree(tree: &CommandTree, id: GroupId) -> Tree<String> {
    let label = match tree.group(id) {
        Some(group) if group.is_exclusive() => format!("[{}] (exclusive)", group.name()),
        Some(group) => format!("[{}]", group.name()),
        None => "[<unknown>]".to_string(),
    };
    let mut node = Tree::new(label);
    for &arg in tree.group_arguments(id) {
        node.push(argument_leaf(tree, arg));
    }
    for &sub in tree.subgroups(id) {
        node.push(group_tree(tree, sub));
    }
    node
}

fn argument_leaf(tree: &CommandTree, id: ArgId) -> Tree<String> {
    let Some(argument) = tree.argument(id) else {
        return Tree::new("<unknown>".to_string());
    };
    Tree::new(describe_argument(argument))
}

fn describe_argument(argument: &dyn ArgumentSpec) -> String {
    let prefix = argument.prefix();
    let names: Vec<String> = argument
        .names()
        .iter()
        .map(|n| {
            if n.chars().count() == 1 {
                format!("{}{}", prefix, n)
            } else {
                format!("{}{}{}", prefix, prefix, n)
            }
        })
        .collect();
    let mut label = names.join(", ");
    if let Some(repr) = argument.representation() {
        label.push_str(&format!(" {}", repr));
    }

    let mut flags = Vec::new();
    if argument.is_obligatory() {
        flags.push("obligatory");
    }
    if argument.is_positional() {
        flags.push("positional");
    }
    if argument.allows_unique() {
        flags.push("unique");
    }
    if argument.has_default() {
        flags.push("default");
    }
    if !flags.is_empty() {
        label.push_str(&format!(" ({})", flags.join(", ")));
    }
    if let Some(description) = argument.description() {
        label.push_str(&format!(" - {}", description));
    }
    label
}
