//! Tests for building command trees

use argtree::domain::{
    Argument, ArgumentGroup, Command, CommandTree, DomainError, IntType, StringType,
};
use argtree::util::testing;

fn tree() -> CommandTree {
    testing::init_test_setup();
    CommandTree::new(Command::new("app").unwrap())
}

#[test]
fn given_attached_argument_when_attaching_again_then_already_bound() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let child = tree.define_subcommand(root, Command::new("sub").unwrap()).unwrap();
    let handle = tree.insert_argument(Argument::flag(["verbose"]).unwrap());
    tree.attach_argument(root, handle.id()).unwrap();

    // Act
    let result = tree.attach_argument(child, handle.id());

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyBound(_))));
    assert_eq!(tree.argument_command(handle.id()), Some(root));
    assert!(tree.arguments_of(child).is_empty());
}

#[test]
fn given_registered_group_when_registering_again_then_already_bound() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let group = tree.define_group(root, ArgumentGroup::new("mode").unwrap()).unwrap();

    // Act
    let result = tree.register_group(group, root);

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyBound(_))));
    assert_eq!(tree.groups_of(root), &[group]);
}

#[test]
fn given_grouped_argument_when_adding_to_second_group_then_already_owned() {
    // Arrange
    let mut tree = tree();
    let first = tree.create_group(ArgumentGroup::new("first").unwrap());
    let second = tree.create_group(ArgumentGroup::new("second").unwrap());
    let handle = tree
        .add_group_argument(first, Argument::flag(["x"]).unwrap())
        .unwrap();

    // Act
    let result = tree.add_argument_to_group(second, handle.id());

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyOwned(_))));
    assert_eq!(tree.argument_group(handle.id()), Some(first));
    assert!(tree.group_arguments(second).is_empty());
}

#[test]
fn given_nested_group_when_reparenting_then_already_owned() {
    // Arrange
    let mut tree = tree();
    let a = tree.create_group(ArgumentGroup::new("a").unwrap());
    let b = tree.create_group(ArgumentGroup::new("b").unwrap());
    let inner = tree.create_group(ArgumentGroup::new("inner").unwrap());
    tree.add_subgroup(a, inner).unwrap();

    // Act
    let result = tree.add_subgroup(b, inner);

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyOwned(_))));
    assert_eq!(tree.subgroups(a), &[inner]);
    assert!(tree.subgroups(b).is_empty());
}

#[test]
fn given_nested_group_when_registering_directly_then_already_owned() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let outer = tree.create_group(ArgumentGroup::new("outer").unwrap());
    let inner = tree.create_group(ArgumentGroup::new("inner").unwrap());
    tree.add_subgroup(outer, inner).unwrap();

    // Act
    let result = tree.register_group(inner, root);

    // Assert
    assert!(matches!(result, Err(DomainError::AlreadyOwned(_))));
}

#[test]
fn given_group_cycle_when_nesting_then_invalid_configuration() {
    // Arrange
    let mut tree = tree();
    let outer = tree.create_group(ArgumentGroup::new("outer").unwrap());
    let inner = tree.create_group(ArgumentGroup::new("inner").unwrap());
    tree.add_subgroup(outer, inner).unwrap();

    // Act
    let to_self = tree.add_subgroup(outer, outer);
    let cycle = tree.add_subgroup(inner, outer);

    // Assert
    assert!(matches!(to_self, Err(DomainError::InvalidConfiguration { .. })));
    assert!(matches!(cycle, Err(DomainError::InvalidConfiguration { .. })));
}

#[test]
fn given_name_taken_when_defining_argument_then_duplicate_name_and_nothing_stored() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    tree.define_argument(root, Argument::new(IntType::default(), ["number", "n"]).unwrap())
        .unwrap();

    // Act
    let result = tree.define_argument(root, Argument::flag(["n"]).unwrap());

    // Assert
    assert_eq!(
        result.err(),
        Some(DomainError::DuplicateName {
            name: "n".to_string(),
            owner: "command 'app'".to_string(),
        })
    );
    assert_eq!(tree.arguments_of(root).len(), 1);
}

#[test]
fn given_sibling_alias_clash_when_defining_subcommand_then_duplicate_name() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    tree.define_subcommand(root, Command::new("remove").unwrap().bind(["rm"]).unwrap())
        .unwrap();

    // Act
    let result = tree.define_subcommand(root, Command::new("rm").unwrap());

    // Assert
    assert!(matches!(result, Err(DomainError::DuplicateName { name, .. }) if name == "rm"));
    assert_eq!(tree.subcommands(root).len(), 1);
}

#[test]
fn given_same_name_in_different_commands_when_defining_then_allowed() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let child = tree.define_subcommand(root, Command::new("sub").unwrap()).unwrap();
    tree.define_argument(root, Argument::flag(["verbose"]).unwrap())
        .unwrap();

    // Act
    let result = tree.define_argument(child, Argument::flag(["verbose"]).unwrap());

    // Assert
    assert!(result.is_ok());
}

#[test]
fn given_group_member_clashing_with_command_when_registering_then_nothing_attached() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    tree.define_argument(root, Argument::flag(["fast"]).unwrap())
        .unwrap();
    let group = tree.create_group(ArgumentGroup::new("speed").unwrap());
    let slow = tree
        .add_group_argument(group, Argument::flag(["slow"]).unwrap())
        .unwrap();
    tree.add_group_argument(group, Argument::flag(["fast"]).unwrap())
        .unwrap();

    // Act
    let result = tree.register_group(group, root);

    // Assert
    assert!(matches!(result, Err(DomainError::DuplicateName { name, .. }) if name == "fast"));
    assert_eq!(tree.arguments_of(root).len(), 1);
    assert!(tree.groups_of(root).is_empty());
    assert_eq!(tree.argument_command(slow.id()), None);
}

#[test]
fn given_name_starting_with_prefix_when_attaching_then_invalid_name() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();

    // Act
    let result = tree.define_argument(root, Argument::flag(["-verbose"]).unwrap());

    // Assert
    assert!(matches!(result, Err(DomainError::InvalidName { .. })));
    assert!(tree.arguments_of(root).is_empty());
}

#[test]
fn given_flag_when_marking_positional_then_invalid_configuration() {
    // Act
    let result = Argument::flag(["verbose"]).unwrap().positional();

    // Assert
    assert!(matches!(result, Err(DomainError::InvalidConfiguration { .. })));
}

#[test]
fn given_registered_group_when_adding_member_later_then_member_attached() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let group = tree.define_group(root, ArgumentGroup::new("io").unwrap()).unwrap();
    let nested = tree.create_group(ArgumentGroup::new("nested").unwrap());
    let deep = tree
        .add_group_argument(nested, Argument::new(StringType::default(), ["output"]).unwrap())
        .unwrap();

    // Act
    let direct = tree
        .add_group_argument(group, Argument::new(StringType::default(), ["input"]).unwrap())
        .unwrap();
    tree.add_subgroup(group, nested).unwrap();

    // Assert
    assert_eq!(tree.argument_command(direct.id()), Some(root));
    assert_eq!(tree.argument_command(deep.id()), Some(root));
    assert_eq!(tree.find_argument(root, "output"), Some(deep.id()));
    let outcome = tree.parse(["--input", "a", "--output", "b"]);
    assert_eq!(outcome.get(&direct).map(String::as_str), Some("a"));
    assert_eq!(outcome.get(&deep).map(String::as_str), Some("b"));
}

#[test]
fn given_command_path_when_finding_then_resolves_aliases() {
    // Arrange
    let mut tree = tree();
    let root = tree.root();
    let remote = tree.define_subcommand(root, Command::new("remote").unwrap()).unwrap();
    let add = tree
        .define_subcommand(remote, Command::new("add").unwrap().bind(["a"]).unwrap())
        .unwrap();

    // Act
    let found = tree.find_command_path(&["remote", "a"][..]);
    let missing = tree.find_command_path(&["remote", "nope"][..]);

    // Assert
    assert_eq!(found, Some(add));
    assert_eq!(missing, None);
    assert_eq!(tree.parent_of(add), Some(remote));
}

#[test]
fn given_invalid_names_when_creating_then_rejected() {
    assert!(matches!(Command::new(" "), Err(DomainError::InvalidName { .. })));
    assert!(matches!(
        Argument::flag(["has space"]),
        Err(DomainError::InvalidName { .. })
    ));
    assert!(matches!(
        Argument::flag(["key=value"]),
        Err(DomainError::InvalidName { .. })
    ));
    assert!(matches!(
        Argument::flag(["dup", "dup"]),
        Err(DomainError::DuplicateName { .. })
    ));
    assert!(matches!(
        Command::new("app").unwrap().error_code(0),
        Err(DomainError::InvalidConfiguration { .. })
    ));
}
