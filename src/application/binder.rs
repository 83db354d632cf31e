//! Walks a [`Schema`] and builds a [`CommandTree`] through the domain builders.
//!
//! The binder only calls `define_subcommand`, `define_argument`,
//! `create_group`, `add_group_argument`, `add_subgroup` and `register_group`;
//! it never touches tree internals.

use tracing::{debug, instrument};

use crate::application::schema::{ArgumentKind, ArgumentSchema, CommandSchema, ElementKind, GroupSchema, Schema};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    ArgId, Argument, ArgumentGroup, ArgumentType, BoolType, ChoiceType, Command, CommandId,
    CommandTree, ErrorLevelConfig, FloatType, GroupId, IntRangeType, IntType, MultipleType,
    StdinType, StringType, ValueCount,
};

/// An argument declared by the schema, addressable by its dotted path
/// (`cmd1.cmd1-1.number2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundArgument {
    pub path: String,
    pub id: ArgId,
    pub command: CommandId,
}

pub struct BoundSchema {
    pub tree: CommandTree,
    /// Declaration order, depth first.
    pub arguments: Vec<BoundArgument>,
}

impl BoundSchema {
    pub fn find(&self, path: &str) -> Option<&BoundArgument> {
        self.arguments.iter().find(|a| a.path == path)
    }
}

/// Where a new argument goes.
#[derive(Debug, Clone, Copy)]
enum Target {
    Command(CommandId),
    Group(GroupId),
}

/// Build a command tree from `schema`.
#[instrument(level = "debug", skip(schema))]
pub fn bind_schema(schema: &Schema) -> ApplicationResult<BoundSchema> {
    let root = build_command(&schema.command, "<root>")?;
    let path = root.display_name().to_string();
    let mut binder = SchemaBinder {
        tree: CommandTree::new(root),
        bound: Vec::new(),
    };
    let root_id = binder.tree.root();
    binder.bind_command(root_id, &schema.command, &path)?;
    debug!("bound {} arguments", binder.bound.len());

    Ok(BoundSchema {
        tree: binder.tree,
        arguments: binder.bound,
    })
}

fn build_command(schema: &CommandSchema, location: &str) -> ApplicationResult<Command> {
    let (first, rest) = schema
        .names
        .split_first()
        .ok_or_else(|| ApplicationError::schema(location, "command needs at least one name"))?;
    let mut command = Command::new(first)?.bind(rest)?;
    if let Some(description) = &schema.description {
        command = command.description(description.clone());
    }
    if let Some(code) = schema.error_code {
        command = command.error_code(code)?;
    }
    if let Some(level) = schema.display_level {
        command.set_minimum_display_level(level);
    }
    if let Some(level) = schema.exit_level {
        command.set_minimum_exit_level(level);
    }
    Ok(command)
}

struct SchemaBinder {
    tree: CommandTree,
    bound: Vec<BoundArgument>,
}

impl SchemaBinder {
    fn bind_command(&mut self, id: CommandId, schema: &CommandSchema, path: &str) -> ApplicationResult<()> {
        for argument in &schema.arguments {
            self.bind_argument(id, Target::Command(id), argument, path)?;
        }

        for group in &schema.groups {
            let group_id = self.build_group(id, group, path)?;
            self.tree.register_group(group_id, id)?;
        }

        for sub in &schema.subcommands {
            let location = format!("{}.<subcommand>", path);
            let command = build_command(sub, &location)?;
            let sub_path = format!("{}.{}", path, command.display_name());
            let sub_id = self.tree.define_subcommand(id, command)?;
            self.bind_command(sub_id, sub, &sub_path)?;
        }
        Ok(())
    }

    /// Build `schema` as a free-standing group; the caller registers or
    /// nests it.
    fn build_group(&mut self, command: CommandId, schema: &GroupSchema, path: &str) -> ApplicationResult<GroupId> {
        let mut group = ArgumentGroup::new(&schema.name)?;
        if let Some(description) = &schema.description {
            group = group.description(description.clone());
        }
        if schema.exclusive {
            group = group.exclusive();
        }
        let id = self.tree.create_group(group);

        for argument in &schema.arguments {
            self.bind_argument(command, Target::Group(id), argument, path)?;
        }
        for sub in &schema.groups {
            let sub_id = self.build_group(command, sub, path)?;
            self.tree.add_subgroup(id, sub_id)?;
        }
        Ok(id)
    }

    fn bind_argument(
        &mut self,
        command: CommandId,
        target: Target,
        schema: &ArgumentSchema,
        path: &str,
    ) -> ApplicationResult<()> {
        let name = schema.names.first().cloned().unwrap_or_default();
        let location = format!("{}.{}", path, name);

        let id = match schema.kind {
            ArgumentKind::Bool => {
                let default = default_as(schema, &location, |v| v.as_bool())?;
                self.attach(target, BoolType, schema, default)?
            }
            ArgumentKind::Int => {
                let default = default_as(schema, &location, |v| v.as_integer())?;
                self.attach(target, IntType::default(), schema, default)?
            }
            ArgumentKind::Float => {
                let default = default_as(schema, &location, as_float)?;
                self.attach(target, FloatType::default(), schema, default)?
            }
            ArgumentKind::String => {
                let default = default_as(schema, &location, as_string)?;
                self.attach(target, StringType::default(), schema, default)?
            }
            ArgumentKind::IntRange => {
                let (Some(min), Some(max)) = (schema.min, schema.max) else {
                    return Err(ApplicationError::schema(location, "int-range needs min and max"));
                };
                let default = default_as(schema, &location, |v| v.as_integer())?;
                self.attach(target, IntRangeType::new(min, max), schema, default)?
            }
            ArgumentKind::Choice => {
                if schema.choices.is_empty() {
                    return Err(ApplicationError::schema(location, "choice needs at least one choice"));
                }
                let mut choice = ChoiceType::new(schema.choices.iter().cloned());
                if schema.case_insensitive {
                    choice = choice.case_insensitive();
                }
                let default = default_as(schema, &location, as_string)?;
                self.attach(target, choice, schema, default)?
            }
            ArgumentKind::Multiple => {
                let count = value_count(schema, &location)?;
                match schema.of.unwrap_or_default() {
                    ElementKind::Int => {
                        let default = default_list(schema, &location, |v| v.as_integer())?;
                        self.attach(target, MultipleType::<i64>::new("int", count), schema, default)?
                    }
                    ElementKind::Float => {
                        let default = default_list(schema, &location, as_float)?;
                        self.attach(target, MultipleType::<f64>::new("float", count), schema, default)?
                    }
                    ElementKind::String => {
                        let default = default_list(schema, &location, as_string)?;
                        self.attach(target, MultipleType::<String>::new("string", count), schema, default)?
                    }
                }
            }
            ArgumentKind::Stdin => {
                let default = default_as(schema, &location, as_string)?;
                self.attach(target, StdinType::new(), schema, default)?
            }
        };

        self.bound.push(BoundArgument {
            path: location,
            id,
            command,
        });
        Ok(())
    }

    fn attach<A>(
        &mut self,
        target: Target,
        arg_type: A,
        schema: &ArgumentSchema,
        default: Option<A::Value>,
    ) -> ApplicationResult<ArgId>
    where
        A: ArgumentType + 'static,
    {
        let mut argument = Argument::new(arg_type, &schema.names)?;
        if schema.obligatory {
            argument = argument.obligatory();
        }
        if schema.positional {
            argument = argument.positional()?;
        }
        if schema.allow_unique {
            argument = argument.allow_unique();
        }
        if let Some(prefix) = schema.prefix {
            argument = argument.prefix(prefix);
        }
        if let Some(default) = default {
            argument = argument.default_value(default);
        }
        if let Some(description) = &schema.description {
            argument = argument.description(description.clone());
        }
        if let Some(level) = schema.display_level {
            argument.set_minimum_display_level(level);
        }
        if let Some(level) = schema.exit_level {
            argument.set_minimum_exit_level(level);
        }

        let handle = match target {
            Target::Command(command) => self.tree.define_argument(command, argument)?,
            Target::Group(group) => self.tree.add_group_argument(group, argument)?,
        };
        Ok(handle.id())
    }
}

fn as_float(value: &toml::Value) -> Option<f64> {
    value
        .as_float()
        .or_else(|| value.as_integer().map(|i| i as f64))
}

fn as_string(value: &toml::Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn default_as<T>(
    schema: &ArgumentSchema,
    location: &str,
    convert: impl Fn(&toml::Value) -> Option<T>,
) -> ApplicationResult<Option<T>> {
    match &schema.default {
        None => Ok(None),
        Some(value) => convert(value).map(Some).ok_or_else(|| {
            ApplicationError::schema(
                location,
                format!("default {} does not match type {:?}", value, schema.kind),
            )
        }),
    }
}

fn default_list<T>(
    schema: &ArgumentSchema,
    location: &str,
    convert: impl Fn(&toml::Value) -> Option<T>,
) -> ApplicationResult<Option<Vec<T>>> {
    default_as(schema, location, |value| {
        value
            .as_array()?
            .iter()
            .map(&convert)
            .collect::<Option<Vec<T>>>()
    })
}

fn value_count(schema: &ArgumentSchema, location: &str) -> ApplicationResult<ValueCount> {
    let to_usize = |v: i64| {
        usize::try_from(v)
            .map_err(|_| ApplicationError::schema(location, format!("value count {} is negative", v)))
    };
    let min = to_usize(schema.min.unwrap_or(1))?;
    match schema.max {
        Some(max) => Ok(ValueCount::range(min, to_usize(max)?)),
        None => Ok(ValueCount::at_least(min)),
    }
}
