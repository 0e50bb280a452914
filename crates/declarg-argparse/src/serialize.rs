use declarg_metadata::{
    ArgumentDescriptor, CommandMetaData, FlagDescriptor, split_command_name,
};

use crate::definition::{Argument, Flag};
use crate::error::DefinitionError;
use crate::registry::DefinitionRegistry;

fn describe_argument(arg: &Argument) -> ArgumentDescriptor {
    ArgumentDescriptor {
        name: arg.name.clone(),
        argument_name: arg.argument_name.clone(),
        kind: arg.kind,
        required: arg.required,
        default: arg.default.clone(),
        allow_empty_value: arg.allow_empty_value,
        description: arg.description.clone(),
    }
}

fn describe_flag(flag: &Flag) -> FlagDescriptor {
    FlagDescriptor {
        name: flag.name.clone(),
        flag_name: flag.flag_name.clone(),
        kind: flag.kind,
        required: flag.required,
        default: flag.default.clone(),
        allow_empty_value: flag.allow_empty_value,
        alias: flag.alias.clone(),
        description: flag.description.clone(),
    }
}

/// Describe a command for help and listing consumers.
///
/// Transforms are dropped; they have no external representation.
pub fn serialize(registry: &DefinitionRegistry) -> Result<CommandMetaData, DefinitionError> {
    let command_name = registry.command_name();
    if command_name.is_empty() {
        return Err(DefinitionError::MissingCommandName {
            command: registry.identity().to_string(),
        });
    }

    let (namespace, _) = split_command_name(command_name);
    Ok(CommandMetaData {
        command_name: command_name.to_string(),
        namespace: namespace.map(str::to_string),
        description: registry.description().to_string(),
        help: registry.help().to_vec(),
        aliases: registry.aliases().to_vec(),
        args: registry.args().iter().map(describe_argument).collect(),
        flags: registry.flags().iter().map(describe_flag).collect(),
        options: registry.options().clone(),
    })
}
