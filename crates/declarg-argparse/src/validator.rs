//! Checks a parsed result against a command's declarations.
//!
//! Validation is fail-fast: arguments in declared order, then the unknown
//! flag policy, then flags in declared order. The first failure is returned.

use serde_json::Value;
use tracing::debug;

use declarg_metadata::FlagKind;

use crate::error::ValidationError;
use crate::parser::ParsedOutput;
use crate::registry::DefinitionRegistry;

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Render a flag the way a user would type it.
pub fn display_flag_name(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

pub fn validate(registry: &DefinitionRegistry, parsed: &ParsedOutput) -> Result<(), ValidationError> {
    validate_args(registry, parsed)?;
    validate_unknown_flags(registry, parsed)?;
    validate_flags(registry, parsed)
}

fn validate_args(registry: &DefinitionRegistry, parsed: &ParsedOutput) -> Result<(), ValidationError> {
    for (index, arg) in registry.args().iter().enumerate() {
        let Some(value) = parsed.arg(index) else {
            if arg.required {
                return Err(ValidationError::MissingArgument {
                    name: arg.name.clone(),
                });
            }
            continue;
        };

        if !arg.allow_empty_value && is_empty_value(value) {
            debug!(arg = %arg.name, %value, "disallowing empty value");
            return Err(ValidationError::MissingArgumentValue {
                name: arg.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_unknown_flags(
    registry: &DefinitionRegistry,
    parsed: &ParsedOutput,
) -> Result<(), ValidationError> {
    if registry.options().allow_unknown_flags {
        return Ok(());
    }
    match parsed.unknown_flags.first() {
        Some(name) => Err(ValidationError::UnknownFlag {
            name: display_flag_name(name),
        }),
        None => Ok(()),
    }
}

fn validate_flags(registry: &DefinitionRegistry, parsed: &ParsedOutput) -> Result<(), ValidationError> {
    for flag in registry.flags() {
        let name = flag.flag_name.as_str();
        let mentioned = parsed.has_flag(name);
        let value = parsed.flag(name);

        if flag.required && !mentioned {
            return Err(ValidationError::MissingFlag {
                name: name.to_string(),
            });
        }
        if !mentioned {
            continue;
        }

        match flag.kind {
            FlagKind::Boolean => {}
            FlagKind::Number => match value {
                None => {
                    return Err(ValidationError::MissingFlagValue {
                        name: name.to_string(),
                    });
                }
                Some(_) if parsed.invalid_flags.iter().any(|n| n == name) => {
                    return Err(ValidationError::InvalidFlag {
                        name: name.to_string(),
                        expected: FlagKind::Number,
                    });
                }
                Some(_) => {}
            },
            FlagKind::String | FlagKind::Array => {
                if flag.allow_empty_value {
                    continue;
                }
                if value.is_none_or(is_empty_value) {
                    debug!(flag = %flag.name, "disallowing empty value");
                    return Err(ValidationError::MissingFlagValue {
                        name: name.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}
