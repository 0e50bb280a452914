//! Shared metadata model for declarg commands.
//!
//! These types describe a command's declared arguments and flags without any
//! of the runtime pieces (value transforms, tokenizer state). They are what
//! help renderers and command listings consume, and they serialize to JSON so
//! a host can cache or ship them around.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional argument kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentKind {
    /// Consumes exactly one positional token.
    #[serde(rename = "string")]
    Plain,
    /// Consumes every remaining positional token.
    Spread,
}

/// Flag value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    String,
    Boolean,
    Number,
    Array,
}

impl FlagKind {
    /// Name of the expected value type, as used in error messages.
    pub fn expected(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "numeric",
            Self::Array => "array",
        }
    }
}

/// Command-level options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommandOptions {
    /// Accept flags that were never declared instead of failing validation.
    pub allow_unknown_flags: bool,
    /// Hint for the host: keep the process running after the command returns.
    pub stays_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentDescriptor {
    pub name: String,
    pub argument_name: String,
    pub kind: ArgumentKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub allow_empty_value: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagDescriptor {
    pub name: String,
    pub flag_name: String,
    pub kind: FlagKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub allow_empty_value: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Read-only description of a single command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandMetaData {
    pub command_name: String,
    /// Part of `command_name` before the `:` separator, if any.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagDescriptor>,
    #[serde(default)]
    pub options: CommandOptions,
}

impl CommandMetaData {
    /// Command name without its namespace prefix.
    pub fn bare_name(&self) -> &str {
        split_command_name(&self.command_name).1
    }

    /// Encode as JSON bytes.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Split `namespace:name` into its parts.
///
/// Only the first `:` separates the namespace; a name without a separator (or
/// with an empty name part) has no namespace.
pub fn split_command_name(command_name: &str) -> (Option<&str>, &str) {
    match command_name.split_once(':') {
        Some((namespace, name)) if !name.is_empty() => (Some(namespace), name),
        _ => (None, command_name),
    }
}
