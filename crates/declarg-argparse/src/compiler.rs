//! Turns a command's declarations into tokenizer configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use declarg_metadata::{ArgumentKind, FlagKind};

use crate::definition::Transform;
use crate::registry::DefinitionRegistry;

/// Host-supplied tokenizer tweaks for a single command.
///
/// Merged before the declared flags, so declarations always land in the
/// partition lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserOverrides {
    /// Extra names that never count as unknown.
    pub all: Vec<String>,
    pub string: Vec<String>,
    pub boolean: Vec<String>,
    pub number: Vec<String>,
    pub array: Vec<String>,
    /// Flags whose value is the number of occurrences (`-vvv` is 3).
    pub count: Vec<String>,
    pub alias: IndexMap<String, String>,
    pub default: IndexMap<String, Value>,
    #[serde(skip)]
    pub coerce: IndexMap<String, Transform>,
}

/// Configuration consumed by a `Tokenizer`.
#[derive(Debug, Clone, Default)]
pub struct TokenizerConfig {
    /// Every known flag name, used to detect unknown flags.
    pub all: Vec<String>,
    pub string: Vec<String>,
    pub boolean: Vec<String>,
    pub number: Vec<String>,
    pub array: Vec<String>,
    pub count: Vec<String>,
    /// Alias name to canonical flag name.
    pub alias: IndexMap<String, String>,
    /// Only flags with an explicit default.
    pub default: IndexMap<String, Value>,
    /// Only flags with a transform.
    pub coerce: IndexMap<String, Transform>,
}

/// How the tokenizer treats a flag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSlot {
    String,
    Boolean,
    Number,
    Array,
    Count,
    Unknown,
}

impl TokenizerConfig {
    /// Resolve an alias to its canonical flag name.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Slot for a canonical flag name.
    pub fn slot(&self, name: &str) -> FlagSlot {
        let has = |list: &[String]| list.iter().any(|n| n == name);
        if has(&self.array) {
            FlagSlot::Array
        } else if has(&self.count) {
            FlagSlot::Count
        } else if has(&self.boolean) {
            FlagSlot::Boolean
        } else if has(&self.number) {
            FlagSlot::Number
        } else if has(&self.string) {
            FlagSlot::String
        } else {
            FlagSlot::Unknown
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.all.iter().any(|n| n == name)
    }
}

/// Projection of an `Argument` used by the positional mapper.
#[derive(Debug, Clone)]
pub struct ArgumentSlot {
    pub kind: ArgumentKind,
    pub default: Option<Value>,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    pub flags: TokenizerConfig,
    /// One entry per declared argument, in declaration order.
    pub arguments: Vec<ArgumentSlot>,
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

pub fn compile(registry: &DefinitionRegistry, overrides: Option<&ParserOverrides>) -> ParserOptions {
    let arguments = registry
        .args()
        .iter()
        .map(|arg| ArgumentSlot {
            kind: arg.kind,
            default: arg.default.clone(),
            transform: arg.transform.clone(),
        })
        .collect();

    let mut flags = match overrides {
        Some(o) => TokenizerConfig {
            all: o.all.clone(),
            string: o.string.clone(),
            boolean: o.boolean.clone(),
            number: o.number.clone(),
            array: o.array.clone(),
            count: o.count.clone(),
            alias: o.alias.clone(),
            default: o.default.clone(),
            coerce: o.coerce.clone(),
        },
        None => TokenizerConfig::default(),
    };

    for flag in registry.flags() {
        let name = flag.flag_name.as_str();
        push_unique(&mut flags.all, name);

        for alias in &flag.alias {
            flags.alias.insert(alias.clone(), name.to_string());
        }
        if let Some(transform) = &flag.transform {
            flags.coerce.insert(name.to_string(), transform.clone());
        }
        if let Some(default) = &flag.default {
            flags.default.insert(name.to_string(), default.clone());
        }

        let partition = match flag.kind {
            FlagKind::String => &mut flags.string,
            FlagKind::Boolean => &mut flags.boolean,
            FlagKind::Number => &mut flags.number,
            FlagKind::Array => &mut flags.array,
        };
        push_unique(partition, name);
    }

    ParserOptions { flags, arguments }
}
