//! Mapping tokens onto declared argument slots.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use declarg_metadata::ArgumentKind;

use crate::compiler::{ArgumentSlot, ParserOptions};
use crate::tokenizer::{ArgvTokenizer, Tokenizer, split_command_line};

/// Result of parsing one argument vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParsedOutput {
    /// One entry per declared argument; `None` is an undefined value.
    pub args: Vec<Option<Value>>,
    /// `None` is a flag mentioned without a value.
    pub flags: IndexMap<String, Option<Value>>,
    pub unknown_flags: Vec<String>,
    /// Number flags given input that is not a number.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_flags: Vec<String>,
    /// Positional tokens left after every argument slot was filled.
    pub rest: Vec<String>,
}

impl ParsedOutput {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index).and_then(Option::as_ref)
    }

    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name).and_then(Option::as_ref)
    }

    /// Whether the flag was mentioned (or has a default).
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }
}

/// Map positional tokens onto argument slots.
///
/// Returns the slot values and the tokens no slot consumed.
pub fn map_arguments(
    positional: &[String],
    slots: &[ArgumentSlot],
) -> (Vec<Option<Value>>, Vec<String>) {
    let mut boundary = 0usize;
    let mut args = Vec::with_capacity(slots.len());

    for (index, slot) in slots.iter().enumerate() {
        let value = match slot.kind {
            ArgumentKind::Spread => {
                boundary = positional.len();
                let tail = positional.get(index..).unwrap_or_default();
                if tail.is_empty() {
                    match &slot.default {
                        Some(Value::Array(items)) => Some(Value::Array(items.clone())),
                        Some(other) => Some(Value::Array(vec![other.clone()])),
                        None => None,
                    }
                } else {
                    Some(Value::Array(tail.iter().cloned().map(Value::String).collect()))
                }
            }
            ArgumentKind::Plain => {
                boundary = index + 1;
                // An explicit empty string is a real value, not a reason to
                // fall back to the default.
                positional
                    .get(index)
                    .cloned()
                    .map(Value::String)
                    .or_else(|| slot.default.clone())
            }
        };

        let value = match (value, &slot.transform) {
            (Some(value), Some(transform)) => Some(transform.apply(value)),
            (value, _) => value,
        };
        args.push(value);
    }

    let rest = positional
        .get(boundary..)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    (args, rest)
}

/// Tokenizes input and maps it onto a command's declarations.
///
/// Parsing never validates; see `validator::validate`.
#[derive(Debug, Clone)]
pub struct Parser<T = ArgvTokenizer> {
    options: ParserOptions,
    tokenizer: T,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self::with_tokenizer(options, ArgvTokenizer)
    }
}

impl<T: Tokenizer> Parser<T> {
    pub fn with_tokenizer(options: ParserOptions, tokenizer: T) -> Self {
        Self { options, tokenizer }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn parse<I, S>(&self, argv: I) -> ParsedOutput
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let tokens = self.tokenizer.tokenize(&argv, &self.options.flags);
        let (args, rest) = map_arguments(&tokens.positional, &self.options.arguments);

        let unknown_flags = tokens
            .flags
            .keys()
            .filter(|name| !self.options.flags.is_known(name))
            .cloned()
            .collect();

        ParsedOutput {
            args,
            flags: tokens.flags,
            unknown_flags,
            invalid_flags: tokens.invalid.into_iter().collect(),
            rest,
        }
    }

    /// Parse a single command line string (`"--drop-all user"`).
    pub fn parse_str(&self, line: &str) -> ParsedOutput {
        self.parse(split_command_line(line))
    }
}
