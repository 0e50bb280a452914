//! Per-command definition storage.
//!
//! A `DefinitionRegistry` is filled once, during the definition phase, and
//! read afterwards. Derived commands start from a value copy of their base, so
//! extending a derived command never leaks back into the base.

use heck::ToKebabCase;
use indexmap::IndexMap;
use tracing::debug;

use declarg_metadata::{ArgumentKind, CommandMetaData, CommandOptions};

use crate::compiler::{self, ParserOptions, ParserOverrides};
use crate::definition::{Argument, ArgumentOptions, Flag, FlagOptions};
use crate::error::{DefinitionError, OrderingViolation, Result};
use crate::parser::{ParsedOutput, Parser};
use crate::{serialize, validator};

#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    identity: String,
    booted: bool,
    /// Snapshot of the base command, consumed by the first `boot()`.
    base: Option<Box<DefinitionRegistry>>,
    command_name: String,
    description: String,
    help: Vec<String>,
    aliases: Vec<String>,
    options: CommandOptions,
    args: Vec<Argument>,
    flags: Vec<Flag>,
}

impl DefinitionRegistry {
    /// Create an empty registry for the command identified by `identity`.
    ///
    /// `identity` is only used in error messages and logs; the user-facing
    /// name is set with `set_command_name`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Default::default()
        }
    }

    /// Create a registry that inherits everything `base` declares.
    pub fn extend(identity: impl Into<String>, base: &DefinitionRegistry) -> Self {
        Self {
            identity: identity.into(),
            base: Some(Box::new(base.clone())),
            ..Default::default()
        }
    }

    /// Initialize the registry, copying the base definitions if there are any.
    ///
    /// Only the first call has an effect.
    pub fn boot(&mut self) {
        if self.booted {
            return;
        }
        self.booted = true;

        if let Some(base) = self.base.take() {
            let source = base.view();
            self.command_name = source.command_name.clone();
            self.description = source.description.clone();
            self.help = source.help.clone();
            self.aliases = source.aliases.clone();
            self.options = source.options.clone();
            self.args = source.args.clone();
            self.flags = source.flags.clone();
        }
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    // Reads before `boot()` see the inherited definitions.
    fn view(&self) -> &DefinitionRegistry {
        match (&self.base, self.booted) {
            (Some(base), false) => base.view(),
            _ => self,
        }
    }

    /// Append a positional argument.
    pub fn define_argument(
        &mut self,
        name: impl Into<String>,
        options: ArgumentOptions,
    ) -> Result<(), DefinitionError> {
        self.boot();
        let name = name.into();

        let Some(kind) = options.kind else {
            return Err(DefinitionError::MissingType {
                command: self.identity.clone(),
                name,
                target: "argument",
            });
        };

        let arg = Argument {
            argument_name: options.argument_name.unwrap_or_else(|| name.to_kebab_case()),
            name,
            kind,
            required: options.required.unwrap_or(true),
            default: options.default,
            allow_empty_value: options.allow_empty_value,
            transform: options.transform,
            description: options.description,
        };

        if let Some(last) = self.args.last() {
            let violation = if last.kind == ArgumentKind::Spread {
                Some(OrderingViolation::AfterSpread {
                    previous: last.name.clone(),
                })
            } else if arg.required && !last.required {
                Some(OrderingViolation::RequiredAfterOptional {
                    previous: last.name.clone(),
                })
            } else {
                None
            };
            if let Some(violation) = violation {
                return Err(DefinitionError::InvalidOrdering {
                    command: self.identity.clone(),
                    argument: arg.name,
                    violation,
                });
            }
        }

        debug!(command = %self.identity, arg = ?arg, "defining arg");
        self.args.push(arg);
        Ok(())
    }

    /// Append a named flag.
    pub fn define_flag(
        &mut self,
        name: impl Into<String>,
        options: FlagOptions,
    ) -> Result<(), DefinitionError> {
        self.boot();
        let name = name.into();

        let Some(kind) = options.kind else {
            return Err(DefinitionError::MissingType {
                command: self.identity.clone(),
                name,
                target: "flag",
            });
        };

        let flag = Flag {
            flag_name: options.flag_name.unwrap_or_else(|| name.to_kebab_case()),
            name,
            kind,
            required: options.required.unwrap_or(false),
            default: options.default,
            allow_empty_value: options.allow_empty_value,
            alias: options.alias,
            transform: options.transform,
            description: options.description,
        };

        let taken = |name: &str| {
            self.flags
                .iter()
                .any(|f| f.flag_name == name || f.alias.iter().any(|a| a == name))
        };
        let clash = std::iter::once(&flag.flag_name)
            .chain(&flag.alias)
            .find(|name| taken(name));
        if let Some(name) = clash {
            return Err(DefinitionError::DuplicateFlag {
                command: self.identity.clone(),
                flag: name.clone(),
            });
        }

        debug!(command = %self.identity, flag = ?flag, "defining flag");
        self.flags.push(flag);
        Ok(())
    }

    pub fn set_command_name(&mut self, command_name: impl Into<String>) -> &mut Self {
        self.boot();
        self.command_name = command_name.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.boot();
        self.description = description.into();
        self
    }

    /// Replace the long-form help lines.
    pub fn set_help<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.boot();
        self.help = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.boot();
        let alias = alias.into();
        if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn set_options(&mut self, options: CommandOptions) -> &mut Self {
        self.boot();
        self.options = options;
        self
    }

    pub fn allow_unknown_flags(&mut self, allow: bool) -> &mut Self {
        self.boot();
        self.options.allow_unknown_flags = allow;
        self
    }

    pub fn stays_alive(&mut self, stays_alive: bool) -> &mut Self {
        self.boot();
        self.options.stays_alive = stays_alive;
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn command_name(&self) -> &str {
        &self.view().command_name
    }

    pub fn description(&self) -> &str {
        &self.view().description
    }

    pub fn help(&self) -> &[String] {
        &self.view().help
    }

    pub fn aliases(&self) -> &[String] {
        &self.view().aliases
    }

    pub fn options(&self) -> &CommandOptions {
        &self.view().options
    }

    pub fn args(&self) -> &[Argument] {
        &self.view().args
    }

    pub fn flags(&self) -> &[Flag] {
        &self.view().flags
    }

    /// Compile the tokenizer configuration and positional slots.
    pub fn parser_options(&self, overrides: Option<&ParserOverrides>) -> ParserOptions {
        compiler::compile(self, overrides)
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.parser_options(None))
    }

    /// Parse and validate `argv` in one step.
    pub fn parse<I, S>(&self, argv: I) -> Result<ParsedOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parsed = self.parser().parse(argv);
        self.validate(&parsed)?;
        Ok(parsed)
    }

    pub fn validate(&self, parsed: &ParsedOutput) -> Result<(), crate::ValidationError> {
        validator::validate(self, parsed)
    }

    pub fn serialize(&self) -> Result<CommandMetaData, DefinitionError> {
        serialize::serialize(self)
    }
}

/// Registries keyed by command identity.
///
/// Entries are created (and booted) on first access.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    entries: IndexMap<String, DefinitionRegistry>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry for `identity`, created empty on first access.
    pub fn command(&mut self, identity: &str) -> &mut DefinitionRegistry {
        let registry = self
            .entries
            .entry(identity.to_string())
            .or_insert_with(|| DefinitionRegistry::new(identity));
        registry.boot();
        registry
    }

    /// Create `identity` as an extension of `base`.
    ///
    /// `base` is created on demand. The new registry holds its own copy of
    /// the base definitions.
    pub fn derive(
        &mut self,
        identity: &str,
        base: &str,
    ) -> Result<&mut DefinitionRegistry, DefinitionError> {
        if self.entries.contains_key(identity) {
            return Err(DefinitionError::AlreadyDefined {
                command: identity.to_string(),
            });
        }

        let seeded = DefinitionRegistry::extend(identity, self.command(base));
        let registry = self.entries.entry(identity.to_string()).or_insert(seeded);
        registry.boot();
        Ok(registry)
    }

    pub fn get(&self, identity: &str) -> Option<&DefinitionRegistry> {
        self.entries.get(identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefinitionRegistry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Metadata for every registry that declares a command name.
    ///
    /// Unnamed registries are base commands that only exist to be extended.
    pub fn metadata(&self) -> Vec<CommandMetaData> {
        self.entries
            .values()
            .filter(|r| !r.command_name().is_empty())
            .filter_map(|r| r.serialize().ok())
            .collect()
    }
}
