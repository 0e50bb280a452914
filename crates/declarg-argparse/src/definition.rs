//! Argument and flag declarations.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use declarg_metadata::{ArgumentKind, FlagKind};

/// A pure `value -> value` function attached to an argument or flag.
///
/// Cloning shares the underlying function, so copying a registry into a
/// derived command is cheap.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// One positional slot.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: String,
    /// Dash-cased display name.
    pub argument_name: String,
    pub kind: ArgumentKind,
    pub required: bool,
    pub default: Option<Value>,
    pub allow_empty_value: bool,
    pub transform: Option<Transform>,
    pub description: String,
}

/// One named option.
#[derive(Debug, Clone)]
pub struct Flag {
    pub name: String,
    /// Dash-cased name used on the command line.
    pub flag_name: String,
    pub kind: FlagKind,
    pub required: bool,
    pub default: Option<Value>,
    pub allow_empty_value: bool,
    pub alias: Vec<String>,
    pub transform: Option<Transform>,
    pub description: String,
}

/// Options accepted by `DefinitionRegistry::define_argument`.
///
/// Leaving the kind unset makes the definition fail with `MissingType`.
#[derive(Debug, Clone, Default)]
pub struct ArgumentOptions {
    pub(crate) kind: Option<ArgumentKind>,
    pub(crate) argument_name: Option<String>,
    pub(crate) required: Option<bool>,
    pub(crate) default: Option<Value>,
    pub(crate) allow_empty_value: bool,
    pub(crate) transform: Option<Transform>,
    pub(crate) description: String,
}

impl ArgumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain argument consuming a single token.
    pub fn string() -> Self {
        Self::new().kind(ArgumentKind::Plain)
    }

    /// A spread argument consuming every remaining token.
    pub fn spread() -> Self {
        Self::new().kind(ArgumentKind::Spread)
    }

    pub fn kind(mut self, kind: ArgumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Override the dash-cased display name.
    pub fn argument_name(mut self, argument_name: impl Into<String>) -> Self {
        self.argument_name = Some(argument_name.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allow_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Options accepted by `DefinitionRegistry::define_flag`.
#[derive(Debug, Clone, Default)]
pub struct FlagOptions {
    pub(crate) kind: Option<FlagKind>,
    pub(crate) flag_name: Option<String>,
    pub(crate) required: Option<bool>,
    pub(crate) default: Option<Value>,
    pub(crate) allow_empty_value: bool,
    pub(crate) alias: Vec<String>,
    pub(crate) transform: Option<Transform>,
    pub(crate) description: String,
}

impl FlagOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string() -> Self {
        Self::new().kind(FlagKind::String)
    }

    pub fn boolean() -> Self {
        Self::new().kind(FlagKind::Boolean)
    }

    pub fn number() -> Self {
        Self::new().kind(FlagKind::Number)
    }

    pub fn array() -> Self {
        Self::new().kind(FlagKind::Array)
    }

    pub fn kind(mut self, kind: FlagKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Override the dash-cased command line name.
    pub fn flag_name(mut self, flag_name: impl Into<String>) -> Self {
        self.flag_name = Some(flag_name.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allow_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }

    /// Add an alternative name (`-d` for `--drop-all` is `alias("d")`).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        if !self.alias.contains(&alias) {
            self.alias.push(alias);
        }
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transform_applies_wrapped_function() {
        let upper = Transform::new(|v| match v {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        });
        assert_eq!(upper.apply(json!("post")), json!("POST"));
        assert_eq!(upper.clone().apply(json!(1)), json!(1));
        assert_eq!(format!("{upper:?}"), "Transform(..)");
    }

    #[test]
    fn flag_aliases_are_deduplicated() {
        let opts = FlagOptions::boolean().alias("d").alias("d").alias("D");
        assert_eq!(opts.alias, vec!["d".to_string(), "D".to_string()]);
        assert_eq!(opts.kind, Some(FlagKind::Boolean));
    }
}
