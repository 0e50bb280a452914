//! Splitting an argument vector into positional tokens and raw flag values.
//!
//! The conventions are fixed; commands cannot change them:
//! - flag names keep their case
//! - repeated array flags accumulate, other repeated flags keep the last value
//! - `--no-x` sets boolean `x` to false
//! - positional tokens are never converted to numbers
//! - `--` stops flag parsing

use indexmap::{IndexMap, IndexSet};
use serde_json::{Number, Value};
use tracing::trace;

use crate::compiler::{FlagSlot, TokenizerConfig};

/// Output of a tokenizer run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tokens {
    pub positional: Vec<String>,
    /// `None` when the flag was mentioned without a usable value.
    pub flags: IndexMap<String, Option<Value>>,
    /// Number flags whose last value did not parse as a number.
    pub invalid: IndexSet<String>,
}

pub trait Tokenizer {
    fn tokenize(&self, argv: &[String], config: &TokenizerConfig) -> Tokens;
}

/// Default tokenizer for POSIX-ish argument vectors.
///
/// Supports `--name=value`, `--name value`, `-n value`, short groups (`-abc`)
/// and attached short values (`-n5`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgvTokenizer;

impl Tokenizer for ArgvTokenizer {
    fn tokenize(&self, argv: &[String], config: &TokenizerConfig) -> Tokens {
        let mut state = State {
            config,
            tokens: Tokens::default(),
        };

        let mut i = 0usize;
        let mut after_separator = false;
        while i < argv.len() {
            let arg = argv[i].as_str();
            let next = argv.get(i + 1).map(String::as_str);
            i += 1;

            if after_separator {
                state.tokens.positional.push(arg.to_string());
                continue;
            }

            if arg == "--" {
                after_separator = true;
                continue;
            }

            if !looks_like_flag(arg) {
                state.tokens.positional.push(arg.to_string());
                continue;
            }

            let consumed = match arg.strip_prefix("--") {
                Some(body) => match body.split_once('=') {
                    Some((key, value)) => {
                        state.assign(key, Some(value));
                        false
                    }
                    None => state.bare_long(body, next),
                },
                None => state.short_group(&arg[1..], next),
            };
            if consumed {
                i += 1;
            }
        }

        state.finish()
    }
}

struct State<'c> {
    config: &'c TokenizerConfig,
    tokens: Tokens,
}

impl State<'_> {
    /// `--name` without `=`. Returns whether `next` was consumed as its value.
    fn bare_long(&mut self, key: &str, next: Option<&str>) -> bool {
        let config = self.config;
        if config.slot(config.canonical(key)) == FlagSlot::Unknown {
            if let Some(negated) = key.strip_prefix("no-") {
                let target = config.canonical(negated);
                if matches!(config.slot(target), FlagSlot::Boolean | FlagSlot::Unknown) {
                    trace!(flag = target, "negated boolean flag");
                    self.set(target.to_string(), Some(Value::Bool(false)));
                    return false;
                }
            }
        }
        self.bare(key, next)
    }

    /// A flag mentioned without an attached value.
    fn bare(&mut self, key: &str, next: Option<&str>) -> bool {
        let slot = self.config.slot(self.config.canonical(key));
        match slot {
            FlagSlot::Boolean => match next {
                Some(v @ ("true" | "false")) => {
                    self.assign(key, Some(v));
                    true
                }
                _ => {
                    self.assign(key, None);
                    false
                }
            },
            FlagSlot::Count => {
                self.assign(key, None);
                false
            }
            _ => match next.filter(|n| !looks_like_flag(n)) {
                Some(value) => {
                    self.assign(key, Some(value));
                    true
                }
                None => {
                    self.assign(key, None);
                    false
                }
            },
        }
    }

    /// `-abc` style groups. Returns whether `next` was consumed.
    fn short_group(&mut self, body: &str, next: Option<&str>) -> bool {
        if let Some((letters, value)) = body.split_once('=') {
            let mut chars = letters.chars();
            let last = chars.next_back();
            for c in chars {
                self.assign(&c.to_string(), None);
            }
            if let Some(c) = last {
                self.assign(&c.to_string(), Some(value));
            }
            return false;
        }

        for (idx, c) in body.char_indices() {
            let key = c.to_string();
            let rest = &body[idx + c.len_utf8()..];
            if rest.is_empty() {
                return self.bare(&key, next);
            }

            match self.config.slot(self.config.canonical(&key)) {
                FlagSlot::String | FlagSlot::Number | FlagSlot::Array => {
                    self.assign(&key, Some(rest));
                    return false;
                }
                // `-n5`: a numeric tail is the value, not more letters.
                FlagSlot::Count | FlagSlot::Unknown if c.is_alphabetic() && looks_numeric(rest) => {
                    self.assign(&key, Some(rest));
                    return false;
                }
                _ => self.assign(&key, None),
            }
        }
        false
    }

    /// Store a raw value (or a bare mention) under the canonical name.
    fn assign(&mut self, key: &str, raw: Option<&str>) {
        let name = self.config.canonical(key).to_string();
        let slot = self.config.slot(&name);
        trace!(flag = %name, ?slot, raw, "flag value");

        match slot {
            FlagSlot::Boolean => {
                let value = raw.is_none_or(|v| v == "true");
                self.set(name, Some(Value::Bool(value)));
            }
            FlagSlot::String => {
                self.set(name, Some(Value::String(raw.unwrap_or_default().to_string())));
            }
            FlagSlot::Number => {
                let value = raw.filter(|v| !v.trim().is_empty()).map(|v| match parse_number(v) {
                    Some(n) => Value::Number(n),
                    None => {
                        self.tokens.invalid.insert(name.clone());
                        Value::String(v.to_string())
                    }
                });
                if !matches!(value, Some(Value::String(_))) {
                    self.tokens.invalid.shift_remove(&name);
                }
                self.set(name, value);
            }
            FlagSlot::Array => {
                let entry = self
                    .tokens
                    .flags
                    .entry(name)
                    .or_insert_with(|| Some(Value::Array(Vec::new())));
                if !matches!(entry, Some(Value::Array(_))) {
                    *entry = Some(Value::Array(Vec::new()));
                }
                if let (Some(Value::Array(items)), Some(v)) = (entry, raw) {
                    items.push(infer_scalar(v));
                }
            }
            FlagSlot::Count => {
                let explicit = raw.and_then(parse_number);
                let current = match self.tokens.flags.get(&name) {
                    Some(Some(Value::Number(n))) => n.as_i64().unwrap_or(0),
                    _ => 0,
                };
                let value = explicit.unwrap_or_else(|| Number::from(current + 1));
                self.set(name, Some(Value::Number(value)));
            }
            FlagSlot::Unknown => {
                let value = raw.map_or(Value::Bool(true), infer_scalar);
                self.set(name, Some(value));
            }
        }
    }

    fn set(&mut self, name: String, value: Option<Value>) {
        self.tokens.flags.insert(name, value);
    }

    /// Apply coercions to mentioned flags, then fill in defaults.
    fn finish(mut self) -> Tokens {
        let config = self.config;
        for (name, transform) in &config.coerce {
            if self.tokens.invalid.contains(name) {
                continue;
            }
            if let Some(Some(value)) = self.tokens.flags.get_mut(name) {
                *value = transform.apply(value.take());
            }
        }

        for (name, default) in &config.default {
            if !self.tokens.flags.contains_key(name) {
                self.tokens.flags.insert(name.clone(), Some(default.clone()));
            }
        }

        self.tokens
    }
}

/// Whether a token names a flag. `-=x`, `--=x` and negative numbers do not.
fn looks_like_flag(token: &str) -> bool {
    if token == "--" {
        return true;
    }
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'));
    match body {
        Some(body) => !body.is_empty() && !body.starts_with('=') && !looks_numeric(token),
        None => false,
    }
}

/// Decimal number syntax: `1`, `-2`, `1.5`, `.5`, `1e3`.
///
/// Leading zeros (`007`) are not numbers so identifiers survive untouched.
fn looks_numeric(token: &str) -> bool {
    let body = token.strip_prefix('-').unwrap_or(token);
    if body.is_empty() {
        return false;
    }
    if body.len() > 1 && body.starts_with('0') && !body.starts_with("0.") {
        return false;
    }

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => digits(int) && digits(frac) && !(int.is_empty() && frac.is_empty()),
        None => !mantissa.is_empty() && digits(mantissa),
    };
    let exponent_ok = exponent.is_none_or(|e| {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        !e.is_empty() && digits(e)
    });

    mantissa_ok && exponent_ok
}

fn parse_number(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Number::from(int));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

fn infer_scalar(raw: &str) -> Value {
    if looks_numeric(raw) {
        if let Some(n) = parse_number(raw) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

/// Split a command line string into arguments.
///
/// Whitespace separates arguments; single and double quotes group them and
/// are removed. An explicitly quoted empty string (`""`) is kept.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut started = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                started = true;
            }
            None if c.is_whitespace() => {
                if started {
                    out.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            None => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        out.push(current);
    }
    out
}
