//! Declarative argument and flag parsing for command-line commands.
//!
//! A command declares its positional arguments and flags once, on a
//! [`DefinitionRegistry`]. The registry compiles into [`ParserOptions`], which a
//! [`Parser`] uses to turn an argument vector into a [`ParsedOutput`]. The
//! output is then checked against the declarations by the validator.
//!
//! ```rust
//! use declarg_argparse::{ArgumentOptions, DefinitionRegistry, FlagOptions};
//! use serde_json::json;
//!
//! let mut make = DefinitionRegistry::new("MakeModel");
//! make.set_command_name("make:model");
//! make.define_argument("name", ArgumentOptions::string()).unwrap();
//! make.define_flag("dropAll", FlagOptions::boolean()).unwrap();
//!
//! let parsed = make.parse(["user", "--drop-all"]).unwrap();
//! assert_eq!(parsed.arg(0), Some(&json!("user")));
//! assert_eq!(parsed.flag("drop-all"), Some(&json!(true)));
//! ```
//!
//! Registries are filled during a definition phase and only read afterwards.
//! Parsing allocates fresh state per call, so a `Parser` can be shared across
//! threads.

pub mod compiler;
pub mod definition;
pub mod error;
pub mod parser;
pub mod registry;
pub mod serialize;
pub mod tokenizer;
pub mod validator;

pub use compiler::{ArgumentSlot, FlagSlot, ParserOptions, ParserOverrides, TokenizerConfig};
pub use definition::{
    Argument, ArgumentKind, ArgumentOptions, Flag, FlagKind, FlagOptions, Transform,
};
pub use error::{DefinitionError, Error, OrderingViolation, Result, ValidationError};
pub use parser::{ParsedOutput, Parser};
pub use registry::{DefinitionRegistry, Registries};
pub use tokenizer::{ArgvTokenizer, Tokenizer, Tokens, split_command_line};

pub use declarg_metadata::{CommandMetaData, CommandOptions};
