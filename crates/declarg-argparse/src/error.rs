use std::fmt;

use thiserror::Error;

use declarg_metadata::FlagKind;

/// Why an argument could not be appended to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingViolation {
    /// The previous argument is a spread argument.
    AfterSpread { previous: String },
    /// The new argument is required but the previous one is optional.
    RequiredAfterOptional { previous: String },
}

impl fmt::Display for OrderingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterSpread { previous } => write!(
                f,
                "cannot be defined after spread argument \"{previous}\"; spread argument should be the last one"
            ),
            Self::RequiredAfterOptional { previous } => write!(
                f,
                "required argument cannot be defined after optional argument \"{previous}\""
            ),
        }
    }
}

/// Programmer errors raised while declaring or describing a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("cannot define argument \"{command}.{argument}\": {violation}")]
    InvalidOrdering {
        command: String,
        argument: String,
        violation: OrderingViolation,
    },

    #[error("cannot define \"{command}.{name}\": specify the type of the {target}")]
    MissingType {
        command: String,
        name: String,
        target: &'static str,
    },

    #[error("cannot define flag \"{command}.{flag}\": a flag or alias with the same name already exists")]
    DuplicateFlag { command: String, flag: String },

    #[error("cannot serialize command \"{command}\": missing command name")]
    MissingCommandName { command: String },

    #[error("command \"{command}\" is already defined")]
    AlreadyDefined { command: String },
}

impl DefinitionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOrdering { .. } => "E_INVALID_ARGUMENT_ORDER",
            Self::MissingType { .. } => "E_MISSING_TYPE",
            Self::DuplicateFlag { .. } => "E_DUPLICATE_FLAG",
            Self::MissingCommandName { .. } => "E_MISSING_COMMAND_NAME",
            Self::AlreadyDefined { .. } => "E_COMMAND_ALREADY_DEFINED",
        }
    }
}

/// User input that does not satisfy a command's declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required argument \"{name}\"")]
    MissingArgument { name: String },

    #[error("missing value for argument \"{name}\"")]
    MissingArgumentValue { name: String },

    #[error("missing required option \"{name}\"")]
    MissingFlag { name: String },

    #[error("missing value for option \"{name}\"")]
    MissingFlagValue { name: String },

    #[error("invalid value: the \"{name}\" flag accepts a \"{}\" value", .expected.expected())]
    InvalidFlag { name: String, expected: FlagKind },

    /// `name` is already rendered with its dash prefix (`-v`, `--verbose`).
    #[error("unknown flag \"{name}\": the mentioned flag is not accepted by the command")]
    UnknownFlag { name: String },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } => "E_MISSING_ARG",
            Self::MissingArgumentValue { .. } => "E_MISSING_ARG_VALUE",
            Self::MissingFlag { .. } => "E_MISSING_FLAG",
            Self::MissingFlagValue { .. } => "E_MISSING_FLAG_VALUE",
            Self::InvalidFlag { .. } => "E_INVALID_FLAG",
            Self::UnknownFlag { .. } => "E_UNKNOWN_FLAG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Definition(err) => err.code(),
            Self::Validation(err) => err.code(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
