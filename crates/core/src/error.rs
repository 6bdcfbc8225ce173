//! Caller precondition failures.
//!
//! Malformed text never produces an error; these cover misuse of the
//! registry and bad schema documents only.

use crate::registry::CommandId;

/// Errors returned by [`ArgParser`](crate::ArgParser) lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No command is registered under the given id.
    #[error("unknown command id {0}")]
    UnknownCommand(CommandId),

    /// No command is registered under the given name.
    #[error("unknown command: {0}")]
    UnknownCommandName(String),

    /// The command declares no options that can be written as text.
    #[error("command '{command}' has no text-representable options")]
    NoTextualSlots {
        /// The command's name.
        command: String,
    },
}

/// Errors from loading command schemas.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// JSON deserialization failed.
    #[error("invalid schema JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A command has a blank name.
    #[error("command name must not be empty")]
    EmptyName,

    /// Two options of one command share a name.
    #[error("command '{command}' declares option '{option}' more than once")]
    DuplicateOption {
        /// The command's name.
        command: String,
        /// The repeated option name.
        option: String,
    },
}
