//! chatargs core library.
//!
//! Maps free-form chat text onto the ordered options of a slash-style
//! command. Register schemas with an [`ArgParser`] and call
//! [`ArgParser::parse`]; the result is a map from option name to raw string
//! value. Parsing never fails on malformed text.

#![warn(missing_docs)]

/// Choice-alias resolution applied after assignment.
pub mod choices;
/// Registry and schema errors.
pub mod error;
/// Grammar compilation, tokenizer and the assignment automaton.
pub mod grammar;
/// Per-command slot tables.
pub mod metadata;
/// Command registration and parse entry points.
pub mod registry;
/// Command schema types.
pub mod schema;

// ─── Convenience re-exports ─────────────────────────────────────────────────

// Entry point
pub use registry::{ArgParser, CommandId};

// Errors
pub use error::{ParseError, SchemaError};

// Schema
pub use schema::{
    Choice, ChoiceValue, CommandSchema, OptionKind, OptionSpec, ReferencedMessage,
    load_schemas_from_str,
};

// Grammar
pub use grammar::compile::{CompiledGrammar, GrammarCache};
pub use grammar::lexer::{TokKind, Token, tokenize};
pub use grammar::parser::{ArgMap, assign_args};

// Metadata
pub use metadata::CommandParseMetadata;

// Configuration (re-exported from the config crate)
pub use chatargs_config::{
    ConfigError, ParserConfig, PartialParserConfig, load_config_from_str,
    load_partial_config_from_str,
};
