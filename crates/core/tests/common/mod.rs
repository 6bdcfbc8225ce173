//! Shared test helpers for `chatargs_core` integration tests.

#![allow(unreachable_pub)]

use chatargs_core::{
    ArgMap, ArgParser, ChoiceValue, CommandSchema, OptionKind, OptionSpec, ParserConfig,
};

// ─── Schemas ────────────────────────────────────────────────────────────────

/// Two required string options: `first`, `second`.
pub fn two_slots() -> CommandSchema {
    CommandSchema::new(
        "pair",
        vec![
            OptionSpec::new("first", OptionKind::String).required(),
            OptionSpec::new("second", OptionKind::String).required(),
        ],
    )
}

/// A string option followed by a boolean switch.
#[allow(dead_code)]
pub fn search() -> CommandSchema {
    CommandSchema::new(
        "search",
        vec![
            OptionSpec::new("query", OptionKind::String).required(),
            OptionSpec::new("verbose", OptionKind::Boolean),
        ],
    )
}

/// A user option followed by a free-text reason.
#[allow(dead_code)]
pub fn warn() -> CommandSchema {
    CommandSchema::new(
        "warn",
        vec![
            OptionSpec::new("target", OptionKind::User).required(),
            OptionSpec::new("reason", OptionKind::String),
        ],
    )
}

/// A single option with enumerated choices.
#[allow(dead_code)]
pub fn fruit() -> CommandSchema {
    CommandSchema::new(
        "fruit",
        vec![
            OptionSpec::new("kind", OptionKind::String)
                .required()
                .choice("Apple", ChoiceValue::Str("red".into()))
                .choice("Pear", ChoiceValue::Int(2)),
        ],
    )
}

// ─── Parsing helpers ────────────────────────────────────────────────────────

/// A parser whose global configuration is the default, adjusted by `f`.
pub fn parser_with(f: impl FnOnce(&mut ParserConfig)) -> ArgParser {
    let mut config = ParserConfig::default();
    f(&mut config);
    ArgParser::new(config)
}

/// Parse `text` against `schema` with the default configuration.
#[allow(dead_code)]
pub fn parse(schema: &CommandSchema, text: &str) -> ArgMap {
    ArgParser::default().parse_schema(schema, text, None)
}

/// Build an expected map from pairs.
pub fn args(pairs: &[(&str, &str)]) -> ArgMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
