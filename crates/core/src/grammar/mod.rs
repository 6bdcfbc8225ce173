/// Configuration compiler: token grammar, escape tables and the grammar cache.
pub mod compile;
/// Backslash-escape normalization rules.
pub mod escape;
/// Tokenizer: splits raw text into classified, offset-tagged tokens.
pub mod lexer;
/// Single-pass argument-assignment automaton.
pub mod parser;
