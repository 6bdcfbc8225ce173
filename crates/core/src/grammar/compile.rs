use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chatargs_config::{NamedFamily, NamedStyle, ParserConfig, QuoteTag};

use super::escape::EscapeTables;
use super::lexer::{Token, tokenize};

/// Token grammar and escape tables compiled from one effective configuration.
///
/// A pure function of the configuration; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGrammar {
    config: ParserConfig,
    quote_tags: Vec<QuoteTag>,
    hyphen: bool,
    colon: bool,
    backslash_escapes: bool,
    escapes: EscapeTables,
}

impl CompiledGrammar {
    /// Compile a configuration.
    pub fn compile(config: &ParserConfig) -> Self {
        let syntax = &config.syntax;
        tracing::debug!(
            quote_tags = ?syntax.quote_tags,
            named_styles = ?syntax.named_flag_styles,
            "compiling argument grammar"
        );
        Self {
            config: config.clone(),
            quote_tags: syntax.quote_tags.clone(),
            hyphen: syntax.has_family(NamedFamily::Hyphen),
            colon: syntax.has_family(NamedFamily::Colon),
            backslash_escapes: syntax.has_special_syntax(),
            escapes: EscapeTables::build(syntax),
        }
    }

    /// The effective configuration this grammar was compiled from.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The shared escape tables. Clone before patching.
    pub fn escapes(&self) -> &EscapeTables {
        &self.escapes
    }

    /// Whether backslash runs are tokenized separately.
    pub fn backslash_escapes(&self) -> bool {
        self.backslash_escapes
    }

    /// Whether a named style is enabled.
    pub fn has_style(&self, style: NamedStyle) -> bool {
        self.config.syntax.has_style(style)
    }

    /// The quote tag for `c`, if it is an active delimiter.
    pub fn quote_tag(&self, c: char) -> Option<QuoteTag> {
        QuoteTag::from_char(c).filter(|t| self.quote_tags.contains(t))
    }

    /// Whether `c` is a configured special character.
    pub fn is_special(&self, c: char) -> bool {
        match c {
            '-' => self.hyphen,
            ':' => self.colon,
            _ => self.quote_tag(c).is_some(),
        }
    }

    /// Tokenize text with this grammar.
    pub fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        tokenize(input, self)
    }
}

/// Compiled grammars shared between commands with equal effective configurations.
///
/// Each entry is written once and never replaced until [`GrammarCache::clear`].
#[derive(Debug, Default)]
pub struct GrammarCache {
    entries: RwLock<HashMap<ParserConfig, Arc<CompiledGrammar>>>,
}

impl GrammarCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled grammar for `config`, compiling it on first use.
    pub fn get_or_compile(&self, config: &ParserConfig) -> Arc<CompiledGrammar> {
        if let Some(g) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config)
        {
            return Arc::clone(g);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            entries
                .entry(config.clone())
                .or_insert_with(|| Arc::new(CompiledGrammar::compile(config))),
        )
    }

    /// Number of distinct compiled configurations.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every compiled grammar.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
