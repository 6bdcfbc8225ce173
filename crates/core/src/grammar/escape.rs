//! Backslash-escape normalization rules.
//!
//! A run of `N` backslashes immediately before a boundary character (or the
//! end of the slice) collapses into `N / 2` literal backslashes. When `N` is
//! odd, the remaining backslash is consumed and the boundary character is
//! neutralized (it loses its special meaning). Runs that precede an ordinary
//! character are kept verbatim.
//!
//! Whitespace and end-of-input are boundaries in every context; each context
//! adds its own set of special characters.

use chatargs_config::{NamedFamily, QuoteTag, SyntaxConfig};

/// The outcome of collapsing one backslash run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunEffect {
    /// Number of literal backslashes the run contributes.
    pub literal: usize,
    /// Whether the character after the run is neutralized.
    pub escapes_next: bool,
}

/// A normalization rule for one quoting/naming context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeRule {
    boundaries: Vec<char>,
}

impl EscapeRule {
    /// Create a rule with the given special boundary characters.
    pub fn new(boundaries: impl IntoIterator<Item = char>) -> Self {
        let mut rule = Self {
            boundaries: Vec::new(),
        };
        for c in boundaries {
            if !rule.boundaries.contains(&c) {
                rule.boundaries.push(c);
            }
        }
        rule
    }

    /// Whether `c` is a boundary character under this rule.
    pub fn is_boundary(&self, c: char) -> bool {
        c.is_whitespace() || self.boundaries.contains(&c)
    }

    /// Stop treating `c` as a boundary.
    pub fn remove(&mut self, c: char) {
        self.boundaries.retain(|&b| b != c);
    }

    /// Collapse a run of `count` backslashes followed by `next` (`None` = end).
    pub fn collapse_run(&self, count: usize, next: Option<char>) -> RunEffect {
        match next {
            None => RunEffect {
                literal: count / 2,
                escapes_next: false,
            },
            Some(c) if self.is_boundary(c) => RunEffect {
                literal: count / 2,
                escapes_next: count % 2 == 1,
            },
            Some(_) => RunEffect {
                literal: count,
                escapes_next: false,
            },
        }
    }

    /// Apply the rule to a raw slice before it is stored.
    pub fn sanitize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            let mut count = 1;
            while chars.peek() == Some(&'\\') {
                chars.next();
                count += 1;
            }
            let run = self.collapse_run(count, chars.peek().copied());
            out.extend(std::iter::repeat_n('\\', run.literal));
        }
        out
    }
}

/// Selects a rule from [`EscapeTables`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeContext {
    /// Quoted spans, bare text and greedy captures.
    All,
    /// Backslash runs inside an open span of one quote tag.
    Tag(QuoteTag),
    /// Values of hyphen-style named flags.
    Named,
    /// Values of colon-style named flags.
    NamedDotted,
}

/// The family of escape rules for one effective configuration.
///
/// Compiled grammars hold a shared copy; the automaton clones it per call
/// before disabling a named family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeTables {
    all: EscapeRule,
    tags: Vec<(QuoteTag, EscapeRule)>,
    named: EscapeRule,
    named_dotted: EscapeRule,
}

impl EscapeTables {
    /// Build the rules for a syntax configuration.
    pub fn build(syntax: &SyntaxConfig) -> Self {
        let mut flag_chars = Vec::new();
        if syntax.has_family(NamedFamily::Hyphen) {
            flag_chars.push('-');
        }
        if syntax.has_family(NamedFamily::Colon) {
            flag_chars.push(':');
        }
        let quote_chars = syntax.quote_tags.iter().map(|t| t.as_char());

        let named_dotted = if syntax.has_family(NamedFamily::Colon) {
            EscapeRule::new(flag_chars.iter().copied().chain(['/']))
        } else {
            EscapeRule::new(flag_chars.iter().copied())
        };

        Self {
            all: EscapeRule::new(quote_chars.chain(flag_chars.iter().copied())),
            tags: syntax
                .quote_tags
                .iter()
                .map(|&t| (t, EscapeRule::new([t.as_char()])))
                .collect(),
            named: EscapeRule::new(flag_chars.iter().copied()),
            named_dotted,
        }
    }

    /// The rule for a context. Unknown quote tags fall back to the combined rule.
    pub fn rule(&self, ctx: EscapeContext) -> &EscapeRule {
        match ctx {
            EscapeContext::All => &self.all,
            EscapeContext::Tag(tag) => self
                .tags
                .iter()
                .find(|(t, _)| *t == tag)
                .map_or(&self.all, |(_, r)| r),
            EscapeContext::Named => &self.named,
            EscapeContext::NamedDotted => &self.named_dotted,
        }
    }

    /// Remove a named family's boundary characters from every rule.
    pub fn disable_family(&mut self, family: NamedFamily) {
        let c = family.boundary_char();
        self.all.remove(c);
        self.named.remove(c);
        self.named_dotted.remove(c);
        if family == NamedFamily::Colon {
            self.named_dotted.remove('/');
        }
    }
}
