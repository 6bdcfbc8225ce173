use chatargs_config::NamedStyle;

use super::compile::CompiledGrammar;

/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// A named flag (`-x`, `--name`, `name:`), possibly preceded by a
    /// backslash run of length `escapes`.
    Named {
        /// Which syntax matched.
        style: NamedStyle,
        /// Number of leading backslashes included in the token.
        escapes: usize,
    },
    /// A single quote tag, or a lone `-` / `:` outside flag position.
    Special,
    /// A run of characters that are not whitespace, special or backslash.
    Value,
    /// A run of backslashes.
    Backslashes,
}

/// A token that borrows its text directly from the source input.
///
/// `text` is always exactly `&input[start..end]`. Whitespace between tokens
/// is not tokenized; consumers recover it from the offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the source input for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl<'a> Token<'a> {
    /// The option name a named-flag token refers to.
    pub fn flag_name(&self) -> Option<&'a str> {
        let TokKind::Named { style, escapes } = self.kind else {
            return None;
        };
        let body = &self.text[escapes..];
        Some(match style {
            NamedStyle::DoubleDash => &body[2..],
            NamedStyle::SingleDash => &body[1..],
            NamedStyle::Colon => &body[..body.len() - 1],
        })
    }

    /// The first character of the token.
    pub fn first_char(&self) -> Option<char> {
        self.text.chars().next()
    }
}

/// Tokenize text with a compiled grammar.
///
/// Token classes are tried in priority order at each position: named flag,
/// special character, value run, backslash run. All special characters are
/// ASCII, so byte-level checks never split a multi-byte character.
pub fn tokenize<'a>(input: &'a str, grammar: &CompiledGrammar) -> Vec<Token<'a>> {
    let mut toks = Vec::new();
    let b = input.as_bytes();
    let mut i = 0usize;
    while i < b.len() {
        let Some(c) = input[i..].chars().next() else {
            break;
        };
        let start = i;
        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }
        if let Some((style, escapes, end)) = match_flag(b, i, grammar) {
            i = end;
            toks.push(Token {
                kind: TokKind::Named { style, escapes },
                text: &input[start..i],
                start,
                end: i,
            });
        } else if grammar.is_special(c) {
            i += 1;
            toks.push(Token {
                kind: TokKind::Special,
                text: &input[start..i],
                start,
                end: i,
            });
        } else if c == '\\' && grammar.backslash_escapes() {
            while i < b.len() && b[i] == b'\\' {
                i += 1;
            }
            toks.push(Token {
                kind: TokKind::Backslashes,
                text: &input[start..i],
                start,
                end: i,
            });
        } else {
            // Value run: stops on whitespace, special characters or backslash.
            for (off, ch) in input[start..].char_indices() {
                if ch.is_whitespace()
                    || grammar.is_special(ch)
                    || (ch == '\\' && grammar.backslash_escapes())
                {
                    break;
                }
                i = start + off + ch.len_utf8();
            }
            toks.push(Token {
                kind: TokKind::Value,
                text: &input[start..i],
                start,
                end: i,
            });
        }
    }
    toks
}

/// Try to match a named flag at byte offset `i`.
///
/// Returns the style, the length of the leading backslash run and the end
/// offset of the token.
fn match_flag(b: &[u8], i: usize, grammar: &CompiledGrammar) -> Option<(NamedStyle, usize, usize)> {
    let mut j = i;
    if grammar.backslash_escapes() {
        while j < b.len() && b[j] == b'\\' {
            j += 1;
        }
    }
    let escapes = j - i;
    let rest = &b[j..];

    if grammar.has_style(NamedStyle::DoubleDash)
        && rest.starts_with(b"--")
        && let Some(end) = ident_end(b, j + 2)
    {
        return Some((NamedStyle::DoubleDash, escapes, end));
    }
    if grammar.has_style(NamedStyle::SingleDash)
        && rest.first() == Some(&b'-')
        && rest.get(1) != Some(&b'-')
        && let Some(end) = ident_end(b, j + 1)
    {
        return Some((NamedStyle::SingleDash, escapes, end));
    }
    if grammar.has_style(NamedStyle::Colon)
        && let Some(end) = ident_end(b, j)
        && b.get(end) == Some(&b':')
        // `scheme://` is link text, not a flag.
        && !b[end + 1..].starts_with(b"//")
    {
        return Some((NamedStyle::Colon, escapes, end + 1));
    }
    None
}

/// End offset of an identifier starting at `start`.
fn ident_end(b: &[u8], start: usize) -> Option<usize> {
    let first = *b.get(start)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut k = start + 1;
    while k < b.len() && (b[k].is_ascii_alphanumeric() || b[k] == b'_' || b[k] == b'-') {
        k += 1;
    }
    Some(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatargs_config::{ParserConfig, QuoteTag, SyntaxConfig};

    fn grammar(styles: Vec<NamedStyle>) -> CompiledGrammar {
        CompiledGrammar::compile(&ParserConfig {
            syntax: SyntaxConfig {
                quote_tags: QuoteTag::ALL.to_vec(),
                named_flag_styles: styles,
            },
            ..Default::default()
        })
    }

    fn kinds(toks: &[Token<'_>]) -> Vec<(TokKind, String)> {
        toks.iter().map(|t| (t.kind, t.text.to_string())).collect()
    }

    #[test]
    fn plain_words() {
        let g = grammar(vec![]);
        let toks = tokenize("hello  wide world", &g);
        assert_eq!(toks.len(), 3);
        assert!(toks.iter().all(|t| t.kind == TokKind::Value));
        assert_eq!((toks[1].start, toks[1].end), (7, 11));
    }

    #[test]
    fn flags_quotes_and_backslashes() {
        let g = grammar(vec![NamedStyle::DoubleDash, NamedStyle::Colon]);
        let toks = tokenize(r#"--first "a b" \\--x name:v"#, &g);
        let double = TokKind::Named {
            style: NamedStyle::DoubleDash,
            escapes: 0,
        };
        assert_eq!(toks[0].kind, double);
        assert_eq!(toks[0].flag_name(), Some("first"));
        assert_eq!(toks[1].kind, TokKind::Special);
        assert_eq!(toks[2].text, "a");
        assert_eq!(toks[4].kind, TokKind::Special);
        assert_eq!(
            toks[5].kind,
            TokKind::Named {
                style: NamedStyle::DoubleDash,
                escapes: 2
            }
        );
        assert_eq!(toks[5].flag_name(), Some("x"));
        assert_eq!(toks[6].flag_name(), Some("name"));
        assert_eq!(toks[7].text, "v");
    }

    #[test]
    fn urls_are_not_colon_flags() {
        let g = grammar(vec![NamedStyle::Colon]);
        let toks = tokenize("https://example.com", &g);
        assert_eq!(
            kinds(&toks),
            vec![
                (TokKind::Value, "https".to_string()),
                (TokKind::Special, ":".to_string()),
                (TokKind::Value, "//example.com".to_string()),
            ]
        );
    }

    #[test]
    fn lone_hyphen_is_atomic() {
        let g = grammar(vec![NamedStyle::DoubleDash]);
        let toks = tokenize("- -5 -x", &g);
        assert_eq!(toks[0].kind, TokKind::Special);
        assert_eq!(toks[1].kind, TokKind::Special);
        assert_eq!(toks[2].text, "5");
        // Single-dash style is disabled, so `-x` is not a flag.
        assert_eq!(toks[3].kind, TokKind::Special);
        assert_eq!(toks[4].text, "x");
    }

    #[test]
    fn single_dash_style() {
        let g = grammar(vec![NamedStyle::SingleDash]);
        let toks = tokenize("-v --v", &g);
        assert_eq!(toks[0].flag_name(), Some("v"));
        assert_eq!(toks[1].kind, TokKind::Special);
    }

    #[test]
    fn backslashes_are_plain_without_special_syntax() {
        let g = CompiledGrammar::compile(&ParserConfig {
            syntax: SyntaxConfig {
                quote_tags: vec![],
                named_flag_styles: vec![],
            },
            ..Default::default()
        });
        let toks = tokenize(r#"a\b "c""#, &g);
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].text, r"a\b");
        assert_eq!(toks[1].text, r#""c""#);
    }

    #[test]
    fn multibyte_values() {
        let g = grammar(vec![NamedStyle::DoubleDash]);
        let toks = tokenize("héllo wörld\u{00a0}ok", &g);
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[1].text, "wörld");
        assert_eq!(toks[2].text, "ok");
    }
}
