use std::collections::BTreeMap;

use chatargs_config::{BehaviorConfig, NamedFamily, NamedStyle, QuoteTag};

use super::{
    compile::CompiledGrammar,
    escape::{EscapeContext, EscapeTables},
    lexer::{TokKind, Token},
};
use crate::metadata::{CommandParseMetadata, OptionSlot};
use crate::schema::{OptionKind, ReferencedMessage};

/// Parsed arguments: slot name → raw string value.
pub type ArgMap = BTreeMap<String, String>;

// ─── Automaton State ────────────────────────────────────────────────────────

/// At most one of quote, named value or greedy capture is open at a time.
#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Between tokens; bare text goes through the attachment rule.
    Idle,
    /// Inside a quoted span.
    Quoted {
        tag: QuoteTag,
        /// Byte offset just after the opening quote.
        content_start: usize,
        target: QuoteTarget,
    },
    /// Collecting the value of a named flag.
    Named {
        slot: usize,
        /// Byte offset just after the flag token.
        value_start: usize,
        /// Colon-style flag.
        dotted: bool,
    },
    /// The final slot absorbs the raw remainder from `anchor`.
    Greedy { slot: usize, anchor: usize },
}

/// Where a quoted span's content goes once the span closes.
#[derive(Debug, Clone, Copy)]
enum QuoteTarget {
    /// The slot at the cursor (after any buffered right-context).
    Positional,
    /// The value of a named flag.
    Named(usize),
}

/// Where the most recent piece of bare text went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    Slot(usize),
    Pending,
}

/// Bare text waiting for the next positional fill.
#[derive(Debug)]
struct Pending {
    text: String,
    start: usize,
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Assign slot values from `input` in one left-to-right pass.
///
/// Never fails: malformed quoting, stray flag characters and trailing
/// backslashes all degrade to literal text.
pub fn assign_args(
    input: &str,
    meta: &CommandParseMetadata,
    grammar: &CompiledGrammar,
    referenced: Option<&ReferencedMessage>,
) -> ArgMap {
    Automaton::new(input, meta, grammar).run(referenced)
}

// ─── Automaton Implementation ───────────────────────────────────────────────

struct Automaton<'a> {
    input: &'a str,
    meta: &'a CommandParseMetadata,
    slots: &'a [OptionSlot],
    grammar: &'a CompiledGrammar,
    behavior: &'a BehaviorConfig,
    /// Per-call copy; patched when a named family is locked out.
    escapes: EscapeTables,
    values: Vec<Option<String>>,
    /// Next unfilled positional slot (`slots.len()` once exhausted).
    cursor: usize,
    mode: Mode,
    pending: Option<Pending>,
    last: Option<Attach>,
    /// End offset of the last piece of text placed.
    last_end: usize,
    /// Set by an odd backslash run; consumed by the next token.
    escape_next: bool,
    /// Named family in use when exclusive-style behavior is enabled.
    locked: Option<NamedFamily>,
}

impl<'a> Automaton<'a> {
    fn new(input: &'a str, meta: &'a CommandParseMetadata, grammar: &'a CompiledGrammar) -> Self {
        let slots = meta.slots();
        Self {
            input,
            meta,
            slots,
            grammar,
            behavior: &grammar.config().behavior,
            escapes: grammar.escapes().clone(),
            values: vec![None; slots.len()],
            cursor: 0,
            mode: Mode::Idle,
            pending: None,
            last: None,
            last_end: 0,
            escape_next: false,
            locked: None,
        }
    }

    fn run(mut self, referenced: Option<&ReferencedMessage>) -> ArgMap {
        if self.slots.is_empty() {
            return ArgMap::new();
        }
        self.inject_reference(referenced);

        for tok in self.grammar.tokenize(self.input) {
            if self.should_stop() {
                tracing::trace!(
                    offset = tok.start,
                    "every slot is filled; ignoring remaining text"
                );
                break;
            }
            let escaped = std::mem::take(&mut self.escape_next);
            match self.mode {
                Mode::Idle => self.step_idle(&tok, escaped),
                Mode::Quoted { .. } => self.step_quoted(&tok, escaped),
                Mode::Named { .. } => self.step_named(&tok, escaped),
                Mode::Greedy { .. } => self.step_greedy(&tok, escaped),
            }
        }

        self.finish();
        self.into_map()
    }

    fn into_map(self) -> ArgMap {
        self.slots
            .iter()
            .zip(self.values)
            .filter_map(|(slot, v)| v.map(|v| (slot.name.clone(), v)))
            .collect()
    }

    // ─── Reference injection ────────────────────────────────────────────────

    fn inject_reference(&mut self, referenced: Option<&ReferencedMessage>) {
        let (Some(rule), Some(msg)) = (self.behavior.referenced_user_as_option, referenced) else {
            return;
        };
        if !(msg.author_is_invoker || !rule.require_ping || msg.pings_author) {
            return;
        }
        if self
            .slots
            .get(self.cursor)
            .is_some_and(|s| s.kind == OptionKind::User)
        {
            tracing::trace!(slot = %self.slots[self.cursor].name, "filled from referenced message");
            self.values[self.cursor] = Some(msg.author_id.clone());
            self.advance_cursor();
        }
    }

    // ─── Mode steps ─────────────────────────────────────────────────────────

    fn step_idle(&mut self, tok: &Token<'a>, escaped: bool) {
        match tok.kind {
            TokKind::Named { escapes, .. } => {
                if let Some(slot) = self.recognize_flag(tok) {
                    if escapes > 0 {
                        // Even prefix: the pairs are literal text before the flag.
                        let text = "\\".repeat(escapes / 2);
                        self.place_piece(text, tok.start, tok.start + escapes);
                    }
                    self.open_flag(tok, slot);
                } else {
                    self.place_piece(literal_flag_text(tok), tok.start, tok.end);
                }
            }
            TokKind::Special => {
                let c = tok.first_char().unwrap_or_default();
                match self.grammar.quote_tag(c) {
                    Some(tag) if !escaped && self.quote_active(tag) => {
                        self.mode = Mode::Quoted {
                            tag,
                            content_start: tok.end,
                            target: QuoteTarget::Positional,
                        };
                    }
                    _ => self.place_piece(tok.text.to_string(), tok.start, tok.end),
                }
            }
            TokKind::Value => self.place_piece(tok.text.to_string(), tok.start, tok.end),
            TokKind::Backslashes => {
                let next = self.char_at(tok.end);
                let run = self
                    .escapes
                    .rule(EscapeContext::All)
                    .collapse_run(tok.text.len(), next);
                let mut text = "\\".repeat(run.literal);
                let mut end = tok.end;
                match next {
                    Some(ws) if run.escapes_next && ws.is_whitespace() => {
                        // Escaped whitespace joins the surrounding text.
                        text.push(ws);
                        end += ws.len_utf8();
                    }
                    _ => self.escape_next = run.escapes_next,
                }
                self.place_piece(text, tok.start, end);
            }
        }
    }

    fn step_quoted(&mut self, tok: &Token<'a>, escaped: bool) {
        let Mode::Quoted {
            tag,
            content_start,
            target,
        } = self.mode
        else {
            return;
        };
        match tok.kind {
            TokKind::Backslashes => {
                let run = self
                    .escapes
                    .rule(EscapeContext::Tag(tag))
                    .collapse_run(tok.text.len(), self.char_at(tok.end));
                self.escape_next = run.escapes_next;
            }
            TokKind::Special if !escaped && tok.first_char() == Some(tag.as_char()) => {
                let raw = &self.input[content_start..tok.start];
                let value = self.escapes.rule(EscapeContext::All).sanitize(raw);
                self.mode = Mode::Idle;
                let open = content_start - tag.as_char().len_utf8();
                self.deliver_quoted(target, value, open, tok.end);
            }
            _ => {}
        }
    }

    fn step_named(&mut self, tok: &Token<'a>, escaped: bool) {
        let Mode::Named {
            slot, value_start, ..
        } = self.mode
        else {
            return;
        };
        match tok.kind {
            TokKind::Named { .. } => {
                if let Some(next) = self.recognize_flag(tok) {
                    self.open_flag(tok, next);
                }
            }
            TokKind::Special => {
                let c = tok.first_char().unwrap_or_default();
                if let Some(tag) = self.grammar.quote_tag(c)
                    && !escaped
                    && self.input[value_start..tok.start].trim().is_empty()
                {
                    self.mode = Mode::Quoted {
                        tag,
                        content_start: tok.end,
                        target: QuoteTarget::Named(slot),
                    };
                }
            }
            TokKind::Backslashes => self.note_escape(tok),
            TokKind::Value => {}
        }
    }

    fn step_greedy(&mut self, tok: &Token<'a>, escaped: bool) {
        match tok.kind {
            TokKind::Named { .. } => {
                if let Some(slot) = self.recognize_flag(tok) {
                    self.open_flag(tok, slot);
                }
            }
            TokKind::Special => {
                let c = tok.first_char().unwrap_or_default();
                // A quote inside a word (`don't`) stays part of the capture.
                if let Some(tag) = self.grammar.quote_tag(c)
                    && !escaped
                    && self.at_word_start(tok.start)
                    && self.quote_active(tag)
                {
                    self.close_mode(tok.start);
                    self.mode = Mode::Quoted {
                        tag,
                        content_start: tok.end,
                        target: QuoteTarget::Positional,
                    };
                }
            }
            TokKind::Backslashes => self.note_escape(tok),
            TokKind::Value => {}
        }
    }

    fn finish(&mut self) {
        let end = self.input.len();
        self.close_mode(end);
        self.commit_pending();
        // A final commit may have anchored the last slot.
        self.close_mode(end);
    }

    // ─── Named flags ────────────────────────────────────────────────────────

    /// The slot a flag token targets, if it acts as a flag here.
    fn recognize_flag(&self, tok: &Token<'a>) -> Option<usize> {
        let TokKind::Named { style, escapes } = tok.kind else {
            return None;
        };
        if escapes % 2 == 1 || !self.at_word_start(tok.start) {
            return None;
        }
        if self.locked.is_some_and(|f| f != style.family()) {
            return None;
        }
        self.meta.slot_index(tok.flag_name()?)
    }

    fn open_flag(&mut self, tok: &Token<'a>, slot: usize) {
        let TokKind::Named { style, escapes } = tok.kind else {
            return;
        };
        self.close_mode(tok.start + escapes);
        self.commit_pending();

        let family = style.family();
        if self.behavior.exclusive_named_style_at_runtime && self.locked.is_none() {
            tracing::trace!(?family, "locking named flag family for this call");
            self.locked = Some(family);
            self.escapes.disable_family(family.other());
        }
        self.mode = Mode::Named {
            slot,
            value_start: tok.end,
            dotted: style == NamedStyle::Colon,
        };
    }

    fn assign_named(&mut self, slot: usize, value: String) {
        let value = if value.is_empty() {
            if self.slots[slot].kind != OptionKind::Boolean {
                return;
            }
            "true".to_string()
        } else {
            value
        };
        self.values[slot] = Some(value);
        self.last = Some(Attach::Slot(slot));
        if slot == self.cursor {
            self.advance_cursor();
        }
    }

    // ─── Flushing ───────────────────────────────────────────────────────────

    /// Close an open quote, named value or greedy capture at `bound`.
    fn close_mode(&mut self, bound: usize) {
        match std::mem::replace(&mut self.mode, Mode::Idle) {
            Mode::Idle => {}
            Mode::Quoted {
                tag,
                content_start,
                target,
            } => {
                // Unterminated: the span runs to `bound`.
                let raw = &self.input[content_start..bound];
                let value = self.escapes.rule(EscapeContext::All).sanitize(raw);
                let open = content_start - tag.as_char().len_utf8();
                self.deliver_quoted(target, value, open, bound);
            }
            Mode::Named {
                slot,
                value_start,
                dotted,
            } => {
                let ctx = if dotted {
                    EscapeContext::NamedDotted
                } else {
                    EscapeContext::Named
                };
                let raw = self.input[value_start..bound].trim();
                let value = self.escapes.rule(ctx).sanitize(raw);
                self.assign_named(slot, value);
            }
            Mode::Greedy { slot, anchor } => {
                let raw = self.input[anchor..bound].trim_end();
                let value = self.escapes.rule(EscapeContext::All).sanitize(raw);
                self.values[slot] = Some(value);
                self.last = Some(Attach::Slot(slot));
            }
        }
    }

    /// Deliver a closed quoted span opened at byte offset `open`.
    fn deliver_quoted(&mut self, target: QuoteTarget, value: String, open: usize, end: usize) {
        match target {
            QuoteTarget::Positional => {
                let (value, start) = match self.pending.take() {
                    Some(p) => (p.text + &value, p.start),
                    None => (value, open),
                };
                self.commit_positional(value, start, false);
            }
            QuoteTarget::Named(slot) => self.assign_named(slot, value),
        }
        self.last_end = end;
    }

    // ─── Attachment ─────────────────────────────────────────────────────────

    /// Place a piece of bare text spanning `start..end`.
    ///
    /// Left attachment is tested first: a piece touching non-whitespace on
    /// its left joins whatever the previous piece joined, even when it also
    /// touches text on its right.
    fn place_piece(&mut self, text: String, start: usize, end: usize) {
        if text.is_empty() {
            return;
        }
        let left = self.adjacent_left(start) && self.last.is_some();
        let right = self.char_at(end).is_some_and(|c| !c.is_whitespace());
        self.last_end = end;

        if left {
            match self.last {
                Some(Attach::Slot(i)) => {
                    self.values[i].get_or_insert_default().push_str(&text);
                }
                Some(Attach::Pending) => {
                    if let Some(p) = self.pending.as_mut() {
                        p.text.push_str(&text);
                    }
                    if !right {
                        self.commit_pending();
                    }
                }
                None => {}
            }
            return;
        }

        match self.pending.as_mut() {
            Some(p) => p.text.push_str(&text),
            None => self.pending = Some(Pending { text, start }),
        }
        self.last = Some(Attach::Pending);
        if !right {
            self.commit_pending();
        }
    }

    fn commit_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.commit_positional(p.text, p.start, true);
        }
    }

    /// Fill the slot at the cursor with text starting at byte offset `start`.
    /// Bare text reaching the final slot starts a greedy capture there.
    fn commit_positional(&mut self, value: String, start: usize, bare: bool) {
        if self.cursor >= self.slots.len() {
            self.append_overflow(&value, start);
            return;
        }
        let slot = self.cursor;
        self.values[slot] = Some(value);
        self.last = Some(Attach::Slot(slot));
        self.advance_cursor();

        if bare && slot + 1 == self.slots.len() && !self.behavior.stop_on_all_slots_filled {
            self.mode = Mode::Greedy {
                slot,
                anchor: start,
            };
        }
    }

    /// Every positional slot is filled: extend the final slot, keeping the
    /// whitespace that separated this text from what came before.
    fn append_overflow(&mut self, text: &str, start: usize) {
        let slot = self.slots.len() - 1;
        let before = &self.input[..start];
        let gap = &before[before.trim_end().len()..];
        tracing::trace!(slot = %self.slots[slot].name, %text, "appending overflow text to final slot");
        let value = self.values[slot].get_or_insert_default();
        if !value.is_empty() {
            value.push_str(gap);
        }
        value.push_str(text);
        self.last = Some(Attach::Slot(slot));
    }

    fn advance_cursor(&mut self) {
        self.cursor += 1;
        while self.cursor < self.slots.len() && self.values[self.cursor].is_some() {
            self.cursor += 1;
        }
    }

    // ─── Helpers ────────────────────────────────────────────────────────────

    fn char_at(&self, pos: usize) -> Option<char> {
        self.input.get(pos..).and_then(|s| s.chars().next())
    }

    fn char_before(&self, pos: usize) -> Option<char> {
        self.input.get(..pos).and_then(|s| s.chars().next_back())
    }

    fn at_word_start(&self, pos: usize) -> bool {
        self.char_before(pos).is_none_or(char::is_whitespace)
    }

    fn adjacent_left(&self, start: usize) -> bool {
        start > 0
            && (start == self.last_end || self.char_before(start).is_some_and(|c| !c.is_whitespace()))
    }

    /// Record an escape for the next token, outside of any quoted span.
    fn note_escape(&mut self, tok: &Token<'a>) {
        let run = self
            .escapes
            .rule(EscapeContext::All)
            .collapse_run(tok.text.len(), self.char_at(tok.end));
        self.escape_next = run.escapes_next;
    }

    /// Whether a quote tag opens a span at the current position.
    fn quote_active(&self, tag: QuoteTag) -> bool {
        let on_last = matches!(self.mode, Mode::Greedy { .. }) || self.cursor + 1 == self.slots.len();
        match self.behavior.disable_quotes_in_last_slot {
            Some(cfg) if on_last => cfg.exclude_code_blocks && tag == QuoteTag::Backtick,
            _ => true,
        }
    }

    fn should_stop(&self) -> bool {
        self.behavior.stop_on_all_slots_filled
            && matches!(self.mode, Mode::Idle)
            && self.pending.is_none()
            && self.values.iter().all(Option::is_some)
    }
}

/// Text of a flag token that does not act as a flag.
///
/// Backslash pairs collapse; an odd leftover backslash is the escape itself.
fn literal_flag_text(tok: &Token<'_>) -> String {
    let TokKind::Named { escapes, .. } = tok.kind else {
        return tok.text.to_string();
    };
    let mut text = "\\".repeat(escapes / 2);
    text.push_str(&tok.text[escapes..]);
    text
}
