//! Fuzz smoke tests for the tokenizer and assignment automaton.
//!
//! Random and adversarial inputs must never panic, every returned key must
//! be a declared text-representable option, and every token must borrow a
//! valid slice of its input.
//!
//! No external crate dependencies are used; a simple deterministic PRNG
//! provides reproducible randomness.

use chatargs_config::{LastSlotQuotes, NamedStyle, ReferencedUser};
use chatargs_core::{
    ArgMap, ArgParser, CommandSchema, CompiledGrammar, OptionKind, OptionSpec, ParserConfig,
    ReferencedMessage, tokenize,
};

// ─── Simple deterministic PRNG (LCG) ────────────────────────────────────────

struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range(&mut self, max: usize) -> usize {
        ((self.next() >> 33) as usize) % max
    }
}

/// Fragments weighted toward characters the grammar treats specially.
const FRAGMENTS: &[&str] = &[
    "a", "word", "--first", "--second", "-f", "first:", "second:", "flag:", "\"", "'", "`",
    "\\", "\\\\", " ", "  ", "\t", "-", ":", "//", "http://x", "é", "日本", "--", "::",
];

fn random_input(rng: &mut SimpleRng) -> String {
    let len = rng.gen_range(24);
    (0..len)
        .map(|_| FRAGMENTS[rng.gen_range(FRAGMENTS.len())])
        .collect()
}

fn schema() -> CommandSchema {
    CommandSchema::new(
        "fuzz",
        vec![
            OptionSpec::new("target", OptionKind::User),
            OptionSpec::new("first", OptionKind::String),
            OptionSpec::new("file", OptionKind::Attachment),
            OptionSpec::new("second", OptionKind::Boolean),
        ],
    )
}

fn configs() -> Vec<ParserConfig> {
    let mut all = vec![ParserConfig::default()];

    let mut c = ParserConfig::default();
    c.behavior.exclusive_named_style_at_runtime = true;
    c.behavior.stop_on_all_slots_filled = true;
    all.push(c);

    let mut c = ParserConfig::default();
    c.syntax.named_flag_styles = vec![NamedStyle::SingleDash, NamedStyle::DoubleDash, NamedStyle::Colon];
    c.behavior.disable_quotes_in_last_slot = Some(LastSlotQuotes {
        exclude_code_blocks: true,
    });
    c.behavior.referenced_user_as_option = Some(ReferencedUser::default());
    all.push(c);

    let mut c = ParserConfig::default();
    c.syntax.quote_tags.clear();
    c.syntax.named_flag_styles.clear();
    all.push(c);

    all
}

// ─── Invariant checking ─────────────────────────────────────────────────────

fn assert_invariants(args: &ArgMap, input: &str) {
    for key in args.keys() {
        assert!(
            ["target", "first", "second"].contains(&key.as_str()),
            "unexpected key {key:?} for input {input:?}"
        );
    }
}

fn assert_token_spans(config: &ParserConfig, input: &str) {
    let grammar = CompiledGrammar::compile(config);
    let mut prev_end = 0;
    for tok in tokenize(input, &grammar) {
        assert!(tok.start >= prev_end, "overlapping tokens in {input:?}");
        assert!(tok.start < tok.end, "empty token in {input:?}");
        assert_eq!(&input[tok.start..tok.end], tok.text);
        prev_end = tok.end;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[test]
fn random_inputs_never_panic() {
    let reply = ReferencedMessage {
        author_id: "7".into(),
        author_is_invoker: false,
        pings_author: true,
    };
    for (i, config) in configs().into_iter().enumerate() {
        let mut parser = ArgParser::new(config.clone());
        let id = parser.register(schema());
        let mut rng = SimpleRng::new(0xC0FFEE + i as u64);
        for round in 0..500 {
            let input = random_input(&mut rng);
            let referenced = (round % 3 == 0).then_some(&reply);
            let args = parser
                .parse(id, &input, referenced)
                .unwrap_or_else(|e| panic!("parse failed for {input:?}: {e}"));
            assert_invariants(&args, &input);
            assert_token_spans(&config, &input);
        }
    }
}

#[test]
fn adversarial_inputs_never_panic() {
    let cases = [
        "\\",
        "\\\\\\",
        "\"",
        "\"\"\"\"\"",
        "'`\"",
        "--",
        "--first",
        "--first --second --first",
        "first:",
        "first::",
        "::::",
        "-",
        "- - -",
        "a\\",
        "\\\"unterminated",
        "\"\\\"",
        "--first \"",
        "second: '",
        "日本語 --first é \"ü\"",
        "\u{00a0}--first\u{00a0}x",
    ];
    for config in configs() {
        let parser = ArgParser::new(config.clone());
        for input in cases {
            let args = parser.parse_schema(&schema(), input, None);
            assert_invariants(&args, input);
            assert_token_spans(&config, input);
        }
    }
}

#[test]
fn parsing_is_deterministic() {
    let parser = ArgParser::default();
    let mut rng = SimpleRng::new(42);
    for _ in 0..200 {
        let input = random_input(&mut rng);
        let a = parser.parse_schema(&schema(), &input, None);
        let b = parser.parse_schema(&schema(), &input, None);
        assert_eq!(a, b, "non-deterministic result for {input:?}");
    }
}
