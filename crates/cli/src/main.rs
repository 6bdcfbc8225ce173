//! `chatargs` command-line tool.

use std::fs;
use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use chatargs_config::{ParserConfig, load_config_from_str, load_partial_config_from_str};
use chatargs_core::{
    ArgMap, ArgParser, CommandSchema, CompiledGrammar, ReferencedMessage, TokKind,
    load_schemas_from_str, tokenize,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

// ─── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "chatargs",
    version,
    about = "chatargs: map chat-style text onto command options"
)]
struct Cli {
    /// Output mode: "pretty" for `name = value` lines, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse text against a command schema and print the option values.
    Parse {
        /// Text to parse, or `-` to read it from stdin.
        text: String,
        /// Path to a JSON schema file (one command or an array of commands).
        #[arg(long)]
        schema: String,
        /// Command to use when the schema file declares several.
        #[arg(long)]
        command: Option<String>,
        /// Path to a global parser configuration JSON file.
        #[arg(long)]
        config: Option<String>,
        /// Path to a partial configuration JSON file applied to this command.
        #[arg(long)]
        overrides: Option<String>,
        /// Treat the text as a reply to a message by this author.
        #[arg(long)]
        reply_author: Option<String>,
        /// The reply pings the referenced author.
        #[arg(long, requires = "reply_author")]
        reply_pinged: bool,
        /// The referenced message was written by the invoker.
        #[arg(long, requires = "reply_author")]
        reply_self: bool,
        /// Log the final option map through the `chatargs::result` target.
        #[arg(long)]
        log_result: bool,
    },

    /// Print the token stream for a piece of text.
    Tokens {
        /// Text to tokenize, or `-` to read it from stdin.
        text: String,
        /// Path to a global parser configuration JSON file.
        #[arg(long)]
        config: Option<String>,
    },
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Pretty,
    Json,
}

impl Format {
    fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Parse {
            text,
            schema,
            command,
            config,
            overrides,
            reply_author,
            reply_pinged,
            reply_self,
            log_result,
        } => {
            init_logging(log_result);
            let referenced = reply_author.map(|author_id| ReferencedMessage {
                author_id,
                author_is_invoker: reply_self,
                pings_author: reply_pinged,
            });
            cmd_parse(
                &text,
                &schema,
                command.as_deref(),
                config.as_deref(),
                overrides.as_deref(),
                referenced.as_ref(),
                log_result,
                format,
            )?;
        }
        Cmd::Tokens { text, config } => {
            init_logging(false);
            cmd_tokens(&text, config.as_deref(), format)?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `CHATARGS_LOG` takes an env-filter directive.
fn init_logging(log_result: bool) {
    let mut filter =
        EnvFilter::try_from_env("CHATARGS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    if log_result && let Ok(directive) = "chatargs::result=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// ─── Commands ───────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn cmd_parse(
    text: &str,
    schema_path: &str,
    command: Option<&str>,
    config_path: Option<&str>,
    overrides_path: Option<&str>,
    referenced: Option<&ReferencedMessage>,
    log_result: bool,
    format: Format,
) -> Result<()> {
    let text = read_text(text)?;
    let schema = select_schema(load_schemas(schema_path)?, command)?;
    tracing::debug!(command = %schema.name, options = schema.options.len(), "loaded schema");

    let mut config = load_config(config_path)?;
    if log_result {
        config.behavior.log_result = true;
    }
    let mut parser = ArgParser::new(config);
    let id = match overrides_path {
        Some(p) => {
            let s = fs::read_to_string(p).with_context(|| format!("failed to read {p}"))?;
            let partial = load_partial_config_from_str(&s)
                .with_context(|| format!("invalid overrides in {p}"))?;
            parser.register_with_overrides(schema, partial)
        }
        None => parser.register(schema),
    };

    let args = parser.parse(id, &text, referenced)?;
    let order: Vec<&str> = parser
        .schema(id)
        .map(|s| s.options.iter().map(|o| o.name.as_str()).collect())
        .unwrap_or_default();
    print_args(&args, &order, format)
}

fn cmd_tokens(text: &str, config_path: Option<&str>, format: Format) -> Result<()> {
    let text = read_text(text)?;
    let grammar = CompiledGrammar::compile(&load_config(config_path)?);
    let tokens: Vec<TokenOut<'_>> = tokenize(&text, &grammar)
        .into_iter()
        .map(|t| TokenOut {
            kind: kind_name(t.kind),
            text: t.text,
            start: t.start,
            end: t.end,
        })
        .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&tokens)?),
        Format::Pretty => {
            for t in &tokens {
                println!("{:>4}..{:<4} {:<12} {:?}", t.start, t.end, t.kind, t.text);
            }
        }
    }
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TokenOut<'a> {
    kind: &'static str,
    text: &'a str,
    start: usize,
    end: usize,
}

fn kind_name(kind: TokKind) -> &'static str {
    match kind {
        TokKind::Named { .. } => "named",
        TokKind::Special => "special",
        TokKind::Value => "value",
        TokKind::Backslashes => "backslashes",
    }
}

fn read_text(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read text from stdin")?;
    // A trailing newline from `echo` is not part of the message.
    Ok(buf.trim_end_matches(['\n', '\r']).to_string())
}

fn load_config(path: Option<&str>) -> Result<ParserConfig> {
    let Some(path) = path else {
        return Ok(ParserConfig::default());
    };
    let s = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    load_config_from_str(&s).with_context(|| format!("invalid config in {path}"))
}

fn load_schemas(path: &str) -> Result<Vec<CommandSchema>> {
    let s = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    load_schemas_from_str(&s).with_context(|| format!("invalid schema in {path}"))
}

fn select_schema(schemas: Vec<CommandSchema>, command: Option<&str>) -> Result<CommandSchema> {
    match command {
        Some(name) => schemas
            .into_iter()
            .find(|s| s.name == name)
            .with_context(|| format!("schema file has no command named '{name}'")),
        None => {
            let mut it = schemas.into_iter();
            match (it.next(), it.next()) {
                (Some(only), None) => Ok(only),
                (None, _) => bail!("schema file declares no commands"),
                (Some(_), Some(_)) => {
                    bail!("schema file declares several commands; pick one with --command")
                }
            }
        }
    }
}

/// Pretty output follows the schema's declaration order.
fn print_args(args: &ArgMap, order: &[&str], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(args)?),
        Format::Pretty => {
            if args.is_empty() {
                eprintln!("no options filled");
            }
            for name in order {
                if let Some(value) = args.get(*name) {
                    println!("{name} = {value:?}");
                }
            }
        }
    }
    Ok(())
}
