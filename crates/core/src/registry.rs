//! Command registration and the parser entry point.
//!
//! Commands are registered once and addressed by a stable [`CommandId`].
//! Per-command configuration overrides live in an explicit side table, and
//! cached metadata is dropped whenever a command is redefined.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chatargs_config::{ParserConfig, PartialParserConfig};
use serde::Serialize;

use crate::choices::resolve_choices;
use crate::error::ParseError;
use crate::grammar::compile::{CompiledGrammar, GrammarCache};
use crate::grammar::parser::{ArgMap, assign_args};
use crate::metadata::CommandParseMetadata;
use crate::schema::{CommandSchema, ReferencedMessage};

/// Stable identifier assigned to a command at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommandId(u64);

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Registration {
    schema: CommandSchema,
    /// Built on first parse; reset on redefinition or configuration change.
    metadata: OnceLock<Arc<CommandParseMetadata>>,
}

impl Registration {
    fn new(schema: CommandSchema) -> Self {
        Self {
            schema,
            metadata: OnceLock::new(),
        }
    }

    fn metadata(&self) -> &Arc<CommandParseMetadata> {
        self.metadata
            .get_or_init(|| Arc::new(CommandParseMetadata::build(&self.schema)))
    }
}

/// Maps chat-style text onto the options of registered commands.
///
/// Registration takes `&mut self`; parsing takes `&self` and only ever fills
/// write-once caches, so a shared `ArgParser` can serve concurrent calls.
///
/// # Example
/// ```
/// use chatargs_core::{ArgParser, CommandSchema, OptionKind, OptionSpec};
///
/// let mut parser = ArgParser::default();
/// let id = parser.register(CommandSchema::new(
///     "say",
///     vec![
///         OptionSpec::new("target", OptionKind::String),
///         OptionSpec::new("message", OptionKind::String),
///     ],
/// ));
/// let args = parser.parse(id, "world hello there", None).unwrap();
/// assert_eq!(args["target"], "world");
/// assert_eq!(args["message"], "hello there");
/// ```
#[derive(Debug)]
pub struct ArgParser {
    config: ParserConfig,
    grammars: GrammarCache,
    commands: HashMap<CommandId, Registration>,
    names: HashMap<String, CommandId>,
    overrides: HashMap<CommandId, PartialParserConfig>,
    next_id: u64,
}

impl Default for ArgParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl ArgParser {
    /// Create a parser with a global configuration.
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            grammars: GrammarCache::new(),
            commands: HashMap::new(),
            names: HashMap::new(),
            overrides: HashMap::new(),
            next_id: 0,
        }
    }

    /// The global configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Replace the global configuration, dropping every compiled grammar.
    pub fn set_config(&mut self, config: ParserConfig) {
        if config == self.config {
            return;
        }
        tracing::debug!("global parser configuration replaced; invalidating grammars");
        self.config = config;
        self.grammars.clear();
        for reg in self.commands.values_mut() {
            reg.metadata = OnceLock::new();
        }
    }

    // ─── Registration ───────────────────────────────────────────────────────

    /// Register a command. Registering a name again redefines that command:
    /// the id is kept and its cached metadata is dropped.
    pub fn register(&mut self, schema: CommandSchema) -> CommandId {
        if let Some(&id) = self.names.get(&schema.name)
            && let Some(reg) = self.commands.get_mut(&id)
        {
            tracing::debug!(command = %schema.name, %id, "command redefined");
            *reg = Registration::new(schema);
            return id;
        }
        let id = CommandId(self.next_id);
        self.next_id += 1;
        tracing::debug!(command = %schema.name, %id, "command registered");
        self.names.insert(schema.name.clone(), id);
        self.commands.insert(id, Registration::new(schema));
        id
    }

    /// Register a command together with its configuration overrides.
    pub fn register_with_overrides(
        &mut self,
        schema: CommandSchema,
        overrides: PartialParserConfig,
    ) -> CommandId {
        let id = self.register(schema);
        self.overrides.insert(id, overrides);
        id
    }

    /// Remove a command and its overrides.
    pub fn unregister(&mut self, id: CommandId) -> Option<CommandSchema> {
        let reg = self.commands.remove(&id)?;
        self.names.remove(&reg.schema.name);
        self.overrides.remove(&id);
        Some(reg.schema)
    }

    /// Attach configuration overrides to a command.
    pub fn set_overrides(
        &mut self,
        id: CommandId,
        overrides: PartialParserConfig,
    ) -> Result<(), ParseError> {
        self.invalidate(id)?;
        self.overrides.insert(id, overrides);
        Ok(())
    }

    /// Remove a command's configuration overrides.
    pub fn clear_overrides(&mut self, id: CommandId) -> Result<Option<PartialParserConfig>, ParseError> {
        self.invalidate(id)?;
        Ok(self.overrides.remove(&id))
    }

    /// Drop a command's cached metadata and grammar.
    pub fn invalidate(&mut self, id: CommandId) -> Result<(), ParseError> {
        let reg = self
            .commands
            .get_mut(&id)
            .ok_or(ParseError::UnknownCommand(id))?;
        reg.metadata = OnceLock::new();
        Ok(())
    }

    // ─── Lookup ─────────────────────────────────────────────────────────────

    /// The id registered for a command name.
    pub fn id_of(&self, name: &str) -> Option<CommandId> {
        self.names.get(name).copied()
    }

    /// The schema registered under an id.
    pub fn schema(&self, id: CommandId) -> Option<&CommandSchema> {
        self.commands.get(&id).map(|r| &r.schema)
    }

    /// The configuration a command is parsed with: global merged with overrides.
    pub fn effective_config(&self, id: CommandId) -> Result<ParserConfig, ParseError> {
        if !self.commands.contains_key(&id) {
            return Err(ParseError::UnknownCommand(id));
        }
        Ok(self.merged_config(id))
    }

    fn merged_config(&self, id: CommandId) -> ParserConfig {
        match self.overrides.get(&id) {
            Some(partial) => self.config.merged(partial),
            None => self.config.clone(),
        }
    }

    /// Cached parse metadata for a command.
    pub fn metadata(&self, id: CommandId) -> Result<Arc<CommandParseMetadata>, ParseError> {
        let reg = self.commands.get(&id).ok_or(ParseError::UnknownCommand(id))?;
        Ok(Arc::clone(reg.metadata()))
    }

    /// The compiled grammar a command is parsed with.
    pub fn grammar(&self, id: CommandId) -> Result<Arc<CompiledGrammar>, ParseError> {
        let meta = self.metadata(id)?;
        Ok(Arc::clone(meta.grammar(|| {
            self.grammars.get_or_compile(&self.merged_config(id))
        })))
    }

    /// Number of distinct compiled grammars currently cached.
    pub fn compiled_grammars(&self) -> usize {
        self.grammars.len()
    }

    // ─── Parsing ────────────────────────────────────────────────────────────

    /// Parse text for a registered command.
    ///
    /// Returns an empty map when the command has no text-representable
    /// options. Only an unknown id is an error.
    pub fn parse(
        &self,
        id: CommandId,
        text: &str,
        referenced: Option<&ReferencedMessage>,
    ) -> Result<ArgMap, ParseError> {
        let meta = self.metadata(id)?;
        if meta.slots().is_empty() {
            return Ok(ArgMap::new());
        }
        let grammar = self.grammar(id)?;
        Ok(run(&meta, &grammar, text, referenced))
    }

    /// Like [`ArgParser::parse`], but a command without text-representable
    /// options is reported as an error.
    pub fn parse_strict(
        &self,
        id: CommandId,
        text: &str,
        referenced: Option<&ReferencedMessage>,
    ) -> Result<ArgMap, ParseError> {
        let meta = self.metadata(id)?;
        if meta.slots().is_empty() {
            return Err(ParseError::NoTextualSlots {
                command: meta.command().to_string(),
            });
        }
        self.parse(id, text, referenced)
    }

    /// Parse text for a command looked up by name.
    pub fn parse_named(
        &self,
        name: &str,
        text: &str,
        referenced: Option<&ReferencedMessage>,
    ) -> Result<ArgMap, ParseError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| ParseError::UnknownCommandName(name.to_string()))?;
        self.parse(id, text, referenced)
    }

    /// Parse text against an unregistered schema with the global configuration.
    ///
    /// Nothing about the schema is cached; the grammar still is.
    pub fn parse_schema(
        &self,
        schema: &CommandSchema,
        text: &str,
        referenced: Option<&ReferencedMessage>,
    ) -> ArgMap {
        let meta = CommandParseMetadata::build(schema);
        if meta.slots().is_empty() {
            return ArgMap::new();
        }
        let grammar = self.grammars.get_or_compile(&self.config);
        run(&meta, &grammar, text, referenced)
    }
}

fn run(
    meta: &CommandParseMetadata,
    grammar: &CompiledGrammar,
    text: &str,
    referenced: Option<&ReferencedMessage>,
) -> ArgMap {
    let mut args = assign_args(text, meta, grammar, referenced);
    let behavior = &grammar.config().behavior;
    if let Some(settings) = behavior.choice_resolution {
        resolve_choices(&mut args, meta, settings);
    }
    if behavior.log_result {
        tracing::info!(
            target: "chatargs::result",
            command = %meta.command(),
            args = ?args,
            "parsed command arguments"
        );
    }
    args
}
