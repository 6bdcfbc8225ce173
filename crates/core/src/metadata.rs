//! Per-command parse metadata.
//!
//! Built once per registered schema and cached by the registry until the
//! schema is redefined.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::grammar::compile::CompiledGrammar;
use crate::schema::{CommandSchema, OptionKind};

/// A text-representable option slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSlot {
    /// Option name, unique within the command.
    pub name: String,
    /// Declared kind.
    pub kind: OptionKind,
    /// Whether the option declares enumerated choices.
    pub has_choices: bool,
}

/// One entry of a choice-alias table. Both keys are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceAlias {
    /// Lower-cased display name.
    pub alias: String,
    /// Lower-cased underlying value.
    pub raw_value: String,
    /// The canonical display name.
    pub canonical: String,
}

/// Ordered slots, name index and choice tables for one command.
#[derive(Debug)]
pub struct CommandParseMetadata {
    command: String,
    slots: Vec<OptionSlot>,
    /// Lower-cased name → index into `slots`.
    slot_index: HashMap<String, usize>,
    /// Slot name → aliases, in declaration order of the slots.
    choice_table: Vec<(String, Vec<ChoiceAlias>)>,
    /// Grammar for this command's effective configuration (lazily initialized).
    grammar: OnceLock<Arc<CompiledGrammar>>,
}

impl CommandParseMetadata {
    /// Build metadata for a schema.
    ///
    /// Non-textual options (attachments, subcommands) are skipped; the
    /// remaining declaration order is the positional order.
    pub fn build(schema: &CommandSchema) -> Self {
        let mut slots = Vec::new();
        let mut slot_index = HashMap::new();
        let mut choice_table = Vec::new();
        for opt in schema.options.iter().filter(|o| o.kind.is_textual()) {
            slot_index
                .entry(opt.name.to_lowercase())
                .or_insert(slots.len());
            slots.push(OptionSlot {
                name: opt.name.clone(),
                kind: opt.kind,
                has_choices: !opt.choices.is_empty(),
            });
            if !opt.choices.is_empty() {
                let aliases = opt
                    .choices
                    .iter()
                    .map(|c| ChoiceAlias {
                        alias: c.name.to_lowercase(),
                        raw_value: c.value.to_string().to_lowercase(),
                        canonical: c.name.clone(),
                    })
                    .collect();
                choice_table.push((opt.name.clone(), aliases));
            }
        }
        tracing::trace!(
            command = %schema.name,
            slots = slots.len(),
            "built command parse metadata"
        );
        Self {
            command: schema.name.clone(),
            slots,
            slot_index,
            choice_table,
            grammar: OnceLock::new(),
        }
    }

    /// Name of the command this metadata was built from.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Text-representable slots in positional order.
    pub fn slots(&self) -> &[OptionSlot] {
        &self.slots
    }

    /// Look up a slot by name, ignoring case.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slot_index.get(&name.to_lowercase()).copied()
    }

    /// Choice-alias tables keyed by slot name.
    pub fn choice_table(&self) -> &[(String, Vec<ChoiceAlias>)] {
        &self.choice_table
    }

    /// The compiled grammar for this command, compiling it on first use.
    pub fn grammar(&self, compile: impl FnOnce() -> Arc<CompiledGrammar>) -> &Arc<CompiledGrammar> {
        self.grammar.get_or_init(compile)
    }
}
