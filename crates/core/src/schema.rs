//! Command schema types consumed by the parser.
//!
//! A [`CommandSchema`] is an ordered list of declared options. Only options
//! whose kind can be written as text take part in parsing; declaration order
//! is positional order.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// The declared kind of a command option.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum OptionKind {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// A user mention or id.
    User,
    /// A channel mention or id.
    Channel,
    /// A role mention or id.
    Role,
    /// A user or role mention.
    Mentionable,
    /// An uploaded file; never filled from text.
    Attachment,
    /// A nested subcommand; never filled from text.
    Subcommand,
    /// A nested subcommand group; never filled from text.
    SubcommandGroup,
}

impl OptionKind {
    /// Whether values of this kind can be written as text in a message.
    pub fn is_textual(self) -> bool {
        !matches!(
            self,
            OptionKind::Attachment | OptionKind::Subcommand | OptionKind::SubcommandGroup
        )
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKind::String => write!(f, "string"),
            OptionKind::Integer => write!(f, "integer"),
            OptionKind::Number => write!(f, "number"),
            OptionKind::Boolean => write!(f, "boolean"),
            OptionKind::User => write!(f, "user"),
            OptionKind::Channel => write!(f, "channel"),
            OptionKind::Role => write!(f, "role"),
            OptionKind::Mentionable => write!(f, "mentionable"),
            OptionKind::Attachment => write!(f, "attachment"),
            OptionKind::Subcommand => write!(f, "subcommand"),
            OptionKind::SubcommandGroup => write!(f, "subcommandGroup"),
        }
    }
}

/// The underlying value of a choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChoiceValue {
    /// A string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
}

impl std::fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceValue::Str(s) => write!(f, "{s}"),
            ChoiceValue::Int(i) => write!(f, "{i}"),
            ChoiceValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// One enumerated choice for an option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Display name; the canonical form written into parse results.
    pub name: String,
    /// Underlying value.
    pub value: ChoiceValue,
}

/// A declared command option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionSpec {
    /// Option name, unique within the command.
    pub name: String,
    /// Declared kind.
    #[serde(rename = "type")]
    pub kind: OptionKind,
    /// Whether a downstream validator requires a value.
    #[serde(default)]
    pub required: bool,
    /// Enumerated choices, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl OptionSpec {
    /// Create an option without choices.
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            choices: Vec::new(),
        }
    }

    /// Mark the option as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Add a choice.
    pub fn choice(mut self, name: impl Into<String>, value: ChoiceValue) -> Self {
        self.choices.push(Choice {
            name: name.into(),
            value,
        });
        self
    }
}

/// A command's declared options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSchema {
    /// Command name (or full path such as `"group sub"`).
    pub name: String,
    /// Declared options, in declaration order.
    #[serde(default)]
    pub options: Vec<OptionSpec>,
}

impl CommandSchema {
    /// Create a schema from a name and its options.
    pub fn new(name: impl Into<String>, options: Vec<OptionSpec>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// The message an invocation replied to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferencedMessage {
    /// Identifier of the referenced message's author.
    pub author_id: String,
    /// The invoker replied to their own message.
    #[serde(default)]
    pub author_is_invoker: bool,
    /// The invoking message pings the referenced author.
    #[serde(default)]
    pub pings_author: bool,
}

/// One schema or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Many(Vec<CommandSchema>),
    One(CommandSchema),
}

/// Load command schemas from JSON: a single schema object or an array.
///
/// Option names must be unique within a command, ignoring case.
pub fn load_schemas_from_str(s: &str) -> Result<Vec<CommandSchema>, SchemaError> {
    let schemas = match serde_json::from_str(s)? {
        SchemaDocument::Many(v) => v,
        SchemaDocument::One(one) => vec![one],
    };
    for schema in &schemas {
        if schema.name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }
        for (i, opt) in schema.options.iter().enumerate() {
            if schema.options[..i]
                .iter()
                .any(|o| o.name.to_lowercase() == opt.name.to_lowercase())
            {
                return Err(SchemaError::DuplicateOption {
                    command: schema.name.clone(),
                    option: opt.name.clone(),
                });
            }
        }
    }
    Ok(schemas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_textual_kinds() {
        assert!(OptionKind::String.is_textual());
        assert!(OptionKind::User.is_textual());
        assert!(!OptionKind::Attachment.is_textual());
        assert!(!OptionKind::Subcommand.is_textual());
        assert!(!OptionKind::SubcommandGroup.is_textual());
    }

    #[test]
    fn schema_from_json() {
        let json = r#"{
            "name": "pick",
            "options": [
                { "name": "fruit", "type": "string", "required": true,
                  "choices": [ { "name": "Apple", "value": "apple" }, { "name": "Pear", "value": 2 } ] },
                { "name": "file", "type": "attachment" }
            ]
        }"#;
        let schema: CommandSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.options.len(), 2);
        assert_eq!(schema.options[0].choices[1].value, ChoiceValue::Int(2));
        assert_eq!(schema.options[1].kind, OptionKind::Attachment);
        assert!(!schema.options[1].required);
    }

    #[test]
    fn load_single_or_many() {
        let one = load_schemas_from_str(r#"{ "name": "ping" }"#).unwrap();
        assert_eq!(one.len(), 1);
        assert!(one[0].options.is_empty());

        let many = load_schemas_from_str(r#"[ { "name": "a" }, { "name": "b" } ]"#).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn duplicate_option_rejected() {
        let err = load_schemas_from_str(
            r#"{ "name": "x", "options": [ { "name": "Msg", "type": "string" }, { "name": "msg", "type": "string" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateOption { .. }), "{err}");
    }

    #[test]
    fn blank_name_rejected() {
        let err = load_schemas_from_str(r#"{ "name": "  " }"#).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyName));
    }
}
