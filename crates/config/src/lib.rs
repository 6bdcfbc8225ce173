//! Parser configuration for the chatargs text-command parser.
//!
//! A [`ParserConfig`] declares which quoting and named-flag syntaxes are
//! active and a handful of behavioral switches. Individual commands may carry
//! a [`PartialParserConfig`] that is merged onto the global configuration
//! field by field (nested objects merge key by key).

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or validating a parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON deserialization failed.
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field value is not acceptable.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The name of the field that failed validation.
        field: String,
        /// A human-readable explanation of why the field value is invalid.
        reason: String,
    },
}

// ─── Syntax ─────────────────────────────────────────────────────────────────

/// A delimiter character marking a literal, whitespace-preserving span.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuoteTag {
    /// `"`
    #[serde(rename = "\"")]
    Double,
    /// `'`
    #[serde(rename = "'")]
    Single,
    /// `` ` ``
    #[serde(rename = "`")]
    Backtick,
}

impl QuoteTag {
    /// All quote tags, in their default priority order.
    pub const ALL: [QuoteTag; 3] = [QuoteTag::Double, QuoteTag::Single, QuoteTag::Backtick];

    /// The delimiter character for this tag.
    pub fn as_char(self) -> char {
        match self {
            QuoteTag::Double => '"',
            QuoteTag::Single => '\'',
            QuoteTag::Backtick => '`',
        }
    }

    /// Look up the tag for a delimiter character.
    pub fn from_char(c: char) -> Option<QuoteTag> {
        QuoteTag::ALL.into_iter().find(|t| t.as_char() == c)
    }
}

impl std::fmt::Display for QuoteTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A named-flag syntax: `-name`, `--name` or `name:`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NamedStyle {
    /// `-name`
    #[serde(rename = "-")]
    SingleDash,
    /// `--name`
    #[serde(rename = "--")]
    DoubleDash,
    /// `name:`
    #[serde(rename = ":")]
    Colon,
}

/// Named styles are grouped into families for runtime exclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedFamily {
    /// `-name` and `--name`.
    Hyphen,
    /// `name:`.
    Colon,
}

impl NamedFamily {
    /// The boundary character this family introduces into escape rules.
    pub fn boundary_char(self) -> char {
        match self {
            NamedFamily::Hyphen => '-',
            NamedFamily::Colon => ':',
        }
    }

    /// The other family.
    pub fn other(self) -> NamedFamily {
        match self {
            NamedFamily::Hyphen => NamedFamily::Colon,
            NamedFamily::Colon => NamedFamily::Hyphen,
        }
    }
}

impl NamedStyle {
    /// The family this style belongs to.
    pub fn family(self) -> NamedFamily {
        match self {
            NamedStyle::SingleDash | NamedStyle::DoubleDash => NamedFamily::Hyphen,
            NamedStyle::Colon => NamedFamily::Colon,
        }
    }
}

impl std::fmt::Display for NamedStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamedStyle::SingleDash => write!(f, "-"),
            NamedStyle::DoubleDash => write!(f, "--"),
            NamedStyle::Colon => write!(f, ":"),
        }
    }
}

/// Which quoting and named-flag syntaxes are active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct SyntaxConfig {
    /// Active quote tags, in priority order.
    pub quote_tags: Vec<QuoteTag>,
    /// Active named-flag styles, in priority order.
    pub named_flag_styles: Vec<NamedStyle>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            quote_tags: QuoteTag::ALL.to_vec(),
            named_flag_styles: vec![NamedStyle::DoubleDash, NamedStyle::Colon],
        }
    }
}

impl SyntaxConfig {
    /// Whether any special syntax (quotes or named flags) is enabled.
    pub fn has_special_syntax(&self) -> bool {
        !self.quote_tags.is_empty() || !self.named_flag_styles.is_empty()
    }

    /// Whether a named style is enabled.
    pub fn has_style(&self, style: NamedStyle) -> bool {
        self.named_flag_styles.contains(&style)
    }

    /// Whether any style of the given family is enabled.
    pub fn has_family(&self, family: NamedFamily) -> bool {
        self.named_flag_styles.iter().any(|s| s.family() == family)
    }
}

// ─── Behavior ───────────────────────────────────────────────────────────────

/// Settings for treating quote tags as literal text in the last positional slot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct LastSlotQuotes {
    /// Keep backtick spans (code blocks) active in the last slot.
    pub exclude_code_blocks: bool,
}

/// Settings for mapping raw text onto canonical choice values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoiceResolution {
    /// Also match against the choice's underlying value, not just its name.
    pub allow_direct_value: bool,
}

/// Settings for filling a leading user slot from a replied-to message.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferencedUser {
    /// Only inject when the invoking message pings the referenced author.
    pub require_ping: bool,
}

/// Behavioral switches for the parsing automaton.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorConfig {
    /// Stop scanning once every positional slot is filled.
    pub stop_on_all_slots_filled: bool,
    /// The first named-flag family used in a call locks out the other one.
    pub exclusive_named_style_at_runtime: bool,
    /// Quote tags are literal text while filling the last positional slot.
    #[serde(deserialize_with = "deserialize_toggle")]
    pub disable_quotes_in_last_slot: Option<LastSlotQuotes>,
    /// Resolve choice aliases to their canonical name.
    #[serde(deserialize_with = "deserialize_toggle")]
    pub choice_resolution: Option<ChoiceResolution>,
    /// Fill a leading user slot from the referenced message's author.
    #[serde(deserialize_with = "deserialize_toggle")]
    pub referenced_user_as_option: Option<ReferencedUser>,
    /// Emit the final slot map through `tracing`.
    pub log_result: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            stop_on_all_slots_filled: false,
            exclusive_named_style_at_runtime: false,
            disable_quotes_in_last_slot: None,
            choice_resolution: Some(ChoiceResolution::default()),
            referenced_user_as_option: None,
            log_result: false,
        }
    }
}

/// `false` / `null` disable, `true` enables with defaults, an object enables
/// with the given fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NestedOverride<P> {
    /// A bare boolean toggle.
    Toggle(bool),
    /// Individual fields to merge onto the base value.
    Fields(P),
}

fn deserialize_toggle<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(
        match Option::<NestedOverride<T>>::deserialize(deserializer)? {
            None | Some(NestedOverride::Toggle(false)) => None,
            Some(NestedOverride::Toggle(true)) => Some(T::default()),
            Some(NestedOverride::Fields(t)) => Some(t),
        },
    )
}

impl<P> NestedOverride<P> {
    fn apply<T: Default + Clone>(&self, base: Option<T>, merge: impl Fn(&mut T, &P)) -> Option<T> {
        match self {
            NestedOverride::Toggle(false) => None,
            NestedOverride::Toggle(true) => Some(base.unwrap_or_default()),
            NestedOverride::Fields(fields) => {
                let mut value = base.unwrap_or_default();
                merge(&mut value, fields);
                Some(value)
            }
        }
    }
}

// ─── Complete configuration ─────────────────────────────────────────────────

/// A complete, effective parser configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", default)]
pub struct ParserConfig {
    /// Active syntaxes.
    pub syntax: SyntaxConfig,
    /// Behavioral switches.
    pub behavior: BehaviorConfig,
}

impl ParserConfig {
    /// Merge a per-command partial configuration on top of this one.
    pub fn merged(&self, partial: &PartialParserConfig) -> ParserConfig {
        let mut out = self.clone();
        if let Some(syntax) = &partial.syntax {
            if let Some(tags) = &syntax.quote_tags {
                out.syntax.quote_tags = tags.clone();
            }
            if let Some(styles) = &syntax.named_flag_styles {
                out.syntax.named_flag_styles = styles.clone();
            }
        }
        if let Some(b) = &partial.behavior {
            let ob = &mut out.behavior;
            if let Some(v) = b.stop_on_all_slots_filled {
                ob.stop_on_all_slots_filled = v;
            }
            if let Some(v) = b.exclusive_named_style_at_runtime {
                ob.exclusive_named_style_at_runtime = v;
            }
            if let Some(o) = &b.disable_quotes_in_last_slot {
                ob.disable_quotes_in_last_slot =
                    o.apply(ob.disable_quotes_in_last_slot, |v, p| {
                        if let Some(x) = p.exclude_code_blocks {
                            v.exclude_code_blocks = x;
                        }
                    });
            }
            if let Some(o) = &b.choice_resolution {
                ob.choice_resolution = o.apply(ob.choice_resolution, |v, p| {
                    if let Some(x) = p.allow_direct_value {
                        v.allow_direct_value = x;
                    }
                });
            }
            if let Some(o) = &b.referenced_user_as_option {
                ob.referenced_user_as_option = o.apply(ob.referenced_user_as_option, |v, p| {
                    if let Some(x) = p.require_ping {
                        v.require_ping = x;
                    }
                });
            }
            if let Some(v) = b.log_result {
                ob.log_result = v;
            }
        }
        out
    }

    /// Check structural invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unique("syntax.quoteTags", &self.syntax.quote_tags)?;
        check_unique("syntax.namedFlagStyles", &self.syntax.named_flag_styles)?;
        Ok(())
    }
}

fn check_unique<T: PartialEq + std::fmt::Display>(field: &str, items: &[T]) -> Result<(), ConfigError> {
    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) {
            return Err(ConfigError::InvalidField {
                field: field.into(),
                reason: format!("'{item}' is listed more than once"),
            });
        }
    }
    Ok(())
}

// ─── Partial configuration ──────────────────────────────────────────────────

/// Per-command overrides; absent fields inherit from the global configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialParserConfig {
    /// Syntax overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax: Option<PartialSyntaxConfig>,
    /// Behavior overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<PartialBehaviorConfig>,
}

/// Partial [`SyntaxConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialSyntaxConfig {
    /// Replaces the quote tag list when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_tags: Option<Vec<QuoteTag>>,
    /// Replaces the named style list when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named_flag_styles: Option<Vec<NamedStyle>>,
}

/// Partial [`BehaviorConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialBehaviorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub stop_on_all_slots_filled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub exclusive_named_style_at_runtime: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub disable_quotes_in_last_slot: Option<NestedOverride<PartialLastSlotQuotes>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub choice_resolution: Option<NestedOverride<PartialChoiceResolution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub referenced_user_as_option: Option<NestedOverride<PartialReferencedUser>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub log_result: Option<bool>,
}

/// Partial [`LastSlotQuotes`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialLastSlotQuotes {
    #[allow(missing_docs)]
    pub exclude_code_blocks: Option<bool>,
}

/// Partial [`ChoiceResolution`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialChoiceResolution {
    #[allow(missing_docs)]
    pub allow_direct_value: Option<bool>,
}

/// Partial [`ReferencedUser`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialReferencedUser {
    #[allow(missing_docs)]
    pub require_ping: Option<bool>,
}

// ─── Loading ────────────────────────────────────────────────────────────────

/// Load and validate a complete configuration from a JSON string.
///
/// Absent fields take their defaults.
pub fn load_config_from_str(s: &str) -> Result<ParserConfig, ConfigError> {
    let config: ParserConfig = serde_json::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Load a per-command partial configuration from a JSON string.
///
/// List overrides are validated the same way a complete configuration is.
pub fn load_partial_config_from_str(s: &str) -> Result<PartialParserConfig, ConfigError> {
    let partial: PartialParserConfig = serde_json::from_str(s)?;
    if let Some(syntax) = &partial.syntax {
        if let Some(tags) = &syntax.quote_tags {
            check_unique("syntax.quoteTags", tags)?;
        }
        if let Some(styles) = &syntax.named_flag_styles {
            check_unique("syntax.namedFlagStyles", styles)?;
        }
    }
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_minimal_config_uses_defaults() {
        let c = load_config_from_str("{}").unwrap();
        assert_eq!(c, ParserConfig::default());
        assert_eq!(c.syntax.quote_tags.len(), 3);
        assert!(c.behavior.choice_resolution.is_some());
    }

    #[test]
    fn load_full_config() {
        let json = r#"{
            "syntax": { "quoteTags": ["\"", "`"], "namedFlagStyles": ["-", "--", ":"] },
            "behavior": {
                "stopOnAllSlotsFilled": true,
                "exclusiveNamedStyleAtRuntime": true,
                "disableQuotesInLastSlot": { "excludeCodeBlocks": true },
                "choiceResolution": false,
                "referencedUserAsOption": true,
                "logResult": true
            }
        }"#;
        let c = load_config_from_str(json).unwrap();
        assert_eq!(c.syntax.quote_tags, vec![QuoteTag::Double, QuoteTag::Backtick]);
        assert!(c.syntax.has_style(NamedStyle::SingleDash));
        assert!(c.behavior.stop_on_all_slots_filled);
        assert_eq!(
            c.behavior.disable_quotes_in_last_slot,
            Some(LastSlotQuotes {
                exclude_code_blocks: true
            })
        );
        assert_eq!(c.behavior.choice_resolution, None);
        assert_eq!(
            c.behavior.referenced_user_as_option,
            Some(ReferencedUser { require_ping: false })
        );
    }

    #[test]
    fn duplicate_quote_tag_rejected() {
        let err = load_config_from_str(r#"{ "syntax": { "quoteTags": ["'", "'"] } }"#).unwrap_err();
        assert!(
            err.to_string().contains("quoteTags"),
            "error should mention quoteTags: {}",
            err
        );
    }

    #[test]
    fn unknown_style_rejected() {
        let err = load_config_from_str(r#"{ "syntax": { "namedFlagStyles": ["=>"] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }

    #[test]
    fn merge_replaces_scalars_and_lists() {
        let base = ParserConfig::default();
        let partial = load_partial_config_from_str(
            r#"{ "syntax": { "namedFlagStyles": [":"] }, "behavior": { "stopOnAllSlotsFilled": true } }"#,
        )
        .unwrap();
        let merged = base.merged(&partial);
        assert_eq!(merged.syntax.named_flag_styles, vec![NamedStyle::Colon]);
        assert_eq!(merged.syntax.quote_tags, base.syntax.quote_tags);
        assert!(merged.behavior.stop_on_all_slots_filled);
        assert_eq!(merged.behavior.choice_resolution, base.behavior.choice_resolution);
    }

    #[test]
    fn merge_nested_objects_key_by_key() {
        let mut base = ParserConfig::default();
        base.behavior.referenced_user_as_option = Some(ReferencedUser { require_ping: true });
        base.behavior.choice_resolution = Some(ChoiceResolution {
            allow_direct_value: true,
        });

        // An empty object keeps existing nested keys.
        let partial = load_partial_config_from_str(
            r#"{ "behavior": { "referencedUserAsOption": {}, "choiceResolution": { "allowDirectValue": false } } }"#,
        )
        .unwrap();
        let merged = base.merged(&partial);
        assert_eq!(
            merged.behavior.referenced_user_as_option,
            Some(ReferencedUser { require_ping: true })
        );
        assert_eq!(
            merged.behavior.choice_resolution,
            Some(ChoiceResolution {
                allow_direct_value: false
            })
        );
    }

    #[test]
    fn merge_toggles_nested_objects() {
        let base = ParserConfig::default();
        let partial = load_partial_config_from_str(
            r#"{ "behavior": { "choiceResolution": false, "disableQuotesInLastSlot": true } }"#,
        )
        .unwrap();
        let merged = base.merged(&partial);
        assert_eq!(merged.behavior.choice_resolution, None);
        assert_eq!(
            merged.behavior.disable_quotes_in_last_slot,
            Some(LastSlotQuotes::default())
        );
    }

    #[test]
    fn empty_partial_is_identity() {
        let base = ParserConfig::default();
        assert_eq!(base.merged(&PartialParserConfig::default()), base);
    }

    #[test]
    fn partial_duplicate_styles_rejected() {
        let err = load_partial_config_from_str(r#"{ "syntax": { "namedFlagStyles": ["--", "--"] } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("namedFlagStyles"), "{}", err);
    }

    #[test]
    fn quote_tag_char_roundtrip() {
        for tag in QuoteTag::ALL {
            assert_eq!(QuoteTag::from_char(tag.as_char()), Some(tag));
        }
        assert_eq!(QuoteTag::from_char('x'), None);
    }
}
