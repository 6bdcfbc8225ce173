//! Choice resolution: replace raw text with a canonical choice name.

use chatargs_config::ChoiceResolution;

use crate::grammar::parser::ArgMap;
use crate::metadata::CommandParseMetadata;

/// Replace each slot value that names one of its choices with the choice's
/// canonical display name.
///
/// Matching is case-insensitive against the display name, and against the
/// underlying value when `allow_direct_value` is set. The first matching
/// choice wins. Unmatched values are left untouched for a downstream
/// validator to judge.
pub fn resolve_choices(args: &mut ArgMap, meta: &CommandParseMetadata, settings: ChoiceResolution) {
    for (name, aliases) in meta.choice_table() {
        let Some(value) = args.get_mut(name) else {
            continue;
        };
        let lowered = value.to_lowercase();
        if let Some(hit) = aliases
            .iter()
            .find(|a| a.alias == lowered || (settings.allow_direct_value && a.raw_value == lowered))
            && *value != hit.canonical
        {
            tracing::trace!(slot = %name, from = %value, to = %hit.canonical, "resolved choice");
            value.clone_from(&hit.canonical);
        }
    }
}
