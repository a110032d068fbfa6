//! Revision-suggestion rendering: one string per rule, concatenated
//! from the non-matching reasons.

use super::reasons::Reason;

/// Render the per-rule suggestion. Missing-answer suggestions always
/// surface; for pure template misses the model-contract ("范文")
/// reasons win over the regulation ("法规") ones, since their text is
/// what the drafter should actually paste.
pub fn render_suggestion_by_reasons(related_name: &str, reasons: &[Reason]) -> String {
    let mut suggestions: Vec<String> = Vec::new();
    let add = |suggestion: Option<String>, suggestions: &mut Vec<String>| {
        if let Some(suggestion) = suggestion {
            if !suggestion.is_empty() && !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }
    };

    let unmatched: Vec<&Reason> = reasons.iter().filter(|r| !r.matched()).collect();
    if unmatched.is_empty() {
        return String::new();
    }

    for reason in &unmatched {
        if matches!(reason, Reason::SchemaFailed { .. }) {
            add(reason.render_suggestion(related_name), &mut suggestions);
        }
    }

    let template_misses: Vec<&Reason> = unmatched
        .iter()
        .copied()
        .filter(|r| matches!(r, Reason::TplNoMatch { .. } | Reason::TplConflict { .. }))
        .collect();

    if !template_misses.is_empty() && template_misses.len() == unmatched.len() {
        let by_name = |name: &str| -> Vec<&Reason> {
            template_misses
                .iter()
                .copied()
                .filter(|r| r.template().map(|t| t.name == name).unwrap_or(false))
                .collect()
        };
        let editing = by_name("范文");
        let law = by_name("法规");
        let chosen = if !editing.is_empty() {
            editing
        } else if !law.is_empty() {
            law
        } else {
            vec![template_misses[0]]
        };
        for reason in chosen {
            add(reason.render_suggestion(related_name), &mut suggestions);
        }
    } else if let Some(last) = unmatched.last() {
        add(last.render_suggestion(related_name), &mut suggestions);
    }

    suggestions.join("\n")
}
