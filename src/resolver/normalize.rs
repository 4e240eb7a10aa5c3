//! Raw candidate values to concrete locating expressions
//!
//! Candidates store their `value` raw; the bank never rewrites it. This is
//! the one place a raw value turns into an expression a probe can run — a
//! pure function of (strategy, value), total over the strategy enum.

use crate::types::Strategy;

/// Normalize a candidate's raw value into a locating expression
pub fn normalize(strategy: Strategy, value: &str) -> String {
    let value = value.trim();
    match strategy {
        // already full expressions
        Strategy::Css | Strategy::Structure | Strategy::Hybrid => value.to_string(),
        Strategy::Id => {
            if value.starts_with('#') {
                value.to_string()
            } else {
                format!("#{value}")
            }
        }
        Strategy::Class => {
            if value.starts_with('.') {
                value.to_string()
            } else {
                // "card daily" -> ".card.daily"
                value
                    .split_whitespace()
                    .map(|class| format!(".{class}"))
                    .collect()
            }
        }
        Strategy::Aria => {
            if value.starts_with('[') {
                value.to_string()
            } else {
                format!("[aria-label=\"{}\"]", escape_quotes(value))
            }
        }
        Strategy::Text => format!("text=\"{}\"", escape_quotes(value)),
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_structure_hybrid_pass_through() {
        assert_eq!(normalize(Strategy::Css, " .card > a "), ".card > a");
        assert_eq!(
            normalize(Strategy::Structure, "section div:nth-child(2)"),
            "section div:nth-child(2)"
        );
        assert_eq!(
            normalize(Strategy::Hybrid, "div.card[role=\"link\"]"),
            "div.card[role=\"link\"]"
        );
    }

    #[test]
    fn test_id_gets_hash_prefix_once() {
        assert_eq!(normalize(Strategy::Id, "daily-toggle"), "#daily-toggle");
        assert_eq!(normalize(Strategy::Id, "#daily-toggle"), "#daily-toggle");
    }

    #[test]
    fn test_bare_class_names_get_dots() {
        assert_eq!(normalize(Strategy::Class, "card"), ".card");
        assert_eq!(normalize(Strategy::Class, "card daily"), ".card.daily");
        assert_eq!(normalize(Strategy::Class, ".card.daily"), ".card.daily");
    }

    #[test]
    fn test_aria_wraps_bare_labels() {
        assert_eq!(
            normalize(Strategy::Aria, "Daily set"),
            "[aria-label=\"Daily set\"]"
        );
        assert_eq!(
            normalize(Strategy::Aria, "[aria-expanded=\"false\"]"),
            "[aria-expanded=\"false\"]"
        );
    }

    #[test]
    fn test_text_wraps_exact_match_with_escaping() {
        assert_eq!(normalize(Strategy::Text, "Claim now"), "text=\"Claim now\"");
        assert_eq!(
            normalize(Strategy::Text, "say \"hi\""),
            "text=\"say \\\"hi\\\"\""
        );
    }
}
