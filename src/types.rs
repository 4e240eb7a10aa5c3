//! Shared types used across modules
//!
//! This module contains types that are used by multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Locating technique a selector candidate uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// ARIA attribute match (aria-label and friends)
    Aria,
    /// Exact visible-text match
    Text,
    /// Structural path through the document
    Structure,
    /// CSS class name(s)
    Class,
    /// Compound selector mixing several techniques
    Hybrid,
    /// Raw CSS selector
    Css,
    /// Element id
    Id,
}

impl Strategy {
    /// String form used in the database and seed files
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Aria => "aria",
            Strategy::Text => "text",
            Strategy::Structure => "structure",
            Strategy::Class => "class",
            Strategy::Hybrid => "hybrid",
            Strategy::Css => "css",
            Strategy::Id => "id",
        }
    }

    /// All strategies, in normalization-table order
    pub fn all() -> &'static [Strategy] {
        &[
            Strategy::Aria,
            Strategy::Text,
            Strategy::Structure,
            Strategy::Class,
            Strategy::Hybrid,
            Strategy::Css,
            Strategy::Id,
        ]
    }
}

/// Error for a strategy string that is not one of the known variants
#[derive(Debug, thiserror::Error)]
#[error("unknown selector strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl std::str::FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aria" => Ok(Strategy::Aria),
            "text" => Ok(Strategy::Text),
            "structure" => Ok(Strategy::Structure),
            "class" => Ok(Strategy::Class),
            "hybrid" => Ok(Strategy::Hybrid),
            "css" => Ok(Strategy::Css),
            "id" => Ok(Strategy::Id),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one resolution attempt, recorded in the interaction history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    Success,
    Failure,
}

impl InteractionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionAction::Success => "success",
            InteractionAction::Failure => "failure",
        }
    }
}

/// Error for an action string that is not one of the known variants
#[derive(Debug, thiserror::Error)]
#[error("unknown interaction action: {0}")]
pub struct UnknownAction(pub String);

impl std::str::FromStr for InteractionAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(InteractionAction::Success),
            "failure" => Ok(InteractionAction::Failure),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The environment a candidate was generated and validated in
///
/// Captured once at creation and stored verbatim with the candidate.
/// Only `mobile` is enforced when filtering candidates for a query;
/// the rest is kept for audit and for future context-aware ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiContext {
    /// Page URL the candidate applies to
    pub page_url: String,
    /// Whether the surrounding section was collapsed
    #[serde(default)]
    pub collapsed: bool,
    /// Dashboard tier (e.g. "level1", "level2")
    #[serde(default = "default_tier")]
    pub tier: String,
    /// Mobile vs desktop layout
    #[serde(default)]
    pub mobile: bool,
}

fn default_tier() -> String {
    "level1".to_string()
}

impl UiContext {
    /// Desktop-layout context for the given page
    pub fn desktop(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            collapsed: false,
            tier: default_tier(),
            mobile: false,
        }
    }

    /// Mobile-layout context for the given page
    pub fn mobile(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            collapsed: false,
            tier: default_tier(),
            mobile: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_strategy_round_trip() {
        for strategy in Strategy::all() {
            assert_eq!(Strategy::from_str(strategy.as_str()).unwrap(), *strategy);
        }
    }

    #[test]
    fn test_strategy_rejects_unknown() {
        assert!(Strategy::from_str("xpath").is_err());
    }

    #[test]
    fn test_action_round_trip() {
        assert_eq!(
            InteractionAction::from_str("success").unwrap(),
            InteractionAction::Success
        );
        assert_eq!(
            InteractionAction::from_str("failure").unwrap(),
            InteractionAction::Failure
        );
        assert!(InteractionAction::from_str("maybe").is_err());
    }

    #[test]
    fn test_context_helpers() {
        let ctx = UiContext::mobile("https://dashboard.example.com");
        assert!(ctx.mobile);
        assert!(!ctx.collapsed);
        assert_eq!(ctx.tier, "level1");
    }
}
