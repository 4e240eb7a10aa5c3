//! One-shot seeding of the selector store
//!
//! The learning loop can only rank hypotheses it already has; a fresh
//! store has none. Seeding loads a hand-authored JSON file of candidates
//! into the store so the bank has an origin to rank from. Not part of the
//! learning algorithm — it runs once, before the first resolution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::store::{SelectorCandidate, SelectorStore};
use crate::types::{Strategy, UiContext};

/// One hand-authored candidate in a seed file
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub element_type: String,
    pub strategy: Strategy,
    pub value: String,
    #[serde(default = "default_seed_confidence")]
    pub confidence: f64,
    pub context: UiContext,
}

fn default_seed_confidence() -> f64 {
    50.0
}

/// What a seeding run did
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    /// Candidates written to the store
    pub inserted: usize,
    /// Entries skipped because an equivalent active candidate exists
    pub skipped: usize,
}

/// Seed the store from a JSON file of [`SeedEntry`] values
pub async fn seed_from_file<P: AsRef<Path>>(store: &SelectorStore, path: P) -> Result<SeedReport> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let entries: Vec<SeedEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse seed file {}", path.display()))?;

    seed_entries(store, entries).await
}

/// Seed the store from in-memory entries
///
/// Idempotent: an entry is skipped when an active candidate already exists
/// with the same (element_type, strategy, value, mobile), so re-running a
/// seed is safe and never resets learned confidence.
pub async fn seed_entries(store: &SelectorStore, entries: Vec<SeedEntry>) -> Result<SeedReport> {
    let existing = store.load_active().await?;
    let mut report = SeedReport::default();

    for entry in entries {
        let duplicate = existing.iter().any(|c| {
            c.element_type == entry.element_type
                && c.strategy == entry.strategy
                && c.value == entry.value
                && c.ui_context.mobile == entry.context.mobile
        });
        if duplicate {
            report.skipped += 1;
            continue;
        }

        let candidate = SelectorCandidate::new(
            &entry.element_type,
            entry.strategy,
            &entry.value,
            entry.context,
            entry.confidence.clamp(0.0, 100.0),
        );
        store.upsert(&candidate).await?;
        report.inserted += 1;
    }

    info!(
        "Seeded {} candidates ({} skipped as already present)",
        report.inserted, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<SeedEntry> {
        let json = r#"[
            {
                "element_type": "daily_set_toggle",
                "strategy": "aria",
                "value": "Daily set",
                "confidence": 80.0,
                "context": { "page_url": "https://dashboard.example.com", "mobile": false }
            },
            {
                "element_type": "activity_card",
                "strategy": "class",
                "value": "card daily",
                "context": { "page_url": "https://dashboard.example.com", "mobile": false }
            }
        ]"#;
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_seed_inserts_with_default_confidence() {
        let store = SelectorStore::in_memory().await.unwrap();
        let report = seed_entries(&store, entries()).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 0);

        let loaded = store.load_active().await.unwrap();
        let card = loaded
            .iter()
            .find(|c| c.element_type == "activity_card")
            .unwrap();
        // entry without an explicit confidence gets the default
        assert_eq!(card.confidence, 50.0);
        let toggle = loaded
            .iter()
            .find(|c| c.element_type == "daily_set_toggle")
            .unwrap();
        assert_eq!(toggle.confidence, 80.0);
    }

    #[tokio::test]
    async fn test_reseeding_is_idempotent() {
        let store = SelectorStore::in_memory().await.unwrap();
        seed_entries(&store, entries()).await.unwrap();
        let report = seed_entries(&store, entries()).await.unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.load_active().await.unwrap().len(), 2);
    }
}
