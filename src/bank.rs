//! Selector bank and confidence feedback loop
//!
//! The in-memory source of truth during a run. Candidates are grouped by
//! element type and ranked at query time by confidence; successes promote,
//! failures degrade, and sustained decay retires a candidate for good.
//!
//! The bank is the single writer of candidate state. Every mutation holds
//! the map's write guard across the full read-modify-write and the store
//! write, so interleaved worker tasks cannot tear a sequence and persisted
//! write order matches logical mutation order.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::SelectorConfig;
use crate::store::{SelectorCandidate, SelectorStore};
use crate::types::{InteractionAction, Strategy, UiContext};

/// In-memory candidate bank with write-through persistence
#[derive(Clone)]
pub struct SelectorBank {
    store: Arc<SelectorStore>,
    by_type: Arc<RwLock<HashMap<String, Vec<SelectorCandidate>>>>,
    config: SelectorConfig,
}

impl SelectorBank {
    /// Create an empty bank over the given store
    pub fn new(store: Arc<SelectorStore>, config: SelectorConfig) -> Self {
        Self {
            store,
            by_type: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Load all active candidates from the store, grouped by element type
    ///
    /// Called once at process start. No ranking is precomputed; ranking
    /// happens at query time. Returns the number of candidates loaded.
    pub async fn load(&self) -> Result<usize> {
        let candidates = self.store.load_active().await?;
        let count = candidates.len();

        let mut by_type = self.by_type.write().await;
        by_type.clear();
        for candidate in candidates {
            by_type
                .entry(candidate.element_type.clone())
                .or_default()
                .push(candidate);
        }

        info!(
            "Loaded {} selector candidates across {} element types",
            count,
            by_type.len()
        );
        Ok(count)
    }

    /// Ranked candidates for an element type in a given context
    ///
    /// Filters to the context's layout (`mobile` is the only dimension
    /// enforced) and to non-retired candidates, then sorts by confidence
    /// descending. The sort is stable, so ties keep insertion order —
    /// ranking is deterministic for a fixed confidence state.
    pub async fn candidates(&self, element_type: &str, ctx: &UiContext) -> Vec<SelectorCandidate> {
        let by_type = self.by_type.read().await;

        let mut matches: Vec<SelectorCandidate> = by_type
            .get(element_type)
            .map(|group| {
                group
                    .iter()
                    .filter(|c| !c.is_retired() && c.ui_context.mobile == ctx.mobile)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        matches
    }

    /// Create a fresh candidate and persist it immediately
    ///
    /// Write-through, no buffering: candidate writes are infrequent and
    /// durability wins over throughput here.
    pub async fn add_candidate(
        &self,
        element_type: &str,
        strategy: Strategy,
        value: &str,
        ctx: &UiContext,
        confidence: Option<f64>,
    ) -> Result<SelectorCandidate> {
        let candidate = SelectorCandidate::new(
            element_type,
            strategy,
            value,
            ctx.clone(),
            confidence.unwrap_or(self.config.default_confidence),
        );

        let mut by_type = self.by_type.write().await;
        by_type
            .entry(element_type.to_string())
            .or_default()
            .push(candidate.clone());
        self.store.upsert(&candidate).await?;

        debug!(
            "Added {} candidate '{}' for '{}' at confidence {}",
            candidate.strategy, candidate.value, element_type, candidate.confidence
        );
        Ok(candidate)
    }

    /// Record a successful resolution for a candidate
    ///
    /// Bumps the success counter, adds the promote step (capped at 100) and
    /// folds `response_time` into the exact running mean over all successes.
    /// The newest observation is weighted 1/n: no recency bias.
    pub async fn promote_selector(&self, id: &str, response_time: f64) -> Result<()> {
        let mut by_type = self.by_type.write().await;

        let Some(candidate) = find_mut(&mut by_type, id) else {
            warn!("promote_selector: unknown candidate id {}", id);
            return Ok(());
        };
        if candidate.is_retired() {
            warn!("promote_selector: candidate {} is retired, ignoring", id);
            return Ok(());
        }

        candidate.success_count += 1;
        candidate.last_success = Some(Utc::now());
        candidate.confidence = (candidate.confidence + self.config.promote_step).min(100.0);
        let n = candidate.success_count as f64;
        candidate.avg_response_time =
            (candidate.avg_response_time * (n - 1.0) + response_time) / n;

        let updated = candidate.clone();
        self.store.upsert(&updated).await?;
        self.store
            .append_interaction(id, InteractionAction::Success, response_time, None)
            .await?;

        debug!(
            "Promoted {} to confidence {} ({} successes, avg {:.0}ms)",
            id, updated.confidence, updated.success_count, updated.avg_response_time
        );
        Ok(())
    }

    /// Record a failed resolution for a candidate
    ///
    /// Bumps the failure counter and subtracts the degrade step (floored at
    /// 0). A candidate that has decayed below the retirement confidence with
    /// strictly more failures than the threshold is retired on the spot —
    /// a one-way transition. The penalty is deliberately steeper than the
    /// promote step: clicking the wrong element costs more than a slow
    /// ramp-up.
    pub async fn degrade_selector(&self, id: &str, error: Option<&str>) -> Result<()> {
        let mut by_type = self.by_type.write().await;

        let Some(candidate) = find_mut(&mut by_type, id) else {
            warn!("degrade_selector: unknown candidate id {}", id);
            return Ok(());
        };
        if candidate.is_retired() {
            warn!("degrade_selector: candidate {} is retired, ignoring", id);
            return Ok(());
        }

        candidate.failure_count += 1;
        candidate.last_failure = Some(Utc::now());
        candidate.confidence = (candidate.confidence - self.config.degrade_step).max(0.0);

        if candidate.confidence < self.config.retire_confidence
            && candidate.failure_count > self.config.retire_failures
        {
            candidate.retired_at = Some(Utc::now());
            info!(
                "Retired selector {} ('{}' for '{}') after {} failures",
                id, candidate.value, candidate.element_type, candidate.failure_count
            );
        }

        let updated = candidate.clone();
        self.store.upsert(&updated).await?;
        self.store
            .append_interaction(id, InteractionAction::Failure, 0.0, error)
            .await?;

        Ok(())
    }

    /// Look up a candidate by id (introspection; includes retired ones)
    pub async fn get(&self, id: &str) -> Option<SelectorCandidate> {
        let by_type = self.by_type.read().await;
        by_type
            .values()
            .flat_map(|group| group.iter())
            .find(|c| c.id == id)
            .cloned()
    }

    /// Element types currently known to the bank
    pub async fn element_types(&self) -> Vec<String> {
        let by_type = self.by_type.read().await;
        let mut types: Vec<String> = by_type.keys().cloned().collect();
        types.sort();
        types
    }

    /// Total candidates held in memory, retired ones included
    pub async fn len(&self) -> usize {
        let by_type = self.by_type.read().await;
        by_type.values().map(|group| group.len()).sum()
    }

    /// Whether the bank holds no candidates
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop the in-memory grouping; the store is untouched
    ///
    /// Test isolation hook: a subsequent `load()` restores from disk.
    pub async fn clear(&self) {
        self.by_type.write().await.clear();
    }
}

fn find_mut<'a>(
    by_type: &'a mut HashMap<String, Vec<SelectorCandidate>>,
    id: &str,
) -> Option<&'a mut SelectorCandidate> {
    by_type
        .values_mut()
        .flat_map(|group| group.iter_mut())
        .find(|c| c.id == id)
}
