//! Persistent storage for selector candidates and interaction history
//!
//! Provides:
//! - SQLite-based candidate persistence surviving process restarts
//! - An append-only interaction history for audit and debugging
//! - Exact field fidelity on load (confidence, timestamps, context blob)
//!
//! The interaction history is write-only from the bank's perspective;
//! ranking never reads it back. Only the running confidence scalar ranks.

pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{InteractionAction, Strategy, UiContext};

pub use sqlite::{SelectorStore, StoreStats};

/// A single hypothesis for how to locate a logical UI element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorCandidate {
    /// Unique candidate ID, assigned at creation, immutable
    pub id: String,
    /// Logical role this candidate locates (e.g. "activity_card")
    pub element_type: String,
    /// Locating technique
    pub strategy: Strategy,
    /// Raw locating expression; normalized at use-time, not at storage-time
    pub value: String,
    /// Trust score in [0, 100]; mutated only by the feedback loop
    pub confidence: f64,
    /// Successful resolutions, monotonically increasing
    pub success_count: u32,
    /// Failed resolutions, monotonically increasing
    pub failure_count: u32,
    /// When this candidate last resolved successfully
    pub last_success: Option<DateTime<Utc>>,
    /// When this candidate last failed to resolve
    pub last_failure: Option<DateTime<Utc>>,
    /// Running mean resolution latency in milliseconds, successes only
    pub avg_response_time: f64,
    /// Environment snapshot the candidate was generated for; never updated
    pub ui_context: UiContext,
    /// Creation timestamp, immutable
    pub generated_at: DateTime<Utc>,
    /// Set once when the candidate is retired; terminal, never cleared
    pub retired_at: Option<DateTime<Utc>>,
}

impl SelectorCandidate {
    /// Create a fresh candidate with zeroed counters
    pub fn new(
        element_type: &str,
        strategy: Strategy,
        value: &str,
        ui_context: UiContext,
        confidence: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            element_type: element_type.to_string(),
            strategy,
            value: value.to_string(),
            confidence,
            success_count: 0,
            failure_count: 0,
            last_success: None,
            last_failure: None,
            avg_response_time: 0.0,
            ui_context,
            generated_at: Utc::now(),
            retired_at: None,
        }
    }

    /// Whether this candidate has been permanently excluded from ranking
    pub fn is_retired(&self) -> bool {
        self.retired_at.is_some()
    }
}

/// One append-only feedback fact about a candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Row id, assigned by the store
    pub id: i64,
    /// Candidate this fact belongs to
    pub selector_id: String,
    /// When the attempt happened
    pub timestamp: DateTime<Utc>,
    /// Success or failure
    pub action: InteractionAction,
    /// Resolution latency in milliseconds (0 for batch queries)
    pub response_time: f64,
    /// Probe error text, when the attempt failed with one
    pub error_message: Option<String>,
}
