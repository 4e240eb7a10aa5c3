//! SQLite backend for the selector store
//!
//! Two relations: `selectors` (one row per candidate, mutable, upserted by
//! id) and `selector_history` (append-only, never updated). Rows must round
//! trip exactly; a row that fails to parse is a hard error, not a default —
//! a bank silently missing candidates would misrank everything after it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{InteractionRecord, SelectorCandidate};
use crate::types::{InteractionAction, Strategy, UiContext};

/// SQLite-backed candidate store
pub struct SelectorStore {
    conn: Arc<Mutex<Connection>>,
}

impl SelectorStore {
    /// Open (or create) the store at the given path
    ///
    /// Fails loudly when the database cannot be opened or the schema cannot
    /// be created; the rest of the system cannot run without a loadable bank.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open selector store at {}", path.display()))?;

        // WAL keeps frequent feedback writes from blocking concurrent reads
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::init_schema(&conn).context("Failed to initialize selector store schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, for tests and dry-runs
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(r#"
            -- One row per candidate; mutable fields replaced wholesale on upsert
            CREATE TABLE IF NOT EXISTS selectors (
                id TEXT PRIMARY KEY,
                element_type TEXT NOT NULL,
                strategy TEXT NOT NULL,
                value TEXT NOT NULL,
                confidence REAL NOT NULL,
                success_count INTEGER NOT NULL DEFAULT 0,
                failure_count INTEGER NOT NULL DEFAULT 0,
                last_success TEXT,
                last_failure TEXT,
                avg_response_time REAL NOT NULL DEFAULT 0,
                ui_context TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                retired_at TEXT
            );

            -- Append-only feedback trail; rows are never updated or deleted
            CREATE TABLE IF NOT EXISTS selector_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                selector_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                action TEXT NOT NULL,
                response_time REAL NOT NULL DEFAULT 0,
                error_message TEXT,
                FOREIGN KEY (selector_id) REFERENCES selectors(id)
            );

            CREATE INDEX IF NOT EXISTS idx_selectors_element_type ON selectors(element_type);
            CREATE INDEX IF NOT EXISTS idx_selectors_confidence ON selectors(confidence DESC);
            CREATE INDEX IF NOT EXISTS idx_history_selector ON selector_history(selector_id);
        "#)?;

        Ok(())
    }

    /// Load every non-retired candidate, oldest first
    ///
    /// Called once at process start. Insertion order matters: ranking ties
    /// are broken by it.
    pub async fn load_active(&self) -> Result<Vec<SelectorCandidate>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare_cached(
            "SELECT id, element_type, strategy, value, confidence, success_count,
                    failure_count, last_success, last_failure, avg_response_time,
                    ui_context, generated_at, retired_at
             FROM selectors
             WHERE retired_at IS NULL
             ORDER BY generated_at, id",
        )?;

        let candidates = stmt
            .query_map([], candidate_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Malformed candidate row in selector store")?;

        Ok(candidates)
    }

    /// Load every candidate, retired ones included (audit surface)
    pub async fn load_all(&self) -> Result<Vec<SelectorCandidate>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare_cached(
            "SELECT id, element_type, strategy, value, confidence, success_count,
                    failure_count, last_success, last_failure, avg_response_time,
                    ui_context, generated_at, retired_at
             FROM selectors
             ORDER BY generated_at, id",
        )?;

        let candidates = stmt
            .query_map([], candidate_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Malformed candidate row in selector store")?;

        Ok(candidates)
    }

    /// Idempotent write by id; replaces all mutable fields
    pub async fn upsert(&self, candidate: &SelectorCandidate) -> Result<()> {
        let conn = self.conn.lock().await;

        let ui_context = serde_json::to_string(&candidate.ui_context)?;

        conn.execute(
            r#"INSERT OR REPLACE INTO selectors
               (id, element_type, strategy, value, confidence, success_count,
                failure_count, last_success, last_failure, avg_response_time,
                ui_context, generated_at, retired_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"#,
            params![
                candidate.id,
                candidate.element_type,
                candidate.strategy.as_str(),
                candidate.value,
                candidate.confidence,
                candidate.success_count,
                candidate.failure_count,
                candidate.last_success.map(|d| d.to_rfc3339()),
                candidate.last_failure.map(|d| d.to_rfc3339()),
                candidate.avg_response_time,
                ui_context,
                candidate.generated_at.to_rfc3339(),
                candidate.retired_at.map(|d| d.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    /// Append one interaction fact; never touches prior rows
    pub async fn append_interaction(
        &self,
        selector_id: &str,
        action: InteractionAction,
        response_time: f64,
        error_message: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            r#"INSERT INTO selector_history
               (selector_id, timestamp, action, response_time, error_message)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                selector_id,
                Utc::now().to_rfc3339(),
                action.as_str(),
                response_time,
                error_message,
            ],
        )?;

        Ok(())
    }

    /// Load a single candidate by id
    pub async fn get(&self, id: &str) -> Result<Option<SelectorCandidate>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare_cached(
            "SELECT id, element_type, strategy, value, confidence, success_count,
                    failure_count, last_success, last_failure, avg_response_time,
                    ui_context, generated_at, retired_at
             FROM selectors WHERE id = ?1",
        )?;

        let candidate = stmt
            .query_row(params![id], candidate_from_row)
            .optional()
            .context("Malformed candidate row in selector store")?;

        Ok(candidate)
    }

    /// Recent interaction history for one candidate, newest first
    pub async fn history(&self, selector_id: &str, limit: usize) -> Result<Vec<InteractionRecord>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare_cached(
            "SELECT id, selector_id, timestamp, action, response_time, error_message
             FROM selector_history
             WHERE selector_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let records = stmt
            .query_map(params![selector_id, limit], interaction_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Malformed history row in selector store")?;

        Ok(records)
    }

    /// Aggregate counts for the stats surface
    pub async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock().await;

        let active: i64 = conn.query_row(
            "SELECT COUNT(*) FROM selectors WHERE retired_at IS NULL",
            [],
            |row| row.get(0),
        )?;

        let retired: i64 = conn.query_row(
            "SELECT COUNT(*) FROM selectors WHERE retired_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let element_types: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT element_type) FROM selectors",
            [],
            |row| row.get(0),
        )?;

        let interactions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM selector_history",
            [],
            |row| row.get(0),
        )?;

        Ok(StoreStats {
            active_candidates: active as usize,
            retired_candidates: retired as usize,
            element_types: element_types as usize,
            interactions: interactions as usize,
        })
    }
}

/// Candidate store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub active_candidates: usize,
    pub retired_candidates: usize,
    pub element_types: usize,
    pub interactions: usize,
}

// --- Row mapping ---
//
// Parse failures are surfaced through rusqlite's conversion error so the
// whole load fails, per the hard-error policy for corrupt persisted state.

fn candidate_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SelectorCandidate> {
    let strategy_str: String = row.get(2)?;
    let last_success_str: Option<String> = row.get(7)?;
    let last_failure_str: Option<String> = row.get(8)?;
    let ui_context_json: String = row.get(10)?;
    let generated_at_str: String = row.get(11)?;
    let retired_at_str: Option<String> = row.get(12)?;

    Ok(SelectorCandidate {
        id: row.get(0)?,
        element_type: row.get(1)?,
        strategy: Strategy::from_str(&strategy_str)
            .map_err(|e| conversion_error(2, e))?,
        value: row.get(3)?,
        confidence: row.get(4)?,
        success_count: row.get::<_, i64>(5)? as u32,
        failure_count: row.get::<_, i64>(6)? as u32,
        last_success: parse_opt_timestamp(7, last_success_str)?,
        last_failure: parse_opt_timestamp(8, last_failure_str)?,
        avg_response_time: row.get(9)?,
        ui_context: serde_json::from_str::<UiContext>(&ui_context_json)
            .map_err(|e| conversion_error(10, e))?,
        generated_at: parse_timestamp(11, &generated_at_str)?,
        retired_at: parse_opt_timestamp(12, retired_at_str)?,
    })
}

fn interaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InteractionRecord> {
    let timestamp_str: String = row.get(2)?;
    let action_str: String = row.get(3)?;

    Ok(InteractionRecord {
        id: row.get(0)?,
        selector_id: row.get(1)?,
        timestamp: parse_timestamp(2, &timestamp_str)?,
        action: InteractionAction::from_str(&action_str)
            .map_err(|e| conversion_error(3, e))?,
        response_time: row.get(4)?,
        error_message: row.get(5)?,
    })
}

fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_opt_timestamp(idx: usize, s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_timestamp(idx, &s)).transpose()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_candidate() -> SelectorCandidate {
        SelectorCandidate::new(
            "activity_card",
            Strategy::Css,
            ".card.daily",
            UiContext::desktop("https://dashboard.example.com"),
            50.0,
        )
    }

    #[tokio::test]
    async fn test_upsert_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = SelectorStore::new(dir.path().join("test.db")).await.unwrap();

        let mut candidate = sample_candidate();
        candidate.confidence = 72.5;
        candidate.success_count = 3;
        candidate.avg_response_time = 133.25;
        candidate.last_success = Some(Utc::now());

        store.upsert(&candidate).await.unwrap();

        let loaded = store.load_active().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, candidate.id);
        assert_eq!(loaded[0].confidence, 72.5);
        assert_eq!(loaded[0].success_count, 3);
        assert_eq!(loaded[0].avg_response_time, 133.25);
        assert_eq!(loaded[0].last_success, candidate.last_success);
        assert_eq!(loaded[0].ui_context, candidate.ui_context);
        assert_eq!(loaded[0].generated_at, candidate.generated_at);
    }

    #[tokio::test]
    async fn test_retired_candidates_excluded_from_active_load() {
        let store = SelectorStore::in_memory().await.unwrap();

        let mut retired = sample_candidate();
        retired.retired_at = Some(Utc::now());
        store.upsert(&retired).await.unwrap();
        store.upsert(&sample_candidate()).await.unwrap();

        assert_eq!(store.load_active().await.unwrap().len(), 1);
        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_history_appends_and_reads_back() {
        let store = SelectorStore::in_memory().await.unwrap();
        let candidate = sample_candidate();
        store.upsert(&candidate).await.unwrap();

        store
            .append_interaction(&candidate.id, InteractionAction::Success, 120.0, None)
            .await
            .unwrap();
        store
            .append_interaction(
                &candidate.id,
                InteractionAction::Failure,
                0.0,
                Some("probe timed out"),
            )
            .await
            .unwrap();

        let history = store.history(&candidate.id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        // newest first
        assert_eq!(history[0].action, InteractionAction::Failure);
        assert_eq!(history[0].error_message.as_deref(), Some("probe timed out"));
        assert_eq!(history[1].action, InteractionAction::Success);
        assert_eq!(history[1].response_time, 120.0);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = SelectorStore::in_memory().await.unwrap();
        let candidate = sample_candidate();
        store.upsert(&candidate).await.unwrap();
        store
            .append_interaction(&candidate.id, InteractionAction::Success, 50.0, None)
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.active_candidates, 1);
        assert_eq!(stats.retired_candidates, 0);
        assert_eq!(stats.element_types, 1);
        assert_eq!(stats.interactions, 1);
    }
}
