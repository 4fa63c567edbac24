//! SQLite store implementation

use crate::error::{StoreError, StoreResult};
use crate::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rollout_types::{
    AuthorityLevel, Issue, ModeState, QualitySample, TransitionKind, TransitionPhase,
    TransitionRecord, TransitionStatus,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

const SEALED_STATUSES: &str = "('completed', 'failed', 'rolled_back')";

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteModeStore {
    pool: SqlitePool,
}

impl SqliteModeStore {
    /// Connect to SQLite and initialize schema
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .create_if_missing(true);

        // An in-memory database lives only as long as its connection.
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { max_connections.max(1) })
            .acquire_timeout(Duration::from_secs(5));
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.initialize_schema().await?;
        debug!(url = %url, "SQLite mode store ready");
        Ok(store)
    }

    /// Open or create a database file
    pub async fn open(path: &Path) -> StoreResult<Self> {
        Self::connect(&format!("sqlite://{}", path.display()), 4).await
    }

    /// Private in-memory database
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Underlying pool, shared with components that own other tables
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_schema(&self) -> StoreResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS mode_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                current_level TEXT NOT NULL DEFAULT 'observing',
                transition_phase TEXT NOT NULL DEFAULT 'stable',
                transition_attempts INTEGER NOT NULL DEFAULT 0,
                last_attempt_at TEXT,
                last_quality_check TEXT,
                stability_start TEXT,
                configuration_snapshot TEXT NOT NULL DEFAULT 'null',
                updated_at TEXT NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS mode_transitions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                from_level TEXT NOT NULL,
                to_level TEXT NOT NULL,
                transition_kind TEXT NOT NULL,
                trigger_reason TEXT NOT NULL,
                quality_score REAL NOT NULL DEFAULT 0,
                dependent_success_rate REAL NOT NULL DEFAULT 0,
                initiated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                completed_at TEXT,
                status TEXT NOT NULL,
                validation_results TEXT NOT NULL DEFAULT '[]',
                rollback_reason TEXT,
                attempt_number INTEGER NOT NULL DEFAULT 1
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS mode_transitions_initiated_at ON mode_transitions(initiated_at DESC);"#,
            r#"
            CREATE TABLE IF NOT EXISTS quality_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_at TEXT NOT NULL,
                quality REAL NOT NULL,
                coherence REAL NOT NULL,
                precision REAL NOT NULL,
                dependent_success_rate REAL NOT NULL
            );
            "#,
            r#"CREATE INDEX IF NOT EXISTS quality_metrics_recorded_at ON quality_metrics(recorded_at DESC);"#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
        }

        sqlx::query("INSERT OR IGNORE INTO mode_state (id, updated_at) VALUES (1, ?)")
            .bind(Self::encode_ts(&Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Fixed-width UTC encoding so stored timestamps order lexically
    fn encode_ts(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn decode_ts(value: &str) -> StoreResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|ts| ts.with_timezone(&Utc))
            .or_else(|_| {
                chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                    .map(|naive| naive.and_utc())
            })
            .map_err(|e| StoreError::InvalidData(format!("bad timestamp {}: {}", value, e)))
    }

    fn decode_opt_ts(value: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
        value.as_deref().map(Self::decode_ts).transpose()
    }

    fn parse<T: FromStr>(value: &str) -> StoreResult<T>
    where
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| StoreError::InvalidData(e.to_string()))
    }

    fn to_u32(value: i64, column: &str) -> StoreResult<u32> {
        u32::try_from(value)
            .map_err(|_| StoreError::InvalidData(format!("{} out of range: {}", column, value)))
    }

    fn row_to_state(row: &SqliteRow) -> StoreResult<ModeState> {
        let level: String = row.try_get("current_level")?;
        let phase: String = row.try_get("transition_phase")?;
        let attempts: i64 = row.try_get("transition_attempts")?;
        let snapshot: String = row.try_get("configuration_snapshot")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(ModeState {
            current_level: Self::parse::<AuthorityLevel>(&level)?,
            transition_phase: Self::parse::<TransitionPhase>(&phase)?,
            transition_attempts: Self::to_u32(attempts, "transition_attempts")?,
            last_attempt_at: Self::decode_opt_ts(row.try_get("last_attempt_at")?)?,
            last_quality_check: Self::decode_opt_ts(row.try_get("last_quality_check")?)?,
            stability_start: Self::decode_opt_ts(row.try_get("stability_start")?)?,
            configuration_snapshot: serde_json::from_str(&snapshot)?,
            updated_at: Self::decode_ts(&updated_at)?,
        })
    }

    fn row_to_record(row: &SqliteRow) -> StoreResult<TransitionRecord> {
        let from_level: String = row.try_get("from_level")?;
        let to_level: String = row.try_get("to_level")?;
        let kind: String = row.try_get("transition_kind")?;
        let status: String = row.try_get("status")?;
        let initiated_at: String = row.try_get("initiated_at")?;
        let validation: String = row.try_get("validation_results")?;
        let attempt: i64 = row.try_get("attempt_number")?;

        Ok(TransitionRecord {
            id: row.try_get("id")?,
            from_level: Self::parse::<AuthorityLevel>(&from_level)?,
            to_level: Self::parse::<AuthorityLevel>(&to_level)?,
            kind: Self::parse::<TransitionKind>(&kind)?,
            trigger_reason: row.try_get("trigger_reason")?,
            quality_score_at_start: row.try_get("quality_score")?,
            dependent_service_success_rate: row.try_get("dependent_success_rate")?,
            initiated_at: Self::decode_ts(&initiated_at)?,
            completed_at: Self::decode_opt_ts(row.try_get("completed_at")?)?,
            status: Self::parse::<TransitionStatus>(&status)?,
            validation_snapshot: serde_json::from_str::<Vec<Issue>>(&validation)?,
            rollback_reason: row.try_get("rollback_reason")?,
            attempt_number: Self::to_u32(attempt, "attempt_number")?,
        })
    }
}

#[async_trait]
impl ModeStore for SqliteModeStore {
    async fn load_state(&self) -> StoreResult<ModeState> {
        let row = sqlx::query("SELECT * FROM mode_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_state(&row),
            None => {
                let state = ModeState::initial();
                self.save_state(&state).await?;
                Ok(state)
            }
        }
    }

    async fn save_state(&self, state: &ModeState) -> StoreResult<()> {
        let snapshot = serde_json::to_string(&state.configuration_snapshot)?;

        sqlx::query(
            r#"
            INSERT INTO mode_state (
                id, current_level, transition_phase, transition_attempts, last_attempt_at,
                last_quality_check, stability_start, configuration_snapshot, updated_at
            )
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                current_level = excluded.current_level,
                transition_phase = excluded.transition_phase,
                transition_attempts = excluded.transition_attempts,
                last_attempt_at = excluded.last_attempt_at,
                last_quality_check = excluded.last_quality_check,
                stability_start = excluded.stability_start,
                configuration_snapshot = excluded.configuration_snapshot,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(state.current_level.as_str())
        .bind(state.transition_phase.as_str())
        .bind(i64::from(state.transition_attempts))
        .bind(state.last_attempt_at.as_ref().map(Self::encode_ts))
        .bind(state.last_quality_check.as_ref().map(Self::encode_ts))
        .bind(state.stability_start.as_ref().map(Self::encode_ts))
        .bind(snapshot)
        .bind(Self::encode_ts(&state.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_transition(&self, record: &TransitionRecord) -> StoreResult<i64> {
        let validation = serde_json::to_string(&record.validation_snapshot)?;

        let result = sqlx::query(
            r#"
            INSERT INTO mode_transitions (
                from_level, to_level, transition_kind, trigger_reason, quality_score,
                dependent_success_rate, initiated_at, completed_at, status,
                validation_results, rollback_reason, attempt_number
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.from_level.as_str())
        .bind(record.to_level.as_str())
        .bind(record.kind.as_str())
        .bind(record.trigger_reason.as_str())
        .bind(record.quality_score_at_start)
        .bind(record.dependent_service_success_rate)
        .bind(Self::encode_ts(&record.initiated_at))
        .bind(record.completed_at.as_ref().map(Self::encode_ts))
        .bind(record.status.as_str())
        .bind(validation)
        .bind(record.rollback_reason.as_deref())
        .bind(i64::from(record.attempt_number))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_transition(&self, record: &TransitionRecord) -> StoreResult<()> {
        let validation = serde_json::to_string(&record.validation_snapshot)?;

        let query = format!(
            r#"
            UPDATE mode_transitions SET
                quality_score = ?,
                dependent_success_rate = ?,
                completed_at = ?,
                status = ?,
                validation_results = ?,
                rollback_reason = ?
            WHERE id = ? AND status NOT IN {}
            "#,
            SEALED_STATUSES
        );

        let result = sqlx::query(&query)
            .bind(record.quality_score_at_start)
            .bind(record.dependent_service_success_rate)
            .bind(record.completed_at.as_ref().map(Self::encode_ts))
            .bind(record.status.as_str())
            .bind(validation)
            .bind(record.rollback_reason.as_deref())
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get_transition(record.id).await? {
                Some(_) => Err(StoreError::Sealed(record.id)),
                None => Err(StoreError::NotFound(format!("transition {}", record.id))),
            };
        }

        Ok(())
    }

    async fn get_transition(&self, id: i64) -> StoreResult<Option<TransitionRecord>> {
        let row = sqlx::query("SELECT * FROM mode_transitions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn list_transitions(&self, limit: usize) -> StoreResult<Vec<TransitionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query("SELECT * FROM mode_transitions ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn record_quality_sample(&self, sample: &QualitySample) -> StoreResult<()> {
        let cutoff = sample.timestamp - sample_retention();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quality_metrics (recorded_at, quality, coherence, precision, dependent_success_rate)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Self::encode_ts(&sample.timestamp))
        .bind(sample.quality)
        .bind(sample.coherence)
        .bind(sample.precision)
        .bind(sample.dependent_service_success_rate)
        .execute(&mut *tx)
        .await?;

        let evicted = sqlx::query("DELETE FROM quality_metrics WHERE recorded_at < ?")
            .bind(Self::encode_ts(&cutoff))
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if evicted > 0 {
            debug!(evicted, "Evicted expired quality samples");
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<Duration> {
        let started = Instant::now();
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(started.elapsed())
    }
}

#[async_trait]
impl StoreDiagnostics for SqliteModeStore {
    async fn table_names(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(StoreError::from))
            .collect()
    }

    async fn row_count(&self, table: &str) -> StoreResult<Option<u64>> {
        // Only names read back from the catalogue reach the query text.
        let names = self.table_names().await?;
        let Some(name) = names.iter().find(|n| n.as_str() == table) else {
            return Ok(None);
        };

        let query = format!("SELECT COUNT(*) AS n FROM \"{}\"", name.replace('"', "\"\""));
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("n")?;
        Ok(Some(u64::try_from(count).unwrap_or(0)))
    }
}
