//! SQLite-backed durable match storage using sqlx.
//!
//! Rows carry the match ID, the status and participant columns used by the
//! filtered queries, and the full serialized dump as JSON. Restoration goes
//! through [`Match::restore`], so a record that no longer replays cleanly
//! surfaces as [`ArbiterError::CorruptState`] instead of crashing anything.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::ArbiterError;
use crate::game::{Match, MatchDump};
use crate::store::MatchStore;
use crate::types::game::{MatchId, MatchStatus, PlayerId};

/// Durable [`MatchStore`] backed by SQLite.
pub struct SqliteMatchStore {
    pool: SqlitePool,
}

impl SqliteMatchStore {
    /// Create a store with an existing connection pool.
    ///
    /// Call [`migrate()`](Self::migrate) before first use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) a database at the given URL,
    /// e.g. `sqlite://matches.db`.
    pub async fn connect(url: &str) -> Result<Self, ArbiterError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| persistence("invalid sqlite url", e))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| persistence("failed to open sqlite database", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection: an in-memory SQLite
    /// database lives and dies with its connection.
    pub async fn in_memory() -> Result<Self, ArbiterError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| persistence("invalid sqlite url", e))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| persistence("failed to open in-memory sqlite database", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the matches table. Safe to call multiple times.
    pub async fn migrate(&self) -> Result<(), ArbiterError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS matches (
                 id TEXT PRIMARY KEY,
                 status TEXT NOT NULL,
                 white TEXT NOT NULL,
                 black TEXT NOT NULL,
                 data TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| persistence("migration failed", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status)")
            .execute(&self.pool)
            .await
            .map_err(|e| persistence("migration failed", e))?;

        Ok(())
    }

    fn restore_row(row: &sqlx::sqlite::SqliteRow) -> Result<Match, ArbiterError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| persistence("failed to read 'id' column", e))?;
        let data: String = row
            .try_get("data")
            .map_err(|e| persistence("failed to read 'data' column", e))?;

        let dump: MatchDump =
            serde_json::from_str(&data).map_err(|e| ArbiterError::CorruptState {
                id: id.parse().unwrap_or_default(),
                reason: format!("stored payload is not valid JSON: {e}"),
            })?;
        Match::restore(dump)
    }

    /// Restore every row of a query, skipping corrupt records with a warning.
    fn restore_rows(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Match>, ArbiterError> {
        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            match Self::restore_row(row) {
                Ok(m) => matches.push(m),
                Err(e @ ArbiterError::CorruptState { .. }) => {
                    tracing::warn!("skipping corrupt record: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(matches)
    }
}

fn persistence(reason: &str, source: impl std::error::Error + Send + Sync + 'static) -> ArbiterError {
    ArbiterError::Persistence {
        reason: format!("{reason}: {source}"),
        source: Some(Box::new(source)),
    }
}

#[async_trait]
impl MatchStore for SqliteMatchStore {
    async fn save(&self, game: &Match) -> Result<(), ArbiterError> {
        let dump = game.dump();
        let data = serde_json::to_string(&dump)
            .map_err(|e| persistence("failed to serialize match", e))?;

        sqlx::query(
            "INSERT INTO matches (id, status, white, black, data, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 white = excluded.white,
                 black = excluded.black,
                 data = excluded.data,
                 updated_at = excluded.updated_at",
        )
        .bind(dump.id.to_string())
        .bind(dump.status.as_str())
        .bind(dump.white.to_string())
        .bind(dump.black.to_string())
        .bind(data)
        .bind(dump.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| persistence("save failed", e))?;

        Ok(())
    }

    async fn load(&self, id: MatchId) -> Result<Option<Match>, ArbiterError> {
        let row = sqlx::query("SELECT id, data FROM matches WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| persistence("load failed", e))?;

        match row {
            Some(row) => Ok(Some(Self::restore_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: MatchId) -> Result<bool, ArbiterError> {
        let result = sqlx::query("DELETE FROM matches WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| persistence("delete failed", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: MatchId) -> Result<bool, ArbiterError> {
        let row = sqlx::query("SELECT 1 FROM matches WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| persistence("exists failed", e))?;
        Ok(row.is_some())
    }

    async fn load_all(&self) -> Result<Vec<Match>, ArbiterError> {
        let rows = sqlx::query("SELECT id, data FROM matches ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| persistence("load_all failed", e))?;
        Self::restore_rows(&rows)
    }

    async fn load_by_status(&self, status: MatchStatus) -> Result<Vec<Match>, ArbiterError> {
        let rows = sqlx::query(
            "SELECT id, data FROM matches WHERE status = ? ORDER BY updated_at DESC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| persistence("load_by_status failed", e))?;
        Self::restore_rows(&rows)
    }

    async fn load_by_participant(&self, player: PlayerId) -> Result<Vec<Match>, ArbiterError> {
        let rows = sqlx::query(
            "SELECT id, data FROM matches WHERE white = ? OR black = ? ORDER BY updated_at DESC",
        )
        .bind(player.to_string())
        .bind(player.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| persistence("load_by_participant failed", e))?;
        Self::restore_rows(&rows)
    }

    async fn count_active(&self) -> Result<usize, ArbiterError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| persistence("count_active failed", e))?;
        Ok(count as usize)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn close(&self) -> Result<(), ArbiterError> {
        self.pool.close().await;
        Ok(())
    }
}
