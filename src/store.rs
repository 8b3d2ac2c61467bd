// src/store.rs
//
// Durable record store for canonical postings, backed by SQLite. The
// UNIQUE(source, external_id) constraint is the dedup contract: concurrent or
// repeated `insert_if_absent` calls with the same key can never create two
// rows, so callers need no external locking.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{Posting, RawPosting};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (or create) the store at the given SQLx URL, e.g.
    /// `sqlite:jobs.db?mode=rwc` or `sqlite::memory:`.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        // Single connection: SQLite serializes writes anyway, and a pool of
        // one keeps `sqlite::memory:` pointing at one database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Ephemeral in-memory store, for tests.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        Self::connect("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS postings (
                source TEXT NOT NULL,
                external_id TEXT NOT NULL,
                title TEXT NOT NULL,
                location TEXT,
                description TEXT,
                posted_at TEXT,
                url TEXT,
                discovered_at TEXT NOT NULL,
                notification_state TEXT NOT NULL DEFAULT 'pending',
                notified_at TEXT,
                PRIMARY KEY (source, external_id)
            );

            CREATE INDEX IF NOT EXISTS idx_postings_pending
                ON postings(notification_state, discovered_at);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn exists(&self, source: &str, external_id: &str) -> Result<bool, sqlx::Error> {
        let hit: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM postings WHERE source = ? AND external_id = ?",
        )
        .bind(source)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hit.is_some())
    }

    /// Insert the posting unless `(source, external_id)` is already present.
    /// A second observation of the same key is a no-op: nothing is updated
    /// and `discovered_at` keeps the value from the first insertion.
    pub async fn insert_if_absent(
        &self,
        source: &str,
        raw: &RawPosting,
        discovered_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO postings
                (source, external_id, title, location, description, posted_at, url,
                 discovered_at, notification_state)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            ON CONFLICT(source, external_id) DO NOTHING
            "#,
        )
        .bind(source)
        .bind(&raw.external_id)
        .bind(&raw.title)
        .bind(&raw.location)
        .bind(&raw.description)
        .bind(raw.posted_at)
        .bind(&raw.url)
        .bind(discovered_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    /// All postings discovered at or after `window_start` that have not been
    /// notified yet, ordered for stable digest rendering.
    pub async fn pending_since(
        &self,
        window_start: DateTime<Utc>,
    ) -> Result<Vec<Posting>, sqlx::Error> {
        sqlx::query_as::<_, Posting>(
            r#"
            SELECT source, external_id, title, location, description, posted_at, url,
                   discovered_at, notification_state, notified_at
            FROM postings
            WHERE notification_state = 'pending' AND discovered_at >= ?
            ORDER BY source, discovered_at, external_id
            "#,
        )
        .bind(window_start)
        .fetch_all(&self.pool)
        .await
    }

    /// Transition the given records `pending -> sent`. Idempotent: rows that
    /// are already sent are left untouched. Returns how many actually
    /// transitioned.
    pub async fn mark_sent(
        &self,
        keys: &[(String, String)],
        notified_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut transitioned = 0u64;
        for (source, external_id) in keys {
            let result = sqlx::query(
                r#"
                UPDATE postings
                SET notification_state = 'sent', notified_at = ?
                WHERE source = ? AND external_id = ? AND notification_state = 'pending'
                "#,
            )
            .bind(notified_at)
            .bind(source)
            .bind(external_id)
            .execute(&mut *tx)
            .await?;
            transitioned += result.rows_affected();
        }
        tx.commit().await?;
        Ok(transitioned)
    }

    /// One stored posting, if present.
    pub async fn get(
        &self,
        source: &str,
        external_id: &str,
    ) -> Result<Option<Posting>, sqlx::Error> {
        sqlx::query_as::<_, Posting>(
            r#"
            SELECT source, external_id, title, location, description, posted_at, url,
                   discovered_at, notification_state, notified_at
            FROM postings
            WHERE source = ? AND external_id = ?
            "#,
        )
        .bind(source)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
    }
}
