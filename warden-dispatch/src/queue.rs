//! Durable, at-least-once work queue (spec §4.H). SQLite-backed, following
//! this workspace's convention of a `Mutex<Connection>` with blocking calls
//! offloaded to `spawn_blocking`.
//!
//! A message becomes visible to consumers when `visible_at <= now`. `pop`
//! atomically claims the oldest visible message by bumping `visible_at` past
//! a lease window, so a crashed worker's in-flight message becomes visible
//! again instead of being lost (the at-least-once guarantee spec §4.H
//! requires). `ack` deletes it; `nack` reschedules it at a caller-supplied
//! `visible_at` with an incremented attempt count; `dead_letter` moves it to
//! a separate table for operator inspection.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::message::{DispatchMessage, QueueEnvelope};

/// Lease window: how long a popped message stays invisible to other
/// consumers before it's eligible to be re-popped (crash recovery).
const LEASE_SECS: i64 = 120;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait Queue: Send + Sync {
    async fn enqueue(&self, message: DispatchMessage) -> Result<i64, QueueError>;

    /// Enqueues with a caller-chosen visibility time (used to schedule a
    /// retry after backoff).
    async fn enqueue_at(
        &self,
        message: DispatchMessage,
        visible_at: DateTime<Utc>,
    ) -> Result<i64, QueueError>;

    /// Pops the oldest currently-visible message, if any, leasing it so it
    /// won't be re-popped until the lease expires.
    async fn pop(&self) -> Result<Option<QueueEnvelope>, QueueError>;

    async fn ack(&self, id: i64) -> Result<(), QueueError>;

    /// Reschedules the message for retry at `next_visible_at`, incrementing
    /// its attempt counter.
    async fn nack(&self, id: i64, next_visible_at: DateTime<Utc>) -> Result<(), QueueError>;

    /// Moves the message to the dead-letter table (spec §4.H "DLQ").
    async fn dead_letter(&self, id: i64, reason: &str) -> Result<(), QueueError>;

    async fn dead_letter_count(&self) -> Result<u64, QueueError>;
}

pub struct SqliteQueue {
    db: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteQueue {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn =
            rusqlite::Connection::open(&path).map_err(|e| QueueError::Storage(e.to_string()))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                visible_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_queue_visible_at ON queue(visible_at);
            CREATE TABLE IF NOT EXISTS dead_letters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                attempts INTEGER NOT NULL,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sequence_counter (n INTEGER NOT NULL);
            "#,
        )
        .map_err(|e| QueueError::Storage(e.to_string()))?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn next_sequence(conn: &rusqlite::Connection) -> Result<i64, QueueError> {
        conn.execute(
            "UPDATE sequence_counter SET n = n + 1",
            [],
        )
        .map_err(|e| QueueError::Storage(e.to_string()))?;
        let updated = conn.changes();
        if updated == 0 {
            conn.execute("INSERT INTO sequence_counter(n) VALUES (1)", [])
                .map_err(|e| QueueError::Storage(e.to_string()))?;
            return Ok(1);
        }
        conn.query_row("SELECT n FROM sequence_counter", [], |r| r.get(0))
            .map_err(|e| QueueError::Storage(e.to_string()))
    }
}

#[async_trait]
impl Queue for SqliteQueue {
    async fn enqueue(&self, message: DispatchMessage) -> Result<i64, QueueError> {
        self.enqueue_at(message, Utc::now()).await
    }

    async fn enqueue_at(
        &self,
        message: DispatchMessage,
        visible_at: DateTime<Utc>,
    ) -> Result<i64, QueueError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            let payload = serde_json::to_string(&message)
                .map_err(|e| QueueError::Serialization(e.to_string()))?;
            let seq = SqliteQueue::next_sequence(&conn)?;
            conn.execute(
                "INSERT INTO queue(payload, sequence, attempts, visible_at, created_at) VALUES (?1, ?2, 0, ?3, ?4)",
                params![payload, seq, visible_at.to_rfc3339(), Utc::now().to_rfc3339()],
            )
            .map_err(|e| QueueError::Storage(e.to_string()))?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }

    async fn pop(&self) -> Result<Option<QueueEnvelope>, QueueError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            let now = Utc::now();
            let row: Option<(i64, String, i64, u32)> = conn
                .query_row(
                    "SELECT id, payload, sequence, attempts FROM queue WHERE visible_at <= ?1 ORDER BY sequence ASC LIMIT 1",
                    params![now.to_rfc3339()],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )
                .optional()
                .map_err(|e| QueueError::Storage(e.to_string()))?;

            let Some((id, payload, sequence, attempts)) = row else {
                return Ok(None);
            };

            let leased_until = now + chrono::Duration::seconds(LEASE_SECS);
            conn.execute(
                "UPDATE queue SET visible_at = ?1 WHERE id = ?2",
                params![leased_until.to_rfc3339(), id],
            )
            .map_err(|e| QueueError::Storage(e.to_string()))?;

            let message: DispatchMessage = serde_json::from_str(&payload)
                .map_err(|e| QueueError::Serialization(e.to_string()))?;
            Ok(Some(QueueEnvelope {
                id,
                message,
                sequence,
                attempts,
            }))
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }

    async fn ack(&self, id: i64) -> Result<(), QueueError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            conn.execute("DELETE FROM queue WHERE id = ?1", params![id])
                .map_err(|e| QueueError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }

    async fn nack(&self, id: i64, next_visible_at: DateTime<Utc>) -> Result<(), QueueError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            conn.execute(
                "UPDATE queue SET attempts = attempts + 1, visible_at = ?1 WHERE id = ?2",
                params![next_visible_at.to_rfc3339(), id],
            )
            .map_err(|e| QueueError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }

    async fn dead_letter(&self, id: i64, reason: &str) -> Result<(), QueueError> {
        let db = self.db.clone();
        let reason = reason.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            let row: Option<(String, u32)> = conn
                .query_row(
                    "SELECT payload, attempts FROM queue WHERE id = ?1",
                    params![id],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()
                .map_err(|e| QueueError::Storage(e.to_string()))?;
            let Some((payload, attempts)) = row else {
                return Ok(());
            };
            conn.execute(
                "INSERT INTO dead_letters(payload, attempts, reason, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![payload, attempts, reason, Utc::now().to_rfc3339()],
            )
            .map_err(|e| QueueError::Storage(e.to_string()))?;
            conn.execute("DELETE FROM queue WHERE id = ?1", params![id])
                .map_err(|e| QueueError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }

    async fn dead_letter_count(&self) -> Result<u64, QueueError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap();
            conn.query_row("SELECT COUNT(*) FROM dead_letters", [], |r| {
                let n: i64 = r.get(0)?;
                Ok(n as u64)
            })
            .map_err(|e| QueueError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| QueueError::Storage(e.to_string()))?
    }
}
