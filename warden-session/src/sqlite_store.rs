//! SQLite-backed `SessionBlobStore`. Opens a fresh connection per call and
//! runs on `spawn_blocking` rather than holding a shared connection lock: blob
//! writes can run into the low megabytes, and the store must not stall the
//! Request Store's small-field queries (spec §4.C).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use warden_types::{AgentSession, RequestId};

use crate::error::SessionError;
use crate::trait_def::SessionBlobStore;

pub struct SqliteSessionBlobStore {
    db_path: PathBuf,
}

fn open(db_path: &Path) -> Result<rusqlite::Connection, SessionError> {
    let conn =
        rusqlite::Connection::open(db_path).map_err(|e| SessionError::Storage(e.to_string()))?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            request_id TEXT NOT NULL,
            session_id TEXT NOT NULL,
            agent_kind TEXT NOT NULL,
            payload BLOB NOT NULL,
            uncompressed_size INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            PRIMARY KEY (request_id, session_id)
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_request_created
            ON sessions(request_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
    )
    .map_err(|e| SessionError::Storage(e.to_string()))?;
    Ok(conn)
}

impl SqliteSessionBlobStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let db_path = path.as_ref().to_path_buf();
        open(&db_path)?;
        Ok(Self { db_path })
    }
}

#[async_trait]
impl SessionBlobStore for SqliteSessionBlobStore {
    async fn put(
        &self,
        request_id: &RequestId,
        session_id: &str,
        agent_kind: &str,
        compressed_bytes: Vec<u8>,
        uncompressed_size: usize,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let db_path = self.db_path.clone();
        let request_id = request_id.clone();
        let session_id = session_id.to_string();
        let agent_kind = agent_kind.to_string();
        let created_at = Utc::now();

        tokio::task::spawn_blocking(move || -> Result<(), SessionError> {
            let conn = open(&db_path)?;
            conn.execute(
                "INSERT OR REPLACE INTO sessions \
                 (request_id, session_id, agent_kind, payload, uncompressed_size, created_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    request_id,
                    session_id,
                    agent_kind,
                    compressed_bytes,
                    uncompressed_size as i64,
                    created_at.to_rfc3339(),
                    expires_at.to_rfc3339(),
                ],
            )
            .map_err(|e| SessionError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
    }

    async fn get_latest(&self, request_id: &RequestId) -> Result<Option<AgentSession>, SessionError> {
        let db_path = self.db_path.clone();
        let request_id = request_id.clone();

        tokio::task::spawn_blocking(move || -> Result<Option<AgentSession>, SessionError> {
            let conn = open(&db_path)?;
            conn.query_row(
                "SELECT request_id, agent_kind, session_id, payload, uncompressed_size, created_at, expires_at \
                 FROM sessions WHERE request_id = ?1 ORDER BY created_at DESC LIMIT 1",
                params![request_id],
                |row| {
                    let uncompressed_size: i64 = row.get(4)?;
                    let created_at: String = row.get(5)?;
                    let expires_at: String = row.get(6)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        uncompressed_size,
                        created_at,
                        expires_at,
                    ))
                },
            )
            .optional()
            .map_err(|e| SessionError::Storage(e.to_string()))?
            .map(
                |(request_id, agent_kind, session_id, payload, uncompressed_size, created_at, expires_at)| {
                    Ok(AgentSession {
                        request_id,
                        agent_kind,
                        session_id,
                        payload,
                        uncompressed_size: uncompressed_size as usize,
                        created_at: created_at
                            .parse()
                            .map_err(|e: chrono::ParseError| SessionError::Storage(e.to_string()))?,
                        expires_at: expires_at
                            .parse()
                            .map_err(|e: chrono::ParseError| SessionError::Storage(e.to_string()))?,
                    })
                },
            )
            .transpose()
        })
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, SessionError> {
            let conn = open(&db_path)?;
            let deleted = conn
                .execute(
                    "DELETE FROM sessions WHERE expires_at <= ?1",
                    params![now.to_rfc3339()],
                )
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            Ok(deleted as u64)
        })
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tmp_store() -> SqliteSessionBlobStore {
        let file = tempfile::NamedTempFile::new().unwrap();
        SqliteSessionBlobStore::new(file.path()).unwrap()
    }

    /// **Scenario**: `get_latest` returns the most recently put session for a request.
    #[tokio::test]
    async fn put_then_get_latest_round_trips() {
        let store = tmp_store();
        let now = Utc::now();
        store
            .put(&"req-1".to_string(), "sess-a", "claude-code", vec![1, 2, 3], 10, now + Duration::days(7))
            .await
            .unwrap();
        store
            .put(&"req-1".to_string(), "sess-b", "claude-code", vec![4, 5, 6, 7], 20, now + Duration::days(7))
            .await
            .unwrap();

        let latest = store.get_latest(&"req-1".to_string()).await.unwrap().unwrap();
        assert_eq!(latest.session_id, "sess-b");
        assert_eq!(latest.payload, vec![4, 5, 6, 7]);
        assert_eq!(latest.uncompressed_size, 20);
    }

    /// **Scenario**: an unknown request has no session.
    #[tokio::test]
    async fn get_latest_on_unknown_request_is_none() {
        let store = tmp_store();
        assert!(store.get_latest(&"nope".to_string()).await.unwrap().is_none());
    }

    /// **Scenario**: `delete_expired` removes only rows whose `expires_at` has passed.
    #[tokio::test]
    async fn delete_expired_prunes_past_ttl_rows() {
        let store = tmp_store();
        let now = Utc::now();
        store
            .put(&"req-expired".to_string(), "s1", "claude-code", vec![1], 1, now - Duration::seconds(1))
            .await
            .unwrap();
        store
            .put(&"req-live".to_string(), "s2", "claude-code", vec![2], 1, now + Duration::days(1))
            .await
            .unwrap();

        let deleted = store.delete_expired(now).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store
            .get_latest(&"req-expired".to_string())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .get_latest(&"req-live".to_string())
            .await
            .unwrap()
            .is_some());
    }
}
