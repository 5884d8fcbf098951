//! SQLite-backed conversation log. Persistent across process restarts.
//!
//! Follows the same shape as the rest of this workspace's SQLite-backed
//! stores: a single table, `rusqlite::Connection` opened per blocking call,
//! work offloaded to `spawn_blocking` so the async runtime is never stalled
//! on file I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::debug;
use warden_types::{Message, MessageMetadata, MessageSource, MessageType, RequestId};

use crate::error::LogError;
use crate::trait_def::{ConversationLog, CostAndDuration};

pub struct SqliteConversationLog {
    db_path: PathBuf,
}

fn open(db_path: &Path) -> Result<rusqlite::Connection, LogError> {
    let conn = rusqlite::Connection::open(db_path).map_err(|e| LogError::Storage(e.to_string()))?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            request_id TEXT NOT NULL,
            message_type TEXT NOT NULL,
            source TEXT NOT NULL,
            content TEXT NOT NULL,
            actor_id TEXT,
            actor_name TEXT,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL,
            seq INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_request_id_seq ON messages(request_id, seq);
        "#,
    )
    .map_err(|e| LogError::Storage(e.to_string()))?;
    Ok(conn)
}

fn message_type_str(t: MessageType) -> String {
    serde_json::to_value(t)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}

fn message_type_from_str(s: &str) -> Result<MessageType, LogError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| LogError::Serialization(e.to_string()))
}

fn source_str(s: MessageSource) -> String {
    serde_json::to_value(s)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "system".to_string())
}

fn source_from_str(s: &str) -> Result<MessageSource, LogError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| LogError::Serialization(e.to_string()))
}

impl SqliteConversationLog {
    /// Opens or creates the database and tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let db_path = path.as_ref().to_path_buf();
        open(&db_path)?;
        Ok(Self { db_path })
    }
}

#[async_trait]
impl ConversationLog for SqliteConversationLog {
    async fn append(
        &self,
        request_id: &RequestId,
        message_type: MessageType,
        source: MessageSource,
        content: &str,
        actor_id: Option<&str>,
        actor_name: Option<&str>,
        metadata: MessageMetadata,
    ) -> Result<String, LogError> {
        let id = uuid::Uuid::new_v4().to_string();
        let request_id = request_id.clone();
        let content = content.to_string();
        let actor_id = actor_id.map(String::from);
        let actor_name = actor_name.map(String::from);
        let metadata_json =
            serde_json::to_string(&metadata).map_err(|e| LogError::Serialization(e.to_string()))?;
        let created_at = Utc::now();
        let db_path = self.db_path.clone();
        let id_for_return = id.clone();

        tokio::task::spawn_blocking(move || -> Result<(), LogError> {
            let conn = open(&db_path)?;
            let seq: i64 = conn
                .query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE request_id = ?1",
                    params![request_id],
                    |row| row.get(0),
                )
                .map_err(|e| LogError::Storage(e.to_string()))?;
            conn.execute(
                r#"
                INSERT INTO messages
                (id, request_id, message_type, source, content, actor_id, actor_name, metadata, created_at, seq)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    id,
                    request_id,
                    message_type_str(message_type),
                    source_str(source),
                    content,
                    actor_id,
                    actor_name,
                    metadata_json,
                    created_at.to_rfc3339(),
                    seq,
                ],
            )
            .map_err(|e| LogError::Storage(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| LogError::Storage(e.to_string()))??;

        debug!(message_id = %id_for_return, message_type = %message_type_str_for_log(message_type), "appended log message");
        Ok(id_for_return)
    }

    async fn thread(
        &self,
        request_id: &RequestId,
        before_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, LogError> {
        let request_id = request_id.clone();
        let before_id = before_id.map(String::from);
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Message>, LogError> {
            let conn = open(&db_path)?;
            let before_seq: Option<i64> = match &before_id {
                Some(id) => Some(
                    conn.query_row(
                        "SELECT seq FROM messages WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .map_err(|e| LogError::Storage(e.to_string()))?,
                ),
                None => None,
            };

            let mut sql = String::from(
                "SELECT id, request_id, message_type, source, content, actor_id, actor_name, metadata, created_at
                 FROM messages WHERE request_id = ?1",
            );
            if before_seq.is_some() {
                sql.push_str(" AND seq < ?2");
            }
            sql.push_str(" ORDER BY seq ASC");

            let mut stmt = conn.prepare(&sql).map_err(|e| LogError::Storage(e.to_string()))?;
            let rows = if let Some(seq) = before_seq {
                stmt.query_map(params![request_id, seq], row_to_message)
            } else {
                stmt.query_map(params![request_id], row_to_message)
            }
            .map_err(|e| LogError::Storage(e.to_string()))?;

            let mut messages = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| LogError::Storage(e.to_string()))?
                .into_iter()
                .collect::<Result<Vec<Message>, LogError>>()?;

            if let Some(n) = limit {
                messages.truncate(n);
            }
            Ok(messages)
        })
        .await
        .map_err(|e| LogError::Storage(e.to_string()))?
    }

    async fn total_cost_and_duration(
        &self,
        request_id: &RequestId,
    ) -> Result<CostAndDuration, LogError> {
        let messages = self.thread(request_id, None, None).await?;
        Ok(messages.iter().fold(CostAndDuration::default(), |acc, m| {
            CostAndDuration {
                cost_cents: acc.cost_cents + m.metadata.cost_cents.unwrap_or(0),
                duration_ms: acc.duration_ms + m.metadata.duration_ms.unwrap_or(0),
            }
        }))
    }
}

type RawRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Result<Message, LogError>> {
    let raw: RawRow = (
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    );
    Ok(decode_row(raw))
}

fn decode_row(raw: RawRow) -> Result<Message, LogError> {
    let (id, request_id, message_type, source, content, actor_id, actor_name, metadata, created_at) =
        raw;
    let message_type = message_type_from_str(&message_type)?;
    let source = source_from_str(&source)?;
    let metadata: MessageMetadata =
        serde_json::from_str(&metadata).map_err(|e| LogError::Serialization(e.to_string()))?;
    let created_at: DateTime<Utc> = created_at
        .parse()
        .map_err(|e: chrono::ParseError| LogError::Serialization(e.to_string()))?;
    Ok(Message {
        id,
        request_id,
        message_type,
        source,
        content,
        actor_id,
        actor_name,
        metadata,
        created_at,
    })
}

fn message_type_str_for_log(t: MessageType) -> String {
    message_type_str(t)
}

pub fn shared(path: impl AsRef<Path>) -> Result<Arc<dyn ConversationLog>, LogError> {
    Ok(Arc::new(SqliteConversationLog::new(path)?))
}
