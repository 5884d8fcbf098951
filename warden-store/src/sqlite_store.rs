//! SQLite-backed `RequestStore`. Single table, `Mutex<Connection>` shared
//! across calls, work offloaded onto the blocking thread pool via
//! `tokio::task::block_in_place` — the same idiom the workspace/thread store
//! this crate is modeled on uses, since every call here holds the lock for a
//! single short-lived statement rather than an I/O-bound agent run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use warden_types::{
    AgentConfig, Origin, PullRequestInfo, Request, RequestId, RequestStatus, RequestType,
    SurfaceCorrelation,
};

use crate::error::StoreError;
use crate::trait_def::{NewRequest, RequestStore, StatusPatch};

pub struct SqliteRequestStore {
    db: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteRequestStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&path).map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                origin TEXT NOT NULL,
                repo TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                request_type TEXT NOT NULL,
                status TEXT NOT NULL,
                agent_kind TEXT NOT NULL,
                agent_provider TEXT,
                agent_model TEXT,
                agent_max_turns INTEGER,
                agent_timeout_secs INTEGER,
                chat_channel TEXT,
                chat_thread_key TEXT,
                chat_user_id TEXT,
                forge_repo TEXT,
                forge_issue_number INTEGER,
                forge_issue_url TEXT,
                pr_url TEXT,
                pr_number INTEGER,
                pr_branch_name TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                cost_cents INTEGER NOT NULL DEFAULT 0,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                latest_session_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                processed_at TEXT
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_forge_issue
                ON requests(forge_repo, forge_issue_number)
                WHERE forge_repo IS NOT NULL AND forge_issue_number IS NOT NULL;
            CREATE INDEX IF NOT EXISTS idx_requests_chat_thread
                ON requests(chat_channel, chat_thread_key);
            CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status);
            CREATE INDEX IF NOT EXISTS idx_requests_created_at ON requests(created_at);
            "#,
        )
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }
}

fn enum_str<T: serde::Serialize>(v: T) -> String {
    serde_json::to_value(v)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

fn enum_from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| StoreError::Storage(format!("decode {s}: {e}")))
}

fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<RawRequestRow> {
    Ok(RawRequestRow {
        id: row.get(0)?,
        origin: row.get(1)?,
        repo: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        request_type: row.get(5)?,
        status: row.get(6)?,
        agent_kind: row.get(7)?,
        agent_provider: row.get(8)?,
        agent_model: row.get(9)?,
        agent_max_turns: row.get(10)?,
        agent_timeout_secs: row.get(11)?,
        chat_channel: row.get(12)?,
        chat_thread_key: row.get(13)?,
        chat_user_id: row.get(14)?,
        forge_repo: row.get(15)?,
        forge_issue_number: row.get(16)?,
        forge_issue_url: row.get(17)?,
        pr_url: row.get(18)?,
        pr_number: row.get(19)?,
        pr_branch_name: row.get(20)?,
        retry_count: row.get(21)?,
        cost_cents: row.get(22)?,
        duration_ms: row.get(23)?,
        latest_session_id: row.get(24)?,
        created_at: row.get(25)?,
        updated_at: row.get(26)?,
        processed_at: row.get(27)?,
    })
}

struct RawRequestRow {
    id: String,
    origin: String,
    repo: String,
    title: String,
    description: String,
    request_type: String,
    status: String,
    agent_kind: String,
    agent_provider: Option<String>,
    agent_model: Option<String>,
    agent_max_turns: Option<u32>,
    agent_timeout_secs: Option<i64>,
    chat_channel: Option<String>,
    chat_thread_key: Option<String>,
    chat_user_id: Option<String>,
    forge_repo: Option<String>,
    forge_issue_number: Option<i64>,
    forge_issue_url: Option<String>,
    pr_url: Option<String>,
    pr_number: Option<i64>,
    pr_branch_name: Option<String>,
    retry_count: u32,
    cost_cents: i64,
    duration_ms: i64,
    latest_session_id: Option<String>,
    created_at: String,
    updated_at: String,
    processed_at: Option<String>,
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StoreError> {
    s.parse()
        .map_err(|e: chrono::ParseError| StoreError::Storage(e.to_string()))
}

impl TryFrom<RawRequestRow> for Request {
    type Error = StoreError;

    fn try_from(r: RawRequestRow) -> Result<Self, StoreError> {
        Ok(Request {
            id: r.id,
            origin: enum_from_str::<Origin>(&r.origin)?,
            repo: r.repo,
            title: r.title,
            description: r.description,
            request_type: enum_from_str::<RequestType>(&r.request_type)?,
            status: enum_from_str::<RequestStatus>(&r.status)?,
            agent_config: AgentConfig {
                kind: r.agent_kind,
                provider: r.agent_provider,
                model: r.agent_model,
                max_turns: r.agent_max_turns,
                timeout_secs: r.agent_timeout_secs.map(|v| v as u64),
            },
            correlation: SurfaceCorrelation {
                chat_channel: r.chat_channel,
                chat_thread_key: r.chat_thread_key,
                chat_user_id: r.chat_user_id,
                forge_repo: r.forge_repo,
                forge_issue_number: r.forge_issue_number,
                forge_issue_url: r.forge_issue_url,
            },
            pull_request: PullRequestInfo {
                url: r.pr_url,
                number: r.pr_number,
                branch_name: r.pr_branch_name,
            },
            retry_count: r.retry_count,
            cost_cents: r.cost_cents,
            duration_ms: r.duration_ms,
            latest_session_id: r.latest_session_id,
            created_at: parse_ts(&r.created_at)?,
            updated_at: parse_ts(&r.updated_at)?,
            processed_at: r.processed_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, origin, repo, title, description, request_type, status, \
    agent_kind, agent_provider, agent_model, agent_max_turns, agent_timeout_secs, \
    chat_channel, chat_thread_key, chat_user_id, forge_repo, forge_issue_number, forge_issue_url, \
    pr_url, pr_number, pr_branch_name, retry_count, cost_cents, duration_ms, latest_session_id, \
    created_at, updated_at, processed_at";

fn fetch_by_id(conn: &rusqlite::Connection, id: &str) -> Result<Request, StoreError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM requests WHERE id = ?1");
    let raw = conn
        .query_row(&sql, params![id], row_to_request)
        .optional()
        .map_err(|e| StoreError::Storage(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    raw.try_into()
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
    async fn create(&self, spec: NewRequest) -> Result<Request, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = if spec.origin == Origin::ForgeIssue {
            RequestStatus::IssueCreated
        } else {
            RequestStatus::Pending
        };
        let db = self.db.clone();

        tokio::task::block_in_place(move || -> Result<Request, StoreError> {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;

            if let (Some(repo), Some(number)) = (&spec.forge_repo, spec.forge_issue_number) {
                let exists: Option<String> = conn
                    .query_row(
                        "SELECT id FROM requests WHERE forge_repo = ?1 AND forge_issue_number = ?2",
                        params![repo, number],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
                if exists.is_some() {
                    return Err(StoreError::DuplicateForgeIssue {
                        repo: repo.clone(),
                        issue_number: number,
                    });
                }
            }

            conn.execute(
                r#"
                INSERT INTO requests (
                    id, origin, repo, title, description, request_type, status,
                    agent_kind, agent_provider, agent_model, agent_max_turns, agent_timeout_secs,
                    chat_channel, chat_thread_key, chat_user_id,
                    forge_repo, forge_issue_number, forge_issue_url,
                    retry_count, cost_cents, duration_ms,
                    created_at, updated_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                    ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15,
                    ?16, ?17, ?18,
                    0, 0, 0,
                    ?19, ?19
                )
                "#,
                params![
                    id,
                    enum_str(spec.origin),
                    spec.repo,
                    spec.title,
                    spec.description,
                    enum_str(spec.request_type),
                    enum_str(status),
                    spec.agent_config.kind,
                    spec.agent_config.provider,
                    spec.agent_config.model,
                    spec.agent_config.max_turns,
                    spec.agent_config.timeout_secs.map(|v| v as i64),
                    spec.chat_channel,
                    spec.chat_thread_key,
                    spec.chat_user_id,
                    spec.forge_repo,
                    spec.forge_issue_number,
                    spec.forge_issue_url,
                    now.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;

            fetch_by_id(&conn, &id)
        })
    }

    async fn find_by_request_id(&self, id: &RequestId) -> Result<Option<Request>, StoreError> {
        let db = self.db.clone();
        let id = id.clone();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            match fetch_by_id(&conn, &id) {
                Ok(r) => Ok(Some(r)),
                Err(StoreError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    async fn find_by_forge_issue(
        &self,
        repo: &str,
        issue_number: i64,
    ) -> Result<Option<Request>, StoreError> {
        let db = self.db.clone();
        let repo = repo.to_string();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM requests WHERE forge_repo = ?1 AND forge_issue_number = ?2"
            );
            let raw = conn
                .query_row(&sql, params![repo, issue_number], row_to_request)
                .optional()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            raw.map(TryInto::try_into).transpose()
        })
    }

    async fn find_active_in_chat_thread(
        &self,
        channel: &str,
        thread_key: &str,
    ) -> Result<Option<Request>, StoreError> {
        let db = self.db.clone();
        let channel = channel.to_string();
        let thread_key = thread_key.to_string();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM requests \
                 WHERE chat_channel = ?1 AND chat_thread_key = ?2 \
                 AND status IN ('pending', 'issue_created', 'processing', 'awaiting_clarification') \
                 ORDER BY created_at DESC LIMIT 1"
            );
            let raw = conn
                .query_row(&sql, params![channel, thread_key], row_to_request)
                .optional()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            raw.map(TryInto::try_into).transpose()
        })
    }

    async fn find_most_recent_in_chat_thread(
        &self,
        channel: &str,
        thread_key: &str,
    ) -> Result<Option<Request>, StoreError> {
        let db = self.db.clone();
        let channel = channel.to_string();
        let thread_key = thread_key.to_string();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let sql = format!(
                "SELECT {SELECT_COLUMNS} FROM requests \
                 WHERE chat_channel = ?1 AND chat_thread_key = ?2 \
                 AND status != 'completed' AND status != 'cancelled' \
                 ORDER BY created_at DESC LIMIT 1"
            );
            let raw = conn
                .query_row(&sql, params![channel, thread_key], row_to_request)
                .optional()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            raw.map(TryInto::try_into).transpose()
        })
    }

    async fn update_status(
        &self,
        id: &RequestId,
        new_status: RequestStatus,
        patch: StatusPatch,
    ) -> Result<Request, StoreError> {
        let db = self.db.clone();
        let id = id.clone();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let current = fetch_by_id(&conn, &id)?;
            if !current.status.can_transition_to(new_status) {
                return Err(StoreError::InvalidTransition {
                    from: current.status,
                    to: new_status,
                });
            }
            let now = Utc::now();
            let processed_at = if patch.mark_processed {
                Some(now.to_rfc3339())
            } else {
                None
            };
            conn.execute(
                "UPDATE requests SET status = ?1, cost_cents = cost_cents + ?2, \
                 duration_ms = duration_ms + ?3, updated_at = ?4, \
                 processed_at = COALESCE(?5, processed_at) WHERE id = ?6",
                params![
                    enum_str(new_status),
                    patch.cost_cents_delta.unwrap_or(0),
                    patch.duration_ms_delta.unwrap_or(0),
                    now.to_rfc3339(),
                    processed_at,
                    id,
                ],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            fetch_by_id(&conn, &id)
        })
    }

    async fn set_pull_request(
        &self,
        id: &RequestId,
        url: Option<&str>,
        number: Option<i64>,
        branch_name: Option<&str>,
    ) -> Result<Request, StoreError> {
        let db = self.db.clone();
        let id = id.clone();
        let url = url.map(String::from);
        let branch_name = branch_name.map(String::from);
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let current = fetch_by_id(&conn, &id)?;
            if let (Some(existing), Some(incoming)) =
                (&current.pull_request.branch_name, &branch_name)
            {
                if existing != incoming {
                    return Err(StoreError::ImmutableField("pull_request.branch_name".into()));
                }
            }
            let now = Utc::now();
            conn.execute(
                "UPDATE requests SET \
                 pr_url = COALESCE(pr_url, ?1), \
                 pr_number = COALESCE(pr_number, ?2), \
                 pr_branch_name = COALESCE(pr_branch_name, ?3), \
                 updated_at = ?4 WHERE id = ?5",
                params![url, number, branch_name, now.to_rfc3339(), id],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            fetch_by_id(&conn, &id)
        })
    }

    async fn increment_retry(&self, id: &RequestId) -> Result<Request, StoreError> {
        let db = self.db.clone();
        let id = id.clone();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let now = Utc::now();
            conn.execute(
                "UPDATE requests SET retry_count = retry_count + 1, updated_at = ?1 WHERE id = ?2",
                params![now.to_rfc3339(), id],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            fetch_by_id(&conn, &id)
        })
    }

    async fn set_latest_session_id(
        &self,
        id: &RequestId,
        session_id: &str,
    ) -> Result<Request, StoreError> {
        let db = self.db.clone();
        let id = id.clone();
        let session_id = session_id.to_string();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let now = Utc::now();
            conn.execute(
                "UPDATE requests SET latest_session_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![session_id, now.to_rfc3339(), id],
            )
            .map_err(|e| StoreError::Storage(e.to_string()))?;
            fetch_by_id(&conn, &id)
        })
    }

    async fn list_recent(
        &self,
        status: Option<RequestStatus>,
        limit: usize,
    ) -> Result<Vec<Request>, StoreError> {
        let db = self.db.clone();
        tokio::task::block_in_place(move || {
            let conn = db.lock().map_err(|_| StoreError::Storage("lock poisoned".into()))?;
            let rows = match status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {SELECT_COLUMNS} FROM requests WHERE status = ?1 \
                         ORDER BY created_at DESC LIMIT ?2"
                    );
                    let mut stmt = conn
                        .prepare(&sql)
                        .map_err(|e| StoreError::Storage(e.to_string()))?;
                    stmt.query_map(params![enum_str(status), limit as i64], row_to_request)
                        .map_err(|e| StoreError::Storage(e.to_string()))?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| StoreError::Storage(e.to_string()))?
                }
                None => {
                    let sql = format!(
                        "SELECT {SELECT_COLUMNS} FROM requests ORDER BY created_at DESC LIMIT ?1"
                    );
                    let mut stmt = conn
                        .prepare(&sql)
                        .map_err(|e| StoreError::Storage(e.to_string()))?;
                    stmt.query_map(params![limit as i64], row_to_request)
                        .map_err(|e| StoreError::Storage(e.to_string()))?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|e| StoreError::Storage(e.to_string()))?
                }
            };
            rows.into_iter().map(TryInto::try_into).collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::{AgentConfig, RequestType};

    fn tmp_store() -> SqliteRequestStore {
        let file = tempfile::NamedTempFile::new().unwrap();
        SqliteRequestStore::new(file.path()).unwrap()
    }

    fn chat_spec() -> NewRequest {
        NewRequest {
            origin: Origin::Chat,
            repo: "acme/widgets".into(),
            title: "add health endpoint".into(),
            description: "please add /health".into(),
            request_type: RequestType::Feature,
            agent_config: AgentConfig::new("claude-code"),
            chat_channel: Some("C1".into()),
            chat_thread_key: Some("T1".into()),
            chat_user_id: Some("U1".into()),
            forge_repo: None,
            forge_issue_number: None,
            forge_issue_url: None,
        }
    }

    /// **Scenario**: a chat-origin request is created in `pending`, a forge-issue
    /// one in `issue_created` (spec §4.G decorator).
    #[tokio::test]
    async fn create_sets_initial_status_by_origin() {
        let store = tmp_store();
        let chat = store.create(chat_spec()).await.unwrap();
        assert_eq!(chat.status, RequestStatus::Pending);

        let mut forge_spec = chat_spec();
        forge_spec.origin = Origin::ForgeIssue;
        forge_spec.forge_repo = Some("acme/widgets".into());
        forge_spec.forge_issue_number = Some(42);
        let forge = store.create(forge_spec).await.unwrap();
        assert_eq!(forge.status, RequestStatus::IssueCreated);
    }

    /// **Scenario**: a second forge-issue request for the same (repo, issue-number)
    /// is rejected (spec §3 invariant 2).
    #[tokio::test]
    async fn duplicate_forge_issue_is_rejected() {
        let store = tmp_store();
        let mut spec = chat_spec();
        spec.origin = Origin::ForgeIssue;
        spec.forge_repo = Some("acme/widgets".into());
        spec.forge_issue_number = Some(7);
        store.create(spec.clone()).await.unwrap();

        let err = store.create(spec).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateForgeIssue { .. }));
    }

    /// **Scenario**: an illegal transition is rejected and the row is untouched.
    #[tokio::test]
    async fn update_status_rejects_illegal_transition() {
        let store = tmp_store();
        let req = store.create(chat_spec()).await.unwrap();
        let err = store
            .update_status(&req.id, RequestStatus::Completed, StatusPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
        let reloaded = store.find_by_request_id(&req.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RequestStatus::Pending);
    }

    /// **Scenario**: a legal transition updates status and accumulates cost/duration deltas.
    #[tokio::test]
    async fn update_status_applies_legal_transition_and_deltas() {
        let store = tmp_store();
        let req = store.create(chat_spec()).await.unwrap();
        let updated = store
            .update_status(
                &req.id,
                RequestStatus::Processing,
                StatusPatch {
                    cost_cents_delta: Some(150),
                    duration_ms_delta: Some(2000),
                    mark_processed: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Processing);
        assert_eq!(updated.cost_cents, 150);
        assert_eq!(updated.duration_ms, 2000);
    }

    /// **Scenario**: `set_pull_request` is write-once: the branch name cannot
    /// change once set (spec §3 invariant 4).
    #[tokio::test]
    async fn pull_request_branch_name_is_immutable_once_set() {
        let store = tmp_store();
        let req = store.create(chat_spec()).await.unwrap();
        store
            .set_pull_request(&req.id, Some("https://x/pr/1"), Some(1), Some("warden/fix-1"))
            .await
            .unwrap();
        let err = store
            .set_pull_request(&req.id, None, None, Some("warden/fix-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ImmutableField(_)));
    }

    /// **Scenario**: at most one active request exists per chat thread; the
    /// most recently created one is returned.
    #[tokio::test]
    async fn find_active_in_chat_thread_returns_most_recent() {
        let store = tmp_store();
        let first = store.create(chat_spec()).await.unwrap();
        // first drops out of the active set by reaching a terminal status
        store
            .update_status(&first.id, RequestStatus::Processing, StatusPatch::default())
            .await
            .unwrap();
        store
            .update_status(&first.id, RequestStatus::Completed, StatusPatch::default())
            .await
            .unwrap();

        let second = store.create(chat_spec()).await.unwrap();
        let active = store
            .find_active_in_chat_thread("C1", "T1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, second.id);
    }

    /// **Scenario**: a `pr_created` request (outside the narrow "active" set)
    /// is still findable by the broader follow-up lookup (spec §8 scenario 4).
    #[tokio::test]
    async fn find_most_recent_in_chat_thread_includes_pr_created() {
        let store = tmp_store();
        let req = store.create(chat_spec()).await.unwrap();
        store
            .update_status(&req.id, RequestStatus::Processing, StatusPatch::default())
            .await
            .unwrap();
        store
            .update_status(&req.id, RequestStatus::PrCreated, StatusPatch::default())
            .await
            .unwrap();
        assert!(store
            .find_active_in_chat_thread("C1", "T1")
            .await
            .unwrap()
            .is_none());
        let found = store
            .find_most_recent_in_chat_thread("C1", "T1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, req.id);
    }

    /// **Scenario**: `increment_retry` and `set_latest_session_id` persist
    /// independently of a status write.
    #[tokio::test]
    async fn increment_retry_and_set_session_id() {
        let store = tmp_store();
        let req = store.create(chat_spec()).await.unwrap();
        let after_retry = store.increment_retry(&req.id).await.unwrap();
        assert_eq!(after_retry.retry_count, 1);
        let after_session = store
            .set_latest_session_id(&req.id, "sess-abc")
            .await
            .unwrap();
        assert_eq!(after_session.latest_session_id.as_deref(), Some("sess-abc"));
    }
}
