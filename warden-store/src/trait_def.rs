//! `RequestStore` trait (spec §4.B): persisted request rows, indexed for
//! thread/issue correlation. The store is the only writer of `Request` rows;
//! every write sets `updated_at` and status writes go through the transition
//! guard in `warden_types::RequestStatus::legal_next`.

use async_trait::async_trait;
use warden_types::{AgentConfig, Origin, Request, RequestId, RequestStatus, RequestType};

use crate::error::StoreError;

/// Fields needed to create a new request row (spec §3's `Request` minus the
/// fields the store itself assigns: id, status, timestamps).
#[derive(Clone, Debug)]
pub struct NewRequest {
    pub origin: Origin,
    pub repo: String,
    pub title: String,
    pub description: String,
    pub request_type: RequestType,
    pub agent_config: AgentConfig,
    pub chat_channel: Option<String>,
    pub chat_thread_key: Option<String>,
    pub chat_user_id: Option<String>,
    pub forge_repo: Option<String>,
    pub forge_issue_number: Option<i64>,
    pub forge_issue_url: Option<String>,
}

/// Partial update applied alongside a status transition (spec §4.B
/// `UpdateStatus(id, newStatus, patch)`). All fields optional; only present
/// fields are written.
#[derive(Clone, Debug, Default)]
pub struct StatusPatch {
    pub cost_cents_delta: Option<i64>,
    pub duration_ms_delta: Option<i64>,
    pub mark_processed: bool,
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Fails with `DuplicateForgeIssue` if `spec.origin == ForgeIssue` and a
    /// row with the same (repo, issue-number) already exists (spec §3 invariant 2).
    async fn create(&self, spec: NewRequest) -> Result<Request, StoreError>;

    async fn find_by_request_id(&self, id: &RequestId) -> Result<Option<Request>, StoreError>;

    async fn find_by_forge_issue(
        &self,
        repo: &str,
        issue_number: i64,
    ) -> Result<Option<Request>, StoreError>;

    /// Most-recently-created row in (channel, thread-key) whose status is
    /// active (spec §8: at most one such row exists at a time).
    async fn find_active_in_chat_thread(
        &self,
        channel: &str,
        thread_key: &str,
    ) -> Result<Option<Request>, StoreError>;

    /// Broader than `find_active_in_chat_thread`: the most-recently-created
    /// non-terminal row in (channel, thread-key), including `pr_created` and
    /// `error`. Used by the follow-up router (spec §4.K, §8 scenario 4),
    /// which must correlate a chat reply to an already-`pr_created` request —
    /// a status outside the narrower "active" set used for the
    /// at-most-one-per-thread invariant (spec §8).
    async fn find_most_recent_in_chat_thread(
        &self,
        channel: &str,
        thread_key: &str,
    ) -> Result<Option<Request>, StoreError>;

    /// Validates the transition against `RequestStatus::legal_next` and rejects
    /// illegal ones with `StoreError::InvalidTransition` without mutating the row.
    async fn update_status(
        &self,
        id: &RequestId,
        new_status: RequestStatus,
        patch: StatusPatch,
    ) -> Result<Request, StoreError>;

    /// Write-once per field (spec §3 invariant 4): a second call with a
    /// differing value for an already-set field is rejected.
    async fn set_pull_request(
        &self,
        id: &RequestId,
        url: Option<&str>,
        number: Option<i64>,
        branch_name: Option<&str>,
    ) -> Result<Request, StoreError>;

    async fn increment_retry(&self, id: &RequestId) -> Result<Request, StoreError>;

    async fn set_latest_session_id(
        &self,
        id: &RequestId,
        session_id: &str,
    ) -> Result<Request, StoreError>;

    /// Most-recently-created rows, newest first, for the dashboard
    /// read-through endpoint (spec §6 `/api/requests`). `status` restricts to
    /// one status when present.
    async fn list_recent(
        &self,
        status: Option<RequestStatus>,
        limit: usize,
    ) -> Result<Vec<Request>, StoreError>;
}
