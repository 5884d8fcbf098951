//! The `Request` record (spec §3) and its enumerated fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, URL-safe request id. Must survive round-trip through external
/// user-visible surfaces (comment bodies, button payloads).
pub type RequestId = String;

/// Where a request originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Chat,
    ForgeIssue,
    Web,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Feature,
    Bug,
    Refactor,
    Docs,
    Question,
}

/// Request status (spec §4.G). `IssueCreated` is a decorator equivalent to
/// `Pending` for forge-origin rows, reflecting that the forge surface now has
/// a tracking id; it participates in the same transition graph as `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    IssueCreated,
    Processing,
    AwaitingClarification,
    PrCreated,
    Completed,
    Error,
    Cancelled,
}

impl RequestStatus {
    /// Legal next states per spec §4.G. `IssueCreated` shares `Pending`'s edges.
    pub fn legal_next(self) -> &'static [RequestStatus] {
        use RequestStatus::*;
        match self {
            Pending | IssueCreated => &[Processing, Cancelled],
            Processing => &[
                AwaitingClarification,
                PrCreated,
                Completed,
                Error,
                Cancelled,
            ],
            AwaitingClarification => &[Processing, Cancelled],
            PrCreated => &[Processing, Completed, Error],
            Completed => &[],
            Error => &[Pending],
            Cancelled => &[Pending],
        }
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        self.legal_next().contains(&next)
    }

    /// Statuses counted as "active" for the at-most-one-per-thread invariant (spec §8).
    pub fn is_active(self) -> bool {
        matches!(
            self,
            RequestStatus::Processing
                | RequestStatus::Pending
                | RequestStatus::IssueCreated
                | RequestStatus::AwaitingClarification
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

/// Agent configuration tagged union (spec §9 "dynamic dispatch"): downstream
/// code pattern-matches on `kind` rather than relying on trait objects for
/// config itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub kind: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl AgentConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            provider: None,
            model: None,
            max_turns: None,
            timeout_secs: None,
        }
    }
}

/// Correlation keys that identify a request's source-surface thread, used by
/// the idempotency guard and by the clarification/follow-up router.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceCorrelation {
    pub chat_channel: Option<String>,
    pub chat_thread_key: Option<String>,
    pub chat_user_id: Option<String>,
    pub forge_repo: Option<String>,
    pub forge_issue_number: Option<i64>,
    pub forge_issue_url: Option<String>,
}

/// Pull-request correlation, once opened. `branch_name` is write-once per request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub url: Option<String>,
    pub number: Option<i64>,
    pub branch_name: Option<String>,
}

/// A durable record of one user ask (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub origin: Origin,
    pub repo: String,
    pub title: String,
    pub description: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub agent_config: AgentConfig,
    pub correlation: SurfaceCorrelation,
    pub pull_request: PullRequestInfo,
    pub retry_count: u32,
    pub cost_cents: i64,
    pub duration_ms: i64,
    pub latest_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: the status graph matches spec §4.G exactly — no row may be
    /// mutated to a non-adjacent state.
    #[test]
    fn pending_transitions_match_spec_table() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Processing));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Cancelled));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::PrCreated));
    }

    #[test]
    fn completed_is_terminal() {
        assert!(RequestStatus::Completed.legal_next().is_empty());
        assert!(RequestStatus::Completed.is_terminal());
    }

    #[test]
    fn error_and_cancelled_permit_retry_back_to_pending_only() {
        assert_eq!(RequestStatus::Error.legal_next(), &[RequestStatus::Pending]);
        assert_eq!(
            RequestStatus::Cancelled.legal_next(),
            &[RequestStatus::Pending]
        );
    }

    #[test]
    fn issue_created_behaves_like_pending() {
        assert_eq!(
            RequestStatus::IssueCreated.legal_next(),
            RequestStatus::Pending.legal_next()
        );
    }

    #[test]
    fn active_set_matches_thread_invariant() {
        assert!(RequestStatus::Processing.is_active());
        assert!(RequestStatus::AwaitingClarification.is_active());
        assert!(!RequestStatus::PrCreated.is_active());
        assert!(!RequestStatus::Completed.is_active());
    }
}
