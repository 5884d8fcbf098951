//! `NotificationSink`: the named seam the dispatcher calls through to turn a
//! state transition into outbound text on the originating surface (spec
//! §4.J). Posting to the chat/forge HTTP APIs themselves is plumbing outside
//! the core (spec §1); a real deployment supplies an implementation living
//! in `warden-surfaces`. Stateless mappers from `(Request, Message)` to
//! outbound text — delivery failures are logged but never roll back a state
//! transition (spec §4.J "Delivery failures are logged but never roll back
//! state transitions"), so the dispatcher never treats a notification error
//! as a reason to retry or fail the triggering handler.

use async_trait::async_trait;
use warden_types::Request;

/// One of the moments spec §4.J names as requiring a notification.
#[derive(Clone, Copy, Debug)]
pub enum NotificationEvent<'a> {
    RequestAccepted,
    ClarificationNeeded { questions: &'a [String] },
    PullRequestCreated { url: &'a str, summary: &'a str },
    PullRequestUpdated { url: &'a str, summary: &'a str },
    AnalysisCompleted { summary: &'a str },
    Error { reason: &'a str, retryable: bool },
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Posts a notification for `event` against `request`, in-thread where a
    /// thread key is known (spec §4.J). Implementations MUST NOT propagate a
    /// delivery failure as fatal to the caller; log and return `Ok(())` for
    /// anything the caller shouldn't act on.
    async fn notify(&self, request: &Request, event: NotificationEvent<'_>);
}

/// Default sink for deployments that haven't wired a real chat/forge
/// notifier: logs at `info` and sends nothing. Safe default; never panics,
/// never blocks a state transition.
#[derive(Default)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn notify(&self, request: &Request, event: NotificationEvent<'_>) {
        tracing::info!(request_id = %request.id, event = ?event, "notification (no surface wired)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::{AgentConfig, Origin, PullRequestInfo, RequestStatus, RequestType, SurfaceCorrelation};

    fn request() -> Request {
        Request {
            id: "r1".into(),
            origin: Origin::Chat,
            repo: "acme/api".into(),
            title: "t".into(),
            description: "d".into(),
            request_type: RequestType::Feature,
            status: RequestStatus::Processing,
            agent_config: AgentConfig::new("mock"),
            correlation: SurfaceCorrelation::default(),
            pull_request: PullRequestInfo::default(),
            retry_count: 0,
            cost_cents: 0,
            duration_ms: 0,
            latest_session_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn logging_sink_never_panics() {
        let sink = LoggingNotificationSink;
        sink.notify(&request(), NotificationEvent::RequestAccepted).await;
        sink.notify(
            &request(),
            NotificationEvent::Error {
                reason: "circuit_open",
                retryable: true,
            },
        )
        .await;
    }
}
