//! The queue consumer / dispatcher (spec §4.H): pops messages, derives a
//! correlation key and variant, serializes per-request handling, and maps
//! handler outcomes to ack/retry/dead-letter per §5 and §7.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{watch, Mutex as AsyncMutex, Semaphore};
use tracing::{error, info, warn};
use warden_agent::{RepoSurface, StrategyRegistry};
use warden_breaker::{Breaker, BreakerConfig, Decision, LoopOutcome};
use warden_configstore::ConfigStore;
use warden_log::ConversationLog;
use warden_session::SessionBlobStore;
use warden_store::RequestStore;
use warden_types::RequestId;

use crate::backoff::full_jitter_backoff;
use crate::error::DispatchError;
use crate::message::{Correlation, DispatchMessage, QueueEnvelope};
use crate::notify::NotificationSink;
use crate::queue::Queue;

/// Default per-deployment concurrency bound (spec §5 "bound in-flight
/// executions per deployment (default 4)").
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Default retry attempts before an envelope is dead-lettered and the
/// request transitions to `error` (spec §4.H step 5).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

fn correlation_key(c: &Correlation) -> String {
    match c {
        Correlation::RequestId(id) => format!("request:{id}"),
        Correlation::ForgeIssue { repo, issue_number } => format!("forge:{repo}#{issue_number}"),
        Correlation::ChatThread {
            channel,
            thread_key,
        } => format!("chat:{channel}:{thread_key}"),
    }
}

/// Everything a handler needs, bundled so the dispatcher's constructor list
/// doesn't balloon (spec §9 "Global mutable state": initialized once at
/// boot, handed to every handler as explicit arguments).
pub struct Dispatcher {
    pub(crate) queue: Arc<dyn Queue>,
    pub(crate) store: Arc<dyn RequestStore>,
    pub(crate) log: Arc<dyn ConversationLog>,
    pub(crate) sessions: Arc<dyn SessionBlobStore>,
    pub(crate) registry: Arc<StrategyRegistry>,
    pub(crate) repo: Arc<dyn RepoSurface>,
    pub(crate) config: Arc<dyn ConfigStore>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) breaker_config: BreakerConfig,
    pub(crate) working_dir_root: PathBuf,
    pub(crate) max_attempts: u32,
    concurrency: Arc<Semaphore>,
    request_locks: DashMap<String, Arc<AsyncMutex<()>>>,
    /// Per-request breaker state (spec §4.F). Kept in-process: this
    /// deployment is single-shared-queue, not clustered (spec §1), so an
    /// in-memory map keyed by request id is the breaker's "rolling window"
    /// storage across successive `request_execute` loops.
    breakers: DashMap<RequestId, AsyncMutex<Breaker>>,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn Queue>,
        store: Arc<dyn RequestStore>,
        log: Arc<dyn ConversationLog>,
        sessions: Arc<dyn SessionBlobStore>,
        registry: Arc<StrategyRegistry>,
        repo: Arc<dyn RepoSurface>,
        config: Arc<dyn ConfigStore>,
        notifier: Arc<dyn NotificationSink>,
        breaker_config: BreakerConfig,
        working_dir_root: PathBuf,
        max_in_flight: usize,
    ) -> Self {
        Self {
            queue,
            store,
            log,
            sessions,
            registry,
            repo,
            config,
            notifier,
            breaker_config,
            working_dir_root,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            concurrency: Arc::new(Semaphore::new(max_in_flight.max(1))),
            request_locks: DashMap::new(),
            breakers: DashMap::new(),
        }
    }

    /// Feeds one loop's outcome into the request's breaker and returns the
    /// decision (spec §4.F). Lazily creates a `closed` breaker on first use.
    pub(crate) async fn breaker_decision(
        &self,
        request_id: &RequestId,
        outcome: &LoopOutcome,
    ) -> Decision {
        let entry = self
            .breakers
            .entry(request_id.clone())
            .or_insert_with(|| AsyncMutex::new(Breaker::new(self.breaker_config)));
        let mut guard = entry.lock().await;
        guard.record(outcome)
    }

    /// Resets a request's breaker to `closed` (spec §4.F "terminal until
    /// explicit reset on a new request or a `retry` user action").
    pub(crate) fn reset_breaker(&self, request_id: &RequestId) {
        self.breakers.remove(request_id);
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.request_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Runs until `shutdown` reports `true`. Polls the queue at a fixed
    /// cadence; each popped message that fits within the concurrency bound
    /// is processed on its own task, serialized against any other in-flight
    /// message for the same correlation key.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let permit = match self.concurrency.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    continue;
                }
            };
            let popped = match self.queue.pop().await {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "queue pop failed");
                    drop(permit);
                    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                    continue;
                }
            };
            let Some(envelope) = popped else {
                drop(permit);
                tokio::select! {
                    _ = shutdown.changed() => {}
                    _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
                }
                continue;
            };

            let this = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                this.process(envelope).await;
            });
        }
    }

    /// Processes one envelope end to end: serialize-by-correlation, invoke
    /// the variant handler, then ack/retry/dead-letter.
    pub async fn process(self: &Arc<Self>, envelope: QueueEnvelope) {
        let span = tracing::info_span!("dispatch", variant = envelope.message.variant_name());
        let _enter = span.enter();

        let correlation = envelope.message.correlation();
        let _guard = if let Some(c) = &correlation {
            Some(self.lock_for(&correlation_key(c)).lock_owned().await)
        } else {
            None
        };

        match self.dispatch_one(&envelope.message).await {
            Ok(()) => {
                if let Err(e) = self.queue.ack(envelope.id).await {
                    warn!(error = %e, "ack failed");
                }
            }
            Err(e) => self.handle_failure(&envelope, e).await,
        }
    }

    async fn handle_failure(self: &Arc<Self>, envelope: &QueueEnvelope, err: DispatchError) {
        let kind = err.kind();
        if kind.is_retryable() && envelope.attempts + 1 < self.max_attempts {
            let delay = full_jitter_backoff(envelope.attempts);
            info!(attempts = envelope.attempts, delay_ms = delay.as_millis() as u64, "retrying after transient failure");
            if let Err(e) = self.queue.nack(envelope.id, Utc::now() + delay).await {
                error!(error = %e, "nack failed");
            }
            return;
        }

        error!(error = %err, "terminal dispatch failure");
        if let Some(Correlation::RequestId(request_id)) = envelope.message.correlation() {
            self.terminate_request(&request_id, &err).await;
        }
        if let Err(e) = self.queue.dead_letter(envelope.id, &err.to_string()).await {
            error!(error = %e, "dead_letter failed");
        }
    }

    /// Transitions a request to `error` and writes the typed log entry
    /// (spec §7 "Every terminal `error` transition MUST write a Log entry
    /// with `errorCode`, `errorMessage`").
    pub(crate) async fn terminate_request(&self, request_id: &RequestId, err: &DispatchError) {
        use warden_store::StatusPatch;
        use warden_types::{MessageMetadata, MessageSource, MessageType, RequestStatus};

        let kind = err.kind();
        if matches!(kind, warden_types::ErrorKind::Duplicate) {
            return;
        }
        let Ok(Some(request)) = self.store.find_by_request_id(request_id).await else {
            return;
        };
        if !request.status.can_transition_to(RequestStatus::Error) {
            return;
        }
        if let Err(e) = self
            .store
            .update_status(request_id, RequestStatus::Error, StatusPatch::default())
            .await
        {
            warn!(error = %e, "failed to transition request to error");
        }
        let _ = self
            .log
            .append(
                request_id,
                MessageType::Error,
                MessageSource::System,
                &err.to_string(),
                None,
                None,
                MessageMetadata::error(kind.reason(), err.to_string()),
            )
            .await;
    }

    async fn dispatch_one(self: &Arc<Self>, message: &DispatchMessage) -> Result<(), DispatchError> {
        match message {
            DispatchMessage::RequestCreateFromForge(c) => {
                crate::handlers::intake::create_from_forge(self, c).await
            }
            DispatchMessage::RequestCreateFromChat(c) => {
                crate::handlers::intake::create_from_chat(self, c).await
            }
            DispatchMessage::ChatMention(u) => crate::handlers::router::route_mention(self, u).await,
            DispatchMessage::ChatClarificationAnswer(u) => {
                crate::handlers::followup::clarification_answer(self, u).await
            }
            DispatchMessage::ChatSuggestChanges(u) => {
                crate::handlers::followup::suggest_changes(self, u).await
            }
            DispatchMessage::ChatRetryRequest(r) => crate::handlers::retry::retry(self, r).await,
            DispatchMessage::RequestExecute { request_id } => {
                crate::handlers::execute::execute(self, request_id).await
            }
            DispatchMessage::SessionSweep => crate::handlers::sweep::sweep(self).await,
        }
    }
}

/// Helper used by handlers that need a fresh scratch directory for one
/// `Execute` call (spec §9 "Ownership of the working tree").
pub(crate) fn scratch_dir(root: &std::path::Path, request_id: &str) -> PathBuf {
    root.join(format!("{request_id}-{}", uuid::Uuid::new_v4()))
}

#[allow(dead_code)]
pub(crate) type LabelMap = HashMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_key_is_stable_per_variant() {
        assert_eq!(
            correlation_key(&Correlation::RequestId("r1".into())),
            "request:r1"
        );
        assert_eq!(
            correlation_key(&Correlation::ForgeIssue {
                repo: "acme/api".into(),
                issue_number: 9
            }),
            "forge:acme/api#9"
        );
    }
}
