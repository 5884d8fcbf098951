//! `ConversationLog` trait (spec §4.A).

use async_trait::async_trait;
use warden_types::{Message, MessageMetadata, MessageSource, MessageType, RequestId};

use crate::error::LogError;

/// Aggregate cost and duration across a request's thread (spec §4.A). This is
/// the authoritative figure; any denormalized cost/duration column on
/// `Request` MUST match it (spec §8 invariant).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostAndDuration {
    pub cost_cents: i64,
    pub duration_ms: i64,
}

/// Append-only per-request message stream with typed metadata (spec §4.A).
///
/// Guarantees: writes are durable before `Append` returns; append is atomic.
/// `Thread` returns messages in a stable order: ascending by creation time,
/// then by id for ties.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(
        &self,
        request_id: &RequestId,
        message_type: MessageType,
        source: MessageSource,
        content: &str,
        actor_id: Option<&str>,
        actor_name: Option<&str>,
        metadata: MessageMetadata,
    ) -> Result<String, LogError>;

    /// Oldest-to-newest page of a request's thread. `before_id`/`limit` support
    /// the pagination contract in spec §6.
    async fn thread(
        &self,
        request_id: &RequestId,
        before_id: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, LogError>;

    async fn total_cost_and_duration(
        &self,
        request_id: &RequestId,
    ) -> Result<CostAndDuration, LogError>;
}
