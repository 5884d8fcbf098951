//! `SessionBlobStore` trait (spec §4.C).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_types::{AgentSession, RequestId};

use crate::error::SessionError;

/// Opaque compressed agent-session storage, keyed by request (spec §4.C).
/// `(request_id, session_id)` is unique. Payload is never parsed here.
#[async_trait]
pub trait SessionBlobStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn put(
        &self,
        request_id: &RequestId,
        session_id: &str,
        agent_kind: &str,
        compressed_bytes: Vec<u8>,
        uncompressed_size: usize,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    async fn get_latest(&self, request_id: &RequestId) -> Result<Option<AgentSession>, SessionError>;

    /// Prunes rows whose `expires_at` has passed. Returns the number deleted.
    /// Driven by the `session_sweep` queue message (spec §4.H, §10.5).
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}
