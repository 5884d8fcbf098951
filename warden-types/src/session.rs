//! The `AgentSession` record (spec §3): an opaque compressed blob keyed by request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::RequestId;

/// Default session blob lifetime (spec §3).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Opaque binary blob plus bookkeeping metadata. `payload` is compressed and
/// opaque to the engine: it is never parsed, only stored and handed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSession {
    pub request_id: RequestId,
    pub agent_kind: String,
    pub session_id: String,
    pub payload: Vec<u8>,
    pub uncompressed_size: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AgentSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expires_at_is_exclusive_lower_bound() {
        let now = Utc::now();
        let session = AgentSession {
            request_id: "r1".into(),
            agent_kind: "claude-code".into(),
            session_id: "s1".into(),
            payload: vec![1, 2, 3],
            uncompressed_size: 3,
            created_at: now,
            expires_at: now + Duration::seconds(1),
        };
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::seconds(1)));
    }
}
