//! Closed error-kind taxonomy (spec §7). Every crate's leaf error type
//! converts into one of these; the dispatcher is the single place that maps
//! a `ErrorKind` to a state transition and a user-visible message.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Queue, storage, outbound-HTTP failures. Retried with backoff in the dispatcher.
    TransientIo,
    /// Expired or invalid integration credential. One refresh attempt, else surfaced.
    IntegrationAuth,
    /// Malformed payload, missing required field. Non-retryable; rejected at ingress.
    Validation,
    /// State-machine guard rejected a transition. Non-retryable; logged and dropped.
    InvalidTransition,
    /// Strategy returned `success = false`.
    AgentFailure,
    /// Circuit breaker halted the loop.
    CircuitOpen,
    /// Per-request deadline exceeded.
    Timeout,
    /// Idempotency guard caught a replay.
    Duplicate,
}

impl ErrorKind {
    /// Whether the dispatcher should return the message to the queue with backoff
    /// rather than terminating the request.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransientIo)
    }

    /// Stable reason string surfaced to the user alongside a retry affordance (§7).
    pub fn reason(self) -> &'static str {
        match self {
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::IntegrationAuth => "integration_auth",
            ErrorKind::Validation => "validation",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::AgentFailure => "agent_failure",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Duplicate => "duplicate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_io_is_retryable() {
        assert!(ErrorKind::TransientIo.is_retryable());
        for k in [
            ErrorKind::IntegrationAuth,
            ErrorKind::Validation,
            ErrorKind::InvalidTransition,
            ErrorKind::AgentFailure,
            ErrorKind::CircuitOpen,
            ErrorKind::Timeout,
            ErrorKind::Duplicate,
        ] {
            assert!(!k.is_retryable());
        }
    }

    #[test]
    fn reason_strings_are_snake_case() {
        assert_eq!(ErrorKind::CircuitOpen.reason(), "circuit_open");
        assert_eq!(ErrorKind::InvalidTransition.reason(), "invalid_transition");
    }
}
