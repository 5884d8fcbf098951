//! `DispatchError`: the dispatcher is the single place that maps a leaf
//! error up to a `warden_types::ErrorKind` and a state transition
//! (spec §7 propagation policy).

use warden_agent::AgentError;
use warden_log::LogError;
use warden_session::SessionError;
use warden_store::StoreError;
use warden_types::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("queue: {0}")]
    Queue(String),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("log: {0}")]
    Log(#[from] LogError),
    #[error("session: {0}")]
    Session(#[from] SessionError),
    #[error("agent: {0}")]
    Agent(#[from] AgentError),
    #[error("circuit open: {0}")]
    CircuitOpen(String),
    #[error("timeout")]
    Timeout,
    #[error("duplicate")]
    Duplicate,
    #[error("validation: {0}")]
    Validation(String),
}

impl From<DispatchError> for ErrorKind {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::Queue(_) => ErrorKind::TransientIo,
            DispatchError::Store(e) => e.into(),
            DispatchError::Log(e) => e.into(),
            DispatchError::Session(e) => e.into(),
            DispatchError::Agent(e) => e.into(),
            DispatchError::CircuitOpen(_) => ErrorKind::CircuitOpen,
            DispatchError::Timeout => ErrorKind::Timeout,
            DispatchError::Duplicate => ErrorKind::Duplicate,
            DispatchError::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Queue(_) => ErrorKind::TransientIo,
            DispatchError::Store(e) => ErrorKind::from(e),
            DispatchError::Log(_) => ErrorKind::TransientIo,
            DispatchError::Session(_) => ErrorKind::TransientIo,
            DispatchError::Agent(e) => ErrorKind::from(e),
            DispatchError::CircuitOpen(_) => ErrorKind::CircuitOpen,
            DispatchError::Timeout => ErrorKind::Timeout,
            DispatchError::Duplicate => ErrorKind::Duplicate,
            DispatchError::Validation(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_open_maps_to_circuit_open_kind() {
        let kind = DispatchError::CircuitOpen("stuck".into()).kind();
        assert_eq!(kind, ErrorKind::CircuitOpen);
        assert!(!kind.is_retryable());
    }
}
