//! `StoreError`: the failure modes of the Request Store (spec §4.B, §7).

use warden_types::{ErrorKind, RequestStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate forge issue: {repo}#{issue_number}")]
    DuplicateForgeIssue { repo: String, issue_number: i64 },
    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
    #[error("immutable field: {0}")]
    ImmutableField(String),
}

impl From<&StoreError> for ErrorKind {
    fn from(e: &StoreError) -> Self {
        match e {
            StoreError::Storage(_) => ErrorKind::TransientIo,
            StoreError::NotFound(_) => ErrorKind::Validation,
            StoreError::DuplicateForgeIssue { .. } => ErrorKind::Validation,
            StoreError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            StoreError::ImmutableField(_) => ErrorKind::Validation,
        }
    }
}

impl From<StoreError> for ErrorKind {
    fn from(e: StoreError) -> Self {
        ErrorKind::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: an invalid-transition error maps to the `invalid_transition`
    /// kind (spec §7), which is non-retryable.
    #[test]
    fn invalid_transition_maps_to_non_retryable_kind() {
        let err = StoreError::InvalidTransition {
            from: RequestStatus::Completed,
            to: RequestStatus::Processing,
        };
        let kind: ErrorKind = (&err).into();
        assert_eq!(kind, ErrorKind::InvalidTransition);
        assert!(!kind.is_retryable());
    }

    #[test]
    fn storage_error_is_retryable() {
        let kind: ErrorKind = (&StoreError::Storage("disk full".into())).into();
        assert!(kind.is_retryable());
    }
}
