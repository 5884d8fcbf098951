//! `LogError`: the failure modes of conversation-log storage.
//!
//! The core never swallows a storage error (spec §4.A): every `Append`/`Thread`
//! call surfaces this upward instead of returning a partial or empty result.

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<LogError> for warden_types::ErrorKind {
    fn from(_: LogError) -> Self {
        warden_types::ErrorKind::TransientIo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each LogError variant contains expected keywords.
    #[test]
    fn log_error_display_all_variants() {
        assert!(LogError::Storage("disk full".into())
            .to_string()
            .to_lowercase()
            .contains("storage"));
        assert!(LogError::Serialization("bad json".into())
            .to_string()
            .to_lowercase()
            .contains("serialization"));
        assert!(LogError::NotFound("msg-1".into())
            .to_string()
            .to_lowercase()
            .contains("not found"));
    }
}
