//! `SessionError`: failure modes of the Session Blob Store (spec §4.C).

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("compression: {0}")]
    Compression(String),
}

impl From<SessionError> for warden_types::ErrorKind {
    fn from(_: SessionError) -> Self {
        warden_types::ErrorKind::TransientIo
    }
}
