//! `SurfaceError`: the error type for the I/O plumbing this crate wraps
//! (spec §1 names the chat/forge HTTP surfaces themselves as "straight I/O
//! plumbing" outside the core — this crate is that plumbing, not the core).

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("signature verification failed")]
    BadSignature,
    #[error("forge api: {0}")]
    Forge(String),
    #[error("chat api: {0}")]
    Chat(String),
    #[error("not configured: {0}")]
    NotConfigured(&'static str),
}
