//! Compressed agent-session payload store, keyed by request (spec §4.C).
//!
//! Session blobs let a stateless container resume a stateful agent: the
//! dispatcher writes a blob after execution and reads it back before a
//! follow-up run. Payloads are opaque here — compression is this crate's only
//! concern with their bytes.

pub mod codec;
pub mod error;
pub mod sqlite_store;
pub mod trait_def;

pub use codec::{compress, decompress};
pub use error::SessionError;
pub use sqlite_store::SqliteSessionBlobStore;
pub use trait_def::SessionBlobStore;
