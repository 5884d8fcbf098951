//! Persisted request rows and the request state machine's storage (spec §4.B,
//! §4.G). The store is the only component that mutates `Request` rows; every
//! other component reads through this trait.

pub mod error;
pub mod sqlite_store;
pub mod trait_def;

pub use error::StoreError;
pub use sqlite_store::SqliteRequestStore;
pub use trait_def::{NewRequest, RequestStore, StatusPatch};
