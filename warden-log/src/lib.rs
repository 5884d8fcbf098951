//! Append-only per-request conversation log (spec §4.A).
//!
//! This is the single source of truth for a request's user-visible history:
//! every chat message, clarification, agent activity event, and status
//! transition is appended here and never rewritten. `warden-store`'s
//! denormalized cost/duration columns on `Request` must always match the sum
//! this crate computes.

pub mod error;
pub mod sqlite_log;
pub mod trait_def;

pub use error::LogError;
pub use sqlite_log::{shared, SqliteConversationLog};
pub use trait_def::{ConversationLog, CostAndDuration};
