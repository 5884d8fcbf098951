//! Variant handlers (spec §4.H): one module per queue-message family. Each
//! handler is invoked with the per-request advisory lock already held by
//! `Dispatcher::process` (spec §5 serialization) and must be idempotent
//! (spec §4.H "Handlers MUST be idempotent").

pub mod execute;
pub mod followup;
pub mod intake;
pub mod retry;
pub mod router;
pub mod sweep;
