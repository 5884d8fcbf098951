//! Clarification/follow-up router (spec §4.K): pure grammar parsing for
//! inline options. The correlation decision itself (querying the Request
//! Store, picking the target queue variant) needs store access and lives in
//! `warden-dispatch::handlers::router` — this crate is the pure, I/O-free
//! half: parsing `[k=v, ...]` options out of a raw utterance.

pub mod grammar;

pub use grammar::{parse_inline_options, strip_inline_options, KNOWN_KEYS};
