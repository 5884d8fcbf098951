//! Intake adapters (spec §4.I): translate an external-surface event into a
//! `DispatchMessage` and hand it to the queue. No correlation/branching
//! logic lives here — that's `warden_dispatch::handlers::router`.

pub mod chat;
pub mod forge;
