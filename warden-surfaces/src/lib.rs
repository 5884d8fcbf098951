//! External-surface plumbing (spec §4.I, §4.J): translates chat/forge
//! webhook and API events into `DispatchMessage`s, and renders outbound
//! notifications back onto whichever surface a request originated from.
//! No lifecycle/correlation decisions live here; those are
//! `warden_dispatch::handlers::router`'s job.

pub mod error;
pub mod intake;
pub mod notify;
pub mod webhook;

pub use error::SurfaceError;
pub use notify::{ChatNotifier, ForgeNotifier, SurfaceNotifier};
pub use webhook::verify_forge_signature;
