//! Shared domain types for the request-lifecycle engine.
//!
//! This crate has no I/O: it is the wire/record shape shared by every other
//! `warden-*` crate, plus the agent-progress event protocol (type + payload +
//! envelope) that a `Strategy` implementation streams back to the dispatcher.

pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod request;
pub mod session;

pub use envelope::{to_json, Envelope, EnvelopeState};
pub use error::ErrorKind;
pub use event::AgentProgressEvent;
pub use message::{Message, MessageMetadata, MessageSource, MessageType};
pub use request::{AgentConfig, Origin, Request, RequestId, RequestStatus, RequestType};
pub use session::{AgentSession, DEFAULT_SESSION_TTL_SECS};
