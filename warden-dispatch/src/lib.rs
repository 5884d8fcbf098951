//! Durable queue consumer/dispatcher (spec §4.H): pops queue messages,
//! serializes per-request handling, and routes each variant to its handler in
//! `handlers`. The public surface is `Dispatcher` plus the message/queue/error
//! types a `warden-surfaces`/`warden-engine` caller needs to enqueue work and
//! wire a concrete `Queue`/`NotificationSink`.

pub mod backoff;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod message;
pub mod notify;
pub mod queue;

pub use dispatcher::{Dispatcher, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_IN_FLIGHT};
pub use error::DispatchError;
pub use message::{
    ChatRetryRequest, ChatUtterance, Correlation, CreateFromChat, CreateFromForge, DispatchMessage,
    QueueEnvelope,
};
pub use notify::{LoggingNotificationSink, NotificationEvent, NotificationSink};
pub use queue::{Queue, QueueError, SqliteQueue};
