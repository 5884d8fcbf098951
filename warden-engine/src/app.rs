//! Axum app: shared state and router (spec §6 inbound HTTP endpoints).
//! HTTP handlers only validate shape and enqueue a `DispatchMessage`; the
//! background `Dispatcher` (spawned separately in `main`) does the rest.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use warden_configstore::ConfigStore;
use warden_dispatch::Queue;
use warden_log::ConversationLog;
use warden_session::SessionBlobStore;
use warden_store::RequestStore;

use crate::handlers;

/// Everything an HTTP handler needs. Cloned cheaply per request (every field
/// is an `Arc`), mirroring the dispatcher's own "initialized once at boot,
/// handed to every caller as explicit state" shape.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn Queue>,
    pub store: Arc<dyn RequestStore>,
    pub log: Arc<dyn ConversationLog>,
    pub sessions: Arc<dyn SessionBlobStore>,
    pub config: Arc<dyn ConfigStore>,
    pub forge_webhook_secret: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook/forge", post(handlers::webhook_forge))
        .route("/chat/command", post(handlers::chat_command))
        .route("/chat/interactivity", post(handlers::chat_interactivity))
        .route("/chat/events", post(handlers::chat_events))
        .route("/api/requests", get(handlers::list_requests))
        .route("/api/requests/:id", get(handlers::get_request))
        .route(
            "/api/requests/:id/messages",
            get(handlers::get_request_messages),
        )
        .route("/api/session", get(handlers::get_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
