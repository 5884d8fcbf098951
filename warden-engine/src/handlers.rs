//! HTTP handler bodies for the inbound surfaces named in spec §6. Each
//! handler's job ends at "translate the request into a `DispatchMessage`
//! and enqueue it" (or, for the `/api/*` reads, read straight through the
//! store/log/session traits) — no lifecycle decisions happen here.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use warden_types::{RequestId, RequestStatus};

use crate::app::AppState;

fn internal_error(err: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

async fn enqueue(
    state: &Arc<AppState>,
    message: warden_dispatch::DispatchMessage,
) -> Result<(), Response> {
    state
        .queue
        .enqueue(message)
        .await
        .map(|_| ())
        .map_err(internal_error)
}

/// `POST /webhook/forge`: signature verification against the stored forge
/// webhook secret, then a straight reduction via
/// `warden_surfaces::intake::forge::parse_forge_event` (spec §4.I).
pub async fn webhook_forge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if let Some(secret) = &state.forge_webhook_secret {
        let signature = headers
            .get("X-Hub-Signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !warden_surfaces::verify_forge_signature(secret, &body, signature) {
            return (StatusCode::UNAUTHORIZED, "bad signature").into_response();
        }
    }

    let event_name = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match warden_surfaces::intake::forge::parse_forge_event(&event_name, &payload) {
        Ok(Some(message)) => match enqueue(&state, message).await {
            Ok(()) => StatusCode::ACCEPTED.into_response(),
            Err(resp) => resp,
        },
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SlashCommandBody {
    pub channel: String,
    pub thread_key: String,
    pub text: String,
    pub actor_id: String,
    pub actor_name: String,
}

/// `POST /chat/command`: a chat slash command always starts a new request
/// (spec §6 "Intake create (new request)").
pub async fn chat_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SlashCommandBody>,
) -> Response {
    let message = warden_surfaces::intake::chat::slash_command(
        &body.channel,
        &body.thread_key,
        &body.text,
        &body.actor_id,
        &body.actor_name,
    );
    match enqueue(&state, message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractivityBody {
    ModalSubmission {
        channel: String,
        thread_key: String,
        repo: Option<String>,
        description: String,
        request_type: Option<String>,
        agent_hint: Option<String>,
        actor_id: String,
        actor_name: String,
    },
    RetryButton {
        request_id: RequestId,
        actor_id: String,
    },
}

/// `POST /chat/interactivity`: modal submissions (new-request dialogs) and
/// button clicks (retry) (spec §6 "Intake create / enqueue... retry").
pub async fn chat_interactivity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InteractivityBody>,
) -> Response {
    let message = match body {
        InteractivityBody::ModalSubmission {
            channel,
            thread_key,
            repo,
            description,
            request_type,
            agent_hint,
            actor_id,
            actor_name,
        } => warden_surfaces::intake::chat::modal_submission(
            &channel,
            &thread_key,
            repo.as_deref(),
            &description,
            request_type.as_deref(),
            agent_hint.as_deref(),
            &actor_id,
            &actor_name,
        ),
        InteractivityBody::RetryButton {
            request_id,
            actor_id,
        } => warden_surfaces::intake::chat::retry_button(request_id, &actor_id),
    };
    match enqueue(&state, message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatEventBody {
    pub channel: String,
    pub thread_key: String,
    pub text: String,
    pub actor_id: String,
    pub actor_name: String,
}

/// `POST /chat/events`: mentions and thread replies. Correlation and
/// create-vs-follow-up branching happen in the dispatcher's router handler,
/// not here (spec §4.K).
pub async fn chat_events(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatEventBody>,
) -> Response {
    let message = warden_surfaces::intake::chat::mention(
        &body.channel,
        &body.thread_key,
        &body.text,
        &body.actor_id,
        &body.actor_name,
    );
    match enqueue(&state, message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(resp) => resp,
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/requests`: dashboard read-through (spec §6).
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRequestsQuery>,
) -> Response {
    let status = match query.status.as_deref() {
        Some(s) => match serde_json::from_value::<RequestStatus>(json!(s)) {
            Ok(status) => Some(status),
            Err(_) => return (StatusCode::BAD_REQUEST, "unknown status").into_response(),
        },
        None => None,
    };
    let limit = query.limit.unwrap_or(50).min(200);
    match state.store.list_recent(status, limit).await {
        Ok(requests) => Json(requests).into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /api/requests/:id`: dashboard read-through (spec §6).
pub async fn get_request(State(state): State<Arc<AppState>>, Path(id): Path<RequestId>) -> Response {
    match state.store.find_by_request_id(&id).await {
        Ok(Some(request)) => Json(request).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub before_id: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/requests/:id/messages`: paginated thread read (spec §6, §4.A).
pub async fn get_request_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RequestId>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    match state
        .log
        .thread(&id, query.before_id.as_deref(), query.limit)
        .await
    {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub request_id: RequestId,
}

/// `GET /api/session`: container->engine session fetch (spec §4.C, §6).
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionQuery>,
) -> Response {
    match state.sessions.get_latest(&query.request_id).await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(e),
    }
}
