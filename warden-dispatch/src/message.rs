//! Queue message schema (spec §4.H, §6): a tagged union over concrete
//! message variants, each carrying a request-correlation key, a
//! monotonically increasing envelope sequence, and an attempts counter.

use serde::{Deserialize, Serialize};
use warden_types::RequestId;

/// How to locate or create the `Request` row a message targets (spec §3
/// invariant 2, §4.H step 2 "idempotency guard").
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correlation {
    RequestId(RequestId),
    ForgeIssue { repo: String, issue_number: i64 },
    ChatThread { channel: String, thread_key: String },
}

/// New-request creation fields (spec §4.I "create" primitive).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateFromForge {
    pub repo: String,
    pub issue_number: i64,
    pub issue_url: String,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub actor_id: String,
    pub actor_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateFromChat {
    pub channel: String,
    pub thread_key: String,
    pub repo: Option<String>,
    pub description: String,
    pub request_type: Option<String>,
    pub agent_hint: Option<String>,
    pub actor_id: String,
    pub actor_name: String,
}

/// A new utterance targeting an already-known correlation key (spec §4.K):
/// either a chat thread (mentions, replies) or a forge issue (comments).
/// Carrying `Correlation` directly instead of separate channel/thread-key
/// fields lets one router handler (`handlers::router::route_mention`) serve
/// both surfaces (spec §4.K steps 3 and 4) without a parallel struct per
/// origin.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatUtterance {
    pub correlation: Correlation,
    pub text: String,
    pub actor_id: String,
    pub actor_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRetryRequest {
    pub request_id: RequestId,
    pub actor_id: String,
}

/// Tagged union over concrete message variants (spec §4.H).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DispatchMessage {
    RequestCreateFromForge(CreateFromForge),
    RequestCreateFromChat(CreateFromChat),
    ChatMention(ChatUtterance),
    ChatClarificationAnswer(ChatUtterance),
    ChatSuggestChanges(ChatUtterance),
    ChatRetryRequest(ChatRetryRequest),
    RequestExecute { request_id: RequestId },
    SessionSweep,
}

impl DispatchMessage {
    /// The correlation key used for the idempotency guard and per-request
    /// serialization (spec §4.H step 2, §5 "Serialization is achieved...").
    /// `SessionSweep` has no single request target and returns `None`.
    pub fn correlation(&self) -> Option<Correlation> {
        match self {
            DispatchMessage::RequestCreateFromForge(c) => Some(Correlation::ForgeIssue {
                repo: c.repo.clone(),
                issue_number: c.issue_number,
            }),
            DispatchMessage::RequestCreateFromChat(c) => Some(Correlation::ChatThread {
                channel: c.channel.clone(),
                thread_key: c.thread_key.clone(),
            }),
            DispatchMessage::ChatMention(u)
            | DispatchMessage::ChatClarificationAnswer(u)
            | DispatchMessage::ChatSuggestChanges(u) => Some(u.correlation.clone()),
            DispatchMessage::ChatRetryRequest(r) => {
                Some(Correlation::RequestId(r.request_id.clone()))
            }
            DispatchMessage::RequestExecute { request_id } => {
                Some(Correlation::RequestId(request_id.clone()))
            }
            DispatchMessage::SessionSweep => None,
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            DispatchMessage::RequestCreateFromForge(_) => "request_create_from_forge",
            DispatchMessage::RequestCreateFromChat(_) => "request_create_from_chat",
            DispatchMessage::ChatMention(_) => "chat_mention",
            DispatchMessage::ChatClarificationAnswer(_) => "chat_clarification_answer",
            DispatchMessage::ChatSuggestChanges(_) => "chat_suggest_changes",
            DispatchMessage::ChatRetryRequest(_) => "chat_retry_request",
            DispatchMessage::RequestExecute { .. } => "request_execute",
            DispatchMessage::SessionSweep => "session_sweep",
        }
    }
}

/// A dequeued envelope: the message plus delivery bookkeeping the queue
/// tracks (spec §4.H, §6 "every variant carries... a monotonically
/// increasing envelope sequence, and an `attempts` counter").
#[derive(Clone, Debug)]
pub struct QueueEnvelope {
    pub id: i64,
    pub message: DispatchMessage,
    pub sequence: i64,
    pub attempts: u32,
}
