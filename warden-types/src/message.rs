//! The `Message` record (spec §3): an append-only child of a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::request::RequestId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Chat,
    Forge,
    Web,
    System,
}

/// Closed enum of message types (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // user-surface
    InitialRequest,
    ClarificationAsk,
    ClarificationAnswer,
    FollowUpRequest,
    // lifecycle
    ProcessingStarted,
    ProcessingUpdate,
    PrCreated,
    PrUpdated,
    Error,
    Retry,
    Cancelled,
    // agent-activity
    AgentThinking,
    AgentToolCall,
    AgentToolResult,
    AgentFileChange,
    AgentTerminal,
    AgentSummary,
}

impl MessageType {
    pub fn is_agent_activity(self) -> bool {
        matches!(
            self,
            MessageType::AgentThinking
                | MessageType::AgentToolCall
                | MessageType::AgentToolResult
                | MessageType::AgentFileChange
                | MessageType::AgentTerminal
                | MessageType::AgentSummary
        )
    }
}

/// Typed metadata extensions, keyed loosely by message type (spec §3). Kept as
/// a flat optional-field struct rather than a tagged union so storage layers
/// can persist it as one JSON blob column without a second enum to migrate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub tool_name: Option<String>,
    pub tool_input: Option<serde_json::Value>,
    pub tool_output: Option<serde_json::Value>,
    pub file_path: Option<String>,
    pub file_action: Option<String>,
    pub diff: Option<String>,
    pub command: Option<String>,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub turn_id: Option<String>,
    pub cost_cents: Option<i64>,
    pub duration_ms: Option<i64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_stack: Option<String>,
    pub from_status: Option<String>,
    pub to_status: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl MessageMetadata {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_status: Some(from.into()),
            to_status: Some(to.into()),
            ..Default::default()
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

pub type MessageId = String;

/// An append-only child of a request (spec §3). Messages are never rewritten.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub request_id: RequestId,
    pub message_type: MessageType,
    pub source: MessageSource,
    pub content: String,
    pub actor_id: Option<String>,
    pub actor_name: Option<String>,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
}
