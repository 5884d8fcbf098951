//! Agent progress event types (spec §6 "Agent progress event schema").
//!
//! A `Strategy` streams these back to the dispatcher during `Execute`; the
//! dispatcher mirrors each one into the Conversation Log as an `agent_*`
//! message. State-carrying variants use `serde_json::Value` so strategy
//! implementations stay decoupled from whatever in-process state shape they
//! use internally.

use serde::Serialize;
use serde_json::Value;

/// Wire shape for one agent progress event (type + payload); envelope
/// (session_id, turn_id, event_id) is applied separately by [`crate::envelope`].
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentProgressEvent {
    Started,
    Thinking { content: String },
    ToolCall {
        tool_name: String,
        tool_input: Value,
    },
    ToolResult {
        tool_name: String,
        tool_output: Value,
        is_error: bool,
    },
    FileChange {
        path: String,
        action: String,
        diff: Option<String>,
    },
    Terminal {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    Completed { summary: String },
    Error { message: String },
}

impl AgentProgressEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// The `Message` type this event mirrors into the Conversation Log as.
    pub fn message_type(&self) -> crate::message::MessageType {
        use crate::message::MessageType::*;
        match self {
            AgentProgressEvent::Started => AgentThinking,
            AgentProgressEvent::Thinking { .. } => AgentThinking,
            AgentProgressEvent::ToolCall { .. } => AgentToolCall,
            AgentProgressEvent::ToolResult { .. } => AgentToolResult,
            AgentProgressEvent::FileChange { .. } => AgentFileChange,
            AgentProgressEvent::Terminal { .. } => AgentTerminal,
            AgentProgressEvent::Completed { .. } => AgentSummary,
            AgentProgressEvent::Error { .. } => Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: each variant serializes with a `type` tag matching its snake_case name.
    #[test]
    fn serializes_with_type_tag() {
        let ev = AgentProgressEvent::ToolCall {
            tool_name: "apply_patch".into(),
            tool_input: serde_json::json!({"path": "src/lib.rs"}),
        };
        let v = ev.to_value().unwrap();
        assert_eq!(v["type"], "tool_call");
        assert_eq!(v["tool_name"], "apply_patch");
    }

    #[test]
    fn message_type_mapping_covers_all_variants() {
        assert_eq!(
            AgentProgressEvent::Started.message_type(),
            crate::message::MessageType::AgentThinking
        );
        assert_eq!(
            AgentProgressEvent::Error {
                message: "x".into()
            }
            .message_type(),
            crate::message::MessageType::Error
        );
    }
}
