//! Envelope (session_id, turn_id, event_id) for agent progress events (spec §6).
//! `EnvelopeState` tracks the current turn and injects the envelope into each event.

use crate::event::AgentProgressEvent;
use serde_json::Value;

/// Envelope fields attached to every agent progress event.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Session ID; constant within one `Execute` call.
    pub session_id: Option<String>,
    /// Turn id for the current reasoning/tool-call/observe loop.
    pub turn_id: Option<String>,
    /// Per-event sequence number; monotonically increasing within a stream.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_turn_id(mut self, id: impl Into<String>) -> Self {
        self.turn_id = Some(id.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.session_id {
            obj.entry("session_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(ref id) = self.turn_id {
            obj.entry("turn_id")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("event_id")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one `Execute` call: session_id, current turn id, next event_id.
pub struct EnvelopeState {
    pub session_id: String,
    pub current_turn_id: String,
    pub turn_seq: u64,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            current_turn_id: String::new(),
            turn_seq: 0,
            next_event_id: 1,
        }
    }

    /// Injects envelope into the event value and advances state. On
    /// `type == "started"`, advances to a fresh turn id.
    pub fn inject_into(&mut self, value: &mut Value) {
        if let Some("started") = value.get("type").and_then(|v| v.as_str()) {
            self.current_turn_id = format!("turn-{}", self.turn_seq);
            self.turn_seq += 1;
        }
        let turn_id = if self.current_turn_id.is_empty() {
            "turn-0"
        } else {
            self.current_turn_id.as_str()
        };
        let env = Envelope::new()
            .with_session_id(&self.session_id)
            .with_turn_id(turn_id)
            .with_event_id(self.next_event_id);
        self.next_event_id += 1;
        env.inject_into(value);
    }

    /// Builds the envelope for a final reply (no underlying event).
    pub fn reply_envelope(&self) -> Envelope {
        let turn_id = if self.current_turn_id.is_empty() {
            "turn-0"
        } else {
            self.current_turn_id.as_str()
        };
        Envelope::new()
            .with_session_id(&self.session_id)
            .with_turn_id(turn_id)
            .with_event_id(self.next_event_id)
    }
}

/// Converts an agent progress event to JSON and injects the envelope using the given state.
/// Returns the final value (type + payload + session_id, turn_id, event_id).
pub fn to_json(
    event: &AgentProgressEvent,
    state: &mut EnvelopeState,
) -> Result<Value, serde_json::Error> {
    let mut value = event.to_value()?;
    state.inject_into(&mut value);
    Ok(value)
}
