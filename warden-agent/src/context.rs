//! `AgentContext` / `AgentResult` (spec §4.E): the data the dispatcher hands
//! to a `Strategy`'s `Execute` call, and what it gets back.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use warden_types::{AgentConfig, AgentProgressEvent};

/// Progress callback: the strategy invokes this for every agent-activity
/// event it wants mirrored into the Conversation Log (spec §4.E). Errors
/// from the sink are swallowed by the strategy (logging is best-effort from
/// the strategy's perspective; the dispatcher owns durability of the log).
pub type ProgressCallback = Arc<dyn Fn(AgentProgressEvent) + Send + Sync>;

/// Everything a `Strategy::execute` call needs (spec §4.E).
pub struct AgentContext {
    /// Scratch directory this call exclusively owns for its lifetime
    /// (spec §9 "Ownership of the working tree"). Deleted by `Cleanup`.
    pub working_dir: PathBuf,
    pub prompt: String,
    pub agent_config: AgentConfig,
    /// Present only when the dispatcher determined the strategy supports
    /// session persistence and a usable prior session blob exists.
    pub resume_session_id: Option<String>,
    pub session_blob: Option<Vec<u8>>,
    /// Replay context used instead of session resumption when
    /// `sessionPersistence` is unsupported (spec §4.E(3)).
    pub replay_messages: Vec<String>,
    pub cancellation: CancellationToken,
    pub on_progress: Option<ProgressCallback>,
}

impl AgentContext {
    pub fn new(working_dir: PathBuf, prompt: impl Into<String>, agent_config: AgentConfig) -> Self {
        Self {
            working_dir,
            prompt: prompt.into(),
            agent_config,
            resume_session_id: None,
            session_blob: None,
            replay_messages: Vec::new(),
            cancellation: CancellationToken::new(),
            on_progress: None,
        }
    }

    pub fn with_resume(mut self, session_id: impl Into<String>, blob: Vec<u8>) -> Self {
        self.resume_session_id = Some(session_id.into());
        self.session_blob = Some(blob);
        self
    }

    pub fn with_replay(mut self, messages: Vec<String>) -> Self {
        self.replay_messages = messages;
        self
    }

    pub fn emit(&self, event: AgentProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

/// Clarifying-question payload (spec §4.E `AgentResult`).
#[derive(Clone, Debug, Default)]
pub struct ClarificationPayload {
    pub needs_clarification: bool,
    pub questions: Vec<String>,
}

/// What a `Strategy::execute` call returns (spec §4.E).
#[derive(Clone, Debug)]
pub struct AgentResult {
    pub success: bool,
    pub new_session_id: Option<String>,
    pub new_session_blob: Option<Vec<u8>>,
    pub summary: String,
    pub messages: Vec<AgentProgressEvent>,
    pub files_modified: u32,
    pub diff_stat: Option<String>,
    pub clarification: ClarificationPayload,
    pub cost_cents: Option<i64>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    /// Raw text the strategy emitted (prompt for the structured status block /
    /// error-signature extraction performed by `warden-breaker`).
    pub raw_output: String,
}

impl AgentResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            new_session_id: None,
            new_session_blob: None,
            summary: String::new(),
            messages: Vec::new(),
            files_modified: 0,
            diff_stat: None,
            clarification: ClarificationPayload::default(),
            cost_cents: None,
            duration_ms: None,
            error: Some(error.into()),
            raw_output: String::new(),
        }
    }
}
