//! The `Strategy` trait (spec §4.E): the one interface the dispatcher
//! executes every agent through, regardless of implementation.

use async_trait::async_trait;

use crate::context::{AgentContext, AgentResult};
use crate::error::AgentError;

/// What a strategy implementation supports, queried once at registration
/// time and consulted by the dispatcher before it attempts session resume
/// or streaming (spec §4.E).
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    pub streaming: bool,
    /// Whether (1)/(3) of the session protocol are implemented. A strategy
    /// reporting `false` here causes the dispatcher to fall back to replaying
    /// thread context instead of resuming (spec §4.E).
    pub session_persistence: bool,
    pub providers: Vec<String>,
}

/// The core's abstraction over a specific agent implementation (spec §4.E).
///
/// **Session protocol** (critical, spec §4.E):
/// 1. Before execution, if `resume_session_id`/`session_blob` are present on
///    the `AgentContext`, the strategy reconstitutes agent-local state from
///    the blob prior to its first tool call.
/// 2. During execution, the strategy captures the agent's session id as soon
///    as the agent emits an initialization event.
/// 3. After execution, the strategy serializes its session state into a
///    fresh compressed blob on `AgentResult`.
/// 4. Blob format is private to the strategy; callers never parse it.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Stable identifier matching the registry key this instance was built
    /// under (e.g. `"claude-code"`).
    fn kind(&self) -> &str;

    async fn execute(&self, ctx: AgentContext) -> Result<AgentResult, AgentError>;

    /// Best-effort cooperative cancellation of an in-flight `execute` call.
    /// The dispatcher also signals `ctx.cancellation`; `abort` is for
    /// strategies that hold out-of-band resources (a subprocess, a socket)
    /// the cancellation token alone can't reach.
    async fn abort(&self);

    fn supports_streaming(&self) -> bool {
        self.capabilities().streaming
    }

    fn capabilities(&self) -> Capabilities;

    /// Pre-flight checks against the given context (missing prompt, an
    /// unsupported provider/model pairing, …). Returns one message per
    /// problem found; empty means the context is executable.
    async fn validate(&self, ctx: &AgentContext) -> Vec<String>;

    /// Releases any resources tied to the last `execute` call (spec §9
    /// "Ownership of the working tree": the strategy must not retain
    /// handles to the scratch directory past this call).
    async fn cleanup(&self);
}
