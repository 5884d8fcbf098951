//! Deterministic in-process strategy used by dispatcher/router tests and as
//! a reference implementation of the session protocol (spec §4.E). Carries
//! no subprocess, no network: `execute` returns a pre-programmed script of
//! results, one per call, so tests can drive multi-loop scenarios (circuit
//! breaker trips, clarification cycles) without a real agent.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::{AgentContext, AgentResult, ClarificationPayload};
use crate::error::AgentError;
use crate::strategy::{Capabilities, Strategy};

#[derive(Serialize, Deserialize, Default, Clone)]
struct MockBlob {
    call_count: u32,
}

/// One scripted outcome for a single `execute` call.
#[derive(Clone, Debug)]
pub struct ScriptedTurn {
    pub success: bool,
    pub files_modified: u32,
    pub pr_ready: bool,
    pub needs_clarification: bool,
    pub clarification_questions: Vec<String>,
    pub raw_output: String,
}

impl ScriptedTurn {
    pub fn progress(files_modified: u32) -> Self {
        Self {
            success: true,
            files_modified,
            pr_ready: false,
            needs_clarification: false,
            clarification_questions: Vec::new(),
            raw_output: format!("STATUS: in-progress\nFILES_MODIFIED: {files_modified}\n"),
        }
    }

    pub fn complete(files_modified: u32) -> Self {
        Self {
            success: true,
            files_modified,
            pr_ready: true,
            needs_clarification: false,
            clarification_questions: Vec::new(),
            raw_output: format!(
                "STATUS: complete\nFILES_MODIFIED: {files_modified}\nPR_READY: true\n"
            ),
        }
    }

    pub fn needs_clarification(questions: Vec<String>) -> Self {
        Self {
            success: true,
            files_modified: 0,
            pr_ready: false,
            needs_clarification: true,
            clarification_questions: questions.clone(),
            raw_output: format!(
                "STATUS: needs-clarification\nCLARIFICATION_QUESTIONS: {}\n",
                questions.join(" | ")
            ),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            files_modified: 0,
            pr_ready: false,
            needs_clarification: false,
            clarification_questions: Vec::new(),
            raw_output: format!("Error: {message}\n"),
        }
    }
}

pub struct MockStrategy {
    script: Mutex<Vec<ScriptedTurn>>,
    session_persistence: bool,
}

impl MockStrategy {
    pub fn new(script: Vec<ScriptedTurn>) -> Self {
        Self {
            script: Mutex::new(script),
            session_persistence: true,
        }
    }

    pub fn without_session_persistence(mut self) -> Self {
        self.session_persistence = false;
        self
    }
}

#[async_trait]
impl Strategy for MockStrategy {
    fn kind(&self) -> &str {
        "mock"
    }

    async fn execute(&self, ctx: AgentContext) -> Result<AgentResult, AgentError> {
        let mut prior_count = 0u32;
        if let Some(blob) = &ctx.session_blob {
            if let Ok(raw) = warden_session::decompress(blob) {
                if let Ok(decoded) = serde_json::from_slice::<MockBlob>(&raw) {
                    prior_count = decoded.call_count;
                }
            }
        }

        let turn = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(AgentError::Execution("script exhausted".into()));
            }
            script.remove(0)
        };

        if !turn.success {
            let mut result = AgentResult::failed(turn.raw_output.clone());
            result.raw_output = turn.raw_output;
            return Ok(result);
        }

        let new_blob = MockBlob {
            call_count: prior_count + 1,
        };
        let raw = serde_json::to_vec(&new_blob).unwrap();
        let compressed = warden_session::compress(&raw)
            .map_err(|e| AgentError::Execution(e.to_string()))?;

        Ok(AgentResult {
            success: true,
            new_session_id: Some(format!("mock-session-{}", new_blob.call_count)),
            new_session_blob: Some(compressed),
            summary: turn.raw_output.lines().last().unwrap_or_default().to_string(),
            messages: Vec::new(),
            files_modified: turn.files_modified,
            diff_stat: None,
            clarification: ClarificationPayload {
                needs_clarification: turn.needs_clarification,
                questions: turn.clarification_questions,
            },
            cost_cents: Some(10),
            duration_ms: Some(5),
            error: None,
            raw_output: turn.raw_output,
        })
    }

    async fn abort(&self) {}

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: false,
            session_persistence: self.session_persistence,
            providers: vec!["anthropic".into()],
        }
    }

    async fn validate(&self, ctx: &AgentContext) -> Vec<String> {
        if ctx.prompt.trim().is_empty() {
            vec!["prompt is empty".to_string()]
        } else {
            Vec::new()
        }
    }

    async fn cleanup(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_types::AgentConfig;

    fn ctx() -> AgentContext {
        AgentContext::new(std::env::temp_dir(), "do it", AgentConfig::new("mock"))
    }

    #[tokio::test]
    async fn runs_scripted_turns_in_order() {
        let strat = MockStrategy::new(vec![ScriptedTurn::progress(1), ScriptedTurn::complete(2)]);
        let r1 = strat.execute(ctx()).await.unwrap();
        assert_eq!(r1.files_modified, 1);
        assert!(!r1.clarification.needs_clarification);

        let r2 = strat.execute(ctx()).await.unwrap();
        assert!(r2.files_modified == 2);
    }

    /// **Scenario**: session round-trip — resuming with a prior blob advances
    /// the mock session id counter instead of restarting from zero.
    #[tokio::test]
    async fn resume_continues_session_counter() {
        let strat = MockStrategy::new(vec![ScriptedTurn::progress(1), ScriptedTurn::progress(1)]);
        let r1 = strat.execute(ctx()).await.unwrap();
        let blob = r1.new_session_blob.unwrap();

        let resumed_ctx = ctx().with_resume(r1.new_session_id.clone().unwrap(), blob);
        let r2 = strat.execute(resumed_ctx).await.unwrap();
        assert_eq!(r2.new_session_id.as_deref(), Some("mock-session-2"));
    }

    #[tokio::test]
    async fn failed_turn_reports_unsuccessful_result() {
        let strat = MockStrategy::new(vec![ScriptedTurn::error("ENOENT package.json")]);
        let r = strat.execute(ctx()).await.unwrap();
        assert!(!r.success);
    }
}
