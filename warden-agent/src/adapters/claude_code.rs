//! The `claude-code` strategy adapter: drives an autonomous coding agent CLI
//! as a subprocess against `ctx.working_dir`, and persists its session state
//! as a small zstd-compressed JSON blob (transcript tail + the agent's own
//! session id). The actual LLM call happens inside the subprocess — this
//! adapter only shells out and observes stdout (spec §1 Non-goals: "the
//! core does not itself invoke LLM APIs").

use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::context::{AgentContext, AgentResult, ClarificationPayload};
use crate::error::AgentError;
use crate::strategy::{Capabilities, Strategy};

/// This adapter's private session blob shape. Opaque to everything outside
/// this module (spec §4.E(4)).
#[derive(Serialize, Deserialize, Default)]
struct SessionBlob {
    agent_session_id: Option<String>,
    /// Last few transcript lines, used to reconstitute local state without
    /// re-running the whole conversation.
    transcript_tail: Vec<String>,
}

/// Drives a `claude` (or compatible) CLI binary in non-interactive mode.
pub struct ClaudeCodeStrategy {
    binary: String,
    provider: Option<String>,
    child: Mutex<Option<tokio::process::Child>>,
}

impl ClaudeCodeStrategy {
    pub fn new(binary: impl Into<String>, provider: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            provider,
            child: Mutex::new(None),
        }
    }

    fn reconstitute(blob: &[u8]) -> Result<SessionBlob, AgentError> {
        let raw = warden_session::decompress(blob)
            .map_err(|e| AgentError::Execution(format!("decompress session blob: {e}")))?;
        serde_json::from_slice(&raw)
            .map_err(|e| AgentError::Execution(format!("parse session blob: {e}")))
    }

    fn serialize(blob: &SessionBlob) -> Result<Vec<u8>, AgentError> {
        let raw = serde_json::to_vec(blob)
            .map_err(|e| AgentError::Execution(format!("encode session blob: {e}")))?;
        warden_session::compress(&raw)
            .map_err(|e| AgentError::Execution(format!("compress session blob: {e}")))
    }
}

#[async_trait]
impl Strategy for ClaudeCodeStrategy {
    fn kind(&self) -> &str {
        "claude-code"
    }

    async fn execute(&self, ctx: AgentContext) -> Result<AgentResult, AgentError> {
        let mut prior = SessionBlob::default();
        if let (Some(_resume_id), Some(blob)) = (&ctx.resume_session_id, &ctx.session_blob) {
            prior = Self::reconstitute(blob)?;
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--print")
            .arg("--output-format")
            .arg("stream-json")
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(provider) = &self.provider {
            cmd.env("WARDEN_AGENT_PROVIDER", provider);
        }
        if let Some(model) = &ctx.agent_config.model {
            cmd.arg("--model").arg(model);
        }
        if let Some(resume_id) = &ctx.resume_session_id {
            cmd.arg("--resume").arg(resume_id);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| AgentError::Execution(format!("spawn {}: {e}", self.binary)))?;

        {
            use tokio::io::AsyncWriteExt;
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(ctx.prompt.as_bytes())
                    .await
                    .map_err(|e| AgentError::Execution(format!("write stdin: {e}")))?;
            }
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Execution("no stdout handle".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        let mut agent_session_id = prior.agent_session_id.clone();
        let mut transcript: Vec<String> = Vec::new();
        let mut raw_output = String::new();
        let mut files_modified: u32 = 0;

        loop {
            tokio::select! {
                _ = ctx.cancellation.cancelled() => {
                    let _ = child.start_kill();
                    return Err(AgentError::Aborted);
                }
                line = lines.next_line() => {
                    match line.map_err(|e| AgentError::Execution(format!("read stdout: {e}")))? {
                        Some(line) => {
                            raw_output.push_str(&line);
                            raw_output.push('\n');
                            transcript.push(line.clone());
                            if agent_session_id.is_none() {
                                if let Some(id) = extract_session_id(&line) {
                                    agent_session_id = Some(id);
                                }
                            }
                            if line.contains("\"action\":\"edit\"") || line.contains("\"action\":\"create\"") {
                                files_modified += 1;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| AgentError::Execution(format!("wait: {e}")))?;

        *self.child.lock().unwrap() = None;

        let tail_start = transcript.len().saturating_sub(50);
        let new_blob = SessionBlob {
            agent_session_id: agent_session_id.clone(),
            transcript_tail: transcript[tail_start..].to_vec(),
        };
        let compressed = Self::serialize(&new_blob)?;

        Ok(AgentResult {
            success: status.success(),
            new_session_id: agent_session_id,
            new_session_blob: Some(compressed),
            summary: transcript.last().cloned().unwrap_or_default(),
            messages: Vec::new(),
            files_modified,
            diff_stat: None,
            clarification: ClarificationPayload::default(),
            cost_cents: None,
            duration_ms: None,
            error: (!status.success()).then(|| format!("exit status {status}")),
            raw_output,
        })
    }

    async fn abort(&self) {
        if let Some(mut child) = self.child.lock().unwrap().take() {
            let _ = child.start_kill();
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            session_persistence: true,
            providers: vec![
                "anthropic".into(),
                "openai".into(),
                "google".into(),
            ],
        }
    }

    async fn validate(&self, ctx: &AgentContext) -> Vec<String> {
        let mut errors = Vec::new();
        if ctx.prompt.trim().is_empty() {
            errors.push("prompt is empty".to_string());
        }
        if !ctx.working_dir.exists() {
            errors.push(format!("working dir does not exist: {:?}", ctx.working_dir));
        }
        errors
    }

    async fn cleanup(&self) {
        if let Some(mut child) = self.child.lock().unwrap().take() {
            let _ = child.start_kill();
        }
    }
}

/// Extracts a `"session_id":"..."` field from one line of the CLI's
/// stream-json output, emitted on the agent's initialization event
/// (spec §4.E session protocol step 2).
fn extract_session_id(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value
        .get("session_id")
        .and_then(|v| v.as_str())
        .map(String::from)
}
