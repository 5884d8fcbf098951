//! `request_execute` handler (spec §4.H "Execute handler", the hot path):
//! resolves the agent, builds a working tree, drives the strategy's loop
//! against the Circuit Breaker, and lands on `pr_created`, `completed`,
//! `awaiting_clarification`, or `error`.
//!
//! Cost/duration accrue across every loop in this call and are written to
//! the Request's denormalized columns in the single `update_status` call
//! that ends the turn, so they never drift out of step with the sum over
//! the Conversation Log (spec §8 aggregate-cost invariant) — the store's
//! `update_status` always pairs a status change with its patch, and there is
//! no `processing -> processing` edge to apply an intermediate patch against.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::mpsc;
use tracing::warn;
use warden_agent::{AgentContext, AgentResult};
use warden_breaker::{extract_error_signature, parse_status, Decision, LoopOutcome};
use warden_store::StatusPatch;
use warden_types::{
    AgentProgressEvent, MessageMetadata, MessageSource, MessageType, RequestId, RequestStatus,
    DEFAULT_SESSION_TTL_SECS,
};

use crate::dispatcher::{scratch_dir, Dispatcher};
use crate::error::DispatchError;
use crate::notify::NotificationEvent;

/// Default cap on loops within one `request_execute` invocation when the
/// request's `AgentConfig::max_turns` is unset. The breaker trips well
/// before this in practice (spec §4.F); this is a backstop against a
/// strategy that keeps reporting progress forever.
const DEFAULT_MAX_TURNS: u32 = 25;

/// Accumulates across every loop this invocation runs, written once at the
/// turn's terminal `update_status` call.
#[derive(Default)]
struct TurnTotals {
    cost_cents: i64,
    duration_ms: i64,
}

impl TurnTotals {
    fn patch(&self, mark_processed: bool) -> StatusPatch {
        StatusPatch {
            cost_cents_delta: Some(self.cost_cents),
            duration_ms_delta: Some(self.duration_ms),
            mark_processed,
        }
    }
}

fn provider_name(p: warden_configstore::LlmProvider) -> &'static str {
    use warden_configstore::LlmProvider::*;
    match p {
        Anthropic => "anthropic",
        Openai => "openai",
        Google => "google",
        Groq => "groq",
        Deepseek => "deepseek",
        Mistral => "mistral",
        Together => "together",
        Fireworks => "fireworks",
    }
}

/// The content of the most recent user-surface message (spec §3 Message
/// types "user-surface"): what the agent should act on this turn, whether
/// that's the original ask, a clarification answer, or a follow-up.
async fn latest_user_instruction(dispatcher: &Arc<Dispatcher>, request_id: &RequestId, fallback: &str) -> String {
    let Ok(thread) = dispatcher.log.thread(request_id, None, None).await else {
        return fallback.to_string();
    };
    thread
        .iter()
        .rev()
        .find(|m| {
            matches!(
                m.message_type,
                MessageType::InitialRequest | MessageType::ClarificationAnswer | MessageType::FollowUpRequest
            )
        })
        .map(|m| m.content.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Spawns the background task that mirrors streamed `AgentProgressEvent`s
/// into the Conversation Log (spec §4.E `on_progress`, §4.H step 3 "Stream
/// progress events into the Log as `agent_*` messages").
fn spawn_progress_drain(
    dispatcher: Arc<Dispatcher>,
    request_id: RequestId,
    mut rx: mpsc::UnboundedReceiver<AgentProgressEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let message_type = event.message_type();
            let content = match &event {
                AgentProgressEvent::Thinking { content } => content.clone(),
                AgentProgressEvent::ToolCall { tool_name, .. } => format!("tool call: {tool_name}"),
                AgentProgressEvent::ToolResult { tool_name, is_error, .. } => {
                    format!("tool result: {tool_name} (error={is_error})")
                }
                AgentProgressEvent::FileChange { path, action, .. } => format!("{action}: {path}"),
                AgentProgressEvent::Terminal { command, .. } => command.clone(),
                AgentProgressEvent::Completed { summary } => summary.clone(),
                AgentProgressEvent::Error { message } => message.clone(),
                AgentProgressEvent::Started => "agent started".to_string(),
            };
            let metadata = match &event {
                AgentProgressEvent::ToolCall { tool_name, tool_input } => MessageMetadata {
                    tool_name: Some(tool_name.clone()),
                    tool_input: Some(tool_input.clone()),
                    ..Default::default()
                },
                AgentProgressEvent::ToolResult { tool_name, tool_output, .. } => MessageMetadata {
                    tool_name: Some(tool_name.clone()),
                    tool_output: Some(tool_output.clone()),
                    ..Default::default()
                },
                AgentProgressEvent::FileChange { path, action, diff } => MessageMetadata {
                    file_path: Some(path.clone()),
                    file_action: Some(action.clone()),
                    diff: diff.clone(),
                    ..Default::default()
                },
                AgentProgressEvent::Terminal { command, exit_code, stdout, stderr } => MessageMetadata {
                    command: Some(command.clone()),
                    exit_code: *exit_code,
                    stdout: Some(stdout.clone()),
                    stderr: Some(stderr.clone()),
                    ..Default::default()
                },
                _ => MessageMetadata::empty(),
            };
            if let Err(e) = dispatcher
                .log
                .append(&request_id, message_type, MessageSource::System, &content, None, None, metadata)
                .await
            {
                warn!(error = %e, "failed to log agent progress event");
            }
        }
    })
}

pub async fn execute(dispatcher: &Arc<Dispatcher>, request_id: &RequestId) -> Result<(), DispatchError> {
    let Some(request) = dispatcher.store.find_by_request_id(request_id).await? else {
        return Err(DispatchError::Validation("unknown request".into()));
    };
    if request.status != RequestStatus::Processing {
        // Idempotence (spec §8): a duplicate or stale `request_execute`
        // delivery against a request that has already moved on (terminal,
        // awaiting clarification, or already `pr_created` from an earlier
        // delivery of this same message) is a no-op.
        return Ok(());
    }

    let llm = dispatcher
        .config
        .get_llm()
        .await
        .map_err(|e| DispatchError::Validation(e.to_string()))?
        .unwrap_or_default();
    let available_providers: Vec<String> = llm
        .available_providers()
        .into_iter()
        .map(|p| provider_name(p).to_string())
        .collect();

    let strategy = dispatcher.registry.build(
        &request.agent_config.kind,
        request.agent_config.provider.as_deref(),
        request.agent_config.model.as_deref(),
        &available_providers,
    )?;

    let defaults = dispatcher
        .config
        .get_system_defaults()
        .await
        .map_err(|e| DispatchError::Validation(e.to_string()))?
        .unwrap_or_default();
    let default_branch = if defaults.default_branch.is_empty() {
        "main".to_string()
    } else {
        defaults.default_branch
    };
    let branch = request.pull_request.branch_name.clone().unwrap_or(default_branch);

    let working_dir = scratch_dir(&dispatcher.working_dir_root, &request.id);
    dispatcher.repo.clone_at(&request.repo, &working_dir, &branch).await?;

    let prompt = latest_user_instruction(dispatcher, request_id, &request.description).await;

    let (tx, rx) = mpsc::unbounded_channel();
    let drain = spawn_progress_drain(dispatcher.clone(), request_id.clone(), rx);
    let on_progress: warden_agent::ProgressCallback = Arc::new(move |event| {
        let _ = tx.send(event);
    });

    let mut ctx = AgentContext::new(working_dir.clone(), prompt.clone(), request.agent_config.clone());
    ctx.on_progress = Some(on_progress.clone());

    if strategy.capabilities().session_persistence {
        if let Some(session) = dispatcher.sessions.get_latest(request_id).await? {
            if !session.is_expired_at(Utc::now()) {
                ctx = ctx.with_resume(session.session_id, session.payload);
            }
        }
    } else {
        let tail: Vec<String> = dispatcher
            .log
            .thread(request_id, None, Some(20))
            .await?
            .into_iter()
            .map(|m| format!("{:?}: {}", m.source, m.content))
            .collect();
        ctx = ctx.with_replay(tail);
    }

    let problems = strategy.validate(&ctx).await;
    if !problems.is_empty() {
        drop(ctx);
        drain.abort();
        return terminate_turn(
            dispatcher,
            request_id,
            &TurnTotals::default(),
            &format!("invalid agent context: {}", problems.join("; ")),
        )
        .await;
    }

    let max_turns = request.agent_config.max_turns.unwrap_or(DEFAULT_MAX_TURNS).max(1);
    let mut totals = TurnTotals::default();

    for _turn in 0..max_turns {
        let result = match strategy.execute(ctx).await {
            Ok(r) => r,
            Err(e) => {
                drain.abort();
                strategy.cleanup().await;
                return terminate_turn(dispatcher, request_id, &totals, &e.to_string()).await;
            }
        };

        totals.cost_cents += result.cost_cents.unwrap_or(0);
        totals.duration_ms += result.duration_ms.unwrap_or(0);

        if let (Some(session_id), Some(blob)) = (&result.new_session_id, &result.new_session_blob) {
            dispatcher
                .sessions
                .put(
                    request_id,
                    session_id,
                    &request.agent_config.kind,
                    blob.clone(),
                    blob.len(),
                    Utc::now() + ChronoDuration::seconds(DEFAULT_SESSION_TTL_SECS),
                )
                .await?;
            dispatcher.store.set_latest_session_id(request_id, session_id).await?;
        }

        if !result.success {
            drain.abort();
            strategy.cleanup().await;
            let reason = result.error.clone().unwrap_or_else(|| "agent reported failure".to_string());
            let outcome = loop_outcome(&result);
            dispatcher.breaker_decision(request_id, &outcome).await;
            return terminate_turn(dispatcher, request_id, &totals, &reason).await;
        }

        let outcome = loop_outcome(&result);
        let decision = dispatcher.breaker_decision(request_id, &outcome).await;

        match decision {
            Decision::Continue => {
                let next_session = result.new_session_id.clone();
                let next_blob = result.new_session_blob.clone();
                ctx = AgentContext::new(working_dir.clone(), prompt.clone(), request.agent_config.clone());
                ctx.on_progress = Some(on_progress.clone());
                if let (Some(id), Some(blob)) = (next_session, next_blob) {
                    ctx = ctx.with_resume(id, blob);
                }
                continue;
            }
            Decision::Clarify => {
                drain.abort();
                strategy.cleanup().await;
                return clarify(dispatcher, request_id, &totals, &result).await;
            }
            Decision::Complete => {
                drain.abort();
                strategy.cleanup().await;
                return complete(dispatcher, request_id, &request, &totals, &result, &working_dir).await;
            }
            Decision::Halt => {
                drain.abort();
                strategy.cleanup().await;
                return terminate_turn(dispatcher, request_id, &totals, "circuit breaker open").await;
            }
        }
    }

    // Loop budget exhausted without a terminal decision: treat as halted.
    strategy.cleanup().await;
    drain.abort();
    terminate_turn(dispatcher, request_id, &totals, "max turns exceeded without a terminal decision").await
}

fn loop_outcome(result: &AgentResult) -> LoopOutcome {
    let (status, _confidence) = parse_status(&result.raw_output);
    let pr_ready = status.pr_ready;
    LoopOutcome {
        status: Some(status),
        files_modified: result.files_modified,
        pr_ready,
        error_signature: extract_error_signature(&result.raw_output),
    }
}

/// `clarify` decision (spec §4.H step 4 "`clarify` -> write `clarification_ask`
/// message, transition `awaiting_clarification`, notify").
async fn clarify(
    dispatcher: &Arc<Dispatcher>,
    request_id: &RequestId,
    totals: &TurnTotals,
    result: &AgentResult,
) -> Result<(), DispatchError> {
    let questions = &result.clarification.questions;
    let content = if questions.is_empty() {
        "clarification needed".to_string()
    } else {
        questions.join(" | ")
    };

    dispatcher
        .log
        .append(
            request_id,
            MessageType::ClarificationAsk,
            MessageSource::System,
            &content,
            None,
            None,
            MessageMetadata {
                extra: [(
                    "questions".to_string(),
                    serde_json::to_value(questions).unwrap_or_default(),
                )]
                .into_iter()
                .collect(),
                ..MessageMetadata::empty()
            },
        )
        .await?;

    let request = dispatcher
        .store
        .update_status(request_id, RequestStatus::AwaitingClarification, totals.patch(false))
        .await?;

    dispatcher
        .notifier
        .notify(&request, NotificationEvent::ClarificationNeeded { questions })
        .await;
    Ok(())
}

/// `complete` decision (spec §4.H step 4): opens a PR, pushes to the already
/// open PR's branch, or — no files modified, no PR — lands on `completed`
/// (spec §4.J "analysis completed without code changes").
async fn complete(
    dispatcher: &Arc<Dispatcher>,
    request_id: &RequestId,
    request: &warden_types::Request,
    totals: &TurnTotals,
    result: &AgentResult,
    working_dir: &std::path::Path,
) -> Result<(), DispatchError> {
    if let Some(existing_branch) = request.pull_request.branch_name.clone() {
        let stats = dispatcher.repo.push_to_existing(working_dir, &existing_branch).await?;
        dispatcher
            .log
            .append(
                request_id,
                MessageType::PrUpdated,
                MessageSource::System,
                &result.summary,
                None,
                None,
                MessageMetadata {
                    diff: Some(format!(
                        "+{} -{} across {} files",
                        stats.insertions, stats.deletions, stats.files_changed
                    )),
                    ..MessageMetadata::empty()
                },
            )
            .await?;
        let updated = dispatcher
            .store
            .update_status(request_id, RequestStatus::PrCreated, totals.patch(false))
            .await?;
        dispatcher
            .notifier
            .notify(
                &updated,
                NotificationEvent::PullRequestUpdated {
                    url: updated.pull_request.url.as_deref().unwrap_or_default(),
                    summary: &result.summary,
                },
            )
            .await;
        return Ok(());
    }

    if result.files_modified == 0 {
        dispatcher
            .log
            .append(
                request_id,
                MessageType::ProcessingUpdate,
                MessageSource::System,
                &result.summary,
                None,
                None,
                MessageMetadata::empty(),
            )
            .await?;
        let updated = dispatcher
            .store
            .update_status(request_id, RequestStatus::Completed, totals.patch(true))
            .await?;
        dispatcher
            .notifier
            .notify(&updated, NotificationEvent::AnalysisCompleted { summary: &result.summary })
            .await;
        return Ok(());
    }

    let pr = dispatcher
        .repo
        .open_pull_request(working_dir, &request.title, &result.summary)
        .await?;
    dispatcher
        .store
        .set_pull_request(request_id, Some(&pr.url), Some(pr.number), Some(&pr.branch_name))
        .await?;
    dispatcher
        .log
        .append(
            request_id,
            MessageType::PrCreated,
            MessageSource::System,
            &result.summary,
            None,
            None,
            MessageMetadata::empty(),
        )
        .await?;
    let updated = dispatcher
        .store
        .update_status(request_id, RequestStatus::PrCreated, totals.patch(false))
        .await?;
    dispatcher
        .notifier
        .notify(
            &updated,
            NotificationEvent::PullRequestCreated { url: &pr.url, summary: &result.summary },
        )
        .await;
    Ok(())
}

/// Every non-continuing failure path funnels here: logs a typed `error`
/// message, transitions to `error` (spec §7 "Every terminal `error`
/// transition MUST write a Log entry with `errorCode`, `errorMessage`"),
/// and notifies with a retry affordance. Handled locally rather than by
/// returning `Err` up to the generic dispatcher failure path so the
/// accumulated per-turn cost/duration (`totals`) lands in the same
/// `update_status` call as the transition.
async fn terminate_turn(
    dispatcher: &Arc<Dispatcher>,
    request_id: &RequestId,
    totals: &TurnTotals,
    reason: &str,
) -> Result<(), DispatchError> {
    let Some(request) = dispatcher.store.find_by_request_id(request_id).await? else {
        return Ok(());
    };
    if !request.status.can_transition_to(RequestStatus::Error) {
        return Ok(());
    }

    dispatcher
        .log
        .append(
            request_id,
            MessageType::Error,
            MessageSource::System,
            reason,
            None,
            None,
            MessageMetadata::error("agent_failure", reason),
        )
        .await?;

    let updated = dispatcher
        .store
        .update_status(request_id, RequestStatus::Error, totals.patch(true))
        .await?;

    dispatcher
        .notifier
        .notify(&updated, NotificationEvent::Error { reason, retryable: true })
        .await;
    Ok(())
}
