//! `request_create_from_forge` / `request_create_from_chat` handlers
//! (spec §4.H, §4.I "create" primitive). Idempotent: a duplicate forge issue
//! or an already-active chat thread is rejected without mutating state.

use std::sync::Arc;

use warden_agent::{build_agent_config, select_agent, AgentSelection, SystemDefaults};
use warden_store::NewRequest;
use warden_types::{AgentConfig, MessageMetadata, MessageSource, MessageType, Origin, RequestStatus, RequestType};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::message::{CreateFromChat, CreateFromForge, DispatchMessage};

fn parse_request_type(s: Option<&str>) -> RequestType {
    match s.map(str::to_ascii_lowercase).as_deref() {
        Some("bug") => RequestType::Bug,
        Some("refactor") => RequestType::Refactor,
        Some("docs") => RequestType::Docs,
        Some("question") => RequestType::Question,
        _ => RequestType::Feature,
    }
}

/// Builds an `AgentConfig` for a new request (spec §4.E "Factory & router"
/// priority: explicit hint, then forge-issue `engine:<kind>[:<provider>]`
/// labels, then system defaults).
async fn resolve_agent_config(
    dispatcher: &Arc<Dispatcher>,
    explicit_hint: Option<&str>,
    forge_labels: &[String],
) -> Result<AgentConfig, DispatchError> {
    let defaults = dispatcher
        .config
        .get_system_defaults()
        .await
        .map_err(|e| DispatchError::Validation(e.to_string()))?
        .unwrap_or_default();

    let system_defaults = SystemDefaults {
        agent_kind: if defaults.default_agent_kind.is_empty() {
            "claude-code".to_string()
        } else {
            defaults.default_agent_kind.clone()
        },
        provider: defaults.default_provider.clone(),
    };
    let hint = explicit_hint.map(|kind| AgentSelection {
        kind: kind.to_string(),
        provider: None,
    });
    let selection = select_agent(hint.as_ref(), forge_labels, &system_defaults);

    Ok(build_agent_config(&selection, defaults.default_model.clone(), None, None))
}

pub async fn create_from_forge(
    dispatcher: &Arc<Dispatcher>,
    c: &CreateFromForge,
) -> Result<(), DispatchError> {
    if dispatcher
        .store
        .find_by_forge_issue(&c.repo, c.issue_number)
        .await?
        .is_some()
    {
        // Duplicate delivery (spec §8 scenario 5, §7 `duplicate`): ack
        // silently, no further action.
        return Err(DispatchError::Duplicate);
    }

    let agent_config = resolve_agent_config(dispatcher, None, &c.labels).await?;

    let request = dispatcher
        .store
        .create(NewRequest {
            origin: Origin::ForgeIssue,
            repo: c.repo.clone(),
            title: c.title.clone(),
            description: c.description.clone(),
            request_type: RequestType::Feature,
            agent_config,
            chat_channel: None,
            chat_thread_key: None,
            chat_user_id: None,
            forge_repo: Some(c.repo.clone()),
            forge_issue_number: Some(c.issue_number),
            forge_issue_url: Some(c.issue_url.clone()),
        })
        .await?;

    dispatcher
        .log
        .append(
            &request.id,
            MessageType::InitialRequest,
            MessageSource::Forge,
            &c.description,
            Some(&c.actor_id),
            Some(&c.actor_name),
            MessageMetadata::empty(),
        )
        .await?;

    start_processing(dispatcher, &request.id).await
}

pub async fn create_from_chat(
    dispatcher: &Arc<Dispatcher>,
    c: &CreateFromChat,
) -> Result<(), DispatchError> {
    if dispatcher
        .store
        .find_active_in_chat_thread(&c.channel, &c.thread_key)
        .await?
        .is_some()
    {
        return Err(DispatchError::Duplicate);
    }

    let Some(repo) = c.repo.clone() else {
        return Err(DispatchError::Validation("needs_repo".into()));
    };

    let agent_config = resolve_agent_config(dispatcher, c.agent_hint.as_deref(), &[]).await?;

    let request = dispatcher
        .store
        .create(NewRequest {
            origin: Origin::Chat,
            repo,
            title: c.description.chars().take(80).collect(),
            description: c.description.clone(),
            request_type: parse_request_type(c.request_type.as_deref()),
            agent_config,
            chat_channel: Some(c.channel.clone()),
            chat_thread_key: Some(c.thread_key.clone()),
            chat_user_id: Some(c.actor_id.clone()),
            forge_repo: None,
            forge_issue_number: None,
            forge_issue_url: None,
        })
        .await?;

    dispatcher
        .log
        .append(
            &request.id,
            MessageType::InitialRequest,
            MessageSource::Chat,
            &c.description,
            Some(&c.actor_id),
            Some(&c.actor_name),
            MessageMetadata::empty(),
        )
        .await?;

    start_processing(dispatcher, &request.id).await
}

/// Transitions a newly created request to `processing`, appends
/// `processing_started`, and enqueues the hot-path `request_execute`
/// message (spec §4.H step 3).
pub(crate) async fn start_processing(
    dispatcher: &Arc<Dispatcher>,
    request_id: &warden_types::RequestId,
) -> Result<(), DispatchError> {
    dispatcher
        .store
        .update_status(
            request_id,
            RequestStatus::Processing,
            warden_store::StatusPatch::default(),
        )
        .await?;
    dispatcher
        .log
        .append(
            request_id,
            MessageType::ProcessingStarted,
            MessageSource::System,
            "processing started",
            None,
            None,
            MessageMetadata::transition("pending", "processing"),
        )
        .await?;
    dispatcher
        .queue
        .enqueue(DispatchMessage::RequestExecute {
            request_id: request_id.clone(),
        })
        .await
        .map_err(|e| DispatchError::Queue(e.to_string()))?;
    Ok(())
}
