//! `chat_mention` handler (spec §4.K): correlates a new utterance — a chat
//! mention or a forge-issue comment — to an in-flight request, or starts a
//! new one. Pure grammar parsing (`[k=v, ...]`) lives in `warden_router`;
//! this module adds the store lookups and repo-resolution priority spec
//! §4.K's final paragraph describes.

use std::sync::Arc;

use warden_types::RequestStatus;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::message::{ChatUtterance, Correlation, CreateFromChat, DispatchMessage};

/// Repository-selection priority (spec §4.K final paragraph): inline
/// `repo=` -> system-default repository -> the sole configured repository,
/// if exactly one -> `needs_repo` error.
async fn resolve_repo(
    dispatcher: &Arc<Dispatcher>,
    inline_repo: Option<&str>,
) -> Result<String, DispatchError> {
    if let Some(repo) = inline_repo {
        return Ok(repo.to_string());
    }
    let defaults = dispatcher
        .config
        .get_system_defaults()
        .await
        .map_err(|e| DispatchError::Validation(e.to_string()))?;
    if let Some(repo) = defaults.and_then(|d| d.default_repository) {
        return Ok(repo);
    }
    let forge = dispatcher
        .config
        .get_forge()
        .await
        .map_err(|e| DispatchError::Validation(e.to_string()))?;
    if let Some(forge) = forge {
        if forge.repositories.len() == 1 {
            return Ok(forge.repositories[0].clone());
        }
    }
    Err(DispatchError::Validation("needs_repo".into()))
}

async fn enqueue(dispatcher: &Arc<Dispatcher>, message: DispatchMessage) -> Result<(), DispatchError> {
    dispatcher
        .queue
        .enqueue(message)
        .await
        .map_err(|e| DispatchError::Queue(e.to_string()))
        .map(|_| ())
}

/// Step 2 (force-new) and the "not found" branches of steps 3/4 all end up
/// here: enqueue a fresh `request_create_from_chat` with the resolved repo.
async fn create_new_chat_request(
    dispatcher: &Arc<Dispatcher>,
    channel: &str,
    thread_key: &str,
    u: &ChatUtterance,
) -> Result<(), DispatchError> {
    let options = warden_router::parse_inline_options(&u.text);
    let description = warden_router::strip_inline_options(&u.text);
    let repo = resolve_repo(dispatcher, options.get("repo").map(String::as_str)).await?;

    enqueue(
        dispatcher,
        DispatchMessage::RequestCreateFromChat(CreateFromChat {
            channel: channel.to_string(),
            thread_key: thread_key.to_string(),
            repo: Some(repo),
            description,
            request_type: options.get("type").cloned(),
            agent_hint: options.get("agent").cloned(),
            actor_id: u.actor_id.clone(),
            actor_name: u.actor_name.clone(),
        }),
    )
    .await
}

/// `chat_mention` handler entry point (spec §4.K steps 1-4).
pub async fn route_mention(dispatcher: &Arc<Dispatcher>, u: &ChatUtterance) -> Result<(), DispatchError> {
    match &u.correlation {
        Correlation::ChatThread { channel, thread_key } => {
            // Step 2: the literal `agent ` prefix forces a new request
            // regardless of thread state.
            if u.text.trim_start().to_ascii_lowercase().starts_with("agent ") {
                return create_new_chat_request(dispatcher, channel, thread_key, u).await;
            }

            // Step 3: correlate to the most recent non-terminal request in this
            // thread. Uses the broader lookup (not `find_active_in_chat_thread`,
            // which excludes `pr_created`) so a follow-up to an already-`pr_created`
            // request still correlates (spec §8 scenario 4).
            match dispatcher
                .store
                .find_most_recent_in_chat_thread(channel, thread_key)
                .await?
            {
                Some(existing) if existing.status == RequestStatus::AwaitingClarification => {
                    enqueue(dispatcher, DispatchMessage::ChatClarificationAnswer(u.clone())).await
                }
                Some(_existing) => {
                    enqueue(dispatcher, DispatchMessage::ChatSuggestChanges(u.clone())).await
                }
                None => create_new_chat_request(dispatcher, channel, thread_key, u).await,
            }
        }
        Correlation::ForgeIssue { repo, issue_number } => {
            // Step 4: correlate by (repo, issue-number); ignore if no request exists.
            let Some(existing) = dispatcher
                .store
                .find_by_forge_issue(repo, *issue_number)
                .await?
            else {
                return Ok(());
            };
            if existing.status == RequestStatus::AwaitingClarification {
                enqueue(dispatcher, DispatchMessage::ChatClarificationAnswer(u.clone())).await
            } else if existing.pull_request.url.is_some() {
                enqueue(dispatcher, DispatchMessage::ChatSuggestChanges(u.clone())).await
            } else {
                Ok(())
            }
        }
        Correlation::RequestId(_) => Err(DispatchError::Validation(
            "a mention must correlate by chat thread or forge issue".into(),
        )),
    }
}
