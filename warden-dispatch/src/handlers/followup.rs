//! `chat_clarification_answer` / `chat_suggest_changes` handlers (spec §4.H,
//! §8 scenarios 2 and 4): both re-enter `processing` on an already-known
//! request and re-enqueue `request_execute`; they differ only in which
//! message type and `from_status` they log.

use std::sync::Arc;

use warden_store::StatusPatch;
use warden_types::{MessageMetadata, MessageSource, MessageType, RequestId, RequestStatus};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::message::{ChatUtterance, Correlation, DispatchMessage};

/// Looks up the request this utterance correlates to. Both handlers are
/// reached only via the router (spec §4.K), which has already resolved the
/// utterance to an existing request id — but a replayed message or a stale
/// correlation key is still possible, so handlers re-resolve rather than
/// trust a cached id.
async fn resolve_request_id(
    dispatcher: &Arc<Dispatcher>,
    u: &ChatUtterance,
) -> Result<RequestId, DispatchError> {
    let request = match &u.correlation {
        Correlation::ChatThread { channel, thread_key } => dispatcher
            .store
            .find_most_recent_in_chat_thread(channel, thread_key)
            .await?,
        Correlation::ForgeIssue { repo, issue_number } => {
            dispatcher.store.find_by_forge_issue(repo, *issue_number).await?
        }
        Correlation::RequestId(id) => dispatcher.store.find_by_request_id(id).await?,
    };
    request
        .map(|r| r.id)
        .ok_or_else(|| DispatchError::Validation("no request to correlate follow-up to".into()))
}

async fn reenter_processing(
    dispatcher: &Arc<Dispatcher>,
    request_id: &RequestId,
    from_status: RequestStatus,
    message_type: MessageType,
    u: &ChatUtterance,
) -> Result<(), DispatchError> {
    dispatcher
        .store
        .update_status(request_id, RequestStatus::Processing, StatusPatch::default())
        .await?;

    dispatcher
        .log
        .append(
            request_id,
            message_type,
            MessageSource::Chat,
            &u.text,
            Some(&u.actor_id),
            Some(&u.actor_name),
            MessageMetadata::transition(format!("{from_status:?}").to_lowercase(), "processing"),
        )
        .await?;

    // The request's breaker resets on a fresh turn: a clarification answer or
    // follow-up starts a new run of agent loops, not a continuation of the
    // window that may have driven it into `awaiting_clarification`/`pr_created`.
    dispatcher.reset_breaker(request_id);

    dispatcher
        .queue
        .enqueue(DispatchMessage::RequestExecute {
            request_id: request_id.clone(),
        })
        .await
        .map_err(|e| DispatchError::Queue(e.to_string()))?;

    Ok(())
}

/// `chat_clarification_answer` (spec §8 scenario 2): only valid when the
/// request is actually `awaiting_clarification`; a replayed or stale message
/// against a request in any other state is a no-op success (idempotence,
/// spec §8's "replaying any queue message for a request in a terminal state
/// produces no additional log entries" extended here to non-matching states).
pub async fn clarification_answer(
    dispatcher: &Arc<Dispatcher>,
    u: &ChatUtterance,
) -> Result<(), DispatchError> {
    let request_id = resolve_request_id(dispatcher, u).await?;
    let Some(request) = dispatcher.store.find_by_request_id(&request_id).await? else {
        return Ok(());
    };
    if request.status != RequestStatus::AwaitingClarification {
        return Ok(());
    }
    reenter_processing(
        dispatcher,
        &request_id,
        RequestStatus::AwaitingClarification,
        MessageType::ClarificationAnswer,
        u,
    )
    .await
}

/// `chat_suggest_changes` (spec §8 scenario 4): a follow-up against a
/// `pr_created` request. The execute handler re-clones at the persisted
/// `pull_request.branch_name` rather than the default branch (spec §4.H step
/// 2 "or, for follow-up, at the persisted prBranchName") because it reads
/// the request's existing branch, not anything set here.
pub async fn suggest_changes(dispatcher: &Arc<Dispatcher>, u: &ChatUtterance) -> Result<(), DispatchError> {
    let request_id = resolve_request_id(dispatcher, u).await?;
    let Some(request) = dispatcher.store.find_by_request_id(&request_id).await? else {
        return Ok(());
    };
    if request.status != RequestStatus::PrCreated {
        return Ok(());
    }
    reenter_processing(
        dispatcher,
        &request_id,
        RequestStatus::PrCreated,
        MessageType::FollowUpRequest,
        u,
    )
    .await
}
