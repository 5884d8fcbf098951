//! `chat_retry_request` handler (spec §4.G: `error` and `cancelled` both have
//! `pending` as their sole legal next state, reached "on retry"). Resets the
//! circuit breaker (spec §4.F "terminal until explicit reset on a new
//! request or a `retry` user action") and re-runs the same intake path a
//! fresh request would take.

use std::sync::Arc;

use warden_store::StatusPatch;
use warden_types::{MessageMetadata, MessageSource, MessageType, RequestStatus};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::message::ChatRetryRequest;

pub async fn retry(dispatcher: &Arc<Dispatcher>, r: &ChatRetryRequest) -> Result<(), DispatchError> {
    let Some(request) = dispatcher.store.find_by_request_id(&r.request_id).await? else {
        return Err(DispatchError::Validation("unknown request".into()));
    };

    if !matches!(request.status, RequestStatus::Error | RequestStatus::Cancelled) {
        // Idempotent no-op: a replayed retry against a request that already
        // moved on (e.g. a second retry click) changes nothing.
        return Ok(());
    }

    dispatcher
        .store
        .update_status(&r.request_id, RequestStatus::Pending, StatusPatch::default())
        .await?;
    dispatcher.store.increment_retry(&r.request_id).await?;
    dispatcher.reset_breaker(&r.request_id);

    dispatcher
        .log
        .append(
            &r.request_id,
            MessageType::Retry,
            MessageSource::Chat,
            "retry requested",
            Some(&r.actor_id),
            None,
            MessageMetadata::transition(format!("{:?}", request.status).to_lowercase(), "pending"),
        )
        .await?;

    crate::handlers::intake::start_processing(dispatcher, &r.request_id).await
}
