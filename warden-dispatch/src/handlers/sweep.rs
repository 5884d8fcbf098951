//! `session_sweep` handler (spec §4.C, §10.5): prunes expired session blobs.
//! Has no request correlation (`DispatchMessage::correlation` returns `None`
//! for `SessionSweep`), so it runs without the per-request advisory lock
//! other handlers take.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

pub async fn sweep(dispatcher: &Arc<Dispatcher>) -> Result<(), DispatchError> {
    let deleted = dispatcher.sessions.delete_expired(Utc::now()).await?;
    if deleted > 0 {
        info!(deleted, "swept expired session blobs");
    }
    Ok(())
}
