//! Cross-call invariants that only show up once the table has more than one
//! row or the same request is mutated more than once (spec §3, §8): the
//! duplicate-forge-issue unique constraint, the write-once PR branch name,
//! the transition guard rejecting an illegal jump, and the at-most-one-active
//! row per chat thread rule the follow-up router depends on.

use warden_store::{NewRequest, RequestStore, SqliteRequestStore, StatusPatch, StoreError};
use warden_types::{AgentConfig, Origin, RequestStatus, RequestType};

fn store() -> SqliteRequestStore {
    let file = tempfile::NamedTempFile::new().unwrap();
    SqliteRequestStore::new(file.path()).unwrap()
}

fn forge_request(repo: &str, issue_number: i64) -> NewRequest {
    NewRequest {
        origin: Origin::ForgeIssue,
        repo: repo.to_string(),
        title: "t".to_string(),
        description: "d".to_string(),
        request_type: RequestType::Feature,
        agent_config: AgentConfig::new("mock"),
        chat_channel: None,
        chat_thread_key: None,
        chat_user_id: None,
        forge_repo: Some(repo.to_string()),
        forge_issue_number: Some(issue_number),
        forge_issue_url: Some(format!("https://forge.example/{repo}/issues/{issue_number}")),
    }
}

fn chat_request(channel: &str, thread_key: &str) -> NewRequest {
    NewRequest {
        origin: Origin::Chat,
        repo: "acme/api".to_string(),
        title: "t".to_string(),
        description: "d".to_string(),
        request_type: RequestType::Feature,
        agent_config: AgentConfig::new("mock"),
        chat_channel: Some(channel.to_string()),
        chat_thread_key: Some(thread_key.to_string()),
        chat_user_id: Some("u1".to_string()),
        forge_repo: None,
        forge_issue_number: None,
        forge_issue_url: None,
    }
}

/// **Scenario** (spec §3 invariant 2): a second forge-origin row for the
/// same (repo, issue-number) is rejected at the storage layer, not just by
/// the dispatcher's pre-check.
#[tokio::test]
async fn duplicate_forge_issue_rejected_by_unique_constraint() {
    let store = store();
    store.create(forge_request("acme/api", 7)).await.unwrap();
    let err = store.create(forge_request("acme/api", 7)).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::DuplicateForgeIssue { repo, issue_number }
            if repo == "acme/api" && issue_number == 7
    ));
}

/// A different issue number, or the same issue number on a different repo,
/// is not a duplicate.
#[tokio::test]
async fn distinct_forge_issues_both_succeed() {
    let store = store();
    store.create(forge_request("acme/api", 7)).await.unwrap();
    store.create(forge_request("acme/api", 8)).await.unwrap();
    store.create(forge_request("acme/web", 7)).await.unwrap();
}

/// **Scenario** (spec §3 invariant 4): `pull_request.branch_name` may be set
/// once; a second call attempting a different value is rejected rather than
/// silently overwriting the branch a PR was actually opened against.
#[tokio::test]
async fn pull_request_branch_name_is_write_once() {
    let store = store();
    let request = store.create(chat_request("C1", "T1")).await.unwrap();
    store
        .update_status(&request.id, RequestStatus::Processing, StatusPatch::default())
        .await
        .unwrap();

    let updated = store
        .set_pull_request(&request.id, Some("https://example/pr/1"), Some(1), Some("warden/feature-a"))
        .await
        .unwrap();
    assert_eq!(updated.pull_request.branch_name.as_deref(), Some("warden/feature-a"));

    let err = store
        .set_pull_request(&request.id, Some("https://example/pr/1"), Some(1), Some("warden/feature-b"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ImmutableField(_)));

    // Re-asserting the same value already on the row is not a conflict.
    let reasserted = store
        .set_pull_request(&request.id, Some("https://example/pr/1"), Some(1), Some("warden/feature-a"))
        .await
        .unwrap();
    assert_eq!(reasserted.pull_request.branch_name.as_deref(), Some("warden/feature-a"));
}

/// **Scenario** (spec §4.G): a jump that skips the graph (`pending` straight
/// to `pr_created`) is rejected without mutating the row.
#[tokio::test]
async fn illegal_transition_is_rejected_and_row_is_unchanged() {
    let store = store();
    let request = store.create(chat_request("C2", "T2")).await.unwrap();

    let err = store
        .update_status(&request.id, RequestStatus::PrCreated, StatusPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));

    let reloaded = store.find_by_request_id(&request.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, RequestStatus::Pending);
}

/// **Scenario** (spec §8): at most one active row per (channel, thread-key);
/// `find_active_in_chat_thread` stops seeing the row once it reaches a
/// terminal-for-the-invariant status, even though the row still exists.
#[tokio::test]
async fn at_most_one_active_request_per_chat_thread() {
    let store = store();
    let request = store.create(chat_request("C3", "T3")).await.unwrap();
    assert!(store
        .find_active_in_chat_thread("C3", "T3")
        .await
        .unwrap()
        .is_some());

    store
        .update_status(&request.id, RequestStatus::Processing, StatusPatch::default())
        .await
        .unwrap();
    store
        .update_status(&request.id, RequestStatus::PrCreated, StatusPatch::default())
        .await
        .unwrap();

    assert!(store
        .find_active_in_chat_thread("C3", "T3")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .find_most_recent_in_chat_thread("C3", "T3")
        .await
        .unwrap()
        .is_some());
}

/// **Scenario** (spec §4.B `StatusPatch`): cost/duration deltas accumulate
/// additively across multiple patched transitions rather than overwriting.
#[tokio::test]
async fn status_patch_deltas_accumulate() {
    let store = store();
    let request = store.create(chat_request("C4", "T4")).await.unwrap();
    store
        .update_status(&request.id, RequestStatus::Processing, StatusPatch::default())
        .await
        .unwrap();
    store
        .update_status(
            &request.id,
            RequestStatus::AwaitingClarification,
            StatusPatch {
                cost_cents_delta: Some(10),
                duration_ms_delta: Some(100),
                mark_processed: false,
            },
        )
        .await
        .unwrap();
    store
        .update_status(&request.id, RequestStatus::Processing, StatusPatch::default())
        .await
        .unwrap();
    let final_request = store
        .update_status(
            &request.id,
            RequestStatus::Completed,
            StatusPatch {
                cost_cents_delta: Some(5),
                duration_ms_delta: Some(50),
                mark_processed: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(final_request.cost_cents, 15);
    assert_eq!(final_request.duration_ms, 150);
    assert!(final_request.processed_at.is_some());
}

/// `list_recent` filters by status and respects the limit.
#[tokio::test]
async fn list_recent_filters_by_status_and_limit() {
    let store = store();
    for i in 0..3 {
        store.create(forge_request("acme/api", 100 + i)).await.unwrap();
    }
    let one = store.create(forge_request("acme/api", 200)).await.unwrap();
    store
        .update_status(&one.id, RequestStatus::Processing, StatusPatch::default())
        .await
        .unwrap();

    let pending = store.list_recent(Some(RequestStatus::Pending), 50).await.unwrap();
    assert_eq!(pending.len(), 3);
    let processing = store.list_recent(Some(RequestStatus::Processing), 50).await.unwrap();
    assert_eq!(processing.len(), 1);
    let capped = store.list_recent(None, 2).await.unwrap();
    assert_eq!(capped.len(), 2);
}
