//! Forge webhook → dispatch message (spec §4.I): reduces a webhook delivery
//! to one of the two intake primitives. Everything else about the payload
//! (installation metadata, repository settings changes, …) is ignored — the
//! forge HTTP surface itself is plumbing outside the core (spec §1).

use warden_dispatch::{ChatUtterance, Correlation, CreateFromForge, DispatchMessage};

use crate::error::SurfaceError;

fn field<'a>(v: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(v, |acc, key| acc.get(key))
}

fn str_field(v: &serde_json::Value, path: &str) -> Option<String> {
    field(v, path).and_then(|f| f.as_str()).map(str::to_string)
}

/// Reduces one `/webhook/forge` delivery to a dispatch message, if any.
/// `event_name` is the forge's event-type header (e.g. GitHub's
/// `X-GitHub-Event`); `action` is the payload's own `action` field.
pub fn parse_forge_event(
    event_name: &str,
    payload: &serde_json::Value,
) -> Result<Option<DispatchMessage>, SurfaceError> {
    match (event_name, payload.get("action").and_then(|a| a.as_str())) {
        ("issues", Some("opened")) => Ok(Some(create_from_issue(payload)?)),
        ("issue_comment", Some("created")) => Ok(Some(comment_to_utterance(payload)?)),
        _ => Ok(None),
    }
}

fn create_from_issue(payload: &serde_json::Value) -> Result<DispatchMessage, SurfaceError> {
    let repo = str_field(payload, "repository.full_name")
        .ok_or_else(|| SurfaceError::MalformedPayload("repository.full_name".into()))?;
    let issue_number = field(payload, "issue.number")
        .and_then(|n| n.as_i64())
        .ok_or_else(|| SurfaceError::MalformedPayload("issue.number".into()))?;
    let issue_url = str_field(payload, "issue.html_url").unwrap_or_default();
    let title = str_field(payload, "issue.title").unwrap_or_default();
    let description = str_field(payload, "issue.body").unwrap_or_default();
    let labels = field(payload, "issue.labels")
        .and_then(|l| l.as_array())
        .map(|labels| {
            labels
                .iter()
                .filter_map(|l| l.get("name").and_then(|n| n.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let actor_id = str_field(payload, "issue.user.login").unwrap_or_default();
    let actor_name = actor_id.clone();

    Ok(DispatchMessage::RequestCreateFromForge(CreateFromForge {
        repo,
        issue_number,
        issue_url,
        title,
        description,
        labels,
        actor_id,
        actor_name,
    }))
}

fn comment_to_utterance(payload: &serde_json::Value) -> Result<DispatchMessage, SurfaceError> {
    let repo = str_field(payload, "repository.full_name")
        .ok_or_else(|| SurfaceError::MalformedPayload("repository.full_name".into()))?;
    let issue_number = field(payload, "issue.number")
        .and_then(|n| n.as_i64())
        .ok_or_else(|| SurfaceError::MalformedPayload("issue.number".into()))?;
    let text = str_field(payload, "comment.body").unwrap_or_default();
    let actor_id = str_field(payload, "comment.user.login").unwrap_or_default();
    let actor_name = actor_id.clone();

    Ok(DispatchMessage::ChatMention(ChatUtterance {
        correlation: Correlation::ForgeIssue { repo, issue_number },
        text,
        actor_id,
        actor_name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_opened_becomes_create_from_forge() {
        let payload = serde_json::json!({
            "action": "opened",
            "repository": {"full_name": "acme/api"},
            "issue": {
                "number": 7,
                "html_url": "https://forge.example/acme/api/issues/7",
                "title": "add retries",
                "body": "please add retry logic",
                "labels": [{"name": "engine:claude-code"}],
                "user": {"login": "alice"},
            },
        });
        match parse_forge_event("issues", &payload).unwrap() {
            Some(DispatchMessage::RequestCreateFromForge(c)) => {
                assert_eq!(c.repo, "acme/api");
                assert_eq!(c.issue_number, 7);
                assert_eq!(c.labels, vec!["engine:claude-code".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn issue_labeled_is_ignored() {
        let payload = serde_json::json!({"action": "labeled"});
        assert!(parse_forge_event("issues", &payload).unwrap().is_none());
    }

    #[test]
    fn issue_comment_becomes_chat_mention() {
        let payload = serde_json::json!({
            "action": "created",
            "repository": {"full_name": "acme/api"},
            "issue": {"number": 7},
            "comment": {"body": "looks good, also handle 404s", "user": {"login": "bob"}},
        });
        match parse_forge_event("issue_comment", &payload).unwrap() {
            Some(DispatchMessage::ChatMention(u)) => {
                assert!(matches!(u.correlation, Correlation::ForgeIssue { issue_number: 7, .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
