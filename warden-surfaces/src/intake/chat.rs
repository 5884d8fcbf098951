//! Chat surface → dispatch message (spec §4.I, §4.K). Kept agnostic to any
//! one chat platform's wire schema: callers extract `channel`/`thread_key`/
//! `text`/`actor` from whatever their platform's event looks like and hand
//! them to these functions, which only decide which `DispatchMessage` the
//! interaction becomes.

use warden_dispatch::{ChatRetryRequest, ChatUtterance, Correlation, CreateFromChat, DispatchMessage};
use warden_types::RequestId;

/// A slash command (e.g. `/agent fix the flaky test repo=acme/api`) always
/// starts a new request — spec §4.I's "create" primitive, chat origin.
pub fn slash_command(
    channel: &str,
    thread_key: &str,
    text: &str,
    actor_id: &str,
    actor_name: &str,
) -> DispatchMessage {
    let options = warden_router::parse_inline_options(text);
    let description = warden_router::strip_inline_options(text);
    DispatchMessage::RequestCreateFromChat(CreateFromChat {
        channel: channel.to_string(),
        thread_key: thread_key.to_string(),
        repo: options.get("repo").cloned(),
        description,
        request_type: options.get("type").cloned(),
        agent_hint: options.get("agent").cloned(),
        actor_id: actor_id.to_string(),
        actor_name: actor_name.to_string(),
    })
}

/// A bot mention or thread reply: correlation and create-vs-follow-up
/// branching happen in `warden_dispatch::handlers::router`, not here — this
/// is just the generic `chat_mention` envelope (spec §4.K steps 1-4).
pub fn mention(
    channel: &str,
    thread_key: &str,
    text: &str,
    actor_id: &str,
    actor_name: &str,
) -> DispatchMessage {
    DispatchMessage::ChatMention(ChatUtterance {
        correlation: Correlation::ChatThread {
            channel: channel.to_string(),
            thread_key: thread_key.to_string(),
        },
        text: text.to_string(),
        actor_id: actor_id.to_string(),
        actor_name: actor_name.to_string(),
    })
}

/// A "retry" button click on an `error`/`cancelled` request card.
pub fn retry_button(request_id: RequestId, actor_id: &str) -> DispatchMessage {
    DispatchMessage::ChatRetryRequest(ChatRetryRequest {
        request_id,
        actor_id: actor_id.to_string(),
    })
}

/// A modal submission (e.g. the "new request" dialog) collects fields
/// directly rather than through the inline `[k=v,...]` grammar, since the
/// platform UI already gives each field its own input.
#[allow(clippy::too_many_arguments)]
pub fn modal_submission(
    channel: &str,
    thread_key: &str,
    repo: Option<&str>,
    description: &str,
    request_type: Option<&str>,
    agent_hint: Option<&str>,
    actor_id: &str,
    actor_name: &str,
) -> DispatchMessage {
    DispatchMessage::RequestCreateFromChat(CreateFromChat {
        channel: channel.to_string(),
        thread_key: thread_key.to_string(),
        repo: repo.map(str::to_string),
        description: description.to_string(),
        request_type: request_type.map(str::to_string),
        agent_hint: agent_hint.map(str::to_string),
        actor_id: actor_id.to_string(),
        actor_name: actor_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_command_extracts_inline_options() {
        match slash_command("C1", "T1", "fix the bug [repo=acme/api, agent=claude-code]", "u1", "alice") {
            DispatchMessage::RequestCreateFromChat(c) => {
                assert_eq!(c.repo.as_deref(), Some("acme/api"));
                assert_eq!(c.agent_hint.as_deref(), Some("claude-code"));
                assert_eq!(c.description, "fix the bug");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn mention_carries_chat_thread_correlation() {
        match mention("C1", "T1", "also handle the edge case", "u2", "bob") {
            DispatchMessage::ChatMention(u) => {
                assert!(matches!(u.correlation, Correlation::ChatThread { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn retry_button_targets_request_id() {
        let msg = retry_button("r-1".into(), "u3");
        match msg {
            DispatchMessage::ChatRetryRequest(r) => assert_eq!(r.request_id, "r-1".to_string()),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
