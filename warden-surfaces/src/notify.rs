//! `NotificationSink` implementations that actually reach the chat/forge
//! APIs (spec §4.J): `ForgeNotifier` posts issue comments via `octocrab`,
//! `ChatNotifier` sends messages via `teloxide_core`. `SurfaceNotifier`
//! composes both and picks the originating surface from `Request.correlation`
//! — a request has at most one of a chat thread or a forge issue (spec §3),
//! so the pick is never ambiguous.
//!
//! Per spec §4.J, delivery failures are logged, never propagated: every
//! method here swallows its own errors into a `tracing::warn!` and returns.

use std::sync::Arc;

use teloxide_core::prelude::*;
use warden_configstore::{ChatConfig, ConfigStore, ForgeConfig};
use warden_dispatch::{NotificationEvent, NotificationSink};
use warden_types::Request;

use crate::error::SurfaceError;

fn split_repo(repo: &str) -> Result<(&str, &str), SurfaceError> {
    repo.split_once('/')
        .ok_or_else(|| SurfaceError::MalformedPayload(format!("repo {repo:?} is not owner/name")))
}

fn format_event(event: &NotificationEvent<'_>) -> String {
    match event {
        NotificationEvent::RequestAccepted => "Request accepted, starting work.".to_string(),
        NotificationEvent::ClarificationNeeded { questions } => {
            let mut body = "I need some clarification before continuing:\n".to_string();
            for q in *questions {
                body.push_str("- ");
                body.push_str(q);
                body.push('\n');
            }
            body
        }
        NotificationEvent::PullRequestCreated { url, summary } => {
            format!("Opened a pull request: {url}\n\n{summary}")
        }
        NotificationEvent::PullRequestUpdated { url, summary } => {
            format!("Updated the pull request: {url}\n\n{summary}")
        }
        NotificationEvent::AnalysisCompleted { summary } => summary.to_string(),
        NotificationEvent::Error { reason, retryable } => {
            if *retryable {
                format!("Something went wrong: {reason}\n\nYou can retry this request.")
            } else {
                format!("Something went wrong: {reason}")
            }
        }
    }
}

/// Posts an `event` as an issue comment on the request's forge issue. Built
/// fresh per call rather than cached, since the stored forge credentials can
/// change between requests (spec §4.D config is mutable at runtime).
pub struct ForgeNotifier;

impl ForgeNotifier {
    /// Treats `ForgeConfig.private_key` as a bearer/personal-access token
    /// rather than performing the GitHub App JWT/installation-token
    /// exchange: full App auth is itself outside the core per spec.md §1's
    /// exclusion of credential/auth primitives, and a PAT-style token
    /// exercises the same `octocrab` comment-posting path a real
    /// installation token would.
    fn client(cfg: &ForgeConfig) -> Result<octocrab::Octocrab, SurfaceError> {
        octocrab::OctocrabBuilder::new()
            .personal_token(cfg.private_key.clone())
            .build()
            .map_err(|e| SurfaceError::Forge(e.to_string()))
    }

    async fn post_comment(cfg: &ForgeConfig, repo: &str, issue_number: i64, body: &str) -> Result<(), SurfaceError> {
        let (owner, name) = split_repo(repo)?;
        let client = Self::client(cfg)?;
        client
            .issues(owner, name)
            .create_comment(issue_number as u64, body)
            .await
            .map_err(|e| SurfaceError::Forge(e.to_string()))?;
        Ok(())
    }
}

/// Sends an `event` as a chat message, in-thread where a thread key is known.
pub struct ChatNotifier;

impl ChatNotifier {
    async fn send(cfg: &ChatConfig, channel: &str, thread_key: Option<&str>, body: &str) -> Result<(), SurfaceError> {
        let chat_id: i64 = channel
            .parse()
            .map_err(|_| SurfaceError::MalformedPayload(format!("channel {channel:?} is not a chat id")))?;
        let bot = Bot::new(cfg.bot_token.clone());
        let mut request = bot.send_message(ChatId(chat_id), body);
        if let Some(thread_key) = thread_key.and_then(|t| t.parse::<i32>().ok()) {
            request = request.message_thread_id(thread_key);
        }
        request.send().await.map_err(|e| SurfaceError::Chat(e.to_string()))?;
        Ok(())
    }
}

/// Composite `NotificationSink`: dispatches to `ForgeNotifier` or
/// `ChatNotifier` by which correlation fields are populated on the request
/// (spec §4.J "in-thread where a thread key is known").
pub struct SurfaceNotifier {
    config: Arc<dyn ConfigStore>,
}

impl SurfaceNotifier {
    pub fn new(config: Arc<dyn ConfigStore>) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl NotificationSink for SurfaceNotifier {
    async fn notify(&self, request: &Request, event: NotificationEvent<'_>) {
        let body = format_event(&event);

        if let (Some(repo), Some(issue_number)) = (
            request.correlation.forge_repo.as_deref(),
            request.correlation.forge_issue_number,
        ) {
            match self.config.get_forge().await {
                Ok(Some(cfg)) => {
                    if let Err(e) = ForgeNotifier::post_comment(&cfg, repo, issue_number, &body).await {
                        tracing::warn!(request_id = %request.id, error = %e, "forge notification failed");
                    }
                }
                Ok(None) => tracing::warn!(request_id = %request.id, "forge notification skipped: no forge config"),
                Err(e) => tracing::warn!(request_id = %request.id, error = %e, "forge config lookup failed"),
            }
            return;
        }

        if let Some(channel) = request.correlation.chat_channel.as_deref() {
            match self.config.get_chat().await {
                Ok(Some(cfg)) => {
                    let thread_key = request.correlation.chat_thread_key.as_deref();
                    if let Err(e) = ChatNotifier::send(&cfg, channel, thread_key, &body).await {
                        tracing::warn!(request_id = %request.id, error = %e, "chat notification failed");
                    }
                }
                Ok(None) => tracing::warn!(request_id = %request.id, "chat notification skipped: no chat config"),
                Err(e) => tracing::warn!(request_id = %request.id, error = %e, "chat config lookup failed"),
            }
            return;
        }

        tracing::warn!(request_id = %request.id, "notification skipped: request has no surface correlation");
    }
}
