//! Library surface for the request-lifecycle engine (spec §6): the same
//! store/log/session/config/queue/registry wiring `main.rs` runs at process
//! startup, exposed as a callable so black-box tests can bind the axum
//! router to an ephemeral port without going through a real binary.

pub mod app;
pub mod handlers;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use warden_agent::{AgentManifest, NoopRepoSurface, StrategyRegistry};
use warden_breaker::BreakerConfig;
use warden_configstore::{NoopEncryptor, SqliteConfigStore};
use warden_dispatch::{Dispatcher, LoggingNotificationSink, SqliteQueue};
use warden_log::sqlite_log;
use warden_session::SqliteSessionBlobStore;
use warden_store::SqliteRequestStore;

use app::AppState;

/// Registers the built-in agent strategies (spec §4.E) against a fresh
/// registry. `claude-code` requires `ANTHROPIC_API_KEY`-style credentials at
/// build time via its manifest's `required_env_keys`; `mock` never does,
/// which is what lets tests route requests to it without touching a real
/// provider.
pub fn register_strategies(registry: &mut StrategyRegistry) {
    registry.register(
        AgentManifest {
            kind: "mock".to_string(),
            display_name: "Mock".to_string(),
            supported_providers: vec![],
            required_env_keys: vec![],
        },
        Arc::new(|_provider, _model, _available: &[String]| {
            Ok(Arc::new(warden_agent::adapters::mock::MockStrategy::new(Vec::new()))
                as Arc<dyn warden_agent::Strategy>)
        }),
    );

    registry.register(
        AgentManifest {
            kind: "claude-code".to_string(),
            display_name: "Claude Code".to_string(),
            supported_providers: vec!["anthropic".to_string()],
            required_env_keys: vec!["ANTHROPIC_API_KEY".to_string()],
        },
        Arc::new(|provider, _model, available: &[String]| {
            let provider = provider.unwrap_or("anthropic").to_string();
            if !available.iter().any(|p| p == &provider) {
                return Err(warden_agent::AgentError::MissingCredentials(provider));
            }
            let binary = std::env::var("CLAUDE_CODE_BINARY").unwrap_or_else(|_| "claude".to_string());
            Ok(Arc::new(
                warden_agent::adapters::claude_code::ClaudeCodeStrategy::new(binary, Some(provider)),
            ) as Arc<dyn warden_agent::Strategy>)
        }),
    );
}

/// Periodically enqueues `session_sweep` (spec §10.5). Runs until `shutdown`
/// flips to `true`.
pub async fn session_sweep_loop(
    queue: Arc<dyn warden_dispatch::Queue>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = queue.enqueue(warden_dispatch::DispatchMessage::SessionSweep).await {
                    tracing::warn!(error = %e, "failed to enqueue session_sweep");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Everything a caller needs to serve HTTP traffic and run the background
/// dispatcher loop: the shared HTTP state plus the dispatcher itself (so the
/// caller controls when/whether to spawn its `run` loop and how to shut it
/// down).
pub struct Engine {
    pub state: Arc<AppState>,
    pub dispatcher: Arc<Dispatcher>,
    pub queue: Arc<dyn warden_dispatch::Queue>,
}

/// Builds the full set of SQLite-backed stores, registers agent strategies,
/// and wires a `Dispatcher`, under `data_dir` (created if absent). This is
/// the one place the engine's dependency graph is assembled; `main.rs` and
/// integration tests both go through it so they stay wired identically.
pub async fn bootstrap(
    data_dir: &Path,
    max_in_flight: usize,
) -> Result<Engine, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(data_dir)?;

    let store: Arc<dyn warden_store::RequestStore> =
        Arc::new(SqliteRequestStore::new(data_dir.join("requests.db"))?);
    let log = sqlite_log::shared(data_dir.join("log.db"))?;
    let sessions: Arc<dyn warden_session::SessionBlobStore> =
        Arc::new(SqliteSessionBlobStore::new(data_dir.join("sessions.db"))?);
    let config_store: Arc<dyn warden_configstore::ConfigStore> = Arc::new(SqliteConfigStore::new(
        data_dir.join("config.db"),
        Arc::new(NoopEncryptor),
    )?);
    let queue: Arc<dyn warden_dispatch::Queue> = Arc::new(SqliteQueue::new(data_dir.join("queue.db"))?);

    let mut registry = StrategyRegistry::new();
    register_strategies(&mut registry);
    let registry = Arc::new(registry);

    let repo: Arc<dyn warden_agent::RepoSurface> = Arc::new(NoopRepoSurface);
    let notifier: Arc<dyn warden_dispatch::NotificationSink> = match std::env::var("WARDEN_SURFACE_NOTIFICATIONS") {
        Ok(v) if v == "1" => Arc::new(warden_surfaces::SurfaceNotifier::new(config_store.clone())),
        _ => Arc::new(LoggingNotificationSink),
    };

    let working_dir_root = data_dir.join("work");
    std::fs::create_dir_all(&working_dir_root)?;

    let dispatcher = Arc::new(Dispatcher::new(
        queue.clone(),
        store.clone(),
        log.clone(),
        sessions.clone(),
        registry,
        repo,
        config_store.clone(),
        notifier,
        BreakerConfig::default(),
        working_dir_root,
        max_in_flight,
    ));

    let forge_webhook_secret = config_store
        .get_forge()
        .await
        .ok()
        .flatten()
        .map(|cfg| cfg.webhook_secret)
        .filter(|s| !s.is_empty());

    let state = Arc::new(AppState {
        queue: queue.clone(),
        store,
        log,
        sessions,
        config: config_store,
        forge_webhook_secret,
    });

    Ok(Engine { state, dispatcher, queue })
}
