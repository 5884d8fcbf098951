//! Agent strategy contract (spec §4.E): the pluggable surface the
//! dispatcher executes every coding agent through, with a session-blob
//! persistence protocol that lets stateless containers resume stateful
//! agents.

pub mod adapters;
pub mod context;
pub mod error;
pub mod registry;
pub mod repo_surface;
pub mod router;
pub mod strategy;

pub use context::{AgentContext, AgentResult, ClarificationPayload, ProgressCallback};
pub use error::AgentError;
pub use registry::{AgentManifest, StrategyConstructor, StrategyRegistry};
pub use repo_surface::{DiffStats, NoopRepoSurface, PullRequestHandle, RepoSurface};
pub use router::{build_agent_config, parse_engine_label, select_agent, AgentSelection, SystemDefaults};
pub use strategy::{Capabilities, Strategy};
