//! Strategy registration-by-manifest (spec §9 "Cyclic and pluggable
//! graphs"): each agent kind is described by a static record, and the
//! factory builds instances on first use from a kind-keyed registry rather
//! than a compiled-in match over concrete types. Adding an agent means
//! registering a new manifest + constructor, not recompiling the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;
use crate::strategy::Strategy;

/// Static description of one agent kind (spec §9).
#[derive(Clone, Debug)]
pub struct AgentManifest {
    pub kind: String,
    pub display_name: String,
    pub supported_providers: Vec<String>,
    /// Environment variable names this agent needs present (checked against
    /// available credentials, not parsed here).
    pub required_env_keys: Vec<String>,
}

/// Builds a `Strategy` instance for a manifest, given the resolved
/// provider/model and the set of LLM providers with configured credentials.
/// Returns `MissingCredentials` if the resolved provider isn't in
/// `available_providers` (spec §4.E "the factory... MUST return an error if
/// required credentials for the resolved provider are absent").
pub type StrategyConstructor = Arc<
    dyn Fn(Option<&str>, Option<&str>, &[String]) -> Result<Arc<dyn Strategy>, AgentError>
        + Send
        + Sync,
>;

struct Registration {
    manifest: AgentManifest,
    constructor: StrategyConstructor,
}

/// Kind-keyed registry + factory (spec §4.E "Factory & router").
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    entries: HashMap<String, Arc<Registration>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, manifest: AgentManifest, constructor: StrategyConstructor) {
        let kind = manifest.kind.clone();
        self.entries.insert(
            kind,
            Arc::new(Registration {
                manifest,
                constructor,
            }),
        );
    }

    pub fn manifest(&self, kind: &str) -> Option<&AgentManifest> {
        self.entries.get(kind).map(|r| &r.manifest)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Resolves an agent kind (and optional provider/model) to a `Strategy`
    /// instance. Fails with `UnknownKind` if the kind isn't registered, or
    /// `MissingCredentials` if the resolved provider has no configured key.
    pub fn build(
        &self,
        kind: &str,
        provider: Option<&str>,
        model: Option<&str>,
        available_providers: &[String],
    ) -> Result<Arc<dyn Strategy>, AgentError> {
        let reg = self
            .entries
            .get(kind)
            .ok_or_else(|| AgentError::UnknownKind(kind.to_string()))?;
        if let Some(p) = provider {
            if !reg.manifest.supported_providers.iter().any(|sp| sp == p) {
                return Err(AgentError::Validation(format!(
                    "agent {kind} does not support provider {p}"
                )));
            }
        }
        (reg.constructor)(provider, model, available_providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AgentContext, AgentResult};

    struct StubStrategy;

    #[async_trait::async_trait]
    impl Strategy for StubStrategy {
        fn kind(&self) -> &str {
            "stub"
        }
        async fn execute(&self, _ctx: AgentContext) -> Result<AgentResult, AgentError> {
            Ok(AgentResult::failed("unused"))
        }
        async fn abort(&self) {}
        fn capabilities(&self) -> crate::strategy::Capabilities {
            Default::default()
        }
        async fn validate(&self, _ctx: &AgentContext) -> Vec<String> {
            Vec::new()
        }
        async fn cleanup(&self) {}
    }

    fn registry_with_stub() -> StrategyRegistry {
        let mut reg = StrategyRegistry::new();
        reg.register(
            AgentManifest {
                kind: "stub".into(),
                display_name: "Stub".into(),
                supported_providers: vec!["anthropic".into()],
                required_env_keys: vec![],
            },
            Arc::new(|_provider, _model, available: &[String]| {
                if available.iter().any(|p| p == "anthropic") {
                    Ok(Arc::new(StubStrategy) as Arc<dyn Strategy>)
                } else {
                    Err(AgentError::MissingCredentials("anthropic".into()))
                }
            }),
        );
        reg
    }

    #[test]
    fn unknown_kind_errors() {
        let reg = registry_with_stub();
        let err = reg.build("nope", None, None, &["anthropic".to_string()]);
        assert!(matches!(err, Err(AgentError::UnknownKind(_))));
    }

    #[test]
    fn missing_credentials_surfaces_from_constructor() {
        let reg = registry_with_stub();
        let err = reg.build("stub", None, None, &[]);
        assert!(matches!(err, Err(AgentError::MissingCredentials(_))));
    }

    #[test]
    fn unsupported_provider_rejected_before_constructor_runs() {
        let reg = registry_with_stub();
        let err = reg.build("stub", Some("openai"), None, &["anthropic".to_string()]);
        assert!(matches!(err, Err(AgentError::Validation(_))));
    }

    #[test]
    fn builds_with_supported_provider_and_credentials() {
        let reg = registry_with_stub();
        let strat = reg
            .build("stub", Some("anthropic"), None, &["anthropic".to_string()])
            .unwrap();
        assert_eq!(strat.kind(), "stub");
    }
}
