//! Typed config records (spec §3, §6). Callers see plaintext secret fields;
//! the store encrypts on `upsert_*` and decrypts on `get_*` so only ciphertext
//! ever reaches disk.

use serde::{Deserialize, Serialize};

/// LLM providers recognized by the router/factory (spec §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Anthropic,
    Openai,
    Google,
    Groq,
    Deepseek,
    Mistral,
    Together,
    Fireworks,
}

pub const ALL_LLM_PROVIDERS: [LlmProvider; 8] = [
    LlmProvider::Anthropic,
    LlmProvider::Openai,
    LlmProvider::Google,
    LlmProvider::Groq,
    LlmProvider::Deepseek,
    LlmProvider::Mistral,
    LlmProvider::Together,
    LlmProvider::Fireworks,
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    pub app_id: String,
    pub installation_id: String,
    pub private_key: String,
    pub webhook_secret: String,
    pub repositories: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub signing_secret: String,
    pub bot_token: String,
}

/// One optional key per provider; `available_providers` is how the core
/// derives which providers it may route to (spec §4.D).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub keys: std::collections::HashMap<LlmProvider, String>,
}

impl LlmConfig {
    pub fn available_providers(&self) -> Vec<LlmProvider> {
        let mut providers: Vec<LlmProvider> = self.keys.keys().copied().collect();
        providers.sort_by_key(|p| format!("{p:?}"));
        providers
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SystemDefaultsConfig {
    pub default_agent_kind: String,
    pub default_provider: Option<String>,
    pub default_model: Option<String>,
    pub default_repository: Option<String>,
    pub default_branch: String,
    pub forge_organization_name: Option<String>,
    pub allowed_domains: Vec<String>,
    pub allowed_emails: Vec<String>,
    pub default_policy_id: Option<String>,
}

/// Auth-provider secrets distinct from the system-defaults auth *settings*
/// (allowed-domains/emails/policy-id, which live on `SystemDefaultsConfig`
/// per spec §6). Reserved for OAuth client credentials if/when an auth
/// provider integration is added; empty is a valid, common state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_providers_reflects_present_keys_only() {
        let mut cfg = LlmConfig::default();
        cfg.keys.insert(LlmProvider::Anthropic, "ct1".into());
        cfg.keys.insert(LlmProvider::Openai, "ct2".into());
        let providers = cfg.available_providers();
        assert_eq!(providers.len(), 2);
        assert!(providers.contains(&LlmProvider::Anthropic));
        assert!(providers.contains(&LlmProvider::Openai));
        assert!(!providers.contains(&LlmProvider::Groq));
    }
}
