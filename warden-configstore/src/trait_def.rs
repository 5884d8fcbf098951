//! `ConfigStore` trait (spec §4.D): one row per kind tag, exactly.

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::records::{AuthConfig, ChatConfig, ForgeConfig, LlmConfig, SystemDefaultsConfig};

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_forge(&self) -> Result<Option<ForgeConfig>, ConfigError>;
    async fn upsert_forge(&self, record: ForgeConfig) -> Result<(), ConfigError>;

    async fn get_chat(&self) -> Result<Option<ChatConfig>, ConfigError>;
    async fn upsert_chat(&self, record: ChatConfig) -> Result<(), ConfigError>;

    async fn get_llm(&self) -> Result<Option<LlmConfig>, ConfigError>;
    async fn upsert_llm(&self, record: LlmConfig) -> Result<(), ConfigError>;

    async fn get_system_defaults(&self) -> Result<Option<SystemDefaultsConfig>, ConfigError>;
    async fn upsert_system_defaults(&self, record: SystemDefaultsConfig) -> Result<(), ConfigError>;

    async fn get_auth(&self) -> Result<Option<AuthConfig>, ConfigError>;
    async fn upsert_auth(&self, record: AuthConfig) -> Result<(), ConfigError>;
}
