//! Typed configuration rows: integration credentials and system defaults,
//! exactly one row per kind tag (spec §4.D). Secret fields never reach disk
//! as plaintext — every read/write crosses the `Encryptor` boundary.

pub mod encryptor;
pub mod error;
pub mod records;
pub mod sqlite_store;
pub mod trait_def;

pub use encryptor::{Encryptor, NoopEncryptor};
pub use error::ConfigError;
pub use records::{
    AuthConfig, ChatConfig, ForgeConfig, LlmConfig, LlmProvider, SystemDefaultsConfig,
    ALL_LLM_PROVIDERS,
};
pub use sqlite_store::SqliteConfigStore;
pub use trait_def::ConfigStore;
