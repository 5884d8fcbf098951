//! SQLite-backed `ConfigStore`. One table keyed by tag; each row's payload is
//! a JSON blob whose secret fields have already passed through the
//! `Encryptor` boundary before being written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::encryptor::Encryptor;
use crate::error::ConfigError;
use crate::records::{AuthConfig, ChatConfig, ForgeConfig, LlmConfig, SystemDefaultsConfig};
use crate::trait_def::ConfigStore;

pub struct SqliteConfigStore {
    db_path: PathBuf,
    encryptor: Arc<dyn Encryptor>,
}

fn open(db_path: &Path) -> Result<rusqlite::Connection, ConfigError> {
    let conn =
        rusqlite::Connection::open(db_path).map_err(|e| ConfigError::Storage(e.to_string()))?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_rows (
            tag TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| ConfigError::Storage(e.to_string()))?;
    Ok(conn)
}

impl SqliteConfigStore {
    pub fn new(path: impl AsRef<Path>, encryptor: Arc<dyn Encryptor>) -> Result<Self, ConfigError> {
        let db_path = path.as_ref().to_path_buf();
        open(&db_path)?;
        Ok(Self { db_path, encryptor })
    }

    fn get_raw<T: DeserializeOwned + Send + 'static>(
        &self,
        tag: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        let conn = open(&self.db_path)?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM config_rows WHERE tag = ?1",
                params![tag],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ConfigError::Storage(e.to_string()))?;
        payload
            .map(|p| serde_json::from_str(&p).map_err(|e| ConfigError::Serialization(e.to_string())))
            .transpose()
    }

    fn upsert_raw<T: Serialize>(&self, tag: &'static str, value: &T) -> Result<(), ConfigError> {
        let conn = open(&self.db_path)?;
        let payload = serde_json::to_string(value).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        conn.execute(
            "INSERT INTO config_rows (tag, payload, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(tag) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            params![tag, payload, Utc::now().to_rfc3339()],
        )
        .map_err(|e| ConfigError::Storage(e.to_string()))?;
        Ok(())
    }
}

/// Ciphertext-shaped mirror of `ForgeConfig`: secret fields hold what
/// `Encryptor::encrypt` returned, never plaintext.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct ForgeConfigRow {
    app_id: String,
    installation_id: String,
    encrypted_private_key: String,
    encrypted_webhook_secret: String,
    repositories: Vec<String>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct ChatConfigRow {
    encrypted_signing_secret: String,
    encrypted_bot_token: String,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct LlmConfigRow {
    encrypted_keys: std::collections::HashMap<crate::records::LlmProvider, String>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
struct AuthConfigRow {
    encrypted_oauth_client_id: Option<String>,
    encrypted_oauth_client_secret: Option<String>,
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get_forge(&self) -> Result<Option<ForgeConfig>, ConfigError> {
        let row: Option<ForgeConfigRow> = self.get_raw("forge")?;
        row.map(|r| {
            Ok(ForgeConfig {
                app_id: r.app_id,
                installation_id: r.installation_id,
                private_key: self.encryptor.decrypt(&r.encrypted_private_key)?,
                webhook_secret: self.encryptor.decrypt(&r.encrypted_webhook_secret)?,
                repositories: r.repositories,
            })
        })
        .transpose()
    }

    async fn upsert_forge(&self, record: ForgeConfig) -> Result<(), ConfigError> {
        let row = ForgeConfigRow {
            app_id: record.app_id,
            installation_id: record.installation_id,
            encrypted_private_key: self.encryptor.encrypt(&record.private_key)?,
            encrypted_webhook_secret: self.encryptor.encrypt(&record.webhook_secret)?,
            repositories: record.repositories,
        };
        self.upsert_raw("forge", &row)
    }

    async fn get_chat(&self) -> Result<Option<ChatConfig>, ConfigError> {
        let row: Option<ChatConfigRow> = self.get_raw("chat")?;
        row.map(|r| {
            Ok(ChatConfig {
                signing_secret: self.encryptor.decrypt(&r.encrypted_signing_secret)?,
                bot_token: self.encryptor.decrypt(&r.encrypted_bot_token)?,
            })
        })
        .transpose()
    }

    async fn upsert_chat(&self, record: ChatConfig) -> Result<(), ConfigError> {
        let row = ChatConfigRow {
            encrypted_signing_secret: self.encryptor.encrypt(&record.signing_secret)?,
            encrypted_bot_token: self.encryptor.encrypt(&record.bot_token)?,
        };
        self.upsert_raw("chat", &row)
    }

    async fn get_llm(&self) -> Result<Option<LlmConfig>, ConfigError> {
        let row: Option<LlmConfigRow> = self.get_raw("llm")?;
        row.map(|r| {
            let mut keys = std::collections::HashMap::new();
            for (provider, ciphertext) in r.encrypted_keys {
                keys.insert(provider, self.encryptor.decrypt(&ciphertext)?);
            }
            Ok(LlmConfig { keys })
        })
        .transpose()
    }

    async fn upsert_llm(&self, record: LlmConfig) -> Result<(), ConfigError> {
        let mut encrypted_keys = std::collections::HashMap::new();
        for (provider, plaintext) in record.keys {
            encrypted_keys.insert(provider, self.encryptor.encrypt(&plaintext)?);
        }
        self.upsert_raw("llm", &LlmConfigRow { encrypted_keys })
    }

    async fn get_system_defaults(&self) -> Result<Option<SystemDefaultsConfig>, ConfigError> {
        self.get_raw("system_defaults")
    }

    async fn upsert_system_defaults(&self, record: SystemDefaultsConfig) -> Result<(), ConfigError> {
        self.upsert_raw("system_defaults", &record)
    }

    async fn get_auth(&self) -> Result<Option<AuthConfig>, ConfigError> {
        let row: Option<AuthConfigRow> = self.get_raw("auth")?;
        row.map(|r| {
            Ok(AuthConfig {
                oauth_client_id: r
                    .encrypted_oauth_client_id
                    .map(|c| self.encryptor.decrypt(&c))
                    .transpose()?,
                oauth_client_secret: r
                    .encrypted_oauth_client_secret
                    .map(|c| self.encryptor.decrypt(&c))
                    .transpose()?,
            })
        })
        .transpose()
    }

    async fn upsert_auth(&self, record: AuthConfig) -> Result<(), ConfigError> {
        let row = AuthConfigRow {
            encrypted_oauth_client_id: record
                .oauth_client_id
                .map(|v| self.encryptor.encrypt(&v))
                .transpose()?,
            encrypted_oauth_client_secret: record
                .oauth_client_secret
                .map(|v| self.encryptor.encrypt(&v))
                .transpose()?,
        };
        self.upsert_raw("auth", &row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryptor::NoopEncryptor;
    use crate::records::LlmProvider;

    fn tmp_store() -> SqliteConfigStore {
        let file = tempfile::NamedTempFile::new().unwrap();
        SqliteConfigStore::new(file.path(), Arc::new(NoopEncryptor)).unwrap()
    }

    /// **Scenario**: an un-upserted kind returns `None`, not an error.
    #[tokio::test]
    async fn missing_row_is_none() {
        let store = tmp_store();
        assert!(store.get_forge().await.unwrap().is_none());
    }

    /// **Scenario**: forge config round-trips, and the on-disk payload never
    /// contains the plaintext secret.
    #[tokio::test]
    async fn forge_config_round_trips_and_stores_ciphertext_only() {
        let store = tmp_store();
        store
            .upsert_forge(ForgeConfig {
                app_id: "app-1".into(),
                installation_id: "inst-1".into(),
                private_key: "-----BEGIN KEY-----".into(),
                webhook_secret: "whsec_abc".into(),
                repositories: vec!["acme/widgets".into()],
            })
            .await
            .unwrap();

        let conn = rusqlite::Connection::open(&store.db_path).unwrap();
        let payload: String = conn
            .query_row(
                "SELECT payload FROM config_rows WHERE tag = 'forge'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!payload.contains("-----BEGIN KEY-----"));
        assert!(!payload.contains("whsec_abc"));

        let fetched = store.get_forge().await.unwrap().unwrap();
        assert_eq!(fetched.private_key, "-----BEGIN KEY-----");
        assert_eq!(fetched.webhook_secret, "whsec_abc");
        assert_eq!(fetched.repositories, vec!["acme/widgets".to_string()]);
    }

    /// **Scenario**: `upsert` replaces the single row for a tag rather than
    /// appending (exactly one row per tag, spec §3).
    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let store = tmp_store();
        store
            .upsert_system_defaults(SystemDefaultsConfig {
                default_agent_kind: "claude-code".into(),
                default_branch: "main".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .upsert_system_defaults(SystemDefaultsConfig {
                default_agent_kind: "codex".into(),
                default_branch: "main".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let fetched = store.get_system_defaults().await.unwrap().unwrap();
        assert_eq!(fetched.default_agent_kind, "codex");

        let conn = rusqlite::Connection::open(&store.db_path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM config_rows WHERE tag = 'system_defaults'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    /// **Scenario**: LLM keys round-trip per-provider and drive `available_providers`.
    #[tokio::test]
    async fn llm_config_round_trips_per_provider() {
        let store = tmp_store();
        let mut keys = std::collections::HashMap::new();
        keys.insert(LlmProvider::Anthropic, "sk-ant-xxx".to_string());
        store.upsert_llm(LlmConfig { keys }).await.unwrap();

        let fetched = store.get_llm().await.unwrap().unwrap();
        assert_eq!(fetched.available_providers(), vec![LlmProvider::Anthropic]);
        assert_eq!(fetched.keys[&LlmProvider::Anthropic], "sk-ant-xxx");
    }
}
