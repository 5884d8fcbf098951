//! Exercises the store against a non-`Noop` `Encryptor` and across more than
//! one kind tag at once (spec §4.D "exactly one row per kind tag"): the
//! crate's inline tests already cover ciphertext-only persistence and
//! per-kind round-trips one at a time, so this focuses on tag independence
//! and a real (if toy) encryption scheme.

use std::sync::Arc;

use warden_configstore::{
    AuthConfig, ChatConfig, ConfigStore, Encryptor, ForgeConfig, SqliteConfigStore,
};

/// A byte-rotation cipher: enough to prove the store round-trips through
/// whatever `Encryptor` it's given rather than being coupled to `NoopEncryptor`.
struct RotEncryptor;

impl Encryptor for RotEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, warden_configstore::ConfigError> {
        Ok(plaintext.bytes().map(|b| b.wrapping_add(1) as char).collect())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, warden_configstore::ConfigError> {
        Ok(ciphertext.chars().map(|c| (c as u8).wrapping_sub(1) as char).collect())
    }
}

fn store() -> SqliteConfigStore {
    let file = tempfile::NamedTempFile::new().unwrap();
    SqliteConfigStore::new(file.path(), Arc::new(RotEncryptor)).unwrap()
}

#[tokio::test]
async fn round_trips_through_a_non_noop_encryptor() {
    let store = store();
    store
        .upsert_chat(ChatConfig {
            signing_secret: "sign-1".to_string(),
            bot_token: "xoxb-1".to_string(),
        })
        .await
        .unwrap();
    let fetched = store.get_chat().await.unwrap().unwrap();
    assert_eq!(fetched.signing_secret, "sign-1");
    assert_eq!(fetched.bot_token, "xoxb-1");
}

/// **Scenario** (spec §4.D): writing one kind tag's row does not disturb a
/// different kind tag's row — each is addressed independently.
#[tokio::test]
async fn kind_tags_are_independent() {
    let store = store();
    store
        .upsert_forge(ForgeConfig {
            app_id: "app-1".to_string(),
            installation_id: "inst-1".to_string(),
            private_key: "key-1".to_string(),
            webhook_secret: "whsec-1".to_string(),
            repositories: vec!["acme/api".to_string()],
        })
        .await
        .unwrap();
    store
        .upsert_auth(AuthConfig {
            oauth_client_id: Some("client-1".to_string()),
            oauth_client_secret: Some("secret-1".to_string()),
        })
        .await
        .unwrap();

    // Re-upserting chat (never touched) stays absent; forge/auth are both
    // still independently readable.
    assert!(store.get_chat().await.unwrap().is_none());
    let forge = store.get_forge().await.unwrap().unwrap();
    assert_eq!(forge.app_id, "app-1");
    let auth = store.get_auth().await.unwrap().unwrap();
    assert_eq!(auth.oauth_client_id.as_deref(), Some("client-1"));
}

/// `AuthConfig`'s optional fields round-trip as `None` without forcing a
/// decrypt call against an absent ciphertext.
#[tokio::test]
async fn auth_config_tolerates_absent_optional_fields() {
    let store = store();
    store
        .upsert_auth(AuthConfig {
            oauth_client_id: None,
            oauth_client_secret: None,
        })
        .await
        .unwrap();
    let fetched = store.get_auth().await.unwrap().unwrap();
    assert!(fetched.oauth_client_id.is_none());
    assert!(fetched.oauth_client_secret.is_none());
}
