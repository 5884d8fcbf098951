//! The encrypt/decrypt boundary (spec §1 Non-goals: "credential-encryption
//! primitives" are an external collaborator). This crate never sees
//! plaintext secrets outside the call into an `Encryptor`; the store persists
//! only what comes back from `encrypt`.

use crate::error::ConfigError;

pub trait Encryptor: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, ConfigError>;
}

/// Passthrough encryptor for tests and local development. MUST NOT be used
/// against a real credential; production deployments supply an `Encryptor`
/// backed by the real primitive (keyed off `ENCRYPTION_KEY`, spec §6).
#[derive(Default)]
pub struct NoopEncryptor;

impl Encryptor for NoopEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, ConfigError> {
        Ok(format!("noop:{plaintext}"))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, ConfigError> {
        ciphertext
            .strip_prefix("noop:")
            .map(String::from)
            .ok_or_else(|| ConfigError::Encryption("not a noop-encrypted value".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_round_trips() {
        let enc = NoopEncryptor;
        let ct = enc.encrypt("s3cr3t").unwrap();
        assert_ne!(ct, "s3cr3t");
        assert_eq!(enc.decrypt(&ct).unwrap(), "s3cr3t");
    }

    #[test]
    fn noop_rejects_foreign_ciphertext() {
        let enc = NoopEncryptor;
        assert!(enc.decrypt("not-ours").is_err());
    }
}
