//! `ConfigError`: failure modes of the Config Store and its encrypt/decrypt boundary.

use warden_types::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("encryption: {0}")]
    Encryption(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

impl From<&ConfigError> for ErrorKind {
    fn from(e: &ConfigError) -> Self {
        match e {
            ConfigError::Storage(_) => ErrorKind::TransientIo,
            ConfigError::Encryption(_) => ErrorKind::IntegrationAuth,
            ConfigError::Serialization(_) => ErrorKind::Validation,
        }
    }
}

impl From<ConfigError> for ErrorKind {
    fn from(e: ConfigError) -> Self {
        ErrorKind::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_displays() {
        assert!(ConfigError::Storage("locked".into())
            .to_string()
            .contains("storage"));
    }

    #[test]
    fn encryption_failure_maps_to_integration_auth() {
        let kind: ErrorKind = (&ConfigError::Encryption("bad key".into())).into();
        assert_eq!(kind, ErrorKind::IntegrationAuth);
    }
}
