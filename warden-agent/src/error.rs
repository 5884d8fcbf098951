//! `AgentError`: failure modes surfaced by the strategy surface itself
//! (factory resolution, validation) as distinct from a strategy's own
//! `AgentResult { success: false, .. }` (spec §4.E, §7).

use warden_types::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("unknown agent kind: {0}")]
    UnknownKind(String),
    #[error("missing credentials for provider: {0}")]
    MissingCredentials(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("execution: {0}")]
    Execution(String),
    #[error("aborted")]
    Aborted,
}

impl From<&AgentError> for ErrorKind {
    fn from(e: &AgentError) -> Self {
        match e {
            AgentError::UnknownKind(_) => ErrorKind::Validation,
            AgentError::MissingCredentials(_) => ErrorKind::IntegrationAuth,
            AgentError::Validation(_) => ErrorKind::Validation,
            AgentError::Execution(_) => ErrorKind::AgentFailure,
            AgentError::Aborted => ErrorKind::Timeout,
        }
    }
}

impl From<AgentError> for ErrorKind {
    fn from(e: AgentError) -> Self {
        ErrorKind::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_maps_to_integration_auth() {
        let kind: ErrorKind = (&AgentError::MissingCredentials("openai".into())).into();
        assert_eq!(kind, ErrorKind::IntegrationAuth);
    }
}
