//! Credential error types.

/// Errors from the credential backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("network error: {0}")]
    Network(String),

    #[error("credential request timed out")]
    Timeout,

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("malformed credential response: {0}")]
    Malformed(String),

    #[error("invalid session token")]
    InvalidToken,

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl CredentialError {
    /// Network drops, timeouts, 5xx and 429 are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Server { .. })
    }

    /// Message suitable for the user: the backend text when it gave one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) | Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for CredentialError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CredentialError::Network("reset".into()).is_transient());
        assert!(CredentialError::Timeout.is_transient());
        assert!(
            CredentialError::Server {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(!CredentialError::Rejected("quota exceeded".into()).is_transient());
        assert!(!CredentialError::Malformed("not json".into()).is_transient());
        assert!(!CredentialError::InvalidToken.is_transient());
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let err = CredentialError::Rejected("file too large".into());
        assert_eq!(err.user_message(), "file too large");
        assert_eq!(
            CredentialError::Timeout.user_message(),
            "credential request timed out"
        );
    }
}
