//! Upload error types.

use std::time::Duration;

use mediadrop_credentials::CredentialError;
use mediadrop_protocol::{ErrorKind, TransportReason};
use mediadrop_transfer::TransportError;

use crate::retry::{RetryError, Transient};
use crate::session::UploadState;

/// Errors produced while processing one upload.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("upload cancelled")]
    Cancelled,

    #[error("upload did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("illegal state transition {from:?} -> {to:?}")]
    IllegalTransition { from: UploadState, to: UploadState },

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl UploadError {
    /// Classification reported in the failed outcome.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Credential(_) => ErrorKind::Credential,
            Self::Transport(e) if e.reason == TransportReason::Aborted => ErrorKind::Cancelled,
            Self::Transport(e) => ErrorKind::Transport(e.reason),
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded(_) => ErrorKind::Transport(TransportReason::Timeout),
            Self::IllegalTransition { .. } | Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// Text shown to the user next to the localized failure title.
    pub fn user_message(&self) -> String {
        match self {
            Self::Credential(e) => e.user_message(),
            Self::Transport(e) => e.detail.clone(),
            other => other.to_string(),
        }
    }
}

impl Transient for UploadError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Credential(e) => e.is_transient(),
            Self::Transport(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<RetryError<UploadError>> for UploadError {
    fn from(e: RetryError<UploadError>) -> Self {
        match e {
            RetryError::Cancelled => Self::Cancelled,
            RetryError::Exhausted { error, .. } => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            UploadError::Credential(CredentialError::Rejected("no".into())).kind(),
            ErrorKind::Credential
        );
        assert_eq!(
            UploadError::Transport(TransportError::timeout("60s")).kind(),
            ErrorKind::Transport(TransportReason::Timeout)
        );
        assert_eq!(
            UploadError::Transport(TransportError::aborted()).kind(),
            ErrorKind::Cancelled
        );
        assert_eq!(
            UploadError::DeadlineExceeded(Duration::from_secs(1)).kind(),
            ErrorKind::Transport(TransportReason::Timeout)
        );
    }

    #[test]
    fn transient_follows_source() {
        assert!(UploadError::Credential(CredentialError::Timeout).is_transient());
        assert!(!UploadError::Credential(CredentialError::Rejected("x".into())).is_transient());
        assert!(UploadError::Transport(TransportError::network("reset")).is_transient());
        assert!(!UploadError::Transport(TransportError::server_rejected("403")).is_transient());
        assert!(!UploadError::Cancelled.is_transient());
        assert!(!UploadError::Unexpected("boom".into()).is_transient());
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let e = UploadError::Credential(CredentialError::Rejected("quota exceeded".into()));
        assert_eq!(e.user_message(), "quota exceeded");

        let e = UploadError::Transport(TransportError::server_rejected("HTTP 403: denied"));
        assert_eq!(e.user_message(), "HTTP 403: denied");
    }

    #[test]
    fn retry_error_unwraps() {
        let e: UploadError = RetryError::<UploadError>::Cancelled.into();
        assert!(e.is_cancelled());

        let e: UploadError = RetryError::Exhausted {
            attempts: 3,
            error: UploadError::Transport(TransportError::network("reset")),
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Transport(TransportReason::Network));
    }
}
