use mediadrop_protocol::TransportReason;

/// A failed storage write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {detail}")]
pub struct TransportError {
    pub reason: TransportReason,
    pub detail: String,
}

impl TransportError {
    pub fn new(reason: TransportReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(TransportReason::Network, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(TransportReason::Timeout, detail)
    }

    pub fn server_rejected(detail: impl Into<String>) -> Self {
        Self::new(TransportReason::ServerRejected, detail)
    }

    pub fn aborted() -> Self {
        Self::new(TransportReason::Aborted, "upload cancelled")
    }

    pub fn is_transient(&self) -> bool {
        self.reason.is_transient()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // A request that cannot even be built will fail the same way again.
        if e.is_builder() {
            Self::server_rejected(e.to_string())
        } else if e.is_timeout() {
            Self::timeout(e.to_string())
        } else {
            Self::network(e.to_string())
        }
    }
}
