//! Per-upload state machine.

use mediadrop_protocol::UploadRequest;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::UploadError;

/// Lifecycle of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadState {
    Idle,
    Preparing,
    Uploading,
    Complete,
    Failed,
    Cancelled,
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: UploadState) -> bool {
        use UploadState::*;
        match (self, next) {
            (Idle, Preparing) | (Preparing, Uploading) | (Uploading, Complete) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One file moving through the pipeline.
///
/// Owns the cancellation token shared with the progress modal and the
/// transport. Rejected files never leave [`UploadState::Idle`].
#[derive(Debug)]
pub struct UploadSession {
    request: UploadRequest,
    state: UploadState,
    cancel: CancellationToken,
}

impl UploadSession {
    pub fn new(request: UploadRequest, cancel: CancellationToken) -> Self {
        Self {
            request,
            state: UploadState::Idle,
            cancel,
        }
    }

    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Moves to `next`, refusing transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: UploadState) -> Result<(), UploadError> {
        if !self.state.can_transition_to(next) {
            return Err(UploadError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(file = %self.request.file_name, from = ?self.state, to = ?next, "upload state");
        self.state = next;
        Ok(())
    }

    /// Fails with [`UploadError::Cancelled`] once the token has fired.
    pub fn checkpoint(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UploadSession {
        UploadSession::new(
            UploadRequest::new("photo.jpg", "image/jpeg", 2048),
            CancellationToken::new(),
        )
    }

    #[test]
    fn happy_path() {
        let mut s = session();
        assert_eq!(s.state(), UploadState::Idle);
        s.advance(UploadState::Preparing).unwrap();
        s.advance(UploadState::Uploading).unwrap();
        s.advance(UploadState::Complete).unwrap();
        assert!(s.state().is_terminal());
    }

    #[test]
    fn cannot_skip_stages() {
        let mut s = session();
        let err = s.advance(UploadState::Uploading).unwrap_err();
        assert!(matches!(
            err,
            UploadError::IllegalTransition {
                from: UploadState::Idle,
                to: UploadState::Uploading
            }
        ));
        assert!(s.advance(UploadState::Complete).is_err());
        assert_eq!(s.state(), UploadState::Idle);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut s = session();
        s.advance(UploadState::Preparing).unwrap();
        s.advance(UploadState::Cancelled).unwrap();
        assert!(s.advance(UploadState::Failed).is_err());
        assert!(s.advance(UploadState::Cancelled).is_err());
        assert!(s.advance(UploadState::Uploading).is_err());
        assert_eq!(s.state(), UploadState::Cancelled);
    }

    #[test]
    fn failure_and_cancel_from_any_live_state() {
        for live in [
            UploadState::Idle,
            UploadState::Preparing,
            UploadState::Uploading,
        ] {
            assert!(live.can_transition_to(UploadState::Failed));
            assert!(live.can_transition_to(UploadState::Cancelled));
        }
        assert!(!UploadState::Complete.can_transition_to(UploadState::Failed));
    }

    #[test]
    fn checkpoint_observes_token() {
        let s = session();
        assert!(s.checkpoint().is_ok());
        s.cancel_token().cancel();
        assert!(s.is_cancelled());
        assert!(matches!(s.checkpoint(), Err(UploadError::Cancelled)));
    }
}
