//! Per-upload progress state and its cancel affordance.

use std::sync::{Mutex, PoisonError};

use mediadrop_protocol::{ProgressEvent, Stage, UploadRequest};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ProgressPresenter;
use crate::locale::Locale;

/// Width of the text progress bar.
const BAR_WIDTH: usize = 20;

/// The user's cancel button for one upload.
///
/// Activating it sets the upload's cancellation token.
#[derive(Debug, Clone)]
pub struct CancelControl {
    token: CancellationToken,
}

impl CancelControl {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn activate(&self) {
        if !self.token.is_cancelled() {
            debug!("upload cancel requested");
        }
        self.token.cancel();
    }

    pub fn is_activated(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Point-in-time copy of a modal's display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSnapshot {
    pub percent: u8,
    pub stage: Stage,
    pub status: String,
    pub dismissed: bool,
    pub updates: usize,
}

#[derive(Debug)]
struct ModalState {
    percent: u8,
    stage: Stage,
    dismissed: bool,
    updates: usize,
}

/// Progress indicator owned by exactly one upload.
#[derive(Debug)]
pub struct ProgressModal {
    file_name: String,
    size_label: String,
    locale: Locale,
    cancel: CancelControl,
    state: Mutex<ModalState>,
}

impl ProgressModal {
    pub fn new(request: &UploadRequest, locale: Locale, cancel: CancelControl) -> Self {
        Self {
            file_name: request.file_name.clone(),
            size_label: locale.size_label(request.size_bytes),
            locale,
            cancel,
            state: Mutex::new(ModalState {
                percent: 0,
                stage: Stage::Preparing,
                dismissed: false,
                updates: 0,
            }),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn cancel_control(&self) -> CancelControl {
        self.cancel.clone()
    }

    pub fn snapshot(&self) -> ModalSnapshot {
        let s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        ModalSnapshot {
            percent: s.percent,
            stage: s.stage,
            status: self.locale.stage_label(s.stage).to_string(),
            dismissed: s.dismissed,
            updates: s.updates,
        }
    }

    /// One-line text rendering, e.g.
    /// `photo.jpg (Size: 2.0 MB) [##########----------]  50% Uploading...`.
    pub fn render(&self) -> String {
        let snap = self.snapshot();
        let filled = usize::from(snap.percent) * BAR_WIDTH / 100;
        format!(
            "{} ({}) [{}{}] {:>3}% {}",
            self.file_name,
            self.size_label,
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            snap.percent,
            snap.status
        )
    }
}

impl ProgressPresenter for ProgressModal {
    fn update(&self, event: ProgressEvent) {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if s.dismissed || event.stage < s.stage {
            return;
        }
        if event.stage == s.stage && event.percent < s.percent {
            return;
        }
        s.stage = event.stage;
        s.percent = event.percent;
        s.updates += 1;
    }

    fn dismiss(&self) {
        let mut s = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        s.dismissed = true;
    }

    fn is_dismissed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dismissed
    }
}
