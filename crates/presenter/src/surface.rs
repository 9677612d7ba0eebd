use std::sync::{Arc, Mutex, PoisonError};

use mediadrop_protocol::UploadRequest;

use crate::locale::Locale;
use crate::modal::{CancelControl, ProgressModal};
use crate::notice::{Notice, NoticeLevel, NoticeQueue};
use crate::{ProgressPresenter, UploadSurface};

/// Surface that keeps modals and notices in memory.
///
/// Used by headless hosts and tests; a graphical host renders the same
/// state instead of storing it.
#[derive(Debug, Default)]
pub struct MemorySurface {
    locale: Locale,
    modals: Mutex<Vec<Arc<ProgressModal>>>,
    notices: Mutex<NoticeQueue>,
}

impl MemorySurface {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    /// Every modal opened so far, oldest first.
    pub fn modals(&self) -> Vec<Arc<ProgressModal>> {
        self.modals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently opened modal.
    pub fn current_modal(&self) -> Option<Arc<ProgressModal>> {
        self.modals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Removes and returns pending notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
    }
}

impl UploadSurface for MemorySurface {
    fn locale(&self) -> Locale {
        self.locale
    }

    fn open_progress(
        &self,
        request: &UploadRequest,
        cancel: CancelControl,
    ) -> Arc<dyn ProgressPresenter> {
        let modal = Arc::new(ProgressModal::new(request, self.locale, cancel));
        self.modals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&modal));
        modal
    }

    fn notify(&self, level: NoticeLevel, title: String, message: Option<String>) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(level, title, message);
    }
}
