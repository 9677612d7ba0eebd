//! Terminal rendering of upload progress and notices.
//!
//! Everything goes to stderr so stdout only carries the embed snippets.

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use mediadrop_presenter::{
    CancelControl, Locale, NoticeLevel, ProgressModal, ProgressPresenter, UploadSurface,
};
use mediadrop_protocol::{ProgressEvent, UploadRequest};

/// Surface drawing a single redrawn progress line per upload.
pub struct TerminalSurface {
    locale: Locale,
    interactive: bool,
}

impl TerminalSurface {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            interactive: std::io::stderr().is_terminal(),
        }
    }
}

impl UploadSurface for TerminalSurface {
    fn locale(&self) -> Locale {
        self.locale
    }

    fn open_progress(
        &self,
        request: &UploadRequest,
        cancel: CancelControl,
    ) -> Arc<dyn ProgressPresenter> {
        Arc::new(TerminalProgress {
            modal: ProgressModal::new(request, self.locale, cancel),
            interactive: self.interactive,
        })
    }

    fn notify(&self, level: NoticeLevel, title: String, message: Option<String>) {
        let tag = match level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        match message {
            Some(message) => eprintln!("[{tag}] {title}: {message}"),
            None => eprintln!("[{tag}] {title}"),
        }
    }
}

struct TerminalProgress {
    modal: ProgressModal,
    interactive: bool,
}

impl ProgressPresenter for TerminalProgress {
    fn update(&self, event: ProgressEvent) {
        let before = self.modal.snapshot();
        self.modal.update(event);
        let after = self.modal.snapshot();
        if after == before {
            return;
        }

        let mut stderr = std::io::stderr().lock();
        if self.interactive {
            let _ = write!(stderr, "\r{}", self.modal.render());
            let _ = stderr.flush();
        } else if after.stage != before.stage {
            // Without a terminal only stage changes are worth a line.
            let _ = writeln!(stderr, "{}", self.modal.render());
        }
    }

    fn dismiss(&self) {
        if self.modal.is_dismissed() {
            return;
        }
        self.modal.dismiss();
        if self.interactive {
            eprintln!();
        }
    }

    fn is_dismissed(&self) -> bool {
        self.modal.is_dismissed()
    }
}
