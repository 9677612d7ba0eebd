//! Upload progress presentation.
//!
//! The presenter is a pure observer of [`ProgressEvent`]s. Each upload gets
//! its own [`ProgressModal`]; the [`CancelControl`] on it is the only way a
//! user cancels an upload. Rejections and failures reach the user as
//! [`Notice`]s through the [`UploadSurface`].

pub mod locale;
pub mod modal;
pub mod notice;
pub mod surface;

use std::sync::Arc;

use mediadrop_protocol::{ProgressEvent, UploadRequest};

pub use locale::Locale;
pub use modal::{CancelControl, ModalSnapshot, ProgressModal};
pub use notice::{Notice, NoticeLevel, NoticeQueue};
pub use surface::MemorySurface;

/// Observer of one upload's progress.
pub trait ProgressPresenter: Send + Sync {
    fn update(&self, event: ProgressEvent);

    /// Removes the indicator. Calling it again is a no-op.
    fn dismiss(&self);

    fn is_dismissed(&self) -> bool;
}

/// The host UI the upload pipeline talks to.
pub trait UploadSurface: Send + Sync {
    fn locale(&self) -> Locale;

    /// Shows a progress indicator for `request` wired to `cancel`.
    fn open_progress(
        &self,
        request: &UploadRequest,
        cancel: CancelControl,
    ) -> Arc<dyn ProgressPresenter>;

    /// Shows a non-fatal notice.
    fn notify(&self, level: NoticeLevel, title: String, message: Option<String>);
}
