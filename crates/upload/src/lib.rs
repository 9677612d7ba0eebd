//! Direct-to-storage upload orchestration.
//!
//! This crate holds the **business logic** that turns a dropped, pasted or
//! picked media file into a public URL the editor can embed. Storage and
//! the credential backend sit behind the [`CredentialClient`] and
//! [`Transport`] traits; the UI sits behind [`UploadSurface`].
//!
//! # Pipeline
//!
//! 1. **Intake**: validate type and size, reject with a notice
//! 2. **Prepare**: obtain a presigned credential (retried when transient)
//! 3. **Upload**: write the bytes with live progress (retried when transient)
//! 4. **Complete**: hand the public URL to the [`EditorSink`]
//!
//! Files are processed strictly one after another.
//!
//! [`CredentialClient`]: mediadrop_credentials::CredentialClient
//! [`Transport`]: mediadrop_transfer::Transport
//! [`UploadSurface`]: mediadrop_presenter::UploadSurface

pub mod editor;
pub mod error;
pub mod intake;
pub mod orchestrator;
pub mod retry;
pub mod session;

pub use editor::{EditorSink, embed_html};
pub use error::UploadError;
pub use intake::{
    AcceptedFile, ClipboardItem, DEFAULT_MAX_FILE_SIZE, DropAdapter, FilePickerAdapter, Intake,
    IntakeAdapter, IntakeBatch, IntakeError, IntakeLimits, IntakeSource, MediaFile, PasteAdapter,
    detect_content_type,
};
pub use orchestrator::{
    DEFAULT_COMPLETE_LINGER, DEFAULT_CREDENTIAL_TTL, UploadConfig, UploadOrchestrator,
};
pub use retry::{RetryError, RetryPolicy, Transient};
pub use session::{UploadSession, UploadState};
