//! Data model shared by the mediadrop upload crates.
//!
//! - [`types`]: requests, credentials, progress events and outcomes
//! - [`wire`]: JSON payloads exchanged with the credential endpoint

pub mod types;
pub mod wire;

pub use types::{
    ErrorKind, MediaKind, ProgressEvent, Stage, TransportReason, UploadCredential,
    UploadOutcome, UploadRequest,
};
pub use wire::{CredentialRequest, CredentialResponse};
