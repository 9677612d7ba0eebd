//! Credential issuance for direct-to-storage uploads.
//!
//! A [`CredentialClient`] asks a trusted backend for a short-lived,
//! write-once URL for one file. [`HttpCredentialClient`] is the `reqwest`
//! implementation talking JSON to the backend endpoint.

pub mod client;
pub mod error;

use std::future::Future;
use std::pin::Pin;

use mediadrop_protocol::{UploadCredential, UploadRequest};

pub use client::{CredentialClientConfig, HttpCredentialClient};
pub use error::CredentialError;

/// Issues upload credentials.
///
/// Every call must produce a freshly issued credential; implementations
/// never cache credentials across calls.
pub trait CredentialClient: Send + Sync {
    fn request_credential<'a>(
        &'a self,
        req: &'a UploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UploadCredential, CredentialError>> + Send + 'a>>;
}
