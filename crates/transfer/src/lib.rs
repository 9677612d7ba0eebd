//! Storage writes for presigned upload credentials.
//!
//! A [`Transport`] delivers the bytes of one file to the credential's
//! upload URL, reporting percent progress, honouring a per-attempt timeout
//! and aborting as soon as the cancellation token fires.

mod error;
mod http;
mod progress;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use mediadrop_protocol::UploadCredential;
use tokio_util::sync::CancellationToken;

pub use error::TransportError;
pub use http::HttpTransport;
pub use progress::{ProgressGate, percent_of};

/// Default per-attempt timeout for one storage write.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default size of the body chunks handed to the HTTP stack.
///
/// Each chunk yields one progress tick.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Progress callback receiving a percent in `0..=100`.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Performs the actual write of file bytes to storage.
pub trait Transport: Send + Sync {
    /// Writes `data` to `credential.upload_url` with the given content type.
    ///
    /// Implementations call `on_progress` whenever progress is measurable,
    /// fail with a `timeout` reason after their per-attempt limit, and with
    /// `aborted` once `cancel` fires.
    fn send<'a>(
        &'a self,
        credential: &'a UploadCredential,
        content_type: &'a str,
        data: Bytes,
        on_progress: ProgressFn<'a>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;
}
