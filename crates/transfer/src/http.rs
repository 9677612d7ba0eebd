//! `PUT` to a presigned URL with a streamed, progress-reporting body.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use mediadrop_protocol::UploadCredential;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::progress::percent_of;
use crate::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_CHUNK_SIZE, ProgressFn, Transport};

/// Longest rejection body kept in the error detail.
const MAX_DETAIL_LEN: usize = 512;

/// Upper bound for reading the body of a rejected write.
const REJECTION_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage transport backed by `reqwest`.
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
    chunk_size: usize,
}

impl HttpTransport {
    /// Creates a transport with the default 60 s per-attempt timeout.
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Writes `data` to the credential's upload URL.
    pub async fn put(
        &self,
        credential: &UploadCredential,
        content_type: &str,
        data: Bytes,
        on_progress: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::aborted());
        }

        let total = data.len() as u64;
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u64>();
        let body = reqwest::Body::wrap_stream(progress_stream(data, self.chunk_size, progress_tx));

        let request = self
            .http
            .put(&credential.upload_url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, total)
            .body(body)
            .send();
        tokio::pin!(request);

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(bytes = total, "storage write aborted");
                    return Err(TransportError::aborted());
                }
                _ = &mut deadline => {
                    return Err(TransportError::timeout(format!(
                        "no response within {}s",
                        self.timeout.as_secs_f64()
                    )));
                }
                Some(sent) = progress_rx.recv() => {
                    on_progress(percent_of(sent, total));
                }
                result = &mut request => {
                    let resp = result?;
                    let status = resp.status();
                    if status.is_success() {
                        on_progress(100);
                        debug!(status = status.as_u16(), bytes = total, "storage write accepted");
                        return Ok(());
                    }

                    let body = tokio::time::timeout(REJECTION_READ_TIMEOUT, resp.text())
                        .await
                        .ok()
                        .and_then(Result::ok)
                        .unwrap_or_default();
                    warn!(status = status.as_u16(), "storage write rejected");
                    return Err(TransportError::server_rejected(rejection_detail(
                        status.as_u16(),
                        &body,
                    )));
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        credential: &'a UploadCredential,
        content_type: &'a str,
        data: Bytes,
        on_progress: ProgressFn<'a>,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>> {
        Box::pin(self.put(credential, content_type, data, on_progress, cancel))
    }
}

/// Splits `data` into chunks and reports cumulative bytes as each chunk is
/// handed to the HTTP stack.
fn progress_stream(
    data: Bytes,
    chunk_size: usize,
    progress_tx: mpsc::UnboundedSender<u64>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect();

    let mut sent: u64 = 0;
    futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        // The receiver is gone once the attempt has finished.
        let _ = progress_tx.send(sent);
        Ok(chunk)
    })
}

fn rejection_detail(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let excerpt: String = body.chars().take(MAX_DETAIL_LEN).collect();
    format!("HTTP {status}: {excerpt}")
}
