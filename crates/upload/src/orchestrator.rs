//! Upload orchestrator.
//!
//! Drives each accepted file through credential issuance and the storage
//! write, reporting progress to a per-file presenter and handing the public
//! URL to the editor. Files run one after another; one file's failure never
//! stops the rest of a batch.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use mediadrop_credentials::CredentialClient;
use mediadrop_credentials::client::DEFAULT_CREDENTIAL_TIMEOUT;
use mediadrop_presenter::{CancelControl, NoticeLevel, ProgressPresenter, UploadSurface};
use mediadrop_protocol::{ProgressEvent, UploadCredential, UploadOutcome, UploadRequest};
use mediadrop_transfer::{DEFAULT_ATTEMPT_TIMEOUT, ProgressFn, ProgressGate, Transport};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::editor::EditorSink;
use crate::error::UploadError;
use crate::intake::{AcceptedFile, Intake, IntakeAdapter, IntakeBatch, IntakeError, IntakeLimits};
use crate::retry::RetryPolicy;
use crate::session::{UploadSession, UploadState};

/// Default lifetime after which a credential is re-issued before a retry.
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(5 * 60);

/// Default pause before a completed progress modal is dismissed.
pub const DEFAULT_COMPLETE_LINGER: Duration = Duration::from_millis(500);

/// Tunables for the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// Applied to credential issuance and to the storage write.
    pub retry: RetryPolicy,
    /// Per-attempt limit of a credential request.
    pub credential_timeout: Duration,
    /// Per-attempt limit of a storage write.
    pub transport_timeout: Duration,
    /// Credentials older than this are re-issued before a write retry.
    pub credential_ttl: Duration,
    /// How long a completed modal stays visible.
    pub complete_linger: Duration,
    pub limits: IntakeLimits,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            credential_timeout: DEFAULT_CREDENTIAL_TIMEOUT,
            transport_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            credential_ttl: DEFAULT_CREDENTIAL_TTL,
            complete_linger: DEFAULT_COMPLETE_LINGER,
            limits: IntakeLimits::default(),
        }
    }
}

impl UploadConfig {
    /// Upper bound for one file's whole pipeline.
    ///
    /// A write attempt may re-issue its credential first, so it is
    /// budgeted with both timeouts.
    pub fn deadline(&self) -> Duration {
        let write_attempt = self.transport_timeout.saturating_add(self.credential_timeout);
        self.retry
            .ceiling(self.credential_timeout)
            .saturating_add(self.retry.ceiling(write_attempt))
    }
}

/// Runs uploads against a credential backend and a storage transport.
pub struct UploadOrchestrator {
    credentials: Arc<dyn CredentialClient>,
    transport: Arc<dyn Transport>,
    config: UploadConfig,
}

impl UploadOrchestrator {
    pub fn new(
        credentials: Arc<dyn CredentialClient>,
        transport: Arc<dyn Transport>,
        config: UploadConfig,
    ) -> Self {
        Self {
            credentials,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Intake configured with this orchestrator's limits.
    pub fn intake(&self) -> Intake {
        Intake::new(self.config.limits)
    }

    /// Uploads one file with a fresh cancellation token.
    pub async fn upload(&self, file: AcceptedFile, surface: &dyn UploadSurface) -> UploadOutcome {
        self.upload_with(file, surface, CancellationToken::new())
            .await
    }

    /// Uploads one file, cancellable through `cancel` or the modal's
    /// cancel control.
    ///
    /// The presenter opened for the file is dismissed in every outcome.
    pub async fn upload_with(
        &self,
        file: AcceptedFile,
        surface: &dyn UploadSurface,
        cancel: CancellationToken,
    ) -> UploadOutcome {
        let request = file.request().clone();
        let Some(kind) = request.kind() else {
            let rejection = IntakeError::UnsupportedType {
                file: request.file_name.clone(),
                mime_type: request.mime_type.clone(),
            };
            warn!(file = %request.file_name, mime = %request.mime_type, "refusing non-media upload");
            return rejection.to_outcome();
        };

        let locale = surface.locale();
        let mut session = UploadSession::new(request.clone(), cancel.clone());
        let presenter = surface.open_progress(&request, CancelControl::new(cancel.clone()));
        let deadline = self.config.deadline();

        info!(
            file = %request.file_name,
            mime = %request.mime_type,
            size = request.size_bytes,
            "upload started"
        );

        let pipeline = self.run_pipeline(&mut session, file.data(), presenter.as_ref());
        let finished = tokio::time::timeout(deadline, AssertUnwindSafe(pipeline).catch_unwind()).await;

        let result = match finished {
            Err(_) => Err(UploadError::DeadlineExceeded(deadline)),
            Ok(Err(panic)) => Err(UploadError::Unexpected(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        };
        // Once the token is set, any failure counts as a cancellation.
        let result = match result {
            Err(e) if !e.is_cancelled() && cancel.is_cancelled() => {
                debug!(file = %request.file_name, error = %e, "failure after cancel");
                Err(UploadError::Cancelled)
            }
            other => other,
        };

        match result {
            Ok(public_url) => {
                if !self.config.complete_linger.is_zero() {
                    tokio::time::sleep(self.config.complete_linger).await;
                }
                presenter.dismiss();
                info!(file = %request.file_name, url = %public_url, "upload complete");
                UploadOutcome::Complete { kind, public_url }
            }
            Err(e) if e.is_cancelled() => {
                finish(&mut session, UploadState::Cancelled);
                presenter.dismiss();
                info!(file = %request.file_name, "upload cancelled");
                surface.notify(
                    NoticeLevel::Info,
                    locale.upload_cancelled(&request.file_name),
                    None,
                );
                UploadOutcome::cancelled()
            }
            Err(e) => {
                finish(&mut session, UploadState::Failed);
                presenter.dismiss();
                error!(file = %request.file_name, kind = %e.kind(), error = %e, "upload failed");
                let message = e.user_message();
                surface.notify(
                    NoticeLevel::Error,
                    locale.upload_failed(&request.file_name),
                    Some(message.clone()),
                );
                UploadOutcome::failed(e.kind(), message)
            }
        }
    }

    /// Uploads a screened batch strictly in order.
    ///
    /// Rejections are reported first since they were resolved at intake,
    /// followed by one outcome per accepted file. `sink` is called once per
    /// completed upload.
    pub async fn process(
        &self,
        batch: IntakeBatch,
        surface: &dyn UploadSurface,
        sink: &dyn EditorSink,
    ) -> Vec<UploadOutcome> {
        self.process_with(batch, surface, sink, &CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process); cancelling `cancel` cancels the
    /// running upload and every one still queued.
    pub async fn process_with(
        &self,
        batch: IntakeBatch,
        surface: &dyn UploadSurface,
        sink: &dyn EditorSink,
        cancel: &CancellationToken,
    ) -> Vec<UploadOutcome> {
        let mut outcomes: Vec<UploadOutcome> =
            batch.rejected.iter().map(IntakeError::to_outcome).collect();

        let total = batch.accepted.len();
        for (index, file) in batch.accepted.into_iter().enumerate() {
            debug!(file = %file.request().file_name, position = index + 1, total, "next upload");
            let outcome = self.upload_with(file, surface, cancel.child_token()).await;
            if let UploadOutcome::Complete { kind, public_url } = &outcome {
                sink.on_upload_complete(*kind, public_url);
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Screens the adapter's files and processes the batch.
    pub async fn submit(
        &self,
        adapter: impl IntakeAdapter,
        surface: &dyn UploadSurface,
        sink: &dyn EditorSink,
    ) -> Vec<UploadOutcome> {
        let batch = self.intake().accept(adapter, surface);
        self.process(batch, surface, sink).await
    }

    async fn run_pipeline(
        &self,
        session: &mut UploadSession,
        data: &Bytes,
        presenter: &dyn ProgressPresenter,
    ) -> Result<String, UploadError> {
        let request = session.request().clone();
        let cancel = session.cancel_token().clone();

        session.checkpoint()?;
        session.advance(UploadState::Preparing)?;
        presenter.update(ProgressEvent::preparing());

        let credential = self.issue_credential(&request, &cancel).await?;

        session.checkpoint()?;
        session.advance(UploadState::Uploading)?;

        let gate = ProgressGate::new();
        let report = |percent: u8| {
            if let Some(percent) = gate.admit(percent) {
                presenter.update(ProgressEvent::uploading(percent));
            }
        };
        report(0);

        let public_url = self
            .deliver(&request, credential, data, &report, &cancel)
            .await?;

        session.checkpoint()?;
        report(100);
        session.advance(UploadState::Complete)?;
        presenter.update(ProgressEvent::complete());
        Ok(public_url)
    }

    async fn issue_credential(
        &self,
        request: &UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadCredential, UploadError> {
        let credential = self
            .config
            .retry
            .run("credential", cancel, move |attempt| async move {
                debug!(file = %request.file_name, attempt, "requesting credential");
                self.request_credential(request, cancel).await
            })
            .await?;
        Ok(credential)
    }

    async fn request_credential(
        &self,
        request: &UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadCredential, UploadError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(UploadError::Cancelled),
            result = self.credentials.request_credential(request) => result.map_err(UploadError::from),
        }
    }

    /// Writes the bytes, re-issuing the credential before a retry once it
    /// has outlived its TTL.
    async fn deliver(
        &self,
        request: &UploadRequest,
        credential: UploadCredential,
        data: &Bytes,
        report: ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, UploadError> {
        let slot = tokio::sync::Mutex::new(credential);
        let slot = &slot;

        let public_url = self
            .config
            .retry
            .run("storage write", cancel, move |attempt| {
                let data = data.clone();
                async move {
                    let mut credential = slot.lock().await;
                    if attempt > 1 && credential.is_expired(self.config.credential_ttl) {
                        info!(
                            file = %request.file_name,
                            attempt,
                            age_ms = credential.age().as_millis() as u64,
                            "credential expired, requesting a new one"
                        );
                        *credential = self.request_credential(request, cancel).await?;
                    }

                    debug!(file = %request.file_name, attempt, bytes = data.len(), "writing to storage");
                    self.transport
                        .send(&credential, &request.mime_type, data, report, cancel)
                        .await?;
                    Ok::<_, UploadError>(credential.public_url.clone())
                }
            })
            .await?;
        Ok(public_url)
    }
}

fn finish(session: &mut UploadSession, state: UploadState) {
    if let Err(e) = session.advance(state) {
        debug!(error = %e, "session already settled");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "upload task panicked".to_string()
    }
}
