//! Upload run: wires the HTTP clients to the orchestrator and the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use mediadrop_credentials::HttpCredentialClient;
use mediadrop_protocol::{MediaKind, UploadOutcome};
use mediadrop_transfer::HttpTransport;
use mediadrop_upload::{FilePickerAdapter, UploadOrchestrator, embed_html};
use tokio_util::sync::CancellationToken;

use crate::config::UploaderConfig;
use crate::terminal::TerminalSurface;

/// What goes to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// One embed snippet per completed upload, printed as it completes.
    Html,
    /// One JSON outcome per file once the batch is done.
    Json,
}

/// Uploads `files` in order and returns one outcome per file.
pub async fn run(
    config: UploaderConfig,
    files: Vec<PathBuf>,
    output: Output,
) -> anyhow::Result<Vec<UploadOutcome>> {
    if config.csrf_token.is_empty() {
        tracing::warn!("csrf_token is empty, the backend will likely refuse credentials");
    }

    let upload_config = config.upload_config();
    let credentials = HttpCredentialClient::new(config.credential_config())?;
    let transport = HttpTransport::new()?.with_timeout(upload_config.transport_timeout);
    let orchestrator =
        UploadOrchestrator::new(Arc::new(credentials), Arc::new(transport), upload_config);
    tracing::debug!(
        endpoint = %config.endpoint,
        deadline_secs = upload_config.deadline().as_secs(),
        "uploader ready"
    );

    let surface = TerminalSurface::new(config.locale);
    let adapter = FilePickerAdapter::open(files, upload_config.limits).await;
    let batch = orchestrator.intake().accept(adapter, &surface);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("SIGINT received, cancelling uploads");
                cancel.cancel();
            }
        })
    };

    let sink = move |kind: MediaKind, public_url: &str| {
        if output == Output::Html {
            println!("{}", embed_html(kind, public_url));
        }
    };
    let outcomes = orchestrator
        .process_with(batch, &surface, &sink, &cancel)
        .await;
    interrupt.abort();

    if output == Output::Json {
        for outcome in &outcomes {
            println!("{}", serde_json::to_string(outcome)?);
        }
    }

    Ok(outcomes)
}

/// Number of outcomes that failed for a reason other than cancellation.
pub fn failure_count(outcomes: &[UploadOutcome]) -> usize {
    outcomes
        .iter()
        .filter(|o| !o.is_complete() && !o.is_cancelled())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadrop_protocol::ErrorKind;

    #[test]
    fn failure_count_ignores_cancellations() {
        let outcomes = [
            UploadOutcome::Complete {
                kind: MediaKind::Image,
                public_url: "https://x/get/a.jpg".into(),
            },
            UploadOutcome::cancelled(),
            UploadOutcome::failed(ErrorKind::UnsupportedType, "notes.txt"),
        ];
        assert_eq!(failure_count(&outcomes), 1);
    }

    #[tokio::test]
    async fn rejected_files_never_reach_the_network() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let config = UploaderConfig {
            // Nothing listens here; a network call would fail, not reject.
            endpoint: "http://127.0.0.1:9/presign/".into(),
            csrf_token: "tok".into(),
            ..Default::default()
        };
        let outcomes = run(config, vec![path], Output::Json).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].error_kind(), Some(ErrorKind::UnsupportedType));
    }
}
