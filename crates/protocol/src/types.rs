use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// The kind of media an upload carries, derived from its mime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies a mime type. Only `image/*` and `video/*` are media.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let lower = mime_type.trim().to_ascii_lowercase();
        if lower.starts_with("image/") {
            Some(Self::Image)
        } else if lower.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file accepted for upload.
///
/// Built by intake validation; `size_bytes` is always non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Media kind of the request, `None` for non-media mime types.
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime_type)
    }
}

/// A short-lived write credential for exactly one [`UploadRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCredential {
    /// Opaque, time-limited, write-once destination.
    pub upload_url: String,
    /// Readable location once the write succeeded.
    pub public_url: String,
    /// Storage key, when the backend returns one.
    pub key: Option<String>,
    issued_at: Instant,
}

impl UploadCredential {
    pub fn new(upload_url: impl Into<String>, public_url: impl Into<String>, key: Option<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            public_url: public_url.into(),
            key,
            issued_at: Instant::now(),
        }
    }

    /// Time since the credential was issued.
    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }

    /// Whether the credential has outlived `ttl` and must be re-issued.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Stage of a single upload as seen by the presenter.
///
/// Variants are declared in their only legal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preparing,
    Uploading,
    Complete,
}

/// A progress update for one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: u8,
    pub stage: Stage,
}

impl ProgressEvent {
    pub fn preparing() -> Self {
        Self {
            percent: 0,
            stage: Stage::Preparing,
        }
    }

    /// Upload progress, clamped to 100.
    pub fn uploading(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
            stage: Stage::Uploading,
        }
    }

    pub fn complete() -> Self {
        Self {
            percent: 100,
            stage: Stage::Complete,
        }
    }
}

/// Why a transport attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportReason {
    Network,
    ServerRejected,
    Timeout,
    Aborted,
}

impl TransportReason {
    /// Network drops and timeouts are worth retrying unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::ServerRejected => "server_rejected",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TransportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classification carried by a failed [`UploadOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Mime type outside `image/*` and `video/*`.
    UnsupportedType,
    /// File larger than the configured limit.
    FileTooLarge,
    /// Zero-byte file.
    EmptyFile,
    /// The backend refused to issue a credential.
    Credential,
    Transport(TransportReason),
    Cancelled,
    Unexpected,
}

impl ErrorKind {
    /// Rejections raised by intake validation, before any network call.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::UnsupportedType | Self::FileTooLarge | Self::EmptyFile)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType => f.write_str("unsupported_type"),
            Self::FileTooLarge => f.write_str("file_too_large"),
            Self::EmptyFile => f.write_str("empty_file"),
            Self::Credential => f.write_str("credential"),
            Self::Transport(reason) => write!(f, "transport_{reason}"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Unexpected => f.write_str("unexpected"),
        }
    }
}

/// Final result of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Complete { kind: MediaKind, public_url: String },
    Failed { kind: ErrorKind, message: String },
}

impl UploadOutcome {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::failed(ErrorKind::Cancelled, "upload cancelled")
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                kind: ErrorKind::Cancelled,
                ..
            }
        )
    }

    /// The failure kind, `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Complete { .. } => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn public_url(&self) -> Option<&str> {
        match self {
            Self::Complete { public_url, .. } => Some(public_url),
            Self::Failed { .. } => None,
        }
    }
}
