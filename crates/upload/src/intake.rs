//! File intake: drag-drop, paste and file-picker adapters.
//!
//! Every adapter funnels into [`Intake::collect`], which applies the same
//! validation and turns each rejection into a localized notice.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use mediadrop_presenter::{NoticeLevel, UploadSurface};
use mediadrop_protocol::{ErrorKind, UploadOutcome, UploadRequest};
use tracing::{debug, info, warn};

/// Default upper bound for a single file (1000 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1000 * 1024 * 1024;

/// Where a file entered the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSource {
    DragDrop,
    Paste,
    FilePicker,
}

/// A file as handed over by the host, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A file that passed validation and may enter the pipeline.
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    request: UploadRequest,
    data: Bytes,
}

impl AcceptedFile {
    pub fn request(&self) -> &UploadRequest {
        &self.request
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Why a file was turned away at intake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("{file}: unsupported type {mime_type:?}")]
    UnsupportedType { file: String, mime_type: String },

    #[error("{file}: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { file: String, size: u64, limit: u64 },

    #[error("{file}: file is empty")]
    EmptyFile { file: String },

    #[error("{file}: {reason}")]
    Unreadable { file: String, reason: String },
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::EmptyFile { .. } => ErrorKind::EmptyFile,
            Self::Unreadable { .. } => ErrorKind::Unexpected,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::UnsupportedType { file, .. }
            | Self::FileTooLarge { file, .. }
            | Self::EmptyFile { file }
            | Self::Unreadable { file, .. } => file,
        }
    }

    pub fn to_outcome(&self) -> UploadOutcome {
        UploadOutcome::failed(self.kind(), self.to_string())
    }

    fn notify(&self, surface: &dyn UploadSurface) {
        let locale = surface.locale();
        let (level, title, message) = match self {
            Self::UnsupportedType { file, .. } => {
                (NoticeLevel::Warning, locale.unsupported_file(file), None)
            }
            Self::FileTooLarge { file, limit, .. } => {
                (NoticeLevel::Warning, locale.file_too_large(file, *limit), None)
            }
            Self::EmptyFile { file } => (NoticeLevel::Warning, locale.empty_file(file), None),
            Self::Unreadable { file, reason } => {
                (NoticeLevel::Error, locale.upload_failed(file), Some(reason.clone()))
            }
        };
        surface.notify(level, title, message);
    }
}

/// Validation bounds applied by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    pub max_file_size: u64,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl IntakeLimits {
    /// Accepts `image/*` and `video/*` files that are neither empty nor
    /// over the size limit.
    pub fn validate(&self, file: MediaFile) -> Result<AcceptedFile, IntakeError> {
        let request = UploadRequest::new(file.name, file.mime_type, file.data.len() as u64);

        if request.kind().is_none() {
            return Err(IntakeError::UnsupportedType {
                file: request.file_name,
                mime_type: request.mime_type,
            });
        }
        if request.size_bytes == 0 {
            return Err(IntakeError::EmptyFile {
                file: request.file_name,
            });
        }
        if request.size_bytes > self.max_file_size {
            return Err(IntakeError::FileTooLarge {
                file: request.file_name,
                size: request.size_bytes,
                limit: self.max_file_size,
            });
        }

        Ok(AcceptedFile {
            request,
            data: file.data,
        })
    }
}

/// Result of screening one hand-over of files.
#[derive(Debug, Default)]
pub struct IntakeBatch {
    /// Files to upload, in the order they were received.
    pub accepted: Vec<AcceptedFile>,
    pub rejected: Vec<IntakeError>,
}

impl IntakeBatch {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty() && self.rejected.is_empty()
    }
}

/// Shared validation front door for all adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Intake {
    limits: IntakeLimits,
}

impl Intake {
    pub fn new(limits: IntakeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> IntakeLimits {
        self.limits
    }

    /// Validates `files` in order, notifying `surface` of each rejection.
    pub fn collect(
        &self,
        files: impl IntoIterator<Item = MediaFile>,
        surface: &dyn UploadSurface,
    ) -> IntakeBatch {
        let mut batch = IntakeBatch::default();
        for file in files {
            match self.limits.validate(file) {
                Ok(accepted) => {
                    debug!(
                        file = %accepted.request.file_name,
                        mime = %accepted.request.mime_type,
                        size = accepted.request.size_bytes,
                        "file accepted"
                    );
                    batch.accepted.push(accepted);
                }
                Err(e) => {
                    info!(file = %e.file(), kind = %e.kind(), "file rejected");
                    e.notify(surface);
                    batch.rejected.push(e);
                }
            }
        }
        batch
    }

    /// Drains an adapter through [`Intake::collect`].
    ///
    /// Files the adapter already turned away are reported like invalid ones.
    pub fn accept(&self, adapter: impl IntakeAdapter, surface: &dyn UploadSurface) -> IntakeBatch {
        let source = adapter.source();
        let (files, rejected) = adapter.into_files();
        debug!(?source, files = files.len(), "intake");

        let mut batch = self.collect(files, surface);
        for e in rejected {
            info!(file = %e.file(), kind = %e.kind(), "file rejected");
            e.notify(surface);
            batch.rejected.push(e);
        }
        batch
    }
}

/// A host-side source of files.
pub trait IntakeAdapter {
    fn source(&self) -> IntakeSource;

    /// Files in the order received, plus those rejected before reading.
    fn into_files(self) -> (Vec<MediaFile>, Vec<IntakeError>);
}

/// Files dropped onto the editor.
#[derive(Debug, Clone, Default)]
pub struct DropAdapter {
    files: Vec<MediaFile>,
}

impl DropAdapter {
    pub fn new(files: Vec<MediaFile>) -> Self {
        Self { files }
    }
}

impl IntakeAdapter for DropAdapter {
    fn source(&self) -> IntakeSource {
        IntakeSource::DragDrop
    }

    fn into_files(self) -> (Vec<MediaFile>, Vec<IntakeError>) {
        (self.files, Vec::new())
    }
}

/// One entry of a clipboard paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    Text(String),
    File(MediaFile),
}

/// Clipboard contents pasted into the editor.
///
/// Text items belong to the editor's own paste handling and are skipped.
#[derive(Debug, Clone, Default)]
pub struct PasteAdapter {
    items: Vec<ClipboardItem>,
}

impl PasteAdapter {
    pub fn new(items: Vec<ClipboardItem>) -> Self {
        Self { items }
    }
}

impl IntakeAdapter for PasteAdapter {
    fn source(&self) -> IntakeSource {
        IntakeSource::Paste
    }

    fn into_files(self) -> (Vec<MediaFile>, Vec<IntakeError>) {
        let files = self
            .items
            .into_iter()
            .filter_map(|item| match item {
                ClipboardItem::File(file) => Some(file),
                ClipboardItem::Text(_) => None,
            })
            .collect();
        (files, Vec::new())
    }
}

/// Files chosen through a file picker, read from disk.
///
/// Type and size are checked from the extension and file metadata first,
/// so a rejected file is never read.
#[derive(Debug, Default)]
pub struct FilePickerAdapter {
    files: Vec<MediaFile>,
    rejected: Vec<IntakeError>,
}

impl FilePickerAdapter {
    /// Reads every acceptable path, keeping the picker's order.
    pub async fn open(paths: impl IntoIterator<Item = PathBuf>, limits: IntakeLimits) -> Self {
        let mut adapter = Self::default();
        for path in paths {
            match read_picked(&path, limits).await {
                Ok(file) => adapter.files.push(file),
                Err(e) => adapter.rejected.push(e),
            }
        }
        adapter
    }
}

async fn read_picked(path: &Path, limits: IntakeLimits) -> Result<MediaFile, IntakeError> {
    let name = file_name(path);
    let unreadable = |e: std::io::Error| {
        warn!(path = %path.display(), error = %e, "failed to read picked file");
        IntakeError::Unreadable {
            file: name.clone(),
            reason: e.to_string(),
        }
    };

    let Some(mime_type) = detect_content_type(&name) else {
        return Err(IntakeError::UnsupportedType {
            file: name.clone(),
            mime_type: "application/octet-stream".into(),
        });
    };

    let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
    if size == 0 {
        return Err(IntakeError::EmptyFile { file: name.clone() });
    }
    if size > limits.max_file_size {
        return Err(IntakeError::FileTooLarge {
            file: name.clone(),
            size,
            limit: limits.max_file_size,
        });
    }

    let data = tokio::fs::read(path).await.map_err(unreadable)?;
    Ok(MediaFile::new(name, mime_type, data))
}

impl IntakeAdapter for FilePickerAdapter {
    fn source(&self) -> IntakeSource {
        IntakeSource::FilePicker
    }

    fn into_files(self) -> (Vec<MediaFile>, Vec<IntakeError>) {
        (self.files, self.rejected)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Detects the MIME type of an image or video from its file extension.
pub fn detect_content_type(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("avif") => Some("image/avif"),
        Some("bmp") => Some("image/bmp"),
        Some("svg") => Some("image/svg+xml"),
        Some("ico") => Some("image/x-icon"),
        Some("heic") => Some("image/heic"),
        Some("mp4" | "m4v") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("mov") => Some("video/quicktime"),
        Some("mkv") => Some("video/x-matroska"),
        Some("avi") => Some("video/x-msvideo"),
        Some("ogv") => Some("video/ogg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadrop_presenter::{Locale, MemorySurface};
    use std::fs;
    use tempfile::TempDir;

    fn jpeg(name: &str) -> MediaFile {
        MediaFile::new(name, "image/jpeg", vec![0xFFu8; 2048])
    }

    #[test]
    fn validate_accepts_media() {
        let limits = IntakeLimits::default();
        let accepted = limits.validate(jpeg("photo.jpg")).unwrap();
        assert_eq!(accepted.request().file_name, "photo.jpg");
        assert_eq!(accepted.request().size_bytes, 2048);
        assert_eq!(accepted.data().len(), 2048);

        let video = MediaFile::new("clip.mp4", "video/mp4", vec![1u8; 10]);
        assert!(limits.validate(video).is_ok());
    }

    #[test]
    fn validate_rejects_non_media() {
        let err = IntakeLimits::default()
            .validate(MediaFile::new("notes.txt", "text/plain", "hello"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(err.file(), "notes.txt");
    }

    #[test]
    fn validate_rejects_empty_and_oversized() {
        let limits = IntakeLimits { max_file_size: 100 };
        let empty = limits
            .validate(MediaFile::new("a.png", "image/png", Vec::new()))
            .unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::EmptyFile);

        let big = limits
            .validate(MediaFile::new("b.png", "image/png", vec![0u8; 101]))
            .unwrap_err();
        assert_eq!(
            big,
            IntakeError::FileTooLarge {
                file: "b.png".into(),
                size: 101,
                limit: 100
            }
        );

        assert!(
            limits
                .validate(MediaFile::new("c.png", "image/png", vec![0u8; 100]))
                .is_ok()
        );
    }

    #[test]
    fn collect_keeps_order_and_notifies_rejections() {
        let surface = MemorySurface::new(Locale::En);
        let batch = Intake::default().collect(
            vec![
                jpeg("one.jpg"),
                MediaFile::new("notes.txt", "text/plain", "x"),
                jpeg("two.jpg"),
            ],
            &surface,
        );

        let names: Vec<_> = batch
            .accepted
            .iter()
            .map(|f| f.request().file_name.as_str())
            .collect();
        assert_eq!(names, ["one.jpg", "two.jpg"]);
        assert_eq!(batch.rejected.len(), 1);

        let notices = surface.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(notices[0].title.contains("notes.txt"));
    }

    #[test]
    fn rejection_notice_is_localized() {
        let surface = MemorySurface::new(Locale::Ru);
        Intake::default().collect(vec![MediaFile::new("doc.pdf", "application/pdf", "x")], &surface);
        assert_eq!(
            surface.notices()[0].title,
            Locale::Ru.unsupported_file("doc.pdf")
        );
    }

    #[test]
    fn drop_adapter_preserves_order() {
        let surface = MemorySurface::new(Locale::En);
        let adapter = DropAdapter::new(vec![jpeg("b.jpg"), jpeg("a.jpg")]);
        assert_eq!(adapter.source(), IntakeSource::DragDrop);

        let batch = Intake::default().accept(adapter, &surface);
        assert_eq!(batch.accepted[0].request().file_name, "b.jpg");
        assert_eq!(batch.accepted[1].request().file_name, "a.jpg");
    }

    #[test]
    fn paste_adapter_ignores_text() {
        let surface = MemorySurface::new(Locale::En);
        let adapter = PasteAdapter::new(vec![
            ClipboardItem::Text("some pasted prose".into()),
            ClipboardItem::File(jpeg("screenshot.jpg")),
        ]);
        let batch = Intake::default().accept(adapter, &surface);

        assert_eq!(batch.accepted.len(), 1);
        assert!(batch.rejected.is_empty());
        assert!(surface.notices().is_empty());
    }

    #[tokio::test]
    async fn file_picker_reads_and_detects() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Photo.JPG"), b"jpegdata").unwrap();
        fs::write(dir.path().join("clip.webm"), b"webmdata").unwrap();
        fs::write(dir.path().join("readme.md"), b"# hi").unwrap();

        let paths = vec![
            dir.path().join("Photo.JPG"),
            dir.path().join("clip.webm"),
            dir.path().join("readme.md"),
            dir.path().join("missing.png"),
        ];
        let adapter = FilePickerAdapter::open(paths, IntakeLimits::default()).await;
        assert_eq!(adapter.source(), IntakeSource::FilePicker);

        let surface = MemorySurface::new(Locale::En);
        let batch = Intake::default().accept(adapter, &surface);

        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.accepted[0].request().mime_type, "image/jpeg");
        assert_eq!(batch.accepted[1].request().mime_type, "video/webm");
        assert_eq!(batch.accepted[1].data().as_ref(), b"webmdata");

        let kinds: Vec<_> = batch.rejected.iter().map(IntakeError::kind).collect();
        assert_eq!(kinds, [ErrorKind::UnsupportedType, ErrorKind::Unexpected]);
        assert_eq!(surface.notices().len(), 2);
    }

    #[tokio::test]
    async fn file_picker_checks_size_before_reading() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("huge.mp4");
        // Sparse: reports a large length without the bytes on disk.
        fs::File::create(&big).unwrap().set_len(1 << 30).unwrap();
        fs::File::create(dir.path().join("blank.png")).unwrap();
        fs::write(dir.path().join("small.png"), b"png").unwrap();

        let limits = IntakeLimits { max_file_size: 1024 };
        let adapter = FilePickerAdapter::open(
            vec![big, dir.path().join("blank.png"), dir.path().join("small.png")],
            limits,
        )
        .await;
        let (files, rejected) = adapter.into_files();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "small.png");
        assert_eq!(
            rejected,
            [
                IntakeError::FileTooLarge {
                    file: "huge.mp4".into(),
                    size: 1 << 30,
                    limit: 1024,
                },
                IntakeError::EmptyFile {
                    file: "blank.png".into(),
                },
            ]
        );
    }

    #[test]
    fn detect_content_type_known() {
        assert_eq!(detect_content_type("image.png"), Some("image/png"));
        assert_eq!(detect_content_type("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(detect_content_type("IMAGE.PNG"), Some("image/png"));
        assert_eq!(detect_content_type("movie.MOV"), Some("video/quicktime"));
        assert_eq!(detect_content_type("clip.mp4"), Some("video/mp4"));
    }

    #[test]
    fn detect_content_type_unknown() {
        assert_eq!(detect_content_type("document.pdf"), None);
        assert_eq!(detect_content_type("noext"), None);
        assert_eq!(detect_content_type(""), None);
    }
}
