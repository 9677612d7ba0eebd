//! Hand-off of finished uploads to the editor.

use mediadrop_protocol::MediaKind;

/// Receives the public URL of every completed upload.
///
/// Called exactly once per successful upload and never for failed or
/// cancelled ones. Inserting the media into the document is the sink's
/// job; the pipeline never touches the document model.
pub trait EditorSink: Send + Sync {
    fn on_upload_complete(&self, kind: MediaKind, public_url: &str);
}

impl<F> EditorSink for F
where
    F: Fn(MediaKind, &str) + Send + Sync,
{
    fn on_upload_complete(&self, kind: MediaKind, public_url: &str) {
        self(kind, public_url)
    }
}

/// HTML snippet the editor embeds for a finished upload.
pub fn embed_html(kind: MediaKind, public_url: &str) -> String {
    let src = escape_attr(public_url);
    match kind {
        MediaKind::Image => format!(r#"<img src="{src}">"#),
        MediaKind::Video => format!(r#"<video src="{src}" controls></video>"#),
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
