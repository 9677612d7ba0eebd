use serde::{Deserialize, Serialize};

use crate::types::UploadRequest;

/// Body of the credential issuance `POST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub filename: String,
    pub content_type: String,
    pub file_size: u64,
}

impl From<&UploadRequest> for CredentialRequest {
    fn from(req: &UploadRequest) -> Self {
        Self {
            filename: req.file_name.clone(),
            content_type: req.mime_type.clone(),
            file_size: req.size_bytes,
        }
    }
}

/// Response of the credential endpoint, for both success and failure.
///
/// On success `upload_url` and `file_url` are set; on failure `error`
/// carries a human-readable reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
