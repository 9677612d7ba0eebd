//! HTTP credential client.
//!
//! Async `reqwest` client posting JSON to the credential endpoint, with the
//! anti-forgery token and session cookie attached to every request.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use mediadrop_protocol::{CredentialRequest, CredentialResponse, UploadCredential, UploadRequest};
use reqwest::{StatusCode, Url};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER};
use tracing::debug;

use crate::CredentialClient;
use crate::error::CredentialError;

/// Default per-request timeout for credential issuance.
pub const DEFAULT_CREDENTIAL_TIMEOUT: Duration = Duration::from_secs(30);

const CSRF_HEADER: &str = "x-csrftoken";

/// Connection settings for [`HttpCredentialClient`].
#[derive(Debug, Clone)]
pub struct CredentialClientConfig {
    /// Absolute URL of the credential endpoint.
    pub endpoint: String,
    /// Anti-forgery token, sent as header and cookie.
    pub csrf_token: String,
    /// Authenticated session id, if the backend needs one.
    pub session_id: Option<String>,
    pub timeout: Duration,
}

impl CredentialClientConfig {
    pub fn new(endpoint: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            csrf_token: csrf_token.into(),
            session_id: None,
            timeout: DEFAULT_CREDENTIAL_TIMEOUT,
        }
    }
}

/// Credential client backed by `reqwest`.
pub struct HttpCredentialClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpCredentialClient {
    /// Builds a client with the session proof baked into its default headers.
    pub fn new(config: CredentialClientConfig) -> Result<Self, CredentialError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| CredentialError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_str(&config.csrf_token).map_err(|_| CredentialError::InvalidToken)?,
        );
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie_header(&config))
                .map_err(|_| CredentialError::InvalidToken)?,
        );
        // Strict CSRF checks over HTTPS compare the referer origin.
        let origin = url.origin().ascii_serialization();
        if let Ok(referer) = HeaderValue::from_str(&format!("{origin}/")) {
            headers.insert(REFERER, referer);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    /// Requests one credential from the backend.
    pub async fn issue(&self, req: &UploadRequest) -> Result<UploadCredential, CredentialError> {
        let body = CredentialRequest::from(req);
        let resp = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let parsed = serde_json::from_slice::<CredentialResponse>(&bytes);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status_text(status));

            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(CredentialError::Server {
                    status: status.as_u16(),
                    message,
                });
            }
            return Err(CredentialError::Rejected(message));
        }

        let parsed = parsed.map_err(|e| CredentialError::Malformed(e.to_string()))?;
        if !parsed.success {
            return Err(CredentialError::Rejected(
                parsed
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "credential request refused".into()),
            ));
        }

        let (Some(upload_url), Some(file_url)) = (parsed.upload_url, parsed.file_url) else {
            return Err(CredentialError::Malformed(
                "missing upload_url or file_url".into(),
            ));
        };
        check_url("upload_url", &upload_url)?;
        check_url("file_url", &file_url)?;

        debug!(
            file = %req.file_name,
            key = parsed.key.as_deref().unwrap_or(""),
            "credential issued"
        );
        Ok(UploadCredential::new(upload_url, file_url, parsed.key))
    }
}

/// Both returned locations must be absolute URLs.
fn check_url(field: &str, value: &str) -> Result<(), CredentialError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| CredentialError::Malformed(format!("{field} {value:?}: {e}")))
}

impl CredentialClient for HttpCredentialClient {
    fn request_credential<'a>(
        &'a self,
        req: &'a UploadRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UploadCredential, CredentialError>> + Send + 'a>> {
        Box::pin(self.issue(req))
    }
}

fn cookie_header(config: &CredentialClientConfig) -> String {
    match config.session_id.as_deref() {
        Some(session) if !session.is_empty() => {
            format!("csrftoken={}; sessionid={session}", config.csrf_token)
        }
        _ => format!("csrftoken={}", config.csrf_token),
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}
