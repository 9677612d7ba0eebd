//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/mediadrop/uploader.toml`
//! - Windows: `%APPDATA%/mediadrop/uploader.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediadrop_credentials::CredentialClientConfig;
use mediadrop_presenter::Locale;
use mediadrop_upload::{IntakeLimits, RetryPolicy, UploadConfig};
use serde::{Deserialize, Serialize};

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Credential endpoint of the backend.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Anti-forgery token sent with every credential request.
    #[serde(default)]
    pub csrf_token: String,

    /// Session cookie, when the backend needs one.
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub locale: Locale,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Pause after a completed upload before its progress line is closed.
    #[serde(default = "default_complete_linger_ms")]
    pub complete_linger_ms: u64,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub timeouts: TimeoutSection,
}

/// `[retry]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// `[timeouts]` table, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutSection {
    #[serde(default = "default_credential_secs")]
    pub credential_secs: u64,
    #[serde(default = "default_transport_secs")]
    pub transport_secs: u64,
    #[serde(default = "default_credential_ttl_secs")]
    pub credential_ttl_secs: u64,
}

fn default_endpoint() -> String {
    "http://localhost:8000/api/uploads/presign/".into()
}

fn default_max_file_size_mb() -> u64 {
    1000
}

fn default_complete_linger_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    2
}

fn default_delay_ms() -> u64 {
    500
}

fn default_credential_secs() -> u64 {
    30
}

fn default_transport_secs() -> u64 {
    60
}

fn default_credential_ttl_secs() -> u64 {
    300
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            credential_secs: default_credential_secs(),
            transport_secs: default_transport_secs(),
            credential_ttl_secs: default_credential_ttl_secs(),
        }
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            csrf_token: String::new(),
            session_id: None,
            locale: Locale::default(),
            max_file_size_mb: default_max_file_size_mb(),
            complete_linger_ms: default_complete_linger_ms(),
            retry: RetrySection::default(),
            timeouts: TimeoutSection::default(),
        }
    }
}

impl UploaderConfig {
    /// Loads configuration from `path` (or the platform default), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: UploaderConfig = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = UploaderConfig::default();
            config.save_to(&path)?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (holds the session token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn credential_config(&self) -> CredentialClientConfig {
        let mut config = CredentialClientConfig::new(&self.endpoint, &self.csrf_token);
        config.session_id = self.session_id.clone().filter(|s| !s.is_empty());
        config.timeout = Duration::from_secs(self.timeouts.credential_secs);
        config
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            retry: RetryPolicy {
                max_retries: self.retry.max_retries,
                delay: Duration::from_millis(self.retry.delay_ms),
            },
            credential_timeout: Duration::from_secs(self.timeouts.credential_secs),
            transport_timeout: Duration::from_secs(self.timeouts.transport_secs),
            credential_ttl: Duration::from_secs(self.timeouts.credential_ttl_secs),
            complete_linger: Duration::from_millis(self.complete_linger_ms),
            limits: IntakeLimits {
                max_file_size: self.max_file_size_mb.saturating_mul(1024 * 1024),
            },
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("mediadrop")
            .join("uploader.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata)
            .join("mediadrop")
            .join("uploader.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/mediadrop/uploader.toml"))
    }
}
