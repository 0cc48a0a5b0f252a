//! Settings and credential storage for huectl.
//!
//! Settings are layered with figment: built-in defaults, then
//! `config.toml` in the platform config directory, then `HUECTL_*`
//! environment variables. [`Settings::session_config`] turns them into the
//! `huectl_core::SessionConfig` a session runs with.
//!
//! Credentials live behind [`CredentialStore`]; see [`credentials`].

pub mod credentials;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use huectl_core::{RetryPolicy, SessionConfig, TlsVerification};

pub use credentials::{
    CredentialRecord, CredentialStore, FileCredentialStore, KeyringCredentialStore,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no stored bridge credentials in {location}")]
    NotFound { location: String },

    #[error("stored credentials in {location} are unreadable: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("stored credentials are invalid: {0}")]
    InvalidCredential(#[from] huectl_core::CoreError),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to encode credentials: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub watch: WatchSettings,

    #[serde(default)]
    pub effects: EffectSettings,

    #[serde(default)]
    pub credentials: CredentialSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// "table", "json", "json-compact", "yaml" or "plain".
    #[serde(default = "default_output")]
    pub output: String,

    /// "auto", "always" or "never".
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

const OUTPUT_FORMATS: [&str; 5] = ["table", "json", "json-compact", "yaml", "plain"];

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// How the session talks to the bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Snapshot cache lifetime in milliseconds. 0 disables caching.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Read attempts before giving up, including the first.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Accept the bridge's self-signed certificate.
    #[serde(default = "default_true")]
    pub insecure: bool,

    /// CA certificate to verify the bridge against instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub https: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            insecure: true,
            ca_cert: None,
            https: true,
            port: None,
        }
    }
}

fn default_cache_ttl_ms() -> u64 {
    2_000
}
fn default_timeout() -> u64 {
    5
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatchSettings {
    /// Seconds between refreshes in `huectl watch`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EffectSettings {
    /// Default transition for light and group writes, in milliseconds.
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    /// Default length of the startup show, in seconds.
    #[serde(default = "default_show_duration")]
    pub show_duration: u64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            transition_ms: default_transition_ms(),
            show_duration: default_show_duration(),
        }
    }
}

fn default_transition_ms() -> u64 {
    400
}
fn default_show_duration() -> u64 {
    30
}

/// Where the bridge credential is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CredentialSettings {
    #[serde(default)]
    pub backend: CredentialBackend,

    /// Credentials file; defaults to `credentials.json` beside the config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ── Derived runtime values ──────────────────────────────────────────

impl Settings {
    /// Reject values no session could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.timeout == 0 {
            return Err(invalid("session.timeout", "must be at least 1 second"));
        }
        if self.session.retry_attempts == 0 {
            return Err(invalid("session.retry_attempts", "must be at least 1"));
        }
        if self.watch.poll_interval == 0 {
            return Err(invalid("watch.poll_interval", "must be at least 1 second"));
        }
        if !OUTPUT_FORMATS.contains(&self.defaults.output.as_str()) {
            return Err(invalid(
                "defaults.output",
                format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.defaults.output
                ),
            ));
        }
        Ok(())
    }

    /// The session configuration these settings describe.
    pub fn session_config(&self) -> SessionConfig {
        let s = &self.session;
        let tls = if let Some(ref ca) = s.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else if s.insecure {
            TlsVerification::DangerAcceptInvalid
        } else {
            TlsVerification::SystemDefaults
        };

        SessionConfig {
            cache_ttl: Duration::from_millis(s.cache_ttl_ms),
            retry: RetryPolicy {
                max_attempts: s.retry_attempts.max(1),
                ..RetryPolicy::default()
            },
            timeout: Duration::from_secs(s.timeout),
            tls,
            https: s.https,
            port: s.port,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.watch.poll_interval)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.effects.transition_ms)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.credentials
            .path
            .clone()
            .unwrap_or_else(default_credentials_path)
    }

    /// The credential store selected by `credentials.backend`.
    pub fn credential_store(&self) -> Box<dyn CredentialStore> {
        match self.credentials.backend {
            CredentialBackend::File => Box::new(FileCredentialStore::new(self.credentials_path())),
            CredentialBackend::Keyring => Box::new(KeyringCredentialStore::default()),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    ProjectDirs::from("com", "huectl", "huectl").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("huectl");
            p
        },
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn default_credentials_path() -> PathBuf {
    config_dir().join("credentials.json")
}

// ── Loading and saving ──────────────────────────────────────────────

/// The layered figment for `path`, before extraction.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HUECTL_").split("__"))
}

/// Load settings from `path` (missing file is fine) and the environment.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let settings: Settings = figment(path).extract()?;
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(settings)?)?;
    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}
