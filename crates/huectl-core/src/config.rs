// ── Runtime session configuration ──
//
// Describes *how* to talk to a bridge: cache lifetime, retry budget,
// transport tuning. Never touches disk; the CLI builds a `SessionConfig`
// from its settings layer and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use huectl_api::transport::{TlsMode, TransportConfig};

use crate::retry::RetryPolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file, e.g. the vendor's bridge root CA.
    CustomCa(PathBuf),
    /// Skip verification. Bridges serve self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for one bridge session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a fetched snapshot may be served from cache.
    pub cache_ttl: Duration,
    /// Retry budget for reads.
    pub retry: RetryPolicy,
    /// Upper bound on a single bridge request.
    pub timeout: Duration,
    pub tls: TlsVerification,
    /// Talk HTTPS (default) or plain HTTP to the bridge.
    pub https: bool,
    /// Override the bridge port (443/80 by default).
    pub port: Option<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(2),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(5),
            tls: TlsVerification::default(),
            https: true,
            port: None,
        }
    }
}

impl SessionConfig {
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    pub(crate) fn scheme(&self) -> &'static str {
        if self.https { "https" } else { "http" }
    }
}
