use thiserror::Error;

/// Top-level error type for the `huectl-api` crate.
///
/// Covers every failure mode of talking to a bridge: transport, TLS,
/// the bridge's own error payloads, pairing, and discovery.
/// `huectl-core` maps these into session-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The bridge rejected the application key (error type 1, or a
    /// config response without the whitelist).
    #[error("Unauthorized: {description}")]
    Unauthorized { description: String },

    /// Pairing attempted before the physical link button was pressed.
    #[error("Link button not pressed")]
    LinkButtonNotPressed,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Bridge ──────────────────────────────────────────────────────
    /// Error payload returned by the bridge:
    /// `[{"error": {"type": N, "address": "...", "description": "..."}}]`.
    #[error("Bridge error {code} at {address}: {description}")]
    Bridge {
        code: u16,
        address: String,
        description: String,
    },

    /// Referenced light or group does not exist (error type 3 or HTTP 404).
    #[error("Resource not available: {resource}")]
    NotFound { resource: String },

    /// Unexpected HTTP status from the bridge or discovery service.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Discovery ───────────────────────────────────────────────────
    /// Could not determine the local network to probe.
    #[error("Discovery failed: {0}")]
    Discovery(String),
}

/// Bridge error type for an unauthorized user.
pub const ERROR_UNAUTHORIZED: u16 = 1;
/// Bridge error type for a resource that is not available.
pub const ERROR_RESOURCE_NOT_AVAILABLE: u16 = 3;
/// Bridge error type for "link button not pressed".
pub const ERROR_LINK_BUTTON: u16 = 101;

impl Error {
    /// Build an error from a bridge error payload, mapping well-known
    /// error types to dedicated variants.
    pub fn from_payload(code: u16, address: String, description: String) -> Self {
        match code {
            ERROR_UNAUTHORIZED => Self::Unauthorized { description },
            ERROR_RESOURCE_NOT_AVAILABLE => Self::NotFound { resource: address },
            ERROR_LINK_BUTTON => Self::LinkButtonNotPressed,
            _ => Self::Bridge {
                code,
                address,
                description,
            },
        }
    }

    /// Returns `true` if the bridge rejected the application key.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a network-level error worth retrying.
    ///
    /// Only timeouts, connect failures and dropped connections qualify,
    /// including a connection cut while the body was streaming. Anything
    /// the bridge actually answered with is permanent.
    ///
    /// Bodies are read as text, so a reqwest decode error can only come
    /// from the stream breaking off.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.is_body()
                    || e.is_decode()
            }
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::Http { status: 404, .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Extract the bridge error type, if available.
    pub fn bridge_error_code(&self) -> Option<u16> {
        match self {
            Self::Bridge { code, .. } => Some(*code),
            Self::Unauthorized { .. } => Some(ERROR_UNAUTHORIZED),
            Self::NotFound { .. } => Some(ERROR_RESOURCE_NOT_AVAILABLE),
            Self::LinkButtonNotPressed => Some(ERROR_LINK_BUTTON),
            _ => None,
        }
    }
}
