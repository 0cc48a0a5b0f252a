// ── Core error types ──
//
// Session-level errors from huectl-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<huectl_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::model::ResourceKind;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    /// Bridge unreachable, TLS failure, or token rejected. Fatal to the
    /// current session; a new `connect` is required.
    #[error("Cannot connect to bridge at {address}: {reason}")]
    ConnectionError { address: String, reason: String },

    /// Transient failures persisted through every allowed attempt.
    #[error("Bridge unavailable after {attempts} attempt(s): {reason}")]
    BridgeUnavailable { attempts: u32, reason: String },

    /// Operation attempted without an established session.
    #[error("Not connected to a bridge")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The bridge answered with an error payload.
    #[error("Rejected by bridge: {message}")]
    Rejected { code: Option<u16>, message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the caller may reasonably retry the operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BridgeUnavailable { .. })
    }

    /// Whether the session must be re-established before continuing.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::ConnectionError { .. } | Self::NotConnected)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<huectl_api::Error> for CoreError {
    fn from(err: huectl_api::Error) -> Self {
        use huectl_api::Error as Api;

        match err {
            Api::Unauthorized { description } => CoreError::ConnectionError {
                address: String::from("bridge"),
                reason: format!("application key rejected ({description})"),
            },
            e @ (Api::Transport(_) | Api::Timeout { .. }) if e.is_transient() => {
                CoreError::BridgeUnavailable {
                    attempts: 1,
                    reason: e.to_string(),
                }
            }
            Api::Transport(e) => CoreError::Rejected {
                code: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            Api::Timeout { timeout_secs } => CoreError::BridgeUnavailable {
                attempts: 1,
                reason: format!("request timed out after {timeout_secs}s"),
            },
            Api::Tls(reason) => CoreError::ConnectionError {
                address: String::from("bridge"),
                reason: format!("TLS error: {reason}"),
            },
            Api::InvalidUrl(e) => CoreError::Validation {
                message: format!("invalid bridge URL: {e}"),
            },
            Api::NotFound { resource } => not_found_from_path(&resource),
            Api::LinkButtonNotPressed => CoreError::Rejected {
                code: Some(huectl_api::error::ERROR_LINK_BUTTON),
                message: "link button not pressed".into(),
            },
            Api::Bridge {
                code,
                address,
                description,
            } => CoreError::Rejected {
                code: Some(code),
                message: format!("{description} ({address})"),
            },
            Api::Http { status, body } => CoreError::Rejected {
                code: None,
                message: format!("HTTP {status}: {body}"),
            },
            Api::Deserialization { message, .. } => {
                CoreError::Internal(format!("unexpected bridge response: {message}"))
            }
            Api::Discovery(message) => CoreError::Internal(message),
        }
    }
}

/// Recover the resource kind and id from an address such as `/lights/7`
/// or `/api/<key>/groups/3/action`.
fn not_found_from_path(resource: &str) -> CoreError {
    let segments: Vec<&str> = resource.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        let kind = match *segment {
            "lights" => ResourceKind::Light,
            "groups" => ResourceKind::Group,
            _ => continue,
        };
        if let Some(id) = segments.get(i + 1) {
            return CoreError::NotFound {
                kind,
                id: (*id).to_owned(),
            };
        }
    }
    CoreError::NotFound {
        kind: ResourceKind::Resource,
        id: resource.to_owned(),
    }
}
