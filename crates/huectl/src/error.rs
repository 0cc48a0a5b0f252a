//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use huectl_config::ConfigError;
use huectl_core::{CoreError, ResourceKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the bridge at {address}: {reason}")]
    #[diagnostic(
        code(huectl::connection_failed),
        help(
            "Check that the bridge is powered and on the same network.\n\
             If the application key was revoked, pair again: huectl pair {address}"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Bridge did not respond after {attempts} attempt(s)")]
    #[diagnostic(
        code(huectl::bridge_unavailable),
        help("{reason}\nIncrease --timeout or check the bridge's network connection.")
    )]
    BridgeUnavailable { attempts: u32, reason: String },

    #[error("No bridge found on the local network")]
    #[diagnostic(
        code(huectl::no_bridge),
        help("Pass the bridge address explicitly: huectl pair <address>")
    )]
    NoBridgeFound,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not paired with a bridge")]
    #[diagnostic(
        code(huectl::not_paired),
        help(
            "No credential found in {location}.\n\
             Press the bridge's link button, then run: huectl pair"
        )
    )]
    NotPaired { location: String },

    #[error("The link button on {address} was not pressed in time")]
    #[diagnostic(
        code(huectl::link_button),
        help("Press the round button on top of the bridge, then run huectl pair again within 30 seconds.")
    )]
    LinkButton { address: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(huectl::not_found),
        help("Run: huectl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Bridge ───────────────────────────────────────────────────────
    #[error("Bridge rejected the request: {message}")]
    #[diagnostic(code(huectl::rejected))]
    Rejected { code: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(huectl::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(huectl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(huectl::config),
        help("Check the config file (huectl config path) and HUECTL_* variables.")
    )]
    Config(ConfigError),

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(huectl::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NoBridgeFound => exit_code::CONNECTION,
            Self::BridgeUnavailable { .. } => exit_code::TIMEOUT,
            Self::NotPaired { .. } | Self::LinkButton { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionError { address, reason } => {
                CliError::ConnectionFailed { address, reason }
            }

            CoreError::BridgeUnavailable { attempts, reason } => {
                CliError::BridgeUnavailable { attempts, reason }
            }

            CoreError::NotConnected => CliError::Internal("session used before connecting".into()),

            CoreError::NotFound { kind, id } => {
                let (resource_type, list_command) = match kind {
                    ResourceKind::Light => ("light", "lights list"),
                    ResourceKind::Group => ("group", "groups list"),
                    ResourceKind::Resource => ("resource", "bridge info"),
                };
                CliError::NotFound {
                    resource_type: resource_type.into(),
                    identifier: id,
                    list_command: list_command.into(),
                }
            }

            CoreError::Rejected { code, message } => CliError::Rejected { code, message },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { location } => CliError::NotPaired { location },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_exit_as_auth() {
        let err = CliError::from(ConfigError::NotFound {
            location: "/tmp/credentials.json".into(),
        });
        assert!(matches!(err, CliError::NotPaired { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn unknown_group_suggests_list_command() {
        let err = CliError::from(CoreError::NotFound {
            kind: ResourceKind::Group,
            id: "garage".into(),
        });
        match &err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "groups list"),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn exhausted_retries_exit_as_timeout() {
        let err = CliError::from(CoreError::BridgeUnavailable {
            attempts: 3,
            reason: "request timed out after 5s".into(),
        });
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }
}
