//! CLI configuration: a thin layer over `huectl_config` that applies
//! `GlobalOpts` flag overrides and opens bridge sessions.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use tracing::debug;

use huectl_config::{CredentialBackend, CredentialStore, Settings};
use huectl_core::{BridgeSession, SessionConfig, Transition};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Re-exports from shared crate ────────────────────────────────────

pub use huectl_config::{config_path, save_settings_to};

/// Everything a command handler needs besides its own arguments.
pub struct Context {
    pub settings: Settings,
    /// The config file the settings were layered from.
    pub config_path: PathBuf,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl Context {
    /// Load settings and apply flag overrides. Flags beat environment,
    /// which beats the config file.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = global.config.clone().unwrap_or_else(config_path);
        let mut settings = huectl_config::load_settings_from(&path)?;
        apply_overrides(&mut settings, global);
        settings.validate()?;

        let output = match global.output {
            Some(format) => format,
            None => parse_setting::<OutputFormat>("defaults.output", &settings.defaults.output)?,
        };
        let color_mode = match global.color {
            Some(mode) => mode,
            None => parse_setting::<ColorMode>("defaults.color", &settings.defaults.color)?,
        };

        Ok(Self {
            settings,
            config_path: path,
            output,
            color: output::should_color(color_mode),
            quiet: global.quiet,
            yes: global.yes,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        self.settings.session_config()
    }

    pub fn credential_store(&self) -> Box<dyn CredentialStore> {
        self.settings.credential_store()
    }

    /// Open a session with the stored credential.
    pub async fn connect(&self) -> Result<BridgeSession, CliError> {
        let credential = self.credential_store().load()?;
        debug!(address = %credential.address(), "opening bridge session");

        let session = BridgeSession::new(self.session_config());
        session.connect(&credential).await?;
        Ok(session)
    }

    /// `ms` if given, else the configured default transition.
    pub fn transition(&self, ms: Option<u64>) -> Transition {
        ms.map_or_else(
            || Transition::new(self.settings.transition()),
            |ms| Transition::new(Duration::from_millis(ms)),
        )
    }
}

fn apply_overrides(settings: &mut Settings, global: &GlobalOpts) {
    if let Some(timeout) = global.timeout {
        settings.session.timeout = timeout;
    }
    if global.insecure {
        settings.session.insecure = true;
        settings.session.ca_cert = None;
    }
    if let Some(ref path) = global.credentials {
        settings.credentials.backend = CredentialBackend::File;
        settings.credentials.path = Some(path.clone());
    }
}

fn parse_setting<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["huectl"];
        argv.extend_from_slice(args);
        argv.push("bridge");
        argv.push("info");
        Cli::try_parse_from(argv).map(|cli| cli.global).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn flags_override_settings() {
        let mut settings = Settings::default();
        settings.session.ca_cert = Some(PathBuf::from("/etc/ca.pem"));

        let opts = global(&["--timeout", "9", "-k", "--credentials", "/tmp/creds.json"]);
        apply_overrides(&mut settings, &opts);

        assert_eq!(settings.session.timeout, 9);
        assert!(settings.session.insecure);
        assert!(settings.session.ca_cert.is_none());
        assert_eq!(settings.credentials_path(), PathBuf::from("/tmp/creds.json"));
    }

    #[test]
    fn output_setting_parses_case_insensitively() {
        let format: OutputFormat = parse_setting("defaults.output", "JSON").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(format, OutputFormat::Json);
        assert!(parse_setting::<ColorMode>("defaults.color", "sometimes").is_err());
    }
}
