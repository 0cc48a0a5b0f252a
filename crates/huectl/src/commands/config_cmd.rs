//! Config subcommand handlers.

use serde::Serialize;

use huectl_config::{ConfigError, CredentialRecord, Settings};

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::config::{Context, save_settings_to};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Credential view ─────────────────────────────────────────────────

/// Stored credential with the application key masked.
#[derive(Serialize)]
struct CredentialView {
    location: String,
    address: String,
    key: String,
    created_at: Option<String>,
    version: Option<String>,
}

impl CredentialView {
    fn new(record: &CredentialRecord, location: String) -> Self {
        Self {
            location,
            address: record.credential.address().to_string(),
            key: "****".into(),
            created_at: record.created_at.clone(),
            version: record.version.clone(),
        }
    }
}

fn credential_detail(view: &CredentialView) -> String {
    [
        format!("Location:   {}", view.location),
        format!("Bridge:     {}", view.address),
        format!("Key:        {}", view.key),
        format!("Created:    {}", view.created_at.as_deref().unwrap_or("unknown")),
        format!("Format:     {}", view.version.as_deref().unwrap_or("legacy")),
    ]
    .join("\n")
}

fn render_settings(settings: &Settings, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(settings)
            .map(|s| s.trim_end().to_owned())
            .map_err(|e| CliError::Config(ConfigError::Serialization(e))),
        other => Ok(output::render_single(other, settings, |_| String::new(), |_| {
            String::new()
        })),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, ctx: &Context) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            output::print_output(&render_settings(&ctx.settings, ctx.output)?, ctx.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&ctx.config_path.display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = &ctx.config_path;
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists (use --force to overwrite)", path.display()),
                });
            }
            save_settings_to(&Settings::default(), path)?;
            output::status(&format!("Wrote default settings to {}", path.display()), ctx.quiet);
            Ok(())
        }

        ConfigCommand::Credentials => {
            let store = ctx.credential_store();
            let record = store.load_record()?;
            let view = CredentialView::new(&record, store.location());
            let out = output::render_single(ctx.output, &view, credential_detail, |v| {
                v.address.clone()
            });
            output::print_output(&out, ctx.quiet);
            if record.migrated {
                output::status("Credential was in the legacy format and has been rewritten", ctx.quiet);
            }
            Ok(())
        }

        ConfigCommand::Forget => {
            let store = ctx.credential_store();
            if !util::confirm(&format!("Delete the credential in {}?", store.location()), ctx.yes)? {
                return Ok(());
            }
            if store.clear()? {
                output::status("Credential deleted", ctx.quiet);
            } else {
                output::status(&format!("No credential stored in {}", store.location()), ctx.quiet);
            }
            Ok(())
        }
    }
}
