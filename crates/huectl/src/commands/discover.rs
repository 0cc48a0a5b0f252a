//! `huectl discover`: find bridges on the local network.

use tabled::Tabled;

use huectl_core::setup::{self, BridgeLocator, DiscoveredBridge, DiscoveryMethod};
use huectl_core::CoreError;

use crate::cli::DiscoverArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct BridgeRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Found via")]
    method: &'static str,
}

impl From<&DiscoveredBridge> for BridgeRow {
    fn from(b: &DiscoveredBridge) -> Self {
        Self {
            address: b.address.to_string(),
            id: b.id.clone(),
            port: b.port,
            name: b.name.clone().unwrap_or_default(),
            method: match b.method {
                DiscoveryMethod::Cloud => "cloud",
                DiscoveryMethod::Scan => "scan",
            },
        }
    }
}

/// Run discovery, failing with `NoBridgeFound` when nothing answers.
pub(crate) async fn find(args: &DiscoverArgs) -> Result<Vec<DiscoveredBridge>, CliError> {
    let locator = BridgeLocator::new().map_err(CoreError::from)?;
    let bridges = setup::discover_bridges(&locator, args.network).await?;
    if bridges.is_empty() {
        return Err(CliError::NoBridgeFound);
    }
    Ok(bridges)
}

pub async fn handle(args: DiscoverArgs, ctx: &Context) -> Result<(), CliError> {
    let spinner = (!ctx.quiet).then(|| super::util::spinner("Searching for bridges..."));
    let found = find(&args).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let bridges = found?;
    let out = output::render_list(ctx.output, &bridges, |b| BridgeRow::from(b), |b| {
        b.address.to_string()
    });
    output::print_output(&out, ctx.quiet);
    Ok(())
}
