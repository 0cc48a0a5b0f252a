//! `huectl pair`: obtain and store an application key.

use std::net::Ipv4Addr;
use std::time::Duration;

use dialoguer::Select;
use tracing::info;

use huectl_core::setup::{self, DiscoveredBridge};
use huectl_core::{CoreError, Pairing};

use crate::cli::{DiscoverArgs, PairArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{discover, util};

pub async fn handle(args: PairArgs, ctx: &Context) -> Result<(), CliError> {
    let store = ctx.credential_store();
    if let Ok(existing) = store.load() {
        let prompt = format!(
            "Replace the stored credential for {}?",
            existing.address()
        );
        if !util::confirm(&prompt, ctx.yes)? {
            output::status("Kept the existing credential", ctx.quiet);
            return Ok(());
        }
    }

    let address = match args.address {
        Some(address) => address,
        None => choose_bridge(&discover::find(&DiscoverArgs { network: None }).await?, ctx)?,
    };

    let host = args.name.unwrap_or_else(hostname);
    let devicetype = setup::devicetype(&host);

    let spinner = util::spinner(&format!("Press the link button on the bridge at {address}"));
    let waiting = spinner.clone();
    let pairing = Pairing::new(ctx.session_config()).with_window(Duration::from_secs(args.window));
    let result = pairing
        .pair(address, &devicetype, move |left| {
            waiting.set_message(format!(
                "Press the link button on the bridge at {address} ({}s left)",
                left.as_secs()
            ));
        })
        .await;
    spinner.finish_and_clear();

    let credential = result.map_err(|e| match e {
        CoreError::Rejected { code: Some(101), .. } => CliError::LinkButton {
            address: address.to_string(),
        },
        other => other.into(),
    })?;

    store.save(&credential)?;
    info!(%address, location = %store.location(), "credential stored");
    output::status(
        &format!("Paired with {address}. Credential saved to {}", store.location()),
        ctx.quiet,
    );
    Ok(())
}

fn choose_bridge(bridges: &[DiscoveredBridge], ctx: &Context) -> Result<Ipv4Addr, CliError> {
    if bridges.len() == 1 || ctx.yes {
        return bridges
            .first()
            .map(|b| b.address)
            .ok_or(CliError::NoBridgeFound);
    }

    let items: Vec<String> = bridges
        .iter()
        .map(|b| match b.name {
            Some(ref name) => format!("{} ({name}, {})", b.address, b.id),
            None => format!("{} ({})", b.address, b.id),
        })
        .collect();
    let index = Select::new()
        .with_prompt("Several bridges found, pick one")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;

    bridges
        .get(index)
        .map(|b| b.address)
        .ok_or(CliError::NoBridgeFound)
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_default()
}
