//! Bridge command handlers.

use serde::Serialize;

use huectl_core::{BridgeInfo, BridgeSession, ConnectionState};

use crate::cli::{BridgeArgs, BridgeCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct BridgeView {
    #[serde(flatten)]
    info: BridgeInfo,
    address: Option<String>,
    state: ConnectionState,
    cache_ttl: String,
}

fn detail(view: &BridgeView) -> String {
    let address = view.address.as_deref().unwrap_or("-");
    [
        format!("Name:       {}", view.info.name),
        format!("Bridge ID:  {}", view.info.bridge_id),
        format!("Address:    {address}"),
        format!("Model:      {}", view.info.model_id),
        format!("API:        {}", view.info.api_version),
        format!("Firmware:   {}", view.info.software_version),
        format!("Session:    {}", view.state),
        format!("Cache TTL:  {}", view.cache_ttl),
    ]
    .join("\n")
}

pub async fn handle(
    session: &BridgeSession,
    args: BridgeArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    match args.command {
        BridgeCommand::Info => {
            let view = BridgeView {
                info: session.bridge_info().await?,
                address: session.address().await.map(|a| a.to_string()),
                state: session.state(),
                cache_ttl: humantime::format_duration(session.config().cache_ttl).to_string(),
            };
            let out = output::render_single(ctx.output, &view, detail, |v| {
                v.info.bridge_id.clone()
            });
            output::print_output(&out, ctx.quiet);
            Ok(())
        }
    }
}
