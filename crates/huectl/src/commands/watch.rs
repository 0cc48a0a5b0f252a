//! `huectl watch`: periodic light status until interrupted.

use std::time::Duration;

use chrono::Local;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use huectl_core::{BridgeSession, CoreError, LightState};

use crate::cli::WatchArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{lights, util};

pub async fn handle(
    session: &BridgeSession,
    args: WatchArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    let period = args
        .interval
        .map_or_else(|| ctx.settings.poll_interval(), Duration::from_secs);
    if period.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut refreshes = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        match snapshot(session, &args).await {
            Ok(lights) => {
                let header = format!("── {} ──", Local::now().format("%H:%M:%S"));
                output::print_output(&header, ctx.quiet);
                output::print_output(&lights::render(ctx, &lights), ctx.quiet);
            }
            Err(CoreError::BridgeUnavailable { attempts, reason }) => {
                warn!(attempts, %reason, "bridge unavailable, will try again");
                output::status(
                    &format!("bridge unavailable after {attempts} attempt(s), retrying"),
                    ctx.quiet,
                );
            }
            Err(e) => return Err(e.into()),
        }

        refreshes += 1;
        if args.count.is_some_and(|n| refreshes >= n) {
            break;
        }
    }
    Ok(())
}

async fn snapshot(session: &BridgeSession, args: &WatchArgs) -> Result<Vec<LightState>, CoreError> {
    if args.fresh {
        session.clear_cache().await;
    }
    let mut lights = match args.group {
        Some(ref name) => session.lights_in_group(name).await?.1,
        None => session.lights(false).await?.values().cloned().collect(),
    };
    util::sort_by_id(&mut lights, |l| &l.id);
    Ok(lights)
}
