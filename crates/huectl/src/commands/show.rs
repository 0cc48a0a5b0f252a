//! `huectl show`: the startup light show.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use huectl_core::{BridgeSession, EffectSequencer, ShowReport};

use crate::cli::ShowArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    session: &BridgeSession,
    args: ShowArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received, stopping show");
                cancel.cancel();
            }
        })
    };

    let sequencer = EffectSequencer::new(session.clone()).with_cancel(cancel);
    let room = args.room.as_deref();

    let result = if args.quick {
        sequencer.quick(room).await
    } else {
        let secs = args
            .duration
            .unwrap_or(ctx.settings.effects.show_duration);
        output::status(
            &format!("Light show running for about {secs}s, Ctrl-C to stop"),
            ctx.quiet,
        );
        sequencer.startup_show(room, Duration::from_secs(secs)).await
    };
    watcher.abort();

    let report = result?;
    output::status(&summary(&report), ctx.quiet);
    Ok(())
}

fn summary(report: &ShowReport) -> String {
    let mut line = format!(
        "{}: {} light(s), {} write(s) applied",
        report.room, report.lights, report.writes.applied
    );
    if report.writes.failed > 0 {
        line.push_str(&format!(", {} failed", report.writes.failed));
    }
    if report.writes.cancelled {
        line.push_str(" (stopped early, lights restored to warm white)");
    }
    line
}
