//! Command dispatch: CLI args -> session calls -> output formatting.

pub mod bridge;
pub mod config_cmd;
pub mod discover;
pub mod groups;
pub mod lights;
pub mod pair;
pub mod show;
pub mod util;
pub mod watch;

use huectl_core::BridgeSession;

use crate::cli::Command;
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a session-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    session: &BridgeSession,
    ctx: &Context,
) -> Result<(), CliError> {
    match cmd {
        Command::Lights(args) => lights::handle(session, args, ctx).await,
        Command::Groups(args) => groups::handle(session, args, ctx).await,
        Command::Bridge(args) => bridge::handle(session, args, ctx).await,
        Command::Show(args) => show::handle(session, args, ctx).await,
        Command::Watch(args) => watch::handle(session, args, ctx).await,
        // Handled before a session is opened
        Command::Discover(_)
        | Command::Pair(_)
        | Command::Config(_)
        | Command::Completions(_) => Err(CliError::Internal(
            "command does not use a bridge session".into(),
        )),
    }
}
