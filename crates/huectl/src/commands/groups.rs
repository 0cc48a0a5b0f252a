//! Group (room / zone) command handlers.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use huectl_core::{
    BridgeSession, EffectKind, EffectSequencer, GroupState, LightState, StateChange,
};

use crate::cli::{EffectArg, GroupsArgs, GroupsCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::{lights, util};

const CYCLE_PAUSE: Duration = Duration::from_secs(2);

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Lights")]
    lights: usize,
    #[tabled(rename = "On")]
    on: String,
}

impl From<&GroupState> for GroupRow {
    fn from(g: &GroupState) -> Self {
        let on = match (g.all_on, g.any_on) {
            (true, _) => "all",
            (false, true) => "some",
            (false, false) => "none",
        };
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            kind: g.kind.to_string(),
            lights: g.lights.len(),
            on: on.into(),
        }
    }
}

/// A group with its member lights, for `groups get`.
#[derive(Serialize)]
struct GroupDetail {
    #[serde(flatten)]
    group: GroupState,
    members: Vec<LightState>,
}

impl From<EffectArg> for EffectKind {
    fn from(arg: EffectArg) -> Self {
        match arg {
            EffectArg::Random => Self::Random,
            EffectArg::Rainbow => Self::Rainbow,
            EffectArg::Warm => Self::Warm,
            EffectArg::Cool => Self::Cool,
            EffectArg::Party => Self::Party,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &BridgeSession,
    args: GroupsArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List { fresh } => {
            let mut groups: Vec<GroupState> =
                session.groups(fresh).await?.values().cloned().collect();
            util::sort_by_id(&mut groups, |g| &g.id);
            let out = output::render_list(
                ctx.output,
                &groups,
                |g| GroupRow::from(g),
                |g| g.id.clone(),
            );
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        GroupsCommand::Get { name } => {
            let (group, members) = session.lights_in_group(&name).await?;
            let detail = GroupDetail { group, members };
            let out = output::render_single(
                ctx.output,
                &detail,
                |d| {
                    format!(
                        "{} ({}, id {})\n{}",
                        d.group.name,
                        d.group.kind,
                        d.group.id,
                        lights::render(ctx, &d.members)
                    )
                },
                |d| d.group.id.clone(),
            );
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        GroupsCommand::On { name, state } => {
            let change = util::state_change(Some(true), &state)?;
            write(session, ctx, &name, &change, state.transition, "on").await
        }

        GroupsCommand::Off { name, transition } => {
            write(session, ctx, &name, &StateChange::off(), transition, "off").await
        }

        GroupsCommand::Set { name, state } => {
            let change = util::state_change(None, &state)?;
            write(session, ctx, &name, &change, state.transition, "updated").await
        }

        GroupsCommand::Effect {
            name,
            effect,
            brightness,
            cycle,
        } => {
            let (group, members) = session.lights_in_group(&name).await?;
            let sequencer = EffectSequencer::new(session.clone());
            let transition = ctx.transition(None);

            let report = match cycle {
                Some(cycles) => {
                    sequencer
                        .cycle_colors(&members, cycles, CYCLE_PAUSE, transition)
                        .await?
                }
                None => {
                    sequencer
                        .apply(&members, effect.into(), brightness, transition)
                        .await?
                }
            };

            output::status(
                &format!(
                    "{}: {} of {} lights updated{}",
                    group.name,
                    report.applied,
                    members.len(),
                    if report.failed > 0 {
                        format!(", {} failed", report.failed)
                    } else {
                        String::new()
                    }
                ),
                ctx.quiet,
            );
            Ok(())
        }
    }
}

async fn write(
    session: &BridgeSession,
    ctx: &Context,
    name: &str,
    change: &StateChange,
    transition_ms: Option<u64>,
    verb: &str,
) -> Result<(), CliError> {
    let group = session.find_group(name).await?;
    session
        .set_group_state(&group.id, change, Some(ctx.transition(transition_ms)))
        .await?;
    output::status(&format!("{} {verb}", group.name), ctx.quiet);
    Ok(())
}
