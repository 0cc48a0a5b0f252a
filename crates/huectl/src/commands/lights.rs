//! Light command handlers.

use tabled::Tabled;

use huectl_core::{BridgeSession, LightState, StateChange};

use crate::cli::{LightsArgs, LightsCommand};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct LightRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Bri")]
    brightness: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "")]
    note: String,
}

impl LightRow {
    pub(crate) fn new(light: &LightState, color: bool) -> Self {
        Self {
            id: light.id.clone(),
            name: light.name.clone(),
            power: output::power(light.on, color),
            brightness: util::describe_brightness(light.brightness),
            color: util::describe_color(light.color.as_ref()),
            kind: light.kind.clone(),
            note: output::reachability(light.reachable, color),
        }
    }
}

fn detail(light: &LightState, color: bool) -> String {
    let mut lines = vec![
        format!("ID:         {}", light.id),
        format!("Name:       {}", light.name),
        format!("Power:      {}", output::power(light.on, color)),
        format!("Brightness: {}", util::describe_brightness(light.brightness)),
        format!("Color:      {}", util::describe_color(light.color.as_ref())),
        format!("Type:       {}", light.kind),
    ];
    if let Some(ref model) = light.model {
        lines.push(format!("Model:      {model}"));
    }
    if !light.reachable {
        lines.push(format!("Status:     {}", output::reachability(false, color)));
    }
    lines.join("\n")
}

/// Render lights in the context's output format, ordered by id.
pub(crate) fn render(ctx: &Context, lights: &[LightState]) -> String {
    output::render_list(
        ctx.output,
        lights,
        |l| LightRow::new(l, ctx.color),
        |l| l.id.clone(),
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &BridgeSession,
    args: LightsArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    match args.command {
        LightsCommand::List { fresh } => {
            let mut lights: Vec<LightState> =
                session.lights(fresh).await?.values().cloned().collect();
            util::sort_by_id(&mut lights, |l| &l.id);
            output::print_output(&render(ctx, &lights), ctx.quiet);
            Ok(())
        }

        LightsCommand::Get { id } => {
            let light = session.light(&id).await?;
            let out = output::render_single(
                ctx.output,
                &light,
                |l| detail(l, ctx.color),
                |l| l.id.clone(),
            );
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        LightsCommand::On { id, state } => {
            let change = util::state_change(Some(true), &state)?;
            session
                .set_light_state(&id, &change, Some(ctx.transition(state.transition)))
                .await?;
            output::status(&format!("Light {id} on"), ctx.quiet);
            Ok(())
        }

        LightsCommand::Off { id, transition } => {
            session
                .set_light_state(&id, &StateChange::off(), Some(ctx.transition(transition)))
                .await?;
            output::status(&format!("Light {id} off"), ctx.quiet);
            Ok(())
        }

        LightsCommand::Set { id, state } => {
            let change = util::state_change(None, &state)?;
            session
                .set_light_state(&id, &change, Some(ctx.transition(state.transition)))
                .await?;
            output::status(&format!("Light {id} updated"), ctx.quiet);
            Ok(())
        }
    }
}
