//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use huectl_core::{Color, StateChange, color};

use crate::cli::StateArgs;
use crate::error::CliError;

/// Build a state change from `--brightness`, `--hex` and `--kelvin`,
/// optionally switching the light on or off.
pub fn state_change(on: Option<bool>, args: &StateArgs) -> Result<StateChange, CliError> {
    let mut change = match on {
        Some(true) => StateChange::on(),
        Some(false) => StateChange::off(),
        None => StateChange::default(),
    };

    if let Some(pct) = args.brightness {
        change = change.with_brightness_percent(pct);
    }
    if let Some(ref hex) = args.hex {
        let (x, y) = color::hex_to_xy(hex).map_err(|e| CliError::Validation {
            field: "hex".into(),
            reason: e.to_string(),
        })?;
        change = change.with_xy(x, y);
    }
    if let Some(kelvin) = args.kelvin {
        change = change.with_temperature(kelvin_to_mirek(kelvin));
    }

    if change.is_empty() {
        return Err(CliError::Validation {
            field: "state".into(),
            reason: "pass at least one of --brightness, --hex or --kelvin".into(),
        });
    }
    Ok(change)
}

fn kelvin_to_mirek(kelvin: u32) -> u16 {
    let mirek = 1_000_000u32.checked_div(kelvin).unwrap_or(u32::MAX);
    u16::try_from(mirek).unwrap_or(Color::MAX_MIREK)
}

/// Short description of a light color for tables.
pub fn describe_color(color: Option<&Color>) -> String {
    match color {
        Some(Color::Xy { x, y }) => format!("xy {x:.3},{y:.3}"),
        Some(c @ Color::Temperature { .. }) => {
            c.kelvin().map(|k| format!("{k} K")).unwrap_or_default()
        }
        None => String::new(),
    }
}

/// Brightness as "NN%", or empty for lights without dimming.
pub fn describe_brightness(brightness: Option<u8>) -> String {
    brightness
        .map(|b| format!("{}%", color::brightness_to_percent(b)))
        .unwrap_or_default()
}

/// Order bridge ids numerically ("2" before "10").
pub fn sort_by_id<T>(items: &mut [T], id: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| {
        let id = id(item);
        (id.parse::<u64>().unwrap_or(u64::MAX), id.to_owned())
    });
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// A stderr spinner for waits on the network.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> StateArgs {
        StateArgs {
            brightness: None,
            hex: None,
            kelvin: None,
            transition: None,
        }
    }

    #[test]
    fn on_without_options_is_valid() {
        let change = state_change(Some(true), &args()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(change.on, Some(true));
    }

    #[test]
    fn set_without_options_is_rejected() {
        assert!(matches!(
            state_change(None, &args()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn kelvin_becomes_mirek() {
        let change = state_change(
            None,
            &StateArgs {
                kelvin: Some(2700),
                ..args()
            },
        )
        .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(change.color, Some(Color::Temperature { mirek: 370 }));
    }

    #[test]
    fn ids_sort_numerically() {
        let mut ids = vec!["10", "2", "1"];
        sort_by_id(&mut ids, |s| *s);
        assert_eq!(ids, vec!["1", "2", "10"]);
    }
}
