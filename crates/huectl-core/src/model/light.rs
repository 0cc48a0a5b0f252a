// ── Light domain types ──

use serde::{Deserialize, Serialize};

use crate::color;

/// Current color of a light, in whichever space the bridge reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Color {
    /// CIE 1931 chromaticity.
    Xy { x: f64, y: f64 },
    /// White color temperature in mirek (153 = 6500 K, 500 = 2000 K).
    Temperature { mirek: u16 },
}

impl Color {
    pub const MIN_MIREK: u16 = 153;
    pub const MAX_MIREK: u16 = 500;

    /// Xy color with both coordinates clamped into `0.0..=1.0`.
    pub fn xy(x: f64, y: f64) -> Self {
        Self::Xy {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        }
    }

    /// Color temperature clamped into the bridge's supported mirek range.
    pub fn temperature(mirek: u16) -> Self {
        Self::Temperature {
            mirek: mirek.clamp(Self::MIN_MIREK, Self::MAX_MIREK),
        }
    }

    /// Approximate Kelvin for temperature colors.
    pub fn kelvin(&self) -> Option<u32> {
        match self {
            Self::Temperature { mirek } => 1_000_000u32.checked_div(u32::from(*mirek)),
            Self::Xy { .. } => None,
        }
    }
}

/// Snapshot of one light as last reported by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub id: String,
    pub name: String,
    /// Bridge product type, e.g. "Extended color light".
    pub kind: String,
    pub model: Option<String>,
    pub on: bool,
    /// 0–254; `None` for lights without dimming (plugs, switches).
    pub brightness: Option<u8>,
    pub color: Option<Color>,
    pub reachable: bool,
}

impl LightState {
    /// Brightness as a 0–100 percentage.
    pub fn brightness_percent(&self) -> Option<u8> {
        self.brightness.map(color::brightness_to_percent)
    }
}
