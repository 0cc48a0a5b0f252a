// ── Write payloads ──

use std::time::Duration;

use huectl_api::models::StateUpdate;

use super::light::Color;
use crate::color;

/// Highest brightness the bridge accepts.
pub const MAX_BRIGHTNESS: u8 = 254;

/// A requested change to a light or group. Unset fields are left alone
/// by the bridge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateChange {
    pub on: Option<bool>,
    pub brightness: Option<u8>,
    pub color: Option<Color>,
}

impl StateChange {
    pub fn on() -> Self {
        Self {
            on: Some(true),
            ..Self::default()
        }
    }

    pub fn off() -> Self {
        Self {
            on: Some(false),
            ..Self::default()
        }
    }

    /// Set brightness, clamped to 0–254.
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness.min(MAX_BRIGHTNESS));
        self
    }

    /// Set brightness from a 0–100 percentage.
    pub fn with_brightness_percent(self, percent: u8) -> Self {
        self.with_brightness(color::percent_to_brightness(percent))
    }

    /// Set an xy color, clamped to the unit square.
    pub fn with_xy(mut self, x: f64, y: f64) -> Self {
        self.color = Some(Color::xy(x, y));
        self
    }

    /// Set a color temperature, clamped to the supported mirek range.
    pub fn with_temperature(mut self, mirek: u16) -> Self {
        self.color = Some(Color::temperature(mirek));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.brightness.is_none() && self.color.is_none()
    }

    /// Wire payload for a light `state` or group `action` write.
    pub fn to_update(&self, transition: Option<Transition>) -> StateUpdate {
        let (xy, ct) = match self.color {
            Some(Color::Xy { x, y }) => (Some([x, y]), None),
            Some(Color::Temperature { mirek }) => (None, Some(mirek)),
            None => (None, None),
        };
        StateUpdate {
            on: self.on,
            bri: self.brightness.map(|b| b.min(MAX_BRIGHTNESS)),
            xy,
            ct,
            transitiontime: transition.map(Transition::deciseconds),
        }
    }
}

/// Fade duration for a write. The bridge counts in 100 ms steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition(Duration);

impl Transition {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn instant() -> Self {
        Self(Duration::ZERO)
    }

    pub fn duration(self) -> Duration {
        self.0
    }

    /// Duration rounded to the nearest decisecond, saturating at `u16::MAX`.
    pub fn deciseconds(self) -> u16 {
        let ds = (self.0.as_millis() + 50) / 100;
        u16::try_from(ds).unwrap_or(u16::MAX)
    }
}

impl From<Duration> for Transition {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_is_clamped() {
        let change = StateChange::on().with_brightness(255);
        assert_eq!(change.brightness, Some(254));
    }

    #[test]
    fn transition_rounds_to_deciseconds() {
        assert_eq!(Transition::new(Duration::from_millis(400)).deciseconds(), 4);
        assert_eq!(Transition::new(Duration::from_millis(1260)).deciseconds(), 13);
        assert_eq!(Transition::instant().deciseconds(), 0);
        assert_eq!(
            Transition::new(Duration::from_secs(100_000)).deciseconds(),
            u16::MAX
        );
    }

    #[test]
    fn update_carries_only_requested_fields() {
        let update = StateChange::default()
            .with_temperature(366)
            .to_update(Some(Transition::new(Duration::from_secs(1))));
        assert_eq!(update.ct, Some(366));
        assert!(update.on.is_none());
        assert!(update.xy.is_none());
        assert_eq!(update.transitiontime, Some(10));
    }
}
