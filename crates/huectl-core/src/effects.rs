// ── Light effects ──
//
// Fixed sequences of session writes separated by sleeps. There is no
// scheduling here: each step is awaited in order, sleeps go through the
// session's clock, and a `CancellationToken` stops the sequence between
// steps.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::color;
use crate::error::CoreError;
use crate::model::{GroupMap, GroupState, LightState, StateChange, Transition};
use crate::session::{BridgeSession, numeric_id};

/// Group-name fragments that identify the main living space.
pub const FRONT_ROOM_KEYWORDS: [&str; 9] = [
    "front",
    "living",
    "lounge",
    "main",
    "sitting",
    "family",
    "reception",
    "parlor",
    "salon",
];

/// Delay between consecutive lights within one effect.
pub const STAGGER: Duration = Duration::from_millis(200);

const INTRO_BRIGHTNESS: u8 = 90;
const INTRO_HOLD: Duration = Duration::from_secs(8);
const PATTERN_BRIGHTNESS: u8 = 80;
const PATTERN_HOLD: Duration = Duration::from_secs(6);
const PATTERNS: [EffectKind; 3] = [EffectKind::Warm, EffectKind::Cool, EffectKind::Random];
const SETTLE_BRIGHTNESS: u8 = 60;
const QUICK_BRIGHTNESS: u8 = 85;

/// Color palette families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Any hue, moderately saturated.
    Random,
    /// Hues spread evenly across the lights.
    Rainbow,
    /// Reds, oranges, yellows.
    Warm,
    /// Greens, blues, purples.
    Cool,
    /// Any hue, fully saturated and bright.
    Party,
}

/// One xy color per light for `effect`.
pub fn palette<R: Rng + ?Sized>(effect: EffectKind, count: usize, rng: &mut R) -> Vec<(f64, f64)> {
    (0..count)
        .map(|index| effect_color(effect, index, count, rng))
        .collect()
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn effect_color<R: Rng + ?Sized>(
    effect: EffectKind,
    index: usize,
    count: usize,
    rng: &mut R,
) -> (f64, f64) {
    let (hue, saturation, value) = match effect {
        EffectKind::Random => (
            rng.random_range(0.0..1.0),
            rng.random_range(0.5..=1.0),
            rng.random_range(0.7..=1.0),
        ),
        EffectKind::Rainbow => (index as f64 / count.max(1) as f64, 1.0, 1.0),
        EffectKind::Warm => {
            let hue = if rng.random_bool(0.5) {
                rng.random_range(0.0..0.15)
            } else {
                rng.random_range(0.85..1.0)
            };
            (hue, rng.random_range(0.6..=1.0), rng.random_range(0.8..=1.0))
        }
        EffectKind::Cool => (
            rng.random_range(0.3..0.8),
            rng.random_range(0.6..=1.0),
            rng.random_range(0.8..=1.0),
        ),
        EffectKind::Party => (rng.random_range(0.0..1.0), rng.random_range(0.8..=1.0), 1.0),
    };
    color::hsv_to_xy(hue, saturation, value)
}

/// The group a front-room show targets: the first (lowest id) whose name
/// contains one of [`FRONT_ROOM_KEYWORDS`], else the first group.
pub fn find_front_room(groups: &GroupMap) -> Option<&GroupState> {
    let mut ordered: Vec<&GroupState> = groups.values().collect();
    ordered.sort_by_key(|g| numeric_id(&g.id));

    ordered
        .iter()
        .find(|g| {
            let name = g.name.to_lowercase();
            FRONT_ROOM_KEYWORDS.iter().any(|k| name.contains(k))
        })
        .or_else(|| ordered.first())
        .copied()
}

fn warm_white(brightness_percent: Option<u8>) -> StateChange {
    let (x, y) = color::WARM_WHITE;
    let change = StateChange::on().with_xy(x, y);
    match brightness_percent {
        Some(pct) => change.with_brightness_percent(pct),
        None => change,
    }
}

/// Number of warm/cool/random rounds that fit in `duration`.
pub fn pattern_cycles(duration: Duration) -> u64 {
    let round = PATTERN_HOLD.as_secs() * 3;
    (duration.as_secs() / round).max(1)
}

/// Outcome of applying one effect to a set of lights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectReport {
    pub applied: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl EffectReport {
    fn absorb(&mut self, other: EffectReport) {
        self.applied += other.applied;
        self.failed += other.failed;
        self.cancelled |= other.cancelled;
    }
}

/// Outcome of a complete show.
#[derive(Debug, Clone, Serialize)]
pub struct ShowReport {
    pub room: String,
    pub lights: usize,
    pub writes: EffectReport,
}

/// Runs effects against a session.
pub struct EffectSequencer {
    session: BridgeSession,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    stagger: Duration,
}

impl EffectSequencer {
    pub fn new(session: BridgeSession) -> Self {
        let clock = session.clock();
        Self {
            session,
            clock,
            cancel: CancellationToken::new(),
            stagger: STAGGER,
        }
    }

    /// Stop the sequence when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Turn each light on at `brightness_percent` with a color from
    /// `effect`, one light at a time.
    ///
    /// Per-light failures are logged and counted; errors that end the
    /// session abort the effect.
    pub async fn apply(
        &self,
        lights: &[LightState],
        effect: EffectKind,
        brightness_percent: u8,
        transition: Transition,
    ) -> Result<EffectReport, CoreError> {
        let colors = palette(effect, lights.len(), &mut rand::rng());
        let changes = colors.into_iter().map(|(x, y)| {
            StateChange::on()
                .with_brightness_percent(brightness_percent)
                .with_xy(x, y)
        });
        self.write_each(lights, changes, transition).await
    }

    /// Rotate rainbow colors across the lights, `cycles` times.
    pub async fn cycle_colors(
        &self,
        lights: &[LightState],
        cycles: u32,
        pause: Duration,
        transition: Transition,
    ) -> Result<EffectReport, CoreError> {
        let base = palette(EffectKind::Rainbow, lights.len(), &mut rand::rng());
        let mut report = EffectReport::default();

        for cycle in 0..cycles {
            let mut rotated = base.clone();
            if !rotated.is_empty() {
                let shift = usize::try_from(cycle).unwrap_or(0) % rotated.len();
                rotated.rotate_left(shift);
            }
            let changes = rotated
                .into_iter()
                .map(|(x, y)| StateChange::default().with_xy(x, y));
            report.absorb(self.write_each(lights, changes, transition).await?);
            if report.cancelled || !self.pause(pause).await {
                report.cancelled = true;
                break;
            }
        }
        Ok(report)
    }

    /// Set every light to warm white, optionally at a new brightness.
    ///
    /// Runs to completion even when the sequencer is cancelled, so it can
    /// be used to restore a room after an interrupted show.
    pub async fn settle(
        &self,
        lights: &[LightState],
        brightness_percent: Option<u8>,
        transition: Transition,
    ) -> Result<EffectReport, CoreError> {
        let changes = lights.iter().map(|_| warm_white(brightness_percent));
        self.write_each_inner(lights, changes, transition, false)
            .await
    }

    /// Resolve `room` (or the front room) to a group and its lights.
    pub async fn resolve_room(
        &self,
        room: Option<&str>,
    ) -> Result<(GroupState, Vec<LightState>), CoreError> {
        let name = match room {
            Some(name) => name.to_owned(),
            None => {
                let groups = self.session.groups(false).await?;
                find_front_room(&groups)
                    .map(|g| g.id.clone())
                    .ok_or_else(|| CoreError::Validation {
                        message: "bridge has no rooms or zones".into(),
                    })?
            }
        };

        let (group, lights) = self.session.lights_in_group(&name).await?;
        if lights.is_empty() {
            return Err(CoreError::Validation {
                message: format!("{} has no lights", group.name),
            });
        }
        Ok((group, lights))
    }

    /// The startup show: a rainbow intro, rounds of warm/cool/random
    /// patterns filling `duration`, then a warm-white finish.
    ///
    /// If cancelled part-way, lights are returned to warm white before
    /// the report is handed back.
    pub async fn startup_show(
        &self,
        room: Option<&str>,
        duration: Duration,
    ) -> Result<ShowReport, CoreError> {
        let (group, lights) = self.resolve_room(room).await?;
        info!(room = %group.name, lights = lights.len(), ?duration, "starting light show");

        let mut writes = EffectReport::default();

        info!("intro: rainbow");
        let intro = self
            .apply(
                &lights,
                EffectKind::Rainbow,
                INTRO_BRIGHTNESS,
                Transition::new(Duration::from_millis(500)),
            )
            .await?;
        writes.absorb(intro);
        if intro.applied == 0 {
            return Err(CoreError::Rejected {
                code: None,
                message: format!("no light in {} accepted the intro effect", group.name),
            });
        }

        let mut cancelled = intro.cancelled || !self.pause(INTRO_HOLD).await;

        let cycles = pattern_cycles(duration);
        'rounds: for cycle in 1..=cycles {
            for pattern in PATTERNS {
                if cancelled {
                    break 'rounds;
                }
                info!(%pattern, cycle, "pattern");
                let step = self
                    .apply(
                        &lights,
                        pattern,
                        PATTERN_BRIGHTNESS,
                        Transition::new(Duration::from_millis(300)),
                    )
                    .await?;
                writes.absorb(step);
                if step.cancelled {
                    cancelled = true;
                } else if step.applied > 0 {
                    cancelled = !self.pause(PATTERN_HOLD).await;
                } else {
                    warn!(%pattern, "pattern reached no lights");
                }
            }
        }

        let finish_brightness = if cancelled {
            info!("show cancelled, restoring warm white");
            None
        } else {
            info!("finish: warm white");
            Some(SETTLE_BRIGHTNESS)
        };
        let finish = self
            .settle(&lights, finish_brightness, Transition::new(Duration::from_secs(1)))
            .await?;
        writes.absorb(finish);
        writes.cancelled = cancelled;

        info!(applied = writes.applied, failed = writes.failed, "light show finished");
        Ok(ShowReport {
            room: group.name,
            lights: lights.len(),
            writes,
        })
    }

    /// One random effect at 85 %.
    pub async fn quick(&self, room: Option<&str>) -> Result<ShowReport, CoreError> {
        let (group, lights) = self.resolve_room(room).await?;
        info!(room = %group.name, "quick random lighting");
        let writes = self
            .apply(
                &lights,
                EffectKind::Random,
                QUICK_BRIGHTNESS,
                Transition::new(Duration::from_millis(800)),
            )
            .await?;
        Ok(ShowReport {
            room: group.name,
            lights: lights.len(),
            writes,
        })
    }

    // ── Internals ────────────────────────────────────────────────

    async fn write_each(
        &self,
        lights: &[LightState],
        changes: impl Iterator<Item = StateChange>,
        transition: Transition,
    ) -> Result<EffectReport, CoreError> {
        self.write_each_inner(lights, changes, transition, true).await
    }

    async fn write_each_inner(
        &self,
        lights: &[LightState],
        changes: impl Iterator<Item = StateChange>,
        transition: Transition,
        cancellable: bool,
    ) -> Result<EffectReport, CoreError> {
        let mut report = EffectReport::default();

        for (index, (light, change)) in lights.iter().zip(changes).enumerate() {
            if index > 0 {
                if cancellable {
                    if !self.pause(self.stagger).await {
                        report.cancelled = true;
                        break;
                    }
                } else {
                    self.clock.sleep(self.stagger).await;
                }
            }

            match self
                .session
                .set_light_state(&light.id, &change, Some(transition))
                .await
            {
                Ok(()) => report.applied += 1,
                Err(e) if e.requires_reconnect() => return Err(e),
                Err(e) => {
                    warn!(light = %light.name, id = %light.id, error = %e, "effect step failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Sleep unless cancelled first. Returns `false` on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = self.clock.sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::GroupKind;

    fn group(id: &str, name: &str) -> GroupState {
        GroupState {
            id: id.into(),
            name: name.into(),
            kind: GroupKind::Room,
            class: None,
            lights: vec![],
            any_on: false,
            all_on: false,
            brightness: None,
        }
    }

    #[test]
    fn front_room_prefers_keywords() {
        let groups: GroupMap = BTreeMap::from([
            ("1".into(), group("1", "Kitchen")),
            ("2".into(), group("2", "Bedroom")),
            ("10".into(), group("10", "Living Room")),
        ]);
        assert_eq!(find_front_room(&groups).map(|g| g.id.as_str()), Some("10"));
    }

    #[test]
    fn front_room_falls_back_to_lowest_id() {
        let groups: GroupMap = BTreeMap::from([
            ("10".into(), group("10", "Garage")),
            ("3".into(), group("3", "Office")),
        ]);
        assert_eq!(find_front_room(&groups).map(|g| g.id.as_str()), Some("3"));
        assert!(find_front_room(&GroupMap::new()).is_none());
    }

    #[test]
    fn rainbow_spreads_hues() {
        let mut rng = StdRng::seed_from_u64(7);
        let colors = palette(EffectKind::Rainbow, 3, &mut rng);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], color::hsv_to_xy(0.0, 1.0, 1.0));
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
    }

    #[test]
    fn palettes_stay_in_gamut() {
        let mut rng = StdRng::seed_from_u64(42);
        for effect in [
            EffectKind::Random,
            EffectKind::Warm,
            EffectKind::Cool,
            EffectKind::Party,
        ] {
            for (x, y) in palette(effect, 16, &mut rng) {
                assert!((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y));
            }
        }
    }

    #[test]
    fn cycles_fill_duration() {
        assert_eq!(pattern_cycles(Duration::from_secs(10)), 1);
        assert_eq!(pattern_cycles(Duration::from_secs(30)), 1);
        assert_eq!(pattern_cycles(Duration::from_secs(60)), 3);
    }
}
