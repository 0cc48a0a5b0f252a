// ── Domain model ──
//
// Canonical representations of bridge resources. Values are only ever
// produced from bridge responses (see `convert`); nothing here is
// synthesized by the session.

pub mod bridge;
pub mod change;
pub mod credential;
pub mod group;
pub mod light;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Re-exports ──────────────────────────────────────────────────────

pub use bridge::BridgeInfo;
pub use change::{StateChange, Transition};
pub use credential::BridgeCredential;
pub use group::{GroupKind, GroupState};
pub use light::{Color, LightState};

/// Lights keyed by bridge id.
pub type LightMap = BTreeMap<String, LightState>;

/// Groups keyed by bridge id.
pub type GroupMap = BTreeMap<String, GroupState>;

/// Which kind of bridge resource an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Light,
    Group,
    Resource,
}
