// ── Group domain types ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// What the bridge uses a group for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum GroupKind {
    Room,
    Zone,
    LightGroup,
    Entertainment,
    Other,
}

impl GroupKind {
    pub fn from_bridge_type(raw: &str) -> Self {
        match raw {
            "Room" => Self::Room,
            "Zone" => Self::Zone,
            "LightGroup" | "Luminaire" | "LightSource" => Self::LightGroup,
            "Entertainment" => Self::Entertainment,
            _ => Self::Other,
        }
    }
}

/// A named collection of lights, with the bridge's aggregate view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    pub id: String,
    pub name: String,
    pub kind: GroupKind,
    /// Room class such as "Living room", when the bridge reports one.
    pub class: Option<String>,
    pub lights: Vec<String>,
    pub any_on: bool,
    pub all_on: bool,
    /// Brightness of the last group action.
    pub brightness: Option<u8>,
}

impl GroupState {
    /// Case-insensitive substring match against the group name.
    pub fn matches_name(&self, needle: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(&needle.trim().to_lowercase())
    }
}
