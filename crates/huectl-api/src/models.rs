// Bridge API response and request types
//
// Models for the Hue Bridge v1 JSON API. Collections come back as objects
// keyed by resource id (`{"1": {...}, "2": {...}}`); write and pairing
// responses are arrays of `{"success": ...}` / `{"error": ...}` items.
// Fields use `#[serde(default)]` liberally because older firmware and
// third-party lights omit parts of the state object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Response items ───────────────────────────────────────────────────

/// One item of an array response from the bridge.
///
/// ```json
/// [{ "success": { "/lights/1/state/on": true } },
///  { "error": { "type": 3, "address": "/lights/9", "description": "..." } }]
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseItem<T> {
    Success(T),
    Error(ErrorPayload),
}

/// The `error` object inside a failed response item.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    #[serde(rename = "type")]
    pub code: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

// ── Config ───────────────────────────────────────────────────────────

/// `GET /api/<token>/config`.
///
/// An unauthenticated caller receives only the public subset; the
/// presence of `whitelist` is what distinguishes an accepted key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bridgeid: String,
    #[serde(default)]
    pub modelid: String,
    #[serde(default)]
    pub apiversion: String,
    #[serde(default)]
    pub swversion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<serde_json::Value>,
}

impl BridgeConfig {
    /// Whether the request that produced this config was authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.whitelist.is_some()
    }
}

// ── Lights ───────────────────────────────────────────────────────────

/// A light as returned in `GET /api/<token>/lights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLight {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub light_type: String,
    #[serde(default)]
    pub modelid: Option<String>,
    #[serde(default)]
    pub uniqueid: Option<String>,
    pub state: ApiLightState,
}

/// The `state` object of a light.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiLightState {
    #[serde(default)]
    pub on: bool,
    /// Brightness 1–254 (absent on on/off plugs).
    #[serde(default)]
    pub bri: Option<u8>,
    #[serde(default)]
    pub xy: Option<[f64; 2]>,
    /// Color temperature in mirek.
    #[serde(default)]
    pub ct: Option<u16>,
    /// `"xy"`, `"ct"` or `"hs"`.
    #[serde(default)]
    pub colormode: Option<String>,
    #[serde(default)]
    pub reachable: bool,
}

// ── Groups ───────────────────────────────────────────────────────────

/// A group (room, zone, or plain light group) from `GET /api/<token>/groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lights: Vec<String>,
    /// `"Room"`, `"Zone"`, `"LightGroup"`, `"Entertainment"`, ...
    #[serde(rename = "type", default)]
    pub group_type: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub state: ApiGroupState,
    /// Last action applied to the group; carries the aggregate brightness.
    #[serde(default)]
    pub action: ApiLightState,
}

/// Aggregate on/off view of a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiGroupState {
    #[serde(default)]
    pub all_on: bool,
    #[serde(default)]
    pub any_on: bool,
}

/// Collections keyed by bridge resource id.
pub type LightsResponse = HashMap<String, ApiLight>;
pub type GroupsResponse = HashMap<String, ApiGroup>;

// ── Writes ───────────────────────────────────────────────────────────

/// Body for `PUT /lights/<id>/state` and `PUT /groups/<id>/action`.
///
/// Only the fields that are set are sent; the bridge leaves the rest alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    /// Transition in deciseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

impl StateUpdate {
    /// True when the update would not change anything on the bridge.
    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.bri.is_none() && self.xy.is_none() && self.ct.is_none()
    }
}

// ── Pairing ──────────────────────────────────────────────────────────

/// `success` payload of `POST /api`.
#[derive(Debug, Clone, Deserialize)]
pub struct PairingSuccess {
    pub username: String,
    #[serde(default)]
    pub clientkey: Option<String>,
}

// ── Discovery ────────────────────────────────────────────────────────

/// One entry of the cloud discovery endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudDiscoveryEntry {
    pub id: String,
    pub internalipaddress: String,
    #[serde(default)]
    pub port: Option<u16>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn state_update_skips_unset_fields() {
        let update = StateUpdate {
            on: Some(false),
            transitiontime: Some(4),
            ..StateUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "on": false, "transitiontime": 4 }));
    }

    #[test]
    fn response_items_parse_success_and_error() {
        let raw = r#"[
            {"success": {"/lights/1/state/on": true}},
            {"error": {"type": 201, "address": "/lights/1/state/bri", "description": "device is off"}}
        ]"#;
        let items: Vec<ResponseItem<serde_json::Value>> = serde_json::from_str(raw).unwrap();
        assert!(matches!(items[0], ResponseItem::Success(_)));
        match &items[1] {
            ResponseItem::Error(e) => assert_eq!(e.code, 201),
            ResponseItem::Success(_) => panic!("expected error item"),
        }
    }

    #[test]
    fn light_state_tolerates_missing_color() {
        let raw = r#"{"name": "Plug", "type": "On/Off plug-in unit", "state": {"on": true, "reachable": true}}"#;
        let light: ApiLight = serde_json::from_str(raw).unwrap();
        assert!(light.state.on);
        assert!(light.state.bri.is_none());
        assert!(light.state.xy.is_none());
    }

    #[test]
    fn public_config_is_not_authenticated() {
        let raw = r#"{"name": "Philips hue", "bridgeid": "001788FFFE000000", "apiversion": "1.65.0"}"#;
        let cfg: BridgeConfig = serde_json::from_str(raw).unwrap();
        assert!(!cfg.is_authenticated());
    }
}
