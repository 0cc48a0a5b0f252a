// ── API → domain conversion ──
//
// Bridge payloads are loosely typed (optional fields, firmware-dependent
// color modes). Everything is normalized here so the rest of the crate
// only sees the domain model.

use huectl_api::models::{
    ApiGroup, ApiLight, ApiLightState, BridgeConfig, GroupsResponse, LightsResponse,
};

use crate::model::{BridgeInfo, Color, GroupKind, GroupMap, GroupState, LightMap, LightState};

pub fn light(id: String, raw: ApiLight) -> LightState {
    LightState {
        color: color(&raw.state),
        id,
        name: raw.name,
        kind: raw.light_type,
        model: raw.modelid,
        on: raw.state.on,
        brightness: raw.state.bri,
        reachable: raw.state.reachable,
    }
}

pub fn lights(raw: LightsResponse) -> LightMap {
    raw.into_iter()
        .map(|(id, light)| (id.clone(), self::light(id, light)))
        .collect()
}

pub fn group(id: String, raw: ApiGroup) -> GroupState {
    GroupState {
        id,
        name: raw.name,
        kind: GroupKind::from_bridge_type(&raw.group_type),
        class: raw.class,
        lights: raw.lights,
        any_on: raw.state.any_on,
        all_on: raw.state.all_on,
        brightness: raw.action.bri,
    }
}

pub fn groups(raw: GroupsResponse) -> GroupMap {
    raw.into_iter()
        .map(|(id, group)| (id.clone(), self::group(id, group)))
        .collect()
}

pub fn bridge_info(raw: &BridgeConfig) -> BridgeInfo {
    BridgeInfo {
        name: raw.name.clone(),
        bridge_id: raw.bridgeid.clone(),
        model_id: raw.modelid.clone(),
        api_version: raw.apiversion.clone(),
        software_version: raw.swversion.clone(),
    }
}

/// Pick the color the bridge says is active; fall back to whichever
/// value is present when the mode is missing.
fn color(state: &ApiLightState) -> Option<Color> {
    let xy = state.xy.map(|[x, y]| Color::Xy { x, y });
    let ct = state.ct.map(|mirek| Color::Temperature { mirek });

    match state.colormode.as_deref() {
        Some("ct") => ct.or(xy),
        _ => xy.or(ct),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn api_light(json: &str) -> ApiLight {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn ct_mode_prefers_temperature() {
        let raw = api_light(
            r#"{"name": "Desk", "type": "Extended color light",
                "state": {"on": true, "bri": 120, "xy": [0.45, 0.41], "ct": 366, "colormode": "ct", "reachable": true}}"#,
        );
        let light = light("3".into(), raw);
        assert_eq!(light.color, Some(Color::Temperature { mirek: 366 }));
        assert_eq!(light.brightness, Some(120));
    }

    #[test]
    fn plug_has_no_brightness_or_color() {
        let raw = api_light(r#"{"name": "Plug", "type": "On/Off plug-in unit", "state": {"on": false, "reachable": true}}"#);
        let light = light("7".into(), raw);
        assert_eq!(light.brightness, None);
        assert_eq!(light.color, None);
    }
}
