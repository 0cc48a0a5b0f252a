// ── Bridge identity ──

use serde::{Deserialize, Serialize};

/// Identity of the bridge a session is connected to, captured from the
/// connect handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeInfo {
    pub name: String,
    pub bridge_id: String,
    pub model_id: String,
    pub api_version: String,
    pub software_version: String,
}
