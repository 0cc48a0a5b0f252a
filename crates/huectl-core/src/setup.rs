// ── First-run setup ──
//
// Locating a bridge and obtaining an application key from it. Neither
// needs a session; pairing produces the credential `BridgeSession::connect`
// takes.

use std::net::Ipv4Addr;
use std::time::Duration;

use huectl_api::HueClient;
use secrecy::SecretString;
use tracing::info;

use crate::bridge::bridge_url;
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::BridgeCredential;

pub use huectl_api::{BridgeLocator, DiscoveredBridge, DiscoveryMethod};

/// How long the bridge accepts pairing after the link button is pressed.
pub const DEFAULT_PAIRING_WINDOW: Duration = Duration::from_secs(30);

const PAIRING_POLL: Duration = Duration::from_secs(1);

/// Application name sent with pairing requests.
pub const APP_NAME: &str = "huectl";

/// Find bridges: cloud discovery, then a scan of `network`'s /24.
pub async fn discover_bridges(
    locator: &BridgeLocator,
    network: Option<Ipv4Addr>,
) -> Result<Vec<DiscoveredBridge>, CoreError> {
    Ok(locator.discover(network).await?)
}

/// `huectl#<host>`, within the bridge's 40-character devicetype limit.
pub fn devicetype(host: &str) -> String {
    let host: String = host
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(19)
        .collect();
    if host.is_empty() {
        format!("{APP_NAME}#cli")
    } else {
        format!("{APP_NAME}#{host}")
    }
}

/// Obtains an application key by polling the bridge while the user
/// presses its link button.
#[derive(Debug, Clone)]
pub struct Pairing {
    config: SessionConfig,
    window: Duration,
    poll_interval: Duration,
}

impl Pairing {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            window: DEFAULT_PAIRING_WINDOW,
            poll_interval: PAIRING_POLL,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Pair with the bridge at `address`.
    ///
    /// `on_wait` receives the time left after each attempt the bridge
    /// rejects because the button has not been pressed. Gives up with
    /// `Rejected { code: Some(101) }` once the window closes.
    pub async fn pair(
        &self,
        address: Ipv4Addr,
        devicetype: &str,
        on_wait: impl FnMut(Duration) + Send,
    ) -> Result<BridgeCredential, CoreError> {
        let client = HueClient::new(
            bridge_url(&self.config, address)?,
            None,
            &self.config.transport(),
        )?;

        info!(%address, devicetype, window = ?self.window, "pairing with bridge");
        let success = client
            .pair(devicetype, self.window, self.poll_interval, on_wait)
            .await?;

        BridgeCredential::new(address, SecretString::from(success.username))
    }
}
