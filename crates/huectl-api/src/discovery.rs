// Bridge discovery
//
// Two methods, tried in order: the vendor's cloud discovery endpoint, which
// reports bridges that phoned home from the caller's public IP, and a
// concurrent probe of every host on the local /24 for `/api/config`.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::models::{BridgeConfig, CloudDiscoveryEntry};
use crate::transport::TransportConfig;

/// Public cloud discovery endpoint.
pub const CLOUD_DISCOVERY_URL: &str = "https://discovery.meethue.com/";

const CLOUD_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const PROBE_CONCURRENCY: usize = 32;

/// How a bridge was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Cloud,
    Scan,
}

/// A bridge candidate.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredBridge {
    pub method: DiscoveryMethod,
    pub address: Ipv4Addr,
    pub id: String,
    pub port: u16,
    pub name: Option<String>,
    pub model: Option<String>,
}

/// Finds bridge addresses on the local network.
///
/// Only used during initial pairing; an established session never
/// rediscovers its bridge.
pub struct BridgeLocator {
    cloud: reqwest::Client,
    probe: reqwest::Client,
    cloud_url: Url,
    probe_port: u16,
}

impl BridgeLocator {
    /// Locator using the public cloud endpoint and port 80 probes.
    pub fn new() -> Result<Self, Error> {
        let cloud = TransportConfig::default()
            .with_timeout(CLOUD_TIMEOUT)
            .build_client()?;
        let probe = TransportConfig::default()
            .with_timeout(PROBE_TIMEOUT)
            .build_client()?;
        Ok(Self {
            cloud,
            probe,
            cloud_url: Url::parse(CLOUD_DISCOVERY_URL)?,
            probe_port: 80,
        })
    }

    /// Point cloud discovery at a different endpoint.
    pub fn with_cloud_url(mut self, url: Url) -> Self {
        self.cloud_url = url;
        self
    }

    /// Probe a port other than 80 during subnet scans.
    pub fn with_probe_port(mut self, port: u16) -> Self {
        self.probe_port = port;
        self
    }

    /// Discover bridges: cloud first, subnet scan if the cloud knows none.
    ///
    /// `network` is any address inside the /24 to scan; defaults to the
    /// host's own LAN address. Results are deduplicated by address.
    pub async fn discover(&self, network: Option<Ipv4Addr>) -> Result<Vec<DiscoveredBridge>, Error> {
        let mut bridges = match self.cloud().await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "cloud discovery failed");
                Vec::new()
            }
        };

        if bridges.is_empty() {
            let network = match network {
                Some(addr) => addr,
                None => local_ipv4()?,
            };
            bridges = self.scan(network).await;
        }

        let bridges = dedupe(bridges);
        info!(count = bridges.len(), "bridge discovery complete");
        Ok(bridges)
    }

    /// Query the cloud discovery endpoint.
    pub async fn cloud(&self) -> Result<Vec<DiscoveredBridge>, Error> {
        debug!(url = %self.cloud_url, "querying cloud discovery");
        let resp = self
            .cloud
            .get(self.cloud_url.clone())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        let entries: Vec<CloudDiscoveryEntry> = resp.json().await.map_err(Error::Transport)?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let Ok(address) = entry.internalipaddress.parse::<Ipv4Addr>() else {
                    warn!(address = %entry.internalipaddress, "ignoring non-IPv4 discovery entry");
                    return None;
                };
                Some(DiscoveredBridge {
                    method: DiscoveryMethod::Cloud,
                    address,
                    id: entry.id,
                    port: entry.port.unwrap_or(443),
                    name: None,
                    model: None,
                })
            })
            .collect())
    }

    /// Probe every host of the /24 containing `network`.
    pub async fn scan(&self, network: Ipv4Addr) -> Vec<DiscoveredBridge> {
        let [a, b, c, _] = network.octets();
        debug!(network = %Ipv4Addr::new(a, b, c, 0), "scanning subnet");

        stream::iter(1..=254u8)
            .map(|host| {
                let addr = SocketAddr::V4(SocketAddrV4::new(
                    Ipv4Addr::new(a, b, c, host),
                    self.probe_port,
                ));
                self.probe(addr)
            })
            .buffer_unordered(PROBE_CONCURRENCY)
            .filter_map(|found| async move { found })
            .collect()
            .await
    }

    /// Check a single host for a bridge. Any failure means "not a bridge".
    pub async fn probe(&self, addr: SocketAddr) -> Option<DiscoveredBridge> {
        let SocketAddr::V4(v4) = addr else {
            return None;
        };
        let url = format!("http://{addr}/api/config");
        let resp = self.probe.get(&url).send().await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let config: BridgeConfig = resp.json().await.ok()?;
        if config.bridgeid.is_empty() {
            return None;
        }

        debug!(%addr, bridge = %config.bridgeid, "bridge answered probe");
        Some(DiscoveredBridge {
            method: DiscoveryMethod::Scan,
            address: *v4.ip(),
            id: config.bridgeid,
            port: v4.port(),
            name: Some(config.name).filter(|n| !n.is_empty()),
            model: Some(config.modelid).filter(|m| !m.is_empty()),
        })
    }
}

/// The host's outbound IPv4 address.
///
/// Connecting a UDP socket sends nothing; it only asks the OS which local
/// address would route to the target.
pub fn local_ipv4() -> Result<Ipv4Addr, Error> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .map_err(|e| Error::Discovery(format!("cannot open UDP socket: {e}")))?;
    socket
        .connect("192.0.2.1:80")
        .map_err(|e| Error::Discovery(format!("no IPv4 route: {e}")))?;
    match socket.local_addr() {
        Ok(SocketAddr::V4(v4)) => Ok(*v4.ip()),
        Ok(SocketAddr::V6(_)) => Err(Error::Discovery("no IPv4 address".into())),
        Err(e) => Err(Error::Discovery(format!("cannot read local address: {e}"))),
    }
}

/// Keep the first entry per address.
fn dedupe(bridges: Vec<DiscoveredBridge>) -> Vec<DiscoveredBridge> {
    let mut seen = HashSet::new();
    bridges
        .into_iter()
        .filter(|b| seen.insert(b.address))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge(address: [u8; 4], method: DiscoveryMethod) -> DiscoveredBridge {
        DiscoveredBridge {
            method,
            address: Ipv4Addr::from(address),
            id: "001788fffe000000".into(),
            port: 443,
            name: None,
            model: None,
        }
    }

    #[test]
    fn dedupe_keeps_first_per_address() {
        let found = vec![
            bridge([192, 168, 1, 2], DiscoveryMethod::Cloud),
            bridge([192, 168, 1, 3], DiscoveryMethod::Cloud),
            bridge([192, 168, 1, 2], DiscoveryMethod::Scan),
        ];
        let unique = dedupe(found);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].method, DiscoveryMethod::Cloud);
    }
}
