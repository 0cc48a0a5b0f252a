// ── Bridge seams ──
//
// `BridgeApi` is the set of calls a session makes on an established
// connection; `Connector` performs the authentication handshake and hands
// one out. The HTTP implementations wrap `huectl_api::HueClient`; tests
// substitute scripted fakes.

use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use huectl_api::models::{BridgeConfig, GroupsResponse, LightsResponse, StateUpdate};
use huectl_api::{Error as ApiError, HueClient};
use tracing::debug;
use url::Url;

use crate::config::SessionConfig;
use crate::model::BridgeCredential;

/// Calls available on an authenticated bridge connection.
#[async_trait]
pub trait BridgeApi: Send + Sync {
    async fn lights(&self) -> Result<LightsResponse, ApiError>;

    async fn groups(&self) -> Result<GroupsResponse, ApiError>;

    async fn set_light_state(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError>;

    async fn set_group_action(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError>;
}

/// Result of a successful handshake.
pub struct Connection {
    pub api: Arc<dyn BridgeApi>,
    /// Bridge configuration returned by the handshake.
    pub config: BridgeConfig,
}

/// Establishes authenticated connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform exactly one authentication handshake.
    async fn connect(&self, credential: &BridgeCredential) -> Result<Connection, ApiError>;
}

#[async_trait]
impl BridgeApi for HueClient {
    async fn lights(&self) -> Result<LightsResponse, ApiError> {
        self.list_lights().await
    }

    async fn groups(&self) -> Result<GroupsResponse, ApiError> {
        self.list_groups().await
    }

    async fn set_light_state(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError> {
        HueClient::set_light_state(self, id, update).await
    }

    async fn set_group_action(&self, id: &str, update: &StateUpdate) -> Result<(), ApiError> {
        HueClient::set_group_action(self, id, update).await
    }
}

/// Connects over HTTP(S) using the session's transport settings.
pub struct HttpConnector {
    config: SessionConfig,
}

impl HttpConnector {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

/// Root URL of the bridge at `address` under `config`'s scheme and port.
pub(crate) fn bridge_url(config: &SessionConfig, address: Ipv4Addr) -> Result<Url, ApiError> {
    let host = match config.port {
        Some(port) => format!("{address}:{port}"),
        None => address.to_string(),
    };
    Ok(Url::parse(&format!("{}://{host}/", config.scheme()))?)
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, credential: &BridgeCredential) -> Result<Connection, ApiError> {
        let base_url = bridge_url(&self.config, credential.address())?;
        debug!(url = %base_url, "building bridge client");

        let client = HueClient::new(
            base_url,
            Some(credential.token().clone()),
            &self.config.transport(),
        )?;
        let config = client.authenticate().await?;

        Ok(Connection {
            api: Arc::new(client),
            config,
        })
    }
}
