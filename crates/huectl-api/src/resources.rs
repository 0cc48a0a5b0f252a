// Bridge resource endpoints
//
// Lights and groups are read as whole collections (one request each);
// writes target a single light's `state` or a group's `action`, and the
// bridge fans group actions out to member lights itself.

use tracing::debug;

use crate::client::HueClient;
use crate::error::Error;
use crate::models::{BridgeConfig, GroupsResponse, LightsResponse, StateUpdate};

impl HueClient {
    /// Fetch the bridge configuration.
    ///
    /// `GET /api/<token>/config`. Used as the connect handshake: the
    /// response only carries `whitelist` when the key is accepted.
    pub async fn config(&self) -> Result<BridgeConfig, Error> {
        let url = self.resource_url("config")?;
        self.get(url).await
    }

    /// Fetch the configuration and fail unless the key was accepted.
    pub async fn authenticate(&self) -> Result<BridgeConfig, Error> {
        let config = self.config().await?;
        if !config.is_authenticated() {
            return Err(Error::Unauthorized {
                description: "application key not in bridge whitelist".into(),
            });
        }
        debug!(bridge = %config.bridgeid, "application key accepted");
        Ok(config)
    }

    /// List all lights known to the bridge.
    ///
    /// `GET /api/<token>/lights`
    pub async fn list_lights(&self) -> Result<LightsResponse, Error> {
        let url = self.resource_url("lights")?;
        self.get(url).await
    }

    /// List all groups (rooms, zones, light groups).
    ///
    /// `GET /api/<token>/groups`
    pub async fn list_groups(&self) -> Result<GroupsResponse, Error> {
        let url = self.resource_url("groups")?;
        self.get(url).await
    }

    /// Change the state of one light.
    ///
    /// `PUT /api/<token>/lights/<id>/state`
    pub async fn set_light_state(&self, id: &str, update: &StateUpdate) -> Result<(), Error> {
        let url = self.resource_url(&format!("lights/{id}/state"))?;
        debug!(light = id, ?update, "setting light state");
        self.put(url, update).await
    }

    /// Apply an action to every light in a group.
    ///
    /// `PUT /api/<token>/groups/<id>/action`
    pub async fn set_group_action(&self, id: &str, update: &StateUpdate) -> Result<(), Error> {
        let url = self.resource_url(&format!("groups/{id}/action"))?;
        debug!(group = id, ?update, "setting group action");
        self.put(url, update).await
    }
}
