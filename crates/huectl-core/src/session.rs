// ── Bridge session ──
//
// Single point of contact between consumers and one bridge. Owns the
// connection handle, the snapshot cache, and the read retry policy.
// Cheaply cloneable; clones share the same connection and cache.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};

use huectl_api::Error as ApiError;
use serde::Serialize;
use strum::Display;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, trace, warn};

use crate::bridge::{BridgeApi, Connector, HttpConnector};
use crate::cache::{CacheEntry, Snapshot, SnapshotCache};
use crate::clock::{Clock, TokioClock};
use crate::config::SessionConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    BridgeCredential, BridgeInfo, GroupMap, GroupState, LightMap, LightState, ResourceKind,
    StateChange, Transition,
};
use crate::retry::{RetryError, retry};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
///
/// `Connecting` is only entered from `Disconnected`. Any state returns to
/// `Disconnected` on `close` or when the bridge revokes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ── BridgeSession ────────────────────────────────────────────────

/// Cache-and-retry wrapper around one bridge connection.
///
/// Reads (`lights`, `groups`) are served from a short-lived snapshot
/// cache and retried on transient network failures. Writes are sent
/// exactly once and evict the cache on confirmed success.
#[derive(Clone)]
pub struct BridgeSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    /// Held across the handshake, which makes `connect` single-flight.
    connection: Mutex<Option<ActiveConnection>>,
    state: watch::Sender<ConnectionState>,
    /// Outcome of the most recent failed handshake, for callers that
    /// waited on it instead of starting their own.
    last_failure: std::sync::Mutex<Option<CoreError>>,
    /// Finished handshakes, successful or not. Bumped under `connection`.
    handshakes: AtomicU64,
    cache: SnapshotCache,
}

struct ActiveConnection {
    api: Arc<dyn BridgeApi>,
    address: Ipv4Addr,
    info: BridgeInfo,
}

#[derive(Debug, Clone, Copy)]
enum WriteTarget {
    Light,
    Group,
}

impl WriteTarget {
    fn kind(self) -> ResourceKind {
        match self {
            Self::Light => ResourceKind::Light,
            Self::Group => ResourceKind::Group,
        }
    }
}

impl BridgeSession {
    /// Session that talks HTTP(S) to the bridge in real time. Does NOT
    /// connect; call [`connect()`](Self::connect).
    pub fn new(config: SessionConfig) -> Self {
        let connector = Arc::new(HttpConnector::new(config.clone()));
        Self::with_parts(config, connector, Arc::new(TokioClock))
    }

    /// Session with an explicit connector and clock.
    pub fn with_parts(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                config,
                connector,
                clock,
                connection: Mutex::new(None),
                state,
                last_failure: std::sync::Mutex::new(None),
                handshakes: AtomicU64::new(0),
                cache: SnapshotCache::new(),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The clock this session measures TTLs and backoff with.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Authenticate against the bridge at `credential.address`.
    ///
    /// Idempotent: returns immediately while connected, even when called
    /// with a different credential. A call made while another handshake
    /// is in flight waits for it and shares its outcome.
    pub async fn connect(&self, credential: &BridgeCredential) -> Result<(), CoreError> {
        let seen = self.inner.handshakes.load(Ordering::Acquire);
        let mut state_rx = self.inner.state.subscribe();
        let observed = *state_rx.borrow_and_update();
        if observed == ConnectionState::Connecting {
            debug!("connect already in flight, waiting for it");
            let settled = state_rx
                .wait_for(|s| *s != ConnectionState::Connecting)
                .await
                .map(|s| *s)
                .map_err(|_| CoreError::Internal("connection state channel closed".into()))?;
            return match settled {
                ConnectionState::Connected => Ok(()),
                _ => Err(self.last_failure(credential.address())),
            };
        }

        let mut slot = self.inner.connection.lock().await;
        if slot.is_some() {
            debug!("already connected, reusing session");
            return Ok(());
        }
        // A handshake finished while this call queued on the lock.
        if self.inner.handshakes.load(Ordering::Acquire) != seen {
            if let Some(err) = self.failure_slot().clone() {
                debug!("handshake failed while waiting, sharing its outcome");
                return Err(err);
            }
        }

        self.set_state(ConnectionState::Connecting);
        let address = credential.address();
        info!(%address, "connecting to bridge");

        let outcome = self.inner.connector.connect(credential).await;
        self.inner.handshakes.fetch_add(1, Ordering::AcqRel);
        match outcome {
            Ok(connection) => {
                let info = convert::bridge_info(&connection.config);
                info!(
                    bridge = %info.bridge_id,
                    name = %info.name,
                    api_version = %info.api_version,
                    "connected to bridge"
                );
                *slot = Some(ActiveConnection {
                    api: connection.api,
                    address,
                    info,
                });
                *self.failure_slot() = None;
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                let err = CoreError::ConnectionError {
                    address: address.to_string(),
                    reason: e.to_string(),
                };
                warn!(%address, error = %e, "bridge handshake failed");
                *self.failure_slot() = Some(err.clone());
                self.set_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Release the connection and drop cached snapshots. Safe to call
    /// repeatedly; later operations fail with `NotConnected`.
    pub async fn close(&self) {
        if self.disconnect().await.is_some() {
            info!("bridge session closed");
        }
    }

    /// Identity of the connected bridge.
    pub async fn bridge_info(&self) -> Result<BridgeInfo, CoreError> {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .map(|c| c.info.clone())
            .ok_or(CoreError::NotConnected)
    }

    /// Address of the connected bridge.
    pub async fn address(&self) -> Option<Ipv4Addr> {
        self.inner.connection.lock().await.as_ref().map(|c| c.address)
    }

    // ── Reads ────────────────────────────────────────────────────

    /// All lights, from cache when fresh unless `bypass_cache`.
    pub async fn lights(&self, bypass_cache: bool) -> Result<Arc<LightMap>, CoreError> {
        self.read(bypass_cache, |api| async move {
            api.lights().await.map(convert::lights)
        })
        .await
    }

    /// All groups, from cache when fresh unless `bypass_cache`.
    pub async fn groups(&self, bypass_cache: bool) -> Result<Arc<GroupMap>, CoreError> {
        self.read(bypass_cache, |api| async move {
            api.groups().await.map(convert::groups)
        })
        .await
    }

    /// One light by id.
    pub async fn light(&self, id: &str) -> Result<LightState, CoreError> {
        self.lights(false)
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                kind: ResourceKind::Light,
                id: id.to_owned(),
            })
    }

    /// Resolve a group by id or name.
    ///
    /// An exact id wins, then a case-insensitive exact name, then the
    /// first group (lowest id) whose name contains `name`.
    pub async fn find_group(&self, name: &str) -> Result<GroupState, CoreError> {
        let groups = self.groups(false).await?;
        if let Some(group) = groups.get(name) {
            return Ok(group.clone());
        }

        let mut ordered: Vec<&GroupState> = groups.values().collect();
        ordered.sort_by_key(|g| numeric_id(&g.id));

        ordered
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name.trim()))
            .or_else(|| ordered.iter().find(|g| g.matches_name(name)))
            .map(|g| (*g).clone())
            .ok_or_else(|| CoreError::NotFound {
                kind: ResourceKind::Group,
                id: name.to_owned(),
            })
    }

    /// A group and its member lights, in the group's own order. Members
    /// missing from the light snapshot are skipped.
    pub async fn lights_in_group(
        &self,
        name: &str,
    ) -> Result<(GroupState, Vec<LightState>), CoreError> {
        let group = self.find_group(name).await?;
        let lights = self.lights(false).await?;
        let members = group
            .lights
            .iter()
            .filter_map(|id| lights.get(id).cloned())
            .collect();
        Ok((group, members))
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Change one light. Never retried; evicts the cache on success.
    pub async fn set_light_state(
        &self,
        id: &str,
        change: &StateChange,
        transition: Option<Transition>,
    ) -> Result<(), CoreError> {
        self.write(WriteTarget::Light, id, change, transition).await
    }

    /// Change every light in a group; the bridge does the fan-out.
    pub async fn set_group_state(
        &self,
        id: &str,
        change: &StateChange,
        transition: Option<Transition>,
    ) -> Result<(), CoreError> {
        self.write(WriteTarget::Group, id, change, transition).await
    }

    /// Drop cached snapshots so the next reads go to the bridge.
    pub async fn clear_cache(&self) {
        self.inner.cache.evict_all().await;
        debug!("cache cleared");
    }

    // ── Internals ────────────────────────────────────────────────

    async fn api(&self) -> Result<Arc<dyn BridgeApi>, CoreError> {
        self.inner
            .connection
            .lock()
            .await
            .as_ref()
            .map(|c| Arc::clone(&c.api))
            .ok_or(CoreError::NotConnected)
    }

    async fn read<T, F, Fut>(&self, bypass_cache: bool, fetch: F) -> Result<Arc<T>, CoreError>
    where
        T: Snapshot,
        F: Fn(Arc<dyn BridgeApi>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let api = self.api().await?;
        let ttl = self.inner.config.cache_ttl;

        if !bypass_cache {
            if let Some(hit) = self.inner.cache.fresh::<T>(self.inner.clock.now(), ttl).await {
                trace!(kind = T::KIND, "cache hit");
                return Ok(hit);
            }
        }

        let generation = self.inner.cache.generation().await;
        let outcome = retry(
            &self.inner.config.retry,
            self.inner.clock.as_ref(),
            T::KIND,
            ApiError::is_transient,
            || fetch(Arc::clone(&api)),
        )
        .await;

        match outcome {
            Ok(value) => {
                let entry = CacheEntry::new(value, self.inner.clock.now());
                let value = Arc::clone(entry.value());
                if !self.inner.cache.store(generation, entry).await {
                    debug!(kind = T::KIND, "cache evicted during fetch, result not stored");
                }
                Ok(value)
            }
            Err(RetryError::Exhausted { attempts, last }) => Err(CoreError::BridgeUnavailable {
                attempts,
                reason: last.to_string(),
            }),
            Err(RetryError::Permanent { error, .. }) => Err(self.bridge_error(error).await),
        }
    }

    async fn write(
        &self,
        target: WriteTarget,
        id: &str,
        change: &StateChange,
        transition: Option<Transition>,
    ) -> Result<(), CoreError> {
        if change.is_empty() {
            return Err(CoreError::Validation {
                message: "state change sets nothing".into(),
            });
        }

        let api = self.api().await?;
        let update = change.to_update(transition);
        let result = match target {
            WriteTarget::Light => api.set_light_state(id, &update).await,
            WriteTarget::Group => api.set_group_action(id, &update).await,
        };

        match result {
            Ok(()) => {
                self.inner.cache.evict_all().await;
                debug!(kind = %target.kind(), id, "write confirmed, cache evicted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.inner.cache.evict_all().await;
                Err(CoreError::NotFound {
                    kind: target.kind(),
                    id: id.to_owned(),
                })
            }
            Err(e) if e.is_transient() => {
                warn!(kind = %target.kind(), id, error = %e, "write failed, not retrying");
                Err(CoreError::BridgeUnavailable {
                    attempts: 1,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(self.bridge_error(e).await),
        }
    }

    /// Translate a permanent bridge error. A rejected key ends the session.
    async fn bridge_error(&self, error: ApiError) -> CoreError {
        if !error.is_unauthorized() {
            return CoreError::from(error);
        }

        let address = self.disconnect().await;
        warn!(error = %error, "bridge rejected the application key, session disconnected");
        CoreError::ConnectionError {
            address: address.map_or_else(|| "bridge".to_owned(), |a| a.to_string()),
            reason: error.to_string(),
        }
    }

    /// Drop the connection, evict the cache, publish `Disconnected`.
    async fn disconnect(&self) -> Option<Ipv4Addr> {
        let mut slot = self.inner.connection.lock().await;
        let previous = slot.take().map(|c| c.address);
        self.inner.cache.evict_all().await;
        self.set_state(ConnectionState::Disconnected);
        previous
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.state.send_replace(state);
    }

    fn failure_slot(&self) -> std::sync::MutexGuard<'_, Option<CoreError>> {
        self.inner
            .last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn last_failure(&self, address: Ipv4Addr) -> CoreError {
        self.failure_slot()
            .clone()
            .unwrap_or_else(|| CoreError::ConnectionError {
                address: address.to_string(),
                reason: "concurrent connect attempt failed".into(),
            })
    }
}

/// Sort key that orders bridge ids numerically ("2" before "10").
pub(crate) fn numeric_id(id: &str) -> (u64, String) {
    (id.parse().unwrap_or(u64::MAX), id.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_sort_naturally() {
        let mut ids = vec!["10", "2", "1", "zone"];
        ids.sort_by_key(|id| numeric_id(id));
        assert_eq!(ids, vec!["1", "2", "10", "zone"]);
    }

    #[tokio::test]
    async fn operations_before_connect_fail() {
        let session = BridgeSession::new(SessionConfig::default());
        assert!(matches!(session.lights(false).await, Err(CoreError::NotConnected)));
        assert!(matches!(
            session
                .set_light_state("1", &StateChange::on(), None)
                .await,
            Err(CoreError::NotConnected)
        ));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let session = BridgeSession::new(SessionConfig::default());
        session.close().await;
        session.close().await;
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
