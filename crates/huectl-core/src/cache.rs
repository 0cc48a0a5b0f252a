// ── Snapshot cache ──
//
// Holds at most one lights snapshot and one groups snapshot. Entries
// expire by TTL; writes evict everything. A generation counter is bumped
// on every eviction so that a fetch which started before the eviction
// cannot store its (possibly pre-write) result afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::model::{GroupMap, LightMap};

/// A cached value and when it was fetched.
#[derive(Debug)]
pub struct CacheEntry<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at: Instant) -> Self {
        Self {
            value: Arc::new(value),
            fetched_at,
        }
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Valid while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Both snapshot slots plus the eviction generation.
#[derive(Debug, Default)]
pub(crate) struct CacheState {
    generation: u64,
    lights: Option<CacheEntry<LightMap>>,
    groups: Option<CacheEntry<GroupMap>>,
}

/// Selects the slot a snapshot type lives in.
pub(crate) trait Snapshot: Send + Sync + Sized + 'static {
    const KIND: &'static str;

    fn slot(state: &CacheState) -> Option<&CacheEntry<Self>>;

    fn slot_mut(state: &mut CacheState) -> &mut Option<CacheEntry<Self>>;
}

impl Snapshot for LightMap {
    const KIND: &'static str = "lights";

    fn slot(state: &CacheState) -> Option<&CacheEntry<Self>> {
        state.lights.as_ref()
    }

    fn slot_mut(state: &mut CacheState) -> &mut Option<CacheEntry<Self>> {
        &mut state.lights
    }
}

impl Snapshot for GroupMap {
    const KIND: &'static str = "groups";

    fn slot(state: &CacheState) -> Option<&CacheEntry<Self>> {
        state.groups.as_ref()
    }

    fn slot_mut(state: &mut CacheState) -> &mut Option<CacheEntry<Self>> {
        &mut state.groups
    }
}

/// Shared snapshot cache. Every operation takes the lock once, so a
/// reader observes either the state before an eviction or after it.
#[derive(Debug, Default)]
pub(crate) struct SnapshotCache {
    state: RwLock<CacheState>,
}

impl SnapshotCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The cached value, if present and unexpired.
    pub(crate) async fn fresh<T: Snapshot>(&self, now: Instant, ttl: Duration) -> Option<Arc<T>> {
        let state = self.state.read().await;
        T::slot(&state)
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Current eviction generation. Capture before starting a fetch.
    pub(crate) async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Store a fetched value unless an eviction happened since
    /// `generation` was read. Returns whether the value was stored.
    pub(crate) async fn store<T: Snapshot>(&self, generation: u64, entry: CacheEntry<T>) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation {
            return false;
        }
        *T::slot_mut(&mut state) = Some(entry);
        true
    }

    /// Drop both snapshots and advance the generation.
    pub(crate) async fn evict_all(&self) {
        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        state.lights = None;
        state.groups = None;
    }
}
