//! Session layer between `huectl-api` and consumers (CLI, watch loop).
//!
//! - **[`BridgeSession`]**: one explicitly owned connection to a bridge.
//!   [`connect()`](BridgeSession::connect) authenticates once (single-flight),
//!   reads go through a short-lived snapshot cache and are retried on
//!   transient network failures, writes are sent once and evict the cache.
//!
//! - **[`RetryPolicy`]** and **[`Clock`]**: the backoff schedule as a plain
//!   value, and the time source it sleeps on. [`ManualClock`] makes TTL and
//!   retry timing deterministic.
//!
//! - **[`BridgeApi`] / [`Connector`]**: the seams a session talks through.
//!   [`HttpConnector`] is the real implementation.
//!
//! - **Domain model** ([`model`]): `LightState`, `GroupState`,
//!   `StateChange`, `BridgeCredential`.
//!
//! - **[`EffectSequencer`]**: color effects and the startup light show,
//!   built from ordinary session writes.
//!
//! - **[`setup`]**: bridge discovery and link-button pairing.

pub mod bridge;
pub mod cache;
pub mod clock;
pub mod color;
pub mod config;
pub mod convert;
pub mod effects;
pub mod error;
pub mod model;
pub mod retry;
pub mod session;
pub mod setup;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{BridgeApi, Connection, Connector, HttpConnector};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{SessionConfig, TlsVerification};
pub use effects::{EffectKind, EffectReport, EffectSequencer, ShowReport};
pub use error::CoreError;
pub use retry::{RetryError, RetryPolicy};
pub use session::{BridgeSession, ConnectionState};
pub use setup::{BridgeLocator, DiscoveredBridge, DiscoveryMethod, Pairing};

pub use model::{
    BridgeCredential, BridgeInfo, Color, GroupKind, GroupMap, GroupState, LightMap, LightState,
    ResourceKind, StateChange, Transition,
};
