// huectl-api: Async Rust client for the Philips Hue Bridge v1 REST API

pub mod client;
pub mod discovery;
pub mod error;
pub mod models;
mod pairing;
mod resources;
pub mod transport;

pub use client::HueClient;
pub use discovery::{BridgeLocator, DiscoveredBridge, DiscoveryMethod};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
