// ── Bridge credential ──

use std::fmt;
use std::net::Ipv4Addr;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

const TOKEN_MIN_LEN: usize = 32;
const TOKEN_MAX_LEN: usize = 50;

/// Address and application key for one paired bridge.
///
/// Construction validates both parts: the address must be a local-network
/// IPv4 literal and the token must look like one the bridge issues.
#[derive(Clone)]
pub struct BridgeCredential {
    address: Ipv4Addr,
    token: SecretString,
}

impl BridgeCredential {
    pub fn new(address: Ipv4Addr, token: SecretString) -> Result<Self, CoreError> {
        validate_address(address)?;
        validate_token(token.expose_secret())?;
        Ok(Self { address, token })
    }

    /// Build from the textual forms stored on disk.
    pub fn parse(address: &str, token: &str) -> Result<Self, CoreError> {
        let address: Ipv4Addr =
            address
                .trim()
                .parse()
                .map_err(|_| CoreError::Validation {
                    message: format!("bridge address {address:?} is not an IPv4 literal"),
                })?;
        Self::new(address, SecretString::from(token.trim().to_owned()))
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl fmt::Debug for BridgeCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeCredential")
            .field("address", &self.address)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for BridgeCredential {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.token.expose_secret() == other.token.expose_secret()
    }
}

fn validate_address(address: Ipv4Addr) -> Result<(), CoreError> {
    if address.is_private() || address.is_link_local() || address.is_loopback() {
        Ok(())
    } else {
        Err(CoreError::Validation {
            message: format!("bridge address {address} is not a local-network address"),
        })
    }
}

fn validate_token(token: &str) -> Result<(), CoreError> {
    if !(TOKEN_MIN_LEN..=TOKEN_MAX_LEN).contains(&token.len()) {
        return Err(CoreError::Validation {
            message: format!(
                "application key must be {TOKEN_MIN_LEN}-{TOKEN_MAX_LEN} characters, got {}",
                token.len()
            ),
        });
    }
    if let Some(bad) = token
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
    {
        return Err(CoreError::Validation {
            message: format!("application key contains invalid character {bad:?}"),
        });
    }
    Ok(())
}
