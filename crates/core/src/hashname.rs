//! Peer identity.
//!
//! A hashname is the 32-byte fingerprint of a peer's public key. Signal
//! blocks only carry its 5-byte prefix, so matching against the short form
//! is a first-class operation here.

use crate::error::CoreError;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a full hashname in bytes.
pub const HASHNAME_LEN: usize = 32;

/// Length of the short form carried inside signal blocks.
pub const SHORT_LEN: usize = 5;

/// 32-byte peer identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hashname([u8; HASHNAME_LEN]);

impl Hashname {
    /// Wrap raw identity bytes.
    pub fn new(bytes: [u8; HASHNAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a hashname from a public key (BLAKE3 of the key bytes).
    pub fn from_key(public_key: &[u8]) -> Self {
        Self(*blake3::hash(public_key).as_bytes())
    }

    /// Generate a random identity, for simulations and tests.
    pub fn random() -> Self {
        let mut bytes = [0u8; HASHNAME_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Binary form.
    pub fn bin(&self) -> &[u8; HASHNAME_LEN] {
        &self.0
    }

    /// The 5-byte prefix used on the air.
    pub fn short(&self) -> [u8; SHORT_LEN] {
        let mut short = [0u8; SHORT_LEN];
        short.copy_from_slice(&self.0[..SHORT_LEN]);
        short
    }

    /// Whether a short form received on the air names this identity.
    pub fn matches_short(&self, short: &[u8; SHORT_LEN]) -> bool {
        self.0[..SHORT_LEN] == short[..]
    }

    /// Hex of the short form, for log fields.
    pub fn short_hex(&self) -> String {
        hex::encode(self.short())
    }
}

impl fmt::Display for Hashname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hashname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hashname({})", self.short_hex())
    }
}

impl FromStr for Hashname {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHashname(e.to_string()))?;
        let bytes: [u8; HASHNAME_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            CoreError::InvalidHashname(format!("expected {} bytes, got {}", HASHNAME_LEN, v.len()))
        })?;
        Ok(Self(bytes))
    }
}
