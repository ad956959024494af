//! ChaCha20 keystream keyed by a tempo secret.
//!
//! Frames and hop seeds both come from the djb 64-bit-nonce variant of
//! ChaCha20. Applying the keystream is its own inverse, so the same call
//! encrypts and decrypts.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{ChaCha20Legacy, Key, LegacyNonce};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a tempo secret.
pub const KEY_LEN: usize = 32;

/// Size of a per-step nonce.
pub const NONCE_LEN: usize = 8;

/// Per-step nonce: medium ‖ counterpart sequence ‖ tempo sequence.
pub type Nonce = [u8; NONCE_LEN];

/// A 32-byte tempo secret. Wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; KEY_LEN]);

impl Secret {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets never reach logs
        f.write_str("Secret(..)")
    }
}

/// XOR the keystream for `(secret, nonce)` into `buf`, starting at block zero.
pub fn apply_keystream(secret: &Secret, nonce: &Nonce, buf: &mut [u8]) {
    let mut cipher = ChaCha20Legacy::new(
        Key::from_slice(secret.as_bytes()),
        LegacyNonce::from_slice(nonce),
    );
    cipher.apply_keystream(buf);
}

/// Raw keystream bytes for `(secret, nonce)`.
pub fn keystream<const N: usize>(secret: &Secret, nonce: &Nonce) -> [u8; N] {
    let mut out = [0u8; N];
    apply_keystream(secret, nonce, &mut out);
    out
}
