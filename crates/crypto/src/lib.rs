//! Cryptographic primitives for tmesh.
//!
//! The scheduling engine treats these as opaque building blocks with fixed
//! input and output sizes:
//!
//! - **Hashing**: BLAKE3, 256-bit, for tempo secret derivation
//! - **Frame check**: 4-byte BLAKE3 prefix guarding every 64-byte frame
//! - **Keystream**: ChaCha20 with a 64-bit nonce, keyed by a tempo secret,
//!   used both to scramble frames and to derive per-step hop seeds
//!
//! Tempo secrets are wrapped in [`Secret`], which is zeroized on drop.

pub mod cipher;
pub mod hash;

#[cfg(test)]
mod test_vectors;

pub use cipher::{apply_keystream, keystream, Nonce, Secret, KEY_LEN, NONCE_LEN};
pub use hash::{check, hash, hash_parts, verify_check, CHECK_LEN, HASH_LEN};
