//! Known-answer vectors for the primitives.
//!
//! Frames on the air are only interoperable if these stay fixed.

use crate::cipher::{keystream, Secret};
use crate::hash::hash;
use proptest::prelude::*;

/// BLAKE3 of the empty input.
const BLAKE3_EMPTY_HEX: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

/// ChaCha20 (64-bit nonce) keystream, all-zero key and nonce, first block prefix.
const CHACHA20_ZERO_HEX: &str = "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7";

#[test]
fn test_blake3_empty_vector() {
    assert_eq!(hex::encode(hash(b"")), BLAKE3_EMPTY_HEX);
}

#[test]
fn test_chacha20_zero_vector() {
    let stream: [u8; 32] = keystream(&Secret::new([0u8; 32]), &[0u8; 8]);
    assert_eq!(hex::encode(stream), CHACHA20_ZERO_HEX);
}

proptest! {
    #[test]
    fn prop_distinct_secrets_distinct_streams(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
        prop_assume!(a != b);
        let sa: [u8; 16] = keystream(&Secret::new(a), &[0u8; 8]);
        let sb: [u8; 16] = keystream(&Secret::new(b), &[0u8; 8]);
        prop_assert_ne!(sa, sb);
    }
}
