//! BLAKE3 hashing and the short frame check.

/// Size of a full digest.
pub const HASH_LEN: usize = 32;

/// Size of the integrity check carried at the tail of a frame.
pub const CHECK_LEN: usize = 4;

/// Hash a byte slice, returning a 32-byte BLAKE3 digest.
pub fn hash(data: &[u8]) -> [u8; HASH_LEN] {
    *blake3::hash(data).as_bytes()
}

/// Hash the concatenation of several slices without copying them together.
pub fn hash_parts(parts: &[&[u8]]) -> [u8; HASH_LEN] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// 4-byte integrity check over a frame region.
pub fn check(data: &[u8]) -> [u8; CHECK_LEN] {
    let digest = blake3::hash(data);
    let mut out = [0u8; CHECK_LEN];
    out.copy_from_slice(&digest.as_bytes()[..CHECK_LEN]);
    out
}

/// Compare a region against the check stored alongside it.
pub fn verify_check(data: &[u8], expected: &[u8]) -> bool {
    expected.len() == CHECK_LEN && check(data)[..] == expected[..]
}
