//! Signal frames - broadcast discovery and stream handshakes
//!
//! A signal frame is 64 bytes of ciphertext carrying up to five 10-byte
//! signal blocks and a 4-byte check. It comes in two layouts:
//!
//! ```text
//! regular  [0..50) blocks   [50..60) zero  [60..64) check over [0..60)
//!          whole frame scrambled with the receiver's expected nonce
//!
//! lost     [0..8) nonce in plaintext  [8..58) blocks  [58..60) zero
//!          [60..64) check over [8..60), bytes [8..64) scrambled with
//!          the embedded nonce
//! ```
//!
//! Receivers try the regular layout first and fall back to the lost one,
//! which lets a peer that has never heard us synchronize from one frame.

use tmesh_core::SHORT_LEN;
use tmesh_crypto::{apply_keystream, check, verify_check, Nonce, Secret, CHECK_LEN, NONCE_LEN};
use tmesh_stream::FRAME_LEN;

/// Size of one signal block.
pub const SIGBLK_LEN: usize = 10;

/// Signal blocks per frame.
pub const MAX_BLOCKS: usize = 5;

const CHECK_AT: usize = FRAME_LEN - CHECK_LEN;
const VALUE_MASK: u8 = 0x7f;

/// 10-byte record inside a signal frame:
/// medium(4, LE) ‖ peer prefix(5) ‖ neighbor:1 (bit 0) | value:7 (bits 1..8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigBlock {
    /// Medium the block refers to
    pub medium: u32,
    /// Short hashname of the addressed or advertised peer
    pub id: [u8; SHORT_LEN],
    /// Third-party advertisement rather than an addressed request
    pub neighbor: bool,
    /// 7-bit value, meaning depends on `neighbor`
    pub value: u8,
}

impl SigBlock {
    /// `value` of an addressed block asking the peer to start a stream.
    pub const REQUEST: u8 = 1;
    /// `value` of an addressed block accepting a stream.
    pub const ACCEPT: u8 = 2;

    /// Addressed block.
    pub fn addressed(medium: u32, id: [u8; SHORT_LEN], value: u8) -> Self {
        Self {
            medium,
            id,
            neighbor: false,
            value: value & VALUE_MASK,
        }
    }

    /// Neighbor advertisement with a quality value.
    pub fn neighbor(medium: u32, id: [u8; SHORT_LEN], quality: u8) -> Self {
        Self {
            medium,
            id,
            neighbor: true,
            value: quality & VALUE_MASK,
        }
    }

    /// Write the block into the first [`SIGBLK_LEN`] bytes of `out`.
    pub fn encode(&self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.medium.to_le_bytes());
        out[4..9].copy_from_slice(&self.id);
        out[9] = (self.neighbor as u8) | ((self.value & VALUE_MASK) << 1);
    }

    /// Read a block from the first [`SIGBLK_LEN`] bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Self {
        let mut id = [0u8; SHORT_LEN];
        id.copy_from_slice(&buf[4..9]);
        Self {
            medium: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            id,
            neighbor: buf[9] & 0x01 != 0,
            value: buf[9] >> 1,
        }
    }

    /// Unused slots are all zero; real mediums never are.
    fn is_empty(&self) -> bool {
        self.medium == 0
    }
}

/// How a received signal frame was laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalLayout {
    /// Decoded with the receiver's own nonce
    Regular,
    /// Carried the sender's nonce in the clear
    Lost {
        /// The sender's nonce at transmit time
        nonce: Nonce,
    },
}

/// A validated signal frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Layout the frame validated under
    pub layout: SignalLayout,
    /// Non-empty blocks in frame order
    pub blocks: Vec<SigBlock>,
}

fn pack(frame: &mut [u8; FRAME_LEN], offset: usize, blocks: &[SigBlock]) {
    for (i, block) in blocks.iter().take(MAX_BLOCKS).enumerate() {
        let at = offset + i * SIGBLK_LEN;
        block.encode(&mut frame[at..at + SIGBLK_LEN]);
    }
}

fn unpack(frame: &[u8; FRAME_LEN], offset: usize) -> Vec<SigBlock> {
    (0..MAX_BLOCKS)
        .map(|i| {
            let at = offset + i * SIGBLK_LEN;
            SigBlock::decode(&frame[at..at + SIGBLK_LEN])
        })
        .filter(|block| !block.is_empty())
        .collect()
}

/// Build a regular signal frame. Blocks past [`MAX_BLOCKS`] are dropped.
pub fn encode_signal(secret: &Secret, nonce: &Nonce, blocks: &[SigBlock]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    pack(&mut frame, 0, blocks);
    let tag = check(&frame[..CHECK_AT]);
    frame[CHECK_AT..].copy_from_slice(&tag);
    apply_keystream(secret, nonce, &mut frame);
    frame
}

/// Build a lost-layout signal frame with `nonce` prefixed in the clear.
pub fn encode_lost_signal(secret: &Secret, nonce: &Nonce, blocks: &[SigBlock]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..NONCE_LEN].copy_from_slice(nonce);
    pack(&mut frame, NONCE_LEN, blocks);
    let tag = check(&frame[NONCE_LEN..CHECK_AT]);
    frame[CHECK_AT..].copy_from_slice(&tag);
    apply_keystream(secret, nonce, &mut frame[NONCE_LEN..]);
    frame
}

/// Validate and decode a received signal frame, trying the regular layout
/// with `nonce` first and then the lost layout. `None` when neither checks.
pub fn decode_signal(secret: &Secret, nonce: &Nonce, frame: &[u8; FRAME_LEN]) -> Option<Signal> {
    let mut plain = *frame;
    apply_keystream(secret, nonce, &mut plain);
    if verify_check(&plain[..CHECK_AT], &plain[CHECK_AT..]) {
        return Some(Signal {
            layout: SignalLayout::Regular,
            blocks: unpack(&plain, 0),
        });
    }

    let mut plain = *frame;
    let mut embedded = [0u8; NONCE_LEN];
    embedded.copy_from_slice(&plain[..NONCE_LEN]);
    apply_keystream(secret, &embedded, &mut plain[NONCE_LEN..]);
    if verify_check(&plain[NONCE_LEN..CHECK_AT], &plain[CHECK_AT..]) {
        return Some(Signal {
            layout: SignalLayout::Lost { nonce: embedded },
            blocks: unpack(&plain, NONCE_LEN),
        });
    }

    None
}
