//! Fixed-size frame codec.
//!
//! Every frame is 64 bytes of plaintext:
//!
//! ```text
//! [0]       flags: 0x80 last fragment, 0x40 keep-alive, 0x20 first fragment
//! [1]       payload length (<= 54)
//! [2..4)    frame index, little-endian, wraps
//! [4..58)   payload
//! [58..60)  zero
//! [60..64)  check over [0..60)
//! ```
//!
//! Outbound frames are built when a packet is queued and stay at the head
//! of the outbox until the transmit is confirmed with [`Frames::sent`].
//! Inbound frames must arrive with strictly increasing indices; a gap
//! abandons the packet being reassembled.

use crate::error::{StreamError, StreamResult};
use std::collections::VecDeque;
use tmesh_crypto::{check, verify_check, CHECK_LEN};
use tracing::{debug, warn};

/// Size of every frame on a stream.
pub const FRAME_LEN: usize = 64;

/// Application bytes carried per frame.
pub const PAYLOAD_LEN: usize = 54;

/// Largest packet accepted by [`Frames::send`].
pub const MAX_PACKET: usize = 65_535;

const FLAG_LAST: u8 = 0x80;
const FLAG_KEEPALIVE: u8 = 0x40;
const FLAG_FIRST: u8 = 0x20;

const PAYLOAD_AT: usize = 4;
const CHECK_AT: usize = FRAME_LEN - CHECK_LEN;

/// Per-stream fragmentation and reassembly state.
#[derive(Debug, Default)]
pub struct Frames {
    outbound: VecDeque<[u8; FRAME_LEN]>,
    out_index: u16,
    out_pending: usize,
    in_last: Option<u16>,
    partial: Vec<u8>,
    in_progress: bool,
    inbound: VecDeque<Vec<u8>>,
    in_total: usize,
}

impl Frames {
    /// Create an empty codec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an application packet for transmission.
    pub fn send(&mut self, packet: &[u8]) -> StreamResult<()> {
        if packet.len() > MAX_PACKET {
            return Err(StreamError::PacketTooLarge {
                len: packet.len(),
                max: MAX_PACKET,
            });
        }

        let chunks: Vec<&[u8]> = if packet.is_empty() {
            vec![&[][..]]
        } else {
            packet.chunks(PAYLOAD_LEN).collect()
        };
        let count = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut flags = 0;
            if i == 0 {
                flags |= FLAG_FIRST;
            }
            if i + 1 == count {
                flags |= FLAG_LAST;
            }
            self.push_frame(flags, chunk);
        }
        self.out_pending += packet.len();

        debug!(len = packet.len(), frames = count, "Queued stream packet");
        Ok(())
    }

    /// Queue an empty keep-alive so the far side hears from us, unless
    /// something is already waiting to go out.
    pub fn send_flush(&mut self) {
        if self.outbound.is_empty() {
            self.push_frame(FLAG_KEEPALIVE, &[]);
        }
    }

    /// Copy the next pending frame into `frame`. Returns false when there is
    /// nothing to send. Repeats the same frame until [`Frames::sent`].
    pub fn outbox(&self, frame: &mut [u8; FRAME_LEN]) -> bool {
        match self.outbound.front() {
            Some(next) => {
                frame.copy_from_slice(next);
                true
            }
            None => false,
        }
    }

    /// Whether any frame is waiting to go out.
    pub fn pending(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Confirm the head frame was transmitted.
    pub fn sent(&mut self) {
        if let Some(frame) = self.outbound.pop_front() {
            self.out_pending = self.out_pending.saturating_sub(frame[1] as usize);
        }
    }

    /// Accept a received plaintext frame. Returns false for frames that fail
    /// the check, are malformed, or were already seen.
    pub fn inbox(&mut self, frame: &[u8; FRAME_LEN]) -> bool {
        if !verify_check(&frame[..CHECK_AT], &frame[CHECK_AT..]) {
            return false;
        }
        let len = frame[1] as usize;
        if len > PAYLOAD_LEN {
            return false;
        }

        let index = u16::from_le_bytes([frame[2], frame[3]]);
        if let Some(last) = self.in_last {
            let ahead = index.wrapping_sub(last);
            if ahead == 0 || ahead >= 0x8000 {
                return false;
            }
            if ahead != 1 && self.in_progress {
                warn!(
                    missing = ahead - 1,
                    dropped = self.partial.len(),
                    "Stream gap, abandoning partial packet"
                );
                self.partial.clear();
                self.in_progress = false;
            }
        }
        self.in_last = Some(index);

        let flags = frame[0];
        if flags & FLAG_KEEPALIVE != 0 {
            return true;
        }
        if flags & FLAG_FIRST != 0 {
            self.partial.clear();
            self.in_progress = true;
        } else if !self.in_progress {
            // tail of a packet whose head was lost
            return true;
        }

        self.partial
            .extend_from_slice(&frame[PAYLOAD_AT..PAYLOAD_AT + len]);
        self.in_total += len;

        if flags & FLAG_LAST != 0 {
            self.inbound.push_back(std::mem::take(&mut self.partial));
            self.in_progress = false;
        }
        true
    }

    /// Pop the next fully reassembled packet.
    pub fn receive(&mut self) -> Option<Vec<u8>> {
        self.inbound.pop_front()
    }

    /// True while a packet is partially reassembled and more frames are due.
    pub fn awaiting(&self) -> bool {
        self.in_progress
    }

    /// Application bytes queued but not yet confirmed sent.
    pub fn outlen(&self) -> usize {
        self.out_pending
    }

    /// Application bytes received so far.
    pub fn inlen(&self) -> usize {
        self.in_total
    }

    fn push_frame(&mut self, flags: u8, payload: &[u8]) {
        let mut frame = [0u8; FRAME_LEN];
        frame[0] = flags;
        frame[1] = payload.len() as u8;
        frame[2..4].copy_from_slice(&self.out_index.to_le_bytes());
        frame[PAYLOAD_AT..PAYLOAD_AT + payload.len()].copy_from_slice(payload);
        let tag = check(&frame[..CHECK_AT]);
        frame[CHECK_AT..].copy_from_slice(&tag);

        self.out_index = self.out_index.wrapping_add(1);
        self.outbound.push_back(frame);
    }
}
