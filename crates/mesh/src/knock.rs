//! Knock - one concrete scheduled radio operation
//!
//! A community owns exactly two knock slots: the main knock, filled from
//! the best tempo each cycle, and the seek, a receive-only listen for lost
//! signals. A slot is handed to the driver once populated and comes back
//! through [`crate::Tmesh::knocked`] exactly once.

use crate::community::CommunityId;
use crate::tempo::{Tempo, TempoId};
use tmesh_crypto::{Nonce, NONCE_LEN};
use tmesh_stream::FRAME_LEN;

/// Tempos a single signal knock can carry along for resynchronization.
pub const MAX_SYNCS: usize = 5;

/// Which of a community's two knock slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnockSlot {
    /// Main knock, transmit or receive
    Main,
    /// Lost-signal listen
    Seek,
}

/// Handle of a knock slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnockId {
    /// Owning community
    pub community: CommunityId,
    /// Slot within the community
    pub slot: KnockSlot,
}

/// A scheduled radio operation.
#[derive(Debug, Clone)]
pub struct Knock {
    id: KnockId,
    /// medium ‖ counterpart seq ‖ tempo seq
    pub nonce: Nonce,
    /// Ciphertext to send, or the received ciphertext after completion
    pub frame: [u8; FRAME_LEN],
    /// Bound tempo
    pub tempo: Option<TempoId>,
    /// Copied from the bound tempo
    pub tx: bool,
    /// Populated and owned by the driver until completed
    pub ready: bool,
    /// Cycle the window opens, copied from the bound tempo
    pub start: u32,
    /// Driver channel, copied from the bound tempo
    pub chan: u32,
    /// Window was missed
    pub err: bool,
    /// Signal strength of a reception
    pub rssi: i16,
    /// Cycle the operation actually finished
    pub stopped: u32,
    /// Tempos resynchronized to `stopped` after a successful transmit
    pub syncs: Vec<TempoId>,
}

impl Knock {
    pub(crate) fn new(id: KnockId) -> Self {
        Self {
            id,
            nonce: [0u8; NONCE_LEN],
            frame: [0u8; FRAME_LEN],
            tempo: None,
            tx: false,
            ready: false,
            start: 0,
            chan: 0,
            err: false,
            rssi: 0,
            stopped: 0,
            syncs: Vec::with_capacity(MAX_SYNCS),
        }
    }

    /// Handle of this knock.
    pub fn id(&self) -> KnockId {
        self.id
    }

    /// Medium portion of the nonce.
    pub fn medium(&self) -> u32 {
        u32::from_le_bytes([self.nonce[0], self.nonce[1], self.nonce[2], self.nonce[3]])
    }

    /// Bind to `tempo` for its current window.
    pub(crate) fn prepare(&mut self, tempo: &Tempo, counterpart: u16) {
        self.reset();
        self.nonce = tempo.nonce(counterpart);
        self.tempo = Some(tempo.id());
        self.tx = tempo.tx;
        self.start = tempo.at;
        self.chan = tempo.chan;
    }

    /// Back to the zeroed state.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.id);
    }

    pub(crate) fn apply(&mut self, completion: Completion) {
        self.err = completion.err;
        self.rssi = completion.rssi;
        self.stopped = completion.stopped;
        if let Some(frame) = completion.frame {
            self.frame = frame;
        }
    }
}

/// What the driver reports when a knock finishes.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The window was missed
    pub err: bool,
    /// Signal strength, receive only
    pub rssi: i16,
    /// Cycle the operation finished
    pub stopped: u32,
    /// Ciphertext received, receive only
    pub frame: Option<[u8; FRAME_LEN]>,
}

impl Completion {
    /// A transmit that went out.
    pub fn sent(stopped: u32) -> Self {
        Self {
            err: false,
            rssi: 0,
            stopped,
            frame: None,
        }
    }

    /// A reception of `frame`.
    pub fn received(frame: [u8; FRAME_LEN], rssi: i16, stopped: u32) -> Self {
        Self {
            err: false,
            rssi,
            stopped,
            frame: Some(frame),
        }
    }

    /// A window that passed without success.
    pub fn missed(stopped: u32) -> Self {
        Self {
            err: true,
            rssi: 0,
            stopped,
            frame: None,
        }
    }
}
