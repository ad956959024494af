//! Tempo - one cryptographically derived hopping sequence
//!
//! A tempo is either a broadcast signal (discovery, stream handshakes) or a
//! point-to-point stream. Both sides of a conversation derive the same
//! secret independently, then step the same sequence counter in lockstep.
//! Every step's nonce feeds a keystream whose tail becomes the seed the
//! driver turns into a concrete channel and window.

use crate::community::CommunityId;
use crate::mote::MoteId;
use tmesh_core::Hashname;
use tmesh_crypto::{hash, hash_parts, keystream, Nonce, Secret, NONCE_LEN};
use tmesh_stream::Frames;

/// Bytes handed to the driver on each step.
pub const SEED_LEN: usize = 8;

/// Keystream generated per step; the seed is its tail.
const SEED_STREAM_LEN: usize = 64 + SEED_LEN;

/// Per-step pseudo-random input for the driver's `advance`.
pub type Seed = [u8; SEED_LEN];

/// Handle naming one tempo inside the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TempoId {
    /// A community's own outbound signal
    Signal(CommunityId),
    /// The signal tempo a mote is heard on
    MoteSignal(MoteId),
    /// One of a mote's streams
    Stream(MoteId, u32),
}

impl TempoId {
    /// Owning community.
    pub fn community(&self) -> CommunityId {
        match self {
            TempoId::Signal(community) => *community,
            TempoId::MoteSignal(mote) | TempoId::Stream(mote, _) => mote.community,
        }
    }

    /// Owning mote, absent for a community's own signal.
    pub fn mote(&self) -> Option<MoteId> {
        match self {
            TempoId::Signal(_) => None,
            TempoId::MoteSignal(mote) | TempoId::Stream(mote, _) => Some(*mote),
        }
    }
}

/// Which end of a stream handshake created the tempo. Decides the step
/// parity on which this side transmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    /// Asked for the stream; transmits on even sequence numbers
    Requester,
    /// Accepted the request; transmits on odd sequence numbers
    Accepter,
}

impl StreamRole {
    /// Whether this side transmits at sequence `seq`.
    pub fn transmits(&self, seq: u16) -> bool {
        match self {
            StreamRole::Requester => seq % 2 == 0,
            StreamRole::Accepter => seq % 2 == 1,
        }
    }
}

/// Link statistics kept per tempo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TempoStats {
    /// Consecutive receive windows missed
    pub miss: u32,
    /// Consecutive transmit windows with nothing to send
    pub skip: u32,
    /// Successful transmits
    pub itx: u32,
    /// Validated receives
    pub irx: u32,
    /// Strongest RSSI seen
    pub best: i16,
    /// Weakest RSSI seen
    pub worst: i16,
    /// Most recent RSSI
    pub last: i16,
    /// Frames that failed validation
    pub bad: u32,
}

impl TempoStats {
    /// Record a validated reception.
    pub fn received(&mut self, rssi: i16) {
        self.miss = 0;
        self.irx += 1;
        if self.irx == 1 {
            self.best = rssi;
            self.worst = rssi;
        } else {
            self.best = self.best.max(rssi);
            self.worst = self.worst.min(rssi);
        }
        self.last = rssi;
    }
}

/// One hopping sequence.
#[derive(Debug)]
pub struct Tempo {
    id: TempoId,
    /// Medium this tempo hops within
    pub medium: u32,
    secret: Secret,
    /// Cycle at which the current window opens
    pub at: u32,
    /// Step counter, part of every nonce
    pub seq: u16,
    /// Transmit (true) or receive (false) on the current window
    pub tx: bool,
    /// Broadcast signal rather than stream
    pub signal: bool,
    /// Not yet synchronized with the counterpart
    pub lost: bool,
    /// Driver-assigned channel for the current window
    pub chan: u32,
    /// Link statistics
    pub stats: TempoStats,
    role: Option<StreamRole>,
    frames: Option<Frames>,
    /// Sequence wraps since the last epoch notify
    pub(crate) wraps: u8,
}

/// Secret of a standalone signal tempo: `Hash(Hash(name) ‖ peer)`.
pub fn signal_secret(community: &str, peer: &Hashname) -> Secret {
    let base = hash(community.as_bytes());
    Secret::new(hash_parts(&[&base, peer.bin()]))
}

/// Secret of a tempo spawned from a signal: `Hash(parent[0:32] ‖ other)`.
pub fn spawned_secret(parent: &Secret, other: &Hashname) -> Secret {
    Secret::new(hash_parts(&[parent.as_bytes(), other.bin()]))
}

impl Tempo {
    /// A fresh signal tempo for `peer` in `community`, starting lost.
    pub(crate) fn signal(id: TempoId, community: &str, peer: &Hashname, medium: u32) -> Self {
        Self::with_secret(id, signal_secret(community, peer), medium, true)
    }

    /// Spawn a stream from this signal tempo toward `other`. The stream
    /// inherits the current sequence number.
    pub(crate) fn spawn(&self, id: TempoId, other: &Hashname, medium: u32, role: StreamRole) -> Self {
        let mut tempo = Self::with_secret(id, spawned_secret(&self.secret, other), medium, false);
        tempo.seq = self.seq;
        tempo.role = Some(role);
        tempo.tx = role.transmits(tempo.seq);
        tempo.frames = Some(Frames::new());
        tempo
    }

    fn with_secret(id: TempoId, secret: Secret, medium: u32, signal: bool) -> Self {
        Self {
            id,
            medium,
            secret,
            at: 0,
            seq: 0,
            tx: false,
            signal,
            lost: true,
            chan: 0,
            stats: TempoStats::default(),
            role: None,
            frames: None,
            wraps: 0,
        }
    }

    /// Handle of this tempo.
    pub fn id(&self) -> TempoId {
        self.id
    }

    /// Derived secret.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// Stream role, if this is a stream.
    pub fn role(&self) -> Option<StreamRole> {
        self.role
    }

    /// Stream codec, present on streams only.
    pub fn frames(&self) -> Option<&Frames> {
        self.frames.as_ref()
    }

    pub(crate) fn frames_mut(&mut self) -> Option<&mut Frames> {
        self.frames.as_mut()
    }

    /// Nonce for the current step: medium ‖ counterpart ‖ seq, little-endian.
    pub fn nonce(&self, counterpart: u16) -> Nonce {
        let mut nonce = [0u8; NONCE_LEN];
        nonce[..4].copy_from_slice(&self.medium.to_le_bytes());
        nonce[4..6].copy_from_slice(&counterpart.to_le_bytes());
        nonce[6..].copy_from_slice(&self.seq.to_le_bytes());
        nonce
    }

    /// Seed the driver applies for the step identified by `nonce`.
    pub fn seed(&self, nonce: &Nonce) -> Seed {
        let stream: [u8; SEED_STREAM_LEN] = keystream(&self.secret, nonce);
        let mut seed = [0u8; SEED_LEN];
        seed.copy_from_slice(&stream[64..]);
        seed
    }

    /// Move to the next sequence number. Returns true when it wrapped.
    pub(crate) fn step(&mut self) -> bool {
        self.seq = self.seq.wrapping_add(1);
        if let Some(role) = self.role {
            self.tx = role.transmits(self.seq);
        }
        self.seq == 0
    }

    /// Adopt a counterpart's window and sequence.
    pub(crate) fn sync(&mut self, at: u32, seq: u16) {
        self.at = at;
        self.seq = seq;
        if let Some(role) = self.role {
            self.tx = role.transmits(seq);
        }
    }
}

/// Split a nonce back into (medium, counterpart, seq).
pub fn split_nonce(nonce: &Nonce) -> (u32, u16, u16) {
    let medium = u32::from_le_bytes([nonce[0], nonce[1], nonce[2], nonce[3]]);
    let counterpart = u16::from_le_bytes([nonce[4], nonce[5]]);
    let seq = u16::from_le_bytes([nonce[6], nonce[7]]);
    (medium, counterpart, seq)
}
