//! Mote - one peer's presence inside a community

use crate::community::CommunityId;
use crate::tempo::{Tempo, TempoId};
use std::fmt;
use tmesh_core::Hashname;

/// Handle of a mote. Carries its community so lookups need nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoteId {
    /// Owning community
    pub community: CommunityId,
    pub(crate) index: u32,
}

impl MoteId {
    pub(crate) fn new(community: CommunityId, index: u32) -> Self {
        Self { community, index }
    }
}

impl fmt::Display for MoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/mote#{}", self.community, self.index)
    }
}

/// Per-peer state.
#[derive(Debug)]
pub struct Mote {
    id: MoteId,
    peer: Hashname,
    /// Epoch of the peer's signal, counterpart in our nonces
    pub seq: u16,
    pub(crate) signal: Tempo,
    pub(crate) streams: Vec<Tempo>,
    pub(crate) cached: Option<Vec<u8>>,
    pub(crate) requested: Option<u32>,
    pub(crate) acknowledged: bool,
    next_stream: u32,
}

impl Mote {
    pub(crate) fn new(id: MoteId, peer: Hashname, signal: Tempo) -> Self {
        Self {
            id,
            peer,
            seq: 0,
            signal,
            streams: Vec::new(),
            cached: None,
            requested: None,
            acknowledged: false,
            next_stream: 0,
        }
    }

    /// Handle of this mote.
    pub fn id(&self) -> MoteId {
        self.id
    }

    /// The peer.
    pub fn peer(&self) -> &Hashname {
        &self.peer
    }

    /// Signal tempo we hear the peer on.
    pub fn signal(&self) -> &Tempo {
        &self.signal
    }

    /// Established streams; the first one carries outbound packets.
    pub fn streams(&self) -> &[Tempo] {
        &self.streams
    }

    /// Packet waiting for a stream.
    pub fn cached(&self) -> Option<&[u8]> {
        self.cached.as_deref()
    }

    /// Stream medium the peer asked us to accept on.
    pub fn requested(&self) -> Option<u32> {
        self.requested
    }

    /// Whether the peer has advertised hearing us.
    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub(crate) fn stream(&self, id: TempoId) -> Option<&Tempo> {
        self.streams.iter().find(|s| s.id() == id)
    }

    pub(crate) fn stream_mut(&mut self, id: TempoId) -> Option<&mut Tempo> {
        self.streams.iter_mut().find(|s| s.id() == id)
    }

    pub(crate) fn next_stream_id(&mut self) -> TempoId {
        self.next_stream += 1;
        TempoId::Stream(self.id, self.next_stream)
    }

    /// Take the cached packet, if any, into the head stream's codec.
    pub(crate) fn flush_cached(&mut self) {
        let Some(packet) = self.cached.take() else {
            return;
        };
        let Some(frames) = self.streams.first_mut().and_then(|s| s.frames_mut()) else {
            self.cached = Some(packet);
            return;
        };
        // size was checked when the packet was cached
        if let Err(e) = frames.send(&packet) {
            tracing::warn!(mote = %self.id, error = %e, "Dropping cached packet");
        }
    }
}
