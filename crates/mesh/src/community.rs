//! Community - a named group of peers sharing three mediums

use crate::knock::{Knock, KnockId, KnockSlot};
use crate::mote::{Mote, MoteId};
use crate::tempo::{Tempo, TempoId};
use std::collections::BTreeMap;
use std::fmt;

/// Handle of a joined community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommunityId(u32);

impl CommunityId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value, for logs.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "com#{}", self.0)
    }
}

/// The three mediums a community is joined on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mediums {
    /// Lost-signal discovery medium; also what the community signal hops on
    pub lost: u32,
    /// Own-signal medium
    pub signal: u32,
    /// Default medium requested for new streams
    pub stream: u32,
}

impl From<[u32; 3]> for Mediums {
    fn from(m: [u32; 3]) -> Self {
        Self {
            lost: m[0],
            signal: m[1],
            stream: m[2],
        }
    }
}

impl From<Mediums> for [u32; 3] {
    fn from(m: Mediums) -> Self {
        [m.lost, m.signal, m.stream]
    }
}

/// Per-community scheduling state.
#[derive(Debug)]
pub struct Community {
    id: CommunityId,
    name: String,
    /// Joined mediums
    pub mediums: Mediums,
    /// Epoch of the community's own signal
    pub seq: u16,
    pub(crate) motes: BTreeMap<MoteId, Mote>,
    pub(crate) signal: Tempo,
    pub(crate) knock: Knock,
    pub(crate) seek: Knock,
    next_mote: u32,
}

impl Community {
    pub(crate) fn new(id: CommunityId, name: &str, mediums: Mediums, signal: Tempo) -> Self {
        Self {
            id,
            name: name.to_string(),
            mediums,
            seq: 0,
            motes: BTreeMap::new(),
            signal,
            knock: Knock::new(KnockId {
                community: id,
                slot: KnockSlot::Main,
            }),
            seek: Knock::new(KnockId {
                community: id,
                slot: KnockSlot::Seek,
            }),
            next_mote: 0,
        }
    }

    /// Handle of this community.
    pub fn id(&self) -> CommunityId {
        self.id
    }

    /// Community name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Our outbound signal tempo.
    pub fn signal(&self) -> &Tempo {
        &self.signal
    }

    /// Known peers, in creation order.
    pub fn motes(&self) -> impl Iterator<Item = &Mote> {
        self.motes.values()
    }

    /// Look up one mote.
    pub fn mote(&self, id: MoteId) -> Option<&Mote> {
        self.motes.get(&id)
    }

    /// One of the two knock slots.
    pub fn knock(&self, slot: KnockSlot) -> &Knock {
        match slot {
            KnockSlot::Main => &self.knock,
            KnockSlot::Seek => &self.seek,
        }
    }

    pub(crate) fn knock_mut(&mut self, slot: KnockSlot) -> &mut Knock {
        match slot {
            KnockSlot::Main => &mut self.knock,
            KnockSlot::Seek => &mut self.seek,
        }
    }

    pub(crate) fn next_mote_id(&mut self) -> MoteId {
        self.next_mote += 1;
        MoteId::new(self.id, self.next_mote)
    }

    /// Look up any tempo owned by this community.
    pub fn tempo(&self, id: TempoId) -> Option<&Tempo> {
        if id.community() != self.id {
            return None;
        }
        lookup(&self.signal, &self.motes, id)
    }

    pub(crate) fn tempo_mut(&mut self, id: TempoId) -> Option<&mut Tempo> {
        if id.community() != self.id {
            return None;
        }
        match id {
            TempoId::Signal(_) => Some(&mut self.signal),
            TempoId::MoteSignal(mote) => self.motes.get_mut(&mote).map(|m| &mut m.signal),
            TempoId::Stream(mote, _) => self.motes.get_mut(&mote)?.stream_mut(id),
        }
    }

    /// Counterpart sequence for a tempo's nonce: the owning mote's epoch,
    /// or ours for the community signal.
    pub fn counterpart(&self, id: TempoId) -> u16 {
        match id.mote().and_then(|m| self.motes.get(&m)) {
            Some(mote) => mote.seq,
            None => self.seq,
        }
    }

    /// Whether the community signal must still use the lost layout.
    pub(crate) fn signal_lost(&self) -> bool {
        self.motes.is_empty()
            || self
                .motes
                .values()
                .any(|m| m.signal.lost || !m.acknowledged)
    }

    /// Every tempo id, community signal first, then per mote its signal
    /// followed by its streams.
    pub fn tempo_ids(&self) -> Vec<TempoId> {
        let mut ids = vec![self.signal.id()];
        for mote in self.motes.values() {
            ids.push(mote.signal.id());
            ids.extend(mote.streams.iter().map(|s| s.id()));
        }
        ids
    }
}

/// Tempo lookup over a community's split-borrowed fields.
pub(crate) fn lookup<'a>(
    signal: &'a Tempo,
    motes: &'a BTreeMap<MoteId, Mote>,
    id: TempoId,
) -> Option<&'a Tempo> {
    match id {
        TempoId::Signal(_) => Some(signal),
        TempoId::MoteSignal(mote) => motes.get(&mote).map(|m| &m.signal),
        TempoId::Stream(mote, _) => motes.get(&mote)?.stream(id),
    }
}
