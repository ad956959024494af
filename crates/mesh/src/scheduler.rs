//! Scheduler - advances every tempo, elects knocks and handles completions
//!
//! [`Tmesh`] is driven from outside: once per cycle through
//! [`Tmesh::schedule`] and once per finished radio operation through
//! [`Tmesh::knocked`]. Both calls are synchronous and never block.

use crate::community::{lookup, Community, CommunityId, Mediums};
use crate::driver::Driver;
use crate::error::{TmeshError, TmeshResult};
use crate::knock::{Completion, Knock, KnockId, KnockSlot, MAX_SYNCS};
use crate::mote::{Mote, MoteId};
use crate::path::PathOffer;
use crate::pipe::Pipe;
use crate::signal::{
    decode_signal, encode_lost_signal, encode_signal, SigBlock, SignalLayout, MAX_BLOCKS,
};
use crate::tempo::{split_nonce, StreamRole, Tempo, TempoId};
use std::collections::{BTreeMap, BTreeSet};
use tmesh_core::Hashname;
use tmesh_crypto::apply_keystream;
use tmesh_stream::MAX_PACKET;
use tracing::{debug, info, warn};

/// The scheduling engine for one local identity.
pub struct Tmesh<D: Driver, P: Pipe> {
    id: Hashname,
    driver: D,
    pipe: P,
    communities: BTreeMap<CommunityId, Community>,
    paths: Vec<PathOffer>,
    next_community: u32,
}

impl<D: Driver, P: Pipe> Tmesh<D, P> {
    /// New engine for `id`, owning `driver` and delivering into `pipe`.
    pub fn new(id: Hashname, driver: D, pipe: P) -> Self {
        info!(id = %id.short_hex(), "tmesh started");
        Self {
            id,
            driver,
            pipe,
            communities: BTreeMap::new(),
            paths: Vec::new(),
            next_community: 0,
        }
    }

    /// Our identity.
    pub fn id(&self) -> &Hashname {
        &self.id
    }

    /// Join a community on `[lost, signal, stream]` mediums.
    ///
    /// Joining a name already joined on the same mediums returns the
    /// existing handle; on different mediums it is refused.
    pub fn join(&mut self, name: &str, mediums: [u32; 3]) -> TmeshResult<CommunityId> {
        if name.is_empty() {
            return Err(TmeshError::InvalidArgument("community name is empty".into()));
        }
        let mediums = Mediums::from(mediums);
        // zero marks an unused signal block slot
        if mediums.lost == 0 || mediums.signal == 0 || mediums.stream == 0 {
            return Err(TmeshError::InvalidArgument("mediums must be non-zero".into()));
        }

        if let Some(existing) = self.communities.values().find(|c| c.name() == name) {
            if existing.mediums == mediums {
                debug!(community = %name, "Already joined");
                return Ok(existing.id());
            }
            return Err(TmeshError::DuplicateCommunity {
                name: name.to_string(),
            });
        }

        let index = self
            .next_community
            .checked_add(1)
            .ok_or_else(|| TmeshError::Allocation("community handles exhausted".into()))?;
        let id = CommunityId::new(index);

        let mut signal = Tempo::signal(TempoId::Signal(id), name, &self.id, mediums.lost);
        signal.tx = true;
        let mut community = Community::new(id, name, mediums, signal);

        if !self.driver.init_community(&mut community) {
            return Err(TmeshError::Allocation(format!(
                "driver refused community {}",
                name
            )));
        }
        if !self.driver.init_tempo(&mut community.signal) {
            self.driver.free_community(&community);
            return Err(TmeshError::Allocation(format!(
                "driver refused signal for {}",
                name
            )));
        }

        self.next_community = index;
        self.communities.insert(id, community);
        self.paths.push(PathOffer::new(name, mediums.lost));

        info!(
            community = %name,
            lost = mediums.lost,
            signal = mediums.signal,
            stream = mediums.stream,
            "Joined community"
        );
        Ok(id)
    }

    /// Leave a community, freeing every mote and tempo in it.
    pub fn leave(&mut self, id: CommunityId) -> TmeshResult<()> {
        let community = self
            .communities
            .remove(&id)
            .ok_or(TmeshError::CommunityNotFound)?;
        free_community(&mut self.driver, &community);
        self.paths
            .retain(|p| !(p.name == community.name() && p.medium == community.mediums.lost));

        info!(community = %community.name(), "Left community");
        Ok(())
    }

    /// The mote for `peer` in a community, created on first sight.
    ///
    /// `mediums[0]` is the medium the peer's signal hops on; zero means the
    /// community's lost medium.
    pub fn find(
        &mut self,
        community: CommunityId,
        peer: &Hashname,
        mediums: [u32; 3],
    ) -> TmeshResult<MoteId> {
        if *peer == self.id {
            return Err(TmeshError::InvalidArgument("cannot add ourselves as a mote".into()));
        }
        let com = self
            .communities
            .get_mut(&community)
            .ok_or(TmeshError::CommunityNotFound)?;

        if let Some(existing) = com.motes.values().find(|m| m.peer() == peer) {
            return Ok(existing.id());
        }

        let medium = if mediums[0] != 0 {
            mediums[0]
        } else {
            com.mediums.lost
        };
        let id = com.next_mote_id();
        let mut signal = Tempo::signal(TempoId::MoteSignal(id), com.name(), peer, medium);
        if !self.driver.init_tempo(&mut signal) {
            return Err(TmeshError::Allocation(format!(
                "driver refused signal for {}",
                peer.short_hex()
            )));
        }
        com.motes.insert(id, Mote::new(id, *peer, signal));

        info!(
            community = %com.name(),
            peer = %peer.short_hex(),
            medium,
            "Mote added"
        );
        Ok(id)
    }

    /// First mote known for `peer` in any community.
    pub fn mote_for(&self, peer: &Hashname) -> Option<MoteId> {
        self.communities
            .values()
            .flat_map(|c| c.motes())
            .find(|m| m.peer() == peer)
            .map(|m| m.id())
    }

    /// Forget a peer in one community.
    pub fn drop_mote(&mut self, id: MoteId) -> TmeshResult<()> {
        let com = self
            .communities
            .get_mut(&id.community)
            .ok_or(TmeshError::CommunityNotFound)?;
        let mote = com.motes.remove(&id).ok_or(TmeshError::MoteNotFound)?;
        free_mote(&mut self.driver, &mote);

        for knock in [&mut com.knock, &mut com.seek] {
            if knock.tempo.and_then(|t| t.mote()) == Some(id) {
                knock.reset();
            }
        }

        info!(peer = %mote.peer().short_hex(), "Mote dropped");
        Ok(())
    }

    /// Queue an application packet for a peer. Without a stream the packet
    /// is cached until one is established; a newer packet replaces it.
    pub fn send(&mut self, id: MoteId, packet: &[u8]) -> TmeshResult<()> {
        if packet.len() > MAX_PACKET {
            return Err(TmeshError::InvalidArgument(format!(
                "packet of {} bytes exceeds {}",
                packet.len(),
                MAX_PACKET
            )));
        }
        let mote = self.mote_mut(id)?;
        if let Some(frames) = mote.streams.first_mut().and_then(|s| s.frames_mut()) {
            return frames
                .send(packet)
                .map_err(|e| TmeshError::InvalidArgument(e.to_string()));
        }

        if mote.cached.replace(packet.to_vec()).is_some() {
            warn!(peer = %mote.peer().short_hex(), "Replaced cached packet");
        }
        debug!(peer = %mote.peer().short_hex(), len = packet.len(), "Cached packet until a stream exists");
        Ok(())
    }

    /// Run one scheduling pass for cycle `at` (non-zero), first shifting all
    /// tempo times back by `rebase`.
    ///
    /// Per-community failures are logged and retried on the next pass.
    pub fn schedule(&mut self, at: u32, rebase: u32) -> TmeshResult<()> {
        if at == 0 {
            return Err(TmeshError::InvalidArgument("cycle must be non-zero".into()));
        }
        debug!(id = %self.id.short_hex(), at, rebase, "Scheduling");

        let ids: Vec<CommunityId> = self.communities.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.schedule_community(id, at, rebase) {
                warn!(community = %id, error = %e, "Scheduling pass abandoned");
            }
        }
        Ok(())
    }

    fn schedule_community(&mut self, cid: CommunityId, at: u32, rebase: u32) -> TmeshResult<()> {
        let Self {
            id: me,
            driver,
            communities,
            ..
        } = self;
        let com = communities
            .get_mut(&cid)
            .ok_or(TmeshError::CommunityNotFound)?;

        // one committed knock per community; time still shifts under it
        if com.knock.ready {
            if rebase > 0 {
                rebase_community(com, rebase);
            }
            return Ok(());
        }

        accept_requests(driver, com, me);

        let mut stalled = BTreeSet::new();
        if let Err(e) = advance_tempo(driver, &mut com.signal, &mut com.seq, at, rebase) {
            debug!(error = %e, "Community signal stalled");
            stalled.insert(com.signal.id());
        }
        for mote in com.motes.values_mut() {
            if let Err(e) = advance_tempo(driver, &mut mote.signal, &mut mote.seq, at, rebase) {
                debug!(error = %e, "Mote signal stalled");
                stalled.insert(mote.signal.id());
            }
            for stream in mote.streams.iter_mut() {
                if let Err(e) = advance_tempo(driver, stream, &mut mote.seq, at, rebase) {
                    debug!(error = %e, "Stream stalled");
                    stalled.insert(stream.id());
                }
            }
        }
        let lost = com.signal_lost();
        com.signal.lost = lost;

        let (best, lost) = elect(driver, com, &stalled);

        if let Some(tempo_id) = lost {
            if !com.seek.ready {
                seek(driver, com, tempo_id);
            }
        }

        match best {
            Some(tempo_id) => prepare_knock(driver, com, tempo_id),
            None => Ok(()),
        }
    }

    /// Hand back a knock the driver finished. Knocks that are not ready are
    /// ignored.
    pub fn knocked(&mut self, id: KnockId, completion: Completion) -> TmeshResult<()> {
        let com = self
            .communities
            .get_mut(&id.community)
            .ok_or(TmeshError::CommunityNotFound)?;
        let slot = com.knock_mut(id.slot);
        if !slot.ready {
            debug!(community = %id.community, slot = ?id.slot, "Completion for idle knock ignored");
            return Ok(());
        }
        slot.ready = false;
        slot.apply(completion);
        let knock = slot.clone();

        let tempo_id = knock
            .tempo
            .ok_or_else(|| TmeshError::InvalidArgument("knock has no tempo".into()))?;

        if knock.err {
            return self.missed(&knock, tempo_id);
        }
        if knock.tx {
            return self.transmitted(&knock, tempo_id);
        }
        match tempo_id {
            TempoId::Stream(mote, _) => self.receive_stream(&knock, mote, tempo_id),
            TempoId::MoteSignal(mote) => self.receive_signal(&knock, mote),
            TempoId::Signal(_) => Err(TmeshError::InvalidArgument(
                "community signal does not receive".into(),
            )),
        }
    }

    fn missed(&mut self, knock: &Knock, tempo_id: TempoId) -> TmeshResult<()> {
        if !knock.tx {
            if let Some(tempo) = self
                .communities
                .get_mut(&tempo_id.community())
                .and_then(|c| c.tempo_mut(tempo_id))
            {
                tempo.stats.miss += 1;
                if let Some(frames) = tempo.frames_mut() {
                    if frames.awaiting() {
                        frames.send_flush();
                    }
                }
            }
        }
        debug!(tempo = ?tempo_id, tx = knock.tx, start = knock.start, "Knock missed");
        Err(TmeshError::MissedWindow)
    }

    fn transmitted(&mut self, knock: &Knock, tempo_id: TempoId) -> TmeshResult<()> {
        let com = self
            .communities
            .get_mut(&tempo_id.community())
            .ok_or(TmeshError::CommunityNotFound)?;
        let tempo = com.tempo_mut(tempo_id).ok_or(TmeshError::MoteNotFound)?;

        tempo.stats.skip = 0;
        tempo.stats.itx += 1;
        if let Some(frames) = tempo.frames_mut() {
            frames.sent();
        }
        if tempo.signal && tempo.lost {
            tempo.at = knock.stopped;
        }

        let (_, _, carrier) = split_nonce(&knock.nonce);
        for sync in &knock.syncs {
            if let Some(stream) = com.tempo_mut(*sync) {
                stream.sync(knock.stopped, carrier);
                debug!(tempo = ?sync, at = knock.stopped, seq = carrier, "Synced with accept");
            }
        }
        debug!(tempo = ?tempo_id, stopped = knock.stopped, "Transmitted");
        Ok(())
    }

    fn receive_stream(&mut self, knock: &Knock, mote_id: MoteId, tempo_id: TempoId) -> TmeshResult<()> {
        let Self {
            communities, pipe, ..
        } = self;
        let mote = communities
            .get_mut(&mote_id.community)
            .and_then(|c| c.motes.get_mut(&mote_id))
            .ok_or(TmeshError::MoteNotFound)?;
        let peer = *mote.peer();
        let tempo = mote.stream_mut(tempo_id).ok_or(TmeshError::MoteNotFound)?;

        let mut plain = knock.frame;
        apply_keystream(tempo.secret(), &knock.nonce, &mut plain);
        let accepted = tempo
            .frames_mut()
            .map(|frames| frames.inbox(&plain))
            .unwrap_or(false);
        if !accepted {
            tempo.stats.bad += 1;
            debug!(tempo = ?tempo_id, bad = tempo.stats.bad, "Stream frame rejected");
            return Err(TmeshError::FrameValidation { tempo: tempo_id });
        }

        tempo.stats.received(knock.rssi);
        if tempo.lost {
            tempo.lost = false;
            info!(peer = %peer.short_hex(), medium = tempo.medium, "Stream synchronized");
        }
        if let Some(frames) = tempo.frames_mut() {
            while let Some(packet) = frames.receive() {
                debug!(peer = %peer.short_hex(), len = packet.len(), "Delivering packet");
                pipe.deliver(&peer, packet);
            }
        }
        Ok(())
    }

    fn receive_signal(&mut self, knock: &Knock, bound: MoteId) -> TmeshResult<()> {
        let Self {
            id: me,
            driver,
            communities,
            ..
        } = self;
        let com = communities
            .get_mut(&bound.community)
            .ok_or(TmeshError::CommunityNotFound)?;

        // a seek hears whichever lost peer happened to transmit
        let mut candidates = vec![bound];
        if knock.id().slot == KnockSlot::Seek {
            candidates.extend(
                com.motes
                    .values()
                    .filter(|m| m.id() != bound && m.signal.lost)
                    .map(|m| m.id()),
            );
        }
        let decoded = candidates.iter().find_map(|id| {
            let mote = com.motes.get(id)?;
            decode_signal(mote.signal.secret(), &knock.nonce, &knock.frame).map(|s| (*id, s))
        });

        let Some((mote_id, signal)) = decoded else {
            if let Some(mote) = com.motes.get_mut(&bound) {
                mote.signal.stats.bad += 1;
            }
            debug!(mote = %bound, "Signal frame rejected");
            return Err(TmeshError::FrameValidation {
                tempo: TempoId::MoteSignal(bound),
            });
        };

        let own = &com.signal;
        let mote = com
            .motes
            .get_mut(&mote_id)
            .ok_or(TmeshError::MoteNotFound)?;

        if let SignalLayout::Lost { nonce } = signal.layout {
            let (medium, counterpart, seq) = split_nonce(&nonce);
            if mote.signal.lost {
                info!(
                    peer = %mote.peer().short_hex(),
                    medium,
                    seq,
                    at = knock.stopped,
                    "Signal synchronized"
                );
            }
            mote.signal.medium = medium;
            mote.seq = counterpart;
            mote.signal.seq = seq;
            mote.signal.at = knock.stopped;
            mote.signal.lost = false;
        }
        mote.signal.stats.received(knock.rssi);
        let carrier = mote.signal.seq;

        for block in &signal.blocks {
            if block.neighbor {
                if me.matches_short(&block.id) {
                    if !mote.acknowledged {
                        info!(peer = %mote.peer().short_hex(), "Peer hears us");
                    }
                    mote.acknowledged = true;
                } else {
                    debug!(
                        peer = %mote.peer().short_hex(),
                        neighbor = %hex::encode(block.id),
                        medium = block.medium,
                        quality = block.value,
                        "Neighbor advertised"
                    );
                }
                continue;
            }
            if !me.matches_short(&block.id) {
                continue;
            }

            match block.value {
                SigBlock::REQUEST => request_received(me, mote, block.medium),
                SigBlock::ACCEPT => {
                    accept_received(driver, own, mote, block.medium, knock.stopped, carrier)?
                }
                value => debug!(value, "Unknown signal block"),
            }
        }
        Ok(())
    }

    /// Offer a path payload from `peer`. Offers for communities we have
    /// not joined, other path types and malformed payloads are ignored.
    pub fn on_path(&mut self, peer: &Hashname, json: &str) -> Option<MoteId> {
        let Some(offer) = PathOffer::parse(json) else {
            debug!(peer = %peer.short_hex(), "Ignoring path offer");
            return None;
        };
        let community = self
            .communities
            .values()
            .find(|c| c.name() == offer.name && c.mediums.lost == offer.medium)?
            .id();
        match self.find(community, peer, [offer.medium, 0, 0]) {
            Ok(mote) => Some(mote),
            Err(e) => {
                debug!(peer = %peer.short_hex(), error = %e, "Path offer not usable");
                None
            }
        }
    }

    /// Path offers for every joined community.
    pub fn paths(&self) -> &[PathOffer] {
        &self.paths
    }

    /// Look up a community.
    pub fn community(&self, id: CommunityId) -> Option<&Community> {
        self.communities.get(&id)
    }

    /// Joined communities.
    pub fn communities(&self) -> impl Iterator<Item = &Community> {
        self.communities.values()
    }

    /// Look up a mote.
    pub fn mote(&self, id: MoteId) -> Option<&Mote> {
        self.communities.get(&id.community)?.mote(id)
    }

    fn mote_mut(&mut self, id: MoteId) -> TmeshResult<&mut Mote> {
        self.communities
            .get_mut(&id.community)
            .and_then(|c| c.motes.get_mut(&id))
            .ok_or(TmeshError::MoteNotFound)
    }

    /// Look up a tempo.
    pub fn tempo(&self, id: TempoId) -> Option<&Tempo> {
        self.communities.get(&id.community())?.tempo(id)
    }

    /// Look up a knock slot.
    pub fn knock(&self, id: KnockId) -> Option<&Knock> {
        Some(self.communities.get(&id.community)?.knock(id.slot))
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The delivery pipe.
    pub fn pipe(&self) -> &P {
        &self.pipe
    }

    /// The delivery pipe, mutably.
    pub fn pipe_mut(&mut self) -> &mut P {
        &mut self.pipe
    }
}

impl<D: Driver, P: Pipe> Drop for Tmesh<D, P> {
    fn drop(&mut self) {
        for (_, community) in std::mem::take(&mut self.communities) {
            free_community(&mut self.driver, &community);
        }
    }
}

fn free_mote<D: Driver>(driver: &mut D, mote: &Mote) {
    for stream in mote.streams() {
        driver.free_tempo(stream);
    }
    driver.free_tempo(mote.signal());
}

fn free_community<D: Driver>(driver: &mut D, community: &Community) {
    for mote in community.motes() {
        free_mote(driver, mote);
    }
    driver.free_tempo(community.signal());
    driver.free_community(community);
}

/// Shift every tempo in `com` back by `rebase` cycles without stepping.
fn rebase_community(com: &mut Community, rebase: u32) {
    com.signal.at = com.signal.at.saturating_sub(rebase);
    for mote in com.motes.values_mut() {
        mote.signal.at = mote.signal.at.saturating_sub(rebase);
        for stream in mote.streams.iter_mut() {
            stream.at = stream.at.saturating_sub(rebase);
        }
    }
}

/// Step `tempo` until its window is at or past `at`, after shifting it back
/// by `rebase`. A refused step leaves the tempo where it was before it.
pub(crate) fn advance_tempo<D: Driver>(
    driver: &mut D,
    tempo: &mut Tempo,
    epoch: &mut u16,
    at: u32,
    rebase: u32,
) -> TmeshResult<()> {
    if tempo.at == 0 {
        tempo.at = at.saturating_add(rebase);
    }
    if rebase > 0 {
        tempo.at = tempo.at.saturating_sub(rebase);
    }

    while tempo.at < at {
        let (before_at, before_seq, before_tx, before_wraps, before_epoch) =
            (tempo.at, tempo.seq, tempo.tx, tempo.wraps, *epoch);

        // every wrap moves the epoch, every second one notifies
        if tempo.step() {
            *epoch = epoch.wrapping_add(1);
            tempo.wraps += 1;
            if tempo.wraps == 2 {
                tempo.wraps = 0;
                debug!(tempo = ?tempo.id(), epoch = *epoch, "Epoch overflow");
                driver.notify();
            }
        }

        let nonce = tempo.nonce(*epoch);
        let seed = tempo.seed(&nonce);
        if !driver.advance(tempo, &seed) {
            tempo.at = before_at;
            tempo.seq = before_seq;
            tempo.tx = before_tx;
            tempo.wraps = before_wraps;
            *epoch = before_epoch;
            return Err(TmeshError::Driver(format!(
                "advance refused for {:?} at seq {}",
                tempo.id(),
                before_seq
            )));
        }
        // every step moves at least one cycle
        if tempo.at <= before_at {
            tempo.at = before_at + 1;
        }
    }
    Ok(())
}

/// Run the driver's `sort` over the candidates: community signal first,
/// then per mote its signal and streams. Lost mote signals form their own
/// pool for the seek.
fn elect<D: Driver>(
    driver: &mut D,
    com: &Community,
    stalled: &BTreeSet<TempoId>,
) -> (Option<TempoId>, Option<TempoId>) {
    let mut best = (!stalled.contains(&com.signal.id())).then_some(&com.signal);
    let mut lost: Option<&Tempo> = None;

    for mote in com.motes.values() {
        if !stalled.contains(&mote.signal.id()) {
            if mote.signal.lost {
                lost = Some(driver.sort(lost, &mote.signal));
            } else {
                best = Some(driver.sort(best, &mote.signal));
            }
        }
        for stream in mote.streams.iter().filter(|s| !stalled.contains(&s.id())) {
            best = Some(driver.sort(best, stream));
        }
    }

    (best.map(Tempo::id), lost.map(Tempo::id))
}

fn seek<D: Driver>(driver: &mut D, com: &mut Community, tempo_id: TempoId) {
    let Some(mote) = tempo_id.mote().and_then(|id| com.motes.get(&id)) else {
        return;
    };
    com.seek.prepare(&mote.signal, mote.seq);
    com.seek.tx = false;
    com.seek.ready = true;

    if !driver.schedule(&com.seek) {
        debug!(tempo = ?tempo_id, "Seek refused");
        com.seek.reset();
    }
}

fn prepare_knock<D: Driver>(driver: &mut D, com: &mut Community, tempo_id: TempoId) -> TmeshResult<()> {
    let counterpart = com.counterpart(tempo_id);
    let signal_lost = com.signal.lost;
    let (blocks, syncs) = signal_blocks(com);

    let idle = {
        let Community {
            signal,
            motes,
            knock,
            ..
        } = &mut *com;
        let tempo = lookup(signal, motes, tempo_id).ok_or(TmeshError::MoteNotFound)?;
        knock.prepare(tempo, counterpart);

        if !tempo.tx {
            false
        } else if tempo.signal {
            knock.frame = if signal_lost {
                encode_lost_signal(tempo.secret(), &knock.nonce, &blocks)
            } else {
                encode_signal(tempo.secret(), &knock.nonce, &blocks)
            };
            knock.syncs = syncs;
            false
        } else {
            // a stream only speaks once the far side has heard it
            let ready = !tempo.lost
                && tempo
                    .frames()
                    .map(|f| f.outbox(&mut knock.frame))
                    .unwrap_or(false);
            if ready {
                apply_keystream(tempo.secret(), &knock.nonce, &mut knock.frame);
            }
            !ready
        }
    };

    if idle {
        com.knock.reset();
        if let Some(tempo) = com.tempo_mut(tempo_id) {
            tempo.stats.skip += 1;
        }
        return Ok(());
    }

    com.knock.ready = true;
    if !driver.schedule(&com.knock) {
        com.knock.reset();
        return Err(TmeshError::Driver(format!("schedule refused for {:?}", tempo_id)));
    }

    debug!(
        tempo = ?tempo_id,
        tx = com.knock.tx,
        start = com.knock.start,
        chan = com.knock.chan,
        frame = %hex::encode(com.knock.frame),
        "Knock scheduled"
    );
    Ok(())
}

/// Blocks for our next signal frame: accepts for every stream still
/// waiting on its peer, requests for peers we hold a packet for, then
/// neighbor advertisements for every peer we hear.
fn signal_blocks(com: &Community) -> (Vec<SigBlock>, Vec<TempoId>) {
    let mut blocks = Vec::with_capacity(MAX_BLOCKS);
    let mut syncs = Vec::with_capacity(MAX_SYNCS);

    for mote in com.motes.values() {
        if blocks.len() == MAX_BLOCKS || syncs.len() == MAX_SYNCS {
            break;
        }
        if let Some(head) = mote.streams.first().filter(|s| s.lost) {
            blocks.push(SigBlock::addressed(
                head.medium,
                mote.peer().short(),
                SigBlock::ACCEPT,
            ));
            syncs.push(head.id());
        }
    }

    let synced = || com.motes.values().filter(|m| !m.signal.lost);

    for mote in synced() {
        if blocks.len() == MAX_BLOCKS {
            break;
        }
        if mote.streams.is_empty() && mote.cached.is_some() {
            blocks.push(SigBlock::addressed(
                com.mediums.stream,
                mote.peer().short(),
                SigBlock::REQUEST,
            ));
        }
    }

    for mote in synced() {
        if blocks.len() == MAX_BLOCKS {
            break;
        }
        let quality = mote.signal.stats.last.unsigned_abs().min(127) as u8;
        blocks.push(SigBlock::neighbor(
            mote.signal.medium,
            mote.peer().short(),
            quality,
        ));
    }

    (blocks, syncs)
}

fn request_received(me: &Hashname, mote: &mut Mote, medium: u32) {
    if !mote.streams.is_empty() {
        debug!(peer = %mote.peer().short_hex(), "Stream request while one exists");
        return;
    }
    // both sides asking: the lower id waits for the other's accept
    if mote.cached.is_some() && me < mote.peer() {
        debug!(peer = %mote.peer().short_hex(), "Crossed stream requests, deferring");
        return;
    }
    info!(peer = %mote.peer().short_hex(), medium, "Stream requested");
    mote.requested = Some(medium);
}

fn accept_received<D: Driver>(
    driver: &mut D,
    own: &Tempo,
    mote: &mut Mote,
    medium: u32,
    stopped: u32,
    carrier: u16,
) -> TmeshResult<()> {
    if let Some(head) = mote.streams.first_mut() {
        if head.role() == Some(StreamRole::Requester) {
            head.sync(stopped, carrier);
            debug!(peer = %mote.peer().short_hex(), at = stopped, seq = carrier, "Stream resynchronized");
        }
        return Ok(());
    }

    let id = mote.next_stream_id();
    let mut stream = own.spawn(id, mote.peer(), medium, StreamRole::Requester);
    stream.sync(stopped, carrier);
    stream.lost = false;
    if !driver.init_tempo(&mut stream) {
        warn!(peer = %mote.peer().short_hex(), "Driver refused stream");
        return Err(TmeshError::Allocation(format!(
            "driver refused stream to {}",
            mote.peer().short_hex()
        )));
    }

    mote.streams.push(stream);
    mote.requested = None;
    mote.flush_cached();
    info!(peer = %mote.peer().short_hex(), medium, at = stopped, "Stream accepted by peer");
    Ok(())
}

/// Spawn accepter streams for every pending request.
fn accept_requests<D: Driver>(driver: &mut D, com: &mut Community, me: &Hashname) {
    for mote in com.motes.values_mut() {
        let Some(medium) = mote.requested else {
            continue;
        };
        if !mote.streams.is_empty() {
            mote.requested = None;
            continue;
        }

        let id = mote.next_stream_id();
        let mut stream = mote.signal.spawn(id, me, medium, StreamRole::Accepter);
        stream.lost = true;
        if !driver.init_tempo(&mut stream) {
            warn!(peer = %mote.peer().short_hex(), "Driver refused stream, retrying next pass");
            continue;
        }

        mote.streams.push(stream);
        mote.requested = None;
        mote.flush_cached();
        info!(peer = %mote.peer().short_hex(), medium, "Stream accepted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::Mailbox;
    use crate::tempo::{signal_secret, spawned_secret};
    use proptest::prelude::*;

    /// No-op advance, lower sequence wins.
    #[derive(Default)]
    struct LowSeq {
        scheduled: Vec<KnockId>,
        refuse: bool,
        notified: u32,
        freed_tempos: u32,
        freed_communities: u32,
    }

    impl Driver for LowSeq {
        fn free_tempo(&mut self, _tempo: &Tempo) {
            self.freed_tempos += 1;
        }

        fn free_community(&mut self, _community: &Community) {
            self.freed_communities += 1;
        }

        fn advance(&mut self, _tempo: &mut Tempo, _seed: &[u8; 8]) -> bool {
            true
        }

        fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
            match a {
                Some(a) if a.seq <= b.seq => a,
                _ => b,
            }
        }

        fn schedule(&mut self, knock: &Knock) -> bool {
            self.scheduled.push(knock.id());
            !self.refuse
        }

        fn notify(&mut self) {
            self.notified += 1;
        }
    }

    /// Seeded advance, first argument always wins.
    #[derive(Default)]
    struct First;

    impl Driver for First {
        fn advance(&mut self, tempo: &mut Tempo, seed: &[u8; 8]) -> bool {
            tempo.at += 1 + (seed[0] % 4) as u32;
            tempo.chan = seed[1] as u32 % 8;
            true
        }

        fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
            a.unwrap_or(b)
        }

        fn schedule(&mut self, _knock: &Knock) -> bool {
            true
        }
    }

    fn me() -> Hashname {
        Hashname::new([1; 32])
    }

    fn peer() -> Hashname {
        Hashname::new([2; 32])
    }

    fn main(com: CommunityId) -> KnockId {
        KnockId {
            community: com,
            slot: KnockSlot::Main,
        }
    }

    fn seek_id(com: CommunityId) -> KnockId {
        KnockId {
            community: com,
            slot: KnockSlot::Seek,
        }
    }

    fn setup<D: Driver + Default>() -> (Tmesh<D, Mailbox>, CommunityId, MoteId) {
        let mut tm = Tmesh::new(me(), D::default(), Mailbox::new());
        let com = tm.join("test", [1, 2, 3]).unwrap();
        let mote = tm.find(com, &peer(), [1, 2, 3]).unwrap();
        (tm, com, mote)
    }

    /// A lost-layout frame as the peer's community signal would send it.
    fn peer_frame(seq: u16, blocks: &[SigBlock]) -> [u8; 64] {
        let secret = signal_secret("test", &peer());
        let nonce = [1, 0, 0, 0, 0, 0, seq.to_le_bytes()[0], seq.to_le_bytes()[1]];
        encode_lost_signal(&secret, &nonce, blocks)
    }

    #[test]
    fn test_scenario_one_knock_and_lost_receive() {
        let (mut tm, com, mote) = setup::<LowSeq>();

        for at in 1..=20 {
            tm.schedule(at, 0).unwrap();
            let c = tm.community(com).unwrap();
            assert!(c.knock(KnockSlot::Main).ready);
            assert!(c.knock(KnockSlot::Seek).ready);
            assert_eq!(c.knock(KnockSlot::Seek).tempo, Some(TempoId::MoteSignal(mote)));
            assert!(!c.knock(KnockSlot::Seek).tx);

            // a second pass while the knock is out changes nothing
            let before = c.knock(KnockSlot::Main).nonce;
            tm.schedule(at, 0).unwrap();
            assert_eq!(tm.knock(main(com)).unwrap().nonce, before);

            tm.knocked(main(com), Completion::sent(at)).unwrap();
            assert!(!tm.knock(main(com)).unwrap().ready);
        }
        // the seek is only handed to the driver once
        let seeks = tm
            .driver()
            .scheduled
            .iter()
            .filter(|k| k.slot == KnockSlot::Seek)
            .count();
        assert_eq!(seeks, 1);

        let frame = peer_frame(5, &[SigBlock::neighbor(1, me().short(), 60)]);
        tm.knocked(seek_id(com), Completion::received(frame, -60, 123))
            .unwrap();

        let m = tm.mote(mote).unwrap();
        assert!(!m.signal().lost);
        assert_eq!(m.signal().at, 123);
        assert_eq!(m.signal().seq, 5);
        assert_eq!(m.signal().stats.last, -60);
        assert!(m.acknowledged());

        // the synced mote now competes for the main knock with its own nonce
        tm.schedule(21, 0).unwrap();
        let knock = tm.knock(main(com)).unwrap();
        assert_eq!(knock.tempo, Some(TempoId::MoteSignal(mote)));
        assert!(!knock.tx);
        assert_eq!(knock.start, 123);
        assert_eq!(knock.nonce, [1, 0, 0, 0, 0, 0, 5, 0]);
    }

    #[test]
    fn test_community_signal_layout_follows_peers() {
        let (mut tm, com, _) = setup::<LowSeq>();
        let own = signal_secret("test", &me());

        tm.schedule(1, 0).unwrap();
        let knock = tm.knock(main(com)).unwrap().clone();
        assert_eq!(knock.tempo, Some(TempoId::Signal(com)));
        assert!(knock.tx);
        assert_eq!(&knock.frame[..8], &knock.nonce);
        let signal = decode_signal(&own, &[0; 8], &knock.frame).unwrap();
        assert!(matches!(signal.layout, SignalLayout::Lost { .. }));
        assert!(signal.blocks.is_empty());
        tm.knocked(main(com), Completion::sent(1)).unwrap();

        // peer hears us and says so
        let frame = peer_frame(500, &[SigBlock::neighbor(1, me().short(), 40)]);
        tm.knocked(seek_id(com), Completion::received(frame, -45, 9000))
            .unwrap();

        tm.schedule(2, 0).unwrap();
        let knock = tm.knock(main(com)).unwrap().clone();
        assert_eq!(knock.tempo, Some(TempoId::Signal(com)));
        let signal = decode_signal(&own, &knock.nonce, &knock.frame).unwrap();
        assert_eq!(signal.layout, SignalLayout::Regular);
        assert_eq!(
            signal.blocks,
            vec![SigBlock::neighbor(1, peer().short(), 45)]
        );
    }

    #[test]
    fn test_first_argument_wins() {
        let (mut tm, com, mote) = setup::<First>();
        tm.schedule(1, 0).unwrap();
        tm.knocked(main(com), Completion::sent(1)).unwrap();

        let frame = peer_frame(0, &[]);
        tm.knocked(seek_id(com), Completion::received(frame, -50, 3))
            .unwrap();
        assert!(!tm.mote(mote).unwrap().signal().lost);

        for at in 2..40 {
            tm.schedule(at, 0).unwrap();
            let c = tm.community(com).unwrap();
            let knock = c.knock(KnockSlot::Main);
            assert_eq!(knock.tempo, Some(TempoId::Signal(com)));
            assert_eq!(knock.nonce, c.signal().nonce(c.seq));
            assert_eq!(knock.start, c.signal().at);
            tm.knocked(main(com), Completion::sent(knock.start)).unwrap();
        }
    }

    #[test]
    fn test_request_spawns_accepter_stream() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        tm.schedule(1, 0).unwrap();

        let frame = peer_frame(7, &[SigBlock::addressed(3, me().short(), SigBlock::REQUEST)]);
        tm.knocked(seek_id(com), Completion::received(frame, -50, 10))
            .unwrap();
        assert_eq!(tm.mote(mote).unwrap().requested(), Some(3));

        tm.knocked(main(com), Completion::sent(1)).unwrap();
        tm.schedule(2, 0).unwrap();

        let m = tm.mote(mote).unwrap();
        assert!(m.requested().is_none());
        assert_eq!(m.streams().len(), 1);
        let stream = &m.streams()[0];
        assert_eq!(stream.role(), Some(StreamRole::Accepter));
        assert_eq!(stream.medium, 3);
        assert!(stream.lost);
        let parent = signal_secret("test", &peer());
        assert_eq!(stream.secret(), &spawned_secret(&parent, &me()));

        // our signal now advertises the accept and carries the stream along
        let c = tm.community(com).unwrap();
        if c.knock(KnockSlot::Main).tempo == Some(TempoId::Signal(com)) {
            let knock = c.knock(KnockSlot::Main);
            assert_eq!(knock.syncs, vec![stream.id()]);
            let blocks = signal_blocks(c).0;
            assert_eq!(
                blocks[0],
                SigBlock::addressed(3, peer().short(), SigBlock::ACCEPT)
            );
        }
    }

    #[test]
    fn test_accept_spawns_requester_stream() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        tm.send(mote, b"hello").unwrap();
        assert_eq!(tm.mote(mote).unwrap().cached(), Some(&b"hello"[..]));
        tm.schedule(1, 0).unwrap();

        let frame = peer_frame(42, &[SigBlock::addressed(3, me().short(), SigBlock::ACCEPT)]);
        tm.knocked(seek_id(com), Completion::received(frame, -50, 77))
            .unwrap();

        let m = tm.mote(mote).unwrap();
        assert!(m.cached().is_none());
        assert_eq!(m.streams().len(), 1);
        let stream = &m.streams()[0];
        assert_eq!(stream.role(), Some(StreamRole::Requester));
        assert!(!stream.lost);
        assert_eq!(stream.at, 77);
        assert_eq!(stream.seq, 42);
        assert!(stream.tx);
        assert_eq!(stream.frames().unwrap().outlen(), 5);
        let own = signal_secret("test", &me());
        assert_eq!(stream.secret(), &spawned_secret(&own, &peer()));
    }

    #[test]
    fn test_send_caches_last_packet() {
        let (mut tm, _, mote) = setup::<LowSeq>();
        tm.send(mote, b"first").unwrap();
        tm.send(mote, b"second").unwrap();
        assert_eq!(tm.mote(mote).unwrap().cached(), Some(&b"second"[..]));

        let err = tm.send(mote, &vec![0u8; MAX_PACKET + 1]).unwrap_err();
        assert!(matches!(err, TmeshError::InvalidArgument(_)));
    }

    #[test]
    fn test_bad_seek_frame_counts() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        tm.schedule(1, 0).unwrap();

        let err = tm
            .knocked(seek_id(com), Completion::received([0xAA; 64], -50, 3))
            .unwrap_err();
        assert!(matches!(err, TmeshError::FrameValidation { .. }));
        let m = tm.mote(mote).unwrap();
        assert_eq!(m.signal().stats.bad, 1);
        assert!(m.signal().lost);

        // not ready any more: a second completion is ignored
        tm.knocked(seek_id(com), Completion::received([0xAA; 64], -50, 3))
            .unwrap();
        assert_eq!(tm.mote(mote).unwrap().signal().stats.bad, 1);
    }

    #[test]
    fn test_missed_window() {
        let (mut tm, com, _) = setup::<LowSeq>();
        tm.schedule(1, 0).unwrap();
        let err = tm.knocked(seek_id(com), Completion::missed(5)).unwrap_err();
        assert!(matches!(err, TmeshError::MissedWindow));
        assert!(!tm.knock(seek_id(com)).unwrap().ready);
    }

    #[test]
    fn test_schedule_refusal_discards_knock() {
        let (mut tm, com, _) = setup::<LowSeq>();
        tm.driver_mut().refuse = true;
        tm.schedule(1, 0).unwrap();
        let c = tm.community(com).unwrap();
        assert!(!c.knock(KnockSlot::Main).ready);
        assert!(!c.knock(KnockSlot::Seek).ready);

        tm.driver_mut().refuse = false;
        tm.schedule(2, 0).unwrap();
        assert!(tm.knock(main(com)).unwrap().ready);
    }

    #[test]
    fn test_zero_cycle_rejected() {
        let (mut tm, _, _) = setup::<LowSeq>();
        assert!(matches!(
            tm.schedule(0, 0),
            Err(TmeshError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_join_dedup_and_paths() {
        let mut tm = Tmesh::new(me(), LowSeq::default(), Mailbox::new());
        let a = tm.join("test", [1, 2, 3]).unwrap();
        assert_eq!(tm.join("test", [1, 2, 3]).unwrap(), a);
        assert!(matches!(
            tm.join("test", [4, 5, 6]),
            Err(TmeshError::DuplicateCommunity { .. })
        ));
        assert!(tm.join("", [1, 2, 3]).is_err());
        assert!(tm.join("zero", [0, 2, 3]).is_err());

        let b = tm.join("other", [4, 5, 6]).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            tm.paths(),
            &[PathOffer::new("test", 1), PathOffer::new("other", 4)]
        );

        tm.find(a, &peer(), [0, 0, 0]).unwrap();
        tm.leave(a).unwrap();
        assert_eq!(tm.paths(), &[PathOffer::new("other", 4)]);
        assert_eq!(tm.driver().freed_communities, 1);
        assert_eq!(tm.driver().freed_tempos, 2);
        assert!(matches!(tm.leave(a), Err(TmeshError::CommunityNotFound)));
    }

    #[test]
    fn test_find_and_lookup() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        assert_eq!(tm.find(com, &peer(), [0, 0, 0]).unwrap(), mote);
        assert_eq!(tm.mote_for(&peer()), Some(mote));
        assert!(tm.mote_for(&Hashname::new([9; 32])).is_none());
        assert!(matches!(
            tm.find(com, &me(), [1, 2, 3]),
            Err(TmeshError::InvalidArgument(_))
        ));

        let other = tm.find(com, &Hashname::new([3; 32]), [7, 0, 0]).unwrap();
        assert_eq!(tm.mote(other).unwrap().signal().medium, 7);
        assert_eq!(tm.mote(mote).unwrap().signal().medium, 1);
    }

    #[test]
    fn test_drop_mote_clears_knocks() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        tm.schedule(1, 0).unwrap();
        assert!(tm.knock(seek_id(com)).unwrap().ready);

        tm.drop_mote(mote).unwrap();
        assert!(!tm.knock(seek_id(com)).unwrap().ready);
        assert!(tm.mote(mote).is_none());
        assert!(matches!(tm.drop_mote(mote), Err(TmeshError::MoteNotFound)));
    }

    #[test]
    fn test_on_path() {
        let mut tm = Tmesh::new(me(), LowSeq::default(), Mailbox::new());
        tm.join("test", [1, 2, 3]).unwrap();

        let offer = PathOffer::new("test", 1).to_json().unwrap();
        let mote = tm.on_path(&peer(), &offer).unwrap();
        assert_eq!(tm.mote(mote).unwrap().peer(), &peer());
        assert_eq!(tm.on_path(&peer(), &offer), Some(mote));

        let elsewhere = PathOffer::new("test", 9).to_json().unwrap();
        assert!(tm.on_path(&peer(), &elsewhere).is_none());
        assert!(tm.on_path(&peer(), r#"{"type":"udp4"}"#).is_none());
        assert!(tm.on_path(&me(), &offer).is_none());
    }

    #[test]
    fn test_drop_frees_everything() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Counting(Rc<Cell<u32>>);
        impl Driver for Counting {
            fn free_community(&mut self, _community: &Community) {
                self.0.set(self.0.get() + 1);
            }
            fn advance(&mut self, _tempo: &mut Tempo, _seed: &[u8; 8]) -> bool {
                true
            }
            fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
                a.unwrap_or(b)
            }
            fn schedule(&mut self, _knock: &Knock) -> bool {
                true
            }
        }

        let freed = Rc::new(Cell::new(0));
        {
            let mut tm = Tmesh::new(me(), Counting(freed.clone()), Mailbox::new());
            tm.join("one", [1, 2, 3]).unwrap();
            tm.join("two", [4, 5, 6]).unwrap();
        }
        assert_eq!(freed.get(), 2);
    }

    #[test]
    fn test_epoch_cascade() {
        let mut driver = LowSeq::default();
        let mut tempo = Tempo::signal(
            TempoId::Signal(CommunityId::new(1)),
            "test",
            &me(),
            1,
        );
        let mut epoch = 0u16;
        tempo.at = 1;

        // first wrap only moves the epoch
        advance_tempo(&mut driver, &mut tempo, &mut epoch, 65_537, 0).unwrap();
        assert_eq!(tempo.seq, 0);
        assert_eq!(epoch, 1);
        assert_eq!(driver.notified, 0);

        // second wrap also notifies
        advance_tempo(&mut driver, &mut tempo, &mut epoch, 131_073, 0).unwrap();
        assert_eq!(tempo.seq, 0);
        assert_eq!(epoch, 2);
        assert_eq!(driver.notified, 1);

        advance_tempo(&mut driver, &mut tempo, &mut epoch, 196_609, 0).unwrap();
        assert_eq!(epoch, 3);
        assert_eq!(driver.notified, 1);
    }

    #[test]
    fn test_epoch_wraps_without_notify() {
        let mut driver = LowSeq::default();
        let mut tempo = Tempo::signal(TempoId::Signal(CommunityId::new(1)), "t", &me(), 1);
        tempo.at = 1;
        tempo.seq = u16::MAX;
        let mut epoch = u16::MAX;
        advance_tempo(&mut driver, &mut tempo, &mut epoch, 2, 0).unwrap();
        assert_eq!(epoch, 0);
        assert_eq!(tempo.wraps, 1);
        assert_eq!(driver.notified, 0);
    }

    #[test]
    fn test_rebase_while_knock_outstanding() {
        let (mut tm, com, mote) = setup::<LowSeq>();
        tm.schedule(100, 0).unwrap();
        assert!(tm.community(com).unwrap().knock(KnockSlot::Main).ready);
        assert_eq!(tm.community(com).unwrap().signal().at, 100);
        assert_eq!(tm.mote(mote).unwrap().signal().at, 100);

        tm.schedule(101, 10).unwrap();
        assert!(tm.community(com).unwrap().knock(KnockSlot::Main).ready);
        assert_eq!(tm.community(com).unwrap().signal().at, 90);
        assert_eq!(tm.mote(mote).unwrap().signal().at, 90);
    }

    #[test]
    fn test_join_rejects_zero_mediums() {
        let mut tm = Tmesh::new(me(), LowSeq::default(), Mailbox::new());
        for mediums in [[0, 2, 3], [1, 0, 3], [1, 2, 0]] {
            assert!(matches!(
                tm.join("zero", mediums),
                Err(TmeshError::InvalidArgument(_))
            ));
        }
        assert_eq!(tm.communities().count(), 0);
        assert!(tm.paths().is_empty());
    }

    #[test]
    fn test_refused_advance_restores() {
        struct Refuse;
        impl Driver for Refuse {
            fn advance(&mut self, tempo: &mut Tempo, _seed: &[u8; 8]) -> bool {
                tempo.at += 100;
                false
            }
            fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
                a.unwrap_or(b)
            }
            fn schedule(&mut self, _knock: &Knock) -> bool {
                true
            }
        }

        let mut tempo = Tempo::signal(TempoId::Signal(CommunityId::new(1)), "t", &me(), 1);
        tempo.at = 10;
        tempo.seq = 4;
        let mut epoch = 3;
        let err = advance_tempo(&mut Refuse, &mut tempo, &mut epoch, 20, 0).unwrap_err();
        assert!(matches!(err, TmeshError::Driver(_)));
        assert_eq!((tempo.at, tempo.seq, epoch), (10, 4, 3));
    }

    #[test]
    fn test_rebase_shifts_back() {
        let mut tempo = Tempo::signal(TempoId::Signal(CommunityId::new(1)), "t", &me(), 1);
        let mut epoch = 0;
        advance_tempo(&mut LowSeq::default(), &mut tempo, &mut epoch, 50, 0).unwrap();
        assert_eq!(tempo.at, 50);
        assert_eq!(tempo.seq, 0);

        advance_tempo(&mut LowSeq::default(), &mut tempo, &mut epoch, 45, 10).unwrap();
        assert_eq!(tempo.at, 45);
        assert_eq!(tempo.seq, 5);
    }

    proptest! {
        #[test]
        fn prop_advance_monotonic(steps in prop::collection::vec(0u32..20, 1..40)) {
            let mut driver = First;
            let mut tempo = Tempo::signal(TempoId::Signal(CommunityId::new(1)), "p", &me(), 1);
            let mut epoch = 0;
            let mut at = 1u32;
            let mut last = (0u32, 0u16);
            for step in steps {
                at += step;
                advance_tempo(&mut driver, &mut tempo, &mut epoch, at, 0).unwrap();
                prop_assert!(tempo.at >= at);
                prop_assert!(tempo.at >= last.0);
                prop_assert!(tempo.seq >= last.1);
                last = (tempo.at, tempo.seq);
            }
        }
    }
}
