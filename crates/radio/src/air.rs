//! Simulated shared medium for several tmesh nodes
//!
//! Every cycle each node schedules, transmits go on the air, then
//! receivers are matched against them:
//!
//! - a main receive needs a transmit on the same medium, channel and
//!   start cycle from another node
//! - a seek listens across the whole medium and takes the first transmit
//!   from another node that starts after it was committed
//!
//! Receivers that hear nothing complete as missed, except seeks, which
//! keep listening.

use crate::virtual_radio::VirtualRadio;
use serde::Serialize;
use tmesh::{Completion, KnockId, KnockSlot, Mailbox, Tmesh, TmeshError};
use tmesh_core::RadioConfig;
use tracing::{debug, warn};

/// A node on the air.
pub type Node = Tmesh<VirtualRadio, Mailbox>;

/// Transmissions older than this many cycles are forgotten.
const HORIZON: u32 = 64;

#[derive(Debug, Clone, Copy)]
struct Pending {
    node: usize,
    knock: KnockId,
    since: u32,
}

#[derive(Debug, Clone)]
struct Transmission {
    node: usize,
    medium: u32,
    chan: u32,
    start: u32,
    frame: [u8; 64],
}

/// Counters across every node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AirStats {
    /// Transmits that went out
    pub transmitted: u64,
    /// Receives that validated
    pub received: u64,
    /// Receive windows with nothing heard
    pub missed: u64,
    /// Frames heard that failed validation
    pub rejected: u64,
}

/// The shared medium.
#[derive(Debug)]
pub struct Air {
    cycle: u32,
    noise_floor: i16,
    pending: Vec<Pending>,
    on_air: Vec<Transmission>,
    stats: AirStats,
}

impl Air {
    pub fn new(config: &RadioConfig) -> Self {
        Self {
            cycle: 0,
            noise_floor: config.noise_floor,
            pending: Vec::new(),
            on_air: Vec::new(),
            stats: AirStats::default(),
        }
    }

    /// Last cycle run.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn stats(&self) -> AirStats {
        self.stats
    }

    /// Run one cycle across `nodes`.
    pub fn tick(&mut self, nodes: &mut [Node]) {
        self.cycle += 1;
        let now = self.cycle;

        for (index, node) in nodes.iter_mut().enumerate() {
            if let Err(e) = node.schedule(now, 0) {
                warn!(node = index, error = %e, "Schedule failed");
            }
            for knock in node.driver_mut().take_scheduled() {
                self.pending.push(Pending {
                    node: index,
                    knock,
                    since: now,
                });
            }
        }

        self.resolve(nodes, now);
        self.on_air
            .retain(|t| t.start.saturating_add(HORIZON) >= now);
    }

    fn resolve(&mut self, nodes: &mut [Node], now: u32) {
        let mut transmits = Vec::new();
        let mut receives = Vec::new();
        let mut waiting = Vec::new();

        for pending in self.pending.drain(..) {
            let Some(knock) = nodes.get(pending.node).and_then(|n| n.knock(pending.knock)) else {
                continue;
            };
            if !knock.ready {
                continue;
            }
            if pending.knock.slot == KnockSlot::Seek {
                receives.push(pending);
            } else if knock.start > now {
                waiting.push(pending);
            } else if knock.tx {
                transmits.push(pending);
            } else {
                receives.push(pending);
            }
        }

        for pending in transmits {
            let node = &mut nodes[pending.node];
            let Some(knock) = node.knock(pending.knock) else {
                continue;
            };
            let transmission = Transmission {
                node: pending.node,
                medium: knock.medium(),
                chan: knock.chan,
                start: knock.start,
                frame: knock.frame,
            };
            let start = knock.start;
            self.on_air.push(transmission);
            self.stats.transmitted += 1;
            self.complete(node, pending, Completion::sent(start));
        }

        for pending in receives {
            let node = &mut nodes[pending.node];
            let Some(knock) = node.knock(pending.knock) else {
                continue;
            };
            let seek = pending.knock.slot == KnockSlot::Seek;
            let (medium, chan, start) = (knock.medium(), knock.chan, knock.start);

            let heard = self.on_air.iter().find(|t| {
                t.node != pending.node
                    && t.medium == medium
                    && if seek {
                        t.start >= pending.since
                    } else {
                        t.chan == chan && t.start == start
                    }
            });

            match heard {
                Some(t) => {
                    let rssi = self.rssi(t.node, pending.node);
                    let completion = Completion::received(t.frame, rssi, t.start);
                    self.complete(node, pending, completion);
                }
                None if seek => waiting.push(pending),
                None => self.complete(node, pending, Completion::missed(now)),
            }
        }

        self.pending = waiting;
    }

    fn complete(&mut self, node: &mut Node, pending: Pending, completion: Completion) {
        let tx = completion.frame.is_none() && !completion.err;
        match node.knocked(pending.knock, completion) {
            Ok(()) if tx => {}
            Ok(()) => self.stats.received += 1,
            Err(TmeshError::MissedWindow) => self.stats.missed += 1,
            Err(TmeshError::FrameValidation { tempo }) => {
                self.stats.rejected += 1;
                debug!(node = pending.node, tempo = ?tempo, "Frame rejected");
            }
            Err(e) => warn!(node = pending.node, error = %e, "Completion failed"),
        }
    }

    /// Reception level falls off with distance between node indices.
    fn rssi(&self, from: usize, to: usize) -> i16 {
        let distance = from.abs_diff(to).min(8) as i16;
        self.noise_floor + 50 - distance * 5
    }
}
