//! Multi-node simulation driven from a [`TmeshConfig`]

use crate::air::{Air, AirStats, Node};
use crate::virtual_radio::VirtualRadio;
use serde::Serialize;
use tmesh::{Mailbox, Tmesh, TmeshResult};
use tmesh_core::{CoreResult, Hashname, TmeshConfig};
use tracing::info;

/// Nodes sharing one [`Air`].
pub struct Simulation {
    /// The shared medium
    pub air: Air,
    /// Every node, in creation order
    pub nodes: Vec<Node>,
}

/// Per-node outcome.
#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub id: String,
    pub motes: usize,
    pub synced: usize,
    pub acknowledged: usize,
    pub streams: usize,
    pub delivered: usize,
    pub overflows: u32,
}

/// Outcome of a run.
#[derive(Debug, Serialize)]
pub struct SimReport {
    pub cycles: u32,
    pub air: AirStats,
    pub nodes: Vec<NodeReport>,
}

impl Simulation {
    /// Build `config.sim.nodes` nodes that have all joined the configured
    /// communities and learned of each other through path offers. The
    /// first node takes the configured identity.
    pub fn new(config: &TmeshConfig) -> anyhow::Result<Self> {
        let ids = (0..config.sim.nodes)
            .map(|i| {
                if i == 0 {
                    config.hashname()
                } else {
                    Ok(Hashname::random())
                }
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Self::with_ids(config, &ids)?)
    }

    /// Same as [`Simulation::new`] with fixed identities.
    pub fn with_ids(config: &TmeshConfig, ids: &[Hashname]) -> TmeshResult<Self> {
        let mut nodes: Vec<Node> = ids
            .iter()
            .map(|id| Tmesh::new(*id, VirtualRadio::new(config.radio.clone()), Mailbox::new()))
            .collect();

        for node in nodes.iter_mut() {
            for community in &config.communities {
                node.join(&community.name, community.mediums)?;
            }
        }

        // every node hears every other node's path offers
        let offers: Vec<(Hashname, Vec<String>)> = nodes
            .iter()
            .map(|n| {
                let json = n.paths().iter().filter_map(|p| p.to_json().ok()).collect();
                (*n.id(), json)
            })
            .collect();
        for node in nodes.iter_mut() {
            for (peer, paths) in &offers {
                if peer == node.id() {
                    continue;
                }
                for json in paths {
                    node.on_path(peer, json);
                }
            }
        }

        info!(nodes = nodes.len(), communities = config.communities.len(), "Simulation ready");
        Ok(Self {
            air: Air::new(&config.radio),
            nodes,
        })
    }

    /// Queue a greeting from the first node to every mote it knows.
    pub fn greet_all(&mut self) -> TmeshResult<()> {
        let Some(first) = self.nodes.first_mut() else {
            return Ok(());
        };
        let greeting = format!("hello from {}", first.id().short_hex());
        let motes: Vec<_> = first
            .communities()
            .flat_map(|c| c.motes())
            .map(|m| m.id())
            .collect();
        for mote in motes {
            first.send(mote, greeting.as_bytes())?;
        }
        Ok(())
    }

    /// Advance every node by `cycles`.
    pub fn run(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.air.tick(&mut self.nodes);
        }
    }

    pub fn report(&self) -> SimReport {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let motes: Vec<_> = node.communities().flat_map(|c| c.motes()).collect();
                NodeReport {
                    id: node.id().short_hex(),
                    motes: motes.len(),
                    synced: motes.iter().filter(|m| !m.signal().lost).count(),
                    acknowledged: motes.iter().filter(|m| m.acknowledged()).count(),
                    streams: motes.iter().map(|m| m.streams().len()).sum(),
                    delivered: node.pipe().len(),
                    overflows: node.driver().overflows(),
                }
            })
            .collect();

        SimReport {
            cycles: self.air.cycle(),
            air: self.air.stats(),
            nodes,
        }
    }
}
