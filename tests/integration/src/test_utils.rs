//! Test utilities for multi-node scenarios

use tmesh::MoteId;
use tmesh_core::{Hashname, TmeshConfig};
use tmesh_radio::{Node, Simulation};
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Deterministic identities, one per node.
pub fn fixed_ids(count: usize) -> Vec<Hashname> {
    (0..count)
        .map(|i| Hashname::new([i as u8 + 1; 32]))
        .collect()
}

/// `count` nodes on the default configuration with fixed identities.
pub fn simulation(count: usize) -> Simulation {
    init_tracing();
    let config = TmeshConfig::default_config();
    Simulation::with_ids(&config, &fixed_ids(count)).expect("simulation builds")
}

/// The mote `node` keeps for `peer`.
pub fn mote_of(node: &Node, peer: &Node) -> MoteId {
    node.mote_for(peer.id()).expect("peer known through path offers")
}

/// Whether `node` hears `peer` and knows `peer` hears it back.
pub fn in_sync(node: &Node, peer: &Node) -> bool {
    node.mote(mote_of(node, peer))
        .map(|m| !m.signal().lost && m.acknowledged())
        .unwrap_or(false)
}
