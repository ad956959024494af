//! Discovery tests
//!
//! Nodes that learned of each other through path offers start lost and
//! must find each other on the air without any shared clock.

use crate::test_utils::*;
use tmesh::Mailbox;
use tmesh_core::{Hashname, RadioConfig};
use tmesh_radio::{Air, Node, VirtualRadio};

#[test]
fn test_two_nodes_synchronize() {
    let mut sim = simulation(2);
    sim.run(1_000);

    let (a, b) = (&sim.nodes[0], &sim.nodes[1]);
    assert!(in_sync(a, b), "node a never synchronized with b");
    assert!(in_sync(b, a), "node b never synchronized with a");

    // everyone acknowledged: both signals on the regular layout
    for node in &sim.nodes {
        let community = node.communities().next().unwrap();
        assert!(!community.signal().lost);
    }

    let stats = sim.air.stats();
    assert!(stats.transmitted > 0);
    assert!(stats.received > 0);
}

#[test]
fn test_synchronized_tempos_agree() {
    let mut sim = simulation(2);
    sim.run(1_000);

    let (a, b) = (&sim.nodes[0], &sim.nodes[1]);
    assert!(in_sync(a, b));

    // a's own signal and b's copy of it hop to the same window
    let own = a.communities().next().unwrap().signal();
    let copy = b.mote(mote_of(b, a)).unwrap().signal();
    assert_eq!(own.secret(), copy.secret());
    assert_eq!(own.medium, copy.medium);
    assert_eq!((own.at, own.seq, own.chan), (copy.at, copy.seq, copy.chan));
}

#[test]
fn test_three_nodes_synchronize() {
    let mut sim = simulation(3);
    sim.run(3_000);

    for node in &sim.nodes {
        for peer in &sim.nodes {
            if node.id() == peer.id() {
                continue;
            }
            let mote = node.mote(mote_of(node, peer)).unwrap();
            assert!(
                !mote.signal().lost,
                "{} never heard {}",
                node.id().short_hex(),
                peer.id().short_hex()
            );
        }
    }

    let report = sim.report();
    assert_eq!(report.nodes.len(), 3);
    assert!(report.nodes.iter().all(|n| n.synced == 2));
}

#[test]
fn test_strangers_stay_apart() {
    init_tracing();
    let radio = RadioConfig::default();
    let node = |byte: u8, name: &str| -> Node {
        let mut tm = Node::new(
            Hashname::new([byte; 32]),
            VirtualRadio::new(radio.clone()),
            Mailbox::new(),
        );
        tm.join(name, [1, 2, 3]).unwrap();
        tm
    };
    let mut nodes = vec![node(1, "north"), node(2, "south")];

    // offers for a community the receiver never joined are ignored
    let offer = nodes[0].paths()[0].to_json().unwrap();
    let from = *nodes[0].id();
    assert!(nodes[1].on_path(&from, &offer).is_none());

    let mut air = Air::new(&radio);
    for _ in 0..200 {
        air.tick(&mut nodes);
    }
    assert!(air.stats().transmitted > 0);
    assert_eq!(air.stats().received, 0);
    for node in &nodes {
        assert_eq!(node.communities().flat_map(|c| c.motes()).count(), 0);
    }
}
