//! Stream tests
//!
//! A packet queued before any stream exists rides a REQUEST block, the
//! peer answers with ACCEPT, and both ends derive the same stream.

use crate::test_utils::*;
use tmesh::StreamRole;

#[test]
fn test_packet_delivered_over_stream() {
    let mut sim = simulation(2);
    let to_b = mote_of(&sim.nodes[0], &sim.nodes[1]);

    for round in 0..100u32 {
        let packet = format!("ping {}", round);
        sim.nodes[0].send(to_b, packet.as_bytes()).unwrap();
        sim.run(40);
    }

    let a = *sim.nodes[0].id();
    let mut delivered = Vec::new();
    while let Some((from, packet)) = sim.nodes[1].pipe_mut().pop() {
        assert_eq!(from, a);
        delivered.push(packet);
    }
    assert!(!delivered.is_empty(), "no packet reached b");
    assert!(delivered.iter().all(|p| p.starts_with(b"ping ")));

    // a asked, b accepted, and both share one stream secret
    let (na, nb) = (&sim.nodes[0], &sim.nodes[1]);
    let requester = &na.mote(mote_of(na, nb)).unwrap().streams()[0];
    let accepter = &nb.mote(mote_of(nb, na)).unwrap().streams()[0];
    assert_eq!(requester.role(), Some(StreamRole::Requester));
    assert_eq!(accepter.role(), Some(StreamRole::Accepter));
    assert_eq!(requester.secret(), accepter.secret());
    assert!(!accepter.lost);
}

#[test]
fn test_no_stream_without_traffic() {
    let mut sim = simulation(2);
    sim.run(1_000);

    for node in &sim.nodes {
        for mote in node.communities().flat_map(|c| c.motes()) {
            assert!(mote.streams().is_empty());
            assert!(mote.requested().is_none());
        }
        assert!(node.pipe().is_empty());
    }
}

#[test]
fn test_greeting_cached_until_stream() {
    let mut sim = simulation(2);
    sim.greet_all().unwrap();

    let (a, b) = (&sim.nodes[0], &sim.nodes[1]);
    let mote = a.mote(mote_of(a, b)).unwrap();
    assert!(mote.streams().is_empty());
    assert!(mote.cached().is_some());

    sim.run(3_000);
    let (a, b) = (&sim.nodes[0], &sim.nodes[1]);
    let mote = a.mote(mote_of(a, b)).unwrap();
    assert!(mote.cached().is_none(), "cached packet never moved to a stream");
    assert_eq!(mote.streams().len(), 1);
}
