//! Delivery of reassembled application packets

use std::collections::VecDeque;
use tmesh_core::Hashname;

/// Receives every packet reassembled from a stream.
pub trait Pipe {
    /// Hand over one packet from `from`.
    fn deliver(&mut self, from: &Hashname, packet: Vec<u8>);
}

/// Collects delivered packets in arrival order.
#[derive(Debug, Default)]
pub struct Mailbox {
    packets: VecDeque<(Hashname, Vec<u8>)>,
}

impl Mailbox {
    /// Empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest undelivered packet.
    pub fn pop(&mut self) -> Option<(Hashname, Vec<u8>)> {
        self.packets.pop_front()
    }

    /// Packets waiting.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl Pipe for Mailbox {
    fn deliver(&mut self, from: &Hashname, packet: Vec<u8>) {
        self.packets.push_back((*from, packet));
    }
}
