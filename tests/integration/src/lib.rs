//! Integration tests for tmesh nodes sharing a simulated medium
//!
//! This test suite validates:
//! - Peer discovery through lost-layout signals and wide listens
//! - Mutual acknowledgement switching signals to the regular layout
//! - Stream handshakes and packet delivery between peers

pub mod test_utils;

#[cfg(test)]
mod discovery_tests;

#[cfg(test)]
mod stream_tests;
