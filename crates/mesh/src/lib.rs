//! tmesh - privacy-preserving hop scheduling for radio meshes
//!
//! Peers that share a community name independently derive, cycle by cycle,
//! which medium, channel and window to use next. Nothing about the
//! schedule is ever sent in the clear once two peers have synchronized.
//!
//! # Core Components
//!
//! - **Tempo**: one derived hopping sequence, either a broadcast signal or
//!   a point-to-point stream
//! - **Mote**: a peer inside one community, its signal plus its streams
//! - **Community**: a named group sharing three mediums and one outbound
//!   signal
//! - **Knock**: one concrete radio operation handed to the driver
//! - **Tmesh**: the scheduler tying these together behind a [`Driver`]
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tmesh::{Driver, Knock, Mailbox, Tempo, Tmesh};
//! use tmesh_core::Hashname;
//!
//! struct Radio;
//!
//! impl Driver for Radio {
//!     fn advance(&mut self, tempo: &mut Tempo, seed: &[u8; 8]) -> bool {
//!         tempo.chan = u32::from(seed[0]) % 8;
//!         tempo.at += 4;
//!         true
//!     }
//!
//!     fn sort<'t>(&mut self, a: Option<&'t Tempo>, b: &'t Tempo) -> &'t Tempo {
//!         match a {
//!             Some(a) if a.at <= b.at => a,
//!             _ => b,
//!         }
//!     }
//!
//!     fn schedule(&mut self, _knock: &Knock) -> bool {
//!         true
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tm = Tmesh::new(Hashname::random(), Radio, Mailbox::new());
//! let community = tm.join("test", [1, 2, 3])?;
//! tm.find(community, &Hashname::random(), [1, 2, 3])?;
//! tm.schedule(1, 0)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod community;
pub mod driver;
pub mod error;
pub mod knock;
pub mod mote;
pub mod path;
pub mod pipe;
pub mod scheduler;
pub mod signal;
pub mod tempo;

pub use community::{Community, CommunityId, Mediums};
pub use driver::Driver;
pub use error::{TmeshError, TmeshResult};
pub use knock::{Completion, Knock, KnockId, KnockSlot, MAX_SYNCS};
pub use mote::{Mote, MoteId};
pub use path::PathOffer;
pub use pipe::{Mailbox, Pipe};
pub use scheduler::Tmesh;
pub use signal::{decode_signal, encode_lost_signal, encode_signal, SigBlock, Signal, SignalLayout};
pub use tempo::{signal_secret, spawned_secret, split_nonce, Seed, StreamRole, Tempo, TempoId, TempoStats};
