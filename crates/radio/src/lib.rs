//! tmesh Radio
//!
//! A software stand-in for radio hardware: [`VirtualRadio`] implements the
//! driver contract, [`Air`] plays the shared medium between several
//! nodes, and [`Simulation`] wires both up from configuration.

pub mod air;
pub mod sim;
pub mod virtual_radio;

pub use air::{Air, AirStats, Node};
pub use sim::{NodeReport, SimReport, Simulation};
pub use virtual_radio::VirtualRadio;
