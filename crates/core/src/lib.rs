//! Core functionality shared across the tmesh workspace.
//!
//! This crate provides the peer identity type, configuration loading,
//! structured logging bootstrap and the shared error type used by the
//! scheduling engine and its drivers.

pub mod config;
pub mod error;
pub mod hashname;
pub mod logging;

pub use config::{
    CommunityConfig, LoggingConfig, NodeConfig, RadioConfig, SimConfig, TmeshConfig,
};
pub use error::{CoreError, CoreResult};
pub use hashname::{Hashname, HASHNAME_LEN, SHORT_LEN};
