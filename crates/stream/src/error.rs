//! Error types for tmesh stream framing.

use thiserror::Error;

/// Errors that can occur while queueing stream data.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Packet exceeds what a single stream transfer may carry
    #[error("Packet of {len} bytes exceeds maximum {max}")]
    PacketTooLarge {
        /// Offered packet length
        len: usize,
        /// Largest accepted packet
        max: usize,
    },
}

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
