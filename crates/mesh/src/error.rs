//! Error types for tmesh scheduling and frame handling.
//!
//! Only [`TmeshError::Allocation`] means an object could not be created;
//! everything else aborts the single call that hit it and is retried or
//! ignored on the next cycle.

use crate::tempo::TempoId;
use thiserror::Error;

/// Errors that can occur in tmesh operations.
#[derive(Debug, Error)]
pub enum TmeshError {
    /// A required argument was missing or out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An object could not be constructed (driver refused it, or ids ran out)
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// A received frame failed its integrity check
    #[error("Frame validation failed on {tempo:?}")]
    FrameValidation {
        /// Tempo whose bad-frame counter was bumped
        tempo: TempoId,
    },

    /// The driver declined `advance` or `schedule`
    #[error("Driver failure: {0}")]
    Driver(String),

    /// A knock completed without hitting its radio window
    #[error("Knock missed its window")]
    MissedWindow,

    /// No community with this handle
    #[error("Community not found")]
    CommunityNotFound,

    /// No mote with this handle
    #[error("Mote not found")]
    MoteNotFound,

    /// A community with this name already exists on different mediums
    #[error("Community {name} already joined on other mediums")]
    DuplicateCommunity {
        /// Community name
        name: String,
    },
}

impl TmeshError {
    /// Whether the object the call was building must be considered unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TmeshError::Allocation(_))
    }
}

/// Result type for tmesh operations.
pub type TmeshResult<T> = Result<T, TmeshError>;
