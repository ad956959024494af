//! tmesh Stream
//!
//! Moves variable-length application packets over a stream tempo by
//! cutting them into fixed 64-byte frames and reassembling them on the
//! far side. Scrambling the frames is the tempo's job; this crate only
//! sees plaintext.

#![warn(missing_docs)]

pub mod error;
pub mod frames;

pub use error::{StreamError, StreamResult};
pub use frames::{Frames, FRAME_LEN, MAX_PACKET, PAYLOAD_LEN};
