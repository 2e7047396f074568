//! Vinyl wire -- the byte-level codec for the Vinyl Frontier protocol.
//!
//! Every scalar that crosses the network is big-endian and fixed width:
//! `u32` as four bytes, `bool` as a `u32` 0/1, and `f64` as a big-endian
//! `i32` holding `round(v * 1000)`. The fixed-point encoding trades one
//! millimeter of precision for platform-independent reproducibility --
//! two simulations that exchange snapshots must agree bit-for-bit.
//!
//! The crate provides:
//!
//! - [`codec`]: the scalar encoding, bounds-checked [`Writer`]/[`Reader`]
//!   cursors, and the [`Wire`] trait every serializable entity implements.
//! - [`name`]: fixed-width NUL-padded text buffers (entity names, team
//!   names, team messages, the announcer feed).
//! - [`frames`]: the control strings and structural constants of the
//!   TCP handshake and snapshot framing.
//!
//! # Quick Start
//!
//! ```
//! use vinyl_wire::{Reader, Writer};
//!
//! let mut buf = [0u8; 8];
//! let mut w = Writer::new(&mut buf);
//! w.put_scalar(1.5).unwrap();
//! w.put_u32(7).unwrap();
//!
//! let mut r = Reader::new(&buf);
//! assert_eq!(r.get_scalar().unwrap(), 1.5);
//! assert_eq!(r.get_u32().unwrap(), 7);
//! ```

pub mod codec;
pub mod frames;
pub mod name;

pub use codec::{decode_scalar, encode_scalar, Reader, Wire, Writer, BOOL_SIZE, SCALAR_SIZE, U32_SIZE};
pub use name::{FixedText, AnnouncerText, Name, TeamName, TeamText, ANNOUNCER_LEN, NAME_LEN, TEAM_NAME_LEN, TEAM_TEXT_LEN};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while packing or unpacking wire data.
///
/// All format errors are recoverable only at the framing layer (drop the
/// connection); partial decodes are never exposed.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer is smaller than the record being read or written.
    #[error("wire buffer too short: need {need} bytes, have {have}")]
    Short {
        need: usize,
        have: usize,
    },

    /// A thing record did not start with the structural marker.
    #[error("record marker mismatch: found {found}, expected {}", frames::RECORD_MARKER)]
    Marker {
        found: u32,
    },

    /// A snapshot length header exceeded the largest plausible world.
    #[error("implausible snapshot length {len} (limit {limit})")]
    Header {
        len: u32,
        limit: u32,
    },
}
