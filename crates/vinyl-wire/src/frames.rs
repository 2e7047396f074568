//! Control strings and structural constants of the TCP protocol.
//!
//! Every TCP payload is length-free except world snapshots, which are
//! prefixed with a big-endian `u32` byte length. Control strings are
//! exact byte sequences; the two hello strings are deliberately the same
//! length so the server can classify a client from a single fixed-size
//! read.

/// Server -> client: connection acknowledged.
pub const SERVER_ACK: &[u8] = b"Conn MM4 Serv";

/// Client -> server: "I am a team" (fixed length 15).
pub const TEAM_HELLO: &[u8] = b"Team  Connected";

/// Client -> server: "I am the observer" (fixed length 15).
pub const OBSERVER_HELLO: &[u8] = b"Observer Conned";

/// Observer -> server: world acknowledged (also answers pause/resume).
pub const OBSERVER_ACK: &[u8] = b"ObReady!";

/// Observer -> server: freeze the turn loop.
pub const PAUSE: &[u8] = b"PAUSE";

/// Observer -> server: resume the turn loop.
pub const RESUME: &[u8] = b"RESUME";

/// Server -> observer: observer accepted (single dummy byte, eases
/// client-side parsing).
pub const OBSERVER_ACCEPTED: u8 = b'X';

/// Structural sanity marker preceding every thing record in a snapshot.
pub const RECORD_MARKER: u32 = 666;

const _: () = assert!(TEAM_HELLO.len() == OBSERVER_HELLO.len());
