//! Vinyl server -- the authoritative game server for the Vinyl
//! Frontier.
//!
//! A single-threaded cooperative loop drives [`vinyl_sim`] in lockstep
//! with the clients: receive one orders packet per team, run a turn
//! (five physics substeps plus the laser pass), serialize and broadcast
//! the world, wait on the observer's acknowledgement, and repeat until
//! game time runs out. The loop suspends only while waiting on client
//! orders, on the observer, and on socket writes; clients never share
//! state with the simulation outside the framed messages.

pub mod journal;
pub mod net;
pub mod server;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the transport and turn-loop plumbing.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket-level failure.
    #[error("transport failure: {0}")]
    Io(#[from] std::io::Error),

    /// A client sent bytes the codec rejected.
    #[error("malformed packet: {0}")]
    Wire(#[from] vinyl_wire::WireError),

    /// The simulation rejected a request.
    #[error("simulation rejected request: {0}")]
    Sim(#[from] vinyl_sim::SimError),
}
