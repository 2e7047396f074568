//! Vinyl sim -- the authoritative simulation core of MechMania IV:
//! The Vinyl Frontier.
//!
//! Competing fleets gather vinyl asteroids on a wrapped 2D plane and haul
//! them home while interfering with each other. This crate is the piece
//! every conforming implementation must reproduce bit-for-bit: the
//! toroidal algebra, the entity arena, the per-turn physics and collision
//! rules, the end-of-turn laser pass, and the snapshot codec that clients
//! decode.
//!
//! # Determinism Guarantee
//!
//! Given the same [`GameConfig`](config::GameConfig), the same RNG seed,
//! and the same per-turn order packets, two simulations produce identical
//! snapshots byte-for-byte. This is guaranteed by:
//!
//! - Fixed iteration order everywhere (ascending arena slot order for
//!   things, team order then ship order for team-controlled things).
//! - Deferred mutation: things spawned or killed during substep `k`
//!   appear/disappear only at the end of `k`, never mid-step.
//! - A seeded [`rand_pcg`] generator owned by the world -- no global RNG.
//! - The fixed-point wire scalar encoding (see [`vinyl_wire`]).
//!
//! Verify with [`World::state_hash`](world::World::state_hash), a BLAKE3
//! digest of the packed snapshot.
//!
//! # Quick Start
//!
//! ```
//! use vinyl_sim::prelude::*;
//!
//! let mut world = World::new(GameConfig::default(), 2, 0xC0FFEE);
//! world.create_asteroids(Material::Vinyl, 5, 40.0);
//! world.create_asteroids(Material::Uranium, 5, 40.0);
//! world.settle();
//!
//! // One full game turn: five physics substeps, then the laser pass.
//! for _ in 0..5 {
//!     world.physics_step(0.2);
//! }
//! world.laser_pass();
//! assert!((world.game_time() - 1.0).abs() < 1e-9);
//! ```

pub mod arena;
pub mod asteroid;
pub mod brain;
pub mod collision;
pub mod config;
pub mod coord;
pub mod laser;
pub mod physics;
pub mod ship;
pub mod snapshot;
pub mod station;
pub mod team;
pub mod thing;
pub mod traj;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by simulation-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A snapshot or packet failed to encode/decode.
    #[error("snapshot codec failure: {0}")]
    Wire(#[from] vinyl_wire::WireError),

    /// A team slot outside the world's team vector was referenced.
    #[error("team slot {slot} out of range (world has {teams} teams)")]
    BadTeamSlot {
        slot: usize,
        teams: usize,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {reason}")]
    Config {
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::{Arena, MAX_THINGS};
    pub use crate::brain::{Brain, ShipOrders};
    pub use crate::config::GameConfig;
    pub use crate::coord::{Coord, WORLD_MAX, WORLD_MIN, WORLD_SIZE};
    pub use crate::ship::{OrderKind, ShipStat};
    pub use crate::team::{Team, MAX_SHIPS};
    pub use crate::thing::{Material, Payload, Thing, ThingKind, NO_DAMAGE};
    pub use crate::traj::Traj;
    pub use crate::world::World;
    pub use crate::SimError;
    pub use vinyl_wire::Wire;
}
