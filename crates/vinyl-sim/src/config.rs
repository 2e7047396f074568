//! Immutable game constants, threaded through the core.
//!
//! Constants are a value constructed once at startup and passed by
//! reference -- never mutable process-wide state. The world square
//! itself is a protocol constant and lives in [`crate::coord`].

use serde::Deserialize;

use crate::coord::Coord;
use crate::SimError;

/// Tunable simulation constants.
///
/// `Default` yields the contest values. The server may load overrides
/// from a JSON file; [`validate`](GameConfig::validate) rejects values
/// that would break the turn structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// In-game seconds per turn. The world is published to clients once
    /// per turn.
    pub turn_duration: f64,
    /// In-game seconds per physics substep. Thrust and turn orders spread
    /// their effect evenly over the substeps of a turn.
    pub physics_dt: f64,
    /// Velocity magnitude cap for every moving thing, units per second.
    pub max_speed: f64,
    /// Total in-game seconds before the game ends.
    pub game_duration: f64,
    /// Smallest asteroid mass; fragments below this are dust and are not
    /// spawned.
    pub min_mass: f64,
    /// Smallest thing size.
    pub min_size: f64,
    /// Distance a docked ship is launched along its heading when it
    /// thrusts away (station radius + 1.5 ship radii).
    pub launch_distance: f64,
    /// Cap on the sum of a ship's cargo and fuel capacities.
    pub max_stat_total: f64,
    /// Shield capacity (effectively unbounded).
    pub shield_capacity: f64,
    /// Shield level applied when a team's init packet is accepted.
    pub initial_shield: f64,
    /// Beam units bought per ton of fuel.
    pub laser_fuel_divisor: f64,
    /// Phantom mass per unit of remaining beam length at impact.
    pub laser_mass_scale: f64,
    /// Phantom mass below which an asteroid shrugs the beam off.
    pub laser_shatter_mass: f64,
    /// Seed asteroid counts and mass.
    pub starting_vinyl: u32,
    pub starting_uranium: u32,
    pub starting_asteroid_mass: f64,
    /// Wall-clock seconds a team may think in a single turn before that
    /// turn's orders are ignored.
    pub turn_think_limit: f64,
    /// Cumulative wall-clock seconds a team may think before its
    /// connection is severed.
    pub total_think_limit: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_duration: 1.0,
            physics_dt: 0.2,
            max_speed: 30.0,
            game_duration: 300.0,
            min_mass: 3.0,
            min_size: 1.0,
            launch_distance: 48.0,
            max_stat_total: 60.0,
            shield_capacity: 8000.0,
            initial_shield: 15.0,
            laser_fuel_divisor: 50.0,
            laser_mass_scale: 30.0,
            laser_shatter_mass: 1000.0,
            starting_vinyl: 5,
            starting_uranium: 5,
            starting_asteroid_mass: 40.0,
            turn_think_limit: 60.0,
            total_think_limit: 300.0,
        }
    }
}

impl GameConfig {
    /// Reject configurations that cannot drive a coherent turn loop.
    pub fn validate(&self) -> Result<(), SimError> {
        let fail = |reason: &str| {
            Err(SimError::Config {
                reason: reason.to_owned(),
            })
        };
        if !(self.physics_dt > 0.0 && self.physics_dt.is_finite()) {
            return fail("physics_dt must be positive and finite");
        }
        if self.turn_duration < self.physics_dt {
            return fail("turn_duration must be at least one physics_dt");
        }
        if !(self.max_speed > 0.0) {
            return fail("max_speed must be positive");
        }
        if !(self.game_duration > 0.0) {
            return fail("game_duration must be positive");
        }
        if !(self.min_mass > 0.0) {
            return fail("min_mass must be positive");
        }
        Ok(())
    }

    /// Substeps per turn.
    pub fn substeps_per_turn(&self) -> u32 {
        (self.turn_duration / self.physics_dt).round() as u32
    }

    /// Station spawn point for a team slot: the four half-quadrant
    /// centers, then the origin for any overflow slot.
    pub fn spawn_coord(&self, slot: usize) -> Coord {
        match slot {
            0 => Coord::new(-256.0, -256.0),
            1 => Coord::new(256.0, 256.0),
            2 => Coord::new(-256.0, 256.0),
            3 => Coord::new(256.0, -256.0),
            _ => Coord::new(0.0, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_contest_values() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.turn_duration, 1.0);
        assert_eq!(cfg.physics_dt, 0.2);
        assert_eq!(cfg.max_speed, 30.0);
        assert_eq!(cfg.substeps_per_turn(), 5);
        cfg.validate().unwrap();
    }

    #[test]
    fn bad_dt_is_rejected() {
        let cfg = GameConfig {
            physics_dt: 0.0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn spawn_coords_are_half_quadrant_centers() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.spawn_coord(0), Coord::new(-256.0, -256.0));
        assert_eq!(cfg.spawn_coord(1), Coord::new(256.0, 256.0));
        assert_eq!(cfg.spawn_coord(2), Coord::new(-256.0, 256.0));
        assert_eq!(cfg.spawn_coord(3), Coord::new(256.0, -256.0));
        assert_eq!(cfg.spawn_coord(9), Coord::new(0.0, 0.0));
    }
}
