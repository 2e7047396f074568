//! Asteroid payload state and spawning.
//!
//! An asteroid's size follows its mass (`3 + 1.6 * sqrt(mass)`), it spins
//! at 1 rad/s, and it spawns with a random drift velocity from the
//! world's seeded RNG. The `eaten_by` claim exists only within a single
//! collision resolution step: the first ship to ingest an asteroid marks
//! it so a second ship overlapping in the same substep cannot double-eat
//! it. The claim is never serialized and never survives the substep.

use rand::Rng;
use vinyl_wire::{Reader, Wire, WireError, Writer, U32_SIZE};

use crate::config::GameConfig;
use crate::coord::Coord;
use crate::thing::{Material, Payload, Thing};
use crate::traj::Traj;

// ---------------------------------------------------------------------------
// AsteroidState
// ---------------------------------------------------------------------------

/// Per-asteroid payload state.
#[derive(Debug, Clone)]
pub struct AsteroidState {
    pub material: Material,
    /// Cookie of the ship that claimed this asteroid during the current
    /// collision resolution step. Transient; not on the wire.
    pub eaten_by: Option<u32>,
}

impl Default for AsteroidState {
    fn default() -> Self {
        Self {
            material: Material::Generic,
            eaten_by: None,
        }
    }
}

/// Build an asteroid thing of `mass` tons at the origin with a random
/// drift velocity. Masses below the dust threshold are raised to it.
pub fn asteroid(
    cfg: &GameConfig,
    rng: &mut impl Rng,
    id: u32,
    mass: f64,
    material: Material,
) -> Thing {
    let mass = mass.max(cfg.min_mass);

    let mut t = Thing::generic(id, Coord::ORIGIN);
    t.payload = Payload::Asteroid(AsteroidState {
        material,
        eaten_by: None,
    });

    t.name.set(&match material {
        Material::Vinyl => format!("Vinyl {mass:.1}"),
        Material::Uranium => format!("Urnm {mass:.1}"),
        Material::Generic => format!("Astrd {mass:.1}"),
    });

    t.image_set = if mass >= 40.0 {
        0
    } else if mass >= 10.0 {
        1
    } else {
        2
    };
    if material == Material::Uranium {
        t.image_set += 3;
    }

    t.omega = 1.0;
    t.set_raw_dims(mass, 3.0 + 1.6 * mass.sqrt());

    let theta = rng.gen::<f64>() * std::f64::consts::TAU - std::f64::consts::PI;
    let rho = (1.0 - rng.gen::<f64>()) * cfg.max_speed;
    t.vel = Traj::new(rho, theta);
    t
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Wire for AsteroidState {
    fn serial_size(&self) -> usize {
        U32_SIZE
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < self.serial_size() {
            return Err(WireError::Short {
                need: self.serial_size(),
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_u32(self.material as u32)?;
        Ok(w.written())
    }

    fn unpack(&mut self, buf: &[u8]) -> Result<usize, WireError> {
        if buf.len() < self.serial_size() {
            return Err(WireError::Short {
                need: self.serial_size(),
                have: buf.len(),
            });
        }
        let mut r = Reader::new(buf);
        self.material = Material::from_u32(r.get_u32()?);
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
