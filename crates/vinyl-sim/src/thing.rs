//! The `Thing` sum type -- everything floating in the game universe.
//!
//! One struct carries the shared kinematic core plus a [`Payload`]
//! variant per kind, so collision dispatch is an auditable match on
//! kind pairs instead of a class hierarchy's virtual handler (see
//! [`crate::collision`]).
//!
//! Identity: every thing gets a 32-bit cookie at creation, unique across
//! the run and preserved by copies and snapshots. `PartialEq` compares
//! cookies only -- two handles are "the same thing" when their cookies
//! match, which is exactly what the collision self-checks need.

use std::f64::consts::PI;

use vinyl_wire::{Name, Reader, Wire, WireError, Writer, BOOL_SIZE, NAME_LEN, SCALAR_SIZE, U32_SIZE};

use crate::asteroid::AsteroidState;
use crate::coord::Coord;
use crate::ship::ShipState;
use crate::station::StationState;
use crate::traj::Traj;

/// Sentinel for "no damage recorded this substep" in the damage-origin
/// angle fields.
pub const NO_DAMAGE: f64 = -123.45;

// ---------------------------------------------------------------------------
// Kinds and materials
// ---------------------------------------------------------------------------

/// Discriminant of a thing's kind, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingKind {
    Generic = 0,
    Asteroid = 1,
    Station = 2,
    Ship = 3,
}

impl ThingKind {
    /// Decode a wire discriminant; unknown values fall back to Generic.
    pub fn from_u32(v: u32) -> ThingKind {
        match v {
            1 => ThingKind::Asteroid,
            2 => ThingKind::Station,
            3 => ThingKind::Ship,
            _ => ThingKind::Generic,
        }
    }
}

/// What an asteroid is made of. Vinyl converts to cargo (and eventually
/// station score), uranium to fuel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Generic = 0,
    Vinyl = 1,
    Uranium = 2,
}

impl Material {
    /// Decode a wire discriminant; unknown values fall back to Generic.
    pub fn from_u32(v: u32) -> Material {
        match v {
            1 => Material::Vinyl,
            2 => Material::Uranium,
            _ => Material::Generic,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Per-kind state attached to the shared kinematic core.
#[derive(Debug, Clone)]
pub enum Payload {
    Generic,
    Asteroid(AsteroidState),
    Station(StationState),
    Ship(ShipState),
}

impl Payload {
    fn default_for(kind: ThingKind) -> Payload {
        match kind {
            ThingKind::Generic => Payload::Generic,
            ThingKind::Asteroid => Payload::Asteroid(AsteroidState::default()),
            ThingKind::Station => Payload::Station(StationState::default()),
            ThingKind::Ship => Payload::Ship(ShipState::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Thing
// ---------------------------------------------------------------------------

/// One object in the game universe.
#[derive(Debug, Clone)]
pub struct Thing {
    id: u32,
    pub name: Name,
    pub pos: Coord,
    pub vel: Traj,
    /// Heading, radians, `(-pi, pi]`.
    pub orient: f64,
    /// Rate of change of heading.
    pub omega: f64,
    mass: f64,
    size: f64,
    dead: bool,
    /// Angle of the last collision damage origin, or [`NO_DAMAGE`].
    pub collide_angle: f64,
    /// Angle of the last laser damage origin, or [`NO_DAMAGE`].
    pub shot_angle: f64,
    /// Owning team slot; `None` for asteroids and phantoms.
    pub team: Option<usize>,
    /// Arena slot while registered; renumbers across deep copies.
    pub world_index: Option<usize>,
    /// Sprite-set selector for the observer. No simulation effect.
    pub image_set: u32,
    pub payload: Payload,
}

impl Thing {
    /// A generic thing (placeholder or laser phantom) at a position.
    pub fn generic(id: u32, pos: Coord) -> Thing {
        Thing {
            id,
            name: Name::from_str("Generic Thing"),
            pos,
            vel: Traj::default(),
            orient: 0.0,
            omega: 0.0,
            mass: 1.0,
            size: 1.0,
            dead: false,
            collide_angle: NO_DAMAGE,
            shot_angle: NO_DAMAGE,
            team: None,
            world_index: None,
            image_set: 0,
            payload: Payload::Generic,
        }
    }

    /// A fresh thing of `kind` with that kind's default payload, for
    /// snapshot reconstruction.
    pub fn placeholder(id: u32, kind: ThingKind) -> Thing {
        let mut t = Thing::generic(id, Coord::ORIGIN);
        t.payload = Payload::default_for(kind);
        t
    }

    // -- identity and shared state ------------------------------------------

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> ThingKind {
        match self.payload {
            Payload::Generic => ThingKind::Generic,
            Payload::Asteroid(_) => ThingKind::Asteroid,
            Payload::Station(_) => ThingKind::Station,
            Payload::Ship(_) => ThingKind::Ship,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Mark dead. One-way; removal happens at the end of the substep.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Base mass (hull mass for ships).
    #[inline]
    pub fn base_mass(&self) -> f64 {
        self.mass
    }

    /// Effective mass: hull plus cargo and fuel for ships, base mass for
    /// everything else.
    pub fn total_mass(&self) -> f64 {
        match &self.payload {
            Payload::Ship(s) => self.mass + s.amount(crate::ship::ShipStat::Cargo) + s.amount(crate::ship::ShipStat::Fuel),
            _ => self.mass,
        }
    }

    #[inline]
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Set base mass; values below `min` are ignored.
    pub fn set_mass(&mut self, m: f64, min: f64) {
        if m >= min {
            self.mass = m;
        }
    }

    /// Set size; values below `min` are ignored.
    pub fn set_size(&mut self, s: f64, min: f64) {
        if s >= min {
            self.size = s;
        }
    }

    pub(crate) fn set_raw_dims(&mut self, mass: f64, size: f64) {
        self.mass = mass;
        self.size = size;
    }

    /// Reset both damage-origin angles to the sentinel.
    pub fn clear_damage(&mut self) {
        self.collide_angle = NO_DAMAGE;
        self.shot_angle = NO_DAMAGE;
    }

    // -- payload access ------------------------------------------------------

    pub fn as_ship(&self) -> Option<&ShipState> {
        match &self.payload {
            Payload::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut ShipState> {
        match &mut self.payload {
            Payload::Ship(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&AsteroidState> {
        match &self.payload {
            Payload::Asteroid(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_asteroid_mut(&mut self) -> Option<&mut AsteroidState> {
        match &mut self.payload {
            Payload::Asteroid(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_station(&self) -> Option<&StationState> {
        match &self.payload {
            Payload::Station(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_station_mut(&mut self) -> Option<&mut StationState> {
        match &mut self.payload {
            Payload::Station(s) => Some(s),
            _ => None,
        }
    }

    // -- trajectory helpers --------------------------------------------------

    /// Current linear momentum.
    pub fn momentum(&self) -> Traj {
        self.vel * self.total_mass()
    }

    /// Velocity of `other` relative to this thing.
    pub fn relative_velocity(&self, other: &Thing) -> Traj {
        other.vel - self.vel
    }

    /// Momentum of `other` in this thing's rest frame.
    pub fn relative_momentum(&self, other: &Thing) -> Traj {
        self.relative_velocity(other) * other.total_mass()
    }

    /// True when the circles overlap (never true against itself).
    pub fn overlaps(&self, other: &Thing) -> bool {
        if self == other {
            return false;
        }
        self.pos.dist_to(&other.pos) < self.size + other.size
    }

    /// Position after drifting `dt` on the current velocity.
    pub fn predict_position(&self, dt: f64) -> Coord {
        if self.vel.rho == 0.0 {
            return self.pos;
        }
        self.pos + (self.vel * dt).to_coord()
    }

    /// True when this thing's heading line passes through `other`:
    /// project a unit heading vector out to the other's distance and
    /// test whether the tip lands within the other's radius.
    pub fn is_facing(&self, other: &Thing) -> bool {
        if self == other {
            return false;
        }
        let rel = other.pos - self.pos;
        if rel == Coord::ORIGIN {
            return true;
        }
        let dist = Coord::ORIGIN.dist_to(&rel);
        let go = Traj::new(1.0, self.orient) * dist;
        let tip = Coord::ORIGIN + go.to_coord();
        tip.dist_to(&rel) <= other.size
    }

    /// Drift on current velocity and spin: the per-substep motion shared
    /// by every non-ship thing (ships layer order handling on top).
    /// Clears damage flags, clamps speed, integrates position and
    /// heading.
    pub fn drift(&mut self, dt: f64, max_speed: f64) {
        self.clear_damage();
        if self.vel.rho > max_speed {
            self.vel.rho = max_speed;
        }
        self.pos += (self.vel * dt).to_coord();
        self.orient += self.omega * dt;
        if self.orient < -PI || self.orient > PI {
            self.orient = Traj::new(1.0, self.orient).theta;
        }
    }
}

impl PartialEq for Thing {
    /// Identity comparison by cookie.
    fn eq(&self, other: &Thing) -> bool {
        self.id == other.id
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialized size of the kinematic core common to every kind.
const CORE_SIZE: usize = 3 * U32_SIZE          // kind, id, image set
    + 4 * SCALAR_SIZE                          // orient, omega, mass, size
    + BOOL_SIZE                                // dead
    + 2 * SCALAR_SIZE                          // damage angles
    + NAME_LEN
    + 4 * SCALAR_SIZE; // pos, vel

impl Wire for Thing {
    fn serial_size(&self) -> usize {
        CORE_SIZE
            + match &self.payload {
                Payload::Generic => 0,
                Payload::Asteroid(a) => a.serial_size(),
                Payload::Station(s) => s.serial_size(),
                Payload::Ship(s) => s.serial_size(),
            }
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let need = self.serial_size();
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_u32(self.kind() as u32)?;
        w.put_u32(self.id)?;
        w.put_u32(self.image_set)?;
        w.put_scalar(self.orient)?;
        w.put_scalar(self.omega)?;
        w.put_scalar(self.mass)?;
        w.put_scalar(self.size)?;
        w.put_bool(self.dead)?;
        w.put_scalar(self.collide_angle)?;
        w.put_scalar(self.shot_angle)?;
        w.put_bytes(self.name.as_bytes())?;
        let at = w.written();
        let at = at + self.pos.pack(&mut buf[at..])?;
        let at = at + self.vel.pack(&mut buf[at..])?;
        let at = at
            + match &self.payload {
                Payload::Generic => 0,
                Payload::Asteroid(a) => a.pack(&mut buf[at..])?,
                Payload::Station(s) => s.pack(&mut buf[at..])?,
                Payload::Ship(s) => s.pack(&mut buf[at..])?,
            };
        Ok(at)
    }

    fn unpack(&mut self, buf: &[u8]) -> Result<usize, WireError> {
        if buf.len() < CORE_SIZE {
            return Err(WireError::Short {
                need: CORE_SIZE,
                have: buf.len(),
            });
        }
        let mut r = Reader::new(buf);
        let kind = ThingKind::from_u32(r.get_u32()?);
        if kind != self.kind() {
            self.payload = Payload::default_for(kind);
        }
        self.id = r.get_u32()?;
        self.image_set = r.get_u32()?;
        self.orient = r.get_scalar()?;
        self.omega = r.get_scalar()?;
        self.mass = r.get_scalar()?;
        self.size = r.get_scalar()?;
        self.dead = r.get_bool()?;
        self.collide_angle = r.get_scalar()?;
        self.shot_angle = r.get_scalar()?;
        let mut name = [0u8; NAME_LEN];
        r.get_bytes(&mut name)?;
        self.name.unpack(&name)?;
        let at = r.consumed();
        let at = at + self.pos.unpack(&buf[at..])?;
        let at = at + self.vel.unpack(&buf[at..])?;
        let at = at
            + match &mut self.payload {
                Payload::Generic => 0,
                Payload::Asteroid(a) => a.unpack(&buf[at..])?,
                Payload::Station(s) => s.unpack(&buf[at..])?,
                Payload::Ship(s) => s.unpack(&buf[at..])?,
            };
        Ok(at)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
