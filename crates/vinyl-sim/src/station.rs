//! Station payload state.
//!
//! A station is an effectively immovable spinning hub. Its vinyl store is
//! the team's score; docking ships deposit their cargo into it, and enemy
//! lasers can burn score back out of it.

use vinyl_wire::{Reader, Wire, WireError, Writer, SCALAR_SIZE};

use crate::coord::Coord;
use crate::thing::{Payload, Thing};

/// Collision radius of every station.
pub const STATION_SIZE: f64 = 30.0;
/// Station mass: large enough that nothing meaningfully moves it.
pub const STATION_MASS: f64 = 99_999.9;
/// Stations spin for the observer's benefit.
pub const STATION_OMEGA: f64 = 0.9;

// ---------------------------------------------------------------------------
// StationState
// ---------------------------------------------------------------------------

/// Per-station payload state.
#[derive(Debug, Clone, Default)]
pub struct StationState {
    vinyl_store: f64,
}

impl StationState {
    /// The team's banked score, in tons of vinyl.
    #[inline]
    pub fn vinyl_store(&self) -> f64 {
        self.vinyl_store
    }

    /// Deposit vinyl; returns the new store.
    pub fn add_vinyl(&mut self, tons: f64) -> f64 {
        self.vinyl_store += tons;
        self.vinyl_store
    }

    /// Burn vinyl out of the store (laser damage), floored at zero.
    pub fn burn_vinyl(&mut self, tons: f64) -> f64 {
        self.vinyl_store = (self.vinyl_store - tons).max(0.0);
        self.vinyl_store
    }
}

/// Build a station thing for a team at `pos`.
pub fn station(id: u32, team: usize, pos: Coord) -> Thing {
    let mut t = Thing::generic(id, pos);
    t.payload = Payload::Station(StationState::default());
    t.team = Some(team);
    t.set_raw_dims(STATION_MASS, STATION_SIZE);
    t.omega = STATION_OMEGA;
    t
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Wire for StationState {
    fn serial_size(&self) -> usize {
        SCALAR_SIZE
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < self.serial_size() {
            return Err(WireError::Short {
                need: self.serial_size(),
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_scalar(self.vinyl_store)?;
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
        self.vinyl_store = r.get_scalar()?;
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
