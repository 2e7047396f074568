//! Team records: a station, up to four ships, and a message buffer.
//!
//! Teams do not own their things -- the arena does. A team holds slot
//! indices, which the world keeps in sync as things are placed and
//! swept. Team number and in-team ship number are the only identities
//! stable across deep copies; the indices renumber.

use vinyl_wire::{TeamName, TeamText};

/// Ships per team. The wire format reserves exactly this many order
/// slots per team record whether or not the ships are alive.
pub const MAX_SHIPS: usize = 4;

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// One competing team.
#[derive(Debug, Clone)]
pub struct Team {
    /// Team number as carried on the wire (normally the slot index).
    pub number: u32,
    pub name: TeamName,
    /// Free-text message from the team's last orders packet; cleared
    /// each turn after broadcast.
    pub message: TeamText,
    /// Arena slot of the team's station.
    pub station: Option<usize>,
    /// Arena slots of the team's ships, by ship number. `None` once a
    /// ship is destroyed.
    pub ships: [Option<usize>; MAX_SHIPS],
    /// How many ship slots this team plays with.
    pub ship_count: usize,
}

impl Team {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            name: TeamName::from_str(&format!("Team#{number}")),
            message: TeamText::new(),
            station: None,
            ships: [None; MAX_SHIPS],
            ship_count: MAX_SHIPS,
        }
    }

    /// Ship slot indices in ship-number order, skipping destroyed ships.
    pub fn live_ships(&self) -> impl Iterator<Item = usize> + '_ {
        self.ships[..self.ship_count].iter().flatten().copied()
    }
}
