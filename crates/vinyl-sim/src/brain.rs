//! The AI seam: brains look at a read-only world and emit orders.
//!
//! Brains are external collaborators -- they hold no references into
//! the core and the core never calls them; a client harness walks its
//! team's ships, asks each brain to think, and applies the resulting
//! orders through the same validation path the server applies to order
//! packets.

use crate::ship::OrderKind;
use crate::world::World;

/// One ship's orders for a turn, in wire order. Fields left at zero are
/// "no order".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipOrders {
    pub shield: f64,
    pub laser: f64,
    pub thrust: f64,
    pub turn: f64,
    pub jettison: f64,
}

/// A per-ship tactical brain.
pub trait Brain {
    /// Decide this ship's orders from a read-only view of the world.
    fn think(&mut self, world: &World, team: usize, ship_num: usize) -> ShipOrders;
}

impl World {
    /// Validate and store a ship's orders in wire order, exactly as an
    /// orders packet would. Returns the total fuel the stored orders
    /// will cost this turn.
    pub fn apply_orders(&mut self, team: usize, ship_num: usize, orders: ShipOrders) -> f64 {
        let cfg = self.config().clone();
        let Some(i) = self
            .teams
            .get(team)
            .and_then(|t| t.ships.get(ship_num))
            .copied()
            .flatten()
        else {
            return 0.0;
        };
        let Some(th) = self.arena.get_mut(i) else {
            return 0.0;
        };

        let mut fuel = 0.0;
        for (kind, value) in [
            (OrderKind::Shield, orders.shield),
            (OrderKind::Laser, orders.laser),
            (OrderKind::Thrust, orders.thrust),
            (OrderKind::Turn, orders.turn),
            (OrderKind::Jettison, orders.jettison),
        ] {
            fuel += th.set_order(&cfg, kind, value);
        }
        fuel
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
