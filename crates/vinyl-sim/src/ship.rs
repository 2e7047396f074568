//! Ship state, stats, and the per-turn order contract.
//!
//! A ship carries three stats -- cargo, fuel, shield -- each with a
//! current value and a capacity. Cargo and fuel capacities share a
//! 60-ton budget that teams partition in their init packet; shield
//! capacity is effectively unbounded. Orders are validated and clamped
//! through [`Thing::set_order`], which returns the fuel the order will
//! cost this turn; the physics kernel re-validates when it applies them,
//! so a fuel level that dropped mid-turn can only shrink an order,
//! never let it overdraw.

use std::f64::consts::TAU;

use vinyl_wire::{Reader, Wire, WireError, Writer, BOOL_SIZE, SCALAR_SIZE, U32_SIZE};

use crate::config::GameConfig;
use crate::coord::{Coord, WORLD_SIZE};
use crate::thing::{Material, Payload, Thing};
use crate::traj::Traj;

/// Hull mass of every ship, excluding cargo and fuel.
pub const SHIP_BASE_MASS: f64 = 40.0;
/// Collision radius of every ship.
pub const SHIP_SIZE: f64 = 12.0;

// ---------------------------------------------------------------------------
// Orders and stats
// ---------------------------------------------------------------------------

/// Per-turn ship commands, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    /// Raise shields by the given amount (1 fuel per unit).
    Shield = 0,
    /// Fire a beam of the given length at end of turn.
    Laser = 1,
    /// Accelerate along the current heading (signed magnitude).
    Thrust = 2,
    /// Rotate by the given signed radians over the turn.
    Turn = 3,
    /// Eject tonnage: positive uranium (fuel), negative vinyl (cargo).
    Jettison = 4,
}

/// All orders, in wire order.
pub const ORDER_KINDS: [OrderKind; 5] = [
    OrderKind::Shield,
    OrderKind::Laser,
    OrderKind::Thrust,
    OrderKind::Turn,
    OrderKind::Jettison,
];

/// Ship stats, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipStat {
    Cargo = 0,
    Fuel = 1,
    Shield = 2,
}

/// All stats, in wire order.
pub const SHIP_STATS: [ShipStat; 3] = [ShipStat::Cargo, ShipStat::Fuel, ShipStat::Shield];

impl Material {
    /// The stat an asteroid of this material feeds.
    pub fn stat(self) -> Option<ShipStat> {
        match self {
            Material::Vinyl => Some(ShipStat::Cargo),
            Material::Uranium => Some(ShipStat::Fuel),
            Material::Generic => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ShipState
// ---------------------------------------------------------------------------

/// Per-ship payload state.
#[derive(Debug, Clone, Default)]
pub struct ShipState {
    /// Slot within the owning team (stable across copies).
    pub num: u32,
    /// Docked at a station: velocity pinned, immune to non-station
    /// collisions, movement orders fuel-free.
    pub docked: bool,
    /// Ship-station distance recorded at the moment of docking.
    pub dock_dist: f64,
    /// Beam reach computed by the last laser pass, for rendering.
    pub laser_reach: f64,
    orders: [f64; ORDER_KINDS.len()],
    stat_cur: [f64; SHIP_STATS.len()],
    stat_max: [f64; SHIP_STATS.len()],
}

impl ShipState {
    /// Current value of a stat.
    #[inline]
    pub fn amount(&self, st: ShipStat) -> f64 {
        self.stat_cur[st as usize]
    }

    /// Capacity of a stat.
    #[inline]
    pub fn capacity(&self, st: ShipStat) -> f64 {
        self.stat_max[st as usize]
    }

    /// Set a stat, clamped into `[0, capacity]`. Returns the new value.
    pub fn set_amount(&mut self, st: ShipStat, val: f64) -> f64 {
        let val = val.max(0.0).min(self.capacity(st));
        self.stat_cur[st as usize] = val;
        val
    }

    /// Set a stat's capacity, clamped into `[0, max_total]`. Cargo and
    /// fuel capacities share the `max_total` budget: raising one shrinks
    /// the other. Current values re-clamp to the new capacity. Returns
    /// the capacity actually set.
    pub fn set_capacity(&mut self, st: ShipStat, val: f64, max_total: f64) -> f64 {
        let val = val.clamp(0.0, max_total);
        self.stat_max[st as usize] = val;

        let over = self.capacity(ShipStat::Cargo) + self.capacity(ShipStat::Fuel) - max_total;
        if over > 0.0 {
            match st {
                ShipStat::Cargo => self.stat_max[ShipStat::Fuel as usize] -= over,
                ShipStat::Fuel => self.stat_max[ShipStat::Cargo as usize] -= over,
                ShipStat::Shield => {}
            }
        }

        if self.amount(st) > self.capacity(st) {
            self.stat_cur[st as usize] = self.capacity(st);
        }
        self.capacity(st)
    }

    /// Stored value of an order.
    #[inline]
    pub fn order(&self, ord: OrderKind) -> f64 {
        self.orders[ord as usize]
    }

    pub(crate) fn store_order(&mut self, ord: OrderKind, val: f64) {
        self.orders[ord as usize] = val;
    }

    /// Zero all orders and the rendered beam reach.
    pub fn clear_orders(&mut self) {
        self.laser_reach = 0.0;
        self.orders = [0.0; ORDER_KINDS.len()];
    }

    /// Would an asteroid of this mass and material fit in the matching
    /// stat's remaining headroom?
    pub fn asteroid_fits(&self, mass: f64, material: Material) -> bool {
        match material.stat() {
            Some(st) => mass + self.amount(st) <= self.capacity(st),
            None => false,
        }
    }
}

/// Build a ship thing docked at `pos`.
pub fn ship(cfg: &GameConfig, id: u32, team: usize, num: u32, pos: Coord) -> Thing {
    let state = ShipState {
        num,
        docked: true,
        dock_dist: 30.0,
        laser_reach: 0.0,
        orders: [0.0; ORDER_KINDS.len()],
        stat_cur: [0.0, 30.0, 30.0],
        stat_max: [30.0, 30.0, cfg.shield_capacity],
    };

    let mut t = Thing::generic(id, pos);
    t.payload = Payload::Ship(state);
    t.team = Some(team);
    t.set_raw_dims(SHIP_BASE_MASS, SHIP_SIZE);
    t
}

// ---------------------------------------------------------------------------
// Order validation
// ---------------------------------------------------------------------------

impl Thing {
    /// Validate, clamp, and store an order on a ship, returning the fuel
    /// the stored order will cost this turn. Non-ships ignore orders.
    ///
    /// Exclusivity: thrust, turn, and jettison cancel each other; shield
    /// and laser are independent of movement. Movement is fuel-free
    /// while docked; laser while docked stores zero.
    pub fn set_order(&mut self, cfg: &GameConfig, ord: OrderKind, value: f64) -> f64 {
        let orient = self.orient;
        let vel = self.vel;
        let total_mass = self.total_mass();
        let base_mass = self.base_mass();
        let max_speed = cfg.max_speed;
        let min_mass = cfg.min_mass;

        let Some(state) = self.as_ship_mut() else {
            return 0.0;
        };
        let mut value = value;
        let maxfuel = if state.docked {
            state.capacity(ShipStat::Fuel)
        } else {
            state.amount(ShipStat::Fuel)
        };

        match ord {
            OrderKind::Shield => {
                // Shields only go up.
                if value < 0.0 {
                    value = 0.0;
                }
                if value + state.amount(ShipStat::Shield) > state.capacity(ShipStat::Shield) {
                    value = state.capacity(ShipStat::Shield) - state.amount(ShipStat::Shield);
                }
                let mut cost = value;
                if cost > state.amount(ShipStat::Fuel) {
                    cost = state.amount(ShipStat::Fuel);
                    value = cost;
                }
                state.store_order(OrderKind::Shield, value);
                cost
            }

            OrderKind::Laser => {
                if value < 0.0 {
                    value = 0.0;
                }
                if state.docked {
                    state.store_order(OrderKind::Laser, 0.0);
                    return 0.0;
                }
                if value > WORLD_SIZE / 2.0 {
                    value = WORLD_SIZE / 2.0;
                }
                let mut cost = value / cfg.laser_fuel_divisor;
                if cost > state.amount(ShipStat::Fuel) {
                    cost = state.amount(ShipStat::Fuel);
                    value = cost * cfg.laser_fuel_divisor;
                }
                state.store_order(OrderKind::Laser, value);
                cost
            }

            OrderKind::Thrust => {
                if value == 0.0 {
                    return 0.0;
                }
                state.store_order(OrderKind::Turn, 0.0);
                state.store_order(OrderKind::Jettison, 0.0);

                // Measure the delta-v actually achievable under the speed
                // cap, preserving the request's sign.
                let mut acc = Traj::new(value, orient) + vel;
                if acc.rho > max_speed {
                    acc.rho = max_speed;
                }
                let acc = acc - vel;
                value = if value <= 0.0 { -acc.rho } else { acc.rho };

                // 1 ton of fuel accelerates a naked hull from zero to
                // 6 * max_speed.
                let mut cost = value.abs() * total_mass / (6.0 * max_speed * base_mass);
                if cost > maxfuel {
                    cost = maxfuel;
                    let clamped = cost * 6.0 * max_speed * base_mass / total_mass;
                    value = if value <= 0.0 { -clamped } else { clamped };
                }
                if state.docked {
                    cost = 0.0;
                }
                state.store_order(OrderKind::Thrust, value);
                cost
            }

            OrderKind::Turn => {
                if value == 0.0 {
                    return 0.0;
                }
                state.store_order(OrderKind::Thrust, 0.0);
                state.store_order(OrderKind::Jettison, 0.0);

                // 1 ton of fuel rotates a naked hull full-circle six times.
                let mut cost = value.abs() * total_mass / (6.0 * TAU * base_mass);
                if state.docked {
                    cost = 0.0;
                }
                if cost > maxfuel {
                    cost = maxfuel;
                    let clamped = base_mass * 6.0 * TAU * cost / total_mass;
                    value = if value <= 0.0 { -clamped } else { clamped };
                }
                state.store_order(OrderKind::Turn, value);
                cost
            }

            OrderKind::Jettison => {
                let requested = value.abs();
                if requested < min_mass {
                    state.store_order(OrderKind::Jettison, 0.0);
                    return 0.0;
                }
                state.store_order(OrderKind::Thrust, 0.0);
                state.store_order(OrderKind::Turn, 0.0);

                let is_fuel = value > 0.0;
                let stat = if is_fuel { ShipStat::Fuel } else { ShipStat::Cargo };
                let actual = requested.min(state.amount(stat));
                if is_fuel {
                    state.store_order(OrderKind::Jettison, actual);
                    actual
                } else {
                    state.store_order(OrderKind::Jettison, -actual);
                    0.0
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Wire for ShipState {
    fn serial_size(&self) -> usize {
        U32_SIZE + BOOL_SIZE + 2 * SCALAR_SIZE + (ORDER_KINDS.len() + 2 * SHIP_STATS.len()) * SCALAR_SIZE
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < self.serial_size() {
            return Err(WireError::Short {
                need: self.serial_size(),
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_u32(self.num)?;
        w.put_bool(self.docked)?;
        w.put_scalar(self.dock_dist)?;
        w.put_scalar(self.laser_reach)?;
        for v in self.orders {
            w.put_scalar(v)?;
        }
        for i in 0..SHIP_STATS.len() {
            w.put_scalar(self.stat_cur[i])?;
            w.put_scalar(self.stat_max[i])?;
        }
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
        self.num = r.get_u32()?;
        self.docked = r.get_bool()?;
        self.dock_dist = r.get_scalar()?;
        self.laser_reach = r.get_scalar()?;
        for v in self.orders.iter_mut() {
            *v = r.get_scalar()?;
        }
        for i in 0..SHIP_STATS.len() {
            self.stat_cur[i] = r.get_scalar()?;
            self.stat_max[i] = r.get_scalar()?;
        }
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ship(docked: bool) -> Thing {
        let cfg = GameConfig::default();
        let mut t = ship(&cfg, 1, 0, 0, Coord::ORIGIN);
        t.as_ship_mut().unwrap().docked = docked;
        t
    }

    #[test]
    fn capacity_budget_is_shared() {
        let mut s = ShipState::default();
        s.set_capacity(ShipStat::Cargo, 30.0, 60.0);
        s.set_capacity(ShipStat::Fuel, 30.0, 60.0);
        assert_eq!(s.capacity(ShipStat::Cargo), 30.0);

        // Raising cargo past the budget eats fuel capacity.
        s.set_capacity(ShipStat::Cargo, 45.0, 60.0);
        assert_eq!(s.capacity(ShipStat::Cargo), 45.0);
        assert_eq!(s.capacity(ShipStat::Fuel), 15.0);
    }

    #[test]
    fn set_amount_clamps_to_capacity_and_zero() {
        let mut s = ShipState::default();
        s.set_capacity(ShipStat::Fuel, 30.0, 60.0);
        assert_eq!(s.set_amount(ShipStat::Fuel, 99.0), 30.0);
        assert_eq!(s.set_amount(ShipStat::Fuel, -5.0), 0.0);
    }

    #[test]
    fn shield_order_clamps_to_fuel() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        // 30 fuel on board; asking for 100 shield pays and stores 30.
        let cost = t.set_order(&cfg, OrderKind::Shield, 100.0);
        assert_eq!(cost, 30.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Shield), 30.0);
    }

    #[test]
    fn negative_shield_order_is_ignored() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        assert_eq!(t.set_order(&cfg, OrderKind::Shield, -10.0), 0.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Shield), 0.0);
    }

    #[test]
    fn laser_while_docked_stores_zero() {
        let cfg = GameConfig::default();
        let mut t = test_ship(true);
        assert_eq!(t.set_order(&cfg, OrderKind::Laser, 200.0), 0.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Laser), 0.0);
    }

    #[test]
    fn laser_clamps_to_half_world_and_fuel() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        // 30 fuel buys 1500 units, but the beam caps at 512.
        let cost = t.set_order(&cfg, OrderKind::Laser, 9000.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Laser), 512.0);
        assert!((cost - 512.0 / 50.0).abs() < 1e-12);

        // With 2 fuel the beam shrinks to what fuel buys.
        t.as_ship_mut().unwrap().set_amount(ShipStat::Fuel, 2.0);
        let cost = t.set_order(&cfg, OrderKind::Laser, 400.0);
        assert_eq!(cost, 2.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Laser), 100.0);
    }

    #[test]
    fn docked_thrust_is_free_but_tank_bounded() {
        let cfg = GameConfig::default();
        let mut t = test_ship(true);
        let cost = t.set_order(&cfg, OrderKind::Thrust, 25.0);
        assert_eq!(cost, 0.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Thrust), 25.0);
    }

    #[test]
    fn thrust_zeroes_turn_and_jettison() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        t.set_order(&cfg, OrderKind::Turn, 1.0);
        t.set_order(&cfg, OrderKind::Thrust, 5.0);
        let s = t.as_ship().unwrap();
        assert_eq!(s.order(OrderKind::Turn), 0.0);
        assert!(s.order(OrderKind::Thrust) > 0.0);
    }

    #[test]
    fn thrust_cost_follows_the_mass_ratio() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        let cost = t.set_order(&cfg, OrderKind::Thrust, 18.0);
        // total mass 70 (hull 40 + fuel 30), naked hull 40.
        let expect = 18.0 * 70.0 / (6.0 * 30.0 * 40.0);
        assert!((cost - expect).abs() < 1e-12);
    }

    #[test]
    fn jettison_clamps_to_inventory_and_rejects_dust() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        t.as_ship_mut().unwrap().set_amount(ShipStat::Cargo, 10.0);

        // Vinyl jettison beyond inventory clamps to what is held.
        assert_eq!(t.set_order(&cfg, OrderKind::Jettison, -25.0), 0.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Jettison), -10.0);

        // Below min_mass is rejected outright.
        t.set_order(&cfg, OrderKind::Jettison, 2.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Jettison), 0.0);

        // Uranium jettison reports the fuel leaving the tank.
        assert_eq!(t.set_order(&cfg, OrderKind::Jettison, 12.0), 12.0);
        assert_eq!(t.as_ship().unwrap().order(OrderKind::Jettison), 12.0);
    }

    #[test]
    fn wire_round_trip() {
        let cfg = GameConfig::default();
        let mut t = test_ship(false);
        t.set_order(&cfg, OrderKind::Thrust, 10.0);
        let s = t.as_ship().unwrap().clone();

        let mut buf = vec![0u8; s.serial_size()];
        assert_eq!(s.pack(&mut buf).unwrap(), buf.len());
        let mut back = ShipState::default();
        assert_eq!(back.unpack(&buf).unwrap(), buf.len());
        assert_eq!(back.order(OrderKind::Thrust), s.order(OrderKind::Thrust));
        assert_eq!(back.capacity(ShipStat::Shield), s.capacity(ShipStat::Shield));
    }
}
