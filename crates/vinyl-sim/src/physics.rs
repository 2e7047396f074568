//! The ship physics kernel: per-substep order application and motion.
//!
//! Ships layer order handling onto the plain drift every other thing
//! performs. Within a substep the sequence is fixed: jettison, then
//! shields, then turn, then thrust, then integration. Orders are
//! re-validated against current fuel as they are applied, so a tank
//! drained earlier in the turn shrinks later effects instead of
//! overdrawing.
//!
//! Thrust while docked is the departure case: the ship is teleported a
//! fixed launch distance along its heading, leaves at the full
//! acceleration it ordered, and pays nothing (movement at a station is
//! free).

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::ship::{OrderKind, ShipStat};
use crate::thing::Material;
use crate::traj::Traj;
use crate::world::World;

use std::f64::consts::PI;

/// One ship substep. `i` must hold a ship.
pub fn ship_drift(world: &mut World, i: usize, dt: f64) {
    let cfg = world.config().clone();

    if world.is_game_over() {
        // Frozen: damage flags still clear, nothing moves, orders drop.
        if let Some(t) = world.arena.get_mut(i) {
            t.drift(0.0, cfg.max_speed);
        }
        return;
    }

    {
        let Some(t) = world.arena.get_mut(i) else {
            return;
        };
        t.clear_damage();
        if t.vel.rho > cfg.max_speed {
            debug!(name = %t.name, rho = t.vel.rho, "velocity clamped");
            t.vel.rho = cfg.max_speed;
        }
        t.image_set = 0;
    }

    handle_jettison(world, i, &cfg);

    let mut out_of_fuel = false;
    {
        let Some(t) = world.arena.get_mut(i) else {
            return;
        };

        // Shields first.
        let shieldamt = t.as_ship().map_or(0.0, |s| s.order(OrderKind::Shield));
        if shieldamt > 0.0 {
            let cost = t.set_order(&cfg, OrderKind::Shield, shieldamt);
            let state = t.as_ship_mut().expect("ship payload");
            let old_fuel = state.amount(ShipStat::Fuel);
            let new_fuel = old_fuel - cost;
            state.set_amount(ShipStat::Fuel, new_fuel);
            let shield = state.amount(ShipStat::Shield);
            state.set_amount(ShipStat::Shield, shield + shieldamt);
            t.set_order(&cfg, OrderKind::Shield, 0.0);
            out_of_fuel |= old_fuel > 0.01 && new_fuel <= 0.01;
        }

        // Turning. The order persists across the turn's substeps; fuel
        // is paid per substep, scaled by dt.
        t.omega = 0.0;
        let turnamt = t.as_ship().map_or(0.0, |s| s.order(OrderKind::Turn));
        if turnamt != 0.0 {
            let cost = t.set_order(&cfg, OrderKind::Turn, turnamt);
            let state = t.as_ship_mut().expect("ship payload");
            let old_fuel = state.amount(ShipStat::Fuel);
            let new_fuel = old_fuel - cost * dt;
            state.set_amount(ShipStat::Fuel, new_fuel);
            out_of_fuel |= old_fuel > 0.01 && new_fuel <= 0.01;
            t.omega = turnamt;
            t.image_set = if turnamt < 0.0 { 3 } else { 4 };
        }

        // Thrusting.
        let thrustamt = t.as_ship().map_or(0.0, |s| s.order(OrderKind::Thrust));
        if thrustamt != 0.0 {
            let cost = t.set_order(&cfg, OrderKind::Thrust, thrustamt);
            let state = t.as_ship_mut().expect("ship payload");
            let old_fuel = state.amount(ShipStat::Fuel);
            let new_fuel = old_fuel - cost;
            state.set_amount(ShipStat::Fuel, new_fuel);
            out_of_fuel |= old_fuel > 0.01 && new_fuel <= 0.01;

            let accel = Traj::new(thrustamt, t.orient);
            let mut vel = t.vel + accel * dt;
            if vel.rho > cfg.max_speed {
                debug!(name = %t.name, rho = vel.rho, "thrust clamped");
                vel.rho = cfg.max_speed;
            }
            t.vel = vel;

            if t.as_ship().is_some_and(|s| s.docked) {
                // Departure: clear the station by a fixed launch offset
                // and leave at full acceleration.
                let off = Traj::new(cfg.launch_distance, t.orient).to_coord();
                let stored = t.as_ship().map_or(0.0, |s| s.order(OrderKind::Thrust));
                if stored > 0.0 {
                    t.pos += off;
                } else {
                    t.pos -= off;
                }
                t.vel = accel;
                t.as_ship_mut().expect("ship payload").docked = false;
            }
            t.image_set = if thrustamt < 0.0 { 2 } else { 1 };
        }

        // Integrate.
        t.pos += (t.vel * dt).to_coord();
        t.orient += t.omega * dt;
        if t.orient < -PI || t.orient > PI {
            t.orient = Traj::new(1.0, t.orient).theta;
        }
        t.omega = 0.0;
        if let Some(state) = t.as_ship_mut() {
            state.laser_reach = 0.0;
        }
    }

    if out_of_fuel {
        if let Some(t) = world.arena.get(i) {
            info!(name = %t.name, "ship ran out of fuel");
        }
    }
}

/// Execute a pending jettison order: spit out an asteroid ahead of the
/// ship, recoil, and deduct the inventory. Never fires while docked.
fn handle_jettison(world: &mut World, i: usize, cfg: &GameConfig) {
    let (amount, pos, orient, vel, ship_size, total_mass, momentum) = {
        let Some(t) = world.arena.get(i) else {
            return;
        };
        let Some(state) = t.as_ship() else {
            return;
        };
        if state.docked {
            return;
        }
        let amount = state.order(OrderKind::Jettison);
        if amount.abs() < cfg.min_mass {
            return;
        }
        (
            amount,
            t.pos,
            t.orient,
            t.vel,
            t.size(),
            t.total_mass(),
            t.momentum(),
        )
    };

    let (mass, material, stat) = if amount < 0.0 {
        (-amount, Material::Vinyl, ShipStat::Cargo)
    } else {
        (amount, Material::Uranium, ShipStat::Fuel)
    };

    let id = world.next_id();
    let mut ast = crate::asteroid::asteroid(cfg, &mut world.rng, id, mass, material);

    // Clear of the hull along the heading, moving with the ship's speed
    // down that same heading.
    let clearance = (ship_size + ast.size()) * 1.15;
    ast.pos = pos + Traj::new(clearance, orient).to_coord();
    ast.vel = Traj::new(vel.rho, orient);

    let recoil = {
        // Momentum bookkeeping before the inventory comes off: the kick
        // doubles the ejecta's momentum for a sharper recoil.
        let new_mass = total_mass - mass;
        let mut mv = momentum - ast.momentum() * 2.0;
        mv = mv / new_mass;
        if mv.rho > cfg.max_speed {
            mv.rho = cfg.max_speed;
        }
        mv
    };

    debug!(mass, ?material, "jettison");
    world.arena.queue_add(ast);

    let Some(t) = world.arena.get_mut(i) else {
        return;
    };
    t.vel = recoil;
    t.set_order(cfg, OrderKind::Jettison, 0.0);
    let state = t.as_ship_mut().expect("ship payload");
    let held = state.amount(stat);
    state.set_amount(stat, held - mass);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
