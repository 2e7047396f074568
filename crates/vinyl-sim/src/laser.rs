//! The end-of-turn laser pass.
//!
//! Lasers are not persistent world objects. Once per turn, after the
//! turn's physics substeps, each ship with a positive laser order
//! synthesizes a transient phantom thing (kind Generic) one unit short
//! of its target along the beam, with mass encoding the remaining beam
//! power at impact:
//!
//! ```text
//! mass = laser_mass_scale * (L - D)
//! ```
//!
//! where `L` is the beam length and `D` the shooter-to-impact distance.
//! The phantom is delivered through the normal collision rules and
//! discarded; it never enters the arena. This is why asteroids demand
//! at least 1000 units of phantom mass to shatter.
//!
//! The beam length is the `set_order`-validated value: the raw client
//! order is clamped (fuel, world extent, docked-means-zero) before the
//! beam is computed, and fuel is charged for the clamped value.
//! Validation must come first -- firing the raw value and validating
//! afterwards would let a client buy unclamped damage at the clamped
//! price.

use tracing::{debug, info};

use crate::collision;
use crate::ship::{OrderKind, ShipStat};
use crate::thing::Thing;
use crate::traj::Traj;
use crate::world::World;

/// Run the laser pass for every team's every ship, in team order then
/// ship order.
pub fn fire_all(world: &mut World) {
    let cfg = world.config().clone();

    for t in 0..world.teams.len() {
        for num in 0..world.teams[t].ship_count {
            let Some(si) = world.teams[t].ships[num] else {
                continue;
            };

            // Validate first; the clamped value is the beam.
            let raw = world
                .arena
                .get(si)
                .and_then(Thing::as_ship)
                .map_or(0.0, |s| s.order(OrderKind::Laser));
            let cost = world
                .arena
                .get_mut(si)
                .map_or(0.0, |th| th.set_order(&cfg, OrderKind::Laser, raw));
            let length = world
                .arena
                .get(si)
                .and_then(Thing::as_ship)
                .map_or(0.0, |s| s.order(OrderKind::Laser));
            if length <= 0.0 {
                continue;
            }

            fire_one(world, si, length, cost);
        }
    }
}

fn fire_one(world: &mut World, si: usize, length: f64, cost: f64) {
    let cfg = world.config().clone();
    let (ship_pos, ship_orient) = {
        let ship = world.arena.get(si).expect("laser pass over live slots");
        (ship.pos, ship.orient)
    };

    // Nominal end of beam; a beam that wraps shorter than itself finds
    // no target (cannot happen at the clamped lengths, kept as a guard).
    let nominal = ship_pos + Traj::new(length, ship_orient).to_coord();
    let mut target = aim(world, si);
    if nominal.dist_to(&ship_pos) > length {
        target = None;
    }

    if let Some(ti) = target {
        let (target_pos, target_vel, target_name) = {
            let t = world.arena.get(ti).expect("aim returns live slots");
            (t.pos, t.vel, t.name)
        };
        let dist = ship_pos.dist_to(&target_pos);
        if dist < length {
            // Impact one unit short of the target along the beam, so the
            // phantom's mass reflects the power remaining at arrival.
            let mut toward = ship_pos.vect_to(&target_pos);
            toward.rho = 1.0;
            let impact = target_pos - toward.to_coord();
            let remaining = length - impact.dist_to(&ship_pos);

            let id = world.next_id();
            let mut phantom = Thing::generic(id, impact);
            phantom.set_mass(cfg.laser_mass_scale * remaining, cfg.min_mass);
            let mut vel = target_vel;
            vel.rho += 1.0;
            phantom.vel = vel;

            info!(
                shooter = %world.arena.get(si).expect("shooter").name,
                target = %target_name,
                beam = length,
                "laser hit"
            );
            collision::collide_phantom(world, ti, &phantom);
        }
    }

    // Fuel is spent whether or not the beam connected.
    if let Some(state) = world.arena.get_mut(si).and_then(Thing::as_ship_mut) {
        let old_fuel = state.amount(ShipStat::Fuel);
        let new_fuel = old_fuel - cost;
        state.set_amount(ShipStat::Fuel, new_fuel);
        if old_fuel > 0.01 && new_fuel <= 0.01 {
            debug!("ship ran out of fuel firing");
        }
    }
}

/// Pick the nearest thing the ship faces, recording the rendered beam
/// reach on the ship (`-1` when the ship faces nothing).
fn aim(world: &mut World, si: usize) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    {
        let ship = world.arena.get(si)?;
        for i in world.arena.traversal() {
            if i == si {
                continue;
            }
            let Some(candidate) = world.arena.get(i) else {
                continue;
            };
            if !ship.is_facing(candidate) {
                continue;
            }
            let dist = ship.pos.dist_to(&candidate.pos);
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
    }

    let ship = world.arena.get_mut(si)?;
    let order = ship.as_ship().map_or(0.0, |s| s.order(OrderKind::Laser));
    let reach = match best {
        Some((_, d)) if d > order => order,
        Some((_, d)) => d,
        None => -1.0,
    };
    if let Some(state) = ship.as_ship_mut() {
        state.laser_reach = reach;
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::coord::Coord;
    use crate::thing::{Material, ThingKind};

    fn world() -> World {
        let mut w = World::new(GameConfig::default(), 2, 5);
        w.settle();
        w
    }

    fn free_ship(w: &mut World, team: usize, num: usize, pos: Coord, orient: f64) -> usize {
        let i = w.teams[team].ships[num].unwrap();
        let t = w.arena.get_mut(i).unwrap();
        t.pos = pos;
        t.orient = orient;
        t.vel = Traj::default();
        t.as_ship_mut().unwrap().docked = false;
        i
    }

    fn add_asteroid(w: &mut World, mass: f64, material: Material, pos: Coord) -> usize {
        let id = w.next_id();
        let cfg = w.config().clone();
        let mut ast = crate::asteroid::asteroid(&cfg, &mut w.rng, id, mass, material);
        ast.pos = pos;
        ast.vel = Traj::default();
        w.arena.queue_add(ast);
        w.arena.resolve_adds()[0]
    }

    #[test]
    fn beam_shatters_an_asteroid_into_three() {
        let mut w = world();
        let cfg = w.config().clone();
        let i = free_ship(&mut w, 0, 0, Coord::new(0.0, 0.0), 0.0);
        let a = add_asteroid(&mut w, 40.0, Material::Vinyl, Coord::new(100.0, 0.0));
        w.arena.get_mut(i).unwrap().set_order(&cfg, OrderKind::Laser, 200.0);

        w.laser_pass();

        assert!(w.arena.get(a).is_none(), "asteroid swept after shattering");
        let children: Vec<_> = w
            .arena
            .traversal()
            .into_iter()
            .filter(|&k| w.arena.get(k).unwrap().kind() == ThingKind::Asteroid)
            .collect();
        assert_eq!(children.len(), 3);
        for k in children {
            let c = w.arena.get(k).unwrap();
            assert!((c.base_mass() - 40.0 / 3.0).abs() < 1e-9);
            assert_eq!(c.pos, Coord::new(100.0, 0.0));
        }
    }

    #[test]
    fn fragment_headings_are_evenly_spaced() {
        let mut w = world();
        let cfg = w.config().clone();
        let i = free_ship(&mut w, 0, 0, Coord::new(0.0, 0.0), 0.0);
        add_asteroid(&mut w, 99.0, Material::Vinyl, Coord::new(100.0, 0.0));
        w.arena.get_mut(i).unwrap().set_order(&cfg, OrderKind::Laser, 300.0);

        w.laser_pass();

        let mut thetas: Vec<f64> = w
            .arena
            .traversal()
            .into_iter()
            .filter_map(|k| {
                let t = w.arena.get(k).unwrap();
                (t.kind() == ThingKind::Asteroid).then_some(t.vel.theta)
            })
            .collect();
        assert_eq!(thetas.len(), 3);
        thetas.sort_by(f64::total_cmp);
        let step = std::f64::consts::TAU / 3.0;
        assert!((thetas[1] - thetas[0] - step).abs() < 1e-9);
        assert!((thetas[2] - thetas[1] - step).abs() < 1e-9);
    }

    #[test]
    fn docked_ships_never_emit_phantoms() {
        let mut w = world();
        let cfg = w.config().clone();
        let i = w.teams[0].ships[0].unwrap();
        let pos = w.arena.get(i).unwrap().pos;
        let a = add_asteroid(&mut w, 40.0, Material::Vinyl, pos + Coord::new(100.0, 0.0));
        w.arena.get_mut(i).unwrap().orient = 0.0;
        w.arena.get_mut(i).unwrap().set_order(&cfg, OrderKind::Laser, 200.0);

        w.laser_pass();

        assert!(w.arena.get(a).unwrap().is_alive());
        let s = w.arena.get(i).unwrap().as_ship().unwrap().clone();
        assert_eq!(s.amount(ShipStat::Fuel), 30.0, "no fuel spent");
    }

    #[test]
    fn short_beams_spend_fuel_but_do_not_reach() {
        let mut w = world();
        let cfg = w.config().clone();
        let i = free_ship(&mut w, 0, 0, Coord::new(0.0, 0.0), 0.0);
        let a = add_asteroid(&mut w, 40.0, Material::Vinyl, Coord::new(300.0, 0.0));
        w.arena.get_mut(i).unwrap().set_order(&cfg, OrderKind::Laser, 100.0);

        w.laser_pass();

        assert!(w.arena.get(a).unwrap().is_alive());
        let s = w.arena.get(i).unwrap().as_ship().unwrap().clone();
        assert!((s.amount(ShipStat::Fuel) - 28.0).abs() < 1e-9);
        // Reach is capped at the beam length for rendering.
        assert_eq!(s.laser_reach, 100.0);
    }

    #[test]
    fn weak_beams_damage_ship_shields() {
        let mut w = world();
        let cfg = w.config().clone();
        let shooter = free_ship(&mut w, 0, 0, Coord::new(0.0, 0.0), 0.0);
        let victim = free_ship(&mut w, 1, 0, Coord::new(150.0, 0.0), 0.0);
        w.arena
            .get_mut(shooter)
            .unwrap()
            .set_order(&cfg, OrderKind::Laser, 400.0);

        w.laser_pass();

        let v = w.arena.get(victim).unwrap().as_ship().unwrap().clone();
        // Phantom mass = 30 * (400 - 149) = 7530 -> 7.53 shield damage.
        assert!((v.amount(ShipStat::Shield) - (30.0 - 7.53)).abs() < 0.2);
        assert!(w.arena.get(victim).unwrap().is_alive());
    }
}
