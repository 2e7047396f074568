//! Pairwise collision evaluation and reaction.
//!
//! Each substep builds the list of team-controlled things (each team's
//! station, then its ships in ship order; ships drop out once the game
//! is over) and drives every live arena thing against it, both ways:
//! `collide(T, U)` then `collide(U, T)`. Reactions dispatch on the
//! (receiver, other) kind pair -- an explicit match, so the full 4x4
//! reaction table is auditable in one place:
//!
//! | receiver \ other | Ship          | Station   | Asteroid      | Generic (laser) |
//! |------------------|---------------|-----------|---------------|-----------------|
//! | Ship             | shield damage | dock      | damage+ingest | shield damage   |
//! | Station          | unharmed      | --        | --            | score burn      |
//! | Asteroid         | die/split     | reflect   | not simulated | glance or split |
//! | Generic          | --            | --        | --            | --              |
//!
//! A ship-ship overlap runs the other ship's handler exactly once from
//! inside the first; the resolver's reentrancy flag stops the pair from
//! recursing forever.
//!
//! Laser phantoms never enter the arena; [`collide_phantom`] delivers
//! them through the same reaction rules.

use std::f64::consts::{PI, TAU};

use tracing::{debug, info};

use crate::thing::{Material, Thing, ThingKind, NO_DAMAGE};
use crate::ship::ShipStat;
use crate::traj::Traj;
use crate::world::World;

/// Evaluate all collisions for the current substep. Returns the number
/// of team-thing collisions that actually resolved.
pub fn evaluate(world: &mut World) -> u32 {
    let mut team_things: Vec<usize> = Vec::new();
    for team in &world.teams {
        if let Some(st) = team.station {
            team_things.push(st);
        }
        if world.is_game_over() {
            continue; // Ships drop out of the pairing once frozen.
        }
        team_things.extend(team.live_ships());
    }

    let mut resolved = 0;
    for i in world.arena.traversal() {
        if !world.arena.get(i).is_some_and(Thing::is_alive) {
            continue;
        }
        for &j in &team_things {
            collide(world, i, j, false);
            if collide(world, j, i, false) {
                resolved += 1;
            }
        }
    }
    resolved
}

/// Test a pair and, on overlap, record the damage-origin angle on the
/// receiver and run its reaction. Returns whether the pair overlapped.
pub(crate) fn collide(world: &mut World, recv: usize, oth: usize, reentrant: bool) -> bool {
    if recv == oth {
        return false;
    }
    let recv_kind = {
        let (Some(r), Some(o)) = (world.arena.get(recv), world.arena.get(oth)) else {
            return false;
        };
        if r == o || !r.overlaps(o) {
            return false;
        }
        r.kind()
    };

    if let Some((r, o)) = world.arena.pair_mut(recv, oth) {
        let ang = r.pos.angle_to(&o.pos);
        if o.kind() == ThingKind::Generic {
            r.shot_angle = ang;
        } else {
            r.collide_angle = ang;
        }
    }

    match recv_kind {
        ThingKind::Ship => handle_ship(world, recv, oth, reentrant),
        ThingKind::Station => handle_station(world, recv, oth),
        ThingKind::Asteroid => handle_asteroid(world, recv, oth),
        ThingKind::Generic => {}
    }
    true
}

// ---------------------------------------------------------------------------
// Ship reactions
// ---------------------------------------------------------------------------

fn handle_ship(world: &mut World, recv: usize, oth: usize, reentrant: bool) {
    let max_speed = world.config().max_speed;
    let mut announcements: Vec<String> = Vec::new();
    let mut recurse = false;

    let done = {
        let Some((ship, other)) = world.arena.pair_mut(recv, oth) else {
            return;
        };

        // Nothing can hurt you at a station.
        if ship.as_ship().is_some_and(|s| s.docked) {
            ship.collide_angle = NO_DAMAGE;
            true
        } else {
            match other.kind() {
                ThingKind::Station => {
                    dock(ship, other, &mut announcements);
                    true
                }
                ThingKind::Generic => {
                    laser_damage_ship(ship, other.total_mass(), &mut announcements);
                    true
                }
                _ => {
                    // Ship or asteroid: momentum damage first.
                    let damage = ship.relative_momentum(other).rho / 1000.0;
                    let state = ship.as_ship_mut().expect("ship payload");
                    let shield = state.amount(ShipStat::Shield) - damage;
                    state.set_amount(ShipStat::Shield, shield);
                    if damage > 0.1 {
                        let target = match other.kind() {
                            ThingKind::Ship => other.name.display(),
                            _ => "asteroid".to_owned(),
                        };
                        announcements
                            .push(format!("{} hit {}, {:.1} damage", ship.name, target, damage));
                    }
                    if shield < 0.0 {
                        let cause = match other.kind() {
                            ThingKind::Ship => "ship",
                            _ => "asteroid",
                        };
                        announcements.push(format!("{} destroyed by {}", ship.name, cause));
                        ship.kill();
                    }

                    let mut claimed_away = false;
                    if other.kind() == ThingKind::Asteroid {
                        claimed_away = !ingest_asteroid(ship, other, max_speed);
                    }
                    if other.kind() == ThingKind::Ship && other.team.is_some() && !reentrant {
                        recurse = true;
                    }
                    claimed_away
                }
            }
        }
    };

    for line in announcements.drain(..) {
        world.add_announcement(&line);
    }
    if done {
        return;
    }

    if recurse {
        // Let the other ship resolve the same contact exactly once.
        collide(world, oth, recv, true);
    }

    // Separation impulse: bump clear of the other thing so the pair does
    // not re-collide every subsequent substep.
    if let Some((ship, other)) = world.arena.pair_mut(recv, oth) {
        let ang = other.pos.angle_to(&ship.pos);
        let mov = Traj::new(other.size() + 3.0, ang);
        ship.pos += mov.to_coord();
        let ratio = other.total_mass() / ship.total_mass();
        ship.vel += mov * ratio;
        if ship.vel.rho > max_speed {
            ship.vel.rho = max_speed;
        }
    }
}

/// Snap to the station, hand over cargo, and dock.
fn dock(ship: &mut Thing, station: &mut Thing, announcements: &mut Vec<String>) {
    let dist = ship.pos.dist_to(&station.pos);
    ship.collide_angle = NO_DAMAGE;
    ship.pos = station.pos;
    ship.vel = Traj::default();

    let state = ship.as_ship_mut().expect("ship payload");
    state.dock_dist = dist;
    state.store_order(crate::ship::OrderKind::Thrust, 0.0);
    let cargo = state.amount(ShipStat::Cargo);
    state.set_amount(ShipStat::Cargo, 0.0);
    state.docked = true;

    if cargo > 0.01 {
        let home = ship.team == station.team;
        if home {
            info!(ship = %ship.name, cargo, "vinyl delivered home");
        } else {
            info!(ship = %ship.name, cargo, "vinyl delivered to an enemy station");
        }
        announcements.push(format!(
            "{} delivered {:.1} vinyl to {}",
            ship.name, cargo, station.name
        ));
    }
    station
        .as_station_mut()
        .expect("station payload")
        .add_vinyl(cargo);
}

/// Beam damage against a ship's shields; below zero is lethal.
fn laser_damage_ship(ship: &mut Thing, beam_mass: f64, announcements: &mut Vec<String>) {
    let state = ship.as_ship_mut().expect("ship payload");
    let shield = state.amount(ShipStat::Shield) - beam_mass / 1000.0;
    state.set_amount(ShipStat::Shield, shield);
    if shield < 0.0 {
        announcements.push(format!("{} destroyed by laser", ship.name));
        ship.kill();
    }
}

/// Perfectly inelastic pickup of an overlapping asteroid. Returns false
/// when another ship already claimed it this step (no further reaction
/// for this ship).
fn ingest_asteroid(ship: &mut Thing, ast: &mut Thing, max_speed: f64) -> bool {
    let claimed_by_other = ast
        .as_asteroid()
        .and_then(|a| a.eaten_by)
        .is_some_and(|cookie| cookie != ship.id());
    if claimed_by_other {
        return false;
    }

    let momentum = ship.momentum() + ast.momentum();
    let mass_total = ship.total_mass() + ast.total_mass();
    let mut vel = momentum / mass_total;
    if vel.rho > max_speed {
        vel.rho = max_speed;
    }
    ship.vel = vel;

    let mass = ast.total_mass();
    let material = ast.as_asteroid().expect("asteroid payload").material;
    let state = ship.as_ship_mut().expect("ship payload");
    if state.asteroid_fits(mass, material) {
        if let Some(stat) = material.stat() {
            let held = state.amount(stat);
            state.set_amount(stat, held + mass);
            debug!(mass, ?material, "asteroid ingested");
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Station reactions
// ---------------------------------------------------------------------------

fn handle_station(world: &mut World, recv: usize, oth: usize) {
    let Some((station, other)) = world.arena.pair_mut(recv, oth) else {
        return;
    };
    match other.kind() {
        ThingKind::Ship => {
            // Ships dock; the station itself is unharmed.
            station.collide_angle = NO_DAMAGE;
        }
        ThingKind::Generic => {
            let burn = other.total_mass() / 1000.0;
            let store = station
                .as_station_mut()
                .expect("station payload")
                .burn_vinyl(burn);
            if burn > 0.01 {
                info!(station = %station.name, burn, store, "laser burned stored vinyl");
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Asteroid reactions
// ---------------------------------------------------------------------------

fn handle_asteroid(world: &mut World, recv: usize, oth: usize) {
    let max_speed = world.config().max_speed;
    let min_mass = world.config().min_mass;
    let shatter_mass = world.config().laser_shatter_mass;

    let split = {
        let Some((ast, other)) = world.arena.pair_mut(recv, oth) else {
            return;
        };
        // Asteroids never display damage angles.
        ast.clear_damage();

        match other.kind() {
            // Asteroid-asteroid contact is not simulated; guard in case
            // a pairing ever routes one here.
            ThingKind::Asteroid => return,
            ThingKind::Station => {
                reflect_off_station(ast, other);
                return;
            }
            ThingKind::Generic if other.total_mass() < shatter_mass => {
                return; // The beam glances off.
            }
            _ => {}
        }

        ast.kill();
        if other.kind() == ThingKind::Ship {
            // First claim wins; a second ship in the same step cannot
            // double-eat.
            let cookie = other.id();
            let a = ast.as_asteroid_mut().expect("asteroid payload");
            if a.eaten_by.is_none() {
                a.eaten_by = Some(cookie);
            }
            let fits = other
                .as_ship()
                .is_some_and(|s| s.asteroid_fits(ast.total_mass(), a_material(ast)));
            if fits {
                return; // Eaten whole; no fragments.
            }
        }

        // Shatter into three fragments on evenly spaced headings.
        let child_mass = ast.total_mass() / 3.0;
        if child_mass < min_mass {
            return; // Space dust.
        }
        let mut vel = ast.relative_velocity(other);
        if other.kind() == ThingKind::Generic {
            vel.rho = other.total_mass() / (3.0 * ast.total_mass());
        }
        if vel.rho > max_speed {
            vel.rho = max_speed;
        }
        Some((ast.pos, a_material(ast), child_mass, vel))
    };

    if let Some((pos, material, child_mass, vel)) = split {
        spawn_fragments(world, pos, material, child_mass, vel);
    }
}

fn a_material(ast: &Thing) -> Material {
    ast.as_asteroid().map_or(Material::Generic, |a| a.material)
}

/// Specular reflection off an effectively immovable station, then a
/// reposition just outside it so the pair separates this step.
fn reflect_off_station(ast: &mut Thing, station: &mut Thing) {
    let normal = station.pos.angle_to(&ast.pos);
    ast.vel.theta = 2.0 * normal - ast.vel.theta - PI;
    ast.vel.normalize();

    let normal = station.pos.angle_to(&ast.pos);
    let clearance = ast.size() + station.size() + 1.0;
    ast.pos = station.pos + Traj::new(clearance, normal).to_coord();
    station.collide_angle = normal;
}

/// Queue three fragments of the shattered parent, `2pi/3` apart.
fn spawn_fragments(
    world: &mut World,
    pos: crate::coord::Coord,
    material: Material,
    child_mass: f64,
    mut vel: Traj,
) {
    let cfg = world.config().clone();
    for _ in 0..3 {
        let id = world.next_id();
        let mut child = crate::asteroid::asteroid(&cfg, &mut world.rng, id, child_mass, material);
        child.vel = vel;
        child.pos = pos;
        world.arena.queue_add(child);
        vel.rotate(TAU / 3.0);
    }
}

// ---------------------------------------------------------------------------
// Laser phantom delivery
// ---------------------------------------------------------------------------

/// Deliver a laser phantom (kind Generic, never registered) to a target
/// through the normal reaction rules. Returns whether it connected.
pub(crate) fn collide_phantom(world: &mut World, target: usize, phantom: &Thing) -> bool {
    let (kind, overlaps) = {
        let Some(t) = world.arena.get(target) else {
            return false;
        };
        (t.kind(), t.overlaps(phantom))
    };
    if !overlaps {
        return false;
    }

    let mut announcements: Vec<String> = Vec::new();
    {
        let t = world.arena.get_mut(target).expect("target checked above");
        t.shot_angle = t.pos.angle_to(&phantom.pos);
    }

    match kind {
        ThingKind::Ship => {
            let t = world.arena.get_mut(target).expect("target checked above");
            if t.as_ship().is_some_and(|s| s.docked) {
                t.collide_angle = NO_DAMAGE;
            } else {
                laser_damage_ship(t, phantom.total_mass(), &mut announcements);
            }
        }
        ThingKind::Station => {
            let t = world.arena.get_mut(target).expect("target checked above");
            let burn = phantom.total_mass() / 1000.0;
            t.as_station_mut().expect("station payload").burn_vinyl(burn);
        }
        ThingKind::Asteroid => {
            shatter_by_phantom(world, target, phantom);
        }
        ThingKind::Generic => {}
    }

    for line in announcements {
        world.add_announcement(&line);
    }
    true
}

fn shatter_by_phantom(world: &mut World, target: usize, phantom: &Thing) {
    let max_speed = world.config().max_speed;
    let min_mass = world.config().min_mass;
    let shatter_mass = world.config().laser_shatter_mass;

    let split = {
        let t = world.arena.get_mut(target).expect("target checked above");
        t.clear_damage();
        if phantom.total_mass() < shatter_mass {
            return; // Glances off.
        }
        t.kill();

        let child_mass = t.total_mass() / 3.0;
        if child_mass < min_mass {
            return;
        }
        let mut vel = t.relative_velocity(phantom);
        vel.rho = phantom.total_mass() / (3.0 * t.total_mass());
        if vel.rho > max_speed {
            vel.rho = max_speed;
        }
        (t.pos, a_material(t), child_mass, vel)
    };

    let (pos, material, child_mass, vel) = split;
    spawn_fragments(world, pos, material, child_mass, vel);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::coord::Coord;

    fn world() -> World {
        let mut w = World::new(GameConfig::default(), 2, 11);
        w.settle();
        w
    }

    /// Park a ship out in the open, undocked.
    fn free_ship(w: &mut World, team: usize, num: usize, pos: Coord) -> usize {
        let i = w.teams[team].ships[num].unwrap();
        let t = w.arena.get_mut(i).unwrap();
        t.pos = pos;
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
        let placed = w.arena.resolve_adds();
        placed[0]
    }

    #[test]
    fn ship_docks_at_its_own_station() {
        let mut w = world();
        let st = w.teams[0].station.unwrap();
        let station_pos = w.arena.get(st).unwrap().pos;
        let i = free_ship(&mut w, 0, 0, station_pos + Coord::new(35.0, 0.0));
        {
            let t = w.arena.get_mut(i).unwrap();
            t.vel = Traj::new(10.0, 0.0);
            t.as_ship_mut().unwrap().set_amount(ShipStat::Cargo, 12.0);
        }

        evaluate(&mut w);

        let t = w.arena.get(i).unwrap();
        let s = t.as_ship().unwrap();
        assert!(s.docked);
        assert_eq!(t.pos, station_pos);
        assert_eq!(t.vel.rho, 0.0);
        assert_eq!(s.amount(ShipStat::Cargo), 0.0);
        assert_eq!(w.team_score(0), 12.0);
    }

    #[test]
    fn enemy_station_takes_the_cargo_too() {
        let mut w = world();
        let st1 = w.teams[1].station.unwrap();
        let station_pos = w.arena.get(st1).unwrap().pos;
        let i = free_ship(&mut w, 0, 0, station_pos + Coord::new(30.0, 0.0));
        w.arena
            .get_mut(i)
            .unwrap()
            .as_ship_mut()
            .unwrap()
            .set_amount(ShipStat::Cargo, 7.0);

        evaluate(&mut w);

        assert!(w.arena.get(i).unwrap().as_ship().unwrap().docked);
        assert_eq!(w.team_score(1), 7.0);
        assert_eq!(w.team_score(0), 0.0);
    }

    #[test]
    fn ship_ingests_a_fitting_vinyl_asteroid() {
        let mut w = world();
        let i = free_ship(&mut w, 0, 0, Coord::new(0.0, 5.0));
        {
            let t = w.arena.get_mut(i).unwrap();
            t.vel = Traj::new(10.0, -std::f64::consts::FRAC_PI_2);
        }
        let a = add_asteroid(&mut w, 20.0, Material::Vinyl, Coord::new(0.0, 0.0));

        evaluate(&mut w);

        let ship = w.arena.get(i).unwrap();
        assert_eq!(ship.as_ship().unwrap().amount(ShipStat::Cargo), 20.0);
        assert!(!w.arena.get(a).unwrap().is_alive());

        // Momentum conservation before the separation bump: the recorded
        // speed reflects (m_ship * v) / (m_ship + m_ast) plus the bump.
        assert!(ship.vel.rho > 0.0);
    }

    #[test]
    fn claimed_asteroids_are_not_double_eaten() {
        let mut w = world();
        let a = add_asteroid(&mut w, 20.0, Material::Vinyl, Coord::new(0.0, 0.0));
        let s1 = free_ship(&mut w, 0, 0, Coord::new(0.0, 5.0));
        let s2 = free_ship(&mut w, 0, 1, Coord::new(0.0, -5.0));

        evaluate(&mut w);

        let cargo1 = w.arena.get(s1).unwrap().as_ship().unwrap().amount(ShipStat::Cargo);
        let cargo2 = w.arena.get(s2).unwrap().as_ship().unwrap().amount(ShipStat::Cargo);
        assert_eq!(
            (cargo1 > 0.0) as u32 + (cargo2 > 0.0) as u32,
            1,
            "exactly one ship gets the mass"
        );
        assert!(!w.arena.get(a).unwrap().is_alive());
    }

    #[test]
    fn oversized_asteroid_shatters_on_a_ship() {
        let mut w = world();
        // Cargo capacity is 30 by default; 60 tons cannot fit.
        let a = add_asteroid(&mut w, 60.0, Material::Vinyl, Coord::new(0.0, 0.0));
        let _s = free_ship(&mut w, 0, 0, Coord::new(0.0, 8.0));

        evaluate(&mut w);
        assert!(!w.arena.get(a).unwrap().is_alive());
        assert_eq!(w.arena.pending_adds(), 3, "three fragments queued");
        w.resolve_pending();

        let fragments: Vec<_> = w
            .arena
            .traversal()
            .into_iter()
            .filter(|&i| {
                w.arena.get(i).unwrap().kind() == ThingKind::Asteroid
                    && w.arena.get(i).unwrap().base_mass() == 20.0
            })
            .collect();
        assert_eq!(fragments.len(), 3);
    }

    #[test]
    fn asteroid_asteroid_contact_is_not_simulated() {
        let mut w = world();
        let a1 = add_asteroid(&mut w, 40.0, Material::Vinyl, Coord::new(0.0, 0.0));
        let a2 = add_asteroid(&mut w, 40.0, Material::Uranium, Coord::new(1.0, 0.0));

        evaluate(&mut w);

        assert!(w.arena.get(a1).unwrap().is_alive());
        assert!(w.arena.get(a2).unwrap().is_alive());
        assert_eq!(w.arena.pending_adds(), 0);
    }

    #[test]
    fn asteroid_reflects_off_a_station() {
        let mut w = world();
        let st = w.teams[0].station.unwrap();
        let station_pos = w.arena.get(st).unwrap().pos;
        // Approaching from the east, moving west.
        let a = add_asteroid(&mut w, 10.0, Material::Vinyl, station_pos + Coord::new(20.0, 0.0));
        {
            let t = w.arena.get_mut(a).unwrap();
            t.vel = Traj::new(10.0, PI);
        }

        evaluate(&mut w);

        let ast = w.arena.get(a).unwrap();
        assert!(ast.is_alive());
        // Reflected back east.
        assert!(ast.vel.theta.abs() < 1e-9);
        // Repositioned just outside the hull.
        let gap = ast.pos.dist_to(&station_pos);
        assert!((gap - (ast.size() + 30.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn ship_ship_collision_damages_both_and_separates() {
        let mut w = world();
        let s1 = free_ship(&mut w, 0, 0, Coord::new(0.0, 0.0));
        let s2 = free_ship(&mut w, 1, 0, Coord::new(10.0, 0.0));
        {
            w.arena.get_mut(s1).unwrap().vel = Traj::new(30.0, 0.0);
            w.arena.get_mut(s2).unwrap().vel = Traj::new(30.0, PI);
        }
        let shield_before = w
            .arena
            .get(s1)
            .unwrap()
            .as_ship()
            .unwrap()
            .amount(ShipStat::Shield);

        evaluate(&mut w);

        let t1 = w.arena.get(s1).unwrap();
        let t2 = w.arena.get(s2).unwrap();
        assert!(t1.as_ship().unwrap().amount(ShipStat::Shield) < shield_before);
        assert!(t2.as_ship().unwrap().amount(ShipStat::Shield) < shield_before);
        assert!(t1.pos.dist_to(&t2.pos) > 10.0, "separation impulse applied");
    }

    #[test]
    fn the_station_shields_its_docked_ships() {
        // A docked ship sits at the station's center, inside its hull:
        // an incoming asteroid reflects off the station before it can
        // ever reach the ship.
        let mut w = world();
        let i = w.teams[0].ships[0].unwrap();
        let pos = w.arena.get(i).unwrap().pos;
        let a = add_asteroid(&mut w, 10.0, Material::Vinyl, pos + Coord::new(1.0, 0.0));
        let shield_before = w
            .arena
            .get(i)
            .unwrap()
            .as_ship()
            .unwrap()
            .amount(ShipStat::Shield);

        evaluate(&mut w);

        let s = w.arena.get(i).unwrap().as_ship().unwrap().clone();
        assert_eq!(s.amount(ShipStat::Shield), shield_before);
        assert!(s.docked);
        assert!(w.arena.get(a).unwrap().is_alive());
        assert!(w.arena.get(a).unwrap().pos.dist_to(&pos) > 38.0);
    }

    #[test]
    fn docked_ships_shrug_off_direct_contact() {
        // Even with an overlap forced directly (ship displaced but still
        // flagged docked), the ship's handler refuses all damage.
        let mut w = world();
        let i = w.teams[0].ships[0].unwrap();
        {
            let t = w.arena.get_mut(i).unwrap();
            t.pos = Coord::new(0.0, 0.0);
        }
        let a = add_asteroid(&mut w, 10.0, Material::Vinyl, Coord::new(5.0, 0.0));
        let shield_before = w
            .arena
            .get(i)
            .unwrap()
            .as_ship()
            .unwrap()
            .amount(ShipStat::Shield);

        evaluate(&mut w);

        let s = w.arena.get(i).unwrap().as_ship().unwrap().clone();
        assert_eq!(s.amount(ShipStat::Shield), shield_before);
        assert_eq!(s.amount(ShipStat::Cargo), 0.0, "no ingestion while docked");
        assert!(s.docked);
        // The asteroid's own handler still fires against the hull.
        assert!(!w.arena.get(a).unwrap().is_alive());
    }

    #[test]
    fn phantom_below_threshold_glances_off_asteroids() {
        let mut w = world();
        let a = add_asteroid(&mut w, 40.0, Material::Vinyl, Coord::new(0.0, 0.0));
        let mut phantom = Thing::generic(w.next_id(), Coord::new(1.0, 0.0));
        phantom.set_mass(999.0, 3.0);

        assert!(collide_phantom(&mut w, a, &phantom));
        assert!(w.arena.get(a).unwrap().is_alive());

        phantom.set_mass(1000.0, 3.0);
        assert!(collide_phantom(&mut w, a, &phantom));
        assert!(!w.arena.get(a).unwrap().is_alive());
        assert_eq!(w.arena.pending_adds(), 3);
    }
}
