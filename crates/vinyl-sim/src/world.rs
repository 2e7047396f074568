//! The world: arena, teams, clocks, and the per-substep drivers.
//!
//! A game turn is five physics substeps followed by one laser pass.
//! Within a substep every thing drifts in ascending slot order, then
//! collisions are evaluated pairwise, then deferred spawns and deaths
//! settle, then simulation time advances. Nothing mutates the arena
//! mid-step except through the deferred queues, so the whole turn is
//! deterministic for a given seed and order stream.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use tracing::{debug, info};
use vinyl_wire::{AnnouncerText, Name, Wire};

use crate::arena::Arena;
use crate::asteroid;
use crate::collision;
use crate::config::GameConfig;
use crate::laser;
use crate::physics;
use crate::ship;
use crate::station;
use crate::team::Team;
use crate::thing::{Material, ThingKind};
use crate::SimError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The authoritative game state.
#[derive(Debug)]
pub struct World {
    pub(crate) config: GameConfig,
    pub arena: Arena,
    pub teams: Vec<Team>,
    pub(crate) rng: Pcg64Mcg,
    pub(crate) game_time: f64,
    pub(crate) game_over: bool,
    /// Append-only commentary carried in every snapshot. No simulation
    /// effect.
    pub announcer: AnnouncerText,
    /// Per-team cumulative think time, seconds. On the wire.
    pub clocks: Vec<f64>,
    /// Per-team timestamp of the last world send. Server-side only.
    pub stamps: Vec<f64>,
}

impl World {
    /// Build a world with `num_teams` teams, each holding a station and
    /// four docked ships at its spawn point. The team things are queued;
    /// call [`settle`](World::settle) (or run a substep) to place them.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails validation.
    pub fn new(config: GameConfig, num_teams: usize, seed: u64) -> World {
        config.validate().expect("invalid GameConfig");

        let mut world = World {
            arena: Arena::new(),
            teams: Vec::with_capacity(num_teams),
            rng: Pcg64Mcg::seed_from_u64(seed),
            game_time: 0.0,
            game_over: false,
            announcer: AnnouncerText::new(),
            clocks: vec![0.0; num_teams],
            stamps: vec![0.0; num_teams],
            config,
        };

        for slot in 0..num_teams {
            world.create_team(slot);
        }
        world
    }

    fn create_team(&mut self, slot: usize) {
        let team = Team::new(slot as u32);
        let pos = self.config.spawn_coord(slot);

        let id = self.next_id();
        let mut st = station::station(id, slot, pos);
        st.name = Name::from_str(&team.name.display());
        self.arena.queue_add(st);

        for num in 0..team.ship_count {
            let id = self.next_id();
            let mut sh = ship::ship(&self.config, id, slot, num as u32, pos);
            sh.name.set(&format!("Ship-{num}-of-{slot}"));
            self.arena.queue_add(sh);
        }

        self.teams.push(team);
    }

    pub(crate) fn next_id(&mut self) -> u32 {
        self.rng.gen()
    }

    // -- accessors -----------------------------------------------------------

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Freeze the game: ships stop moving and drop out of collision
    /// evaluation; stations and asteroids carry on.
    pub fn set_game_over(&mut self) {
        self.game_over = true;
        info!(game_time = self.game_time, "game over");
    }

    /// A team's score: its station's vinyl store.
    pub fn team_score(&self, t: usize) -> f64 {
        self.teams
            .get(t)
            .and_then(|team| team.station)
            .and_then(|i| self.arena.get(i))
            .and_then(|thing| thing.as_station())
            .map_or(0.0, |st| st.vinyl_store())
    }

    // -- spawning ------------------------------------------------------------

    /// Queue `count` asteroids of `mass` tons. They appear at the end of
    /// the current (or next) substep.
    pub fn create_asteroids(&mut self, material: Material, count: u32, mass: f64) {
        for _ in 0..count {
            let id = self.next_id();
            let ast = asteroid::asteroid(&self.config, &mut self.rng, id, mass, material);
            self.arena.queue_add(ast);
        }
    }

    /// Run a zero-dt substep: settles the add queue and clears per-step
    /// flags without advancing time or applying order side effects
    /// (freshly spawned worlds have no orders pending).
    pub fn settle(&mut self) {
        self.physics_step(0.0);
    }

    // -- the turn ------------------------------------------------------------

    /// One physics substep of `dt` in-game seconds.
    pub fn physics_step(&mut self, dt: f64) {
        for i in self.arena.traversal() {
            let Some(thing) = self.arena.get(i) else {
                continue;
            };
            if thing.kind() == ThingKind::Ship {
                physics::ship_drift(self, i, dt);
            } else if let Some(thing) = self.arena.get_mut(i) {
                thing.drift(dt, self.config.max_speed);
            }
        }

        collision::evaluate(self);
        self.resolve_pending();
        self.game_time += dt;
    }

    /// The end-of-turn laser pass. Runs once after the turn's substeps.
    pub fn laser_pass(&mut self) {
        laser::fire_all(self);
        self.resolve_pending();
    }

    /// Settle deferred work: place queued spawns (which may already be
    /// dead and are then swept immediately), then free dead things and
    /// null destroyed ships out of their team records.
    pub fn resolve_pending(&mut self) {
        let placed = self.arena.resolve_adds();
        for i in placed {
            self.sync_team_slot(i);
        }
        self.sweep_and_sync();
    }

    /// Free dead things and keep team bookkeeping in step.
    pub(crate) fn sweep_and_sync(&mut self) {
        for thing in self.arena.sweep_dead() {
            if thing.kind() == ThingKind::Ship {
                let num = thing.as_ship().map_or(0, |s| s.num) as usize;
                if let Some(team) = thing.team.and_then(|t| self.teams.get_mut(t)) {
                    if num < team.ships.len() {
                        team.ships[num] = None;
                    }
                }
                debug!(name = %thing.name, "ship removed from the world");
            }
        }
    }

    /// Point a team record at a newly placed station or ship.
    pub(crate) fn sync_team_slot(&mut self, i: usize) {
        let Some(thing) = self.arena.get(i) else {
            return;
        };
        let (kind, team, num) = (
            thing.kind(),
            thing.team,
            thing.as_ship().map_or(0, |s| s.num) as usize,
        );
        let Some(team) = team.and_then(|t| self.teams.get_mut(t)) else {
            return;
        };
        match kind {
            ThingKind::Station => team.station = Some(i),
            ThingKind::Ship if num < team.ships.len() => team.ships[num] = Some(i),
            _ => {}
        }
    }

    // -- team plumbing -------------------------------------------------------

    /// Clear a team's message text and all of its ships' orders.
    pub fn reset_team(&mut self, t: usize) -> Result<(), SimError> {
        let teams_len = self.teams.len();
        let team = self.teams.get_mut(t).ok_or(SimError::BadTeamSlot {
            slot: t,
            teams: teams_len,
        })?;
        team.message.clear();
        let ships: Vec<usize> = team.live_ships().collect();
        for i in ships {
            if let Some(state) = self.arena.get_mut(i).and_then(|th| th.as_ship_mut()) {
                state.clear_orders();
            }
        }
        Ok(())
    }

    /// Append a line to the announcer feed (dropped whole if the buffer
    /// is full).
    pub fn add_announcement(&mut self, line: &str) {
        debug!(announce = line);
        self.announcer.push_line(line);
    }

    // -- determinism helpers -------------------------------------------------

    /// BLAKE3 hex digest of the packed snapshot. Two worlds that hash
    /// equal are wire-identical.
    pub fn state_hash(&self) -> String {
        let mut buf = vec![0u8; self.serial_size()];
        let n = self.pack(&mut buf).expect("world buffer sized by serial_size");
        blake3::hash(&buf[..n]).to_hex().to_string()
    }

    /// Clone the world through a snapshot round-trip, the same path
    /// clients use. Arena indices may renumber; team and ship numbers
    /// are stable.
    pub fn deep_copy(&self) -> Result<World, SimError> {
        let mut buf = vec![0u8; self.serial_size()];
        let n = self.pack(&mut buf)?;
        let mut copy = World::new(self.config.clone(), self.teams.len(), COPY_SEED);
        copy.settle();
        copy.unpack(&buf[..n])?;
        Ok(copy)
    }
}

/// Seed for the throwaway RNG of worlds reconstructed from snapshots.
/// Such worlds never spawn their own asteroids, so the seed only feeds
/// placeholder IDs that the snapshot immediately overwrites.
const COPY_SEED: u64 = 0x5EED_C0DE;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;

    fn two_team_world() -> World {
        let mut w = World::new(GameConfig::default(), 2, 42);
        w.settle();
        w
    }

    #[test]
    fn settle_places_stations_then_ships() {
        let w = two_team_world();
        // Team 0: slots 0..=4, team 1: slots 5..=9.
        assert_eq!(w.teams[0].station, Some(0));
        assert_eq!(w.teams[0].ships, [Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(w.teams[1].station, Some(5));
        assert_eq!(w.teams[1].ships, [Some(6), Some(7), Some(8), Some(9)]);
        assert_eq!(w.arena.get(0).unwrap().kind(), ThingKind::Station);
        assert_eq!(w.arena.get(0).unwrap().pos, Coord::new(-256.0, -256.0));
    }

    #[test]
    fn ships_spawn_docked_at_their_station() {
        let w = two_team_world();
        for t in 0..2 {
            for i in w.teams[t].live_ships() {
                let ship = w.arena.get(i).unwrap();
                assert!(ship.as_ship().unwrap().docked);
                assert_eq!(ship.pos, w.config.spawn_coord(t));
            }
        }
    }

    #[test]
    fn deferred_asteroids_appear_after_resolve() {
        let mut w = two_team_world();
        w.create_asteroids(Material::Vinyl, 5, 40.0);
        assert_eq!(w.arena.live_count(), 10);
        w.physics_step(0.2);
        assert_eq!(w.arena.live_count(), 15);
    }

    #[test]
    fn a_turn_advances_time_by_one_second() {
        let mut w = two_team_world();
        for _ in 0..5 {
            w.physics_step(0.2);
        }
        w.laser_pass();
        assert!((w.game_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn idle_game_reaches_the_end_quietly() {
        let mut w = two_team_world();
        w.create_asteroids(Material::Vinyl, 5, 40.0);
        w.create_asteroids(Material::Uranium, 5, 40.0);
        w.settle();

        for _ in 0..300 {
            for _ in 0..5 {
                w.physics_step(0.2);
            }
            w.laser_pass();
        }
        assert!((w.game_time() - 300.0).abs() < 1e-6);
        assert_eq!(w.team_score(0), 0.0);
        assert_eq!(w.team_score(1), 0.0);
        for t in 0..2 {
            assert_eq!(w.teams[t].live_ships().count(), 4);
            for i in w.teams[t].live_ships() {
                assert!(w.arena.get(i).unwrap().as_ship().unwrap().docked);
            }
        }
    }

    #[test]
    fn state_hash_is_stable_and_sensitive() {
        let w = two_team_world();
        let h1 = w.state_hash();
        let h2 = w.state_hash();
        assert_eq!(h1, h2);

        let mut w2 = two_team_world();
        assert_eq!(w2.state_hash(), h1, "same seed, same construction");
        w2.physics_step(0.2);
        assert_ne!(w2.state_hash(), h1);
    }
}
