//! The turn-loop driver: handshake, simulation cadence, broadcast,
//! order receipt, think-time accounting, and pause control.
//!
//! The cadence per turn is the contest's: five physics substeps with
//! the laser pass folded into the last, the observer serviced after
//! every substep, then a full broadcast to the teams, then a blocking
//! wait for every team's orders. Think time is measured in monotonic
//! wall-clock seconds (never simulation time): a single turn over the
//! per-turn limit forfeits that turn's orders; blowing the cumulative
//! budget severs the connection.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use vinyl_sim::config::GameConfig;
use vinyl_sim::thing::Material;
use vinyl_sim::world::World;
use vinyl_wire::frames;
use vinyl_wire::Wire;

use crate::journal::{Journal, TurnRecord};
use crate::net::Transport;
use crate::ServerError;

/// Observer refresh interval while waiting on slow teams.
const OBSERVER_REFRESH: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// The authoritative game server.
pub struct Server {
    world: World,
    net: Transport,
    num_teams: usize,
    /// Connection number of the observer, once identified.
    obs_conn: Option<usize>,
    /// Connection number per team slot, once identified.
    team_conns: Vec<Option<usize>>,
    /// Open flag per connection (index = conn - 1); cleared on loss.
    open: Vec<bool>,
    paused: bool,
    started: Instant,
    world_buf: Vec<u8>,
    journal: Option<Journal>,
    turn: u64,
}

impl Server {
    /// Bind the port and build the starting world: the teams, their
    /// docked fleets, and the seed asteroid field.
    pub fn new(
        config: GameConfig,
        num_teams: usize,
        port: u16,
        seed: u64,
        journal_path: Option<&Path>,
    ) -> Result<Server, ServerError> {
        config.validate()?;
        let net = Transport::bind(port, num_teams + 1)?;

        let mut world = World::new(config.clone(), num_teams, seed);
        world.create_asteroids(Material::Vinyl, config.starting_vinyl, config.starting_asteroid_mass);
        world.create_asteroids(
            Material::Uranium,
            config.starting_uranium,
            config.starting_asteroid_mass,
        );
        world.settle();

        let journal = journal_path.map(Journal::create).transpose()?;

        info!(num_teams, port = %net.local_addr()?.port(), "world created, ready for connections");
        Ok(Server {
            world,
            net,
            num_teams,
            obs_conn: None,
            team_conns: vec![None; num_teams],
            open: vec![false; num_teams + 1],
            paused: false,
            started: Instant::now(),
            world_buf: vec![0u8; vinyl_sim::snapshot::MAX_SNAPSHOT_LEN as usize],
            journal,
            turn: 0,
        })
    }

    /// The bound port (ephemeral in tests).
    pub fn port(&self) -> Result<u16, ServerError> {
        Ok(self.net.local_addr()?.port())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, p: bool) {
        self.paused = p;
    }

    /// Monotonic seconds since server start, millisecond resolution.
    /// Timeouts are measured here, never in simulation time.
    fn timestamp(&self) -> f64 {
        self.started.elapsed().as_millis() as f64 / 1000.0
    }

    // -- handshake -----------------------------------------------------------

    /// Accept all clients, acknowledge them, classify them as teams or
    /// the observer, and introduce the world's shape.
    pub fn connect_clients(&mut self) -> Result<(), ServerError> {
        for _ in 0..self.num_teams + 1 {
            let conn = self.net.wait_for_conn()?;
            self.open[conn - 1] = true;
            self.net.send(conn, frames::SERVER_ACK);
        }

        let hello_len = frames::TEAM_HELLO.len();
        let mut classified = vec![false; self.num_teams + 1];
        let mut team_index = 0usize;
        let mut total = 0usize;

        while total < self.num_teams + 1 {
            for conn in 1..=self.num_teams + 1 {
                if classified[conn - 1] || self.net.queue_len(conn) < hello_len {
                    continue;
                }
                let q = self.net.queue(conn);
                if q.starts_with(frames::OBSERVER_HELLO) {
                    self.obs_conn = Some(conn);
                    self.net.send(conn, &[frames::OBSERVER_ACCEPTED]);
                    info!(conn, "observer identified");
                } else if q.starts_with(frames::TEAM_HELLO) {
                    if team_index >= self.num_teams {
                        warn!(conn, "extra team hello ignored");
                        self.net.flush(conn);
                        continue;
                    }
                    self.team_conns[team_index] = Some(conn);
                    self.net.send(conn, &[team_index as u8]);
                    info!(conn, team = team_index, "team identified");
                    team_index += 1;
                } else {
                    // Unrecognizable hello; drop it and wait for more.
                    self.net.flush(conn);
                    continue;
                }
                classified[conn - 1] = true;
                total += 1;
                self.net.flush(conn);
                self.introduce_world(conn);
            }
            if total < self.num_teams + 1 {
                self.net.poll(OBSERVER_REFRESH);
            }
        }
        Ok(())
    }

    /// Two bytes of shape: team count and ships per team.
    fn introduce_world(&mut self, conn: usize) {
        let ships = self.world.teams.first().map_or(0, |t| t.ship_count);
        self.net.send(conn, &[self.num_teams as u8, ships as u8]);
    }

    /// Collect each team's init packet (names and capacity split),
    /// apply it, and forward it to the observer.
    pub fn meet_teams(&mut self) -> Result<(), ServerError> {
        let mut got = vec![false; self.num_teams];
        let mut total = 0usize;

        while total < self.num_teams {
            for tn in 0..self.num_teams {
                if got[tn] {
                    continue;
                }
                let Some(conn) = self.team_conns[tn] else {
                    got[tn] = true;
                    total += 1;
                    continue;
                };
                if self.net.queue_len(conn) >= self.world.init_record_size(tn) {
                    got[tn] = true;
                    total += 1;
                }
            }
            if total >= self.num_teams {
                break;
            }
            self.net.poll(OBSERVER_REFRESH);
        }

        for tn in 0..self.num_teams {
            let Some(conn) = self.team_conns[tn] else {
                continue;
            };
            let need = self.world.init_record_size(tn);
            let packet = self.net.queue(conn)[..need].to_vec();
            self.world.apply_init_record(tn, &packet)?;
            self.wait_for_observer();
            if let Some(obs) = self.obs_conn {
                self.net.send(obs, &packet);
            }
            self.net.flush(conn);
            info!(team = tn, name = %self.world.teams[tn].name, "team registered");
        }
        Ok(())
    }

    // -- the turn loop -------------------------------------------------------

    /// Run the full game: handshake, then turns until time runs out.
    pub fn run(&mut self) -> Result<(), ServerError> {
        self.connect_clients()?;
        self.meet_teams()?;

        while self.world.game_time() < self.world.config().game_duration {
            self.simulation();
            self.broadcast_world();
            self.receive_orders();
            self.record_turn()?;
        }
        self.world.set_game_over();

        for t in 0..self.num_teams {
            info!(
                team = %self.world.teams[t].name,
                score = self.world.team_score(t),
                "final score"
            );
        }
        Ok(())
    }

    /// One turn of simulation: five substeps, the laser pass on the
    /// last, the observer refreshed after each, team messages cleared
    /// as they are consumed.
    pub fn simulation(&mut self) {
        if self.paused {
            // Frozen: keep the observer alive, advance nothing.
            self.wait_for_observer();
            self.send_world_to_observer();
            return;
        }

        let substeps = self.world.config().substeps_per_turn();
        let dt = self.world.config().physics_dt;
        for k in 0..substeps {
            self.world.physics_step(dt);
            if k + 1 == substeps {
                self.world.laser_pass();
            }
            self.wait_for_observer();
            self.send_world_to_observer();
            for t in 0..self.num_teams {
                self.world.teams[t].message.clear();
            }
        }
        self.turn += 1;
    }

    /// Length-prefixed world snapshot to every open team connection,
    /// then stamp each team's think-time clock start.
    pub fn broadcast_world(&mut self) {
        if self.paused {
            return;
        }
        for tn in 0..self.num_teams {
            let Some(conn) = self.team_conns[tn] else {
                continue;
            };
            if !self.open[conn - 1] || !self.net.is_open(conn) {
                continue;
            }
            self.send_world(conn);
        }
        let now = self.timestamp();
        for tn in 0..self.num_teams {
            self.world.stamps[tn] = now;
        }
    }

    fn send_world_to_observer(&mut self) {
        if let Some(obs) = self.obs_conn {
            if self.open[obs - 1] {
                self.send_world(obs);
            }
        }
    }

    fn send_world(&mut self, conn: usize) -> usize {
        if !self.open[conn - 1] {
            return 0;
        }
        if !self.net.is_open(conn) {
            self.open[conn - 1] = false;
            info!(conn, "lost connection");
            return 0;
        }

        let need = self.world.serial_size();
        if need > self.world_buf.len() {
            warn!(need, "snapshot exceeds the world buffer, not sent");
            return 0;
        }
        let len = match self.world.pack(&mut self.world_buf) {
            Ok(len) => len,
            Err(e) => {
                warn!(error = %e, "snapshot serialization failure");
                return 0;
            }
        };
        if len != need {
            warn!(len, need, "snapshot size prediction mismatch, not sent");
            return 0;
        }

        self.net.send(conn, &(len as u32).to_be_bytes());
        self.net.send(conn, &self.world_buf[..len]);
        len
    }

    /// Wait for every team's orders, servicing the observer every few
    /// seconds and enforcing both think-time limits.
    pub fn receive_orders(&mut self) {
        if self.paused {
            self.wait_for_observer();
            self.send_world_to_observer();
            return;
        }

        let turn_limit = self.world.config().turn_think_limit;
        let total_limit = self.world.config().total_think_limit;

        let mut got = vec![false; self.num_teams];
        let mut total = 0usize;
        for tn in 0..self.num_teams {
            if let Err(e) = self.world.reset_team(tn) {
                warn!(team = tn, error = %e, "reset failed");
            }
        }

        let tstart = self.timestamp();
        let mut tobs = tstart;

        while total < self.num_teams {
            let tnow = self.timestamp();
            if tnow - tobs >= OBSERVER_REFRESH.as_secs_f64() {
                self.wait_for_observer();
                self.send_world_to_observer();
                tobs = tnow;
            }

            for tn in 0..self.num_teams {
                if got[tn] {
                    continue;
                }
                let Some(conn) = self.team_conns[tn] else {
                    got[tn] = true;
                    total += 1;
                    continue;
                };
                if !self.open[conn - 1] {
                    // Severed earlier: count it and move on.
                    got[tn] = true;
                    total += 1;
                    continue;
                }
                if !self.net.is_open(conn) {
                    self.open[conn - 1] = false;
                    info!(team = %self.world.teams[tn].name, "team disconnected");
                    continue;
                }

                // Think-time accounting against monotonic wall time.
                let mut elapsed = tnow - self.world.stamps[tn];
                if self.world.clocks[tn] == 0.0 {
                    elapsed = 0.01; // First turn: charge a token amount.
                }
                self.world.clocks[tn] += elapsed;
                self.world.stamps[tn] = tnow;
                if self.world.clocks[tn] > total_limit {
                    info!(team = %self.world.teams[tn].name, "think budget exhausted, severing");
                    self.net.close(conn);
                    continue;
                }
                if tnow - tstart > turn_limit {
                    info!(team = %self.world.teams[tn].name, "turn timeout, orders ignored");
                    got[tn] = true;
                    total += 1;
                    continue;
                }

                let need = self.world.orders_record_size(tn);
                if self.net.queue_len(conn) >= need {
                    got[tn] = true;
                    total += 1;
                    let packet = self.net.queue(conn)[..need].to_vec();
                    match self.world.unpack_orders_record(tn, &packet) {
                        Ok(_) => {}
                        Err(e) => {
                            warn!(team = tn, error = %e, "malformed orders, dropping client");
                            self.net.close(conn);
                            self.open[conn - 1] = false;
                        }
                    }
                    self.net.flush(conn);
                }
            }
            if total >= self.num_teams {
                break;
            }
            self.net.poll(OBSERVER_REFRESH);
        }
    }

    /// Block until the observer acknowledges, handling pause and resume
    /// control strings along the way.
    pub fn wait_for_observer(&mut self) {
        let Some(obs) = self.obs_conn else {
            return;
        };
        if !self.open[obs - 1] {
            return;
        }

        loop {
            while self.net.queue_len(obs) < frames::OBSERVER_ACK.len() {
                self.net.poll(OBSERVER_REFRESH);
                if !self.net.is_open(obs) {
                    self.open[obs - 1] = false;
                    info!("observer disconnected");
                    return;
                }
            }

            let q = self.net.queue(obs);
            if q.starts_with(frames::PAUSE) {
                self.set_paused(true);
                self.net.flush(obs);
                info!("observer requested pause");
                continue;
            }
            if q.starts_with(frames::RESUME) {
                self.set_paused(false);
                self.net.flush(obs);
                info!("observer requested resume");
                self.resume_sync();
                continue;
            }
            if q.starts_with(frames::OBSERVER_ACK) {
                break;
            }
            // Whatever it was, it was wrong.
            self.net.flush(obs);
        }
        self.net.flush(obs);
    }

    /// After a resume: restart every team's think-time stopwatch and
    /// push a fresh snapshot so clients pick up where they left off.
    /// Simulation state is untouched -- pausing must not drift it.
    pub fn resume_sync(&mut self) {
        let now = self.timestamp();
        for tn in 0..self.num_teams {
            self.world.stamps[tn] = now;
        }
        for tn in 0..self.num_teams {
            let Some(conn) = self.team_conns[tn] else {
                continue;
            };
            if self.open[conn - 1] && self.net.is_open(conn) {
                self.send_world(conn);
            }
        }
    }

    fn record_turn(&mut self) -> Result<(), ServerError> {
        if self.journal.is_none() {
            return Ok(());
        }
        let hash = self.world.state_hash();
        let scores = (0..self.num_teams).map(|t| self.world.team_score(t)).collect();
        let rec = TurnRecord {
            turn: self.turn,
            game_time: self.world.game_time(),
            state_hash: &hash,
            scores,
        };
        if let Some(j) = self.journal.as_mut() {
            j.record(&rec)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_server() -> Server {
        Server::new(GameConfig::default(), 2, 0, 77, None).unwrap()
    }

    #[test]
    fn the_starting_world_is_settled() {
        let s = quiet_server();
        // 2 stations + 8 ships + 10 seed asteroids.
        assert_eq!(s.world().arena.live_count(), 20);
        assert_eq!(s.world().game_time(), 0.0);
    }

    #[test]
    fn pause_freezes_simulation_time_and_state() {
        let mut s = quiet_server();
        let hash = s.world().state_hash();
        s.set_paused(true);

        // With no observer connected, a paused simulation call returns
        // without touching the world.
        s.simulation();
        s.broadcast_world();
        s.receive_orders();

        assert_eq!(s.world().game_time(), 0.0);
        assert_eq!(s.world().state_hash(), hash);
    }

    #[test]
    fn resume_restarts_the_think_clocks() {
        let mut s = quiet_server();
        s.world_mut().stamps[0] = -100.0;
        s.world_mut().stamps[1] = -100.0;
        s.resume_sync();
        assert!(s.world().stamps[0] >= 0.0);
        assert!(s.world().stamps[1] >= 0.0);
    }

    #[test]
    fn simulation_advances_one_second_per_turn() {
        let mut s = quiet_server();
        // No observer: waits are no-ops, the cadence still runs.
        s.simulation();
        assert!((s.world().game_time() - 1.0).abs() < 1e-9);
        s.simulation();
        assert!((s.world().game_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn missing_teams_do_not_stall_order_receipt() {
        let mut s = quiet_server();
        // Neither team ever connected; receive_orders must return.
        s.receive_orders();
        assert_eq!(s.world().game_time(), 0.0);
    }
}
