//! World snapshot and team packet codecs.
//!
//! The snapshot wire order is: header (`first_index`, `last_index`,
//! `game_time`, announcer buffer), then per team slot a wall-clock
//! scalar and the team's orders record, then every live thing as a
//! marker-framed record:
//!
//! ```text
//! | 666 | next_index | byte size | kind | team discriminant | thing bytes |
//! ```
//!
//! For ships the discriminant's low byte is the team slot and the high
//! byte the ship number; for asteroids it carries the material. The
//! marker is a structural sanity check -- a mismatch abandons the
//! decode (`WireError::Marker`); there is no partial recovery.
//!
//! Unpacking reconciles an existing world against the stream: things
//! the stream skipped die, unknown records materialize fresh things
//! (ships and stations re-attach to their teams by discriminant), and
//! trailing slots beyond the stream's last index die. This is the same
//! path clients use every turn and the engine's own deep copy uses; it
//! is why arena indices are not stable across copies.

use tracing::warn;
use vinyl_wire::frames::RECORD_MARKER;
use vinyl_wire::{
    Name, Reader, Wire, WireError, Writer, ANNOUNCER_LEN, NAME_LEN, SCALAR_SIZE, TEAM_NAME_LEN,
    TEAM_TEXT_LEN, U32_SIZE,
};

use crate::coord::Coord;
use crate::ship::{self, ShipStat, ORDER_KINDS};
use crate::station;
use crate::team::MAX_SHIPS;
use crate::thing::{Material, Thing, ThingKind};
use crate::world::World;

/// Bytes of the per-thing record frame preceding the thing's own bytes.
pub const THING_HEADER_SIZE: usize = 5 * U32_SIZE;

/// Largest plausible snapshot; length headers beyond this are garbage.
pub const MAX_SNAPSHOT_LEN: u32 = (crate::arena::MAX_THINGS * 256) as u32;

const WIRE_NONE: u32 = u32::MAX;

fn index_to_wire(i: Option<usize>) -> u32 {
    i.map_or(WIRE_NONE, |v| v as u32)
}

fn index_from_wire(v: u32) -> Option<usize> {
    (v != WIRE_NONE).then_some(v as usize)
}

// ---------------------------------------------------------------------------
// Team records
// ---------------------------------------------------------------------------

impl World {
    /// Size of a team's orders record: message text plus five order
    /// scalars per ship slot, present or not.
    pub fn orders_record_size(&self, t: usize) -> usize {
        TEAM_TEXT_LEN + self.teams[t].ship_count * ORDER_KINDS.len() * SCALAR_SIZE
    }

    /// Pack a team's message and current ship orders.
    pub fn pack_orders_record(&self, t: usize, buf: &mut [u8]) -> Result<usize, WireError> {
        let need = self.orders_record_size(t);
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_bytes(self.teams[t].message.as_bytes())?;
        for num in 0..self.teams[t].ship_count {
            let state = self.teams[t].ships[num]
                .and_then(|i| self.arena.get(i))
                .and_then(Thing::as_ship);
            for ord in ORDER_KINDS {
                w.put_scalar(state.map_or(0.0, |s| s.order(ord)))?;
            }
        }
        Ok(w.written())
    }

    /// Unpack a team's orders record, routing every value through
    /// [`Thing::set_order`] so stored orders are always the validated,
    /// clamped form regardless of what the client sent.
    pub fn unpack_orders_record(&mut self, t: usize, buf: &[u8]) -> Result<usize, WireError> {
        let need = self.orders_record_size(t);
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }
        let cfg = self.config.clone();
        let consumed = self.teams[t].message.unpack(buf)?;
        let mut r = Reader::new(buf);
        r.skip(consumed)?;

        for num in 0..self.teams[t].ship_count {
            let si = self.teams[t].ships[num];
            if let Some(state) = si
                .and_then(|i| self.arena.get_mut(i))
                .and_then(Thing::as_ship_mut)
            {
                state.clear_orders();
            }
            for ord in ORDER_KINDS {
                let val = r.get_scalar()?;
                if let Some(th) = si.and_then(|i| self.arena.get_mut(i)) {
                    th.set_order(&cfg, ord, val);
                }
            }
        }
        Ok(r.consumed())
    }

    /// Size of a team's init packet.
    pub fn init_record_size(&self, t: usize) -> usize {
        U32_SIZE
            + TEAM_NAME_LEN
            + NAME_LEN
            + self.teams[t].ship_count * (2 * SCALAR_SIZE + NAME_LEN)
    }

    /// Pack a team's init data: number, names, and per-ship capacities.
    pub fn pack_init_record(&self, t: usize, buf: &mut [u8]) -> Result<usize, WireError> {
        let need = self.init_record_size(t);
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }
        let team = &self.teams[t];
        let mut w = Writer::new(buf);
        w.put_u32(team.number)?;
        w.put_bytes(team.name.as_bytes())?;
        let station_name = team
            .station
            .and_then(|i| self.arena.get(i))
            .map_or_else(Name::new, |th| th.name);
        w.put_bytes(station_name.as_bytes())?;

        for num in 0..team.ship_count {
            let th = team.ships[num].and_then(|i| self.arena.get(i));
            let state = th.and_then(Thing::as_ship);
            w.put_scalar(state.map_or(0.0, |s| s.capacity(ShipStat::Cargo)))?;
            w.put_scalar(state.map_or(0.0, |s| s.capacity(ShipStat::Fuel)))?;
            w.put_bytes(th.map_or_else(Name::new, |x| x.name).as_bytes())?;
        }
        Ok(w.written())
    }

    /// Apply a team's init packet: names, cargo/fuel capacity split
    /// (cargo applies first; fuel re-clamps under the shared budget),
    /// fuel filled to the declared capacity, shields set to the initial
    /// level.
    pub fn apply_init_record(&mut self, t: usize, buf: &[u8]) -> Result<usize, WireError> {
        let need = self.init_record_size(t);
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }
        let max_total = self.config.max_stat_total;
        let initial_shield = self.config.initial_shield;

        let mut r = Reader::new(buf);
        self.teams[t].number = r.get_u32()?;
        let consumed = self.teams[t].name.unpack(&buf[r.consumed()..])?;
        r.skip(consumed)?;

        let mut station_name = Name::new();
        let consumed = station_name.unpack(&buf[r.consumed()..])?;
        r.skip(consumed)?;
        if let Some(th) = self.teams[t].station.and_then(|i| self.arena.get_mut(i)) {
            th.name = station_name;
        }

        for num in 0..self.teams[t].ship_count {
            let cargo_cap = r.get_scalar()?;
            let fuel_cap = r.get_scalar()?;
            let mut name = Name::new();
            let consumed = name.unpack(&buf[r.consumed()..])?;
            r.skip(consumed)?;

            let Some(th) = self.teams[t].ships[num].and_then(|i| self.arena.get_mut(i)) else {
                continue;
            };
            th.name = name;
            let Some(state) = th.as_ship_mut() else {
                continue;
            };
            state.set_capacity(ShipStat::Cargo, cargo_cap, max_total);
            let fuel_cap = state.set_capacity(ShipStat::Fuel, fuel_cap, max_total);
            state.set_amount(ShipStat::Fuel, fuel_cap);
            state.set_amount(ShipStat::Shield, initial_shield);
        }
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// World snapshot
// ---------------------------------------------------------------------------

impl Wire for World {
    fn serial_size(&self) -> usize {
        let mut tot = 2 * U32_SIZE + SCALAR_SIZE + ANNOUNCER_LEN;
        for t in 0..self.teams.len() {
            tot += SCALAR_SIZE + self.orders_record_size(t);
        }
        for i in self.arena.traversal() {
            let th = self.arena.get(i).expect("traversal yields occupied slots");
            tot += THING_HEADER_SIZE + th.serial_size();
        }
        tot
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let need = self.serial_size();
        if buf.len() < need {
            return Err(WireError::Short {
                need,
                have: buf.len(),
            });
        }

        let mut at;
        {
            let mut w = Writer::new(buf);
            w.put_u32(index_to_wire(self.arena.first_index()))?;
            w.put_u32(index_to_wire(self.arena.last_index()))?;
            w.put_scalar(self.game_time)?;
            w.put_bytes(self.announcer.as_bytes())?;
            at = w.written();
        }

        for t in 0..self.teams.len() {
            {
                let mut w = Writer::new(&mut buf[at..]);
                w.put_scalar(self.clocks[t])?;
                at += w.written();
            }
            at += self.pack_orders_record(t, &mut buf[at..])?;
        }

        for i in self.arena.traversal() {
            let th = self.arena.get(i).expect("traversal yields occupied slots");
            let mut disc = th.team.map_or(0, |t| t as u32);
            match th.kind() {
                ThingKind::Ship => {
                    disc |= th.as_ship().map_or(0, |s| s.num) << 8;
                }
                ThingKind::Asteroid => {
                    disc = th.as_asteroid().map_or(0, |a| a.material as u32);
                }
                _ => {}
            }
            {
                let mut w = Writer::new(&mut buf[at..]);
                w.put_u32(RECORD_MARKER)?;
                w.put_u32(index_to_wire(self.arena.next_index(i)))?;
                w.put_u32(th.serial_size() as u32)?;
                w.put_u32(th.kind() as u32)?;
                w.put_u32(disc)?;
                at += w.written();
            }
            at += th.pack(&mut buf[at..])?;
        }
        Ok(at)
    }

    fn unpack(&mut self, buf: &[u8]) -> Result<usize, WireError> {
        let mut r = Reader::new(buf);
        let stream_first = index_from_wire(r.get_u32()?);
        let stream_last = index_from_wire(r.get_u32()?);
        self.game_time = r.get_scalar()?;
        let consumed = self.announcer.unpack(&buf[r.consumed()..])?;
        r.skip(consumed)?;

        for t in 0..self.teams.len() {
            self.clocks[t] = r.get_scalar()?;
            let used = self.unpack_orders_record(t, &buf[r.consumed()..])?;
            r.skip(used)?;
        }

        let Some(stream_last) = stream_last else {
            // An empty stream kills the whole registry.
            for i in self.arena.traversal() {
                if let Some(th) = self.arena.get_mut(i) {
                    th.kill();
                }
            }
            self.sweep_and_sync();
            return Ok(r.consumed());
        };
        if stream_last >= crate::arena::MAX_THINGS {
            return Err(WireError::Header {
                len: stream_last as u32,
                limit: crate::arena::MAX_THINGS as u32,
            });
        }

        let mut expected = stream_first;
        let mut i = match (self.arena.first_index(), stream_first) {
            (Some(f), Some(s)) => f.min(s),
            (None, Some(s)) => s,
            (Some(f), None) => f,
            (None, None) => 0,
        };
        while i <= stream_last {
            if Some(i) == expected {
                let marker = r.get_u32()?;
                if marker != RECORD_MARKER {
                    return Err(WireError::Marker { found: marker });
                }
                let next = index_from_wire(r.get_u32()?);
                let declared = r.get_u32()? as usize;
                let kind = ThingKind::from_u32(r.get_u32()?);
                let disc = r.get_u32()?;

                if self.arena.get(i).map_or(true, |th| th.kind() != kind) {
                    self.materialize(i, kind, disc);
                }
                let th = self.arena.get_mut(i).expect("slot just materialized");
                let used = th.unpack(&buf[r.consumed()..])?;
                if used != declared {
                    warn!(used, declared, slot = i, "thing record size mismatch");
                }
                th.world_index = Some(i);
                r.skip(used)?;

                expected = next;
                if expected.is_none() {
                    break;
                }
            } else if let Some(th) = self.arena.get_mut(i) {
                // The stream skipped this occupied slot: it died.
                th.kill();
            }
            i += 1;
        }

        if let Some(cur_last) = self.arena.last_index() {
            if cur_last > stream_last {
                for k in (stream_last + 1)..=cur_last {
                    if let Some(th) = self.arena.get_mut(k) {
                        th.kill();
                    }
                }
            }
        }

        self.arena.relink();
        self.sweep_and_sync();
        Ok(r.consumed())
    }
}

impl World {
    /// Decode a length-prefixed snapshot frame, the form teams receive
    /// on the wire: a big-endian `u32` byte length, then the snapshot.
    /// Rejects implausible headers outright (`WireError::Header`) --
    /// the framing layer recovers by dropping the connection, never by
    /// partial decode.
    pub fn unpack_framed(&mut self, buf: &[u8]) -> Result<usize, WireError> {
        let mut r = Reader::new(buf);
        let len = r.get_u32()?;
        if len == 0 || len > MAX_SNAPSHOT_LEN {
            return Err(WireError::Header {
                len,
                limit: MAX_SNAPSHOT_LEN,
            });
        }
        if r.remaining() < len as usize {
            return Err(WireError::Short {
                need: U32_SIZE + len as usize,
                have: buf.len(),
            });
        }
        let used = self.unpack(&buf[U32_SIZE..U32_SIZE + len as usize])?;
        Ok(U32_SIZE + used)
    }

    /// Build a fresh thing for an unknown snapshot record, attaching
    /// ships and stations to their team by discriminant.
    fn materialize(&mut self, slot: usize, kind: ThingKind, disc: u32) {
        let fresh = match kind {
            ThingKind::Ship => {
                let num = (disc >> 8) as usize;
                let tm = (disc & 0xFF) as usize;
                let th = ship::ship(&self.config, 0, tm, num as u32, Coord::ORIGIN);
                if let Some(team) = self.teams.get_mut(tm) {
                    if num < MAX_SHIPS {
                        team.ships[num] = Some(slot);
                    }
                }
                th
            }
            ThingKind::Station => {
                let tm = (disc & 0xFF) as usize;
                let th = station::station(0, tm, Coord::ORIGIN);
                if let Some(team) = self.teams.get_mut(tm) {
                    team.station = Some(slot);
                }
                th
            }
            ThingKind::Asteroid => {
                let mut th = Thing::placeholder(0, ThingKind::Asteroid);
                if let Some(a) = th.as_asteroid_mut() {
                    a.material = Material::from_u32(disc);
                }
                th
            }
            ThingKind::Generic => Thing::placeholder(0, ThingKind::Generic),
        };
        self.arena.place_direct(slot, fresh);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ship::OrderKind;

    fn game_world() -> World {
        let mut w = World::new(GameConfig::default(), 2, 123);
        w.create_asteroids(Material::Vinyl, 5, 40.0);
        w.create_asteroids(Material::Uranium, 5, 40.0);
        w.settle();
        w
    }

    #[test]
    fn snapshot_round_trip_is_wire_identical() {
        let mut w = game_world();
        w.add_announcement("first blood");
        let mut buf = vec![0u8; w.serial_size()];
        let n = w.pack(&mut buf).unwrap();
        assert_eq!(n, buf.len());

        let copy = w.deep_copy().unwrap();
        assert_eq!(copy.state_hash(), w.state_hash());
        assert_eq!(copy.game_time(), w.game_time());
        assert_eq!(copy.announcer.display(), "first blood");
        assert_eq!(copy.arena.live_count(), w.arena.live_count());
    }

    #[test]
    fn round_trip_survives_a_played_turn() {
        let mut w = game_world();
        let cfg = w.config().clone();
        let i = w.teams[0].ships[1].unwrap();
        w.arena.get_mut(i).unwrap().set_order(&cfg, OrderKind::Thrust, 20.0);
        for _ in 0..5 {
            w.physics_step(0.2);
        }
        w.laser_pass();

        let copy = w.deep_copy().unwrap();
        assert_eq!(copy.state_hash(), w.state_hash());
    }

    #[test]
    fn marker_mismatch_aborts_the_decode() {
        let w = game_world();
        let mut buf = vec![0u8; w.serial_size()];
        w.pack(&mut buf).unwrap();

        // The first thing record sits right after the header and team
        // records; stomp its marker.
        let mut at = 2 * U32_SIZE + SCALAR_SIZE + ANNOUNCER_LEN;
        for t in 0..w.teams.len() {
            at += SCALAR_SIZE + w.orders_record_size(t);
        }
        buf[at..at + 4].copy_from_slice(&999u32.to_be_bytes());

        let mut dst = World::new(GameConfig::default(), 2, 123);
        dst.settle();
        let err = dst.unpack(&buf).unwrap_err();
        assert!(matches!(err, WireError::Marker { found: 999 }));
    }

    #[test]
    fn things_missing_from_the_stream_die() {
        let mut w = game_world();
        let mut observer = w.deep_copy().unwrap();
        assert_eq!(observer.arena.live_count(), 20);

        // Kill an asteroid server-side; the next snapshot erases it from
        // the observer too.
        let ast = w
            .arena
            .traversal()
            .into_iter()
            .find(|&i| w.arena.get(i).unwrap().kind() == ThingKind::Asteroid)
            .unwrap();
        w.arena.get_mut(ast).unwrap().kill();
        w.resolve_pending();

        let mut buf = vec![0u8; w.serial_size()];
        let n = w.pack(&mut buf).unwrap();
        observer.unpack(&buf[..n]).unwrap();
        assert_eq!(observer.arena.live_count(), 19);
        assert_eq!(observer.state_hash(), w.state_hash());
    }

    #[test]
    fn dead_ships_clear_their_team_slot_on_unpack() {
        let mut w = game_world();
        let mut observer = w.deep_copy().unwrap();

        let i = w.teams[1].ships[2].unwrap();
        w.arena.get_mut(i).unwrap().kill();
        w.resolve_pending();
        assert_eq!(w.teams[1].ships[2], None);

        let mut buf = vec![0u8; w.serial_size()];
        let n = w.pack(&mut buf).unwrap();
        observer.unpack(&buf[..n]).unwrap();
        assert_eq!(observer.teams[1].ships[2], None);
        assert_eq!(observer.state_hash(), w.state_hash());
    }

    #[test]
    fn orders_record_round_trip_validates() {
        let mut w = game_world();
        let mut sender = w.deep_copy().unwrap();
        let cfg = sender.config().clone();

        // The sending side stores raw-ish orders; the receiving side
        // re-validates.
        sender.teams[0].message.set("attack the left flank");
        let i = sender.teams[0].ships[0].unwrap();
        sender
            .arena
            .get_mut(i)
            .unwrap()
            .set_order(&cfg, OrderKind::Turn, 2.0);

        let mut buf = vec![0u8; sender.orders_record_size(0)];
        let n = sender.pack_orders_record(0, &mut buf).unwrap();
        assert_eq!(n, buf.len());

        let used = w.unpack_orders_record(0, &buf).unwrap();
        assert_eq!(used, n);
        assert_eq!(w.teams[0].message.display(), "attack the left flank");
        let j = w.teams[0].ships[0].unwrap();
        let got = w.arena.get(j).unwrap().as_ship().unwrap().order(OrderKind::Turn);
        assert!((got - 2.0).abs() < 1e-9);
    }

    #[test]
    fn init_record_sets_capacities_fuel_and_shield() {
        let mut w = game_world();
        let t = 0;

        // A client-side team picks a 45/15 split and names everything.
        let mut client = w.deep_copy().unwrap();
        client.teams[t].name.set("The Groogroos");
        for num in 0..4 {
            let i = client.teams[t].ships[num].unwrap();
            let th = client.arena.get_mut(i).unwrap();
            th.name.set(&format!("Digger {num}"));
            let s = th.as_ship_mut().unwrap();
            s.set_capacity(ShipStat::Cargo, 45.0, 60.0);
            s.set_capacity(ShipStat::Fuel, 15.0, 60.0);
        }

        let mut buf = vec![0u8; client.init_record_size(t)];
        let n = client.pack_init_record(t, &mut buf).unwrap();
        assert_eq!(n, buf.len());

        let used = w.apply_init_record(t, &buf).unwrap();
        assert_eq!(used, n);
        assert_eq!(w.teams[t].name.display(), "The Groogroos");
        for num in 0..4 {
            let i = w.teams[t].ships[num].unwrap();
            let th = w.arena.get(i).unwrap();
            assert_eq!(th.name.display(), format!("Digger {num}"));
            let s = th.as_ship().unwrap();
            assert_eq!(s.capacity(ShipStat::Cargo), 45.0);
            assert_eq!(s.capacity(ShipStat::Fuel), 15.0);
            assert_eq!(s.amount(ShipStat::Fuel), 15.0);
            assert_eq!(s.amount(ShipStat::Shield), 15.0);
        }
    }

    #[test]
    fn snapshot_length_stays_plausible() {
        let w = game_world();
        assert!(w.serial_size() as u32 <= MAX_SNAPSHOT_LEN);
    }

    #[test]
    fn framed_decode_checks_the_header() {
        let w = game_world();
        let body = w.serial_size();
        let mut framed = vec![0u8; 4 + body];
        framed[..4].copy_from_slice(&(body as u32).to_be_bytes());
        w.pack(&mut framed[4..]).unwrap();

        let mut dst = World::new(GameConfig::default(), 2, 123);
        dst.settle();
        assert_eq!(dst.unpack_framed(&framed).unwrap(), framed.len());
        assert_eq!(dst.state_hash(), w.state_hash());

        // A ludicrous length header is rejected before any decode.
        framed[..4].copy_from_slice(&(MAX_SNAPSHOT_LEN + 1).to_be_bytes());
        let err = dst.unpack_framed(&framed).unwrap_err();
        assert!(matches!(err, WireError::Header { .. }));

        // A truncated frame is a short read, not a partial decode.
        framed[..4].copy_from_slice(&(body as u32).to_be_bytes());
        let err = dst.unpack_framed(&framed[..framed.len() - 1]).unwrap_err();
        assert!(matches!(err, WireError::Short { .. }));
    }
}
