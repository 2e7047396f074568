//! Per-turn journal: one JSON line per completed turn.
//!
//! Records the turn number, simulation time, the BLAKE3 state hash of
//! the broadcast snapshot, and the scores. Two servers given the same
//! seed and order streams must produce byte-identical journals, which
//! makes the file a cheap cross-host determinism check and a scoreboard
//! audit trail.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::ServerError;

/// One journal line.
#[derive(Debug, Serialize)]
pub struct TurnRecord<'a> {
    pub turn: u64,
    pub game_time: f64,
    pub state_hash: &'a str,
    pub scores: Vec<f64>,
}

/// An append-only JSONL turn journal.
#[derive(Debug)]
pub struct Journal {
    out: BufWriter<File>,
}

impl Journal {
    /// Create (truncate) the journal file.
    pub fn create(path: &Path) -> Result<Journal, ServerError> {
        Ok(Journal {
            out: BufWriter::new(File::create(path)?),
        })
    }

    /// Append one turn record and flush it to disk.
    pub fn record(&mut self, rec: &TurnRecord<'_>) -> Result<(), ServerError> {
        let line = serde_json::to_string(rec).map_err(|e| {
            ServerError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
