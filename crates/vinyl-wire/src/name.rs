//! Fixed-width NUL-padded text buffers.
//!
//! Names and message texts travel as fixed-length byte arrays, copied
//! verbatim on pack/unpack regardless of logical length. Setting a value
//! sanitizes newlines to spaces and guarantees NUL termination, so a
//! buffer is always printable up to its first NUL.

use std::fmt;

use crate::codec::{Wire, Writer, Reader};
use crate::WireError;

/// Width of an entity name (ships, stations, asteroids).
pub const NAME_LEN: usize = 16;
/// Width of a team name.
pub const TEAM_NAME_LEN: usize = 33;
/// Width of a team's per-turn message text.
pub const TEAM_TEXT_LEN: usize = 512;
/// Width of the world's announcer feed.
pub const ANNOUNCER_LEN: usize = 2048;

/// An entity name.
pub type Name = FixedText<NAME_LEN>;
/// A team name.
pub type TeamName = FixedText<TEAM_NAME_LEN>;
/// A team's message text.
pub type TeamText = FixedText<TEAM_TEXT_LEN>;
/// The announcer feed.
pub type AnnouncerText = FixedText<ANNOUNCER_LEN>;

// ---------------------------------------------------------------------------
// FixedText
// ---------------------------------------------------------------------------

/// A fixed-width NUL-padded text buffer of `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedText<const N: usize>([u8; N]);

impl<const N: usize> FixedText<N> {
    /// An empty (all-NUL) buffer.
    pub fn new() -> Self {
        Self([0u8; N])
    }

    /// A buffer initialized from `s` (see [`set`](Self::set)).
    pub fn from_str(s: &str) -> Self {
        let mut t = Self::new();
        t.set(s);
        t
    }

    /// Overwrite the buffer with `s`, replacing newlines with spaces,
    /// truncating to `N - 1` bytes, and NUL-padding the remainder.
    pub fn set(&mut self, s: &str) {
        self.0 = [0u8; N];
        for (slot, &b) in self.0[..N - 1].iter_mut().zip(s.as_bytes()) {
            *slot = if b == b'\n' { b' ' } else { b };
        }
    }

    /// The raw fixed-width bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Logical length: bytes before the first NUL.
    pub fn len(&self) -> usize {
        self.0.iter().position(|&b| b == 0).unwrap_or(N)
    }

    /// True when no bytes precede the first NUL.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text up to the first NUL, lossily decoded.
    pub fn display(&self) -> String {
        String::from_utf8_lossy(&self.0[..self.len()]).into_owned()
    }

    /// Append a line to the buffer (newline-joined). Messages that would
    /// not fit are dropped whole; returns whether the line was kept.
    pub fn push_line(&mut self, line: &str) -> bool {
        let cur = self.len();
        let sep = usize::from(cur > 0);
        if cur + sep + line.len() + 1 >= N {
            return false;
        }
        let mut at = cur;
        if sep == 1 {
            self.0[at] = b'\n';
            at += 1;
        }
        for &b in line.as_bytes() {
            self.0[at] = b;
            at += 1;
        }
        true
    }

    /// Reset to all NULs.
    pub fn clear(&mut self) {
        self.0 = [0u8; N];
    }
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedText<{}>({:?})", N, self.display())
    }
}

impl<const N: usize> fmt::Display for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl<const N: usize> Wire for FixedText<N> {
    fn serial_size(&self) -> usize {
        N
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < N {
            return Err(WireError::Short {
                need: N,
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_bytes(&self.0)?;
        Ok(w.written())
    }

    fn unpack(&mut self, buf: &[u8]) -> Result<usize, WireError> {
        if buf.len() < N {
            return Err(WireError::Short {
                need: N,
                have: buf.len(),
            });
        }
        let mut r = Reader::new(buf);
        r.get_bytes(&mut self.0)?;
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
