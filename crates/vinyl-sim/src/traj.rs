//! Polar trajectories (velocity and displacement vectors).
//!
//! Like [`Coord`](crate::coord::Coord) but polar: a magnitude `rho` and
//! an angle `theta`. Invariants after normalization: `rho == 0` implies
//! `theta == 0`; `rho` is never negative (a negative magnitude flips the
//! angle); `theta` lies in `(-pi, pi]`.
//!
//! `Traj` deliberately implements no equality: `(5, pi)` and `(5, -pi)`
//! are the same direction, and a naive numerical comparison would
//! disagree. Compare converted Cartesian forms if you must.

use std::f64::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use tracing::warn;
use vinyl_wire::{Reader, Wire, WireError, Writer, SCALAR_SIZE};

use crate::coord::Coord;

// ---------------------------------------------------------------------------
// Traj
// ---------------------------------------------------------------------------

/// A polar vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Traj {
    pub rho: f64,
    pub theta: f64,
}

impl Traj {
    /// A normalized trajectory from magnitude and angle.
    pub fn new(rho: f64, theta: f64) -> Self {
        let mut t = Self { rho, theta };
        t.normalize();
        t
    }

    /// Construct without normalizing. For values already known to be in
    /// canonical form (e.g. straight off the wire or out of `atan2`).
    pub(crate) fn raw(rho: f64, theta: f64) -> Self {
        Self { rho, theta }
    }

    /// Restore the canonical form: non-negative `rho`, `theta` wrapped
    /// into `(-pi, pi]`, zero magnitude forcing zero angle. A residual
    /// out-of-band angle clamps with a warning rather than aborting.
    pub fn normalize(&mut self) {
        if self.rho == 0.0 {
            self.theta = 0.0;
        }
        if self.rho < 0.0 {
            self.rho = -self.rho;
            self.theta += PI;
        }

        if self.theta < -PI {
            self.theta = PI - (-PI - self.theta) % TAU;
        }
        if self.theta > PI {
            self.theta = (self.theta + PI) % TAU - PI;
        }

        if self.theta < -(PI + 1e-4) || self.theta > PI + 1e-4 {
            warn!(theta = self.theta, "trajectory normalization recovery");
            self.theta = self.theta.clamp(-PI, PI);
        }
    }

    /// Convert to Cartesian (does not wrap onto the torus by itself;
    /// wrapping happens when the result lands in a `Coord` operation).
    pub fn to_coord(&self) -> Coord {
        Coord::new(self.theta.cos() * self.rho, self.theta.sin() * self.rho)
    }

    /// Rebuild from the origin-relative vector to `c`.
    pub fn from_coord(c: &Coord) -> Self {
        Coord::ORIGIN.vect_to(c)
    }

    /// Rotate by `dtheta` radians.
    pub fn rotate(&mut self, dtheta: f64) -> &mut Self {
        self.theta += dtheta;
        self.normalize();
        self
    }

    /// Dot product.
    pub fn dot(&self, other: &Traj) -> f64 {
        self.rho * other.rho * (other.theta - self.theta).cos()
    }

    /// Z-component of the cross product.
    pub fn cross(&self, other: &Traj) -> f64 {
        self.rho * other.rho * (other.theta - self.theta).sin()
    }
}

impl From<Coord> for Traj {
    fn from(c: Coord) -> Traj {
        Traj::from_coord(&c)
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

impl Add for Traj {
    type Output = Traj;
    fn add(self, rhs: Traj) -> Traj {
        let x = self.rho * self.theta.cos() + rhs.rho * rhs.theta.cos();
        let y = self.rho * self.theta.sin() + rhs.rho * rhs.theta.sin();
        let mut res = Traj {
            rho: x.hypot(y),
            theta: y.atan2(x),
        };
        res.normalize();
        res
    }
}

impl Sub for Traj {
    type Output = Traj;
    fn sub(self, rhs: Traj) -> Traj {
        self + (-rhs)
    }
}

impl AddAssign for Traj {
    fn add_assign(&mut self, rhs: Traj) {
        *self = *self + rhs;
    }
}

impl SubAssign for Traj {
    fn sub_assign(&mut self, rhs: Traj) {
        *self = *self - rhs;
    }
}

impl Neg for Traj {
    type Output = Traj;
    fn neg(mut self) -> Traj {
        self.theta += PI;
        self.normalize();
        self
    }
}

impl Mul<f64> for Traj {
    type Output = Traj;
    fn mul(mut self, scale: f64) -> Traj {
        self.rho *= scale;
        self.normalize();
        self
    }
}

impl Div<f64> for Traj {
    type Output = Traj;
    fn div(mut self, scale: f64) -> Traj {
        self.rho /= scale;
        self.normalize();
        self
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Wire for Traj {
    fn serial_size(&self) -> usize {
        2 * SCALAR_SIZE
    }

    fn pack(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < self.serial_size() {
            return Err(WireError::Short {
                need: self.serial_size(),
                have: buf.len(),
            });
        }
        let mut w = Writer::new(buf);
        w.put_scalar(self.rho)?;
        w.put_scalar(self.theta)?;
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
        self.rho = r.get_scalar()?;
        self.theta = r.get_scalar()?;
        Ok(r.consumed())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
