//! Property tests for the toroidal algebra.
//!
//! These use `proptest` to drive random coordinates and trajectories
//! through the algebra and verify the invariants every other component
//! leans on: normalization lands in the half-open square, distances are
//! shortest-path, and the polar canonical form holds.

use proptest::prelude::*;
use vinyl_sim::coord::{Coord, WORLD_MAX, WORLD_MIN, WORLD_SIZE};
use vinyl_sim::traj::Traj;

/// The long diagonal: no two points are farther apart than this.
const MAX_DIST: f64 = 724.0773439350246; // sqrt(512^2 + 512^2)

fn world_coord() -> impl Strategy<Value = Coord> {
    (WORLD_MIN..WORLD_MAX, WORLD_MIN..WORLD_MAX).prop_map(|(x, y)| Coord::new(x, y))
}

fn any_coord() -> impl Strategy<Value = Coord> {
    (-1e6..1e6, -1e6..1e6).prop_map(|(x, y)| Coord::new(x, y))
}

/// Reference shortest distance: the minimum over the 3x3 neighborhood
/// of torus images.
fn image_dist(a: &Coord, b: &Coord) -> f64 {
    let mut best = f64::INFINITY;
    for dx in [-WORLD_SIZE, 0.0, WORLD_SIZE] {
        for dy in [-WORLD_SIZE, 0.0, WORLD_SIZE] {
            let d = ((b.x + dx - a.x).powi(2) + (b.y + dy - a.y).powi(2)).sqrt();
            best = best.min(d);
        }
    }
    best
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn normalize_lands_in_the_half_open_square(c in any_coord()) {
        let mut c = c;
        c.normalize();
        prop_assert!(c.x >= WORLD_MIN && c.x < WORLD_MAX);
        prop_assert!(c.y >= WORLD_MIN && c.y < WORLD_MAX);
    }

    #[test]
    fn normalize_is_idempotent(c in any_coord()) {
        let mut once = c;
        once.normalize();
        let mut twice = once;
        twice.normalize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn distance_never_exceeds_the_long_diagonal(a in world_coord(), b in world_coord()) {
        prop_assert!(a.dist_to(&b) <= MAX_DIST + 1e-9);
    }

    #[test]
    fn distance_is_symmetric(a in world_coord(), b in world_coord()) {
        prop_assert!((a.dist_to(&b) - b.dist_to(&a)).abs() < 1e-9);
    }

    #[test]
    fn distance_picks_the_shortest_image(a in world_coord(), b in world_coord()) {
        // Crossing at most one seam per axis is exactly "the nearest of
        // the nine images".
        prop_assert!((a.dist_to(&b) - image_dist(&a, &b)).abs() < 1e-6);
    }

    #[test]
    fn angle_points_along_the_shortest_path(a in world_coord(), b in world_coord()) {
        prop_assume!(a.dist_to(&b) > 1e-6);
        let ang = a.angle_to(&b);
        // Walking the reported distance at the reported angle arrives.
        let there = a + Traj::new(a.dist_to(&b), ang).to_coord();
        prop_assert!(there.dist_to(&b) < 1e-6);
    }

    #[test]
    fn traj_canonical_form(rho in -100.0..100.0f64, theta in -50.0..50.0f64) {
        let t = Traj::new(rho, theta);
        prop_assert!(t.rho >= 0.0);
        prop_assert!(t.theta >= -std::f64::consts::PI - 1e-9);
        prop_assert!(t.theta <= std::f64::consts::PI + 1e-9);
        if t.rho == 0.0 {
            prop_assert_eq!(t.theta, 0.0);
        }
    }

    #[test]
    fn traj_cartesian_round_trip(rho in 0.01..500.0f64, theta in -3.0..3.0f64) {
        let t = Traj::new(rho, theta);
        let back = Traj::from_coord(&t.to_coord());
        prop_assert!((back.rho - t.rho).abs() < 1e-6);
        prop_assert!((back.theta - t.theta).abs() < 1e-6);
    }

    #[test]
    fn addition_matches_cartesian_addition(
        r1 in 0.0..100.0f64, t1 in -3.0..3.0f64,
        r2 in 0.0..100.0f64, t2 in -3.0..3.0f64,
    ) {
        let a = Traj::new(r1, t1);
        let b = Traj::new(r2, t2);
        let sum = a + b;
        let ax = a.to_coord();
        let bx = b.to_coord();
        let sx = sum.to_coord();
        prop_assert!((sx.x - (ax.x + bx.x)).abs() < 1e-6);
        prop_assert!((sx.y - (ax.y + bx.y)).abs() < 1e-6);
    }
}
