//! Closed-loop track curve
//!
//! A Catmull-Rom spline through a ring of control points, closed so the
//! curve returns to the first point. Queries are arc-length parameterized:
//! `point_at(t)` has travelled distance `t * length()` along the loop, so
//! uniform steps in `t` give uniform spacing on the track.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::wrap_param;

/// Samples in the arc-length lookup table
const LUT_SAMPLES: usize = 256;

/// Finite-difference delta for tangent queries
const TANGENT_DELTA: f32 = 1e-4;

/// A closed interpolating spline through a ring of control points.
///
/// Immutable after construction: the same `t` always yields the same point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedCurve {
    points: Vec<Vec3>,
    /// Cumulative arc length at uniform spline parameters (LUT_SAMPLES + 1
    /// entries, first 0, last = total measured length)
    cumulative: Vec<f32>,
    total_length: f32,
}

impl ClosedCurve {
    /// Build the curve from a ring of control points (at least 4).
    pub fn new(points: Vec<Vec3>) -> Self {
        debug_assert!(points.len() >= 4, "need at least 4 control points");

        let mut curve = Self {
            points,
            cumulative: Vec::new(),
            total_length: 0.0,
        };

        // Arc-length table over the raw spline parameter
        let mut cumulative = Vec::with_capacity(LUT_SAMPLES + 1);
        cumulative.push(0.0);
        let mut prev = curve.raw_point_at(0.0);
        let mut total = 0.0;
        for i in 1..=LUT_SAMPLES {
            let u = i as f32 / LUT_SAMPLES as f32;
            let p = curve.raw_point_at(u);
            total += p.distance(prev);
            cumulative.push(total);
            prev = p;
        }

        curve.cumulative = cumulative;
        curve.total_length = total;
        curve
    }

    /// Generate the randomized control-point ring: points at uniform angles,
    /// radius perturbed by ±variation/2.
    pub fn generate_loop(rng: &mut impl Rng) -> Self {
        let count = TRACK_CONTROL_POINTS;
        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let angle = (i as f32 / count as f32) * std::f32::consts::TAU;
            let r = TRACK_BASE_RADIUS
                + rng.random::<f32>() * TRACK_RADIUS_VARIATION
                - TRACK_RADIUS_VARIATION / 2.0;
            points.push(Vec3::new(angle.cos() * r, 0.0, angle.sin() * r));
        }
        Self::new(points)
    }

    /// Total loop length, floored so parameter advance never divides by zero.
    #[inline]
    pub fn length(&self) -> f32 {
        self.total_length.max(MIN_CURVE_LENGTH)
    }

    /// Point at normalized arc-length parameter `t` (wrapped into [0, 1)).
    pub fn point_at(&self, t: f32) -> Vec3 {
        if self.total_length <= f32::EPSILON {
            return self.points[0];
        }
        let t = wrap_param(t);
        let target = t * self.total_length;

        // First sample whose cumulative length exceeds the target
        let hi = self
            .cumulative
            .partition_point(|&len| len <= target)
            .clamp(1, LUT_SAMPLES);
        let lo = hi - 1;

        let span = self.cumulative[hi] - self.cumulative[lo];
        let frac = if span > f32::EPSILON {
            (target - self.cumulative[lo]) / span
        } else {
            0.0
        };
        let u = (lo as f32 + frac) / LUT_SAMPLES as f32;
        self.raw_point_at(u)
    }

    /// Normalized tangent direction at `t`, via central finite difference.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let ahead = self.point_at(t + TANGENT_DELTA);
        let behind = self.point_at(t - TANGENT_DELTA);
        (ahead - behind).try_normalize().unwrap_or(Vec3::Z)
    }

    /// Evaluate the spline at raw (non-arc-length) parameter `u` in [0, 1).
    fn raw_point_at(&self, u: f32) -> Vec3 {
        let n = self.points.len();
        let scaled = wrap_param(u) * n as f32;
        let seg = (scaled as usize).min(n - 1);
        let local = scaled - seg as f32;

        let p0 = self.points[(seg + n - 1) % n];
        let p1 = self.points[seg];
        let p2 = self.points[(seg + 1) % n];
        let p3 = self.points[(seg + 2) % n];

        catmull_rom(p0, p1, p2, p3, local)
    }
}

/// Uniform Catmull-Rom interpolation between p1 and p2
fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, u: f32) -> Vec3 {
    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn test_curve() -> ClosedCurve {
        let mut rng = Pcg32::seed_from_u64(42);
        ClosedCurve::generate_loop(&mut rng)
    }

    #[test]
    fn test_loop_closure() {
        let curve = test_curve();
        let start = curve.point_at(0.0);
        let end = curve.point_at(0.99999);
        assert!(start.distance(end) < 0.5, "loop must close: gap {}", start.distance(end));
    }

    #[test]
    fn test_passes_through_control_points_roughly() {
        // An interpolating spline stays near its control radius band
        let curve = test_curve();
        for i in 0..100 {
            let p = curve.point_at(i as f32 / 100.0);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!(r > TRACK_BASE_RADIUS - TRACK_RADIUS_VARIATION);
            assert!(r < TRACK_BASE_RADIUS + TRACK_RADIUS_VARIATION);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_arc_length_uniformity() {
        let curve = test_curve();
        let samples = 200;
        let expected = curve.length() / samples as f32;
        for i in 0..samples {
            let a = curve.point_at(i as f32 / samples as f32);
            let b = curve.point_at((i + 1) as f32 / samples as f32);
            let d = a.distance(b);
            assert!(
                (d - expected).abs() < expected * 0.5,
                "step {} spacing {} expected {}",
                i,
                d,
                expected
            );
        }
    }

    #[test]
    fn test_out_of_range_params_wrap() {
        let curve = test_curve();
        let p = curve.point_at(0.3);
        assert!(p.distance(curve.point_at(1.3)) < 1e-3);
        assert!(p.distance(curve.point_at(-0.7)) < 1e-3);
    }

    #[test]
    fn test_tangent_is_normalized() {
        let curve = test_curve();
        for i in 0..50 {
            let tan = curve.tangent_at(i as f32 / 50.0);
            assert!((tan.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_length_floor() {
        // Degenerate ring of coincident points: length() still non-zero
        let curve = ClosedCurve::new(vec![Vec3::ZERO; 4]);
        assert!(curve.length() >= MIN_CURVE_LENGTH);
        assert_eq!(curve.point_at(0.5), Vec3::ZERO);
    }

    proptest! {
        #[test]
        fn prop_point_at_is_continuous(t in 0.0f32..1.0, seed in 0u64..64) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let curve = ClosedCurve::generate_loop(&mut rng);
            let dt = 1e-3;
            let a = curve.point_at(t);
            let b = curve.point_at(t + dt);
            // Arc-length parameterization: delta stays near dt * length
            let bound = curve.length() * dt * 4.0;
            prop_assert!(a.distance(b) <= bound);
        }

        #[test]
        fn prop_same_t_same_point(t in -2.0f32..2.0) {
            let curve = test_curve();
            prop_assert_eq!(curve.point_at(t), curve.point_at(t));
        }
    }
}
