//! Track: the curve plus its derived checkpoint ring
//!
//! Checkpoints are sampled once at uniform parameter intervals; checkpoint
//! `i + 1` (mod count) is always the next target after checkpoint `i`, and
//! that total order is the only valid completion sequence.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::curve::ClosedCurve;
use crate::consts::*;

/// A fixed curve sample a vehicle must pass, in strict index order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: Vec3,
    pub tangent: Vec3,
    pub index: usize,
}

/// The race track: immutable shared state for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    curve: ClosedCurve,
    checkpoints: Vec<Checkpoint>,
}

impl Track {
    /// Generate a fresh randomized track.
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self::from_curve(ClosedCurve::generate_loop(rng))
    }

    pub fn from_curve(curve: ClosedCurve) -> Self {
        let checkpoints = (0..CHECKPOINT_COUNT)
            .map(|i| {
                let t = i as f32 / CHECKPOINT_COUNT as f32;
                Checkpoint {
                    position: curve.point_at(t),
                    tangent: curve.tangent_at(t),
                    index: i,
                }
            })
            .collect();
        Self { curve, checkpoints }
    }

    #[inline]
    pub fn curve(&self) -> &ClosedCurve {
        &self.curve
    }

    #[inline]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Corridor half-width used by wall collision. A track-wide constant,
    /// not derived from render geometry.
    #[inline]
    pub fn half_width(&self) -> f32 {
        TRACK_HALF_WIDTH
    }
}
