//! Vehicle state and per-frame kinematics
//!
//! One integration routine serves the player and the AI cars; the only
//! difference is how the track parameter is advanced (`ParamTracking`).
//! Wall collision applies to every vehicle.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::track::Track;
use crate::consts::*;
use crate::{direction_heading, heading_forward, wrap_param};

/// How a vehicle keeps its track parameter in sync with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamTracking {
    /// Advance by tangent-projected speed, then re-anchor to the nearest
    /// curve point with a local search (player).
    Projected,
    /// Advance purely by `speed / length`; assumed to track exactly (AI).
    DeadReckoned,
}

/// Desired acceleration and turn for one frame. Produced by a control
/// policy, consumed by `integrate`. No physics of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlIntent {
    /// +1 accelerate, -1 reverse, 0 coast
    pub throttle: f32,
    /// +1 left, -1 right, 0 straight
    pub steer: f32,
}

/// A racing vehicle (player or AI). Owned by the race session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub position: Vec3,
    /// Yaw angle; forward is `heading_forward(heading)`
    pub heading: f32,
    pub speed: f32,
    /// Best-estimate projection onto the curve, in [0, 1)
    pub track_param: f32,
    pub next_checkpoint: usize,
    pub lap: u32,
    pub max_speed: f32,
    pub tracking: ParamTracking,
}

impl Vehicle {
    /// Spawn a vehicle on the track at parameter `t`, facing along the
    /// local tangent. Progress fields are initialized here, never lazily.
    pub fn spawn(track: &Track, t: f32, max_speed: f32, tracking: ParamTracking) -> Self {
        let t = wrap_param(t);
        let curve = track.curve();
        Self {
            position: curve.point_at(t),
            heading: direction_heading(curve.tangent_at(t)),
            speed: 0.0,
            track_param: t,
            next_checkpoint: 1,
            lap: 1,
            max_speed,
            tracking,
        }
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        heading_forward(self.heading)
    }
}

/// Advance a vehicle by one frame.
///
/// Steps: longitudinal dynamics, speed-scaled steering, tentative position,
/// track-parameter advance, drift correction (projected mode only), soft
/// wall correction, commit.
pub fn integrate(vehicle: &mut Vehicle, intent: &ControlIntent, track: &Track, dt: f32) {
    // Longitudinal: accelerate, then per-step friction, then clamp.
    // Forward intent wins over backward when both are held.
    if intent.throttle > 0.0 {
        vehicle.speed += ACCELERATION * dt;
    } else if intent.throttle < 0.0 {
        vehicle.speed -= ACCELERATION * dt;
    }
    vehicle.speed *= FRICTION;
    vehicle.speed = vehicle
        .speed
        .clamp(-vehicle.max_speed / 2.0, vehicle.max_speed);

    // Lateral: steering authority scales with signed speed, so it vanishes
    // near zero and reverses in reverse.
    if vehicle.speed.abs() > STEER_DEADZONE {
        let turn = TURN_SPEED * dt * (vehicle.speed / vehicle.max_speed);
        vehicle.heading += intent.steer * turn;
    }

    let mut next_pos = vehicle.position + vehicle.forward() * vehicle.speed * dt;

    let curve = track.curve();
    let length = curve.length();

    match vehicle.tracking {
        ParamTracking::Projected => {
            // Advance by speed projected onto the local tangent, then
            // re-anchor to the curve point nearest the tentative position.
            let tangent = curve.tangent_at(vehicle.track_param);
            let dot = vehicle.forward().dot(tangent);
            let advanced = wrap_param(vehicle.track_param + vehicle.speed * dt * dot / length);
            vehicle.track_param = refine_param(curve, advanced, next_pos);
        }
        ParamTracking::DeadReckoned => {
            vehicle.track_param = wrap_param(vehicle.track_param + vehicle.speed * dt / length);
        }
    }

    // Soft wall: push back toward the centerline by exactly the overflow
    // and pay a one-shot friction penalty.
    let center = curve.point_at(vehicle.track_param);
    let dist = next_pos.distance(center);
    let half_width = track.half_width();
    if dist > half_width {
        let to_center = (center - next_pos) / dist;
        next_pos += to_center * (dist - half_width);
        vehicle.speed *= WALL_FRICTION;
    }

    vehicle.position = next_pos;
}

/// Local drift-correction search: sample a symmetric neighborhood around the
/// advanced estimate and keep the parameter whose curve point is nearest the
/// tentative position. Deterministic: first-found wins ties, wraps at 0/1.
fn refine_param(curve: &super::curve::ClosedCurve, seed: f32, target: Vec3) -> f32 {
    let mut best_t = seed;
    let mut best_dist = f32::INFINITY;
    for i in -PARAM_SEARCH_STEPS..=PARAM_SEARCH_STEPS {
        let t = wrap_param(seed + (i as f32 / PARAM_SEARCH_STEPS as f32) * PARAM_SEARCH_RANGE);
        let d = target.distance(curve.point_at(t));
        if d < best_dist {
            best_dist = d;
            best_t = t;
        }
    }
    best_t
}
