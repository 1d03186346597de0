//! Tube Racer - a neon tube racing mini-game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track geometry, vehicle kinematics,
//!   race progress, session state machine)
//!
//! Rendering is deliberately absent: the session exposes vehicle transforms
//! and a HUD snapshot each frame for an external scene/UI collaborator.

pub mod sim;

pub use sim::{HudState, RaceEvent, RaceSession, RaceState};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz; friction tuning assumes this rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Track generation
    pub const TRACK_CONTROL_POINTS: usize = 20;
    pub const TRACK_BASE_RADIUS: f32 = 80.0;
    pub const TRACK_RADIUS_VARIATION: f32 = 30.0;
    /// Drivable corridor half-width around the track centerline
    pub const TRACK_HALF_WIDTH: f32 = 6.0;
    /// Floor for the measured curve length (guards parameter advance)
    pub const MIN_CURVE_LENGTH: f32 = 1.0;

    /// Checkpoints
    pub const CHECKPOINT_COUNT: usize = 20;
    /// A checkpoint counts as passed inside this distance
    pub const CHECKPOINT_RADIUS: f32 = 15.0;

    /// Vehicle dynamics
    pub const MAX_SPEED: f32 = 40.0;
    pub const ACCELERATION: f32 = 20.0;
    /// Per-step multiplicative friction (tuned for the 60 Hz step)
    pub const FRICTION: f32 = 0.988;
    pub const TURN_SPEED: f32 = 2.5;
    /// No steering authority below this speed
    pub const STEER_DEADZONE: f32 = 0.1;
    /// One-shot speed multiplier on wall contact
    pub const WALL_FRICTION: f32 = 0.9;

    /// Drift correction: search ±PARAM_SEARCH_RANGE in PARAM_SEARCH_STEPS
    /// steps on each side of the advanced estimate
    pub const PARAM_SEARCH_RANGE: f32 = 0.01;
    pub const PARAM_SEARCH_STEPS: i32 = 10;

    /// AI tuning
    pub const AI_COUNT: usize = 3;
    pub const AI_BASE_TOP_SPEED: f32 = 35.0;
    pub const AI_TOP_SPEED_SPREAD: f32 = 5.0;
    /// Look-ahead distance along the curve, as a fraction of its length
    pub const AI_LOOK_AHEAD: f32 = 0.05;
    /// Grid spacing between AI starting parameters
    pub const AI_GRID_SPACING: f32 = 0.02;

    /// Race rules
    pub const TOTAL_LAPS: u32 = 3;
    pub const COUNTDOWN_SECS: f32 = 3.0;
}

/// Wrap a track parameter into [0, 1)
#[inline]
pub fn wrap_param(t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t >= 1.0 { 0.0 } else { t }
}

/// Forward vector for a yaw heading (track plane is XZ, Y up)
#[inline]
pub fn heading_forward(heading: f32) -> Vec3 {
    Vec3::new(heading.sin(), 0.0, heading.cos())
}

/// Yaw heading that faces the given direction
#[inline]
pub fn direction_heading(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}
