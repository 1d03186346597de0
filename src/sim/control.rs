//! Control policies: how intent gets produced each frame
//!
//! The player policy maps a boolean key-state snapshot to intent; the AI
//! policy steers toward a look-ahead point on the curve. Both feed the same
//! kinematics; vehicles are composed with a policy, never subclassed.

use serde::{Deserialize, Serialize};

use super::track::Track;
use super::vehicle::{ControlIntent, Vehicle};
use crate::consts::*;

/// Raw directional key state. Owned by the race session and written by the
/// host's input collaborator; entities never register listeners themselves.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Look-ahead steering parameters for one AI car.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiDriver {
    /// How far ahead to aim, as a fraction of the curve
    pub look_ahead: f32,
}

impl Default for AiDriver {
    fn default() -> Self {
        Self { look_ahead: AI_LOOK_AHEAD }
    }
}

impl AiDriver {
    /// Aim at a point ahead on the curve; turn toward it at a constant rate
    /// (sign from the vertical component of the cross product, not
    /// proportional to the angle, so it can overshoot on tight curves).
    /// Accelerates whenever below the vehicle's top speed; never brakes.
    pub fn intent(&self, vehicle: &Vehicle, track: &Track) -> ControlIntent {
        let curve = track.curve();
        let target = curve.point_at(vehicle.track_param + self.look_ahead);

        let steer = match (target - vehicle.position).try_normalize() {
            Some(to_target) => {
                let cross = vehicle.forward().cross(to_target);
                if cross.y > 0.0 { 1.0 } else { -1.0 }
            }
            None => 0.0,
        };

        let throttle = if vehicle.speed < vehicle.max_speed { 1.0 } else { 0.0 };

        ControlIntent { throttle, steer }
    }
}

/// Map key state to intent. Forward is evaluated before backward and left
/// before right, so holding both resolves by evaluation order.
pub fn player_intent(input: &InputState) -> ControlIntent {
    let throttle = if input.forward {
        1.0
    } else if input.backward {
        -1.0
    } else {
        0.0
    };
    let steer = if input.left {
        1.0
    } else if input.right {
        -1.0
    } else {
        0.0
    };
    ControlIntent { throttle, steer }
}

/// The control capability a vehicle is composed with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ControlPolicy {
    Player,
    Ai(AiDriver),
}

impl ControlPolicy {
    pub fn intent(&self, vehicle: &Vehicle, input: &InputState, track: &Track) -> ControlIntent {
        match self {
            ControlPolicy::Player => player_intent(input),
            ControlPolicy::Ai(driver) => driver.intent(vehicle, track),
        }
    }
}
