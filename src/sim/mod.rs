//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable vehicle iteration order (player first, then AI by index)
//! - No rendering or platform dependencies

pub mod control;
pub mod curve;
pub mod progress;
pub mod session;
pub mod track;
pub mod vehicle;

pub use control::{AiDriver, ControlPolicy, InputState};
pub use curve::ClosedCurve;
pub use progress::{ProgressUpdate, check_progress};
pub use session::{HudState, RaceEvent, RaceSession, RaceState, VehicleTransform};
pub use track::{Checkpoint, Track};
pub use vehicle::{ControlIntent, ParamTracking, Vehicle, integrate};
