//! Race session: owns the track, the grid, and the race state machine
//!
//! The host drives the session with `step(dt)` once per frame; simulation
//! only runs while the state is `Racing`. All randomness (track shape, AI
//! top speeds) flows through the session's seeded RNG, so a seed fully
//! determines a race.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::control::{AiDriver, ControlPolicy, InputState};
use super::progress::check_progress;
use super::track::Track;
use super::vehicle::{ParamTracking, Vehicle, integrate};
use crate::consts::*;

/// Index of the player vehicle in the grid
pub const PLAYER: usize = 0;

/// Race screen/state machine. Single source of truth for whether per-frame
/// simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceState {
    /// Waiting on the start screen
    Start,
    /// Counting down to the green light
    Countdown,
    /// Active racing
    Racing,
    /// Player crossed the final lap
    Finished,
}

/// Notifications produced by a single step, for the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceEvent {
    CountdownFinished,
    CheckpointPassed { vehicle: usize, index: usize },
    LapCompleted { vehicle: usize, lap: u32 },
    RaceFinished,
}

/// Per-frame display data for the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudState {
    pub speed: f32,
    pub lap: u32,
    pub total_laps: u32,
    /// 1-based race standing among all vehicles
    pub position: usize,
    pub state: RaceState,
    /// Seconds left in the countdown (0 outside Countdown)
    pub countdown: f32,
}

/// World transform handed to the scene collaborator each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTransform {
    pub position: Vec3,
    pub heading: f32,
}

/// A full in-memory race. Reset discards everything and rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSession {
    seed: u64,
    track: Track,
    /// Player first, then AI in grid order
    vehicles: Vec<Vehicle>,
    policies: Vec<ControlPolicy>,
    /// Key state written by the host's input collaborator
    pub input: InputState,
    state: RaceState,
    countdown: f32,
    total_laps: u32,
}

impl RaceSession {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let track = Track::generate(&mut rng);

        let mut vehicles = Vec::with_capacity(1 + AI_COUNT);
        let mut policies = Vec::with_capacity(1 + AI_COUNT);

        vehicles.push(Vehicle::spawn(&track, 0.0, MAX_SPEED, ParamTracking::Projected));
        policies.push(ControlPolicy::Player);

        for i in 0..AI_COUNT {
            let t = AI_GRID_SPACING * (i + 1) as f32;
            let top_speed = AI_BASE_TOP_SPEED + rng.random::<f32>() * AI_TOP_SPEED_SPREAD;
            vehicles.push(Vehicle::spawn(&track, t, top_speed, ParamTracking::DeadReckoned));
            policies.push(ControlPolicy::Ai(AiDriver::default()));
        }

        Self {
            seed,
            track,
            vehicles,
            policies,
            input: InputState::default(),
            state: RaceState::Start,
            countdown: 0.0,
            total_laps: TOTAL_LAPS,
        }
    }

    /// Begin the countdown. Only valid from the start screen.
    pub fn start(&mut self) {
        if self.state == RaceState::Start {
            self.state = RaceState::Countdown;
            self.countdown = COUNTDOWN_SECS;
        }
    }

    /// Discard all state and rebuild a fresh session (new track, new grid).
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Advance the session by one frame. Returns UI notifications.
    pub fn step(&mut self, dt: f32) -> Vec<RaceEvent> {
        let mut events = Vec::new();

        match self.state {
            RaceState::Start | RaceState::Finished => {}
            RaceState::Countdown => {
                self.countdown -= dt;
                if self.countdown <= 0.0 {
                    self.countdown = 0.0;
                    self.state = RaceState::Racing;
                    events.push(RaceEvent::CountdownFinished);
                }
            }
            RaceState::Racing => {
                // Vehicles never read each other's state, so a single
                // sequential pass in grid order is sufficient.
                for idx in 0..self.vehicles.len() {
                    let intent =
                        self.policies[idx].intent(&self.vehicles[idx], &self.input, &self.track);
                    integrate(&mut self.vehicles[idx], &intent, &self.track, dt);

                    let update = check_progress(&mut self.vehicles[idx], &self.track);
                    if let Some(index) = update.passed {
                        events.push(RaceEvent::CheckpointPassed { vehicle: idx, index });
                    }
                    if update.lap_completed {
                        events.push(RaceEvent::LapCompleted {
                            vehicle: idx,
                            lap: self.vehicles[idx].lap,
                        });
                    }
                }

                if self.vehicles[PLAYER].lap > self.total_laps {
                    self.state = RaceState::Finished;
                    events.push(RaceEvent::RaceFinished);
                }
            }
        }

        events
    }

    /// Vehicle indices ranked by race progress, winner first. Ties break by
    /// grid order (stable sort).
    pub fn standings(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.vehicles.len()).collect();
        order.sort_by(|&a, &b| {
            let ka = Self::progress_key(&self.vehicles[a]);
            let kb = Self::progress_key(&self.vehicles[b]);
            kb.partial_cmp(&ka).unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }

    /// Lexicographic (lap, next checkpoint, parameter). The lap increments
    /// when the index wraps to 0, so the index is monotonic within a lap.
    fn progress_key(v: &Vehicle) -> (u32, usize, f32) {
        (v.lap, v.next_checkpoint, v.track_param)
    }

    /// HUD snapshot for the display collaborator.
    pub fn hud(&self) -> HudState {
        let player = &self.vehicles[PLAYER];
        let position = self
            .standings()
            .iter()
            .position(|&idx| idx == PLAYER)
            .map_or(1, |p| p + 1);
        HudState {
            speed: player.speed,
            lap: player.lap,
            total_laps: self.total_laps,
            position,
            state: self.state,
            countdown: self.countdown,
        }
    }

    /// World transforms for the scene collaborator, in grid order.
    pub fn transforms(&self) -> Vec<VehicleTransform> {
        self.vehicles
            .iter()
            .map(|v| VehicleTransform { position: v.position, heading: v.heading })
            .collect()
    }

    #[inline]
    pub fn state(&self) -> RaceState {
        self.state
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn track(&self) -> &Track {
        &self.track
    }

    #[inline]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    #[inline]
    pub fn player(&self) -> &Vehicle {
        &self.vehicles[PLAYER]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racing_session(seed: u64) -> RaceSession {
        let mut session = RaceSession::new(seed);
        session.start();
        // Burn through the countdown
        let events = session.step(COUNTDOWN_SECS + 0.001);
        assert_eq!(events, vec![RaceEvent::CountdownFinished]);
        assert_eq!(session.state(), RaceState::Racing);
        session
    }

    #[test]
    fn test_grid_setup() {
        let session = RaceSession::new(1);
        assert_eq!(session.state(), RaceState::Start);
        assert_eq!(session.vehicles().len(), 1 + AI_COUNT);

        let player = session.player();
        assert_eq!(player.tracking, ParamTracking::Projected);
        assert_eq!(player.track_param, 0.0);
        assert_eq!(player.lap, 1);
        assert_eq!(player.next_checkpoint, 1);

        for (i, ai) in session.vehicles()[1..].iter().enumerate() {
            assert_eq!(ai.tracking, ParamTracking::DeadReckoned);
            let expected_t = AI_GRID_SPACING * (i + 1) as f32;
            assert!((ai.track_param - expected_t).abs() < 1e-6);
            assert!(ai.max_speed >= AI_BASE_TOP_SPEED);
            assert!(ai.max_speed < AI_BASE_TOP_SPEED + AI_TOP_SPEED_SPREAD);
        }
    }

    #[test]
    fn test_no_simulation_outside_racing() {
        let mut session = RaceSession::new(2);
        session.input.forward = true;

        for _ in 0..60 {
            assert!(session.step(SIM_DT).is_empty());
        }
        assert_eq!(session.player().speed, 0.0, "Start state must not simulate");

        session.start();
        assert_eq!(session.state(), RaceState::Countdown);
        session.step(SIM_DT);
        assert_eq!(session.player().speed, 0.0, "Countdown must not simulate");
    }

    #[test]
    fn test_countdown_runs_down() {
        let mut session = RaceSession::new(3);
        session.start();
        let mut fired = Vec::new();
        let mut elapsed = 0.0;
        while session.state() == RaceState::Countdown && elapsed < 10.0 {
            fired.extend(session.step(SIM_DT));
            elapsed += SIM_DT;
        }
        assert_eq!(session.state(), RaceState::Racing);
        assert_eq!(fired, vec![RaceEvent::CountdownFinished]);
        assert!((elapsed - COUNTDOWN_SECS).abs() < 0.1);
        assert_eq!(session.hud().countdown, 0.0);
    }

    #[test]
    fn test_start_only_from_start_screen() {
        let mut session = racing_session(4);
        session.start();
        assert_eq!(session.state(), RaceState::Racing);
    }

    #[test]
    fn test_input_moves_player() {
        let mut session = racing_session(5);
        session.input.forward = true;
        let before = session.player().position;
        for _ in 0..60 {
            session.step(SIM_DT);
        }
        assert!(session.player().speed > 0.0);
        assert!(session.player().position.distance(before) > 1.0);
    }

    #[test]
    fn test_ai_race_without_input() {
        let mut session = racing_session(6);
        for _ in 0..(30 * 60) {
            session.step(SIM_DT);
        }
        // Every AI car should be well into the race
        for ai in &session.vehicles()[1..] {
            assert!(ai.speed > 0.0);
            let progress = (ai.lap, ai.next_checkpoint);
            assert!(progress > (1, 1), "AI made no progress: {progress:?}");
        }
    }

    #[test]
    fn test_finish_transition_and_halt() {
        let mut session = racing_session(7);
        session.vehicles[PLAYER].lap = TOTAL_LAPS + 1;

        let events = session.step(SIM_DT);
        assert!(events.contains(&RaceEvent::RaceFinished));
        assert_eq!(session.state(), RaceState::Finished);

        // Simulation halts: nothing moves anymore
        let frozen = session.transforms();
        session.input.forward = true;
        for _ in 0..60 {
            assert!(session.step(SIM_DT).is_empty());
        }
        assert_eq!(session.transforms(), frozen);
    }

    #[test]
    fn test_standings_order() {
        let mut session = RaceSession::new(8);
        session.vehicles[0].lap = 2;
        session.vehicles[1].lap = 2;
        session.vehicles[1].next_checkpoint = 5;
        session.vehicles[2].lap = 3;
        session.vehicles[3].lap = 1;

        assert_eq!(session.standings(), vec![2, 1, 0, 3]);
        assert_eq!(session.hud().position, 3);
    }

    #[test]
    fn test_standings_across_start_line() {
        // Two same-lap cars straddling the start line: the one that already
        // crossed checkpoint 0 must outrank the one still approaching it
        let mut session = RaceSession::new(12);
        session.vehicles[0].lap = 2;
        session.vehicles[0].next_checkpoint = 0;
        session.vehicles[0].track_param = 0.96;
        session.vehicles[1].lap = 2;
        session.vehicles[1].next_checkpoint = 1;
        session.vehicles[1].track_param = 0.02;

        assert_eq!(&session.standings()[..2], &[1, 0]);
        assert_eq!(session.hud().position, 2);
    }

    #[test]
    fn test_same_seed_same_race() {
        let mut a = racing_session(99);
        let mut b = racing_session(99);
        a.input.forward = true;
        b.input.forward = true;
        for _ in 0..600 {
            assert_eq!(a.step(SIM_DT), b.step(SIM_DT));
        }
        assert_eq!(a.transforms(), b.transforms());
        assert_eq!(a.player().track_param, b.player().track_param);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut session = racing_session(10);
        session.input.forward = true;
        for _ in 0..120 {
            session.step(SIM_DT);
        }
        session.reset(11);
        assert_eq!(session.state(), RaceState::Start);
        assert_eq!(session.seed(), 11);
        assert_eq!(session.player().speed, 0.0);
        assert_eq!(session.player().lap, 1);
        assert!(!session.input.forward, "reset clears held input");
    }
}
