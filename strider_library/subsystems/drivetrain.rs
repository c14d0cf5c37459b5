//! Simulated swerve drivetrain and path following.
//!
//! Poses are blue-alliance field coordinates in meters with the speaker
//! opening at [`SPEAKER_POSITION`]. Headings are degrees, counter-clockwise
//! positive.

use crate::messages::Operators;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use strider_core::{
    Action, Command, PathFollower, ResourceId, Scheduler, StriderError, StriderResult,
    TickContext,
};
use tracing::debug;

pub const SPEAKER_POSITION: [f64; 2] = [0.0, 5.55];

pub const MAX_SPEED_M_PER_S: f64 = 4.5;
pub const MAX_TURN_DEG_PER_S: f64 = 360.0;
const SLOW_MODE_SCALE: f64 = 0.3;
const DRIVE_DEADBAND: f64 = 0.1;
const CREEP_SPEED_M_PER_S: f64 = 0.5;
const AMP_HEADING_DEG: f64 = 90.0;
const ALIGN_GAIN: f64 = 5.0;

/// Wrap an angle into (-180, 180]
fn wrap_deg(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn deadband(value: f64) -> f64 {
    if value.abs() < DRIVE_DEADBAND {
        0.0
    } else {
        value
    }
}

/// Straight-line trajectory with a linear heading sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub start: [f64; 2],
    pub end: [f64; 2],
    #[serde(default)]
    pub heading_start: f64,
    #[serde(default)]
    pub heading_end: f64,
    pub duration_s: f64,
}

impl Trajectory {
    pub const fn new(
        start: [f64; 2],
        end: [f64; 2],
        heading_start: f64,
        heading_end: f64,
        duration_s: f64,
    ) -> Self {
        Self {
            start,
            end,
            heading_start,
            heading_end,
            duration_s,
        }
    }

    /// Pose `(x, y, heading)` at fraction `t` of the way along
    pub fn sample(&self, t: f64) -> (f64, f64, f64) {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| a * (1.0 - t) + b * t;
        (
            lerp(self.start[0], self.end[0]),
            lerp(self.start[1], self.end[1]),
            self.heading_start + wrap_deg(self.heading_end - self.heading_start) * t,
        )
    }
}

/// Trajectories by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajectoryTable {
    paths: BTreeMap<String, Trajectory>,
}

impl TrajectoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path the competition routines use
    pub fn builtin() -> Self {
        let sub = [1.35, 5.55];
        let amp_side = [0.75, 6.7];
        let source_side = [0.75, 4.4];
        let entries = [
            ("Bruh", Trajectory::new(sub, [3.0, 5.55], 0.0, 0.0, 2.0)),
            ("TopTaxi", Trajectory::new(amp_side, [3.2, 7.2], 60.0, 0.0, 2.5)),
            ("BotTaxi", Trajectory::new(source_side, [3.2, 2.0], -60.0, 0.0, 3.0)),
            ("3TopCenter.1", Trajectory::new(amp_side, [8.3, 7.45], 60.0, 0.0, 4.0)),
            ("3TopCenter.2", Trajectory::new([8.3, 7.45], [2.0, 6.5], 0.0, 20.0, 4.0)),
            ("3TopCenter.3", Trajectory::new([2.0, 6.5], [8.3, 5.8], 20.0, 0.0, 4.0)),
            ("3TopCenter.4", Trajectory::new([8.3, 5.8], [2.0, 6.5], 0.0, 20.0, 4.0)),
            ("TopDisrupt", Trajectory::new(amp_side, [8.3, 0.8], 60.0, -90.0, 6.0)),
            ("BotDisrupt", Trajectory::new(source_side, [8.3, 7.4], -60.0, 90.0, 6.0)),
            ("4NB-Skip.1", Trajectory::new(sub, [2.9, 7.0], 0.0, 20.0, 1.5)),
            ("4NB-Skip.2", Trajectory::new([2.9, 7.0], [2.4, 6.2], 20.0, 25.0, 1.0)),
            ("4NB-Skip.3", Trajectory::new([2.4, 6.2], [2.9, 4.1], 25.0, -20.0, 1.5)),
            ("4NB-Skip.4", Trajectory::new([2.9, 4.1], [2.4, 4.9], -20.0, -25.0, 1.0)),
            ("4NB-Skip.5", Trajectory::new([2.4, 4.9], [2.9, 5.55], -25.0, 0.0, 1.2)),
            ("3NB-Close.1", Trajectory::new(sub, [2.9, 5.55], 0.0, 0.0, 1.2)),
            ("3NB-Close.2", Trajectory::new([2.9, 5.55], [2.9, 7.0], 0.0, 20.0, 1.4)),
            ("3NB-Close.3", Trajectory::new([2.9, 7.0], [2.4, 6.3], 20.0, 20.0, 1.0)),
            ("4NB-SweepStraight.1", Trajectory::new(sub, [2.9, 7.0], 0.0, 20.0, 1.5)),
            ("4NB-SweepStraight.2", Trajectory::new([2.9, 7.0], [2.9, 5.55], 20.0, 0.0, 1.2)),
            ("4NB-SweepStraight.3", Trajectory::new([2.9, 5.55], [2.9, 4.1], 0.0, -20.0, 1.2)),
        ];
        Self {
            paths: entries
                .into_iter()
                .map(|(name, path)| (name.to_string(), path))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> StriderResult<&Trajectory> {
        self.paths
            .get(name)
            .ok_or_else(|| StriderError::UnknownTrajectory(name.to_string()))
    }

    pub fn insert(&mut self, name: impl Into<String>, trajectory: Trajectory) {
        self.paths.insert(name.into(), trajectory);
    }

    pub fn remove(&mut self, name: &str) -> Option<Trajectory> {
        self.paths.remove(name)
    }

    /// Entries in `other` replace same-named entries here
    pub fn merge(&mut self, other: TrajectoryTable) {
        self.paths.extend(other.paths);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.paths.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.paths.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trajectory)> {
        self.paths.iter().map(|(name, path)| (name.as_str(), path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Default)]
struct DriveState {
    x: f64,
    y: f64,
    heading_deg: f64,
    yaw_offset_deg: f64,
    vx: f64,
    vy: f64,
    omega_deg: f64,
    following: Option<String>,
}

/// Holonomic drive with a kinematic pose model
#[derive(Clone)]
pub struct SimulatedDrive {
    resource: ResourceId,
    state: Arc<RwLock<DriveState>>,
    trajectories: Arc<TrajectoryTable>,
}

impl SimulatedDrive {
    pub fn register(scheduler: &mut Scheduler, trajectories: TrajectoryTable) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("drive")?,
            state: Arc::new(RwLock::new(DriveState {
                x: 1.35,
                y: SPEAKER_POSITION[1],
                ..DriveState::default()
            })),
            trajectories: Arc::new(trajectories),
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn trajectories(&self) -> &TrajectoryTable {
        &self.trajectories
    }

    /// `(x, y, heading)`
    pub fn pose(&self) -> (f64, f64, f64) {
        let state = self.state.read();
        (state.x, state.y, state.heading_deg)
    }

    /// Heading relative to the last yaw zero
    pub fn yaw_deg(&self) -> f64 {
        let state = self.state.read();
        wrap_deg(state.heading_deg - state.yaw_offset_deg)
    }

    /// `(vx, vy, omega)`, field-relative
    pub fn velocity(&self) -> (f64, f64, f64) {
        let state = self.state.read();
        (state.vx, state.vy, state.omega_deg)
    }

    /// Path currently being followed
    pub fn following(&self) -> Option<String> {
        self.state.read().following.clone()
    }

    pub fn distance_to_speaker(&self) -> f64 {
        let state = self.state.read();
        (state.x - SPEAKER_POSITION[0]).hypot(state.y - SPEAKER_POSITION[1])
    }

    pub fn set_pose(&self, x: f64, y: f64, heading_deg: f64) {
        let mut state = self.state.write();
        state.x = x;
        state.y = y;
        state.heading_deg = wrap_deg(heading_deg);
    }

    pub fn zero_yaw(&self) {
        let mut state = self.state.write();
        state.yaw_offset_deg = state.heading_deg;
    }

    fn set_velocity(&self, vx: f64, vy: f64, omega_deg: f64) {
        let mut state = self.state.write();
        state.vx = vx;
        state.vy = vy;
        state.omega_deg = omega_deg;
    }

    fn stop(&self) {
        self.set_velocity(0.0, 0.0, 0.0);
    }

    pub(crate) fn step(&self, dt: f64) {
        let mut state = self.state.write();
        if state.following.is_some() {
            return;
        }
        state.x += state.vx * dt;
        state.y += state.vy * dt;
        state.heading_deg = wrap_deg(state.heading_deg + state.omega_deg * dt);
    }

    /// Field-relative velocity from driver sticks, in the frame set by the last yaw zero
    fn stick_velocity(&self, operators: &Operators) -> (f64, f64, f64) {
        let driver = operators.driver();
        let scale = if driver.right_bumper {
            SLOW_MODE_SCALE
        } else {
            1.0
        };
        let forward = -deadband(driver.left_y) * MAX_SPEED_M_PER_S * scale;
        let left = -deadband(driver.left_x) * MAX_SPEED_M_PER_S * scale;
        let turn = -deadband(driver.right_x) * MAX_TURN_DEG_PER_S * scale;

        let offset = self.state.read().yaw_offset_deg.to_radians();
        let (sin, cos) = offset.sin_cos();
        (forward * cos - left * sin, forward * sin + left * cos, turn)
    }

    /// Driver-controlled default
    pub fn teleop(&self, operators: Operators) -> Command {
        let this = self.clone();
        let stop = self.clone();
        Command::run("drive_teleop", [self.resource], move || {
            let (vx, vy, omega) = this.stick_velocity(&operators);
            this.set_velocity(vx, vy, omega);
        })
        .finally_do(move |_| stop.stop())
    }

    /// Driver keeps translation while the heading snaps to face the amp
    pub fn align_to_amp(&self, operators: Operators) -> Command {
        let this = self.clone();
        let stop = self.clone();
        Command::run("drive_align_amp", [self.resource], move || {
            let (vx, vy, _) = this.stick_velocity(&operators);
            let error = wrap_deg(AMP_HEADING_DEG - this.pose().2);
            let omega = (error * ALIGN_GAIN).clamp(-MAX_TURN_DEG_PER_S, MAX_TURN_DEG_PER_S);
            this.set_velocity(vx, vy, omega);
        })
        .finally_do(move |_| stop.stop())
    }

    /// Roll slowly forward along the current heading
    pub fn creep(&self) -> Command {
        let this = self.clone();
        let stop = self.clone();
        Command::run("drive_creep", [self.resource], move || {
            let (sin, cos) = this.pose().2.to_radians().sin_cos();
            this.set_velocity(CREEP_SPEED_M_PER_S * cos, CREEP_SPEED_M_PER_S * sin, 0.0);
        })
        .finally_do(move |_| stop.stop())
    }

    /// Reset the driver frame without taking the drivetrain
    pub fn zero_yaw_command(&self) -> Command {
        let this = self.clone();
        Command::instant("zero_yaw", [], move || this.zero_yaw())
    }
}

impl fmt::Debug for SimulatedDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("SimulatedDrive")
            .field("x", &state.x)
            .field("y", &state.y)
            .field("heading_deg", &state.heading_deg)
            .field("following", &state.following)
            .finish()
    }
}

struct FollowPath {
    drive: SimulatedDrive,
    path: String,
    trajectory: Trajectory,
    started: Duration,
    progress: f64,
}

impl Action for FollowPath {
    fn initialize(&mut self, ctx: &TickContext) {
        self.started = ctx.now();
        self.progress = 0.0;
        self.drive.stop();
        self.drive.state.write().following = Some(self.path.clone());
        debug!(path = %self.path, "following path");
    }

    fn execute(&mut self, ctx: &TickContext) {
        // Pose after this tick's motion
        let elapsed = (ctx.since(self.started) + ctx.period()).as_secs_f64();
        self.progress = if self.trajectory.duration_s > 0.0 {
            (elapsed / self.trajectory.duration_s).min(1.0)
        } else {
            1.0
        };
        let (x, y, heading) = self.trajectory.sample(self.progress);
        self.drive.set_pose(x, y, heading);
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.progress >= 1.0
    }

    fn end(&mut self, interrupted: bool, _ctx: &TickContext) {
        self.drive.state.write().following = None;
        debug!(path = %self.path, interrupted, "path ended");
    }
}

impl PathFollower for SimulatedDrive {
    fn follow(&self, path: &str) -> StriderResult<Command> {
        let trajectory = *self.trajectories.get(path)?;
        Ok(Command::from_action(
            format!("follow({})", path),
            [self.resource],
            FollowPath {
                drive: self.clone(),
                path: path.to_string(),
                trajectory,
                started: Duration::ZERO,
                progress: 0.0,
            },
        ))
    }

    fn reset_to_path_start(&self, path: &str) -> StriderResult<Command> {
        let trajectory = *self.trajectories.get(path)?;
        let this = self.clone();
        Ok(Command::instant(
            format!("reset_pose({})", path),
            [self.resource],
            move || {
                this.set_pose(
                    trajectory.start[0],
                    trajectory.start[1],
                    trajectory.heading_start,
                );
                this.zero_yaw();
            },
        ))
    }

    fn knows(&self, path: &str) -> bool {
        self.trajectories.contains(path)
    }
}
