//! Launcher: pivot, flywheel and indexer.

use super::sim::{NoteLocation, NoteTracker};
use super::{approach, ReachGoal};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use strider_core::{Command, ResourceId, Scheduler, StriderResult};

pub const PIVOT_TOLERANCE_DEG: f64 = 2.0;
const PIVOT_SPEED_DEG_PER_S: f64 = 240.0;

pub const FLYWHEEL_TOLERANCE_RPM: f64 = 100.0;
const FLYWHEEL_ACCEL_RPM_PER_S: f64 = 8000.0;

const INDEXER_HANDOFF: f64 = 0.3;
const INDEXER_OUTTAKE: f64 = 1.0;
const INDEXER_SHIFT: f64 = 0.2;
const SHIFT_TIME: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotSetpoint {
    Retracted,
    Mating,
    Amp,
    /// Fixed shot from the subwoofer
    Speaker,
    Feeder,
}

impl PivotSetpoint {
    pub fn angle(self) -> f64 {
        match self {
            PivotSetpoint::Retracted => 0.0,
            PivotSetpoint::Mating => 0.0,
            PivotSetpoint::Amp => 95.0,
            PivotSetpoint::Speaker => 52.0,
            PivotSetpoint::Feeder => 40.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            PivotSetpoint::Retracted => "retracted",
            PivotSetpoint::Mating => "mating",
            PivotSetpoint::Amp => "amp",
            PivotSetpoint::Speaker => "speaker",
            PivotSetpoint::Feeder => "feeder",
        }
    }
}

#[derive(Debug)]
struct PivotState {
    position_deg: f64,
    goal_deg: f64,
}

/// Shooter angle
#[derive(Clone)]
pub struct Pivot {
    resource: ResourceId,
    state: Arc<RwLock<PivotState>>,
}

impl Pivot {
    pub fn register(scheduler: &mut Scheduler) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("pivot")?,
            state: Arc::new(RwLock::new(PivotState {
                position_deg: PivotSetpoint::Retracted.angle(),
                goal_deg: PivotSetpoint::Retracted.angle(),
            })),
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn position_deg(&self) -> f64 {
        self.state.read().position_deg
    }

    pub fn goal_deg(&self) -> f64 {
        self.state.read().goal_deg
    }

    pub fn at_goal(&self) -> bool {
        let state = self.state.read();
        (state.position_deg - state.goal_deg).abs() <= PIVOT_TOLERANCE_DEG
    }

    pub fn is_near(&self, setpoint: PivotSetpoint, tolerance: f64) -> bool {
        (self.position_deg() - setpoint.angle()).abs() <= tolerance
    }

    fn set_goal(&self, goal_deg: f64) {
        self.state.write().goal_deg = goal_deg;
    }

    pub(crate) fn step(&self, dt: f64) {
        let mut state = self.state.write();
        state.position_deg =
            approach(state.position_deg, state.goal_deg, PIVOT_SPEED_DEG_PER_S * dt);
    }

    pub fn move_to(&self, setpoint: PivotSetpoint) -> Command {
        self.move_to_angle(format!("pivot_{}", setpoint.label()), move || {
            setpoint.angle()
        })
    }

    /// Goal computed once, when the command starts
    pub fn move_to_angle<F>(&self, name: impl Into<String>, angle: F) -> Command
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let set = self.clone();
        let done = self.clone();
        Command::from_action(
            name,
            [self.resource],
            ReachGoal {
                set: move || set.set_goal(angle()),
                done: move || done.at_goal(),
            },
        )
    }

    /// Track a continuously recomputed goal until interrupted
    pub fn aim_at_speaker<F>(&self, angle: F) -> Command
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let this = self.clone();
        Command::run("pivot_aim_speaker", [self.resource], move || {
            this.set_goal(angle())
        })
    }

    pub fn aim_at_amp(&self) -> Command {
        self.move_to(PivotSetpoint::Amp)
    }

    pub fn move_to_retracted(&self) -> Command {
        self.move_to(PivotSetpoint::Retracted)
    }

    pub fn move_to_mating(&self) -> Command {
        self.move_to(PivotSetpoint::Mating)
    }

    /// Hold the retracted angle until interrupted
    pub fn hold_retracted(&self) -> Command {
        let this = self.clone();
        Command::run("pivot_hold_retracted", [self.resource], move || {
            this.set_goal(PivotSetpoint::Retracted.angle())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlywheelSetpoint {
    AcceptHandoff,
    Speaker,
    Amp,
    Feeder,
}

impl FlywheelSetpoint {
    pub fn rpm(self) -> f64 {
        match self {
            FlywheelSetpoint::AcceptHandoff => 500.0,
            FlywheelSetpoint::Speaker => 3000.0,
            FlywheelSetpoint::Amp => 1200.0,
            FlywheelSetpoint::Feeder => 2500.0,
        }
    }
}

#[derive(Debug, Default)]
struct FlywheelState {
    rpm: f64,
    goal_rpm: f64,
}

#[derive(Clone)]
pub struct Flywheel {
    resource: ResourceId,
    state: Arc<RwLock<FlywheelState>>,
}

impl Flywheel {
    pub fn register(scheduler: &mut Scheduler) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("flywheel")?,
            state: Arc::new(RwLock::new(FlywheelState::default())),
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn rpm(&self) -> f64 {
        self.state.read().rpm
    }

    pub fn goal_rpm(&self) -> f64 {
        self.state.read().goal_rpm
    }

    /// Spinning at a nonzero goal
    pub fn is_revved(&self) -> bool {
        let state = self.state.read();
        state.goal_rpm > 0.0 && (state.rpm - state.goal_rpm).abs() <= FLYWHEEL_TOLERANCE_RPM
    }

    fn set_goal(&self, rpm: f64) {
        self.state.write().goal_rpm = rpm.max(0.0);
    }

    pub(crate) fn step(&self, dt: f64) {
        let mut state = self.state.write();
        state.rpm = approach(state.rpm, state.goal_rpm, FLYWHEEL_ACCEL_RPM_PER_S * dt);
    }

    /// Spin up to `rpm()` and finish once revved
    pub fn rev_to<F>(&self, name: impl Into<String>, rpm: F) -> Command
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let set = self.clone();
        let done = self.clone();
        Command::from_action(
            name,
            [self.resource],
            ReachGoal {
                set: move || set.set_goal(rpm()),
                done: move || done.is_revved(),
            },
        )
    }

    pub fn rev(&self, setpoint: FlywheelSetpoint) -> Command {
        self.rev_to(format!("flywheel_{:?}", setpoint).to_lowercase(), move || {
            setpoint.rpm()
        })
    }

    pub fn rev_speaker(&self) -> Command {
        self.rev(FlywheelSetpoint::Speaker)
    }

    pub fn rev_amp(&self) -> Command {
        self.rev(FlywheelSetpoint::Amp)
    }

    /// Track a continuously recomputed goal until interrupted
    pub fn rev_speaker_from_rpm<F>(&self, rpm: F) -> Command
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let this = self.clone();
        Command::run("flywheel_track_speaker", [self.resource], move || {
            this.set_goal(rpm())
        })
    }

    pub fn off(&self) -> Command {
        let this = self.clone();
        Command::instant("flywheel_off", [self.resource], move || this.set_goal(0.0))
    }
}

#[derive(Debug, Default)]
struct IndexerState {
    power: f64,
}

/// Feeds notes from the handoff into the flywheel; two beam breaks track the note
#[derive(Clone)]
pub struct Indexer {
    resource: ResourceId,
    state: Arc<RwLock<IndexerState>>,
    notes: NoteTracker,
}

impl Indexer {
    pub fn register(scheduler: &mut Scheduler, notes: NoteTracker) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("indexer")?,
            state: Arc::new(RwLock::new(IndexerState::default())),
            notes,
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn power(&self) -> f64 {
        self.state.read().power
    }

    pub fn entrance_beam_broken(&self) -> bool {
        matches!(
            self.notes.location(),
            NoteLocation::InIndexer | NoteLocation::Exiting
        )
    }

    pub fn entrance_beam_not_broken(&self) -> bool {
        !self.entrance_beam_broken()
    }

    pub fn exit_beam_broken(&self) -> bool {
        self.notes.location() == NoteLocation::Exiting
    }

    pub fn exit_beam_not_broken(&self) -> bool {
        !self.exit_beam_broken()
    }

    fn set_power(&self, power: f64) {
        self.state.write().power = power;
    }

    fn feed<F>(&self, name: &str, power: f64, done: F) -> Command
    where
        F: Fn(&Indexer) -> bool + Send + 'static,
    {
        let start = self.clone();
        let stop = self.clone();
        let probe = self.clone();
        Command::from_action(
            name,
            [self.resource],
            ReachGoal {
                set: move || start.set_power(power),
                done: move || done(&probe),
            },
        )
        .finally_do(move |_| stop.set_power(0.0))
    }

    /// Pull a note in from the handoff; finishes when it reaches the entrance beam
    pub fn accept_handoff(&self) -> Command {
        self.feed("indexer_accept_handoff", INDEXER_HANDOFF, |i| {
            i.entrance_beam_broken()
        })
    }

    /// Push the note into the flywheel; finishes when both beams are clear
    pub fn outtake(&self) -> Command {
        self.feed("indexer_outtake", INDEXER_OUTTAKE, |i| {
            i.entrance_beam_not_broken() && i.exit_beam_not_broken()
        })
    }

    fn shift(&self, name: &str, power: f64) -> Command {
        let start = self.clone();
        let stop = self.clone();
        Command::deadline(
            Command::wait(SHIFT_TIME),
            vec![Command::start_end(
                name,
                [self.resource],
                move || start.set_power(power),
                move || stop.set_power(0.0),
            )],
        )
        .named(name)
    }

    pub fn shift_forward(&self) -> Command {
        self.shift("indexer_shift_forward", INDEXER_SHIFT)
    }

    pub fn shift_backward(&self) -> Command {
        self.shift("indexer_shift_backward", -INDEXER_SHIFT)
    }

    pub fn off(&self) -> Command {
        let this = self.clone();
        Command::run("indexer_off", [self.resource], move || this.set_power(0.0))
    }
}
