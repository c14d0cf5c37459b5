//! Ground intake: the retractor arm and the sucker rollers.

use super::sim::{NoteLocation, NoteTracker};
use super::{approach, ReachGoal};
use parking_lot::RwLock;
use std::sync::Arc;
use strider_core::{Command, ResourceId, Scheduler, StriderResult};

/// Arrival tolerance in degrees
pub const RETRACTOR_TOLERANCE_DEG: f64 = 3.0;
const RETRACTOR_SPEED_DEG_PER_S: f64 = 300.0;

const SUCKER_IN: f64 = 0.8;
const SUCKER_OUT: f64 = -0.5;
const SUCKER_AMP_SHOT: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetractorSetpoint {
    Retracted,
    Mating,
    Speaker,
    Amp,
    Intake,
}

impl RetractorSetpoint {
    pub fn angle(self) -> f64 {
        match self {
            RetractorSetpoint::Retracted => 165.0,
            RetractorSetpoint::Mating => 165.0,
            RetractorSetpoint::Speaker => 140.0,
            RetractorSetpoint::Amp => 110.0,
            RetractorSetpoint::Intake => -10.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RetractorSetpoint::Retracted => "retracted",
            RetractorSetpoint::Mating => "mating",
            RetractorSetpoint::Speaker => "speaker",
            RetractorSetpoint::Amp => "amp",
            RetractorSetpoint::Intake => "intake",
        }
    }
}

#[derive(Debug)]
struct RetractorState {
    position_deg: f64,
    goal_deg: f64,
}

/// Intake arm
#[derive(Clone)]
pub struct Retractor {
    resource: ResourceId,
    state: Arc<RwLock<RetractorState>>,
}

impl Retractor {
    pub fn register(scheduler: &mut Scheduler) -> StriderResult<Self> {
        let start = RetractorSetpoint::Retracted.angle();
        Ok(Self {
            resource: scheduler.register_resource("retractor")?,
            state: Arc::new(RwLock::new(RetractorState {
                position_deg: start,
                goal_deg: start,
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
        (state.position_deg - state.goal_deg).abs() <= RETRACTOR_TOLERANCE_DEG
    }

    /// Within `tolerance` degrees of `setpoint`
    pub fn is_near(&self, setpoint: RetractorSetpoint, tolerance: f64) -> bool {
        (self.position_deg() - setpoint.angle()).abs() <= tolerance
    }

    fn set_goal(&self, goal_deg: f64) {
        self.state.write().goal_deg = goal_deg;
    }

    pub(crate) fn step(&self, dt: f64) {
        let mut state = self.state.write();
        state.position_deg = approach(
            state.position_deg,
            state.goal_deg,
            RETRACTOR_SPEED_DEG_PER_S * dt,
        );
    }

    /// Move to `setpoint`, finishing on arrival
    pub fn move_to(&self, setpoint: RetractorSetpoint) -> Command {
        let set = self.clone();
        let done = self.clone();
        Command::from_action(
            format!("retractor_{}", setpoint.label()),
            [self.resource],
            ReachGoal {
                set: move || set.set_goal(setpoint.angle()),
                done: move || done.at_goal(),
            },
        )
    }

    /// Hold `setpoint` until interrupted
    pub fn hold(&self, setpoint: RetractorSetpoint) -> Command {
        let this = self.clone();
        Command::run(
            format!("retractor_hold_{}", setpoint.label()),
            [self.resource],
            move || this.set_goal(setpoint.angle()),
        )
    }

    pub fn move_to_speaker(&self) -> Command {
        self.move_to(RetractorSetpoint::Speaker)
    }

    pub fn move_to_mating(&self) -> Command {
        self.move_to(RetractorSetpoint::Mating)
    }

    pub fn move_to_intake(&self) -> Command {
        self.move_to(RetractorSetpoint::Intake)
    }

    pub fn move_to_amp(&self) -> Command {
        self.move_to(RetractorSetpoint::Amp)
    }
}

#[derive(Debug, Default)]
struct SuckerState {
    power: f64,
}

/// Intake rollers with a note sensor
#[derive(Clone)]
pub struct Sucker {
    resource: ResourceId,
    state: Arc<RwLock<SuckerState>>,
    notes: NoteTracker,
}

impl Sucker {
    pub fn register(scheduler: &mut Scheduler, notes: NoteTracker) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("sucker")?,
            state: Arc::new(RwLock::new(SuckerState::default())),
            notes,
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn power(&self) -> f64 {
        self.state.read().power
    }

    pub fn note_detected(&self) -> bool {
        self.notes.location() == NoteLocation::InSucker
    }

    fn set_power(&self, power: f64) {
        self.state.write().power = power;
    }

    fn spin(&self, name: &str, power: f64) -> Command {
        let start = self.clone();
        let stop = self.clone();
        Command::start_end(
            name,
            [self.resource],
            move || start.set_power(power),
            move || stop.set_power(0.0),
        )
    }

    /// Pull a note in, until interrupted
    pub fn intake(&self) -> Command {
        self.spin("sucker_in", SUCKER_IN)
    }

    /// Push a note out (handoff or eject), until interrupted
    pub fn out(&self) -> Command {
        self.spin("sucker_out", SUCKER_OUT)
    }

    pub fn amp_shot(&self) -> Command {
        self.spin("sucker_amp_shot", SUCKER_AMP_SHOT)
    }

    /// Hold the rollers stopped
    pub fn off(&self) -> Command {
        let this = self.clone();
        Command::run("sucker_off", [self.resource], move || this.set_power(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_core::SchedulerConfig;

    #[test]
    fn test_retractor_move_finishes_on_arrival() {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        let retractor = Retractor::register(&mut scheduler).unwrap();
        scheduler.schedule(retractor.move_to_intake()).unwrap();

        let mut ticks = 0;
        while !scheduler.running_names().is_empty() {
            retractor.step(0.02);
            scheduler.tick();
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(retractor.is_near(RetractorSetpoint::Intake, RETRACTOR_TOLERANCE_DEG));
        // Goal persists after the command ends
        assert_eq!(retractor.goal_deg(), RetractorSetpoint::Intake.angle());
    }

    #[test]
    fn test_sucker_zeroed_on_interrupt() {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        let sucker = Sucker::register(&mut scheduler, NoteTracker::new(false)).unwrap();
        let id = scheduler.schedule(sucker.intake()).unwrap().unwrap();
        assert_eq!(sucker.power(), SUCKER_IN);
        scheduler.cancel(id);
        assert_eq!(sucker.power(), 0.0);
    }
}
