//! Robot mechanisms.
//!
//! Every subsystem owns exactly one scheduler resource and is a cheap
//! `Clone` handle over shared state. Read-only sensor accessors need no
//! ownership; command factories declare the subsystem's resource.
//!
//! Closed-loop mechanisms (retractor, pivot, flywheel) keep their goal when
//! a command ends, like a setpoint held by a motor controller. Open-loop
//! mechanisms (sucker, indexer, climber) go back to zero output in `end`.

pub mod aim;
pub mod climber;
pub mod drivetrain;
pub mod intake;
pub mod launcher;
pub mod sim;

pub use aim::AimTable;
pub use climber::{Climber, ClimberSide};
pub use drivetrain::{SimulatedDrive, Trajectory, TrajectoryTable};
pub use intake::{Retractor, RetractorSetpoint, Sucker};
pub use launcher::{Flywheel, FlywheelSetpoint, Indexer, Pivot, PivotSetpoint};
pub use sim::{NoteLocation, NoteTracker, Plant};

use strider_core::{Action, ResourceId, Scheduler, StriderResult, TickContext};

/// Sets a goal on initialize and finishes once the mechanism reports arrival
pub(crate) struct ReachGoal<S, D> {
    pub(crate) set: S,
    pub(crate) done: D,
}

impl<S, D> Action for ReachGoal<S, D>
where
    S: FnMut() + Send,
    D: Fn() -> bool + Send,
{
    fn initialize(&mut self, _ctx: &TickContext) {
        (self.set)();
    }

    fn execute(&mut self, _ctx: &TickContext) {}

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        (self.done)()
    }
}

/// Step `current` toward `goal` by at most `max_step`
pub(crate) fn approach(current: f64, goal: f64, max_step: f64) -> f64 {
    let delta = goal - current;
    if delta.abs() <= max_step {
        goal
    } else {
        current + max_step.copysign(delta)
    }
}

/// Every mechanism, registered with one scheduler
#[derive(Clone)]
pub struct Subsystems {
    pub drive: SimulatedDrive,
    pub retractor: Retractor,
    pub sucker: Sucker,
    pub pivot: Pivot,
    pub indexer: Indexer,
    pub flywheel: Flywheel,
    pub climber: Climber,
    pub notes: NoteTracker,
}

impl Subsystems {
    /// Register every resource; `preloaded` starts the match with a note in the sucker
    pub fn register(
        scheduler: &mut Scheduler,
        trajectories: TrajectoryTable,
        preloaded: bool,
    ) -> StriderResult<Self> {
        let notes = NoteTracker::new(preloaded);
        Ok(Self {
            drive: SimulatedDrive::register(scheduler, trajectories)?,
            retractor: Retractor::register(scheduler)?,
            sucker: Sucker::register(scheduler, notes.clone())?,
            pivot: Pivot::register(scheduler)?,
            indexer: Indexer::register(scheduler, notes.clone())?,
            flywheel: Flywheel::register(scheduler)?,
            climber: Climber::register(scheduler)?,
            notes,
        })
    }

    /// Resources of the note-handling mechanisms (everything but drive and climber)
    pub fn mechanisms(&self) -> [ResourceId; 5] {
        [
            self.retractor.resource(),
            self.sucker.resource(),
            self.pivot.resource(),
            self.indexer.resource(),
            self.flywheel.resource(),
        ]
    }
}
