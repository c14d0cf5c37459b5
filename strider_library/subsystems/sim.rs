//! Plant model: mechanism motion and where the note is.
//!
//! The note moves through the robot as a small state machine driven by the
//! mechanism outputs. Sensors on the sucker and indexer read the same
//! tracker, so commands waiting on a beam break see the simulated note.

use super::intake::RetractorSetpoint;
use super::launcher::PivotSetpoint;
use super::Subsystems;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Sucker must be intaking with the arm down this long to grab a note
const PICKUP_TIME_S: f64 = 0.25;
/// Both mechanisms at mating and feeding this long to pass the note
const HANDOFF_TIME_S: f64 = 0.1;
/// Reversed sucker away from the launcher this long to spit the note out
const EJECT_TIME_S: f64 = 0.2;
/// Time the note takes to clear the exit beam
const EXIT_TIME_S: f64 = 0.06;

const INTAKE_TOLERANCE_DEG: f64 = 10.0;
const AMP_TOLERANCE_DEG: f64 = 10.0;
const PIVOT_MATING_TOLERANCE_DEG: f64 = 5.0;
/// Minimum indexer output that pushes the note into the flywheel
const FIRE_POWER: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteLocation {
    #[default]
    None,
    InSucker,
    InIndexer,
    /// Passing the exit beam into the flywheel
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Pickup,
    Handoff,
    Eject,
    Exit,
}

#[derive(Debug, Default)]
struct NoteState {
    location: NoteLocation,
    pending: Option<(Transition, f64)>,
    pickups: u32,
    shots: u32,
    amp_scores: u32,
    ejected: u32,
}

/// Shared view of the note and the scoring counters
#[derive(Debug, Clone, Default)]
pub struct NoteTracker {
    state: Arc<RwLock<NoteState>>,
}

impl NoteTracker {
    /// `preloaded` starts with a note in the sucker
    pub fn new(preloaded: bool) -> Self {
        let tracker = Self::default();
        if preloaded {
            tracker.state.write().location = NoteLocation::InSucker;
        }
        tracker
    }

    pub fn location(&self) -> NoteLocation {
        self.state.read().location
    }

    pub fn has_note(&self) -> bool {
        self.location() != NoteLocation::None
    }

    /// Notes picked up off the floor
    pub fn pickups(&self) -> u32 {
        self.state.read().pickups
    }

    /// Notes fired through the flywheel
    pub fn shots(&self) -> u32 {
        self.state.read().shots
    }

    /// Notes scored into the amp from the intake
    pub fn amp_scores(&self) -> u32 {
        self.state.read().amp_scores
    }

    /// Notes spat back onto the floor
    pub fn ejected(&self) -> u32 {
        self.state.read().ejected
    }

    /// Place a note by hand
    pub fn place(&self, location: NoteLocation) {
        let mut state = self.state.write();
        state.location = location;
        state.pending = None;
    }
}

/// Advances every mechanism and the note once per tick
#[derive(Clone)]
pub struct Plant {
    subsystems: Subsystems,
}

impl Plant {
    pub fn new(subsystems: &Subsystems) -> Self {
        Self {
            subsystems: subsystems.clone(),
        }
    }

    pub fn step(&self, dt: f64) {
        let s = &self.subsystems;
        s.drive.step(dt);
        s.retractor.step(dt);
        s.pivot.step(dt);
        s.flywheel.step(dt);
        s.climber.step(dt);
        self.step_note(dt);
    }

    /// Which transition the current outputs are driving, if any
    fn driving(&self, location: NoteLocation) -> Option<Transition> {
        let s = &self.subsystems;
        let sucker = s.sucker.power();
        let indexer = s.indexer.power();
        // Stowed: anywhere from the speaker angle up to fully retracted
        let stowed = s.retractor.position_deg() >= RetractorSetpoint::Speaker.angle() - 5.0;

        match location {
            NoteLocation::None => (sucker > 0.0
                && s.retractor
                    .is_near(RetractorSetpoint::Intake, INTAKE_TOLERANCE_DEG))
            .then_some(Transition::Pickup),
            NoteLocation::InSucker if sucker < 0.0 && stowed => (indexer > 0.0
                && s.pivot
                    .is_near(PivotSetpoint::Mating, PIVOT_MATING_TOLERANCE_DEG))
            .then_some(Transition::Handoff),
            NoteLocation::InSucker if sucker < 0.0 => Some(Transition::Eject),
            NoteLocation::InSucker => None,
            NoteLocation::InIndexer => (indexer >= FIRE_POWER).then_some(Transition::Exit),
            NoteLocation::Exiting => Some(Transition::Exit),
        }
    }

    fn step_note(&self, dt: f64) {
        let mut state = self.subsystems.notes.state.write();
        let Some(transition) = self.driving(state.location) else {
            state.pending = None;
            return;
        };

        // Firing is one-way once the note leaves the indexer
        if transition == Transition::Exit && state.location == NoteLocation::InIndexer {
            state.location = NoteLocation::Exiting;
            state.pending = Some((Transition::Exit, 0.0));
            debug!("note entering flywheel");
            return;
        }

        let elapsed = match state.pending {
            Some((pending, elapsed)) if pending == transition => elapsed + dt,
            _ => dt,
        };
        let needed = match transition {
            Transition::Pickup => PICKUP_TIME_S,
            Transition::Handoff => HANDOFF_TIME_S,
            Transition::Eject => EJECT_TIME_S,
            Transition::Exit => EXIT_TIME_S,
        };
        // Tolerate accumulated rounding in the tick period
        if elapsed + 1e-9 < needed {
            state.pending = Some((transition, elapsed));
            return;
        }

        state.pending = None;
        match transition {
            Transition::Pickup => {
                state.location = NoteLocation::InSucker;
                state.pickups += 1;
                info!("note picked up");
            }
            Transition::Handoff => {
                state.location = NoteLocation::InIndexer;
                debug!("note handed off to indexer");
            }
            Transition::Eject => {
                state.location = NoteLocation::None;
                let at_amp = self
                    .subsystems
                    .retractor
                    .is_near(RetractorSetpoint::Amp, AMP_TOLERANCE_DEG);
                if at_amp {
                    state.amp_scores += 1;
                    info!("note scored in amp");
                } else {
                    state.ejected += 1;
                    info!("note ejected");
                }
            }
            Transition::Exit => {
                state.location = NoteLocation::None;
                state.shots += 1;
                info!(
                    rpm = self.subsystems.flywheel.rpm(),
                    revved = self.subsystems.flywheel.is_revved(),
                    "note fired"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::TrajectoryTable;
    use strider_core::{Scheduler, SchedulerConfig};

    fn robot(preloaded: bool) -> (Scheduler, Subsystems, Plant) {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        let subsystems =
            Subsystems::register(&mut scheduler, TrajectoryTable::builtin(), preloaded).unwrap();
        let plant = Plant::new(&subsystems);
        (scheduler, subsystems, plant)
    }

    fn run(scheduler: &mut Scheduler, plant: &Plant, ticks: u32) {
        for _ in 0..ticks {
            plant.step(0.02);
            scheduler.tick();
        }
    }

    #[test]
    fn test_pickup_needs_arm_down() {
        let (mut scheduler, s, plant) = robot(false);
        scheduler.schedule(s.sucker.intake()).unwrap();
        run(&mut scheduler, &plant, 30);
        assert_eq!(s.notes.location(), NoteLocation::None);

        scheduler
            .schedule(s.retractor.hold(RetractorSetpoint::Intake))
            .unwrap();
        run(&mut scheduler, &plant, 60);
        assert_eq!(s.notes.location(), NoteLocation::InSucker);
        assert_eq!(s.notes.pickups(), 1);
    }

    #[test]
    fn test_handoff_then_fire() {
        let (mut scheduler, s, plant) = robot(true);
        scheduler.schedule(s.sucker.out()).unwrap();
        scheduler.schedule(s.indexer.accept_handoff()).unwrap();
        run(&mut scheduler, &plant, 20);
        assert_eq!(s.notes.location(), NoteLocation::InIndexer);
        assert!(s.indexer.entrance_beam_broken());

        scheduler.schedule(s.indexer.outtake()).unwrap();
        run(&mut scheduler, &plant, 10);
        assert_eq!(s.notes.location(), NoteLocation::None);
        assert_eq!(s.notes.shots(), 1);
        assert!(scheduler.running_names().iter().all(|n| *n != "indexer_outtake"));
    }

    #[test]
    fn test_eject_with_arm_down() {
        let (mut scheduler, s, plant) = robot(true);
        scheduler
            .schedule(s.retractor.hold(RetractorSetpoint::Intake))
            .unwrap();
        run(&mut scheduler, &plant, 40);
        scheduler.schedule(s.sucker.out()).unwrap();
        run(&mut scheduler, &plant, 20);
        assert_eq!(s.notes.location(), NoteLocation::None);
        assert_eq!(s.notes.ejected(), 1);
        assert_eq!(s.notes.amp_scores(), 0);
    }
}
