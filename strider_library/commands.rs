//! Multi-mechanism robot commands.
//!
//! Every method builds a fresh command tree; triggers and routines call
//! them from factories so each activation gets its own instance.

use crate::messages::Operators;
use crate::subsystems::{
    AimTable, FlywheelSetpoint, PivotSetpoint, RetractorSetpoint, Subsystems,
};
use std::sync::Arc;
use std::time::Duration;
use strider_core::{condition, Command, RuntimeParams};

/// Speaker aiming from the drivetrain's distance estimate
#[derive(Clone)]
pub struct SpeakerAim {
    subsystems: Subsystems,
    table: Arc<AimTable>,
    max_distance_m: f64,
    max_idle_rpm: f64,
}

impl SpeakerAim {
    pub fn new(subsystems: &Subsystems, table: AimTable, params: &RuntimeParams) -> Self {
        Self {
            subsystems: subsystems.clone(),
            table: Arc::new(table),
            max_distance_m: params.get_f64("max_shot_distance_m", 4.0),
            max_idle_rpm: params.get_f64("flywheel_max_idle_rpm", 2000.0),
        }
    }

    fn in_range(&self) -> Option<f64> {
        let distance = self.subsystems.drive.distance_to_speaker();
        (distance < self.max_distance_m).then_some(distance)
    }

    /// Pivot angle for the default aim: table angle when holding a note in range, else retracted
    pub fn idle_pivot_angle(&self) -> f64 {
        if self.subsystems.indexer.entrance_beam_not_broken() {
            return PivotSetpoint::Retracted.angle();
        }
        match self.in_range() {
            Some(distance) => self.table.interpolate_pivot_angle(distance),
            None => PivotSetpoint::Retracted.angle(),
        }
    }

    /// Flywheel pre-spin for the default: a capped fraction of the shot speed
    pub fn idle_flywheel_rpm(&self) -> f64 {
        if self.subsystems.indexer.entrance_beam_not_broken() {
            return 0.0;
        }
        match self.in_range() {
            Some(distance) => {
                (0.85 * self.table.interpolate_flywheel_rpm(distance)).min(self.max_idle_rpm)
            }
            None => 0.0,
        }
    }

    pub fn shot_pivot_angle(&self) -> f64 {
        self.table
            .interpolate_pivot_angle(self.subsystems.drive.distance_to_speaker())
    }

    pub fn shot_flywheel_rpm(&self) -> f64 {
        self.table
            .interpolate_flywheel_rpm(self.subsystems.drive.distance_to_speaker())
    }
}

/// Command factories that coordinate several subsystems
#[derive(Clone)]
pub struct RobotCommands {
    s: Subsystems,
    aim: SpeakerAim,
    operators: Operators,
    shot_timeout: Duration,
    shot_settle: Duration,
    trigger_threshold: f64,
}

impl RobotCommands {
    pub fn new(
        subsystems: &Subsystems,
        aim: SpeakerAim,
        operators: Operators,
        params: &RuntimeParams,
    ) -> Self {
        let seconds = |key: &str, default: f64| {
            Duration::from_secs_f64(params.get_f64(key, default).max(0.0))
        };
        Self {
            s: subsystems.clone(),
            aim,
            operators,
            shot_timeout: seconds("shot_timeout_s", 1.0),
            shot_settle: seconds("shot_settle_s", 0.1),
            trigger_threshold: params.get_f64("trigger_threshold", 0.5),
        }
    }

    pub fn subsystems(&self) -> &Subsystems {
        &self.s
    }

    pub fn aim(&self) -> &SpeakerAim {
        &self.aim
    }

    // ------------------------------------------------------------------
    // Defaults
    // ------------------------------------------------------------------

    pub fn pivot_default(&self) -> Command {
        let aim = self.aim.clone();
        self.s.pivot.aim_at_speaker(move || aim.idle_pivot_angle())
    }

    pub fn flywheel_default(&self) -> Command {
        let aim = self.aim.clone();
        self.s
            .flywheel
            .rev_speaker_from_rpm(move || aim.idle_flywheel_rpm())
    }

    // ------------------------------------------------------------------
    // Intake
    // ------------------------------------------------------------------

    /// Arm down with rollers in until a note is seen, then fold up to mating
    pub fn intake_note(&self) -> Command {
        let sucker = self.s.sucker.clone();
        Command::deadline(
            Command::wait_until(condition(move || sucker.note_detected())),
            vec![
                self.s.retractor.hold(RetractorSetpoint::Intake),
                self.s.sucker.intake(),
            ],
        )
        .and_then(self.s.retractor.move_to_mating())
        .named("intake_note")
    }

    /// Arm down with rollers in while held
    pub fn intake_note_manual(&self) -> Command {
        self.s
            .retractor
            .hold(RetractorSetpoint::Intake)
            .alongside(self.s.sucker.intake())
            .named("intake_note_manual")
    }

    /// Arm down with rollers reversed while held
    pub fn outtake_note(&self) -> Command {
        self.s
            .retractor
            .hold(RetractorSetpoint::Intake)
            .alongside(self.s.sucker.out())
            .named("outtake_note")
    }

    /// Intake while creeping forward
    pub fn auto_pickup_note(&self) -> Command {
        self.intake_note()
            .deadline_for(vec![self.s.drive.creep()])
            .named("auto_pickup_note")
    }

    // ------------------------------------------------------------------
    // Handoff
    // ------------------------------------------------------------------

    /// Line the retractor and pivot up for a handoff
    pub fn mate(&self) -> Command {
        self.s
            .retractor
            .move_to_mating()
            .alongside(self.s.pivot.move_to_mating())
            .named("mate")
    }

    /// Pass the note from the sucker into the indexer
    pub fn shift(&self) -> Command {
        self.s
            .indexer
            .accept_handoff()
            .race_with(self.s.sucker.out())
            .named("shift")
    }

    pub fn mate_and_shift(&self) -> Command {
        self.mate().and_then(self.shift()).named("mate_and_shift")
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    /// Hand off and rev for the subwoofer shot, then hold aim until released
    pub fn score_speaker_fixed_teleop(&self) -> Command {
        Command::sequence(vec![
            self.mate(),
            self.shift(),
            self.s
                .pivot
                .move_to(PivotSetpoint::Speaker)
                .alongside(self.s.flywheel.rev_speaker()),
            Command::idle([self.s.pivot.resource(), self.s.flywheel.resource()]),
        ])
        .named("score_speaker_fixed_teleop")
    }

    /// Subwoofer shot straight from a preload, no arm motion
    pub fn score_speaker_fixed_auto(&self) -> Command {
        Command::sequence(vec![
            self.s.flywheel.rev_speaker(),
            self.s
                .indexer
                .accept_handoff()
                .and_then(self.s.indexer.outtake())
                .race_with(self.s.sucker.out()),
            self.s.flywheel.off(),
        ])
        .named("score_speaker_fixed_auto")
    }

    /// Aim from the current distance and fire
    pub fn score_speaker_from_distance(&self) -> Command {
        let angle = self.aim.clone();
        let rpm = self.aim.clone();
        Command::sequence(vec![
            self.shift(),
            self.s
                .pivot
                .move_to_angle("pivot_from_distance", move || angle.shot_pivot_angle())
                .alongside(
                    self.s
                        .flywheel
                        .rev_to("flywheel_from_distance", move || rpm.shot_flywheel_rpm()),
                ),
            self.s.indexer.outtake(),
            self.s.flywheel.off(),
        ])
        .named("score_speaker_from_distance")
    }

    /// Release a revved shot: feed until the note clears the exit beam.
    ///
    /// Skipped while the manipulator holds the left trigger.
    pub fn shot_release(&self) -> Command {
        let exit = self.s.indexer.clone();
        let clear = self.s.indexer.clone();
        let operators = self.operators.clone();
        let threshold = self.trigger_threshold;

        let shot_done = Command::wait_until(condition(move || exit.exit_beam_broken()))
            .and_then(Command::wait_until(condition(move || {
                clear.exit_beam_not_broken()
            })))
            .and_then(Command::wait(self.shot_settle))
            .with_timeout(self.shot_timeout);

        Command::sequence(vec![
            self.s.retractor.move_to_speaker(),
            shot_done.deadline_for(vec![
                self.s.indexer.outtake(),
                self.s.sucker.out(),
                Command::idle([self.s.pivot.resource(), self.s.flywheel.resource()]),
            ]),
        ])
        .named("shot_release")
        .unless(condition(move || {
            operators.manipulator().left_trigger > threshold
        }))
    }

    /// Pass from the feeder station
    pub fn feeder_shot(&self) -> Command {
        Command::sequence(vec![
            self.mate(),
            self.shift(),
            self.s
                .pivot
                .move_to(PivotSetpoint::Feeder)
                .alongside(self.s.flywheel.rev(FlywheelSetpoint::Feeder)),
            Command::idle([self.s.pivot.resource(), self.s.flywheel.resource()]),
        ])
        .named("feeder_shot")
    }

    /// Launcher amp score
    pub fn score_amp(&self) -> Command {
        Command::sequence(vec![
            self.s.indexer.shift_forward(),
            self.s.indexer.shift_backward(),
            self.s
                .pivot
                .aim_at_amp()
                .alongside(self.s.flywheel.rev_amp()),
            self.s.indexer.outtake(),
            self.s.flywheel.off(),
            self.s.pivot.move_to_retracted(),
        ])
        .named("score_amp")
    }

    /// Feed the amp shot while holding the launcher
    pub fn release_amp(&self) -> Command {
        self.s
            .indexer
            .outtake()
            .race_with(Command::idle([
                self.s.pivot.resource(),
                self.s.flywheel.resource(),
            ]))
            .named("release_amp")
    }

    /// Amp score straight out of the intake
    pub fn score_amp_intake(&self) -> Command {
        self.s
            .retractor
            .move_to_amp()
            .and_then(Command::wait(Duration::from_millis(400)).deadline_for(vec![
                self.s.sucker.amp_shot(),
                Command::idle([self.s.retractor.resource()]),
            ]))
            .named("score_amp_intake")
    }

    // ------------------------------------------------------------------
    // Misc
    // ------------------------------------------------------------------

    /// Take every note-handling mechanism, interrupting whatever holds them
    pub fn emergency_cancel(&self) -> Command {
        Command::instant("emergency_cancel", self.s.mechanisms(), || {})
    }

    pub fn zero_yaw(&self) -> Command {
        self.s.drive.zero_yaw_command()
    }
}
