//! Autonomous routines.
//!
//! Every routine is built eagerly when the catalog is created, so a routine
//! naming a trajectory the path follower does not know fails before the
//! match instead of halfway through it.

use crate::commands::RobotCommands;
use std::time::Duration;
use strider_core::{
    condition, Command, NamedCommands, PathFollower, RoutineCatalog, StriderResult,
};
use tracing::info;

pub const DEFAULT_ROUTINE: &str = "Score And Sit";

/// Time allowed after a pickup path ends for the intake to finish
const PICKUP_GRACE: Duration = Duration::from_millis(500);

/// Reusable routine pieces over one path follower
pub struct AutoBuilder<'a> {
    commands: &'a RobotCommands,
    follower: &'a dyn PathFollower,
}

impl<'a> AutoBuilder<'a> {
    pub fn new(commands: &'a RobotCommands, follower: &'a dyn PathFollower) -> Self {
        Self { commands, follower }
    }

    pub fn follow(&self, path: &str) -> StriderResult<Command> {
        self.follower.follow(path)
    }

    /// Snap the pose estimate to where `path` starts
    pub fn reset(&self, path: &str) -> StriderResult<Command> {
        self.follower.reset_to_path_start(path)
    }

    /// Shoot the note sitting in the sucker from the subwoofer
    pub fn score_speaker_fixed(&self) -> Command {
        self.commands.score_speaker_fixed_auto()
    }

    /// Drive `path` with the intake down
    pub fn path_and_intake(&self, path: &str) -> StriderResult<Command> {
        Ok(self
            .follow(path)?
            .and_then(Command::wait(PICKUP_GRACE))
            .deadline_for(vec![self.commands.intake_note()])
            .named(format!("path_and_intake({})", path)))
    }

    /// Drive `path` while lining up for a handoff
    pub fn path_and_mate(&self, path: &str) -> StriderResult<Command> {
        Ok(self
            .follow(path)?
            .alongside(self.commands.mate())
            .named(format!("path_and_mate({})", path)))
    }

    /// Drive `path` with everything folded in
    pub fn path_and_retract(&self, path: &str) -> StriderResult<Command> {
        let s = self.commands.subsystems();
        Ok(Command::parallel(vec![
            self.follow(path)?,
            s.retractor.move_to(crate::subsystems::RetractorSetpoint::Retracted),
            s.pivot.move_to_retracted(),
        ])
        .named(format!("path_and_retract({})", path)))
    }

    /// Intake along `path`; shoot from where it stops if a note was picked up,
    /// otherwise fold the intake back up
    pub fn path_and_shoot(&self, path: &str) -> StriderResult<Command> {
        let sucker = self.commands.subsystems().sucker.clone();
        Ok(Command::sequence(vec![
            self.follow(path)?.race_with(self.commands.intake_note()),
            Command::either(
                self.commands
                    .mate()
                    .and_then(self.commands.score_speaker_from_distance()),
                self.commands.subsystems().retractor.move_to_mating(),
                condition(move || sucker.note_detected()),
            ),
        ])
        .named(format!("path_and_shoot({})", path)))
    }

    /// Shoot from distance, skipped when there is no note on board
    pub fn score_from_distance(&self) -> Command {
        let notes = self.commands.subsystems().notes.clone();
        self.commands
            .score_speaker_from_distance()
            .only_if(condition(move || notes.has_note()))
    }

    /// Reset to `path`, score the preload, then drive `path`
    fn score_and_follow(&self, path: &str) -> StriderResult<Command> {
        Ok(Command::sequence(vec![
            self.reset(path)?,
            self.score_speaker_fixed(),
            self.follow(path)?,
        ]))
    }

    fn three_top_center(&self) -> StriderResult<Command> {
        Ok(Command::sequence(vec![
            self.reset("3TopCenter.1")?,
            self.score_speaker_fixed(),
            self.path_and_intake("3TopCenter.1")?,
            self.path_and_retract("3TopCenter.2")?,
            self.score_speaker_fixed(),
            self.path_and_intake("3TopCenter.3")?,
            self.path_and_retract("3TopCenter.4")?,
            self.score_speaker_fixed(),
        ]))
    }

    fn four_skip(&self) -> StriderResult<Command> {
        Ok(Command::sequence(vec![
            self.reset("4NB-Skip.1")?,
            self.score_speaker_fixed(),
            self.path_and_intake("4NB-Skip.1")?,
            self.path_and_mate("4NB-Skip.2")?,
            self.score_from_distance(),
            self.path_and_intake("4NB-Skip.3")?,
            self.path_and_mate("4NB-Skip.4")?,
            self.score_from_distance(),
            self.path_and_shoot("4NB-Skip.5")?,
        ]))
    }

    fn three_close(&self) -> StriderResult<Command> {
        Ok(Command::sequence(vec![
            self.reset("3NB-Close.1")?,
            self.score_speaker_fixed(),
            self.path_and_shoot("3NB-Close.1")?,
            self.path_and_intake("3NB-Close.2")?,
            self.path_and_mate("3NB-Close.3")?,
            self.score_from_distance(),
        ]))
    }

    fn sweep_straight(&self) -> StriderResult<Command> {
        Ok(Command::sequence(vec![
            self.reset("4NB-SweepStraight.1")?,
            self.score_speaker_fixed(),
            self.path_and_shoot("4NB-SweepStraight.1")?,
            self.path_and_shoot("4NB-SweepStraight.2")?,
            self.path_and_shoot("4NB-SweepStraight.3")?,
        ]))
    }

    /// Every competition routine, with "Score And Sit" as the default
    pub fn build_catalog(&self) -> StriderResult<RoutineCatalog> {
        let mut catalog = RoutineCatalog::new();
        catalog.add_option("Do Nothing", Command::none())?;
        catalog.set_default_option(DEFAULT_ROUTINE, self.score_speaker_fixed())?;
        catalog.add_option(
            "Tune",
            self.reset("Bruh")?.and_then(self.follow("Bruh")?),
        )?;
        catalog.add_option("AMP score & taxi", self.score_and_follow("TopTaxi")?)?;
        catalog.add_option("SOURCE score & taxi", self.score_and_follow("BotTaxi")?)?;
        catalog.add_option("AMP straight to center", self.three_top_center()?)?;
        catalog.add_option("AMP chaos", self.score_and_follow("TopDisrupt")?)?;
        catalog.add_option("SOURCE chaos", self.score_and_follow("BotDisrupt")?)?;
        catalog.add_option("4 piece skip", self.four_skip()?)?;
        catalog.add_option("3 piece close", self.three_close()?)?;
        catalog.add_option("3 piece sweep straight", self.sweep_straight()?)?;
        info!(routines = catalog.len(), "autonomous catalog built");
        Ok(catalog)
    }
}

/// Commands exposed by name to externally authored routines
pub fn named_commands(commands: &RobotCommands) -> StriderResult<NamedCommands> {
    let mut named = NamedCommands::new();
    let c = commands.clone();
    named.register("IntakeNote", move || c.intake_note())?;
    Ok(named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SpeakerAim;
    use crate::messages::Operators;
    use crate::subsystems::{AimTable, Subsystems, TrajectoryTable};
    use strider_core::{RuntimeParams, Scheduler, StriderError};

    fn commands(trajectories: TrajectoryTable) -> RobotCommands {
        let mut scheduler = Scheduler::new();
        let s = Subsystems::register(&mut scheduler, trajectories, true).unwrap();
        let params = RuntimeParams::with_defaults();
        let aim = SpeakerAim::new(&s, AimTable::default(), &params);
        RobotCommands::new(&s, aim, Operators::new(), &params)
    }

    #[test]
    fn test_catalog_has_every_routine() {
        let c = commands(TrajectoryTable::builtin());
        let catalog = AutoBuilder::new(&c, &c.subsystems().drive)
            .build_catalog()
            .unwrap();
        assert_eq!(catalog.len(), 11);
        assert_eq!(catalog.default_name(), Some(DEFAULT_ROUTINE));
        assert!(catalog.contains("4 piece skip"));
    }

    #[test]
    fn test_missing_trajectory_fails_build() {
        let mut paths = TrajectoryTable::builtin();
        paths.remove("4NB-Skip.3");
        let c = commands(paths);
        let result = AutoBuilder::new(&c, &c.subsystems().drive).build_catalog();
        assert!(matches!(result, Err(StriderError::UnknownTrajectory(name)) if name == "4NB-Skip.3"));
    }

    #[test]
    fn test_named_intake() {
        let c = commands(TrajectoryTable::builtin());
        let named = named_commands(&c).unwrap();
        assert_eq!(named.get("IntakeNote").unwrap().name(), "IntakeNote");
        assert!(named.get("Shoot").is_err());
    }
}
