//! Robot container: one place that builds and wires the whole robot.
//!
//! Construction registers the mechanisms, installs default commands, wires
//! operator bindings and LED signals, and builds every autonomous routine.
//! Any failure (bad config, unknown trajectory, duplicate signal priority)
//! surfaces from [`RobotContainer::new`] before the first tick.

use crate::autos::{named_commands, AutoBuilder};
use crate::bindings::{configure_bindings, ControlScheme};
use crate::commands::{RobotCommands, SpeakerAim};
use crate::io::{InputSource, RobotIo, ScriptedInput};
use crate::messages::{LedPattern, Operators};
use crate::signals::{register_robot_signals, LedStrip, DEFAULT_LED_COUNT};
use crate::subsystems::{AimTable, Plant, RetractorSetpoint, Subsystems, TrajectoryTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use strider_core::{
    factory, CommandId, ModeController, NamedCommands, RoutineCatalog, RuntimeParams, Scheduler,
    SchedulerConfig, SignalArbiter, StriderError, StriderResult, TickSummary,
};
use tracing::{info, warn};

/// Name of the climbing mode flag
pub const CLIMB_MODE: &str = "climbing";

/// Length of the autonomous period
pub const AUTONOMOUS_PERIOD: Duration = Duration::from_secs(15);
/// Length of the teleoperated period
pub const TELEOP_PERIOD: Duration = Duration::from_secs(135);

fn default_led_count() -> usize {
    DEFAULT_LED_COUNT
}

fn default_true() -> bool {
    true
}

/// Everything that configures one robot instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub control_scheme: ControlScheme,
    /// Extra or replacement paths, merged over the built-in set
    #[serde(default)]
    pub trajectories: TrajectoryTable,
    /// Autonomous routine to run; the catalog default when unset
    #[serde(default)]
    pub auto: Option<String>,
    #[serde(default = "default_led_count")]
    pub led_count: usize,
    /// Start the match holding a note
    #[serde(default = "default_true")]
    pub preload: bool,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub aim_table: AimTable,
    /// Runtime parameter overrides (YAML or JSON)
    #[serde(default)]
    pub params_path: Option<PathBuf>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            control_scheme: ControlScheme::default(),
            trajectories: TrajectoryTable::new(),
            auto: None,
            led_count: DEFAULT_LED_COUNT,
            preload: true,
            scheduler: SchedulerConfig::standard(),
            aim_table: AimTable::default(),
            params_path: None,
        }
    }
}

impl RobotConfig {
    /// Fast, non-realtime configuration for simulated matches
    pub fn simulation() -> Self {
        Self {
            scheduler: SchedulerConfig::simulation(),
            ..Self::default()
        }
    }

    pub fn from_yaml(contents: &str) -> StriderResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> StriderResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> StriderResult<()> {
        self.scheduler.validate()?;
        for (name, path) in self.trajectories.iter() {
            if !(path.duration_s > 0.0) {
                return Err(StriderError::config(format!(
                    "trajectory '{}' must have a positive duration",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Score sheet for a simulated match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub ticks: u64,
    pub pickups: u32,
    pub speaker_shots: u32,
    pub amp_scores: u32,
    pub ejected: u32,
    pub holding_note: bool,
    pub climbing: bool,
    /// Field pose (x m, y m, heading deg)
    pub pose: (f64, f64, f64),
    pub led: LedPattern,
}

impl MatchReport {
    /// Match points: 2 per speaker note, 1 per amp note
    pub fn points(&self) -> u32 {
        self.speaker_shots * 2 + self.amp_scores
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks, {} pickups, {} speaker, {} amp, {} ejected, {} points",
            self.ticks,
            self.pickups,
            self.speaker_shots,
            self.amp_scores,
            self.ejected,
            self.points()
        )
    }
}

/// The assembled robot
pub struct RobotContainer {
    scheduler: Scheduler,
    subsystems: Subsystems,
    commands: RobotCommands,
    operators: Operators,
    params: RuntimeParams,
    strip: LedStrip,
    named: NamedCommands,
    catalog: Option<RoutineCatalog>,
    auto_name: Option<String>,
    auto_command: Option<CommandId>,
    mode: Arc<ModeController>,
}

impl RobotContainer {
    pub fn new(config: RobotConfig) -> StriderResult<Self> {
        config.validate()?;

        let mut scheduler = Scheduler::new()
            .with_config(config.scheduler.clone())
            .with_mode_name(CLIMB_MODE);
        let mode = scheduler.mode();

        let mut trajectories = TrajectoryTable::builtin();
        trajectories.merge(config.trajectories.clone());
        let subsystems = Subsystems::register(&mut scheduler, trajectories, config.preload)?;

        let params = RuntimeParams::with_defaults();
        if let Some(path) = &config.params_path {
            params.load_from_disk(path)?;
        }

        let operators = Operators::new();
        let aim = SpeakerAim::new(&subsystems, config.aim_table.clone(), &params);
        let commands = RobotCommands::new(&subsystems, aim, operators.clone(), &params);

        Self::configure_defaults(&mut scheduler, &mode, &subsystems, &commands, &operators)?;

        let triggers = configure_bindings(
            &mut scheduler,
            config.control_scheme,
            &commands,
            &operators,
            &params,
        );

        let strip = LedStrip::new(config.led_count);
        let mut arbiter = SignalArbiter::new();
        register_robot_signals(&mut arbiter, &strip, &subsystems, &mode)?;
        scheduler.set_signal_arbiter(arbiter);

        let named = named_commands(&commands)?;
        let catalog = AutoBuilder::new(&commands, &subsystems.drive).build_catalog()?;
        if let Some(name) = &config.auto {
            if !catalog.contains(name) {
                return Err(StriderError::UnknownRoutine(name.clone()));
            }
        }

        scheduler.set_input(Box::new(RobotIo::new(
            Plant::new(&subsystems),
            operators.clone(),
            Box::new(ScriptedInput::new()),
        )));

        info!(
            scheme = ?config.control_scheme,
            triggers,
            routines = catalog.len(),
            auto = config.auto.as_deref().unwrap_or("<default>"),
            "robot container ready"
        );

        Ok(Self {
            scheduler,
            subsystems,
            commands,
            operators,
            params,
            strip,
            named,
            catalog: Some(catalog),
            auto_name: config.auto,
            auto_command: None,
            mode,
        })
    }

    fn configure_defaults(
        scheduler: &mut Scheduler,
        mode: &Arc<ModeController>,
        s: &Subsystems,
        commands: &RobotCommands,
        operators: &Operators,
    ) -> StriderResult<()> {
        let drive = s.drive.clone();
        let ops = operators.clone();
        scheduler.set_default_command(
            s.drive.resource(),
            factory(move || drive.teleop(ops.clone())),
        )?;

        let sucker = s.sucker.clone();
        scheduler.set_default_command(s.sucker.resource(), factory(move || sucker.off()))?;

        let indexer = s.indexer.clone();
        scheduler.set_default_command(s.indexer.resource(), factory(move || indexer.off()))?;

        let c = commands.clone();
        scheduler.set_default_command(
            s.flywheel.resource(),
            factory(move || c.flywheel_default()),
        )?;

        let retractor = s.retractor.clone();
        scheduler.set_default_command(
            s.retractor.resource(),
            factory(move || retractor.hold(RetractorSetpoint::Speaker)),
        )?;

        // Pivot aims while driving and folds away while climbing
        let c = commands.clone();
        let pivot = s.pivot.clone();
        mode.subscribe(
            s.pivot.resource(),
            Some(factory(move || c.pivot_default())),
            Some(factory(move || pivot.hold_retracted())),
        )?;
        Ok(())
    }

    /// Replace the operator input source
    pub fn set_input_source(&mut self, source: Box<dyn InputSource>) {
        self.scheduler.set_input(Box::new(RobotIo::new(
            Plant::new(&self.subsystems),
            self.operators.clone(),
            source,
        )));
    }

    /// Leave climbing mode and start the selected routine
    pub fn autonomous_init(&mut self) -> StriderResult<()> {
        self.scheduler.schedule(self.mode.disable_command())?;

        let catalog = match self.catalog.take() {
            Some(catalog) => catalog,
            None => AutoBuilder::new(&self.commands, &self.subsystems.drive).build_catalog()?,
        };
        let routine = catalog.select(self.auto_name.as_deref())?;
        let name = routine.name().to_string();
        self.auto_command = self.scheduler.schedule(routine)?;
        if self.auto_command.is_none() {
            warn!(routine = %name, "autonomous routine did not start");
        }
        Ok(())
    }

    /// Leave climbing mode and stop whatever is left of the routine
    pub fn teleop_init(&mut self) -> StriderResult<()> {
        self.scheduler.schedule(self.mode.disable_command())?;
        if let Some(id) = self.auto_command.take() {
            if self.scheduler.cancel(id) {
                info!("autonomous routine cancelled for teleop");
            }
        }
        Ok(())
    }

    /// One control tick
    pub fn step(&mut self) -> TickSummary {
        self.scheduler.tick()
    }

    /// Tick `count` times without sleeping
    pub fn step_n(&mut self, count: u64) {
        for _ in 0..count {
            self.scheduler.tick();
        }
    }

    /// Run one match period through the scheduler loop.
    ///
    /// Returns false if the loop was stopped before `duration` elapsed.
    pub fn run_phase(&mut self, duration: Duration) -> StriderResult<bool> {
        let period = self.scheduler.config().period().as_nanos().max(1);
        let expected = duration.as_nanos().div_ceil(period) as u64;
        let start = self.scheduler.tick_count();
        self.scheduler.run_for(duration)?;
        Ok(self.scheduler.tick_count() - start >= expected)
    }

    pub fn report(&self) -> MatchReport {
        let notes = &self.subsystems.notes;
        MatchReport {
            ticks: self.scheduler.tick_count(),
            pickups: notes.pickups(),
            speaker_shots: notes.shots(),
            amp_scores: notes.amp_scores(),
            ejected: notes.ejected(),
            holding_note: notes.has_note(),
            climbing: self.mode.is_active(),
            pose: self.subsystems.drive.pose(),
            led: self.strip.pattern(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn subsystems(&self) -> &Subsystems {
        &self.subsystems
    }

    pub fn commands(&self) -> &RobotCommands {
        &self.commands
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    pub fn params(&self) -> &RuntimeParams {
        &self.params
    }

    pub fn strip(&self) -> &LedStrip {
        &self.strip
    }

    pub fn mode(&self) -> &Arc<ModeController> {
        &self.mode
    }

    pub fn named_commands(&self) -> &NamedCommands {
        &self.named
    }

    /// Routine names, empty once autonomous has started
    pub fn routine_names(&self) -> Vec<&str> {
        self.catalog
            .as_ref()
            .map(|catalog| catalog.names())
            .unwrap_or_default()
    }

    pub fn auto_command(&self) -> Option<CommandId> {
        self.auto_command
    }
}

impl fmt::Debug for RobotContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RobotContainer")
            .field("ticks", &self.scheduler.tick_count())
            .field("running", &self.scheduler.running_names())
            .field("mode", &self.mode)
            .field("auto", &self.auto_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config = RobotConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RobotConfig::default());
        assert!(config.preload);
        assert_eq!(config.led_count, DEFAULT_LED_COUNT);
    }

    #[test]
    fn test_config_rejects_zero_period() {
        let yaml = "scheduler:\n  timing:\n    period_ms: 0\n";
        assert!(RobotConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_auto_rejected() {
        let config = RobotConfig {
            auto: Some("Win Everything".to_string()),
            ..RobotConfig::simulation()
        };
        assert!(matches!(
            RobotContainer::new(config),
            Err(StriderError::UnknownRoutine(name)) if name == "Win Everything"
        ));
    }

    #[test]
    fn test_defaults_take_every_mechanism() {
        let mut robot = RobotContainer::new(RobotConfig::simulation()).unwrap();
        robot.step();
        let s = robot.subsystems().clone();
        let scheduler = robot.scheduler();
        assert_eq!(scheduler.owner_of(s.drive.resource()), Some("drive_teleop"));
        assert_eq!(scheduler.owner_of(s.sucker.resource()), Some("sucker_off"));
        assert_eq!(scheduler.owner_of(s.pivot.resource()), Some("pivot_aim_speaker"));
        assert_eq!(scheduler.owner_of(s.climber.resource()), None);
    }

    #[test]
    fn test_report_points() {
        let robot = RobotContainer::new(RobotConfig::simulation()).unwrap();
        let report = robot.report();
        assert_eq!(report.points(), 0);
        assert!(report.holding_note);
        assert!(!report.climbing);
    }
}
