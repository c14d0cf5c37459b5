//! # STRIDER Robot Library
//!
//! A competition robot built on `strider_core`: simulated mechanisms,
//! operator bindings, LED status signals and autonomous routines.
//!
//! ## Structure
//!
//! ```text
//! strider_library/
//! ── messages/       # Gamepad state and LED patterns
//! ── subsystems/     # Mechanisms, drivetrain, note simulation
//! ── commands.rs     # Multi-mechanism commands (intake, handoff, scoring)
//! ── bindings.rs     # Gamepad to command wiring
//! ── signals.rs      # LED strip and status signal registration
//! ── autos.rs        # Autonomous routine catalog
//! ── io.rs           # Input sources and the per-tick plant hook
//! ── container.rs    # Builds and wires the whole robot
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use strider_library::{RobotConfig, RobotContainer};
//!
//! let mut robot = RobotContainer::new(RobotConfig::simulation()).unwrap();
//! robot.autonomous_init().unwrap();
//! robot.step_n(750);
//! println!("{}", robot.report());
//! ```

pub mod autos;
pub mod bindings;
pub mod commands;
pub mod container;
pub mod io;
pub mod messages;
pub mod signals;
pub mod subsystems;

pub use autos::{named_commands, AutoBuilder, DEFAULT_ROUTINE};
pub use bindings::{configure_bindings, ControlScheme};
pub use commands::{RobotCommands, SpeakerAim};
pub use container::{MatchReport, RobotConfig, RobotContainer, AUTONOMOUS_PERIOD, TELEOP_PERIOD};
pub use io::{InputSource, RobotIo, ScriptStep, ScriptedInput};
pub use messages::*;
pub use signals::{register_robot_signals, LedStrip};
pub use subsystems::*;
