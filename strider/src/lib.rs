//! # STRIDER
//!
//! Reactive command scheduling for competition robots, plus a complete
//! simulated robot to drive it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strider::prelude::*;
//!
//! fn main() -> AnyResult<()> {
//!     let mut robot = RobotContainer::new(RobotConfig::simulation())?;
//!     robot.autonomous_init()?;
//!     robot.run_phase(AUTONOMOUS_PERIOD)?;
//!     println!("{}", robot.report());
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - **strider_core**: commands, scheduler, triggers, mode flag, signal arbiter
//! - **strider_library**: the robot built on top (re-exported as `library`)

pub use strider_core::{self, *};

pub use strider_library as library;

/// Everything needed to build commands and run the robot
pub mod prelude {
    // Commands
    pub use strider_core::{condition, factory, Action, Command, CommandFactory, Condition};

    // Scheduling
    pub use strider_core::{
        ModeController, ModeGate, ResourceId, Scheduler, SchedulerConfig, TickContext, Trigger,
    };

    // Catalogs and signals
    pub use strider_core::{NamedCommands, PathFollower, RoutineCatalog, SignalArbiter};

    // Error types
    pub use strider_core::{StriderError, StriderResult};
    pub type Result<T> = StriderResult<T>;

    // Common std types
    pub use std::sync::Arc;
    pub use std::time::Duration;

    // Common traits
    pub use serde::{Deserialize, Serialize};

    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};

    // The robot
    pub use strider_library::{
        ControlScheme, InputSource, MatchReport, RobotConfig, RobotContainer, ScriptedInput,
        AUTONOMOUS_PERIOD, TELEOP_PERIOD,
    };
    pub use strider_library::messages::*;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}
