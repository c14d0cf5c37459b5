//! # STRIDER Core
//!
//! Reactive command scheduling for a competition robot. Each fixed-period
//! tick the scheduler decides which command may drive which actuator,
//! resolves conflicting requests by interruption, and turns operator input
//! into commands through edge-detecting triggers.
//!
//! - **Commands**: lifecycle trees built from leaves, groups and decorators
//! - **Scheduler**: resource ownership, trigger dispatch, default commands
//! - **ModeController**: one shared flag that gates bindings and rebinds defaults
//! - **SignalArbiter**: priority override stack committing one effect per tick
//! - **Catalogs**: named commands and the autonomous routine catalog
//!
//! ## Quick Start
//!
//! ```rust
//! use strider_core::{Command, Scheduler, SchedulerConfig, Trigger};
//! use std::time::Duration;
//!
//! let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
//! let pivot = scheduler.register_resource("pivot").unwrap();
//!
//! scheduler.add_trigger(Trigger::new("start", || true).on_true(move || {
//!     Command::idle([pivot])
//!         .named("hold_pivot")
//!         .with_timeout(Duration::from_millis(100))
//! }));
//!
//! scheduler.run_for(Duration::from_millis(200)).unwrap();
//! assert!(scheduler.running_names().is_empty());
//! ```

pub mod catalog;
pub mod core;
pub mod error;
pub mod mode;
pub mod params;
pub mod scheduling;
pub mod signal;
pub mod trigger;

pub use catalog::{NamedCommands, PathFollower, RoutineCatalog};
pub use crate::core::{
    condition, factory, Action, Command, CommandFactory, CommandId, CommandState, Condition,
    DefaultTable, ResourceId, ResourceSet, TickContext,
};
pub use error::{StriderError, StriderResult};
pub use mode::{ModeController, ModeGate};
pub use params::RuntimeParams;
pub use scheduling::{Scheduler, SchedulerConfig, TickSummary};
pub use signal::{CommittedSignal, Effect, SignalArbiter};
pub use trigger::{Edge, InputSampler, Trigger};
