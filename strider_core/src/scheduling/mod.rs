//! # STRIDER Scheduling
//!
//! - **Scheduler**: owns resources, triggers, running commands and the signal arbiter
//! - **SchedulerConfig**: tick period, run limits and log switches
//!
//! ## Usage
//!
//! ```rust
//! use strider_core::{Command, Scheduler, SchedulerConfig, Trigger};
//!
//! let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
//! let intake = scheduler.register_resource("intake").unwrap();
//! scheduler.add_trigger(
//!     Trigger::new("a_button", || true).on_true(move || Command::idle([intake]).named("suck")),
//! );
//!
//! scheduler.tick();
//! assert_eq!(scheduler.owner_of(intake), Some("suck"));
//! ```

pub mod config;
pub mod scheduler;

pub use config::{LoggingConfig, SchedulerConfig, TimingConfig};
pub use scheduler::{Scheduler, TickSummary};
