//! # Core types for the STRIDER command model
//!
//! - **Resource**: a named actuator slot owned by at most one running command
//! - **Action**: leaf behavior with the Initialize / Execute / IsFinished / End lifecycle
//! - **Command**: a tree of actions joined by composition operators and decorators
//! - **TickContext**: the per-tick view every lifecycle call receives
//!
//! ## Command Lifecycle
//!
//! Every activation goes through the same states:
//! 1. **Idle** - built by a factory, not yet scheduled
//! 2. **Initializing** - resources claimed, `initialize()` running
//! 3. **Running** - `execute()` and `is_finished()` once per tick
//! 4. **Ending** - `end(interrupted)` running, exactly once
//! 5. **Ended** - dropped by the scheduler

pub mod action;
pub mod command;
pub mod compose;
pub mod context;
pub mod resource;

pub use action::Action;
pub use command::{condition, factory, Command, CommandFactory, CommandState, Condition};
pub use context::TickContext;
pub use resource::{CommandId, DefaultTable, ResourceId, ResourceSet};
