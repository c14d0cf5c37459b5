//! Message types shared between the operator layer and the robot.
//!
//! - Input: controller state as sampled once per tick
//! - Led: colors and patterns rendered by signal effects

pub mod input;
pub mod led;

pub use input::{Button, ControllerState, Operator, OperatorSnapshot, Operators};
pub use led::{Color, LedPattern};
