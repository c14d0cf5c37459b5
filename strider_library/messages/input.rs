//! Operator input messages.
//!
//! Two gamepads drive the robot: the driver and the manipulator. Each tick
//! the input layer publishes one [`OperatorSnapshot`]; trigger predicates
//! read it through an [`Operators`] handle and never see a half-updated
//! state.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strider_core::{StriderError, StriderResult};

/// Digital buttons on a gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    LeftStick,
    RightStick,
}

/// Gamepad state for one tick.
///
/// Stick axes are in [-1, 1] with +y pointing down (the raw gamepad
/// convention); trigger axes are in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    #[serde(default)]
    pub a: bool,
    #[serde(default)]
    pub b: bool,
    #[serde(default)]
    pub x: bool,
    #[serde(default)]
    pub y: bool,
    #[serde(default)]
    pub left_bumper: bool,
    #[serde(default)]
    pub right_bumper: bool,
    #[serde(default)]
    pub back: bool,
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub left_stick_click: bool,
    #[serde(default)]
    pub right_stick_click: bool,
    #[serde(default)]
    pub left_x: f64,
    #[serde(default)]
    pub left_y: f64,
    #[serde(default)]
    pub right_x: f64,
    #[serde(default)]
    pub right_y: f64,
    #[serde(default)]
    pub left_trigger: f64,
    #[serde(default)]
    pub right_trigger: f64,
    /// D-pad angle in degrees, None when released
    #[serde(default)]
    pub pov: Option<u16>,
}

impl ControllerState {
    pub fn button(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::LeftBumper => self.left_bumper,
            Button::RightBumper => self.right_bumper,
            Button::Back => self.back,
            Button::Start => self.start,
            Button::LeftStick => self.left_stick_click,
            Button::RightStick => self.right_stick_click,
        }
    }

    /// Clamp every axis into its valid range; NaN reads as released
    pub fn clamped(mut self) -> Self {
        fn axis(v: f64, lo: f64) -> f64 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(lo, 1.0)
            }
        }
        self.left_x = axis(self.left_x, -1.0);
        self.left_y = axis(self.left_y, -1.0);
        self.right_x = axis(self.right_x, -1.0);
        self.right_y = axis(self.right_y, -1.0);
        self.left_trigger = axis(self.left_trigger, 0.0);
        self.right_trigger = axis(self.right_trigger, 0.0);
        self
    }

    /// Set one input by name; buttons read any nonzero value as pressed.
    ///
    /// `pov` takes degrees, or a negative value for released.
    pub fn set(&mut self, input: &str, value: f64) -> StriderResult<()> {
        let pressed = value != 0.0;
        match input {
            "a" => self.a = pressed,
            "b" => self.b = pressed,
            "x" => self.x = pressed,
            "y" => self.y = pressed,
            "left_bumper" => self.left_bumper = pressed,
            "right_bumper" => self.right_bumper = pressed,
            "back" => self.back = pressed,
            "start" => self.start = pressed,
            "left_stick_click" => self.left_stick_click = pressed,
            "right_stick_click" => self.right_stick_click = pressed,
            "left_x" => self.left_x = value,
            "left_y" => self.left_y = value,
            "right_x" => self.right_x = value,
            "right_y" => self.right_y = value,
            "left_trigger" => self.left_trigger = value,
            "right_trigger" => self.right_trigger = value,
            "pov" => self.pov = (value >= 0.0).then_some(value as u16),
            other => {
                return Err(StriderError::config(format!(
                    "unknown controller input '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Which gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Driver,
    Manipulator,
}

/// Both gamepads, sampled together
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    #[serde(default)]
    pub driver: ControllerState,
    #[serde(default)]
    pub manipulator: ControllerState,
}

impl OperatorSnapshot {
    pub fn controller(&self, operator: Operator) -> &ControllerState {
        match operator {
            Operator::Driver => &self.driver,
            Operator::Manipulator => &self.manipulator,
        }
    }

    pub fn controller_mut(&mut self, operator: Operator) -> &mut ControllerState {
        match operator {
            Operator::Driver => &mut self.driver,
            Operator::Manipulator => &mut self.manipulator,
        }
    }
}

/// Read handle for the snapshot published this tick
#[derive(Debug, Clone, Default)]
pub struct Operators {
    current: Arc<RwLock<OperatorSnapshot>>,
}

impl Operators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: OperatorSnapshot) {
        *self.current.write() = OperatorSnapshot {
            driver: snapshot.driver.clamped(),
            manipulator: snapshot.manipulator.clamped(),
        };
    }

    pub fn snapshot(&self) -> OperatorSnapshot {
        *self.current.read()
    }

    pub fn driver(&self) -> ControllerState {
        self.current.read().driver
    }

    pub fn manipulator(&self) -> ControllerState {
        self.current.read().manipulator
    }

    pub fn get(&self, operator: Operator) -> ControllerState {
        *self.current.read().controller(operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_clamps_axes() {
        let operators = Operators::new();
        let mut snapshot = OperatorSnapshot::default();
        snapshot.driver.left_trigger = 1.4;
        snapshot.driver.right_y = -3.0;
        snapshot.manipulator.left_trigger = -0.2;
        snapshot.manipulator.left_x = f64::NAN;
        operators.publish(snapshot);

        let driver = operators.driver();
        assert_eq!(driver.left_trigger, 1.0);
        assert_eq!(driver.right_y, -1.0);
        let manipulator = operators.manipulator();
        assert_eq!(manipulator.left_trigger, 0.0);
        assert_eq!(manipulator.left_x, 0.0);
    }

    #[test]
    fn test_set_by_name() {
        let mut state = ControllerState::default();
        state.set("left_bumper", 1.0).unwrap();
        state.set("pov", 0.0).unwrap();
        state.set("right_trigger", 0.9).unwrap();
        assert!(state.button(Button::LeftBumper));
        assert_eq!(state.pov, Some(0));
        assert_eq!(state.right_trigger, 0.9);

        state.set("pov", -1.0).unwrap();
        assert_eq!(state.pov, None);
        assert!(state.set("turbo", 1.0).is_err());
    }
}
