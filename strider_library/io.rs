//! Input sources and the per-tick I/O hook.
//!
//! [`RobotIo`] is installed as the scheduler's input sampler. At the start
//! of every tick it advances the plant by one period and publishes a fresh
//! operator snapshot, so every trigger in that tick reads the same input.

use crate::messages::{ControllerState, Operator, OperatorSnapshot, Operators};
use crate::subsystems::Plant;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strider_core::{InputSampler, StriderResult, TickContext};
use tracing::debug;

/// Something that can produce both gamepads' state once per tick
pub trait InputSource: Send {
    fn sample(&mut self, ctx: &TickContext) -> OperatorSnapshot;
}

/// One scripted input change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Scheduler tick at which the change takes effect
    pub tick: u64,
    pub controller: Operator,
    /// Input name as accepted by [`ControllerState::set`]
    pub input: String,
    /// Axis value, or nonzero for a pressed button
    #[serde(default = "pressed")]
    pub value: f64,
}

fn pressed() -> f64 {
    1.0
}

/// Replays input changes keyed by tick. Inputs hold their value until changed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: Vec<ScriptStep>,
    cursor: usize,
    current: OperatorSnapshot,
}

impl ScriptedInput {
    /// No input at all; both gamepads stay released
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from steps in any order. Unknown input names are rejected here.
    pub fn from_steps(mut steps: Vec<ScriptStep>) -> StriderResult<Self> {
        let mut scratch = ControllerState::default();
        for step in &steps {
            scratch.set(&step.input, step.value)?;
        }
        // Stable: same-tick steps apply in file order
        steps.sort_by_key(|step| step.tick);
        Ok(Self {
            steps,
            cursor: 0,
            current: OperatorSnapshot::default(),
        })
    }

    pub fn from_yaml(contents: &str) -> StriderResult<Self> {
        let steps: Vec<ScriptStep> = serde_yaml::from_str(contents)?;
        Self::from_steps(steps)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> StriderResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Append a step (builder style)
    pub fn at(
        self,
        tick: u64,
        controller: Operator,
        input: &str,
        value: f64,
    ) -> StriderResult<Self> {
        let mut steps = self.steps;
        steps.push(ScriptStep {
            tick,
            controller,
            input: input.to_string(),
            value,
        });
        Self::from_steps(steps)
    }

    /// Press at `down`, release at `up`
    pub fn hold(self, controller: Operator, input: &str, down: u64, up: u64) -> StriderResult<Self> {
        self.at(down, controller, input, 1.0)?
            .at(up, controller, input, 0.0)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Last tick with a scripted change
    pub fn last_tick(&self) -> Option<u64> {
        self.steps.last().map(|step| step.tick)
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, ctx: &TickContext) -> OperatorSnapshot {
        while let Some(step) = self.steps.get(self.cursor) {
            if step.tick > ctx.tick() {
                break;
            }
            let controller = self.current.controller_mut(step.controller);
            // Names were checked when the script was built
            if controller.set(&step.input, step.value).is_ok() {
                debug!(tick = ctx.tick(), controller = ?step.controller, input = %step.input, value = step.value, "scripted input");
            }
            self.cursor += 1;
        }
        self.current
    }
}

/// Scheduler input hook: plant step, then operator snapshot
pub struct RobotIo {
    plant: Plant,
    operators: Operators,
    source: Box<dyn InputSource>,
}

impl RobotIo {
    pub fn new(plant: Plant, operators: Operators, source: Box<dyn InputSource>) -> Self {
        Self {
            plant,
            operators,
            source,
        }
    }
}

impl InputSampler for RobotIo {
    fn sample(&mut self, ctx: &TickContext) {
        self.plant.step(ctx.period().as_secs_f64());
        self.operators.publish(self.source.sample(ctx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(tick: u64) -> TickContext {
        TickContext::new(tick, Duration::from_millis(20))
    }

    #[test]
    fn test_script_holds_until_changed() {
        let mut input = ScriptedInput::new()
            .hold(Operator::Driver, "a", 2, 5)
            .unwrap();
        assert!(!input.sample(&ctx(1)).driver.a);
        assert!(input.sample(&ctx(2)).driver.a);
        assert!(input.sample(&ctx(4)).driver.a);
        assert!(!input.sample(&ctx(5)).driver.a);
    }

    #[test]
    fn test_script_skipped_ticks_catch_up() {
        let mut input = ScriptedInput::new()
            .at(3, Operator::Manipulator, "right_trigger", 0.7)
            .unwrap()
            .at(1, Operator::Manipulator, "left_y", -1.0)
            .unwrap();
        let snapshot = input.sample(&ctx(10));
        assert_eq!(snapshot.manipulator.right_trigger, 0.7);
        assert_eq!(snapshot.manipulator.left_y, -1.0);
    }

    #[test]
    fn test_script_from_yaml() {
        let yaml = r#"
- tick: 10
  controller: driver
  input: y
- tick: 12
  controller: driver
  input: y
  value: 0
"#;
        let input = ScriptedInput::from_yaml(yaml).unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input.last_tick(), Some(12));
    }

    #[test]
    fn test_script_rejects_unknown_input() {
        let yaml = "- {tick: 1, controller: driver, input: turbo}";
        assert!(ScriptedInput::from_yaml(yaml).is_err());
    }
}
