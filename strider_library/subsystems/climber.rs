//! Two independently driven climber arms.

use parking_lot::RwLock;
use std::sync::Arc;
use strider_core::{Command, ResourceId, Scheduler, StriderResult};

/// Arm travel in meters
pub const CLIMBER_TRAVEL_M: f64 = 0.6;
const CLIMBER_SPEED_M_PER_S: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimberSide {
    Left,
    Right,
    Both,
}

impl ClimberSide {
    fn label(self) -> &'static str {
        match self {
            ClimberSide::Left => "left",
            ClimberSide::Right => "right",
            ClimberSide::Both => "both",
        }
    }
}

#[derive(Debug, Default)]
struct Arm {
    power: f64,
    height_m: f64,
}

impl Arm {
    fn step(&mut self, dt: f64) {
        self.height_m =
            (self.height_m + self.power * CLIMBER_SPEED_M_PER_S * dt).clamp(0.0, CLIMBER_TRAVEL_M);
    }
}

#[derive(Debug, Default)]
struct ClimberState {
    left: Arm,
    right: Arm,
}

/// Both arms share one resource
#[derive(Clone)]
pub struct Climber {
    resource: ResourceId,
    state: Arc<RwLock<ClimberState>>,
}

impl Climber {
    pub fn register(scheduler: &mut Scheduler) -> StriderResult<Self> {
        Ok(Self {
            resource: scheduler.register_resource("climber")?,
            state: Arc::new(RwLock::new(ClimberState::default())),
        })
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    /// (left, right) output
    pub fn power(&self) -> (f64, f64) {
        let state = self.state.read();
        (state.left.power, state.right.power)
    }

    /// (left, right) extension
    pub fn height_m(&self) -> (f64, f64) {
        let state = self.state.read();
        (state.left.height_m, state.right.height_m)
    }

    fn set_power(&self, side: ClimberSide, power: f64) {
        let power = power.clamp(-1.0, 1.0);
        let mut state = self.state.write();
        match side {
            ClimberSide::Left => state.left.power = power,
            ClimberSide::Right => state.right.power = power,
            ClimberSide::Both => {
                state.left.power = power;
                state.right.power = power;
            }
        }
    }

    pub(crate) fn step(&self, dt: f64) {
        let mut state = self.state.write();
        state.left.step(dt);
        state.right.step(dt);
    }

    /// Drive `side` with `power()` every tick; the side stops when the command ends
    pub fn drive<F>(&self, side: ClimberSide, power: F) -> Command
    where
        F: Fn() -> f64 + Send + 'static,
    {
        let this = self.clone();
        let stop = self.clone();
        Command::run(
            format!("climber_{}", side.label()),
            [self.resource],
            move || this.set_power(side, power()),
        )
        .finally_do(move |_| stop.set_power(side, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_core::SchedulerConfig;

    #[test]
    fn test_drive_one_side_then_stop() {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        let climber = Climber::register(&mut scheduler).unwrap();
        let id = scheduler
            .schedule(climber.drive(ClimberSide::Right, || 0.5))
            .unwrap()
            .unwrap();
        scheduler.tick();
        climber.step(0.1);
        assert_eq!(climber.power(), (0.0, 0.5));
        assert!(climber.height_m().1 > 0.0);

        scheduler.cancel(id);
        assert_eq!(climber.power(), (0.0, 0.0));
    }

    #[test]
    fn test_height_clamped_to_travel() {
        let mut scheduler = Scheduler::new();
        let climber = Climber::register(&mut scheduler).unwrap();
        climber.set_power(ClimberSide::Both, 2.0);
        for _ in 0..100 {
            climber.step(0.1);
        }
        assert_eq!(climber.height_m(), (CLIMBER_TRAVEL_M, CLIMBER_TRAVEL_M));
    }
}
