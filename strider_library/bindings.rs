//! Operator control bindings.
//!
//! Two layouts exist. [`ControlScheme::Active`] is the one used in matches;
//! [`ControlScheme::Legacy`] is the older layout (driver shoots from the
//! left trigger, manipulator scores amp from the launcher), kept selectable
//! but never mixed with the active one.
//!
//! Note-handling bindings are gated with [`ModeGate::UnlessActive`] so the
//! climb mode suppresses them; climber bindings use
//! [`ModeGate::OnlyIfActive`].

use crate::commands::RobotCommands;
use crate::messages::{ControllerState, Operator, Operators};
use crate::subsystems::ClimberSide;
use serde::{Deserialize, Serialize};
use strider_core::{Command, ModeGate, RuntimeParams, Scheduler, Trigger};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlScheme {
    #[default]
    Active,
    Legacy,
}

/// Thresholds read once while wiring
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    trigger: f64,
    intake_trigger: f64,
    stick: f64,
    flick: f64,
    climber_power: f64,
}

impl Thresholds {
    fn from_params(params: &RuntimeParams) -> Self {
        Self {
            trigger: params.get_f64("trigger_threshold", 0.5),
            intake_trigger: params.get_f64("intake_trigger_threshold", 0.8),
            stick: params.get_f64("stick_deadband", 0.2),
            flick: params.get_f64("stick_flick_threshold", 0.8),
            climber_power: params.get_f64("climber_manual_power", 0.2),
        }
    }
}

/// Trigger reading one gamepad from the published snapshot
fn pad<F>(operators: &Operators, operator: Operator, name: &str, predicate: F) -> Trigger
where
    F: Fn(&ControllerState) -> bool + Send + Sync + 'static,
{
    let operators = operators.clone();
    Trigger::new(name, move || predicate(&operators.get(operator)))
}

struct Wiring<'a> {
    scheduler: &'a mut Scheduler,
    commands: &'a RobotCommands,
    operators: &'a Operators,
    limits: Thresholds,
}

/// Register every trigger for `scheme`. Returns the number of triggers added.
pub fn configure_bindings(
    scheduler: &mut Scheduler,
    scheme: ControlScheme,
    commands: &RobotCommands,
    operators: &Operators,
    params: &RuntimeParams,
) -> usize {
    let before = scheduler.trigger_count();
    let mut wiring = Wiring {
        scheduler,
        commands,
        operators,
        limits: Thresholds::from_params(params),
    };
    match scheme {
        ControlScheme::Active => {
            wiring.active_driver();
            wiring.active_manipulator();
        }
        ControlScheme::Legacy => {
            wiring.legacy_driver();
            wiring.legacy_manipulator();
        }
    }
    let added = wiring.scheduler.trigger_count() - before;
    info!(?scheme, triggers = added, "operator bindings configured");
    added
}

impl Wiring<'_> {
    fn driver<F>(&self, name: &str, predicate: F) -> Trigger
    where
        F: Fn(&ControllerState) -> bool + Send + Sync + 'static,
    {
        pad(self.operators, Operator::Driver, name, predicate)
    }

    fn manipulator<F>(&self, name: &str, predicate: F) -> Trigger
    where
        F: Fn(&ControllerState) -> bool + Send + Sync + 'static,
    {
        pad(self.operators, Operator::Manipulator, name, predicate)
    }

    fn add(&mut self, trigger: Trigger) {
        self.scheduler.add_trigger(trigger);
    }

    fn zero_yaw_chord(&mut self) {
        let c = self.commands.clone();
        let trigger = self
            .driver("driver_bumpers", |p| p.left_bumper && p.right_bumper)
            .on_true(move || c.zero_yaw());
        self.add(trigger);
    }

    /// Hold to rev, release to fire
    fn shot_binding(&mut self, trigger: Trigger, rev: fn(&RobotCommands) -> Command) {
        let hold = self.commands.clone();
        let release = self.commands.clone();
        let trigger = trigger
            .gate(ModeGate::UnlessActive)
            .while_true(move || rev(&hold))
            .on_false(move || release.shot_release());
        self.add(trigger);
    }

    /// Manual climber control while climbing
    fn climber_binding<P, F>(&mut self, trigger: Trigger, side: ClimberSide, power: P)
    where
        P: Fn() -> F + Send + Sync + 'static,
        F: Fn() -> f64 + Send + 'static,
    {
        let climber = self.commands.subsystems().climber.clone();
        let trigger = trigger
            .gate(ModeGate::OnlyIfActive)
            .while_true(move || climber.drive(side, power()));
        self.add(trigger);
    }

    // ------------------------------------------------------------------
    // Active scheme
    // ------------------------------------------------------------------

    fn active_driver(&mut self) {
        let limits = self.limits;
        let mode = self.scheduler.mode();
        self.zero_yaw_chord();

        let (on, off) = (self.commands.clone(), self.commands.clone());
        let trigger = self
            .driver("driver_lb", |p| p.left_bumper)
            .while_true(move || on.subsystems().sucker.intake())
            .while_false(move || off.subsystems().sucker.off());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_rt", move |p| p.right_trigger > limits.intake_trigger)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.intake_note_manual());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_lt", move |p| p.left_trigger > limits.intake_trigger)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.outtake_note());
        self.add(trigger);

        let c = self.commands.clone();
        let operators = self.operators.clone();
        let trigger = self
            .driver("driver_a", |p| p.a)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.subsystems().drive.align_to_amp(operators.clone()));
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_b", |p| p.b)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.auto_pickup_note());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_x", |p| p.x)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.emergency_cancel());
        self.add(trigger);

        let trigger = self
            .driver("driver_y", |p| p.y)
            .on_true(move || mode.toggle_command());
        self.add(trigger);
    }

    fn active_manipulator(&mut self) {
        let limits = self.limits;
        let mode = self.scheduler.mode();
        let operators = self.operators.clone();

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_lb", |p| p.left_bumper)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.score_amp_intake());
        self.add(trigger);

        let (enable, disable) = (mode.clone(), mode);
        let trigger = self
            .manipulator("manip_climb_chord", move |p| {
                p.left_trigger > limits.trigger && p.right_trigger > limits.trigger
            })
            .while_true(move || enable.enable_command())
            .while_false(move || disable.disable_command());
        self.add(trigger);

        let ops = operators.clone();
        let trigger = self.manipulator("manip_right_stick", move |p| p.right_y.abs() > limits.stick);
        self.climber_binding(trigger, ClimberSide::Right, move || {
            let ops = ops.clone();
            move || ops.manipulator().right_y
        });

        let ops = operators;
        let trigger = self.manipulator("manip_left_stick", move |p| p.left_y.abs() > limits.stick);
        self.climber_binding(trigger, ClimberSide::Left, move || {
            let ops = ops.clone();
            move || ops.manipulator().left_y
        });

        let trigger = self.manipulator("manip_rb", |p| p.right_bumper);
        self.shot_binding(trigger, RobotCommands::score_speaker_fixed_teleop);
    }

    // ------------------------------------------------------------------
    // Legacy scheme
    // ------------------------------------------------------------------

    fn legacy_driver(&mut self) {
        let limits = self.limits;
        let mode = self.scheduler.mode();
        self.zero_yaw_chord();

        let trigger = self.driver("driver_lt", move |p| p.left_trigger > limits.trigger);
        self.shot_binding(trigger, RobotCommands::score_speaker_fixed_teleop);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_rb", |p| p.right_bumper)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.mate_and_shift());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_rt", move |p| p.right_trigger > limits.trigger)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.intake_note_manual());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .driver("driver_lb", |p| p.left_bumper)
            .gate(ModeGate::UnlessActive)
            .while_true(move || c.outtake_note());
        self.add(trigger);

        let trigger = self
            .driver("driver_x", |p| p.x)
            .on_true(move || mode.toggle_command());
        self.add(trigger);
    }

    fn legacy_manipulator(&mut self) {
        let limits = self.limits;
        let mode = self.scheduler.mode();

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_b", |p| p.b)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.mate_and_shift());
        self.add(trigger);

        let (hold, release) = (self.commands.clone(), self.commands.clone());
        let trigger = self
            .manipulator("manip_a", |p| p.a)
            .gate(ModeGate::UnlessActive)
            .while_true(move || hold.score_amp())
            .on_false(move || release.release_amp());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_y", |p| p.y)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.score_speaker_from_distance());
        self.add(trigger);

        let trigger = self.manipulator("manip_x", |p| p.x);
        self.shot_binding(trigger, RobotCommands::score_speaker_fixed_teleop);

        let trigger = self
            .manipulator("manip_lb", |p| p.left_bumper)
            .on_true(move || mode.toggle_command());
        self.add(trigger);

        let trigger = self.manipulator("manip_pov_up", |p| p.pov == Some(0));
        self.shot_binding(trigger, RobotCommands::feeder_shot);

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_rt", move |p| p.right_trigger > limits.trigger)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.score_amp_intake());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_left_up", move |p| p.left_y < -limits.flick)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.subsystems().pivot.aim_at_amp());
        self.add(trigger);

        let c = self.commands.clone();
        let trigger = self
            .manipulator("manip_left_down", move |p| p.left_y > limits.flick)
            .gate(ModeGate::UnlessActive)
            .on_true(move || c.subsystems().pivot.move_to_retracted());
        self.add(trigger);

        // Stick up and stick down are separate bindings driving both arms
        for (name, up) in [("manip_right_up", true), ("manip_right_down", false)] {
            let trigger = self.manipulator(name, move |p| {
                if up {
                    -p.right_y > limits.stick
                } else {
                    -p.right_y < -limits.stick
                }
            });
            let ops = self.operators.clone();
            self.climber_binding(trigger, ClimberSide::Both, move || {
                let ops = ops.clone();
                move || -ops.manipulator().right_y
            });
        }

        let down = -limits.climber_power;
        let trigger = self.manipulator("manip_lt_climb", move |p| p.left_trigger > limits.trigger);
        self.climber_binding(trigger, ClimberSide::Left, move || move || down);

        let trigger = self.manipulator("manip_rt_climb", move |p| p.right_trigger > limits.trigger);
        self.climber_binding(trigger, ClimberSide::Right, move || move || down);
    }
}
