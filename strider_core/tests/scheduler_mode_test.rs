// Mode flag gating and default-command rebinding
mod common;

use common::{count, log, probe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strider_core::{factory, Command, ModeGate, Scheduler, SchedulerConfig, Trigger};

#[test]
fn test_toggle_rebinds_default_without_preempting() {
    let log = log();
    let mut scheduler = Scheduler::new()
        .with_config(SchedulerConfig::simulation())
        .with_mode_name("climbing");
    let pivot = scheduler.register_resource("pivot").unwrap();
    let mode = scheduler.mode();
    mode.subscribe(
        pivot,
        Some(factory(move || Command::idle([pivot]).named("aim_at_speaker"))),
        Some(factory(move || Command::idle([pivot]).named("retract"))),
    )
    .unwrap();

    let pressed = Arc::new(AtomicBool::new(false));
    let read = pressed.clone();
    let toggle_mode = mode.clone();
    scheduler.add_trigger(
        Trigger::new("y_button", move || read.load(Ordering::SeqCst))
            .on_true(move || toggle_mode.toggle_command()),
    );

    scheduler.tick();
    assert_eq!(scheduler.owner_of(pivot), Some("aim_at_speaker"));

    pressed.store(true, Ordering::SeqCst);
    scheduler.tick();
    scheduler.tick();
    assert!(mode.is_active());
    assert_eq!(mode.transitions(), 1);
    // The running default keeps the resource
    assert_eq!(scheduler.owner_of(pivot), Some("aim_at_speaker"));

    scheduler.schedule(probe(&log, "manual", [pivot], Some(1))).unwrap();
    let summary = scheduler.tick();
    assert_eq!(summary.finished, vec!["manual"]);
    assert_eq!(summary.scheduled, vec!["manual", "retract"]);
    assert_eq!(summary.interrupted, vec!["aim_at_speaker"]);
    assert_eq!(scheduler.owner_of(pivot), Some("retract"));
}

#[test]
fn test_mode_gate_checked_at_dispatch() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let intake = scheduler.register_resource("intake").unwrap();
    let mode = scheduler.mode();

    let pressed = Arc::new(AtomicBool::new(false));
    let read = pressed.clone();
    let l = log.clone();
    scheduler.add_trigger(
        Trigger::new("right_trigger", move || read.load(Ordering::SeqCst))
            .gate(ModeGate::UnlessActive)
            .while_true(move || probe(&l, "intake", [intake], None)),
    );

    mode.enable();
    pressed.store(true, Ordering::SeqCst);
    scheduler.tick();
    assert_eq!(count(&log, "intake:init"), 0);

    pressed.store(false, Ordering::SeqCst);
    scheduler.tick();
    mode.disable();
    pressed.store(true, Ordering::SeqCst);
    scheduler.tick();
    assert_eq!(count(&log, "intake:init"), 1);
}

#[test]
fn test_mode_change_visible_to_later_trigger_same_tick() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let mode = scheduler.mode();

    let enable = mode.clone();
    let l = log.clone();
    scheduler
        .add_trigger(Trigger::new("chord", || true).while_true(move || enable.enable_command()))
        .add_trigger(
            Trigger::new("climb_stick", || true)
                .gate(ModeGate::OnlyIfActive)
                .while_true(move || probe(&l, "climb", [], None)),
        );

    scheduler.tick();
    assert!(mode.is_active());
    assert_eq!(count(&log, "climb:init"), 1);
}
