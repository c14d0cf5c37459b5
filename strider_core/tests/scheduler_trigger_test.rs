// Trigger edge dispatch through the scheduler
mod common;

use common::{count, lifecycle, log, probe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strider_core::{
    condition, InputSampler, Scheduler, SchedulerConfig, TickContext, Trigger,
};

fn button() -> (Arc<AtomicBool>, impl Fn() -> bool + Send + Sync + 'static) {
    let state = Arc::new(AtomicBool::new(false));
    let read = state.clone();
    (state, move || read.load(Ordering::SeqCst))
}

#[test]
fn test_while_true_cancels_on_release() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let intake = scheduler.register_resource("intake").unwrap();
    let (pressed, read) = button();

    let l = log.clone();
    let r = log.clone();
    scheduler.add_trigger(
        Trigger::new("left_bumper", read)
            .while_true(move || probe(&l, "suck", [intake], None))
            .on_false(move || probe(&r, "released", [], Some(1))),
    );

    scheduler.tick();
    pressed.store(true, Ordering::SeqCst);
    assert_eq!(scheduler.tick().scheduled, vec!["suck"]);
    // Holding the button does not reschedule
    assert!(scheduler.tick().scheduled.is_empty());

    pressed.store(false, Ordering::SeqCst);
    let summary = scheduler.tick();
    assert_eq!(summary.interrupted, vec!["suck"]);
    assert_eq!(summary.finished, vec!["released"]);
    assert_eq!(
        lifecycle(&log),
        vec!["suck:init", "suck:end(true)", "released:init", "released:end(false)"]
    );
    assert_eq!(scheduler.owner_of(intake), None);
}

#[test]
fn test_on_true_reschedules_fresh_instance() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let (pressed, read) = button();
    let l = log.clone();
    scheduler.add_trigger(Trigger::new("a", read).on_true(move || probe(&l, "tap", [], Some(1))));

    for _ in 0..3 {
        pressed.store(true, Ordering::SeqCst);
        scheduler.tick();
        pressed.store(false, Ordering::SeqCst);
        scheduler.tick();
    }
    assert_eq!(count(&log, "tap:init"), 3);
    assert_eq!(count(&log, "tap:end(false)"), 3);
}

#[test]
fn test_combined_trigger_reads_operands_every_tick() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let (left, read_left) = button();
    let (right, read_right) = button();
    let l = log.clone();
    scheduler.add_trigger(
        Trigger::new("left", read_left)
            .and(condition(read_right))
            .named("bumpers")
            .on_true(move || probe(&l, "zero_yaw", [], Some(1))),
    );

    left.store(true, Ordering::SeqCst);
    scheduler.tick();
    assert_eq!(count(&log, "zero_yaw:init"), 0);

    right.store(true, Ordering::SeqCst);
    scheduler.tick();
    assert_eq!(count(&log, "zero_yaw:init"), 1);
}

struct Script {
    output: Arc<AtomicBool>,
    press_on: u64,
}

impl InputSampler for Script {
    fn sample(&mut self, ctx: &TickContext) {
        self.output.store(ctx.tick() >= self.press_on, Ordering::SeqCst);
    }
}

#[test]
fn test_input_sampled_before_triggers() {
    let log = log();
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let (state, read) = button();
    let l = log.clone();
    scheduler
        .set_input(Box::new(Script {
            output: state,
            press_on: 3,
        }))
        .add_trigger(Trigger::new("scripted", read).on_true(move || probe(&l, "go", [], None)));

    let fired: Vec<u64> = (0..6)
        .map(|_| scheduler.tick())
        .filter(|s| !s.scheduled.is_empty())
        .map(|s| s.tick)
        .collect();
    assert_eq!(fired, vec![3]);
}
