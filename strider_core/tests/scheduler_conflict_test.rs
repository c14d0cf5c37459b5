// Resource ownership and conflict resolution
mod common;

use common::{count, lifecycle, log, probe};
use strider_core::{Scheduler, SchedulerConfig, Trigger};

fn scheduler() -> Scheduler {
    Scheduler::new().with_config(SchedulerConfig::simulation())
}

#[test]
fn test_same_tick_dispatch_in_registration_order() {
    let log = log();
    let mut scheduler = scheduler();
    let r1 = scheduler.register_resource("r1").unwrap();
    let r2 = scheduler.register_resource("r2").unwrap();

    let a_log = log.clone();
    let b_log = log.clone();
    scheduler
        .add_trigger(Trigger::new("a", || true).on_true(move || probe(&a_log, "A", [r1], None)))
        .add_trigger(Trigger::new("b", || true).on_true(move || probe(&b_log, "B", [r1, r2], None)));

    let summary = scheduler.tick();

    assert_eq!(lifecycle(&log), vec!["A:init", "A:end(true)", "B:init"]);
    assert_eq!(summary.interrupted, vec!["A"]);
    assert_eq!(summary.scheduled, vec!["A", "B"]);
    assert_eq!(scheduler.owner_of(r1), Some("B"));
    assert_eq!(scheduler.owner_of(r2), Some("B"));
    assert_eq!(scheduler.running_names(), vec!["B"]);
}

#[test]
fn test_overlap_interrupts_earlier_owner_once() {
    let log = log();
    let mut scheduler = scheduler();
    let r1 = scheduler.register_resource("r1").unwrap();
    let r2 = scheduler.register_resource("r2").unwrap();

    scheduler.schedule(probe(&log, "early", [r1, r2], None)).unwrap();
    scheduler.tick();
    scheduler.schedule(probe(&log, "late", [r2], None)).unwrap();

    assert_eq!(count(&log, "early:end(true)"), 1);
    let entries = lifecycle(&log);
    let end = entries.iter().position(|e| e == "early:end(true)").unwrap();
    let init = entries.iter().position(|e| e == "late:init").unwrap();
    assert!(end < init);

    // The released resource has no owner until a default or new command claims it
    assert_eq!(scheduler.owner_of(r1), None);
    assert_eq!(scheduler.owner_of(r2), Some("late"));
}

#[test]
fn test_disjoint_commands_complete_independently() {
    for reversed in [false, true] {
        let log = log();
        let mut scheduler = scheduler();
        let r1 = scheduler.register_resource("r1").unwrap();
        let r2 = scheduler.register_resource("r2").unwrap();

        let mut commands = vec![
            probe(&log, "short", [r1], Some(2)),
            probe(&log, "long", [r2], Some(3)),
        ];
        if reversed {
            commands.reverse();
        }
        for command in commands {
            scheduler.schedule(command).unwrap().unwrap();
        }

        let first = scheduler.tick();
        assert!(first.finished.is_empty());
        let second = scheduler.tick();
        assert_eq!(second.finished, vec!["short"]);
        let third = scheduler.tick();
        assert_eq!(third.finished, vec!["long"]);

        assert_eq!(count(&log, "short:end(false)"), 1);
        assert_eq!(count(&log, "long:end(false)"), 1);
        assert_eq!(count(&log, "short:exec"), 2);
        assert_eq!(count(&log, "long:exec"), 3);
        assert!(scheduler.running_names().is_empty());
    }
}

#[test]
fn test_cancel_runs_end_once() {
    let log = log();
    let mut scheduler = scheduler();
    let r1 = scheduler.register_resource("r1").unwrap();

    let id = scheduler.schedule(probe(&log, "held", [r1], None)).unwrap().unwrap();
    assert!(scheduler.is_scheduled(id));
    assert!(scheduler.cancel(id));
    assert!(!scheduler.cancel(id));
    assert!(!scheduler.is_scheduled(id));
    assert_eq!(count(&log, "held:end(true)"), 1);
}
