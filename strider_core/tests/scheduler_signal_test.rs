// Signal arbitration evaluated as the last step of every tick
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use strider_core::{condition, Scheduler, SchedulerConfig, SignalArbiter, StriderError};

#[test]
fn test_one_effect_committed_per_tick() {
    let applied = Arc::new(Mutex::new(Vec::new()));
    let p2_on = Arc::new(AtomicBool::new(true));
    let p5_on = Arc::new(AtomicBool::new(true));

    let mut arbiter = SignalArbiter::new();
    let record = |tag: &'static str| {
        let applied = applied.clone();
        move |_: &strider_core::TickContext| applied.lock().unwrap().push(tag)
    };
    arbiter.register_fallback(0, "fallback", record("fallback")).unwrap();
    let p5 = p5_on.clone();
    arbiter
        .register(5, "p5", condition(move || p5.load(Ordering::SeqCst)), record("p5"))
        .unwrap();
    let p2 = p2_on.clone();
    arbiter
        .register(2, "p2", condition(move || p2.load(Ordering::SeqCst)), record("p2"))
        .unwrap();

    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    scheduler.set_signal_arbiter(arbiter);

    assert_eq!(scheduler.tick().signal.map(|s| s.priority), Some(2));
    p2_on.store(false, Ordering::SeqCst);
    assert_eq!(scheduler.tick().signal.map(|s| s.priority), Some(5));
    p5_on.store(false, Ordering::SeqCst);
    let fallback = scheduler.tick().signal.unwrap();
    assert!(fallback.fallback);

    assert_eq!(*applied.lock().unwrap(), vec!["p2", "p5", "fallback"]);
}

#[test]
fn test_duplicate_priority_is_registration_error() {
    let mut scheduler = Scheduler::new();
    let arbiter = scheduler.signal_arbiter_mut();
    arbiter.register(3, "note", condition(|| true), |_| {}).unwrap();
    let err = arbiter.register(3, "revved", condition(|| true), |_| {});
    assert!(matches!(err, Err(StriderError::DuplicatePriority { priority: 3, .. })));
}
