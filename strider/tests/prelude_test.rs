// The prelude is enough to wire and run a robot
use std::io::Write;
use strider::prelude::*;

#[test]
fn test_prelude_scheduler_roundtrip() {
    let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
    let arm = scheduler.register_resource("arm").unwrap();
    scheduler.add_trigger(Trigger::new("always", || true).on_true(move || {
        Command::idle([arm])
            .with_timeout(Duration::from_millis(60))
            .named("hold_arm")
    }));

    scheduler.tick();
    assert_eq!(scheduler.owner_of(arm), Some("hold_arm"));
    for _ in 0..5 {
        scheduler.tick();
    }
    assert_eq!(scheduler.owner_of(arm), None);
}

#[test]
fn test_scripted_robot_from_files() -> AnyResult<()> {
    let mut script = tempfile::NamedTempFile::new()?;
    writeln!(
        script,
        "- {{tick: 1, controller: driver, input: left_y, value: -1.0}}\n- {{tick: 30, controller: driver, input: left_y, value: 0.0}}"
    )?;

    let mut robot = RobotContainer::new(RobotConfig {
        auto: Some("Do Nothing".to_string()),
        ..RobotConfig::simulation()
    })?;
    robot.set_input_source(Box::new(ScriptedInput::from_file(script.path())?));

    let start = robot.subsystems().drive.pose();
    robot.teleop_init()?;
    robot.step_n(40);
    let end = robot.subsystems().drive.pose();
    ensure!(end != start, "teleop input should move the drivetrain");
    Ok(())
}

#[test]
fn test_version() {
    assert_eq!(strider::version(), env!("CARGO_PKG_VERSION"));
}
