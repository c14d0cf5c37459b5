// Simulated match phases through the fully wired robot
use std::io::Write;
use strider_library::{
    Color, LedPattern, NoteLocation, Operator, RobotConfig, RobotContainer, ScriptedInput,
    DEFAULT_ROUTINE,
};

#[test]
fn test_default_auto_scores_preload() {
    let mut robot = RobotContainer::new(RobotConfig::simulation()).unwrap();
    assert!(robot.routine_names().contains(&DEFAULT_ROUTINE));

    robot.autonomous_init().unwrap();
    assert!(robot.auto_command().is_some());
    robot.step_n(150);

    let report = robot.report();
    assert_eq!(report.speaker_shots, 1);
    assert_eq!(report.points(), 2);
    assert!(!report.holding_note);
    assert!(!robot
        .scheduler()
        .running_names()
        .contains(&"score_speaker_fixed_auto"));
}

#[test]
fn test_teleop_cancels_unfinished_auto() {
    let config = RobotConfig {
        auto: Some("AMP score & taxi".to_string()),
        ..RobotConfig::simulation()
    };
    let mut robot = RobotContainer::new(config).unwrap();
    robot.autonomous_init().unwrap();
    robot.step_n(5);
    let id = robot.auto_command().unwrap();
    assert!(robot.scheduler().is_scheduled(id));

    robot.teleop_init().unwrap();
    assert!(!robot.scheduler().is_scheduled(id));
    assert!(robot.auto_command().is_none());

    robot.step();
    let drive = robot.subsystems().drive.resource();
    assert_eq!(robot.scheduler().owner_of(drive), Some("drive_teleop"));
}

#[test]
fn test_scripted_manual_intake_picks_up() {
    let config = RobotConfig {
        preload: false,
        ..RobotConfig::simulation()
    };
    let mut robot = RobotContainer::new(config).unwrap();
    let script = ScriptedInput::new()
        .hold(Operator::Driver, "right_trigger", 1, 80)
        .unwrap();
    robot.set_input_source(Box::new(script));

    robot.step_n(20);
    // Arm on its way down, no note yet
    assert!(!robot.subsystems().notes.has_note());

    robot.step_n(70);
    let report = robot.report();
    assert_eq!(report.pickups, 1);
    assert_eq!(robot.subsystems().notes.location(), NoteLocation::InSucker);
    assert_eq!(robot.strip().pattern(), LedPattern::Solid(Color::WHITE));
    let sucker = robot.subsystems().sucker.resource();
    assert_eq!(robot.scheduler().owner_of(sucker), Some("sucker_off"));
}

#[test]
fn test_custom_trajectory_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
auto: "Do Nothing"
led_count: 12
trajectories:
  Bruh:
    start: [1.0, 1.0]
    end: [2.0, 1.0]
    duration_s: 0.5
scheduler:
  timing:
    realtime: false
"#
    )
    .unwrap();

    let config = RobotConfig::from_file(file.path()).unwrap();
    assert_eq!(config.led_count, 12);
    let robot = RobotContainer::new(config).unwrap();
    let paths = robot.subsystems().drive.trajectories();
    assert_eq!(paths.get("Bruh").unwrap().duration_s, 0.5);
    assert!(paths.contains("TopTaxi"));
    assert_eq!(robot.strip().len(), 12);
}

#[test]
fn test_bad_trajectory_rejected() {
    let yaml = r#"
trajectories:
  Broken:
    start: [0.0, 0.0]
    end: [1.0, 0.0]
    duration_s: 0.0
"#;
    assert!(RobotConfig::from_yaml(yaml).is_err());
}
