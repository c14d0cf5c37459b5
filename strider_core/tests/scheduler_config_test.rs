// Scheduler configuration files and presets
use std::io::Write;
use std::time::Duration;
use strider_core::{Scheduler, SchedulerConfig, StriderError};

#[test]
fn test_standard_config() {
    let config = SchedulerConfig::standard();
    assert_eq!(config.period(), Duration::from_millis(20));
    assert!(config.timing.max_ticks.is_none());
}

#[test]
fn test_load_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "name = \"bench\"\n[timing]\nperiod_ms = 10\nmax_ticks = 7\nrealtime = false\n[logging]\nlog_lifecycle = true"
    )
    .unwrap();

    let config = SchedulerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.name, "bench");
    assert_eq!(config.period(), Duration::from_millis(10));

    let mut scheduler = Scheduler::new().with_config(config);
    scheduler.run().unwrap();
    assert_eq!(scheduler.tick_count(), 7);
}

#[test]
fn test_load_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "timing:\n  period_ms: 5\n  realtime: false").unwrap();

    let config = SchedulerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.period(), Duration::from_millis(5));
    assert!(!config.timing.realtime);

    let mut scheduler = Scheduler::new().with_config(config);
    scheduler.run_for(Duration::from_millis(50)).unwrap();
    assert_eq!(scheduler.tick_count(), 10);
}

#[test]
fn test_invalid_file_rejected() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[timing]\nperiod_ms = 0").unwrap();
    assert!(matches!(
        SchedulerConfig::from_file(file.path()),
        Err(StriderError::Config(_))
    ));

    assert!(matches!(
        SchedulerConfig::from_file("/nonexistent/strider.toml"),
        Err(StriderError::Io(_))
    ));
}
