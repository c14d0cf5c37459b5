use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strider::library::{
    MatchReport, RobotConfig, RobotContainer, ScriptedInput, AUTONOMOUS_PERIOD, TELEOP_PERIOD,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strider")]
#[command(about = "STRIDER - reactive command scheduling for competition robots")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a match: autonomous, then teleop
    Run {
        /// Robot config (YAML); simulation defaults when omitted
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Autonomous routine to run instead of the configured one
        #[arg(short = 'a', long = "auto", value_name = "ROUTINE")]
        auto: Option<String>,

        /// Scripted operator input (YAML list of tick/controller/input/value)
        #[arg(short = 's', long = "script")]
        script: Option<PathBuf>,

        /// Autonomous period length in seconds
        #[arg(long = "auto-seconds", default_value_t = AUTONOMOUS_PERIOD.as_secs_f64())]
        auto_seconds: f64,

        /// Teleop period length in seconds
        #[arg(long = "teleop-seconds", default_value_t = TELEOP_PERIOD.as_secs_f64())]
        teleop_seconds: f64,

        /// Sleep between ticks like the real control loop
        #[arg(short = 'r', long = "realtime")]
        realtime: bool,

        /// Print the match report as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// List the autonomous routines
    List {
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },

    /// Build the robot from a config without running it
    Check {
        config: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("STRIDER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("strider=info,strider_core=info,strider_library=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RobotConfig> {
    match path {
        Some(path) => RobotConfig::from_file(path)
            .with_context(|| format!("failed to load robot config {}", path.display())),
        None => Ok(RobotConfig::simulation()),
    }
}

fn seconds(value: f64, what: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {} length {}", what, value))
}

fn print_report(report: &MatchReport) {
    println!();
    println!("{}", "Match report".green().bold());
    println!("  {} {}", "ticks:".cyan(), report.ticks);
    println!("  {} {}", "pickups:".cyan(), report.pickups);
    println!("  {} {}", "speaker:".cyan(), report.speaker_shots);
    println!("  {} {}", "amp:".cyan(), report.amp_scores);
    if report.ejected > 0 {
        println!("  {} {}", "ejected:".yellow(), report.ejected);
    }
    let (x, y, heading) = report.pose;
    println!(
        "  {} ({:.2}, {:.2}) @ {:.0}°",
        "pose:".cyan(),
        x,
        y,
        heading
    );
    if report.climbing {
        println!("  {}", "ended in climbing mode".blue());
    }
    println!("  {} {}", "points:".green().bold(), report.points());
}

fn run_match(
    config: Option<PathBuf>,
    auto: Option<String>,
    script: Option<PathBuf>,
    auto_seconds: f64,
    teleop_seconds: f64,
    realtime: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    if auto.is_some() {
        config.auto = auto;
    }
    config.scheduler.timing.realtime = realtime;
    let auto_period = seconds(auto_seconds, "autonomous")?;
    let teleop_period = seconds(teleop_seconds, "teleop")?;

    let mut robot = RobotContainer::new(config).context("failed to build robot")?;
    if let Some(path) = script {
        let input = ScriptedInput::from_file(&path)
            .with_context(|| format!("failed to load input script {}", path.display()))?;
        robot.set_input_source(Box::new(input));
    }

    if !json {
        println!("{} autonomous ({:.1}s)", "▶".cyan(), auto_period.as_secs_f64());
    }
    info!("autonomous for {:?}", auto_period);
    robot.autonomous_init()?;
    let mut completed = robot.run_phase(auto_period)?;

    if completed {
        if !json {
            println!("{} teleop ({:.1}s)", "▶".cyan(), teleop_period.as_secs_f64());
        }
        info!("teleop for {:?}", teleop_period);
        robot.teleop_init()?;
        completed = robot.run_phase(teleop_period)?;
    } else {
        warn!("autonomous interrupted, skipping teleop");
    }

    let report = robot.report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !completed {
            println!("{}", "Match stopped early".yellow());
        }
        print_report(&report);
    }
    Ok(())
}

fn list_routines(config: Option<PathBuf>) -> Result<()> {
    let robot = RobotContainer::new(load_config(config.as_deref())?)?;
    println!("{}", "Autonomous routines".green().bold());
    for name in robot.routine_names() {
        println!("  {}", name);
    }
    Ok(())
}

fn check_config(path: PathBuf) -> Result<()> {
    let robot = RobotContainer::new(load_config(Some(path.as_path()))?)
        .with_context(|| format!("{} does not build a robot", path.display()))?;
    println!(
        "{} {} ({} triggers, {} routines, {} trajectories)",
        "✓".green(),
        path.display(),
        robot.scheduler().trigger_count(),
        robot.routine_names().len(),
        robot.subsystems().drive.trajectories().len()
    );
    Ok(())
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            auto,
            script,
            auto_seconds,
            teleop_seconds,
            realtime,
            json,
        } => run_match(
            config,
            auto,
            script,
            auto_seconds,
            teleop_seconds,
            realtime,
            json,
        ),
        Commands::List { config } => list_routines(config),
        Commands::Check { config } => check_config(config),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
