use crate::core::command::{Command, CommandFactory, CommandState};
use crate::core::context::TickContext;
use crate::core::resource::{CommandId, DefaultTable, ResourceId, ResourceSlot};
use crate::error::{StriderError, StriderResult};
use crate::mode::ModeController;
use crate::signal::{CommittedSignal, SignalArbiter};
use crate::trigger::{Dispatch, Edge, InputSampler, Trigger};
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;

/// Set by the process-wide Ctrl+C handler, consumed by the running loop
static CTRL_C: AtomicBool = AtomicBool::new(false);
static CTRL_C_HANDLER: Once = Once::new();

fn install_ctrlc_handler() {
    CTRL_C_HANDLER.call_once(|| {
        if let Err(e) = ctrlc::set_handler(|| {
            eprintln!("{}", "\nCtrl+C received! Stopping STRIDER scheduler...".red());
            CTRL_C.store(true, Ordering::SeqCst);
        }) {
            warn!("failed to set signal handler: {}", e);
        }
    });
}

/// One scheduled activation
struct RunningCommand {
    id: CommandId,
    command: Command,
}

/// What happened during one call to [`Scheduler::tick`], plus any
/// `schedule`/`cancel` calls made between it and the previous tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    /// Commands that were initialized this tick (defaults included)
    pub scheduled: Vec<String>,
    /// Commands ended with `interrupted = true` this tick
    pub interrupted: Vec<String>,
    /// Commands that finished on their own this tick
    pub finished: Vec<String>,
    pub signal: Option<CommittedSignal>,
}

/// Tick-driven loop tying triggers, resources and commands together.
///
/// Every tick runs, in order: input sampling, trigger polling and dispatch
/// (claim + initialize per dispatch, in registration order), execute and
/// finish checks for every running command, default commands for unowned
/// resources, and finally the signal arbiter.
pub struct Scheduler {
    config: SchedulerConfig,
    resources: Vec<ResourceSlot>,
    defaults: DefaultTable,
    mode: Arc<ModeController>,
    triggers: Vec<Trigger>,
    input: Option<Box<dyn InputSampler>>,
    signals: SignalArbiter,
    /// In scheduling order
    running: Vec<RunningCommand>,
    next_id: u64,
    tick: u64,
    active: Arc<AtomicBool>,
    summary: TickSummary,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler with the standard configuration.
    pub fn new() -> Self {
        let defaults = DefaultTable::new();
        Self {
            config: SchedulerConfig::standard(),
            resources: Vec::new(),
            mode: Arc::new(ModeController::new("mode", defaults.clone())),
            defaults,
            triggers: Vec::new(),
            input: None,
            signals: SignalArbiter::new(),
            running: Vec::new(),
            next_id: 0,
            tick: 0,
            active: Arc::new(AtomicBool::new(true)),
            summary: TickSummary::default(),
        }
    }

    /// Apply a configuration (builder pattern)
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Replace the mode controller with one named `name`.
    ///
    /// Call before anything subscribes to the mode.
    pub fn with_mode_name(mut self, name: &str) -> Self {
        self.mode = Arc::new(ModeController::new(name, self.defaults.clone()));
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Shared mode controller; rewrites this scheduler's default commands
    pub fn mode(&self) -> Arc<ModeController> {
        Arc::clone(&self.mode)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register_resource(&mut self, name: impl Into<String>) -> StriderResult<ResourceId> {
        let name = name.into();
        if self.resources.iter().any(|slot| slot.name == name) {
            return Err(StriderError::DuplicateResource(name));
        }
        let index = u16::try_from(self.resources.len())
            .map_err(|_| StriderError::Internal("too many resources".to_string()))?;
        self.resources.push(ResourceSlot { name, owner: None });
        Ok(ResourceId(index))
    }

    /// Look a resource up by the name it was registered with
    pub fn resource(&self, name: &str) -> Option<ResourceId> {
        self.resources
            .iter()
            .position(|slot| slot.name == name)
            .map(|index| ResourceId(index as u16))
    }

    pub fn resource_name(&self, resource: ResourceId) -> Option<&str> {
        self.resources
            .get(resource.index())
            .map(|slot| slot.name.as_str())
    }

    fn slot(&self, resource: ResourceId) -> StriderResult<&ResourceSlot> {
        self.resources
            .get(resource.index())
            .ok_or_else(|| StriderError::UnknownResource(resource.to_string()))
    }

    /// Bind the command that runs whenever `resource` has no owner.
    ///
    /// The factory's commands must require `resource`.
    pub fn set_default_command(
        &mut self,
        resource: ResourceId,
        factory: CommandFactory,
    ) -> StriderResult<()> {
        let name = self.slot(resource)?.name.clone();
        let probe = factory();
        if !probe.requires(resource) {
            return Err(StriderError::config(format!(
                "default command '{}' does not require '{}'",
                probe.name(),
                name
            )));
        }
        self.defaults.set(resource, factory);
        Ok(())
    }

    pub fn clear_default_command(&mut self, resource: ResourceId) -> bool {
        self.defaults.clear(resource)
    }

    /// Triggers are polled in the order they are added
    pub fn add_trigger(&mut self, trigger: Trigger) -> &mut Self {
        debug!(trigger = trigger.name(), bindings = trigger.binding_count(), "trigger added");
        self.triggers.push(trigger);
        self
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Sampler run once at the start of every tick
    pub fn set_input(&mut self, input: Box<dyn InputSampler>) -> &mut Self {
        self.input = Some(input);
        self
    }

    pub fn set_signal_arbiter(&mut self, arbiter: SignalArbiter) -> &mut Self {
        self.signals = arbiter;
        self
    }

    pub fn signal_arbiter_mut(&mut self) -> &mut SignalArbiter {
        &mut self.signals
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Context for the tick currently being run (or the next one, between ticks)
    pub fn context(&self) -> TickContext {
        TickContext::new(self.tick, self.config.period())
    }

    /// Schedule a command now.
    ///
    /// Owners of any required resource are interrupted first, then the
    /// command is initialized. Returns `Ok(None)` when an `unless`/`only_if`
    /// gate rejects it.
    pub fn schedule(&mut self, command: Command) -> StriderResult<Option<CommandId>> {
        let ctx = self.context();
        self.schedule_at(command, &ctx)
    }

    fn schedule_at(
        &mut self,
        mut command: Command,
        ctx: &TickContext,
    ) -> StriderResult<Option<CommandId>> {
        if command.state() != CommandState::Idle {
            return Err(StriderError::Internal(format!(
                "command '{}' was already scheduled",
                command.name()
            )));
        }
        for resource in command.requirements() {
            self.slot(*resource)?;
        }
        if !command.check_gates() {
            debug!(command = command.name(), "skipped by gate");
            return Ok(None);
        }

        // Interrupt conflicting owners in the order they were scheduled
        let conflicts: Vec<CommandId> = self
            .running
            .iter()
            .filter(|entry| {
                entry
                    .command
                    .requirements()
                    .intersection(command.requirements())
                    .next()
                    .is_some()
            })
            .map(|entry| entry.id)
            .collect();
        for owner in conflicts {
            self.end_command(owner, true, ctx);
        }

        let id = CommandId(self.next_id);
        self.next_id += 1;
        for resource in command.requirements() {
            self.resources[resource.index()].owner = Some(id);
        }

        if self.config.logging.log_lifecycle {
            debug!(command = command.name(), %id, tick = ctx.tick(), "initialize");
        }
        command.initialize(ctx);
        self.summary.scheduled.push(command.name().to_string());
        self.running.push(RunningCommand { id, command });
        Ok(Some(id))
    }

    /// Interrupt a running command. Returns false if it is not running.
    pub fn cancel(&mut self, id: CommandId) -> bool {
        let ctx = self.context();
        self.end_command(id, true, &ctx)
    }

    /// Interrupt every running command
    pub fn cancel_all(&mut self) {
        let ctx = self.context();
        let ids: Vec<CommandId> = self.running.iter().map(|entry| entry.id).collect();
        for id in ids {
            self.end_command(id, true, &ctx);
        }
    }

    fn end_command(&mut self, id: CommandId, interrupted: bool, ctx: &TickContext) -> bool {
        let Some(position) = self.running.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let mut entry = self.running.remove(position);
        for slot in self.resources.iter_mut().filter(|s| s.owner == Some(id)) {
            slot.owner = None;
        }

        if self.config.logging.log_lifecycle {
            debug!(command = entry.command.name(), %id, interrupted, tick = ctx.tick(), "end");
        }
        entry.command.end(interrupted, ctx);

        let name = entry.command.name().to_string();
        if interrupted {
            info!(command = %name, %id, "interrupted");
            self.summary.interrupted.push(name);
        } else {
            self.summary.finished.push(name);
        }
        true
    }

    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.running.iter().any(|entry| entry.id == id)
    }

    /// Name of the command currently owning `resource`
    pub fn owner_of(&self, resource: ResourceId) -> Option<&str> {
        let owner = self.resources.get(resource.index())?.owner?;
        self.running
            .iter()
            .find(|entry| entry.id == owner)
            .map(|entry| entry.command.name())
    }

    /// Running commands in scheduling order
    pub fn running_names(&self) -> Vec<&str> {
        self.running.iter().map(|entry| entry.command.name()).collect()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Run one control tick.
    ///
    /// The summary also lists commands scheduled or cancelled since the
    /// previous tick.
    pub fn tick(&mut self) -> TickSummary {
        let ctx = self.context();
        self.summary.tick = ctx.tick();
        self.summary.signal = None;

        if let Some(input) = self.input.as_mut() {
            input.sample(&ctx);
        }

        self.poll_triggers(&ctx);

        let mut finished = Vec::new();
        for entry in self.running.iter_mut() {
            entry.command.execute(&ctx);
            if entry.command.is_finished(&ctx) {
                finished.push(entry.id);
            }
        }
        for id in finished {
            self.end_command(id, false, &ctx);
        }

        self.schedule_defaults(&ctx);

        if !self.signals.is_empty() {
            self.summary.signal = self.signals.evaluate(&ctx);
        }

        self.tick += 1;
        std::mem::take(&mut self.summary)
    }

    fn poll_triggers(&mut self, ctx: &TickContext) {
        let mut triggers = std::mem::take(&mut self.triggers);

        for trigger in triggers.iter_mut() {
            for dispatch in trigger.poll() {
                match dispatch {
                    Dispatch::Schedule(index) => {
                        if !self.mode.admits(trigger.mode_gate()) {
                            debug!(trigger = trigger.name(), "dispatch suppressed by mode");
                            continue;
                        }
                        let edge = trigger.bindings[index].edge;
                        let command = (trigger.bindings[index].factory)();
                        info!(trigger = trigger.name(), command = command.name(), "dispatch");
                        match self.schedule_at(command, ctx) {
                            Ok(Some(id)) => {
                                if matches!(edge, Edge::WhileTrue | Edge::WhileFalse) {
                                    trigger.bindings[index].active = Some(id);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                warn!(trigger = trigger.name(), error = %e, "dispatch failed")
                            }
                        }
                    }
                    Dispatch::Cancel(index) => {
                        if let Some(id) = trigger.bindings[index].active.take() {
                            self.end_command(id, true, ctx);
                        }
                    }
                }
            }
        }

        // Triggers added while polling (none today) go after the existing ones
        triggers.append(&mut self.triggers);
        self.triggers = triggers;
    }

    fn schedule_defaults(&mut self, ctx: &TickContext) {
        for index in 0..self.resources.len() {
            if self.resources[index].owner.is_some() {
                continue;
            }
            let resource = ResourceId(index as u16);
            let Some(factory) = self.defaults.get(resource) else {
                continue;
            };
            let command = factory();
            debug!(resource = %self.resources[index].name, command = command.name(), "default");
            if let Err(e) = self.schedule_at(command, ctx) {
                warn!(resource = %self.resources[index].name, error = %e, "default command failed");
            }
        }
    }

    // ------------------------------------------------------------------
    // Run loop
    // ------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Flag that stops the run loop when cleared, for other threads
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Main loop with Ctrl+C handling; runs until stopped or `max_ticks`
    pub fn run(&mut self) -> StriderResult<()> {
        self.run_with_limit(self.config.timing.max_ticks)
    }

    /// Run for `duration` of scheduler time, then shut down
    pub fn run_for(&mut self, duration: Duration) -> StriderResult<()> {
        let period = self.config.period().as_nanos().max(1);
        let ticks = duration.as_nanos().div_ceil(period) as u64;
        let limit = match self.config.timing.max_ticks {
            Some(max) => ticks.min(max),
            None => ticks,
        };
        self.run_with_limit(Some(limit))
    }

    fn run_with_limit(&mut self, limit: Option<u64>) -> StriderResult<()> {
        self.config.validate()?;
        self.active.store(true, Ordering::SeqCst);

        install_ctrlc_handler();
        CTRL_C.store(false, Ordering::SeqCst);

        info!(
            scheduler = %self.config.name,
            period_ms = self.config.timing.period_ms,
            resources = self.resources.len(),
            triggers = self.triggers.len(),
            "scheduler started"
        );

        let period = self.config.period();
        let start_tick = self.tick;
        while self.is_running() {
            if CTRL_C.swap(false, Ordering::SeqCst) {
                self.stop();
                break;
            }
            if let Some(max) = limit {
                if self.tick - start_tick >= max {
                    info!(ticks = max, "scheduler reached tick limit");
                    break;
                }
            }

            let started = Instant::now();
            self.tick();

            if self.config.timing.realtime {
                std::thread::sleep(period.saturating_sub(started.elapsed()));
            }
        }

        self.cancel_all();
        self.active.store(false, Ordering::SeqCst);
        info!(scheduler = %self.config.name, ticks = self.tick - start_tick, "scheduler shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::factory;

    #[test]
    fn test_register_resource() {
        let mut scheduler = Scheduler::new();
        let intake = scheduler.register_resource("intake").unwrap();
        let pivot = scheduler.register_resource("pivot").unwrap();
        assert_ne!(intake, pivot);
        assert_eq!(scheduler.resource("pivot"), Some(pivot));
        assert_eq!(scheduler.resource_name(intake), Some("intake"));
        assert!(matches!(
            scheduler.register_resource("intake"),
            Err(StriderError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let mut scheduler = Scheduler::new();
        let err = scheduler.schedule(Command::idle([ResourceId(7)])).unwrap_err();
        assert!(matches!(err, StriderError::UnknownResource(_)));
    }

    #[test]
    fn test_default_must_require_resource() {
        let mut scheduler = Scheduler::new();
        let pivot = scheduler.register_resource("pivot").unwrap();
        assert!(scheduler
            .set_default_command(pivot, factory(Command::none))
            .is_err());
        assert!(scheduler
            .set_default_command(pivot, factory(move || Command::idle([pivot])))
            .is_ok());
    }

    #[test]
    fn test_default_starts_when_unowned() {
        let mut scheduler = Scheduler::new();
        let pivot = scheduler.register_resource("pivot").unwrap();
        scheduler
            .set_default_command(pivot, factory(move || Command::idle([pivot]).named("hold")))
            .unwrap();

        let summary = scheduler.tick();
        assert_eq!(summary.scheduled, vec!["hold"]);
        assert_eq!(scheduler.owner_of(pivot), Some("hold"));

        let id = scheduler
            .schedule(Command::idle([pivot]).named("aim"))
            .unwrap()
            .unwrap();
        assert_eq!(scheduler.owner_of(pivot), Some("aim"));
        assert!(scheduler.cancel(id));

        // Work done between ticks is reported with the next tick
        let summary = scheduler.tick();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.scheduled, vec!["aim", "hold"]);
        assert_eq!(summary.interrupted, vec!["hold", "aim"]);

        let summary = scheduler.tick();
        assert!(summary.scheduled.is_empty());
        assert!(summary.interrupted.is_empty());
    }

    #[test]
    fn test_run_for_counts_logical_ticks() {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        scheduler.run_for(Duration::from_millis(100)).unwrap();
        assert_eq!(scheduler.tick_count(), 5);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_consecutive_runs_share_one_handler() {
        let mut scheduler = Scheduler::new().with_config(SchedulerConfig::simulation());
        scheduler.run_for(Duration::from_millis(60)).unwrap();
        scheduler.run_for(Duration::from_millis(60)).unwrap();
        assert_eq!(scheduler.tick_count(), 6);
        assert!(CTRL_C_HANDLER.is_completed());
    }
}
