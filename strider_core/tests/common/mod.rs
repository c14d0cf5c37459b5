// Shared probes for scheduler integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use strider_core::{Action, Command, ResourceId, TickContext};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn count(log: &Log, entry: &str) -> usize {
    log.lock().unwrap().iter().filter(|e| *e == entry).count()
}

/// Records every lifecycle call; finishes after `ticks` executes (never if None)
pub struct Probe {
    name: &'static str,
    log: Log,
    ticks: Option<u32>,
    executed: u32,
}

impl Action for Probe {
    fn initialize(&mut self, _ctx: &TickContext) {
        self.log.lock().unwrap().push(format!("{}:init", self.name));
    }

    fn execute(&mut self, _ctx: &TickContext) {
        self.executed += 1;
        self.log.lock().unwrap().push(format!("{}:exec", self.name));
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.ticks.is_some_and(|t| self.executed >= t)
    }

    fn end(&mut self, interrupted: bool, _ctx: &TickContext) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:end({})", self.name, interrupted));
    }
}

pub fn probe<I>(log: &Log, name: &'static str, requirements: I, ticks: Option<u32>) -> Command
where
    I: IntoIterator<Item = ResourceId>,
{
    Command::from_action(
        name,
        requirements,
        Probe {
            name,
            log: log.clone(),
            ticks,
            executed: 0,
        },
    )
}

/// Lifecycle entries without the per-tick execute noise
pub fn lifecycle(log: &Log) -> Vec<String> {
    entries(log)
        .into_iter()
        .filter(|e| !e.ends_with(":exec"))
        .collect()
}
