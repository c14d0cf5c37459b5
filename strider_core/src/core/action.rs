use crate::core::command::Condition;
use crate::core::context::TickContext;
use std::time::Duration;

/// Leaf behavior of a command with the full lifecycle.
///
/// The scheduler calls the hooks in this order for every activation:
/// 1. `initialize()` once, when the command becomes Running
/// 2. `execute()` once per tick while Running
/// 3. `is_finished()` after every `execute()`
/// 4. `end(interrupted)` exactly once, on completion or interruption
///
/// `end` is where actuators go back to a safe idle output.
pub trait Action: Send {
    /// Called once when the command starts running
    fn initialize(&mut self, _ctx: &TickContext) {}

    /// Called once per tick while running
    fn execute(&mut self, ctx: &TickContext);

    /// Polled after each `execute`
    fn is_finished(&self, _ctx: &TickContext) -> bool {
        false
    }

    /// Called once when the command stops, `interrupted` when it did not finish on its own
    fn end(&mut self, _interrupted: bool, _ctx: &TickContext) {}
}

/// Does nothing and finishes immediately
pub(crate) struct NoopAction;

impl Action for NoopAction {
    fn execute(&mut self, _ctx: &TickContext) {}

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        true
    }
}

/// Runs a closure in `initialize` and finishes on the first poll
pub(crate) struct InstantAction<F> {
    pub(crate) body: F,
}

impl<F: FnMut() + Send> Action for InstantAction<F> {
    fn initialize(&mut self, _ctx: &TickContext) {
        (self.body)();
    }

    fn execute(&mut self, _ctx: &TickContext) {}

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        true
    }
}

/// Runs a closure every tick, never finishes
pub(crate) struct RunAction<F> {
    pub(crate) body: F,
}

impl<F: FnMut() + Send> Action for RunAction<F> {
    fn execute(&mut self, _ctx: &TickContext) {
        (self.body)();
    }
}

/// `start` on initialize, `stop` on end, never finishes
pub(crate) struct StartEndAction<S, E> {
    pub(crate) start: S,
    pub(crate) stop: E,
}

impl<S: FnMut() + Send, E: FnMut() + Send> Action for StartEndAction<S, E> {
    fn initialize(&mut self, _ctx: &TickContext) {
        (self.start)();
    }

    fn execute(&mut self, _ctx: &TickContext) {}

    fn end(&mut self, _interrupted: bool, _ctx: &TickContext) {
        (self.stop)();
    }
}

/// Holds its resources and does nothing
pub(crate) struct IdleAction;

impl Action for IdleAction {
    fn execute(&mut self, _ctx: &TickContext) {}
}

/// Finishes once `duration` of scheduler time has elapsed
pub(crate) struct WaitAction {
    pub(crate) duration: Duration,
    pub(crate) started: Duration,
}

impl Action for WaitAction {
    fn initialize(&mut self, ctx: &TickContext) {
        self.started = ctx.now();
    }

    fn execute(&mut self, _ctx: &TickContext) {}

    fn is_finished(&self, ctx: &TickContext) -> bool {
        ctx.since(self.started) >= self.duration
    }
}

/// Finishes on the first poll where the condition holds
pub(crate) struct WaitUntilAction {
    pub(crate) condition: Condition,
}

impl Action for WaitUntilAction {
    fn execute(&mut self, _ctx: &TickContext) {}

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        (self.condition)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_wait_uses_logical_time() {
        let period = Duration::from_millis(20);
        let mut wait = WaitAction {
            duration: Duration::from_millis(100),
            started: Duration::ZERO,
        };
        wait.initialize(&TickContext::new(10, period));
        assert!(!wait.is_finished(&TickContext::new(14, period)));
        assert!(wait.is_finished(&TickContext::new(15, period)));
    }

    #[test]
    fn test_wait_until_reads_live_condition() {
        let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let probe = flag.clone();
        let wait = WaitUntilAction {
            condition: Arc::new(move || probe.load(std::sync::atomic::Ordering::SeqCst)),
        };
        let ctx = TickContext::new(0, Duration::from_millis(20));
        assert!(!wait.is_finished(&ctx));
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(wait.is_finished(&ctx));
    }
}
