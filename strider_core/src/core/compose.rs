//! Composition operators.
//!
//! Group requirements are the union of their children's requirements, so a
//! group can only start once every leaf's resource has been claimed.
//!
//! ```rust
//! use strider_core::{condition, Command};
//! use std::time::Duration;
//!
//! let note_seen = condition(|| false);
//! let shot = Command::wait_until(note_seen)
//!     .and_then(Command::wait(Duration::from_millis(100)))
//!     .with_timeout(Duration::from_secs(1))
//!     .named("feed_shot");
//! assert_eq!(shot.name(), "feed_shot");
//! ```

use crate::core::command::{Command, CommandKind, Condition, Decorator, GateKind};
use crate::core::resource::ResourceSet;
use std::time::Duration;

fn union<'a>(children: impl IntoIterator<Item = &'a Command>) -> ResourceSet {
    children
        .into_iter()
        .flat_map(|c| c.requirements().iter().copied())
        .collect()
}

fn joined(children: &[Command], sep: &str) -> String {
    children
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(sep)
}

impl Command {
    /// Children run one after another, each to completion
    pub fn sequence(children: Vec<Command>) -> Self {
        let name = format!("seq[{}]", joined(&children, ", "));
        let requirements = union(&children);
        Self::from_kind(
            name,
            requirements,
            CommandKind::Sequential { children, index: 0 },
        )
    }

    /// Children run together; finishes when all have finished
    pub fn parallel(children: Vec<Command>) -> Self {
        let name = format!("par[{}]", joined(&children, ", "));
        let requirements = union(&children);
        Self::from_kind(name, requirements, CommandKind::Parallel { children })
    }

    /// Children run together; finishes as soon as one finishes and interrupts the rest
    pub fn race(children: Vec<Command>) -> Self {
        let name = format!("race[{}]", joined(&children, ", "));
        let requirements = union(&children);
        Self::from_kind(
            name,
            requirements,
            CommandKind::Race {
                children,
                finished: false,
            },
        )
    }

    /// Children run together; the group ends exactly when `deadline` does
    pub fn deadline(deadline: Command, others: Vec<Command>) -> Self {
        let name = format!("deadline[{} | {}]", deadline.name(), joined(&others, ", "));
        let requirements = union(std::iter::once(&deadline).chain(others.iter()));
        Self::from_kind(
            name,
            requirements,
            CommandKind::Deadline {
                deadline: Box::new(deadline),
                others,
            },
        )
    }

    /// Chooses a branch once, when the command is initialized
    pub fn either(on_true: Command, on_false: Command, condition: Condition) -> Self {
        let name = format!("either[{} / {}]", on_true.name(), on_false.name());
        let requirements = union([&on_true, &on_false]);
        Self::from_kind(
            name,
            requirements,
            CommandKind::Conditional {
                condition,
                on_true: Box::new(on_true),
                on_false: Box::new(on_false),
                selected: None,
            },
        )
    }

    // ------------------------------------------------------------------
    // Two-argument sugar
    // ------------------------------------------------------------------

    /// `self` then `next`
    pub fn and_then(self, next: Command) -> Self {
        Self::sequence(vec![self, next])
    }

    /// Race `self` against `other`
    pub fn race_with(self, other: Command) -> Self {
        Self::race(vec![self, other])
    }

    /// Run `self` and `other` together until both finish
    pub fn alongside(self, other: Command) -> Self {
        Self::parallel(vec![self, other])
    }

    /// Run `others` while `self` runs; `self` decides when the group ends
    pub fn deadline_for(self, others: Vec<Command>) -> Self {
        Self::deadline(self, others)
    }

    // ------------------------------------------------------------------
    // Decorators
    // ------------------------------------------------------------------

    fn decorate(self, prefix: &str, decorator: Decorator) -> Self {
        let name = format!("{}({})", prefix, self.name);
        let requirements = self.requirements.clone();
        Self::from_kind(
            name,
            requirements,
            CommandKind::Decorated {
                inner: Box::new(self),
                decorator,
            },
        )
    }

    /// Not scheduled while `condition` holds (checked at schedule time)
    pub fn unless(self, condition: Condition) -> Self {
        self.decorate(
            "unless",
            Decorator::Gate {
                kind: GateKind::Unless,
                condition,
                decision: None,
            },
        )
    }

    /// Only scheduled while `condition` holds (checked at schedule time)
    pub fn only_if(self, condition: Condition) -> Self {
        self.decorate(
            "only_if",
            Decorator::Gate {
                kind: GateKind::OnlyIf,
                condition,
                decision: None,
            },
        )
    }

    /// Interrupts the wrapped command once `limit` has elapsed
    pub fn with_timeout(self, limit: Duration) -> Self {
        self.decorate(
            "timeout",
            Decorator::Timeout {
                limit,
                started: Duration::ZERO,
            },
        )
    }

    /// Runs `hook(interrupted)` after the wrapped command ends, whichever way it ends
    pub fn finally_do<F>(self, hook: F) -> Self
    where
        F: FnMut(bool) + Send + 'static,
    {
        let name = self.name.clone();
        self.decorate("finally", Decorator::Finally(Box::new(hook)))
            .named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::condition;
    use crate::core::context::TickContext;
    use crate::core::resource::ResourceId;
    use std::sync::{Arc, Mutex};

    fn ctx(tick: u64) -> TickContext {
        TickContext::new(tick, Duration::from_millis(20))
    }

    fn probe(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Command {
        let start = log.clone();
        let stop = log.clone();
        Command::start_end(
            name,
            [],
            move || start.lock().unwrap().push(format!("{name}:init")),
            move || stop.lock().unwrap().push(format!("{name}:end")),
        )
    }

    #[test]
    fn test_group_requirements_are_union() {
        let a = Command::idle([ResourceId(0)]);
        let b = Command::idle([ResourceId(1), ResourceId(2)]);
        let group = Command::parallel(vec![a, b]);
        let expected: Vec<_> = [0u16, 1, 2].iter().map(|i| ResourceId(*i)).collect();
        assert_eq!(group.requirements().iter().copied().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_conditional_requires_both_branches() {
        let cmd = Command::either(
            Command::idle([ResourceId(3)]),
            Command::idle([ResourceId(4)]),
            condition(|| true),
        );
        assert!(cmd.requires(ResourceId(3)));
        assert!(cmd.requires(ResourceId(4)));
    }

    #[test]
    fn test_and_then_names() {
        let cmd = Command::none()
            .named("a")
            .and_then(Command::none().named("b"))
            .and_then(Command::none().named("c"));
        assert_eq!(cmd.name(), "seq[seq[a, b], c]");
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut seq = Command::sequence(vec![
            probe(&log, "a").with_timeout(Duration::from_millis(20)),
            probe(&log, "b").with_timeout(Duration::from_millis(20)),
        ]);

        seq.initialize(&ctx(0));
        let mut tick = 1;
        while !seq.is_finished(&ctx(tick)) {
            seq.execute(&ctx(tick));
            tick += 1;
            assert!(tick < 10);
        }
        seq.end(false, &ctx(tick));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:init", "a:end", "b:init", "b:end"]
        );
    }

    #[test]
    fn test_nested_gate_skips_child() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut seq = Command::sequence(vec![
            probe(&log, "skipped").unless(condition(|| true)),
            Command::none().named("after"),
        ]);

        seq.initialize(&ctx(0));
        seq.execute(&ctx(1));
        seq.execute(&ctx(2));
        assert!(seq.is_finished(&ctx(2)));
        seq.end(false, &ctx(2));
        assert!(log.lock().unwrap().is_empty());
    }
}
