//! Priority override stack that commits exactly one effect per tick.
//!
//! Lower priority numbers win. Sources are scanned in ascending priority and
//! the first one whose predicate holds is committed; everything ranked after
//! it is skipped. When nothing matches the fallback is committed instead.

use crate::core::command::Condition;
use crate::core::context::TickContext;
use crate::error::{StriderError, StriderResult};
use std::fmt;
use tracing::{debug, warn};

/// Renders one signal (e.g. an LED pattern); called only for the committed source
pub type Effect = Box<dyn FnMut(&TickContext) + Send>;

struct SignalSource {
    priority: u32,
    name: String,
    condition: Condition,
    effect: Effect,
}

struct Fallback {
    priority: u32,
    name: String,
    effect: Effect,
}

/// The source whose effect was applied on a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSignal {
    pub priority: u32,
    pub name: String,
    pub fallback: bool,
}

#[derive(Default)]
pub struct SignalArbiter {
    /// Kept sorted by ascending priority
    sources: Vec<SignalSource>,
    fallback: Option<Fallback>,
    last: Option<CommittedSignal>,
}

impl SignalArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(&self, priority: u32) -> StriderResult<()> {
        let existing = self
            .sources
            .iter()
            .find(|s| s.priority == priority)
            .map(|s| s.name.clone())
            .or_else(|| {
                self.fallback
                    .as_ref()
                    .filter(|f| f.priority == priority)
                    .map(|f| f.name.clone())
            });
        match existing {
            Some(existing) => Err(StriderError::DuplicatePriority { priority, existing }),
            None => Ok(()),
        }
    }

    /// Register a conditional source. Priorities must be unique.
    pub fn register<F>(
        &mut self,
        priority: u32,
        name: impl Into<String>,
        condition: Condition,
        effect: F,
    ) -> StriderResult<()>
    where
        F: FnMut(&TickContext) + Send + 'static,
    {
        self.check_unique(priority)?;
        let index = self.sources.partition_point(|s| s.priority < priority);
        self.sources.insert(
            index,
            SignalSource {
                priority,
                name: name.into(),
                condition,
                effect: Box::new(effect),
            },
        );
        Ok(())
    }

    /// Register the always-true effect applied when no source matches.
    ///
    /// Its priority is reserved but it never takes part in the scan.
    pub fn register_fallback<F>(
        &mut self,
        priority: u32,
        name: impl Into<String>,
        effect: F,
    ) -> StriderResult<()>
    where
        F: FnMut(&TickContext) + Send + 'static,
    {
        if let Some(existing) = &self.fallback {
            return Err(StriderError::DuplicateName(existing.name.clone()));
        }
        self.check_unique(priority)?;
        self.fallback = Some(Fallback {
            priority,
            name: name.into(),
            effect: Box::new(effect),
        });
        Ok(())
    }

    /// Scan the sources and commit a single effect
    pub fn evaluate(&mut self, ctx: &TickContext) -> Option<CommittedSignal> {
        let committed = match self.sources.iter_mut().find(|s| (s.condition)()) {
            Some(source) => {
                (source.effect)(ctx);
                Some(CommittedSignal {
                    priority: source.priority,
                    name: source.name.clone(),
                    fallback: false,
                })
            }
            None => match self.fallback.as_mut() {
                Some(fallback) => {
                    (fallback.effect)(ctx);
                    Some(CommittedSignal {
                        priority: fallback.priority,
                        name: fallback.name.clone(),
                        fallback: true,
                    })
                }
                None => {
                    warn!(tick = ctx.tick(), "no signal source matched and no fallback registered");
                    None
                }
            },
        };

        if committed.as_ref().map(|c| &c.name) != self.last.as_ref().map(|c| &c.name) {
            if let Some(signal) = &committed {
                debug!(signal = %signal.name, priority = signal.priority, "signal changed");
            }
        }
        self.last = committed.clone();
        committed
    }

    /// Signal committed on the most recent evaluation
    pub fn last(&self) -> Option<&CommittedSignal> {
        self.last.as_ref()
    }

    /// Registered priorities in scan order, fallback excluded
    pub fn priorities(&self) -> Vec<u32> {
        self.sources.iter().map(|s| s.priority).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SignalArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalArbiter")
            .field("priorities", &self.priorities())
            .field("fallback", &self.fallback.as_ref().map(|f| &f.name))
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::condition;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn ctx() -> TickContext {
        TickContext::new(0, Duration::from_millis(20))
    }

    fn recorder(log: &Arc<Mutex<Vec<u32>>>, priority: u32) -> impl FnMut(&TickContext) + Send {
        let log = log.clone();
        move |_| log.lock().unwrap().push(priority)
    }

    #[test]
    fn test_lowest_number_wins() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut arbiter = SignalArbiter::new();
        arbiter
            .register_fallback(0, "fallback", recorder(&log, 0))
            .unwrap();
        arbiter
            .register(5, "p5", condition(|| true), recorder(&log, 5))
            .unwrap();
        arbiter
            .register(2, "p2", condition(|| true), recorder(&log, 2))
            .unwrap();

        let committed = arbiter.evaluate(&ctx()).unwrap();
        assert_eq!(committed.priority, 2);
        assert!(!committed.fallback);
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut arbiter = SignalArbiter::new();
        arbiter
            .register_fallback(0, "fallback", recorder(&log, 0))
            .unwrap();
        arbiter
            .register(3, "p3", condition(|| false), recorder(&log, 3))
            .unwrap();

        let committed = arbiter.evaluate(&ctx()).unwrap();
        assert!(committed.fallback);
        assert_eq!(*log.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let mut arbiter = SignalArbiter::new();
        arbiter.register_fallback(0, "fallback", |_| {}).unwrap();
        arbiter.register(4, "a", condition(|| true), |_| {}).unwrap();

        let err = arbiter
            .register(4, "b", condition(|| true), |_| {})
            .unwrap_err();
        assert!(matches!(err, StriderError::DuplicatePriority { priority: 4, ref existing } if existing == "a"));
        assert!(arbiter.register(0, "c", condition(|| true), |_| {}).is_err());
        assert_eq!(arbiter.len(), 2);
    }

    #[test]
    fn test_no_fallback_commits_nothing() {
        let mut arbiter = SignalArbiter::new();
        arbiter.register(1, "off", condition(|| false), |_| {}).unwrap();
        assert!(arbiter.evaluate(&ctx()).is_none());
        assert!(arbiter.last().is_none());
    }
}
