//! Edge-detecting wrappers around boolean predicates.
//!
//! A [`Trigger`] is polled once per tick by the scheduler. It evaluates its
//! predicate, compares against the previous tick's value, and reports which
//! of its bindings should be scheduled or cancelled. The scheduler owns the
//! triggers and performs the actual dispatch (mode gate, conflict resolution).

use crate::core::command::{Command, CommandFactory, Condition};
use crate::core::context::TickContext;
use crate::core::resource::CommandId;
use crate::mode::ModeGate;
use std::fmt;
use std::sync::Arc;

/// Which edge of the predicate a binding reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Schedule on false -> true
    OnTrue,
    /// Schedule on true -> false
    OnFalse,
    /// Schedule on the rising edge, cancel on the falling edge
    WhileTrue,
    /// Schedule on the falling edge, cancel on the rising edge
    WhileFalse,
}

pub(crate) struct Binding {
    pub(crate) edge: Edge,
    pub(crate) factory: CommandFactory,
    /// Activation started by a `While*` binding, cancelled on the opposite edge
    pub(crate) active: Option<CommandId>,
}

/// What a trigger asks the scheduler to do with one of its bindings this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Schedule(usize),
    Cancel(usize),
}

/// Samples external input once per tick, before any trigger is polled.
///
/// Implementations publish what they read into shared state that trigger
/// predicates close over.
pub trait InputSampler: Send {
    fn sample(&mut self, ctx: &TickContext);
}

/// A predicate with edge detection and bound commands
pub struct Trigger {
    name: String,
    condition: Condition,
    last: bool,
    gate: ModeGate,
    pub(crate) bindings: Vec<Binding>,
}

impl Trigger {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self::from_condition(name, Arc::new(predicate))
    }

    pub fn from_condition(name: impl Into<String>, condition: Condition) -> Self {
        Self {
            name: name.into(),
            condition,
            last: false,
            gate: ModeGate::Always,
            bindings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode_gate(&self) -> ModeGate {
        self.gate
    }

    /// The combined predicate, for building further triggers or conditions
    pub fn condition(&self) -> Condition {
        self.condition.clone()
    }

    /// Read the predicate now, without touching edge state
    pub fn get(&self) -> bool {
        (self.condition)()
    }

    // ------------------------------------------------------------------
    // Combinators: operands are re-evaluated every poll, never cached
    // ------------------------------------------------------------------

    pub fn and(self, other: Condition) -> Self {
        let lhs = self.condition.clone();
        let name = self.name.clone();
        self.with_condition(
            format!("{name}&"),
            Arc::new(move || lhs() && other()),
        )
    }

    pub fn or(self, other: Condition) -> Self {
        let lhs = self.condition.clone();
        let name = self.name.clone();
        self.with_condition(
            format!("{name}|"),
            Arc::new(move || lhs() || other()),
        )
    }

    pub fn negate(self) -> Self {
        let inner = self.condition.clone();
        let name = self.name.clone();
        self.with_condition(format!("!{name}"), Arc::new(move || !inner()))
    }

    fn with_condition(mut self, name: String, condition: Condition) -> Self {
        self.name = name;
        self.condition = condition;
        self
    }

    /// Rename the trigger (used in dispatch logs)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare how the mode flag admits this trigger's dispatches
    pub fn gate(mut self, gate: ModeGate) -> Self {
        self.gate = gate;
        self
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    fn bind<F>(mut self, edge: Edge, build: F) -> Self
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        self.bindings.push(Binding {
            edge,
            factory: Arc::new(build),
            active: None,
        });
        self
    }

    pub fn on_true<F>(self, build: F) -> Self
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        self.bind(Edge::OnTrue, build)
    }

    pub fn on_false<F>(self, build: F) -> Self
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        self.bind(Edge::OnFalse, build)
    }

    pub fn while_true<F>(self, build: F) -> Self
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        self.bind(Edge::WhileTrue, build)
    }

    pub fn while_false<F>(self, build: F) -> Self
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        self.bind(Edge::WhileFalse, build)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Evaluate the predicate once and report the dispatches for this tick,
    /// in binding order.
    pub(crate) fn poll(&mut self) -> Vec<Dispatch> {
        let now = (self.condition)();
        let rising = now && !self.last;
        let falling = !now && self.last;
        self.last = now;

        if !rising && !falling {
            return Vec::new();
        }

        self.bindings
            .iter()
            .enumerate()
            .filter_map(|(index, binding)| match (binding.edge, rising) {
                (Edge::OnTrue, true) | (Edge::WhileTrue, true) => Some(Dispatch::Schedule(index)),
                (Edge::OnFalse, false) | (Edge::WhileFalse, false) => {
                    Some(Dispatch::Schedule(index))
                }
                (Edge::WhileTrue, false) | (Edge::WhileFalse, true) => {
                    Some(Dispatch::Cancel(index))
                }
                _ => None,
            })
            .collect()
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("last", &self.last)
            .field("gate", &self.gate)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
