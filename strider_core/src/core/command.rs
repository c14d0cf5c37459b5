//! Command tree and its lifecycle interpreter.
//!
//! A [`Command`] is one activation of a unit of work. Leaves wrap an
//! [`Action`]; composites (sequence, parallel, race, deadline, conditional)
//! and decorators are variants of a single tree that the scheduler walks
//! with four calls: `initialize`, `execute`, `is_finished`, `end`.
//!
//! Commands are built fresh for every activation (see [`CommandFactory`])
//! and are dropped after `end`.

use crate::core::action::{
    Action, IdleAction, InstantAction, NoopAction, RunAction, StartEndAction, WaitAction,
    WaitUntilAction,
};
use crate::core::context::TickContext;
use crate::core::resource::{ResourceId, ResourceSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Side-effect-free boolean read, evaluated fresh every time it is called
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

/// Builds a fresh command tree per activation
pub type CommandFactory = Arc<dyn Fn() -> Command + Send + Sync>;

/// Wrap a closure as a [`Condition`]
pub fn condition<F>(f: F) -> Condition
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`CommandFactory`]
pub fn factory<F>(f: F) -> CommandFactory
where
    F: Fn() -> Command + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Lifecycle state of a command activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Built, not yet scheduled
    Idle,
    /// Inside `initialize`
    Initializing,
    /// Executing every tick
    Running,
    /// Inside `end`
    Ending,
    /// `end` has run; the activation is over
    Ended,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandState::Idle => write!(f, "Idle"),
            CommandState::Initializing => write!(f, "Initializing"),
            CommandState::Running => write!(f, "Running"),
            CommandState::Ending => write!(f, "Ending"),
            CommandState::Ended => write!(f, "Ended"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateKind {
    /// Skip when the condition holds
    Unless,
    /// Skip when the condition fails
    OnlyIf,
}

impl GateKind {
    fn admits(self, value: bool) -> bool {
        match self {
            GateKind::Unless => !value,
            GateKind::OnlyIf => value,
        }
    }
}

pub(crate) enum Decorator {
    Gate {
        kind: GateKind,
        condition: Condition,
        decision: Option<bool>,
    },
    Timeout {
        limit: Duration,
        started: Duration,
    },
    Finally(Box<dyn FnMut(bool) + Send>),
}

pub(crate) enum CommandKind {
    Leaf(Box<dyn Action>),
    Sequential {
        children: Vec<Command>,
        index: usize,
    },
    Parallel {
        children: Vec<Command>,
    },
    Race {
        children: Vec<Command>,
        finished: bool,
    },
    Deadline {
        deadline: Box<Command>,
        others: Vec<Command>,
    },
    Conditional {
        condition: Condition,
        on_true: Box<Command>,
        on_false: Box<Command>,
        selected: Option<bool>,
    },
    Decorated {
        inner: Box<Command>,
        decorator: Decorator,
    },
}

/// A schedulable unit of work with a declared set of required resources
pub struct Command {
    pub(crate) name: String,
    pub(crate) requirements: ResourceSet,
    pub(crate) state: CommandState,
    pub(crate) kind: CommandKind,
}

impl Command {
    pub(crate) fn from_kind(name: String, requirements: ResourceSet, kind: CommandKind) -> Self {
        Self {
            name,
            requirements,
            state: CommandState::Idle,
            kind,
        }
    }

    // ------------------------------------------------------------------
    // Leaf constructors
    // ------------------------------------------------------------------

    /// Wrap a user [`Action`] requiring `requirements`
    pub fn from_action<A, I>(name: impl Into<String>, requirements: I, action: A) -> Self
    where
        A: Action + 'static,
        I: IntoIterator<Item = ResourceId>,
    {
        Self::from_kind(
            name.into(),
            requirements.into_iter().collect(),
            CommandKind::Leaf(Box::new(action)),
        )
    }

    /// No requirements, finishes on its first poll
    pub fn none() -> Self {
        Self::from_action("none", [], NoopAction)
    }

    /// Runs `body` once when initialized and finishes
    pub fn instant<I, F>(name: impl Into<String>, requirements: I, body: F) -> Self
    where
        I: IntoIterator<Item = ResourceId>,
        F: FnMut() + Send + 'static,
    {
        Self::from_action(name, requirements, InstantAction { body })
    }

    /// Runs `body` every tick until interrupted
    pub fn run<I, F>(name: impl Into<String>, requirements: I, body: F) -> Self
    where
        I: IntoIterator<Item = ResourceId>,
        F: FnMut() + Send + 'static,
    {
        Self::from_action(name, requirements, RunAction { body })
    }

    /// Runs `start` when initialized and `stop` when ended, never finishes
    pub fn start_end<I, S, E>(name: impl Into<String>, requirements: I, start: S, stop: E) -> Self
    where
        I: IntoIterator<Item = ResourceId>,
        S: FnMut() + Send + 'static,
        E: FnMut() + Send + 'static,
    {
        Self::from_action(name, requirements, StartEndAction { start, stop })
    }

    /// Holds `requirements` without doing anything
    pub fn idle<I>(requirements: I) -> Self
    where
        I: IntoIterator<Item = ResourceId>,
    {
        Self::from_action("idle", requirements, IdleAction)
    }

    /// Finishes once `duration` of scheduler time has passed
    pub fn wait(duration: Duration) -> Self {
        Self::from_action(
            format!("wait({:.2}s)", duration.as_secs_f64()),
            [],
            WaitAction {
                duration,
                started: Duration::ZERO,
            },
        )
    }

    /// Finishes on the first poll where `condition` holds
    pub fn wait_until(condition: Condition) -> Self {
        Self::from_action("wait_until", [], WaitUntilAction { condition })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Union of every leaf's requirements
    pub fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    pub fn requires(&self, resource: ResourceId) -> bool {
        self.requirements.contains(&resource)
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            CommandState::Initializing | CommandState::Running
        )
    }

    /// Rename this command (logs and scheduler queries use the name)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle interpreter
    // ------------------------------------------------------------------

    /// Evaluate the schedule-time gates along the outer decorator chain.
    ///
    /// Decisions are recorded so `initialize` does not evaluate them again.
    pub(crate) fn check_gates(&mut self) -> bool {
        match &mut self.kind {
            CommandKind::Decorated { inner, decorator } => {
                if let Decorator::Gate {
                    kind,
                    condition,
                    decision,
                } = decorator
                {
                    let admitted = kind.admits(condition());
                    *decision = Some(admitted);
                    if !admitted {
                        return false;
                    }
                }
                inner.check_gates()
            }
            _ => true,
        }
    }

    pub(crate) fn initialize(&mut self, ctx: &TickContext) {
        if self.state != CommandState::Idle {
            return;
        }
        self.state = CommandState::Initializing;

        match &mut self.kind {
            CommandKind::Leaf(action) => action.initialize(ctx),
            CommandKind::Sequential { children, index } => {
                *index = 0;
                if let Some(first) = children.first_mut() {
                    first.initialize(ctx);
                }
            }
            CommandKind::Parallel { children } => {
                for child in children.iter_mut() {
                    child.initialize(ctx);
                }
            }
            CommandKind::Race { children, finished } => {
                *finished = false;
                for child in children.iter_mut() {
                    child.initialize(ctx);
                }
            }
            CommandKind::Deadline { deadline, others } => {
                deadline.initialize(ctx);
                for other in others.iter_mut() {
                    other.initialize(ctx);
                }
            }
            CommandKind::Conditional {
                condition,
                on_true,
                on_false,
                selected,
            } => {
                let choice = condition();
                *selected = Some(choice);
                if choice {
                    on_true.initialize(ctx);
                } else {
                    on_false.initialize(ctx);
                }
            }
            CommandKind::Decorated { inner, decorator } => match decorator {
                Decorator::Gate {
                    kind,
                    condition,
                    decision,
                } => {
                    let admitted = match *decision {
                        Some(admitted) => admitted,
                        None => kind.admits(condition()),
                    };
                    *decision = Some(admitted);
                    if admitted {
                        inner.initialize(ctx);
                    }
                }
                Decorator::Timeout { started, .. } => {
                    *started = ctx.now();
                    inner.initialize(ctx);
                }
                Decorator::Finally(_) => inner.initialize(ctx),
            },
        }

        self.state = CommandState::Running;
    }

    pub(crate) fn execute(&mut self, ctx: &TickContext) {
        if self.state != CommandState::Running {
            return;
        }

        match &mut self.kind {
            CommandKind::Leaf(action) => action.execute(ctx),
            CommandKind::Sequential { children, index } => {
                if let Some(current) = children.get_mut(*index) {
                    current.execute(ctx);
                    if current.is_finished(ctx) {
                        current.end(false, ctx);
                        *index += 1;
                        if let Some(next) = children.get_mut(*index) {
                            next.initialize(ctx);
                        }
                    }
                }
            }
            CommandKind::Parallel { children } => {
                for child in children.iter_mut().filter(|c| c.is_running()) {
                    child.execute(ctx);
                    if child.is_finished(ctx) {
                        child.end(false, ctx);
                    }
                }
            }
            CommandKind::Race { children, finished } => {
                if *finished {
                    return;
                }
                // First finisher in declaration order wins; later children
                // are not executed on that tick.
                for child in children.iter_mut() {
                    child.execute(ctx);
                    if child.is_finished(ctx) {
                        child.end(false, ctx);
                        *finished = true;
                        break;
                    }
                }
            }
            CommandKind::Deadline { deadline, others } => {
                if deadline.is_running() {
                    deadline.execute(ctx);
                    if deadline.is_finished(ctx) {
                        deadline.end(false, ctx);
                        return;
                    }
                }
                for other in others.iter_mut().filter(|c| c.is_running()) {
                    other.execute(ctx);
                    if other.is_finished(ctx) {
                        other.end(false, ctx);
                    }
                }
            }
            CommandKind::Conditional {
                on_true,
                on_false,
                selected,
                ..
            } => match selected {
                Some(true) => on_true.execute(ctx),
                Some(false) => on_false.execute(ctx),
                None => {}
            },
            CommandKind::Decorated { inner, .. } => inner.execute(ctx),
        }
    }

    pub(crate) fn is_finished(&self, ctx: &TickContext) -> bool {
        match &self.kind {
            CommandKind::Leaf(action) => action.is_finished(ctx),
            CommandKind::Sequential { children, index } => *index >= children.len(),
            CommandKind::Parallel { children } => children.iter().all(|c| !c.is_running()),
            CommandKind::Race { children, finished } => *finished || children.is_empty(),
            CommandKind::Deadline { deadline, .. } => !deadline.is_running(),
            CommandKind::Conditional {
                on_true,
                on_false,
                selected,
                ..
            } => match selected {
                Some(true) => on_true.is_finished(ctx),
                Some(false) => on_false.is_finished(ctx),
                None => false,
            },
            CommandKind::Decorated { inner, decorator } => match decorator {
                Decorator::Gate { decision, .. } => {
                    *decision == Some(false) || inner.is_finished(ctx)
                }
                Decorator::Timeout { limit, started } => {
                    inner.is_finished(ctx) || ctx.since(*started) >= *limit
                }
                Decorator::Finally(_) => inner.is_finished(ctx),
            },
        }
    }

    /// Runs the end hooks of this activation; a no-op unless running
    pub(crate) fn end(&mut self, interrupted: bool, ctx: &TickContext) {
        if !self.is_running() {
            return;
        }
        self.state = CommandState::Ending;

        match &mut self.kind {
            CommandKind::Leaf(action) => action.end(interrupted, ctx),
            CommandKind::Sequential { children, index } => {
                if let Some(current) = children.get_mut(*index) {
                    current.end(interrupted, ctx);
                }
            }
            CommandKind::Parallel { children } => {
                for child in children.iter_mut() {
                    child.end(interrupted, ctx);
                }
            }
            CommandKind::Race { children, .. } => {
                for child in children.iter_mut() {
                    child.end(true, ctx);
                }
            }
            CommandKind::Deadline { deadline, others } => {
                for other in others.iter_mut() {
                    other.end(true, ctx);
                }
                deadline.end(interrupted, ctx);
            }
            CommandKind::Conditional {
                on_true,
                on_false,
                selected,
                ..
            } => match selected {
                Some(true) => on_true.end(interrupted, ctx),
                Some(false) => on_false.end(interrupted, ctx),
                None => {}
            },
            CommandKind::Decorated { inner, decorator } => match decorator {
                Decorator::Gate { .. } => inner.end(interrupted, ctx),
                Decorator::Timeout { .. } => {
                    let forced = inner.is_running() && !inner.is_finished(ctx);
                    inner.end(interrupted || forced, ctx);
                }
                Decorator::Finally(hook) => {
                    inner.end(interrupted, ctx);
                    hook(interrupted);
                }
            },
        }

        self.state = CommandState::Ended;
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("requirements", &self.requirements)
            .finish()
    }
}
