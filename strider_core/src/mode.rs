//! Process-wide mode flag with default-command rebinding.
//!
//! There is exactly one authoritative flag. Triggers do not cache it; the
//! scheduler asks [`ModeController::admits`] at schedule time, and commands
//! read it through [`ModeController::condition`]. The single setter updates
//! the flag and rewrites the default-command table under one lock, so the
//! next scheduling decision (in the same tick or later) sees both.

use crate::core::command::{Command, CommandFactory, Condition};
use crate::core::resource::{DefaultTable, ResourceId};
use crate::error::{StriderError, StriderResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// How the mode flag admits a trigger's dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeGate {
    /// Dispatch regardless of mode
    #[default]
    Always,
    /// Dispatch only while the flag is false
    UnlessActive,
    /// Dispatch only while the flag is true
    OnlyIfActive,
}

/// Default commands a resource switches between on every transition
struct ModeBinding {
    resource: ResourceId,
    when_inactive: Option<CommandFactory>,
    when_active: Option<CommandFactory>,
}

struct ModeState {
    active: bool,
    transitions: u64,
    bindings: Vec<ModeBinding>,
}

/// Owner of the mode flag.
///
/// Created by the scheduler (which shares its [`DefaultTable`] with it) and
/// handed out as `Arc<ModeController>` to every registration that needs it.
pub struct ModeController {
    name: String,
    state: Mutex<ModeState>,
    defaults: DefaultTable,
}

impl ModeController {
    pub fn new(name: impl Into<String>, defaults: DefaultTable) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ModeState {
                active: false,
                transitions: 0,
                bindings: Vec::new(),
            }),
            defaults,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value of the flag
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of value changes since startup
    pub fn transitions(&self) -> u64 {
        self.state.lock().transitions
    }

    /// Set the flag. Returns true when the value changed.
    pub fn set(&self, active: bool) -> bool {
        let mut state = self.state.lock();
        self.apply(&mut state, active)
    }

    /// Flip the flag, returning the new value
    pub fn toggle(&self) -> bool {
        let mut state = self.state.lock();
        let next = !state.active;
        self.apply(&mut state, next);
        next
    }

    // Every mutation of the flag goes through here, with the state lock held
    fn apply(&self, state: &mut ModeState, active: bool) -> bool {
        if state.active == active {
            return false;
        }
        state.active = active;
        state.transitions += 1;

        for binding in &state.bindings {
            let selected = if active {
                &binding.when_active
            } else {
                &binding.when_inactive
            };
            match selected {
                Some(factory) => self.defaults.set(binding.resource, factory.clone()),
                None => {
                    self.defaults.clear(binding.resource);
                }
            }
        }

        info!(mode = %self.name, active, "mode transition");
        true
    }

    pub fn enable(&self) -> bool {
        self.set(true)
    }

    pub fn disable(&self) -> bool {
        self.set(false)
    }

    /// Subscribe a resource; its default command follows the flag from now on.
    ///
    /// Both factories' commands must require `resource`.
    pub fn subscribe(
        &self,
        resource: ResourceId,
        when_inactive: Option<CommandFactory>,
        when_active: Option<CommandFactory>,
    ) -> StriderResult<()> {
        for factory in when_inactive.iter().chain(when_active.iter()) {
            let probe = factory();
            if !probe.requires(resource) {
                return Err(StriderError::config(format!(
                    "mode '{}' default '{}' does not require {}",
                    self.name,
                    probe.name(),
                    resource
                )));
            }
        }

        let mut state = self.state.lock();
        let current = if state.active {
            &when_active
        } else {
            &when_inactive
        };
        match current {
            Some(factory) => self.defaults.set(resource, factory.clone()),
            None => {
                self.defaults.clear(resource);
            }
        }
        state.bindings.retain(|b| b.resource != resource);
        state.bindings.push(ModeBinding {
            resource,
            when_inactive,
            when_active,
        });
        Ok(())
    }

    /// Centralized gate policy consulted by the scheduler for every trigger dispatch
    pub fn admits(&self, gate: ModeGate) -> bool {
        match gate {
            ModeGate::Always => true,
            ModeGate::UnlessActive => !self.is_active(),
            ModeGate::OnlyIfActive => self.is_active(),
        }
    }

    /// Live read of the flag for use in predicates and decorators
    pub fn condition(self: &Arc<Self>) -> Condition {
        let mode = Arc::clone(self);
        Arc::new(move || mode.is_active())
    }

    /// Instant command that flips the flag
    pub fn toggle_command(self: &Arc<Self>) -> Command {
        let mode = Arc::clone(self);
        Command::instant(format!("toggle_{}", self.name), [], move || {
            mode.toggle();
        })
    }

    /// Instant command that sets the flag
    pub fn enable_command(self: &Arc<Self>) -> Command {
        let mode = Arc::clone(self);
        Command::instant(format!("enable_{}", self.name), [], move || {
            mode.enable();
        })
    }

    /// Instant command that clears the flag
    pub fn disable_command(self: &Arc<Self>) -> Command {
        let mode = Arc::clone(self);
        Command::instant(format!("disable_{}", self.name), [], move || {
            mode.disable();
        })
    }
}

impl fmt::Debug for ModeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ModeController")
            .field("name", &self.name)
            .field("active", &state.active)
            .field("transitions", &state.transitions)
            .field("bindings", &state.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::factory;

    fn default_name(table: &DefaultTable, resource: ResourceId) -> Option<String> {
        table.get(resource).map(|f| f().name().to_string())
    }

    #[test]
    fn test_set_rebinds_defaults_atomically() {
        let table = DefaultTable::new();
        let mode = ModeController::new("climbing", table.clone());
        let pivot = ResourceId(1);

        mode.subscribe(
            pivot,
            Some(factory(move || Command::idle([pivot]).named("aim_at_speaker"))),
            Some(factory(move || Command::idle([pivot]).named("retract"))),
        )
        .unwrap();
        assert_eq!(default_name(&table, pivot).as_deref(), Some("aim_at_speaker"));

        assert!(mode.enable());
        assert!(mode.is_active());
        assert_eq!(default_name(&table, pivot).as_deref(), Some("retract"));

        // Same value again is not a transition
        assert!(!mode.enable());
        assert_eq!(mode.transitions(), 1);

        assert!(!mode.toggle());
        assert_eq!(default_name(&table, pivot).as_deref(), Some("aim_at_speaker"));
        assert_eq!(mode.transitions(), 2);
    }

    #[test]
    fn test_missing_factory_clears_default() {
        let table = DefaultTable::new();
        let mode = ModeController::new("climbing", table.clone());
        let climber = ResourceId(4);
        mode.subscribe(climber, None, Some(factory(move || Command::idle([climber]))))
            .unwrap();
        assert!(!table.contains(climber));
        mode.enable();
        assert!(table.contains(climber));
        mode.disable();
        assert!(!table.contains(climber));
    }

    #[test]
    fn test_subscribe_rejects_default_without_requirement() {
        let table = DefaultTable::new();
        let mode = ModeController::new("climbing", table.clone());
        let pivot = ResourceId(1);

        let err = mode
            .subscribe(pivot, Some(factory(|| Command::idle([]))), None)
            .unwrap_err();
        assert!(matches!(err, StriderError::Config(_)));
        let err = mode
            .subscribe(
                pivot,
                Some(factory(move || Command::idle([pivot]))),
                Some(factory(|| Command::idle([ResourceId(2)]))),
            )
            .unwrap_err();
        assert!(matches!(err, StriderError::Config(_)));

        // Nothing was installed by the rejected calls
        assert!(!table.contains(pivot));
        mode.enable();
        assert!(!table.contains(pivot));
    }

    #[test]
    fn test_gate_policy() {
        let mode = Arc::new(ModeController::new("climbing", DefaultTable::new()));
        assert!(mode.admits(ModeGate::Always));
        assert!(mode.admits(ModeGate::UnlessActive));
        assert!(!mode.admits(ModeGate::OnlyIfActive));

        let live = mode.condition();
        mode.enable();
        assert!(live());
        assert!(!mode.admits(ModeGate::UnlessActive));
        assert!(mode.admits(ModeGate::OnlyIfActive));
    }
}
