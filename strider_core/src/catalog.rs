//! Named command registries for autonomous routines.
//!
//! [`NamedCommands`] maps names to factories for externally authored routine
//! tooling. [`RoutineCatalog`] holds fully built routines and hands exactly
//! one of them to the scheduler.

use crate::core::command::{Command, CommandFactory};
use crate::error::{StriderError, StriderResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// External path-following collaborator
pub trait PathFollower: Send + Sync {
    /// Command that drives the named trajectory and finishes on arrival
    fn follow(&self, path: &str) -> StriderResult<Command>;

    /// Command that snaps the pose estimate to the start of the named trajectory
    fn reset_to_path_start(&self, path: &str) -> StriderResult<Command>;

    fn knows(&self, path: &str) -> bool;
}

/// Name -> command factory registry
#[derive(Default, Clone)]
pub struct NamedCommands {
    commands: BTreeMap<String, CommandFactory>,
}

impl NamedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, build: F) -> StriderResult<()>
    where
        F: Fn() -> Command + Send + Sync + 'static,
    {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(StriderError::DuplicateName(name));
        }
        self.commands.insert(name, Arc::new(build));
        Ok(())
    }

    /// Build a fresh activation of the named command
    pub fn get(&self, name: &str) -> StriderResult<Command> {
        self.commands
            .get(name)
            .map(|build| build().named(name))
            .ok_or_else(|| StriderError::UnknownCommand(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for NamedCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedCommands")
            .field("names", &self.names())
            .finish()
    }
}

/// Eagerly built autonomous routines, selected once by name
#[derive(Default)]
pub struct RoutineCatalog {
    /// Registration order is the order shown to operators
    routines: Vec<(String, Command)>,
    default: Option<String>,
}

impl RoutineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_option(&mut self, name: impl Into<String>, routine: Command) -> StriderResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(StriderError::DuplicateName(name));
        }
        self.routines.push((name, routine));
        Ok(())
    }

    /// Add a routine and make it the one selected when no name is given
    pub fn set_default_option(
        &mut self,
        name: impl Into<String>,
        routine: Command,
    ) -> StriderResult<()> {
        let name = name.into();
        self.add_option(name.clone(), routine)?;
        self.default = Some(name);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.routines.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routines.iter().any(|(n, _)| n == name)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Take the selected routine out of the catalog.
    ///
    /// `None` selects the default option.
    pub fn select(mut self, name: Option<&str>) -> StriderResult<Command> {
        let wanted = match name.or(self.default.as_deref()) {
            Some(wanted) => wanted.to_string(),
            None => return Err(StriderError::UnknownRoutine("<default>".to_string())),
        };
        let index = self
            .routines
            .iter()
            .position(|(n, _)| *n == wanted)
            .ok_or_else(|| StriderError::UnknownRoutine(wanted.clone()))?;

        let (name, routine) = self.routines.swap_remove(index);
        info!(routine = %name, "autonomous routine selected");
        Ok(routine)
    }
}

impl fmt::Debug for RoutineCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineCatalog")
            .field("names", &self.names())
            .field("default", &self.default)
            .finish()
    }
}
