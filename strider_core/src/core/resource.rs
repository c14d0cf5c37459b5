use crate::core::command::CommandFactory;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Handle for a named, mutually-exclusive actuator slot.
///
/// Issued by [`Scheduler::register_resource`](crate::Scheduler::register_resource);
/// the number is the slot index inside that scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub(crate) u16);

impl ResourceId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Ordered so conflict resolution and logs are deterministic
pub type ResourceSet = BTreeSet<ResourceId>;

/// Identifies one activation of a scheduled command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub(crate) u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ownership record for a single resource
#[derive(Debug, Clone)]
pub(crate) struct ResourceSlot {
    pub(crate) name: String,
    pub(crate) owner: Option<CommandId>,
}

/// Default-command factories keyed by resource.
///
/// Shared between the scheduler, which reads it whenever a resource has no
/// owner, and the [`ModeController`](crate::ModeController), which rewrites
/// entries while it holds its own lock during a mode transition.
#[derive(Clone, Default)]
pub struct DefaultTable {
    inner: Arc<RwLock<BTreeMap<ResourceId, CommandFactory>>>,
}

impl DefaultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, resource: ResourceId, factory: CommandFactory) {
        self.inner.write().insert(resource, factory);
    }

    pub fn clear(&self, resource: ResourceId) -> bool {
        self.inner.write().remove(&resource).is_some()
    }

    /// Clone the factory out so no lock is held while a command is built
    pub fn get(&self, resource: ResourceId) -> Option<CommandFactory> {
        self.inner.read().get(&resource).cloned()
    }

    pub fn contains(&self, resource: ResourceId) -> bool {
        self.inner.read().contains_key(&resource)
    }

    pub fn resources(&self) -> Vec<ResourceId> {
        self.inner.read().keys().copied().collect()
    }
}

impl fmt::Debug for DefaultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultTable")
            .field("resources", &self.resources())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::Command;

    #[test]
    fn test_default_table_rebind() {
        let table = DefaultTable::new();
        let pivot = ResourceId(0);
        assert!(table.get(pivot).is_none());

        table.set(pivot, Arc::new(|| Command::none().named("aim")));
        assert_eq!(table.get(pivot).map(|f| f().name().to_string()), Some("aim".to_string()));

        table.set(pivot, Arc::new(|| Command::none().named("retract")));
        assert_eq!(table.get(pivot).map(|f| f().name().to_string()), Some("retract".to_string()));

        assert!(table.clear(pivot));
        assert!(!table.contains(pivot));
    }
}
