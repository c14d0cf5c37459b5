//! Error types for the STRIDER core.
//!
//! Conflicting resource claims are not errors; they are resolved by
//! interruption inside the scheduler. Everything here is raised while the
//! robot is being wired up (bindings, signals, routines), so a failure is
//! reported before the match starts rather than in the middle of a tick.

use thiserror::Error;

/// Main error type for STRIDER operations
#[derive(Debug, Error)]
pub enum StriderError {
    /// A routine referenced a trajectory the path follower does not know
    #[error("Unknown trajectory '{0}'")]
    UnknownTrajectory(String),

    /// A routine name is not in the catalog
    #[error("Unknown routine '{0}'")]
    UnknownRoutine(String),

    /// A named command was requested but never registered
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    /// A resource id did not come from this scheduler
    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    /// Resource names must be unique within one scheduler
    #[error("Resource '{0}' is already registered")]
    DuplicateResource(String),

    /// Signal priorities are unique ordinals
    #[error("Signal priority {priority} is already taken by '{existing}'")]
    DuplicatePriority { priority: u32, existing: String },

    /// Catalog and registry names must be unique
    #[error("Name '{0}' is already registered")]
    DuplicateName(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StriderError {
    /// Shorthand for configuration errors
    pub fn config(msg: impl Into<String>) -> Self {
        StriderError::Config(msg.into())
    }

    /// True for errors caused by a reference to something that does not exist
    pub fn is_missing_reference(&self) -> bool {
        matches!(
            self,
            StriderError::UnknownTrajectory(_)
                | StriderError::UnknownRoutine(_)
                | StriderError::UnknownCommand(_)
                | StriderError::UnknownResource(_)
        )
    }
}

/// Result alias used across STRIDER crates
pub type StriderResult<T> = Result<T, StriderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = StriderError::UnknownTrajectory("3NB-Close.1".to_string());
        assert_eq!(err.to_string(), "Unknown trajectory '3NB-Close.1'");

        let err = StriderError::DuplicatePriority {
            priority: 5,
            existing: "revved".to_string(),
        };
        assert!(err.to_string().contains("revved"));
    }

    #[test]
    fn test_missing_reference_classification() {
        assert!(StriderError::UnknownRoutine("x".into()).is_missing_reference());
        assert!(!StriderError::config("bad period").is_missing_reference());
    }
}
