//! Error types for the control core
//!
//! Every fallible operation returns a [`ControlResult`]. Errors fall into
//! three kinds (see [`ErrorKind`]): configuration errors detected at
//! init/add time, runtime computation errors reported per tick, and lookup
//! errors for names that do not exist.

use thiserror::Error;

/// Broad classification of a [`ControlError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing setup; the component stays uninitialized
    Configuration,
    /// A tick failed; no command was written
    Runtime,
    /// A named item does not exist; no state changed
    Lookup,
}

/// Control core errors
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Uninitialized {what} passed")]
    Uninitialized { what: &'static str },
    #[error("Controller not initialized")]
    NotInitialized,
    #[error(
        "Inconsistent model: gc model has {model} com entries \
         but the robot has {topology} non-root links"
    )]
    InconsistentModel { model: usize, topology: usize },
    #[error("Dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Task '{0}' already exists")]
    DuplicateTask(String),
    #[error("No task type registered for tag '{0}'")]
    UnregisteredTaskType(String),
    #[error("Task type '{0}' is already registered")]
    DuplicateTaskType(String),
    #[error("Task '{0}' has not been initialized")]
    TaskNotInitialized(String),
    #[error("Invalid priority level {level} (maximum is {max})")]
    InvalidLevel { level: usize, max: usize },
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Could not initialize task '{name}' of type '{task_type}' at level {level}: {source}")]
    TaskInitFailed {
        name: String,
        task_type: String,
        level: usize,
        #[source]
        source: Box<ControlError>,
    },
    #[error("Dynamics update failed: {0}")]
    DynamicsUpdateFailed(String),
    #[error("No tasks registered")]
    NoTasks,
    #[error("Singular matrix: {0}")]
    SingularMatrix(&'static str),
    #[error("Task '{name}' failed to compute: {source}")]
    TaskComputeFailed {
        name: String,
        #[source]
        source: Box<ControlError>,
    },
    #[error("Task '{0}' not found")]
    TaskNotFound(String),
    #[error("Unknown link '{0}'")]
    UnknownLink(String),
}

impl ControlError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::DynamicsUpdateFailed(_)
            | ControlError::NoTasks
            | ControlError::SingularMatrix(_)
            | ControlError::TaskComputeFailed { .. } => ErrorKind::Runtime,
            ControlError::TaskNotFound(_) | ControlError::UnknownLink(_) => ErrorKind::Lookup,
            _ => ErrorKind::Configuration,
        }
    }

    /// Shorthand for a [`ControlError::DimensionMismatch`]
    pub(crate) fn dim(what: &'static str, expected: usize, got: usize) -> Self {
        ControlError::DimensionMismatch {
            what,
            expected,
            got,
        }
    }
}

/// Result type for control core operations
pub type ControlResult<T> = std::result::Result<T, ControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ControlError::InconsistentModel {
            model: 3,
            topology: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));

        let err = ControlError::UnregisteredTaskType("op_ori".into());
        assert!(format!("{err}").contains("op_ori"));
    }

    #[test]
    fn test_task_init_failed_names_task_type_and_level() {
        let err = ControlError::TaskInitFailed {
            name: "hand".into(),
            task_type: "op_pos".into(),
            level: 2,
            source: Box::new(ControlError::UnknownLink("palm".into())),
        };
        let msg = format!("{err}");
        assert!(msg.contains("hand"));
        assert!(msg.contains("op_pos"));
        assert!(msg.contains("level 2"));
        assert!(msg.contains("palm"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ControlError::NoTasks.kind(), ErrorKind::Runtime);
        assert_eq!(
            ControlError::TaskNotFound("x".into()).kind(),
            ErrorKind::Lookup
        );
        assert_eq!(
            ControlError::DuplicateTask("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ControlError::NotInitialized.kind(), ErrorKind::Configuration);
    }
}
