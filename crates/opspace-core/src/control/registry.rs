//! Task type registry
//!
//! Maps a task type tag (the `type` field of a [`TaskDescriptor`]) to a
//! factory that builds an uninitialized task of that kind.
//!
//! [`TaskDescriptor`]: super::task::TaskDescriptor

use std::collections::BTreeMap;

use tracing::debug;

use super::task::gc_task::TASK_GC;
use super::task::null_damping::TASK_NULL_DAMPING;
use super::task::op_pos::TASK_OP_POS;
use super::task::{Task, TaskGc, TaskNullDamping, TaskOpPos};
use crate::error::{ControlError, ControlResult};

/// Builds a fresh, uninitialized task
pub type TaskFactory = fn() -> Box<dyn Task>;

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `gc`, `op_pos` and `null_damping` kinds
    pub fn with_builtin_tasks() -> Self {
        let mut registry = Self::new();
        registry.factories.insert(TASK_GC.to_string(), || Box::new(TaskGc::new()));
        registry.factories.insert(TASK_OP_POS.to_string(), || Box::new(TaskOpPos::new()));
        registry
            .factories
            .insert(TASK_NULL_DAMPING.to_string(), || Box::new(TaskNullDamping::new()));
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, factory: TaskFactory) -> ControlResult<()> {
        let tag = tag.into();
        if self.factories.contains_key(&tag) {
            return Err(ControlError::DuplicateTaskType(tag));
        }
        debug!(tag = %tag, "task type registered");
        self.factories.insert(tag, factory);
        Ok(())
    }

    /// Build an uninitialized task for `tag`
    pub fn create(&self, tag: &str) -> ControlResult<Box<dyn Task>> {
        self.factories
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| ControlError::UnregisteredTaskType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags() {
        let registry = TaskRegistry::with_builtin_tasks();
        assert_eq!(
            registry.tags().collect::<Vec<_>>(),
            vec!["gc", "null_damping", "op_pos"]
        );
        let task = registry.create("op_pos").unwrap();
        assert!(!task.has_been_init());
    }

    #[test]
    fn test_unregistered_tag() {
        let registry = TaskRegistry::new();
        assert!(matches!(
            registry.create("gc"),
            Err(ControlError::UnregisteredTaskType(tag)) if tag == "gc"
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = TaskRegistry::with_builtin_tasks();
        assert!(matches!(
            registry.register("gc", || Box::new(TaskGc::new())),
            Err(ControlError::DuplicateTaskType(_))
        ));
        registry.register("posture", || Box::new(TaskGc::new())).unwrap();
        assert!(registry.contains("posture"));
    }
}
