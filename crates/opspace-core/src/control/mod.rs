//! Control layer
//!
//! - [`gc`]: single-objective joint-space controller
//! - [`task`]: task abstraction and the built-in task kinds
//! - [`servo`]: combines range-filtered task forces
//! - [`task_controller`]: priority levels and the null-space cascade
//! - [`registry`]: task type tag to factory map

pub mod gc;
pub mod multilevel;
pub mod registry;
pub mod servo;
pub mod task;
pub mod task_controller;

pub use gc::*;
pub use multilevel::MultiLevelMap;
pub use registry::{TaskFactory, TaskRegistry};
pub use servo::Servo;
pub use task::{ModelContext, Task, TaskData, TaskDescriptor, TaskGc, TaskNullDamping, TaskOpPos};
pub use task_controller::*;
