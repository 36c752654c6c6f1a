//! Mathematical utilities for the control core
//!
//! Dense linear-algebra helpers shared by the joint-space controller,
//! the operational-space tasks and the reference dynamics engine.

pub mod linalg;
pub mod planar;

pub use linalg::*;
pub use planar::*;
