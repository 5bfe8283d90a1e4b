#![forbid(unsafe_code)]
//! spanpipe-planner: decide where a pipeline's output will live.
//!
//! Given an upper bound on output length, the [`CapacityPlanner`] either
//! reserves inline (non-heap) capacity or sends the buffer straight to pooled
//! heap growth. Plans affect placement only, never produced values.

pub mod capacity;

pub use capacity::{CapacityPlan, CapacityPlanner, StorageMode};
