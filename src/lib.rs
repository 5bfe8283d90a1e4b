#![forbid(unsafe_code)]
//! spanpipe: fused single-pass operator pipelines over borrowed slices.
//!
//! Re-exports the workspace crates under one roof:
//! - [`types`]: size hints, the segment pool contract, configuration
//! - [`planner`]: inline capacity planning
//! - [`mem`]: the growable inline/heap buffer and the segment pool
//! - [`operators`]: the node/sink protocol, stages, and collectors
//!
//! ```
//! use spanpipe::prelude::*;
//!
//! let data = [5, 3, 8, 1, 9, 2];
//! let out = Root::<i32>::new()
//!     .filter(|x| x % 2 == 1)
//!     .select(|x| x * 10)
//!     .reverse()
//!     .to_vec(&data)
//!     .unwrap();
//! assert_eq!(out, vec![90, 10, 30, 50]);
//!
//! let fused = Root::<i32>::new().select(|x| x * 10).filter(|y| *y > 40);
//! let hint: spanpipe::types::SizeHint = fused.size_hint(data.len());
//! assert_eq!(hint, spanpipe::types::SizeHint::at_most(6));
//! assert_eq!(fused.to_vec(&data).unwrap(), vec![50, 80, 90]);
//! ```

pub use spanpipe_core as types;
pub use spanpipe_mem as mem;
pub use spanpipe_operators as operators;
pub use spanpipe_planner as planner;

pub mod prelude {
    pub use spanpipe_core::{PipelineConfig, SegmentPool, SizeHint};
    pub use spanpipe_mem::{GrowableBuffer, PoolStats, VecPool};
    pub use spanpipe_operators::{
        CollectOptions, Flow, Node, NodeExt, OpError, ReverseOptions, Root, Sink, Stage,
        StageChain,
    };
    pub use spanpipe_planner::{CapacityPlan, CapacityPlanner, StorageMode};
}
