//! Convenient re-exports for downstream crates.

pub use crate::config::PipelineConfig;
pub use crate::error::{Error, Result};
pub use crate::pool::SegmentPool;
pub use crate::size::SizeHint;
