#![forbid(unsafe_code)]
//! spanpipe-core: shared vocabulary for the spanpipe workspace.
//!
//! This crate only defines *interfaces* and plain data:
//! - [`SizeHint`]: the exact/upper-bound estimate every pipeline stage reports.
//! - [`SegmentPool`]: the rent/give-back contract for heap segments. The
//!   concrete pool lives in `spanpipe-mem`.
//! - [`PipelineConfig`]: serializable knobs for inline budgets and growth.
//!
//! No allocation policy, logging, or execution lives here.

pub mod config;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod size;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pool::SegmentPool;
pub use size::SizeHint;
