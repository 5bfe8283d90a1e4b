#![forbid(unsafe_code)]
//! spanpipe-mem: output buffers and the segment pool.
//!
//! This crate provides concrete implementations for the *interfaces* defined
//! in `spanpipe-core::pool`. Every heap segment a pipeline touches is held by a
//! [`Segment`] guard, so it goes back to its pool on every exit path,
//! including unwinding out of a panicking user callable.

pub mod buffer;
pub mod error;
pub mod pool;
pub mod segment;
pub mod tracking;

pub use buffer::{inline_fits, GrowableBuffer, DEFAULT_INLINE, MAX_INLINE_BYTES, MAX_SEGMENTS};
pub use error::{Error, Result};
pub use pool::VecPool;
pub use segment::Segment;
pub use tracking::{PoolStats, SegmentTracker};
