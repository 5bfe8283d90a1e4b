//! Abstract segment pool interface.
//!
//! The concrete implementation lives in `spanpipe-mem`. We keep only the trait
//! here so operators can accept any pool without pulling the buffer logic.

/// A shared source of heap segments for growable buffers.
///
/// Buffers call `rent` when their inline storage (or previous segment) is full
/// and must hand every rented segment back through `give_back` exactly once,
/// on every exit path. Callers never retain a segment after giving it back.
pub trait SegmentPool<T> {
    /// Rent an *empty* vector whose capacity is at least `min_len`.
    ///
    /// Pools may return more capacity than requested; buffers track their own
    /// logical segment length and never rely on the extra room.
    fn rent(&self, min_len: usize) -> Vec<T>;

    /// Return a previously rented segment. Any remaining elements are dropped
    /// by the pool.
    fn give_back(&self, segment: Vec<T>);
}

// NOTE: Do *not* add a blanket "no-op" impl here. A missing pool is expressed
// as `Option::None` at the call site, which falls back to plain allocation.
