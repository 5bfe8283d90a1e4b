//! Node / Sink protocol.
//!
//! A [`Node`] describes one pipeline stage; a [`Sink`] is one link of the
//! push-based consumer chain. Calling `execute` on the outermost node wraps the
//! sink once per stage until the root drives the real slice through the fully
//! wrapped chain. Results flow back out through `finish`.

use spanpipe_core::SizeHint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    /// Buffer faults (bounds violation, segment limit).
    #[error(transparent)]
    Mem(#[from] spanpipe_mem::Error),

    #[error("configuration error: {0}")]
    Config(#[from] spanpipe_core::Error),
}

/// Whether the producer should keep pushing elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

/// One link of the consumer chain.
///
/// Invariants:
/// - `process_next` is called at most once per upstream element, in arrival
///   order, and never again after it returned `Flow::Stop` or an error.
/// - `finish` consumes the sink, so the result is produced exactly once.
pub trait Sink<T> {
    type Output;

    fn process_next(&mut self, item: T) -> Result<Flow, OpError>;

    fn finish(self) -> Result<Self::Output, OpError>;
}

/// One pipeline stage.
///
/// Nodes are immutable descriptions; `execute` takes `&self`, so a composed
/// pipeline can run any number of times.
pub trait Node {
    /// Element type of the slice the root iterates.
    type Source;
    /// Element type this stage emits.
    type Item;

    /// Size estimate for a source slice of `source_len` elements. Used for
    /// allocation sizing only.
    fn size_hint(&self, source_len: usize) -> SizeHint;

    /// Drive `view` through this stage (and every stage below it) into `sink`.
    fn execute<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<Self::Item>;
}
