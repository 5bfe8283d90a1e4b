#![forbid(unsafe_code)]
//! spanpipe-operators: fused single-pass operators over borrowed slices.
//!
//! Design intent:
//! - Pipelines are built bottom-up from a root ([`Root`]) and run against a
//!   slice exactly once. Each transform wraps the downstream [`Sink`] with its
//!   own adapter and delegates to its prior node; only the root loops.
//! - Everything is monomorphized: no boxing, no dynamic dispatch, no
//!   intermediate collections for streaming stages.
//! - Buffered operators ([`Reverse`]) and terminal collectors ([`ToVec`])
//!   store output through `spanpipe-mem`, inline first, pooled heap after.
//! - [`StageChain`] is the runtime-assembled counterpart for pipelines whose
//!   shape is only known at runtime.

pub mod collect;
pub mod engine;
pub mod ext;
pub mod filter;
pub mod map;
pub mod reverse;
pub mod root;
pub mod stage;
pub mod traits;
pub mod where_select;

pub use collect::{CollectOptions, ToImmutable, ToVec};
pub use ext::NodeExt;
pub use filter::Where;
pub use map::Select;
pub use reverse::{Reverse, ReverseOptions, REVERSE_INLINE};
pub use root::{Root, SelectRoot, SelectWhereRoot, WhereRoot, WhereSelectRoot};
pub use stage::{Stage, StageChain};
pub use traits::{Flow, Node, OpError, Sink};
pub use where_select::WhereSelect;
