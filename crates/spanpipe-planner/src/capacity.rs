//! Inline capacity planning.
//!
//! Candidates grow as `(c - 1) * 2 + 1` starting from `baseline`
//! (17, 33, 65, 129, 257, ...). Growth stops at `max_depth` steps; a required
//! size still not covered by then goes to the heap. The chosen capacity is also
//! clipped to `inline_limit`, the real size of the caller's inline array.

use serde::{Deserialize, Serialize};
use spanpipe_core::config::{PipelineConfig, DEFAULT_PLANNER_BASELINE, DEFAULT_PLANNER_MAX_DEPTH};

/// Where a buffer starts out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// Reserve `capacity` inline slots before touching the heap.
    Inline { capacity: usize },
    /// Skip inline storage entirely; grow through heap/pool segments.
    Heap,
}

/// Result of planning a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPlan {
    pub mode: StorageMode,
    /// Hard ceiling the buffer must enforce (the required size, when known).
    pub hard_bound: Option<usize>,
    /// Doubling steps taken to reach the inline capacity.
    pub depth: u32,
}

impl CapacityPlan {
    pub const fn heap(hard_bound: Option<usize>) -> Self {
        Self {
            mode: StorageMode::Heap,
            hard_bound,
            depth: 0,
        }
    }

    /// Inline capacity reserved by this plan (0 in heap mode).
    pub fn inline_capacity(&self) -> usize {
        match self.mode {
            StorageMode::Inline { capacity } => capacity,
            StorageMode::Heap => 0,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.mode, StorageMode::Inline { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPlanner {
    /// First inline candidate.
    pub baseline: usize,
    /// Maximum number of doubling steps.
    pub max_depth: u32,
    /// Physical size of the inline storage the plan will be applied to.
    pub inline_limit: usize,
}

impl CapacityPlanner {
    pub fn new(inline_limit: usize) -> Self {
        Self {
            baseline: DEFAULT_PLANNER_BASELINE,
            max_depth: DEFAULT_PLANNER_MAX_DEPTH,
            inline_limit,
        }
    }

    pub fn from_config(cfg: &PipelineConfig, inline_limit: usize) -> Self {
        Self {
            baseline: cfg.planner_baseline,
            max_depth: cfg.planner_max_depth,
            inline_limit,
        }
    }

    /// Plan storage for an output of at most `required` elements.
    pub fn plan(&self, required: Option<usize>) -> CapacityPlan {
        let required = match required {
            Some(n) if n > 0 => n,
            other => return CapacityPlan::heap(other),
        };

        let mut candidate = self.baseline.max(2);
        let mut depth = 0;
        while candidate < required && depth < self.max_depth {
            candidate = (candidate - 1).saturating_mul(2).saturating_add(1);
            depth += 1;
        }

        let capacity = candidate.min(self.inline_limit);
        if capacity >= required {
            CapacityPlan {
                mode: StorageMode::Inline { capacity },
                hard_bound: Some(required),
                depth,
            }
        } else {
            CapacityPlan::heap(Some(required))
        }
    }
}
