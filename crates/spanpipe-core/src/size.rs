//! Size estimates reported by pipeline stages.
//!
//! Every stage maps the estimate of the stage below it. Estimates are used for
//! allocation sizing only: `upper` is a provable ceiling, `exact` is present
//! only when the stage can guarantee the count.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeHint {
    /// Exact output length, if the stage can guarantee it.
    pub exact: Option<usize>,
    /// Ceiling on output length; `None` when no ceiling is known.
    pub upper: Option<usize>,
}

impl SizeHint {
    /// The hint for a stage that emits exactly `n` elements.
    pub const fn exact(n: usize) -> Self {
        Self {
            exact: Some(n),
            upper: Some(n),
        }
    }

    /// The hint for a stage that emits at most `n` elements.
    pub const fn at_most(n: usize) -> Self {
        Self {
            exact: None,
            upper: Some(n),
        }
    }

    pub const fn unknown() -> Self {
        Self {
            exact: None,
            upper: None,
        }
    }

    /// Size rule for element-dropping stages (filter, where-select): the
    /// exact count is lost, the ceiling survives.
    pub const fn reduced(self) -> Self {
        Self {
            exact: None,
            upper: self.upper,
        }
    }

    /// True when the stage is known to emit nothing.
    pub fn is_empty(&self) -> bool {
        self.upper == Some(0)
    }

    /// Whether the ceiling is known and no larger than `limit`.
    pub fn fits_within(&self, limit: usize) -> bool {
        matches!(self.upper, Some(u) if u <= limit)
    }
}
