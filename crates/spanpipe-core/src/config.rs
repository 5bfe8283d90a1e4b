//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default inline element budget for terminal collectors.
pub const DEFAULT_INLINE_BUDGET: usize = 64;

/// Default largest upstream bound `Reverse` buffers inline.
pub const DEFAULT_REVERSE_INLINE: usize = 64;

/// Default length of the first heap segment when a buffer starts in heap mode.
pub const DEFAULT_FIRST_SEGMENT_LEN: usize = 16;

/// Default starting candidate for inline capacity planning.
pub const DEFAULT_PLANNER_BASELINE: usize = 17;

/// Default number of capacity doublings the planner tries before giving up on
/// inline storage.
pub const DEFAULT_PLANNER_MAX_DEPTH: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Inline (non-heap) element budget for terminal collectors. `None` means
    /// collectors always start in heap mode.
    pub inline_budget: Option<usize>,

    /// Largest upstream bound `Reverse` will buffer inline. `None` or `0`
    /// forces the materialize-then-reverse path.
    pub reverse_inline_threshold: Option<usize>,

    /// Capacity of the first heap segment when nothing was reserved inline.
    pub first_segment_len: usize,

    /// Starting candidate of the capacity planner.
    pub planner_baseline: usize,

    /// Maximum doubling steps of the capacity planner.
    pub planner_max_depth: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inline_budget: Some(DEFAULT_INLINE_BUDGET),
            reverse_inline_threshold: Some(DEFAULT_REVERSE_INLINE),
            first_segment_len: DEFAULT_FIRST_SEGMENT_LEN,
            planner_baseline: DEFAULT_PLANNER_BASELINE,
            planner_max_depth: DEFAULT_PLANNER_MAX_DEPTH,
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `SPANPIPE_INLINE_BUDGET`: inline element budget for collectors
    /// - `SPANPIPE_REVERSE_INLINE`: inline threshold for `Reverse`
    /// - `SPANPIPE_FIRST_SEGMENT_LEN`: first heap segment length
    /// - `SPANPIPE_PLANNER_BASELINE`: planner starting candidate
    /// - `SPANPIPE_PLANNER_MAX_DEPTH`: planner doubling limit
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`] but reads from an arbitrary lookup,
    /// which keeps tests independent of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("SPANPIPE_INLINE_BUDGET").and_then(|s| s.parse::<usize>().ok()) {
            cfg.inline_budget = Some(v);
        }

        if let Some(v) = lookup("SPANPIPE_REVERSE_INLINE").and_then(|s| s.parse::<usize>().ok()) {
            cfg.reverse_inline_threshold = Some(v);
        }

        if let Some(v) =
            lookup("SPANPIPE_FIRST_SEGMENT_LEN").and_then(|s| s.parse::<usize>().ok())
        {
            cfg.first_segment_len = v;
        }

        if let Some(v) = lookup("SPANPIPE_PLANNER_BASELINE").and_then(|s| s.parse::<usize>().ok())
        {
            cfg.planner_baseline = v;
        }

        if let Some(v) = lookup("SPANPIPE_PLANNER_MAX_DEPTH").and_then(|s| s.parse::<u32>().ok())
        {
            cfg.planner_max_depth = v;
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_segment_len == 0 {
            return Err(Error::Config("first_segment_len must be > 0".into()));
        }
        // The planner grows candidates as (c - 1) * 2 + 1, which is stuck at 1.
        if self.planner_baseline < 2 {
            return Err(Error::Config(format!(
                "planner_baseline must be >= 2, got {}",
                self.planner_baseline
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let cfg = PipelineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.inline_budget, Some(DEFAULT_INLINE_BUDGET));
        assert_eq!(cfg.planner_baseline, 17);
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("SPANPIPE_INLINE_BUDGET", "128"),
            ("SPANPIPE_REVERSE_INLINE", "not-a-number"),
            ("SPANPIPE_FIRST_SEGMENT_LEN", "64"),
        ]
        .into_iter()
        .collect();

        let cfg = PipelineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.inline_budget, Some(128));
        assert_eq!(cfg.reverse_inline_threshold, Some(DEFAULT_REVERSE_INLINE));
        assert_eq!(cfg.first_segment_len, 64);
        assert_eq!(cfg.planner_max_depth, DEFAULT_PLANNER_MAX_DEPTH);
    }

    #[test]
    fn json_null_disables_inline_paths() {
        let cfg = PipelineConfig::from_json(
            r#"{"inline_budget": null, "reverse_inline_threshold": null}"#,
        )
        .unwrap();
        assert_eq!(cfg.inline_budget, None);
        assert_eq!(cfg.reverse_inline_threshold, None);
    }

    #[test]
    fn json_fills_defaults_and_validates() {
        let cfg = PipelineConfig::from_json(r#"{"inline_budget": 32}"#).unwrap();
        assert_eq!(cfg.inline_budget, Some(32));
        assert_eq!(cfg.first_segment_len, DEFAULT_FIRST_SEGMENT_LEN);

        let err = PipelineConfig::from_json(r#"{"first_segment_len": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PipelineConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
