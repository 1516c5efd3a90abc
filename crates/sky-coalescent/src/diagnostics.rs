//! Best-effort diagnostic export of per-tree likelihood breakdowns.
//!
//! The export is a side channel for debugging sampler runs: failures are
//! logged and swallowed, and must never affect the computed likelihood.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Current schema version for breakdown artifacts.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// One tree's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeBreakdown {
    /// Arena index of the tree (registration order).
    pub tree: usize,
    /// Its log-likelihood at export time.
    pub log_likelihood: f64,
}

/// Per-tree breakdown of a forest evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestBreakdown {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Per-tree contributions in registration order.
    pub per_tree: Vec<TreeBreakdown>,
    /// Sum over all trees.
    pub total: f64,
}

impl ForestBreakdown {
    /// Wrap per-tree values (as returned by
    /// [`ForestLikelihood::breakdown`](crate::forest::ForestLikelihood::breakdown)).
    pub fn new(per_tree_values: &[f64]) -> Self {
        let per_tree = per_tree_values
            .iter()
            .enumerate()
            .map(|(tree, &log_likelihood)| TreeBreakdown { tree, log_likelihood })
            .collect::<Vec<_>>();
        let total = per_tree_values.iter().sum();
        Self { schema_version: SCHEMA_VERSION.to_string(), per_tree, total }
    }

    /// Write the breakdown as pretty JSON. Best effort: on failure a
    /// warning is logged and nothing is propagated.
    pub fn write_json(&self, path: &Path) {
        if let Err(error) = self.try_write_json(path) {
            log::warn!("diagnostic export to {} failed: {error}", path.display());
        }
    }

    fn try_write_json(&self, path: &Path) -> sky_core::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
