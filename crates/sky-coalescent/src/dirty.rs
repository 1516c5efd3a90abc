//! Mapping from change notifications to the minimal stale cache set.

use sky_core::types::TreeId;

/// A change notification from a collaborator.
///
/// Over-invalidation is acceptable; under-invalidation is a correctness
/// bug, so anything not precisely attributable maps to a wider scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Whole-topology move: every schedule and every scalar is stale.
    Topology,
    /// A node-height or branch change confined to one tree.
    Branch(TreeId),
    /// Grid/log-population parameter change: schedules survive, every
    /// cached scalar is stale.
    Trajectory,
}

/// Which trees an invalidation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleScope {
    /// Nothing to clear.
    None,
    /// One tree's entry.
    Tree(TreeId),
    /// Every registered tree's entry.
    All,
}

/// The cache layers a [`ChangeEvent`] leaves stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleSet {
    /// Scope over cached event schedules.
    pub schedules: StaleScope,
    /// Scope over cached per-tree log-likelihoods.
    pub log_likelihoods: StaleScope,
}

impl ChangeEvent {
    /// The stale set this event implies.
    pub fn stale_set(self) -> StaleSet {
        match self {
            ChangeEvent::Topology => {
                StaleSet { schedules: StaleScope::All, log_likelihoods: StaleScope::All }
            }
            ChangeEvent::Branch(tree) => StaleSet {
                schedules: StaleScope::Tree(tree),
                log_likelihoods: StaleScope::Tree(tree),
            },
            ChangeEvent::Trajectory => {
                StaleSet { schedules: StaleScope::None, log_likelihoods: StaleScope::All }
            }
        }
    }
}
