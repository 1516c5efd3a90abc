//! Multi-tree aggregation with lazy per-tree caching and transactional
//! store/restore/accept.

use sky_core::traits::{CoalescentDensity, IntervalProvider};
use sky_core::types::{Cache, EventSchedule, TreeId};
use sky_core::{Error, Result};

use crate::dirty::{ChangeEvent, StaleScope};

/// Cache slot for one registered tree.
#[derive(Debug, Clone, PartialEq)]
struct TreeSlot {
    schedule: Cache<EventSchedule>,
    log_likelihood: Cache<f64>,
}

impl TreeSlot {
    fn unknown() -> Self {
        Self { schedule: Cache::Unknown, log_likelihood: Cache::Unknown }
    }
}

/// Previous value of a cache entry touched during an open proposal.
#[derive(Debug, Clone)]
enum JournalEntry {
    Schedule(usize, Cache<EventSchedule>),
    LogLikelihood(usize, Cache<f64>),
}

/// Sum of independent per-tree coalescent log-likelihoods.
///
/// Each registered tree owns one cached event schedule and one cached
/// scalar, both starting [`Cache::Unknown`] and recomputed lazily on
/// query. Invalidations arrive as [`ChangeEvent`]s; the sampler's
/// transactional triad is `store` (open a journal), `restore` (replay it)
/// and `accept` (discard it). The journal records previous values of
/// touched entries only, so a rejected proposal reverts in O(touched)
/// rather than O(trees).
#[derive(Debug)]
pub struct ForestLikelihood<M> {
    density: M,
    slots: Vec<TreeSlot>,
    journal: Option<Vec<JournalEntry>>,
}

impl<M: CoalescentDensity> ForestLikelihood<M> {
    /// Aggregate over `density`, with no trees registered yet.
    pub fn new(density: M) -> Self {
        Self { density, slots: Vec::new(), journal: None }
    }

    /// The per-tree density in use.
    pub fn density(&self) -> &M {
        &self.density
    }

    /// Register one tree/partition and return its stable id.
    pub fn register_tree(&mut self) -> TreeId {
        self.slots.push(TreeSlot::unknown());
        TreeId::from_index(self.slots.len() - 1)
    }

    /// Number of registered trees.
    pub fn tree_count(&self) -> usize {
        self.slots.len()
    }

    /// Read-only view of a tree's cached scalar.
    pub fn cached_log_likelihood(&self, tree: TreeId) -> Result<&Cache<f64>> {
        Ok(&self.slot(tree)?.log_likelihood)
    }

    /// Whether a tree's schedule cache is current.
    pub fn has_schedule(&self, tree: TreeId) -> Result<bool> {
        Ok(!self.slot(tree)?.schedule.is_unknown())
    }

    /// Total log-likelihood, recomputing only entries in state `Unknown`.
    pub fn log_likelihood<P: IntervalProvider>(&mut self, provider: &P) -> Result<f64> {
        let mut total = 0.0;
        for index in 0..self.slots.len() {
            total += self.tree_log_likelihood_at(index, provider)?;
        }
        Ok(total)
    }

    /// One tree's (cached or recomputed) log-likelihood.
    pub fn tree_log_likelihood<P: IntervalProvider>(
        &mut self,
        tree: TreeId,
        provider: &P,
    ) -> Result<f64> {
        self.check_id(tree)?;
        self.tree_log_likelihood_at(tree.index(), provider)
    }

    /// Per-tree breakdown in registration order, for diagnostics.
    pub fn breakdown<P: IntervalProvider>(&mut self, provider: &P) -> Result<Vec<f64>> {
        (0..self.slots.len())
            .map(|index| self.tree_log_likelihood_at(index, provider))
            .collect()
    }

    /// Apply a change notification to the caches.
    pub fn invalidate(&mut self, event: ChangeEvent) -> Result<()> {
        let stale = event.stale_set();
        match stale.schedules {
            StaleScope::None => {}
            StaleScope::Tree(tree) => {
                self.check_id(tree)?;
                self.clear_schedule(tree.index());
            }
            StaleScope::All => {
                for index in 0..self.slots.len() {
                    self.clear_schedule(index);
                }
            }
        }
        match stale.log_likelihoods {
            StaleScope::None => {}
            StaleScope::Tree(tree) => {
                self.check_id(tree)?;
                self.clear_log_likelihood(tree.index());
            }
            StaleScope::All => {
                for index in 0..self.slots.len() {
                    self.clear_log_likelihood(index);
                }
            }
        }
        Ok(())
    }

    /// Open a proposal: subsequent cache mutations are journaled until
    /// `restore` or `accept`.
    pub fn store(&mut self) -> Result<()> {
        if self.journal.is_some() {
            return Err(Error::Dimension(
                "store() while a proposal is already open".to_string(),
            ));
        }
        self.journal = Some(Vec::new());
        Ok(())
    }

    /// Reject the open proposal: revert every touched entry, including any
    /// partial invalidation performed mid-trial.
    pub fn restore(&mut self) -> Result<()> {
        let Some(journal) = self.journal.take() else {
            return Err(Error::Dimension("restore() without a stored proposal".to_string()));
        };
        // Replay newest-first so the oldest recorded value of a slot wins.
        for entry in journal.into_iter().rev() {
            match entry {
                JournalEntry::Schedule(index, previous) => {
                    self.slots[index].schedule = previous;
                }
                JournalEntry::LogLikelihood(index, previous) => {
                    self.slots[index].log_likelihood = previous;
                }
            }
        }
        Ok(())
    }

    /// Accept the open proposal and discard its journal.
    pub fn accept(&mut self) -> Result<()> {
        if self.journal.take().is_none() {
            return Err(Error::Dimension("accept() without a stored proposal".to_string()));
        }
        Ok(())
    }

    fn slot(&self, tree: TreeId) -> Result<&TreeSlot> {
        self.slots.get(tree.index()).ok_or_else(|| {
            Error::Dimension(format!(
                "tree id {} out of range ({} registered)",
                tree.index(),
                self.slots.len()
            ))
        })
    }

    fn check_id(&self, tree: TreeId) -> Result<()> {
        self.slot(tree).map(|_| ())
    }

    fn clear_schedule(&mut self, index: usize) {
        self.journal_schedule(index);
        self.slots[index].schedule = Cache::Unknown;
    }

    fn clear_log_likelihood(&mut self, index: usize) {
        self.journal_log_likelihood(index);
        self.slots[index].log_likelihood = Cache::Unknown;
    }

    fn journal_schedule(&mut self, index: usize) {
        if let Some(journal) = &mut self.journal {
            journal.push(JournalEntry::Schedule(index, self.slots[index].schedule.clone()));
        }
    }

    fn journal_log_likelihood(&mut self, index: usize) {
        if let Some(journal) = &mut self.journal {
            journal.push(JournalEntry::LogLikelihood(index, self.slots[index].log_likelihood));
        }
    }

    fn tree_log_likelihood_at<P: IntervalProvider>(
        &mut self,
        index: usize,
        provider: &P,
    ) -> Result<f64> {
        if let Cache::Cached(value) = self.slots[index].log_likelihood {
            return Ok(value);
        }
        if self.slots[index].schedule.is_unknown() {
            let schedule = provider.event_schedule(TreeId::from_index(index))?;
            self.journal_schedule(index);
            self.slots[index].schedule = Cache::Cached(schedule);
        }
        let value = match &self.slots[index].schedule {
            Cache::Cached(schedule) => self.density.tree_log_likelihood(schedule)?,
            Cache::Unknown => {
                return Err(Error::Dimension(format!(
                    "schedule for tree {index} missing after refresh"
                )))
            }
        };
        self.journal_log_likelihood(index);
        self.slots[index].log_likelihood = Cache::Cached(value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use sky_core::types::{Interval, IntervalKind};

    /// Density that scores a schedule by its interval count and counts
    /// evaluations, so the tests can observe laziness.
    #[derive(Debug)]
    struct CountingDensity {
        evaluations: Cell<usize>,
    }

    impl CoalescentDensity for CountingDensity {
        fn tree_log_likelihood(&self, schedule: &EventSchedule) -> Result<f64> {
            self.evaluations.set(self.evaluations.get() + 1);
            Ok(-(schedule.len() as f64))
        }
    }

    /// Fixed per-tree schedules with a fetch counter.
    struct FixedProvider {
        schedules: Vec<EventSchedule>,
        fetches: Cell<usize>,
    }

    impl IntervalProvider for FixedProvider {
        fn event_schedule(&self, tree: TreeId) -> Result<EventSchedule> {
            self.fetches.set(self.fetches.get() + 1);
            self.schedules
                .get(tree.index())
                .cloned()
                .ok_or_else(|| Error::Dimension(format!("no schedule for tree {}", tree.index())))
        }
    }

    fn schedule_with(intervals: usize) -> EventSchedule {
        let intervals = (0..intervals)
            .map(|i| Interval {
                start: i as f64,
                finish: (i + 1) as f64,
                lineage_count: 1,
                kind: IntervalKind::Other,
            })
            .collect();
        EventSchedule::new(intervals).unwrap()
    }

    fn forest_with_two_trees() -> (ForestLikelihood<CountingDensity>, FixedProvider) {
        let mut forest = ForestLikelihood::new(CountingDensity { evaluations: Cell::new(0) });
        forest.register_tree();
        forest.register_tree();
        let provider = FixedProvider {
            schedules: vec![schedule_with(2), schedule_with(5)],
            fetches: Cell::new(0),
        };
        (forest, provider)
    }

    #[test]
    fn test_total_sums_per_tree_values() {
        let (mut forest, provider) = forest_with_two_trees();
        assert_relative_eq!(forest.log_likelihood(&provider).unwrap(), -7.0);
    }

    #[test]
    fn test_recompute_is_lazy() {
        let (mut forest, provider) = forest_with_two_trees();
        forest.log_likelihood(&provider).unwrap();
        forest.log_likelihood(&provider).unwrap();
        // One fetch and one evaluation per tree, ever.
        assert_eq!(provider.fetches.get(), 2);
        assert_eq!(forest.density().evaluations.get(), 2);
    }

    #[test]
    fn test_branch_invalidation_recomputes_one_tree() {
        let (mut forest, provider) = forest_with_two_trees();
        let second = TreeId::from_index(1);
        forest.log_likelihood(&provider).unwrap();
        forest.invalidate(ChangeEvent::Branch(second)).unwrap();
        forest.log_likelihood(&provider).unwrap();
        assert_eq!(provider.fetches.get(), 3);
        assert_eq!(forest.density().evaluations.get(), 3);
    }

    #[test]
    fn test_trajectory_invalidation_keeps_schedules() {
        let (mut forest, provider) = forest_with_two_trees();
        forest.log_likelihood(&provider).unwrap();
        forest.invalidate(ChangeEvent::Trajectory).unwrap();
        assert!(forest.has_schedule(TreeId::from_index(0)).unwrap());
        forest.log_likelihood(&provider).unwrap();
        // Schedules survive (no new fetches); scalars recompute.
        assert_eq!(provider.fetches.get(), 2);
        assert_eq!(forest.density().evaluations.get(), 4);
    }

    #[test]
    fn test_topology_invalidation_clears_schedules() {
        let (mut forest, provider) = forest_with_two_trees();
        forest.log_likelihood(&provider).unwrap();
        forest.invalidate(ChangeEvent::Topology).unwrap();
        assert!(!forest.has_schedule(TreeId::from_index(0)).unwrap());
        forest.log_likelihood(&provider).unwrap();
        assert_eq!(provider.fetches.get(), 4);
    }

    #[test]
    fn test_store_restore_round_trip_preserves_unknown() {
        let (mut forest, provider) = forest_with_two_trees();
        let first = TreeId::from_index(0);
        let second = TreeId::from_index(1);
        forest.log_likelihood(&provider).unwrap();
        // Leave the second tree Unknown before the snapshot.
        forest.invalidate(ChangeEvent::Branch(second)).unwrap();

        forest.store().unwrap();
        let snapshot_first = *forest.cached_log_likelihood(first).unwrap();
        // Trial move: invalidate everything and recompute.
        forest.invalidate(ChangeEvent::Topology).unwrap();
        forest.log_likelihood(&provider).unwrap();
        forest.restore().unwrap();

        assert_eq!(*forest.cached_log_likelihood(first).unwrap(), snapshot_first);
        assert!(forest.cached_log_likelihood(second).unwrap().is_unknown());
        assert!(!forest.has_schedule(second).unwrap());
    }

    #[test]
    fn test_store_restore_without_mutation_is_identity() {
        let (mut forest, provider) = forest_with_two_trees();
        forest.log_likelihood(&provider).unwrap();
        let before = *forest.cached_log_likelihood(TreeId::from_index(0)).unwrap();
        forest.store().unwrap();
        forest.restore().unwrap();
        assert_eq!(*forest.cached_log_likelihood(TreeId::from_index(0)).unwrap(), before);
    }

    #[test]
    fn test_accept_keeps_trial_values() {
        let (mut forest, provider) = forest_with_two_trees();
        forest.log_likelihood(&provider).unwrap();
        forest.store().unwrap();
        forest.invalidate(ChangeEvent::Trajectory).unwrap();
        forest.log_likelihood(&provider).unwrap();
        forest.accept().unwrap();
        // Nothing left to restore.
        assert!(matches!(forest.restore(), Err(Error::Dimension(_))));
    }

    #[test]
    fn test_transaction_misuse_fails_loud() {
        let (mut forest, _provider) = forest_with_two_trees();
        forest.store().unwrap();
        assert!(matches!(forest.store(), Err(Error::Dimension(_))));
        forest.accept().unwrap();
        assert!(matches!(forest.accept(), Err(Error::Dimension(_))));
    }

    #[test]
    fn test_unknown_tree_id_fails_loud() {
        let (mut forest, provider) = forest_with_two_trees();
        let bogus = TreeId::from_index(9);
        assert!(matches!(
            forest.tree_log_likelihood(bogus, &provider),
            Err(Error::Dimension(_))
        ));
        assert!(matches!(
            forest.invalidate(ChangeEvent::Branch(bogus)),
            Err(Error::Dimension(_))
        ));
    }

    #[test]
    fn test_breakdown_matches_total() {
        let (mut forest, provider) = forest_with_two_trees();
        let breakdown = forest.breakdown(&provider).unwrap();
        assert_eq!(breakdown, vec![-2.0, -5.0]);
        let total = forest.log_likelihood(&provider).unwrap();
        assert_relative_eq!(total, breakdown.iter().sum::<f64>());
    }
}
