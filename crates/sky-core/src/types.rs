//! Common data types for Skyline

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Classification of the event that closes a tree interval.
///
/// A closed enum rather than a type hierarchy: only the
/// `(start, finish, lineage_count, kind)` tuple carries decision-relevant
/// information for the accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalKind {
    /// Two lineages merge at the end of the interval.
    Coalescent,
    /// One or more tips enter at the end of the interval.
    Sample,
    /// Any other boundary (e.g. bookkeeping events inserted by the caller).
    Other,
}

/// One interval of a tree's event schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Interval start time.
    pub start: f64,
    /// Interval finish time; the closing event happens here.
    pub finish: f64,
    /// Number of extant ancestral lineages during the interval.
    pub lineage_count: u32,
    /// What the closing event is.
    pub kind: IntervalKind,
}

impl Interval {
    /// Interval length.
    pub fn duration(&self) -> f64 {
        self.finish - self.start
    }
}

/// Validated, time-ordered event schedule for a single tree.
///
/// Owned by a tree collaborator and recomputed whenever topology or node
/// heights change; the engine only ever reads it. Construction enforces:
/// contiguous non-decreasing times, finite values, and a lineage count that
/// drops by exactly one after every coalescent interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSchedule {
    intervals: Vec<Interval>,
}

impl EventSchedule {
    /// Validate and wrap a list of intervals. An empty schedule is allowed
    /// (it contributes zero log-likelihood).
    pub fn new(intervals: Vec<Interval>) -> Result<Self> {
        for (i, interval) in intervals.iter().enumerate() {
            if !interval.start.is_finite() || !interval.finish.is_finite() {
                return Err(Error::Dimension(format!(
                    "interval {i} has non-finite times [{}, {}]",
                    interval.start, interval.finish
                )));
            }
            if interval.finish < interval.start {
                return Err(Error::Dimension(format!(
                    "interval {i} has negative duration [{}, {}]",
                    interval.start, interval.finish
                )));
            }
        }
        for (i, pair) in intervals.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start != prev.finish {
                return Err(Error::Dimension(format!(
                    "interval {} starts at {} but interval {i} finishes at {}",
                    i + 1,
                    next.start,
                    prev.finish
                )));
            }
            if prev.kind == IntervalKind::Coalescent {
                if prev.lineage_count < 2 {
                    return Err(Error::Dimension(format!(
                        "coalescent interval {i} has only {} lineage(s)",
                        prev.lineage_count
                    )));
                }
                if next.lineage_count != prev.lineage_count - 1 {
                    return Err(Error::Dimension(format!(
                        "lineage count goes {} -> {} across coalescent interval {i}",
                        prev.lineage_count, next.lineage_count
                    )));
                }
            }
        }
        Ok(Self { intervals })
    }

    /// The validated intervals in time order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the schedule has no intervals.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Explicit cache state: a value, or "needs recompute".
///
/// Replaces nullable scalars so staleness is statically checkable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cache<T> {
    /// No valid value; must be recomputed before use.
    Unknown,
    /// A value that is current with respect to all inputs.
    Cached(T),
}

impl<T> Cache<T> {
    /// Whether the entry needs recomputation.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Cache::Unknown)
    }

    /// The cached value, if current.
    pub fn value(&self) -> Option<&T> {
        match self {
            Cache::Unknown => None,
            Cache::Cached(value) => Some(value),
        }
    }
}

/// Stable dense id for a registered tree/partition.
///
/// Ids are assigned at registration and index a dense arena, replacing
/// fragile parallel-array bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeId(usize);

impl TreeId {
    /// Wrap a raw arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}
