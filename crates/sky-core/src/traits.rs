//! Collaborator traits for Skyline
//!
//! These traits are the dependency-inversion seams of the engine: tree
//! storage, schedule extraction, and demographic parameterization live
//! outside it, and the likelihood code only sees these interfaces.

use crate::types::{EventSchedule, TreeId};
use crate::Result;

/// A demographic function `N(t)` with a closed-form reciprocal integral.
///
/// Both methods must be valid on negative time: the conditioned coalescent
/// variant anchors time zero at its TMRCA bound and evaluates everything
/// before it.
pub trait DemographicFunction {
    /// Effective population size at time `t`.
    fn population_at(&self, t: f64) -> Result<f64>;

    /// `∫ dt / N(t)` over `[start, finish]`, straddling any number of
    /// trajectory breakpoints.
    fn inverse_integral(&self, start: f64, finish: f64) -> Result<f64>;
}

/// A per-tree coalescent density.
///
/// The unconditioned and the TMRCA-bounded variants deliberately disagree
/// on the `−ln N` event term; this trait is the selectable seam between
/// them.
pub trait CoalescentDensity {
    /// Log-likelihood of one tree's event schedule. Degenerate schedules
    /// yield `Ok(f64::NEG_INFINITY)`, not an error.
    fn tree_log_likelihood(&self, schedule: &EventSchedule) -> Result<f64>;
}

/// Supplies the current event schedule of a registered tree.
///
/// Implemented by the tree collaborator; called only for trees whose
/// cached schedule has been invalidated.
pub trait IntervalProvider {
    /// Extract the sorted event schedule for `tree`.
    fn event_schedule(&self, tree: TreeId) -> Result<EventSchedule>;
}
