//! Unconditioned skygrid coalescent likelihood.

use sky_core::traits::CoalescentDensity;
use sky_core::types::EventSchedule;
use sky_core::Result;
use sky_prob::math::choose2;

use crate::grid::{GridCursor, GridSpan};
use crate::trajectory::SkygridTrajectory;

/// Skygrid coalescent log-likelihood over one trajectory.
///
/// Walks a tree's event schedule in time order accumulating the hazard
/// `C(k,2)·∫ dt/N(t)` per interval; the tree total is the negated sum.
/// Unlike [`BoundedCoalescentLikelihood`](crate::bounded::BoundedCoalescentLikelihood)
/// this variant adds no `−ln N` term at coalescent events; callers that
/// care about the distinction select a variant through
/// [`CoalescentDensity`].
#[derive(Debug, Clone)]
pub struct SkygridLikelihood {
    trajectory: SkygridTrajectory,
}

impl SkygridLikelihood {
    /// Build the likelihood over `trajectory`.
    pub fn new(trajectory: SkygridTrajectory) -> Self {
        Self { trajectory }
    }

    /// The underlying trajectory.
    pub fn trajectory(&self) -> &SkygridTrajectory {
        &self.trajectory
    }

    /// `∫ dt / N(t)` over one interval, splitting at interior knots and
    /// advancing the shared cursor.
    fn interval_inverse_integral(
        &self,
        cursor: &mut GridCursor,
        start: f64,
        finish: f64,
    ) -> Result<f64> {
        match cursor.interior_knots(&self.trajectory, start, finish) {
            GridSpan::Empty => {
                self.trajectory.segment_inverse_integral(start, finish, cursor.segment())
            }
            GridSpan::Interior { first, last } => {
                // Partial piece up to the first interior knot, full segments
                // between consecutive knots, partial piece out to `finish`.
                let mut sum = self.trajectory.segment_inverse_integral(
                    start,
                    self.trajectory.knot_time(first),
                    cursor.segment(),
                )?;
                cursor.advance_to(first);
                while cursor.segment() < last {
                    let segment = cursor.segment();
                    sum += self.trajectory.segment_inverse_integral(
                        self.trajectory.knot_time(segment),
                        self.trajectory.knot_time(segment + 1),
                        segment,
                    )?;
                    cursor.advance_to(segment + 1);
                }
                sum += self.trajectory.segment_inverse_integral(
                    self.trajectory.knot_time(last),
                    finish,
                    last,
                )?;
                Ok(sum)
            }
        }
    }
}

impl CoalescentDensity for SkygridLikelihood {
    fn tree_log_likelihood(&self, schedule: &EventSchedule) -> Result<f64> {
        let mut cursor = GridCursor::new();
        let mut hazard = 0.0;
        for interval in schedule.intervals() {
            // Intervals with fewer than two lineages contribute no hazard,
            // but the cursor still has to walk their knots.
            let integral =
                self.interval_inverse_integral(&mut cursor, interval.start, interval.finish)?;
            hazard += choose2(interval.lineage_count) * integral;
        }
        Ok(-hazard)
    }
}
