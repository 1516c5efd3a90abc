//! Coalescent likelihood conditioned on a maximum time to common ancestry.

use sky_core::traits::{CoalescentDensity, DemographicFunction};
use sky_core::types::{EventSchedule, IntervalKind};
use sky_core::{Error, Result};
use sky_prob::math::{choose2, log1mexp, log_sub_exp};

/// Coalescent density truncated at a maximum TMRCA.
///
/// Time is anchored at the bound: time zero *is* the bound and every
/// interval runs on negative time before it, with the origin advancing by
/// each interval's duration. Every interval with at least two lineages is
/// renormalized by the probability that coalescence happens before the
/// bound, so the density integrates to one on the truncated support.
///
/// Degenerate inputs (zero hazard over a positive duration, the stability
/// guard failing, or a tree reaching past the bound) evaluate to exactly
/// `f64::NEG_INFINITY` so the sampler rejects the proposal through its
/// ordinary acceptance rule.
#[derive(Debug, Clone)]
pub struct BoundedCoalescentLikelihood<D> {
    demographic: D,
    max_height: f64,
    threshold: f64,
}

impl<D: DemographicFunction> BoundedCoalescentLikelihood<D> {
    /// Build the conditioned density.
    ///
    /// `max_height` is the TMRCA bound (time from the most recent event to
    /// the conditioning horizon); `threshold` is the caller-supplied
    /// numerical-stability tolerance on `N(finish)·(area/duration)` at
    /// coalescent events (0 disables the guard).
    pub fn new(demographic: D, max_height: f64, threshold: f64) -> Result<Self> {
        if !max_height.is_finite() || max_height < 0.0 {
            return Err(Error::Configuration(format!(
                "TMRCA bound must be finite and non-negative, got {max_height}"
            )));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::Configuration(format!(
                "stability threshold must be finite and non-negative, got {threshold}"
            )));
        }
        Ok(Self { demographic, max_height, threshold })
    }

    /// The demographic function being integrated.
    pub fn demographic(&self) -> &D {
        &self.demographic
    }

    /// The TMRCA bound.
    pub fn max_height(&self) -> f64 {
        self.max_height
    }
}

impl<D: DemographicFunction> CoalescentDensity for BoundedCoalescentLikelihood<D> {
    fn tree_log_likelihood(&self, schedule: &EventSchedule) -> Result<f64> {
        let mut log_likelihood = 0.0;
        let mut start_time = -self.max_height;

        for interval in schedule.intervals() {
            let duration = interval.duration();
            let finish_time = start_time + duration;

            let interval_area = self.demographic.inverse_integral(start_time, finish_time)?;
            let normalisation_area = self.demographic.inverse_integral(start_time, 0.0)?;

            // Zero hazard over a positive duration makes the observed
            // topology impossible under this trajectory.
            if interval_area == 0.0 && duration > 0.0 {
                return Ok(f64::NEG_INFINITY);
            }

            let lineage_count = interval.lineage_count;
            if lineage_count >= 2 {
                // The tree has reached or crossed the conditioning horizon;
                // nothing remains to renormalize against.
                if normalisation_area <= 0.0 {
                    return Ok(f64::NEG_INFINITY);
                }
                let k_choose_2 = choose2(lineage_count);

                if interval.kind == IntervalKind::Coalescent {
                    log_likelihood -= k_choose_2 * interval_area;

                    let population = self.demographic.population_at(finish_time)?;
                    if duration == 0.0
                        || population * (interval_area / duration) >= self.threshold
                    {
                        log_likelihood -= population.ln();
                    } else {
                        return Ok(f64::NEG_INFINITY);
                    }
                } else {
                    // P(no coalescence in this sub-interval, coalescence
                    // still before the bound).
                    if normalisation_area <= interval_area {
                        return Ok(f64::NEG_INFINITY);
                    }
                    log_likelihood += log_sub_exp(
                        -k_choose_2 * interval_area,
                        -k_choose_2 * normalisation_area,
                    );
                }

                // Conditioning denominator: P(coalescence before the bound).
                log_likelihood -= log1mexp(k_choose_2 * normalisation_area);
            }

            start_time = finish_time;
        }

        Ok(log_likelihood)
    }
}
