//! Piecewise affine demographic trajectory over skygrid knots.

use serde::{Deserialize, Serialize};
use sky_core::traits::DemographicFunction;
use sky_core::{Error, Result};

/// Population-size trajectory defined by parameters at ordered grid knots.
///
/// On the segment left-anchored at knot `i` the population follows the
/// affine form `N(t) = slope·t + intercept`. The slope is derived from the
/// log-population values at the bracketing knots; the intercept is a single
/// structural value shared by all segments, zero in the standard skygrid
/// configuration but kept pluggable.
///
/// Segment `0` extends to all times before the first knot and segment
/// `n-1` to all times after the last one. Those two edge segments take the
/// slope as the *direct difference* of adjacent log-population values,
/// without dividing by the grid-time gap; interior segments use the usual
/// difference quotient. The asymmetry is part of the model definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkygridTrajectory {
    grid_times: Vec<f64>,
    log_pop_sizes: Vec<f64>,
    intercept: f64,
}

impl SkygridTrajectory {
    /// Standard skygrid trajectory (intercept fixed at zero).
    pub fn new(grid_times: Vec<f64>, log_pop_sizes: Vec<f64>) -> Result<Self> {
        Self::with_intercept(grid_times, log_pop_sizes, 0.0)
    }

    /// Trajectory with an explicit affine intercept.
    pub fn with_intercept(
        grid_times: Vec<f64>,
        log_pop_sizes: Vec<f64>,
        intercept: f64,
    ) -> Result<Self> {
        if grid_times.len() != log_pop_sizes.len() {
            return Err(Error::Configuration(format!(
                "{} grid times for {} log population sizes",
                grid_times.len(),
                log_pop_sizes.len()
            )));
        }
        if grid_times.len() < 2 {
            return Err(Error::Configuration(
                "a trajectory needs at least two grid knots".to_string(),
            ));
        }
        if !intercept.is_finite() {
            return Err(Error::Configuration(format!("non-finite intercept {intercept}")));
        }
        if grid_times.iter().any(|t| !t.is_finite())
            || log_pop_sizes.iter().any(|v| !v.is_finite())
        {
            return Err(Error::Configuration("non-finite grid parameter".to_string()));
        }
        if grid_times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(Error::Configuration(
                "grid times must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { grid_times, log_pop_sizes, intercept })
    }

    /// Number of grid knots (== number of segments).
    pub fn knot_count(&self) -> usize {
        self.grid_times.len()
    }

    /// Time coordinate of knot `i`.
    pub fn knot_time(&self, i: usize) -> f64 {
        self.grid_times[i]
    }

    /// The structural intercept shared by all segments.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Index of the segment containing `t` (last knot at or before `t`,
    /// clamped to the edge segments).
    pub fn segment_of(&self, t: f64) -> usize {
        self.grid_times.partition_point(|&knot| knot <= t).saturating_sub(1)
    }

    /// Derived slope of one segment. Edge segments take the one-sided
    /// difference of adjacent log-population values without the grid-time
    /// gap in the denominator.
    fn segment_slope(&self, segment: usize) -> f64 {
        let n = self.grid_times.len();
        if segment == 0 {
            self.log_pop_sizes[1] - self.log_pop_sizes[0]
        } else if segment >= n - 1 {
            self.log_pop_sizes[n - 1] - self.log_pop_sizes[n - 2]
        } else {
            (self.log_pop_sizes[segment + 1] - self.log_pop_sizes[segment])
                / (self.grid_times[segment + 1] - self.grid_times[segment])
        }
    }

    /// Closed-form `∫ dt / N(t)` over `[start, finish]` restricted to one
    /// segment.
    ///
    /// `slope == 0`: the reciprocal is constant, `(finish - start) / c`.
    /// Otherwise `ln(slope·finish + c) − ln(slope·start + c), all / slope`,
    /// written as a log of the endpoint ratio so the closed form stays
    /// valid whenever both endpoints keep a consistent sign.
    pub fn segment_inverse_integral(
        &self,
        start: f64,
        finish: f64,
        segment: usize,
    ) -> Result<f64> {
        let slope = self.segment_slope(segment);
        if slope == 0.0 {
            if self.intercept == 0.0 {
                return Err(Error::Configuration(format!(
                    "population size is identically zero on segment {segment}"
                )));
            }
            return Ok((finish - start) / self.intercept);
        }
        let at_start = slope * start + self.intercept;
        let at_finish = slope * finish + self.intercept;
        if at_start == 0.0 || at_finish == 0.0 || (at_start > 0.0) != (at_finish > 0.0) {
            return Err(Error::Configuration(format!(
                "population size changes sign on segment {segment} over [{start}, {finish}]"
            )));
        }
        Ok((at_finish / at_start).ln() / slope)
    }
}

impl DemographicFunction for SkygridTrajectory {
    fn population_at(&self, t: f64) -> Result<f64> {
        let segment = self.segment_of(t);
        let slope = self.segment_slope(segment);
        if slope == 0.0 && self.intercept == 0.0 {
            return Err(Error::Configuration(format!(
                "population size is identically zero on segment {segment}"
            )));
        }
        Ok(slope * t + self.intercept)
    }

    fn inverse_integral(&self, start: f64, finish: f64) -> Result<f64> {
        if start > finish {
            return Ok(-self.inverse_integral(finish, start)?);
        }
        // Split at every knot strictly inside (start, finish); each piece
        // then lies on a single segment.
        let first = self.grid_times.partition_point(|&t| t <= start);
        let last = self.grid_times.partition_point(|&t| t < finish);
        let mut sum = 0.0;
        let mut piece_start = start;
        for knot in first..last {
            let cut = self.grid_times[knot];
            sum += self.segment_inverse_integral(piece_start, cut, self.segment_of(piece_start))?;
            piece_start = cut;
        }
        sum += self.segment_inverse_integral(piece_start, finish, self.segment_of(piece_start))?;
        Ok(sum)
    }
}
