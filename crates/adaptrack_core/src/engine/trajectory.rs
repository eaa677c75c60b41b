//! Projected trajectories with optional confidence bands.

use super::projection::{Projection, ProjectionModel};
use super::rate::RateEstimate;
use serde::{Deserialize, Serialize};

/// One projected point at an integer generation offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub generation: u32,
    /// Years from the current observation.
    pub years: f64,
    pub value: f64,
    /// Band edges, present when the rate estimate carries bounds.
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

/// Projects `model` over offsets `0..=horizon`.
///
/// Band edges are evaluated with the model re-parameterized at each rate
/// bound and ordered so that `lower <= upper` at every point.
pub fn trajectory(
    model: &Projection,
    rate: &RateEstimate,
    horizon: u32,
    generation_time_years: f64,
) -> Vec<TrajectoryPoint> {
    let band = rate
        .bounds()
        .map(|(lower, upper)| (model.with_rate(lower), model.with_rate(upper)));

    (0..=horizon)
        .map(|generation| {
            let offset = f64::from(generation);
            let (lower, upper) = match &band {
                Some((slow, fast)) => {
                    let a = slow.value_at(offset);
                    let b = fast.value_at(offset);
                    (Some(a.min(b)), Some(a.max(b)))
                }
                None => (None, None),
            };
            TrajectoryPoint {
                generation,
                years: offset * generation_time_years,
                value: model.value_at(offset),
                lower,
                upper,
            }
        })
        .collect()
}

/// Maps trajectory values onto percent progress from `w0` (0 %) to
/// `w_target` (100 %).
///
/// Returns zeros when the target does not differ from the baseline.
pub fn normalized_progress(points: &[TrajectoryPoint], w0: f64, w_target: f64) -> Vec<f64> {
    let span = w_target - w0;
    points
        .iter()
        .map(|point| {
            if span == 0.0 {
                0.0
            } else {
                (point.value - w0) / span * 100.0
            }
        })
        .collect()
}
