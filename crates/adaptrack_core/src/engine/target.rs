//! Time-to-target resolution.
//!
//! # Responsibility
//! - Resolve each configured target tier to an absolute value.
//! - Invert the projection at the point rate and, independently, at each
//!   rate bound.
//! - Convert generations to years.
//!
//! # Invariants
//! - The faster edge is never longer than the slower edge; `Unreachable`
//!   sorts after every finite duration.
//! - Interval edges are absent exactly when the rate has no bounds.

use super::projection::{Horizon, Projection, ProjectionModel};
use super::rate::RateEstimate;
use crate::model::project::{Project, TargetLevel};
use serde::{Deserialize, Serialize};

/// Point duration plus an asymmetric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeToTarget {
    pub point: Horizon,
    /// Shorter of the two bound solutions.
    pub faster: Option<Horizon>,
    /// Longer of the two bound solutions.
    pub slower: Option<Horizon>,
}

impl TimeToTarget {
    /// Duration used for conservative comparisons: the slower edge when
    /// present, otherwise the point estimate.
    pub fn conservative(&self) -> Horizon {
        self.slower.unwrap_or(self.point)
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            point: self.point.scale(factor),
            faster: self.faster.map(|edge| edge.scale(factor)),
            slower: self.slower.map(|edge| edge.scale(factor)),
        }
    }
}

/// Solution for one target tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEstimate {
    pub level: TargetLevel,
    /// Absolute target performance.
    pub value: f64,
    pub generations: TimeToTarget,
    pub years: TimeToTarget,
}

/// Generations needed to reach `target`, with interval edges solved at
/// each rate bound.
pub fn generations_to_target(model: &Projection, rate: &RateEstimate, target: f64) -> TimeToTarget {
    let point = model.generations_to_reach(target);
    let Some((lower, upper)) = rate.bounds() else {
        return TimeToTarget {
            point,
            faster: None,
            slower: None,
        };
    };

    let a = model.with_rate(lower).generations_to_reach(target);
    let b = model.with_rate(upper).generations_to_reach(target);
    let (faster, slower) = if a.cmp_duration(b).is_le() { (a, b) } else { (b, a) };
    TimeToTarget {
        point,
        faster: Some(faster),
        slower: Some(slower),
    }
}

/// Solves one target value and converts the result to years.
pub fn solve_target(
    model: &Projection,
    rate: &RateEstimate,
    level: TargetLevel,
    value: f64,
    generation_time_years: f64,
) -> TargetEstimate {
    let generations = generations_to_target(model, rate, value);
    TargetEstimate {
        level,
        value,
        generations,
        years: generations.scale(generation_time_years),
    }
}

/// Solves every configured target tier of `project`, in ascending ambition.
pub fn solve_targets(
    project: &Project,
    model: &Projection,
    rate: &RateEstimate,
) -> Vec<TargetEstimate> {
    project
        .target
        .resolved_levels(project.w0)
        .into_iter()
        .map(|(level, value)| {
            solve_target(model, rate, level, value, project.generation_time_years)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generations_to_target, solve_target};
    use crate::engine::projection::{
        AdditiveModel, Horizon, MultiplicativeModel, Projection,
    };
    use crate::engine::rate::{RateEstimate, RateKind};
    use crate::model::project::{ImprovementDirection, TargetLevel};

    #[test]
    fn coral_example_takes_about_sixty_three_years() {
        let model = Projection::Additive(AdditiveModel {
            current: 30.2,
            rate: 0.2125,
            direction: ImprovementDirection::Increase,
        });
        let rate = RateEstimate::exact(RateKind::Linear, 0.2125);
        let estimate = solve_target(&model, &rate, TargetLevel::Sufficient, 57.0, 0.5);
        let years = estimate.years.point.finite().unwrap();
        assert!((years - 63.0588).abs() < 1e-3);
        assert!(estimate.years.faster.is_none());
    }

    #[test]
    fn interval_edges_are_solved_independently() {
        let rate = RateEstimate::bounded(RateKind::Relative, 0.05, 0.02, 0.08);
        let model = Projection::Multiplicative(MultiplicativeModel {
            current: 1.0,
            rate: 0.05,
            direction: ImprovementDirection::Increase,
        });
        let result = generations_to_target(&model, &rate, 2.0);
        let ln2 = std::f64::consts::LN_2;
        let close = |horizon: Option<Horizon>, expected: f64| {
            let value = horizon.and_then(Horizon::finite).unwrap();
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        };
        close(Some(result.point), ln2 / 0.05);
        close(result.faster, ln2 / 0.08);
        close(result.slower, ln2 / 0.02);
    }

    #[test]
    fn non_positive_lower_rate_makes_slower_edge_unreachable() {
        let rate = RateEstimate::bounded(RateKind::Linear, 0.5, -0.1, 1.1);
        let model = Projection::Additive(AdditiveModel {
            current: 10.0,
            rate: 0.5,
            direction: ImprovementDirection::Increase,
        });
        let result = generations_to_target(&model, &rate, 20.0);
        assert_eq!(result.point, Horizon::Finite(20.0));
        assert_eq!(result.slower, Some(Horizon::Unreachable));
        assert_eq!(result.conservative(), Horizon::Unreachable);
    }
}
