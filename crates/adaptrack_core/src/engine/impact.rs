//! Impact composite score.
//!
//! # Responsibility
//! - Combine five qualitative dimensions and the projected timeline into one
//!   0-10 priority score.
//!
//! # Invariants
//! - Qualitative inputs are clamped to [0, 10] before weighting.
//! - Timeline term: `10 * exp(-years / decay)`; immediate targets score 10,
//!   `Unreachable` scores 0.
//! - The total is clamped to [0, 10] and rounded to two decimals.

use super::options::ImpactWeights;
use super::projection::Horizon;
use crate::model::project::ImpactDimensions;
use serde::{Deserialize, Serialize};

const MAX_SCORE: f64 = 10.0;

/// Weighted contribution of each term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactComponents {
    pub ecological: f64,
    pub economic: f64,
    pub urgency: f64,
    pub timeline: f64,
    pub scalability: f64,
    pub technical_feasibility: f64,
}

impl ImpactComponents {
    fn total(&self) -> f64 {
        self.ecological
            + self.economic
            + self.urgency
            + self.timeline
            + self.scalability
            + self.technical_feasibility
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactScore {
    pub total: f64,
    pub components: ImpactComponents,
    /// Unweighted timeline term on the 0-10 scale.
    pub timeline_score: f64,
}

impl ImpactScore {
    pub fn priority(&self) -> ImpactPriority {
        ImpactPriority::from_score(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactPriority {
    Critical,
    High,
    Moderate,
    Lower,
}

impl ImpactPriority {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Critical
        } else if score >= 6.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Moderate
        } else {
            Self::Lower
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Lower => "lower",
        }
    }
}

/// Normalizes years-to-target onto 0-10.
///
/// Negative and NaN durations are treated as already met and unreachable
/// respectively.
pub fn timeline_score(years: Horizon, decay_years: f64) -> f64 {
    match years {
        Horizon::Finite(value) if value.is_nan() => 0.0,
        Horizon::Finite(value) => {
            let score = MAX_SCORE * (-value.max(0.0) / decay_years).exp();
            score.clamp(0.0, MAX_SCORE)
        }
        Horizon::Unreachable => 0.0,
    }
}

/// Computes the composite for one project.
pub fn impact_score(
    dimensions: &ImpactDimensions,
    years_to_target: Horizon,
    weights: &ImpactWeights,
) -> ImpactScore {
    let dims = dimensions.clamped();
    let timeline = timeline_score(years_to_target, weights.timeline_decay_years);
    let components = ImpactComponents {
        ecological: dims.ecological * weights.ecological,
        economic: dims.economic * weights.economic,
        urgency: dims.urgency * weights.urgency,
        timeline: timeline * weights.timeline,
        scalability: dims.scalability * weights.scalability,
        technical_feasibility: dims.technical_feasibility * weights.technical_feasibility,
    };
    let total = components.total().clamp(0.0, MAX_SCORE);
    ImpactScore {
        total: round2(total),
        components,
        timeline_score: timeline,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::{impact_score, timeline_score, ImpactPriority};
    use crate::engine::options::ImpactWeights;
    use crate::engine::projection::Horizon;
    use crate::model::project::ImpactDimensions;

    fn dims(value: f64) -> ImpactDimensions {
        ImpactDimensions {
            ecological: value,
            economic: value,
            urgency: value,
            technical_feasibility: value,
            scalability: value,
        }
    }

    #[test]
    fn timeline_is_ten_when_met_and_zero_when_unreachable() {
        assert_eq!(timeline_score(Horizon::Finite(0.0), 5.0), 10.0);
        assert_eq!(timeline_score(Horizon::Unreachable, 5.0), 0.0);
        assert!((timeline_score(Horizon::Finite(5.0), 5.0) - 10.0 / std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn maximal_inputs_score_ten() {
        let score = impact_score(&dims(10.0), Horizon::Finite(0.0), &ImpactWeights::default());
        assert_eq!(score.total, 10.0);
        assert_eq!(score.priority(), ImpactPriority::Critical);
    }

    #[test]
    fn unreachable_target_floors_timeline_term() {
        let score = impact_score(&dims(10.0), Horizon::Unreachable, &ImpactWeights::default());
        assert_eq!(score.components.timeline, 0.0);
        assert_eq!(score.total, 8.5);
    }

    #[test]
    fn out_of_range_dimensions_are_clamped() {
        let score = impact_score(&dims(50.0), Horizon::Unreachable, &ImpactWeights::default());
        assert_eq!(score.total, 8.5);
        let score = impact_score(&dims(-3.0), Horizon::Unreachable, &ImpactWeights::default());
        assert_eq!(score.total, 0.0);
    }

    #[test]
    fn priority_thresholds() {
        assert_eq!(ImpactPriority::from_score(6.0), ImpactPriority::High);
        assert_eq!(ImpactPriority::from_score(5.99), ImpactPriority::Moderate);
        assert_eq!(ImpactPriority::from_score(3.0), ImpactPriority::Lower);
    }
}
