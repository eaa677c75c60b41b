//! Explicit evaluation parameters.
//!
//! # Responsibility
//! - Carry every tunable the engine depends on as a value passed in by the
//!   caller; no engine function reads a clock, environment or global.

use super::error::{EngineResult, InvalidInput};
use serde::{Deserialize, Serialize};

const CONFIDENCE_TOLERANCE: f64 = 1e-6;

/// Two-sided confidence level used for rate and time-to-target intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "0.80")]
    P80,
    #[serde(rename = "0.90")]
    P90,
    #[default]
    #[serde(rename = "0.95")]
    P95,
}

impl ConfidenceLevel {
    /// Maps a probability (0.80, 0.90 or 0.95) to a level.
    pub fn from_probability(value: f64) -> EngineResult<Self> {
        [Self::P80, Self::P90, Self::P95]
            .into_iter()
            .find(|level| (level.probability() - value).abs() < CONFIDENCE_TOLERANCE)
            .ok_or_else(|| InvalidInput::UnsupportedConfidence(value).into())
    }

    pub fn probability(self) -> f64 {
        match self {
            Self::P80 => 0.80,
            Self::P90 => 0.90,
            Self::P95 => 0.95,
        }
    }

    /// Two-sided normal quantile.
    pub fn z_score(self) -> f64 {
        match self {
            Self::P80 => 1.282,
            Self::P90 => 1.645,
            Self::P95 => 1.96,
        }
    }
}

/// Weights of the impact composite plus the timeline normalization constant.
///
/// The five qualitative weights and the timeline weight are expected to sum
/// to 1.0 so that a project maxing every term scores 10.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactWeights {
    pub ecological: f64,
    pub economic: f64,
    pub urgency: f64,
    pub timeline: f64,
    pub scalability: f64,
    pub technical_feasibility: f64,
    /// e-folding time (years) of the timeline term `10 * exp(-years / decay)`.
    pub timeline_decay_years: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            ecological: 0.25,
            economic: 0.25,
            urgency: 0.20,
            timeline: 0.15,
            scalability: 0.10,
            technical_feasibility: 0.05,
            timeline_decay_years: 5.0,
        }
    }
}

/// Per-evaluation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOptions {
    pub confidence: ConfidenceLevel,
    /// Trajectory length in generations (offsets `0..=horizon`).
    pub horizon_generations: u32,
    /// Calendar year treated as "now" for target-date comparisons.
    pub current_year: i32,
    pub impact: ImpactWeights,
}

impl EvaluationOptions {
    /// Options with default confidence (0.95), a 50-generation horizon and
    /// default impact weights.
    pub fn for_year(current_year: i32) -> Self {
        Self {
            confidence: ConfidenceLevel::default(),
            horizon_generations: 50,
            current_year,
            impact: ImpactWeights::default(),
        }
    }
}
