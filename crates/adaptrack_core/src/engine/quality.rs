//! Data-quality rubric.
//!
//! # Responsibility
//! - Score experimental rigor 0-5, one point per satisfied predicate.
//! - Explain the score and emit levelled advisories for presentation.
//!
//! # Invariants
//! - The score is exactly the number of passed findings; there are no
//!   partial points.

use crate::model::project::{Environment, Project};
use serde::{Deserialize, Serialize};

const LARGE_SAMPLE: u32 = 100;
const MODERATE_SAMPLE: u32 = 30;
const SUFFICIENT_GENERATIONS: f64 = 5.0;
const MODERATE_GENERATIONS: f64 = 3.0;
const LONG_OBSERVATION_GENERATIONS: f64 = 10.0;
pub const MAX_QUALITY_SCORE: u8 = 5;

/// Experimental-context fields the rubric reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityInputs {
    pub sample_size: u32,
    pub generations_observed: f64,
    pub environment: Environment,
    pub dw_se: f64,
    pub replicated: bool,
}

impl QualityInputs {
    pub fn from_project(project: &Project) -> Self {
        Self {
            sample_size: project.sample_size,
            generations_observed: project.generations_observed,
            environment: project.environment,
            dw_se: project.dw_se,
            replicated: project.replicated,
        }
    }
}

/// Confidence band derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    /// Score 4-5.
    High,
    /// Score 2-3.
    Moderate,
    /// Score 0-1.
    Preliminary,
}

impl QualityBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            4..=u8::MAX => Self::High,
            2..=3 => Self::Moderate,
            _ => Self::Preliminary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Preliminary => "preliminary",
        }
    }
}

/// Five-slot star rendering, e.g. `★★★☆☆`.
pub fn quality_stars(score: u8) -> String {
    let filled = usize::from(score.min(MAX_QUALITY_SCORE));
    let empty = usize::from(MAX_QUALITY_SCORE) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCriterion {
    SampleSize,
    ObservationLength,
    Environment,
    Uncertainty,
    Replication,
}

/// Graded outcome of one criterion; only `Met` earns a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionTier {
    Met,
    /// Short of the threshold but above the weak range.
    Partial,
    Unmet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFinding {
    pub criterion: QualityCriterion,
    pub tier: CriterionTier,
    pub note: String,
}

impl QualityFinding {
    pub fn passed(&self) -> bool {
        self.tier == CriterionTier::Met
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: u8,
    pub band: QualityBand,
    pub findings: Vec<QualityFinding>,
}

/// Rubric score only.
pub fn quality_score(inputs: &QualityInputs) -> u8 {
    assess_quality(inputs).score
}

/// Evaluates every rubric criterion.
pub fn assess_quality(inputs: &QualityInputs) -> QualityAssessment {
    let sample = if inputs.sample_size >= LARGE_SAMPLE {
        finding(QualityCriterion::SampleSize, CriterionTier::Met, "large sample size (n>=100)")
    } else if inputs.sample_size >= MODERATE_SAMPLE {
        finding(QualityCriterion::SampleSize, CriterionTier::Partial, "moderate sample size (n>=30)")
    } else {
        finding(QualityCriterion::SampleSize, CriterionTier::Unmet, "small sample size (n<30)")
    };

    let generations = inputs.generations_observed;
    let observation = if generations >= SUFFICIENT_GENERATIONS {
        finding(
            QualityCriterion::ObservationLength,
            CriterionTier::Met,
            "sufficient generations observed (>=5)",
        )
    } else if generations >= MODERATE_GENERATIONS {
        finding(
            QualityCriterion::ObservationLength,
            CriterionTier::Partial,
            "moderate observation period (3-4 generations)",
        )
    } else {
        finding(
            QualityCriterion::ObservationLength,
            CriterionTier::Unmet,
            "few generations observed (<3)",
        )
    };

    let environment = if inputs.environment.is_realistic() {
        finding(
            QualityCriterion::Environment,
            CriterionTier::Met,
            format!("realistic environment ({})", inputs.environment.as_str()),
        )
    } else {
        finding(
            QualityCriterion::Environment,
            CriterionTier::Unmet,
            format!("{} environment (limited realism)", inputs.environment.as_str()),
        )
    };

    let uncertainty = if inputs.dw_se > 0.0 {
        finding(QualityCriterion::Uncertainty, CriterionTier::Met, "uncertainty quantified")
    } else {
        finding(QualityCriterion::Uncertainty, CriterionTier::Unmet, "no uncertainty estimate")
    };

    let replication = if inputs.replicated {
        finding(QualityCriterion::Replication, CriterionTier::Met, "replicated measurements")
    } else {
        finding(QualityCriterion::Replication, CriterionTier::Unmet, "no replication")
    };

    let findings = vec![sample, observation, environment, uncertainty, replication];
    let score = findings.iter().filter(|f| f.passed()).count() as u8;
    QualityAssessment {
        score,
        band: QualityBand::from_score(score),
        findings,
    }
}

fn finding(criterion: QualityCriterion, tier: CriterionTier, note: impl Into<String>) -> QualityFinding {
    QualityFinding {
        criterion,
        tier,
        note: note.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryLevel {
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub level: AdvisoryLevel,
    pub message: String,
}

/// Actionable advisories for the given context and score.
pub fn recommendations(inputs: &QualityInputs, score: u8) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    let generations = inputs.generations_observed;
    let mut push = |level, message: String| advisories.push(Advisory { level, message });

    if inputs.sample_size < MODERATE_SAMPLE {
        push(
            AdvisoryLevel::Error,
            format!(
                "sample size is very small (n={}); increase to at least {LARGE_SAMPLE} for reliable estimates",
                inputs.sample_size
            ),
        );
    }
    if generations < MODERATE_GENERATIONS {
        push(
            AdvisoryLevel::Error,
            format!("only {generations:.1} generations observed; early trends may not be reliable"),
        );
    }
    if inputs.dw_se == 0.0 {
        push(
            AdvisoryLevel::Warning,
            "no uncertainty estimate; provide a standard error for confidence intervals".to_string(),
        );
    }
    if inputs.environment == Environment::Lab {
        push(
            AdvisoryLevel::Warning,
            "lab-only environment; consider field validation".to_string(),
        );
    }
    if (MODERATE_GENERATIONS..SUFFICIENT_GENERATIONS).contains(&generations) {
        push(
            AdvisoryLevel::Info,
            format!("{generations:.1} generations observed; continue to 5+ for higher confidence"),
        );
    }
    if generations >= LONG_OBSERVATION_GENERATIONS {
        push(
            AdvisoryLevel::Info,
            format!("long observation period ({generations:.1} generations); adaptation may be slowing, re-assess the rate"),
        );
    }
    if score >= 4 {
        push(
            AdvisoryLevel::Success,
            "data quality is high; projections are well supported".to_string(),
        );
    }
    advisories
}

#[cfg(test)]
mod tests {
    use super::{
        assess_quality, quality_score, quality_stars, recommendations, AdvisoryLevel,
        CriterionTier, QualityBand, QualityInputs,
    };
    use crate::model::project::Environment;

    fn inputs(
        sample_size: u32,
        generations_observed: f64,
        environment: Environment,
        dw_se: f64,
        replicated: bool,
    ) -> QualityInputs {
        QualityInputs {
            sample_size,
            generations_observed,
            environment,
            dw_se,
            replicated,
        }
    }

    #[test]
    fn full_rubric_scores_five() {
        let assessment = assess_quality(&inputs(150, 6.0, Environment::Field, 0.3, true));
        assert_eq!(assessment.score, 5);
        assert_eq!(assessment.band, QualityBand::High);
    }

    #[test]
    fn empty_rubric_scores_zero() {
        let score = quality_score(&inputs(20, 2.0, Environment::Lab, 0.0, false));
        assert_eq!(score, 0);
        assert_eq!(QualityBand::from_score(score), QualityBand::Preliminary);
    }

    #[test]
    fn partial_tiers_earn_no_points() {
        let assessment = assess_quality(&inputs(99, 4.9, Environment::Greenhouse, 0.0, true));
        assert_eq!(assessment.score, 1);
        assert_eq!(assessment.findings[0].tier, CriterionTier::Partial);
        assert_eq!(assessment.findings[1].tier, CriterionTier::Partial);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(quality_score(&inputs(100, 5.0, Environment::Mixed, 0.0, false)), 3);
    }

    #[test]
    fn bands_split_at_two_and_four() {
        assert_eq!(QualityBand::from_score(1), QualityBand::Preliminary);
        assert_eq!(QualityBand::from_score(2), QualityBand::Moderate);
        assert_eq!(QualityBand::from_score(3), QualityBand::Moderate);
        assert_eq!(QualityBand::from_score(4), QualityBand::High);
    }

    #[test]
    fn stars_render_five_slots() {
        assert_eq!(quality_stars(3), "★★★☆☆");
        assert_eq!(quality_stars(0), "☆☆☆☆☆");
    }

    #[test]
    fn weak_context_raises_errors_and_warnings() {
        let weak = inputs(10, 1.0, Environment::Lab, 0.0, false);
        let advisories = recommendations(&weak, 0);
        let errors = advisories
            .iter()
            .filter(|a| a.level == AdvisoryLevel::Error)
            .count();
        assert_eq!(errors, 2);
        assert!(advisories.iter().all(|a| a.level != AdvisoryLevel::Success));
    }

    #[test]
    fn strong_context_reports_success_and_long_window_note() {
        let strong = inputs(200, 12.0, Environment::Field, 0.2, true);
        let advisories = recommendations(&strong, 5);
        assert!(advisories.iter().any(|a| a.level == AdvisoryLevel::Success));
        assert!(advisories.iter().any(|a| a.message.contains("slowing")));
    }
}
