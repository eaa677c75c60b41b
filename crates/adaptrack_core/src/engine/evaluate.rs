//! Per-project evaluation pipeline.
//!
//! # Responsibility
//! - Run rate estimation, projection and time-to-target in sequence, then
//!   derive quality, impact and status from the result.
//!
//! # Invariants
//! - Fails fast on invalid input; never returns a partially filled bundle.
//! - Nothing here is cached; every call recomputes from the record.

use super::error::EngineResult;
use super::impact::{impact_score, ImpactScore};
use super::options::EvaluationOptions;
use super::projection::Projection;
use super::quality::{assess_quality, recommendations, Advisory, QualityAssessment, QualityInputs};
use super::rate::{estimate_for_project, RateEstimate};
use super::status::{classify, ProjectStatus, StatusInputs};
use super::target::{solve_target, solve_targets, TargetEstimate};
use super::trajectory::{trajectory, TrajectoryPoint};
use crate::model::project::{ModelKind, Project, ProjectId, TargetLevel};
use log::debug;
use serde::{Deserialize, Serialize};

/// Derived bundle for one project. Never persisted as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    pub project_id: ProjectId,
    pub model: ModelKind,
    pub rate: RateEstimate,
    pub rate_per_year: f64,
    /// Sufficient (primary) target solution.
    pub primary: TargetEstimate,
    /// Every configured tier, ascending ambition.
    pub targets: Vec<TargetEstimate>,
    pub trajectory: Vec<TrajectoryPoint>,
    pub quality: QualityAssessment,
    pub advisories: Vec<Advisory>,
    pub impact: ImpactScore,
    pub status: ProjectStatus,
    /// Percent of the baseline-to-target gap covered so far.
    pub progress_pct: f64,
}

impl ProjectEvaluation {
    pub fn target(&self, level: TargetLevel) -> Option<&TargetEstimate> {
        self.targets.iter().find(|estimate| estimate.level == level)
    }
}

/// Evaluates one project.
///
/// # Errors
/// - `EngineError::InvalidInput` when the record fails validation or the
///   selected model cannot be built from it.
pub fn evaluate_project(
    project: &Project,
    options: &EvaluationOptions,
) -> EngineResult<ProjectEvaluation> {
    project.validate()?;

    let rate = estimate_for_project(project, options.confidence)?;
    let model = Projection::for_project(project, rate.point)?;

    let targets = solve_targets(project, &model, &rate);
    let primary = match targets
        .iter()
        .find(|estimate| estimate.level == TargetLevel::Sufficient)
    {
        Some(estimate) => *estimate,
        None => solve_target(
            &model,
            &rate,
            TargetLevel::Sufficient,
            project.primary_target(),
            project.generation_time_years,
        ),
    };
    let w_target = primary.value;

    let quality_inputs = QualityInputs::from_project(project);
    let quality = assess_quality(&quality_inputs);
    let advisories = recommendations(&quality_inputs, quality.score);

    let impact = impact_score(&project.impact, primary.years.point, &options.impact);
    let status = classify(&StatusInputs {
        progress_rate: rate.progress_rate(project.improvement_direction),
        years_to_target: primary.years.conservative(),
        target_year: project.target_date,
        current_year: options.current_year,
        quality: quality.band,
    });

    let points = trajectory(
        &model,
        &rate,
        options.horizon_generations,
        project.generation_time_years,
    );

    debug!(
        "event=project_evaluate module=engine status=ok project_id={} model={} project_status={} quality={} impact={:.2}",
        project.project_id,
        project.model.kind.as_str(),
        status.as_str(),
        quality.score,
        impact.total
    );

    Ok(ProjectEvaluation {
        project_id: project.project_id,
        model: project.model.kind,
        rate_per_year: rate.point_per_year(project.generation_time_years),
        rate,
        primary,
        targets,
        trajectory: points,
        quality,
        advisories,
        impact,
        status,
        progress_pct: progress_pct(project.w0, project.w_current, w_target),
    })
}

fn progress_pct(w0: f64, w_current: f64, w_target: f64) -> f64 {
    let span = w_target - w0;
    if span == 0.0 {
        return 0.0;
    }
    (w_current - w0) / span * 100.0
}

#[cfg(test)]
mod tests {
    use super::{evaluate_project, progress_pct};
    use crate::engine::error::{EngineError, InvalidInput};
    use crate::engine::options::EvaluationOptions;
    use crate::engine::status::ProjectStatus;
    use crate::model::project::{ModelKind, ModelSpec, Project, TargetLevel, TargetSpec};

    fn coral() -> Project {
        let mut project = Project::new("Oxford Marine Lab", "Coral", 2022);
        project.w0 = 28.5;
        project.w_current = 30.2;
        project.generations_observed = 8.0;
        project.generation_time_years = 0.5;
        project.target = TargetSpec::fold(2.0);
        project.target_date = 2100;
        project
    }

    #[test]
    fn progress_is_share_of_gap() {
        assert_eq!(progress_pct(10.0, 15.0, 20.0), 50.0);
        assert_eq!(progress_pct(10.0, 15.0, 10.0), 0.0);
    }

    #[test]
    fn logistic_without_plateau_fails_fast() {
        let mut project = coral();
        project.model = ModelSpec {
            kind: ModelKind::Logistic,
            plateau: None,
            approach_rate: None,
        };
        let err = evaluate_project(&project, &EvaluationOptions::for_year(2025)).unwrap_err();
        assert_eq!(err, EngineError::InvalidInput(InvalidInput::MissingPlateau));
    }

    #[test]
    fn regressing_project_is_at_risk_with_unreachable_target() {
        let mut project = coral();
        project.w_current = 28.0;
        project.sample_size = 500;
        project.replicated = true;
        let evaluation = evaluate_project(&project, &EvaluationOptions::for_year(2025)).unwrap();
        assert_eq!(evaluation.status, ProjectStatus::AtRisk);
        assert!(!evaluation.primary.years.point.is_reachable());
    }

    #[test]
    fn primary_is_the_sufficient_tier() {
        let mut project = coral();
        project.dw_se = 0.3;
        project.target = TargetSpec {
            minimum_viable: Some(1.5),
            stretch: Some(2.5),
            ..TargetSpec::fold(2.0)
        };
        let evaluation = evaluate_project(&project, &EvaluationOptions::for_year(2025)).unwrap();
        assert_eq!(evaluation.targets.len(), 3);
        assert_eq!(
            Some(&evaluation.primary),
            evaluation.target(TargetLevel::Sufficient)
        );
        assert_eq!(evaluation.primary.value, project.primary_target());
    }

    #[test]
    fn trajectory_has_horizon_plus_one_points() {
        let mut options = EvaluationOptions::for_year(2025);
        options.horizon_generations = 12;
        let evaluation = evaluate_project(&coral(), &options).unwrap();
        assert_eq!(evaluation.trajectory.len(), 13);
        assert_eq!(evaluation.trajectory[0].value, 30.2);
    }
}
