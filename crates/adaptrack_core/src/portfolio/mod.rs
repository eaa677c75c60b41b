//! Portfolio aggregation over many projects.
//!
//! # Responsibility
//! - Evaluate each project independently with its own model variant.
//! - Produce status counts, a filtered and sorted row view, distribution
//!   statistics, a risk-matrix dataset and an impact ranking.
//!
//! # Invariants
//! - One project's failure is recorded per row and never aborts the batch.
//! - Summary counts cover every evaluated project; filters only shape the
//!   row view and the statistics derived from it.
//! - Evaluation order follows input order, and every sort is stable.

pub mod stats;

use crate::engine::evaluate::{evaluate_project, ProjectEvaluation};
use crate::engine::impact::ImpactPriority;
use crate::engine::options::EvaluationOptions;
use crate::engine::projection::Horizon;
use crate::engine::quality::{quality_stars, QualityBand};
use crate::engine::status::ProjectStatus;
use crate::model::project::{Environment, ModelKind, Project, ProjectId};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use stats::{distribution, histogram, Distribution, HistogramBucket};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Impact score, highest first.
    #[default]
    Impact,
    /// Point years-to-target, shortest first; unreachable rows last.
    YearsToTarget,
    /// Progress toward target, highest first.
    Progress,
    /// Quality score, highest first.
    Quality,
    /// Team name, alphabetical.
    TeamName,
}

/// View and budget controls for one aggregation run.
///
/// Empty filter sets match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioQuery {
    pub statuses: Vec<ProjectStatus>,
    pub quality_bands: Vec<QualityBand>,
    pub teams: Vec<String>,
    pub sort: SortKey,
    /// Input budget; projects beyond it are skipped before evaluation.
    pub max_projects: Option<usize>,
    pub histogram_buckets: usize,
}

impl Default for PortfolioQuery {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            quality_bands: Vec::new(),
            teams: Vec::new(),
            sort: SortKey::default(),
            max_projects: None,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

impl PortfolioQuery {
    fn matches(&self, row: &PortfolioRow) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&row.status))
            && (self.quality_bands.is_empty() || self.quality_bands.contains(&row.quality_band))
            && (self.teams.is_empty() || self.teams.iter().any(|team| team == &row.team_name))
    }
}

/// Flat, export-ready view of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    pub project_id: ProjectId,
    pub team_name: String,
    pub system_name: String,
    pub phenotype: String,
    pub status: ProjectStatus,
    pub quality_score: u8,
    pub quality_band: QualityBand,
    pub quality_stars: String,
    pub impact_score: f64,
    pub impact_priority: ImpactPriority,
    /// Point years to the sufficient target; `None` when unreachable.
    pub years_to_target: Option<f64>,
    /// Interval edges; `None` when no standard error was supplied.
    pub years_faster: Option<Horizon>,
    pub years_slower: Option<Horizon>,
    pub target_year: i32,
    pub progress_pct: f64,
    pub rate_per_generation: f64,
    pub rate_per_year: f64,
    pub model: ModelKind,
    pub environment: Environment,
}

impl PortfolioRow {
    pub fn from_evaluation(project: &Project, evaluation: &ProjectEvaluation) -> Self {
        let years = evaluation.primary.years;
        Self {
            project_id: project.project_id,
            team_name: project.team_name.clone(),
            system_name: project.system_name.clone(),
            phenotype: project.phenotype.clone(),
            status: evaluation.status,
            quality_score: evaluation.quality.score,
            quality_band: evaluation.quality.band,
            quality_stars: quality_stars(evaluation.quality.score),
            impact_score: evaluation.impact.total,
            impact_priority: evaluation.impact.priority(),
            years_to_target: years.point.finite(),
            years_faster: years.faster,
            years_slower: years.slower,
            target_year: project.target_date,
            progress_pct: evaluation.progress_pct,
            rate_per_generation: evaluation.rate.point,
            rate_per_year: evaluation.rate_per_year,
            model: evaluation.model,
            environment: project.environment,
        }
    }

    /// Risk-matrix label.
    pub fn label(&self) -> String {
        format!("{} / {}", self.team_name, self.system_name)
    }
}

/// Stage at which a project dropped out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Load,
    Evaluate,
}

/// Per-row failure record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// Raw stored identifier; may not be a valid UUID for load failures.
    pub project_id: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Projects offered to the run, including skipped and failed ones.
    pub total: usize,
    pub evaluated: usize,
    pub failed: usize,
    /// Projects dropped by the `max_projects` budget.
    pub skipped: usize,
    pub by_status: BTreeMap<ProjectStatus, usize>,
    /// Share of evaluated projects per status, in percent.
    pub share_pct: BTreeMap<ProjectStatus, f64>,
}

impl PortfolioSummary {
    fn from_rows(total: usize, skipped: usize, failed: usize, rows: &[PortfolioRow]) -> Self {
        let mut by_status: BTreeMap<ProjectStatus, usize> =
            ProjectStatus::ALL.iter().map(|status| (*status, 0)).collect();
        for row in rows {
            *by_status.entry(row.status).or_insert(0) += 1;
        }
        let evaluated = rows.len();
        let share_pct = by_status
            .iter()
            .map(|(status, count)| {
                let share = if evaluated == 0 {
                    0.0
                } else {
                    *count as f64 / evaluated as f64 * 100.0
                };
                (*status, share)
            })
            .collect();
        Self {
            total,
            evaluated,
            failed,
            skipped,
            by_status,
            share_pct,
        }
    }

    pub fn count(&self, status: ProjectStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Per-year rate spread within one model family.
///
/// Linear, log-scale and approach rates are different units, so rates are
/// never pooled across families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStatistics {
    pub model: ModelKind,
    pub distribution: Distribution,
    pub histogram: Vec<HistogramBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// One entry per model family present in the rows, in `ModelKind::ALL` order.
    pub rate_by_model: Vec<RateStatistics>,
    pub quality: Option<Distribution>,
    pub impact: Option<Distribution>,
    pub quality_histogram: Vec<HistogramBucket>,
    pub impact_histogram: Vec<HistogramBucket>,
}

impl PortfolioStatistics {
    pub fn from_rows(rows: &[PortfolioRow], buckets: usize) -> Self {
        let rate_by_model = ModelKind::ALL
            .into_iter()
            .filter_map(|model| {
                let rates: Vec<f64> = rows
                    .iter()
                    .filter(|row| row.model == model)
                    .map(|row| row.rate_per_year)
                    .collect();
                distribution(&rates).map(|distribution| RateStatistics {
                    model,
                    distribution,
                    histogram: histogram(&rates, buckets),
                })
            })
            .collect();
        let quality: Vec<f64> = rows.iter().map(|row| f64::from(row.quality_score)).collect();
        let impact: Vec<f64> = rows.iter().map(|row| row.impact_score).collect();
        Self {
            rate_by_model,
            quality: distribution(&quality),
            impact: distribution(&impact),
            quality_histogram: histogram(&quality, buckets),
            impact_histogram: histogram(&impact, buckets),
        }
    }

    pub fn rate(&self, model: ModelKind) -> Option<&RateStatistics> {
        self.rate_by_model.iter().find(|entry| entry.model == model)
    }
}

/// Risk-matrix point. Consumers place `None` years at their own cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub project_id: ProjectId,
    pub label: String,
    pub impact: f64,
    pub years_to_target: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRank {
    pub project_id: ProjectId,
    /// 1-based; ties keep input order.
    pub rank: usize,
    pub impact_score: f64,
    pub percentile: f64,
}

/// Full aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub summary: PortfolioSummary,
    /// Filtered and sorted view.
    pub rows: Vec<PortfolioRow>,
    pub failures: Vec<RowFailure>,
    pub statistics: PortfolioStatistics,
    pub scatter: Vec<ScatterPoint>,
    pub ranking: Vec<ImpactRank>,
}

impl PortfolioReport {
    /// Folds failures found before evaluation (e.g. unreadable stored rows)
    /// into the report.
    pub fn record_failures(&mut self, failures: Vec<RowFailure>) {
        for failure in &failures {
            log_failure(failure);
        }
        self.summary.total += failures.len();
        self.summary.failed += failures.len();
        self.failures.extend(failures);
    }
}

/// Evaluates and aggregates a collection of projects.
pub fn aggregate(
    projects: &[Project],
    query: &PortfolioQuery,
    options: &EvaluationOptions,
) -> PortfolioReport {
    let budget = query.max_projects.unwrap_or(projects.len()).min(projects.len());
    let skipped = projects.len() - budget;
    info!(
        "event=portfolio_aggregate module=portfolio status=start total={} budget={} skipped={}",
        projects.len(),
        budget,
        skipped
    );

    let mut evaluated = Vec::with_capacity(budget);
    let mut failures = Vec::new();
    for project in &projects[..budget] {
        match evaluate_project(project, options) {
            Ok(evaluation) => evaluated.push(PortfolioRow::from_evaluation(project, &evaluation)),
            Err(err) => {
                let failure = RowFailure {
                    project_id: project.project_id.to_string(),
                    stage: FailureStage::Evaluate,
                    message: err.to_string(),
                };
                log_failure(&failure);
                failures.push(failure);
            }
        }
    }

    let summary = PortfolioSummary::from_rows(projects.len(), skipped, failures.len(), &evaluated);
    let rows = select_rows(evaluated, query);
    let statistics = PortfolioStatistics::from_rows(&rows, query.histogram_buckets);
    let scatter = scatter_points(&rows);
    let ranking = rank_by_impact(&rows);

    info!(
        "event=portfolio_aggregate module=portfolio status={} evaluated={} failed={} rows={}",
        if summary.failed == 0 { "ok" } else { "degraded" },
        summary.evaluated,
        summary.failed,
        rows.len()
    );

    PortfolioReport {
        summary,
        rows,
        failures,
        statistics,
        scatter,
        ranking,
    }
}

/// Applies the query's filters, then its sort.
pub fn select_rows(rows: Vec<PortfolioRow>, query: &PortfolioQuery) -> Vec<PortfolioRow> {
    let mut selected: Vec<PortfolioRow> = rows.into_iter().filter(|row| query.matches(row)).collect();
    sort_rows(&mut selected, query.sort);
    selected
}

/// Stable sort by `key`.
pub fn sort_rows(rows: &mut [PortfolioRow], key: SortKey) {
    match key {
        SortKey::Impact => rows.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score)),
        SortKey::YearsToTarget => {
            rows.sort_by(|a, b| cmp_years(a.years_to_target, b.years_to_target))
        }
        SortKey::Progress => rows.sort_by(|a, b| b.progress_pct.total_cmp(&a.progress_pct)),
        SortKey::Quality => rows.sort_by(|a, b| b.quality_score.cmp(&a.quality_score)),
        SortKey::TeamName => rows.sort_by(|a, b| a.team_name.cmp(&b.team_name)),
    }
}

fn cmp_years(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn scatter_points(rows: &[PortfolioRow]) -> Vec<ScatterPoint> {
    rows.iter()
        .map(|row| ScatterPoint {
            project_id: row.project_id,
            label: row.label(),
            impact: row.impact_score,
            years_to_target: row.years_to_target,
        })
        .collect()
}

/// Ranks rows by impact, highest first.
///
/// Percentile is `(1 - (rank - 1) / n) * 100`, so the top row scores 100.
pub fn rank_by_impact(rows: &[PortfolioRow]) -> Vec<ImpactRank> {
    let mut order: Vec<&PortfolioRow> = rows.iter().collect();
    order.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
    let n = order.len() as f64;
    order
        .into_iter()
        .enumerate()
        .map(|(index, row)| ImpactRank {
            project_id: row.project_id,
            rank: index + 1,
            impact_score: row.impact_score,
            percentile: (1.0 - index as f64 / n) * 100.0,
        })
        .collect()
}

fn log_failure(failure: &RowFailure) {
    warn!(
        "event=portfolio_row module=portfolio status=error project_id={} stage={:?} error={}",
        failure.project_id, failure.stage, failure.message
    );
}

#[cfg(test)]
mod tests {
    use super::{cmp_years, rank_by_impact, sort_rows, PortfolioQuery, PortfolioRow, SortKey};
    use crate::engine::impact::ImpactPriority;
    use crate::engine::quality::QualityBand;
    use crate::engine::status::ProjectStatus;
    use crate::model::project::{Environment, ModelKind};
    use std::cmp::Ordering;
    use uuid::Uuid;

    fn row(team: &str, impact: f64, years: Option<f64>) -> PortfolioRow {
        PortfolioRow {
            project_id: Uuid::new_v4(),
            team_name: team.to_string(),
            system_name: "system".to_string(),
            phenotype: String::new(),
            status: ProjectStatus::OnTrack,
            quality_score: 3,
            quality_band: QualityBand::Moderate,
            quality_stars: "★★★☆☆".to_string(),
            impact_score: impact,
            impact_priority: ImpactPriority::from_score(impact),
            years_to_target: years,
            years_faster: None,
            years_slower: None,
            target_year: 2040,
            progress_pct: 10.0,
            rate_per_generation: 0.1,
            rate_per_year: 0.2,
            model: ModelKind::Additive,
            environment: Environment::Field,
        }
    }

    #[test]
    fn unreachable_years_sort_last() {
        assert_eq!(cmp_years(None, Some(1e9)), Ordering::Greater);
        let mut rows = vec![row("a", 5.0, None), row("b", 5.0, Some(30.0)), row("c", 5.0, Some(3.0))];
        sort_rows(&mut rows, SortKey::YearsToTarget);
        let teams: Vec<&str> = rows.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(teams, ["c", "b", "a"]);
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let rows = vec![row("a", 4.0, None), row("b", 7.0, None), row("c", 4.0, None)];
        let ranking = rank_by_impact(&rows);
        assert_eq!(ranking[0].project_id, rows[1].project_id);
        assert_eq!(ranking[1].project_id, rows[0].project_id);
        assert_eq!(ranking[2].project_id, rows[2].project_id);
        assert_eq!(ranking[0].percentile, 100.0);
        assert!((ranking[2].percentile - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = PortfolioQuery::default();
        assert!(query.matches(&row("a", 1.0, None)));
        let query = PortfolioQuery {
            teams: vec!["b".to_string()],
            ..PortfolioQuery::default()
        };
        assert!(!query.matches(&row("a", 1.0, None)));
    }
}
