//! Project domain model.
//!
//! # Responsibility
//! - Define the canonical adaptation-project record exchanged with storage
//!   and presentation collaborators.
//! - Own record-level invariants (`Project::validate`).
//!
//! # Invariants
//! - `project_id` is stable and never nil.
//! - `w0` and `w_current` are finite; generation counts and generation time
//!   are strictly positive.
//! - Every resolved target level lies beyond `w0` in the improvement
//!   direction, ordered minimum-viable, sufficient, stretch.
//! - Derived values (rates, trajectories, scores, status) are never stored
//!   on the record.
//!
//! # See also
//! - `crate::engine` for everything computed from a project.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every project record.
pub type ProjectId = Uuid;

static CONTACT_EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Direction in which the tracked trait counts as improving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementDirection {
    /// Larger performance values are better (heat tolerance, yield).
    #[default]
    Increase,
    /// Smaller performance values are better (mortality, infection load).
    Decrease,
}

impl ImprovementDirection {
    /// `+1.0` for `Increase`, `-1.0` for `Decrease`.
    pub fn sign(self) -> f64 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }

    /// Returns whether `value` lies strictly past `reference` in this direction.
    pub fn is_beyond(self, value: f64, reference: f64) -> bool {
        (value - reference) * self.sign() > 0.0
    }
}

/// Experimental setting the observations were made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Lab,
    Greenhouse,
    Field,
    Mixed,
}

impl Environment {
    /// Field and mixed settings count as realistic for data quality.
    pub fn is_realistic(self) -> bool {
        matches!(self, Self::Field | Self::Mixed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lab => "lab",
            Self::Greenhouse => "greenhouse",
            Self::Field => "field",
            Self::Mixed => "mixed",
        }
    }
}

/// How selection pressure is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Artificial,
    Natural,
    AssistedGeneFlow,
    Other,
}

/// How `TargetSpec` values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Multiple of baseline performance `w0`.
    Fold,
    /// Absolute performance value.
    Absolute,
}

/// Named target tiers evaluated independently by the time-to-target solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLevel {
    MinimumViable,
    /// The primary target; drives status and impact.
    Sufficient,
    Stretch,
}

impl TargetLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MinimumViable => "minimum_viable",
            Self::Sufficient => "sufficient",
            Self::Stretch => "stretch",
        }
    }
}

/// Target definition; all tiers share one `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub kind: TargetKind,
    /// Sufficient (primary) target, fold or absolute.
    pub value: f64,
    #[serde(default)]
    pub minimum_viable: Option<f64>,
    #[serde(default)]
    pub stretch: Option<f64>,
}

impl TargetSpec {
    pub fn fold(value: f64) -> Self {
        Self {
            kind: TargetKind::Fold,
            value,
            minimum_viable: None,
            stretch: None,
        }
    }

    pub fn absolute(value: f64) -> Self {
        Self {
            kind: TargetKind::Absolute,
            value,
            minimum_viable: None,
            stretch: None,
        }
    }

    /// Raw configured value for `level`, if that tier is set.
    pub fn raw(&self, level: TargetLevel) -> Option<f64> {
        match level {
            TargetLevel::MinimumViable => self.minimum_viable,
            TargetLevel::Sufficient => Some(self.value),
            TargetLevel::Stretch => self.stretch,
        }
    }

    /// Resolves `level` to an absolute performance value against `w0`.
    pub fn resolve(&self, level: TargetLevel, w0: f64) -> Option<f64> {
        self.raw(level).map(|value| match self.kind {
            TargetKind::Fold => value * w0,
            TargetKind::Absolute => value,
        })
    }

    /// Resolved tiers in ascending ambition; absent tiers are skipped.
    pub fn resolved_levels(&self, w0: f64) -> Vec<(TargetLevel, f64)> {
        [
            TargetLevel::MinimumViable,
            TargetLevel::Sufficient,
            TargetLevel::Stretch,
        ]
        .into_iter()
        .filter_map(|level| self.resolve(level, w0).map(|value| (level, value)))
        .collect()
    }
}

/// Projection model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Additive,
    Multiplicative,
    Logistic,
}

impl ModelKind {
    pub const ALL: [Self; 3] = [Self::Additive, Self::Multiplicative, Self::Logistic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Multiplicative => "multiplicative",
            Self::Logistic => "logistic",
        }
    }
}

/// Model selector plus model-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub kind: ModelKind,
    /// `W_max`; required by `Logistic`, ignored otherwise.
    #[serde(default)]
    pub plateau: Option<f64>,
    /// Directly supplied logistic approach rate per generation. When `None`
    /// the rate is derived from the observed change.
    #[serde(default)]
    pub approach_rate: Option<f64>,
}

impl ModelSpec {
    pub fn additive() -> Self {
        Self {
            kind: ModelKind::Additive,
            plateau: None,
            approach_rate: None,
        }
    }

    pub fn multiplicative() -> Self {
        Self {
            kind: ModelKind::Multiplicative,
            plateau: None,
            approach_rate: None,
        }
    }

    pub fn logistic(plateau: f64) -> Self {
        Self {
            kind: ModelKind::Logistic,
            plateau: Some(plateau),
            approach_rate: None,
        }
    }
}

/// Qualitative value dimensions, each on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactDimensions {
    pub ecological: f64,
    pub economic: f64,
    pub urgency: f64,
    pub technical_feasibility: f64,
    pub scalability: f64,
}

impl Default for ImpactDimensions {
    fn default() -> Self {
        Self {
            ecological: 5.0,
            economic: 5.0,
            urgency: 5.0,
            technical_feasibility: 5.0,
            scalability: 5.0,
        }
    }
}

impl ImpactDimensions {
    /// Copy with every dimension clamped into `[0, 10]`.
    pub fn clamped(&self) -> Self {
        Self {
            ecological: clamp_score(self.ecological),
            economic: clamp_score(self.economic),
            urgency: clamp_score(self.urgency),
            technical_feasibility: clamp_score(self.technical_feasibility),
            scalability: clamp_score(self.scalability),
        }
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("ecological", self.ecological),
            ("economic", self.economic),
            ("urgency", self.urgency),
            ("technical_feasibility", self.technical_feasibility),
            ("scalability", self.scalability),
        ]
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 10.0)
}

/// Canonical persisted adaptation project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub team_name: String,
    pub system_name: String,
    pub phenotype: String,
    #[serde(default)]
    pub stress_scenario: String,
    pub program_year: i32,

    /// Baseline performance `W0`.
    pub w0: f64,
    /// Most recent performance measurement.
    pub w_current: f64,
    #[serde(default)]
    pub performance_units: String,
    /// Generations elapsed between baseline and current (`t_gen`).
    pub generations_observed: f64,
    pub generation_time_years: f64,
    #[serde(default)]
    pub improvement_direction: ImprovementDirection,

    pub target: TargetSpec,
    /// Calendar year by which the sufficient target should be met.
    pub target_date: i32,

    pub sample_size: u32,
    pub environment: Environment,
    pub selection_method: SelectionMethod,
    /// Standard error of the observed change; `0.0` means not provided.
    #[serde(default)]
    pub dw_se: f64,
    /// Multiple independent measurements exist.
    #[serde(default)]
    pub replicated: bool,
    #[serde(default)]
    pub observation_start: String,
    #[serde(default)]
    pub observation_end: String,

    pub impact: ImpactDimensions,
    pub model: ModelSpec,

    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub notes: String,
    /// Unix epoch milliseconds, stamped by the storage layer.
    #[serde(default)]
    pub last_updated_ms: i64,
}

impl Project {
    /// Creates a project with a generated stable ID and neutral defaults.
    ///
    /// Defaults: `w0 = w_current = 1.0`, one generation observed at one year
    /// per generation, a 2-fold target ten years after `program_year`,
    /// additive model, lab environment, no uncertainty.
    pub fn new(
        team_name: impl Into<String>,
        system_name: impl Into<String>,
        program_year: i32,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), team_name, system_name, program_year)
    }

    /// Creates a project with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        project_id: ProjectId,
        team_name: impl Into<String>,
        system_name: impl Into<String>,
        program_year: i32,
    ) -> Self {
        Self {
            project_id,
            team_name: team_name.into(),
            system_name: system_name.into(),
            phenotype: String::new(),
            stress_scenario: String::new(),
            program_year,
            w0: 1.0,
            w_current: 1.0,
            performance_units: String::new(),
            generations_observed: 1.0,
            generation_time_years: 1.0,
            improvement_direction: ImprovementDirection::Increase,
            target: TargetSpec::fold(2.0),
            target_date: program_year + 10,
            sample_size: 0,
            environment: Environment::Lab,
            selection_method: SelectionMethod::Artificial,
            dw_se: 0.0,
            replicated: false,
            observation_start: String::new(),
            observation_end: String::new(),
            impact: ImpactDimensions::default(),
            model: ModelSpec::additive(),
            contact_email: String::new(),
            notes: String::new(),
            last_updated_ms: 0,
        }
    }

    /// Observed change `w_current - w0`.
    pub fn dw(&self) -> f64 {
        self.w_current - self.w0
    }

    /// Resolved sufficient (primary) target.
    pub fn primary_target(&self) -> f64 {
        match self.target.kind {
            TargetKind::Fold => self.target.value * self.w0,
            TargetKind::Absolute => self.target.value,
        }
    }

    /// Checks record-level invariants.
    ///
    /// Model-specific requirements (plateau placement, positive bases for
    /// the multiplicative model) are checked by the engine when a model is
    /// built, since they depend on the selected model.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.project_id.is_nil() {
            return Err(ProjectValidationError::NilId);
        }
        if !self.w0.is_finite() {
            return Err(ProjectValidationError::NonFinite("w0"));
        }
        if !self.w_current.is_finite() {
            return Err(ProjectValidationError::NonFinite("w_current"));
        }
        if !(self.generations_observed.is_finite() && self.generations_observed > 0.0) {
            return Err(ProjectValidationError::NonPositiveGenerations(
                self.generations_observed,
            ));
        }
        if !(self.generation_time_years.is_finite() && self.generation_time_years > 0.0) {
            return Err(ProjectValidationError::NonPositiveGenerationTime(
                self.generation_time_years,
            ));
        }
        if !(self.dw_se.is_finite() && self.dw_se >= 0.0) {
            return Err(ProjectValidationError::InvalidStandardError(self.dw_se));
        }
        for (name, value) in self.impact.named() {
            if !value.is_finite() {
                return Err(ProjectValidationError::NonFinite(name));
            }
        }
        self.validate_targets()?;

        let email = self.contact_email.trim();
        if !email.is_empty() && !CONTACT_EMAIL_RE.is_match(email) {
            return Err(ProjectValidationError::InvalidContactEmail(
                self.contact_email.clone(),
            ));
        }
        Ok(())
    }

    fn validate_targets(&self) -> Result<(), ProjectValidationError> {
        let direction = self.improvement_direction;
        let mut previous: Option<(TargetLevel, f64)> = None;
        for (level, value) in self.target.resolved_levels(self.w0) {
            if !value.is_finite() {
                return Err(ProjectValidationError::NonFinite(level.as_str()));
            }
            if !direction.is_beyond(value, self.w0) {
                return Err(ProjectValidationError::TargetNotImprovement {
                    level,
                    target: value,
                    w0: self.w0,
                });
            }
            if let Some((previous_level, previous_value)) = previous {
                if direction.is_beyond(previous_value, value) {
                    return Err(ProjectValidationError::TargetLevelsOutOfOrder {
                        lower: previous_level,
                        higher: level,
                    });
                }
            }
            previous = Some((level, value));
        }
        Ok(())
    }
}

/// Record-level invariant violations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectValidationError {
    NilId,
    /// Named field is NaN or infinite.
    NonFinite(&'static str),
    NonPositiveGenerations(f64),
    NonPositiveGenerationTime(f64),
    InvalidStandardError(f64),
    /// Target does not lie beyond `w0` in the improvement direction, so any
    /// projection toward it would be degenerate.
    TargetNotImprovement {
        level: TargetLevel,
        target: f64,
        w0: f64,
    },
    TargetLevelsOutOfOrder {
        lower: TargetLevel,
        higher: TargetLevel,
    },
    InvalidContactEmail(String),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "project id must not be nil"),
            Self::NonFinite(field) => write!(f, "{field} must be a finite number"),
            Self::NonPositiveGenerations(value) => {
                write!(f, "generations observed must be > 0, got {value}")
            }
            Self::NonPositiveGenerationTime(value) => {
                write!(f, "generation time must be > 0 years, got {value}")
            }
            Self::InvalidStandardError(value) => {
                write!(f, "standard error must be finite and >= 0, got {value}")
            }
            Self::TargetNotImprovement { level, target, w0 } => write!(
                f,
                "{} target {target} does not improve on baseline {w0}",
                level.as_str()
            ),
            Self::TargetLevelsOutOfOrder { lower, higher } => write!(
                f,
                "{} target lies beyond {} target",
                lower.as_str(),
                higher.as_str()
            ),
            Self::InvalidContactEmail(value) => write!(f, "invalid contact email `{value}`"),
        }
    }
}

impl Error for ProjectValidationError {}
