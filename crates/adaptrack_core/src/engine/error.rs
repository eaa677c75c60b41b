//! Engine error types.
//!
//! # Invariants
//! - Only true failures are errors. A target that no finite generation offset
//!   reaches is `Horizon::Unreachable`, not an error.

use crate::model::project::{ModelKind, ProjectValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure surfaced by engine entry points.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    InvalidInput(InvalidInput),
}

/// Inputs the engine refuses to compute from.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// Generations observed must be strictly positive.
    NonPositiveGenerations(f64),
    NonPositiveGenerationTime(f64),
    /// Multiplicative model needs `w0 > 0` and `w_current > 0`.
    NonPositiveLogBase { w0: f64, w_current: f64 },
    NonFinite(&'static str),
    InvalidStandardError(f64),
    /// Logistic model selected without `W_max`.
    MissingPlateau,
    /// `W_max` must lie beyond both `w0` and `w_current` in the improvement
    /// direction.
    PlateauNotAhead {
        plateau: f64,
        w0: f64,
        w_current: f64,
    },
    /// Directly supplied approach rate is NaN or infinite.
    InvalidApproachRate(f64),
    /// Confidence level other than 0.80, 0.90 or 0.95.
    UnsupportedConfidence(f64),
    /// Record-level invariant violation.
    Project(ProjectValidationError),
}

impl Display for InvalidInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveGenerations(value) => {
                write!(f, "generations observed must be > 0, got {value}")
            }
            Self::NonPositiveGenerationTime(value) => {
                write!(f, "generation time must be > 0 years, got {value}")
            }
            Self::NonPositiveLogBase { w0, w_current } => write!(
                f,
                "{} model requires positive w0 and w_current, got w0={w0} w_current={w_current}",
                ModelKind::Multiplicative.as_str()
            ),
            Self::NonFinite(field) => write!(f, "{field} must be a finite number"),
            Self::InvalidStandardError(value) => {
                write!(f, "standard error must be finite and >= 0, got {value}")
            }
            Self::MissingPlateau => write!(
                f,
                "{} model requires a plateau performance",
                ModelKind::Logistic.as_str()
            ),
            Self::PlateauNotAhead {
                plateau,
                w0,
                w_current,
            } => write!(
                f,
                "plateau {plateau} must lie beyond w0={w0} and w_current={w_current}"
            ),
            Self::InvalidApproachRate(value) => {
                write!(f, "approach rate must be finite, got {value}")
            }
            Self::UnsupportedConfidence(value) => write!(
                f,
                "unsupported confidence level {value}; expected 0.80|0.90|0.95"
            ),
            Self::Project(err) => write!(f, "{err}"),
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(input) => write!(f, "invalid input: {input}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(InvalidInput::Project(err)) => Some(err),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<InvalidInput> for EngineError {
    fn from(value: InvalidInput) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<ProjectValidationError> for EngineError {
    fn from(value: ProjectValidationError) -> Self {
        Self::InvalidInput(InvalidInput::Project(value))
    }
}
