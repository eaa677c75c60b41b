//! Per-generation improvement rate estimation.
//!
//! # Responsibility
//! - Turn baseline/current performance over an observation window into the
//!   rate parameter of the selected projection model.
//! - Propagate the standard error of the observed change into rate bounds by
//!   substituting `dW -/+ z*SE` into the same formula.
//!
//! # Invariants
//! - Pure functions; inputs are validated before any arithmetic so no NaN is
//!   ever emitted.
//! - Bounds are present only when `dw_se > 0` and satisfy `lower <= upper`.
//! - A bound saturated at the limit of a log-based formula is stored as a
//!   named `RateBound` variant, never as a raw infinite float.

use super::error::{EngineResult, InvalidInput};
use super::options::ConfidenceLevel;
use crate::model::project::{ImprovementDirection, ModelKind, Project};
use serde::{Deserialize, Serialize};

/// Unit of a rate estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// Performance units per generation (additive).
    Linear,
    /// Log-scale change per generation (multiplicative).
    Relative,
    /// Exponential approach rate toward a plateau (logistic).
    Approach,
}

/// One edge of a rate interval.
///
/// JSON has no infinities, so saturated edges get their own variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBound {
    Finite(f64),
    /// The substituted performance left the log domain (multiplicative).
    NegInfinite,
    /// The substituted change reached the plateau (logistic).
    PosInfinite,
}

impl RateBound {
    pub fn from_value(value: f64) -> Self {
        if value == f64::INFINITY {
            Self::PosInfinite
        } else if value == f64::NEG_INFINITY {
            Self::NegInfinite
        } else {
            Self::Finite(value)
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Finite(value) => value,
            Self::NegInfinite => f64::NEG_INFINITY,
            Self::PosInfinite => f64::INFINITY,
        }
    }

    pub fn is_saturated(self) -> bool {
        !matches!(self, Self::Finite(_))
    }
}

/// Point rate with optional confidence bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    pub kind: RateKind,
    pub point: f64,
    pub lower: Option<RateBound>,
    pub upper: Option<RateBound>,
}

impl RateEstimate {
    /// Point-only estimate.
    pub fn exact(kind: RateKind, point: f64) -> Self {
        Self {
            kind,
            point,
            lower: None,
            upper: None,
        }
    }

    /// Estimate with both bounds; the edges are reordered if needed.
    pub fn bounded(kind: RateKind, point: f64, a: f64, b: f64) -> Self {
        Self {
            kind,
            point,
            lower: Some(RateBound::from_value(a.min(b))),
            upper: Some(RateBound::from_value(a.max(b))),
        }
    }

    /// `(lower, upper)` as raw rates when both bounds exist.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.lower
            .zip(self.upper)
            .map(|(lower, upper)| (lower.value(), upper.value()))
    }

    /// Point rate converted to per-year units.
    pub fn point_per_year(&self, generation_time_years: f64) -> f64 {
        self.point / generation_time_years
    }

    /// Point rate signed so that positive means moving toward improvement.
    ///
    /// Approach rates already carry that sign; linear and relative rates are
    /// flipped for traits that improve by decreasing.
    pub fn progress_rate(&self, direction: ImprovementDirection) -> f64 {
        match self.kind {
            RateKind::Approach => self.point,
            RateKind::Linear | RateKind::Relative => self.point * direction.sign(),
        }
    }
}

/// Observation window shared by all estimators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub w0: f64,
    pub w_current: f64,
    pub generations: f64,
    pub dw_se: f64,
}

impl Observation {
    pub fn from_project(project: &Project) -> Self {
        Self {
            w0: project.w0,
            w_current: project.w_current,
            generations: project.generations_observed,
            dw_se: project.dw_se,
        }
    }

    fn dw(&self) -> f64 {
        self.w_current - self.w0
    }

    fn check(&self) -> EngineResult<()> {
        if !self.w0.is_finite() {
            return Err(InvalidInput::NonFinite("w0").into());
        }
        if !self.w_current.is_finite() {
            return Err(InvalidInput::NonFinite("w_current").into());
        }
        if !(self.generations.is_finite() && self.generations > 0.0) {
            return Err(InvalidInput::NonPositiveGenerations(self.generations).into());
        }
        if !(self.dw_se.is_finite() && self.dw_se >= 0.0) {
            return Err(InvalidInput::InvalidStandardError(self.dw_se).into());
        }
        Ok(())
    }
}

/// Additive rate `(w_current - w0) / t_gen`.
pub fn estimate_linear(obs: &Observation, confidence: ConfidenceLevel) -> EngineResult<RateEstimate> {
    obs.check()?;
    let t = obs.generations;
    Ok(with_bounds(RateKind::Linear, obs, confidence, |dw| dw / t))
}

/// Multiplicative rate `ln(w_current / w0) / t_gen`.
///
/// A lower bound whose substituted performance is non-positive is `-inf`,
/// the limit of the logarithm.
pub fn estimate_relative(
    obs: &Observation,
    confidence: ConfidenceLevel,
) -> EngineResult<RateEstimate> {
    obs.check()?;
    if obs.w0 <= 0.0 || obs.w_current <= 0.0 {
        return Err(InvalidInput::NonPositiveLogBase {
            w0: obs.w0,
            w_current: obs.w_current,
        }
        .into());
    }
    let (w0, t) = (obs.w0, obs.generations);
    Ok(with_bounds(RateKind::Relative, obs, confidence, |dw| {
        let performance = w0 + dw;
        if performance <= 0.0 {
            f64::NEG_INFINITY
        } else {
            (performance / w0).ln() / t
        }
    }))
}

/// Logistic approach rate `-ln(1 - dW / (W_max - w0)) / t_gen`.
///
/// A bound whose substituted change reaches the plateau is `+inf`.
pub fn estimate_approach(
    obs: &Observation,
    plateau: f64,
    direction: ImprovementDirection,
    confidence: ConfidenceLevel,
) -> EngineResult<RateEstimate> {
    obs.check()?;
    check_plateau(obs, plateau, direction)?;
    let (span, t) = (plateau - obs.w0, obs.generations);
    Ok(with_bounds(RateKind::Approach, obs, confidence, |dw| {
        let remaining = 1.0 - dw / span;
        if remaining <= 0.0 {
            f64::INFINITY
        } else {
            -remaining.ln() / t
        }
    }))
}

/// Estimates the rate the project's selected model consumes.
///
/// A directly supplied logistic approach rate replaces the derived one and
/// carries no bounds.
pub fn estimate_for_project(
    project: &Project,
    confidence: ConfidenceLevel,
) -> EngineResult<RateEstimate> {
    let obs = Observation::from_project(project);
    match project.model.kind {
        ModelKind::Additive => estimate_linear(&obs, confidence),
        ModelKind::Multiplicative => estimate_relative(&obs, confidence),
        ModelKind::Logistic => {
            let plateau = project.model.plateau.ok_or(InvalidInput::MissingPlateau)?;
            match project.model.approach_rate {
                Some(rate) => {
                    obs.check()?;
                    check_plateau(&obs, plateau, project.improvement_direction)?;
                    if !rate.is_finite() {
                        return Err(InvalidInput::InvalidApproachRate(rate).into());
                    }
                    Ok(RateEstimate::exact(RateKind::Approach, rate))
                }
                None => estimate_approach(
                    &obs,
                    plateau,
                    project.improvement_direction,
                    confidence,
                ),
            }
        }
    }
}

pub(crate) fn check_plateau(
    obs: &Observation,
    plateau: f64,
    direction: ImprovementDirection,
) -> EngineResult<()> {
    if !plateau.is_finite() {
        return Err(InvalidInput::NonFinite("plateau").into());
    }
    if !direction.is_beyond(plateau, obs.w_current) || !direction.is_beyond(plateau, obs.w0) {
        return Err(InvalidInput::PlateauNotAhead {
            plateau,
            w0: obs.w0,
            w_current: obs.w_current,
        }
        .into());
    }
    Ok(())
}

fn with_bounds(
    kind: RateKind,
    obs: &Observation,
    confidence: ConfidenceLevel,
    rate_of: impl Fn(f64) -> f64,
) -> RateEstimate {
    let dw = obs.dw();
    let point = rate_of(dw);
    if obs.dw_se > 0.0 {
        let margin = confidence.z_score() * obs.dw_se;
        RateEstimate::bounded(kind, point, rate_of(dw - margin), rate_of(dw + margin))
    } else {
        RateEstimate::exact(kind, point)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        estimate_approach, estimate_linear, estimate_relative, Observation, RateBound,
        RateEstimate, RateKind,
    };
    use crate::engine::error::{EngineError, InvalidInput};
    use crate::engine::options::ConfidenceLevel;
    use crate::model::project::ImprovementDirection;

    fn obs(w0: f64, w_current: f64, generations: f64, dw_se: f64) -> Observation {
        Observation {
            w0,
            w_current,
            generations,
            dw_se,
        }
    }

    #[test]
    fn linear_rate_matches_observed_slope() {
        let rate = estimate_linear(&obs(28.5, 30.2, 8.0, 0.0), ConfidenceLevel::P95).unwrap();
        assert_eq!(rate.kind, RateKind::Linear);
        assert!((rate.point - 0.2125).abs() < 1e-12);
        assert!(rate.bounds().is_none());
    }

    #[test]
    fn linear_bounds_substitute_z_times_se() {
        let rate = estimate_linear(&obs(10.0, 12.0, 4.0, 0.5), ConfidenceLevel::P95).unwrap();
        let (lower, upper) = rate.bounds().unwrap();
        assert!((lower - (2.0 - 0.98) / 4.0).abs() < 1e-12);
        assert!((upper - (2.0 + 0.98) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn relative_rate_uses_log_ratio() {
        let rate = estimate_relative(&obs(1.0, 1.2, 5.0, 0.0), ConfidenceLevel::P95).unwrap();
        assert!((rate.point - 0.036464).abs() < 1e-5);
    }

    #[test]
    fn relative_lower_bound_is_negative_infinity_when_performance_crosses_zero() {
        let rate = estimate_relative(&obs(1.0, 1.2, 5.0, 1.0), ConfidenceLevel::P95).unwrap();
        assert_eq!(rate.lower, Some(RateBound::NegInfinite));
        assert!(!rate.upper.unwrap().is_saturated());
        assert_eq!(rate.bounds().unwrap().0, f64::NEG_INFINITY);
    }

    #[test]
    fn saturated_bounds_keep_their_sign_in_json() {
        let rate = RateEstimate::bounded(RateKind::Approach, 0.3, 0.1, f64::INFINITY);
        let json = serde_json::to_value(rate).unwrap();
        assert_eq!(json["upper"], "pos_infinite");
        assert_eq!(json["lower"]["finite"], 0.1);

        let back: RateEstimate = serde_json::from_value(json).unwrap();
        assert_eq!(back, rate);
        assert_eq!(back.bounds(), Some((0.1, f64::INFINITY)));
    }

    #[test]
    fn relative_rejects_non_positive_base() {
        let err = estimate_relative(&obs(0.0, 1.2, 5.0, 0.0), ConfidenceLevel::P95).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInput::NonPositiveLogBase { .. })
        ));
    }

    #[test]
    fn zero_generations_is_invalid_input() {
        let err = estimate_linear(&obs(1.0, 2.0, 0.0, 0.0), ConfidenceLevel::P95).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidInput(InvalidInput::NonPositiveGenerations(0.0))
        );
    }

    #[test]
    fn approach_rate_reproduces_observed_point() {
        // Half way to the plateau in 2 generations -> r = ln(2) / 2.
        let rate = estimate_approach(
            &obs(10.0, 15.0, 2.0, 0.0),
            20.0,
            ImprovementDirection::Increase,
            ConfidenceLevel::P95,
        )
        .unwrap();
        assert!((rate.point - std::f64::consts::LN_2 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn approach_upper_bound_saturates_at_plateau() {
        let rate = estimate_approach(
            &obs(10.0, 15.0, 2.0, 4.0),
            20.0,
            ImprovementDirection::Increase,
            ConfidenceLevel::P95,
        )
        .unwrap();
        assert_eq!(rate.upper, Some(RateBound::PosInfinite));
        assert!(rate.lower.unwrap().value() < rate.point);
    }

    #[test]
    fn plateau_behind_current_is_rejected() {
        let err = estimate_approach(
            &obs(10.0, 15.0, 2.0, 0.0),
            14.0,
            ImprovementDirection::Increase,
            ConfidenceLevel::P95,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidInput(InvalidInput::PlateauNotAhead { .. })
        ));
    }
}
