//! Projection models.
//!
//! # Responsibility
//! - Map a generation offset to projected performance (`value_at`).
//! - Invert that mapping for a target value (`generations_to_reach`).
//!
//! # Invariants
//! - `value_at(0.0) == current` for every model and every rate, including
//!   infinite rates.
//! - `generations_to_reach` never returns a negative or non-finite number:
//!   a target already passed in the improvement direction is `Finite(0.0)`,
//!   a target the trajectory never meets is `Unreachable`.
//! - Each rate bound gets its own model; bounds are never derived by scaling
//!   a point result.

use super::error::{EngineResult, InvalidInput};
use crate::model::project::{ImprovementDirection, ModelKind, Project};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Generation (or year) count until a target is met.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Non-negative finite duration.
    Finite(f64),
    /// No finite future offset reaches the target under this model and rate.
    Unreachable,
}

impl Horizon {
    pub fn is_reachable(self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Finite value, or `None` when unreachable.
    pub fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(value) => Some(value),
            Self::Unreachable => None,
        }
    }

    /// Multiplies a finite duration by `factor` (generations to years).
    pub fn scale(self, factor: f64) -> Self {
        match self {
            Self::Finite(value) => Self::Finite(value * factor),
            Self::Unreachable => Self::Unreachable,
        }
    }

    /// Total order with `Unreachable` after every finite duration.
    pub fn cmp_duration(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => a.total_cmp(&b),
            (Self::Finite(_), Self::Unreachable) => Ordering::Less,
            (Self::Unreachable, Self::Finite(_)) => Ordering::Greater,
            (Self::Unreachable, Self::Unreachable) => Ordering::Equal,
        }
    }

    /// Returns whether this duration is strictly longer than `limit`.
    pub fn exceeds(self, limit: f64) -> bool {
        match self {
            Self::Finite(value) => value > limit,
            Self::Unreachable => true,
        }
    }
}

/// Uniform contract implemented by every projection model.
pub trait ProjectionModel {
    fn kind(&self) -> ModelKind;

    /// Performance at `generations` offsets from the current observation.
    fn value_at(&self, generations: f64) -> f64;

    /// Generations until the trajectory first meets `target`.
    fn generations_to_reach(&self, target: f64) -> Horizon;
}

/// Linear trajectory `W(t) = current + rate * t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveModel {
    pub current: f64,
    /// Performance units per generation.
    pub rate: f64,
    pub direction: ImprovementDirection,
}

impl ProjectionModel for AdditiveModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Additive
    }

    fn value_at(&self, generations: f64) -> f64 {
        if generations == 0.0 {
            return self.current;
        }
        self.current + self.rate * generations
    }

    fn generations_to_reach(&self, target: f64) -> Horizon {
        solve(self.current, target, self.direction, || {
            (target - self.current) / self.rate
        })
    }
}

/// Exponential trajectory `W(t) = current * exp(rate * t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplicativeModel {
    pub current: f64,
    /// Relative (log-scale) rate per generation.
    pub rate: f64,
    pub direction: ImprovementDirection,
}

impl ProjectionModel for MultiplicativeModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Multiplicative
    }

    fn value_at(&self, generations: f64) -> f64 {
        if generations == 0.0 {
            return self.current;
        }
        self.current * (self.rate * generations).exp()
    }

    fn generations_to_reach(&self, target: f64) -> Horizon {
        solve(self.current, target, self.direction, || {
            let ratio = target / self.current;
            if ratio <= 0.0 {
                return f64::INFINITY;
            }
            ratio.ln() / self.rate
        })
    }
}

/// Saturating trajectory `W(t) = plateau - (plateau - current) * exp(-rate * t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticModel {
    pub current: f64,
    pub plateau: f64,
    /// Approach rate toward the plateau per generation.
    pub rate: f64,
}

impl LogisticModel {
    /// Improvement direction implied by the plateau side.
    pub fn direction(&self) -> ImprovementDirection {
        if self.plateau >= self.current {
            ImprovementDirection::Increase
        } else {
            ImprovementDirection::Decrease
        }
    }
}

impl ProjectionModel for LogisticModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Logistic
    }

    fn value_at(&self, generations: f64) -> f64 {
        if generations == 0.0 {
            return self.current;
        }
        self.plateau - (self.plateau - self.current) * (-self.rate * generations).exp()
    }

    fn generations_to_reach(&self, target: f64) -> Horizon {
        let direction = self.direction();
        if direction.is_beyond(self.current, target) || target == self.current {
            return Horizon::Finite(0.0);
        }
        // The plateau itself is only approached asymptotically.
        if !direction.is_beyond(self.plateau, target) {
            return Horizon::Unreachable;
        }
        solve(self.current, target, direction, || {
            let remaining = (self.plateau - target) / (self.plateau - self.current);
            -remaining.ln() / self.rate
        })
    }
}

/// Model selected for one project, parameterized by one rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Additive(AdditiveModel),
    Multiplicative(MultiplicativeModel),
    Logistic(LogisticModel),
}

impl Projection {
    /// Builds the project's selected model at `rate`.
    ///
    /// # Errors
    /// - `MissingPlateau` / `PlateauNotAhead` for a misconfigured logistic
    ///   model.
    /// - `NonPositiveLogBase` for a multiplicative model with `w_current <= 0`.
    pub fn for_project(project: &Project, rate: f64) -> EngineResult<Self> {
        let current = project.w_current;
        let direction = project.improvement_direction;
        match project.model.kind {
            ModelKind::Additive => Ok(Self::Additive(AdditiveModel {
                current,
                rate,
                direction,
            })),
            ModelKind::Multiplicative => {
                if project.w0 <= 0.0 || current <= 0.0 {
                    return Err(InvalidInput::NonPositiveLogBase {
                        w0: project.w0,
                        w_current: current,
                    }
                    .into());
                }
                Ok(Self::Multiplicative(MultiplicativeModel {
                    current,
                    rate,
                    direction,
                }))
            }
            ModelKind::Logistic => {
                let plateau = project.model.plateau.ok_or(InvalidInput::MissingPlateau)?;
                if !direction.is_beyond(plateau, current) || !direction.is_beyond(plateau, project.w0)
                {
                    return Err(InvalidInput::PlateauNotAhead {
                        plateau,
                        w0: project.w0,
                        w_current: current,
                    }
                    .into());
                }
                Ok(Self::Logistic(LogisticModel {
                    current,
                    plateau,
                    rate,
                }))
            }
        }
    }

    /// Same model and state at a different rate.
    pub fn with_rate(&self, rate: f64) -> Self {
        match *self {
            Self::Additive(model) => Self::Additive(AdditiveModel { rate, ..model }),
            Self::Multiplicative(model) => {
                Self::Multiplicative(MultiplicativeModel { rate, ..model })
            }
            Self::Logistic(model) => Self::Logistic(LogisticModel { rate, ..model }),
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            Self::Additive(model) => model.rate,
            Self::Multiplicative(model) => model.rate,
            Self::Logistic(model) => model.rate,
        }
    }

    fn as_model(&self) -> &dyn ProjectionModel {
        match self {
            Self::Additive(model) => model,
            Self::Multiplicative(model) => model,
            Self::Logistic(model) => model,
        }
    }
}

impl ProjectionModel for Projection {
    fn kind(&self) -> ModelKind {
        self.as_model().kind()
    }

    fn value_at(&self, generations: f64) -> f64 {
        self.as_model().value_at(generations)
    }

    fn generations_to_reach(&self, target: f64) -> Horizon {
        self.as_model().generations_to_reach(target)
    }
}

/// Shared inverse policy: targets at or behind `current` (in the improvement
/// direction) are already met; otherwise only a finite, non-negative
/// algebraic solution counts as reachable.
fn solve(
    current: f64,
    target: f64,
    direction: ImprovementDirection,
    generations: impl FnOnce() -> f64,
) -> Horizon {
    if target == current || !direction.is_beyond(target, current) {
        return Horizon::Finite(0.0);
    }
    let value = generations();
    // -0.0 comes from a finite gap over an infinite rate of the wrong sign.
    if value.is_finite() && !value.is_sign_negative() {
        Horizon::Finite(value)
    } else {
        Horizon::Unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AdditiveModel, Horizon, LogisticModel, MultiplicativeModel, ProjectionModel,
    };
    use crate::model::project::ImprovementDirection;

    fn additive(rate: f64) -> AdditiveModel {
        AdditiveModel {
            current: 30.2,
            rate,
            direction: ImprovementDirection::Increase,
        }
    }

    fn assert_finite(horizon: Horizon, expected: f64) {
        let value = horizon.finite().expect("horizon should be finite");
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn additive_inverse_divides_gap_by_rate() {
        assert_finite(additive(0.2125).generations_to_reach(57.0), 26.8 / 0.2125);
    }

    #[test]
    fn additive_zero_rate_is_unreachable_unless_already_there() {
        let model = additive(0.0);
        assert_eq!(model.generations_to_reach(40.0), Horizon::Unreachable);
        assert_eq!(model.generations_to_reach(30.2), Horizon::Finite(0.0));
    }

    #[test]
    fn additive_rate_moving_away_is_unreachable() {
        assert_eq!(additive(-0.5).generations_to_reach(40.0), Horizon::Unreachable);
    }

    #[test]
    fn passed_target_reports_zero_not_negative() {
        assert_eq!(additive(0.5).generations_to_reach(25.0), Horizon::Finite(0.0));
    }

    #[test]
    fn decreasing_trait_solves_downward() {
        let model = AdditiveModel {
            current: 50.0,
            rate: -2.0,
            direction: ImprovementDirection::Decrease,
        };
        assert_finite(model.generations_to_reach(40.0), 5.0);
        assert_eq!(model.generations_to_reach(55.0), Horizon::Finite(0.0));
    }

    #[test]
    fn multiplicative_inverse_uses_log_ratio() {
        let model = MultiplicativeModel {
            current: 1.2,
            rate: 1.2_f64.ln() / 5.0,
            direction: ImprovementDirection::Increase,
        };
        let generations = model.generations_to_reach(2.0).finite().unwrap();
        assert!((generations - 14.0).abs() < 0.05);
    }

    #[test]
    fn multiplicative_negative_infinite_rate_keeps_current_at_origin() {
        let model = MultiplicativeModel {
            current: 1.2,
            rate: f64::NEG_INFINITY,
            direction: ImprovementDirection::Increase,
        };
        assert_eq!(model.value_at(0.0), 1.2);
        assert_eq!(model.value_at(3.0), 0.0);
        assert_eq!(model.generations_to_reach(2.0), Horizon::Unreachable);
    }

    #[test]
    fn logistic_target_at_or_beyond_plateau_is_unreachable() {
        let model = LogisticModel {
            current: 15.0,
            plateau: 20.0,
            rate: 0.3,
        };
        assert_eq!(model.generations_to_reach(20.0), Horizon::Unreachable);
        assert_eq!(model.generations_to_reach(25.0), Horizon::Unreachable);
        assert_eq!(model.generations_to_reach(12.0), Horizon::Finite(0.0));
    }

    #[test]
    fn logistic_inverse_matches_half_life() {
        let model = LogisticModel {
            current: 10.0,
            plateau: 20.0,
            rate: std::f64::consts::LN_2,
        };
        assert_finite(model.generations_to_reach(15.0), 1.0);
        assert!((model.value_at(1.0) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn logistic_infinite_rate_jumps_to_plateau() {
        let model = LogisticModel {
            current: 10.0,
            plateau: 20.0,
            rate: f64::INFINITY,
        };
        assert_eq!(model.value_at(0.0), 10.0);
        assert_eq!(model.value_at(1.0), 20.0);
        assert_eq!(model.generations_to_reach(19.0), Horizon::Finite(0.0));
    }

    #[test]
    fn unreachable_orders_after_every_finite_duration() {
        use std::cmp::Ordering;
        assert_eq!(
            Horizon::Finite(1e300).cmp_duration(Horizon::Unreachable),
            Ordering::Less
        );
        assert!(Horizon::Unreachable.exceeds(f64::MAX));
        assert_eq!(Horizon::Unreachable.scale(0.5), Horizon::Unreachable);
    }
}
