//! Project status classification.
//!
//! Rules run in fixed priority order and the first match wins:
//! 1. non-positive progress rate -> `AtRisk`
//! 2. conservative years-to-target beyond the target year -> `BehindTrack`
//! 3. preliminary data quality -> `NeedsValidation`
//! 4. otherwise -> `OnTrack`

use super::projection::Horizon;
use super::quality::QualityBand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    OnTrack,
    BehindTrack,
    AtRisk,
    NeedsValidation,
}

impl ProjectStatus {
    pub const ALL: [Self; 4] = [
        Self::OnTrack,
        Self::BehindTrack,
        Self::AtRisk,
        Self::NeedsValidation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::BehindTrack => "behind_track",
            Self::AtRisk => "at_risk",
            Self::NeedsValidation => "needs_validation",
        }
    }
}

/// Everything the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusInputs {
    /// Point rate signed so that positive means improving.
    pub progress_rate: f64,
    /// Upper CI edge of years-to-target, or the point estimate when no
    /// interval exists.
    pub years_to_target: Horizon,
    pub target_year: i32,
    pub current_year: i32,
    pub quality: QualityBand,
}

/// Classifies one evaluation; no previous status is consulted.
pub fn classify(inputs: &StatusInputs) -> ProjectStatus {
    // NaN compares false, so `!(x > 0)` also routes NaN to AtRisk.
    if !(inputs.progress_rate > 0.0) {
        return ProjectStatus::AtRisk;
    }
    let remaining_years = f64::from(inputs.target_year - inputs.current_year);
    if inputs.years_to_target.exceeds(remaining_years) {
        return ProjectStatus::BehindTrack;
    }
    if inputs.quality == QualityBand::Preliminary {
        return ProjectStatus::NeedsValidation;
    }
    ProjectStatus::OnTrack
}
