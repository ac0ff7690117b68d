//! Three-way tuning verdict (flat / in tune / sharp) plus the semantic
//! color token frontends use for styling. The color mapping is a closed
//! enum and part of the public contract: external UIs key off the variant,
//! not the numeric threshold.

use serde::{Deserialize, Serialize};

/// Default tolerance in cents for the in-tune band.
pub const DEFAULT_TOLERANCE_CENTS: f64 = 10.0;

/// Semantic color token for a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Warning,
    Error,
}

/// Verdict on a cents deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStatus {
    Flat,
    InTune,
    Sharp,
}

impl TuningStatus {
    /// Classifies with the default 10-cent tolerance.
    pub fn classify(cents: f64) -> Self {
        Self::classify_with_tolerance(cents, DEFAULT_TOLERANCE_CENTS)
    }

    /// Classifies with a caller-supplied tolerance: within tolerance is
    /// in tune, below is flat, above is sharp.
    pub fn classify_with_tolerance(cents: f64, tolerance: f64) -> Self {
        if cents.abs() <= tolerance {
            TuningStatus::InTune
        } else if cents < 0.0 {
            TuningStatus::Flat
        } else {
            TuningStatus::Sharp
        }
    }

    /// The color token frontends render the verdict with.
    pub fn color(self) -> StatusColor {
        match self {
            TuningStatus::InTune => StatusColor::Success,
            TuningStatus::Flat => StatusColor::Warning,
            TuningStatus::Sharp => StatusColor::Error,
        }
    }
}

/// True if the deviation is within tolerance.
pub fn is_in_tune(cents: f64, tolerance: f64) -> bool {
    cents.abs() <= tolerance
}
