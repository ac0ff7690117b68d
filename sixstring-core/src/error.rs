//! Error types for the tuner engine.
//!
//! "No signal" (frequency <= 0) is deliberately *not* an error anywhere in
//! this crate: it is modeled as the canonical no-note value. The variants
//! here cover programmer-error inputs and capture-resource failures only.

use std::fmt;

/// Typed failures surfaced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TunerError {
    /// A semitone offset outside the supported [-12, +12] range was given
    /// to a component that requires strict validation.
    InvalidOffset(i32),
    /// A tuning table was constructed with no usable reference strings
    /// (empty set, non-positive frequency, or unparsable note name).
    NoReferenceMatch,
    /// The external capture collaborator failed to start. The reason string
    /// originates from the collaborator and is surfaced verbatim
    /// (permission denied, device busy, device missing, ...).
    CaptureUnavailable(String),
}

impl fmt::Display for TunerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunerError::InvalidOffset(semitones) => {
                write!(
                    f,
                    "tuning offset {} is outside the supported range of -12 to +12 semitones",
                    semitones
                )
            }
            TunerError::NoReferenceMatch => {
                write!(f, "tuning table has no usable reference strings")
            }
            TunerError::CaptureUnavailable(reason) => {
                write!(f, "capture unavailable: {}", reason)
            }
        }
    }
}

impl std::error::Error for TunerError {}
