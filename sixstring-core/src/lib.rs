// sixstring-core/src/lib.rs

//! The core logic for the guitar tuner engine.
//! This crate is responsible for note classification, transposition
//! arithmetic, and session lifecycle. It is completely headless and
//! contains no capture or GUI code: pitch estimation is an external
//! collaborator that hands the engine a stream of raw frequencies.

pub mod error;
pub mod mapper;
pub mod presets;
pub mod registry;
pub mod session;
pub mod status;
pub mod table;
pub mod tuning;

use serde::{Deserialize, Serialize};

/// Sentinel pitch-class name used when no pitch is detected.
pub const NO_SIGNAL_NAME: &str = "--";

/// Represents one classified frequency sample.
///
/// `frequency` is the frequency of the *matched reference* pitch, not the
/// raw input; callers diff the raw input against it to render a needle.
/// The canonical "no note" value (silence, dropped frame) has
/// `name == "--"`, `frequency == 0`, `cents == 0` and `confidence == 0`,
/// all together; it is a valid steady state, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Pitch class (e.g. "A", "C#"), or `"--"` for no signal.
    pub name: String,
    /// Frequency of the matched reference pitch in Hz.
    pub frequency: f64,
    /// Scientific pitch notation octave. Meaningless for the no-signal value.
    pub octave: i32,
    /// Signed deviation of the raw input from `frequency`, in cents.
    /// Integer-valued (rounded half away from zero).
    pub cents: f64,
    /// Heuristic detection confidence in [0, 1].
    pub confidence: f64,
}

impl Note {
    /// The canonical "no note" value returned for silence or invalid input.
    pub fn no_signal() -> Self {
        Note {
            name: NO_SIGNAL_NAME.to_string(),
            frequency: 0.0,
            octave: 0,
            cents: 0.0,
            confidence: 0.0,
        }
    }

    /// True if this is the canonical no-signal value.
    pub fn is_no_signal(&self) -> bool {
        self.name == NO_SIGNAL_NAME
    }

    /// Full note name with octave, e.g. "A4" or "C#3" ("--" for no signal).
    pub fn full_name(&self) -> String {
        if self.is_no_signal() {
            return NO_SIGNAL_NAME.to_string();
        }
        format!("{}{}", self.name, self.octave)
    }
}

impl Default for Note {
    fn default() -> Self {
        Note::no_signal()
    }
}
