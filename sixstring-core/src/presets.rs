//! # Tuning Presets Module
//!
//! Named alternate tunings (Standard, Drop D, Open G, ...) and the
//! control surface that layers a per-semitone user adjustment on top of
//! the selected preset. The control surface is the only writer of the
//! offset registry; it owns the clamping policy (total offset stays in
//! [-12, +12]), which is why the registry's lenient setter never clamps.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::registry::OffsetRegistry;
use crate::tuning::{MAX_OFFSET, MIN_OFFSET};

/// A named alternate tuning layered on top of the custom offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningPreset {
    pub name: String,
    pub semitones: i32,
    pub description: String,
}

impl TuningPreset {
    fn new(name: &str, semitones: i32, description: &str) -> Self {
        TuningPreset {
            name: name.to_string(),
            semitones,
            description: description.to_string(),
        }
    }
}

/// The built-in preset list. The first entry is standard tuning.
pub static DEFAULT_PRESETS: Lazy<Vec<TuningPreset>> = Lazy::new(|| {
    vec![
        TuningPreset::new("Standard", 0, "Standard tuning (A4 = 440Hz)"),
        TuningPreset::new("Drop D", -2, "Drop D (D2, A2, D3, G3, B3, E4)"),
        TuningPreset::new("Drop C", -4, "Drop C (C2, G2, C3, F3, A3, D4)"),
        TuningPreset::new("Open G", -2, "Open G (D2, G2, D3, G3, B3, D4)"),
        TuningPreset::new("Open D", -2, "Open D (D2, A2, D3, F#3, A3, D4)"),
        TuningPreset::new("DADGAD", -2, "DADGAD (D2, A2, D3, G3, A3, D4)"),
        TuningPreset::new("Half Step Down", -1, "Half step down (A4 = 415.3Hz)"),
        TuningPreset::new("Full Step Down", -2, "Full step down (A4 = 392Hz)"),
        TuningPreset::new("Half Step Up", 1, "Half step up (A4 = 466.2Hz)"),
        TuningPreset::new("Full Step Up", 2, "Full step up (A4 = 493.9Hz)"),
    ]
});

/// Looks up a built-in preset by name (case-insensitive).
pub fn find_preset(name: &str) -> Option<&'static TuningPreset> {
    DEFAULT_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// The tuning-control surface: current preset plus the user's custom
/// semitone adjustment. Every mutation pushes the combined total into the
/// registry, so readers of the registry never see a half-applied change.
#[derive(Debug, Clone)]
pub struct TuningControl {
    preset: TuningPreset,
    custom_semitones: i32,
}

impl TuningControl {
    /// Starts in standard tuning with no custom adjustment.
    pub fn new() -> Self {
        TuningControl {
            preset: DEFAULT_PRESETS[0].clone(),
            custom_semitones: 0,
        }
    }

    pub fn preset(&self) -> &TuningPreset {
        &self.preset
    }

    pub fn custom_semitones(&self) -> i32 {
        self.custom_semitones
    }

    /// Total applied offset: preset semitones plus custom adjustment.
    pub fn total_semitones(&self) -> i32 {
        self.preset.semitones + self.custom_semitones
    }

    /// Switches preset, resetting the custom adjustment to zero.
    pub fn select_preset(&mut self, preset: TuningPreset, registry: &OffsetRegistry) {
        self.preset = preset;
        self.custom_semitones = 0;
        self.apply(registry);
    }

    /// Adjusts the custom offset by `delta` semitones, clamped so the
    /// total stays within [-12, +12].
    pub fn nudge(&mut self, delta: i32, registry: &OffsetRegistry) {
        let total = (self.total_semitones() + delta).clamp(MIN_OFFSET, MAX_OFFSET);
        self.custom_semitones = total - self.preset.semitones;
        self.apply(registry);
    }

    /// Resets the custom adjustment to zero, keeping the preset.
    pub fn reset(&mut self, registry: &OffsetRegistry) {
        self.custom_semitones = 0;
        self.apply(registry);
    }

    /// Human-readable name, e.g. "Drop D" or "Drop D +2 semitones".
    pub fn display_name(&self) -> String {
        if self.custom_semitones == 0 {
            return self.preset.name.clone();
        }
        let sign = if self.custom_semitones > 0 { "+" } else { "" };
        format!(
            "{} {}{} semitones",
            self.preset.name, sign, self.custom_semitones
        )
    }

    fn apply(&self, registry: &OffsetRegistry) {
        registry.set_offset(self.total_semitones());
    }
}

impl Default for TuningControl {
    fn default() -> Self {
        TuningControl::new()
    }
}
