//! # Note Mapper Module
//!
//! Classifies one raw frequency sample into a [`Note`].
//!
//! Two modes are supported:
//! - [`MapperMode::NearestString`] (the default): match against the
//!   reference string closest in absolute Hz, the mode a guitar tuner
//!   needs.
//! - [`MapperMode::Chromatic`]: pure equal-temperament MIDI mapping, a
//!   fallback for generic instrument tuning with no string set.
//!
//! The two modes give subtly different cents/octave results for the same
//! input and are not numerically interchangeable.
//!
//! Degenerate input (`freq <= 0`, NaN) is an expected steady state,
//! silence between plucks, and maps to the canonical no-note value,
//! never an error. The only failure mode is a programmer error: asking
//! the tuning table for an out-of-range transposition.

use crate::error::TunerError;
use crate::registry::OffsetRegistry;
use crate::table::TuningTable;
use crate::tuning;
use crate::Note;

/// Cents deviation at which confidence from deviation alone reaches zero.
const CONFIDENCE_CENTS_SPAN: f64 = 50.0;

/// Classification strategy for [`NoteMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapperMode {
    /// Match the nearest reference string (product default).
    #[default]
    NearestString,
    /// Pure equal-temperament MIDI mapping.
    Chromatic,
}

/// Converts raw frequencies into classified notes. Stateless apart from
/// its mode; the offset registry and tuning table are passed per call so
/// there is no hidden coupling to ambient state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteMapper {
    mode: MapperMode,
}

impl NoteMapper {
    pub fn new(mode: MapperMode) -> Self {
        NoteMapper { mode }
    }

    pub fn mode(&self) -> MapperMode {
        self.mode
    }

    /// Classifies a raw frequency sample at the registry's current offset.
    ///
    /// # Arguments
    /// * `freq` - Raw detected fundamental in Hz
    /// * `registry` - Current transposition state
    /// * `table` - Reference strings (consulted in nearest-string mode)
    ///
    /// # Returns
    /// * `Ok(note)` - Classified note; the no-signal value for `freq <= 0`
    /// * `Err(InvalidOffset)` - The registry holds an unsupported offset
    ///   and nearest-string matching cannot transpose the table
    pub fn classify(
        &self,
        freq: f64,
        registry: &OffsetRegistry,
        table: &TuningTable,
    ) -> Result<Note, TunerError> {
        if !freq.is_finite() || freq <= 0.0 {
            return Ok(Note::no_signal());
        }
        match self.mode {
            MapperMode::NearestString => self.classify_nearest_string(freq, registry, table),
            MapperMode::Chromatic => Ok(self.classify_chromatic(freq, registry)),
        }
    }

    fn classify_nearest_string(
        &self,
        freq: f64,
        registry: &OffsetRegistry,
        table: &TuningTable,
    ) -> Result<Note, TunerError> {
        let matched = table.nearest(freq, registry.get_offset())?;
        let cents = tuning::cents_between(freq, matched.frequency).round();
        // Safe: display names come out of the chromatic arithmetic and
        // always parse.
        let (class, octave) = tuning::parse_note_name(&matched.display_name).unwrap();
        Ok(Note {
            name: tuning::NOTE_NAMES[class].to_string(),
            octave,
            confidence: confidence(freq, matched.frequency, cents),
            cents,
            frequency: matched.frequency,
        })
    }

    fn classify_chromatic(&self, freq: f64, registry: &OffsetRegistry) -> Note {
        let midi = tuning::frequency_to_midi(freq);
        // The target is the equal-temperament pitch shifted by the current
        // offset through the same 2^(s/12) formula the table uses.
        let target = registry.adjust_frequency(tuning::midi_to_frequency(midi));
        let cents = tuning::cents_between(freq, target).round();
        let (name, octave) = tuning::spell_midi(midi);
        Note {
            name: name.to_string(),
            octave,
            confidence: confidence(freq, target, cents),
            cents,
            frequency: target,
        }
    }
}

/// Heuristic detection confidence in [0, 1].
///
/// The average of two terms: closeness in cents (zero beyond 50 cents)
/// and relative frequency stability. This is a display heuristic, not a
/// statistical estimator; it is monotonically decreasing in both
/// deviation measures and bounded in [0, 1].
fn confidence(freq: f64, target: f64, cents: f64) -> f64 {
    let cents_confidence = (1.0 - cents.abs() / CONFIDENCE_CENTS_SPAN).max(0.0);
    let freq_stability = (1.0 - (freq - target).abs() / target).max(0.0);
    (cents_confidence + freq_stability) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (OffsetRegistry, TuningTable) {
        (OffsetRegistry::new(), TuningTable::standard_guitar())
    }

    #[test]
    fn silence_maps_to_no_signal() {
        let (registry, table) = setup();
        for mode in [MapperMode::NearestString, MapperMode::Chromatic] {
            let mapper = NoteMapper::new(mode);
            assert!(mapper.classify(0.0, &registry, &table).unwrap().is_no_signal());
            assert!(mapper.classify(-100.0, &registry, &table).unwrap().is_no_signal());
            assert!(mapper.classify(f64::NAN, &registry, &table).unwrap().is_no_signal());
        }
    }

    #[test]
    fn silence_ignores_the_offset() {
        let (registry, table) = setup();
        registry.set_offset(-4);
        let mapper = NoteMapper::default();
        let note = mapper.classify(0.0, &registry, &table).unwrap();
        assert_eq!(note, Note::no_signal());
    }

    #[test]
    fn chromatic_identifies_a4() {
        let (registry, table) = setup();
        let mapper = NoteMapper::new(MapperMode::Chromatic);
        let note = mapper.classify(440.0, &registry, &table).unwrap();
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert_eq!(note.cents, 0.0);
        assert!(note.confidence > 0.9);
    }

    #[test]
    fn chromatic_reports_reference_frequency_not_input() {
        let (registry, table) = setup();
        let mapper = NoteMapper::new(MapperMode::Chromatic);
        let note = mapper.classify(442.0, &registry, &table).unwrap();
        assert_eq!(note.name, "A");
        assert!((note.frequency - 440.0).abs() < 1e-9);
        assert!(note.cents > 0.0);
    }

    #[test]
    fn nearest_string_matches_open_e2() {
        let (registry, table) = setup();
        let mapper = NoteMapper::default();
        let note = mapper.classify(82.41, &registry, &table).unwrap();
        assert_eq!(note.name, "E");
        assert_eq!(note.octave, 2);
        assert_eq!(note.cents, 0.0);
        assert!((note.frequency - 82.41).abs() < 0.01);
    }

    #[test]
    fn nearest_string_follows_transposition() {
        let (registry, table) = setup();
        registry.set_offset(-1);
        let mapper = NoteMapper::default();
        // D#2, where the low E lands a semitone down.
        let note = mapper.classify(77.78, &registry, &table).unwrap();
        assert_eq!(note.name, "D#");
        assert_eq!(note.octave, 2);
        assert!(note.cents.abs() <= 1.0);
    }

    #[test]
    fn cents_are_rounded_half_away_from_zero() {
        let (registry, table) = setup();
        let mapper = NoteMapper::default();
        // 10 cents sharp of A2: 110 * 2^(10/1200).
        let freq = 110.0 * 2.0_f64.powf(10.0 / 1200.0);
        let note = mapper.classify(freq, &registry, &table).unwrap();
        assert_eq!(note.cents, 10.0);
        assert_eq!(note.cents.fract(), 0.0);
    }

    #[test]
    fn confidence_is_bounded() {
        let (registry, table) = setup();
        let mapper = NoteMapper::default();
        for freq in [20.0, 82.41, 100.0, 329.63, 500.0, 2000.0] {
            let note = mapper.classify(freq, &registry, &table).unwrap();
            assert!(
                (0.0..=1.0).contains(&note.confidence),
                "confidence out of bounds for {} Hz",
                freq
            );
        }
    }

    #[test]
    fn confidence_decreases_with_deviation() {
        let (registry, table) = setup();
        let mapper = NoteMapper::default();
        // Both inputs sit nearest to A2; deviations of 0.5 Hz and 2 Hz.
        let close = mapper.classify(110.5, &registry, &table).unwrap();
        let far = mapper.classify(112.0, &registry, &table).unwrap();
        assert!(close.confidence >= far.confidence);
    }

    #[test]
    fn out_of_range_offset_fails_nearest_string_mode() {
        let (registry, table) = setup();
        registry.set_offset(25);
        let mapper = NoteMapper::default();
        assert_eq!(
            mapper.classify(110.0, &registry, &table).unwrap_err(),
            TunerError::InvalidOffset(25)
        );
    }
}
