//! # Chromatic Math Module
//!
//! This module provides the equal-temperament arithmetic shared by every
//! other component: MIDI/frequency conversions, cent deviation, semitone
//! transposition ratios, and note-name parsing/spelling.
//!
//! ## Features
//! - Equal temperament frequency calculations (A4 = 440 Hz)
//! - Cent deviation calculations for tuning accuracy
//! - Semitone transposition ratios with a precomputed cache
//! - Note name parsing ("C#3" -> pitch class + octave) and transposition
//!
//! Every display name in the engine is derived through [`transpose_name`],
//! never from a hand-authored table, so the tuning table and the note
//! mapper can never disagree about spelling.

use once_cell::sync::Lazy;

/// Reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI_NOTE: i32 = 69;

/// Smallest supported transposition in semitones.
pub const MIN_OFFSET: i32 = -12;

/// Largest supported transposition in semitones.
pub const MAX_OFFSET: i32 = 12;

/// Pitch-class names in chromatic order starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Transposition ratios for every supported offset, computed once at
/// startup from the equal-temperament formula itself. Serving ratios from
/// this cache is guaranteed to agree with `2^(s/12)` because it *is*
/// `2^(s/12)`.
static SEMITONE_RATIOS: Lazy<[f64; 25]> = Lazy::new(|| {
    let mut ratios = [0.0; 25];
    for (i, ratio) in ratios.iter_mut().enumerate() {
        let semitones = i as i32 + MIN_OFFSET;
        *ratio = 2.0_f64.powf(semitones as f64 / 12.0);
    }
    ratios
});

/// Returns true if `semitones` is within the supported transposition range.
pub fn offset_in_range(semitones: i32) -> bool {
    (MIN_OFFSET..=MAX_OFFSET).contains(&semitones)
}

/// The frequency ratio of a transposition by `semitones`.
///
/// Offset 0 is an exact identity (no floating error introduced). Offsets
/// in [-12, 12] come from the precomputed cache; anything outside is still
/// computed from the formula so lenient callers get a mathematically
/// consistent (if musically nonsensical) result.
pub fn semitone_ratio(semitones: i32) -> f64 {
    if semitones == 0 {
        return 1.0;
    }
    if offset_in_range(semitones) {
        SEMITONE_RATIOS[(semitones - MIN_OFFSET) as usize]
    } else {
        2.0_f64.powf(semitones as f64 / 12.0)
    }
}

/// Calculates the frequency of a MIDI note in equal temperament.
///
/// # Arguments
/// * `midi_note` - MIDI note number (A4 = 69)
///
/// # Returns
/// * Frequency in Hz
pub fn midi_to_frequency(midi_note: i32) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf((midi_note - A4_MIDI_NOTE) as f64 / 12.0)
}

/// The MIDI note nearest to a frequency (round half away from zero).
pub fn frequency_to_midi(freq: f64) -> i32 {
    (12.0 * (freq / A4_FREQUENCY).log2() + A4_MIDI_NOTE as f64).round() as i32
}

/// Calculates the deviation of `freq` from `target_freq` in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// The result is unrounded; classification code rounds it half away from
/// zero to get the integer-valued cents carried on a [`crate::Note`].
pub fn cents_between(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Spells a MIDI note as `(pitch_class_name, octave)` in scientific pitch
/// notation (octave changes at C; middle C = C4 = MIDI 60).
pub fn spell_midi(midi_note: i32) -> (&'static str, i32) {
    let class = midi_note.rem_euclid(12) as usize;
    let octave = midi_note.div_euclid(12) - 1;
    (NOTE_NAMES[class], octave)
}

/// Parses a note name like "E2" or "C#3" into `(pitch_class_index, octave)`.
///
/// # Returns
/// * `Some((class, octave))` - index into [`NOTE_NAMES`] plus the octave
/// * `None` - the string is not a valid note name
pub fn parse_note_name(name: &str) -> Option<(usize, i32)> {
    let digits_at = name.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let (class_part, octave_part) = name.split_at(digits_at);
    let class = NOTE_NAMES.iter().position(|&n| n == class_part)?;
    let octave = octave_part.parse::<i32>().ok()?;
    Some((class, octave))
}

/// Transposes a note name by `semitones` using chromatic-interval
/// arithmetic, carrying the octave across C ("B3" + 1 -> "C4").
///
/// # Returns
/// * `Some(name)` - the transposed full note name
/// * `None` - `name` did not parse as a note name
pub fn transpose_name(name: &str, semitones: i32) -> Option<String> {
    let (class, octave) = parse_note_name(name)?;
    // Work in MIDI space so the octave carry falls out of div_euclid.
    let midi = (octave + 1) * 12 + class as i32 + semitones;
    let (new_name, new_octave) = spell_midi(midi);
    Some(format!("{}{}", new_name, new_octave))
}
