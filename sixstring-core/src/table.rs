//! # Tuning Table Module
//!
//! Holds the canonical set of reference strings at zero transposition and
//! derives the transposed view for any supported semitone offset.
//!
//! ## Features
//! - Standard guitar table (E2 A2 D3 G3 B3 E4) plus arbitrary string sets
//! - Transposed frequencies via exact equal-temperament exponentiation
//! - Transposed display names via the same chromatic arithmetic the note
//!   mapper uses, never a hand-authored table
//! - O(1) lookup by canonical id, linear scan for nearest-to-frequency
//!
//! The `canonical_id` of a string (e.g. "E2") is its permanent key: it is
//! stable across transposition, while display name and frequency vary with
//! the offset. Offsets outside [-12, +12] are rejected with
//! `InvalidOffset` rather than clamped, so clamping policy stays with the
//! tuning-control surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TunerError;
use crate::tuning;

/// Standard guitar tuning, low string first.
pub const STANDARD_GUITAR: [(&str, f64); 6] = [
    ("E2", 82.41),
    ("A2", 110.0),
    ("D3", 146.83),
    ("G3", 196.0),
    ("B3", 246.94),
    ("E4", 329.63),
];

/// One reference string as seen at a particular transposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceString {
    /// Permanent key, stable across transposition (e.g. "E2").
    pub canonical_id: String,
    /// Transposed note name (e.g. "D#2" at -1 semitone).
    pub display_name: String,
    /// Transposed frequency in Hz.
    pub frequency: f64,
}

/// The canonical reference-string set at zero transposition.
///
/// Declaration order is significant: nearest-frequency ties resolve to the
/// first-declared string.
#[derive(Debug, Clone)]
pub struct TuningTable {
    // (canonical_id, base frequency at offset 0), in declaration order.
    strings: Vec<(String, f64)>,
    // canonical_id -> index into `strings`, for O(1) id lookups.
    index: BTreeMap<String, usize>,
}

impl TuningTable {
    /// Builds a table from `(canonical_id, base_frequency_hz)` pairs.
    ///
    /// Every id must parse as a note name ("E2", "C#3", ...) and every
    /// base frequency must be positive; otherwise there is nothing the
    /// engine could match against and construction fails with
    /// [`TunerError::NoReferenceMatch`].
    pub fn new<I, S>(entries: I) -> Result<Self, TunerError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut strings = Vec::new();
        let mut index = BTreeMap::new();
        for (id, freq) in entries {
            let id = id.into();
            if freq <= 0.0 || tuning::parse_note_name(&id).is_none() {
                return Err(TunerError::NoReferenceMatch);
            }
            index.insert(id.clone(), strings.len());
            strings.push((id, freq));
        }
        if strings.is_empty() {
            return Err(TunerError::NoReferenceMatch);
        }
        Ok(TuningTable { strings, index })
    }

    /// The standard six-string guitar table.
    pub fn standard_guitar() -> Self {
        // STANDARD_GUITAR is non-empty and well-formed, so this cannot fail.
        TuningTable::new(STANDARD_GUITAR).unwrap()
    }

    /// Number of strings in the table.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Canonical ids in declaration order.
    pub fn canonical_ids(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|(id, _)| id.as_str())
    }

    /// The full transposed view at `offset` semitones, one
    /// [`ReferenceString`] per string in declaration order. For an
    /// id-keyed lookup use [`reference`](Self::reference).
    pub fn transposed(&self, offset: i32) -> Result<Vec<ReferenceString>, TunerError> {
        if !tuning::offset_in_range(offset) {
            return Err(TunerError::InvalidOffset(offset));
        }
        let ratio = tuning::semitone_ratio(offset);
        Ok(self
            .strings
            .iter()
            .map(|(id, base)| ReferenceString {
                canonical_id: id.clone(),
                // Safe: every id was validated to parse at construction.
                display_name: tuning::transpose_name(id, offset).unwrap(),
                frequency: base * ratio,
            })
            .collect())
    }

    /// One string's transposed view, looked up by canonical id in O(1).
    pub fn reference(
        &self,
        canonical_id: &str,
        offset: i32,
    ) -> Result<Option<ReferenceString>, TunerError> {
        if !tuning::offset_in_range(offset) {
            return Err(TunerError::InvalidOffset(offset));
        }
        Ok(self.index.get(canonical_id).map(|&i| {
            let (id, base) = &self.strings[i];
            ReferenceString {
                canonical_id: id.clone(),
                display_name: tuning::transpose_name(id, offset).unwrap(),
                frequency: base * tuning::semitone_ratio(offset),
            }
        }))
    }

    /// The reference string whose transposed frequency is closest to
    /// `freq` by absolute Hz distance. Ties go to the first-declared
    /// string. The table is never empty, so a valid offset always matches.
    pub fn nearest(&self, freq: f64, offset: i32) -> Result<ReferenceString, TunerError> {
        if !tuning::offset_in_range(offset) {
            return Err(TunerError::InvalidOffset(offset));
        }
        let ratio = tuning::semitone_ratio(offset);
        // Strict < keeps the first-declared string on ties.
        let mut best = (0, f64::INFINITY);
        for (i, (_, base)) in self.strings.iter().enumerate() {
            let diff = (base * ratio - freq).abs();
            if diff < best.1 {
                best = (i, diff);
            }
        }
        let (id, base) = &self.strings[best.0];
        Ok(ReferenceString {
            canonical_id: id.clone(),
            display_name: tuning::transpose_name(id, offset).unwrap(),
            frequency: base * ratio,
        })
    }

    /// True if `freq` is within `tolerance_hz` of the named string's
    /// transposed frequency. Unknown ids are never near anything.
    pub fn is_near(
        &self,
        freq: f64,
        canonical_id: &str,
        offset: i32,
        tolerance_hz: f64,
    ) -> Result<bool, TunerError> {
        Ok(self
            .reference(canonical_id, offset)?
            .map(|s| (freq - s.frequency).abs() <= tolerance_hz)
            .unwrap_or(false))
    }
}
