//! # Tuning Offset Registry
//!
//! Single source of truth for "how many semitones is everything shifted
//! by right now". The registry is the one genuinely shared, mutable piece
//! of engine state: it is read on every classified sample and written
//! asynchronously by the tuning-control surface.
//!
//! Rather than ambient global state, the registry is an explicit handle
//! threaded through the note mapper and tuning table (wrap it in an `Arc`
//! to share it with a control thread). The offset lives in an `AtomicI32`,
//! so readers always observe a fully-formed integer (no torn reads) and
//! writers never block readers. Readers may lag a write by at most one
//! sample, which is acceptable at tens of samples per second.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::error::TunerError;
use crate::tuning;

/// Process-wide transposition state, created once at startup and passed
/// by reference to every frequency computation.
#[derive(Debug, Default)]
pub struct OffsetRegistry {
    semitones: AtomicI32,
}

impl OffsetRegistry {
    /// A registry initialized to zero transposition.
    pub fn new() -> Self {
        OffsetRegistry {
            semitones: AtomicI32::new(0),
        }
    }

    /// Replaces the current offset.
    ///
    /// This is the lenient setter: any integer is stored without
    /// validation, since clamping policy belongs to the tuning-control
    /// surface. Offsets outside [-12, +12] still transpose consistently
    /// through [`adjust_frequency`](Self::adjust_frequency), but are
    /// rejected by the strict tuning-table operations.
    pub fn set_offset(&self, semitones: i32) {
        self.semitones.store(semitones, Ordering::Relaxed);
    }

    /// Strict variant of [`set_offset`](Self::set_offset): rejects offsets
    /// outside [-12, +12] with [`TunerError::InvalidOffset`] and leaves
    /// the current offset untouched.
    pub fn set_offset_checked(&self, semitones: i32) -> Result<(), TunerError> {
        if !tuning::offset_in_range(semitones) {
            return Err(TunerError::InvalidOffset(semitones));
        }
        self.set_offset(semitones);
        Ok(())
    }

    /// The current offset in semitones.
    pub fn get_offset(&self) -> i32 {
        self.semitones.load(Ordering::Relaxed)
    }

    /// Transposes `freq` by the current offset: `freq * 2^(offset/12)`.
    ///
    /// Offset 0 is a fast-path identity that introduces no floating error.
    pub fn adjust_frequency(&self, freq: f64) -> f64 {
        let offset = self.get_offset();
        if offset == 0 {
            return freq;
        }
        freq * tuning::semitone_ratio(offset)
    }
}
