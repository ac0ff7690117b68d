//! # Tuner Session Module
//!
//! The thin state machine that owns session lifecycle and republishes
//! each classified note to subscribers.
//!
//! Phases: `Idle -> Listening -> Idle`, with `Listening` reachable again
//! from `Error` via a successful `start()`. The classification path
//! (`on_sample`) is synchronous and never blocks: it runs once per
//! detector callback and must complete before the next one. Only
//! start/stop touch the external capture resource.
//!
//! Note delivery uses crossbeam channels: each subscriber gets its own
//! unbounded receiver, events arrive in FIFO order within a listening
//! session, and nothing is dropped (sample rate is tens of Hz).

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::TunerError;
use crate::mapper::NoteMapper;
use crate::registry::OffsetRegistry;
use crate::status::{TuningStatus, DEFAULT_TOLERANCE_CENTS};
use crate::table::TuningTable;
use crate::Note;

/// The external audio/pitch-estimation collaborator.
///
/// The engine never sees PCM, sample rates or buffer sizes; it only asks
/// the collaborator to start or stop producing frequency samples.
/// `stop` must be idempotent: the session calls it on every `stop()`,
/// including when nothing was started, and when discarding a start
/// attempt that succeeded after cancellation.
pub trait CaptureSource {
    /// Begin producing samples. Failure reasons (permission denied,
    /// device busy, device missing, ...) are surfaced verbatim to the
    /// session's caller.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Release the capture resource.
    fn stop(&mut self);
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Listening,
    /// A failed start attempt; terminal only for that attempt. `start()`
    /// is always legal from here.
    Error(String),
}

/// One classified sample as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub note: Note,
    pub status: TuningStatus,
}

/// Token for an in-flight start attempt, used by frontends whose capture
/// acquisition resolves asynchronously. See [`TunerSession::begin_start`].
#[derive(Debug)]
pub struct StartAttempt {
    epoch: u64,
}

/// Owns the session lifecycle and the last-known classified note.
/// External collaborators read state through accessors or a subscription,
/// never by mutating it directly.
pub struct TunerSession {
    source: Box<dyn CaptureSource>,
    mapper: NoteMapper,
    table: TuningTable,
    registry: Arc<OffsetRegistry>,
    tolerance: f64,
    phase: SessionPhase,
    last_note: Note,
    last_status: TuningStatus,
    subscribers: Vec<Sender<NoteEvent>>,
    // Bumped by stop(); a StartAttempt from an older epoch is cancelled.
    epoch: u64,
}

impl TunerSession {
    pub fn new(
        source: Box<dyn CaptureSource>,
        mapper: NoteMapper,
        table: TuningTable,
        registry: Arc<OffsetRegistry>,
    ) -> Self {
        TunerSession {
            source,
            mapper,
            table,
            registry,
            tolerance: DEFAULT_TOLERANCE_CENTS,
            phase: SessionPhase::Idle,
            last_note: Note::no_signal(),
            last_status: TuningStatus::InTune,
            subscribers: Vec::new(),
            epoch: 0,
        }
    }

    /// Overrides the in-tune tolerance used for note events.
    pub fn with_tolerance(mut self, cents: f64) -> Self {
        self.tolerance = cents;
        self
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn last_note(&self) -> &Note {
        &self.last_note
    }

    pub fn last_status(&self) -> TuningStatus {
        self.last_status
    }

    /// Handle to the shared offset registry, for the control surface.
    pub fn registry(&self) -> Arc<OffsetRegistry> {
        Arc::clone(&self.registry)
    }

    /// The transposed reference-string set at the current offset, for
    /// display next to the needle.
    pub fn reference_strings(&self) -> Result<Vec<crate::table::ReferenceString>, TunerError> {
        self.table.transposed(self.registry.get_offset())
    }

    /// Registers a subscriber. Each subscriber receives every note event
    /// from now on, in arrival order.
    pub fn subscribe(&mut self) -> Receiver<NoteEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Starts listening by acquiring the capture resource synchronously.
    ///
    /// Legal from `Idle` and `Error`; a no-op while already `Listening`.
    /// On failure the session enters `Error(reason)` and the reason is
    /// returned verbatim, exactly once; there is no automatic retry.
    pub fn start(&mut self) -> Result<(), TunerError> {
        let Some(attempt) = self.begin_start() else {
            return Ok(());
        };
        let result = self.source.start();
        self.finish_start(attempt, result)
    }

    /// First half of an asynchronous start: returns a token for the
    /// attempt, or `None` (no-op) while already listening. The phase does
    /// not change until [`finish_start`](Self::finish_start) resolves the
    /// attempt, so a `stop()` in between cancels it cleanly.
    pub fn begin_start(&mut self) -> Option<StartAttempt> {
        if self.phase == SessionPhase::Listening {
            return None;
        }
        Some(StartAttempt { epoch: self.epoch })
    }

    /// Second half of an asynchronous start. If `stop()` was called while
    /// the attempt was in flight, its outcome is discarded: the session
    /// keeps whatever state the intervening calls left it in (`Idle`
    /// after a plain stop, `Listening` if a newer `start()` already
    /// succeeded), and a late acquisition is released unless a newer
    /// session is using the resource.
    pub fn finish_start(
        &mut self,
        attempt: StartAttempt,
        result: anyhow::Result<()>,
    ) -> Result<(), TunerError> {
        if attempt.epoch != self.epoch {
            // Cancelled while in flight; discard the outcome without
            // touching the phase: a newer start() may already be
            // listening, and its capture must not be released.
            if result.is_ok() && self.phase != SessionPhase::Listening {
                self.source.stop();
            }
            eprintln!("[SESSION] Discarded cancelled start attempt");
            return Ok(());
        }
        match result {
            Ok(()) => {
                self.phase = SessionPhase::Listening;
                eprintln!("[SESSION] Listening");
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                self.phase = SessionPhase::Error(reason.clone());
                eprintln!("[SESSION] Start failed: {}", reason);
                Err(TunerError::CaptureUnavailable(reason))
            }
        }
    }

    /// Stops listening. Legal from any state: releases the capture
    /// resource, resets the last note to the no-signal value, and cancels
    /// any in-flight start attempt.
    pub fn stop(&mut self) {
        self.epoch += 1;
        self.source.stop();
        self.phase = SessionPhase::Idle;
        self.last_note = Note::no_signal();
        self.last_status = TuningStatus::InTune;
        eprintln!("[SESSION] Stopped");
    }

    /// Processes one raw frequency sample.
    ///
    /// Only processed while `Listening`; a straggler sample arriving
    /// after stop is ignored, not an error. Silence (`freq <= 0`, NaN)
    /// classifies to the canonical no-note value.
    pub fn on_sample(&mut self, freq: f64) -> Result<(), TunerError> {
        if self.phase != SessionPhase::Listening {
            return Ok(());
        }
        let note = self.mapper.classify(freq, &self.registry, &self.table)?;
        let status = TuningStatus::classify_with_tolerance(note.cents, self.tolerance);
        self.last_note = note.clone();
        self.last_status = status;
        let event = NoteEvent { note, status };
        // Drop subscribers whose receiver side has gone away.
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MapperMode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Capture source double that counts starts/stops and can be told
    /// to fail.
    struct FakeSource {
        fail_with: Option<String>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn ok() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let starts = Arc::new(AtomicUsize::new(0));
            let stops = Arc::new(AtomicUsize::new(0));
            (
                FakeSource {
                    fail_with: None,
                    starts: Arc::clone(&starts),
                    stops: Arc::clone(&stops),
                },
                starts,
                stops,
            )
        }

        fn failing(reason: &str) -> Self {
            FakeSource {
                fail_with: Some(reason.to_string()),
                starts: Arc::new(AtomicUsize::new(0)),
                stops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl CaptureSource for FakeSource {
        fn start(&mut self) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            match self.fail_with.take() {
                Some(reason) => Err(anyhow::anyhow!(reason)),
                None => Ok(()),
            }
        }

        fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session_with(source: FakeSource) -> TunerSession {
        TunerSession::new(
            Box::new(source),
            NoteMapper::new(MapperMode::NearestString),
            TuningTable::standard_guitar(),
            Arc::new(OffsetRegistry::new()),
        )
    }

    #[test]
    fn lifecycle_idle_listening_idle() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source);
        assert_eq!(*session.phase(), SessionPhase::Idle);
        session.start().unwrap();
        assert_eq!(*session.phase(), SessionPhase::Listening);
        session.stop();
        assert_eq!(*session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn failed_start_surfaces_reason_verbatim() {
        let mut session = session_with(FakeSource::failing("permission denied"));
        let err = session.start().unwrap_err();
        assert_eq!(
            err,
            TunerError::CaptureUnavailable("permission denied".to_string())
        );
        assert_eq!(
            *session.phase(),
            SessionPhase::Error("permission denied".to_string())
        );
    }

    #[test]
    fn start_is_legal_from_error() {
        // fail_with is consumed on the first start, so the retry succeeds.
        let mut session = session_with(FakeSource::failing("device busy"));
        assert!(session.start().is_err());
        session.start().unwrap();
        assert_eq!(*session.phase(), SessionPhase::Listening);
    }

    #[test]
    fn no_automatic_retry_on_failure() {
        let (source, starts, _) = FakeSource::ok();
        let mut session = session_with(source);
        session.start().unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        // start() while listening is a no-op, not a second acquisition.
        session.start().unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn samples_update_last_note_while_listening() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source);
        session.start().unwrap();
        session.on_sample(82.41).unwrap();
        assert_eq!(session.last_note().full_name(), "E2");
        assert_eq!(session.last_status(), TuningStatus::InTune);
    }

    #[test]
    fn straggler_samples_are_ignored_when_idle() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source);
        session.on_sample(82.41).unwrap();
        assert!(session.last_note().is_no_signal());
        session.start().unwrap();
        session.on_sample(82.41).unwrap();
        session.stop();
        session.on_sample(440.0).unwrap();
        assert!(session.last_note().is_no_signal());
    }

    #[test]
    fn stop_resets_last_note_and_releases_source() {
        let (source, _, stops) = FakeSource::ok();
        let mut session = session_with(source);
        session.start().unwrap();
        session.on_sample(110.0).unwrap();
        assert!(!session.last_note().is_no_signal());
        session.stop();
        assert!(session.last_note().is_no_signal());
        assert!(stops.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn stop_during_pending_start_discards_late_success() {
        let (source, _, stops) = FakeSource::ok();
        let mut session = session_with(source);
        let attempt = session.begin_start().unwrap();
        session.stop();
        // The in-flight attempt resolves successfully after the stop; the
        // session must settle into Idle and release the resource.
        session.finish_start(attempt, Ok(())).unwrap();
        assert_eq!(*session.phase(), SessionPhase::Idle);
        assert_eq!(stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn late_start_resolution_leaves_new_session_listening() {
        let (source, _, stops) = FakeSource::ok();
        let mut session = session_with(source);
        let attempt = session.begin_start().unwrap();
        session.stop();
        // A fresh start succeeds before the old attempt resolves.
        session.start().unwrap();
        assert_eq!(*session.phase(), SessionPhase::Listening);
        session.finish_start(attempt, Ok(())).unwrap();
        // The stale success must neither demote the phase nor release
        // the capture the new session is using.
        assert_eq!(*session.phase(), SessionPhase::Listening);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribers_receive_notes_in_order() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source);
        let rx = session.subscribe();
        session.start().unwrap();
        session.on_sample(82.41).unwrap();
        session.on_sample(110.0).unwrap();
        session.on_sample(0.0).unwrap();

        let first = rx.recv().unwrap();
        assert_eq!(first.note.full_name(), "E2");
        let second = rx.recv().unwrap();
        assert_eq!(second.note.full_name(), "A2");
        let third = rx.recv().unwrap();
        assert!(third.note.is_no_signal());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source);
        let rx = session.subscribe();
        drop(rx);
        session.start().unwrap();
        // Must not error or grow the subscriber list forever.
        session.on_sample(82.41).unwrap();
        assert!(session.subscribers.is_empty());
    }

    #[test]
    fn tolerance_override_changes_status() {
        let (source, _, _) = FakeSource::ok();
        let mut session = session_with(source).with_tolerance(2.0);
        session.start().unwrap();
        // ~8 cents sharp of A2: in tune at 10 cents, sharp at 2.
        session.on_sample(110.5).unwrap();
        assert_eq!(session.last_status(), TuningStatus::Sharp);
    }
}
