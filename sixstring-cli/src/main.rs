//! # Sixstring - Guitar Tuner CLI
//!
//! Thin command-line frontend for the sixstring engine. It plays the role
//! a microphone-driven UI would: it feeds a stream of detected
//! fundamental frequencies (here read from a file or stdin, one per
//! whitespace-separated token) through a tuner session and prints the
//! classified notes. All tuning logic lives in `sixstring-core`; this
//! binary is glue.
//!
//! ## Examples
//! ```text
//! sixstring --list-presets
//! sixstring --preset "Drop D" --strings
//! echo "82.41 110.0 0" | sixstring -
//! sixstring --mode chromatic --json samples.txt
//! ```

use std::fs;
use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;

use sixstring_core::mapper::{MapperMode, NoteMapper};
use sixstring_core::presets::{find_preset, TuningControl, DEFAULT_PRESETS};
use sixstring_core::registry::OffsetRegistry;
use sixstring_core::session::{CaptureSource, NoteEvent, TunerSession};
use sixstring_core::table::TuningTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Match the nearest reference string (guitar tuner behavior).
    Nearest,
    /// Pure equal-temperament note mapping.
    Chromatic,
}

impl From<Mode> for MapperMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Nearest => MapperMode::NearestString,
            Mode::Chromatic => MapperMode::Chromatic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sixstring", version, about = "Guitar tuner engine frontend")]
struct Cli {
    /// File of whitespace-separated frequencies in Hz, or "-" for stdin.
    input: Option<String>,

    /// List the built-in tuning presets and exit.
    #[arg(long)]
    list_presets: bool,

    /// Print the transposed reference strings for the active tuning and exit.
    #[arg(long)]
    strings: bool,

    /// Tuning preset to apply (e.g. "Drop D"), case-insensitive.
    #[arg(long)]
    preset: Option<String>,

    /// Additional semitone adjustment on top of the preset.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    nudge: i32,

    /// Note mapping mode.
    #[arg(long, value_enum, default_value_t = Mode::Nearest)]
    mode: Mode,

    /// In-tune tolerance in cents.
    #[arg(long, default_value_t = 10.0)]
    tolerance: f64,

    /// Emit one JSON object per sample instead of text.
    #[arg(long)]
    json: bool,
}

/// Capture source for pre-detected frequency streams: there is no device
/// to acquire, so starting always succeeds.
struct StreamSource;

impl CaptureSource for StreamSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }
    fn stop(&mut self) {}
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_presets {
        for preset in DEFAULT_PRESETS.iter() {
            println!(
                "{:<16} {:+3} semitones  {}",
                preset.name, preset.semitones, preset.description
            );
        }
        return Ok(());
    }

    let registry = Arc::new(OffsetRegistry::new());
    let mut control = TuningControl::new();
    if let Some(name) = &cli.preset {
        let Some(preset) = find_preset(name) else {
            bail!("unknown preset {:?}; try --list-presets", name);
        };
        control.select_preset(preset.clone(), &registry);
    }
    if cli.nudge != 0 {
        control.nudge(cli.nudge, &registry);
    }
    eprintln!("[CLI] Tuning: {}", control.display_name());

    let table = TuningTable::standard_guitar();

    if cli.strings {
        for string in table.transposed(registry.get_offset())? {
            println!(
                "{:<4} -> {:<4} {:>8.2} Hz",
                string.canonical_id, string.display_name, string.frequency
            );
        }
        return Ok(());
    }

    let samples = read_samples(cli.input.as_deref())?;
    eprintln!("[CLI] Processing {} samples", samples.len());

    let mut session = TunerSession::new(
        Box::new(StreamSource),
        NoteMapper::new(cli.mode.into()),
        table,
        Arc::clone(&registry),
    )
    .with_tolerance(cli.tolerance);
    let events: crossbeam_channel::Receiver<NoteEvent> = session.subscribe();

    session
        .start()
        .context("failed to start the tuner session")?;
    for &freq in &samples {
        session.on_sample(freq)?;
        // One event per sample, in arrival order.
        let event = events.recv()?;
        print_event(freq, &event, cli.json);
    }
    session.stop();

    Ok(())
}

/// Reads whitespace-separated frequencies; tokens that do not parse as a
/// number ("--", dropped frames) count as no-signal samples.
fn read_samples(input: Option<&str>) -> Result<Vec<f64>> {
    let text = match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
        }
    };
    Ok(text
        .split_whitespace()
        .map(|token| token.parse::<f64>().unwrap_or(0.0))
        .collect())
}

fn print_event(freq: f64, event: &NoteEvent, as_json: bool) {
    if as_json {
        let line = json!({
            "input_hz": freq,
            "note": &event.note,
            "full_name": event.note.full_name(),
            "status": event.status,
            "color": event.status.color(),
        });
        println!("{}", line);
        return;
    }
    if event.note.is_no_signal() {
        println!("{:>8.2} Hz -> --", freq);
        return;
    }
    println!(
        "{:>8.2} Hz -> {:<4} {:+5.0} cents  {:?}  (confidence {:.2})",
        freq,
        event.note.full_name(),
        event.note.cents,
        event.status,
        event.note.confidence
    );
}
