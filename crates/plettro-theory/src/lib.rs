//! # Plettro Theory
//!
//! Music theory primitives for guitar note detection:
//!
//! - **Semitones**: pitches counted from A0, with note-name parsing and
//!   12-TET frequency conversion
//! - **Tunings**: per-string open pitches and note → fret-position mapping
//!
//! All types are plain values with no framework dependencies.

pub mod semitone;
pub mod tuning;

pub use semitone::{note_frequency, Semitone, A0_HZ};
pub use tuning::{Fingering, Tuning, DEFAULT_FRETS};
