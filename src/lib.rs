//! # Plettro - Guitar Note Detection
//!
//! Detects which single note is being played on a guitar from a realtime
//! mono sample stream, and reports every fretboard position where that
//! note can be fingered. Monophonic only.
//!
//! ## Architecture
//!
//! Plettro is an umbrella crate that coordinates:
//! - **plettro-theory** - Semitones, note names, tunings, fret mapping
//! - **plettro-analysis** - Period estimation (normalized
//!   autocorrelation), the note detection state machine, sample sources,
//!   and the live analysis loop
//!
//! The embedder owns the audio device: it opens the input stream, downmixes
//! to mono `f32`, and pushes samples into the producer half of the
//! session's ring buffer from the audio callback. The analyzer thread
//! drains the ring on a ~20 ms tick and reports `NoteOn`/`NoteOff`
//! transitions to the registered consumer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plettro::prelude::*;
//!
//! let (session, mut producer) = DetectionSession::builder()
//!     .sample_rate(44100)
//!     .consumer(|event: &NoteEvent| match event {
//!         NoteEvent::NoteOn { note, fingering } => println!("{note}: {fingering}"),
//!         NoteEvent::NoteOff => println!("silence"),
//!     })
//!     .build()?;
//!
//! // In the audio callback:
//! producer.push_slice(&mono_samples);
//! ```

/// Re-export of plettro-theory for direct access
pub use plettro_theory as theory;

/// Re-export of plettro-analysis for direct access
pub use plettro_analysis as analysis;

// Theory types
pub use plettro_theory::{note_frequency, Fingering, Semitone, Tuning};

// Analysis types
pub use plettro_analysis::{
    DetectionConfig, NoteConsumer, NoteDetector, NoteEvent, PeriodEstimate, PeriodEstimator,
    RingSource, SampleSource, SliceSource,
};

mod builder;
mod error;
mod session;

pub use builder::DetectionSessionBuilder;
pub use error::{Error, Result};
pub use session::{DetectionSession, SampleProducer};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        DetectionConfig, DetectionSession, DetectionSessionBuilder, Fingering, NoteEvent,
        Semitone, Tuning,
    };
}
