//! # Plettro Analysis
//!
//! Signal analysis for monophonic guitar note detection:
//!
//! - **Period estimation**: normalized autocorrelation with sub-sample
//!   peak interpolation and octave-error correction
//! - **Note detection**: the realtime state machine that gates estimates
//!   through amplitude/quality filters and emits stable note transitions
//! - **Sample sources**: the seam to the embedder's audio transport,
//!   including a wait-free SPSC ring adapter
//! - **Live detection**: the background analysis loop and its lock-free
//!   shared state
//!
//! The detector operates on raw mono `&[f32]` windows; audio device
//! handling belongs to the embedder.

pub mod detector;
pub mod error;
pub mod live;
pub mod period;
pub mod source;

// Re-export main types at crate root for convenience
pub use detector::{
    DetectionConfig, NoteConsumer, NoteDetector, NoteEvent, DETECT_HIGHEST, DETECT_LOWEST,
    MIN_QUALITY, NOISE_THRESHOLD, PEAKS_SIZE, RAISE_THRESHOLD, STALE_SECONDS,
};
pub use error::{Error, Result};
pub use live::{run_detection_thread, LiveDetectionState, TICK};
pub use period::{PeriodEstimate, PeriodEstimator};
pub use source::{RingSource, SampleSource, SliceSource};

// The SPSC transport is part of the public session API (the producer half
// is handed to the embedder), so expose the crate it comes from.
pub use ringbuf;
