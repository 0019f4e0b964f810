//! Builder for configuring and starting a `DetectionSession`.

use crate::analysis::ringbuf::{traits::Split, HeapRb};
use crate::analysis::{
    run_detection_thread, DetectionConfig, LiveDetectionState, NoteConsumer, NoteDetector,
    RingSource,
};
use crate::session::SampleProducer;
use crate::theory::Tuning;
use crate::{DetectionSession, Result};
use std::sync::Arc;

/// Ring capacity as a multiple of the analysis window. Generous enough
/// that a producer outpacing the ~20 ms tick never overwrites unread
/// samples.
const RING_WINDOWS: usize = 16;

/// The sample rate is the one fixed input: it must match the stream the
/// embedder's producer delivers. Everything else defaults to the
/// standard-guitar setup of [`DetectionConfig`].
///
/// # Example
///
/// ```ignore
/// let (session, producer) = DetectionSession::builder()
///     .sample_rate(48000)
///     .tuning(Tuning::standard())
///     .consumer(|event: &NoteEvent| ui.send(event.clone()))
///     .build()?;
/// ```
pub struct DetectionSessionBuilder {
    sample_rate: u32,
    config: DetectionConfig,
    consumer: Option<Box<dyn NoteConsumer>>,
}

impl Default for DetectionSessionBuilder {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            config: DetectionConfig::default(),
            consumer: None,
        }
    }
}

impl DetectionSessionBuilder {
    /// Default: 44100
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Replace the whole detection configuration.
    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: standard six-string guitar tuning.
    pub fn tuning(mut self, tuning: Tuning) -> Self {
        self.config.tuning = tuning;
        self
    }

    /// Default: 22
    pub fn frets(mut self, frets: u8) -> Self {
        self.config.frets = frets;
        self
    }

    /// Register the event consumer. Without one, events are still
    /// observable by polling [`DetectionSession::latest`].
    pub fn consumer(mut self, consumer: impl NoteConsumer + 'static) -> Self {
        self.consumer = Some(Box::new(consumer));
        self
    }

    /// Validate the configuration, allocate the sample ring, and spawn
    /// the analyzer thread. Returns the session handle and the producer
    /// half of the ring for the embedder's audio callback.
    pub fn build(self) -> Result<(DetectionSession, SampleProducer)> {
        let detector = NoteDetector::new(self.sample_rate, self.config)?;

        let ring = HeapRb::<f32>::new(RING_WINDOWS * detector.window_len());
        let (producer, ring_consumer) = ring.split();
        let source = RingSource::new(ring_consumer);

        let state = Arc::new(LiveDetectionState::new());
        let thread_state = state.clone();
        let consumer = self
            .consumer
            .unwrap_or_else(|| Box::new(|_: &crate::analysis::NoteEvent| {}));

        let thread = std::thread::Builder::new()
            .name("plettro-detect".into())
            .spawn(move || run_detection_thread(detector, source, thread_state, consumer))
            .expect("failed to spawn detection thread");

        Ok((DetectionSession::from_parts(state, thread), producer))
    }
}
