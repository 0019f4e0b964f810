//! Detection session: owns the analyzer thread for one recording.

use crate::analysis::ringbuf::HeapProd;
use crate::analysis::{LiveDetectionState, NoteDetector, NoteEvent};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

/// A running detection session.
///
/// Built via [`DetectionSession::builder`], which also returns the
/// producer half of the sample ring: push mono `f32` samples in
/// `[-1, 1]` into it from the audio callback (the push is wait-free).
/// Events reach the registered consumer synchronously on the analyzer
/// thread; [`latest`](Self::latest) offers a lock-free pull alternative.
///
/// Dropping the session stops the analyzer after one final drain of
/// whatever the ring still holds.
///
/// # Example
///
/// ```ignore
/// use plettro::prelude::*;
///
/// let (session, mut producer) = DetectionSession::builder()
///     .sample_rate(44100)
///     .consumer(|event: &NoteEvent| println!("{event:?}"))
///     .build()?;
///
/// // audio callback:
/// producer.push_slice(&mono_samples);
///
/// let detector = session.stop();
/// ```
pub struct DetectionSession {
    state: Arc<LiveDetectionState>,
    thread: Option<JoinHandle<NoteDetector>>,
}

impl DetectionSession {
    pub fn builder() -> crate::DetectionSessionBuilder {
        crate::DetectionSessionBuilder::default()
    }

    /// Latest event, if any transition has happened yet.
    pub fn latest(&self) -> Arc<Option<NoteEvent>> {
        self.state.latest()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Stop the analyzer and return its detector for inspection.
    ///
    /// The thread drains remaining samples once before exiting, so a note
    /// played just before the stop is still reported.
    pub fn stop(mut self) -> Option<NoteDetector> {
        self.state.stop();
        let detector = self.thread.take().and_then(|handle| handle.join().ok());
        debug!("detection session stopped");
        detector
    }

    pub(crate) fn from_parts(
        state: Arc<LiveDetectionState>,
        thread: JoinHandle<NoteDetector>,
    ) -> Self {
        Self {
            state,
            thread: Some(thread),
        }
    }
}

impl Drop for DetectionSession {
    fn drop(&mut self) {
        self.state.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Producer half of a session's sample ring.
pub type SampleProducer = HeapProd<f32>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ringbuf::traits::Producer;
    use crate::theory::Semitone;
    use std::sync::Mutex;
    use std::time::Duration;

    #[test]
    fn session_reports_a4_and_stops_cleanly() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let (session, mut producer) = DetectionSession::builder()
            .sample_rate(44100)
            .consumer(move |event: &NoteEvent| sink.lock().unwrap().push(event.clone()))
            .build()
            .unwrap();
        assert!(session.is_running());

        let samples: Vec<f32> = (0..8192)
            .map(|i| {
                let t = i as f64 / 44100.0;
                (0.8 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32
            })
            .collect();
        producer.push_slice(&samples);

        std::thread::sleep(Duration::from_millis(100));
        let detector = session.stop().expect("analyzer thread panicked");

        assert_eq!(detector.current_note(), Some(Semitone::new(48)));
        let events = events.lock().unwrap();
        assert!(!events.is_empty());
        assert!(
            matches!(&events[0], NoteEvent::NoteOn { note, .. } if *note == Semitone::new(48))
        );
    }

    #[test]
    fn drop_joins_the_analyzer() {
        let (session, _producer) = DetectionSession::builder()
            .sample_rate(48000)
            .build()
            .unwrap();
        drop(session);
    }

    #[test]
    fn build_rejects_zero_rate() {
        assert!(DetectionSession::builder().sample_rate(0).build().is_err());
    }
}
