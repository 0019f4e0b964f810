//! Live detection via ring buffer tap.
//!
//! Runs the detector on a background thread, reading from a SPSC ring
//! buffer fed by the audio producer. Events go to the session's consumer
//! callback synchronously; the latest event is also published through
//! `ArcSwap` for lock-free polling from any thread.

use crate::detector::{NoteConsumer, NoteDetector, NoteEvent};
use crate::source::RingSource;
use arc_swap::ArcSwap;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Wake interval of the analysis thread.
pub const TICK: Duration = Duration::from_millis(20);

/// Shared state between the analysis thread and its session handle.
///
/// All fields are lock-free for reads from any thread.
pub struct LiveDetectionState {
    /// Latest emitted event, `None` until the first transition.
    latest: ArcSwap<Option<NoteEvent>>,
    /// Set to false to signal the analysis thread to stop.
    running: AtomicBool,
}

impl LiveDetectionState {
    pub fn new() -> Self {
        Self {
            latest: ArcSwap::from_pointee(None),
            running: AtomicBool::new(true),
        }
    }

    /// Signal the analysis thread to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Check if the analysis thread should keep running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Latest event, if any transition has happened yet.
    pub fn latest(&self) -> Arc<Option<NoteEvent>> {
        self.latest.load_full()
    }

    fn publish(&self, event: &NoteEvent) {
        self.latest.store(Arc::new(Some(event.clone())));
    }
}

impl Default for LiveDetectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the live detection loop.
///
/// Wakes every [`TICK`], drains whatever the ring holds through the
/// detector, and forwards events to `consumer` while mirroring them into
/// `state`. Blocks until `state.stop()` is called; a final drain runs
/// after the stop signal so trailing samples are not lost. Returns the
/// detector for post-session inspection.
pub fn run_detection_thread(
    mut detector: NoteDetector,
    mut source: RingSource,
    state: Arc<LiveDetectionState>,
    mut consumer: Box<dyn NoteConsumer>,
) -> NoteDetector {
    debug!(
        sample_rate = detector.sample_rate(),
        window = detector.window_len(),
        "detection thread started"
    );

    let publish_state = state.clone();
    let mut forward = move |event: &NoteEvent| {
        publish_state.publish(event);
        consumer.on_event(event);
    };

    while state.is_running() {
        detector.analyze(&mut source, &mut forward);
        std::thread::sleep(TICK);
    }

    // Cancellation is honored at window boundaries only; one last drain
    // picks up samples produced between the final tick and the stop.
    detector.analyze(&mut source, &mut forward);

    debug!("detection thread stopped");
    detector
}
