//! Note detection: the realtime state machine around the period estimator.
//!
//! Each [`NoteDetector::analyze`] call drains one window from a
//! [`SampleSource`], estimates the fundamental period, maps it to a
//! semitone and a set of fretboard positions, and filters the reading
//! through amplitude and pitch-class gates before emitting a stable
//! `NoteOn`/`NoteOff` stream to a [`NoteConsumer`].

use crate::error::{Error, Result};
use crate::period::{PeriodEstimate, PeriodEstimator};
use crate::source::SampleSource;
use plettro_theory::{Fingering, Semitone, Tuning};
use tracing::{debug, trace};

/// Minimum NAC quality for a period estimate to be trusted.
pub const MIN_QUALITY: f64 = 0.85;

/// Minimum per-period amplitude peak for the signal to count as sounding.
pub const NOISE_THRESHOLD: f32 = 0.10;

/// Amplitude jump between consecutive periods that counts as a re-attack.
pub const RAISE_THRESHOLD: f32 = 0.12;

/// Length of the per-period amplitude-peak history ring.
pub const PEAKS_SIZE: usize = 100;

/// Seconds without a successful update before the current note is dropped.
pub const STALE_SECONDS: f64 = 1.0;

/// Lowest frequency searched by default: E1.
pub const DETECT_LOWEST: Semitone = Semitone::new(7);

/// Highest frequency searched by default: E7.
pub const DETECT_HIGHEST: Semitone = Semitone::new(79);

/// Detection parameters. `Default` reproduces the standard-guitar setup.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Lower bound of the frequency search range.
    pub search_low: Semitone,
    /// Upper bound of the frequency search range.
    pub search_high: Semitone,
    pub tuning: Tuning,
    /// Highest fret considered playable.
    pub frets: u8,
    pub min_quality: f64,
    pub noise_threshold: f32,
    pub raise_threshold: f32,
    pub stale_seconds: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            search_low: DETECT_LOWEST,
            search_high: DETECT_HIGHEST,
            tuning: Tuning::standard(),
            frets: plettro_theory::DEFAULT_FRETS,
            min_quality: MIN_QUALITY,
            noise_threshold: NOISE_THRESHOLD,
            raise_threshold: RAISE_THRESHOLD,
            stale_seconds: STALE_SECONDS,
        }
    }
}

/// A stable note transition emitted by the detector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum NoteEvent {
    /// A note started (or changed), with every fretboard position that
    /// produces it under the configured tuning.
    NoteOn {
        note: Semitone,
        fingering: Fingering,
    },
    /// The signal fell to silence or noise.
    NoteOff,
}

/// Receives note transitions, synchronously on the analysis thread.
///
/// Implemented for any `FnMut(&NoteEvent) + Send` closure.
pub trait NoteConsumer: Send {
    fn on_event(&mut self, event: &NoteEvent);
}

impl<F> NoteConsumer for F
where
    F: FnMut(&NoteEvent) + Send,
{
    fn on_event(&mut self, event: &NoteEvent) {
        self(event)
    }
}

/// Monophonic note detector for a single recording session.
///
/// Owns the period estimator and all filter state; mutated only on the
/// analysis path, so it lives on (and is `Send` to) the analyzer thread.
#[derive(Debug)]
pub struct NoteDetector {
    sample_rate: u32,
    min_period: usize,
    max_period: usize,
    stale_samples: u32,
    config: DetectionConfig,
    estimator: PeriodEstimator,
    /// Last note emitted, `None` while silent.
    last_detected: Option<Semitone>,
    /// Circular history of per-period amplitude peaks; `peaks[last_peak]`
    /// is the most recent.
    peaks: [f32; PEAKS_SIZE],
    last_peak: usize,
    /// Samples skipped since the last successful update.
    dropped_samples: u32,
}

impl NoteDetector {
    /// Build a detector for a stream at `sample_rate` Hz.
    ///
    /// Fails when the rate is zero, the tuning is empty, or the search
    /// range degenerates at this rate (the high bound must leave a
    /// minimum period of at least two samples).
    pub fn new(sample_rate: u32, config: DetectionConfig) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if config.tuning.strings() == 0 {
            return Err(Error::EmptyTuning);
        }

        let rate = f64::from(sample_rate);
        let min_period = (rate / config.search_high.frequency()).floor() as usize;
        let max_period = (rate / config.search_low.frequency()).ceil() as usize;
        if min_period <= 1 || max_period <= min_period {
            return Err(Error::InvalidSearchRange {
                min_period,
                max_period,
                sample_rate,
            });
        }

        let stale_samples = (config.stale_seconds * rate) as u32;

        Ok(Self {
            sample_rate,
            min_period,
            max_period,
            stale_samples,
            config,
            estimator: PeriodEstimator::new(),
            last_detected: None,
            peaks: [0.0; PEAKS_SIZE],
            last_peak: PEAKS_SIZE - 1,
            dropped_samples: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples a source must hold before a window can be analyzed.
    pub fn window_len(&self) -> usize {
        2 * self.max_period
    }

    /// The note currently considered sounding, if any.
    pub fn current_note(&self) -> Option<Semitone> {
        self.last_detected
    }

    /// Analyze everything the source currently holds.
    ///
    /// With fewer than [`window_len`](Self::window_len) samples available
    /// this returns without consuming, so the next call re-sees the same
    /// data. Otherwise the whole available region is analyzed as one
    /// window and released.
    pub fn analyze(&mut self, source: &mut dyn SampleSource, consumer: &mut dyn NoteConsumer) {
        let available = source.available();
        if available < self.window_len() {
            return;
        }

        // Watchdog: a second of gated blocks means the note died without
        // a clean sub-threshold reading (string muted mid-decay).
        if self.dropped_samples > self.stale_samples {
            trace!(dropped = self.dropped_samples, "stale note timed out");
            self.emit_note_off(consumer);
            self.dropped_samples = 0;
        }

        let window = source.view(available);
        self.process_window(window, consumer);
        source.advance(available);
    }

    fn process_window(&mut self, x: &[f32], consumer: &mut dyn NoteConsumer) {
        let (period, peak, quality) =
            match self.estimator.estimate(x, self.min_period, self.max_period) {
                PeriodEstimate::Pitch {
                    period,
                    peak,
                    quality,
                } => (period, peak, quality),
                PeriodEstimate::NoPeak => {
                    self.drop_window(x.len());
                    return;
                }
            };

        if !period.is_finite() || period <= 0.0 || quality < self.config.min_quality {
            trace!(quality, "window gated on periodicity quality");
            self.drop_window(x.len());
            return;
        }

        let frequency = f64::from(self.sample_rate) / period;
        let Some((note, _)) = Semitone::from_frequency(frequency) else {
            self.drop_window(x.len());
            return;
        };
        let fingering = self.config.tuning.fingering(note, self.config.frets);
        if fingering.playable_count() == 0 {
            trace!(%note, frequency, "window gated on playability");
            self.drop_window(x.len());
            return;
        }

        // Per-period amplitude envelope over the window. A jump relative
        // to the previous period's peak marks a re-attack; the comparison
        // reads the history before this period's peak is stored.
        let mut quick_raise = false;
        let mut min_surpassed = false;
        let mut j = 0;
        while j + peak <= x.len() {
            let peak_amp = x[j..j + peak]
                .iter()
                .fold(0.0f32, |acc, &sample| acc.max(sample.abs()));
            if peak_amp - self.peaks[self.last_peak] > self.config.raise_threshold {
                quick_raise = true;
            }
            self.last_peak = (self.last_peak + 1) % PEAKS_SIZE;
            self.peaks[self.last_peak] = peak_amp;
            if peak_amp > self.config.noise_threshold {
                min_surpassed = true;
            }
            j += peak;
        }

        // The envelope pass counts as a successful update either way.
        self.dropped_samples = 0;

        if !min_surpassed {
            self.emit_note_off(consumer);
            return;
        }

        let transition = match self.last_detected {
            None => true,
            Some(last) => {
                // Same pitch class or a perfect fifth away is read as the
                // held note (or one of its surviving harmonic ghosts)
                // unless a fresh attack says otherwise.
                let delta = (note.value() - last.value()).abs() % 12;
                quick_raise || !(delta == 0 || delta == 7)
            }
        };
        if transition {
            debug!(%note, frequency, quality, "note on");
            self.last_detected = Some(note);
            consumer.on_event(&NoteEvent::NoteOn { note, fingering });
        }
    }

    fn drop_window(&mut self, len: usize) {
        self.dropped_samples = self.dropped_samples.saturating_add(len as u32);
    }

    fn emit_note_off(&mut self, consumer: &mut dyn NoteConsumer) {
        if self.last_detected.take().is_some() {
            debug!("note off");
            consumer.on_event(&NoteEvent::NoteOff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RingSource, SliceSource};
    use ringbuf::{
        traits::{Producer, Split},
        HeapRb,
    };

    const RATE: u32 = 44100;

    fn detector() -> NoteDetector {
        NoteDetector::new(RATE, DetectionConfig::default()).unwrap()
    }

    fn sine_block(frequency: f64, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / f64::from(RATE);
                amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
            })
            .collect()
    }

    fn ring_setup(capacity: usize) -> (ringbuf::HeapProd<f32>, RingSource) {
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        (producer, RingSource::new(consumer))
    }

    #[test]
    fn derives_period_range_from_search_bounds() {
        let detector = detector();
        // E7 is ~2637 Hz and E1 ~41.2 Hz at 44.1 kHz.
        assert_eq!(detector.min_period, 16);
        assert_eq!(detector.max_period, 1071);
        assert_eq!(detector.window_len(), 2142);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(matches!(
            NoteDetector::new(0, DetectionConfig::default()),
            Err(Error::InvalidSampleRate)
        ));
    }

    #[test]
    fn rejects_degenerate_search_range() {
        // At 1 kHz the E7 upper bound leaves no searchable period.
        assert!(matches!(
            NoteDetector::new(1000, DetectionConfig::default()),
            Err(Error::InvalidSearchRange { .. })
        ));
    }

    #[test]
    fn a440_produces_single_note_on() {
        let mut detector = detector();
        let mut source = SliceSource::new(sine_block(440.0, 0.8, 2142));
        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            detector.analyze(&mut source, &mut consumer);
        }

        assert_eq!(events.len(), 1);
        let NoteEvent::NoteOn { note, fingering } = &events[0] else {
            panic!("expected NoteOn, got {:?}", events[0]);
        };
        assert_eq!(*note, Semitone::new(48));
        let positions: Vec<_> = fingering.iter().collect();
        assert_eq!(
            positions,
            vec![Some(5), Some(10), Some(14), Some(19), None, None]
        );
        assert_eq!(detector.current_note(), Some(Semitone::new(48)));
    }

    #[test]
    fn held_note_is_absorbed_silently() {
        let mut detector = detector();
        let window = detector.window_len();
        let (mut producer, mut source) = ring_setup(8 * window);
        let signal = sine_block(440.0, 0.8, 4 * window);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            for block in signal.chunks(window) {
                producer.push_slice(block);
                detector.analyze(&mut source, &mut consumer);
            }
        }

        // One attack, then holds: no further events for the same pitch.
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], NoteEvent::NoteOn { note, .. } if note == Semitone::new(48)));
    }

    #[test]
    fn insufficient_samples_are_left_in_place() {
        let mut detector = detector();
        let mut source = SliceSource::new(sine_block(440.0, 0.8, 100));
        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            detector.analyze(&mut source, &mut consumer);
        }
        assert!(events.is_empty());
        assert_eq!(source.available(), 100);
    }

    #[test]
    fn silence_produces_no_events() {
        let mut detector = detector();
        let mut source = SliceSource::new(vec![0.0; 2142]);
        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            detector.analyze(&mut source, &mut consumer);
        }
        assert!(events.is_empty());
    }

    #[test]
    fn stale_note_times_out_with_single_note_off() {
        let mut detector = detector();
        let window = detector.window_len();
        let (mut producer, mut source) = ring_setup(4 * window);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            producer.push_slice(&sine_block(440.0, 0.8, window));
            detector.analyze(&mut source, &mut consumer);

            // Over a second of silence, one window at a time. Every window
            // fails the quality gate; once the dropped count passes the
            // stale threshold the held note is released exactly once.
            let silent = vec![0.0f32; window];
            for _ in 0..30 {
                producer.push_slice(&silent);
                detector.analyze(&mut source, &mut consumer);
            }
        }

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], NoteEvent::NoteOn { .. }));
        assert_eq!(events[1], NoteEvent::NoteOff);
        assert_eq!(detector.current_note(), None);
    }

    #[test]
    fn sub_threshold_amplitude_releases_the_note() {
        let mut detector = detector();
        let window = detector.window_len();
        let (mut producer, mut source) = ring_setup(4 * window);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            producer.push_slice(&sine_block(440.0, 0.8, window));
            detector.analyze(&mut source, &mut consumer);

            // Quiet but still periodic: the quality gate passes, the noise
            // gate does not. Repeated quiet windows emit no further events.
            for _ in 0..3 {
                producer.push_slice(&sine_block(440.0, 0.05, window));
                detector.analyze(&mut source, &mut consumer);
            }
        }

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], NoteEvent::NoteOn { .. }));
        assert_eq!(events[1], NoteEvent::NoteOff);
    }

    #[test]
    fn re_attack_of_the_same_note_is_reported_again() {
        let mut detector = detector();
        let window = detector.window_len();
        let (mut producer, mut source) = ring_setup(4 * window);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            for amplitude in [0.9, 0.2, 0.9] {
                producer.push_slice(&sine_block(440.0, amplitude, window));
                detector.analyze(&mut source, &mut consumer);
            }
        }

        // Dip keeps the note held; the rise back is a fresh attack.
        assert_eq!(events.len(), 2);
        for event in &events {
            assert!(matches!(event, NoteEvent::NoteOn { note, .. } if *note == Semitone::new(48)));
        }
    }

    #[test]
    fn perfect_fifth_is_absorbed_other_intervals_are_not() {
        let mut detector = detector();
        let window = detector.window_len();
        let (mut producer, mut source) = ring_setup(4 * window);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            // A4, then E5 (a fifth up, the classic harmonic ghost), then C5.
            for frequency in [440.0, 659.255, 523.251] {
                producer.push_slice(&sine_block(frequency, 0.5, window));
                detector.analyze(&mut source, &mut consumer);
            }
        }

        let notes: Vec<_> = events
            .iter()
            .map(|event| match event {
                NoteEvent::NoteOn { note, .. } => note.value(),
                NoteEvent::NoteOff => panic!("unexpected NoteOff"),
            })
            .collect();
        assert_eq!(notes, vec![48, 51]);
    }

    #[test]
    fn low_e_string_maps_to_open_position() {
        let mut detector = detector();
        let window = detector.window_len();
        // A plucked open string is harmonic-rich; stack a few partials.
        let e2 = Semitone::new(19).frequency();
        let signal: Vec<f32> = (0..window)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * e2 * i as f64 / f64::from(RATE);
                (0.6 * phase.sin() + 0.3 * (2.0 * phase).sin() + 0.15 * (3.0 * phase).sin())
                    as f32
            })
            .collect();
        let mut source = SliceSource::new(signal);

        let mut events = Vec::new();
        {
            let mut consumer = |event: &NoteEvent| events.push(event.clone());
            detector.analyze(&mut source, &mut consumer);
        }

        assert_eq!(events.len(), 1);
        let NoteEvent::NoteOn { note, fingering } = &events[0] else {
            panic!("expected NoteOn");
        };
        assert_eq!(*note, Semitone::new(19));
        let positions: Vec<_> = fingering.iter().collect();
        assert_eq!(positions, vec![None, None, None, None, None, Some(0)]);
    }
}
