//! Sample sources: the seam between the audio producer and the detector.
//!
//! The detector pulls mono `f32` windows through [`SampleSource`]. The
//! realtime implementation is [`RingSource`], fed by a wait-free SPSC ring
//! whose producer half lives in the embedder's audio callback.

use ringbuf::{
    traits::{Consumer, Observer},
    HeapCons,
};

/// A pull-based source of mono samples.
///
/// `view` must not consume: a caller that finds too few samples returns
/// without calling `advance` and re-sees the same data on the next call.
pub trait SampleSource {
    /// Samples currently readable.
    fn available(&self) -> usize;

    /// A contiguous window of the next `len` samples, without consuming
    /// them. `len` must not exceed [`available`](Self::available).
    fn view(&mut self, len: usize) -> &[f32];

    /// Release `len` samples back to the producer.
    fn advance(&mut self, len: usize);
}

/// [`SampleSource`] over the consumer half of a heap SPSC ring.
///
/// A heap ring's occupied region may wrap, so the contiguous window is
/// assembled into an owned staging buffer. Staged samples stay readable
/// until `advance` releases them, which preserves the retry contract even
/// though they have already left the ring.
pub struct RingSource {
    consumer: HeapCons<f32>,
    staged: Vec<f32>,
}

impl RingSource {
    pub fn new(consumer: HeapCons<f32>) -> Self {
        Self {
            consumer,
            staged: Vec::new(),
        }
    }
}

impl SampleSource for RingSource {
    fn available(&self) -> usize {
        self.staged.len() + self.consumer.occupied_len()
    }

    fn view(&mut self, len: usize) -> &[f32] {
        while self.staged.len() < len {
            let have = self.staged.len();
            self.staged.resize(len, 0.0);
            let read = self.consumer.pop_slice(&mut self.staged[have..]);
            self.staged.truncate(have + read);
            if read == 0 {
                break;
            }
        }
        &self.staged[..len]
    }

    fn advance(&mut self, len: usize) {
        let staged = len.min(self.staged.len());
        self.staged.drain(..staged);
        for _ in staged..len {
            if self.consumer.try_pop().is_none() {
                break;
            }
        }
    }
}

/// In-memory [`SampleSource`] over a fixed buffer, for offline analysis
/// and tests.
pub struct SliceSource {
    samples: Vec<f32>,
    position: usize,
}

impl SliceSource {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }
}

impl SampleSource for SliceSource {
    fn available(&self) -> usize {
        self.samples.len() - self.position
    }

    fn view(&mut self, len: usize) -> &[f32] {
        &self.samples[self.position..self.position + len]
    }

    fn advance(&mut self, len: usize) {
        self.position = (self.position + len).min(self.samples.len());
    }
}
