//! Fundamental period estimation via normalized autocorrelation.
//!
//! The estimator scans a lag range for the strongest normalized
//! autocorrelation (NAC) peak, refines the peak to sub-sample precision
//! with parabolic interpolation, and undoes octave errors by testing the
//! peak's submultiple lags. Scratch buffers live in the estimator value,
//! so repeated calls do not reallocate and independent estimators never
//! share state.

/// Largest accepted parabolic shift, as a fraction of the peak lag.
/// An ill-conditioned parabola can place the vertex far outside the
/// sample spacing; such shifts are discarded and the integer peak kept.
const MAX_SHIFT_FRACTION: f64 = 0.2;

/// NAC strength required at every submultiple lag, relative to the peak,
/// for an octave correction to be accepted.
const SUBMULTIPLE_THRESHOLD: f64 = 0.90;

/// Outcome of a period estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum PeriodEstimate {
    /// A periodic component was found in the search range.
    Pitch {
        /// Fractional period in samples, after octave correction.
        period: f64,
        /// Integer lag of the raw autocorrelation peak.
        peak: usize,
        /// NAC value at the peak, the periodicity confidence in [-1, 1].
        quality: f64,
    },
    /// No interior autocorrelation peak in the search range.
    NoPeak,
}

/// Normalized autocorrelation values over a lag range.
///
/// Entries cover lags `min_p - 1 ..= max_p + 1`; the two extra lags exist
/// only so the peak test can inspect both neighbors of a boundary lag.
/// Contents carry no meaning between computations.
#[derive(Debug, Default)]
struct NacBuffer {
    values: Vec<f64>,
    min_lag: usize,
}

impl NacBuffer {
    fn compute(&mut self, x: &[f32], min_p: usize, max_p: usize, energy_prefix: &[f64]) {
        let n = x.len();
        self.min_lag = min_p - 1;
        self.values.clear();
        self.values.resize(max_p + 3 - min_p, 0.0);

        for (lag, slot) in (min_p - 1..=max_p + 1).zip(self.values.iter_mut()) {
            // Pairs (x[i], x[i + lag]) for i < n - lag.
            let len = n - lag;
            let mut ac = 0.0f64;
            for i in 0..len {
                ac += f64::from(x[i]) * f64::from(x[i + lag]);
            }
            let early = energy_prefix[len];
            let late = energy_prefix[n] - energy_prefix[lag];
            *slot = if early > 0.0 && late > 0.0 {
                ac / (early * late).sqrt()
            } else {
                0.0
            };
        }
    }

    fn at(&self, lag: usize) -> f64 {
        self.values[lag - self.min_lag]
    }

    fn get(&self, lag: usize) -> Option<f64> {
        lag.checked_sub(self.min_lag)
            .and_then(|index| self.values.get(index))
            .copied()
    }
}

/// Normalized-autocorrelation period estimator with owned scratch storage.
#[derive(Debug, Default)]
pub struct PeriodEstimator {
    nac: NacBuffer,
    energy_prefix: Vec<f64>,
}

impl PeriodEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the fundamental period of `x` in samples, searching lags
    /// `min_p ..= max_p`.
    ///
    /// # Panics
    ///
    /// Panics when `min_p <= 1`, `max_p <= min_p`, or `x` is shorter than
    /// two maximum periods. These are caller contract violations, not
    /// signal conditions.
    pub fn estimate(&mut self, x: &[f32], min_p: usize, max_p: usize) -> PeriodEstimate {
        assert!(min_p > 1, "minimum period must be at least 2 samples");
        assert!(max_p > min_p, "maximum period must exceed minimum period");
        assert!(
            x.len() >= 2 * max_p,
            "window must cover two maximum periods"
        );

        let n = x.len();
        self.energy_prefix.clear();
        self.energy_prefix.reserve(n + 1);
        self.energy_prefix.push(0.0);
        let mut sum = 0.0f64;
        for &sample in x {
            sum += f64::from(sample) * f64::from(sample);
            self.energy_prefix.push(sum);
        }

        self.nac.compute(x, min_p, max_p, &self.energy_prefix);

        // Global maximum over the search range proper; the first lag wins
        // ties so a submultiple peak beats its own multiples.
        let mut peak = min_p;
        let mut peak_nac = self.nac.at(min_p);
        for lag in min_p + 1..=max_p {
            let value = self.nac.at(lag);
            if value > peak_nac {
                peak = lag;
                peak_nac = value;
            }
        }

        let left = self.nac.at(peak - 1);
        let right = self.nac.at(peak + 1);
        if peak_nac <= left && peak_nac <= right {
            return PeriodEstimate::NoPeak;
        }

        // Parabolic refinement through the peak and its neighbors.
        let denominator = 2.0 * peak_nac - left - right;
        let mut shift = if denominator != 0.0 {
            0.5 * (right - left) / denominator
        } else {
            0.0
        };
        if shift.abs() >= MAX_SHIFT_FRACTION * peak as f64 {
            shift = 0.0;
        }
        let mut period = peak as f64 + shift;
        if !period.is_finite() {
            return PeriodEstimate::NoPeak;
        }

        // Octave correction: the true period may be a submultiple of the
        // peak lag. Try divisors from the largest possible down; a divisor
        // is accepted when the NAC stays strong at every intermediate
        // submultiple lag. Divisor 1 has nothing to check and always
        // accepts, so the loop terminates with a valid period.
        for divisor in (1..=peak / min_p).rev() {
            if self.supports_submultiples(period, divisor, peak_nac) {
                period /= divisor as f64;
                break;
            }
        }

        PeriodEstimate::Pitch {
            period,
            peak,
            quality: peak_nac,
        }
    }

    fn supports_submultiples(&self, period: f64, divisor: usize, peak_nac: f64) -> bool {
        (1..divisor).all(|k| {
            let lag = (k as f64 * period / divisor as f64).round() as usize;
            self.nac
                .get(lag)
                .is_some_and(|value| value >= SUBMULTIPLE_THRESHOLD * peak_nac)
        })
    }
}
