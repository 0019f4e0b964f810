//! Semitone arithmetic and note-name/frequency conversion.
//!
//! Semitones are counted from A0 (27.5 Hz): A0 = 0, E2 = 19, A4 = 48.
//! Frequencies follow 12-TET equal temperament, `f(s) = 27.5 · 2^(s/12)`.

use core::fmt;

/// Reference frequency of A0 in Hz.
pub const A0_HZ: f64 = 27.5;

/// Pitch-class names from C, sharp spelling, used by `Display`.
const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch in 12-TET equal temperament, counted in semitones from A0.
///
/// The value is unbounded; the range a guitar detector cares about is
/// roughly C0 (−9) through E10 (115). Fallible conversions return
/// `Option` rather than reserving a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Semitone(i32);

impl Semitone {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Parse a note name and octave, e.g. `("E", 2)` or `("Bb", 3)`.
    ///
    /// The name is a letter `A..=G` (either case) optionally followed by a
    /// single `#` or `b`. Anything else is rejected, including double
    /// accidentals. `B#`, `Cb`, `E#` and `Fb` are accepted and resolve to
    /// their enharmonic neighbors.
    pub fn parse(name: &str, octave: i32) -> Option<Self> {
        let mut chars = name.chars();

        // Offsets from A within the octave; the octave boundary is at C.
        let base = match chars.next()?.to_ascii_uppercase() {
            'A' => 0,
            'B' => 2,
            'C' => -9,
            'D' => -7,
            'E' => -5,
            'F' => -4,
            'G' => -2,
            _ => return None,
        };

        let accidental = match chars.next() {
            None => 0,
            Some('#') => 1,
            Some('b') => -1,
            Some(_) => return None,
        };

        if chars.next().is_some() {
            return None;
        }

        Some(Self(12 * octave + base + accidental))
    }

    /// Nearest semitone to a frequency, with the multiplicative error ratio
    /// `f(semitone) / hz` (1.0 means the frequency is exactly on pitch).
    ///
    /// Returns `None` for non-positive frequencies.
    pub fn from_frequency(hz: f64) -> Option<(Self, f64)> {
        if hz <= 0.0 {
            return None;
        }
        let semitone = Self((12.0 * (hz / A0_HZ).log2()).round() as i32);
        Some((semitone, semitone.frequency() / hz))
    }

    /// Frequency in Hz: `27.5 · 2^(s/12)`.
    pub fn frequency(self) -> f64 {
        A0_HZ * (f64::from(self.0) / 12.0).exp2()
    }

    /// Pitch class in `0..12`, with 0 = C.
    pub fn pitch_class(self) -> i32 {
        (self.0 + 9).rem_euclid(12)
    }

    /// Octave number in scientific pitch notation (A4 is in octave 4).
    pub fn octave(self) -> i32 {
        (self.0 + 9).div_euclid(12)
    }
}

impl fmt::Display for Semitone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NAMES[self.pitch_class() as usize], self.octave())
    }
}

/// Frequency of a named note, e.g. `note_frequency("A", 4)` → 440 Hz.
pub fn note_frequency(name: &str, octave: i32) -> Option<f64> {
    Semitone::parse(name, octave).map(Semitone::frequency)
}
