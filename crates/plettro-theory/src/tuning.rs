//! String tunings and fretboard mapping.

use crate::semitone::Semitone;
use core::fmt;

/// Default number of frets on the mapped fretboard.
pub const DEFAULT_FRETS: u8 = 22;

/// Open-string pitches of an instrument, index 0 = highest-pitched string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Tuning {
    open_notes: Vec<Semitone>,
}

impl Tuning {
    /// Tuning from open-string pitches, highest string first.
    pub fn new(open_notes: Vec<Semitone>) -> Self {
        Self { open_notes }
    }

    /// Standard six-string guitar tuning: E4 B3 G3 D3 A2 E2.
    pub fn standard() -> Self {
        Self::new(
            [43, 38, 34, 29, 24, 19]
                .into_iter()
                .map(Semitone::new)
                .collect(),
        )
    }

    pub fn strings(&self) -> usize {
        self.open_notes.len()
    }

    pub fn open_note(&self, string: usize) -> Option<Semitone> {
        self.open_notes.get(string).copied()
    }

    /// Every position at which `note` can be fingered, one entry per string.
    ///
    /// A string's entry is `Some(fret)` iff `open + fret = note` for a fret
    /// in `0..=frets`, otherwise `None`.
    pub fn fingering(&self, note: Semitone, frets: u8) -> Fingering {
        let positions = self
            .open_notes
            .iter()
            .map(|open| {
                let fret = note.value() - open.value();
                (0..=i32::from(frets)).contains(&fret).then(|| fret as u8)
            })
            .collect();
        Fingering { positions }
    }
}

/// Fret positions for a single note, one entry per string.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Fingering {
    positions: Vec<Option<u8>>,
}

impl Fingering {
    pub fn strings(&self) -> usize {
        self.positions.len()
    }

    /// Fret for `string`, or `None` if the note is unplayable there.
    pub fn fret(&self, string: usize) -> Option<u8> {
        self.positions.get(string).copied().flatten()
    }

    pub fn playable_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.positions.iter().copied()
    }
}

impl fmt::Display for Fingering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.positions.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match position {
                Some(fret) => write!(f, "{fret}")?,
                None => write!(f, "-")?,
            }
        }
        Ok(())
    }
}
