//! MIDI primitives for the range tracker.
//!
//! This module provides the pitch type and classifier, the note events read
//! from a keyboard, and the device layer that opens real MIDI ports.

mod device;
mod event;

pub use device::{
    list_ports, open_input, open_output, DeviceError, MidiPortSink, NoteSink, NoteStream,
    PortListing,
};
pub use event::{decode_message, encode_command, NoteCommand, NoteEvent, NoteKind};

use std::fmt;
use thiserror::Error;

/// Standard MIDI note names for display purposes.
/// Maps MIDI note number (0-127) to note name within an octave.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Highest valid MIDI note number.
pub const MAX_PITCH: u8 = 127;

/// Raised when a raw note number does not fit the MIDI range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("note number {0} is outside the MIDI range 0-127")]
pub struct PitchError(pub i64);

/// A validated MIDI note number (0-127). 60 = Middle C (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch(u8);

impl Pitch {
    /// Creates a pitch, rejecting note numbers above 127.
    pub fn new(note: u8) -> Result<Self, PitchError> {
        if note > MAX_PITCH {
            return Err(PitchError(note as i64));
        }
        Ok(Self(note))
    }

    /// Returns the raw note number.
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Pitch class label, e.g. "C#".
    pub fn class(self) -> &'static str {
        classify(self).0
    }

    /// Octave-qualified label, e.g. "C#4".
    pub fn label(self) -> String {
        classify(self).1
    }
}

impl TryFrom<u8> for Pitch {
    type Error = PitchError;

    fn try_from(note: u8) -> Result<Self, Self::Error> {
        Self::new(note)
    }
}

impl TryFrom<i64> for Pitch {
    type Error = PitchError;

    fn try_from(note: i64) -> Result<Self, Self::Error> {
        u8::try_from(note)
            .map_err(|_| PitchError(note))
            .and_then(Self::new)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Classifies a pitch into its pitch class and note label.
///
/// The octave is counted from pitch 12 (`C0`), so pitch 60 is `C4` and
/// pitches 0-11 fall in octave -1.
///
/// # Examples
///
/// ```
/// use vocalrange::midi::{classify, Pitch};
///
/// let middle_c = Pitch::new(60).unwrap();
/// assert_eq!(classify(middle_c), ("C", "C4".to_string()));
/// ```
pub fn classify(pitch: Pitch) -> (&'static str, String) {
    let from_c0 = pitch.as_u8() as i16 - 12;
    let octave = from_c0.div_euclid(12);
    let class = NOTE_NAMES[from_c0.rem_euclid(12) as usize];
    (class, format!("{}{}", class, octave))
}
