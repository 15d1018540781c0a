//! Live range tracking.
//!
//! A session reads notes from a keyboard until the stop note, echoing each
//! played note to an output sink. The lowest keys of an 88-key keyboard are
//! reserved as control notes:
//!
//! | Note | Meaning                                        |
//! |------|------------------------------------------------|
//! | 21   | stop the session                               |
//! | 22   | the last played note is the key                |
//! | 23   | the last played note is a main (minor) chord   |
//! | 24   | the last played note is a main (major) chord   |

mod seed;
mod state;

pub use seed::{RangeSeed, DATE_FORMAT};
pub use state::{Extreme, Outcome, Role, TrackerState};

use crate::midi::{DeviceError, NoteCommand, NoteEvent, NoteSink, Pitch};
use std::time::Duration;

pub const STOP_NOTE: u8 = 21;
pub const KEY_NOTE: u8 = 22;
pub const MINOR_CHORD_NOTE: u8 = 23;
pub const MAJOR_CHORD_NOTE: u8 = 24;

/// How long an echoed note sounds before its note-off.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(100);

/// Drives a session: feeds events through [`TrackerState::step`] and echoes
/// performance notes to the sink.
pub struct Tracker<S: NoteSink> {
    sink: S,
    hold: Duration,
}

impl<S: NoteSink> Tracker<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            hold: DEFAULT_HOLD,
        }
    }

    /// Overrides the echo hold time.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Runs until the stop note or the end of the event stream.
    ///
    /// Nothing after the stop note is read. A device error ends the session
    /// immediately and is returned as is.
    pub fn run<I>(&mut self, events: I) -> Result<TrackerState, DeviceError>
    where
        I: IntoIterator<Item = Result<NoteEvent, DeviceError>>,
    {
        let mut state = TrackerState::new();
        for event in events {
            let event = event?;
            tracing::debug!("received {:?}", event);

            let (next, outcome) = state.step(event);
            state = next;
            match outcome {
                Outcome::Stop => {
                    tracing::debug!("stop note received");
                    break;
                }
                Outcome::Echo(pitch) => self.echo(pitch)?,
                Outcome::Nothing => {}
            }
        }
        Ok(state)
    }

    fn echo(&mut self, pitch: Pitch) -> Result<(), DeviceError> {
        self.sink.send(NoteCommand::On(pitch))?;
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }
        self.sink.send(NoteCommand::Off(pitch))
    }

    /// Consumes the tracker, returning its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
