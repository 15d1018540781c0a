//! Live note events.
//!
//! Raw MIDI bytes from an input port are decoded with `midly::live` into
//! [`NoteEvent`]s; outgoing [`NoteCommand`]s are encoded the same way.

use super::Pitch;
use midly::live::LiveEvent;
use midly::num::{u4, u7};
use midly::MidiMessage;

/// Channel used for echoed notes.
pub const OUTPUT_CHANNEL: u8 = 0;

/// Velocity used for echoed notes.
pub const ECHO_VELOCITY: u8 = 64;

/// The kind of a received note event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Key pressed.
    NoteOn,
    /// Key released (or note-on with velocity 0).
    NoteOff,
    /// Any other message carrying a key number (polyphonic aftertouch).
    Other,
}

/// A single note event read from the input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub kind: NoteKind,
    pub pitch: Pitch,
}

impl NoteEvent {
    pub fn new(kind: NoteKind, pitch: Pitch) -> Self {
        Self { kind, pitch }
    }

    pub fn note_on(pitch: Pitch) -> Self {
        Self::new(NoteKind::NoteOn, pitch)
    }

    pub fn note_off(pitch: Pitch) -> Self {
        Self::new(NoteKind::NoteOff, pitch)
    }
}

/// A command sent to the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    On(Pitch),
    Off(Pitch),
}

/// Decodes one raw MIDI message into a note event.
///
/// Returns `None` for messages without a key number (control change,
/// program change, SysEx, clock) and for bytes that do not parse.
pub fn decode_message(data: &[u8]) -> Option<NoteEvent> {
    let LiveEvent::Midi { message, .. } = LiveEvent::parse(data).ok()? else {
        return None;
    };

    let (kind, key) = match message {
        // Note On with velocity 0 is treated as Note Off
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => (NoteKind::NoteOff, key),
        MidiMessage::NoteOn { key, .. } => (NoteKind::NoteOn, key),
        MidiMessage::NoteOff { key, .. } => (NoteKind::NoteOff, key),
        MidiMessage::Aftertouch { key, .. } => (NoteKind::Other, key),
        _ => return None,
    };

    // u7 keys are always within range
    let pitch = Pitch::new(key.as_int()).ok()?;
    Some(NoteEvent::new(kind, pitch))
}

/// Encodes a note command as raw MIDI bytes on the output channel.
pub fn encode_command(command: NoteCommand) -> Vec<u8> {
    let message = match command {
        NoteCommand::On(pitch) => MidiMessage::NoteOn {
            key: u7::new(pitch.as_u8()),
            vel: u7::new(ECHO_VELOCITY),
        },
        NoteCommand::Off(pitch) => MidiMessage::NoteOff {
            key: u7::new(pitch.as_u8()),
            vel: u7::new(0),
        },
    };
    let event = LiveEvent::Midi {
        channel: u4::new(OUTPUT_CHANNEL),
        message,
    };

    let mut buf = Vec::with_capacity(3);
    // Writing into a Vec cannot fail
    let _ = event.write_std(&mut buf);
    buf
}
