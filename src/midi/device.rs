//! MIDI device access.
//!
//! Input ports deliver bytes on midir's callback thread; the callback only
//! decodes and forwards events over a channel, so the tracker can read them
//! as a plain blocking iterator. Output goes through the [`NoteSink`] trait so
//! the tracker does not care whether notes land on a port or a synthesizer.

use super::event::{decode_message, encode_command, NoteCommand, NoteEvent};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::sync::mpsc::{self, Receiver};
use thiserror::Error;

/// Client name registered with the MIDI backend.
const CLIENT_NAME: &str = "vocalrange";

/// Errors raised by MIDI devices. All of them end the run.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("MIDI backend unavailable: {0}")]
    Backend(String),

    #[error("no MIDI {direction} port matching {wanted:?} (available: {available:?})")]
    NotFound {
        direction: &'static str,
        wanted: String,
        available: Vec<String>,
    },

    #[error("failed to connect to {port:?}: {reason}")]
    Connect { port: String, reason: String },

    #[error("MIDI input disconnected")]
    Disconnected,

    #[error("failed to send to MIDI output: {0}")]
    Send(String),

    #[error("output device failure: {0}")]
    Output(String),
}

/// Something that can sound (or forward) a note.
pub trait NoteSink {
    /// Sends a single note command.
    fn send(&mut self, command: NoteCommand) -> Result<(), DeviceError>;
}

impl<S: NoteSink + ?Sized> NoteSink for Box<S> {
    fn send(&mut self, command: NoteCommand) -> Result<(), DeviceError> {
        (**self).send(command)
    }
}

/// Names of the ports currently visible to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortListing {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Enumerates input and output port names.
pub fn list_ports() -> Result<PortListing, DeviceError> {
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| DeviceError::Backend(e.to_string()))?;
    let midi_out =
        MidiOutput::new(CLIENT_NAME).map_err(|e| DeviceError::Backend(e.to_string()))?;

    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(PortListing { inputs, outputs })
}

/// Picks the first name containing `wanted`, returning its index.
fn find_port(names: &[String], wanted: &str) -> Option<usize> {
    names.iter().position(|name| name.contains(wanted))
}

/// Blocking stream of note events from an input port.
///
/// Finite: it ends with an error if the port goes away, and it is not
/// restartable. Dropping the stream closes the port.
pub struct NoteStream {
    /// The midir connection (kept alive for the duration)
    _connection: MidiInputConnection<()>,
    events: Receiver<NoteEvent>,
    port: String,
    failed: bool,
}

impl NoteStream {
    /// Name of the port this stream reads from.
    pub fn port_name(&self) -> &str {
        &self.port
    }
}

impl Iterator for NoteStream {
    type Item = Result<NoteEvent, DeviceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.events.recv() {
            Ok(event) => Some(Ok(event)),
            Err(_) => {
                self.failed = true;
                Some(Err(DeviceError::Disconnected))
            }
        }
    }
}

/// Opens the first input port whose name contains `wanted`.
pub fn open_input(wanted: &str) -> Result<NoteStream, DeviceError> {
    let mut midi_in =
        MidiInput::new(CLIENT_NAME).map_err(|e| DeviceError::Backend(e.to_string()))?;
    midi_in.ignore(Ignore::All);

    let ports = midi_in.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_in.port_name(p).unwrap_or_default())
        .collect();
    let index = find_port(&names, wanted).ok_or_else(|| DeviceError::NotFound {
        direction: "input",
        wanted: wanted.to_string(),
        available: names.clone(),
    })?;
    let port_name = names[index].clone();

    let (tx, rx) = mpsc::channel();
    let connection = midi_in
        .connect(
            &ports[index],
            "vocalrange-in",
            move |_stamp, message, _| {
                if let Some(event) = decode_message(message) {
                    // Receiver gone means the tracker already stopped
                    let _ = tx.send(event);
                }
            },
            (),
        )
        .map_err(|e| DeviceError::Connect {
            port: port_name.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("Listening on MIDI input {:?}", port_name);
    Ok(NoteStream {
        _connection: connection,
        events: rx,
        port: port_name,
        failed: false,
    })
}

/// Note sink backed by a MIDI output port.
pub struct MidiPortSink {
    connection: MidiOutputConnection,
    port: String,
}

impl MidiPortSink {
    pub fn port_name(&self) -> &str {
        &self.port
    }
}

impl NoteSink for MidiPortSink {
    fn send(&mut self, command: NoteCommand) -> Result<(), DeviceError> {
        let bytes = encode_command(command);
        tracing::trace!("[MIDI OUT] {:?} -> {:02x?}", command, bytes);
        self.connection
            .send(&bytes)
            .map_err(|e| DeviceError::Send(e.to_string()))
    }
}

/// Opens the first output port whose name contains `wanted`.
pub fn open_output(wanted: &str) -> Result<MidiPortSink, DeviceError> {
    let midi_out =
        MidiOutput::new(CLIENT_NAME).map_err(|e| DeviceError::Backend(e.to_string()))?;

    let ports = midi_out.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_default())
        .collect();
    let index = find_port(&names, wanted).ok_or_else(|| DeviceError::NotFound {
        direction: "output",
        wanted: wanted.to_string(),
        available: names.clone(),
    })?;
    let port_name = names[index].clone();

    let connection = midi_out
        .connect(&ports[index], "vocalrange-out")
        .map_err(|e| DeviceError::Connect {
            port: port_name.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("Echoing to MIDI output {:?}", port_name);
    Ok(MidiPortSink {
        connection,
        port: port_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_port_uses_first_substring_match() {
        let names = vec![
            "Midi Through Port-0".to_string(),
            "CASIO USB-MIDI 0".to_string(),
            "CASIO USB-MIDI 1".to_string(),
        ];
        assert_eq!(find_port(&names, "CASIO USB-MIDI"), Some(1));
        assert_eq!(find_port(&names, "USB-MIDI 1"), Some(2));
        assert_eq!(find_port(&names, "casio"), None);
    }

    #[test]
    fn test_not_found_lists_available_ports() {
        let err = DeviceError::NotFound {
            direction: "input",
            wanted: "CASIO".to_string(),
            available: vec!["Midi Through".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("input"));
        assert!(text.contains("Midi Through"));
    }
}
