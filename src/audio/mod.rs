//! Built-in synthesizer output.
//!
//! Echoed notes can be rendered locally from a SoundFont instead of being
//! sent to a MIDI output port.

pub mod engine;

pub use engine::SynthSink;
