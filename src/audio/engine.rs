//! SoundFont synthesizer used as an echo sink.
//!
//! Plays echoed notes through rustysynth and rodio when no software-synth
//! MIDI port is available on the machine.

use crate::midi::{DeviceError, NoteCommand, NoteSink};
use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Channel and velocity for echoed notes.
const CHANNEL: i32 = 0;
const VELOCITY: i32 = 64;

/// Buffers still rendered after a release (about one second of tail).
const RELEASE_TAIL: usize = SAMPLE_RATE as usize / BUFFER_SIZE;

/// Tracks whether the synthesizer has anything to render. The sink presses
/// and releases; the audio thread asks before every buffer.
#[derive(Debug, Default)]
struct VoiceGate {
    held: AtomicUsize,
    tail: AtomicUsize,
}

impl VoiceGate {
    fn press(&self) {
        self.held.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        let _ = self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        self.tail.store(RELEASE_TAIL, Ordering::Release);
    }

    fn release_all(&self) {
        self.held.store(0, Ordering::Release);
        self.tail.store(RELEASE_TAIL, Ordering::Release);
    }

    /// Whether the next buffer must be rendered. Spends one tail buffer
    /// when no voice is held.
    fn should_render(&self) -> bool {
        if self.held.load(Ordering::Acquire) > 0 {
            return true;
        }
        self.tail
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Stereo stream of the echo voices, interleaved for rodio.
struct EchoSource {
    synth: Arc<Mutex<Synthesizer>>,
    gate: Arc<VoiceGate>,
    left: Vec<f32>,
    right: Vec<f32>,
    /// Next sample index across both channels (`2 * frame + channel`).
    cursor: usize,
}

impl EchoSource {
    fn new(synth: Arc<Mutex<Synthesizer>>, gate: Arc<VoiceGate>) -> Self {
        Self {
            synth,
            gate,
            left: vec![0.0; BUFFER_SIZE],
            right: vec![0.0; BUFFER_SIZE],
            cursor: 2 * BUFFER_SIZE,
        }
    }

    fn refill(&mut self) {
        let rendered = self.gate.should_render()
            && match self.synth.lock() {
                Ok(mut synth) => {
                    synth.render(&mut self.left, &mut self.right);
                    true
                }
                Err(_) => false,
            };
        if !rendered {
            self.left.fill(0.0);
            self.right.fill(0.0);
        }
        self.cursor = 0;
    }
}

impl Iterator for EchoSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor >= 2 * BUFFER_SIZE {
            self.refill();
        }
        let frame = self.cursor / 2;
        let sample = if self.cursor % 2 == 0 {
            self.left[frame]
        } else {
            self.right[frame]
        };
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for EchoSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Note sink that sounds echoed notes on the default audio output.
pub struct SynthSink {
    synth: Arc<Mutex<Synthesizer>>,
    gate: Arc<VoiceGate>,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
}

impl SynthSink {
    /// Loads a SoundFont and starts streaming to the default audio device.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The SoundFont file cannot be read
    /// - The SoundFont is invalid
    /// - Audio output cannot be initialized
    pub fn new<P: AsRef<Path>>(soundfont_path: P) -> Result<Self> {
        let path = soundfont_path.as_ref();
        let mut file = BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open SoundFont: {}", path.display()))?,
        );
        let soundfont = Arc::new(
            SoundFont::new(&mut file)
                .map_err(|e| anyhow::anyhow!("Failed to load SoundFont: {:?}", e))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| anyhow::anyhow!("Failed to create synthesizer: {:?}", e))?;
        let synth = Arc::new(Mutex::new(synth));
        let gate = Arc::new(VoiceGate::default());

        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;
        stream_handle
            .play_raw(EchoSource::new(Arc::clone(&synth), Arc::clone(&gate)))
            .context("Failed to start audio playback")?;

        tracing::info!("Echoing through SoundFont {}", path.display());
        Ok(Self {
            synth,
            gate,
            _stream: stream,
            _stream_handle: stream_handle,
        })
    }
}

impl NoteSink for SynthSink {
    fn send(&mut self, command: NoteCommand) -> Result<(), DeviceError> {
        let mut synth = self
            .synth
            .lock()
            .map_err(|_| DeviceError::Output("synthesizer lock poisoned".to_string()))?;
        match command {
            NoteCommand::On(pitch) => {
                synth.note_on(CHANNEL, pitch.as_u8() as i32, VELOCITY);
                self.gate.press();
            }
            NoteCommand::Off(pitch) => {
                synth.note_off(CHANNEL, pitch.as_u8() as i32);
                self.gate.release();
            }
        }
        Ok(())
    }
}

impl Drop for SynthSink {
    fn drop(&mut self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off_all(true);
        }
        self.gate.release_all();
    }
}
