//! range-tracker - Capture the vocal range of a song from a MIDI keyboard.
//!
//! Play the melody on the keyboard; every note is echoed back so you can
//! hear it. Control notes at the bottom of the keyboard mark the key and
//! main chords, and the lowest A ends the session.
//!
//! # Usage
//!
//! ```bash
//! range-tracker --list
//! range-tracker --input "CASIO USB-MIDI" --output "Microsoft GS Wavetable Synth"
//! range-tracker --soundfont piano.sf2
//! ```
//!
//! The last line printed is the JSON that `catalog-update` asks for when a
//! song is new.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use vocalrange::audio::SynthSink;
use vocalrange::midi::{self, NoteSink};
use vocalrange::tracker::{RangeSeed, Tracker, DEFAULT_HOLD};

const DEFAULT_INPUT: &str = "CASIO USB-MIDI";
const DEFAULT_OUTPUT: &str = "Microsoft GS Wavetable Synth";

/// Command-line options for the tracker.
struct CliOptions {
    /// Substring of the input port name.
    input: String,
    /// Substring of the output port name.
    output: String,
    /// Echo through a SoundFont instead of an output port.
    soundfont: Option<PathBuf>,
    hold: Duration,
    /// Only list the available ports.
    list: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            input: DEFAULT_INPUT.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            soundfont: None,
            hold: DEFAULT_HOLD,
            list: false,
        };
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--input" | "-i" => options.input = value_of(&args, &mut i)?.to_string(),
                "--output" | "-o" => options.output = value_of(&args, &mut i)?.to_string(),
                "--soundfont" | "-sf" => {
                    options.soundfont = Some(PathBuf::from(value_of(&args, &mut i)?))
                }
                "--hold-ms" => {
                    let ms: u64 = value_of(&args, &mut i)?
                        .parse()
                        .context("--hold-ms expects a number of milliseconds")?;
                    options.hold = Duration::from_millis(ms);
                }
                "--list" | "-l" => options.list = true,
                "--help" | "-h" => {
                    print_help(args.first().map(String::as_str).unwrap_or("range-tracker"));
                    std::process::exit(0);
                }
                other => bail!("Unknown option: {} (use --help for usage)", other),
            }
            i += 1;
        }

        Ok(options)
    }
}

/// Returns the value following the flag at `args[*i]`, advancing `i`.
fn value_of<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i) {
        Some(value) => Ok(value.as_str()),
        None => bail!("{} requires an argument", flag),
    }
}

fn print_help(program: &str) {
    eprintln!("range-tracker - Capture the vocal range of a song from a MIDI keyboard");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --input NAME       Input port name (default: {})", DEFAULT_INPUT);
    eprintln!("  -o, --output NAME      Output port name (default: {})", DEFAULT_OUTPUT);
    eprintln!("  -sf, --soundfont PATH  Echo through a SoundFont (.sf2) instead of a port");
    eprintln!("      --hold-ms N        Echo duration in milliseconds (default: 100)");
    eprintln!("  -l, --list             List MIDI ports and exit");
    eprintln!("  -h, --help             Print this help message");
    eprintln!();
    eprintln!("Control notes: 21 stop, 22 key, 23 minor chord, 24 major chord.");
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ports = midi::list_ports().context("Failed to enumerate MIDI ports")?;
    tracing::info!("MIDI inputs: {:?}", ports.inputs);
    tracing::info!("MIDI outputs: {:?}", ports.outputs);
    if cli.list {
        for name in &ports.inputs {
            println!("in:  {}", name);
        }
        for name in &ports.outputs {
            println!("out: {}", name);
        }
        return Ok(());
    }

    let events = midi::open_input(&cli.input).context("Failed to open MIDI input")?;
    let sink: Box<dyn NoteSink> = match &cli.soundfont {
        Some(path) => Box::new(SynthSink::new(path).context("Failed to start synthesizer")?),
        None => Box::new(midi::open_output(&cli.output).context("Failed to open MIDI output")?),
    };

    tracing::info!("Play the melody; the first note starts the range");
    let mut tracker = Tracker::new(sink).with_hold(cli.hold);
    let state = tracker.run(events).context("MIDI session failed")?;
    drop(tracker);

    let played: Vec<u8> = state.played().iter().map(|p| p.as_u8()).collect();
    let seed = RangeSeed::from_state(&state, chrono::Local::now().date_naive());
    println!("--------------");
    println!("{:?}", played);
    println!("--------------");
    println!("{}", seed.to_json().context("Failed to encode range")?);

    Ok(())
}
