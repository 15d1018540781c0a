//! Seeds for new catalog entries.
//!
//! The first time a song is seen, its range, key and chords have to come
//! from somewhere else, normally a `range-tracker` session pasted by hand.

use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use thiserror::Error;

pub const SEED_PROMPT: &str = "Paste the JSON printed by range-tracker:";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("seed must be a JSON object")]
    NotAnObject,

    #[error("no seed was given")]
    Missing,

    #[error("failed to read seed: {0}")]
    Io(#[from] io::Error),
}

/// Supplies the starting fields of a new catalog entry.
pub trait SeedProvider {
    fn seed(&mut self, artist: &str, title: &str) -> Result<Map<String, Value>, SeedError>;
}

/// Parses one line of seed JSON. Any object is accepted as is.
pub fn parse_seed(line: &str) -> Result<Map<String, Value>, SeedError> {
    match serde_json::from_str(line.trim()).map_err(SeedError::Malformed)? {
        Value::Object(map) => Ok(map),
        _ => Err(SeedError::NotAnObject),
    }
}

/// Asks an operator for the seed, one line of JSON.
pub struct PromptSeedProvider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSeedProvider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptSeedProvider<io::StdinLock<'static>, io::Stdout> {
    /// Prompts on stdout and reads from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> SeedProvider for PromptSeedProvider<R, W> {
    fn seed(&mut self, artist: &str, title: &str) -> Result<Map<String, Value>, SeedError> {
        writeln!(self.output, "New song: {} - {}", artist, title)?;
        writeln!(self.output, "{}", SEED_PROMPT)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Err(SeedError::Missing);
        }
        parse_seed(&line)
    }
}
