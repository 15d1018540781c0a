//! catalog-update - Add the song playing now to the vocal range catalog.
//!
//! Reads the current track from Spotify, its lyrics from Vagalume, and
//! merges both into the catalog. New songs need the JSON printed by
//! `range-tracker`, which is asked for on stdin.
//!
//! # Usage
//!
//! ```bash
//! SPOTIFY_TOKEN=... VAGALUME_API_KEY=... catalog-update --catalog vocal-ranges.json
//! ```

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use vocalrange::catalog::{MergeKind, PromptSeedProvider, DEFAULT_CATALOG_PATH};
use vocalrange::services::{LyricsClient, ServiceError, SpotifyClient};
use vocalrange::updater::{run_update, UpdateError};

const TOKEN_VAR: &str = "SPOTIFY_TOKEN";
const LYRICS_KEY_VAR: &str = "VAGALUME_API_KEY";

/// Command-line options for the updater.
struct CliOptions {
    catalog: PathBuf,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut catalog = PathBuf::from(DEFAULT_CATALOG_PATH);
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--catalog" | "-c" => {
                    i += 1;
                    let Some(path) = args.get(i) else {
                        bail!("--catalog requires a path argument");
                    };
                    catalog = PathBuf::from(path);
                }
                "--help" | "-h" => {
                    eprintln!("catalog-update - Add the song playing now to the catalog");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("catalog-update")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -c, --catalog PATH  Catalog file (default: {})", DEFAULT_CATALOG_PATH);
                    eprintln!("  -h, --help          Print this help message");
                    eprintln!();
                    eprintln!("Environment:");
                    eprintln!("  {}      Spotify OAuth token", TOKEN_VAR);
                    eprintln!("  {}   Vagalume API key", LYRICS_KEY_VAR);
                    std::process::exit(0);
                }
                other => bail!("Unknown option: {} (use --help for usage)", other),
            }
            i += 1;
        }

        Ok(Self { catalog })
    }
}

fn env_secret(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} is not set", name))
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

    let spotify = SpotifyClient::new(&env_secret(TOKEN_VAR)?)?;
    let lyrics = LyricsClient::new(&env_secret(LYRICS_KEY_VAR)?)?;
    let mut seeds = PromptSeedProvider::stdio();
    let today = chrono::Local::now().date_naive();

    match run_update(&spotify, &lyrics, &mut seeds, &cli.catalog, today) {
        Ok(report) => {
            let verb = match report.kind {
                MergeKind::Updated => "Updated",
                MergeKind::Created => "Added",
            };
            tracing::info!("{} {} - {}", verb, report.artist, report.title);
            Ok(())
        }
        Err(UpdateError::Service(ServiceError::AuthExpired { console_url })) => {
            eprintln!("!!! Spotify authorization expired !!!");
            eprintln!("  get a new token at:");
            eprintln!("  {}", console_url);
            eprintln!("  and export it as {}", TOKEN_VAR);
            std::process::exit(1);
        }
        Err(e) => Err(e).context("Catalog update failed"),
    }
}
