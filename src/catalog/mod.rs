//! The vocal range catalog.
//!
//! A catalog is a JSON document mapping artist -> song title -> entry. It is
//! kept as raw JSON so that artist and song order, and any fields this crate
//! does not know about, survive a load/save cycle untouched. [`CatalogEntry`]
//! is the typed view of a single entry.

mod seed;
mod store;

pub use seed::{parse_seed, PromptSeedProvider, SeedError, SeedProvider, SEED_PROMPT};
pub use store::{backup_path, load_with_backup, save, DEFAULT_CATALOG_PATH};

use crate::services::TrackMetadata;
use crate::tracker::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, merging or saving the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} must be a JSON object")]
    NotAnObject { what: String },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Typed view of one song in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Date of the last update (YYYY-MM-DD).
    #[serde(default)]
    pub update: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub low: String,
    #[serde(default)]
    pub high: String,
    /// Main chords.
    #[serde(default)]
    pub main: Vec<String>,
    /// Lyrics.
    #[serde(default)]
    pub letra: String,
    #[serde(default)]
    pub url_mp3_30s: Option<String>,
    #[serde(default)]
    pub url_spotify: String,
    #[serde(default)]
    pub spotify_app: String,
    /// Fields not listed above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a track ended up in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// The song was already there; its date, lyrics and links were refreshed.
    Updated,
    /// The song is new; its entry was started from a seed.
    Created,
}

/// Artist -> song title -> entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    artists: Map<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog document. The top level must be an object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(|artists| Self { artists })
    }

    /// Serializes the catalog on a single line, leaving non-ASCII text
    /// unescaped.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.artists)
    }

    /// Returns the artist names in file order.
    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.artists.keys().map(String::as_str)
    }

    /// Returns the song titles of an artist in file order.
    pub fn songs<'a>(&'a self, artist: &str) -> impl Iterator<Item = &'a str> {
        self.artists
            .get(artist)
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|songs| songs.keys().map(String::as_str))
    }

    pub fn contains(&self, artist: &str, title: &str) -> bool {
        self.raw_entry(artist, title).is_some()
    }

    /// Raw JSON of an entry.
    pub fn raw_entry(&self, artist: &str, title: &str) -> Option<&Value> {
        self.artists.get(artist)?.get(title)
    }

    /// Typed view of an entry. `None` if missing or not shaped like an entry.
    pub fn entry(&self, artist: &str, title: &str) -> Option<CatalogEntry> {
        let raw = self.raw_entry(artist, title)?;
        match serde_json::from_value(raw.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Malformed entry {} - {}: {}", artist, title, e);
                None
            }
        }
    }

    /// Merges freshly fetched metadata into the catalog.
    ///
    /// An existing entry gets `update` set to `date` and its lyrics and links
    /// replaced; everything else in it is left alone. A new entry starts from
    /// the seed returned by `seeds` (the range, key and chords of the song)
    /// and then receives the lyrics and links.
    pub fn merge(
        &mut self,
        metadata: &TrackMetadata,
        date: NaiveDate,
        seeds: &mut dyn SeedProvider,
    ) -> Result<MergeKind, CatalogError> {
        let artist = &metadata.artist;
        let title = &metadata.title;

        let songs = self
            .artists
            .entry(artist.clone())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| CatalogError::NotAnObject {
                what: format!("artist {:?}", artist),
            })?;

        let kind = if songs.contains_key(title.as_str()) {
            tracing::info!("Updating {} - {}", artist, title);
            MergeKind::Updated
        } else {
            tracing::info!("New song {} - {}", artist, title);
            let seed = seeds.seed(artist, title)?;
            songs.insert(title.clone(), Value::Object(seed));
            MergeKind::Created
        };

        let entry = songs
            .get_mut(title.as_str())
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CatalogError::NotAnObject {
                what: format!("entry {:?} - {:?}", artist, title),
            })?;
        if kind == MergeKind::Updated {
            entry.insert(
                "update".to_string(),
                Value::String(date.format(DATE_FORMAT).to_string()),
            );
        }

        entry.insert("letra".to_string(), Value::String(metadata.lyrics.clone()));
        entry.insert(
            "url_mp3_30s".to_string(),
            metadata
                .url_mp3_30s
                .clone()
                .map_or(Value::Null, Value::String),
        );
        entry.insert(
            "url_spotify".to_string(),
            Value::String(metadata.url_spotify.clone()),
        );
        entry.insert(
            "spotify_app".to_string(),
            Value::String(metadata.spotify_app.clone()),
        );

        Ok(kind)
    }
}
