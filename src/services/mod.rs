//! Remote services queried by the catalog updater.
//!
//! Both services are reached through small traits so the update flow can be
//! exercised without the network.

mod lyrics;
mod spotify;

pub use lyrics::{parse_lyrics, LyricsClient, LYRICS_API};
pub use spotify::{interpret_now_playing, SpotifyClient, AUTH_CONSOLE_URL, NOW_PLAYING_API};

use thiserror::Error;

/// Errors from the remote services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authorization expired, log in again at {console_url}")]
    AuthExpired { console_url: &'static str },

    #[error("nothing is playing right now")]
    NothingPlaying,

    #[error("{service} answered with HTTP {status}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    #[error("{service} returned an unexpected body: {source}")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} returned a track without artists")]
    MissingArtist { service: &'static str },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The track currently playing, as reported by the music service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingTrack {
    pub artist: String,
    pub title: String,
    /// 30 second preview, not available for every track.
    pub url_mp3_30s: Option<String>,
    pub url_spotify: String,
    pub spotify_app: String,
}

/// Everything the catalog needs to know about a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
    /// Empty when the lyrics service had nothing.
    pub lyrics: String,
    pub url_mp3_30s: Option<String>,
    pub url_spotify: String,
    pub spotify_app: String,
}

impl TrackMetadata {
    pub fn new(track: NowPlayingTrack, lyrics: String) -> Self {
        Self {
            artist: track.artist,
            title: track.title,
            lyrics,
            url_mp3_30s: track.url_mp3_30s,
            url_spotify: track.url_spotify,
            spotify_app: track.spotify_app,
        }
    }
}

/// Source of the currently playing track.
pub trait NowPlayingSource {
    fn now_playing(&self) -> Result<NowPlayingTrack, ServiceError>;
}

/// Source of song lyrics.
pub trait LyricsSource {
    /// Returns the lyrics, or an empty string when none were found.
    fn lyrics(&self, artist: &str, title: &str) -> Result<String, ServiceError>;
}

/// Queries the music service, then the lyrics service, exactly once each.
pub fn fetch_metadata(
    now_playing: &dyn NowPlayingSource,
    lyrics: &dyn LyricsSource,
) -> Result<TrackMetadata, ServiceError> {
    tracing::info!("Fetching the track playing now");
    let track = now_playing.now_playing()?;
    tracing::info!("{} - {}", track.artist, track.title);

    tracing::info!("Fetching lyrics");
    let text = lyrics.lyrics(&track.artist, &track.title)?;
    Ok(TrackMetadata::new(track, text))
}
