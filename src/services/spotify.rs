//! Spotify "currently playing" client.

use super::{NowPlayingSource, NowPlayingTrack, ServiceError};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const NOW_PLAYING_API: &str = "https://api.spotify.com/v1/me/player/currently-playing";

/// Where a fresh token can be obtained when the old one expires.
pub const AUTH_CONSOLE_URL: &str =
    "https://developer.spotify.com/console/get-users-currently-playing-track/";

const SERVICE: &str = "Spotify";

#[derive(Deserialize)]
struct CurrentlyPlaying {
    /// Null while an ad or an unsupported item is playing.
    item: Option<Item>,
}

#[derive(Deserialize)]
struct Item {
    name: String,
    artists: Vec<Artist>,
    preview_url: Option<String>,
    uri: String,
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct ExternalUrls {
    spotify: String,
}

pub struct SpotifyClient {
    client: Client,
    token: String,
}

impl SpotifyClient {
    /// Creates a client from an OAuth token, with or without the `Bearer `
    /// prefix.
    pub fn new(token: &str) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        Ok(Self {
            client,
            token: token.to_string(),
        })
    }
}

impl NowPlayingSource for SpotifyClient {
    fn now_playing(&self) -> Result<NowPlayingTrack, ServiceError> {
        let response = self
            .client
            .get(NOW_PLAYING_API)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .send()?;

        let status = response.status();
        tracing::debug!("{} answered {}", SERVICE, status);
        let body = response.text()?;
        interpret_now_playing(status, &body)
    }
}

/// Turns a "currently playing" response into a track.
pub fn interpret_now_playing(
    status: StatusCode,
    body: &str,
) -> Result<NowPlayingTrack, ServiceError> {
    match status {
        StatusCode::UNAUTHORIZED => {
            return Err(ServiceError::AuthExpired {
                console_url: AUTH_CONSOLE_URL,
            })
        }
        StatusCode::NO_CONTENT => return Err(ServiceError::NothingPlaying),
        StatusCode::OK => {}
        other => {
            return Err(ServiceError::UnexpectedStatus {
                service: SERVICE,
                status: other.as_u16(),
            })
        }
    }

    let playing: CurrentlyPlaying =
        serde_json::from_str(body).map_err(|source| ServiceError::Decode {
            service: SERVICE,
            source,
        })?;
    let item = playing.item.ok_or(ServiceError::NothingPlaying)?;
    let artist = item
        .artists
        .into_iter()
        .next()
        .ok_or(ServiceError::MissingArtist { service: SERVICE })?;

    Ok(NowPlayingTrack {
        artist: artist.name,
        title: item.name,
        url_mp3_30s: item.preview_url,
        url_spotify: item.external_urls.spotify,
        spotify_app: item.uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYING: &str = r#"{
        "is_playing": true,
        "item": {
            "name": "Garota de Ipanema",
            "artists": [{"name": "Tom Jobim"}, {"name": "Vinicius de Moraes"}],
            "preview_url": "https://p.scdn.co/mp3-preview/xyz",
            "uri": "spotify:track:xyz",
            "external_urls": {"spotify": "https://open.spotify.com/track/xyz"}
        }
    }"#;

    #[test]
    fn test_playing_track_uses_first_artist() {
        let track = interpret_now_playing(StatusCode::OK, PLAYING).unwrap();
        assert_eq!(track.artist, "Tom Jobim");
        assert_eq!(track.title, "Garota de Ipanema");
        assert_eq!(
            track.url_mp3_30s.as_deref(),
            Some("https://p.scdn.co/mp3-preview/xyz")
        );
        assert_eq!(track.url_spotify, "https://open.spotify.com/track/xyz");
        assert_eq!(track.spotify_app, "spotify:track:xyz");
    }

    #[test]
    fn test_missing_preview_is_none() {
        let body = PLAYING.replace(r#""https://p.scdn.co/mp3-preview/xyz""#, "null");
        let track = interpret_now_playing(StatusCode::OK, &body).unwrap();
        assert_eq!(track.url_mp3_30s, None);
    }

    #[test]
    fn test_unauthorized_points_to_console() {
        let err = interpret_now_playing(StatusCode::UNAUTHORIZED, "").unwrap_err();
        match err {
            ServiceError::AuthExpired { console_url } => assert_eq!(console_url, AUTH_CONSOLE_URL),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nothing_playing() {
        assert!(matches!(
            interpret_now_playing(StatusCode::NO_CONTENT, ""),
            Err(ServiceError::NothingPlaying)
        ));
        assert!(matches!(
            interpret_now_playing(StatusCode::OK, r#"{"item": null}"#),
            Err(ServiceError::NothingPlaying)
        ));
    }

    #[test]
    fn test_other_failures() {
        assert!(matches!(
            interpret_now_playing(StatusCode::TOO_MANY_REQUESTS, ""),
            Err(ServiceError::UnexpectedStatus { status: 429, .. })
        ));
        assert!(matches!(
            interpret_now_playing(StatusCode::OK, "not json"),
            Err(ServiceError::Decode { .. })
        ));
        let no_artists = PLAYING.replace(
            r#"[{"name": "Tom Jobim"}, {"name": "Vinicius de Moraes"}]"#,
            "[]",
        );
        assert!(matches!(
            interpret_now_playing(StatusCode::OK, &no_artists),
            Err(ServiceError::MissingArtist { .. })
        ));
    }

    #[test]
    fn test_token_prefix_is_optional() {
        let client = SpotifyClient::new("Bearer abc123").unwrap();
        assert_eq!(client.token, "abc123");
        let client = SpotifyClient::new(" abc123\n").unwrap();
        assert_eq!(client.token, "abc123");
    }
}
