//! Vagalume lyrics client.
//!
//! A miss is not an error: the update carries on with empty lyrics.

use super::{LyricsSource, ServiceError};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;

pub const LYRICS_API: &str = "https://api.vagalume.com.br/search.php";

pub struct LyricsClient {
    client: Client,
    api_key: String,
}

impl LyricsClient {
    pub fn new(api_key: &str) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
        })
    }
}

impl LyricsSource for LyricsClient {
    fn lyrics(&self, artist: &str, title: &str) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(LYRICS_API)
            .header(ACCEPT, "application/json")
            .query(&[("art", artist), ("mus", title), ("apikey", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        match parse_lyrics(&body) {
            Some(text) => Ok(text),
            None => {
                tracing::warn!(
                    "No lyrics for {} - {} (HTTP {}): {}",
                    artist,
                    title,
                    status,
                    body
                );
                Ok(String::new())
            }
        }
    }
}

/// Extracts `mus[0].text` from a search response.
pub fn parse_lyrics(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("mus")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_match() {
        let body = r#"{
            "type": "exact",
            "art": {"id": "3ade68b5", "name": "Cartola"},
            "mus": [{"id": "3ade68b8", "name": "O Mundo É Um Moinho", "text": "Ainda é cedo, amor\nMal começaste a conhecer a vida"}]
        }"#;
        assert_eq!(
            parse_lyrics(body).as_deref(),
            Some("Ainda é cedo, amor\nMal começaste a conhecer a vida")
        );
    }

    #[test]
    fn test_parse_misses() {
        assert_eq!(parse_lyrics(r#"{"type": "notfound"}"#), None);
        assert_eq!(parse_lyrics(r#"{"type": "song_notfound", "mus": []}"#), None);
        assert_eq!(parse_lyrics(r#"{"mus": [{"name": "x"}]}"#), None);
        assert_eq!(parse_lyrics("<html>502</html>"), None);
    }
}
