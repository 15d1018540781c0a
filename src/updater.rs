//! The catalog update flow.
//!
//! Fetch what is playing, fetch its lyrics, then load (and back up) the
//! catalog, merge and save. Nothing touches the catalog file until both
//! remote calls are done.

use crate::catalog::{self, CatalogError, MergeKind, SeedProvider};
use crate::services::{fetch_metadata, LyricsSource, NowPlayingSource, ServiceError};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub artist: String,
    pub title: String,
    pub kind: MergeKind,
}

/// Runs one update of the catalog at `catalog_path`, dated `date`.
pub fn run_update(
    now_playing: &dyn NowPlayingSource,
    lyrics: &dyn LyricsSource,
    seeds: &mut dyn SeedProvider,
    catalog_path: &Path,
    date: NaiveDate,
) -> Result<UpdateReport, UpdateError> {
    let metadata = fetch_metadata(now_playing, lyrics)?;

    let mut catalog = catalog::load_with_backup(catalog_path)?;
    let kind = catalog.merge(&metadata, date, seeds)?;
    catalog::save(catalog_path, &catalog)?;

    Ok(UpdateReport {
        artist: metadata.artist,
        title: metadata.title,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{backup_path, parse_seed, Catalog, SeedError};
    use crate::services::{NowPlayingTrack, AUTH_CONSOLE_URL};
    use serde_json::{Map, Value};
    use std::fs;

    struct Playing(Result<NowPlayingTrack, ()>);

    impl NowPlayingSource for Playing {
        fn now_playing(&self) -> Result<NowPlayingTrack, ServiceError> {
            self.0.clone().map_err(|_| ServiceError::AuthExpired {
                console_url: AUTH_CONSOLE_URL,
            })
        }
    }

    /// Lyrics service that never finds anything.
    struct NoLyrics;

    impl LyricsSource for NoLyrics {
        fn lyrics(&self, _: &str, _: &str) -> Result<String, ServiceError> {
            Ok(String::new())
        }
    }

    struct FixedLyrics(&'static str);

    impl LyricsSource for FixedLyrics {
        fn lyrics(&self, _: &str, _: &str) -> Result<String, ServiceError> {
            Ok(self.0.to_string())
        }
    }

    struct Seeds {
        answer: &'static str,
        asked: usize,
    }

    impl SeedProvider for Seeds {
        fn seed(&mut self, _: &str, _: &str) -> Result<Map<String, Value>, SeedError> {
            self.asked += 1;
            parse_seed(self.answer)
        }
    }

    fn seeds(answer: &'static str) -> Seeds {
        Seeds { answer, asked: 0 }
    }

    fn track(artist: &str, title: &str) -> NowPlayingTrack {
        NowPlayingTrack {
            artist: artist.to_string(),
            title: title.to_string(),
            url_mp3_30s: Some("https://p.scdn.co/mp3-preview/1".to_string()),
            url_spotify: "https://open.spotify.com/track/1".to_string(),
            spotify_app: "spotify:track:1".to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 15).unwrap()
    }

    const EXISTING: &str = r#"{"Artist A": {"Song B": {"update": "2020-01-01", "key": "E", "low": "B2", "high": "E4", "main": ["E"], "letra": "", "url_mp3_30s": null, "url_spotify": "", "spotify_app": ""}}}"#;

    #[test]
    fn test_update_existing_song() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocal-ranges.json");
        fs::write(&path, EXISTING).unwrap();
        let mut seeds = seeds("{}");

        let report = run_update(
            &Playing(Ok(track("Artist A", "Song B"))),
            &FixedLyrics("letra nova"),
            &mut seeds,
            &path,
            date(),
        )
        .unwrap();

        assert_eq!(report.kind, MergeKind::Updated);
        assert_eq!(seeds.asked, 0);
        let catalog = Catalog::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = catalog.entry("Artist A", "Song B").unwrap();
        assert_eq!(entry.update, "2024-08-15");
        assert_eq!(entry.letra, "letra nova");
        assert_eq!(entry.spotify_app, "spotify:track:1");
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), EXISTING);
    }

    #[test]
    fn test_new_song_with_missing_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocal-ranges.json");
        fs::write(&path, EXISTING).unwrap();
        let mut seeds = seeds(r#"{"update": "2024-08-14", "key": "A", "low": "E3", "high": "A4", "main": ["A", "D"]}"#);

        let report = run_update(
            &Playing(Ok(track("Artist Z", "Song Y"))),
            &NoLyrics,
            &mut seeds,
            &path,
            date(),
        )
        .unwrap();

        assert_eq!(report.kind, MergeKind::Created);
        assert_eq!(seeds.asked, 1);
        let catalog = Catalog::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = catalog.entry("Artist Z", "Song Y").unwrap();
        assert_eq!(entry.letra, "");
        assert_eq!(entry.high, "A4");
        assert!(catalog.contains("Artist A", "Song B"));
    }

    #[test]
    fn test_expired_auth_leaves_catalog_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocal-ranges.json");
        fs::write(&path, EXISTING).unwrap();

        let err = run_update(&Playing(Err(())), &NoLyrics, &mut seeds("{}"), &path, date())
            .unwrap_err();

        assert!(matches!(
            err,
            UpdateError::Service(ServiceError::AuthExpired { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_malformed_seed_keeps_file_but_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocal-ranges.json");
        fs::write(&path, EXISTING).unwrap();

        let err = run_update(
            &Playing(Ok(track("New", "Song"))),
            &NoLyrics,
            &mut seeds("not json"),
            &path,
            date(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            UpdateError::Catalog(CatalogError::Seed(SeedError::Malformed(_)))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
        assert!(backup_path(&path).exists());
    }

    #[test]
    fn test_first_run_creates_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocal-ranges.json");

        run_update(
            &Playing(Ok(track("Artist", "Song"))),
            &FixedLyrics("la"),
            &mut seeds(r#"{"key": "C"}"#),
            &path,
            date(),
        )
        .unwrap();

        let catalog = Catalog::from_json(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(catalog.entry("Artist", "Song").unwrap().key, "C");
    }
}
