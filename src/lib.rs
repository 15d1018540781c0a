//! vocalrange - Vocal range tracking and song catalog maintenance.
//!
//! This library backs two small programs:
//! - `range-tracker` reads a MIDI keyboard and reports the range, key and
//!   main chords of a song as it is played through.
//! - `catalog-update` takes the song currently playing, fetches its lyrics
//!   and merges everything into a JSON catalog of vocal ranges.

pub mod audio;
pub mod catalog;
pub mod midi;
pub mod services;
pub mod tracker;
pub mod updater;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use midi::{classify, NoteEvent, NoteKind, Pitch};
pub use tracker::{RangeSeed, Tracker, TrackerState};
pub use updater::run_update;
