//! The range descriptor printed at the end of a session.
//!
//! The same JSON object is what `catalog-update` asks for when it meets a
//! song for the first time, so it doubles as the seed of a catalog entry.

use super::TrackerState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used throughout the catalog.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Range, key and main chords of one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSeed {
    /// Date of the session (YYYY-MM-DD).
    pub update: String,
    /// Key as a pitch class, empty when none was designated.
    pub key: String,
    /// Lowest note label, e.g. "A2".
    pub low: String,
    /// Highest note label, e.g. "E4".
    pub high: String,
    /// Main chords in the order they were designated.
    pub main: Vec<String>,
}

impl RangeSeed {
    /// Builds the descriptor for a finished session.
    pub fn from_state(state: &TrackerState, date: NaiveDate) -> Self {
        Self {
            update: date.format(DATE_FORMAT).to_string(),
            key: state.key_label().to_string(),
            low: state.low_label().to_string(),
            high: state.high_label().to_string(),
            main: state.chords().to_vec(),
        }
    }

    /// Single-line JSON, ready to paste into `catalog-update`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
