//! Tracker state and its transition function.
//!
//! Every received event goes through [`TrackerState::step`], which returns
//! the new state and what the loop should do next. The function is pure:
//! echoing notes and sleeping are left to the caller.

use super::{KEY_NOTE, MAJOR_CHORD_NOTE, MINOR_CHORD_NOTE, STOP_NOTE};
use crate::midi::{NoteEvent, NoteKind, Pitch};

/// How a single event is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Ends the session. The event itself is discarded.
    Stop,
    /// Designates the last played note as the song's key.
    Key,
    /// Designates the last played note as a main chord.
    Chord { minor: bool },
    /// A sung/played note: counts towards the range and is echoed.
    Performance,
    /// Note-offs and anything else that is not a control note.
    Ignored,
}

/// What the loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stop reading events.
    Stop,
    /// Echo this pitch on the output device.
    Echo(Pitch),
    /// Nothing to send.
    Nothing,
}

/// One end of the observed range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extreme {
    pub pitch: Pitch,
    pub label: String,
}

impl Extreme {
    fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            label: pitch.label(),
        }
    }
}

/// Everything remembered across events during one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    /// Pitch class of the designated key.
    key: Option<&'static str>,
    low: Option<Extreme>,
    high: Option<Extreme>,
    /// Set by a designation, cleared by the next performance note.
    /// While set, control notes are played as ordinary notes.
    control: bool,
    /// The note a designation refers to.
    last_pitch: Option<Pitch>,
    played: Vec<Pitch>,
    chords: Vec<String>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies an event against the current control flag.
    pub fn role_of(&self, event: &NoteEvent) -> Role {
        let note = event.pitch.as_u8();
        if note == STOP_NOTE {
            return Role::Stop;
        }
        if !self.control && event.kind != NoteKind::Other {
            match note {
                KEY_NOTE => return Role::Key,
                MINOR_CHORD_NOTE => return Role::Chord { minor: true },
                MAJOR_CHORD_NOTE => return Role::Chord { minor: false },
                _ => {}
            }
        }
        if event.kind == NoteKind::NoteOn {
            Role::Performance
        } else {
            Role::Ignored
        }
    }

    /// Applies one event and returns the next state.
    pub fn step(mut self, event: NoteEvent) -> (Self, Outcome) {
        let outcome = match self.role_of(&event) {
            Role::Stop => Outcome::Stop,
            Role::Key => {
                if let Some(pitch) = self.designated("key") {
                    self.key = Some(pitch.class());
                    tracing::info!("key confirmed: {}", pitch.class());
                    self.control = true;
                }
                Outcome::Nothing
            }
            Role::Chord { minor } => {
                if let Some(pitch) = self.designated("chord") {
                    let mut chord = pitch.class().to_string();
                    if minor {
                        chord.push('m');
                    }
                    tracing::info!("chord confirmed: {}", chord);
                    self.chords.push(chord);
                    self.control = true;
                }
                Outcome::Nothing
            }
            Role::Performance => {
                self.perform(event.pitch);
                Outcome::Echo(event.pitch)
            }
            Role::Ignored => Outcome::Nothing,
        };
        (self, outcome)
    }

    fn designated(&self, what: &str) -> Option<Pitch> {
        if self.last_pitch.is_none() {
            tracing::warn!("{} designation ignored: no note has been played yet", what);
        }
        self.last_pitch
    }

    fn perform(&mut self, pitch: Pitch) {
        let mut widened = false;
        // The first note opens both ends; afterwards only strict improvements count
        if self.low.as_ref().map_or(true, |low| pitch < low.pitch) {
            self.low = Some(Extreme::new(pitch));
            widened = true;
        }
        if self.high.as_ref().map_or(true, |high| pitch > high.pitch) {
            self.high = Some(Extreme::new(pitch));
            widened = true;
        }
        if widened {
            tracing::info!(
                "Range {} to {}. Key {}",
                self.low_label(),
                self.high_label(),
                self.key_label()
            );
        }

        self.control = false;
        self.last_pitch = Some(pitch);
        self.played.push(pitch);
    }

    pub fn key(&self) -> Option<&'static str> {
        self.key
    }

    pub fn low(&self) -> Option<&Extreme> {
        self.low.as_ref()
    }

    pub fn high(&self) -> Option<&Extreme> {
        self.high.as_ref()
    }

    pub fn is_control(&self) -> bool {
        self.control
    }

    /// All performance notes, in the order they were played.
    pub fn played(&self) -> &[Pitch] {
        &self.played
    }

    pub fn chords(&self) -> &[String] {
        &self.chords
    }

    /// Key label, empty if none was designated.
    pub fn key_label(&self) -> &str {
        self.key.unwrap_or("")
    }

    /// Lowest note label, empty if nothing was played.
    pub fn low_label(&self) -> &str {
        self.low.as_ref().map_or("", |e| e.label.as_str())
    }

    /// Highest note label, empty if nothing was played.
    pub fn high_label(&self) -> &str {
        self.high.as_ref().map_or("", |e| e.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(n: u8) -> NoteEvent {
        NoteEvent::note_on(Pitch::new(n).unwrap())
    }

    fn off(n: u8) -> NoteEvent {
        NoteEvent::note_off(Pitch::new(n).unwrap())
    }

    fn feed(state: TrackerState, events: &[NoteEvent]) -> TrackerState {
        events.iter().fold(state, |s, e| s.step(*e).0)
    }

    fn extremes(state: &TrackerState) -> (u8, u8) {
        (
            state.low().unwrap().pitch.as_u8(),
            state.high().unwrap().pitch.as_u8(),
        )
    }

    #[test]
    fn test_first_note_sets_both_ends() {
        let (state, outcome) = TrackerState::new().step(on(64));
        assert_eq!(outcome, Outcome::Echo(Pitch::new(64).unwrap()));
        assert_eq!(state.low_label(), "E4");
        assert_eq!(state.high_label(), "E4");
        assert_eq!(state.played().len(), 1);
    }

    #[test]
    fn test_stop_note_any_kind() {
        let state = TrackerState::new();
        assert_eq!(state.role_of(&on(21)), Role::Stop);
        assert_eq!(state.role_of(&off(21)), Role::Stop);
        let (_, outcome) = state.step(on(21));
        assert_eq!(outcome, Outcome::Stop);
    }

    #[test]
    fn test_key_designation_uses_last_played_note() {
        let state = feed(TrackerState::new(), &[on(62), off(62)]);
        let (state, outcome) = state.step(on(22));
        assert_eq!(outcome, Outcome::Nothing);
        assert_eq!(state.key(), Some("D"));
        assert!(state.is_control());
        // The designation is not a performance note
        assert_eq!(state.played().len(), 1);
    }

    #[test]
    fn test_chord_designation_minor_and_major() {
        let state = feed(
            TrackerState::new(),
            &[on(69), on(23), on(65), on(24), on(67), on(24)],
        );
        assert_eq!(state.chords(), ["Am", "F", "G"]);
    }

    #[test]
    fn test_control_note_while_flag_set_is_performance() {
        let state = feed(TrackerState::new(), &[on(60), on(22)]);
        assert!(state.is_control());
        let (state, outcome) = state.step(on(24));
        assert_eq!(outcome, Outcome::Echo(Pitch::new(24).unwrap()));
        assert!(state.chords().is_empty());
        assert!(!state.is_control());
        assert_eq!(state.low_label(), "C1");
    }

    #[test]
    fn test_note_off_designates_when_flag_clear() {
        // Releasing a control key counts like pressing it
        let state = feed(TrackerState::new(), &[on(60), off(22)]);
        assert_eq!(state.key(), Some("C"));
    }

    #[test]
    fn test_designation_without_prior_note_is_ignored() {
        let (state, outcome) = TrackerState::new().step(on(22));
        assert_eq!(outcome, Outcome::Nothing);
        assert_eq!(state.key(), None);
        assert!(!state.is_control());
        let (state, _) = state.step(on(23));
        assert!(state.chords().is_empty());
    }

    #[test]
    fn test_control_round_trip() {
        let state = feed(TrackerState::new(), &[on(60), on(64)]);
        let before = state.played().len();
        let (state, _) = state.step(on(22));
        assert!(state.is_control());
        let (state, _) = state.step(on(67));
        assert!(!state.is_control());
        assert_eq!(state.played().len(), before + 1);
    }

    #[test]
    fn test_note_off_and_other_are_ignored() {
        let other = NoteEvent::new(NoteKind::Other, Pitch::new(50).unwrap());
        let state = feed(TrackerState::new(), &[on(60), off(40), other]);
        assert_eq!(state.played().len(), 1);
        assert_eq!(extremes(&state), (60, 60));
        // Aftertouch on a control key is never a designation
        let aftertouch = NoteEvent::new(NoteKind::Other, Pitch::new(22).unwrap());
        assert_eq!(state.role_of(&aftertouch), Role::Ignored);
    }

    #[test]
    fn test_repeating_sequence_keeps_extremes() {
        let sequence: Vec<NoteEvent> = [62, 57, 71, 64, 57, 72, 60].iter().map(|n| on(*n)).collect();
        let once = feed(TrackerState::new(), &sequence);
        let twice = feed(once.clone(), &sequence);
        assert_eq!(extremes(&once), extremes(&twice));
        assert_eq!(extremes(&once), (57, 72));
    }

    #[test]
    fn test_extremes_only_tighten_outwards() {
        let sequence = [65, 70, 60, 62, 75, 59, 59, 80, 40, 66];
        let mut state = TrackerState::new();
        let mut previous: Option<(u8, u8)> = None;
        for n in sequence {
            state = state.step(on(n)).0;
            let current = extremes(&state);
            if let Some((low, high)) = previous {
                assert!(current.0 <= low);
                assert!(current.1 >= high);
            }
            previous = Some(current);
        }
        assert_eq!(previous, Some((40, 80)));
    }

    #[test]
    fn test_equal_note_does_not_replace_extreme() {
        let state = feed(TrackerState::new(), &[on(60), on(72), on(60), on(72)]);
        assert_eq!(state.low_label(), "C4");
        assert_eq!(state.high_label(), "C5");
        assert_eq!(state.played().len(), 4);
    }
}
