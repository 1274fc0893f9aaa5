//! Playback state: per-track transports and the shared Chain/Phrase position.
//!
//! This is the snapshot the sequencer thread owns and publishes. It is
//! serializable so a project can be saved and restored mid-playback.

use serde::{Deserialize, Serialize};

use crate::{ChainId, PhraseId, NUM_TRACKS};

/// An action deferred until the track's next song-level cell boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueuedAction {
    #[default]
    None,
    /// Activate at `row` on the next boundary reached by any track.
    Start { row: usize },
    /// Deactivate when this track finishes its current cell.
    Stop,
    /// Leave the current cell when it finishes and start again at `row`.
    Jump { row: usize },
}

impl QueuedAction {
    pub fn is_none(&self) -> bool {
        matches!(self, QueuedAction::None)
    }

    /// Target song row, for the variants that carry one.
    pub fn row(&self) -> Option<usize> {
        match self {
            QueuedAction::Start { row } | QueuedAction::Jump { row } => Some(*row),
            QueuedAction::None | QueuedAction::Stop => None,
        }
    }
}

/// Playback position and control state for one song track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackTransport {
    pub active: bool,
    pub queued: QueuedAction,
    pub song_row: usize,
    pub chain: ChainId,
    pub chain_row: usize,
    pub phrase: PhraseId,
    /// Row within the phrase
    pub row: usize,
    /// Ticks remaining before the next advancement
    pub ticks_left: u32,
}

impl TrackTransport {
    /// Deactivate and drop any queued action.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.queued = QueuedAction::None;
    }
}

/// Single playback position used by Chain and Phrase playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPosition {
    /// Track whose chain and phrase tables are read
    pub track: usize,
    /// Chain being played; `None` in Phrase playback
    pub chain: Option<ChainId>,
    pub chain_row: usize,
    pub phrase: PhraseId,
    pub row: usize,
    pub ticks_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackMode {
    Song,
    Chain,
    Phrase,
}

/// What is being played. Idle playback is `Song` with every transport inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playback {
    Song { transports: [TrackTransport; NUM_TRACKS] },
    Chain(SharedPosition),
    Phrase(SharedPosition),
}

impl Default for Playback {
    fn default() -> Self {
        Playback::Song {
            transports: [TrackTransport::default(); NUM_TRACKS],
        }
    }
}

impl Playback {
    pub fn mode(&self) -> PlaybackMode {
        match self {
            Playback::Song { .. } => PlaybackMode::Song,
            Playback::Chain(_) => PlaybackMode::Chain,
            Playback::Phrase(_) => PlaybackMode::Phrase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub playback: Playback,
    pub is_playing: bool,
    /// Ticks processed since playback started
    pub tick_count: u64,
    /// A live recording is running and must be stopped with playback
    #[serde(default)]
    pub recording_active: bool,
    /// File currently previewed by the engine, cleared on full stop
    #[serde(default)]
    pub playing_file: Option<String>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.playback.mode()
    }

    /// Song transports, when in Song playback.
    pub fn transports(&self) -> Option<&[TrackTransport; NUM_TRACKS]> {
        match &self.playback {
            Playback::Song { transports } => Some(transports),
            _ => None,
        }
    }

    pub fn transports_mut(&mut self) -> Option<&mut [TrackTransport; NUM_TRACKS]> {
        match &mut self.playback {
            Playback::Song { transports } => Some(transports),
            _ => None,
        }
    }

    pub fn transport(&self, track: usize) -> Option<&TrackTransport> {
        self.transports()?.get(track)
    }

    pub fn transport_mut(&mut self, track: usize) -> Option<&mut TrackTransport> {
        self.transports_mut()?.get_mut(track)
    }

    /// Switch to idle Song playback unless Song playback is already loaded.
    pub fn ensure_song(&mut self) {
        if !matches!(self.playback, Playback::Song { .. }) {
            self.playback = Playback::default();
        }
    }

    pub fn is_track_active(&self, track: usize) -> bool {
        self.transport(track).is_some_and(|t| t.active)
    }

    pub fn any_track_active(&self) -> bool {
        self.transports()
            .is_some_and(|ts| ts.iter().any(|t| t.active))
    }

    /// Whether any track other than `track` is active.
    pub fn others_active(&self, track: usize) -> bool {
        self.transports().is_some_and(|ts| {
            ts.iter()
                .enumerate()
                .any(|(i, t)| i != track && t.active)
        })
    }

    pub fn shared_position(&self) -> Option<&SharedPosition> {
        match &self.playback {
            Playback::Chain(pos) | Playback::Phrase(pos) => Some(pos),
            Playback::Song { .. } => None,
        }
    }
}
