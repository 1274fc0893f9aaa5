use serde::{Deserialize, Serialize};

use super::chain::ChainTable;
use super::phrase::{PhraseTable, Row};
use super::song::{SongGrid, TrackKind};
use crate::{PhraseId, NUM_TRACKS};

/// Global tempo. The tick rate is `bpm * ppq` ticks per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f32,
    pub ppq: u16,
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0, ppq: 4 }
    }
}

/// Everything the sequencer reads: song grid, per-kind chain and phrase tables, tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub song: SongGrid,
    pub track_kinds: [TrackKind; NUM_TRACKS],
    pub sampler_chains: ChainTable,
    pub instrument_chains: ChainTable,
    pub sampler_phrases: PhraseTable,
    pub instrument_phrases: PhraseTable,
    /// Sample files referenced by the `File` column of sampler rows.
    #[serde(default)]
    pub files: Vec<String>,
    pub tempo: Tempo,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        Self {
            song: SongGrid::default(),
            track_kinds: [TrackKind::default(); NUM_TRACKS],
            sampler_chains: ChainTable::default(),
            instrument_chains: ChainTable::default(),
            sampler_phrases: PhraseTable::default(),
            instrument_phrases: PhraseTable::default(),
            files: Vec::new(),
            tempo: Tempo::default(),
        }
    }

    pub fn track_kind(&self, track: usize) -> Option<TrackKind> {
        self.track_kinds.get(track).copied()
    }

    /// Chain table used by a track, chosen by the track's kind.
    pub fn chains_for(&self, track: usize) -> Option<&ChainTable> {
        Some(match self.track_kind(track)? {
            TrackKind::Sampler => &self.sampler_chains,
            TrackKind::Instrument => &self.instrument_chains,
        })
    }

    pub fn chains_for_mut(&mut self, track: usize) -> Option<&mut ChainTable> {
        Some(match self.track_kind(track)? {
            TrackKind::Sampler => &mut self.sampler_chains,
            TrackKind::Instrument => &mut self.instrument_chains,
        })
    }

    /// Phrase table used by a track, chosen by the track's kind.
    pub fn phrases_for(&self, track: usize) -> Option<&PhraseTable> {
        Some(match self.track_kind(track)? {
            TrackKind::Sampler => &self.sampler_phrases,
            TrackKind::Instrument => &self.instrument_phrases,
        })
    }

    pub fn phrases_for_mut(&mut self, track: usize) -> Option<&mut PhraseTable> {
        Some(match self.track_kind(track)? {
            TrackKind::Sampler => &mut self.sampler_phrases,
            TrackKind::Instrument => &mut self.instrument_phrases,
        })
    }

    pub fn row(&self, track: usize, phrase: PhraseId, row: usize) -> Option<&Row> {
        self.phrases_for(track)?.row(phrase, row)
    }

    /// Fix table sizes after deserializing.
    pub fn normalize(&mut self) {
        self.sampler_chains.normalize();
        self.instrument_chains.normalize();
        self.sampler_phrases.normalize();
        self.instrument_phrases.normalize();
    }
}
