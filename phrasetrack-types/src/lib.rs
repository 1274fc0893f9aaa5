//! # phrasetrack-types
//!
//! Shared type definitions for the phrasetrack sequencer.
//! This crate holds the song/chain/phrase data model, per-track transport
//! state and transport actions used by phrasetrack-audio and phrasetrack-core.

pub mod action;
mod dispatch;
pub mod state;

pub use action::*;
pub use dispatch::Dispatcher;

// Re-export all state types at crate root for convenience
pub use state::*;

/// Number of tracks (song grid columns).
pub const NUM_TRACKS: usize = 8;
/// Number of rows in the song grid. A track's cells loop from the last row to row 0.
pub const SONG_ROWS: usize = 16;
/// Phrase slots per chain.
pub const CHAIN_SLOTS: usize = 16;
/// Chains per track kind.
pub const NUM_CHAINS: usize = 255;
/// Phrases per track kind.
pub const NUM_PHRASES: usize = 255;
/// Rows per phrase.
pub const PHRASE_ROWS: usize = 255;

/// Identifier of a chain within a track kind's chain table (0..=254).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(u8);

impl ChainId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }
    pub fn get(self) -> u8 {
        self.0
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
    /// Whether the id addresses a slot of the chain table.
    pub fn is_valid(self) -> bool {
        self.index() < NUM_CHAINS
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

/// Identifier of a phrase within a track kind's phrase table (0..=254).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct PhraseId(u8);

impl PhraseId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }
    pub fn get(self) -> u8 {
        self.0
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
    pub fn is_valid(self) -> bool {
        self.index() < NUM_PHRASES
    }
}

impl std::fmt::Display for PhraseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}
