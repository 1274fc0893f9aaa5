//! The song grid: one column of chain cells per track.

use serde::{Deserialize, Serialize};

use crate::{ChainId, NUM_TRACKS, SONG_ROWS};

/// Instrument family of a track. Each kind has its own chain and phrase tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackKind {
    #[default]
    Sampler,
    Instrument,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongGrid {
    cells: [[Option<ChainId>; SONG_ROWS]; NUM_TRACKS],
}

impl SongGrid {
    /// Chain at a cell; `None` for empty cells and out-of-range indices.
    pub fn cell(&self, track: usize, row: usize) -> Option<ChainId> {
        self.cells.get(track)?.get(row).copied().flatten()
    }

    pub fn set_cell(&mut self, track: usize, row: usize, chain: Option<ChainId>) {
        if let Some(cell) = self.cells.get_mut(track).and_then(|t| t.get_mut(row)) {
            *cell = chain;
        }
    }

    /// Song rows after `row` in playback order, wrapping and ending on `row` itself.
    pub fn rows_after(row: usize) -> impl Iterator<Item = usize> {
        (1..=SONG_ROWS).map(move |offset| (row + offset) % SONG_ROWS)
    }
}
