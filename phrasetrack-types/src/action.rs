//! Transport actions sent from the input layer to the sequencer.

use serde::{Deserialize, Serialize};

use crate::{ChainId, PhraseId};

/// Where the input cursor sits when a context-dependent toggle is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewCursor {
    /// Song view: a cell of the song grid.
    Song { track: usize, row: usize },
    /// Chain view: a slot of a chain, read through `track`'s tables.
    Chain { track: usize, chain: ChainId, slot: usize },
    /// Phrase view: a row of a phrase, read through `track`'s tables.
    Phrase { track: usize, phrase: PhraseId, row: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportAction {
    /// Start a song track at a song row (queued while other tracks play).
    Start { track: usize, song_row: usize },
    /// Stop a song track (queued while other tracks play).
    Stop { track: usize },
    /// Move a playing song track to another cell at its next boundary.
    Jump { track: usize, song_row: usize },
    /// Drop any queued start/stop/jump on a track.
    Cancel { track: usize },
    /// Start, stop or jump depending on the cursor and current playback.
    Toggle { cursor: ViewCursor, from_top: bool },
    /// Play every track from a song row at once.
    PlayAllFromRow { song_row: usize },
    /// Stop everything immediately.
    StopAll,
    /// Mark live recording as running so a full stop ends it.
    SetRecording(bool),
    /// File the engine is previewing, cleared on full stop.
    SetPlayingFile(Option<String>),
}
