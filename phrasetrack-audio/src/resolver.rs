//! Sequence resolution: finding the next playable row through the
//! song → chain → phrase hierarchy.
//!
//! A row is playable when its delta-time is at least 1. Every lookup goes
//! through the track's own chain and phrase tables.

use phrasetrack_types::{
    ChainId, PhraseId, Project, SharedPosition, SongGrid, TrackTransport, CHAIN_SLOTS,
    PHRASE_ROWS,
};

/// Outcome of a successful song-track advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advanced {
    /// The track's chain finished and resolution moved through the song grid,
    /// even when it landed back on the same song row.
    pub chain_looped: bool,
}

/// Where a track starts when entering a song cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStart {
    pub chain: ChainId,
    pub slot: SlotStart,
}

/// First playable position within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStart {
    pub chain_row: usize,
    pub phrase: PhraseId,
    pub row: usize,
}

/// Lowest playable row at or after `start`.
pub fn playable_row_from(project: &Project, phrase: PhraseId, track: usize, start: usize) -> Option<usize> {
    let phrase = project.phrases_for(track)?.phrase(phrase)?;
    phrase
        .rows()
        .iter()
        .enumerate()
        .take(PHRASE_ROWS)
        .skip(start)
        .find(|(_, row)| row.is_playable())
        .map(|(i, _)| i)
}

pub fn first_playable_row(project: &Project, phrase: PhraseId, track: usize) -> Option<usize> {
    playable_row_from(project, phrase, track, 0)
}

pub fn next_playable_row(
    project: &Project,
    phrase: PhraseId,
    track: usize,
    after_row: usize,
) -> Option<usize> {
    playable_row_from(project, phrase, track, after_row + 1)
}

/// First chain slot at or after `from_slot` whose phrase has a playable row.
pub fn first_playable_slot(
    project: &Project,
    track: usize,
    chain: ChainId,
    from_slot: usize,
) -> Option<SlotStart> {
    let chain = project.chains_for(track)?.chain(chain)?;
    chain.filled_slots_from(from_slot).find_map(|(chain_row, phrase)| {
        first_playable_row(project, phrase, track).map(|row| SlotStart {
            chain_row,
            phrase,
            row,
        })
    })
}

/// Start position for a song cell: its chain's first playable slot.
/// `None` for empty cells, out-of-range indices and chains with nothing to play.
pub fn cell_start(project: &Project, track: usize, song_row: usize) -> Option<CellStart> {
    let chain = project.song.cell(track, song_row)?;
    let slot = first_playable_slot(project, track, chain, 0)?;
    Some(CellStart { chain, slot })
}

/// Move a song track to its next playable row.
///
/// Tries the rest of the current phrase, then the remaining slots of the
/// current chain, then the following song rows (wrapping). Returns `None`
/// when the track has nothing left to play anywhere in its column.
pub fn advance_track_sequence(
    project: &Project,
    track: usize,
    transport: &mut TrackTransport,
) -> Option<Advanced> {
    if let Some(row) = next_playable_row(project, transport.phrase, track, transport.row) {
        transport.row = row;
        log::trace!(target: "resolver", "track {} advanced within phrase to row {}", track, row);
        return Some(Advanced { chain_looped: false });
    }

    if let Some(slot) =
        first_playable_slot(project, track, transport.chain, transport.chain_row + 1)
    {
        apply_slot(transport, slot);
        log::debug!(
            target: "resolver",
            "track {} advanced to chain row {}, phrase {}",
            track, slot.chain_row, slot.phrase
        );
        return Some(Advanced { chain_looped: false });
    }

    // Chain finished: look for the next song row with something playable
    let start = SongGrid::rows_after(transport.song_row)
        .find_map(|song_row| cell_start(project, track, song_row).map(|c| (song_row, c)));
    let (song_row, cell) = start?;
    transport.song_row = song_row;
    transport.chain = cell.chain;
    apply_slot(transport, cell.slot);
    log::debug!(
        target: "resolver",
        "track {} advanced to song row {:02X}, chain {}",
        track, song_row, cell.chain
    );
    Some(Advanced { chain_looped: true })
}

fn apply_slot(transport: &mut TrackTransport, slot: SlotStart) {
    transport.chain_row = slot.chain_row;
    transport.phrase = slot.phrase;
    transport.row = slot.row;
}

/// Advance the shared Chain/Phrase position.
///
/// Chain playback moves to the next playable slot and loops to the chain's
/// first one; Phrase playback loops to the phrase's first playable row.
/// Returns `false` when nothing is playable.
pub fn advance_shared(project: &Project, pos: &mut SharedPosition) -> bool {
    if let Some(row) = next_playable_row(project, pos.phrase, pos.track, pos.row) {
        pos.row = row;
        return true;
    }

    match pos.chain {
        Some(chain) => {
            let next = if pos.chain_row + 1 < CHAIN_SLOTS {
                first_playable_slot(project, pos.track, chain, pos.chain_row + 1)
            } else {
                None
            };
            match next.or_else(|| first_playable_slot(project, pos.track, chain, 0)) {
                Some(slot) => {
                    pos.chain_row = slot.chain_row;
                    pos.phrase = slot.phrase;
                    pos.row = slot.row;
                    true
                }
                None => false,
            }
        }
        None => match first_playable_row(project, pos.phrase, pos.track) {
            Some(row) => {
                pos.row = row;
                true
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasetrack_types::{TrackKind, NUM_TRACKS};

    fn chain(n: u8) -> ChainId {
        ChainId::new(n)
    }

    fn phrase(n: u8) -> PhraseId {
        PhraseId::new(n)
    }

    /// Put `chain_id` at `(track, song_row)` holding the given phrases in its first slots.
    fn place(project: &mut Project, track: usize, song_row: usize, chain_id: u8, phrases: &[u8]) {
        project.song.set_cell(track, song_row, Some(chain(chain_id)));
        let chains = project.chains_for_mut(track).unwrap();
        for (slot, p) in phrases.iter().enumerate() {
            chains.set_slot(chain(chain_id), slot, Some(phrase(*p)));
        }
    }

    fn set_dt(project: &mut Project, track: usize, p: u8, rows: &[(usize, u8)]) {
        let phrases = project.phrases_for_mut(track).unwrap();
        for &(row, dt) in rows {
            phrases.set_delta_time(phrase(p), row, Some(dt));
        }
    }

    fn transport_at(song_row: usize, c: u8, chain_row: usize, p: u8, row: usize) -> TrackTransport {
        TrackTransport {
            active: true,
            song_row,
            chain: chain(c),
            chain_row,
            phrase: phrase(p),
            row,
            ..Default::default()
        }
    }

    #[test]
    fn test_first_and_next_playable_row() {
        let mut project = Project::new();
        set_dt(&mut project, 0, 1, &[(3, 0), (5, 2), (9, 1)]);
        assert_eq!(first_playable_row(&project, phrase(1), 0), Some(5));
        assert_eq!(next_playable_row(&project, phrase(1), 0, 5), Some(9));
        assert_eq!(next_playable_row(&project, phrase(1), 0, 9), None);
        assert_eq!(next_playable_row(&project, phrase(1), 0, PHRASE_ROWS - 1), None);
        assert_eq!(first_playable_row(&project, phrase(2), 0), None);
        assert_eq!(first_playable_row(&project, phrase(255), 0), None);
        assert_eq!(first_playable_row(&project, phrase(1), NUM_TRACKS), None);
    }

    #[test]
    fn test_lookups_use_track_kind_tables() {
        let mut project = Project::new();
        project.track_kinds[1] = TrackKind::Instrument;
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        assert_eq!(first_playable_row(&project, phrase(0), 0), Some(0));
        assert_eq!(first_playable_row(&project, phrase(0), 1), None);
    }

    #[test]
    fn test_first_playable_slot_skips_unplayable_phrases() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[1, 2]);
        set_dt(&mut project, 0, 2, &[(4, 1)]);
        let slot = first_playable_slot(&project, 0, chain(0), 0).unwrap();
        assert_eq!(slot, SlotStart { chain_row: 1, phrase: phrase(2), row: 4 });
        assert!(cell_start(&project, 0, 1).is_none());
    }

    #[test]
    fn test_advance_within_phrase() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[0]);
        set_dt(&mut project, 0, 0, &[(0, 2), (4, 2)]);
        let mut t = transport_at(0, 0, 0, 0, 0);
        assert_eq!(advance_track_sequence(&project, 0, &mut t), Some(Advanced { chain_looped: false }));
        assert_eq!(t.row, 4);
    }

    #[test]
    fn test_advance_to_next_chain_slot() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[0, 1]);
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        set_dt(&mut project, 0, 1, &[(2, 1)]);
        let mut t = transport_at(0, 0, 0, 0, 0);
        assert_eq!(advance_track_sequence(&project, 0, &mut t), Some(Advanced { chain_looped: false }));
        assert_eq!((t.chain_row, t.phrase, t.row), (1, phrase(1), 2));
        assert_eq!(t.song_row, 0);
    }

    #[test]
    fn test_advance_to_next_song_row_is_a_loop() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[0]);
        place(&mut project, 0, 3, 1, &[1]);
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        set_dt(&mut project, 0, 1, &[(0, 1)]);
        let mut t = transport_at(0, 0, 0, 0, 0);
        assert_eq!(advance_track_sequence(&project, 0, &mut t), Some(Advanced { chain_looped: true }));
        assert_eq!((t.song_row, t.chain, t.phrase), (3, chain(1), phrase(1)));

        // From row 3 the search wraps back to row 0
        assert_eq!(advance_track_sequence(&project, 0, &mut t), Some(Advanced { chain_looped: true }));
        assert_eq!(t.song_row, 0);
    }

    #[test]
    fn test_single_slot_chain_reports_loop_on_same_row() {
        let mut project = Project::new();
        place(&mut project, 0, 5, 0, &[0]);
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        let mut t = transport_at(5, 0, 0, 0, 0);
        let advanced = advance_track_sequence(&project, 0, &mut t).unwrap();
        assert!(advanced.chain_looped);
        assert_eq!(t.song_row, 5);
        assert_eq!(t.row, 0);
    }

    #[test]
    fn test_advance_skips_cells_without_playable_rows() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[0]);
        place(&mut project, 0, 1, 1, &[1]); // phrase 1 has no DT
        place(&mut project, 0, 2, 2, &[2]);
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        set_dt(&mut project, 0, 2, &[(7, 3)]);
        let mut t = transport_at(0, 0, 0, 0, 0);
        advance_track_sequence(&project, 0, &mut t).unwrap();
        assert_eq!((t.song_row, t.row), (2, 7));
    }

    #[test]
    fn test_advance_exhausted_when_column_has_nothing() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 0, &[0]);
        let mut t = transport_at(0, 0, 0, 0, 0);
        assert_eq!(advance_track_sequence(&project, 0, &mut t), None);
    }

    #[test]
    fn test_shared_chain_loops_to_first_slot() {
        let mut project = Project::new();
        place(&mut project, 0, 0, 4, &[0, 1]);
        set_dt(&mut project, 0, 0, &[(0, 1)]);
        set_dt(&mut project, 0, 1, &[(1, 1)]);
        let mut pos = SharedPosition {
            track: 0,
            chain: Some(chain(4)),
            chain_row: 0,
            phrase: phrase(0),
            row: 0,
            ticks_left: 0,
        };
        assert!(advance_shared(&project, &mut pos));
        assert_eq!((pos.chain_row, pos.phrase, pos.row), (1, phrase(1), 1));
        assert!(advance_shared(&project, &mut pos));
        assert_eq!((pos.chain_row, pos.phrase, pos.row), (0, phrase(0), 0));
    }

    #[test]
    fn test_shared_phrase_loops_to_first_row() {
        let mut project = Project::new();
        set_dt(&mut project, 0, 9, &[(2, 1), (6, 1)]);
        let mut pos = SharedPosition {
            track: 0,
            chain: None,
            chain_row: 0,
            phrase: phrase(9),
            row: 6,
            ticks_left: 0,
        };
        assert!(advance_shared(&project, &mut pos));
        assert_eq!(pos.row, 2);

        let empty = Project::new();
        assert!(!advance_shared(&empty, &mut pos));
    }
}
