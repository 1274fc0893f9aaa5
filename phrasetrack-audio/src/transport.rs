//! Per-track transport helpers: activation, seeding and tick budgets.

use phrasetrack_types::{Project, QueuedAction, Row, SharedPosition, TrackTransport};

use crate::resolver::CellStart;

/// Activate a transport at the start of a song cell and load its first row's budget.
pub fn activate_at(project: &Project, track: usize, transport: &mut TrackTransport, song_row: usize, cell: CellStart) {
    transport.active = true;
    transport.queued = QueuedAction::None;
    transport.song_row = song_row;
    transport.chain = cell.chain;
    transport.chain_row = cell.slot.chain_row;
    transport.phrase = cell.slot.phrase;
    transport.row = cell.slot.row;
    load_ticks(project, track, transport);
}

/// Row a transport is currently on.
pub fn current_row<'a>(project: &'a Project, track: usize, transport: &TrackTransport) -> Option<&'a Row> {
    project.row(track, transport.phrase, transport.row)
}

/// Set `ticks_left` from the current row's delta-time.
pub fn load_ticks(project: &Project, track: usize, transport: &mut TrackTransport) {
    transport.ticks_left = current_row(project, track, transport).map_or(0, Row::ticks);
}

pub fn shared_row<'a>(project: &'a Project, pos: &SharedPosition) -> Option<&'a Row> {
    project.row(pos.track, pos.phrase, pos.row)
}

pub fn load_shared_ticks(project: &Project, pos: &mut SharedPosition) {
    pos.ticks_left = shared_row(project, pos).map_or(0, Row::ticks);
}

/// Count one tick. Returns `true` when the transport reached its boundary.
pub fn count_down(ticks_left: &mut u32) -> bool {
    if *ticks_left > 0 {
        *ticks_left -= 1;
    }
    *ticks_left == 0
}
