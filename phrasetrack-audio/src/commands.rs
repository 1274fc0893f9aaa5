//! Commands sent to the sequencer thread and feedback sent back.

use crossbeam_channel::Sender;
use phrasetrack_types::{
    PlaybackMode, PlaybackState, Project, Tempo, TrackTransport, TransportAction, NUM_TRACKS,
};

/// In-place project edit run on the sequencer thread.
pub type ProjectEdit = Box<dyn FnOnce(&mut Project) + Send>;

pub enum SequencerCmd {
    Transport(TransportAction),
    SetProject(Box<Project>),
    Edit(ProjectEdit),
    SetTempo(Tempo),
    Restore(Box<PlaybackState>),
    Snapshot {
        reply: Sender<(Project, PlaybackState)>,
    },
    Shutdown,
}

impl std::fmt::Debug for SequencerCmd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequencerCmd::Transport(action) => f.debug_tuple("Transport").field(action).finish(),
            SequencerCmd::SetProject(_) => f.write_str("SetProject"),
            SequencerCmd::Edit(_) => f.write_str("Edit"),
            SequencerCmd::SetTempo(tempo) => f.debug_tuple("SetTempo").field(tempo).finish(),
            SequencerCmd::Restore(_) => f.write_str("Restore"),
            SequencerCmd::Snapshot { .. } => f.write_str("Snapshot"),
            SequencerCmd::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Playback changes reported to the main thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerFeedback {
    PlaybackStarted(PlaybackMode),
    PlaybackStopped,
    TrackStarted { track: usize, song_row: usize },
    TrackStopped { track: usize },
    SongRowChanged { track: usize, song_row: usize },
}

/// Feedback describing the change from `prev` to `next`: stops first, then starts.
pub fn diff_feedback(prev: &PlaybackState, next: &PlaybackState) -> Vec<SequencerFeedback> {
    let mut out = Vec::new();
    let idle = [TrackTransport::default(); NUM_TRACKS];
    let before = prev.transports().unwrap_or(&idle);
    let after = next.transports().unwrap_or(&idle);

    for (track, (b, a)) in before.iter().zip(after).enumerate() {
        if b.active && !a.active {
            out.push(SequencerFeedback::TrackStopped { track });
        }
    }

    let switched = prev.is_playing && next.is_playing && prev.mode() != next.mode();
    if prev.is_playing && (!next.is_playing || switched) {
        out.push(SequencerFeedback::PlaybackStopped);
    }
    if next.is_playing && (!prev.is_playing || switched) {
        out.push(SequencerFeedback::PlaybackStarted(next.mode()));
    }

    for (track, (b, a)) in before.iter().zip(after).enumerate() {
        if !a.active {
            continue;
        }
        if !b.active {
            out.push(SequencerFeedback::TrackStarted {
                track,
                song_row: a.song_row,
            });
        } else if b.song_row != a.song_row {
            out.push(SequencerFeedback::SongRowChanged {
                track,
                song_row: a.song_row,
            });
        }
    }
    out
}
