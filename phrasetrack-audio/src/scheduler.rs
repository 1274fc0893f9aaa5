//! Playback scheduler: what happens on every tick.
//!
//! Song playback counts each active track down independently. A track at
//! zero advances to its next playable row; when that crosses into another
//! song cell (or loops its chain) the track is at a song-level cell
//! boundary, where queued stops and jumps take effect and queued starts on
//! other tracks are released.

use phrasetrack_types::{Playback, QueuedAction, SONG_ROWS};

use crate::emitter::emit_row;
use crate::resolver::{advance_shared, advance_track_sequence, cell_start};
use crate::sequencer::Sequencer;
use crate::transport::{activate_at, count_down, load_shared_ticks, load_ticks};

impl Sequencer {
    /// Process one tick. Does nothing when stopped.
    pub fn tick(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.state.tick_count += 1;
        match self.state.playback {
            Playback::Song { .. } => self.tick_song(),
            Playback::Chain(_) | Playback::Phrase(_) => self.tick_shared(),
        }
    }

    fn tick_song(&mut self) {
        let Sequencer {
            project,
            state,
            sink,
            ..
        } = &mut *self;
        let Playback::Song { transports } = &mut state.playback else {
            return;
        };

        let mut any_boundary = false;
        for (track, t) in transports.iter_mut().enumerate() {
            if !t.active || !count_down(&mut t.ticks_left) {
                continue;
            }

            let prev_song_row = t.song_row;
            let Some(advanced) = advance_track_sequence(project, track, t) else {
                log::info!(target: "scheduler", "track {} reached end of sequence", track);
                t.deactivate();
                continue;
            };

            if t.song_row != prev_song_row || advanced.chain_looped {
                any_boundary = true;
                log::debug!(
                    target: "scheduler",
                    "track {} cell boundary: song row {:02X} -> {:02X}",
                    track, prev_song_row, t.song_row
                );
                match t.queued {
                    QueuedAction::Jump { row } if row != t.song_row => {
                        t.active = false;
                        t.queued = QueuedAction::Start { row };
                        log::debug!(target: "scheduler", "track {} leaving for song row {:02X}", track, row);
                        continue;
                    }
                    QueuedAction::Jump { .. } | QueuedAction::Stop => {
                        t.deactivate();
                        log::info!(target: "scheduler", "track {} stopped at cell boundary", track);
                        continue;
                    }
                    QueuedAction::None | QueuedAction::Start { .. } => {}
                }
            }

            load_ticks(project, track, t);
            emit_row(project, &**sink, track, t.phrase, t.row);
        }

        if any_boundary {
            for (track, t) in transports.iter_mut().enumerate() {
                let QueuedAction::Start { row } = t.queued else {
                    continue;
                };
                if t.active {
                    continue;
                }
                if row >= SONG_ROWS {
                    log::warn!(target: "scheduler", "track {} queued for invalid song row {}", track, row);
                    t.queued = QueuedAction::None;
                    continue;
                }
                let Some(cell) = cell_start(project, track, row) else {
                    log::info!(target: "scheduler", "track {} queued start at {:02X} has nothing to play", track, row);
                    t.queued = QueuedAction::None;
                    continue;
                };
                activate_at(project, track, t, row, cell);
                emit_row(project, &**sink, track, t.phrase, t.row);
                log::info!(
                    target: "scheduler",
                    "track {} started at song row {:02X}, chain {}, phrase {}",
                    track, row, cell.chain, t.phrase
                );
            }
        }

        if !transports.iter().any(|t| t.active) {
            log::info!(target: "scheduler", "all tracks inactive");
            self.full_stop();
        }
    }

    fn tick_shared(&mut self) {
        let Sequencer {
            project,
            state,
            sink,
            ..
        } = &mut *self;
        let pos = match &mut state.playback {
            Playback::Chain(pos) | Playback::Phrase(pos) => pos,
            Playback::Song { .. } => return,
        };
        if !count_down(&mut pos.ticks_left) {
            return;
        }
        if !advance_shared(project, pos) {
            log::info!(target: "scheduler", "nothing playable in shared playback");
            self.full_stop();
            return;
        }
        load_shared_ticks(project, pos);
        emit_row(project, &**sink, pos.track, pos.phrase, pos.row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{SharedTestSink, TestSink};
    use phrasetrack_types::{ChainId, PhraseId, Project, SharedPosition};
    use std::sync::Arc;

    fn sequencer(project: Project) -> (Sequencer, Arc<TestSink>) {
        let sink = Arc::new(TestSink::new());
        let seq = Sequencer::new(project, Box::new(SharedTestSink(sink.clone())));
        (seq, sink)
    }

    /// Chain `c` at `(track, song_row)` with one phrase `p` whose rows have the given DTs.
    fn cell(project: &mut Project, track: usize, song_row: usize, c: u8, p: u8, rows: &[(usize, u8)]) {
        project.song.set_cell(track, song_row, Some(ChainId::new(c)));
        project
            .chains_for_mut(track)
            .unwrap()
            .set_slot(ChainId::new(c), 0, Some(PhraseId::new(p)));
        let phrases = project.phrases_for_mut(track).unwrap();
        for &(row, dt) in rows {
            phrases.set_delta_time(PhraseId::new(p), row, Some(dt));
        }
    }

    #[test]
    fn test_stopped_sequencer_does_not_tick() {
        let (mut seq, sink) = sequencer(Project::new());
        seq.tick();
        assert_eq!(seq.state.tick_count, 0);
        assert!(sink.operations().is_empty());
    }

    #[test]
    fn test_row_held_for_its_delta_time() {
        let mut project = Project::new();
        cell(&mut project, 0, 0, 0, 0, &[(0, 3), (1, 1)]);
        let (mut seq, sink) = sequencer(project);
        seq.start(0, 0);
        assert_eq!(sink.emitted_for(0), vec![(0, 0)]);

        seq.tick();
        seq.tick();
        assert_eq!(sink.emitted_for(0).len(), 1);
        seq.tick();
        assert_eq!(sink.emitted_for(0), vec![(0, 0), (0, 1)]);
        assert_eq!(seq.state.transport(0).unwrap().ticks_left, 1);
    }

    #[test]
    fn test_exhausted_track_stops_playback() {
        let mut project = Project::new();
        cell(&mut project, 0, 0, 0, 0, &[(0, 1)]);
        let (mut seq, sink) = sequencer(project);
        seq.start(0, 0);
        // Remove the only playable row while it plays
        seq.edit_project(|p| {
            p.phrases_for_mut(0)
                .unwrap()
                .set_delta_time(PhraseId::new(0), 0, None)
        });
        seq.tick();
        assert!(!seq.is_playing());
        assert!(!seq.state.is_track_active(0));
        assert_eq!(sink.stops(), 1);
    }

    #[test]
    fn test_queued_stop_waits_for_cell_boundary() {
        let mut project = Project::new();
        cell(&mut project, 0, 0, 0, 0, &[(0, 1), (1, 1)]);
        cell(&mut project, 1, 0, 1, 1, &[(0, 1), (1, 1), (2, 1)]);
        let (mut seq, _) = sequencer(project);
        seq.start(0, 0);
        seq.start(1, 0);
        // Track 1 was queued, released at track 0's first boundary
        assert_eq!(seq.state.transport(1).unwrap().queued, QueuedAction::Start { row: 0 });

        seq.tick(); // track 0 row 1
        seq.tick(); // track 0 loops: boundary, track 1 starts
        assert!(seq.state.is_track_active(1));

        seq.stop(0);
        assert_eq!(seq.state.transport(0).unwrap().queued, QueuedAction::Stop);
        seq.tick(); // track 0 row 1
        assert!(seq.state.is_track_active(0));
        seq.tick(); // track 0 loops: queued stop fires
        assert!(!seq.state.is_track_active(0));
        assert!(seq.state.is_track_active(1));
        assert!(seq.is_playing());
    }

    #[test]
    fn test_chain_playback_loops() {
        let mut project = Project::new();
        let chains = project.chains_for_mut(0).unwrap();
        chains.set_slot(ChainId::new(5), 0, Some(PhraseId::new(1)));
        chains.set_slot(ChainId::new(5), 2, Some(PhraseId::new(2)));
        let phrases = project.phrases_for_mut(0).unwrap();
        phrases.set_delta_time(PhraseId::new(1), 0, Some(1));
        phrases.set_delta_time(PhraseId::new(2), 3, Some(1));
        let (mut seq, sink) = sequencer(project);
        seq.state.playback = Playback::Chain(SharedPosition {
            track: 0,
            chain: Some(ChainId::new(5)),
            chain_row: 0,
            phrase: PhraseId::new(1),
            row: 0,
            ticks_left: 1,
        });
        seq.state.is_playing = true;

        seq.tick();
        seq.tick();
        assert_eq!(sink.emitted_for(0), vec![(2, 3), (1, 0)]);
        assert!(seq.is_playing());
    }

    #[test]
    fn test_shared_playback_stops_when_nothing_playable() {
        let (mut seq, sink) = sequencer(Project::new());
        seq.state.playback = Playback::Phrase(SharedPosition {
            track: 0,
            chain: None,
            chain_row: 0,
            phrase: PhraseId::new(0),
            row: 0,
            ticks_left: 1,
        });
        seq.state.is_playing = true;
        seq.tick();
        assert!(!seq.is_playing());
        assert_eq!(sink.stops(), 1);
    }
}
