//! The sequencer: sole owner of the project and playback state.
//!
//! Transport control lives in `control.rs` and per-tick advancement in
//! `scheduler.rs`; both are `impl Sequencer` blocks over the state held here.

use phrasetrack_types::{
    Playback, PlaybackState, Project, QueuedAction, Tempo, TrackTransport, CHAIN_SLOTS,
    NUM_TRACKS, PHRASE_ROWS, SONG_ROWS,
};

use crate::sink::TriggerSink;
use crate::timing;
use crate::transport;

pub struct Sequencer {
    pub(crate) project: Project,
    pub(crate) state: PlaybackState,
    pub(crate) sink: Box<dyn TriggerSink>,
    /// Playback (re)started; the tick clock must be re-anchored.
    pub(crate) rearm: bool,
}

impl Sequencer {
    pub fn new(project: Project, sink: Box<dyn TriggerSink>) -> Self {
        Self {
            project,
            state: PlaybackState::new(),
            sink,
            rearm: false,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Replace the project. Playback continues from the current positions.
    pub fn set_project(&mut self, mut project: Project) {
        project.normalize();
        self.project = project;
    }

    /// Edit the project in place while playing.
    pub fn edit_project(&mut self, edit: impl FnOnce(&mut Project)) {
        edit(&mut self.project);
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        log::debug!(target: "sequencer", "tempo {} bpm, ppq {}", tempo.bpm, tempo.ppq);
        self.project.tempo = tempo;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Take the restart request raised by a control operation.
    pub fn take_rearm(&mut self) -> bool {
        std::mem::take(&mut self.rearm)
    }

    /// Install a saved playback snapshot, dropping positions that no longer
    /// point at valid indices. Current playback is fully stopped first.
    pub fn restore(&mut self, mut state: PlaybackState) {
        if self.state.is_playing {
            self.full_stop();
        }
        match &mut state.playback {
            Playback::Song { transports } => {
                for (track, t) in transports.iter_mut().enumerate() {
                    sanitize_transport(track, t);
                }
                state.is_playing = transports.iter().any(|t| t.active);
            }
            Playback::Chain(pos) | Playback::Phrase(pos) => {
                let valid = pos.track < NUM_TRACKS
                    && pos.phrase.is_valid()
                    && pos.row < PHRASE_ROWS
                    && pos.chain_row < CHAIN_SLOTS
                    && pos.chain.map_or(true, |c| c.is_valid());
                if !valid {
                    log::warn!(target: "sequencer", "discarding invalid shared position on restore");
                    state.playback = Playback::default();
                    state.is_playing = false;
                }
            }
        }
        self.rearm = state.is_playing;
        self.state = state;
    }

    /// Duration of the next tick, honouring a `Ppq` override on the row being played.
    pub fn tick_duration_us(&self) -> f64 {
        let ppq = self.context_ppq().unwrap_or(self.project.tempo.ppq);
        timing::tick_duration_us(self.project.tempo.bpm, ppq)
    }

    /// Ppq override of the lead context: the first active track in Song
    /// playback, the shared position otherwise.
    fn context_ppq(&self) -> Option<u16> {
        let row = match &self.state.playback {
            Playback::Song { transports } => transports
                .iter()
                .enumerate()
                .find(|(_, t)| t.active)
                .and_then(|(track, t)| transport::current_row(&self.project, track, t)),
            Playback::Chain(pos) | Playback::Phrase(pos) => transport::shared_row(&self.project, pos),
        }?;
        row.ppq.filter(|ppq| *ppq > 0)
    }

    /// Stop everything: end recording, clear the previewed file, silence the
    /// engine and reset every transport.
    pub(crate) fn full_stop(&mut self) {
        self.state.is_playing = false;
        self.state.playback = Playback::default();

        if self.state.recording_active {
            self.state.recording_active = false;
            if let Err(e) = self.sink.stop_recording() {
                log::warn!(target: "osc", "stop recording failed: {}", e);
            }
        }
        if let Some(file) = self.state.playing_file.take() {
            if let Err(e) = self.sink.send_file_state(&file, false) {
                log::warn!(target: "osc", "file stop failed: {}", e);
            }
        }
        if let Err(e) = self.sink.send_stop() {
            log::warn!(target: "osc", "stop failed: {}", e);
        }
        log::info!(target: "sequencer", "playback stopped");
    }
}

fn sanitize_transport(track: usize, t: &mut TrackTransport) {
    if t.active {
        let valid = t.song_row < SONG_ROWS
            && t.chain.is_valid()
            && t.chain_row < CHAIN_SLOTS
            && t.phrase.is_valid()
            && t.row < PHRASE_ROWS;
        if !valid {
            log::warn!(target: "sequencer", "track {} restored with invalid position, deactivating", track);
            t.deactivate();
        }
    }
    if t.queued.row().is_some_and(|row| row >= SONG_ROWS) {
        t.queued = QueuedAction::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{SharedTestSink, SinkOp, TestSink};
    use phrasetrack_types::{ChainId, PhraseId, SharedPosition};
    use std::sync::Arc;

    fn sequencer() -> (Sequencer, Arc<TestSink>) {
        let sink = Arc::new(TestSink::new());
        let seq = Sequencer::new(Project::new(), Box::new(SharedTestSink(sink.clone())));
        (seq, sink)
    }

    #[test]
    fn test_full_stop_ends_recording_and_file() {
        let (mut seq, sink) = sequencer();
        seq.state.is_playing = true;
        seq.state.recording_active = true;
        seq.state.playing_file = Some("take.wav".into());
        seq.full_stop();

        assert!(!seq.state.is_playing);
        assert!(!seq.state.recording_active);
        assert_eq!(seq.state.playing_file, None);
        assert_eq!(
            sink.operations(),
            vec![
                SinkOp::StopRecording,
                SinkOp::FileState { file: "take.wav".into(), playing: false },
                SinkOp::Stop,
            ]
        );
    }

    #[test]
    fn test_tick_duration_uses_row_ppq() {
        let (mut seq, _) = sequencer();
        seq.set_tempo(Tempo { bpm: 120.0, ppq: 4 });
        assert_eq!(seq.tick_duration_us(), 125_000.0);

        seq.project
            .phrases_for_mut(0)
            .unwrap()
            .row_mut(PhraseId::new(0), 0)
            .unwrap()
            .ppq = Some(2);
        seq.state.transport_mut(0).unwrap().active = true;
        assert_eq!(seq.tick_duration_us(), 250_000.0);
    }

    #[test]
    fn test_restore_drops_invalid_positions() {
        let (mut seq, _) = sequencer();
        let mut state = PlaybackState::new();
        {
            let ts = state.transports_mut().unwrap();
            ts[0] = TrackTransport {
                active: true,
                song_row: 3,
                chain: ChainId::new(1),
                ..Default::default()
            };
            ts[1] = TrackTransport {
                active: true,
                song_row: 40,
                ..Default::default()
            };
            ts[2].queued = QueuedAction::Start { row: 99 };
        }
        state.is_playing = true;
        seq.restore(state);

        assert!(seq.state.is_track_active(0));
        assert!(!seq.state.is_track_active(1));
        assert!(seq.state.transport(2).unwrap().queued.is_none());
        assert!(seq.take_rearm());
        assert!(!seq.take_rearm());
    }

    #[test]
    fn test_restore_stops_running_playback() {
        let mut project = Project::new();
        project.song.set_cell(0, 0, Some(ChainId::new(0)));
        project
            .chains_for_mut(0)
            .unwrap()
            .set_slot(ChainId::new(0), 0, Some(PhraseId::new(0)));
        project
            .phrases_for_mut(0)
            .unwrap()
            .set_delta_time(PhraseId::new(0), 0, Some(1));
        let sink = Arc::new(TestSink::new());
        let mut seq = Sequencer::new(project, Box::new(SharedTestSink(sink.clone())));
        seq.start(0, 0);
        seq.set_recording(true);
        seq.set_playing_file(Some("take.wav".into()));

        seq.restore(PlaybackState::new());
        assert!(!seq.is_playing());
        assert!(!seq.take_rearm());
        assert_eq!(sink.stops(), 1);
        assert_eq!(sink.count(|op| matches!(op, SinkOp::StopRecording)), 1);
        assert_eq!(
            sink.count(|op| matches!(op, SinkOp::FileState { playing: false, .. })),
            1
        );
    }

    #[test]
    fn test_restore_while_stopped_sends_nothing() {
        let (mut seq, sink) = sequencer();
        seq.restore(PlaybackState::new());
        assert!(sink.operations().is_empty());
    }

    #[test]
    fn test_restore_rejects_bad_shared_position() {
        let (mut seq, _) = sequencer();
        let state = PlaybackState {
            playback: Playback::Phrase(SharedPosition {
                track: 12,
                chain: None,
                chain_row: 0,
                phrase: PhraseId::new(0),
                row: 0,
                ticks_left: 1,
            }),
            is_playing: true,
            ..Default::default()
        };
        seq.restore(state);
        assert!(!seq.is_playing());
        assert!(seq.state.shared_position().is_none());
    }
}
