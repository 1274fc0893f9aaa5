//! Transport control: start, stop, jump, cancel and context toggles.
//!
//! Requests that cannot be honoured (bad indices, empty cells, chains with
//! nothing playable) are logged and ignored.

use phrasetrack_types::{
    ChainId, Playback, PhraseId, QueuedAction, SharedPosition, TransportAction, ViewCursor,
    NUM_TRACKS, SONG_ROWS,
};

use crate::emitter::emit_row;
use crate::resolver::{cell_start, first_playable_row, first_playable_slot, playable_row_from};
use crate::sequencer::Sequencer;
use crate::transport::{activate_at, load_shared_ticks};

impl Sequencer {
    pub fn apply(&mut self, action: &TransportAction) {
        match action {
            TransportAction::Start { track, song_row } => self.start(*track, *song_row),
            TransportAction::Stop { track } => self.stop(*track),
            TransportAction::Jump { track, song_row } => self.jump(*track, *song_row),
            TransportAction::Cancel { track } => self.cancel(*track),
            TransportAction::Toggle { cursor, from_top } => self.toggle(*cursor, *from_top),
            TransportAction::PlayAllFromRow { song_row } => self.play_all_from_row(*song_row),
            TransportAction::StopAll => self.stop_all(),
            TransportAction::SetRecording(active) => self.set_recording(*active),
            TransportAction::SetPlayingFile(file) => self.set_playing_file(file.clone()),
        }
    }

    /// Start a song track at `song_row`. Queued while other tracks play.
    pub fn start(&mut self, track: usize, song_row: usize) {
        if track >= NUM_TRACKS || song_row >= SONG_ROWS {
            log::warn!(target: "sequencer", "start ignored: track {} row {} out of range", track, song_row);
            return;
        }
        self.leave_shared_playback();

        let Some(cell) = cell_start(&self.project, track, song_row) else {
            log::info!(target: "sequencer", "nothing to play for track {} at row {:02X}", track, song_row);
            return;
        };
        if self.state.is_track_active(track) {
            log::debug!(target: "sequencer", "track {} already playing", track);
            return;
        }
        if self.state.others_active(track) {
            if let Some(t) = self.state.transport_mut(track) {
                t.queued = QueuedAction::Start { row: song_row };
            }
            log::info!(target: "sequencer", "track {} queued to start at row {:02X}", track, song_row);
            return;
        }

        let Sequencer {
            project,
            state,
            sink,
            rearm,
        } = &mut *self;
        state.ensure_song();
        let Some(t) = state.transport_mut(track) else {
            return;
        };
        activate_at(project, track, t, song_row, cell);
        emit_row(project, &**sink, track, t.phrase, t.row);
        state.is_playing = true;
        state.tick_count = 0;
        *rearm = true;
        log::info!(
            target: "sequencer",
            "track {} started at row {:02X}, chain {}, phrase {}",
            track, song_row, cell.chain, cell.slot.phrase
        );
    }

    /// Stop a song track: immediately when it is the only one playing,
    /// otherwise at its next cell boundary.
    pub fn stop(&mut self, track: usize) {
        if !self.state.is_track_active(track) {
            log::debug!(target: "sequencer", "stop ignored: track {} not playing", track);
            return;
        }
        if self.state.others_active(track) {
            if let Some(t) = self.state.transport_mut(track) {
                t.queued = QueuedAction::Stop;
            }
            log::info!(target: "sequencer", "track {} queued to stop", track);
            return;
        }
        if let Some(t) = self.state.transport_mut(track) {
            t.deactivate();
        }
        self.full_stop();
    }

    /// Queue a playing track to move to `song_row` when its current cell ends.
    pub fn jump(&mut self, track: usize, song_row: usize) {
        let Some(playing_row) = self
            .state
            .transport(track)
            .filter(|t| t.active)
            .map(|t| t.song_row)
        else {
            log::debug!(target: "sequencer", "jump ignored: track {} not playing", track);
            return;
        };
        if song_row >= SONG_ROWS || song_row == playing_row {
            log::debug!(target: "sequencer", "jump ignored: track {} target row {}", track, song_row);
            return;
        }
        if cell_start(&self.project, track, song_row).is_none() {
            log::info!(target: "sequencer", "cannot jump track {}: nothing to play at row {:02X}", track, song_row);
            return;
        }
        if let Some(t) = self.state.transport_mut(track) {
            t.queued = QueuedAction::Jump { row: song_row };
        }
        log::info!(
            target: "sequencer",
            "track {} queued to jump from row {:02X} to {:02X}",
            track, playing_row, song_row
        );
    }

    /// Drop a queued start, stop or jump.
    pub fn cancel(&mut self, track: usize) {
        if let Some(t) = self.state.transport_mut(track) {
            if !t.queued.is_none() {
                log::info!(target: "sequencer", "track {} cancelled {:?}", track, t.queued);
                t.queued = QueuedAction::None;
            }
        }
    }

    /// Start, stop or jump depending on where the cursor is.
    pub fn toggle(&mut self, cursor: ViewCursor, from_top: bool) {
        match cursor {
            ViewCursor::Song { .. } if from_top => self.play_all_from_row(0),
            ViewCursor::Song { track, row } => {
                self.leave_shared_playback();
                let playing_row = self
                    .state
                    .transport(track)
                    .filter(|t| t.active)
                    .map(|t| t.song_row);
                match playing_row {
                    Some(playing) if playing != row => self.jump(track, row),
                    Some(_) => self.stop(track),
                    None => self.start(track, row),
                }
            }
            ViewCursor::Chain { track, chain, slot } => self.toggle_chain(track, chain, slot, from_top),
            ViewCursor::Phrase { track, phrase, row } => self.toggle_phrase(track, phrase, row, from_top),
        }
    }

    fn toggle_chain(&mut self, track: usize, chain: ChainId, slot: usize, from_top: bool) {
        if self.state.is_playing {
            let same = matches!(
                &self.state.playback,
                Playback::Chain(pos) if pos.track == track && pos.chain == Some(chain)
            );
            self.full_stop();
            if same {
                return;
            }
        }
        let from = if from_top { 0 } else { slot };
        let start = first_playable_slot(&self.project, track, chain, from)
            .or_else(|| first_playable_slot(&self.project, track, chain, 0));
        let Some(start) = start else {
            log::info!(target: "sequencer", "chain {} has nothing to play on track {}", chain, track);
            return;
        };
        self.begin_shared(Playback::Chain(SharedPosition {
            track,
            chain: Some(chain),
            chain_row: start.chain_row,
            phrase: start.phrase,
            row: start.row,
            ticks_left: 0,
        }));
    }

    fn toggle_phrase(&mut self, track: usize, phrase: PhraseId, row: usize, from_top: bool) {
        if self.state.is_playing {
            let same = matches!(
                &self.state.playback,
                Playback::Phrase(pos) if pos.track == track && pos.phrase == phrase
            );
            self.full_stop();
            if same {
                return;
            }
        }
        let start = if from_top {
            first_playable_row(&self.project, phrase, track)
        } else {
            playable_row_from(&self.project, phrase, track, row)
                .or_else(|| first_playable_row(&self.project, phrase, track))
        };
        let Some(start) = start else {
            log::info!(target: "sequencer", "phrase {} has nothing to play on track {}", phrase, track);
            return;
        };
        self.begin_shared(Playback::Phrase(SharedPosition {
            track,
            chain: None,
            chain_row: 0,
            phrase,
            row: start,
            ticks_left: 0,
        }));
    }

    fn begin_shared(&mut self, mut playback: Playback) {
        let mode = playback.mode();
        let Sequencer {
            project,
            state,
            sink,
            rearm,
        } = &mut *self;
        if let Playback::Chain(pos) | Playback::Phrase(pos) = &mut playback {
            load_shared_ticks(project, pos);
            emit_row(project, &**sink, pos.track, pos.phrase, pos.row);
            log::info!(
                target: "sequencer",
                "{:?} playback started: track {}, phrase {}, row {:02X}",
                mode, pos.track, pos.phrase, pos.row
            );
        }
        state.playback = playback;
        state.is_playing = true;
        state.tick_count = 0;
        *rearm = true;
    }

    /// Play every track from `song_row` at once, or stop if Song playback is running.
    pub fn play_all_from_row(&mut self, song_row: usize) {
        if song_row >= SONG_ROWS {
            log::warn!(target: "sequencer", "play all ignored: row {} out of range", song_row);
            return;
        }
        if self.state.is_playing {
            let was_song = matches!(self.state.playback, Playback::Song { .. });
            self.full_stop();
            if was_song {
                return;
            }
        }

        let Sequencer {
            project,
            state,
            sink,
            rearm,
        } = &mut *self;
        state.ensure_song();
        let Some(transports) = state.transports_mut() else {
            return;
        };
        let mut started = 0;
        for (track, t) in transports.iter_mut().enumerate() {
            if let Some(cell) = cell_start(project, track, song_row) {
                activate_at(project, track, t, song_row, cell);
                emit_row(project, &**sink, track, t.phrase, t.row);
                started += 1;
            }
        }
        if started == 0 {
            log::info!(target: "sequencer", "nothing to play at song row {:02X}", song_row);
            return;
        }
        state.is_playing = true;
        state.tick_count = 0;
        *rearm = true;
        log::info!(target: "sequencer", "{} tracks started at song row {:02X}", started, song_row);
    }

    /// Stop everything immediately, whatever is playing.
    pub fn stop_all(&mut self) {
        self.full_stop();
    }

    pub fn set_recording(&mut self, active: bool) {
        self.state.recording_active = active;
    }

    /// Track the file the engine is previewing. A full stop ends the preview.
    pub fn set_playing_file(&mut self, file: Option<String>) {
        if let Some(old) = self.state.playing_file.take() {
            if file.as_deref() != Some(old.as_str()) {
                if let Err(e) = self.sink.send_file_state(&old, false) {
                    log::warn!(target: "osc", "file stop failed: {}", e);
                }
            }
        }
        if let Some(new) = &file {
            if let Err(e) = self.sink.send_file_state(new, true) {
                log::warn!(target: "osc", "file start failed: {}", e);
            }
        }
        self.state.playing_file = file;
    }

    /// Chain or Phrase playback must be fully stopped before Song playback starts.
    fn leave_shared_playback(&mut self) {
        if self.state.is_playing && !matches!(self.state.playback, Playback::Song { .. }) {
            log::info!(target: "sequencer", "stopping {:?} playback to switch context", self.state.mode());
            self.full_stop();
        }
    }
}
