//! The sequencer thread: single writer of project and playback state.
//!
//! Waits on the command channel until the next absolute tick deadline,
//! handles whatever commands arrived, ticks when due and publishes the
//! resulting state. With playback stopped it blocks on commands alone.

use std::sync::mpsc::Sender;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use phrasetrack_types::PlaybackState;

use crate::commands::{diff_feedback, SequencerCmd, SequencerFeedback};
use crate::sequencer::Sequencer;
use crate::timing::TickClock;

pub(crate) struct SequencerThread {
    sequencer: Sequencer,
    cmd_rx: Receiver<SequencerCmd>,
    feedback_tx: Sender<SequencerFeedback>,
    shared: Arc<RwLock<PlaybackState>>,
    clock: Option<TickClock>,
    published: PlaybackState,
}

impl SequencerThread {
    pub(crate) fn new(
        sequencer: Sequencer,
        cmd_rx: Receiver<SequencerCmd>,
        feedback_tx: Sender<SequencerFeedback>,
        shared: Arc<RwLock<PlaybackState>>,
    ) -> Self {
        let published = sequencer.state().clone();
        Self {
            sequencer,
            cmd_rx,
            feedback_tx,
            shared,
            clock: None,
            published,
        }
    }

    pub(crate) fn run(mut self) {
        loop {
            let received = match self.clock {
                Some(clock) => {
                    let remaining = clock.next_deadline().saturating_duration_since(Instant::now());
                    crossbeam_channel::select! {
                        recv(self.cmd_rx) -> result => Some(result),
                        default(remaining) => None,
                    }
                }
                None => Some(self.cmd_rx.recv()),
            };

            if let Some(result) = received {
                match result {
                    Ok(cmd) => {
                        if self.handle_cmd(cmd) {
                            break;
                        }
                    }
                    Err(_) => break, // Disconnected
                }
                if self.drain_commands() {
                    break;
                }
            }

            self.sync_clock();
            self.tick_if_due();
            self.publish();
        }

        if self.sequencer.is_playing() {
            self.sequencer.stop_all();
            self.publish();
        }
        log::debug!(target: "sequencer", "sequencer thread exiting");
    }

    /// Handle queued commands without waiting. Returns `true` on shutdown.
    fn drain_commands(&mut self) -> bool {
        const MAX_COUNT: usize = 256;
        for _ in 0..MAX_COUNT {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_cmd(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    fn handle_cmd(&mut self, cmd: SequencerCmd) -> bool {
        log::trace!(target: "sequencer", "command {:?}", cmd);
        match cmd {
            SequencerCmd::Transport(action) => self.sequencer.apply(&action),
            SequencerCmd::SetProject(project) => self.sequencer.set_project(*project),
            SequencerCmd::Edit(edit) => self.sequencer.edit_project(edit),
            SequencerCmd::SetTempo(tempo) => self.sequencer.set_tempo(tempo),
            SequencerCmd::Restore(state) => self.sequencer.restore(*state),
            SequencerCmd::Snapshot { reply } => {
                let _ = reply.send((self.sequencer.project().clone(), self.sequencer.state().clone()));
            }
            SequencerCmd::Shutdown => return true,
        }
        false
    }

    /// Re-anchor the clock on (re)start; drop it when stopped.
    fn sync_clock(&mut self) {
        if self.sequencer.take_rearm() {
            self.clock = Some(TickClock::start(Instant::now(), self.sequencer.tick_duration_us()));
        }
        if !self.sequencer.is_playing() {
            self.clock = None;
        }
    }

    fn tick_if_due(&mut self) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        let now = Instant::now();
        let deadline = clock.next_deadline();
        if now < deadline {
            return;
        }
        let late = now - deadline;
        if late > Duration::from_millis(5) {
            log::debug!(target: "scheduler", "tick late by {:?}", late);
        }

        self.sequencer.tick();
        if self.sequencer.is_playing() {
            clock.advance(self.sequencer.tick_duration_us());
        } else {
            self.clock = None;
        }
    }

    fn publish(&mut self) {
        let state = self.sequencer.state();
        if *state == self.published {
            return;
        }
        for event in diff_feedback(&self.published, state) {
            let _ = self.feedback_tx.send(event);
        }
        match self.shared.write() {
            Ok(mut guard) => *guard = state.clone(),
            Err(poisoned) => *poisoned.into_inner() = state.clone(),
        }
        self.published = state.clone();
    }
}
