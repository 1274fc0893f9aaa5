//! Main-thread handle to the sequencer thread.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use phrasetrack_types::{PlaybackState, Project, Tempo, TransportAction};

use crate::commands::{SequencerCmd, SequencerFeedback};
use crate::sequencer::Sequencer;
use crate::sequencer_thread::SequencerThread;
use crate::sink::TriggerSink;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns the sequencer thread. Commands go over a crossbeam channel;
/// playback state is mirrored read-only for rendering.
pub struct SequencerHandle {
    cmd_tx: Sender<SequencerCmd>,
    feedback_rx: mpsc::Receiver<SequencerFeedback>,
    state: Arc<RwLock<PlaybackState>>,
    thread: Option<JoinHandle<()>>,
}

impl SequencerHandle {
    pub fn new(project: Project, sink: Box<dyn TriggerSink>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (feedback_tx, feedback_rx) = mpsc::channel();
        let state = Arc::new(RwLock::new(PlaybackState::new()));

        let mut project = project;
        project.normalize();
        let worker = SequencerThread::new(
            Sequencer::new(project, sink),
            cmd_rx,
            feedback_tx,
            Arc::clone(&state),
        );
        let thread = std::thread::Builder::new()
            .name("sequencer".into())
            .spawn(move || worker.run())?;

        Ok(Self {
            cmd_tx,
            feedback_rx,
            state,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: SequencerCmd) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!(target: "sequencer", "sequencer thread is not running");
        }
    }

    pub fn dispatch(&self, action: TransportAction) {
        self.send(SequencerCmd::Transport(action));
    }

    pub fn set_project(&self, project: Project) {
        self.send(SequencerCmd::SetProject(Box::new(project)));
    }

    /// Edit the project on the sequencer thread; playback picks the change up
    /// on its next advancement.
    pub fn edit(&self, edit: impl FnOnce(&mut Project) + Send + 'static) {
        self.send(SequencerCmd::Edit(Box::new(edit)));
    }

    pub fn set_tempo(&self, tempo: Tempo) {
        self.send(SequencerCmd::SetTempo(tempo));
    }

    pub fn restore(&self, state: PlaybackState) {
        self.send(SequencerCmd::Restore(Box::new(state)));
    }

    /// Consistent copy of the project and playback state, taken on the sequencer thread.
    pub fn snapshot(&self) -> Option<(Project, PlaybackState)> {
        let (reply, rx) = crossbeam_channel::bounded(1);
        self.send(SequencerCmd::Snapshot { reply });
        rx.recv_timeout(SNAPSHOT_TIMEOUT).ok()
    }

    /// Last published playback state.
    pub fn playback_state(&self) -> PlaybackState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state().is_playing
    }

    pub fn drain_feedback(&self) -> Vec<SequencerFeedback> {
        self.feedback_rx.try_iter().collect()
    }

    /// Stop playback and wait for the thread to exit.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.send(SequencerCmd::Shutdown);
            if thread.join().is_err() {
                log::error!(target: "sequencer", "sequencer thread panicked");
            }
        }
    }
}

impl Drop for SequencerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
