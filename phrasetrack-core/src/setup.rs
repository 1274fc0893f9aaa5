//! Wiring config, engine connection, persistence and the sequencer thread together.

use std::io;
use std::path::Path;

use phrasetrack_audio::{NullSink, OscSink, SequencerHandle, TriggerSink};
use phrasetrack_types::Project;

use crate::config::Config;
use crate::persistence::{self, PersistError};

/// Engine connection per config. Falls back to a silent sink when the engine
/// is disabled or unreachable.
pub fn trigger_sink(config: &Config) -> Box<dyn TriggerSink> {
    if !config.engine_enabled() {
        log::info!(target: "osc", "engine disabled, running silently");
        return Box::new(NullSink);
    }
    match OscSink::connect(config.engine_host(), config.engine_port()) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            log::warn!(
                target: "osc",
                "cannot reach engine at {}:{}: {}",
                config.engine_host(),
                config.engine_port(),
                e
            );
            Box::new(NullSink)
        }
    }
}

/// Empty project using the configured default tempo.
pub fn new_project(config: &Config) -> Project {
    let mut project = Project::new();
    project.tempo = config.default_tempo();
    project
}

pub fn start_sequencer(config: &Config, project: Project) -> io::Result<SequencerHandle> {
    SequencerHandle::new(project, trigger_sink(config))
}

/// Load a saved project and resume its playback snapshot.
pub fn open_project(config: &Config, path: &Path) -> Result<SequencerHandle, PersistError> {
    let file = persistence::load_project(path)?;
    let handle = start_sequencer(config, file.project)?;
    handle.restore(file.playback);
    Ok(handle)
}

/// Save the sequencer's current project and playback state, when autosave is on.
pub fn autosave(config: &Config, handle: &SequencerHandle, path: &Path) -> Result<bool, PersistError> {
    if !config.autosave_enabled() {
        return Ok(false);
    }
    let Some((project, playback)) = handle.snapshot() else {
        log::warn!(target: "persistence", "autosave skipped: sequencer did not answer");
        return Ok(false);
    };
    persistence::save_project(path, &project, &playback)?;
    Ok(true)
}
