//! LocalDispatcher: Dispatcher implementation for in-process playback.

use phrasetrack_audio::SequencerHandle;
use phrasetrack_types::{Dispatcher, TransportAction};

/// Routes transport actions to the sequencer thread owned by `handle`.
pub struct LocalDispatcher<'a> {
    pub handle: &'a SequencerHandle,
}

impl<'a> LocalDispatcher<'a> {
    pub fn new(handle: &'a SequencerHandle) -> Self {
        Self { handle }
    }
}

impl<'a> Dispatcher for LocalDispatcher<'a> {
    fn dispatch(&mut self, action: &TransportAction) {
        log::debug!(target: "sequencer", "dispatch {:?}", action);
        self.handle.dispatch(action.clone());
    }
}
