//! Row emission: turning a phrase row into a trigger for the synthesis engine.

use phrasetrack_types::{PhraseId, Project, TrackKind};

use crate::sink::TriggerSink;

/// Everything the engine needs to sound one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTrigger {
    pub track: usize,
    pub kind: TrackKind,
    pub phrase: PhraseId,
    pub row: usize,
    pub delta_time: u8,
    pub note: Option<u8>,
    pub velocity: Option<u8>,
    pub gate: Option<u8>,
    pub retrigger: Option<u8>,
    /// Resolved sample path, sampler tracks only
    pub file: Option<String>,
}

/// Build the trigger for `row` of `phrase` read through `track`'s tables.
pub fn build_trigger(project: &Project, track: usize, phrase: PhraseId, row: usize) -> Option<RowTrigger> {
    let kind = project.track_kind(track)?;
    let data = project.row(track, phrase, row)?;
    let file = match kind {
        TrackKind::Sampler => data
            .file
            .and_then(|idx| project.files.get(idx as usize))
            .cloned(),
        TrackKind::Instrument => None,
    };
    Some(RowTrigger {
        track,
        kind,
        phrase,
        row,
        delta_time: data.delta_time.unwrap_or(0),
        note: data.note,
        velocity: data.velocity,
        gate: data.gate,
        retrigger: data.retrigger,
        file,
    })
}

/// Emit a row to the sink. Sink failures are logged and never interrupt playback.
pub fn emit_row(project: &Project, sink: &dyn TriggerSink, track: usize, phrase: PhraseId, row: usize) -> bool {
    let Some(trigger) = build_trigger(project, track, phrase, row) else {
        log::warn!(target: "sequencer", "cannot emit track {} phrase {} row {}: out of range", track, phrase, row);
        return false;
    };
    match sink.emit_row(&trigger) {
        Ok(()) => {
            log::trace!(target: "sequencer", "emitted track {} phrase {} row {:02X}", track, phrase, row);
            true
        }
        Err(e) => {
            log::warn!(target: "osc", "emit failed for track {}: {}", track, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{SinkOp, TestSink};
    use phrasetrack_types::{Column, NUM_TRACKS};

    fn project_with_row() -> Project {
        let mut project = Project::new();
        project.files = vec!["kick.wav".into(), "snare.wav".into()];
        project.track_kinds[1] = TrackKind::Instrument;
        for track in 0..2 {
            let row = project
                .phrases_for_mut(track)
                .unwrap()
                .row_mut(PhraseId::new(2), 5)
                .unwrap();
            row.set(Column::DeltaTime, Some(3));
            row.set(Column::Note, Some(60));
            row.set(Column::File, Some(1));
        }
        project
    }

    #[test]
    fn test_sampler_trigger_resolves_file() {
        let project = project_with_row();
        let trigger = build_trigger(&project, 0, PhraseId::new(2), 5).unwrap();
        assert_eq!(trigger.kind, TrackKind::Sampler);
        assert_eq!(trigger.delta_time, 3);
        assert_eq!(trigger.note, Some(60));
        assert_eq!(trigger.file.as_deref(), Some("snare.wav"));
        assert_eq!(trigger.velocity, None);
    }

    #[test]
    fn test_instrument_trigger_has_no_file() {
        let project = project_with_row();
        let trigger = build_trigger(&project, 1, PhraseId::new(2), 5).unwrap();
        assert_eq!(trigger.kind, TrackKind::Instrument);
        assert_eq!(trigger.file, None);
    }

    #[test]
    fn test_out_of_range_is_not_emitted() {
        let project = project_with_row();
        let sink = TestSink::new();
        assert!(!emit_row(&project, &sink, NUM_TRACKS, PhraseId::new(2), 5));
        assert!(!emit_row(&project, &sink, 0, PhraseId::new(2), 999));
        assert!(sink.operations().is_empty());
    }

    #[test]
    fn test_emit_continues_after_sink_failure() {
        let project = project_with_row();
        let sink = TestSink::new();
        sink.set_fail_emits(true);
        assert!(!emit_row(&project, &sink, 0, PhraseId::new(2), 5));
        sink.set_fail_emits(false);
        assert!(emit_row(&project, &sink, 0, PhraseId::new(2), 5));
        assert!(matches!(sink.operations().as_slice(), [SinkOp::EmitRow(t)] if t.row == 5));
    }
}
