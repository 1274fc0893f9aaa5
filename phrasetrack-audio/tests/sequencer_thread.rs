//! Drives the sequencer thread through its handle with a recording sink.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use phrasetrack_audio::{SequencerFeedback, SequencerHandle, SharedTestSink, TestSink};
use phrasetrack_types::{
    ChainId, PhraseId, PlaybackMode, Project, Tempo, TransportAction, ViewCursor,
};

/// 600 bpm at 4 ppq: 25ms ticks.
fn fast_project() -> Project {
    let mut project = Project::new();
    project.tempo = Tempo { bpm: 600.0, ppq: 4 };
    project.song.set_cell(0, 0, Some(ChainId::new(0)));
    project
        .chains_for_mut(0)
        .unwrap()
        .set_slot(ChainId::new(0), 0, Some(PhraseId::new(0)));
    let phrases = project.phrases_for_mut(0).unwrap();
    for row in 0..4 {
        phrases.set_delta_time(PhraseId::new(0), row, Some(1));
    }
    project
}

fn spawn(project: Project) -> (SequencerHandle, Arc<TestSink>) {
    let sink = Arc::new(TestSink::new());
    let handle = SequencerHandle::new(project, Box::new(SharedTestSink(sink.clone()))).unwrap();
    (handle, sink)
}

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

#[test]
fn plays_rows_in_order_and_loops() {
    let (handle, sink) = spawn(fast_project());
    handle.dispatch(TransportAction::Start { track: 0, song_row: 0 });

    assert!(wait_until(|| sink.emitted_for(0).len() >= 6));
    let rows: Vec<usize> = sink.emitted_for(0).iter().map(|(_, row)| *row).take(6).collect();
    assert_eq!(rows, vec![0, 1, 2, 3, 0, 1]);
    assert!(handle.is_playing());
}

#[test]
fn toggle_stops_and_reports_feedback() {
    let (handle, sink) = spawn(fast_project());
    let cursor = ViewCursor::Song { track: 0, row: 0 };
    handle.dispatch(TransportAction::Toggle { cursor, from_top: false });
    assert!(wait_until(|| handle.is_playing()));

    handle.dispatch(TransportAction::Toggle { cursor, from_top: false });
    assert!(wait_until(|| !handle.is_playing()));
    assert!(wait_until(|| sink.stops() == 1));

    let feedback = handle.drain_feedback();
    assert_eq!(
        feedback.first(),
        Some(&SequencerFeedback::PlaybackStarted(PlaybackMode::Song))
    );
    assert!(feedback.contains(&SequencerFeedback::TrackStarted { track: 0, song_row: 0 }));
    assert_eq!(feedback.last(), Some(&SequencerFeedback::PlaybackStopped));

    // No ticks run once stopped
    let emitted = sink.emitted().len();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(sink.emitted().len(), emitted);
}

#[test]
fn live_edits_are_picked_up() {
    let (handle, sink) = spawn(fast_project());
    handle.dispatch(TransportAction::Start { track: 0, song_row: 0 });
    handle.edit(|project| {
        let phrases = project.phrases_for_mut(0).unwrap();
        for row in 1..4 {
            phrases.set_delta_time(PhraseId::new(0), row, None);
        }
    });

    let (project, state) = handle.snapshot().unwrap();
    assert!(project.row(0, PhraseId::new(0), 0).unwrap().is_playable());
    assert!(!project.row(0, PhraseId::new(0), 1).unwrap().is_playable());
    assert!(state.is_playing);

    assert!(wait_until(|| sink.emitted_for(0).len() >= 4));
    assert!(sink.emitted_for(0).iter().skip(1).all(|(_, row)| *row == 0));
}

#[test]
fn restore_resumes_playback() {
    let (first, _) = spawn(fast_project());
    first.dispatch(TransportAction::Start { track: 0, song_row: 0 });
    assert!(wait_until(|| first.is_playing()));
    let (project, state) = first.snapshot().unwrap();
    drop(first);

    let (second, sink) = spawn(project);
    second.restore(state);
    assert!(wait_until(|| sink.emitted_for(0).len() >= 2));
    assert!(second.is_playing());
}

#[test]
fn shutdown_stops_playback() {
    let (mut handle, sink) = spawn(fast_project());
    handle.dispatch(TransportAction::Start { track: 0, song_row: 0 });
    assert!(wait_until(|| handle.is_playing()));
    handle.shutdown();
    assert_eq!(sink.stops(), 1);
}
