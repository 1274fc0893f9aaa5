//! # phrasetrack-audio
//!
//! The real-time sequencer: tick timing, sequence resolution, per-track
//! transports, the playback scheduler and transport control, plus the
//! trigger sinks that carry emitted rows to the synthesis engine.

pub mod commands;
mod control;
pub mod emitter;
pub mod handle;
pub mod osc_sender;
pub mod resolver;
mod scheduler;
pub mod sequencer;
mod sequencer_thread;
pub mod sink;
pub mod timing;
pub mod transport;

pub use commands::{SequencerCmd, SequencerFeedback};
pub use emitter::RowTrigger;
pub use handle::SequencerHandle;
pub use sequencer::Sequencer;
pub use sink::{NullSink, OscSink, SharedTestSink, SinkError, SinkOp, SinkResult, TestSink, TriggerSink};
