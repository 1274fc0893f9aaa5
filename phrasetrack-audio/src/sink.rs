//! Trigger sinks: where emitted rows and transport messages go.
//!
//! `TriggerSink` captures what the sequencer *means* to tell the synthesis
//! engine (play this row, stop, file preview on/off, end recording)
//! independently of how it is sent. `OscSink` talks to SuperCollider over
//! OSC; `TestSink` records calls for assertions; `NullSink` drops them.

use std::fmt;
use std::net::{ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use phrasetrack_types::TrackKind;
use rosc::{OscMessage, OscPacket, OscType};

use crate::emitter::RowTrigger;
use crate::osc_sender::{self, OscSendEntry, QueueResult};

/// Result type for sink operations.
pub type SinkResult<T = ()> = Result<T, SinkError>;

/// Error from a sink operation.
#[derive(Debug, Clone)]
pub struct SinkError(pub String);

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(e: std::io::Error) -> Self {
        SinkError(e.to_string())
    }
}

pub trait TriggerSink: Send {
    /// Sound one row.
    fn emit_row(&self, trigger: &RowTrigger) -> SinkResult;

    /// Silence the engine.
    fn send_stop(&self) -> SinkResult;

    /// Start or stop previewing a file.
    fn send_file_state(&self, file: &str, playing: bool) -> SinkResult;

    /// End a live recording.
    fn stop_recording(&self) -> SinkResult;
}

// ─── OSC Sink ───────────────────────────────────────────────────────

pub const ADDR_INSTRUMENT: &str = "/phrasetrack/instrument";
pub const ADDR_SAMPLER: &str = "/phrasetrack/sampler";
pub const ADDR_STOP: &str = "/phrasetrack/stop";
pub const ADDR_FILE: &str = "/phrasetrack/file";
pub const ADDR_RECORD: &str = "/phrasetrack/record";

/// Unset columns go over the wire as -1.
fn opt_int(value: Option<u8>) -> OscType {
    OscType::Int(value.map(i32::from).unwrap_or(-1))
}

/// OSC message for a row trigger.
///
/// Args: track, phrase, row, note, velocity, gate, retrig, and for sampler
/// tracks the file path (empty when unset).
pub fn row_message(trigger: &RowTrigger) -> OscMessage {
    let mut args = vec![
        OscType::Int(trigger.track as i32),
        OscType::Int(i32::from(trigger.phrase.get())),
        OscType::Int(trigger.row as i32),
        opt_int(trigger.note),
        opt_int(trigger.velocity),
        opt_int(trigger.gate),
        opt_int(trigger.retrigger),
    ];
    let addr = match trigger.kind {
        TrackKind::Instrument => ADDR_INSTRUMENT,
        TrackKind::Sampler => {
            args.push(OscType::String(trigger.file.clone().unwrap_or_default()));
            ADDR_SAMPLER
        }
    };
    OscMessage {
        addr: addr.to_string(),
        args,
    }
}

fn encode(msg: OscMessage) -> SinkResult<Vec<u8>> {
    rosc::encoder::encode(&OscPacket::Message(msg))
        .map_err(|e| SinkError(format!("OSC encode failed: {:?}", e)))
}

/// Sink that sends OSC to SuperCollider through the dedicated sender thread.
pub struct OscSink {
    tx: Sender<OscSendEntry>,
    _sender: JoinHandle<()>,
}

impl OscSink {
    /// Bind a local UDP socket and start the sender thread for `host:port`.
    pub fn connect(host: &str, port: u16) -> SinkResult<Self> {
        let server_addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| SinkError(format!("cannot resolve {}:{}", host, port)))?;
        let bind_addr = if server_addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind_addr)?;
        let (tx, sender) = osc_sender::spawn_osc_sender(socket, server_addr)?;
        log::info!(target: "osc", "sending to {}", server_addr);
        Ok(Self {
            tx,
            _sender: sender,
        })
    }

    fn send(&self, msg: OscMessage) -> SinkResult {
        let encoded = encode(msg)?;
        match osc_sender::try_queue(&self.tx, encoded) {
            QueueResult::Queued | QueueResult::Dropped => Ok(()),
            QueueResult::Disconnected => Err(SinkError("OSC sender thread has exited".into())),
        }
    }
}

impl TriggerSink for OscSink {
    fn emit_row(&self, trigger: &RowTrigger) -> SinkResult {
        self.send(row_message(trigger))
    }

    fn send_stop(&self) -> SinkResult {
        self.send(OscMessage {
            addr: ADDR_STOP.to_string(),
            args: Vec::new(),
        })
    }

    fn send_file_state(&self, file: &str, playing: bool) -> SinkResult {
        self.send(OscMessage {
            addr: ADDR_FILE.to_string(),
            args: vec![
                OscType::String(file.to_string()),
                OscType::Int(i32::from(playing)),
            ],
        })
    }

    fn stop_recording(&self) -> SinkResult {
        self.send(OscMessage {
            addr: ADDR_RECORD.to_string(),
            args: vec![OscType::Int(0)],
        })
    }
}

// ─── Test Sink ──────────────────────────────────────────────────────

/// A call recorded by `TestSink`.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOp {
    EmitRow(RowTrigger),
    Stop,
    FileState { file: String, playing: bool },
    StopRecording,
}

/// Records every call for assertions. Interior mutability keeps it
/// `Send + Sync` so tests can hold an `Arc` while the sequencer owns a clone.
#[derive(Default)]
pub struct TestSink {
    ops: Mutex<Vec<SinkOp>>,
    fail_emits: AtomicBool,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn ops(&self) -> MutexGuard<'_, Vec<SinkOp>> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `emit_row` fail (without recording) until reset.
    pub fn set_fail_emits(&self, fail: bool) {
        self.fail_emits.store(fail, Ordering::Relaxed);
    }

    pub fn operations(&self) -> Vec<SinkOp> {
        self.ops().clone()
    }

    pub fn count<F: Fn(&SinkOp) -> bool>(&self, f: F) -> usize {
        self.ops().iter().filter(|op| f(op)).count()
    }

    /// All emitted rows, in order.
    pub fn emitted(&self) -> Vec<RowTrigger> {
        self.ops()
            .iter()
            .filter_map(|op| match op {
                SinkOp::EmitRow(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Emitted rows for one track, as `(phrase, row)`.
    pub fn emitted_for(&self, track: usize) -> Vec<(u8, usize)> {
        self.emitted()
            .into_iter()
            .filter(|t| t.track == track)
            .map(|t| (t.phrase.get(), t.row))
            .collect()
    }

    pub fn stops(&self) -> usize {
        self.count(|op| matches!(op, SinkOp::Stop))
    }
}

impl TriggerSink for TestSink {
    fn emit_row(&self, trigger: &RowTrigger) -> SinkResult {
        if self.fail_emits.load(Ordering::Relaxed) {
            return Err(SinkError("emit rejected".into()));
        }
        self.ops().push(SinkOp::EmitRow(trigger.clone()));
        Ok(())
    }

    fn send_stop(&self) -> SinkResult {
        self.ops().push(SinkOp::Stop);
        Ok(())
    }

    fn send_file_state(&self, file: &str, playing: bool) -> SinkResult {
        self.ops().push(SinkOp::FileState {
            file: file.to_string(),
            playing,
        });
        Ok(())
    }

    fn stop_recording(&self) -> SinkResult {
        self.ops().push(SinkOp::StopRecording);
        Ok(())
    }
}

/// Wraps `Arc<TestSink>` so the sequencer can own a `Box<dyn TriggerSink>`
/// while tests keep an `Arc` for assertions.
pub struct SharedTestSink(pub Arc<TestSink>);

impl TriggerSink for SharedTestSink {
    fn emit_row(&self, trigger: &RowTrigger) -> SinkResult {
        self.0.emit_row(trigger)
    }

    fn send_stop(&self) -> SinkResult {
        self.0.send_stop()
    }

    fn send_file_state(&self, file: &str, playing: bool) -> SinkResult {
        self.0.send_file_state(file, playing)
    }

    fn stop_recording(&self) -> SinkResult {
        self.0.stop_recording()
    }
}

// ─── Null Sink ──────────────────────────────────────────────────────

/// Accepts everything and does nothing. Used when no engine is configured.
pub struct NullSink;

impl TriggerSink for NullSink {
    fn emit_row(&self, _trigger: &RowTrigger) -> SinkResult {
        Ok(())
    }

    fn send_stop(&self) -> SinkResult {
        Ok(())
    }

    fn send_file_state(&self, _file: &str, _playing: bool) -> SinkResult {
        Ok(())
    }

    fn stop_recording(&self) -> SinkResult {
        Ok(())
    }
}
