//! Dedicated OSC send thread.
//!
//! Packets are encoded on the sequencer thread and pushed to a bounded
//! channel. The sender thread drains the channel and performs
//! `socket.send_to()`, keeping UDP I/O off the tick path.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// A pre-encoded OSC packet ready for UDP transmission.
pub struct OscSendEntry {
    pub encoded: Vec<u8>,
}

/// Channel capacity for the OSC send queue.
/// 8 tracks emitting on every tick at high ppq stays far below this.
pub const SEND_QUEUE_CAPACITY: usize = 512;

/// Outcome of queueing a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueResult {
    Queued,
    /// Channel full; the packet was dropped
    Dropped,
    /// Sender thread has exited
    Disconnected,
}

/// Create the sender channel and spawn the sender thread.
pub fn spawn_osc_sender(
    socket: UdpSocket,
    server_addr: SocketAddr,
) -> io::Result<(Sender<OscSendEntry>, JoinHandle<()>)> {
    let (tx, rx) = crossbeam_channel::bounded::<OscSendEntry>(SEND_QUEUE_CAPACITY);

    let handle = thread::Builder::new()
        .name("osc-sender".into())
        .spawn(move || {
            sender_loop(socket, server_addr, rx);
        })?;

    Ok((tx, handle))
}

fn sender_loop(socket: UdpSocket, server_addr: SocketAddr, rx: Receiver<OscSendEntry>) {
    while let Ok(entry) = rx.recv() {
        if let Err(e) = socket.send_to(&entry.encoded, server_addr) {
            log::debug!(target: "osc", "send to {} failed: {}", server_addr, e);
        }
    }
    log::debug!(target: "osc", "sender thread exiting");
}

/// Push an encoded packet to the sender thread without blocking.
pub fn try_queue(tx: &Sender<OscSendEntry>, encoded: Vec<u8>) -> QueueResult {
    match tx.try_send(OscSendEntry { encoded }) {
        Ok(()) => QueueResult::Queued,
        Err(TrySendError::Full(_)) => {
            log::warn!(target: "osc", "OSC send queue full, dropping packet");
            QueueResult::Dropped
        }
        Err(TrySendError::Disconnected(_)) => QueueResult::Disconnected,
    }
}
