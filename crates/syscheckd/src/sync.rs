//! Bounded hand-off of `dbsync` payloads to the resynchronization consumer.
//!
//! The control socket must never block on synchronization work, so payloads
//! are queued on a bounded channel and drained by a dedicated worker thread.
//! A full queue drops the payload with a warning.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::collaborators::SyncChannel;

const SYNC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sync");

/// Number of payloads buffered before new ones are dropped.
pub const SYNC_QUEUE_CAPACITY: usize = 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Final destination of synchronization payloads.
pub trait SyncSink: Send + 'static {
    /// Consumes one payload.
    fn deliver(&mut self, message: String);
}

/// Sink that records each payload in the daemon log.
#[derive(Debug, Default)]
pub struct TracingSyncSink;

impl SyncSink for TracingSyncSink {
    fn deliver(&mut self, message: String) {
        debug!(
            target: SYNC_TARGET,
            bytes = message.len(),
            message = %message,
            "synchronization message received"
        );
    }
}

/// Producer side of the synchronization queue.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    sender: SyncSender<String>,
}

impl SyncQueue {
    /// Starts a worker draining into `sink` and returns the queue feeding it.
    pub fn spawn<S: SyncSink>(capacity: usize, sink: S) -> (Self, SyncWorker) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || drain(&receiver, &stop_flag, sink));
        (
            Self { sender },
            SyncWorker {
                stop,
                handle: Some(handle),
            },
        )
    }
}

impl SyncChannel for SyncQueue {
    fn push_sync_message(&self, message: &str) {
        match self.sender.try_send(message.to_owned()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => warn!(
                target: SYNC_TARGET,
                bytes = dropped.len(),
                "synchronization queue full; message dropped"
            ),
            Err(TrySendError::Disconnected(dropped)) => warn!(
                target: SYNC_TARGET,
                bytes = dropped.len(),
                "synchronization worker stopped; message dropped"
            ),
        }
    }
}

/// Handle to the worker thread draining the queue.
#[derive(Debug)]
pub struct SyncWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<u64>>,
}

impl SyncWorker {
    /// Stops the worker after it drains the payloads already queued.
    ///
    /// Returns the number of payloads delivered over the worker's lifetime,
    /// or `None` when the sink panicked.
    pub fn stop(mut self) -> Option<u64> {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn drain<S: SyncSink>(receiver: &Receiver<String>, stop: &AtomicBool, mut sink: S) -> u64 {
    let mut delivered = 0_u64;
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(message) => {
                sink.deliver(message);
                delivered += 1;
            }
            Err(RecvTimeoutError::Timeout) if !stop.load(Ordering::SeqCst) => {}
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
        }
    }
    while let Ok(message) = receiver.try_recv() {
        sink.deliver(message);
        delivered += 1;
    }
    debug!(target: SYNC_TARGET, delivered, "synchronization worker stopped");
    delivered
}
