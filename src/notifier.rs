//! Position notifications towards the host
//!
//! The playback thread never calls the host directly. Notifications are queued
//! on a crossbeam channel and a dedicated worker thread invokes the registered
//! [`HostCallback`], so host latency or failures cannot disturb playback.

use crate::error::Result;
use crate::state::TransportState;
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, error, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Error type a host callback may return
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

type Handler = Box<dyn FnMut(&str) -> std::result::Result<(), CallbackError> + Send>;

/// A named host function taking the stringified tick position
pub struct HostCallback {
    name: String,
    handler: Handler,
}

impl HostCallback {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&str) -> std::result::Result<(), CallbackError> + Send + 'static,
    {
        Self {
            name: name.into(),
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the handler, containing both errors and panics
    fn invoke(&mut self, argument: &str) {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(argument))) {
            Ok(Ok(())) => debug!("Host callback '{}' invoked with {}", self.name, argument),
            Ok(Err(e)) => warn!("Host callback '{}' failed: {}", self.name, e),
            Err(_) => error!("Host callback '{}' panicked", self.name),
        }
    }
}

impl std::fmt::Debug for HostCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCallback")
            .field("name", &self.name)
            .finish()
    }
}

enum Job {
    Notify(String),
    Flush(Sender<()>),
}

/// Runs a [`HostCallback`] on its own thread, fed without blocking
pub struct NotificationDispatcher {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl NotificationDispatcher {
    pub fn spawn(callback: HostCallback) -> Result<Self> {
        let (tx, rx) = channel::unbounded();
        let handle = thread::Builder::new()
            .name(format!("notify-{}", callback.name()))
            .spawn(move || Self::run(callback, rx))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn run(mut callback: HostCallback, rx: Receiver<Job>) {
        debug!("Notification worker for '{}' started", callback.name());
        for job in rx.iter() {
            match job {
                Job::Notify(argument) => callback.invoke(&argument),
                Job::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("Notification worker for '{}' stopping", callback.name());
    }

    /// Queues a notification. Never blocks.
    pub fn dispatch(&self, argument: String) {
        if let Some(tx) = &self.tx {
            if tx.send(Job::Notify(argument)).is_err() {
                warn!("Notification worker is gone, dropping notification");
            }
        }
    }

    /// Waits until every notification queued so far has been handed to the host
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (ack_tx, ack_rx) = channel::bounded(1);
        if tx.send(Job::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Delivers whatever is still queued, then stops the worker
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Notification worker terminated abnormally");
            }
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

const NO_TICK: u64 = u64::MAX;

/// Turns observed note events into deduplicated "tick changed" notifications
pub struct PositionNotifier {
    last_tick: AtomicU64,
    transport: Arc<TransportState>,
    dispatcher: Option<NotificationDispatcher>,
}

impl PositionNotifier {
    /// `dispatcher` may be `None` when the host registered no callback; every
    /// notification is then silently skipped.
    pub fn new(transport: Arc<TransportState>, dispatcher: Option<NotificationDispatcher>) -> Self {
        Self {
            last_tick: AtomicU64::new(NO_TICK),
            transport,
            dispatcher,
        }
    }

    /// Handles a note event seen at `tick`. Returns true if a notification was issued.
    pub fn on_note_event(&self, tick: u64) -> bool {
        if self.last_tick.load(Ordering::SeqCst) == tick {
            return false;
        }
        if !self.transport.is_playing() {
            return false;
        }

        self.last_tick.store(tick, Ordering::SeqCst);
        match &self.dispatcher {
            Some(dispatcher) => {
                dispatcher.dispatch(tick.to_string());
                true
            }
            None => false,
        }
    }

    pub fn last_notified(&self) -> Option<u64> {
        match self.last_tick.load(Ordering::SeqCst) {
            NO_TICK => None,
            tick => Some(tick),
        }
    }

    /// Forgets the last notified tick so the next note event always notifies
    pub fn reset(&self) {
        self.last_tick.store(NO_TICK, Ordering::SeqCst);
    }

    pub fn has_sink(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Blocks until queued notifications have reached the host
    pub fn flush(&self) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.flush();
        }
    }
}
