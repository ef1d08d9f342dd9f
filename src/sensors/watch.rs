//! Continuous sensor subscriptions
//!
//! A capability that can be watched hands back a stream of readings. The
//! monitor that asked for it drains the stream on its own task, so readings of
//! one sensor are handled strictly one after another while different sensors
//! interleave freely.

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{SensorError, Start};

/// Readings or per-reading errors delivered by a watch
pub type ReadingStream<R> = BoxStream<'static, Result<R, SensorError>>;

/// A capability that delivers repeated readings until cancelled.
pub trait Watch: Send + Sync {
    type Reading: Send + 'static;
    type Options;

    fn watch(&self, options: Self::Options) -> Result<ReadingStream<Self::Reading>, SensorError>;
}

/// Polling interval for heading and acceleration watches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub frequency: Duration,
}

impl WatchOptions {
    pub fn every_ms(ms: u64) -> Self {
        Self {
            frequency: Duration::from_millis(ms),
        }
    }
}

static NEXT_WATCH_ID: AtomicU64 = AtomicU64::new(1);

/// Handle on a running subscription.
///
/// Dropping the handle leaves the subscription running; `cancel` stops it.
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
    done: watch::Receiver<bool>,
}

impl WatchHandle {
    /// Drain `readings` on a new task, passing each event to `on_event`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R, F>(mut readings: ReadingStream<R>, mut on_event: F) -> Self
    where
        R: Send + 'static,
        F: FnMut(Result<R, SensorError>) + Send + 'static,
    {
        let id = NEXT_WATCH_ID.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done) = watch::channel(false);

        let task = tokio::spawn(async move {
            while let Some(event) = readings.next().await {
                on_event(event);
            }
            tracing::debug!("Watch {} stream ended", id);
            done_tx.send_replace(true);
        });

        Self { task, done }
    }

    /// Whether readings can still arrive
    pub fn is_live(&self) -> bool {
        !*self.done.borrow() && !self.task.is_finished()
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Resolves once the stream has ended or the watch was cancelled
    pub async fn finished(&self) {
        let mut done = self.done.clone();
        // A closed channel means the task is gone either way.
        let _ = done.wait_for(|finished| *finished).await;
    }
}

/// Holder for the single subscription a monitor may own.
#[derive(Debug, Default)]
pub struct WatchSlot {
    handle: Mutex<Option<WatchHandle>>,
}

impl WatchSlot {
    fn lock(&self) -> MutexGuard<'_, Option<WatchHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `start` unless a subscription was already started.
    ///
    /// The slot stays locked while `start` runs, so two concurrent callers
    /// can never both subscribe.
    pub fn start_once<F>(&self, start: F) -> Result<Start, SensorError>
    where
        F: FnOnce() -> Result<WatchHandle, SensorError>,
    {
        let mut handle = self.lock();
        if handle.is_some() {
            return Ok(Start::AlreadyActive);
        }
        *handle = Some(start()?);
        Ok(Start::Started)
    }

    /// Whether the owned subscription can still deliver readings.
    ///
    /// An ended subscription still blocks `start_once`.
    pub fn is_active(&self) -> bool {
        self.lock().as_ref().is_some_and(WatchHandle::is_live)
    }

    /// Wait for the owned subscription to end, returns at once if there is none
    pub async fn finished(&self) {
        let done = self.lock().as_ref().map(|h| h.done.clone());
        if let Some(mut done) = done {
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    /// Cancel and forget the owned subscription
    pub fn cancel(&self) {
        if let Some(handle) = self.lock().take() {
            handle.cancel();
        }
    }
}
