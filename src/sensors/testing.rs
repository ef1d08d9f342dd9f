//! Test doubles for sensor capabilities

use futures::stream::{self, StreamExt};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::latency::Clock;
use super::watch::{ReadingStream, Watch};
use super::SensorError;

/// Clock frozen at one instant
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Watch that replays a fixed script of events.
///
/// With `hold_open` the stream stays pending after the script, like a live
/// sensor that has nothing new to report.
pub struct ScriptedWatch<R, O> {
    events: Mutex<Vec<Result<R, SensorError>>>,
    hold_open: bool,
    calls: AtomicUsize,
    options: Mutex<Vec<O>>,
    _reading: PhantomData<fn() -> R>,
}

impl<R, O> ScriptedWatch<R, O> {
    pub fn new(events: Vec<Result<R, SensorError>>) -> Self {
        Self {
            events: Mutex::new(events),
            hold_open: false,
            calls: AtomicUsize::new(0),
            options: Mutex::new(Vec::new()),
            _reading: PhantomData,
        }
    }

    pub fn live(events: Vec<Result<R, SensorError>>) -> Self {
        Self {
            hold_open: true,
            ..Self::new(events)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> Vec<O>
    where
        O: Clone,
    {
        self.options.lock().unwrap().clone()
    }
}

impl<R, O> Watch for ScriptedWatch<R, O>
where
    R: Send + 'static,
    O: Send,
{
    type Reading = R;
    type Options = O;

    fn watch(&self, options: O) -> Result<ReadingStream<R>, SensorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options);

        let events: Vec<_> = self.events.lock().unwrap().drain(..).collect();
        let script = stream::iter(events);
        if self.hold_open {
            Ok(script.chain(stream::pending()).boxed())
        } else {
            Ok(script.boxed())
        }
    }
}
