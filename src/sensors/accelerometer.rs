//! Accelerometer monitor

use std::sync::Arc;

use super::latency::{Clock, LatencyTracker};
use super::watch::{Watch, WatchHandle, WatchOptions, WatchSlot};
use super::{SensorError, Start};
use crate::display::{Screen, Slot};
use crate::shared::{format_number, period_or};

pub const DEFAULT_FREQUENCY_MS: u64 = 10_000;

pub const ERROR_ALERT: &str = "Error! ACCELEROMETER!";

/// Acceleration along each device axis in m/s^2
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: i64,
}

pub type AccelerationWatch = dyn Watch<Reading = Acceleration, Options = WatchOptions>;

pub struct AccelerometerMonitor {
    source: Arc<AccelerationWatch>,
    screen: Arc<dyn Screen>,
    clock: Arc<dyn Clock>,
    slot: WatchSlot,
}

impl AccelerometerMonitor {
    pub fn new(
        source: Arc<AccelerationWatch>,
        screen: Arc<dyn Screen>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            screen,
            clock,
            slot: WatchSlot::default(),
        }
    }

    /// Start watching acceleration every `frequency_ms` (default 10000).
    /// Does nothing if the watch is already running.
    pub fn init(&self, frequency_ms: Option<u64>) -> Result<Start, SensorError> {
        let frequency_ms = period_or(frequency_ms, DEFAULT_FREQUENCY_MS);

        let outcome = self.slot.start_once(|| {
            let readings = self.source.watch(WatchOptions::every_ms(frequency_ms))?;
            let screen = Arc::clone(&self.screen);
            let mut latency = LatencyTracker::starting_at(self.clock.now_ms());

            Ok(WatchHandle::spawn(readings, move |event| match event {
                Ok(acceleration) => show_acceleration(screen.as_ref(), &mut latency, &acceleration),
                Err(e) => {
                    tracing::debug!("Accelerometer watch failed: {}", e);
                    screen.alert(ERROR_ALERT);
                }
            }))
        })?;

        match outcome {
            Start::Started => tracing::info!("Accelerometer watch started (every {} ms)", frequency_ms),
            Start::AlreadyActive => tracing::debug!("Accelerometer watch already active"),
        }

        Ok(outcome)
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    pub fn cancel(&self) {
        self.slot.cancel()
    }

    pub async fn finished(&self) {
        self.slot.finished().await
    }
}

fn show_acceleration(screen: &dyn Screen, latency: &mut LatencyTracker, acceleration: &Acceleration) {
    screen.write(Slot::AccX, &format_number(acceleration.x));
    screen.write(Slot::AccY, &format_number(acceleration.y));
    screen.write(Slot::AccZ, &format_number(acceleration.z));

    if let Some(delta) = latency.observe(acceleration.timestamp) {
        screen.write(Slot::TimestampAcc, &delta.to_string());
    }
}
