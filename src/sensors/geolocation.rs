//! Geolocation monitor

use std::sync::Arc;
use std::time::Duration;

use super::latency::{Clock, LatencyTracker};
use super::watch::{Watch, WatchHandle, WatchSlot};
use super::{SensorError, Start};
use crate::display::{Screen, Slot};
use crate::shared::{format_number, format_optional};

pub const ERROR_ALERT: &str = "Error! GEOLOCATION!";

/// Position fix. Angles in degrees, distances in meters, speed in m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub accuracy: f64,
    pub altitude_accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp: i64,
}

/// Acquisition options for a position watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoOptions {
    /// Oldest cached fix that may be delivered instead of a new one
    pub maximum_age: Duration,
    /// Longest wait for a fix before reporting a timeout
    pub timeout: Duration,
    pub enable_high_accuracy: bool,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            maximum_age: Duration::from_millis(3000),
            timeout: Duration::from_millis(5000),
            enable_high_accuracy: true,
        }
    }
}

pub type PositionWatch = dyn Watch<Reading = Position, Options = GeoOptions>;

pub struct GeolocationMonitor {
    source: Arc<PositionWatch>,
    screen: Arc<dyn Screen>,
    clock: Arc<dyn Clock>,
    slot: WatchSlot,
}

impl GeolocationMonitor {
    pub fn new(source: Arc<PositionWatch>, screen: Arc<dyn Screen>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            screen,
            clock,
            slot: WatchSlot::default(),
        }
    }

    /// Start watching the position with the fixed [`GeoOptions`].
    /// Does nothing if the watch is already running.
    pub fn init(&self) -> Result<Start, SensorError> {
        let outcome = self.slot.start_once(|| {
            let readings = self.source.watch(GeoOptions::default())?;
            let screen = Arc::clone(&self.screen);
            let mut latency = LatencyTracker::starting_at(self.clock.now_ms());

            Ok(WatchHandle::spawn(readings, move |event| match event {
                Ok(position) => show_position(screen.as_ref(), &mut latency, &position),
                Err(e) => {
                    tracing::debug!("Geolocation watch failed: {}", e);
                    screen.alert(ERROR_ALERT);
                }
            }))
        })?;

        match outcome {
            Start::Started => tracing::info!("Geolocation watch started"),
            Start::AlreadyActive => tracing::debug!("Geolocation watch already active"),
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

fn show_position(screen: &dyn Screen, latency: &mut LatencyTracker, position: &Position) {
    let coords = &position.coords;
    screen.write(Slot::Latitude, &format_number(coords.latitude));
    screen.write(Slot::Longitude, &format_number(coords.longitude));
    screen.write(Slot::Altitude, &format_optional(coords.altitude));
    screen.write(Slot::Accuracy, &format_number(coords.accuracy));
    screen.write(Slot::AltitudeAccuracy, &format_optional(coords.altitude_accuracy));
    screen.write(Slot::Heading, &format_optional(coords.heading));
    screen.write(Slot::Speed, &format_optional(coords.speed));

    if let Some(delta) = latency.observe(position.timestamp) {
        screen.write(Slot::TimestampGeo, &delta.to_string());
    }
}
