//! Simulated capabilities for hosts without the hardware
//!
//! Readings are deterministic functions of the sample index so a dashboard
//! running on a desktop still shows moving values.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::sensors::accelerometer::Acceleration;
use crate::sensors::compass::Heading;
use crate::sensors::connection::{ConnectionInfo, ConnectionType};
use crate::sensors::device::{DeviceInfo, DeviceInfoSource};
use crate::sensors::geolocation::{Coordinates, GeoOptions, Position};
use crate::sensors::latency::Clock;
use crate::sensors::watch::{ReadingStream, Watch, WatchOptions};
use crate::sensors::SensorError;

/// Interval between simulated position fixes
pub const POSITION_INTERVAL: Duration = Duration::from_millis(1000);

const DECLINATION_DEG: f64 = 3.5;
const GRAVITY: f64 = 9.81;

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

fn round2(value: f64) -> f64 {
    round_to(value, 100.0)
}

/// Stream `sample(n, now_ms)` every `period`, starting immediately
fn ticking<R, F>(period: Duration, clock: Arc<dyn Clock>, mut sample: F) -> ReadingStream<R>
where
    R: Send + 'static,
    F: FnMut(u64, i64) -> R + Send + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold((ticker, 0u64), move |(mut ticker, n)| {
        let clock = Arc::clone(&clock);
        async move {
            ticker.tick().await;
            Some(((n, clock.now_ms()), (ticker, n + 1)))
        }
    })
    .map(move |(n, now)| Ok(sample(n, now)))
    .boxed()
}

pub fn heading_at(n: u64, timestamp: i64) -> Heading {
    let magnetic = (n as f64 * 1.5) % 360.0;
    Heading {
        magnetic_heading: round2(magnetic),
        true_heading: round2((magnetic + DECLINATION_DEG) % 360.0),
        heading_accuracy: 1.0,
        timestamp,
    }
}

pub fn acceleration_at(n: u64, timestamp: i64) -> Acceleration {
    let phase = n as f64 * 0.2;
    Acceleration {
        x: round2(0.3 * phase.sin()),
        y: round2(0.3 * phase.cos()),
        z: GRAVITY,
        timestamp,
    }
}

pub fn position_at(n: u64, timestamp: i64) -> Position {
    // Slow walk north-east from a fixed origin
    let step = n as f64 * 0.00001;
    Position {
        coords: Coordinates {
            latitude: round_to(52.52 + step, 1e6),
            longitude: round_to(13.405 + step, 1e6),
            altitude: Some(34.0),
            accuracy: 5.0,
            altitude_accuracy: Some(10.0),
            heading: Some(45.0),
            speed: Some(1.4),
        },
        timestamp,
    }
}

fn check_frequency(frequency: Duration) -> Result<(), SensorError> {
    if frequency.is_zero() {
        return Err(SensorError::InvalidOptions("frequency must be non-zero"));
    }
    Ok(())
}

pub struct SimulatedCompass {
    clock: Arc<dyn Clock>,
}

impl SimulatedCompass {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Watch for SimulatedCompass {
    type Reading = Heading;
    type Options = WatchOptions;

    fn watch(&self, options: WatchOptions) -> Result<ReadingStream<Heading>, SensorError> {
        check_frequency(options.frequency)?;
        Ok(ticking(options.frequency, Arc::clone(&self.clock), heading_at))
    }
}

pub struct SimulatedAccelerometer {
    clock: Arc<dyn Clock>,
}

impl SimulatedAccelerometer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Watch for SimulatedAccelerometer {
    type Reading = Acceleration;
    type Options = WatchOptions;

    fn watch(&self, options: WatchOptions) -> Result<ReadingStream<Acceleration>, SensorError> {
        check_frequency(options.frequency)?;
        Ok(ticking(options.frequency, Arc::clone(&self.clock), acceleration_at))
    }
}

pub struct SimulatedGeolocation {
    clock: Arc<dyn Clock>,
}

impl SimulatedGeolocation {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Watch for SimulatedGeolocation {
    type Reading = Position;
    type Options = GeoOptions;

    fn watch(&self, _options: GeoOptions) -> Result<ReadingStream<Position>, SensorError> {
        Ok(ticking(POSITION_INTERVAL, Arc::clone(&self.clock), position_at))
    }
}

/// Connection that never changes
pub struct SimulatedConnection(pub ConnectionType);

impl ConnectionInfo for SimulatedConnection {
    fn connection_type(&self) -> ConnectionType {
        self.0
    }
}

pub struct SimulatedDevice;

impl DeviceInfoSource for SimulatedDevice {
    fn device_info(&self) -> Result<DeviceInfo, SensorError> {
        Ok(DeviceInfo {
            name: "Simulator".to_string(),
            cordova: env!("CARGO_PKG_VERSION").to_string(),
            platform: "Simulated".to_string(),
            uuid: "00000000-0000-0000-0000-000000000000".to_string(),
            version: std::env::consts::OS.to_string(),
            model: "Virtual Device".to_string(),
        })
    }
}
