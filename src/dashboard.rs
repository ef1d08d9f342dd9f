//! The dashboard namespace: five initializers over one display board

use std::sync::Arc;

use crate::config::Config;
use crate::display::Board;
use crate::sensors::accelerometer::AccelerometerMonitor;
use crate::sensors::compass::CompassMonitor;
use crate::sensors::connection::ConnectionMonitor;
use crate::sensors::device::DeviceDisplay;
use crate::sensors::geolocation::GeolocationMonitor;
use crate::sensors::latency::Clock;
use crate::sensors::{SensorError, Start};
use crate::sources::Sources;

pub struct SensorData {
    board: Arc<Board>,
    compass: CompassMonitor,
    accelerometer: AccelerometerMonitor,
    geolocation: GeolocationMonitor,
    connection: ConnectionMonitor,
    device: DeviceDisplay,
}

impl SensorData {
    pub fn new(sources: Sources, clock: Arc<dyn Clock>) -> Self {
        let board = Arc::new(Board::new());

        Self {
            compass: CompassMonitor::new(sources.compass, board.clone(), Arc::clone(&clock)),
            accelerometer: AccelerometerMonitor::new(
                sources.accelerometer,
                board.clone(),
                Arc::clone(&clock),
            ),
            geolocation: GeolocationMonitor::new(sources.geolocation, board.clone(), clock),
            connection: ConnectionMonitor::new(sources.connection, board.clone()),
            device: DeviceDisplay::new(sources.device, board.clone()),
            board,
        }
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn init_compass(&self, frequency_ms: Option<u64>) -> Result<Start, SensorError> {
        self.compass.init(frequency_ms)
    }

    pub fn init_acc(&self, frequency_ms: Option<u64>) -> Result<Start, SensorError> {
        self.accelerometer.init(frequency_ms)
    }

    pub fn init_geo(&self) -> Result<Start, SensorError> {
        self.geolocation.init()
    }

    pub fn init_check_connection(&self, interval_ms: Option<u64>) -> Start {
        self.connection.init(interval_ms)
    }

    pub fn init_device(&self) -> Result<(), SensorError> {
        self.device.init()
    }

    /// Start every monitor with the periods from `config`.
    ///
    /// A monitor that fails to start is logged and skipped, the others still run.
    pub fn init_all(&self, config: &Config) -> usize {
        let mut failed = 0;
        let mut report = |name: &str, result: Result<(), SensorError>| {
            if let Err(e) = result {
                tracing::error!("Failed to start {}: {}", name, e);
                failed += 1;
            }
        };

        report("compass", self.init_compass(Some(config.compass_frequency_ms)).map(drop));
        report("accelerometer", self.init_acc(Some(config.accelerometer_frequency_ms)).map(drop));
        report("geolocation", self.init_geo().map(drop));
        self.init_check_connection(Some(config.connection_interval_ms));
        report("device", self.init_device());

        failed
    }

    /// Cancel every subscription and stop the connection poll
    pub fn shutdown(&self) {
        self.compass.cancel();
        self.accelerometer.cancel();
        self.geolocation.cancel();
        self.connection.stop();
        tracing::debug!("All monitors stopped");
    }

    pub fn activity(&self) -> Activity {
        Activity {
            compass: self.compass.is_active(),
            accelerometer: self.accelerometer.is_active(),
            geolocation: self.geolocation.is_active(),
            connection: self.connection.is_active(),
        }
    }
}

/// Which subscriptions are running
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Activity {
    pub compass: bool,
    pub accelerometer: bool,
    pub geolocation: bool,
    pub connection: bool,
}
