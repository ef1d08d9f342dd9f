//! Sensors module - one monitor per device capability
//!
//! Each monitor subscribes once, formats every reading into its display slots
//! and reports how long it has been since the previous reading.

pub mod accelerometer;
pub mod compass;
pub mod connection;
pub mod device;
pub mod error;
pub mod geolocation;
pub mod latency;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SensorError;

/// Outcome of asking a monitor to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    Started,
    AlreadyActive,
}
