//! sensor-dashboard: live device sensor readings on one screen
//!
//! [`SensorData`] groups the five monitors (compass, accelerometer,
//! geolocation, connection, device identity) over one display [`Board`].

pub mod config;
pub mod dashboard;
pub mod display;
pub mod periodic;
pub mod sensors;
pub mod shared;
pub mod sources;

pub use dashboard::SensorData;
pub use display::{Board, Screen, Slot};
pub use sensors::{SensorError, Start};
