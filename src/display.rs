//! Display slots and the board monitors write into
//!
//! Slot ids are the contract with any UI that renders the board, so they are
//! kept exactly as the page markup names its elements.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A uniquely identified value slot on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    // Compass
    MagneticHeading,
    TrueHeading,
    HeadingAccuracy,
    TimestampCompass,
    // Accelerometer
    AccX,
    AccY,
    AccZ,
    TimestampAcc,
    // Geolocation
    Latitude,
    Longitude,
    Altitude,
    Accuracy,
    AltitudeAccuracy,
    Heading,
    Speed,
    TimestampGeo,
    // Connection
    ConnectionStatus,
    TimestampConnection,
    // Device
    DeviceName,
    CordVer,
    Platform,
    Uuid,
    Ver,
    Model,
}

impl Slot {
    pub const ALL: [Slot; 24] = [
        Slot::MagneticHeading,
        Slot::TrueHeading,
        Slot::HeadingAccuracy,
        Slot::TimestampCompass,
        Slot::AccX,
        Slot::AccY,
        Slot::AccZ,
        Slot::TimestampAcc,
        Slot::Latitude,
        Slot::Longitude,
        Slot::Altitude,
        Slot::Accuracy,
        Slot::AltitudeAccuracy,
        Slot::Heading,
        Slot::Speed,
        Slot::TimestampGeo,
        Slot::ConnectionStatus,
        Slot::TimestampConnection,
        Slot::DeviceName,
        Slot::CordVer,
        Slot::Platform,
        Slot::Uuid,
        Slot::Ver,
        Slot::Model,
    ];

    /// Element id of the slot
    pub fn id(self) -> &'static str {
        match self {
            Slot::MagneticHeading => "magneticHeading",
            Slot::TrueHeading => "trueHeading",
            Slot::HeadingAccuracy => "headingAccuracy",
            Slot::TimestampCompass => "timestampCompass",
            Slot::AccX => "accX",
            Slot::AccY => "accY",
            Slot::AccZ => "accZ",
            Slot::TimestampAcc => "timestampAcc",
            Slot::Latitude => "latitude",
            Slot::Longitude => "longitude",
            Slot::Altitude => "altitude",
            Slot::Accuracy => "accuracy",
            Slot::AltitudeAccuracy => "altitudeAccuracy",
            Slot::Heading => "heading",
            Slot::Speed => "speed",
            Slot::TimestampGeo => "timestampGeo",
            Slot::ConnectionStatus => "connectionStatus",
            Slot::TimestampConnection => "timestampConnection",
            Slot::DeviceName => "deviceName",
            Slot::CordVer => "cordVer",
            Slot::Platform => "platform",
            Slot::Uuid => "uuid",
            Slot::Ver => "ver",
            Slot::Model => "model",
        }
    }

    /// Section heading used when rendering the board
    pub fn section(self) -> &'static str {
        match self {
            Slot::MagneticHeading
            | Slot::TrueHeading
            | Slot::HeadingAccuracy
            | Slot::TimestampCompass => "Compass",
            Slot::AccX | Slot::AccY | Slot::AccZ | Slot::TimestampAcc => "Accelerometer",
            Slot::Latitude
            | Slot::Longitude
            | Slot::Altitude
            | Slot::Accuracy
            | Slot::AltitudeAccuracy
            | Slot::Heading
            | Slot::Speed
            | Slot::TimestampGeo => "Geolocation",
            Slot::ConnectionStatus | Slot::TimestampConnection => "Connection",
            Slot::DeviceName
            | Slot::CordVer
            | Slot::Platform
            | Slot::Uuid
            | Slot::Ver
            | Slot::Model => "Device",
        }
    }
}

/// Where monitors put their output.
///
/// `write` replaces the content of one slot. `alert` is the blocking,
/// user-facing error channel and is distinct from any slot.
pub trait Screen: Send + Sync {
    fn write(&self, slot: Slot, value: &str);
    fn alert(&self, message: &str);
}

/// Alerts kept on the board, older ones are dropped first
pub const MAX_ALERTS: usize = 20;

/// Serializable copy of the board at one instant
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub slots: BTreeMap<&'static str, String>,
    pub alerts: Vec<String>,
}

#[derive(Debug, Default)]
struct BoardState {
    values: HashMap<Slot, String>,
    writes: HashMap<Slot, usize>,
    alerts: VecDeque<String>,
}

/// In-memory dashboard shared by every monitor
#[derive(Debug, Default)]
pub struct Board {
    state: Mutex<BoardState>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current content of a slot, `None` if it was never written
    pub fn get(&self, slot: Slot) -> Option<String> {
        self.lock().values.get(&slot).cloned()
    }

    /// How many times a slot has been written
    pub fn write_count(&self, slot: Slot) -> usize {
        self.lock().writes.get(&slot).copied().unwrap_or(0)
    }

    /// Most recent alerts, oldest first
    pub fn alerts(&self) -> Vec<String> {
        self.lock().alerts.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            slots: Slot::ALL
                .iter()
                .map(|slot| {
                    let value = state.values.get(slot).cloned().unwrap_or_default();
                    (slot.id(), value)
                })
                .collect(),
            alerts: state.alerts.iter().cloned().collect(),
        }
    }

    /// Plain-text rendering grouped by section, for terminal output
    pub fn render(&self) -> String {
        let state = self.lock();
        let mut result = String::new();
        let mut section = "";

        for slot in Slot::ALL {
            if slot.section() != section {
                if !section.is_empty() {
                    result.push('\n');
                }
                section = slot.section();
                result.push_str(section);
                result.push('\n');
            }
            let value = state.values.get(&slot).map(String::as_str).unwrap_or("-");
            result.push_str(&format!("  {:<20} {}\n", slot.id(), value));
        }

        if !state.alerts.is_empty() {
            result.push_str("\nAlerts\n");
            for alert in &state.alerts {
                result.push_str(&format!("  {}\n", alert));
            }
        }

        result
    }
}

impl Screen for Board {
    fn write(&self, slot: Slot, value: &str) {
        let mut state = self.lock();
        state.values.insert(slot, value.to_string());
        *state.writes.entry(slot).or_insert(0) += 1;
    }

    fn alert(&self, message: &str) {
        tracing::warn!("Alert: {}", message);
        let mut state = self.lock();
        if state.alerts.len() == MAX_ALERTS {
            state.alerts.pop_front();
        }
        state.alerts.push_back(message.to_string());
    }
}
