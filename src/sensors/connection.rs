//! Network connection type monitor

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::Start;
use crate::display::{Screen, Slot};
use crate::periodic::PeriodicTask;
use crate::shared::period_or;

pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Current network transport, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Unknown,
    Ethernet,
    Wifi,
    Cell2g,
    Cell3g,
    Cell4g,
    Cell,
    None,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 8] = [
        ConnectionType::Unknown,
        ConnectionType::Ethernet,
        ConnectionType::Wifi,
        ConnectionType::Cell2g,
        ConnectionType::Cell3g,
        ConnectionType::Cell4g,
        ConnectionType::Cell,
        ConnectionType::None,
    ];

    /// Short code of the connection type
    pub fn code(self) -> &'static str {
        match self {
            ConnectionType::Unknown => "unknown",
            ConnectionType::Ethernet => "ethernet",
            ConnectionType::Wifi => "wifi",
            ConnectionType::Cell2g => "2g",
            ConnectionType::Cell3g => "3g",
            ConnectionType::Cell4g => "4g",
            ConnectionType::Cell => "cellular",
            ConnectionType::None => "none",
        }
    }

    /// Text shown in the connection status slot
    pub fn label(self) -> &'static str {
        match self {
            ConnectionType::Unknown => "Unknown connection",
            ConnectionType::Ethernet => "Ethernet connection",
            ConnectionType::Wifi => "WiFi connection",
            ConnectionType::Cell2g => "Cell 2G connection",
            ConnectionType::Cell3g => "Cell 3G connection",
            ConnectionType::Cell4g => "Cell 4G connection",
            ConnectionType::Cell => "Cell generic connection",
            ConnectionType::None => "No network connection",
        }
    }
}

/// Synchronous read of the current connection type
pub trait ConnectionInfo: Send + Sync {
    fn connection_type(&self) -> ConnectionType;
}

pub struct ConnectionMonitor {
    source: Arc<dyn ConnectionInfo>,
    screen: Arc<dyn Screen>,
    poll: Mutex<Option<PeriodicTask>>,
}

impl ConnectionMonitor {
    pub fn new(source: Arc<dyn ConnectionInfo>, screen: Arc<dyn Screen>) -> Self {
        Self {
            source,
            screen,
            poll: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PeriodicTask>> {
        self.poll.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Poll the connection type now and every `interval_ms` (default 1000)
    /// after each completed poll. Does nothing if polling already runs.
    pub fn init(&self, interval_ms: Option<u64>) -> Start {
        let interval_ms = period_or(interval_ms, DEFAULT_INTERVAL_MS);
        let mut poll = self.lock();
        if poll.is_some() {
            tracing::debug!("Connection check already running");
            return Start::AlreadyActive;
        }

        let source = Arc::clone(&self.source);
        let screen = Arc::clone(&self.screen);
        let mut last = Instant::now();

        *poll = Some(PeriodicTask::start(Duration::from_millis(interval_ms), move || {
            let connection = source.connection_type();
            screen.write(Slot::ConnectionStatus, connection.label());

            let now = Instant::now();
            let elapsed = now.duration_since(last).as_millis();
            screen.write(Slot::TimestampConnection, &elapsed.to_string());
            last = now;

            tracing::trace!("Connection: {} ({} ms since last check)", connection.code(), elapsed);
        }));

        tracing::info!("Connection check started (every {} ms)", interval_ms);
        Start::Started
    }

    pub fn is_active(&self) -> bool {
        self.lock().as_ref().is_some_and(PeriodicTask::is_running)
    }

    pub fn stop(&self) {
        if let Some(poll) = self.lock().take() {
            poll.stop();
        }
    }
}
