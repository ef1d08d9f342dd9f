//! Capability providers the monitors read from

#[cfg(feature = "host")]
pub mod host;
#[cfg(feature = "host")]
pub mod ipgeo;
pub mod simulated;

use std::sync::Arc;

use crate::sensors::accelerometer::AccelerationWatch;
use crate::sensors::compass::HeadingWatch;
use crate::sensors::connection::{ConnectionInfo, ConnectionType};
use crate::sensors::device::DeviceInfoSource;
use crate::sensors::geolocation::PositionWatch;
use crate::sensors::latency::Clock;

/// One provider per capability
pub struct Sources {
    pub compass: Arc<HeadingWatch>,
    pub accelerometer: Arc<AccelerationWatch>,
    pub geolocation: Arc<PositionWatch>,
    pub connection: Arc<dyn ConnectionInfo>,
    pub device: Arc<dyn DeviceInfoSource>,
}

impl Sources {
    /// Every capability simulated
    pub fn simulated(clock: Arc<dyn Clock>) -> Self {
        Self {
            compass: Arc::new(simulated::SimulatedCompass::new(Arc::clone(&clock))),
            accelerometer: Arc::new(simulated::SimulatedAccelerometer::new(Arc::clone(&clock))),
            geolocation: Arc::new(simulated::SimulatedGeolocation::new(clock)),
            connection: Arc::new(simulated::SimulatedConnection(ConnectionType::Wifi)),
            device: Arc::new(simulated::SimulatedDevice),
        }
    }

    /// Real connection, identity and IP position from this machine.
    ///
    /// Desktops carry no compass or accelerometer, those stay simulated.
    #[cfg(feature = "host")]
    pub fn host(clock: Arc<dyn Clock>) -> Self {
        tracing::info!("Using host sources (compass and accelerometer simulated)");
        Self {
            geolocation: Arc::new(ipgeo::IpGeolocation::new(
                reqwest::Client::new(),
                Arc::clone(&clock),
                ipgeo::ENDPOINT,
            )),
            connection: Arc::new(host::InterfaceConnection),
            device: Arc::new(host::SystemDevice),
            ..Self::simulated(clock)
        }
    }

    /// Host sources when available, unless simulation is forced
    pub fn detect(clock: Arc<dyn Clock>, force_simulated: bool) -> Self {
        #[cfg(feature = "host")]
        if !force_simulated {
            return Self::host(clock);
        }

        if !force_simulated {
            tracing::info!("Built without host sources, using simulated sources");
        }
        Self::simulated(clock)
    }
}
