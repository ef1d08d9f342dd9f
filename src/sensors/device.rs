//! Static device identity

use std::sync::Arc;

use super::SensorError;
use crate::display::{Screen, Slot};

/// Identity record of the device running the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    /// Version of the runtime hosting the dashboard
    pub cordova: String,
    pub platform: String,
    pub uuid: String,
    /// Operating system version
    pub version: String,
    pub model: String,
}

pub trait DeviceInfoSource: Send + Sync {
    fn device_info(&self) -> Result<DeviceInfo, SensorError>;
}

pub struct DeviceDisplay {
    source: Arc<dyn DeviceInfoSource>,
    screen: Arc<dyn Screen>,
}

impl DeviceDisplay {
    pub fn new(source: Arc<dyn DeviceInfoSource>, screen: Arc<dyn Screen>) -> Self {
        Self { source, screen }
    }

    /// Write each identity field verbatim into its slot
    pub fn init(&self) -> Result<(), SensorError> {
        let device = self.source.device_info()?;

        self.screen.write(Slot::DeviceName, &device.name);
        self.screen.write(Slot::CordVer, &device.cordova);
        self.screen.write(Slot::Platform, &device.platform);
        self.screen.write(Slot::Uuid, &device.uuid);
        self.screen.write(Slot::Ver, &device.version);
        self.screen.write(Slot::Model, &device.model);

        tracing::info!("Device info shown for {} ({})", device.name, device.platform);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Board;

    struct FixedDevice(Option<DeviceInfo>);

    impl DeviceInfoSource for FixedDevice {
        fn device_info(&self) -> Result<DeviceInfo, SensorError> {
            self.0
                .clone()
                .ok_or_else(|| SensorError::DeviceUnavailable("no device object".to_string()))
        }
    }

    #[test]
    fn test_fields_written_verbatim() {
        let board = Arc::new(Board::new());
        let device = DeviceDisplay::new(
            Arc::new(FixedDevice(Some(DeviceInfo {
                name: "Pixel".to_string(),
                cordova: "9.0".to_string(),
                platform: "Android".to_string(),
                uuid: "abc".to_string(),
                version: "11".to_string(),
                model: "Pixel 5".to_string(),
            }))),
            board.clone(),
        );

        device.init().unwrap();

        assert_eq!(board.get(Slot::DeviceName).as_deref(), Some("Pixel"));
        assert_eq!(board.get(Slot::CordVer).as_deref(), Some("9.0"));
        assert_eq!(board.get(Slot::Platform).as_deref(), Some("Android"));
        assert_eq!(board.get(Slot::Uuid).as_deref(), Some("abc"));
        assert_eq!(board.get(Slot::Ver).as_deref(), Some("11"));
        assert_eq!(board.get(Slot::Model).as_deref(), Some("Pixel 5"));
    }

    #[test]
    fn test_missing_device_is_an_error() {
        let board = Arc::new(Board::new());
        let device = DeviceDisplay::new(Arc::new(FixedDevice(None)), board.clone());

        assert!(matches!(device.init(), Err(SensorError::DeviceUnavailable(_))));
        assert_eq!(board.get(Slot::DeviceName), None);
    }
}
