//! Host adapters - connection type from network interfaces, identity from the OS

use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use sysinfo::System;

use crate::sensors::connection::{ConnectionInfo, ConnectionType};
use crate::sensors::device::{DeviceInfo, DeviceInfoSource};
use crate::sensors::SensorError;

// === Connection ===

/// Guess the transport of an interface from its name
fn interface_kind(name: &str) -> ConnectionType {
    let name = name.to_lowercase();
    if name.starts_with("wl") || name.starts_with("wi-fi") || name.starts_with("wifi") {
        ConnectionType::Wifi
    } else if name.starts_with("en") || name.starts_with("eth") || name.starts_with("ethernet") {
        ConnectionType::Ethernet
    } else if name.starts_with("ww") || name.starts_with("rmnet") || name.starts_with("pdp_ip") {
        ConnectionType::Cell
    } else {
        ConnectionType::Unknown
    }
}

/// Pick the best transport among the active, non-loopback interfaces
pub fn classify<'a>(active: impl IntoIterator<Item = &'a str>) -> ConnectionType {
    let rank = |c: ConnectionType| match c {
        ConnectionType::Ethernet => 4,
        ConnectionType::Wifi => 3,
        ConnectionType::Cell => 2,
        _ => 1,
    };

    active
        .into_iter()
        .map(interface_kind)
        .max_by_key(|c| rank(*c))
        .unwrap_or(ConnectionType::None)
}

/// Connection type read from the machine's network interfaces
#[derive(Debug, Default)]
pub struct InterfaceConnection;

impl ConnectionInfo for InterfaceConnection {
    fn connection_type(&self) -> ConnectionType {
        let interfaces = match NetworkInterface::show() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                tracing::debug!("Failed to get network interfaces: {}", e);
                return ConnectionType::Unknown;
            }
        };

        let active: Vec<&NetworkInterface> = interfaces
            .iter()
            .filter(|iface| {
                !iface.addr.is_empty()
                    && !iface.addr.iter().any(|a| match a {
                        Addr::V4(v4) => v4.ip.is_loopback(),
                        Addr::V6(v6) => v6.ip.is_loopback(),
                    })
            })
            .collect();

        classify(active.iter().map(|iface| iface.name.as_str()))
    }
}

// === Device ===

#[cfg(target_os = "linux")]
fn read_trimmed(path: &str) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        read_trimmed("/etc/machine-id").or_else(|| read_trimmed("/var/lib/dbus/machine-id"))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn product_name() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        read_trimmed("/sys/class/dmi/id/product_name")
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Identity of the machine running the dashboard
#[derive(Debug, Default)]
pub struct SystemDevice;

impl DeviceInfoSource for SystemDevice {
    fn device_info(&self) -> Result<DeviceInfo, SensorError> {
        let name = System::host_name()
            .ok_or_else(|| SensorError::DeviceUnavailable("no host name".to_string()))?;

        Ok(DeviceInfo {
            name,
            cordova: env!("CARGO_PKG_VERSION").to_string(),
            platform: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            uuid: machine_id().unwrap_or_else(|| "unknown".to_string()),
            version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            model: product_name().unwrap_or_else(|| std::env::consts::ARCH.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefers_wired() {
        assert_eq!(classify(["wlan0", "eth0"]), ConnectionType::Ethernet);
        assert_eq!(classify(["wlp3s0"]), ConnectionType::Wifi);
        assert_eq!(classify(["wwan0", "tun0"]), ConnectionType::Cell);
        assert_eq!(classify(["tun0"]), ConnectionType::Unknown);
    }

    #[test]
    fn test_classify_without_interfaces() {
        assert_eq!(classify(Vec::<&str>::new()), ConnectionType::None);
    }
}
