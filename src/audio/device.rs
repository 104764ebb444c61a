//! Audio input device enumeration.

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Metadata about one audio input device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Position in the host's input device enumeration; usable as
    /// `CaptureConfig::device_index`.
    pub index: usize,
    /// Human-readable device name reported by the OS.
    pub name: String,
    /// Input channel count of the device's default configuration.
    pub channels: u16,
    /// Default capture sample rate (Hz).
    pub default_sample_rate: f64,
    /// Whether this is the system default input device.
    pub is_default: bool,
}

/// List all input-capable devices on the default host.
///
/// A static/administrative query, unrelated to the live pipeline.
/// Returns an empty `Vec` when enumeration fails or no devices exist.
pub fn list_input_devices() -> Vec<DeviceInfo> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("failed to enumerate input devices: {e}");
            return Vec::new();
        }
    };

    devices
        .enumerate()
        .filter_map(|(index, device)| {
            // Devices without an input configuration are not capture-capable.
            let config = device.default_input_config().ok()?;
            let name = device
                .name()
                .unwrap_or_else(|_| format!("Input Device {}", index + 1));
            Some(DeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                channels: config.channels(),
                default_sample_rate: f64::from(config.sample_rate().0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_never_panics() {
        // May legitimately be empty on CI machines without audio hardware.
        let _ = list_input_devices();
    }

    #[test]
    fn device_info_serializes_with_documented_fields() {
        let info = DeviceInfo {
            index: 2,
            name: "USB Microphone".into(),
            channels: 1,
            default_sample_rate: 44_100.0,
            is_default: true,
        };

        let json = serde_json::to_value(&info).expect("serialize device info");
        assert_eq!(json["index"], 2);
        assert_eq!(json["name"], "USB Microphone");
        assert_eq!(json["channels"], 1);
        assert_eq!(json["default_sample_rate"], 44_100.0);
        assert_eq!(json["is_default"], true);

        let round_trip: DeviceInfo = serde_json::from_value(json).expect("deserialize");
        assert_eq!(round_trip.index, 2);
        assert!(round_trip.is_default);
    }
}
