//! Output device enumeration and lookup.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::{Error, Result};

/// Get the display name of a cpal device.
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Information about an output device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Position in the host's output device list.
    pub index: usize,
    /// Device name.
    pub name: String,
    /// Whether this is the system default output.
    pub is_default: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub default_channels: u16,
}

impl AudioDevice {
    fn describe(index: usize, device: &Device, default_name: Option<&str>) -> Option<Self> {
        let name = device_name(device).ok()?;
        let config = device.default_output_config().ok();
        Some(Self {
            index,
            is_default: default_name == Some(name.as_str()),
            default_sample_rate: config.as_ref().map_or(48000, |c| c.sample_rate()),
            default_channels: config.as_ref().map_or(2, |c| c.channels()),
            name,
        })
    }
}

/// Lists the output devices of the default host.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());
    let devices = host
        .output_devices()
        .map_err(|e| Error::Device(e.to_string()))?;

    Ok(devices
        .enumerate()
        .filter_map(|(i, d)| AudioDevice::describe(i, &d, default_name.as_deref()))
        .collect())
}

/// The default output device of the default host, if any.
pub fn default_output_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();
    Ok(host.default_output_device().and_then(|d| {
        let name = device_name(&d).ok();
        let index = host
            .output_devices()
            .ok()
            .and_then(|mut all| all.position(|o| device_name(&o).ok() == name))
            .unwrap_or(0);
        AudioDevice::describe(index, &d, name.as_deref())
    }))
}

/// Finds an output device by index, exact name, or case-insensitive name fragment.
pub fn find_output_device(name_or_index: &str) -> Result<AudioDevice> {
    let devices = list_devices()?;
    let pos = position_in(&devices, |d| d.name.as_str(), name_or_index)?;
    Ok(devices[pos].clone())
}

/// Resolves a cpal output device on `host`, or the default when `name` is `None`.
pub(crate) fn resolve_output_device(host: &Host, name: Option<&str>) -> Result<Device> {
    let Some(name_or_index) = name else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };
    let devices: Vec<Device> = host
        .output_devices()
        .map_err(|e| Error::Device(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();
    let pos = position_in(&names, String::as_str, name_or_index)?;
    Ok(devices[pos].clone())
}

/// Index lookup shared by the public and cpal-level finders.
///
/// A numeric query is an index; otherwise an exact name wins over the first
/// case-insensitive partial match.
fn position_in<T>(items: &[T], name: impl Fn(&T) -> &str, query: &str) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        return if index < items.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {index} (only {} devices available)",
                items.len()
            )))
        };
    }

    if let Some(pos) = items.iter().position(|d| name(d) == query) {
        return Ok(pos);
    }

    let needle = query.to_lowercase();
    let matches: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, d)| name(d).to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{query}'"
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            let names: Vec<&str> = matches.iter().map(|&i| name(&items[i])).collect();
            tracing::warn!(
                query,
                candidates = ?names,
                "device query is ambiguous, using first match"
            );
            Ok(*first)
        }
    }
}
