use crate::error::Result;
use crate::metrics::{Device, DynamicField, DynamicInfo, StaticField};
use nvml_wrapper::Nvml;
use nvml_wrapper::enum_wrappers::device::{Clock, PcieUtilCounter, TemperatureSensor};
use nvml_wrapper::error::NvmlError;

/// Keeps a successful reading, leaving the field unpopulated otherwise.
pub(crate) fn reading<T>(what: &str, result: std::result::Result<T, NvmlError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("{} unavailable: {}", what, e);
            None
        }
    }
}

pub fn discover(nvml: &Nvml) -> Result<Vec<Device>> {
    let count = nvml.device_count()?;
    Ok((0..count).map(|_| Device::default()).collect())
}

pub fn populate_static_info(nvml: &Nvml, devices: &mut [Device]) {
    for (index, device) in devices.iter_mut().enumerate() {
        let handle = match nvml.device_by_index(index as u32) {
            Ok(dev) => dev,
            Err(e) => {
                log::warn!("Failed to open GPU {}: {}", index, e);
                continue;
            }
        };

        device.static_info.device_name = reading("device name", handle.name());
        if let Some(pci) = reading("pci info", handle.pci_info()) {
            device.pdev = pci.bus_id;
        }
        if !device.static_info.is_populated(StaticField::DeviceName) {
            log::warn!("GPU {} did not report its name", index);
        }
    }
}

pub fn refresh_dynamic_info(nvml: &Nvml, devices: &mut [Device]) {
    for (index, device) in devices.iter_mut().enumerate() {
        let handle = match nvml.device_by_index(index as u32) {
            Ok(dev) => dev,
            Err(e) => {
                log::warn!("Failed to open GPU {}: {}", index, e);
                device.dynamic_info = DynamicInfo::default();
                continue;
            }
        };

        let memory = reading("memory info", handle.memory_info());
        let utilization = reading("utilization rates", handle.utilization_rates());

        device.dynamic_info = DynamicInfo {
            gpu_clock_speed: reading("graphics clock", handle.clock_info(Clock::Graphics)),
            mem_clock_speed: reading("memory clock", handle.clock_info(Clock::Memory)),
            gpu_temp: reading("temperature", handle.temperature(TemperatureSensor::Gpu)),
            fan_speed_percent: reading("fan speed", handle.fan_speed(0)),
            // NVML reports fan speed as a percentage only.
            fan_rpm: None,
            used_memory: memory.as_ref().map(|m| m.used),
            free_memory: memory.as_ref().map(|m| m.free),
            pcie_rx: reading("pcie rx", handle.pcie_throughput(PcieUtilCounter::Receive)),
            pcie_tx: reading("pcie tx", handle.pcie_throughput(PcieUtilCounter::Send)),
            encoder_rate: reading("encoder utilization", handle.encoder_utilization())
                .map(|u| u.utilization),
            decoder_rate: reading("decoder utilization", handle.decoder_utilization())
                .map(|u| u.utilization),
            power_draw: reading("power usage", handle.power_usage()),
            power_draw_max: reading("power limit", handle.enforced_power_limit()),
            gpu_util_rate: utilization.as_ref().map(|u| u.gpu),
            mem_util_rate: utilization.as_ref().map(|u| u.memory),
        };

        let unsupported = unsupported_fields(&device.dynamic_info);
        if !unsupported.is_empty() {
            log::debug!("GPU {} does not report {:?}", index, unsupported);
        }
    }
}

/// Dynamic fields left unpopulated after a refresh.
pub fn unsupported_fields(info: &DynamicInfo) -> Vec<DynamicField> {
    DynamicField::ALL
        .into_iter()
        .filter(|field| !info.is_populated(*field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reading_is_unpopulated() {
        let value: Option<u32> = reading("clock", Err(NvmlError::NotSupported));
        assert_eq!(value, None);
        assert_eq!(reading("clock", Ok::<u32, NvmlError>(0)), Some(0));
    }

    #[test]
    fn unsupported_fields_skip_zero_readings() {
        let info = DynamicInfo {
            fan_speed_percent: Some(0),
            ..Default::default()
        };
        let unsupported = unsupported_fields(&info);
        assert_eq!(unsupported.len(), DynamicField::ALL.len() - 1);
        assert!(!unsupported.contains(&DynamicField::FanSpeedPercent));
        assert!(unsupported.contains(&DynamicField::FanRpm));
    }
}
