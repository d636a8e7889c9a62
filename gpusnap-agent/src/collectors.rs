pub mod fixture;
pub mod gpu;
pub mod process;

use crate::error::Result;
use crate::metrics::Device;
use nvml_wrapper::Nvml;
use sysinfo::{System, Users};

/// Source of device telemetry. Each step mutates the device list in place
/// and finishes before the next one starts.
pub trait Collector {
    fn discover(&mut self) -> Result<Vec<Device>>;
    fn populate_static_info(&mut self, devices: &mut [Device]) -> Result<()>;
    fn refresh_dynamic_info(&mut self, devices: &mut [Device]) -> Result<()>;
    fn refresh_processes(&mut self, devices: &mut [Device]) -> Result<()>;
}

/// Runs the collection pipeline to completion and hands back a finished
/// snapshot.
pub fn take_snapshot<C: Collector + ?Sized>(collector: &mut C) -> Result<Vec<Device>> {
    let mut devices = collector.discover()?;
    log::info!("Discovered {} devices", devices.len());
    collector.populate_static_info(&mut devices)?;
    collector.refresh_dynamic_info(&mut devices)?;
    collector.refresh_processes(&mut devices)?;
    Ok(devices)
}

pub struct NvmlCollector {
    nvml: Nvml,
    system: System,
    users: Users,
}

impl NvmlCollector {
    pub fn init() -> Result<Self> {
        let nvml = Nvml::init()?;
        Ok(NvmlCollector {
            nvml,
            system: System::new(),
            users: Users::new_with_refreshed_list(),
        })
    }
}

/// Devices are addressed by their position in the list returned from
/// `discover`, which matches the NVML index.
impl Collector for NvmlCollector {
    fn discover(&mut self) -> Result<Vec<Device>> {
        gpu::discover(&self.nvml)
    }

    fn populate_static_info(&mut self, devices: &mut [Device]) -> Result<()> {
        gpu::populate_static_info(&self.nvml, devices);
        Ok(())
    }

    fn refresh_dynamic_info(&mut self, devices: &mut [Device]) -> Result<()> {
        gpu::refresh_dynamic_info(&self.nvml, devices);
        Ok(())
    }

    fn refresh_processes(&mut self, devices: &mut [Device]) -> Result<()> {
        process::refresh_processes(&self.nvml, &mut self.system, &self.users, devices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotError;
    use crate::metrics::{Process, ProcessType};

    #[derive(Default)]
    struct Recording {
        calls: Vec<&'static str>,
        fail_dynamic: bool,
    }

    impl Collector for Recording {
        fn discover(&mut self) -> Result<Vec<Device>> {
            self.calls.push("discover");
            Ok(vec![Device::default(), Device::default()])
        }

        fn populate_static_info(&mut self, devices: &mut [Device]) -> Result<()> {
            self.calls.push("static");
            for (i, device) in devices.iter_mut().enumerate() {
                device.static_info.device_name = Some(format!("gpu{}", i));
            }
            Ok(())
        }

        fn refresh_dynamic_info(&mut self, devices: &mut [Device]) -> Result<()> {
            self.calls.push("dynamic");
            if self.fail_dynamic {
                return Err(std::io::Error::other("sensor gone").into());
            }
            for device in devices.iter_mut() {
                device.dynamic_info.gpu_temp = Some(50);
            }
            Ok(())
        }

        fn refresh_processes(&mut self, devices: &mut [Device]) -> Result<()> {
            self.calls.push("processes");
            devices[0].processes.push(Process::new(10, ProcessType::Compute));
            Ok(())
        }
    }

    #[test]
    fn pipeline_runs_in_order() {
        let mut collector = Recording::default();
        let devices = take_snapshot(&mut collector).unwrap();
        assert_eq!(collector.calls, vec!["discover", "static", "dynamic", "processes"]);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].static_info.device_name.as_deref(), Some("gpu1"));
        assert_eq!(devices[1].dynamic_info.gpu_temp, Some(50));
        assert_eq!(devices[0].processes.len(), 1);
    }

    #[test]
    fn failing_step_stops_the_pipeline() {
        let mut collector = Recording {
            fail_dynamic: true,
            ..Default::default()
        };
        let err = take_snapshot(&mut collector).unwrap_err();
        assert!(matches!(err, SnapshotError::Io(_)));
        assert_eq!(collector.calls, vec!["discover", "static", "dynamic"]);
    }
}
