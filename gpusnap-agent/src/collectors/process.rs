use crate::collectors::gpu::reading;
use crate::metrics::{Device, Pid, Process, ProcessField, ProcessType};
use nvml_wrapper::Nvml;
use nvml_wrapper::enums::device::UsedGpuMemory;
use nvml_wrapper::struct_wrappers::device::ProcessInfo;
use std::ffi::OsString;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, Users};

/// Fills each device's process list from NVML, then resolves command lines
/// and owners through sysinfo.
pub fn refresh_processes(
    nvml: &Nvml,
    system: &mut System,
    users: &Users,
    devices: &mut [Device],
) {
    for (index, device) in devices.iter_mut().enumerate() {
        device.processes.clear();

        let handle = match nvml.device_by_index(index as u32) {
            Ok(dev) => dev,
            Err(e) => {
                log::warn!("Failed to open GPU {}: {}", index, e);
                continue;
            }
        };

        if let Some(compute) = reading("compute processes", handle.running_compute_processes()) {
            for info in &compute {
                let memory = used_bytes(info);
                merge_process(&mut device.processes, info.pid, ProcessType::Compute, memory);
            }
        }
        if let Some(graphics) = reading("graphics processes", handle.running_graphics_processes())
        {
            for info in &graphics {
                let memory = used_bytes(info);
                merge_process(&mut device.processes, info.pid, ProcessType::Graphical, memory);
            }
        }

        if let Some(total) = reading("memory info", handle.memory_info()).map(|m| m.total) {
            for process in device.processes.iter_mut() {
                process.gpu_memory_percentage = process
                    .gpu_memory_usage
                    .and_then(|used| memory_percentage(used, total));
            }
        }

        let samples = reading(
            "process utilization",
            handle.process_utilization_stats(None::<u64>),
        );
        if let Some(samples) = samples {
            for sample in samples {
                if let Some(process) = device.processes.iter_mut().find(|p| p.pid == sample.pid) {
                    process.gpu_usage = Some(u64::from(sample.sm_util));
                    process.encode_usage = Some(u64::from(sample.enc_util));
                    process.decode_usage = Some(u64::from(sample.dec_util));
                }
            }
        }
    }

    let pids: Vec<sysinfo::Pid> = devices
        .iter()
        .flat_map(|device| device.processes.iter())
        .map(|process| sysinfo::Pid::from_u32(process.pid))
        .collect();
    if pids.is_empty() {
        return;
    }
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&pids),
        true,
        ProcessRefreshKind::everything(),
    );

    for process in devices.iter_mut().flat_map(|device| device.processes.iter_mut()) {
        let Some(sys_process) = system.process(sysinfo::Pid::from_u32(process.pid)) else {
            log::debug!("Process {} vanished before it could be inspected", process.pid);
            continue;
        };
        process.cmdline = command_line(sys_process.cmd(), sys_process.name());
        process.user_name = sys_process
            .user_id()
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|user| user.name().to_string());
        if !process.is_populated(ProcessField::UserName) {
            log::debug!("No owner found for process {}", process.pid);
        }
    }
}

fn used_bytes(info: &ProcessInfo) -> Option<u64> {
    match info.used_gpu_memory {
        UsedGpuMemory::Used(bytes) => Some(bytes),
        UsedGpuMemory::Unavailable => None,
    }
}

/// Records `pid` on the device, combining kinds and memory when NVML lists
/// it more than once. First-seen order is kept.
pub fn merge_process(
    processes: &mut Vec<Process>,
    pid: Pid,
    kind: ProcessType,
    memory: Option<u64>,
) {
    match processes.iter_mut().find(|p| p.pid == pid) {
        Some(existing) => {
            existing.kind = existing.kind.merge(kind);
            // The same allocation is reported under both lists.
            existing.gpu_memory_usage = match (existing.gpu_memory_usage, memory) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        None => {
            let mut process = Process::new(pid, kind);
            process.gpu_memory_usage = memory;
            processes.push(process);
        }
    }
}

pub fn memory_percentage(used: u64, total: u64) -> Option<u32> {
    let percent = (u128::from(used) * 100).checked_div(u128::from(total))?;
    u32::try_from(percent).ok()
}

/// Joins argv, falling back to the executable name for kernel threads and
/// processes whose arguments are hidden.
pub fn command_line(cmd: &[OsString], name: &std::ffi::OsStr) -> Option<String> {
    let joined = cmd
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    if !joined.is_empty() {
        return Some(joined);
    }
    let name = name.to_string_lossy();
    if name.is_empty() { None } else { Some(name.into_owned()) }
}
