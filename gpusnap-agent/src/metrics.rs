use serde::{Deserialize, Serialize};

pub type Pid = u32;

/// One monitored accelerator together with the processes using it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Device {
    /// PCI bus identifier, e.g. `0000:01:00.0`. Empty when unknown.
    pub pdev: String,
    pub static_info: StaticInfo,
    pub dynamic_info: DynamicInfo,
    pub processes: Vec<Process>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticInfo {
    pub device_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicInfo {
    /// MHz
    pub gpu_clock_speed: Option<u32>,
    /// MHz
    pub mem_clock_speed: Option<u32>,
    /// Celsius
    pub gpu_temp: Option<u32>,
    pub fan_speed_percent: Option<u32>,
    pub fan_rpm: Option<u32>,
    /// Bytes
    pub used_memory: Option<u64>,
    /// Bytes
    pub free_memory: Option<u64>,
    /// KB/s into the device
    pub pcie_rx: Option<u32>,
    /// KB/s out of the device
    pub pcie_tx: Option<u32>,
    pub encoder_rate: Option<u32>,
    pub decoder_rate: Option<u32>,
    /// Milliwatts
    pub power_draw: Option<u32>,
    /// Milliwatts
    pub power_draw_max: Option<u32>,
    pub gpu_util_rate: Option<u32>,
    pub mem_util_rate: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    #[default]
    Unknown,
    Graphical,
    Compute,
    GraphicalCompute,
}

impl ProcessType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessType::Unknown => "unknown",
            ProcessType::Graphical => "graphical",
            ProcessType::Compute => "compute",
            ProcessType::GraphicalCompute => "graphical_compute",
        }
    }

    /// Combines the kinds under which the same pid was reported.
    pub fn merge(self, other: ProcessType) -> ProcessType {
        use ProcessType::*;
        match (self, other) {
            (Unknown, t) | (t, Unknown) => t,
            (Graphical, Graphical) => Graphical,
            (Compute, Compute) => Compute,
            _ => GraphicalCompute,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Process {
    pub pid: Pid,
    #[serde(rename = "type")]
    pub kind: ProcessType,
    #[serde(default)]
    pub cmdline: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub gpu_usage: Option<u64>,
    #[serde(default)]
    pub gpu_memory_usage: Option<u64>,
    #[serde(default)]
    pub gpu_memory_percentage: Option<u32>,
    #[serde(default)]
    pub gpu_cycles: Option<u64>,
    #[serde(default)]
    pub encode_usage: Option<u64>,
    #[serde(default)]
    pub decode_usage: Option<u64>,
}

impl Process {
    pub fn new(pid: Pid, kind: ProcessType) -> Self {
        Process {
            pid,
            kind,
            ..Default::default()
        }
    }

    pub fn is_populated(&self, field: ProcessField) -> bool {
        match field {
            ProcessField::Cmdline => self.cmdline.is_some(),
            ProcessField::UserName => self.user_name.is_some(),
            ProcessField::GpuUsage => self.gpu_usage.is_some(),
            ProcessField::GpuMemoryUsage => self.gpu_memory_usage.is_some(),
            ProcessField::GpuMemoryPercentage => self.gpu_memory_percentage.is_some(),
            ProcessField::GpuCycles => self.gpu_cycles.is_some(),
            ProcessField::EncodeUsage => self.encode_usage.is_some(),
            ProcessField::DecodeUsage => self.decode_usage.is_some(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaticField {
    DeviceName,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynamicField {
    GpuClockSpeed,
    MemClockSpeed,
    GpuTemp,
    FanSpeedPercent,
    FanRpm,
    UsedMemory,
    FreeMemory,
    PcieRx,
    PcieTx,
    EncoderRate,
    DecoderRate,
    PowerDraw,
    PowerDrawMax,
    GpuUtilRate,
    MemUtilRate,
}

impl DynamicField {
    pub const ALL: [DynamicField; 15] = [
        DynamicField::GpuClockSpeed,
        DynamicField::MemClockSpeed,
        DynamicField::GpuTemp,
        DynamicField::FanSpeedPercent,
        DynamicField::FanRpm,
        DynamicField::UsedMemory,
        DynamicField::FreeMemory,
        DynamicField::PcieRx,
        DynamicField::PcieTx,
        DynamicField::EncoderRate,
        DynamicField::DecoderRate,
        DynamicField::PowerDraw,
        DynamicField::PowerDrawMax,
        DynamicField::GpuUtilRate,
        DynamicField::MemUtilRate,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessField {
    Cmdline,
    UserName,
    GpuUsage,
    GpuMemoryUsage,
    GpuMemoryPercentage,
    GpuCycles,
    EncodeUsage,
    DecodeUsage,
}

impl StaticInfo {
    pub fn is_populated(&self, field: StaticField) -> bool {
        match field {
            StaticField::DeviceName => self.device_name.is_some(),
        }
    }
}

impl DynamicInfo {
    pub fn is_populated(&self, field: DynamicField) -> bool {
        match field {
            DynamicField::GpuClockSpeed => self.gpu_clock_speed.is_some(),
            DynamicField::MemClockSpeed => self.mem_clock_speed.is_some(),
            DynamicField::GpuTemp => self.gpu_temp.is_some(),
            DynamicField::FanSpeedPercent => self.fan_speed_percent.is_some(),
            DynamicField::FanRpm => self.fan_rpm.is_some(),
            DynamicField::UsedMemory => self.used_memory.is_some(),
            DynamicField::FreeMemory => self.free_memory.is_some(),
            DynamicField::PcieRx => self.pcie_rx.is_some(),
            DynamicField::PcieTx => self.pcie_tx.is_some(),
            DynamicField::EncoderRate => self.encoder_rate.is_some(),
            DynamicField::DecoderRate => self.decoder_rate.is_some(),
            DynamicField::PowerDraw => self.power_draw.is_some(),
            DynamicField::PowerDrawMax => self.power_draw_max.is_some(),
            DynamicField::GpuUtilRate => self.gpu_util_rate.is_some(),
            DynamicField::MemUtilRate => self.mem_util_rate.is_some(),
        }
    }
}
