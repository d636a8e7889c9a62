use crate::metrics::{Device, Process};
use crate::mode::EscapeMode;
use crate::snapshot::derived::{fan_rpm, fan_speed_percentage, power_draw_watts, power_util};
use crate::snapshot::escape::escape;

/// Indentation of array elements and object keys, by nesting depth:
/// devices at 2, device keys at 3, processes at 5, process keys at 7.
const INDENT_WIDTHS: [usize; 4] = [2, 3, 5, 7];

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Uint(u64),
    /// Already escaped string body.
    Str(String),
    Objects(Vec<Vec<Entry>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: &'static str,
    pub value: Value,
}

impl Entry {
    fn uint(key: &'static str, value: impl Into<u64>) -> Self {
        Entry {
            key,
            value: Value::Uint(value.into()),
        }
    }

    fn string(key: &'static str, raw: &str, mode: EscapeMode) -> Self {
        Entry {
            key,
            value: Value::Str(escape(raw, mode)),
        }
    }
}

fn push_uint<T: Into<u64>>(entries: &mut Vec<Entry>, key: &'static str, value: Option<T>) {
    if let Some(v) = value {
        entries.push(Entry::uint(key, v));
    }
}

pub fn device_entries(device: &Device, mode: EscapeMode) -> Vec<Entry> {
    let info = &device.dynamic_info;
    let mut entries = Vec::new();

    if let Some(name) = &device.static_info.device_name {
        entries.push(Entry::string("device_name", name, mode));
    }
    if !device.pdev.is_empty() {
        entries.push(Entry::string("pdev", &device.pdev, mode));
    }

    push_uint(&mut entries, "gpu_clock", info.gpu_clock_speed);
    push_uint(&mut entries, "mem_clock", info.mem_clock_speed);
    push_uint(&mut entries, "temp", info.gpu_temp);
    push_uint(
        &mut entries,
        "fan_speed_percentage",
        info.fan_speed_percent.map(fan_speed_percentage),
    );
    push_uint(&mut entries, "fan_speed", info.fan_rpm.map(fan_rpm));
    push_uint(&mut entries, "mem_used", info.used_memory);
    push_uint(&mut entries, "mem_free", info.free_memory);
    push_uint(&mut entries, "pcie_ingress_rate", info.pcie_rx);
    push_uint(&mut entries, "pcie_egress_rate", info.pcie_tx);
    push_uint(&mut entries, "encoder_util", info.encoder_rate);
    push_uint(&mut entries, "decoder_util", info.decoder_rate);

    if let Some(draw) = info.power_draw {
        entries.push(Entry::uint("power_draw", power_draw_watts(draw)));
        push_uint(
            &mut entries,
            "power_util",
            info.power_draw_max.and_then(|max| power_util(draw, max)),
        );
    }

    push_uint(&mut entries, "gpu_util", info.gpu_util_rate);
    push_uint(&mut entries, "mem_util", info.mem_util_rate);

    let processes = device
        .processes
        .iter()
        .map(|process| process_entries(process, mode))
        .collect();
    entries.push(Entry {
        key: "processes",
        value: Value::Objects(processes),
    });

    entries
}

pub fn process_entries(process: &Process, mode: EscapeMode) -> Vec<Entry> {
    let mut entries = Vec::new();

    if let Some(cmdline) = &process.cmdline {
        entries.push(Entry::string("cmd", cmdline, mode));
    }
    if let Some(user) = &process.user_name {
        entries.push(Entry::string("username", user, mode));
    }
    push_uint(&mut entries, "gpu_util", process.gpu_usage);
    push_uint(&mut entries, "mem_used", process.gpu_memory_usage);
    push_uint(&mut entries, "mem_util", process.gpu_memory_percentage);
    push_uint(&mut entries, "gpu_cycles", process.gpu_cycles);
    push_uint(&mut entries, "encoder_util", process.encode_usage);
    push_uint(&mut entries, "decoder_util", process.decode_usage);

    entries.push(Entry::string("process_type", process.kind.as_str(), mode));
    entries.push(Entry {
        key: "pid",
        value: Value::Str(process.pid.to_string()),
    });

    entries
}

fn indent(out: &mut String, level: usize) {
    let deepest = INDENT_WIDTHS.len() - 1;
    let width = INDENT_WIDTHS
        .get(level)
        .copied()
        .unwrap_or_else(|| INDENT_WIDTHS[deepest] + 2 * (level - deepest));
    out.extend(std::iter::repeat_n(' ', width));
}

/// Renders an array of objects whose elements sit at `depth`.
pub fn render_array(out: &mut String, objects: &[Vec<Entry>], depth: usize) {
    if objects.is_empty() {
        out.push_str("[]");
        return;
    }

    out.push_str("[\n");
    for (i, object) in objects.iter().enumerate() {
        render_object(out, object, depth);
        if i + 1 < objects.len() {
            out.push(',');
        }
        out.push('\n');
    }
    if depth > 0 {
        indent(out, 2 * depth - 1);
    }
    out.push(']');
}

fn render_object(out: &mut String, entries: &[Entry], depth: usize) {
    indent(out, 2 * depth);
    out.push_str("{\n");
    for (i, entry) in entries.iter().enumerate() {
        indent(out, 2 * depth + 1);
        out.push('"');
        out.push_str(entry.key);
        out.push_str("\": ");
        match &entry.value {
            Value::Uint(n) => out.push_str(&n.to_string()),
            Value::Str(body) => {
                out.push('"');
                out.push_str(body);
                out.push('"');
            }
            Value::Objects(objects) => render_array(out, objects, depth + 1),
        }
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    indent(out, 2 * depth);
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DynamicInfo, ProcessType, StaticInfo};

    fn keys(entries: &[Entry]) -> Vec<&'static str> {
        entries.iter().map(|e| e.key).collect()
    }

    #[test]
    fn bare_device_only_has_processes() {
        let entries = device_entries(&Device::default(), EscapeMode::Strict);
        assert_eq!(keys(&entries), vec!["processes"]);
        assert_eq!(entries[0].value, Value::Objects(Vec::new()));
    }

    #[test]
    fn device_keys_follow_schema_order() {
        let device = Device {
            pdev: "0000:01:00.0".into(),
            static_info: StaticInfo {
                device_name: Some("RTX".into()),
            },
            dynamic_info: DynamicInfo {
                mem_util_rate: Some(1),
                gpu_util_rate: Some(2),
                power_draw_max: Some(3000),
                power_draw: Some(1500),
                decoder_rate: Some(5),
                encoder_rate: Some(6),
                pcie_tx: Some(7),
                pcie_rx: Some(8),
                free_memory: Some(9),
                used_memory: Some(10),
                fan_rpm: Some(11),
                fan_speed_percent: Some(12),
                gpu_temp: Some(13),
                mem_clock_speed: Some(14),
                gpu_clock_speed: Some(15),
            },
            processes: Vec::new(),
        };
        assert_eq!(
            keys(&device_entries(&device, EscapeMode::Strict)),
            vec![
                "device_name",
                "pdev",
                "gpu_clock",
                "mem_clock",
                "temp",
                "fan_speed_percentage",
                "fan_speed",
                "mem_used",
                "mem_free",
                "pcie_ingress_rate",
                "pcie_egress_rate",
                "encoder_util",
                "decoder_util",
                "power_draw",
                "power_util",
                "gpu_util",
                "mem_util",
                "processes",
            ]
        );
    }

    #[test]
    fn power_util_needs_both_fields() {
        let mut device = Device::default();
        device.dynamic_info.power_draw_max = Some(200_000);
        assert_eq!(keys(&device_entries(&device, EscapeMode::Strict)), vec!["processes"]);

        device.dynamic_info.power_draw = Some(150_000);
        let entries = device_entries(&device, EscapeMode::Strict);
        assert_eq!(entries[0], Entry::uint("power_draw", 150u32));
        assert_eq!(entries[1], Entry::uint("power_util", 75u64));

        device.dynamic_info.power_draw_max = Some(0);
        let entries = device_entries(&device, EscapeMode::Strict);
        assert_eq!(keys(&entries), vec!["power_draw", "processes"]);
    }

    #[test]
    fn process_mandatory_fields_come_last() {
        let mut process = Process::new(1234, ProcessType::GraphicalCompute);
        process.decode_usage = Some(4);
        process.cmdline = Some("a\"b\\c".into());
        let entries = process_entries(&process, EscapeMode::Strict);
        assert_eq!(keys(&entries), vec!["cmd", "decoder_util", "process_type", "pid"]);
        assert_eq!(entries[0].value, Value::Str("a\\\"b\\\\c".into()));
        assert_eq!(entries[2].value, Value::Str("graphical_compute".into()));
        assert_eq!(entries[3].value, Value::Str("1234".into()));
    }

    #[test]
    fn renders_nested_layout() {
        let mut device = Device::default();
        device.dynamic_info.gpu_temp = Some(40);
        device.processes.push(Process::new(1, ProcessType::Compute));
        device.processes.push(Process::new(2, ProcessType::Graphical));

        let mut out = String::new();
        render_array(&mut out, &[device_entries(&device, EscapeMode::Strict)], 0);

        let expected = "[\n\
            \x20 {\n\
            \x20  \"temp\": 40,\n\
            \x20  \"processes\": [\n\
            \x20    {\n\
            \x20      \"process_type\": \"compute\",\n\
            \x20      \"pid\": \"1\"\n\
            \x20    },\n\
            \x20    {\n\
            \x20      \"process_type\": \"graphical\",\n\
            \x20      \"pid\": \"2\"\n\
            \x20    }\n\
            \x20  ]\n\
            \x20 }\n\
            ]";
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_arrays_render_inline() {
        let mut out = String::new();
        render_array(&mut out, &[], 0);
        assert_eq!(out, "[]");

        let mut out = String::new();
        render_array(&mut out, &[device_entries(&Device::default(), EscapeMode::Strict)], 0);
        assert_eq!(out, "[\n  {\n   \"processes\": []\n  }\n]");
    }
}
