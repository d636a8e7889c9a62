pub mod derived;
pub mod emitter;
pub mod escape;

use crate::error::{Result, SnapshotError};
use crate::metrics::Device;
use crate::mode::EscapeMode;
use std::io::Write;

#[derive(Clone, Copy, Debug, Default)]
pub struct SerializeOptions {
    pub escape: EscapeMode,
}

/// Renders the full snapshot document, trailing newline included.
pub fn to_json_string(devices: &[Device], options: SerializeOptions) -> String {
    let objects: Vec<_> = devices
        .iter()
        .map(|device| emitter::device_entries(device, options.escape))
        .collect();

    let mut out = String::new();
    emitter::render_array(&mut out, &objects, 0);
    out.push('\n');
    out
}

/// Writes the snapshot to `sink` in one piece. A failing sink leaves the
/// error to the caller; nothing is retried.
pub fn serialize<W: Write>(
    devices: &[Device],
    sink: &mut W,
    options: SerializeOptions,
) -> Result<()> {
    let document = to_json_string(devices, options);
    log::debug!("Serialized {} devices into {} bytes", devices.len(), document.len());
    sink.write_all(document.as_bytes())
        .and_then(|()| sink.flush())
        .map_err(SnapshotError::Write)
}
