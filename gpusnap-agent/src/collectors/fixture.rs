use crate::collectors::Collector;
use crate::error::{Result, SnapshotError};
use crate::metrics::Device;
use std::fs;
use std::path::PathBuf;

/// Replays a device list stored as JSON, for machines without a GPU.
/// Every field is taken from the file as is; the refresh steps do nothing.
pub struct FixtureCollector {
    path: PathBuf,
}

impl FixtureCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FixtureCollector { path: path.into() }
    }
}

pub fn parse_devices(text: &str) -> Result<Vec<Device>> {
    Ok(serde_json::from_str(text)?)
}

impl Collector for FixtureCollector {
    fn discover(&mut self) -> Result<Vec<Device>> {
        let text = fs::read_to_string(&self.path).map_err(|source| SnapshotError::FixtureRead {
            path: self.path.clone(),
            source,
        })?;
        parse_devices(&text)
    }

    fn populate_static_info(&mut self, _devices: &mut [Device]) -> Result<()> {
        Ok(())
    }

    fn refresh_dynamic_info(&mut self, _devices: &mut [Device]) -> Result<()> {
        Ok(())
    }

    fn refresh_processes(&mut self, _devices: &mut [Device]) -> Result<()> {
        Ok(())
    }
}
