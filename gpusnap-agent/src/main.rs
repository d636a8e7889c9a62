use anyhow::Context;
use clap::Parser;
use gpusnap_agent::collectors::fixture::FixtureCollector;
use gpusnap_agent::collectors::{self, Collector, NvmlCollector};
use gpusnap_agent::mode::EscapeMode;
use gpusnap_agent::snapshot::{self, SerializeOptions};
use std::fs::File;
use std::io;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut collector: Box<dyn Collector> = match &cli.from_file {
        Some(path) => Box::new(FixtureCollector::new(path)),
        None => Box::new(NvmlCollector::init().context("Failed to initialize NVML")?),
    };

    let devices =
        collectors::take_snapshot(collector.as_mut()).context("Failed to collect snapshot")?;
    let options = SerializeOptions { escape: cli.escape };

    match &cli.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            snapshot::serialize(&devices, &mut file, options)?;
            log::info!("Snapshot saved to: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            snapshot::serialize(&devices, &mut stdout, options)?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "gpusnap")]
#[command(
    about = "Print a one-shot JSON snapshot of GPU devices and their processes",
    long_about = None
)]
struct Cli {
    /// Write the snapshot to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How string values are escaped
    #[arg(long, value_enum, default_value_t = EscapeMode::Strict)]
    escape: EscapeMode,

    /// Read devices from a JSON fixture instead of querying NVML
    #[arg(long)]
    from_file: Option<PathBuf>,
}
