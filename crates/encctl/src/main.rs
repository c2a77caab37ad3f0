mod config;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::EnclosureDescriptor;
use enclosure::{map_nvme, MODEL_PROFILES};
use topology::SysfsTopology;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Selects compact or JSON log lines.
const LOG_FORMAT_ENV: &str = "ENCCTL_LOG_FORMAT";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "compact".to_string());

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .json()
            .flatten_event(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}

#[derive(Parser)]
#[command(name = "encctl")]
#[command(about = "NVMe enclosure slot mapping utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Args)]
struct MapArgs {
    /// Platform identifier, e.g. TRUENAS-R50-HA. Read from SMBIOS when omitted.
    #[arg(long)]
    dmi: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// YAML file with topology settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root of the sysfs tree to inspect.
    #[arg(long)]
    sysfs_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Map the NVMe bays of this system to enclosure slots
    Map(MapArgs),
    /// List chassis models with NVMe bay mappings
    Models,
}

fn render(descriptors: &[EnclosureDescriptor], format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(descriptors)?,
        OutputFormat::Yaml => serde_yaml::to_string(descriptors)?,
    };
    Ok(rendered)
}

fn run_map(args: MapArgs) -> Result<()> {
    let env_root = std::env::var(config::SYSFS_ROOT_ENV).ok();
    let topology_config = config::resolve(args.config.as_deref(), env_root, args.sysfs_root)?;

    let identifier = match args.dmi {
        Some(dmi) => dmi,
        None => config::read_platform_identifier(&topology_config)?,
    };
    info!(identifier = %identifier, "Mapping NVMe enclosure");

    let provider = SysfsTopology::new(topology_config);
    let descriptors = map_nvme(&identifier, &provider)
        .with_context(|| format!("Failed to map NVMe bays for {identifier}"))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", render(&descriptors, args.format)?)?;
    Ok(())
}

fn run_models() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for profile in MODEL_PROFILES {
        writeln!(
            stdout,
            "{:<6} {:<10} {}",
            profile.model,
            profile.table.kind(),
            profile.nvme_slots
        )?;
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Map(args) => run_map(args),
        Commands::Models => run_models(),
    }
}
