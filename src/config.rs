use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "./commslog.toml";
const DEFAULT_BAUD_RATE: u32 = 115200;

#[derive(Parser, Debug)]
#[clap(name = "commslog-decoder", version, about)]
pub struct Cli {
    /// Capture file to decode
    pub input: Option<PathBuf>,

    /// Path to configuration file (defaults to ./commslog.toml when present)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Decode a live serial port instead of a capture file
    #[clap(long)]
    pub serial_port: Option<String>,

    /// Override serial baud rate
    #[clap(long)]
    pub baud_rate: Option<u32>,

    /// Output format
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Include tokenized log entries in the output
    #[clap(long)]
    pub entries: bool,

    /// Write output to a file instead of stdout
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Override log level (error, warn, info, debug, trace)
    #[clap(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Jsonl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub format: OutputFormat,
    pub show_entries: bool,
    pub serial_port: Option<String>,
    pub baud_rate: u32,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_entries: false,
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", self.log_level))
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => read_config(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }

    if cli.entries {
        config.show_entries = true;
    }

    if let Some(ref serial_port) = cli.serial_port {
        config.serial_port = Some(serial_port.clone());
    }

    if let Some(baud_rate) = cli.baud_rate {
        config.baud_rate = baud_rate;
    }

    if let Some(ref log_level) = cli.log_level {
        config.log_level = log_level.clone();
    }

    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    toml::from_str(&config_content).context("Failed to parse config file")
}
