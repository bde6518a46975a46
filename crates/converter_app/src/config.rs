//! Run settings: RON config file defaults, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use converter_core::{FormatToken, TargetFormat};
use converter_engine::{EngineConfig, MAX_ENTRY_SIZE};
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, ExportMode, LogTarget};

const DEFAULT_CONFIG_FILENAME: &str = "converter.ron";

/// On-disk config. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub output_format: String,
    pub input_format: String,
    pub output_dir: PathBuf,
    pub mode: ExportMode,
    pub write_manifest: bool,
    pub max_entry_size: u64,
    pub stall_timeout_secs: u64,
    pub log: LogTarget,
    pub log_file: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            output_format: "png".to_string(),
            input_format: "auto".to_string(),
            output_dir: PathBuf::from("output"),
            mode: ExportMode::Flat,
            write_manifest: true,
            max_entry_size: MAX_ENTRY_SIZE,
            stall_timeout_secs: 120,
            log: LogTarget::Terminal,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub inputs: Vec<PathBuf>,
    pub output_format: TargetFormat,
    pub input_format: FormatToken,
    pub output_dir: PathBuf,
    pub mode: ExportMode,
    pub write_manifest: bool,
    pub stall_timeout: Duration,
    pub engine: EngineConfig,
    pub log: LogDestination,
    pub log_level: LevelFilter,
}

/// Load the config file named on the command line, or `converter.ron` in the
/// working directory if present. An explicitly named file must exist.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
    };
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };
    parse(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse(content: &str) -> Result<FileConfig> {
    Ok(ron::from_str(content)?)
}

pub fn resolve(cli: Cli, file: FileConfig) -> Result<Settings> {
    let output_format = match cli.output_format {
        Some(format) => format,
        None => file
            .output_format
            .parse()
            .context("config output_format")?,
    };
    let input_format = match cli.input_format {
        Some(format) => format,
        None => file.input_format.parse().context("config input_format")?,
    };
    let log = match cli.log.unwrap_or(file.log) {
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::File => LogDestination::File(file.log_file.clone()),
        LogTarget::Both => LogDestination::Both(file.log_file.clone()),
    };

    Ok(Settings {
        inputs: cli.inputs,
        output_format,
        input_format,
        output_dir: cli.output_dir.unwrap_or(file.output_dir),
        mode: cli.mode.unwrap_or(file.mode),
        write_manifest: file.write_manifest,
        stall_timeout: Duration::from_secs(file.stall_timeout_secs.max(1)),
        engine: EngineConfig {
            max_entry_size: file.max_entry_size,
        },
        log,
        log_level: if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
    })
}
