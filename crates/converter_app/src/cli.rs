use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use converter_core::{FormatToken, TargetFormat};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "converter",
    version,
    about = "Convert raster images (loose or inside zip archives) to another format"
)]
pub struct Cli {
    /// Image files and/or zip archives to convert
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format: png, jpg, jpeg, webp, bmp, gif
    #[arg(short = 't', long = "to")]
    pub output_format: Option<TargetFormat>,

    /// Input format hint; `auto` detects from content
    #[arg(short = 'i', long = "input-format")]
    pub input_format: Option<FormatToken>,

    /// Directory the converted files are written to
    #[arg(short, long = "out")]
    pub output_dir: Option<PathBuf>,

    /// Write one file per image, or one zip for the whole batch
    #[arg(short, long, value_enum)]
    pub mode: Option<ExportMode>,

    /// RON config file with defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum)]
    pub log: Option<LogTarget>,

    /// Log debug details
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Flat,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}
