mod app;
mod cli;
mod config;
mod effects;

use anyhow::Result;
use clap::Parser;
use engine_logging::engine_error;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::load(cli.config.as_deref())?;
    let settings = config::resolve(cli, file_config)?;
    engine_logging::initialize(&settings.log, settings.log_level);

    match app::run(&settings) {
        Ok(summary) if summary.failed > 0 => {
            engine_error!("{} of {} images failed to convert", summary.failed, summary.items);
            std::process::exit(2);
        }
        Ok(_) => Ok(()),
        Err(err) => {
            engine_error!("{:#}", err);
            Err(err)
        }
    }
}
