use anyhow::{Context, Result};
use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

fn main() -> Result<()> {
    let cfg = spike_art::config::Config::parse();

    let level = cfg.log_level.filter();
    if level != log::LevelFilter::Off {
        // The terminal owns stdout, so logs go to a file.
        let file = File::create(&cfg.log_file)
            .with_context(|| format!("create log file {}", cfg.log_file.display()))?;
        WriteLogger::init(level, ConfigBuilder::new().build(), file).context("init logger")?;
    }
    log::info!("starting spike_art {}", env!("CARGO_PKG_VERSION"));

    let result = spike_art::app::run(cfg);
    if let Err(err) = &result {
        log::error!("fatal: {err:?}");
    }
    result
}
