use crate::emitter::{ShootingRespawn, SpikeParams};
use crate::style::StyleFilter;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spike-art",
    version,
    about = "Disperse an image into drifting cells and stir them with animated color spikes"
)]
pub struct Config {
    /// Image to load on startup (jpg, jpeg, png, bmp, gif).
    #[arg(long, short = 'i')]
    pub image: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = StyleFilter::Normal)]
    pub style: StyleFilter,

    #[arg(long, default_value_t = 0.5, value_parser = parse_intensity)]
    pub intensity: f32,

    #[arg(long, default_value_t = 50.0, value_parser = parse_radius)]
    pub radius: f32,

    /// Timer period between animation ticks.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=1000))]
    pub tick_ms: u64,

    /// Pixels per cell side; derived from the drawable width when omitted.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub cell_size: Option<u32>,

    #[arg(long, value_enum, default_value_t = ShootingRespawn::Keep)]
    pub shooting_respawn: ShootingRespawn,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    /// Start animating immediately once the image is loaded.
    #[arg(long, default_value_t = false)]
    pub autostart: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value = "spike_art.log")]
    pub log_file: PathBuf,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn spike_params(&self) -> SpikeParams {
        SpikeParams::new(self.intensity, self.radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "ansi", alias = "text")]
    Ascii,
}

impl RendererMode {
    /// Canvas pixels per terminal cell, as (columns, rows).
    pub fn pixels_per_cell(self) -> (usize, usize) {
        match self {
            Self::HalfBlock | Self::Ascii => (1, 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

pub fn parse_intensity(raw: &str) -> Result<f32, String> {
    parse_in_range(raw, SpikeParams::INTENSITY_RANGE)
}

pub fn parse_radius(raw: &str) -> Result<f32, String> {
    parse_in_range(raw, SpikeParams::RADIUS_RANGE)
}

fn parse_in_range(raw: &str, (lo, hi): (f32, f32)) -> Result<f32, String> {
    let v: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !(lo..=hi).contains(&v) {
        return Err(format!("must be between {lo} and {hi}"));
    }
    Ok(v)
}
