use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use spike_art::config::{parse_intensity, parse_radius};
use spike_art::emitter::{EmitterKind, ShootingRespawn, SpikeParams};
use spike_art::session::Session;
use spike_art::style::StyleFilter;
use spike_art::surface::Canvas;

const DEFAULT_OUT_DIR: &str = "frames";
const DEFAULT_SEED: u64 = 0x5B1C_E2A7;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_frames",
    version,
    about = "Headless spike animation export (image input -> PNG frame sequence)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "IMAGE")]
    pub(crate) image: PathBuf,

    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUT_DIR)]
    pub(crate) out_dir: PathBuf,

    #[arg(long, default_value_t = 800)]
    pub(crate) width: u32,

    #[arg(long, default_value_t = 600)]
    pub(crate) height: u32,

    #[arg(long, default_value_t = 300)]
    pub(crate) ticks: u32,

    /// Write one PNG every N ticks.
    #[arg(long, default_value_t = 10)]
    pub(crate) every: u32,

    /// Virtual timer period used to derive elapsed time.
    #[arg(long, default_value_t = 30)]
    pub(crate) tick_ms: u32,

    #[arg(long, value_enum)]
    pub(crate) spikes: Option<EmitterKind>,

    #[arg(long, value_enum, default_value_t = StyleFilter::Normal)]
    pub(crate) style: StyleFilter,

    #[arg(long, default_value_t = 0.5, value_parser = parse_intensity)]
    pub(crate) intensity: f32,

    #[arg(long, default_value_t = 50.0, value_parser = parse_radius)]
    pub(crate) radius: f32,

    #[arg(long)]
    pub(crate) cell_size: Option<u32>,

    #[arg(long, value_enum, default_value_t = ShootingRespawn::Keep)]
    pub(crate) shooting_respawn: ShootingRespawn,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,

    /// Also write the restored image after stopping.
    #[arg(long, default_value_t = false)]
    pub(crate) restore: bool,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width < 2 || args.height < 2 {
        bail!("--width and --height must be >= 2");
    }
    if args.ticks == 0 {
        bail!("--ticks must be >= 1");
    }
    if args.every == 0 {
        bail!("--every must be >= 1");
    }
    if args.tick_ms == 0 {
        bail!("--tick-ms must be >= 1");
    }
    if args.cell_size == Some(0) {
        bail!("--cell-size must be >= 1");
    }
    Ok(())
}

pub(crate) fn frame_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("frame_{index:05}.png"))
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let written = run(&args)?;
    println!(
        "exported {} frames ({} ticks) -> {}",
        written,
        args.ticks,
        args.out_dir.display()
    );
    Ok(())
}

/// Runs the animation headless and returns how many PNGs were written.
pub(crate) fn run(args: &Cli) -> Result<u32> {
    validate_args(args)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output directory {}", args.out_dir.display()))?;

    let mut canvas = Canvas::new(args.width, args.height);
    let mut session = Session::new(fastrand::Rng::with_seed(args.seed))
        .with_cell_size(args.cell_size)
        .with_respawn(args.shooting_respawn)
        .with_params(SpikeParams::new(args.intensity, args.radius))
        .with_style(args.style);

    session
        .load_image_file(&args.image, &mut canvas)
        .with_context(|| format!("load {}", args.image.display()))?;
    session.start(Instant::now())?;
    if let Some(kind) = args.spikes {
        session.generate_spikes(kind)?;
    }

    let mut pixels = Vec::new();
    let mut written = 0u32;
    for i in 0..args.ticks {
        let t = (u64::from(i) * u64::from(args.tick_ms)) as f32 / 1000.0;
        session.tick(t, &mut canvas);
        if (i + 1) % args.every == 0 {
            write_png(&canvas, &mut pixels, &frame_path(&args.out_dir, written))?;
            written += 1;
        }
    }

    if args.restore {
        session.stop(&mut canvas);
        write_png(&canvas, &mut pixels, &args.out_dir.join("restored.png"))?;
        written += 1;
    }
    Ok(written)
}

fn write_png(canvas: &Canvas, pixels: &mut Vec<u8>, path: &Path) -> Result<()> {
    canvas.rasterize(pixels);
    let img = image::RgbaImage::from_raw(canvas.width(), canvas.height(), pixels.clone())
        .context("canvas buffer does not match its size")?;
    img.save(path)
        .with_context(|| format!("write {}", path.display()))
}
