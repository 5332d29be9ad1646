use crate::compositor;
use crate::emitter::{EmitterKind, EmitterSet, ShootingRespawn, SpikeParams};
use crate::grid::{Cell, FALLBACK_AREA, PixelGrid};
use crate::style::StyleFilter;
use crate::surface::{PixelRect, RenderSurface};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// Frames between periodic status refreshes.
const STATUS_EVERY: u64 = 30;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to load image {}: {source}", path.display())]
    ImageOpen {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Unsupported image format: {} (expected jpg, jpeg, png, bmp or gif)", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Please load an image first!")]
    NoImage,
    #[error("Please start animation first!")]
    NotRunning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn title(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

impl SessionError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ImageOpen { .. } | Self::UnsupportedFormat { .. } => Severity::Error,
            Self::NoImage => Severity::Warning,
            Self::NotRunning => Severity::Info,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Running,
}

/// What one call to [`Session::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub frame: u64,
    pub drawn: usize,
    pub skipped: usize,
    pub emitters: usize,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// All animation state, independent of any UI toolkit. The caller owns the
/// timer and drives it through [`Session::tick`].
pub struct Session {
    grid: Option<PixelGrid>,
    cells: Vec<Cell>,
    emitters: EmitterSet,
    style: StyleFilter,
    params: SpikeParams,
    state: AnimationState,
    started_at: Option<Instant>,
    frame: u64,
    cursor: usize,
    batch_size: usize,
    cell_size: Option<u32>,
    status: String,
    rng: fastrand::Rng,
}

impl Session {
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            grid: None,
            cells: Vec::new(),
            emitters: EmitterSet::new(ShootingRespawn::default()),
            style: StyleFilter::Normal,
            params: SpikeParams::default(),
            state: AnimationState::Idle,
            started_at: None,
            frame: 0,
            cursor: 0,
            batch_size: 0,
            cell_size: None,
            status: "Ready - Upload image to start".to_string(),
            rng,
        }
    }

    /// Fixes the cell edge length instead of deriving it from the surface.
    pub fn with_cell_size(mut self, cell_size: Option<u32>) -> Self {
        self.cell_size = cell_size.filter(|&s| s > 0);
        self
    }

    pub fn with_respawn(mut self, respawn: ShootingRespawn) -> Self {
        self.emitters.set_respawn(respawn);
        self
    }

    pub fn with_params(mut self, params: SpikeParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_style(mut self, style: StyleFilter) -> Self {
        self.style = style;
        self
    }

    pub fn load_image_file(
        &mut self,
        path: &Path,
        surface: &mut dyn RenderSurface,
    ) -> Result<(), SessionError> {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)));
        if !supported {
            return Err(SessionError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let image = image::open(path)
            .map_err(|source| SessionError::ImageOpen {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        self.load_image(&image, surface);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.status = format!("Loaded: {name}");
        log::info!("loaded {} ({}x{})", path.display(), image.width(), image.height());
        Ok(())
    }

    /// Resamples `image` to the surface and disperses it into cells.
    pub fn load_image(&mut self, image: &RgbImage, surface: &mut dyn RenderSurface) {
        let area = surface.drawable_size().unwrap_or(FALLBACK_AREA);
        let grid = PixelGrid::from_image(image, area, self.cell_size);
        self.load_grid(grid, surface);
    }

    /// Replaces all grid and cell state. A running animation keeps running
    /// and its next tick starts over on the new cells.
    pub fn load_grid(&mut self, grid: PixelGrid, surface: &mut dyn RenderSurface) {
        if self.state == AnimationState::Running {
            log::info!("image replaced while animation is running");
        }
        surface.clear();

        let size = grid.cell_size();
        let mut cells = Vec::with_capacity(grid.cell_count());
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let vel = (self.rng.f32() * 2.0 - 1.0, self.rng.f32() * 2.0 - 1.0);
                let color = grid.color(x, y).unwrap_or_default();
                let item = surface.create_rect(PixelRect::for_cell(x as f32, y as f32, size), color);
                cells.push(Cell::new((x, y), vel, item));
            }
        }

        self.cells = cells;
        self.cursor = 0;
        self.frame = 0;
        self.batch_size = grid.batch_size();
        log::info!(
            "grid {}x{} (cell {}px), {} cells, {} per frame",
            grid.width(),
            grid.height(),
            size,
            self.cells.len(),
            self.batch_size
        );
        self.status = format!("{} pixels ready", self.cells.len());
        self.grid = Some(grid);
    }

    pub fn start(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.cells.is_empty() {
            return Err(SessionError::NoImage);
        }
        self.state = AnimationState::Running;
        self.started_at = Some(now);
        self.frame = 0;
        self.status = "Animation started".to_string();
        log::info!("animation started");
        Ok(())
    }

    /// Halts the animation and puts every cell back where it was loaded,
    /// in its unfiltered source color.
    pub fn stop(&mut self, surface: &mut dyn RenderSurface) {
        self.state = AnimationState::Idle;
        self.status = "Animation stopped".to_string();
        let Some(grid) = &self.grid else {
            return;
        };

        let size = grid.cell_size();
        for cell in &mut self.cells {
            cell.reset();
            let Some(color) = grid.color(cell.origin.0, cell.origin.1) else {
                continue;
            };
            surface.update_rect(cell.item, PixelRect::for_cell(cell.pos.0, cell.pos.1, size), color);
        }
        log::info!("animation stopped after {} frames; {} cells restored", self.frame, self.cells.len());
    }

    /// Seconds since the last start, zero while idle.
    pub fn elapsed(&self, now: Instant) -> f32 {
        match (self.state, self.started_at) {
            (AnimationState::Running, Some(t0)) => now.saturating_duration_since(t0).as_secs_f32(),
            _ => 0.0,
        }
    }

    /// Advances spikes and one batch of cells. `t` is seconds since start.
    pub fn tick(&mut self, t: f32, surface: &mut dyn RenderSurface) -> TickReport {
        if self.state != AnimationState::Running {
            return TickReport::default();
        }
        let Some(grid) = &self.grid else {
            return TickReport::default();
        };
        let dims = (grid.width(), grid.height());
        let size = grid.cell_size();

        self.emitters.advance(dims, &mut self.rng);
        let emitters = self.emitters.emitters();

        let mut report = TickReport {
            emitters: emitters.len(),
            ..TickReport::default()
        };
        if !self.cells.is_empty() {
            for _ in 0..self.batch_size {
                if self.cursor >= self.cells.len() {
                    self.cursor = 0;
                }
                let cell = &mut self.cells[self.cursor];
                self.cursor += 1;

                let (x, y) = cell.pos;
                let Some(source) = grid.sample(x, y) else {
                    report.skipped += 1;
                    continue;
                };
                let filtered = self.style.apply(source, x, y, t);
                let color = compositor::shade(filtered, emitters, x, y);
                surface.update_rect(cell.item, PixelRect::for_cell(x, y, size), color);
                cell.advance(dims.0, dims.1);
                report.drawn += 1;
            }
            if self.cursor >= self.cells.len() {
                self.cursor = 0;
            }
        }
        if report.skipped > 0 {
            log::warn!("skipped {} cells with unreadable positions", report.skipped);
        }

        self.frame += 1;
        report.frame = self.frame;
        if self.frame % STATUS_EVERY == 0 {
            let spikes = if self.emitters.is_empty() {
                "no spikes".to_string()
            } else {
                format!("{} spikes", self.emitters.len())
            };
            self.status = format!("Frame {} | Style: {} | {}", self.frame, self.style.label(), spikes);
        }
        report
    }

    /// Replaces the spike set with six fresh spikes of `kind`.
    pub fn generate_spikes(&mut self, kind: EmitterKind) -> Result<(), SessionError> {
        if self.state != AnimationState::Running {
            return Err(SessionError::NotRunning);
        }
        let Some(grid) = &self.grid else {
            return Err(SessionError::NoImage);
        };
        let dims = (grid.width(), grid.height());
        self.emitters.generate(kind, self.params, dims, &mut self.rng);
        self.status = format!("{} - {} spikes", kind.label(), self.emitters.len());
        Ok(())
    }

    pub fn clear_spikes(&mut self) {
        self.emitters.clear();
        self.status = "Spikes cleared".to_string();
    }

    pub fn set_style(&mut self, style: StyleFilter) {
        self.style = style;
        self.status = format!("Style: {}", style.label());
        log::debug!("style -> {}", style.label());
    }

    pub fn style(&self) -> StyleFilter {
        self.style
    }

    pub fn params(&self) -> SpikeParams {
        self.params
    }

    /// Slider changes only affect spikes generated afterwards.
    pub fn params_mut(&mut self) -> &mut SpikeParams {
        &mut self.params
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AnimationState::Running
    }

    pub fn grid(&self) -> Option<&PixelGrid> {
        self.grid.as_ref()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn emitters(&self) -> &EmitterSet {
        &self.emitters
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Canvas, Rgb};

    fn small_session() -> (Session, Canvas) {
        let mut canvas = Canvas::new(40, 40);
        let mut s = Session::new(fastrand::Rng::with_seed(7));
        let colors = (0..16).map(|i| Rgb::new(i * 10, 0, 0)).collect();
        let grid = PixelGrid::from_colors(4, 4, 10, colors).expect("grid");
        s.load_grid(grid, &mut canvas);
        (s, canvas)
    }

    #[test]
    fn tick_is_noop_while_idle() {
        let (mut s, mut canvas) = small_session();
        assert!(s.tick(0.5, &mut canvas).is_idle());
        assert_eq!(s.frame(), 0);
    }

    #[test]
    fn start_requires_image() {
        let mut s = Session::new(fastrand::Rng::with_seed(1));
        let err = s.start(Instant::now()).expect_err("no grid loaded");
        assert!(matches!(err, SessionError::NoImage));
        assert_eq!(s.state(), AnimationState::Idle);
    }

    #[test]
    fn small_grid_batch_wraps_repeatedly() {
        let (mut s, mut canvas) = small_session();
        s.start(Instant::now()).expect("start");
        let report = s.tick(0.0, &mut canvas);
        assert_eq!(report.drawn, 50);
        assert_eq!(s.cursor(), 50 % 16);
    }

    #[test]
    fn loading_while_running_keeps_animating_new_cells() {
        let (mut s, mut canvas) = small_session();
        s.start(Instant::now()).expect("start");
        s.tick(0.0, &mut canvas);
        assert_ne!(s.cursor(), 0);

        let grid = PixelGrid::from_colors(2, 2, 10, vec![Rgb::default(); 4]).expect("grid");
        s.load_grid(grid, &mut canvas);
        assert_eq!(s.state(), AnimationState::Running);
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.batch_size(), 50);
        assert_eq!(s.cells().len(), 4);
        assert_eq!(canvas.len(), 4);

        let report = s.tick(0.1, &mut canvas);
        assert!(report.drawn > 0);
        assert_eq!(s.frame(), 1);
    }

    #[test]
    fn unsupported_extension_is_rejected_before_io() {
        let mut s = Session::new(fastrand::Rng::with_seed(1));
        let mut canvas = Canvas::new(10, 10);
        let err = s
            .load_image_file(Path::new("/definitely/missing.tiff"), &mut canvas)
            .expect_err("tiff is not accepted");
        assert!(matches!(err, SessionError::UnsupportedFormat { .. }));
        assert_eq!(err.severity(), Severity::Error);
    }
}
