use crate::surface::{ItemId, Rgb};
use image::RgbImage;
use image::imageops::FilterType;

/// Drawable area assumed when the surface has not been realized yet.
pub const FALLBACK_AREA: (u32, u32) = (800, 600);
pub const MIN_CELL_SIZE: u32 = 2;
pub const MAX_CELL_SIZE: u32 = 8;
pub const MIN_BATCH: usize = 50;
pub const MAX_BATCH: usize = 500;

/// Source image resampled to one pixel per cell.
#[derive(Clone, Debug)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    cell_size: u32,
    colors: Vec<Rgb>,
}

impl PixelGrid {
    /// Resamples `source` so that each grid cell covers `cell_size` pixels of
    /// the drawable `area`.
    pub fn from_image(source: &RgbImage, area: (u32, u32), cell_size: Option<u32>) -> Self {
        let cell_size = cell_size
            .unwrap_or_else(|| cell_size_for_width(area.0))
            .max(1);
        let width = (area.0 / cell_size).max(1);
        let height = (area.1 / cell_size).max(1);
        let resized = image::imageops::resize(source, width, height, FilterType::Triangle);
        let colors = resized.pixels().map(|px| Rgb::from(*px)).collect();
        Self {
            width,
            height,
            cell_size,
            colors,
        }
    }

    /// Builds a grid directly from row-major colors.
    pub fn from_colors(width: u32, height: u32, cell_size: u32, colors: Vec<Rgb>) -> Option<Self> {
        if width == 0 || height == 0 || colors.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            cell_size: cell_size.max(1),
            colors,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.colors.len()
    }

    pub fn color(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.colors.get((y * self.width + x) as usize).copied()
    }

    /// Color under a floating position, wrapped into the grid. Fails on
    /// non-finite coordinates.
    pub fn sample(&self, x: f32, y: f32) -> Option<Rgb> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let xi = (x as i64).rem_euclid(i64::from(self.width));
        let yi = (y as i64).rem_euclid(i64::from(self.height));
        self.color(u32::try_from(xi).ok()?, u32::try_from(yi).ok()?)
    }

    /// Cells processed per tick.
    pub fn batch_size(&self) -> usize {
        batch_size_for(self.cell_count())
    }
}

pub fn cell_size_for_width(width: u32) -> u32 {
    (width / 150).clamp(MIN_CELL_SIZE, MAX_CELL_SIZE)
}

pub fn batch_size_for(cell_count: usize) -> usize {
    (cell_count / 200).clamp(MIN_BATCH, MAX_BATCH)
}

/// One dispersed pixel. `origin` is its identity and never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub origin: (u32, u32),
    pub pos: (f32, f32),
    pub vel: (f32, f32),
    pub item: ItemId,
}

impl Cell {
    pub fn new(origin: (u32, u32), vel: (f32, f32), item: ItemId) -> Self {
        Self {
            origin,
            pos: (origin.0 as f32, origin.1 as f32),
            vel,
            item,
        }
    }

    /// Moves by a tenth of the velocity, wrapping into `w x h`.
    pub fn advance(&mut self, w: u32, h: u32) {
        let x = (self.pos.0 + self.vel.0 * 0.1).rem_euclid(w as f32);
        let y = (self.pos.1 + self.vel.1 * 0.1).rem_euclid(h as f32);
        self.pos = (x, y);
    }

    pub fn reset(&mut self) {
        self.pos = (self.origin.0 as f32, self.origin.1 as f32);
    }
}
