use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels_f32(self) -> [f32; 3] {
        [f32::from(self.r), f32::from(self.g), f32::from(self.b)]
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(px: image::Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        Self { r, g, b }
    }
}

/// Formats as a 24-bit hex fill string, e.g. `#ff8000`.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Axis-aligned rectangle in surface pixels. `x`/`y` may be fractional since
/// cells drift continuously.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl PixelRect {
    /// Rectangle covering a cell at grid position `(gx, gy)`.
    pub fn for_cell(gx: f32, gy: f32, cell_size: u32) -> Self {
        let s = cell_size as f32;
        Self {
            x: gx * s,
            y: gy * s,
            size: s,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemId(pub usize);

/// Drawing target owned by the front-end. The session only creates and
/// updates filled rectangles.
pub trait RenderSurface {
    /// Current drawable size in pixels, `None` when not realized yet.
    fn drawable_size(&self) -> Option<(u32, u32)>;
    /// Drops every item.
    fn clear(&mut self);
    fn create_rect(&mut self, rect: PixelRect, color: Rgb) -> ItemId;
    fn update_rect(&mut self, id: ItemId, rect: PixelRect, color: Rgb);
}

/// Retained-mode canvas: items are painted in creation order on every
/// rasterization, so moving a rectangle uncovers whatever lies beneath it.
pub struct Canvas {
    width: u32,
    height: u32,
    background: Rgb,
    items: Vec<(PixelRect, Rgb)>,
}

impl Canvas {
    /// Fill behind every item; the ascii renderer leaves it blank.
    pub const BACKGROUND: Rgb = Rgb::new(0, 0, 16);

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Self::BACKGROUND,
            items: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<(PixelRect, Rgb)> {
        self.items.get(id.0).copied()
    }

    /// Paints background and all items into a tightly packed RGBA buffer of
    /// `width * height * 4` bytes.
    pub fn rasterize(&self, out: &mut Vec<u8>) {
        let w = self.width as usize;
        let h = self.height as usize;
        out.clear();
        out.resize(w * h * 4, 255);
        let bg = self.background;
        for px in out.chunks_exact_mut(4) {
            px[0] = bg.r;
            px[1] = bg.g;
            px[2] = bg.b;
        }
        if w == 0 || h == 0 {
            return;
        }

        for (rect, color) in &self.items {
            let x0 = rect.x.max(0.0) as usize;
            let y0 = rect.y.max(0.0) as usize;
            let x1 = ((rect.x + rect.size).max(0.0) as usize).min(w);
            let y1 = ((rect.y + rect.size).max(0.0) as usize).min(h);
            for y in y0..y1 {
                let row = y * w;
                for x in x0..x1 {
                    let i = (row + x) * 4;
                    out[i] = color.r;
                    out[i + 1] = color.g;
                    out[i + 2] = color.b;
                }
            }
        }
    }
}

impl RenderSurface for Canvas {
    fn drawable_size(&self) -> Option<(u32, u32)> {
        (self.width > 1 && self.height > 1).then_some((self.width, self.height))
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    fn create_rect(&mut self, rect: PixelRect, color: Rgb) -> ItemId {
        self.items.push((rect, color));
        ItemId(self.items.len() - 1)
    }

    fn update_rect(&mut self, id: ItemId, rect: PixelRect, color: Rgb) {
        if let Some(item) = self.items.get_mut(id.0) {
            *item = (rect, color);
        }
    }
}
