use crate::render::{Frame, Renderer, frame_begin, frame_end, luma_u8};
use crate::surface::Canvas;
use std::io::Write;

const RAMP: &[u8] = b".,:;irsXA253hMHGS#9B&@";

/// One glyph per two canvas rows, so the canvas keeps the same geometry as
/// under the half-block renderer. Canvas background prints as a bare space.
pub struct AsciiRenderer {
    last_fg: Option<(u8, u8, u8)>,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self { last_fg: None }
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn pixel(rgba: &[u8], idx: usize) -> (u8, u8, u8) {
    (rgba[idx], rgba[idx + 1], rgba[idx + 2])
}

fn is_background(px: (u8, u8, u8)) -> bool {
    let bg = Canvas::BACKGROUND;
    px == (bg.r, bg.g, bg.b)
}

/// Averages the non-background pixels of a column pair.
fn blend(top: (u8, u8, u8), bottom: (u8, u8, u8)) -> Option<(u8, u8, u8)> {
    match (is_background(top), is_background(bottom)) {
        (true, true) => None,
        (false, true) => Some(top),
        (true, false) => Some(bottom),
        (false, false) => {
            let avg = |a: u8, b: u8| ((u16::from(a) + u16::from(b)) / 2) as u8;
            Some((avg(top.0, bottom.0), avg(top.1, bottom.1), avg(top.2, bottom.2)))
        }
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w)) = frame_begin(frame, 1, 2, out)? else {
            return Ok(());
        };
        self.last_fg = None;

        for y in 0..visual_rows {
            for x in 0..cols {
                let top = pixel(frame.pixels_rgba, (2 * y * w + x) * 4);
                let bottom = pixel(frame.pixels_rgba, ((2 * y + 1) * w + x) * 4);
                let Some(fg) = blend(top, bottom) else {
                    out.write_all(b" ")?;
                    continue;
                };
                let l = luma_u8(fg.0, fg.1, fg.2) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255];

                if self.last_fg != Some(fg) {
                    write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                out.write_all(&[ch])?;
            }
            out.write_all(b"\r\n")?;
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
