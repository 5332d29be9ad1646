use crate::surface::Rgb;
use clap::ValueEnum;

/// Color filters selectable at runtime. Every variant is a pure function of
/// `(color, x, y, t)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StyleFilter {
    #[default]
    Normal,
    #[value(alias = "van-gogh", alias = "swirl")]
    Painterly,
    #[value(alias = "pixel-art", alias = "posterize")]
    Quantize,
    #[value(alias = "cyberpunk", alias = "neon")]
    NeonPulse,
}

impl StyleFilter {
    pub const fn all() -> [Self; 4] {
        [Self::Normal, Self::Painterly, Self::Quantize, Self::NeonPulse]
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|&s| s == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|&s| s == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Painterly => "Van Gogh",
            Self::Quantize => "Pixel Art",
            Self::NeonPulse => "Cyberpunk",
        }
    }

    /// Returns unclamped channels; the compositor owns the final clamp.
    pub fn apply(self, color: Rgb, x: f32, y: f32, t: f32) -> [f32; 3] {
        let [r, g, b] = color.channels_f32();
        match self {
            Self::Normal => [r, g, b],
            Self::Painterly => {
                let swirl = (x * 0.05 + y * 0.03 + t * 2.0).sin() * 80.0;
                [
                    (r + swirl * 0.8).rem_euclid(256.0).trunc(),
                    (g + swirl * 0.6).rem_euclid(256.0).trunc(),
                    (b + swirl * 0.4).rem_euclid(256.0).trunc(),
                ]
            }
            Self::Quantize => [
                f32::from(color.r / 32 * 32),
                f32::from(color.g / 32 * 32),
                f32::from(color.b / 32 * 32),
            ],
            Self::NeonPulse => {
                let pulse = ((t * 4.0 + x * 0.02).sin() + 1.0) * 0.5;
                [
                    (r * 0.2 + 255.0 * pulse * 0.8).trunc(),
                    (g * 0.3 + 100.0 * pulse * 0.5).trunc(),
                    (b * 0.1 + 255.0 * pulse * 0.9).trunc(),
                ]
            }
        }
    }
}
