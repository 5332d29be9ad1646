use crate::emitter::Emitter;
use crate::surface::Rgb;
use std::f32::consts::FRAC_PI_2;

/// Peak per-channel offset a single spike can add at full strength.
pub const SPIKE_AMPLITUDE: f32 = 60.0;

/// Linear falloff: `intensity` at the emitter, zero at and beyond `radius`.
pub fn falloff_strength(distance: f32, radius: f32, intensity: f32) -> f32 {
    if distance.is_nan() || distance >= radius {
        return 0.0;
    }
    (1.0 - distance / radius) * intensity
}

/// Summed color offsets from every emitter covering `(x, y)`.
pub fn influence(emitters: &[Emitter], x: f32, y: f32) -> [f32; 3] {
    let mut acc = [0.0f32; 3];
    for e in emitters {
        let dx = x - e.pos.0;
        let dy = y - e.pos.1;
        let distance = (dx * dx + dy * dy).sqrt();
        let strength = falloff_strength(distance, e.effect_radius, e.intensity);
        if strength == 0.0 {
            continue;
        }
        let phase = e.color_phase;
        acc[0] += phase.sin() * SPIKE_AMPLITUDE * strength;
        acc[1] += phase.cos() * SPIKE_AMPLITUDE * strength;
        acc[2] += (phase + FRAC_PI_2).sin() * SPIKE_AMPLITUDE * strength;
    }
    acc
}

/// Adds offsets to filtered channels, then clamps and truncates to 8 bits.
pub fn compose(filtered: [f32; 3], offsets: [f32; 3]) -> Rgb {
    let ch = |i: usize| {
        let v = filtered[i] + offsets[i];
        // NaN collapses to 0 rather than poisoning the cast.
        if v.is_nan() { 0 } else { v.clamp(0.0, 255.0) as u8 }
    };
    Rgb::new(ch(0), ch(1), ch(2))
}

/// Filtered color plus spike influence for a cell at `(x, y)`.
pub fn shade(filtered: [f32; 3], emitters: &[Emitter], x: f32, y: f32) -> Rgb {
    if emitters.is_empty() {
        return compose(filtered, [0.0; 3]);
    }
    compose(filtered, influence(emitters, x, y))
}
