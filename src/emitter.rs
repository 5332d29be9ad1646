use clap::ValueEnum;
use std::f32::consts::{PI, TAU};

pub const SPIKES_PER_SET: usize = 6;

/// Margin beyond the grid a shooting spike may travel before respawning.
const SHOOTING_MARGIN: f32 = 100.0;
const SPAWN_RING: (f32, f32) = (50.0, 150.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmitterKind {
    Spiral,
    Shooting,
    Orbit,
    Bounce,
}

impl EmitterKind {
    pub const fn all() -> [Self; 4] {
        [Self::Spiral, Self::Shooting, Self::Orbit, Self::Bounce]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Spiral => "Spiral",
            Self::Shooting => "Shooting Stars",
            Self::Orbit => "Orbit",
            Self::Bounce => "Bouncing",
        }
    }

    fn phase_rate(self) -> f32 {
        match self {
            Self::Spiral => 0.02,
            Self::Shooting => 0.04,
            Self::Orbit => 0.015,
            Self::Bounce => 0.02,
        }
    }
}

/// What a shooting spike does with its heading when it respawns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ShootingRespawn {
    /// Keep the heading assigned at creation.
    #[default]
    Keep,
    /// Point the spike back at the grid center.
    #[value(alias = "aim-at-center")]
    Aim,
}

/// Slider values sampled when a set is generated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpikeParams {
    pub intensity: f32,
    pub radius: f32,
}

impl SpikeParams {
    pub const INTENSITY_RANGE: (f32, f32) = (0.1, 2.0);
    pub const RADIUS_RANGE: (f32, f32) = (10.0, 200.0);
    pub const INTENSITY_STEP: f32 = 0.1;
    pub const RADIUS_STEP: f32 = 10.0;

    pub fn new(intensity: f32, radius: f32) -> Self {
        let mut p = Self {
            intensity: Self::INTENSITY_RANGE.0,
            radius: Self::RADIUS_RANGE.0,
        };
        p.set_intensity(intensity);
        p.set_radius(radius);
        p
    }

    /// Snaps to the 0.1 slider step inside 0.1..=2.0.
    pub fn set_intensity(&mut self, v: f32) {
        let (lo, hi) = Self::INTENSITY_RANGE;
        self.intensity = ((v.clamp(lo, hi) / Self::INTENSITY_STEP).round() * Self::INTENSITY_STEP)
            .clamp(lo, hi);
    }

    /// Snaps to the 10px slider step inside 10..=200.
    pub fn set_radius(&mut self, v: f32) {
        let (lo, hi) = Self::RADIUS_RANGE;
        self.radius = (v.clamp(lo, hi) / Self::RADIUS_STEP).round() * Self::RADIUS_STEP;
    }

    pub fn nudge_intensity(&mut self, steps: i32) {
        self.set_intensity(self.intensity + steps as f32 * Self::INTENSITY_STEP);
    }

    pub fn nudge_radius(&mut self, steps: i32) {
        self.set_radius(self.radius + steps as f32 * Self::RADIUS_STEP);
    }
}

impl Default for SpikeParams {
    fn default() -> Self {
        Self::new(0.5, 50.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Spiral { angle: f32, radius: f32, speed: f32 },
    Shooting { dir: (f32, f32), speed: f32 },
    Orbit { radius: f32, angle: f32, speed: f32 },
    Bounce { dir: (f32, f32), speed: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Emitter {
    pub pos: (f32, f32),
    pub motion: Motion,
    pub color_phase: f32,
    pub intensity: f32,
    pub effect_radius: f32,
}

impl Emitter {
    pub fn kind(&self) -> EmitterKind {
        match self.motion {
            Motion::Spiral { .. } => EmitterKind::Spiral,
            Motion::Shooting { .. } => EmitterKind::Shooting,
            Motion::Orbit { .. } => EmitterKind::Orbit,
            Motion::Bounce { .. } => EmitterKind::Bounce,
        }
    }

    fn spiral(index: usize, center: (f32, f32), params: SpikeParams) -> Self {
        let phase = fraction_of_turn(index);
        Self {
            pos: center,
            motion: Motion::Spiral {
                angle: phase,
                radius: 20.0,
                speed: 0.5,
            },
            color_phase: phase,
            intensity: params.intensity,
            effect_radius: params.radius,
        }
    }

    fn shooting(center: (f32, f32), params: SpikeParams, rng: &mut fastrand::Rng) -> Self {
        let pos = ring_point(center, rng);
        Self {
            pos,
            motion: Motion::Shooting {
                dir: heading_towards(pos, center),
                speed: 1.0,
            },
            color_phase: rng.f32() * TAU,
            intensity: params.intensity * 1.2,
            effect_radius: params.radius * 0.6,
        }
    }

    fn orbit(index: usize, center: (f32, f32), params: SpikeParams) -> Self {
        let radius = 60.0 + 10.0 * index as f32;
        let phase = fraction_of_turn(index);
        Self {
            pos: (center.0 + radius, center.1),
            motion: Motion::Orbit {
                radius,
                angle: phase,
                speed: 0.2,
            },
            color_phase: phase,
            intensity: params.intensity,
            effect_radius: params.radius * 0.6,
        }
    }

    fn bounce(center: (f32, f32), w: f32, h: f32, params: SpikeParams, rng: &mut fastrand::Rng) -> Self {
        let angle = rng.f32() * TAU;
        Self {
            pos: (
                uniform_or(rng, 50.0, w - 50.0, center.0),
                uniform_or(rng, 50.0, h - 50.0, center.1),
            ),
            motion: Motion::Bounce {
                dir: (angle.cos(), angle.sin()),
                speed: 0.8,
            },
            color_phase: rng.f32() * TAU,
            intensity: params.intensity,
            effect_radius: params.radius * 0.5,
        }
    }

    /// One frame of motion inside a `w x h` grid.
    pub fn advance(&mut self, w: f32, h: f32, respawn: ShootingRespawn, rng: &mut fastrand::Rng) {
        let center = grid_center(w, h);
        self.color_phase += self.kind().phase_rate();
        match &mut self.motion {
            Motion::Spiral { angle, radius, speed } => {
                *radius += *speed * 0.8;
                *angle += 0.05;
                self.pos = (
                    center.0 + angle.cos() * *radius,
                    center.1 + angle.sin() * *radius,
                );
            }
            Motion::Shooting { dir, speed } => {
                self.pos.0 += dir.0 * *speed * 2.0;
                self.pos.1 += dir.1 * *speed * 2.0;
                let (x, y) = self.pos;
                if x < -SHOOTING_MARGIN
                    || x > w + SHOOTING_MARGIN
                    || y < -SHOOTING_MARGIN
                    || y > h + SHOOTING_MARGIN
                {
                    self.pos = ring_point(center, rng);
                    if respawn == ShootingRespawn::Aim {
                        *dir = heading_towards(self.pos, center);
                    }
                }
            }
            Motion::Orbit { radius, angle, speed } => {
                *angle += *speed;
                self.pos = (
                    center.0 + angle.cos() * *radius,
                    center.1 + angle.sin() * *radius,
                );
            }
            Motion::Bounce { dir, speed } => {
                self.pos.0 += dir.0 * *speed;
                self.pos.1 += dir.1 * *speed;
                if self.pos.0 <= 0.0 || self.pos.0 >= w {
                    dir.0 = -dir.0;
                }
                if self.pos.1 <= 0.0 || self.pos.1 >= h {
                    dir.1 = -dir.1;
                }
            }
        }
    }
}

/// The live spikes. Generating always replaces the whole set.
#[derive(Clone, Debug, Default)]
pub struct EmitterSet {
    emitters: Vec<Emitter>,
    kind: Option<EmitterKind>,
    respawn: ShootingRespawn,
}

impl EmitterSet {
    pub fn new(respawn: ShootingRespawn) -> Self {
        Self {
            emitters: Vec::new(),
            kind: None,
            respawn,
        }
    }

    /// Builds a set from explicit emitters, mostly for tests and replays.
    pub fn from_emitters(emitters: Vec<Emitter>) -> Self {
        let kind = emitters.first().map(Emitter::kind);
        Self {
            emitters,
            kind,
            respawn: ShootingRespawn::default(),
        }
    }

    pub fn generate(
        &mut self,
        kind: EmitterKind,
        params: SpikeParams,
        grid: (u32, u32),
        rng: &mut fastrand::Rng,
    ) {
        let (w, h) = (grid.0 as f32, grid.1 as f32);
        let center = grid_center(w, h);
        self.emitters = (0..SPIKES_PER_SET)
            .map(|i| match kind {
                EmitterKind::Spiral => Emitter::spiral(i, center, params),
                EmitterKind::Shooting => Emitter::shooting(center, params, rng),
                EmitterKind::Orbit => Emitter::orbit(i, center, params),
                EmitterKind::Bounce => Emitter::bounce(center, w, h, params, rng),
            })
            .collect();
        self.kind = Some(kind);
        log::debug!(
            "generated {} {:?} spikes (intensity {:.1}, radius {:.0})",
            self.emitters.len(),
            kind,
            params.intensity,
            params.radius
        );
    }

    pub fn advance(&mut self, grid: (u32, u32), rng: &mut fastrand::Rng) {
        let (w, h) = (grid.0 as f32, grid.1 as f32);
        for e in &mut self.emitters {
            e.advance(w, h, self.respawn, rng);
        }
    }

    pub fn clear(&mut self) {
        self.emitters.clear();
        self.kind = None;
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn kind(&self) -> Option<EmitterKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    pub fn respawn(&self) -> ShootingRespawn {
        self.respawn
    }

    pub fn set_respawn(&mut self, respawn: ShootingRespawn) {
        self.respawn = respawn;
    }
}

/// Center with integer halving, matching how the grid is addressed.
fn grid_center(w: f32, h: f32) -> (f32, f32) {
    ((w / 2.0).floor(), (h / 2.0).floor())
}

fn fraction_of_turn(index: usize) -> f32 {
    index as f32 / SPIKES_PER_SET as f32 * 2.0 * PI
}

fn ring_point(center: (f32, f32), rng: &mut fastrand::Rng) -> (f32, f32) {
    let angle = rng.f32() * TAU;
    let dist = SPAWN_RING.0 + rng.f32() * (SPAWN_RING.1 - SPAWN_RING.0);
    (center.0 + angle.cos() * dist, center.1 + angle.sin() * dist)
}

fn heading_towards(from: (f32, f32), to: (f32, f32)) -> (f32, f32) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 { (dx / len, dy / len) } else { (0.0, 0.0) }
}

fn uniform_or(rng: &mut fastrand::Rng, lo: f32, hi: f32, fallback: f32) -> f32 {
    if hi > lo { lo + rng.f32() * (hi - lo) } else { fallback }
}
