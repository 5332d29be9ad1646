use std::collections::HashSet;
use std::time::Instant;

use spike_art::compositor::{compose, falloff_strength, influence, shade};
use spike_art::emitter::{
    Emitter, EmitterKind, EmitterSet, Motion, SPIKES_PER_SET, ShootingRespawn, SpikeParams,
};
use spike_art::grid::PixelGrid;
use spike_art::session::{AnimationState, Session, SessionError};
use spike_art::style::StyleFilter;
use spike_art::surface::{Canvas, ItemId, PixelRect, RenderSurface, Rgb};

/// Surface that remembers which items were touched, in order.
#[derive(Default)]
struct RecordingSurface {
    items: Vec<(PixelRect, Rgb)>,
    updates: Vec<ItemId>,
}

impl RenderSurface for RecordingSurface {
    fn drawable_size(&self) -> Option<(u32, u32)> {
        Some((100, 100))
    }

    fn clear(&mut self) {
        self.items.clear();
        self.updates.clear();
    }

    fn create_rect(&mut self, rect: PixelRect, color: Rgb) -> ItemId {
        self.items.push((rect, color));
        ItemId(self.items.len() - 1)
    }

    fn update_rect(&mut self, id: ItemId, rect: PixelRect, color: Rgb) {
        self.items[id.0] = (rect, color);
        self.updates.push(id);
    }
}

fn gradient_grid(w: u32, h: u32) -> PixelGrid {
    let mut colors = Vec::new();
    for y in 0..h {
        for x in 0..w {
            colors.push(Rgb::new((x * 20) as u8, (y * 20) as u8, 128));
        }
    }
    PixelGrid::from_colors(w, h, 10, colors).expect("valid grid")
}

fn spike(pos: (f32, f32), phase: f32, intensity: f32, radius: f32) -> Emitter {
    Emitter {
        pos,
        motion: Motion::Bounce {
            dir: (1.0, 0.0),
            speed: 0.8,
        },
        color_phase: phase,
        intensity,
        effect_radius: radius,
    }
}

#[test]
fn filters_are_pure() {
    let mut rng = fastrand::Rng::with_seed(42);
    for style in StyleFilter::all() {
        for _ in 0..200 {
            let c = Rgb::new(rng.u8(..), rng.u8(..), rng.u8(..));
            let x = rng.f32() * 300.0;
            let y = rng.f32() * 300.0;
            let t = rng.f32() * 60.0;
            assert_eq!(style.apply(c, x, y, t), style.apply(c, x, y, t), "{style:?}");
        }
    }
}

#[test]
fn quantize_posterizes_every_channel_value() {
    for v in 0..=255u8 {
        let out = StyleFilter::Quantize.apply(Rgb::new(v, v, v), 1.0, 2.0, 3.0);
        let expected = f32::from(32 * (v / 32));
        assert_eq!(out, [expected; 3]);
        assert!(expected <= 224.0 && expected as u32 % 32 == 0);
    }
}

#[test]
fn neon_pulse_is_left_unclamped_for_the_compositor() {
    // pulse == 1 at t such that 4t = pi/2 and x = 0.
    let t = std::f32::consts::FRAC_PI_2 / 4.0;
    let out = StyleFilter::NeonPulse.apply(Rgb::new(255, 255, 255), 0.0, 0.0, t);
    assert!((254.0..=255.0).contains(&out[0]), "{out:?}");
    assert!((125.0..=127.0).contains(&out[1]), "{out:?}");
    assert_eq!(compose(out, [500.0, 0.0, 0.0]).r, 255);
}

#[test]
fn composed_channels_stay_in_range() {
    let mut rng = fastrand::Rng::with_seed(9);
    for _ in 0..500 {
        let n = rng.usize(0..12);
        let emitters: Vec<Emitter> = (0..n)
            .map(|_| {
                spike(
                    (rng.f32() * 50.0, rng.f32() * 50.0),
                    rng.f32() * 20.0 - 10.0,
                    rng.f32() * 2.4,
                    rng.f32() * 240.0,
                )
            })
            .collect();
        let filtered = [
            rng.f32() * 600.0 - 300.0,
            rng.f32() * 600.0 - 300.0,
            rng.f32() * 600.0 - 300.0,
        ];
        let (x, y) = (rng.f32() * 50.0, rng.f32() * 50.0);
        let offsets = influence(&emitters, x, y);
        let got = shade(filtered, &emitters, x, y);
        let expect = |i: usize| (filtered[i] + offsets[i]).clamp(0.0, 255.0) as u8;
        assert_eq!(got, Rgb::new(expect(0), expect(1), expect(2)));
    }
    assert_eq!(compose([300.0, -20.0, 12.9], [0.0; 3]), Rgb::new(255, 0, 12));
}

#[test]
fn falloff_decreases_to_zero_at_radius() {
    let radius = 37.0;
    let mut prev = falloff_strength(0.0, radius, 1.3);
    assert!((prev - 1.3).abs() < 1e-6);
    let mut d = 0.5;
    while d < radius {
        let s = falloff_strength(d, radius, 1.3);
        assert!(s <= prev, "strength rose at {d}");
        assert!(s > 0.0);
        prev = s;
        d += 0.5;
    }
    assert_eq!(falloff_strength(radius, radius, 1.3), 0.0);
    assert_eq!(falloff_strength(radius + 0.01, radius, 1.3), 0.0);
    assert_eq!(falloff_strength(1000.0, radius, 1.3), 0.0);
}

#[test]
fn influence_at_half_radius_matches_reference_offsets() {
    let e = [spike((50.0, 50.0), 0.0, 1.0, 20.0)];
    assert!((falloff_strength(10.0, 20.0, 1.0) - 0.5).abs() < 1e-6);
    let [r, g, b] = influence(&e, 60.0, 50.0);
    assert!(r.abs() < 1e-4, "red {r}");
    assert!((g - 30.0).abs() < 1e-4, "green {g}");
    assert!((b - 30.0).abs() < 1e-4, "blue {b}");
}

#[test]
fn no_emitters_is_passthrough() {
    assert_eq!(shade([12.0, 34.0, 56.0], &[], 5.0, 5.0), Rgb::new(12, 34, 56));
}

#[test]
fn bounce_flips_x_once_wall_is_reached() {
    let mut set = EmitterSet::from_emitters(vec![Emitter {
        pos: (-0.5, 40.0),
        motion: Motion::Bounce {
            dir: (-0.6, 0.8),
            speed: 0.8,
        },
        color_phase: 0.0,
        intensity: 1.0,
        effect_radius: 10.0,
    }]);
    let mut rng = fastrand::Rng::with_seed(3);
    set.advance((100, 100), &mut rng);
    let e = &set.emitters()[0];
    assert_eq!(
        e.motion,
        Motion::Bounce {
            dir: (0.6, 0.8),
            speed: 0.8
        }
    );
    assert!((e.color_phase - 0.02).abs() < 1e-6);
}

#[test]
fn shooting_respawn_keeps_heading_by_default() {
    let mut set = EmitterSet::from_emitters(vec![Emitter {
        pos: (199.5, 50.0),
        motion: Motion::Shooting {
            dir: (1.0, 0.0),
            speed: 1.0,
        },
        color_phase: 0.0,
        intensity: 1.0,
        effect_radius: 10.0,
    }]);
    assert_eq!(set.respawn(), ShootingRespawn::Keep);
    let mut rng = fastrand::Rng::with_seed(5);
    set.advance((100, 100), &mut rng);
    let e = &set.emitters()[0];
    let d = ((e.pos.0 - 50.0).powi(2) + (e.pos.1 - 50.0).powi(2)).sqrt();
    assert!((50.0..=150.0).contains(&d), "respawned {d} from center");
    assert_eq!(
        e.motion,
        Motion::Shooting {
            dir: (1.0, 0.0),
            speed: 1.0
        }
    );
}

#[test]
fn generated_sets_follow_kind_rules() {
    let mut rng = fastrand::Rng::with_seed(8);
    let params = SpikeParams::new(1.0, 100.0);
    let mut set = EmitterSet::new(ShootingRespawn::Keep);

    set.generate(EmitterKind::Shooting, params, (300, 200), &mut rng);
    assert_eq!(set.len(), SPIKES_PER_SET);
    for e in set.emitters() {
        assert!((e.intensity - 1.2).abs() < 1e-5);
        assert!((e.effect_radius - 60.0).abs() < 1e-4);
        let Motion::Shooting { dir, .. } = e.motion else {
            panic!("expected shooting");
        };
        // Unit heading pointing at the center.
        assert!(((dir.0 * dir.0 + dir.1 * dir.1).sqrt() - 1.0).abs() < 1e-4);
        let to_center = (150.0 - e.pos.0, 100.0 - e.pos.1);
        assert!(dir.0 * to_center.0 + dir.1 * to_center.1 > 0.0);
    }

    set.generate(EmitterKind::Bounce, params, (300, 200), &mut rng);
    assert_eq!(set.kind(), Some(EmitterKind::Bounce));
    assert_eq!(set.len(), SPIKES_PER_SET);
    for e in set.emitters() {
        assert!((50.0..250.0).contains(&e.pos.0) && (50.0..150.0).contains(&e.pos.1));
        assert!((e.effect_radius - 50.0).abs() < 1e-4);
    }

    set.generate(EmitterKind::Orbit, params, (300, 200), &mut rng);
    assert_eq!(set.emitters()[0].pos, (210.0, 100.0));
    assert_eq!(set.emitters()[5].pos, (260.0, 100.0));

    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.kind(), None);
}

#[test]
fn spikes_require_running_animation() {
    let mut surface = RecordingSurface::default();
    let mut s = Session::new(fastrand::Rng::with_seed(1));
    s.load_grid(gradient_grid(10, 10), &mut surface);

    let err = s.generate_spikes(EmitterKind::Spiral).expect_err("idle session");
    assert!(matches!(err, SessionError::NotRunning));
    assert!(s.emitters().is_empty());

    s.start(Instant::now()).expect("start");
    s.generate_spikes(EmitterKind::Spiral).expect("running session");
    assert_eq!(s.emitters().len(), SPIKES_PER_SET);
    s.generate_spikes(EmitterKind::Orbit).expect("replace set");
    assert_eq!(s.emitters().len(), SPIKES_PER_SET);
    assert_eq!(s.emitters().kind(), Some(EmitterKind::Orbit));
}

#[test]
fn slider_changes_do_not_touch_existing_spikes() {
    let mut surface = RecordingSurface::default();
    let mut s = Session::new(fastrand::Rng::with_seed(1)).with_params(SpikeParams::new(0.5, 50.0));
    s.load_grid(gradient_grid(10, 10), &mut surface);
    s.start(Instant::now()).expect("start");
    s.generate_spikes(EmitterKind::Spiral).expect("spikes");
    s.params_mut().set_intensity(2.0);
    s.params_mut().set_radius(200.0);
    for e in s.emitters().emitters() {
        assert!((e.intensity - 0.5).abs() < 1e-5);
        assert_eq!(e.effect_radius, 50.0);
    }
}

#[test]
fn two_ticks_cover_ten_by_ten_grid_once() {
    let mut surface = RecordingSurface::default();
    let mut s = Session::new(fastrand::Rng::with_seed(2));
    s.load_grid(gradient_grid(10, 10), &mut surface);
    assert_eq!(s.batch_size(), 50);

    s.start(Instant::now()).expect("start");
    let first = s.tick(0.0, &mut surface);
    assert_eq!(first.drawn, 50);
    assert_eq!(s.cursor(), 50);
    let second = s.tick(0.03, &mut surface);
    assert_eq!(second.drawn, 50);
    assert_eq!(s.cursor(), 0);
    assert_eq!(second.frame, 2);

    let visited: HashSet<ItemId> = surface.updates.iter().copied().collect();
    assert_eq!(surface.updates.len(), 100);
    assert_eq!(visited.len(), 100);
}

#[test]
fn round_robin_covers_uneven_grids() {
    let mut surface = RecordingSurface::default();
    let mut s = Session::new(fastrand::Rng::with_seed(4));
    s.load_grid(gradient_grid(9, 13), &mut surface);
    let n = s.cells().len();
    let ticks = n.div_ceil(s.batch_size());

    s.start(Instant::now()).expect("start");
    for i in 0..ticks {
        s.tick(i as f32 * 0.03, &mut surface);
    }
    let first_pass: HashSet<ItemId> = surface.updates.iter().take(n).copied().collect();
    assert_eq!(first_pass.len(), n);
}

#[test]
fn cells_sample_color_at_current_position() {
    let mut surface = RecordingSurface::default();
    let mut s = Session::new(fastrand::Rng::with_seed(6));
    s.load_grid(gradient_grid(10, 10), &mut surface);
    s.start(Instant::now()).expect("start");
    for i in 0..40 {
        s.tick(i as f32 * 0.03, &mut surface);
    }
    // Replay the next tick by hand for the cell under the cursor.
    let grid = s.grid().expect("grid").clone();
    let cell = s.cells()[s.cursor()].clone();
    s.tick(40.0 * 0.03, &mut surface);
    let (rect, color) = surface.items[cell.item.0];
    assert_eq!(Some(color), grid.sample(cell.pos.0, cell.pos.1));
    assert_eq!(rect, PixelRect::for_cell(cell.pos.0, cell.pos.1, 10));
}

#[test]
fn stop_restores_positions_and_source_colors() {
    let mut canvas = Canvas::new(100, 100);
    let mut s = Session::new(fastrand::Rng::with_seed(12)).with_style(StyleFilter::Painterly);
    s.load_grid(gradient_grid(10, 10), &mut canvas);
    let initial: Vec<_> = s.cells().iter().map(|c| c.pos).collect();
    let initial_items: Vec<_> = (0..canvas.len()).map(|i| canvas.item(ItemId(i))).collect();

    s.start(Instant::now()).expect("start");
    s.generate_spikes(EmitterKind::Orbit).expect("spikes");
    for i in 0..25 {
        s.tick(i as f32 * 0.03, &mut canvas);
    }
    assert_ne!(
        s.cells().iter().map(|c| c.pos).collect::<Vec<_>>(),
        initial,
        "cells should have drifted"
    );

    s.stop(&mut canvas);
    assert_eq!(s.state(), AnimationState::Idle);
    let grid = s.grid().expect("grid");
    for (cell, pos) in s.cells().iter().zip(&initial) {
        assert_eq!(cell.pos, *pos);
        let (_, color) = canvas.item(cell.item).expect("item");
        assert_eq!(Some(color), grid.color(cell.origin.0, cell.origin.1));
    }
    let restored: Vec<_> = (0..canvas.len()).map(|i| canvas.item(ItemId(i))).collect();
    assert_eq!(restored, initial_items);
}

#[test]
fn non_finite_positions_are_skipped_not_fatal() {
    let colors = vec![Rgb::new(5, 5, 5); 4];
    let grid = PixelGrid::from_colors(2, 2, 1, colors).expect("grid");
    assert_eq!(grid.sample(f32::INFINITY, 0.0), None);
    assert_eq!(grid.sample(0.0, f32::NAN), None);
    assert_eq!(grid.sample(3.2, -0.5), grid.color(1, 0));
}

#[test]
fn load_falls_back_to_default_area_when_surface_unrealized() {
    let mut canvas = Canvas::new(1, 1);
    let mut s = Session::new(fastrand::Rng::with_seed(1));
    let img = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 10, 10]));
    s.load_image(&img, &mut canvas);
    let grid = s.grid().expect("grid");
    assert_eq!(grid.cell_size(), 5);
    assert_eq!((grid.width(), grid.height()), (160, 120));
    assert_eq!(s.batch_size(), 96);
}
