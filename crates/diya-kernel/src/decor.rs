//! Decorative looping animations.
//!
//! The page around the firecrackers: a twinkling star field, bobbing
//! lanterns, candles and sparklers, the lamp itself, floating petals while
//! the celebration runs, and a bead garland across the top. Everything is
//! generated once from a random source and then sampled at a time `t`, so
//! a frame is a pure function of the scene and the clock.

use std::f32::consts::PI;
use std::time::Duration;

use diya_common::{Hsl, Rgb};
use glam::Vec2;

use crate::config::sample;
use crate::surface::DrawingSurface;

/// Stars in the background.
pub const STAR_COUNT: usize = 200;

/// Lanterns, candles and sparklers.
pub const ORNAMENT_COUNT: usize = 15;

/// Petals shown while celebrating.
pub const PETAL_COUNT: usize = 20;

/// Beads on the garland.
pub const BEAD_COUNT: usize = 10;

/// Petal diameter in pixels; petal motion is relative to it.
pub const PETAL_SIZE: f32 = 16.0;

/// Width of the garland's view box.
const GARLAND_VIEW_WIDTH: f32 = 500.0;

/// Interpolation curve of a keyframe segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant speed.
    #[default]
    Linear,
    /// Slow at both ends.
    EaseInOut,
}

impl Easing {
    /// Maps segment progress `u` (0.0-1.0) through the curve.
    #[must_use]
    pub fn apply(self, u: f32) -> f32 {
        let u = u.clamp(0.0, 1.0);
        match self {
            Self::Linear => u,
            Self::EaseInOut => 0.5 - 0.5 * (PI * u).cos(),
        }
    }
}

/// Fraction of `period` elapsed at `t` in the current cycle.
fn phase(t: Duration, period: Duration) -> f32 {
    let period = period.as_secs_f32();
    if period <= 0.0 {
        return 0.0;
    }
    (t.as_secs_f32() % period) / period
}

fn lerp(a: f32, b: f32, u: f32) -> f32 {
    a + (b - a) * u
}

/// A looping `from → to → from` animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Value at the start and end of each cycle.
    pub from: f32,
    /// Value at mid-cycle.
    pub to: f32,
    /// Cycle length.
    pub period: Duration,
    /// Curve of each half.
    pub easing: Easing,
}

impl Pulse {
    /// Creates a linear pulse.
    #[must_use]
    pub const fn new(from: f32, to: f32, period: Duration) -> Self {
        Self {
            from,
            to,
            period,
            easing: Easing::Linear,
        }
    }

    /// Sets the easing.
    #[must_use]
    pub const fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Value at time `t`.
    #[must_use]
    pub fn sample(&self, t: Duration) -> f32 {
        let p = phase(t, self.period);
        if p < 0.5 {
            lerp(self.from, self.to, self.easing.apply(p * 2.0))
        } else {
            lerp(self.to, self.from, self.easing.apply((p - 0.5) * 2.0))
        }
    }
}

fn secs(range: (f32, f32), rng: &mut fastrand::Rng) -> Duration {
    Duration::from_secs_f32(sample(rng, range))
}

/// A twinkling background star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Position in normalized screen coordinates.
    pub position: Vec2,
    /// Width and height in pixels.
    pub size: Vec2,
    /// Opacity over time.
    pub twinkle: Pulse,
}

impl Star {
    fn generate(rng: &mut fastrand::Rng) -> Self {
        Self {
            position: Vec2::new(rng.f32(), rng.f32()),
            size: Vec2::new(sample(rng, (1.0, 4.0)), sample(rng, (1.0, 4.0))),
            twinkle: Pulse::new(0.2, 1.0, secs((3.0, 8.0), rng)),
        }
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, t: Duration) {
        let center = self.position * surface.bounds();
        let radius = (self.size.x + self.size.y) / 4.0;
        surface.fill_circle(center, radius, Rgb::WHITE, self.twinkle.sample(t));
    }
}

/// Kinds of floating ornaments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrnamentKind {
    /// Round paper lantern.
    Lantern,
    /// Wax candle with a flame.
    Candle,
    /// Burning sparkler.
    Sparkler,
}

impl OrnamentKind {
    /// Kind of the `index`-th ornament; kinds cycle.
    #[must_use]
    pub const fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => Self::Lantern,
            1 => Self::Candle,
            _ => Self::Sparkler,
        }
    }
}

/// A bobbing lantern, candle or sparkler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ornament {
    /// What is drawn.
    pub kind: OrnamentKind,
    /// Position in normalized screen coordinates.
    pub position: Vec2,
    /// Opacity over time.
    pub opacity: Pulse,
    /// Scale over time.
    pub scale: Pulse,
    /// Vertical offset in pixels over time.
    pub lift: Pulse,
}

impl Ornament {
    fn generate(index: usize, rng: &mut fastrand::Rng) -> Self {
        let period = secs((2.0, 5.0), rng);
        Self {
            kind: OrnamentKind::for_index(index),
            position: Vec2::new(rng.f32(), rng.f32()),
            opacity: Pulse::new(0.5, 1.0, period),
            scale: Pulse::new(0.8, 1.0, period),
            lift: Pulse::new(0.0, -20.0, period),
        }
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, t: Duration) {
        let origin = self.position * surface.bounds() + Vec2::new(0.0, self.lift.sample(t));
        let s = self.scale.sample(t);
        let alpha = self.opacity.sample(t);
        let at = |x: f32, y: f32| origin + Vec2::new(x, y) * s;

        match self.kind {
            OrnamentKind::Lantern => {
                surface.fill_circle(at(20.0, 5.0), 5.0 * s, Rgb::SADDLE_BROWN, alpha);
                surface.fill_circle(at(20.0, 55.0), 5.0 * s, Rgb::SADDLE_BROWN, alpha);
                surface.fill_circle(at(20.0, 30.0), 20.0 * s, Rgb::GOLD, alpha);
                surface.fill_circle(at(20.0, 30.0), 15.0 * s, Rgb::ORANGE, alpha);
            },
            OrnamentKind::Candle => {
                for y in [15.0, 22.0, 29.0, 36.0] {
                    surface.fill_circle(at(10.0, y), 5.0 * s, Rgb::SANDY_BROWN, alpha);
                }
                surface.fill_circle(at(10.0, 6.0), 4.0 * s, Rgb::ORANGE_RED, alpha);
                surface.fill_circle(at(10.0, 5.0), 3.0 * s, Rgb::GOLD, alpha);
            },
            OrnamentKind::Sparkler => {
                for y in [34.0, 42.0, 50.0, 58.0] {
                    surface.fill_circle(at(15.0, y), 2.0 * s, Rgb::SADDLE_BROWN, alpha);
                }
                surface.fill_circle(at(15.0, 15.0), 15.0 * s, Rgb::GOLD, alpha);
                for (x, y) in [(15.0, 5.0), (15.0, 25.0), (7.0, 20.0), (23.0, 20.0)] {
                    surface.fill_circle(at(x, y), 3.0 * s, Rgb::ORANGE_RED, alpha);
                }
            },
        }
    }
}

/// A petal rising slowly while the celebration runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Petal {
    /// Position in normalized screen coordinates.
    pub position: Vec2,
    /// Opacity.
    pub opacity: f32,
    /// Horizontal offset at the start of a cycle, percent of the petal size.
    pub drift_from: f32,
    /// Horizontal offset at the end of a cycle, percent of the petal size.
    pub drift_to: f32,
    /// Cycle length.
    pub period: Duration,
}

impl Petal {
    fn generate(rng: &mut fastrand::Rng) -> Self {
        Self {
            position: Vec2::new(rng.f32(), rng.f32()),
            opacity: rng.f32(),
            drift_from: sample(rng, (-10.0, 10.0)),
            drift_to: sample(rng, (-10.0, 10.0)),
            period: secs((5.0, 10.0), rng),
        }
    }

    /// Offset from the resting position in pixels at time `t`.
    #[must_use]
    pub fn offset(&self, t: Duration) -> Vec2 {
        let p = phase(t, self.period);
        Vec2::new(
            lerp(self.drift_from, self.drift_to, p) / 100.0 * PETAL_SIZE,
            -p * PETAL_SIZE,
        )
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, t: Duration) {
        let center = self.position * surface.bounds() + self.offset(t);
        surface.fill_circle(center, PETAL_SIZE / 2.0, Rgb::PINK, self.opacity);
    }
}

/// The bead garland hung across the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Garland {
    /// Vertical motion of each bead in view-box units.
    pub beads: Vec<(f32, Pulse)>,
}

impl Default for Garland {
    fn default() -> Self {
        let period = Duration::from_secs(3);
        let beads = (0..BEAD_COUNT)
            .map(|i| {
                let i = i as f32;
                let rest = (i * 0.6).sin() * 20.0 + 50.0;
                let swing = (i * 0.6 + PI).sin() * 20.0 + 50.0;
                (50.0 + i * 45.0, Pulse::new(rest, swing, period))
            })
            .collect();
        Self { beads }
    }
}

impl Garland {
    /// Bead centers in view-box units at time `t`.
    #[must_use]
    pub fn bead_positions(&self, t: Duration) -> Vec<Vec2> {
        self.beads
            .iter()
            .map(|(x, motion)| Vec2::new(*x, motion.sample(t)))
            .collect()
    }

    fn draw(&self, surface: &mut dyn DrawingSurface, t: Duration) {
        let scale = surface.bounds().x / GARLAND_VIEW_WIDTH;

        // Rope: quadratic curve (0,0) -> (250,100) -> (500,0), tomato to gold.
        let steps = 120;
        for step in 0..=steps {
            let u = step as f32 / steps as f32;
            let x = GARLAND_VIEW_WIDTH * u;
            let y = 2.0 * (1.0 - u) * u * 100.0;
            let color = Rgb::TOMATO.lerp(Rgb::GOLD, u);
            surface.fill_circle(Vec2::new(x, y) * scale, 5.0 * scale, color, 1.0);
        }

        for bead in self.bead_positions(t) {
            surface.fill_circle(bead * scale, 5.0 * scale, Rgb::GOLD, 1.0);
        }
    }
}

/// The clickable lamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lamp {
    /// Inner flame height in view-box units over time.
    pub flame_height: Pulse,
    /// Inner flame opacity over time.
    pub flame_opacity: Pulse,
}

impl Default for Lamp {
    fn default() -> Self {
        let period = Duration::from_secs(1);
        Self {
            flame_height: Pulse::new(20.0, 25.0, period).with_easing(Easing::EaseInOut),
            flame_opacity: Pulse::new(1.0, 0.7, period).with_easing(Easing::EaseInOut),
        }
    }
}

impl Lamp {
    fn draw(&self, surface: &mut dyn DrawingSurface, t: Duration, lit: bool) {
        let bounds = surface.bounds();
        // 100-unit view box centered on screen, sized to the smaller side.
        let unit = bounds.x.min(bounds.y) * 0.3 / 100.0;
        let origin = bounds / 2.0 - Vec2::splat(50.0 * unit);
        let at = |x: f32, y: f32| origin + Vec2::new(x, y) * unit;

        // Bowl and oil well.
        fill_ellipse(surface, at(50.0, 85.0), Vec2::new(40.0, 7.0) * unit, Rgb::BRONZE, 1.0);
        fill_ellipse(surface, at(50.0, 75.0), Vec2::new(25.0, 10.0) * unit, Rgb::SADDLE_BROWN, 1.0);

        if lit {
            let outer = Hsl::warm(25.0).to_rgb();
            fill_ellipse(surface, at(50.0, 60.0), Vec2::new(15.0, 25.0) * unit, outer, 1.0);
            let height = self.flame_height.sample(t);
            let opacity = self.flame_opacity.sample(t);
            let radii = Vec2::new(10.0, height) * unit;
            fill_ellipse(surface, at(50.0, 60.0), radii, Rgb::ORANGE, opacity);
            surface.fill_circle(at(50.0, 60.0), 5.0 * unit, Rgb::GOLD, opacity);
        }
    }
}

/// Approximates an ellipse with a run of circles along its major axis.
fn fill_ellipse(
    surface: &mut dyn DrawingSurface,
    center: Vec2,
    radii: Vec2,
    color: Rgb,
    opacity: f32,
) {
    let (major, minor, axis) = if radii.x >= radii.y {
        (radii.x, radii.y, Vec2::X)
    } else {
        (radii.y, radii.x, Vec2::Y)
    };
    if minor <= 0.0 {
        return;
    }
    let reach = major - minor;
    let steps = (reach / (minor * 0.5)).ceil().max(1.0) as u32;
    for step in 0..=steps {
        let offset = lerp(-reach, reach, step as f32 / steps as f32);
        // Taper toward the ends so the outline follows the ellipse.
        let taper = (1.0 - (offset / major).powi(2)).max(0.0).sqrt();
        let radius = (minor * taper).max(minor * 0.5);
        surface.fill_circle(center + axis * offset, radius, color, opacity);
    }
}

/// What the page shows besides the particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SceneState {
    /// Whether the lamp has been lit.
    pub lamp_lit: bool,
    /// Whether the celebration is running.
    pub celebrating: bool,
}

/// All decorative elements of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Background stars.
    pub stars: Vec<Star>,
    /// Floating ornaments.
    pub ornaments: Vec<Ornament>,
    /// Petals, shown while celebrating.
    pub petals: Vec<Petal>,
    /// Garland.
    pub garland: Garland,
    /// Lamp.
    pub lamp: Lamp,
}

impl Scene {
    /// Generates a scene.
    pub fn generate(rng: &mut fastrand::Rng) -> Self {
        Self {
            stars: (0..STAR_COUNT).map(|_| Star::generate(rng)).collect(),
            ornaments: (0..ORNAMENT_COUNT)
                .map(|i| Ornament::generate(i, rng))
                .collect(),
            petals: (0..PETAL_COUNT).map(|_| Petal::generate(rng)).collect(),
            garland: Garland::default(),
            lamp: Lamp::default(),
        }
    }

    /// Draws the layer behind the particles.
    pub fn draw_backdrop(&self, surface: &mut dyn DrawingSurface, t: Duration) {
        for star in &self.stars {
            star.draw(surface, t);
        }
    }

    /// Draws the layer in front of the particles.
    pub fn draw_foreground(
        &self,
        surface: &mut dyn DrawingSurface,
        t: Duration,
        state: SceneState,
    ) {
        for ornament in &self.ornaments {
            ornament.draw(surface, t);
        }
        self.lamp.draw(surface, t, state.lamp_lit);
        if state.celebrating {
            for petal in &self.petals {
                petal.draw(surface, t);
            }
        }
        self.garland.draw(surface, t);
    }
}
