//! A single firecracker particle.
//!
//! Particles move in whole frames: every [`Particle::advance`] applies the
//! velocity, pulls the vertical velocity down by gravity and fades alpha by
//! a fixed decay. Randomness is only used at creation.
//!
//! Alpha is recomputed from the particle's age rather than accumulated, so a
//! decay of `1/N` expires a particle on exactly its `N`th frame.

use diya_common::Hsl;
use glam::Vec2;

use crate::config::{sample, Range, ShowConfig, DEFAULT_ALPHA_DECAY, DEFAULT_GRAVITY};
use crate::surface::DrawingSurface;

/// Per-frame forces applied to every particle of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    /// Added to vertical velocity each frame.
    pub gravity: f32,
    /// Subtracted from alpha each frame.
    pub alpha_decay: f32,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            alpha_decay: DEFAULT_ALPHA_DECAY,
        }
    }
}

impl Physics {
    /// Reads the physics constants of a show.
    #[must_use]
    pub fn from_config(config: &ShowConfig) -> Self {
        Self {
            gravity: config.gravity,
            alpha_decay: config.alpha_decay,
        }
    }

    /// Physics whose particles live exactly `frames` frames.
    #[must_use]
    pub fn with_lifetime(gravity: f32, frames: u32) -> Self {
        Self {
            gravity,
            alpha_decay: 1.0 / frames.max(1) as f32,
        }
    }

    /// Frames for alpha to fall from 1 to 0.
    ///
    /// Snaps to a whole frame count when the decay is the reciprocal of one.
    #[must_use]
    pub fn lifetime(&self) -> f32 {
        let frames = 1.0 / self.alpha_decay;
        let whole = frames.round();
        if (frames - whole).abs() <= whole * 1e-5 {
            whole
        } else {
            frames
        }
    }

    /// Upper bound on frames a particle stays alive.
    #[must_use]
    pub fn max_lifetime_frames(&self) -> u32 {
        self.lifetime().ceil() as u32
    }
}

/// Sampling ranges for new particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRanges {
    /// Horizontal velocity range.
    pub velocity_x: Range,
    /// Vertical velocity range.
    pub velocity_y: Range,
    /// Radius range.
    pub radius: Range,
    /// Hue band in degrees.
    pub hue: Range,
}

impl ParticleRanges {
    /// Ranges of a firecracker burst: symmetric velocity on both axes.
    #[must_use]
    pub fn burst(config: &ShowConfig) -> Self {
        Self {
            velocity_x: config.burst_velocity,
            velocity_y: config.burst_velocity,
            radius: config.radius_range,
            hue: config.hue_band,
        }
    }

    /// Ranges of the upward fountain.
    #[must_use]
    pub fn fountain(config: &ShowConfig) -> Self {
        Self {
            velocity_x: config.fountain_velocity_x,
            velocity_y: config.fountain_velocity_y,
            radius: config.radius_range,
            hue: config.hue_band,
        }
    }
}

/// A simulated point with a fade-out lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in pixels.
    pub position: Vec2,
    /// Velocity in pixels per frame.
    pub velocity: Vec2,
    /// Radius in pixels.
    pub radius: f32,
    /// Fill color.
    pub color: Hsl,
    /// Remaining life, starts at 1.0.
    pub alpha: f32,
    /// Frames advanced so far.
    pub age: u32,
}

impl Particle {
    /// Creates a particle at `origin` with randomized velocity, radius and hue.
    pub fn create(origin: Vec2, ranges: &ParticleRanges, rng: &mut fastrand::Rng) -> Self {
        let velocity = Vec2::new(
            sample(rng, ranges.velocity_x),
            sample(rng, ranges.velocity_y),
        );
        let radius = sample(rng, ranges.radius);
        let hue = sample(rng, ranges.hue);

        Self {
            position: origin,
            velocity,
            radius,
            color: Hsl::warm(hue),
            alpha: 1.0,
            age: 0,
        }
    }

    /// Advances one frame.
    pub fn advance(&mut self, physics: Physics) {
        self.position += self.velocity;
        self.velocity.y += physics.gravity;
        self.age = self.age.saturating_add(1);
        self.alpha = 1.0 - self.age as f32 / physics.lifetime();
    }

    /// Whether the particle has faded out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.alpha <= 0.0
    }

    /// Opacity used for drawing; never negative.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.alpha.clamp(0.0, 1.0)
    }

    /// Draws the particle as a filled circle.
    pub fn render_to(&self, surface: &mut dyn DrawingSurface) {
        surface.fill_circle(
            self.position,
            self.radius,
            self.color.to_rgb(),
            self.opacity(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diya_common::Rgb;
    use proptest::prelude::*;

    #[derive(Default)]
    struct CircleLog {
        circles: Vec<(Vec2, f32, Rgb, f32)>,
    }

    impl DrawingSurface for CircleLog {
        fn width(&self) -> u32 {
            100
        }
        fn height(&self) -> u32 {
            100
        }
        fn set_size(&mut self, _width: u32, _height: u32) {}
        fn clear_rect(&mut self, _x: u32, _y: u32, _width: u32, _height: u32) {}
        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, opacity: f32) {
            self.circles.push((center, radius, color, opacity));
        }
    }

    fn burst_ranges() -> ParticleRanges {
        ParticleRanges::burst(&ShowConfig::default())
    }

    #[test]
    fn test_create_within_ranges() {
        let mut rng = fastrand::Rng::with_seed(3);
        let ranges = burst_ranges();
        for _ in 0..500 {
            let p = Particle::create(Vec2::new(10.0, 20.0), &ranges, &mut rng);
            assert_eq!(p.position, Vec2::new(10.0, 20.0));
            assert!((-4.0..4.0).contains(&p.velocity.x));
            assert!((-4.0..4.0).contains(&p.velocity.y));
            assert!((1.0..4.0).contains(&p.radius));
            assert!((15.0..75.0).contains(&p.color.hue));
            assert!((p.alpha - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn test_advance_applies_velocity_then_gravity() {
        let mut p = Particle {
            position: Vec2::new(0.0, 0.0),
            velocity: Vec2::new(1.0, -2.0),
            radius: 2.0,
            color: Hsl::warm(30.0),
            alpha: 1.0,
            age: 0,
        };
        p.advance(Physics::default());
        assert_eq!(p.position, Vec2::new(1.0, -2.0));
        assert!((p.velocity.y - -1.9).abs() < 1e-6);
        assert!((p.alpha - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_expires_within_lifetime() {
        let physics = Physics::default();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut p = Particle::create(Vec2::ZERO, &burst_ranges(), &mut rng);
        let mut frames = 0;
        while !p.is_expired() {
            p.advance(physics);
            frames += 1;
        }
        assert_eq!(frames, physics.max_lifetime_frames());
        assert_eq!(frames, 100);
    }

    #[test]
    fn test_reciprocal_decay_expires_on_last_frame() {
        for frames in [1, 3, 7, 10, 60, 100, 333, 1000] {
            let physics = Physics::with_lifetime(0.1, frames);
            let mut rng = fastrand::Rng::with_seed(2);
            let mut p = Particle::create(Vec2::ZERO, &burst_ranges(), &mut rng);
            for _ in 1..frames {
                p.advance(physics);
            }
            assert!(!p.is_expired(), "expired early with {frames} frames");
            p.advance(physics);
            assert!(p.is_expired(), "still alive after {frames} frames");
        }
    }

    #[test]
    fn test_render_clamps_opacity() {
        let mut log = CircleLog::default();
        let mut p = Particle::create(Vec2::ZERO, &burst_ranges(), &mut fastrand::Rng::with_seed(1));
        p.alpha = -0.004;
        p.render_to(&mut log);
        assert_eq!(log.circles.len(), 1);
        assert!(log.circles[0].3.abs() < f32::EPSILON);
        // Rendering does not mutate the particle.
        assert!((p.alpha - -0.004).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_alpha_strictly_decreases(seed in any::<u64>(), decay in 0.001f32..0.5) {
            let physics = Physics { gravity: 0.1, alpha_decay: decay };
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut p = Particle::create(Vec2::ZERO, &burst_ranges(), &mut rng);
            let mut expired_once = false;
            let mut frames = 0;
            for _ in 0..(physics.max_lifetime_frames() + 2) {
                let before = p.alpha;
                p.advance(physics);
                prop_assert!(p.alpha < before);
                if expired_once {
                    prop_assert!(p.is_expired());
                } else {
                    frames += 1;
                }
                expired_once |= p.is_expired();
            }
            prop_assert!(expired_once);
            prop_assert!(frames <= physics.max_lifetime_frames());
        }
    }
}
