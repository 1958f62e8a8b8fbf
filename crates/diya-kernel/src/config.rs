//! Show tuning parameters.
//!
//! Every randomized visual parameter of the show lives here so tests can
//! pin a seed or collapse a range instead of relying on true randomness.
//! The defaults match the greeting page: one burst of 100 a second, fading
//! over 100 frames.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gravity added to a particle's vertical velocity every frame (pixels/frame²).
pub const DEFAULT_GRAVITY: f32 = 0.1;

/// Alpha lost by a particle every frame (~100-frame lifetime).
pub const DEFAULT_ALPHA_DECAY: f32 = 0.01;

/// Time between firecracker bursts.
pub const DEFAULT_BURST_INTERVAL_MS: u64 = 1000;

/// Particles per firecracker burst.
pub const DEFAULT_BURST_SIZE: usize = 100;

/// Upper bound on live particles in a field.
pub const DEFAULT_MAX_PARTICLES: usize = 5000;

/// Upper bound on live confetti pieces.
pub const DEFAULT_CONFETTI_MAX_PARTICLES: usize = 2000;

/// A closed-open `[min, max)` sampling range.
pub type Range = (f32, f32);

/// Samples uniformly from a range.
pub fn sample(rng: &mut fastrand::Rng, range: Range) -> f32 {
    range.0 + rng.f32() * (range.1 - range.0)
}

/// Configuration of the whole show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Per-frame gravity (pixels/frame²).
    pub gravity: f32,
    /// Per-frame alpha decay.
    pub alpha_decay: f32,
    /// Milliseconds between firecracker bursts.
    pub burst_interval_ms: u64,
    /// Particles per burst.
    pub burst_size: usize,
    /// Symmetric burst velocity range, applied to both axes.
    pub burst_velocity: Range,
    /// Particles in the upward fountain seeded on activation (0 = none).
    pub fountain_count: usize,
    /// Fountain horizontal velocity range.
    pub fountain_velocity_x: Range,
    /// Fountain vertical velocity range (negative is up).
    pub fountain_velocity_y: Range,
    /// Particle radius range in pixels.
    pub radius_range: Range,
    /// Warm hue band in degrees.
    pub hue_band: Range,
    /// Live particle cap per field.
    pub max_particles: usize,
    /// RNG seed (None = seeded from entropy).
    pub seed: Option<u64>,
    /// Ambient confetti show.
    pub confetti: ConfettiConfig,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            alpha_decay: DEFAULT_ALPHA_DECAY,
            burst_interval_ms: DEFAULT_BURST_INTERVAL_MS,
            burst_size: DEFAULT_BURST_SIZE,
            burst_velocity: (-4.0, 4.0),
            fountain_count: 0,
            fountain_velocity_x: (-2.0, 2.0),
            fountain_velocity_y: (-15.0, -5.0),
            radius_range: (1.0, 4.0),
            hue_band: (15.0, 75.0),
            max_particles: DEFAULT_MAX_PARTICLES,
            seed: None,
            confetti: ConfettiConfig::default(),
        }
    }
}

impl ShowConfig {
    /// Sets a fixed seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Interval between bursts.
    #[must_use]
    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms.max(1))
    }

    /// Creates the random source for a show, seeded when configured.
    #[must_use]
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }

    /// Clamp values to ranges the simulation can run with.
    pub fn validate(&mut self) {
        self.gravity = self.gravity.clamp(-10.0, 10.0);
        // Decay must stay positive or particles never expire.
        self.alpha_decay = self.alpha_decay.clamp(0.001, 1.0);
        self.burst_interval_ms = self.burst_interval_ms.clamp(16, 60_000);
        self.burst_size = self.burst_size.min(self.max_particles);
        self.radius_range = ordered(self.radius_range);
        self.radius_range.0 = self.radius_range.0.max(0.1);
        self.radius_range.1 = self.radius_range.1.max(self.radius_range.0);
        self.burst_velocity = ordered(self.burst_velocity);
        self.fountain_velocity_x = ordered(self.fountain_velocity_x);
        self.fountain_velocity_y = ordered(self.fountain_velocity_y);
        self.hue_band = ordered(self.hue_band);
        self.confetti.validate();
    }
}

/// Configuration of the timed confetti show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfettiConfig {
    /// Total show length in milliseconds.
    pub duration_ms: u64,
    /// Milliseconds between launches.
    pub interval_ms: u64,
    /// Particle count per burst at the very start; scales down linearly.
    pub peak_particle_count: f32,
    /// Initial particle speed.
    pub start_velocity: f32,
    /// Spread angle in degrees.
    pub spread: f32,
    /// Lifetime in ticks.
    pub ticks: u32,
    /// Upper bound on live confetti pieces.
    pub max_particles: usize,
    /// Normalized horizontal band of the left burst.
    pub left_band: Range,
    /// Normalized horizontal band of the right burst.
    pub right_band: Range,
}

impl Default for ConfettiConfig {
    fn default() -> Self {
        Self {
            duration_ms: 15_000,
            interval_ms: 250,
            peak_particle_count: 50.0,
            start_velocity: 30.0,
            spread: 360.0,
            ticks: 60,
            max_particles: DEFAULT_CONFETTI_MAX_PARTICLES,
            left_band: (0.1, 0.3),
            right_band: (0.7, 0.9),
        }
    }
}

impl ConfettiConfig {
    /// Total show length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Interval between launches.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    fn validate(&mut self) {
        self.interval_ms = self.interval_ms.clamp(16, 60_000);
        self.peak_particle_count = self.peak_particle_count.max(0.0);
        self.spread = self.spread.clamp(0.0, 360.0);
        self.ticks = self.ticks.max(1);
        self.max_particles = self.max_particles.max(1);
        self.left_band = ordered(self.left_band);
        self.right_band = ordered(self.right_band);
    }
}

fn ordered(range: Range) -> Range {
    if range.0 <= range.1 {
        range
    } else {
        (range.1, range.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page() {
        let config = ShowConfig::default();
        assert!((config.alpha_decay - 0.01).abs() < f32::EPSILON);
        assert_eq!(config.burst_size, 100);
        assert_eq!(config.burst_interval(), Duration::from_secs(1));
        assert_eq!(config.confetti.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let config = ShowConfig::default().with_seed(7);
        let mut a = config.rng();
        let mut b = config.rng();
        assert_eq!(a.u64(..), b.u64(..));
    }

    #[test]
    fn test_sample_stays_in_range() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..1000 {
            let v = sample(&mut rng, (-4.0, 4.0));
            assert!((-4.0..4.0).contains(&v));
        }
    }

    #[test]
    fn test_sample_degenerate_range() {
        let mut rng = fastrand::Rng::with_seed(1);
        assert!((sample(&mut rng, (2.5, 2.5)) - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_fixes_bad_values() {
        let mut config = ShowConfig {
            alpha_decay: -1.0,
            burst_interval_ms: 0,
            radius_range: (5.0, -1.0),
            hue_band: (75.0, 15.0),
            ..ShowConfig::default()
        };
        config.validate();
        assert!(config.alpha_decay > 0.0);
        assert_eq!(config.burst_interval_ms, 16);
        assert!(config.radius_range.0 > 0.0);
        assert!(config.radius_range.0 <= config.radius_range.1);
        assert_eq!(config.hue_band, (15.0, 75.0));
    }
}
