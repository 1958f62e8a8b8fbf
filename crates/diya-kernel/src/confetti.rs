//! Ambient confetti show.
//!
//! A timed show that launches two confetti bursts every quarter second for
//! fifteen seconds, one from each side of the screen, with the particle
//! count shrinking linearly as the show runs out. The actual confetti is a
//! collaborator behind [`ConfettiLauncher`]; the show only decides when and
//! with which parameters to call it.
//!
//! [`FieldConfetti`] keeps its pieces in a field of their own, so they live
//! for the configured number of ticks and never compete with firecrackers
//! for the firecracker cap.
//!
//! ```
//! use diya_kernel::confetti::{ConfettiShow, TracingConfetti};
//! use diya_kernel::config::ConfettiConfig;
//! use std::time::Duration;
//!
//! let show = ConfettiShow::new(&ConfettiConfig::default(), fastrand::Rng::with_seed(1));
//! let bursts = show.bursts(Duration::from_millis(7500)).expect("show still running");
//! assert_eq!(bursts[0].particle_count, 25);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use tracing::{debug, info};

use crate::config::{sample, ConfettiConfig, Range, DEFAULT_GRAVITY};
use crate::field::{ParticleField, SharedField};
use crate::host::{IntervalHandle, IntervalId, TimerService};
use crate::particle::{Particle, ParticleRanges, Physics};
use crate::surface::SharedSurface;

/// Parameters of one confetti burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfettiBurst {
    /// Number of confetti pieces.
    pub particle_count: u32,
    /// Origin in normalized screen coordinates (may lie above the top edge).
    pub origin: Vec2,
    /// Spread angle in degrees.
    pub spread: f32,
    /// Initial speed.
    pub start_velocity: f32,
    /// Lifetime in ticks.
    pub ticks: u32,
}

/// Something that can throw confetti.
pub trait ConfettiLauncher {
    /// Launches one burst.
    fn launch(&mut self, burst: &ConfettiBurst);
}

/// A launcher shared with the show's timer.
pub type SharedLauncher = Rc<RefCell<dyn ConfettiLauncher>>;

/// The timed two-sided confetti show.
#[derive(Debug, Clone)]
pub struct ConfettiShow {
    config: ConfettiConfig,
    rng: Rc<RefCell<fastrand::Rng>>,
}

impl ConfettiShow {
    /// Creates a show.
    #[must_use]
    pub fn new(config: &ConfettiConfig, rng: fastrand::Rng) -> Self {
        Self {
            config: config.clone(),
            rng: Rc::new(RefCell::new(rng)),
        }
    }

    /// The two bursts to launch with `time_left` remaining, or `None` once
    /// the show is over.
    #[must_use]
    pub fn bursts(&self, time_left: Duration) -> Option<[ConfettiBurst; 2]> {
        let duration = self.config.duration();
        if time_left.is_zero() || duration.is_zero() {
            return None;
        }

        let share = (time_left.as_secs_f32() / duration.as_secs_f32()).min(1.0);
        let particle_count = (self.config.peak_particle_count * share) as u32;
        let mut rng = self.rng.borrow_mut();
        let mut burst = |band: Range| ConfettiBurst {
            particle_count,
            origin: Vec2::new(sample(&mut rng, band), rng.f32() - 0.2),
            spread: self.config.spread,
            start_velocity: self.config.start_velocity,
            ticks: self.config.ticks,
        };

        Some([burst(self.config.left_band), burst(self.config.right_band)])
    }

    /// Starts the show. The interval clears itself once the show is over;
    /// the returned handle stops it early.
    pub fn start(&self, timers: &Rc<dyn TimerService>, launcher: SharedLauncher) -> IntervalHandle {
        let show = self.clone();
        let interval = self.config.interval();
        let duration = self.config.duration();
        let own_id: Rc<Cell<Option<IntervalId>>> = Rc::new(Cell::new(None));
        let elapsed = Cell::new(Duration::ZERO);

        let slot = own_id.clone();
        let service = Rc::downgrade(timers);
        let id = timers.set_interval(
            interval,
            Box::new(move || {
                elapsed.set(elapsed.get() + interval);
                let time_left = duration.saturating_sub(elapsed.get());
                match show.bursts(time_left) {
                    Some(bursts) => {
                        let mut launcher = launcher.borrow_mut();
                        for burst in &bursts {
                            launcher.launch(burst);
                        }
                    },
                    None => {
                        if let (Some(id), Some(timers)) = (slot.take(), service.upgrade()) {
                            timers.clear_interval(id);
                        }
                        info!("Confetti show finished");
                    },
                }
            }),
        );
        own_id.set(Some(id));
        debug!("Confetti show started for {:?}", duration);
        IntervalHandle::new(timers.clone(), id)
    }
}

/// Launcher that only logs bursts.
#[derive(Debug, Default)]
pub struct TracingConfetti {
    launches: u64,
    particles: u64,
}

impl TracingConfetti {
    /// Bursts launched.
    #[must_use]
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Confetti pieces requested across all bursts.
    #[must_use]
    pub fn particles(&self) -> u64 {
        self.particles
    }
}

impl ConfettiLauncher for TracingConfetti {
    fn launch(&mut self, burst: &ConfettiBurst) {
        self.launches += 1;
        self.particles += u64::from(burst.particle_count);
        debug!(
            "Confetti: {} pieces at ({:.2}, {:.2})",
            burst.particle_count, burst.origin.x, burst.origin.y
        );
    }
}

/// Launcher that turns confetti bursts into particles of its own field.
///
/// Pieces fade out over `ticks` frames and the field is capped separately
/// from the firecrackers.
pub struct FieldConfetti {
    field: SharedField,
    ticks: u32,
    surface: SharedSurface,
    rng: fastrand::Rng,
    ranges: ParticleRanges,
    velocity_scale: f32,
}

impl FieldConfetti {
    /// Default conversion from confetti speed to pixels per frame.
    pub const DEFAULT_VELOCITY_SCALE: f32 = 0.25;

    /// Creates a launcher with a fresh confetti field, scaled to `surface`.
    #[must_use]
    pub fn new(config: &ConfettiConfig, surface: SharedSurface, rng: fastrand::Rng) -> Self {
        let ticks = config.ticks.max(1);
        let physics = Physics::with_lifetime(DEFAULT_GRAVITY, ticks);
        Self {
            field: ParticleField::new(physics, config.max_particles).shared(),
            ticks,
            surface,
            rng,
            ranges: ParticleRanges {
                velocity_x: (0.0, 0.0),
                velocity_y: (0.0, 0.0),
                radius: (2.0, 4.0),
                hue: (0.0, 360.0),
            },
            velocity_scale: Self::DEFAULT_VELOCITY_SCALE,
        }
    }

    /// The field holding the confetti pieces.
    #[must_use]
    pub fn field(&self) -> &SharedField {
        &self.field
    }

    /// Sets the speed conversion factor.
    #[must_use]
    pub fn with_velocity_scale(mut self, scale: f32) -> Self {
        self.velocity_scale = scale;
        self
    }
}

impl ConfettiLauncher for FieldConfetti {
    fn launch(&mut self, burst: &ConfettiBurst) {
        if burst.ticks != self.ticks {
            debug!(
                "Confetti burst asks for {} ticks, field fades over {}",
                burst.ticks, self.ticks
            );
        }
        let bounds = self.surface.borrow().bounds();
        let origin = burst.origin * bounds;
        let spread = burst.spread.to_radians();
        let rng = &mut self.rng;

        let particles: Vec<Particle> = (0..burst.particle_count)
            .map(|_| {
                // Straight up, fanned out by the spread.
                let angle = std::f32::consts::FRAC_PI_2 + spread * (rng.f32() - 0.5);
                let speed = burst.start_velocity * (0.5 + rng.f32()) * self.velocity_scale;
                let mut particle = Particle::create(origin, &self.ranges, rng);
                particle.velocity = Vec2::new(angle.cos(), -angle.sin()) * speed;
                particle
            })
            .collect();

        self.field.borrow_mut().add(particles);
    }
}

impl fmt::Debug for FieldConfetti {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfetti")
            .field("ticks", &self.ticks)
            .field("velocity_scale", &self.velocity_scale)
            .finish_non_exhaustive()
    }
}
