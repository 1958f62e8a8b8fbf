//! Timed firecracker bursts.
//!
//! Every interval the [`Spawner`] picks one random point on the surface and
//! injects a burst of particles there with velocities symmetric around
//! zero. It runs on the host timer, independent of the frame rate.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec2;
use tracing::debug;

use crate::config::ShowConfig;
use crate::field::SharedField;
use crate::host::{IntervalHandle, TimerService};
use crate::particle::{Particle, ParticleRanges};
use crate::surface::SharedSurface;

/// Generates particle bursts on a fixed cadence.
#[derive(Debug, Clone)]
pub struct Spawner {
    interval: Duration,
    burst_size: usize,
    burst: ParticleRanges,
    fountain: ParticleRanges,
    rng: Rc<RefCell<fastrand::Rng>>,
}

impl Spawner {
    /// Creates a spawner from show configuration.
    #[must_use]
    pub fn new(config: &ShowConfig, rng: fastrand::Rng) -> Self {
        Self {
            interval: config.burst_interval(),
            burst_size: config.burst_size,
            burst: ParticleRanges::burst(config),
            fountain: ParticleRanges::fountain(config),
            rng: Rc::new(RefCell::new(rng)),
        }
    }

    /// Time between bursts.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Particles per burst.
    #[must_use]
    pub fn burst_size(&self) -> usize {
        self.burst_size
    }

    /// One burst at a random point within `bounds`.
    #[must_use]
    pub fn burst(&self, bounds: Vec2) -> Vec<Particle> {
        let mut rng = self.rng.borrow_mut();
        let origin = Vec2::new(rng.f32() * bounds.x, rng.f32() * bounds.y);
        (0..self.burst_size)
            .map(|_| Particle::create(origin, &self.burst, &mut rng))
            .collect()
    }

    /// The upward fountain: particles spread along the bottom edge.
    #[must_use]
    pub fn seed_fountain(&self, bounds: Vec2, count: usize) -> Vec<Particle> {
        let mut rng = self.rng.borrow_mut();
        (0..count)
            .map(|_| {
                let origin = Vec2::new(rng.f32() * bounds.x, bounds.y);
                Particle::create(origin, &self.fountain, &mut rng)
            })
            .collect()
    }

    /// Starts bursting into `field` every interval.
    ///
    /// The returned handle clears the timer when cancelled or dropped.
    pub fn start(
        &self,
        timers: &Rc<dyn TimerService>,
        field: SharedField,
        surface: SharedSurface,
    ) -> IntervalHandle {
        let spawner = self.clone();
        let id = timers.set_interval(
            self.interval,
            Box::new(move || {
                let bounds = surface.borrow().bounds();
                let particles = spawner.burst(bounds);
                let added = field.borrow_mut().add(particles);
                debug!("Firecracker burst: {} particles", added);
            }),
        );
        debug!("Spawner started every {:?}", self.interval);
        IntervalHandle::new(timers.clone(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::field::ParticleField;
    use crate::host::HostLoop;
    use crate::surface::share;

    fn spawner() -> Spawner {
        Spawner::new(&ShowConfig::default(), fastrand::Rng::with_seed(42))
    }

    #[test]
    fn test_burst_shares_one_origin() {
        let particles = spawner().burst(Vec2::new(800.0, 600.0));
        assert_eq!(particles.len(), 100);
        let origin = particles[0].position;
        assert!((0.0..800.0).contains(&origin.x));
        assert!((0.0..600.0).contains(&origin.y));
        assert!(particles.iter().all(|p| p.position == origin));
        assert!(particles
            .iter()
            .all(|p| p.velocity.x.abs() <= 4.0 && p.velocity.y.abs() <= 4.0));
    }

    #[test]
    fn test_fountain_rises_from_bottom() {
        let particles = spawner().seed_fountain(Vec2::new(800.0, 600.0), 200);
        assert_eq!(particles.len(), 200);
        for p in &particles {
            assert!((p.position.y - 600.0).abs() < f32::EPSILON);
            assert!((-15.0..-5.0).contains(&p.velocity.y));
            assert!((-2.0..2.0).contains(&p.velocity.x));
        }
    }

    #[test]
    fn test_fires_floor_of_elapsed_over_interval() {
        let host = Rc::new(HostLoop::default());
        let timers: Rc<dyn TimerService> = host.clone();
        // Long-lived particles so nothing expires inside the window.
        let config = ShowConfig {
            alpha_decay: 0.001,
            ..ShowConfig::default()
        };
        let field = ParticleField::from_config(&config).shared();
        let surface = share(PixelCanvas::new(320, 240));
        let spawner = Spawner::new(&config, fastrand::Rng::with_seed(5));

        let _handle = spawner.start(&timers, field.clone(), surface);
        host.advance(Duration::from_millis(4500));
        assert_eq!(field.borrow().len(), 4 * 100);
    }

    #[test]
    fn test_cancel_stops_bursts() {
        let host = Rc::new(HostLoop::default());
        let timers: Rc<dyn TimerService> = host.clone();
        let field = ParticleField::default().shared();
        let surface = share(PixelCanvas::new(320, 240));

        let mut handle = spawner().start(&timers, field.clone(), surface);
        host.advance(Duration::from_millis(1000));
        handle.cancel();
        host.advance(Duration::from_secs(10));
        assert_eq!(field.borrow().len(), 100);
        assert_eq!(host.active_intervals(), 0);
    }

    #[test]
    fn test_seeded_spawners_agree() {
        let a = Spawner::new(&ShowConfig::default(), fastrand::Rng::with_seed(8));
        let b = Spawner::new(&ShowConfig::default(), fastrand::Rng::with_seed(8));
        let bounds = Vec2::new(100.0, 100.0);
        assert_eq!(a.burst(bounds), b.burst(bounds));
    }
}
