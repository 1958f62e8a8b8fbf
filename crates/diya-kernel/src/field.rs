//! The live particle set.
//!
//! [`ParticleField`] owns every live particle in a contiguous vector. One
//! [`ParticleField::step`] advances and draws all of them, then removes the
//! expired ones in a separate pass, so removal never disturbs the update of
//! particles processed in the same step.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::config::ShowConfig;
use crate::particle::{Particle, Physics};
use crate::surface::DrawingSurface;

/// A particle field shared between the spawner and the render loop.
pub type SharedField = Rc<RefCell<ParticleField>>;

/// Ordered collection of live particles.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    physics: Physics,
    max_particles: usize,
    dropped: u64,
}

impl Default for ParticleField {
    fn default() -> Self {
        Self::new(Physics::default(), crate::config::DEFAULT_MAX_PARTICLES)
    }
}

impl ParticleField {
    /// Creates an empty field.
    #[must_use]
    pub fn new(physics: Physics, max_particles: usize) -> Self {
        Self {
            particles: Vec::with_capacity(max_particles.min(1024)),
            physics,
            max_particles,
            dropped: 0,
        }
    }

    /// Creates an empty field from show configuration.
    #[must_use]
    pub fn from_config(config: &ShowConfig) -> Self {
        Self::new(Physics::from_config(config), config.max_particles)
    }

    /// Wraps the field for sharing.
    #[must_use]
    pub fn shared(self) -> SharedField {
        Rc::new(RefCell::new(self))
    }

    /// Appends particles to the live set.
    ///
    /// Particles beyond the live cap are dropped. Returns how many were added.
    pub fn add(&mut self, particles: impl IntoIterator<Item = Particle>) -> usize {
        let before = self.particles.len();
        let mut rejected = 0u64;
        for particle in particles {
            if self.particles.len() < self.max_particles {
                self.particles.push(particle);
            } else {
                rejected += 1;
            }
        }

        if rejected > 0 {
            self.dropped += rejected;
            warn!(
                "Particle cap {} reached, dropped {} particles",
                self.max_particles, rejected
            );
        }

        self.particles.len() - before
    }

    /// Advances and draws every particle, then prunes the expired ones.
    ///
    /// Returns the number of particles removed.
    pub fn step(&mut self, surface: &mut dyn DrawingSurface) -> usize {
        let physics = self.physics;
        for particle in &mut self.particles {
            particle.advance(physics);
            particle.render_to(surface);
        }
        let pruned = self.prune();
        trace!("Field step: {} live, {} pruned", self.particles.len(), pruned);
        pruned
    }

    /// Removes every expired particle. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_expired());
        before - self.particles.len()
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the field has no live particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Iterates live particles.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Live particle cap.
    #[must_use]
    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    /// Total particles rejected by the cap.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Physics applied on each step.
    #[must_use]
    pub fn physics(&self) -> Physics {
        self.physics
    }

    /// Removes all particles.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
