//! # Diya Kernel
//!
//! Firecracker simulation and the celebration around it.
//!
//! This crate provides:
//! - Particles with gravity and fading alpha, and a capped particle field
//! - A timed spawner injecting bursts at random points
//! - A render loop stepping the field once per display frame
//! - Surface binding that follows viewport resizes
//! - Host abstractions (frame scheduler, interval timers) with a
//!   deterministic virtual-clock implementation
//! - The timed confetti show, background music and page decorations
//! - A software RGBA canvas that can be saved as PNG
//!
//! ## Scheduling
//!
//! Everything runs on one thread. The host owns the callback queues and
//! takes a callback out before invoking it, so a callback may request the
//! next frame or clear its own interval. Cancellation goes through owned
//! handles: dropping an [`IntervalHandle`] clears its timer and dropping a
//! [`RenderLoop`] stops it.
//!
//! ## Frame order
//!
//! A frame clears the surface, advances and draws every live particle, then
//! prunes the expired ones in a separate pass.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod audio;
pub mod canvas;
pub mod celebration;
pub mod confetti;
pub mod config;
pub mod decor;
pub mod field;
pub mod host;
pub mod particle;
pub mod render_loop;
pub mod spawner;
pub mod surface;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audio::*;
    pub use crate::canvas::*;
    pub use crate::celebration::*;
    pub use crate::confetti::*;
    pub use crate::config::*;
    pub use crate::decor::*;
    pub use crate::field::*;
    pub use crate::host::*;
    pub use crate::particle::*;
    pub use crate::render_loop::*;
    pub use crate::spawner::*;
    pub use crate::surface::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::time::Duration;

    #[test]
    fn test_pixel_is_four_bytes() {
        assert_eq!(std::mem::size_of::<Rgba8>(), 4);
    }

    #[test]
    fn test_no_frames_after_teardown() {
        let host = Rc::new(HostLoop::default());
        let parts = CelebrationParts::new(host.clone(), host.clone(), Viewport::new(64, 64))
            .with_surface(share(PixelCanvas::new(64, 64)));
        let mut celebration = Celebration::new(&ShowConfig::default().with_seed(1), parts);
        celebration.light_lamp();
        host.advance(Duration::from_millis(700));
        celebration.teardown();

        let frames = celebration.render_loop().frames();
        host.advance(Duration::from_secs(5));
        assert_eq!(celebration.render_loop().frames(), frames);
        assert_eq!(host.pending_callbacks(), 0);
    }
}
