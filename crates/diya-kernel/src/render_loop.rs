//! Per-frame render driver.
//!
//! [`RenderLoop`] re-requests a display frame after every step, so it runs
//! at the host's refresh rate rather than on a fixed timer. Each frame
//! clears the surface and steps the field. Extra fields (the confetti) can
//! ride along as layers drawn after it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::field::SharedField;
use crate::host::{FrameRequestId, FrameScheduler};
use crate::surface::SharedSurface;

/// Render loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No frames are scheduled.
    #[default]
    Stopped,
    /// A frame is requested after every step.
    Running,
}

#[derive(Default)]
struct LoopShared {
    state: Cell<LoopState>,
    pending: Cell<Option<FrameRequestId>>,
    frames: Cell<u64>,
}

/// Drives `field.step(surface)` once per display frame until stopped.
pub struct RenderLoop {
    scheduler: Rc<dyn FrameScheduler>,
    shared: Rc<LoopShared>,
}

impl RenderLoop {
    /// Creates a stopped loop.
    #[must_use]
    pub fn new(scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            shared: Rc::new(LoopShared::default()),
        }
    }

    /// Starts stepping `field` onto `surface` every frame. No-op when running.
    pub fn start(&mut self, field: SharedField, surface: SharedSurface) {
        self.start_layers(vec![field], surface);
    }

    /// Starts stepping every field in `layers`, in order, onto `surface`
    /// every frame. No-op when running.
    pub fn start_layers(&mut self, layers: Vec<SharedField>, surface: SharedSurface) {
        if self.state() == LoopState::Running {
            return;
        }
        self.shared.state.set(LoopState::Running);
        let layers: Rc<[SharedField]> = layers.into();
        info!("Render loop started with {} layers", layers.len());
        schedule(self.scheduler.clone(), self.shared.clone(), layers, surface);
    }

    /// Stops the loop. A step already running finishes; none follow it.
    pub fn stop(&mut self) {
        if self.state() == LoopState::Stopped {
            return;
        }
        self.shared.state.set(LoopState::Stopped);
        if let Some(id) = self.shared.pending.take() {
            self.scheduler.cancel_frame(id);
        }
        debug!("Render loop stopped after {} frames", self.frames());
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.shared.state.get()
    }

    /// Whether frames are being scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Steps run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.shared.frames.get()
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state())
            .field("frames", &self.frames())
            .finish_non_exhaustive()
    }
}

fn schedule(
    scheduler: Rc<dyn FrameScheduler>,
    shared: Rc<LoopShared>,
    layers: Rc<[SharedField]>,
    surface: SharedSurface,
) {
    let next = scheduler.clone();
    let state = shared.clone();
    let id = scheduler.request_frame(Box::new(move |_at| {
        state.pending.set(None);
        if state.state.get() != LoopState::Running {
            return;
        }

        {
            let mut surface_ref = surface.borrow_mut();
            surface_ref.clear();
            for field in layers.iter() {
                field.borrow_mut().step(&mut *surface_ref);
            }
        }
        state.frames.set(state.frames.get() + 1);

        if state.state.get() == LoopState::Running {
            schedule(next, state, layers, surface);
        }
    }));
    shared.pending.set(Some(id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::config::ShowConfig;
    use crate::field::ParticleField;
    use crate::host::HostLoop;
    use crate::particle::{Particle, ParticleRanges};
    use crate::surface::{share, DrawingSurface};
    use diya_common::Rgb;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::time::Duration;

    fn fixture() -> (Rc<HostLoop>, RenderLoop, SharedField, SharedSurface) {
        let host = Rc::new(HostLoop::new(60));
        let render = RenderLoop::new(host.clone());
        let field = ParticleField::default().shared();
        let surface = share(PixelCanvas::new(64, 64));
        (host, render, field, surface)
    }

    #[test]
    fn test_starts_stopped() {
        let (_host, render, _field, _surface) = fixture();
        assert_eq!(render.state(), LoopState::Stopped);
        assert_eq!(render.frames(), 0);
    }

    #[test]
    fn test_runs_once_per_repaint() {
        let (host, mut render, field, surface) = fixture();
        render.start(field, surface);
        for _ in 0..30 {
            host.advance_frame();
        }
        assert_eq!(render.frames(), 30);
        assert!(render.is_running());
    }

    #[test]
    fn test_double_start_schedules_once() {
        let (host, mut render, field, surface) = fixture();
        render.start(field.clone(), surface.clone());
        render.start(field, surface);
        assert_eq!(host.pending_frames(), 1);
    }

    #[test]
    fn test_no_steps_after_stop() {
        let (host, mut render, field, surface) = fixture();
        render.start(field, surface);
        host.advance(Duration::from_millis(500));
        render.stop();
        let frames = render.frames();
        host.advance(Duration::from_secs(5));
        assert_eq!(render.frames(), frames);
        assert_eq!(host.pending_callbacks(), 0);
    }

    #[test]
    fn test_frame_clears_surface() {
        let (host, mut render, field, _) = fixture();
        let canvas = Rc::new(RefCell::new(PixelCanvas::new(64, 64)));
        canvas
            .borrow_mut()
            .fill_circle(Vec2::new(10.0, 10.0), 5.0, Rgb::GOLD, 1.0);
        assert!(canvas.borrow().painted_pixels() > 0);

        let surface: SharedSurface = canvas.clone();
        render.start(field, surface);
        host.advance_frame();
        // Empty field, so nothing is drawn after the clear.
        assert_eq!(canvas.borrow().painted_pixels(), 0);
        assert_eq!(render.frames(), 1);
    }

    #[test]
    fn test_layers_step_in_one_frame() {
        let (host, mut render, field, surface) = fixture();
        let confetti = ParticleField::default().shared();
        let particle = Particle::create(
            Vec2::new(8.0, 8.0),
            &ParticleRanges::burst(&ShowConfig::default()),
            &mut fastrand::Rng::with_seed(4),
        );
        field.borrow_mut().add([particle]);
        confetti.borrow_mut().add([particle, particle]);

        render.start_layers(vec![field.clone(), confetti.clone()], surface);
        host.advance_frame();
        assert!(field.borrow().iter().all(|p| p.age == 1));
        assert!(confetti.borrow().iter().all(|p| p.age == 1));
        assert_eq!(confetti.borrow().len(), 2);
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let (host, mut render, field, surface) = fixture();
        render.start(field, surface);
        drop(render);
        assert_eq!(host.pending_frames(), 0);
    }
}
