//! Drawing surface abstraction and viewport binding.
//!
//! The simulation never owns pixels. It draws through [`DrawingSurface`],
//! an injected 2-D surface that can clear a region and fill circles, and
//! whose pixel size is kept equal to the viewport by [`SurfaceManager`].

use std::cell::RefCell;
use std::rc::Rc;

use diya_common::Rgb;
use glam::Vec2;
use tracing::debug;

/// A resizable 2-D drawing surface.
pub trait DrawingSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Resizes the surface. Resizing discards the current contents.
    fn set_size(&mut self, width: u32, height: u32);

    /// Clears a rectangular region to fully transparent.
    fn clear_rect(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// Fills a circle with `color` at `opacity` (0.0-1.0).
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, opacity: f32);

    /// Clears the whole surface.
    fn clear(&mut self) {
        let (width, height) = (self.width(), self.height());
        self.clear_rect(0, 0, width, height);
    }

    /// Surface size as a vector.
    fn bounds(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }
}

/// A drawing surface shared between the spawner, render loop and resize handler.
pub type SharedSurface = Rc<RefCell<dyn DrawingSurface>>;

/// Wraps a concrete surface into a [`SharedSurface`].
pub fn share<S: DrawingSurface + 'static>(surface: S) -> SharedSurface {
    Rc::new(RefCell::new(surface))
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Keeps the drawing surface sized to the viewport.
///
/// Resize events that arrive before activation are remembered but not
/// applied; activation applies the latest viewport.
pub struct SurfaceManager {
    surface: Option<SharedSurface>,
    viewport: Viewport,
    active: bool,
}

impl SurfaceManager {
    /// Creates a manager. `surface` is `None` when the host has no drawable context.
    #[must_use]
    pub fn new(surface: Option<SharedSurface>, viewport: Viewport) -> Self {
        Self {
            surface,
            viewport,
            active: false,
        }
    }

    /// Activates the binding and sizes the surface to the viewport.
    ///
    /// Returns the surface, or `None` when there is nothing to draw on.
    pub fn activate(&mut self) -> Option<SharedSurface> {
        self.active = true;
        self.apply();
        self.surface.clone()
    }

    /// Handles a viewport resize event.
    pub fn on_resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !self.active {
            debug!("Resize to {}x{} before activation ignored", viewport.width, viewport.height);
            return;
        }
        self.apply();
    }

    /// Stops applying resize events.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether resize events are applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last viewport seen.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The managed surface, if any.
    #[must_use]
    pub fn surface(&self) -> Option<&SharedSurface> {
        self.surface.as_ref()
    }

    fn apply(&self) {
        if let Some(surface) = &self.surface {
            surface
                .borrow_mut()
                .set_size(self.viewport.width, self.viewport.height);
            debug!(
                "Surface resized to {}x{}",
                self.viewport.width, self.viewport.height
            );
        }
    }
}

impl std::fmt::Debug for SurfaceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceManager")
            .field("has_surface", &self.surface.is_some())
            .field("viewport", &self.viewport)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;

    fn manager(width: u32, height: u32) -> (SurfaceManager, SharedSurface) {
        let surface = share(PixelCanvas::new(1, 1));
        let manager = SurfaceManager::new(Some(surface.clone()), Viewport::new(width, height));
        (manager, surface)
    }

    #[test]
    fn test_activation_applies_viewport() {
        let (mut manager, surface) = manager(800, 600);
        assert!(manager.activate().is_some());
        assert_eq!(surface.borrow().bounds(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_resize_tracks_viewport() {
        let (mut manager, surface) = manager(800, 600);
        manager.activate();
        manager.on_resize(Viewport::new(1024, 768));
        assert_eq!(surface.borrow().width(), 1024);
        assert_eq!(surface.borrow().height(), 768);
    }

    #[test]
    fn test_resize_before_activation_is_noop() {
        let (mut manager, surface) = manager(800, 600);
        manager.on_resize(Viewport::new(320, 240));
        assert_eq!(surface.borrow().width(), 1);

        // The remembered viewport is applied on activation.
        manager.activate();
        assert_eq!(surface.borrow().width(), 320);
        assert_eq!(surface.borrow().height(), 240);
    }

    #[test]
    fn test_missing_surface() {
        let mut manager = SurfaceManager::new(None, Viewport::new(800, 600));
        assert!(manager.activate().is_none());
        manager.on_resize(Viewport::new(10, 10));
        assert_eq!(manager.viewport(), Viewport::new(10, 10));
    }
}
