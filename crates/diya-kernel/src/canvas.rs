//! Software RGBA canvas.
//!
//! [`PixelCanvas`] is the headless [`DrawingSurface`]: circles are
//! rasterized by pixel-center coverage and blended source-over. Frames can
//! be composited and written out as PNG.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use diya_common::{DiyaError, DiyaResult, Rgb};
use glam::Vec2;
use tracing::debug;

use crate::surface::DrawingSurface;

/// Non-premultiplied RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8 {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Creates a pixel.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque pixel from a color.
    #[must_use]
    pub const fn opaque(color: Rgb) -> Self {
        Self::new(color.r, color.g, color.b, 255)
    }

    /// Blends `src` at `opacity` over this pixel (source-over).
    #[must_use]
    pub fn blend(self, src: Rgb, opacity: f32) -> Self {
        let sa = opacity.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return self;
        }
        let da = f32::from(self.a) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Self::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| {
            let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(src.r, self.r),
            g: channel(src.g, self.g),
            b: channel(src.b, self.b),
            a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
        }
    }
}

/// An in-memory RGBA drawing surface.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelCanvas {
    /// Creates a transparent canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba8::TRANSPARENT; (width as usize) * (height as usize)],
        }
    }

    /// Reads a pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Fills the whole canvas with an opaque color.
    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(Rgba8::opaque(color));
    }

    /// Fills the canvas with a vertical gradient from `top` to `bottom`.
    pub fn fill_vertical_gradient(&mut self, top: Rgb, bottom: Rgb) {
        let width = self.width as usize;
        let span = self.height.saturating_sub(1).max(1) as f32;
        for (y, row) in self.pixels.chunks_mut(width.max(1)).enumerate() {
            let color = Rgba8::opaque(top.lerp(bottom, y as f32 / span));
            row.fill(color);
        }
    }

    /// Composites `layer` over this canvas. Sizes must match; extra area is ignored.
    pub fn composite(&mut self, layer: &PixelCanvas) {
        let width = self.width.min(layer.width);
        let height = self.height.min(layer.height);
        for y in 0..height {
            for x in 0..width {
                let (Some(dst), Some(src)) = (self.index(x, y), layer.index(x, y)) else {
                    continue;
                };
                let top = layer.pixels[src];
                if top.a == 0 {
                    continue;
                }
                self.pixels[dst] = self.pixels[dst]
                    .blend(Rgb::new(top.r, top.g, top.b), f32::from(top.a) / 255.0);
            }
        }
    }

    /// Number of pixels that are not fully transparent.
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0).count()
    }

    /// Raw RGBA bytes, row-major.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Writes the canvas as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> DiyaResult<()> {
        let path = path.as_ref();
        let image = image::RgbaImage::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .ok_or_else(|| DiyaError::Image("pixel buffer does not match canvas size".into()))?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| DiyaError::Image(e.to_string()))?;
        debug!("Saved {}x{} frame to {}", self.width, self.height, path.display());
        Ok(())
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize) * (self.width as usize) + x as usize)
    }
}

impl DrawingSurface for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    fn clear_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let row = self.width as usize;
        for py in y.min(y_end)..y_end {
            let start = py as usize * row;
            self.pixels[start + x.min(x_end) as usize..start + x_end as usize]
                .fill(Rgba8::TRANSPARENT);
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgb, opacity: f32) {
        if radius <= 0.0 || opacity <= 0.0 || !center.is_finite() {
            return;
        }
        let min_x = (center.x - radius).floor().max(0.0);
        let min_y = (center.y - radius).floor().max(0.0);
        let max_x = (center.x + radius).ceil().min(self.width as f32);
        let max_y = (center.y + radius).ceil().min(self.height as f32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let r2 = radius * radius;
        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let pixel_center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if pixel_center.distance_squared(center) > r2 {
                    continue;
                }
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = self.pixels[i].blend(color, opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_circle_paints_center() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.fill_circle(Vec2::new(10.0, 10.0), 3.0, Rgb::GOLD, 1.0);
        assert_eq!(canvas.pixel(10, 10), Some(Rgba8::opaque(Rgb::GOLD)));
        assert_eq!(canvas.pixel(0, 0), Some(Rgba8::TRANSPARENT));
        assert!(canvas.painted_pixels() > 20);
    }

    #[test]
    fn test_zero_opacity_draws_nothing() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.fill_circle(Vec2::new(10.0, 10.0), 3.0, Rgb::GOLD, 0.0);
        assert_eq!(canvas.painted_pixels(), 0);
    }

    #[test]
    fn test_offscreen_circle_is_clipped() {
        let mut canvas = PixelCanvas::new(20, 20);
        canvas.fill_circle(Vec2::new(-50.0, 300.0), 4.0, Rgb::GOLD, 1.0);
        canvas.fill_circle(Vec2::new(f32::NAN, 3.0), 4.0, Rgb::GOLD, 1.0);
        assert_eq!(canvas.painted_pixels(), 0);
    }

    #[test]
    fn test_half_opacity_blend() {
        let mut canvas = PixelCanvas::new(4, 4);
        canvas.fill(Rgb::BLACK);
        canvas.fill_circle(Vec2::new(2.0, 2.0), 2.0, Rgb::WHITE, 0.5);
        let px = canvas.pixel(2, 2).unwrap_or_default();
        assert_eq!(px.a, 255);
        assert!((127..=128).contains(&px.r));
    }

    #[test]
    fn test_clear_rect_and_resize() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill(Rgb::GOLD);
        canvas.clear_rect(0, 0, 4, 8);
        assert_eq!(canvas.pixel(3, 7), Some(Rgba8::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 0), Some(Rgba8::opaque(Rgb::GOLD)));

        canvas.clear_rect(6, 6, 100, 100);
        assert_eq!(canvas.pixel(7, 7), Some(Rgba8::TRANSPARENT));

        canvas.set_size(16, 4);
        assert_eq!(canvas.width(), 16);
        assert_eq!(canvas.painted_pixels(), 0);
    }

    #[test]
    fn test_composite_layers() {
        let mut base = PixelCanvas::new(4, 4);
        base.fill(Rgb::BLACK);
        let mut layer = PixelCanvas::new(4, 4);
        layer.fill_circle(Vec2::new(1.0, 1.0), 1.0, Rgb::WHITE, 1.0);
        base.composite(&layer);
        assert_eq!(base.pixel(0, 0), Some(Rgba8::opaque(Rgb::WHITE)));
        assert_eq!(base.pixel(3, 3), Some(Rgba8::opaque(Rgb::BLACK)));
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut canvas = PixelCanvas::new(2, 3);
        canvas.fill_vertical_gradient(Rgb::WHITE, Rgb::BLACK);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba8::opaque(Rgb::WHITE)));
        assert_eq!(canvas.pixel(1, 2), Some(Rgba8::opaque(Rgb::BLACK)));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.png");
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill_circle(Vec2::new(4.0, 4.0), 2.0, Rgb::ORANGE, 1.0);
        canvas.save_png(&path).expect("save png");
        assert!(path.exists());
    }
}
