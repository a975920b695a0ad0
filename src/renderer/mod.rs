//! Canvas-style 2D rendering
//!
//! Immediate mode: every frame clears the surface and repaints each particle.

pub mod color;
pub mod draw;

pub use color::{Color, default_palette};
pub use draw::draw_frame;

use glam::Vec2;

use crate::sim::SurfaceSize;

/// A 2D drawing target in surface pixel coordinates
pub trait DrawingSurface {
    /// Current size in pixels
    fn size(&self) -> SurfaceSize;
    /// Match the backing store to a new host size
    fn resize(&mut self, size: SurfaceSize);
    /// Erase everything
    fn clear(&mut self);
    /// Filled circle
    fn draw_disc(&mut self, center: Vec2, radius: f32, color: Color);
    /// Stroked line segment
    fn draw_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);
}
