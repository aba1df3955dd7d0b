//! The 2D drawing target the field and emitters paint into.

use crate::color::Rgb;

/// A point in surface pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }
}

/// Backing drawing surface, sized to the viewport.
///
/// Implementations swallow their own backend errors: a draw that cannot be
/// performed is simply skipped for that frame.
pub trait Surface {
    /// Current backing size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resizes the backing buffer. Pixel content is not preserved.
    fn resize(&mut self, width: u32, height: u32);

    /// Clears the whole surface.
    fn clear(&mut self);

    fn fill_disc(&mut self, center: Point, radius: f32, color: Rgb, alpha: f32);

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Rgb, alpha: f32);

    fn fill_triangle(&mut self, corners: [Point; 3], color: Rgb, alpha: f32);
}
