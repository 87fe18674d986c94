#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A point in view coordinates (origin at top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise offset from `origin` to `self`.
    #[inline]
    pub fn delta_from(self, origin: Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let (dx, dy) = self.delta_from(other);
        dx.hypot(dy)
    }
}

/// An on-screen bounding box, as reported by the view layer.
///
/// Plain value data in pixel-equivalent units. Layout boxes are reported
/// without any animation offset applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub left: f32,
    /// Top edge (inclusive).
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Vertical midpoint.
    #[inline]
    pub fn mid_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    /// Horizontal center.
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    ///
    /// Left/top edges are inclusive, right/bottom edges exclusive, so two
    /// abutting rectangles never both contain a point on their shared edge.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        !self.is_empty()
            && point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// A zero-sized rectangle at `point`.
    #[inline]
    pub const fn at_point(point: Point) -> Rect {
        Rect::new(point.x, point.y, 0.0, 0.0)
    }

}
