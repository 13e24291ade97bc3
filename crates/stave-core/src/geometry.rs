//! Geometric primitives for positioned notation shapes.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in logical units
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Stave uses the same orientation as SVG and most screen coordinate systems:
//!
//! ```text
//!   (0,0) ────────► +X   (time flows rightward)
//!     │
//!     │
//!     ▼
//!    +Y                  (staves stack downward)
//! ```

use crate::units::LUnits;

/// A 2D point in logical units.
///
/// # Examples
///
/// ```
/// # use stave_core::geometry::Point;
/// let origin = Point::new(100.0, 40.0);
/// let moved = origin.add_point(Point::new(20.0, 0.0));
/// assert_eq!(moved.x(), 120.0);
/// assert_eq!(moved.y(), 40.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: LUnits,
    y: LUnits,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: LUnits, y: LUnits) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> LUnits {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> LUnits {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: LUnits) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: LUnits) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Width and height of a shape, in logical units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: LUnits,
    height: LUnits,
}

impl Size {
    pub fn new(width: LUnits, height: LUnits) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> LUnits {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> LUnits {
        self.height
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// A rectangular bounding box with minimum and maximum coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: LUnits,
    min_y: LUnits,
    max_x: LUnits,
    max_y: LUnits,
}

impl Bounds {
    /// Creates bounds from the top-left corner and a size.
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> LUnits {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> LUnits {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> LUnits {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> LUnits {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> LUnits {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> LUnits {
        self.max_y - self.min_y
    }

    /// Returns the top-left corner as a Point
    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    /// Returns the horizontal centre of the bounds
    pub fn center_x(self) -> LUnits {
        (self.min_x + self.max_x) / 2.0
    }

    /// Returns the smallest bounds containing both `self` and `other`
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by the given offset
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns true when the two boxes overlap horizontally by more than `tolerance`
    pub fn overlaps_horizontally(&self, other: &Self, tolerance: LUnits) -> bool {
        self.min_x.max(other.min_x) + tolerance < self.max_x.min(other.max_x)
    }
}
