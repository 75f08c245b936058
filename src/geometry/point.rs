//! Data and operations on 2D points.
//!
//! This module provides the [`Point`] value type used throughout the mesh
//! core, together with finite-coordinate validation and the axis-aligned
//! [`BoundingBox`] of a point set.
//!
//! Coordinates are IEEE-754 doubles. Points are plain values: all mesh
//! traversal works with directed edge handles, never with point references,
//! so `Point` is `Copy` and carries no identity of its own.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during coordinate validation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoordinateError {
    /// A coordinate is NaN or infinite.
    #[error("coordinate {axis} of point ({x}, {y}) is not finite")]
    NonFinite {
        /// The offending axis, `"x"` or `"y"`.
        axis: &'static str,
        /// The x coordinate of the point.
        x: f64,
        /// The y coordinate of the point.
        y: f64,
    },
}

// =============================================================================
// POINT
// =============================================================================

/// A point in the Euclidean plane.
///
/// # Examples
///
/// ```
/// use trigen::geometry::point::Point;
///
/// let p = Point::new(1.5, 2.125);
/// let q = Point::new(0.0, 2.0);
/// assert!(p.distance_squared(&q) > 0.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    /// The x coordinate.
    pub x: f64,
    /// The y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Checks that both coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::NonFinite`] if either coordinate is NaN or
    /// infinite.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.x.is_finite() {
            return Err(CoordinateError::NonFinite {
                axis: "x",
                x: self.x,
                y: self.y,
            });
        }
        if !self.y.is_finite() {
            return Err(CoordinateError::NonFinite {
                axis: "y",
                x: self.x,
                y: self.y,
            });
        }
        Ok(())
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// The midpoint of the segment between `self` and `other`.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Total lexicographic order: x first, then y.
    ///
    /// Uses `f64::total_cmp`, so the order is total even for signed zeros.
    /// This is the order used to sort and deduplicate input points.
    #[must_use]
    pub fn cmp_lexicographic(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }

    /// Coordinate-wise equality.
    ///
    /// Unlike `cmp_lexicographic`, `0.0` and `-0.0` compare equal here;
    /// two points that coincide geometrically are the same mesh vertex.
    #[must_use]
    pub fn coincides_with(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl From<[f64; 2]> for Point {
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

// =============================================================================
// BOUNDING BOX
// =============================================================================

/// Axis-aligned bounding box of a point set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x coordinate.
    pub min_x: f64,
    /// Minimum y coordinate.
    pub min_y: f64,
    /// Maximum x coordinate.
    pub max_x: f64,
    /// Maximum y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Computes the bounding box of a non-empty slice of points.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// Width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_finite_coordinates() {
        assert!(Point::new(1.0, -2.5).validate().is_ok());
    }

    #[test]
    fn validate_rejects_nan_and_infinity() {
        assert!(Point::new(f64::NAN, 0.0).validate().is_err());
        assert!(Point::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn lexicographic_order_sorts_x_then_y() {
        let a = Point::new(0.0, 5.0);
        let b = Point::new(1.0, 0.0);
        let c = Point::new(1.0, 1.0);
        assert_eq!(a.cmp_lexicographic(&b), Ordering::Less);
        assert_eq!(b.cmp_lexicographic(&c), Ordering::Less);
        assert_eq!(c.cmp_lexicographic(&c), Ordering::Equal);
    }

    #[test]
    fn signed_zero_coincides() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(-0.0, 0.0);
        assert!(a.coincides_with(&b));
        // But the total order still distinguishes them for sorting purposes.
        assert_ne!(a.cmp_lexicographic(&b), Ordering::Equal);
    }

    #[test]
    fn bounding_box_of_points() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(3.0, 3.0),
            Point::new(1.5, 2.125),
        ];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 3.0);
        assert_eq!(bbox.max_y, 3.0);
        assert_eq!(bbox.width(), 3.0);
    }

    #[test]
    fn bounding_box_of_empty_slice_is_none() {
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn midpoint_is_halfway() {
        let m = Point::new(0.0, 1.0).midpoint(&Point::new(9.0, 0.75));
        assert_eq!(m, Point::new(4.5, 0.875));
    }
}
