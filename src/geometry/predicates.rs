//! Geometric predicates and measures for 2D triangulation.
//!
//! The two predicates that every topological decision rides on are
//! [`orient2d`] and [`incircle`]. Both must be exact in sign for all finite
//! double inputs; a single wrong sign corrupts the mesh invariants. The
//! implementation delegates to the `robust` crate, a port of Shewchuk's
//! adaptive-precision predicates: a floating-point filter answers the easy
//! cases and staged exact expansions decide the near-degenerate ones.
//!
//! The remaining functions (circumcenter, areas, angles, encroachment) are
//! measures, not predicates: they feed quality decisions where plain double
//! arithmetic is sufficient.

use robust::{incircle as shewchuk_incircle, orient2d as shewchuk_orient2d, Coord};

use crate::geometry::point::Point;

// =============================================================================
// RESULT ENUMS
// =============================================================================

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circumcircle.
    OUTSIDE,
    /// The point is exactly on the circumcircle.
    BOUNDARY,
    /// The point is inside the circumcircle.
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Represents the orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise (negative signed area).
    NEGATIVE,
    /// Collinear (zero signed area).
    DEGENERATE,
    /// Counterclockwise (positive signed area).
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

// =============================================================================
// EXACT PREDICATES
// =============================================================================

#[inline]
fn coord(p: Point) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

/// Exact orientation of the ordered triple `(a, b, c)`.
///
/// Returns [`Orientation::POSITIVE`] when `c` lies strictly to the left of
/// the directed line `a -> b` (the triple is counterclockwise),
/// [`Orientation::NEGATIVE`] when strictly to the right, and
/// [`Orientation::DEGENERATE`] when the three points are collinear.
///
/// The sign is exact for all finite inputs. Ties are propagated to the
/// caller, which resolves them by its own rule (splitting a point onto an
/// edge, splitting a segment at a collinear vertex, and so on).
#[must_use]
pub fn orient2d(a: Point, b: Point, c: Point) -> Orientation {
    let det = shewchuk_orient2d(coord(a), coord(b), coord(c));
    if det > 0.0 {
        Orientation::POSITIVE
    } else if det < 0.0 {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// Exact in-circle test.
///
/// With `(a, b, c)` in counterclockwise order, returns
/// [`InCircle::INSIDE`] when `d` lies strictly inside the circumcircle of
/// the triangle `abc`, [`InCircle::OUTSIDE`] when strictly outside, and
/// [`InCircle::BOUNDARY`] when the four points are cocircular.
///
/// The sign is exact for all finite inputs; callers must not feed a
/// clockwise triple.
#[must_use]
pub fn incircle(a: Point, b: Point, c: Point, d: Point) -> InCircle {
    let det = shewchuk_incircle(coord(a), coord(b), coord(c), coord(d));
    if det > 0.0 {
        InCircle::INSIDE
    } else if det < 0.0 {
        InCircle::OUTSIDE
    } else {
        InCircle::BOUNDARY
    }
}

// =============================================================================
// MEASURES
// =============================================================================

/// Signed area of the triangle `(a, b, c)`, positive when counterclockwise.
#[must_use]
pub fn signed_area(a: Point, b: Point, c: Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)) / 2.0
}

/// Circumcenter of the triangle `(a, b, c)`.
///
/// Returns `None` when the triple is exactly collinear (decided by
/// [`orient2d`], not by a tolerance).
#[must_use]
pub fn circumcenter(a: Point, b: Point, c: Point) -> Option<Point> {
    if orient2d(a, b, c) == Orientation::DEGENERATE {
        return None;
    }
    // Translate so a is the origin; solve the 2x2 perpendicular-bisector
    // system in the translated frame.
    let bx = b.x - a.x;
    let by = b.y - a.y;
    let cx = c.x - a.x;
    let cy = c.y - a.y;
    let b_norm = bx * bx + by * by;
    let c_norm = cx * cx + cy * cy;
    let den = 2.0 * (bx * cy - by * cx);
    let ux = (cy * b_norm - by * c_norm) / den;
    let uy = (bx * c_norm - cx * b_norm) / den;
    Some(Point::new(a.x + ux, a.y + uy))
}

/// Smallest interior angle of the triangle `(a, b, c)`, in degrees.
///
/// The smallest angle is opposite the shortest edge; it is computed from the
/// law of cosines on the squared edge lengths.
#[must_use]
pub fn smallest_angle_degrees(a: Point, b: Point, c: Point) -> f64 {
    let la = b.distance_squared(&c); // edge opposite a
    let lb = c.distance_squared(&a); // edge opposite b
    let lc = a.distance_squared(&b); // edge opposite c

    let cos_at = |opp: f64, adj1: f64, adj2: f64| -> f64 {
        let den = 2.0 * (adj1 * adj2).sqrt();
        if den == 0.0 {
            return 1.0;
        }
        ((adj1 + adj2 - opp) / den).clamp(-1.0, 1.0)
    };

    let cos_a = cos_at(la, lb, lc);
    let cos_b = cos_at(lb, lc, la);
    let cos_c = cos_at(lc, la, lb);

    // Largest cosine corresponds to the smallest angle.
    let max_cos = cos_a.max(cos_b).max(cos_c);
    max_cos.acos().to_degrees()
}

/// Tests whether `p` lies strictly inside the diametral circle of the
/// segment `(a, b)`.
///
/// The diametral circle has `(a, b)` as a diameter, so `p` is strictly
/// inside exactly when the angle `a p b` is obtuse.
#[must_use]
pub fn encroaches(a: Point, b: Point, p: Point) -> bool {
    let dx1 = a.x - p.x;
    let dy1 = a.y - p.y;
    let dx2 = b.x - p.x;
    let dy2 = b.y - p.y;
    dx1 * dx2 + dy1 * dy2 < 0.0
}

// =============================================================================
// TESTS
// =============================================================================
