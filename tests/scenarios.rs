//! End-to-end triangulation scenarios.
//!
//! These mirror the classic driver workloads: a five-point set for plain,
//! quality, and Voronoi runs; a trapezoidal set with one constraining
//! segment and a hole; and a simplified letter-A PSLG. Counts are asserted
//! exactly where the Delaunay triangulation determines them uniquely;
//! refinement outcomes are asserted through the quality bounds themselves,
//! since Steiner counts are trajectory-specific.

use trigen::geometry::predicates::{circumcenter, smallest_angle_degrees};
use trigen::prelude::*;

// =============================================================================
// HELPERS
// =============================================================================

fn five_points() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 2.0),
        Point::new(3.0, 3.0),
        Point::new(1.5, 2.125),
    ]
}

fn trapezoid_points() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(0.0, 3.0),
        Point::new(2.0, 0.0),
        Point::new(4.0, 1.25),
        Point::new(4.0, 3.0),
        Point::new(6.0, 0.0),
        Point::new(8.0, 1.25),
        Point::new(9.0, 0.0),
        Point::new(9.0, 0.75),
        Point::new(9.0, 3.0),
    ]
}

fn letter_a_points() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(1.5, 1.0),
        Point::new(2.5, 1.0),
        Point::new(1.6, 1.5),
        Point::new(2.4, 1.5),
        Point::new(2.0, 2.0),
        Point::new(3.0, 3.0),
    ]
}

fn letter_a_segments() -> Vec<Point> {
    vec![
        // Outer outline.
        Point::new(1.0, 0.0),
        Point::new(0.0, 0.0),
        Point::new(0.0, 0.0),
        Point::new(3.0, 3.0),
        Point::new(3.0, 3.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(2.5, 1.0),
        Point::new(2.5, 1.0),
        Point::new(1.5, 1.0),
        Point::new(1.5, 1.0),
        Point::new(1.0, 0.0),
        // Inner outline.
        Point::new(1.6, 1.5),
        Point::new(2.0, 2.0),
        Point::new(2.0, 2.0),
        Point::new(2.4, 1.5),
        Point::new(2.4, 1.5),
        Point::new(1.6, 1.5),
    ]
}

/// The angle at `view`'s apex corner, in degrees.
fn apex_angle(view: &Face<'_>) -> f64 {
    let p = view.apex().point;
    let u = view.org().point;
    let w = view.dest().point;
    let du = Point::new(u.x - p.x, u.y - p.y);
    let dw = Point::new(w.x - p.x, w.y - p.y);
    let dot = du.x * dw.x + du.y * dw.y;
    let den = (du.x * du.x + du.y * du.y).sqrt() * (dw.x * dw.x + dw.y * dw.y).sqrt();
    (dot / den).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Every triangle meets the angle bound, and the area bound when given.
///
/// A smallest angle pinched between two constrained edges is an input
/// angle no refinement can open; those triangles are exempt from the angle
/// bound, exactly as the engine exempts them.
fn assert_quality(tri: &Triangulator, min_angle: f64, max_area: Option<f64>) {
    for face in tri.faces().unwrap() {
        let a = face.org().point;
        let b = face.dest().point;
        let c = face.apex().point;
        if let Some(max) = max_area {
            assert!(face.area() <= max + 1.0e-12);
        }
        let angle = smallest_angle_degrees(a, b, c);
        if angle >= min_angle - 1.0e-9 {
            continue;
        }
        let views = [face, face.lnext(), face.lprev()];
        let pinned = views.iter().any(|v| {
            (apex_angle(v) - angle).abs() < 1.0e-6
                && v.lnext().is_constrained()
                && v.lprev().is_constrained()
        });
        assert!(
            pinned,
            "improvable triangle with smallest angle {angle}° violates the {min_angle}° bound"
        );
    }
}

/// Sorted vertex-index triples of all faces; requires an unrefined mesh.
fn signature(tri: &Triangulator) -> Vec<[usize; 3]> {
    let mut triples: Vec<[usize; 3]> = tri
        .faces()
        .unwrap()
        .map(|f| {
            let mut t = [
                f.org().input_index.unwrap(),
                f.dest().input_index.unwrap(),
                f.apex().input_index.unwrap(),
            ];
            t.sort_unstable();
            t
        })
        .collect();
    triples.sort_unstable();
    triples
}

/// Ray-casting point-in-polygon test.
fn inside_polygon(polygon: &[Point], p: Point) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

// =============================================================================
// FIVE-POINT SET
// =============================================================================

#[test]
fn standard_triangulation_of_five_points() {
    let mut tri = Triangulator::new(five_points());
    tri.triangulate(false, TraceLevel::None).unwrap();
    assert_eq!(tri.number_of_triangles(), 4);
    assert_eq!(tri.number_of_vertices(), 5);
}

#[test]
fn quality_with_default_min_angle() {
    let mut tri = Triangulator::new(five_points());
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert!(tri.number_of_triangles() > 4);
    assert_quality(&tri, 20.0, None);
    // Refinement added Steiner vertices without input indices.
    let steiner = tri
        .vertices()
        .unwrap()
        .filter(|v| v.input_index.is_none())
        .count();
    assert_eq!(tri.number_of_vertices(), 5 + steiner);
    assert!(steiner > 0);
}

#[test]
fn quality_with_angle_27_5() {
    let mut tri = Triangulator::new(five_points());
    tri.set_min_angle(27.5);
    // Within the provable-termination bound.
    assert_eq!(tri.check_constraints(), (true, true));
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert_quality(&tri, 27.5, None);
    assert!(tri.number_of_triangles() > 4);
}

#[test]
fn quality_with_angle_30_5_and_max_area() {
    let mut tri = Triangulator::new(five_points());
    tri.set_min_angle(30.5);
    tri.set_max_area(5.5);
    assert!(tri.check_constraints_opt(true));
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert_quality(&tri, 30.5, Some(5.5));
}

#[test]
fn angle_44_is_rejected_even_relaxed() {
    let mut tri = Triangulator::new(five_points());
    tri.set_min_angle(44.0);
    tri.set_max_area(-1.0);
    assert_eq!(tri.check_constraints(), (false, false));
    assert!(!tri.check_constraints_opt(true));
    assert!(matches!(
        tri.triangulate(true, TraceLevel::None),
        Err(TrigenError::ConstraintOutOfRange { .. })
    ));
}

#[test]
fn voronoi_of_five_points() {
    let mut tri = Triangulator::new(five_points());
    tri.tessellate(false, TraceLevel::None).unwrap();
    assert_eq!(tri.number_of_voronoi_points(), 4);
    assert_eq!(tri.number_of_voronoi_points(), tri.number_of_triangles());

    // Voronoi vertices are the triangle circumcenters, in face order.
    let centers: Vec<Point> = tri
        .faces()
        .unwrap()
        .map(|f| circumcenter(f.org().point, f.dest().point, f.apex().point).unwrap())
        .collect();
    let voronoi: Vec<Point> = tri.voronoi_points().unwrap().collect();
    assert_eq!(centers.len(), voronoi.len());
    for (c, v) in centers.iter().zip(&voronoi) {
        assert!((c.x - v.x).abs() < 1.0e-12 && (c.y - v.y).abs() < 1.0e-12);
    }

    // Every Voronoi edge endpoint index is in range; ray normals are unit.
    for edge in tri.voronoi_edges().unwrap() {
        assert!(edge.origin < voronoi.len());
        match edge.end {
            VoronoiEnd::Finite(i) => assert!(i < voronoi.len()),
            VoronoiEnd::Infinite(n) => {
                assert!((n.x * n.x + n.y * n.y - 1.0).abs() < 1.0e-9);
            }
        }
    }
}

#[test]
fn triangulating_twice_is_deterministic() {
    let mut tri = Triangulator::new(five_points());
    tri.triangulate(false, TraceLevel::None).unwrap();
    let first = signature(&tri);
    tri.triangulate(false, TraceLevel::None).unwrap();
    assert_eq!(signature(&tri), first);
}

// =============================================================================
// TRAPEZOID WITH A CONSTRAINING SEGMENT
// =============================================================================

#[test]
fn trapezoid_reference_triangulation() {
    let mut tri = Triangulator::new(trapezoid_points());
    tri.triangulate(false, TraceLevel::None).unwrap();
    assert_eq!(tri.number_of_triangles(), 11);
}

#[test]
fn trapezoid_cdt_keeps_count_with_convex_hull() {
    let mut tri = Triangulator::new(trapezoid_points());
    tri.set_segment_constraint(&[Point::new(0.0, 1.0), Point::new(9.0, 0.75)])
        .unwrap();
    tri.use_convex_hull_with_segments(true);
    tri.triangulate(false, TraceLevel::None).unwrap();
    // Same vertex set, same hull: the segment only re-routes diagonals.
    assert_eq!(tri.number_of_triangles(), 11);
    assert_eq!(tri.number_of_vertices(), 11);
}

#[test]
fn trapezoid_cdt_with_quality_refines() {
    let mut tri = Triangulator::new(trapezoid_points());
    tri.set_segment_constraint(&[Point::new(0.0, 1.0), Point::new(9.0, 0.75)])
        .unwrap();
    tri.use_convex_hull_with_segments(true);
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert!(tri.number_of_triangles() > 11);
    assert_quality(&tri, 20.0, None);
}

#[test]
fn trapezoid_cdt_with_holes() {
    let mut tri = Triangulator::new(trapezoid_points());
    tri.set_segment_constraint(&[Point::new(0.0, 1.0), Point::new(9.0, 0.75)])
        .unwrap();
    tri.use_convex_hull_with_segments(true);
    tri.set_holes_constraint(&[
        Point::new(5.0, 1.0),
        Point::new(5.0, 2.0),
        Point::new(6.0, 2.0),
        Point::new(6.0, 1.0),
    ])
    .unwrap();

    // The markers all sit above the constraining segment, so the whole
    // upper region floods away and the strip below it remains: a 6-vertex
    // polygon with no interior points, hence exactly 4 triangles.
    tri.triangulate(false, TraceLevel::None).unwrap();
    assert_eq!(tri.number_of_triangles(), 4);

    // With quality on, the surviving strip is refined instead.
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert!(tri.number_of_triangles() > 4);
    assert_quality(&tri, 20.0, None);

    // No surviving triangle reaches above the constraining segment.
    for face in tri.faces().unwrap() {
        let cy = (face.org().point.y + face.dest().point.y + face.apex().point.y) / 3.0;
        let cx = (face.org().point.x + face.dest().point.x + face.apex().point.x) / 3.0;
        assert!(cy < 1.0 - cx / 36.0 + 1.0e-9);
    }
}

#[test]
fn hole_without_segments_strips_the_whole_mesh() {
    let mut tri = Triangulator::new(trapezoid_points());
    tri.set_holes_constraint(&[Point::new(0.25, 0.25)]).unwrap();
    tri.triangulate(true, TraceLevel::None).unwrap();
    // Nothing stops the flood: every triangle is reachable from the marker.
    assert_eq!(tri.number_of_triangles(), 0);
    assert!(tri.has_triangulation());
}

// =============================================================================
// LETTER-A PSLG
// =============================================================================

#[test]
fn letter_a_points_only() {
    let mut tri = Triangulator::new(letter_a_points());
    tri.triangulate(false, TraceLevel::None).unwrap();
    assert_eq!(tri.number_of_triangles(), 12);
}

#[test]
fn letter_a_cdt_with_quality_strips_concavities() {
    let mut tri = Triangulator::new(letter_a_points());
    tri.set_segment_constraint(&letter_a_segments()).unwrap();
    tri.triangulate(true, TraceLevel::None).unwrap();
    assert!(tri.number_of_triangles() > 12);
    assert_quality(&tri, 20.0, None);

    // Concavity removal: every surviving centroid lies inside the outline.
    let outline = [
        Point::new(1.0, 0.0),
        Point::new(0.0, 0.0),
        Point::new(3.0, 3.0),
        Point::new(4.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(2.5, 1.0),
        Point::new(1.5, 1.0),
    ];
    for face in tri.faces().unwrap() {
        let centroid = Point::new(
            (face.org().point.x + face.dest().point.x + face.apex().point.x) / 3.0,
            (face.org().point.y + face.dest().point.y + face.apex().point.y) / 3.0,
        );
        assert!(
            inside_polygon(&outline, centroid),
            "triangle centroid {centroid:?} survived outside the outline"
        );
    }
}

#[test]
fn letter_a_conforming_splits_segments() {
    let mut tri = Triangulator::new(letter_a_points());
    tri.set_segment_constraint(&letter_a_segments()).unwrap();
    tri.use_convex_hull_with_segments(true);
    tri.triangulate_conforming(false, TraceLevel::None).unwrap();
    assert!(tri.has_triangulation());
    // Conforming subdivision may add Steiner points; all input vertices
    // are still present.
    assert!(tri.number_of_vertices() >= 10);
}

// =============================================================================
// EXPORT
// =============================================================================

#[test]
fn off_export_writes_a_parsable_file() {
    let mut tri = Triangulator::new(five_points());
    tri.triangulate(false, TraceLevel::None).unwrap();

    let path = std::env::temp_dir().join("trigen_scenario_export.off");
    tri.write_off(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("OFF"));
    let header: Vec<usize> = lines
        .next()
        .unwrap()
        .split_whitespace()
        .map(|t| t.parse().unwrap())
        .collect();
    assert_eq!(header, vec![5, 4, 8]);
}

#[test]
fn off_export_requires_a_triangulation() {
    let tri = Triangulator::new(five_points());
    let path = std::env::temp_dir().join("trigen_scenario_untriangulated.off");
    assert!(matches!(
        tri.write_off(&path),
        Err(TrigenError::StateViolation { .. })
    ));
}
