//! Voronoi diagram extraction, dual to the Delaunay triangulation.
//!
//! Precondition (checked by the facade): the mesh is a pure Delaunay
//! triangulation with a convex outline and no holes. Every triangle
//! contributes one Voronoi vertex at its circumcenter; every mesh edge
//! contributes one Voronoi edge, finite between two real triangles and a
//! semi-infinite ray across a hull edge, carrying the hull edge's outward
//! normal in place of the missing endpoint.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::core::mesh::{EdgeHandle, Mesh};
use crate::core::triangulator::TrigenError;
use crate::geometry::point::Point;
use crate::geometry::predicates::circumcenter;

/// Far end of a Voronoi edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VoronoiEnd {
    /// Index of the terminating Voronoi vertex.
    Finite(usize),
    /// The edge is a ray; the payload is the unit outward normal of the
    /// hull edge it crosses.
    Infinite(Point),
}

/// One edge of the Voronoi diagram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiEdge {
    /// Index of the Voronoi vertex the edge starts from.
    pub origin: usize,
    /// The far end: a second vertex index, or a ray direction.
    pub end: VoronoiEnd,
}

/// The extracted dual diagram.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VoronoiDiagram {
    /// Voronoi vertices; entry `i` is the circumcenter of the `i`-th
    /// triangle in iteration order.
    pub points: Vec<Point>,
    /// Voronoi edges, one per mesh edge.
    pub edges: Vec<VoronoiEdge>,
}

/// Extracts the dual of the current triangulation.
pub(crate) fn extract(mesh: &Mesh) -> Result<VoronoiDiagram, TrigenError> {
    let mut index: SecondaryMap<crate::core::mesh::TriangleKey, usize> = SecondaryMap::new();
    let mut points = Vec::with_capacity(mesh.finite_triangle_count());
    for key in mesh.triangle_keys() {
        let [v0, v1, v2] = mesh.triangle_vertices(key);
        let center = circumcenter(
            mesh.point_of(v0),
            mesh.point_of(v1),
            mesh.point_of(v2),
        )
        .ok_or_else(|| TrigenError::NumericFailure {
            message: "degenerate triangle has no circumcenter".to_string(),
        })?;
        index.insert(key, points.len());
        points.push(center);
    }

    let mut edges = Vec::new();
    for key in mesh.triangle_keys() {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            let hs = mesh.sym(h);
            if mesh.is_dummy(hs) {
                let org = mesh.point_of(mesh.org(h));
                let dest = mesh.point_of(mesh.dest(h));
                let dx = dest.x - org.x;
                let dy = dest.y - org.y;
                let len = (dx * dx + dy * dy).sqrt();
                // Interior is on the edge's left; the outward normal points
                // right.
                let normal = Point::new(dy / len, -dx / len);
                edges.push(VoronoiEdge {
                    origin: index[key],
                    end: VoronoiEnd::Infinite(normal),
                });
            } else if index[key] < index[hs.tri] {
                edges.push(VoronoiEdge {
                    origin: index[key],
                    end: VoronoiEnd::Finite(index[hs.tri]),
                });
            }
        }
    }

    Ok(VoronoiDiagram { points, edges })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental::build_delaunay;
    use crate::core::triangulator::TraceLevel;
    use approx::assert_relative_eq;

    #[test]
    fn dual_of_a_single_triangle() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        let diagram = extract(&mesh).unwrap();
        assert_eq!(diagram.points.len(), 1);
        assert_relative_eq!(diagram.points[0].x, 1.0);
        assert_relative_eq!(diagram.points[0].y, 1.0);
        // All three edges are rays.
        assert_eq!(diagram.edges.len(), 3);
        assert!(diagram
            .edges
            .iter()
            .all(|e| matches!(e.end, VoronoiEnd::Infinite(_))));
    }

    #[test]
    fn edge_counts_match_the_primal_mesh() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(3.0, 3.0),
            Point::new(1.5, 2.125),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        let diagram = extract(&mesh).unwrap();
        assert_eq!(diagram.points.len(), mesh.finite_triangle_count());
        assert_eq!(diagram.edges.len(), mesh.edge_count());
        let rays = diagram
            .edges
            .iter()
            .filter(|e| matches!(e.end, VoronoiEnd::Infinite(_)))
            .count();
        assert_eq!(rays, mesh.hull_edge_count());
    }

    #[test]
    fn ray_normals_are_unit_length() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(2.0, 1.0),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        let diagram = extract(&mesh).unwrap();
        for edge in &diagram.edges {
            if let VoronoiEnd::Infinite(n) = edge.end {
                assert_relative_eq!(n.x * n.x + n.y * n.y, 1.0, epsilon = 1.0e-12);
            }
        }
    }

    #[test]
    fn bottom_hull_ray_points_down() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 2.0),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        let diagram = extract(&mesh).unwrap();
        // Exactly one ray must point straight down, across the bottom edge.
        let down = diagram.edges.iter().any(|e| {
            matches!(e.end, VoronoiEnd::Infinite(n) if n.y < -0.99 && n.x.abs() < 1.0e-9)
        });
        assert!(down);
    }
}
