//! Jump-and-walk point location.
//!
//! Starting from a cached "hot" handle, the walk repeatedly crosses the
//! triangle edge whose far side holds the query point, as decided by the
//! exact orientation predicate. On the hull the walk can leave the mesh and
//! reports an outside handle. Expected cost is O(sqrt n) on random input;
//! a bounded step count falls back to a linear scan, so the worst case is
//! linear and the routine always terminates.

use crate::core::mesh::{lnext, EdgeHandle, Mesh};
use crate::geometry::point::Point;
use crate::geometry::predicates::{orient2d, Orientation};

/// Where a query point landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside the triangle on the handle's left.
    InTriangle(EdgeHandle),
    /// On the interior of the handle's edge.
    OnEdge(EdgeHandle),
    /// Coincident with the handle's origin vertex.
    OnVertex(EdgeHandle),
    /// Outside the mesh; the handle is the hull edge where the walk left.
    Outside(EdgeHandle),
}

/// Locates `q` in the current triangulation.
///
/// The walk starts from `start` when given, otherwise from the mesh's hot
/// handle. The hot handle is refreshed on success so nearby queries stay
/// cheap.
pub(crate) fn locate(mesh: &mut Mesh, q: Point, start: Option<EdgeHandle>) -> Location {
    let seed = start
        .filter(|h| mesh.contains_triangle(h.tri) && !mesh.is_dummy(*h))
        .or_else(|| {
            mesh.hot
                .filter(|h| mesh.contains_triangle(h.tri) && !mesh.is_dummy(*h))
        })
        .or_else(|| mesh.first_real_edge());
    let Some(seed) = seed else {
        return Location::Outside(mesh.dummy_edge());
    };

    let max_steps = 2 * mesh.finite_triangle_count() + 8;
    let mut e = EdgeHandle::new(seed.tri, 0);
    for step in 0..max_steps {
        if let Some(location) = classify_or_cross(mesh, e, q, step) {
            match location {
                Step::Done(location) => {
                    if let Location::InTriangle(h) | Location::OnEdge(h) | Location::OnVertex(h) =
                        location
                    {
                        mesh.hot = Some(h);
                    }
                    return location;
                }
                Step::Cross(next) => e = next,
            }
        }
    }

    // The directed walk exceeded its budget (possible only on adversarial
    // meshes); scan every triangle instead.
    linear_scan(mesh, q)
}

enum Step {
    Done(Location),
    Cross(EdgeHandle),
}

/// One walk step from the triangle on `e`: either classify `q` against it
/// or pick an edge to cross.
fn classify_or_cross(mesh: &Mesh, e: EdgeHandle, q: Point, step: usize) -> Option<Step> {
    let mut negative: [Option<EdgeHandle>; 2] = [None, None];
    let mut negative_count = 0;
    let mut zero_edge: Option<EdgeHandle> = None;
    let mut zero_count = 0;

    let mut h = e;
    for _ in 0..3 {
        let org = mesh.point_of(mesh.org(h));
        let dest = mesh.point_of(mesh.dest(h));
        match orient2d(org, dest, q) {
            Orientation::NEGATIVE => {
                if negative_count < 2 {
                    negative[negative_count] = Some(h);
                }
                negative_count += 1;
            }
            Orientation::DEGENERATE => {
                zero_edge = Some(h);
                zero_count += 1;
            }
            Orientation::POSITIVE => {}
        }
        h = lnext(h);
    }

    if negative_count == 0 {
        // Inside the closed triangle; zeros pin down edge or vertex hits.
        let location = match zero_count {
            0 => Location::InTriangle(e),
            1 => Location::OnEdge(zero_edge.expect("zero recorded")),
            _ => {
                // Two degenerate edges meet at the coincident vertex.
                let vertex_edge = on_vertex_edge(mesh, e, q);
                Location::OnVertex(vertex_edge)
            }
        };
        return Some(Step::Done(location));
    }

    // Cross a violating edge; alternate the choice when two qualify so the
    // walk cannot shuttle between a pair of triangles.
    let pick = if negative_count >= 2 && step % 2 == 1 {
        negative[1].expect("second negative recorded")
    } else {
        negative[0].expect("first negative recorded")
    };
    let across = mesh.sym(pick);
    if mesh.is_dummy(across) {
        return Some(Step::Done(Location::Outside(pick)));
    }
    Some(Step::Cross(across))
}

/// Finds the outgoing edge at the triangle corner coinciding with `q`.
fn on_vertex_edge(mesh: &Mesh, e: EdgeHandle, q: Point) -> EdgeHandle {
    let mut h = e;
    for _ in 0..3 {
        if mesh.point_of(mesh.org(h)).coincides_with(&q) {
            return h;
        }
        h = lnext(h);
    }
    // Unreachable for a consistent mesh; fall back to the anchor.
    e
}

/// Exhaustive fallback: test every triangle.
fn linear_scan(mesh: &mut Mesh, q: Point) -> Location {
    let keys: Vec<_> = mesh.triangle_keys().collect();
    for key in keys {
        let e = EdgeHandle::new(key, 0);
        if let Some(Step::Done(location)) = classify_only(mesh, e, q) {
            if let Location::InTriangle(h) | Location::OnEdge(h) | Location::OnVertex(h) = location
            {
                mesh.hot = Some(h);
            }
            return location;
        }
    }
    let hull = mesh
        .first_real_edge()
        .map_or_else(|| mesh.dummy_edge(), |e| first_hull_edge(mesh, e));
    Location::Outside(hull)
}

fn classify_only(mesh: &Mesh, e: EdgeHandle, q: Point) -> Option<Step> {
    let mut h = e;
    let mut zero_edge = None;
    let mut zero_count = 0;
    for _ in 0..3 {
        let org = mesh.point_of(mesh.org(h));
        let dest = mesh.point_of(mesh.dest(h));
        match orient2d(org, dest, q) {
            Orientation::NEGATIVE => return None,
            Orientation::DEGENERATE => {
                zero_edge = Some(h);
                zero_count += 1;
            }
            Orientation::POSITIVE => {}
        }
        h = lnext(h);
    }
    let location = match zero_count {
        0 => Location::InTriangle(e),
        1 => Location::OnEdge(zero_edge.expect("zero recorded")),
        _ => Location::OnVertex(on_vertex_edge(mesh, e, q)),
    };
    Some(Step::Done(location))
}

fn first_hull_edge(mesh: &Mesh, seed: EdgeHandle) -> EdgeHandle {
    for key in mesh.triangle_keys() {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            if mesh.is_dummy(mesh.sym(h)) {
                return h;
            }
        }
    }
    seed
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::VertexKind;

    /// A single counterclockwise triangle bonded to the dummy on all sides.
    fn one_triangle() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point::new(0.0, 0.0), VertexKind::Input(0));
        let b = mesh.add_vertex(Point::new(4.0, 0.0), VertexKind::Input(1));
        let c = mesh.add_vertex(Point::new(0.0, 4.0), VertexKind::Input(2));
        let t = mesh.make_triangle(a, b, c);
        for orient in 0..3 {
            mesh.bond_to_dummy(EdgeHandle::new(t, orient));
        }
        mesh.hot = mesh.first_real_edge();
        mesh
    }

    #[test]
    fn interior_point_is_in_triangle() {
        let mut mesh = one_triangle();
        match locate(&mut mesh, Point::new(1.0, 1.0), None) {
            Location::InTriangle(_) => {}
            other => panic!("expected InTriangle, got {other:?}"),
        }
    }

    #[test]
    fn point_on_edge_is_classified() {
        let mut mesh = one_triangle();
        match locate(&mut mesh, Point::new(2.0, 0.0), None) {
            Location::OnEdge(h) => {
                let org = mesh.point_of(mesh.org(h));
                let dest = mesh.point_of(mesh.dest(h));
                assert_eq!((org.y, dest.y), (0.0, 0.0));
            }
            other => panic!("expected OnEdge, got {other:?}"),
        }
    }

    #[test]
    fn corner_point_is_on_vertex() {
        let mut mesh = one_triangle();
        match locate(&mut mesh, Point::new(0.0, 4.0), None) {
            Location::OnVertex(h) => {
                assert!(mesh.point_of(mesh.org(h)).coincides_with(&Point::new(0.0, 4.0)));
            }
            other => panic!("expected OnVertex, got {other:?}"),
        }
    }

    #[test]
    fn exterior_point_is_outside() {
        let mut mesh = one_triangle();
        match locate(&mut mesh, Point::new(10.0, 10.0), None) {
            Location::Outside(h) => assert!(mesh.is_dummy(mesh.sym(h))),
            other => panic!("expected Outside, got {other:?}"),
        }
    }

    #[test]
    fn empty_mesh_reports_outside() {
        let mut mesh = Mesh::new();
        match locate(&mut mesh, Point::new(0.0, 0.0), None) {
            Location::Outside(h) => assert!(mesh.is_dummy(h)),
            other => panic!("expected Outside, got {other:?}"),
        }
    }
}
