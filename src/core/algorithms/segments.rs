//! Segment enforcement: constrained and conforming Delaunay.
//!
//! The constrained path carves each missing segment into the mesh directly:
//! walk the triangles crossed by the segment, delete them, and
//! retriangulate the two pseudo-polygons above and below the new edge by
//! the recursive empty-circumcircle rule. The conforming path never carves;
//! it bisects the segment with Steiner midpoints until every piece shows up
//! as a Delaunay edge of its own accord.
//!
//! A vertex lying exactly on a segment splits the segment there, on both
//! paths. A segment crossing an existing subsegment is an input-contract
//! violation and aborts before any mutation.

use log::debug;

use crate::core::collections::{FastHashMap, FastHashSet};
use crate::core::locate::{locate, Location};
use crate::core::mesh::{lnext, lprev, EdgeHandle, Mesh, SubsegKey, TriangleKey, VertexId, VertexKind};
use crate::core::triangulator::{TraceLevel, TrigenError};
use crate::geometry::predicates::{incircle, orient2d, InCircle, Orientation};

/// Bisection depth bound for conforming insertion. Halving a segment this
/// many times exhausts the mantissa long before the loop does.
const MAX_SPLIT_DEPTH: u32 = 48;

/// Enforces every segment, by carving (CDT) or by conforming subdivision.
pub(crate) fn insert_segments(
    mesh: &mut Mesh,
    pairs: &[[VertexId; 2]],
    conforming: bool,
    trace: TraceLevel,
) -> Result<(), TrigenError> {
    for pair in pairs {
        if trace >= TraceLevel::Vertex {
            debug!("enforcing segment {:?} -> {:?}", pair[0], pair[1]);
        }
        if conforming {
            insert_conforming(mesh, pair[0], pair[1])?;
        } else {
            insert_constrained(mesh, pair[0], pair[1])?;
        }
    }
    if conforming {
        // A piece marked early can be driven non-Delaunay by a later
        // insertion, which its own mark then shields from flipping. Keep
        // splitting such pieces until every one is Delaunay in its own
        // right; only then is the whole mesh a true Delaunay triangulation.
        conform_subsegments(mesh)?;
    }
    Ok(())
}

/// Splits every subsegment whose edge violates the local Delaunay
/// condition, repeating until none does.
fn conform_subsegments(mesh: &mut Mesh) -> Result<(), TrigenError> {
    let mut rounds = 0u32;
    loop {
        let offenders: Vec<SubsegKey> = mesh
            .subseg_keys()
            .filter(|&s| {
                let sub = mesh.subsegment(s);
                let e0 = sub.edges[0];
                let e1 = sub.edges[1];
                if mesh.is_dummy(e0) || mesh.is_dummy(e1) {
                    return false;
                }
                let a = mesh.point_of(mesh.org(e0));
                let b = mesh.point_of(mesh.dest(e0));
                let c = mesh.point_of(mesh.apex(e0));
                let d = mesh.point_of(mesh.apex(e1));
                incircle(a, b, c, d) == InCircle::INSIDE
            })
            .collect();
        if offenders.is_empty() {
            return Ok(());
        }
        rounds += 1;
        if rounds > MAX_SPLIT_DEPTH {
            return Err(TrigenError::NumericFailure {
                message: "conforming subdivision reached sub-ULP segment lengths".to_string(),
            });
        }
        let mut stack: Vec<EdgeHandle> = Vec::new();
        for s in offenders {
            if !mesh.contains_subsegment(s) {
                continue;
            }
            let anchor = mesh.subseg_anchor(s);
            let pa = mesh.point_of(mesh.org(anchor));
            let pb = mesh.point_of(mesh.dest(anchor));
            let m = pa.midpoint(&pb);
            if m.coincides_with(&pa) || m.coincides_with(&pb) {
                return Err(TrigenError::NumericFailure {
                    message: "conforming subdivision reached sub-ULP segment lengths".to_string(),
                });
            }
            let v = mesh.add_vertex(m, VertexKind::Steiner);
            stack.clear();
            stack.extend(mesh.split_edge(anchor, v).link_edges);
            mesh.legalize(&mut stack);
        }
    }
}

// =============================================================================
// CONSTRAINED (CDT) PATH
// =============================================================================

/// Outcome of probing the fan at a segment origin.
enum Crossing {
    /// The segment leaves through the interior of this fan triangle.
    Triangle(EdgeHandle),
    /// A vertex lies exactly on the segment; split there.
    Vertex(VertexId),
}

fn insert_constrained(mesh: &mut Mesh, a0: VertexId, b0: VertexId) -> Result<(), TrigenError> {
    let mut work: Vec<(VertexId, VertexId)> = vec![(a0, b0)];
    while let Some((a, b)) = work.pop() {
        if a == b {
            return Err(TrigenError::InvalidInput {
                message: "segment endpoints coincide".to_string(),
            });
        }
        if let Some(h) = mesh.find_edge(a, b) {
            mesh.make_subsegment(h);
            continue;
        }
        match find_crossing(mesh, a, b)? {
            Crossing::Vertex(w) => {
                work.push((a, w));
                work.push((w, b));
            }
            Crossing::Triangle(e) => {
                if let Some(w) = carve_segment(mesh, a, b, e)? {
                    // The walk met a vertex exactly on the segment before
                    // touching anything; split and retry.
                    work.push((a, w));
                    work.push((w, b));
                }
            }
        }
    }
    Ok(())
}

/// Finds the fan triangle at `a` through which the segment toward `b`
/// leaves, or a vertex lying exactly on the segment.
fn find_crossing(mesh: &Mesh, a: VertexId, b: VertexId) -> Result<Crossing, TrigenError> {
    let pa = mesh.point_of(a);
    let pb = mesh.point_of(b);
    let on_ray = |p: crate::geometry::point::Point| -> bool {
        (p.x - pa.x) * (pb.x - pa.x) + (p.y - pa.y) * (pb.y - pa.y) > 0.0
    };

    for e in mesh.edges_around(a) {
        let x = mesh.dest(e);
        let y = mesh.apex(e);
        let px = mesh.point_of(x);
        let py = mesh.point_of(y);
        let side_x = orient2d(pa, px, pb);
        let side_y = orient2d(pa, pb, py);
        if side_x == Orientation::DEGENERATE && on_ray(px) {
            return Ok(Crossing::Vertex(x));
        }
        if side_y == Orientation::DEGENERATE && on_ray(py) {
            return Ok(Crossing::Vertex(y));
        }
        if side_x == Orientation::POSITIVE && side_y == Orientation::POSITIVE {
            return Ok(Crossing::Triangle(e));
        }
    }
    Err(TrigenError::InvalidInput {
        message: "segment leaves the triangulated region".to_string(),
    })
}

/// Deletes the triangles crossed by the segment `(a, b)` and retriangulates
/// the two flanking pseudo-polygons. Returns a vertex to split at instead,
/// when one turns out to lie exactly on the segment (nothing is mutated in
/// that case).
fn carve_segment(
    mesh: &mut Mesh,
    a: VertexId,
    b: VertexId,
    entry: EdgeHandle,
) -> Result<Option<VertexId>, TrigenError> {
    let pa = mesh.point_of(a);
    let pb = mesh.point_of(b);

    // Read-only walk along the segment, gathering the crossed sleeve.
    let mut sleeve: Vec<TriangleKey> = vec![entry.tri];
    let mut left: Vec<VertexId> = vec![mesh.apex(entry)];
    let mut right: Vec<VertexId> = vec![mesh.dest(entry)];
    let mut cur = lnext(entry);
    loop {
        if mesh.subseg(cur).is_some() {
            return Err(TrigenError::InvalidInput {
                message: "segments intersect away from their endpoints".to_string(),
            });
        }
        let hs = mesh.sym(cur);
        if mesh.is_dummy(hs) {
            return Err(TrigenError::InvalidInput {
                message: "segment leaves the triangulated region".to_string(),
            });
        }
        sleeve.push(hs.tri);
        let w = mesh.apex(hs);
        if w == b {
            break;
        }
        match orient2d(pa, pb, mesh.point_of(w)) {
            Orientation::DEGENERATE => return Ok(Some(w)),
            Orientation::POSITIVE => {
                left.push(w);
                cur = lnext(hs);
            }
            Orientation::NEGATIVE => {
                right.push(w);
                cur = lprev(hs);
            }
        }
    }

    // Record the sleeve boundary before deleting: key is the direction of
    // the doomed inner edge, value the outside handle and any subsegment
    // riding on the boundary.
    let sleeve_set: FastHashSet<TriangleKey> = sleeve.iter().copied().collect();
    let mut outer: FastHashMap<(VertexId, VertexId), (EdgeHandle, Option<SubsegKey>)> =
        FastHashMap::default();
    for &t in &sleeve {
        for orient in 0..3 {
            let h = EdgeHandle::new(t, orient);
            let hs = mesh.sym(h);
            if mesh.is_dummy(hs) || !sleeve_set.contains(&hs.tri) {
                outer.insert((mesh.org(h), mesh.dest(h)), (hs, mesh.subseg(h)));
            }
        }
    }
    for &t in &sleeve {
        mesh.remove_triangle(t);
    }

    let mut pending: FastHashMap<(VertexId, VertexId), EdgeHandle> = FastHashMap::default();
    triangulate_cavity(mesh, a, b, &left, &mut outer, &mut pending);
    let right_reversed: Vec<VertexId> = right.iter().rev().copied().collect();
    triangulate_cavity(mesh, b, a, &right_reversed, &mut outer, &mut pending);
    debug_assert!(outer.is_empty(), "unbonded cavity boundary edges remain");
    debug_assert!(pending.is_empty(), "unpaired interior cavity edges remain");

    let h = mesh
        .find_edge(a, b)
        .expect("cavity retriangulation produced the constrained edge");
    mesh.make_subsegment(h);
    Ok(None)
}

/// Retriangulates the pseudo-polygon left of the base `(a, b)` with the
/// chain vertices, picking at each level the vertex whose circumcircle with
/// the base is empty of the rest of the chain.
fn triangulate_cavity(
    mesh: &mut Mesh,
    a: VertexId,
    b: VertexId,
    chain: &[VertexId],
    outer: &mut FastHashMap<(VertexId, VertexId), (EdgeHandle, Option<SubsegKey>)>,
    pending: &mut FastHashMap<(VertexId, VertexId), EdgeHandle>,
) {
    if chain.is_empty() {
        return;
    }
    let pa = mesh.point_of(a);
    let pb = mesh.point_of(b);
    let mut ci = 0;
    for k in 1..chain.len() {
        if incircle(pa, pb, mesh.point_of(chain[ci]), mesh.point_of(chain[k])) == InCircle::INSIDE
        {
            ci = k;
        }
    }
    let c = chain[ci];

    // Stored as [c, a, b]: edge 0 = a -> b (base), 1 = b -> c, 2 = c -> a.
    let t = mesh.make_triangle(c, a, b);
    for orient in 0..3 {
        resolve_cavity_bond(mesh, EdgeHandle::new(t, orient), outer, pending);
    }
    triangulate_cavity(mesh, a, c, &chain[..ci], outer, pending);
    triangulate_cavity(mesh, c, b, &chain[ci + 1..], outer, pending);
}

/// Bonds a freshly created cavity edge to its partner: the preserved
/// outside neighbor when the edge lies on the sleeve boundary, or the
/// matching inner edge once both sides of it have been built.
fn resolve_cavity_bond(
    mesh: &mut Mesh,
    h: EdgeHandle,
    outer: &mut FastHashMap<(VertexId, VertexId), (EdgeHandle, Option<SubsegKey>)>,
    pending: &mut FastHashMap<(VertexId, VertexId), EdgeHandle>,
) {
    let key = (mesh.org(h), mesh.dest(h));
    if let Some((outside, subseg)) = outer.remove(&key) {
        if mesh.is_dummy(outside) {
            mesh.bond_to_dummy(h);
        } else {
            mesh.bond(h, outside);
        }
        if let Some(s) = subseg {
            mesh.attach_subseg(h, s);
        }
        return;
    }
    if let Some(partner) = pending.remove(&(key.1, key.0)) {
        mesh.bond(h, partner);
        return;
    }
    pending.insert(key, h);
}

/// Walks the segment `(a, b)` read-only and reports the first vertex lying
/// exactly on it, if any. Shared by both enforcement paths: a segment is
/// always split at such a vertex before anything else happens.
fn scan_on_segment_vertex(
    mesh: &Mesh,
    a: VertexId,
    b: VertexId,
) -> Result<Option<VertexId>, TrigenError> {
    let entry = match find_crossing(mesh, a, b)? {
        Crossing::Vertex(w) => return Ok(Some(w)),
        Crossing::Triangle(e) => e,
    };
    let pa = mesh.point_of(a);
    let pb = mesh.point_of(b);
    let mut cur = lnext(entry);
    loop {
        if mesh.subseg(cur).is_some() {
            return Err(TrigenError::InvalidInput {
                message: "segments intersect away from their endpoints".to_string(),
            });
        }
        let hs = mesh.sym(cur);
        if mesh.is_dummy(hs) {
            return Err(TrigenError::InvalidInput {
                message: "segment leaves the triangulated region".to_string(),
            });
        }
        let w = mesh.apex(hs);
        if w == b {
            return Ok(None);
        }
        match orient2d(pa, pb, mesh.point_of(w)) {
            Orientation::DEGENERATE => return Ok(Some(w)),
            Orientation::POSITIVE => cur = lnext(hs),
            Orientation::NEGATIVE => cur = lprev(hs),
        }
    }
}

// =============================================================================
// CONFORMING PATH
// =============================================================================

fn insert_conforming(mesh: &mut Mesh, a0: VertexId, b0: VertexId) -> Result<(), TrigenError> {
    let mut work: Vec<(VertexId, VertexId, u32)> = vec![(a0, b0, 0)];
    let mut stack: Vec<EdgeHandle> = Vec::new();
    while let Some((a, b, depth)) = work.pop() {
        if let Some(h) = mesh.find_edge(a, b) {
            mesh.make_subsegment(h);
            continue;
        }
        // A vertex sitting exactly on the segment splits it outright;
        // bisection can never terminate across it.
        if let Some(w) = scan_on_segment_vertex(mesh, a, b)? {
            work.push((a, w, depth));
            work.push((w, b, depth));
            continue;
        }
        if depth >= MAX_SPLIT_DEPTH {
            return Err(TrigenError::NumericFailure {
                message: "conforming subdivision reached sub-ULP segment lengths".to_string(),
            });
        }
        let pa = mesh.point_of(a);
        let pb = mesh.point_of(b);
        let m = pa.midpoint(&pb);
        if m.coincides_with(&pa) || m.coincides_with(&pb) {
            return Err(TrigenError::NumericFailure {
                message: "conforming subdivision reached sub-ULP segment lengths".to_string(),
            });
        }

        let v = mesh.add_vertex(m, VertexKind::Steiner);
        let start = mesh.vertex_edge(a);
        match locate(mesh, m, start) {
            Location::InTriangle(h) => {
                stack.clear();
                stack.extend(mesh.split_triangle(h, v));
                mesh.legalize(&mut stack);
            }
            Location::OnEdge(h) => {
                if mesh.subseg(h).is_some() {
                    return Err(TrigenError::InvalidInput {
                        message: "segments intersect away from their endpoints".to_string(),
                    });
                }
                stack.clear();
                stack.extend(mesh.split_edge(h, v).link_edges);
                mesh.legalize(&mut stack);
            }
            Location::OnVertex(h) => {
                let w = mesh.org(h);
                mesh.pop_vertex(v);
                work.push((a, w, depth + 1));
                work.push((w, b, depth + 1));
                continue;
            }
            Location::Outside(_) => {
                return Err(TrigenError::NumericFailure {
                    message: "segment midpoint escaped the mesh".to_string(),
                });
            }
        }
        work.push((a, v, depth + 1));
        work.push((v, b, depth + 1));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental::build_delaunay;
    use crate::geometry::point::Point;

    /// A 3 x 3 grid; the center column is offset so the diagonal from the
    /// lower-left corner to the upper-right corner is not a Delaunay edge.
    fn grid_mesh() -> (Mesh, Vec<VertexId>) {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.1, 0.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(0.9, 1.1),
            Point::new(2.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 2.0),
        ];
        let mut mesh = Mesh::new();
        let output = build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        (mesh, output.vertex_of_input)
    }

    #[test]
    fn existing_edge_is_marked_without_restructuring() {
        let (mut mesh, v) = grid_mesh();
        let before = mesh.finite_triangle_count();
        // A boundary edge of the grid is always a Delaunay edge.
        insert_segments(&mut mesh, &[[v[0], v[1]]], false, TraceLevel::None).unwrap();
        assert_eq!(mesh.finite_triangle_count(), before);
        assert_eq!(mesh.subseg_count(), 1);
        let h = mesh.find_edge(v[0], v[1]).unwrap();
        assert!(mesh.subseg(h).is_some());
    }

    #[test]
    fn carved_segment_appears_as_an_edge() {
        let (mut mesh, v) = grid_mesh();
        assert!(mesh.find_edge(v[0], v[8]).is_none());
        insert_segments(&mut mesh, &[[v[0], v[8]]], false, TraceLevel::None).unwrap();
        assert!(mesh.is_valid().is_ok());
        let h = mesh.find_edge(v[0], v[8]).unwrap();
        assert!(mesh.subseg(h).is_some());
    }

    #[test]
    fn carving_preserves_triangle_count_on_a_convex_set() {
        let (mut mesh, v) = grid_mesh();
        let before = mesh.finite_triangle_count();
        insert_segments(&mut mesh, &[[v[2], v[6]]], false, TraceLevel::None).unwrap();
        assert!(mesh.is_valid().is_ok());
        assert!(mesh.find_edge(v[2], v[6]).is_some() || {
            // The anti-diagonal may pass through the center vertex too.
            mesh.find_edge(v[2], v[4]).is_some() && mesh.find_edge(v[4], v[6]).is_some()
        });
        // Same vertex set, same hull: the count is fixed by Euler's formula.
        assert_eq!(mesh.finite_triangle_count(), before);
    }

    #[test]
    fn crossing_segments_are_rejected() {
        let (mut mesh, v) = grid_mesh();
        insert_segments(&mut mesh, &[[v[3], v[1]]], false, TraceLevel::None).unwrap();
        let result = insert_segments(&mut mesh, &[[v[0], v[4]]], false, TraceLevel::None);
        assert!(matches!(result, Err(TrigenError::InvalidInput { .. })));
    }

    #[test]
    fn conforming_insertion_splits_with_steiner_points() {
        let (mut mesh, v) = grid_mesh();
        let vertices_before = mesh.finite_vertex_count();
        insert_segments(&mut mesh, &[[v[0], v[5]]], true, TraceLevel::None).unwrap();
        assert!(mesh.is_valid().is_ok());
        assert!(mesh.subseg_count() >= 2);
        assert!(mesh.finite_vertex_count() > vertices_before);
        // Every subsegment must coincide with a mesh edge.
        for s in mesh.subseg_keys().collect::<Vec<_>>() {
            let [p, q] = mesh.subsegment(s).vertices;
            assert!(mesh.find_edge(p, q).is_some());
        }
    }
}
