//! Ruppert-style quality refinement.
//!
//! Two work queues drive the loop. Encroached subsegments have strict
//! priority: while any subsegment has a vertex inside its diametral lens,
//! it is split. Only when that queue is empty is a skinny triangle popped
//! and its circumcenter offered for insertion; a circumcenter that would
//! encroach on a subsegment is not inserted, the subsegments are split
//! instead and the triangle comes back around.
//!
//! Segments meeting at small angles get the usual pair of safeguards:
//! splits near a junction land on power-of-two shells rather than
//! midpoints, and a triangle whose smallest angle is an input angle
//! (pinched between two subsegments) is never queued as skinny.
//!
//! Queues hold `(key, vertex-triple)` pairs and revalidate on pop, because
//! structural edits re-anchor handles (flips rewrite triangles in place).
//! A hard cap on the number of insertions, a high multiple of the initial
//! triangle count, turns a non-terminating refinement (angle bound too
//! aggressive for the precision available) into a reported numeric failure
//! instead of a hang.

use std::collections::VecDeque;

use log::{debug, info};

use crate::core::locate::{locate, Location};
use crate::core::mesh::{EdgeHandle, Mesh, SubsegKey, TriangleKey, VertexId, VertexKind};
use crate::core::triangulator::{TraceLevel, TrigenError};
use crate::geometry::point::Point;
use crate::geometry::predicates::{circumcenter, signed_area, smallest_angle_degrees};

/// Insertion budget per initial triangle.
const CAP_FACTOR: usize = 256;
/// Insertion budget floor for tiny inputs.
const CAP_BASE: usize = 4096;

/// The quality bounds a refined mesh must meet.
#[derive(Clone, Copy, Debug)]
pub(crate) struct QualityBounds {
    /// Minimum triangle angle, in degrees.
    pub min_angle_deg: f64,
    /// Maximum triangle area, if bounded.
    pub max_area: Option<f64>,
}

impl QualityBounds {
    fn is_skinny(&self, mesh: &Mesh, key: TriangleKey) -> bool {
        let [v0, v1, v2] = mesh.triangle_vertices(key);
        let (a, b, c) = (mesh.point_of(v0), mesh.point_of(v1), mesh.point_of(v2));
        if let Some(max) = self.max_area {
            if signed_area(a, b, c) > max {
                return true;
            }
        }
        if smallest_angle_degrees(a, b, c) >= self.min_angle_deg {
            return false;
        }
        // A smallest angle pinched between two subsegments is an input
        // angle; no number of insertions can open it. Leave it be.
        let apex = smallest_angle_apex(a, b, c);
        let flank1 = EdgeHandle::new(key, (apex + 1) % 3);
        let flank2 = EdgeHandle::new(key, (apex + 2) % 3);
        mesh.subseg(flank1).is_none() || mesh.subseg(flank2).is_none()
    }
}

/// Index (0, 1, or 2) of the vertex holding the triangle's smallest angle.
/// The angle at vertex `i` is the one facing edge `i`.
fn smallest_angle_apex(a: Point, b: Point, c: Point) -> u8 {
    let l0 = b.distance_squared(&c);
    let l1 = c.distance_squared(&a);
    let l2 = a.distance_squared(&b);
    // Smallest angle faces the shortest edge.
    if l0 <= l1 && l0 <= l2 {
        0
    } else if l1 <= l2 {
        1
    } else {
        2
    }
}

/// Refines the mesh in place until no subsegment is encroached and no
/// triangle is skinny, or the insertion cap trips.
pub(crate) fn refine(
    mesh: &mut Mesh,
    bounds: &QualityBounds,
    trace: TraceLevel,
) -> Result<(), TrigenError> {
    let initial = mesh.finite_triangle_count();
    let cap = initial.saturating_mul(CAP_FACTOR).max(CAP_BASE);
    let mut insertions = 0usize;

    let mut encroached: VecDeque<SubsegKey> = mesh.subseg_keys().collect();
    let mut skinny: VecDeque<(TriangleKey, [VertexId; 3])> = mesh
        .triangle_keys()
        .map(|k| (k, mesh.triangle_vertices(k)))
        .collect();

    loop {
        // Subsegments first, always.
        if let Some(s) = encroached.pop_front() {
            if !mesh.contains_subsegment(s) || !is_encroached(mesh, s, bounds) {
                continue;
            }
            split_subsegment(mesh, s, bounds, &mut encroached, &mut skinny)?;
            insertions += 1;
            if insertions > cap {
                return Err(cap_exceeded(insertions));
            }
            continue;
        }

        let Some((key, verts)) = skinny.pop_front() else {
            break;
        };
        if !mesh.contains_triangle(key)
            || mesh.triangle_vertices(key) != verts
            || !bounds.is_skinny(mesh, key)
        {
            continue;
        }

        let [v0, v1, v2] = verts;
        let center = circumcenter(
            mesh.point_of(v0),
            mesh.point_of(v1),
            mesh.point_of(v2),
        )
        .ok_or_else(|| TrigenError::NumericFailure {
            message: "skinny triangle degenerated below representable precision".to_string(),
        })?;

        // Ruppert's deferral: a circumcenter inside some diametral circle
        // is withheld, and those subsegments split in its stead. The split
        // is unconditional; the rejected point itself is the encroaching
        // witness, whether or not a mesh vertex is inside yet.
        let offended: Vec<SubsegKey> = mesh
            .subseg_keys()
            .filter(|&s| {
                let [p, q] = mesh.subsegment(s).vertices;
                lens_encroaches(
                    mesh.point_of(p),
                    mesh.point_of(q),
                    center,
                    bounds.min_angle_deg,
                )
            })
            .collect();
        if !offended.is_empty() {
            for s in offended {
                if !mesh.contains_subsegment(s) {
                    continue;
                }
                split_subsegment(mesh, s, bounds, &mut encroached, &mut skinny)?;
                insertions += 1;
                if insertions > cap {
                    return Err(cap_exceeded(insertions));
                }
            }
            skinny.push_back((key, verts));
            continue;
        }

        let anchor = EdgeHandle::new(key, 0);
        let v = mesh.add_vertex(center, VertexKind::Steiner);
        let mut stack: Vec<EdgeHandle> = Vec::new();
        match locate(mesh, center, Some(anchor)) {
            Location::InTriangle(h) => {
                stack.extend(mesh.split_triangle(h, v));
            }
            Location::OnEdge(h) => {
                if let Some(s) = mesh.subseg(h) {
                    // Landed exactly on a constrained edge: treat it as
                    // encroached rather than inserting on it.
                    mesh.pop_vertex(v);
                    encroached.push_back(s);
                    skinny.push_back((key, verts));
                    continue;
                }
                stack.extend(mesh.split_edge(h, v).link_edges);
            }
            Location::OnVertex(_) => {
                // A previous insertion already sits there; nothing to do.
                mesh.pop_vertex(v);
                continue;
            }
            Location::Outside(exit) => {
                // The walk left the mesh through a boundary subsegment:
                // the withheld circumcenter encroaches it, so split it and
                // retry the triangle.
                mesh.pop_vertex(v);
                if let Some(s) = mesh.subseg(exit) {
                    split_subsegment(mesh, s, bounds, &mut encroached, &mut skinny)?;
                    insertions += 1;
                    if insertions > cap {
                        return Err(cap_exceeded(insertions));
                    }
                    skinny.push_back((key, verts));
                } else {
                    debug!("circumcenter escaped across an unconstrained boundary; skipping");
                }
                continue;
            }
        }
        mesh.legalize(&mut stack);
        insertions += 1;
        if insertions > cap {
            return Err(cap_exceeded(insertions));
        }
        enqueue_around(mesh, v, bounds, &mut encroached, &mut skinny);
    }

    if trace >= TraceLevel::Info {
        info!(
            "refinement inserted {insertions} Steiner point(s); {} triangles",
            mesh.finite_triangle_count()
        );
    }
    Ok(())
}

fn cap_exceeded(insertions: usize) -> TrigenError {
    TrigenError::NumericFailure {
        message: format!(
            "refinement exceeded its insertion budget after {insertions} points; \
             the angle bound is too aggressive for this input"
        ),
    }
}

/// Where to split subsegment `s`, whose endpoints sit at `pp` and `pq`.
fn split_position(mesh: &Mesh, s: SubsegKey, pp: Point, pq: Point) -> Point {
    let [p, q] = mesh.subsegment(s).vertices;
    let junction_p = joins_another_subsegment(mesh, s, p);
    let junction_q = joins_another_subsegment(mesh, s, q);
    if !junction_p && !junction_q {
        return pp.midpoint(&pq);
    }
    let length = pp.distance_squared(&pq).sqrt();
    let mut shell = 1.0f64;
    while length > 3.0 * shell {
        shell *= 2.0;
    }
    while length < 1.5 * shell {
        shell /= 2.0;
    }
    // Measure the shell from the junction end; from the origin when both
    // ends are junctions.
    let t = if junction_p { shell / length } else { 1.0 - shell / length };
    Point::new(pp.x + t * (pq.x - pp.x), pp.y + t * (pq.y - pp.y))
}

fn joins_another_subsegment(mesh: &Mesh, s: SubsegKey, v: VertexId) -> bool {
    mesh.subseg_keys()
        .any(|k| k != s && mesh.subsegment(k).vertices.contains(&v))
}

/// Diametral-lens encroachment: `p` encroaches the segment `(a, b)` when
/// it sees the segment under an angle greater than `180° - 2·min_angle`.
///
/// The full diametral circle (a 90° threshold) triggers split ping-pong
/// between segments meeting at a small angle; the lens keeps exactly the
/// encroachments whose split can still help the angle bound.
fn lens_encroaches(a: Point, b: Point, p: Point, min_angle_deg: f64) -> bool {
    let dx1 = a.x - p.x;
    let dy1 = a.y - p.y;
    let dx2 = b.x - p.x;
    let dy2 = b.y - p.y;
    let dot = dx1 * dx2 + dy1 * dy2;
    if dot >= 0.0 {
        return false;
    }
    // cos(2·min_angle), nonnegative for every accepted angle bound.
    let cos_angle = min_angle_deg.to_radians().cos();
    let bound = 2.0 * cos_angle * cos_angle - 1.0;
    let l1 = dx1 * dx1 + dy1 * dy1;
    let l2 = dx2 * dx2 + dy2 * dy2;
    dot * dot >= bound * bound * l1 * l2
}

/// The apex shortcut: on a constrained Delaunay mesh, if any vertex lies in
/// the diametral lens then the nearer bonded apex does too.
fn is_encroached(mesh: &Mesh, s: SubsegKey, bounds: &QualityBounds) -> bool {
    let sub = mesh.subsegment(s);
    let [p, q] = sub.vertices;
    let pp = mesh.point_of(p);
    let pq = mesh.point_of(q);
    for side in sub.edges {
        if mesh.is_dummy(side) || !mesh.contains_triangle(side.tri) {
            continue;
        }
        let apex = mesh.apex(side);
        if lens_encroaches(pp, pq, mesh.point_of(apex), bounds.min_angle_deg) {
            return true;
        }
    }
    false
}

/// Splits subsegment `s` and requeues what the split disturbed.
///
/// The split point is the midpoint, except near a segment junction: there
/// the near piece is rounded to a power-of-two length (concentric shells),
/// so pieces of segments meeting at a small angle stop encroaching on one
/// another and the split cascade bottoms out.
fn split_subsegment(
    mesh: &mut Mesh,
    s: SubsegKey,
    bounds: &QualityBounds,
    encroached: &mut VecDeque<SubsegKey>,
    skinny: &mut VecDeque<(TriangleKey, [VertexId; 3])>,
) -> Result<(), TrigenError> {
    let [p, q] = mesh.subsegment(s).vertices;
    let pp = mesh.point_of(p);
    let pq = mesh.point_of(q);
    let mid = split_position(mesh, s, pp, pq);
    if mid.coincides_with(&pp) || mid.coincides_with(&pq) {
        return Err(TrigenError::NumericFailure {
            message: "subsegment split point collapsed onto an endpoint".to_string(),
        });
    }

    let anchor = mesh.subseg_anchor(s);
    let v = mesh.add_vertex(mid, VertexKind::Steiner);
    let outcome = mesh.split_edge(anchor, v);
    let mut stack: Vec<EdgeHandle> = outcome.link_edges.to_vec();
    if let Some((s1, s2)) = outcome.subseg_halves {
        encroached.push_back(s1);
        encroached.push_back(s2);
    }
    mesh.legalize(&mut stack);
    enqueue_around(mesh, v, bounds, encroached, skinny);
    Ok(())
}

/// After inserting `v`, every triangle of its fan is new or reshaped:
/// requeue the skinny ones and any subsegment whose apex changed.
fn enqueue_around(
    mesh: &Mesh,
    v: VertexId,
    bounds: &QualityBounds,
    encroached: &mut VecDeque<SubsegKey>,
    skinny: &mut VecDeque<(TriangleKey, [VertexId; 3])>,
) {
    for e in mesh.edges_around(v) {
        let key = e.tri;
        if bounds.is_skinny(mesh, key) {
            skinny.push_back((key, mesh.triangle_vertices(key)));
        }
        for orient in 0..3 {
            if let Some(s) = mesh.subseg(EdgeHandle::new(key, orient)) {
                if is_encroached(mesh, s, bounds) {
                    encroached.push_back(s);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::carve::mark_hull_subsegments;
    use crate::core::algorithms::incremental::build_delaunay;
    use crate::geometry::point::Point;

    fn assert_quality(mesh: &Mesh, bounds: &QualityBounds) {
        for key in mesh.triangle_keys() {
            let [v0, v1, v2] = mesh.triangle_vertices(key);
            let (a, b, c) = (mesh.point_of(v0), mesh.point_of(v1), mesh.point_of(v2));
            if let Some(max) = bounds.max_area {
                assert!(signed_area(a, b, c) <= max + 1.0e-12);
            }
            let angle = smallest_angle_degrees(a, b, c);
            if angle >= bounds.min_angle_deg - 1.0e-9 {
                continue;
            }
            // Below the bound is acceptable only for an input angle pinched
            // between two subsegments.
            let apex = smallest_angle_apex(a, b, c);
            let flank1 = EdgeHandle::new(key, (apex + 1) % 3);
            let flank2 = EdgeHandle::new(key, (apex + 2) % 3);
            assert!(
                mesh.subseg(flank1).is_some() && mesh.subseg(flank2).is_some(),
                "improvable triangle with smallest angle {angle}° survived refinement"
            );
        }
    }

    fn refined_five_points(bounds: QualityBounds) -> Mesh {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(3.0, 3.0),
            Point::new(1.5, 2.125),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        mark_hull_subsegments(&mut mesh);
        refine(&mut mesh, &bounds, TraceLevel::None).unwrap();
        mesh
    }

    #[test]
    fn default_angle_bound_is_met() {
        let bounds = QualityBounds {
            min_angle_deg: 20.0,
            max_area: None,
        };
        let mesh = refined_five_points(bounds);
        assert!(mesh.is_valid().is_ok());
        assert!(mesh.finite_triangle_count() > 4);
        assert_quality(&mesh, &bounds);
    }

    #[test]
    fn tighter_angle_bound_is_met() {
        let bounds = QualityBounds {
            min_angle_deg: 27.5,
            max_area: None,
        };
        let mesh = refined_five_points(bounds);
        assert!(mesh.is_valid().is_ok());
        assert_quality(&mesh, &bounds);
    }

    #[test]
    fn area_bound_forces_further_subdivision() {
        let angle_only = refined_five_points(QualityBounds {
            min_angle_deg: 20.0,
            max_area: None,
        });
        let bounds = QualityBounds {
            min_angle_deg: 20.0,
            max_area: Some(0.5),
        };
        let mesh = refined_five_points(bounds);
        assert!(mesh.is_valid().is_ok());
        assert_quality(&mesh, &bounds);
        assert!(mesh.finite_triangle_count() > angle_only.finite_triangle_count());
    }

    #[test]
    fn steiner_points_carry_no_input_index() {
        let mesh = refined_five_points(QualityBounds {
            min_angle_deg: 25.0,
            max_area: None,
        });
        let steiner = mesh
            .vertices()
            .iter()
            .filter(|v| matches!(v.kind, VertexKind::Steiner))
            .count();
        assert!(steiner > 0);
        for v in mesh.vertices() {
            if matches!(v.kind, VertexKind::Steiner) {
                assert_eq!(v.input_index(), None);
            }
        }
    }

    #[test]
    fn already_good_mesh_is_untouched() {
        // A single equilateral triangle meets any reasonable bound as is.
        let h = 3.0_f64.sqrt() / 2.0;
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, h),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        mark_hull_subsegments(&mut mesh);
        refine(
            &mut mesh,
            &QualityBounds {
                min_angle_deg: 20.0,
                max_area: None,
            },
            TraceLevel::None,
        )
        .unwrap();
        assert_eq!(mesh.finite_triangle_count(), 1);
        assert_eq!(mesh.finite_vertex_count(), 3);
    }
}
