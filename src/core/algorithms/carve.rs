//! Hole and concavity removal by flood fill.
//!
//! Subsegments partition the triangulation into regions. The outer flood
//! starts from every triangle that touches the dummy across an
//! unconstrained edge and eats everything reachable without crossing a
//! subsegment; that strips concavities outside the outermost segment loop.
//! Each user hole marker seeds the same flood from its containing triangle.
//! Without an enclosing segment loop a hole marker therefore strips the
//! entire mesh; that is the intended semantics, not an accident.
//!
//! After the marked triangles are discarded, every surviving edge facing
//! the removed region is bonded to the dummy. The boundary between kept
//! and removed is always a subsegment (the flood stops nowhere else), so
//! refinement later sees a fully constrained boundary.

use log::info;

use crate::core::collections::FastHashSet;
use crate::core::locate::{locate, Location};
use crate::core::mesh::{EdgeHandle, Mesh, TriangleKey};
use crate::core::triangulator::{TraceLevel, TrigenError};
use crate::geometry::point::Point;

/// Floods and discards triangles: the exterior (when `strip_outer` is set)
/// and the region around each hole marker.
pub(crate) fn carve(
    mesh: &mut Mesh,
    holes: &[Point],
    strip_outer: bool,
    trace: TraceLevel,
) -> Result<(), TrigenError> {
    let mut seeds: Vec<TriangleKey> = Vec::new();

    if strip_outer {
        for key in mesh.triangle_keys().collect::<Vec<_>>() {
            for orient in 0..3 {
                let h = EdgeHandle::new(key, orient);
                if mesh.is_dummy(mesh.sym(h)) && mesh.subseg(h).is_none() {
                    seeds.push(key);
                    break;
                }
            }
        }
    }

    for marker in holes {
        match locate(mesh, *marker, None) {
            Location::InTriangle(h) | Location::OnEdge(h) | Location::OnVertex(h) => {
                seeds.push(h.tri);
            }
            Location::Outside(_) => {
                return Err(TrigenError::InvalidInput {
                    message: format!(
                        "hole marker ({}, {}) lies outside the triangulation",
                        marker.x, marker.y
                    ),
                });
            }
        }
    }
    if seeds.is_empty() {
        return Ok(());
    }

    // Flood across unconstrained edges.
    let mut stack = seeds;
    while let Some(key) = stack.pop() {
        if mesh.is_infected(key) {
            continue;
        }
        mesh.infect(key);
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            if mesh.subseg(h).is_some() {
                continue;
            }
            let hs = mesh.sym(h);
            if !mesh.is_dummy(hs) && !mesh.is_infected(hs.tri) {
                stack.push(hs.tri);
            }
        }
    }

    // Discard the infected region.
    let doomed: Vec<TriangleKey> = mesh
        .triangle_keys()
        .filter(|&k| mesh.is_infected(k))
        .collect();
    let doomed_set: FastHashSet<TriangleKey> = doomed.iter().copied().collect();
    for &key in &doomed {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            let hs = mesh.sym(h);
            if !mesh.is_dummy(hs) && !doomed_set.contains(&hs.tri) {
                mesh.bond_to_dummy(hs);
            }
            if let Some(s) = mesh.subseg(h) {
                detach_subseg_side(mesh, s, h);
            }
        }
    }
    for &key in &doomed {
        mesh.remove_triangle(key);
    }

    // Subsegments stranded with no triangle on either side go with them.
    let stranded: Vec<_> = mesh
        .subseg_keys()
        .filter(|&s| {
            let sub = mesh.subsegment(s);
            (mesh.is_dummy(sub.edges[0]) || !mesh.contains_triangle(sub.edges[0].tri))
                && (mesh.is_dummy(sub.edges[1]) || !mesh.contains_triangle(sub.edges[1].tri))
        })
        .collect();
    for s in stranded {
        mesh.remove_subsegment(s);
    }

    mesh.rebuild_vertex_edges();
    if trace >= TraceLevel::Info {
        info!(
            "carving removed {} triangle(s), {} remain",
            doomed.len(),
            mesh.finite_triangle_count()
        );
    }
    Ok(())
}

/// Points the subsegment slot that referenced the doomed triangle at the
/// dummy instead.
fn detach_subseg_side(mesh: &mut Mesh, s: crate::core::mesh::SubsegKey, doomed_edge: EdgeHandle) {
    let dummy_edge = mesh.dummy_edge();
    let sub = mesh.subsegment(s);
    let slot = if sub.edges[0] == doomed_edge {
        Some(0)
    } else if sub.edges[1] == doomed_edge {
        Some(1)
    } else {
        None
    };
    if let Some(i) = slot {
        mesh.subsegment_mut(s).edges[i] = dummy_edge;
    }
}

/// Promotes every hull edge (bonded to the dummy) to a subsegment, so
/// refinement treats the boundary as constrained.
pub(crate) fn mark_hull_subsegments(mesh: &mut Mesh) {
    for key in mesh.triangle_keys().collect::<Vec<_>>() {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            if mesh.is_dummy(mesh.sym(h)) && mesh.subseg(h).is_none() {
                mesh.make_subsegment(h);
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
    use crate::core::algorithms::incremental::build_delaunay;
    use crate::core::algorithms::segments::insert_segments;

    /// A unit square of four corner points.
    fn square() -> (Mesh, Vec<crate::core::mesh::VertexId>) {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let mut mesh = Mesh::new();
        let output = build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();
        (mesh, output.vertex_of_input)
    }

    #[test]
    fn hole_without_segments_strips_everything() {
        let (mut mesh, _) = square();
        assert_eq!(mesh.finite_triangle_count(), 2);
        carve(&mut mesh, &[Point::new(0.5, 0.5)], false, TraceLevel::None).unwrap();
        assert_eq!(mesh.finite_triangle_count(), 0);
    }

    #[test]
    fn hole_is_contained_by_a_segment_loop() {
        let (mut mesh, v) = square();
        // Constrain the diagonal the triangulation already has, fencing the
        // two halves off from each other.
        let diagonal = if mesh.find_edge(v[0], v[2]).is_some() {
            [v[0], v[2]]
        } else {
            [v[1], v[3]]
        };
        insert_segments(&mut mesh, &[diagonal], false, TraceLevel::None).unwrap();
        carve(&mut mesh, &[Point::new(0.2, 0.1)], false, TraceLevel::None).unwrap();
        assert_eq!(mesh.finite_triangle_count(), 1);
        assert!(mesh.is_valid().is_ok());
        // The surviving triangle's boundary to the removed half is the
        // constrained diagonal, now a hull edge.
        assert_eq!(mesh.subseg_count(), 1);
    }

    #[test]
    fn outer_flood_without_segments_is_a_no_op() {
        let (mut mesh, _) = square();
        // No subsegments anywhere: the outer flood would eat the mesh, but
        // it only runs when requested.
        carve(&mut mesh, &[], false, TraceLevel::None).unwrap();
        assert_eq!(mesh.finite_triangle_count(), 2);
    }

    #[test]
    fn hole_marker_outside_the_mesh_is_rejected() {
        let (mut mesh, _) = square();
        let result = carve(&mut mesh, &[Point::new(50.0, 50.0)], false, TraceLevel::None);
        assert!(matches!(result, Err(TrigenError::InvalidInput { .. })));
    }

    #[test]
    fn mark_hull_promotes_every_boundary_edge() {
        let (mut mesh, _) = square();
        mark_hull_subsegments(&mut mesh);
        assert_eq!(mesh.subseg_count(), 4);
        // Idempotent.
        mark_hull_subsegments(&mut mesh);
        assert_eq!(mesh.subseg_count(), 4);
    }
}
