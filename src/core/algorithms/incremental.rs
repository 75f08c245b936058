//! Incremental construction of the initial Delaunay triangulation.
//!
//! Input points are deduplicated by a lexicographic sort, then inserted one
//! at a time into a large bounding triangle: each point is located by the
//! walk of [`crate::core::locate`], split into the containing triangle or
//! edge, and the Delaunay property is restored by Lawson legalization.
//!
//! The three bounding corners are ordinary vertices during construction.
//! Afterwards every triangle incident to a corner is deleted, hull edges
//! are rebonded to the dummy, and any concavity left behind (a corner that
//! intruded into some input triangle's circumcircle) is ear-filled and
//! re-legalized. Lawson's flip algorithm converges to the Delaunay
//! triangulation from any triangulation of the region, so the finished mesh
//! is the exact Delaunay triangulation of the input, wherever the bounding
//! corners were placed.

use log::{debug, info};

use crate::core::collections::{FastHashMap, FastHashSet};
use crate::core::locate::{locate, Location};
use crate::core::mesh::{EdgeHandle, Mesh, TriangleKey, VertexId, VertexKind};
use crate::core::triangulator::{TraceLevel, TrigenError};
use crate::geometry::point::{BoundingBox, Point};
use crate::geometry::predicates::{orient2d, Orientation};

/// How far the bounding corners sit from the input, as a multiple of the
/// input's spread. Generous enough that carve-time concavities are rare;
/// correctness does not depend on it.
const BOUNDING_SCALE: f64 = 1.0e5;

/// What construction learned about the input.
pub(crate) struct BuildOutput {
    /// For each input position, the mesh vertex it resolved to (duplicates
    /// resolve to their survivor's vertex).
    pub vertex_of_input: Vec<VertexId>,
    /// Advisory list of collapsed duplicates as `(duplicate, survivor)`
    /// input indices.
    pub duplicates: Vec<(usize, usize)>,
}

/// Builds the Delaunay triangulation of `points` into an empty mesh.
pub(crate) fn build_delaunay(
    mesh: &mut Mesh,
    points: &[Point],
    trace: TraceLevel,
) -> Result<BuildOutput, TrigenError> {
    for p in points {
        p.validate().map_err(|e| TrigenError::InvalidInput {
            message: e.to_string(),
        })?;
    }

    // Lexicographic sort; equal runs collapse onto their first member.
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| points[i].cmp_lexicographic(&points[j]));

    let mut survivor_of: Vec<usize> = (0..points.len()).collect();
    let mut duplicates: Vec<(usize, usize)> = Vec::new();
    let mut unique: Vec<usize> = Vec::new();
    for &i in &order {
        if let Some(&last) = unique.last() {
            if points[last].coincides_with(&points[i]) {
                survivor_of[i] = last;
                duplicates.push((i, last));
                continue;
            }
        }
        unique.push(i);
    }
    if trace >= TraceLevel::Info && !duplicates.is_empty() {
        info!("collapsed {} duplicate input point(s)", duplicates.len());
    }

    if unique.len() < 3 {
        return Err(TrigenError::InvalidInput {
            message: format!(
                "triangulation needs at least 3 distinct points, got {}",
                unique.len()
            ),
        });
    }
    let a = points[unique[0]];
    let b = points[unique[1]];
    if !unique[2..]
        .iter()
        .any(|&k| orient2d(a, b, points[k]) != Orientation::DEGENERATE)
    {
        return Err(TrigenError::InvalidInput {
            message: "input points are collinear".to_string(),
        });
    }

    // Seed the mesh with a bounding triangle that amply contains the input.
    let bbox = BoundingBox::from_points(points).expect("non-empty input");
    let center = bbox.center();
    let big = bbox.width().max(bbox.height()).max(1.0) * BOUNDING_SCALE;
    if !big.is_finite() {
        return Err(TrigenError::NumericFailure {
            message: "input spread overflows the bounding-triangle construction".to_string(),
        });
    }
    let corners = [
        mesh.add_vertex(
            Point::new(center.x - 3.0 * big, center.y - big),
            VertexKind::Bounding,
        ),
        mesh.add_vertex(
            Point::new(center.x + 3.0 * big, center.y - big),
            VertexKind::Bounding,
        ),
        mesh.add_vertex(Point::new(center.x, center.y + 2.0 * big), VertexKind::Bounding),
    ];
    let seed = mesh.make_triangle(corners[0], corners[1], corners[2]);
    for orient in 0..3 {
        mesh.bond_to_dummy(EdgeHandle::new(seed, orient));
    }
    mesh.hot = Some(EdgeHandle::new(seed, 0));

    // Insert the unique points in sorted order.
    let mut vertex_slot: Vec<Option<VertexId>> = vec![None; points.len()];
    let mut stack: Vec<EdgeHandle> = Vec::new();
    for &i in &unique {
        let p = points[i];
        if trace >= TraceLevel::Vertex {
            debug!("inserting input vertex {i} at ({}, {})", p.x, p.y);
        }
        let v = mesh.add_vertex(p, VertexKind::Input(i));
        match locate(mesh, p, None) {
            Location::InTriangle(h) => {
                stack.clear();
                stack.extend(mesh.split_triangle(h, v));
                mesh.legalize(&mut stack);
            }
            Location::OnEdge(h) => {
                stack.clear();
                stack.extend(mesh.split_edge(h, v).link_edges);
                mesh.legalize(&mut stack);
            }
            Location::OnVertex(h) => {
                // Coordinate-equal under a sign-of-zero difference the sort
                // kept apart; collapse onto the resident vertex.
                let resident = mesh.org(h);
                mesh.pop_vertex(v);
                let survivor = mesh
                    .vertex(resident)
                    .input_index()
                    .expect("resident vertex is an input vertex");
                duplicates.push((i, survivor));
                vertex_slot[i] = Some(resident);
                continue;
            }
            Location::Outside(_) => {
                return Err(TrigenError::NumericFailure {
                    message: "input point escaped the bounding triangle".to_string(),
                });
            }
        }
        vertex_slot[i] = Some(v);
    }

    remove_bounding(mesh, &corners)?;

    // Duplicates inherit their survivor's vertex.
    for i in 0..points.len() {
        if vertex_slot[i].is_none() {
            vertex_slot[i] = vertex_slot[survivor_of[i]];
        }
    }
    let vertex_of_input = vertex_slot
        .into_iter()
        .map(|slot| slot.expect("every input resolved to a vertex"))
        .collect();

    Ok(BuildOutput {
        vertex_of_input,
        duplicates,
    })
}

/// Deletes every triangle incident to a bounding corner, rebonds the
/// surviving hull to the dummy, and restores convexity and the Delaunay
/// property along the carved boundary.
fn remove_bounding(mesh: &mut Mesh, corners: &[VertexId; 3]) -> Result<(), TrigenError> {
    let doomed: Vec<TriangleKey> = mesh
        .triangle_keys()
        .filter(|&key| {
            mesh.triangle_vertices(key)
                .iter()
                .any(|v| corners.contains(v))
        })
        .collect();
    let doomed_set: FastHashSet<TriangleKey> = doomed.iter().copied().collect();

    for &key in &doomed {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            let s = mesh.sym(h);
            if !mesh.is_dummy(s) && !doomed_set.contains(&s.tri) {
                mesh.bond_to_dummy(s);
            }
        }
    }
    for &key in &doomed {
        mesh.remove_triangle(key);
    }
    mesh.rebuild_vertex_edges();

    if mesh.finite_triangle_count() == 0 {
        return Err(TrigenError::NumericFailure {
            message: "no triangle survived bounding-corner removal; input is nearly collinear"
                .to_string(),
        });
    }

    convexify_boundary(mesh);
    Ok(())
}

/// Ear-fills concave stretches of the outer boundary, then legalizes the
/// new edges.
fn convexify_boundary(mesh: &mut Mesh) {
    // Collect the boundary loop, ordered by following destinations.
    let mut by_org: FastHashMap<VertexId, EdgeHandle> = FastHashMap::default();
    for key in mesh.triangle_keys().collect::<Vec<_>>() {
        for orient in 0..3 {
            let h = EdgeHandle::new(key, orient);
            if mesh.is_dummy(mesh.sym(h)) && by_org.insert(mesh.org(h), h).is_some() {
                // A pinched boundary cannot be walked as one loop; leave
                // the hull as carved.
                debug!("boundary pinch detected, skipping hull convexification");
                return;
            }
        }
    }
    let Some(&start) = by_org.values().next() else {
        return;
    };
    let mut boundary: Vec<EdgeHandle> = vec![start];
    let mut cursor = start;
    loop {
        let Some(&next) = by_org.get(&mesh.dest(cursor)) else {
            debug!("open boundary chain, skipping hull convexification");
            return;
        };
        if next == start {
            break;
        }
        boundary.push(next);
        cursor = next;
    }

    let mut stack: Vec<EdgeHandle> = Vec::new();
    'sweep: loop {
        if boundary.len() < 3 {
            break;
        }
        for i in 0..boundary.len() {
            let j = (i + 1) % boundary.len();
            let h1 = boundary[i];
            let h2 = boundary[j];
            let a = mesh.org(h1);
            let b = mesh.dest(h1);
            let c = mesh.dest(h2);
            debug_assert_eq!(b, mesh.org(h2));
            if orient2d(mesh.point_of(a), mesh.point_of(b), mesh.point_of(c))
                == Orientation::NEGATIVE
            {
                // Reflex corner at b: cover it with the ear (c, b, a).
                let t = mesh.make_triangle(c, b, a);
                mesh.bond(EdgeHandle::new(t, 0), h1);
                mesh.bond(EdgeHandle::new(t, 2), h2);
                mesh.bond_to_dummy(EdgeHandle::new(t, 1));
                stack.push(EdgeHandle::new(t, 0));
                stack.push(EdgeHandle::new(t, 2));
                boundary[i] = EdgeHandle::new(t, 1);
                boundary.remove(j);
                continue 'sweep;
            }
        }
        break;
    }
    mesh.legalize(&mut stack);
}

// =============================================================================
// TESTS
// =============================================================================
