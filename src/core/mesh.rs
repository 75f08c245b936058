//! The edge-based mesh store and its primitive operators.
//!
//! Triangles and subsegments live in slotmap arenas; identity is a key into
//! the arena, never an owning reference, so the mutual neighbor links and the
//! triangle/subsegment dual links form no ownership cycles. All traversal is
//! expressed through [`EdgeHandle`] values: a `(triangle, orientation)` pair
//! naming one of the triangle's three directed edges.
//!
//! A single sentinel, the *dummy triangle*, stands in for "outside the
//! mesh". Neighbor slots on the hull reference it, it is allocated once at
//! construction and never freed, and it is never exposed through public
//! iteration.
//!
//! # Edge convention
//!
//! A triangle stores its vertices `[v0, v1, v2]` in counterclockwise order.
//! Directed edge `i` runs from `v[(i + 1) % 3]` to `v[(i + 2) % 3]` and has
//! apex `v[i]`, so each edge is named by the vertex it faces. With that
//! convention the rotation primitives are pure index arithmetic:
//! `lnext` adds one, `lprev` adds two, `onext` is `sym(lprev)`, and `oprev`
//! is `lnext(sym)`.

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::core::collections::SmallBuffer;
use crate::geometry::point::Point;
use crate::geometry::predicates::{incircle, orient2d, InCircle, Orientation};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by [`Mesh::is_valid`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshValidationError {
    /// A triangle's stored vertex order is not counterclockwise.
    #[error("triangle {index} is not counterclockwise")]
    NotCounterclockwise {
        /// Position of the triangle in arena iteration order.
        index: usize,
    },
    /// A neighbor link is not mutual.
    #[error("neighbor link on triangle {index}, edge {orient} is not mutual")]
    AsymmetricNeighbors {
        /// Position of the triangle in arena iteration order.
        index: usize,
        /// The edge whose link fails the round trip.
        orient: u8,
    },
    /// A subsegment's triangle bond does not point back at it.
    #[error("subsegment bond on triangle {index}, edge {orient} is inconsistent")]
    SubsegmentMismatch {
        /// Position of the triangle in arena iteration order.
        index: usize,
        /// The edge carrying the stale bond.
        orient: u8,
    },
}

// =============================================================================
// KEYS AND HANDLES
// =============================================================================

new_key_type! {
    /// Key for triangles in the mesh arena.
    pub struct TriangleKey;
}

new_key_type! {
    /// Key for subsegments in the mesh arena.
    pub struct SubsegKey;
}

/// Identifier of a mesh vertex.
///
/// Vertices are appended to a per-mesh array and never removed, so a plain
/// index is stable for the life of the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub(crate) u32);

impl VertexId {
    /// Sentinel stored in the dummy triangle's vertex slots.
    pub(crate) const NONE: Self = Self(u32::MAX);

    /// The underlying array index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed edge of the mesh: one of a triangle's three sides.
///
/// Handles are values. They stay resolvable as long as their triangle is in
/// the arena, but a structural edit (flip, split) may re-anchor the edge
/// they were naming; callers that hold handles across edits must
/// revalidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeHandle {
    /// The triangle carrying the edge.
    pub tri: TriangleKey,
    /// Which of the triangle's three directed edges, in `0..3`.
    pub orient: u8,
}

impl EdgeHandle {
    pub(crate) const fn new(tri: TriangleKey, orient: u8) -> Self {
        Self { tri, orient }
    }
}

/// Rotates to the next edge counterclockwise around the same triangle.
#[must_use]
pub fn lnext(h: EdgeHandle) -> EdgeHandle {
    EdgeHandle::new(h.tri, (h.orient + 1) % 3)
}

/// Rotates to the previous edge counterclockwise around the same triangle.
#[must_use]
pub fn lprev(h: EdgeHandle) -> EdgeHandle {
    EdgeHandle::new(h.tri, (h.orient + 2) % 3)
}

// =============================================================================
// MESH ELEMENTS
// =============================================================================

/// How a vertex entered the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexKind {
    /// Supplied by the caller; carries its index in the input sequence.
    Input(usize),
    /// Inserted by conforming subdivision or quality refinement.
    Steiner,
    /// A corner of the construction-time bounding triangle; removed from
    /// the triangulation before the mesh is exposed.
    Bounding,
}

/// A mesh vertex: a point plus its provenance and one incident edge.
#[derive(Clone, Debug)]
pub struct MeshVertex {
    /// Position of the vertex.
    pub point: Point,
    /// Provenance of the vertex.
    pub kind: VertexKind,
    /// Some outgoing directed edge, kept current across edits. `None` when
    /// the vertex has no surviving incident triangle.
    pub(crate) edge: Option<EdgeHandle>,
}

impl MeshVertex {
    /// The input index of the vertex, or `None` for Steiner points.
    #[must_use]
    pub fn input_index(&self) -> Option<usize> {
        match self.kind {
            VertexKind::Input(i) => Some(i),
            VertexKind::Steiner | VertexKind::Bounding => None,
        }
    }
}

#[derive(Clone, Debug)]
struct Triangle {
    vertices: [VertexId; 3],
    neighbors: [EdgeHandle; 3],
    subsegs: [Option<SubsegKey>; 3],
    infected: bool,
}

/// A constrained edge overlaid on the triangulation.
///
/// Subsegments dual-link to the two triangle edges that coincide with them
/// and chain to neighboring subsegments at each endpoint.
#[derive(Clone, Debug)]
pub struct Subsegment {
    /// The two endpoints, in the subsegment's own orientation.
    pub vertices: [VertexId; 2],
    /// Bonded triangle edges: `edges[0]` runs `vertices[0] -> vertices[1]`,
    /// `edges[1]` the reverse. A slot holds the dummy edge when that side
    /// of the subsegment is outside the mesh.
    pub(crate) edges: [EdgeHandle; 2],
    /// Chained subsegments at `vertices[0]` and `vertices[1]`.
    pub(crate) links: [Option<SubsegKey>; 2],
}

// =============================================================================
// MESH
// =============================================================================

/// Arena-allocated triangulation storage.
///
/// Owns the triangle arena, the subsegment arena, and the vertex array.
/// All structural edits go through the primitive operators here; the
/// algorithms in [`crate::core::algorithms`] are written entirely in terms
/// of them.
#[derive(Debug)]
pub struct Mesh {
    triangles: SlotMap<TriangleKey, Triangle>,
    subsegments: SlotMap<SubsegKey, Subsegment>,
    vertices: Vec<MeshVertex>,
    dummy: TriangleKey,
    /// Cached starting handle for jump-and-walk location.
    pub(crate) hot: Option<EdgeHandle>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates an empty mesh holding only the dummy triangle.
    #[must_use]
    pub fn new() -> Self {
        let mut triangles = SlotMap::with_key();
        let dummy = triangles.insert_with_key(|key| Triangle {
            vertices: [VertexId::NONE; 3],
            neighbors: [EdgeHandle::new(key, 0); 3],
            subsegs: [None; 3],
            infected: false,
        });
        Self {
            triangles,
            subsegments: SlotMap::with_key(),
            vertices: Vec::new(),
            dummy,
            hot: None,
        }
    }

    // -------------------------------------------------------------------------
    // Dummy triangle
    // -------------------------------------------------------------------------

    /// The dummy triangle's key.
    #[must_use]
    pub fn dummy(&self) -> TriangleKey {
        self.dummy
    }

    /// A handle on the dummy triangle.
    #[must_use]
    pub fn dummy_edge(&self) -> EdgeHandle {
        EdgeHandle::new(self.dummy, 0)
    }

    /// Whether the handle sits on the dummy triangle.
    #[must_use]
    pub fn is_dummy(&self, h: EdgeHandle) -> bool {
        h.tri == self.dummy
    }

    // -------------------------------------------------------------------------
    // Vertices
    // -------------------------------------------------------------------------

    /// Appends a vertex and returns its id.
    pub(crate) fn add_vertex(&mut self, point: Point, kind: VertexKind) -> VertexId {
        let id = VertexId(u32::try_from(self.vertices.len()).expect("vertex count fits in u32"));
        self.vertices.push(MeshVertex {
            point,
            kind,
            edge: None,
        });
        id
    }

    /// Drops the most recently added vertex. Used to back out an insertion
    /// that turned out to target a coincident point.
    pub(crate) fn pop_vertex(&mut self, id: VertexId) {
        debug_assert_eq!(id.index() + 1, self.vertices.len());
        self.vertices.pop();
    }

    /// The vertex record for `id`.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> &MeshVertex {
        &self.vertices[id.index()]
    }

    /// The position of vertex `id`.
    #[must_use]
    pub fn point_of(&self, id: VertexId) -> Point {
        self.vertices[id.index()].point
    }

    /// All vertex records, in insertion order.
    #[must_use]
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    /// Number of vertices that are part of the triangulation proper
    /// (input plus Steiner, excluding bounding corners).
    #[must_use]
    pub fn finite_vertex_count(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| !matches!(v.kind, VertexKind::Bounding))
            .count()
    }

    pub(crate) fn set_vertex_edge(&mut self, id: VertexId, edge: Option<EdgeHandle>) {
        self.vertices[id.index()].edge = edge;
    }

    /// Some outgoing edge at `id`, if the vertex is in the triangulation.
    #[must_use]
    pub fn vertex_edge(&self, id: VertexId) -> Option<EdgeHandle> {
        self.vertices[id.index()].edge
    }

    // -------------------------------------------------------------------------
    // Edge algebra
    // -------------------------------------------------------------------------

    /// Origin vertex of the directed edge.
    #[must_use]
    pub fn org(&self, h: EdgeHandle) -> VertexId {
        self.triangles[h.tri].vertices[usize::from((h.orient + 1) % 3)]
    }

    /// Destination vertex of the directed edge.
    #[must_use]
    pub fn dest(&self, h: EdgeHandle) -> VertexId {
        self.triangles[h.tri].vertices[usize::from((h.orient + 2) % 3)]
    }

    /// Apex vertex: the triangle corner facing the edge.
    #[must_use]
    pub fn apex(&self, h: EdgeHandle) -> VertexId {
        self.triangles[h.tri].vertices[usize::from(h.orient)]
    }

    /// The opposite directed edge, on the neighbor across `h` (or on the
    /// dummy when `h` is on the hull).
    #[must_use]
    pub fn sym(&self, h: EdgeHandle) -> EdgeHandle {
        self.triangles[h.tri].neighbors[usize::from(h.orient)]
    }

    /// Next edge counterclockwise around `org(h)`.
    #[must_use]
    pub fn onext(&self, h: EdgeHandle) -> EdgeHandle {
        self.sym(lprev(h))
    }

    /// Next edge clockwise around `org(h)`.
    #[must_use]
    pub fn oprev(&self, h: EdgeHandle) -> EdgeHandle {
        lnext(self.sym(h))
    }

    /// The subsegment bonded along `h`, if any.
    #[must_use]
    pub fn subseg(&self, h: EdgeHandle) -> Option<SubsegKey> {
        self.triangles[h.tri].subsegs[usize::from(h.orient)]
    }

    /// The subsegment record for `key`.
    #[must_use]
    pub fn subsegment(&self, key: SubsegKey) -> &Subsegment {
        &self.subsegments[key]
    }

    pub(crate) fn subsegment_mut(&mut self, key: SubsegKey) -> &mut Subsegment {
        &mut self.subsegments[key]
    }

    /// Whether `key` still resolves to a live triangle.
    #[must_use]
    pub fn contains_triangle(&self, key: TriangleKey) -> bool {
        self.triangles.contains_key(key)
    }

    /// Whether `key` still resolves to a live subsegment.
    #[must_use]
    pub fn contains_subsegment(&self, key: SubsegKey) -> bool {
        self.subsegments.contains_key(key)
    }

    /// The vertex triple of triangle `key`, in stored (counterclockwise)
    /// order.
    #[must_use]
    pub fn triangle_vertices(&self, key: TriangleKey) -> [VertexId; 3] {
        self.triangles[key].vertices
    }

    // -------------------------------------------------------------------------
    // Counting and iteration
    // -------------------------------------------------------------------------

    /// Number of real (non-dummy) triangles.
    #[must_use]
    pub fn finite_triangle_count(&self) -> usize {
        self.triangles.len() - 1
    }

    /// Keys of all real triangles, in arena order.
    pub fn triangle_keys(&self) -> impl Iterator<Item = TriangleKey> + '_ {
        let dummy = self.dummy;
        self.triangles.keys().filter(move |k| *k != dummy)
    }

    /// Keys of all subsegments.
    pub fn subseg_keys(&self) -> impl Iterator<Item = SubsegKey> + '_ {
        self.subsegments.keys()
    }

    /// Number of subsegments.
    #[must_use]
    pub fn subseg_count(&self) -> usize {
        self.subsegments.len()
    }

    /// Number of edges bonded to the dummy triangle.
    #[must_use]
    pub fn hull_edge_count(&self) -> usize {
        let mut count = 0;
        for key in self.triangle_keys() {
            for orient in 0..3 {
                if self.is_dummy(self.sym(EdgeHandle::new(key, orient))) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Total number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        let hull = self.hull_edge_count();
        (3 * self.finite_triangle_count() + hull) / 2
    }

    /// Some edge on a real triangle, if one exists.
    #[must_use]
    pub fn first_real_edge(&self) -> Option<EdgeHandle> {
        self.triangle_keys().next().map(|k| EdgeHandle::new(k, 0))
    }

    /// Outgoing edges around vertex `v`, in counterclockwise order.
    ///
    /// On a boundary vertex the fan is clamped by the dummy on both sides;
    /// the result then starts at the clockwise-most real edge.
    #[must_use]
    pub fn edges_around(&self, v: VertexId) -> SmallBuffer<EdgeHandle, 16> {
        let mut fan: SmallBuffer<EdgeHandle, 16> = SmallBuffer::new();
        let Some(start) = self.vertex_edge(v) else {
            return fan;
        };
        debug_assert_eq!(self.org(start), v);

        // Walk clockwise first so the fan can be emitted counterclockwise
        // from the boundary when the vertex is on the hull.
        let mut first = start;
        loop {
            let prev = self.oprev(first);
            if self.is_dummy(prev) {
                break;
            }
            if prev == start {
                // Interior vertex: the fan is a full cycle.
                break;
            }
            first = prev;
        }

        let mut e = first;
        loop {
            fan.push(e);
            let next = self.onext(e);
            if self.is_dummy(next) || next == first {
                break;
            }
            e = next;
        }
        fan
    }

    /// Finds an edge joining `a` and `b`, if one exists; directed `a -> b`
    /// when that side carries a real triangle.
    ///
    /// On the hull an edge may exist only in the `b -> a` direction (the
    /// `a -> b` side is the dummy); it is still found, through the fan
    /// triangle that holds `b` as its apex.
    #[must_use]
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeHandle> {
        let fan = self.edges_around(a);
        if let Some(&e) = fan.iter().find(|&&e| self.dest(e) == b) {
            return Some(e);
        }
        fan.iter()
            .find(|&&e| self.apex(e) == b)
            .map(|&e| lprev(e))
    }

    // -------------------------------------------------------------------------
    // Infection marks (hole flood fill)
    // -------------------------------------------------------------------------

    pub(crate) fn infect(&mut self, key: TriangleKey) {
        self.triangles[key].infected = true;
    }

    pub(crate) fn is_infected(&self, key: TriangleKey) -> bool {
        self.triangles[key].infected
    }

    // -------------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------------

    /// Creates a triangle with the given counterclockwise vertex order.
    /// All three neighbor slots start bonded to the dummy.
    pub(crate) fn make_triangle(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
    ) -> TriangleKey {
        let dummy_edge = self.dummy_edge();
        let key = self.triangles.insert(Triangle {
            vertices: [v0, v1, v2],
            neighbors: [dummy_edge; 3],
            subsegs: [None; 3],
            infected: false,
        });
        // Edge i originates at v[(i + 1) % 3].
        self.set_vertex_edge(v0, Some(EdgeHandle::new(key, 2)));
        self.set_vertex_edge(v1, Some(EdgeHandle::new(key, 0)));
        self.set_vertex_edge(v2, Some(EdgeHandle::new(key, 1)));
        key
    }

    /// Removes a triangle from the arena. The caller is responsible for
    /// rebonding or retiring anything that referenced it.
    pub(crate) fn remove_triangle(&mut self, key: TriangleKey) {
        debug_assert_ne!(key, self.dummy);
        self.triangles.remove(key);
    }

    /// Removes a subsegment from the arena.
    pub(crate) fn remove_subsegment(&mut self, key: SubsegKey) {
        self.subsegments.remove(key);
    }

    /// Establishes a mutual neighbor link between two directed edges.
    pub(crate) fn bond(&mut self, h1: EdgeHandle, h2: EdgeHandle) {
        self.triangles[h1.tri].neighbors[usize::from(h1.orient)] = h2;
        self.triangles[h2.tri].neighbors[usize::from(h2.orient)] = h1;
    }

    /// Bonds `h` to the dummy triangle, making it a hull edge. The dummy's
    /// slot 0 doubles as an entry hint into the hull.
    pub(crate) fn bond_to_dummy(&mut self, h: EdgeHandle) {
        let dummy_edge = self.dummy_edge();
        self.triangles[h.tri].neighbors[usize::from(h.orient)] = dummy_edge;
        self.triangles[self.dummy].neighbors[0] = h;
    }

    /// Writes a subsegment slot on a triangle edge without touching the
    /// subsegment's own bonds.
    pub(crate) fn set_subseg(&mut self, h: EdgeHandle, s: Option<SubsegKey>) {
        self.triangles[h.tri].subsegs[usize::from(h.orient)] = s;
    }

    /// Bonds subsegment `s` along triangle edge `h`, fixing the matching
    /// back link. The edge's endpoints must be the subsegment's endpoints.
    pub(crate) fn attach_subseg(&mut self, h: EdgeHandle, s: SubsegKey) {
        let org = self.org(h);
        let dest = self.dest(h);
        let sub = &mut self.subsegments[s];
        if [org, dest] == sub.vertices {
            sub.edges[0] = h;
        } else {
            debug_assert_eq!([dest, org], sub.vertices);
            sub.edges[1] = h;
        }
        self.set_subseg(h, Some(s));
    }

    /// Marks the edge `h` as a subsegment, creating the overlay record and
    /// bonding both coincident triangle edges. Idempotent.
    pub(crate) fn make_subsegment(&mut self, h: EdgeHandle) -> SubsegKey {
        if let Some(existing) = self.subseg(h) {
            return existing;
        }
        let org = self.org(h);
        let dest = self.dest(h);
        let opposite = self.sym(h);
        let dummy_edge = self.dummy_edge();
        let key = self.subsegments.insert(Subsegment {
            vertices: [org, dest],
            edges: [h, dummy_edge],
            links: [None, None],
        });
        self.set_subseg(h, Some(key));
        if !self.is_dummy(opposite) {
            self.subsegments[key].edges[1] = opposite;
            self.set_subseg(opposite, Some(key));
        }
        key
    }

    /// A live triangle edge coinciding with subsegment `s`.
    #[must_use]
    pub(crate) fn subseg_anchor(&self, s: SubsegKey) -> EdgeHandle {
        let sub = &self.subsegments[s];
        if !self.is_dummy(sub.edges[0]) {
            sub.edges[0]
        } else {
            sub.edges[1]
        }
    }

    // -------------------------------------------------------------------------
    // Flip
    // -------------------------------------------------------------------------

    /// Replaces the diagonal of the quadrilateral around `h` by the other
    /// diagonal.
    ///
    /// With `a = org(h)`, `b = dest(h)`, `c = apex(h)` and `d` the apex of
    /// the neighbor, the two triangles `(a, b, c)` and `(b, a, d)` become
    /// `(a, d, c)` and `(d, b, c)`. Both triangles must be real and the
    /// quadrilateral strictly convex; subsegment bonds on the four outer
    /// edges are preserved and the central bond is rebuilt.
    ///
    /// Returns the four outer edges at their new anchors, for re-queueing
    /// by legalization.
    pub(crate) fn flip(&mut self, h: EdgeHandle) -> [EdgeHandle; 4] {
        let h_sym = self.sym(h);
        debug_assert!(!self.is_dummy(h) && !self.is_dummy(h_sym));
        debug_assert!(self.subseg(h).is_none(), "cannot flip a subsegment");

        let a = self.org(h);
        let b = self.dest(h);
        let c = self.apex(h);
        let d = self.apex(h_sym);

        // Capture the quadrilateral's outer bonds before rewriting.
        let h_bc = lnext(h);
        let h_ca = lprev(h);
        let h_ad = lnext(h_sym);
        let h_db = lprev(h_sym);
        let n_bc = self.sym(h_bc);
        let n_ca = self.sym(h_ca);
        let n_ad = self.sym(h_ad);
        let n_db = self.sym(h_db);
        let s_bc = self.subseg(h_bc);
        let s_ca = self.subseg(h_ca);
        let s_ad = self.subseg(h_ad);
        let s_db = self.subseg(h_db);

        let t1 = h.tri;
        let t2 = h_sym.tri;

        // t1 becomes (a, d, c) stored as [c, a, d]:
        //   edge 0 = a -> d, edge 1 = d -> c (new diagonal), edge 2 = c -> a.
        let tri1 = &mut self.triangles[t1];
        tri1.vertices = [c, a, d];
        tri1.subsegs = [None; 3];
        // t2 becomes (d, b, c) stored as [c, d, b]:
        //   edge 0 = d -> b, edge 1 = b -> c, edge 2 = c -> d (new diagonal).
        let tri2 = &mut self.triangles[t2];
        tri2.vertices = [c, d, b];
        tri2.subsegs = [None; 3];

        let e_ad = EdgeHandle::new(t1, 0);
        let e_ca = EdgeHandle::new(t1, 2);
        let e_db = EdgeHandle::new(t2, 0);
        let e_bc = EdgeHandle::new(t2, 1);

        self.bond(EdgeHandle::new(t1, 1), EdgeHandle::new(t2, 2));
        for (edge, neighbor, subseg) in [
            (e_ad, n_ad, s_ad),
            (e_ca, n_ca, s_ca),
            (e_db, n_db, s_db),
            (e_bc, n_bc, s_bc),
        ] {
            if self.is_dummy(neighbor) {
                self.bond_to_dummy(edge);
            } else {
                self.bond(edge, neighbor);
            }
            if let Some(s) = subseg {
                self.attach_subseg(edge, s);
            }
        }

        self.set_vertex_edge(a, Some(e_ad));
        self.set_vertex_edge(d, Some(e_db));
        self.set_vertex_edge(c, Some(e_ca));
        self.set_vertex_edge(b, Some(e_bc));

        [e_ad, e_ca, e_db, e_bc]
    }

    // -------------------------------------------------------------------------
    // Vertex splits
    // -------------------------------------------------------------------------

    /// Splits the triangle on `h` into three by joining `v` (strictly
    /// inside it) to the corners.
    ///
    /// Returns the three edges facing `v`, the seeds for legalization.
    pub(crate) fn split_triangle(
        &mut self,
        h: EdgeHandle,
        v: VertexId,
    ) -> SmallBuffer<EdgeHandle, 4> {
        let a = self.org(h);
        let b = self.dest(h);
        let c = self.apex(h);

        let o_ab = self.sym(h);
        let o_bc = self.sym(lnext(h));
        let o_ca = self.sym(lprev(h));
        let s_ab = self.subseg(h);
        let s_bc = self.subseg(lnext(h));
        let s_ca = self.subseg(lprev(h));

        // Reuse the old triangle as (v, a, b); edge 0 keeps the span a -> b.
        let t1 = h.tri;
        let tri1 = &mut self.triangles[t1];
        tri1.vertices = [v, a, b];
        tri1.subsegs = [None; 3];
        let t2 = self.make_triangle(v, b, c);
        let t3 = self.make_triangle(v, c, a);

        for (edge, neighbor, subseg) in [
            (EdgeHandle::new(t1, 0), o_ab, s_ab),
            (EdgeHandle::new(t2, 0), o_bc, s_bc),
            (EdgeHandle::new(t3, 0), o_ca, s_ca),
        ] {
            if self.is_dummy(neighbor) {
                self.bond_to_dummy(edge);
            } else {
                self.bond(edge, neighbor);
            }
            if let Some(s) = subseg {
                self.attach_subseg(edge, s);
            }
        }

        // Interior spokes.
        self.bond(EdgeHandle::new(t1, 1), EdgeHandle::new(t2, 2));
        self.bond(EdgeHandle::new(t2, 1), EdgeHandle::new(t3, 2));
        self.bond(EdgeHandle::new(t3, 1), EdgeHandle::new(t1, 2));

        self.set_vertex_edge(v, Some(EdgeHandle::new(t1, 2)));
        self.set_vertex_edge(a, Some(EdgeHandle::new(t1, 0)));
        self.set_vertex_edge(b, Some(EdgeHandle::new(t1, 1)));
        self.set_vertex_edge(c, Some(EdgeHandle::new(t2, 1)));

        let mut link: SmallBuffer<EdgeHandle, 4> = SmallBuffer::new();
        link.push(EdgeHandle::new(t1, 0));
        link.push(EdgeHandle::new(t2, 0));
        link.push(EdgeHandle::new(t3, 0));
        link
    }

    /// Splits the edge on `h` at vertex `v`, which must lie on its
    /// interior. The two flanking triangles become four (two, when the far
    /// side is the dummy). A subsegment on the edge is split with it, the
    /// halves chained together.
    ///
    /// Returns the edges facing `v` plus the subsegment halves, if any.
    pub(crate) fn split_edge(&mut self, h: EdgeHandle, v: VertexId) -> SplitEdge {
        let a = self.org(h);
        let b = self.dest(h);
        let c = self.apex(h);
        let h_sym = self.sym(h);
        let two_sided = !self.is_dummy(h_sym);
        let split_sub = self.subseg(h);

        let o_bc = self.sym(lnext(h));
        let o_ca = self.sym(lprev(h));
        let s_bc = self.subseg(lnext(h));
        let s_ca = self.subseg(lprev(h));

        // Left side: (a, b, c) becomes (a, v, c) and (v, b, c).
        let t1 = h.tri;
        let tri1 = &mut self.triangles[t1];
        tri1.vertices = [c, a, v]; // edges: a -> v, v -> c, c -> a
        tri1.subsegs = [None; 3];
        let t2 = self.make_triangle(c, v, b); // edges: v -> b, b -> c, c -> v

        self.bond(EdgeHandle::new(t1, 1), EdgeHandle::new(t2, 2));
        for (edge, neighbor, subseg) in [
            (EdgeHandle::new(t1, 2), o_ca, s_ca),
            (EdgeHandle::new(t2, 1), o_bc, s_bc),
        ] {
            if self.is_dummy(neighbor) {
                self.bond_to_dummy(edge);
            } else {
                self.bond(edge, neighbor);
            }
            if let Some(s) = subseg {
                self.attach_subseg(edge, s);
            }
        }

        let mut link: SmallBuffer<EdgeHandle, 4> = SmallBuffer::new();
        link.push(EdgeHandle::new(t1, 2)); // c -> a
        link.push(EdgeHandle::new(t2, 1)); // b -> c

        let mut right: Option<(TriangleKey, TriangleKey)> = None;
        if two_sided {
            let d = self.apex(h_sym);
            let o_ad = self.sym(lnext(h_sym));
            let o_db = self.sym(lprev(h_sym));
            let s_ad = self.subseg(lnext(h_sym));
            let s_db = self.subseg(lprev(h_sym));

            // Right side: (b, a, d) becomes (b, v, d) and (v, a, d).
            let t3 = h_sym.tri;
            let tri3 = &mut self.triangles[t3];
            tri3.vertices = [d, b, v]; // edges: b -> v, v -> d, d -> b
            tri3.subsegs = [None; 3];
            let t4 = self.make_triangle(d, v, a); // edges: v -> a, a -> d, d -> v

            self.bond(EdgeHandle::new(t3, 1), EdgeHandle::new(t4, 2));
            for (edge, neighbor, subseg) in [
                (EdgeHandle::new(t3, 2), o_db, s_db),
                (EdgeHandle::new(t4, 1), o_ad, s_ad),
            ] {
                if self.is_dummy(neighbor) {
                    self.bond_to_dummy(edge);
                } else {
                    self.bond(edge, neighbor);
                }
                if let Some(s) = subseg {
                    self.attach_subseg(edge, s);
                }
            }

            // Cross bonds over the split edge.
            self.bond(EdgeHandle::new(t1, 0), EdgeHandle::new(t4, 0));
            self.bond(EdgeHandle::new(t2, 0), EdgeHandle::new(t3, 0));

            link.push(EdgeHandle::new(t4, 1)); // a -> d
            link.push(EdgeHandle::new(t3, 2)); // d -> b
            self.set_vertex_edge(d, Some(EdgeHandle::new(t3, 2)));
            right = Some((t3, t4));
        } else {
            self.bond_to_dummy(EdgeHandle::new(t1, 0));
            self.bond_to_dummy(EdgeHandle::new(t2, 0));
        }

        self.set_vertex_edge(a, Some(EdgeHandle::new(t1, 0)));
        self.set_vertex_edge(b, Some(EdgeHandle::new(t2, 1)));
        self.set_vertex_edge(c, Some(EdgeHandle::new(t1, 2)));
        self.set_vertex_edge(v, Some(EdgeHandle::new(t2, 0)));

        let subseg_halves = split_sub.map(|s| {
            let sub = self.subsegments[s].clone();
            let forward = sub.vertices == [a, b];
            debug_assert!(forward || sub.vertices == [b, a]);
            let (link_a, link_b) = if forward {
                (sub.links[0], sub.links[1])
            } else {
                (sub.links[1], sub.links[0])
            };

            let dummy_edge = self.dummy_edge();
            let s1 = self.subsegments.insert(Subsegment {
                vertices: [a, v],
                edges: [dummy_edge; 2],
                links: [link_a, None],
            });
            let s2 = self.subsegments.insert(Subsegment {
                vertices: [v, b],
                edges: [dummy_edge; 2],
                links: [Some(s1), link_b],
            });
            self.subsegments[s1].links[1] = Some(s2);

            // Redirect the outer chain links from the old subsegment.
            for (outer, replacement) in [(link_a, s1), (link_b, s2)] {
                if let Some(o) = outer {
                    for slot in &mut self.subsegments[o].links {
                        if *slot == Some(s) {
                            *slot = Some(replacement);
                        }
                    }
                }
            }

            self.attach_subseg(EdgeHandle::new(t1, 0), s1);
            self.attach_subseg(EdgeHandle::new(t2, 0), s2);
            if let Some((t3, t4)) = right {
                self.attach_subseg(EdgeHandle::new(t4, 0), s1);
                self.attach_subseg(EdgeHandle::new(t3, 0), s2);
            }
            self.remove_subsegment(s);
            (s1, s2)
        });

        SplitEdge {
            link_edges: link,
            subseg_halves,
        }
    }

    // -------------------------------------------------------------------------
    // Legalization
    // -------------------------------------------------------------------------

    /// Lawson legalization: flips every reachable edge that violates the
    /// local Delaunay property, starting from the seeds on `stack`.
    ///
    /// Dummy-bounded edges and subsegments are never flipped. Each flip
    /// re-pushes the four surrounding edges at their new anchors, so edges
    /// re-anchored by earlier flips are always revisited.
    pub(crate) fn legalize(&mut self, stack: &mut Vec<EdgeHandle>) {
        while let Some(e) = stack.pop() {
            if !self.triangles.contains_key(e.tri) || e.tri == self.dummy {
                continue;
            }
            let e_sym = self.sym(e);
            if self.is_dummy(e_sym) || self.subseg(e).is_some() {
                continue;
            }
            let a = self.point_of(self.org(e));
            let b = self.point_of(self.dest(e));
            let c = self.point_of(self.apex(e));
            let d = self.point_of(self.apex(e_sym));
            if incircle(a, b, c, d) == InCircle::INSIDE {
                stack.extend(self.flip(e));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Recomputes every vertex's incident-edge hint and the hot handle from
    /// scratch. Used after bulk deletions.
    pub(crate) fn rebuild_vertex_edges(&mut self) {
        for vertex in &mut self.vertices {
            vertex.edge = None;
        }
        let keys: Vec<TriangleKey> = self.triangle_keys().collect();
        for key in keys {
            let [v0, v1, v2] = self.triangles[key].vertices;
            self.vertices[v0.index()].edge = Some(EdgeHandle::new(key, 2));
            self.vertices[v1.index()].edge = Some(EdgeHandle::new(key, 0));
            self.vertices[v2.index()].edge = Some(EdgeHandle::new(key, 1));
        }
        self.hot = self.first_real_edge();
    }

    /// Checks the structural invariants: counterclockwise vertex order,
    /// mutual neighbor links, and consistent subsegment bonds.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshValidationError`] found.
    pub fn is_valid(&self) -> Result<(), MeshValidationError> {
        for (index, key) in self.triangle_keys().enumerate() {
            let [v0, v1, v2] = self.triangles[key].vertices;
            let orientation = orient2d(self.point_of(v0), self.point_of(v1), self.point_of(v2));
            if orientation != Orientation::POSITIVE {
                return Err(MeshValidationError::NotCounterclockwise { index });
            }
            for orient in 0..3 {
                let h = EdgeHandle::new(key, orient);
                let s = self.sym(h);
                if !self.is_dummy(s) && self.sym(s) != h {
                    return Err(MeshValidationError::AsymmetricNeighbors { index, orient });
                }
                if let Some(sub_key) = self.subseg(h) {
                    let sub = &self.subsegments[sub_key];
                    if !sub.edges.contains(&h) {
                        return Err(MeshValidationError::SubsegmentMismatch { index, orient });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Result of [`Mesh::split_edge`].
pub(crate) struct SplitEdge {
    /// The edges facing the new vertex, seeds for legalization.
    pub link_edges: SmallBuffer<EdgeHandle, 4>,
    /// The two halves of the split subsegment, when the edge carried one.
    pub subseg_halves: Option<(SubsegKey, SubsegKey)>,
}

// =============================================================================
// TESTS
// =============================================================================
