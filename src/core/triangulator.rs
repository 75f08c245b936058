//! The public triangulation facade.
//!
//! [`Triangulator`] owns the input points, the configured constraints, and
//! the mesh they produce. A mesh instance moves through three states:
//! `Empty` (input accepted, nothing built), `Triangulated` (triangle
//! queries valid), and `Tessellated` (Voronoi queries valid as well). Any
//! triangulate call implicitly resets to `Empty` first, releasing all
//! triangles and subsegments; on failure the instance is left `Empty` with
//! storage released, never half-built.
//!
//! Configuration errors are reported synchronously by the call that
//! introduces them, without touching the mesh.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::carve::{carve, mark_hull_subsegments};
use crate::core::algorithms::incremental::build_delaunay;
use crate::core::algorithms::refine::{refine, QualityBounds};
use crate::core::algorithms::segments::insert_segments;
use crate::core::collections::FastHashMap;
use crate::core::mesh::{lnext, lprev, EdgeHandle, Mesh, VertexId, VertexKind};
use crate::core::voronoi::{self, VoronoiDiagram, VoronoiEdge};
use crate::geometry::point::{BoundingBox, Point};
use crate::geometry::predicates::signed_area;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Minimum-angle bound below which Ruppert refinement provably terminates.
pub const MIN_ANGLE_GUARANTEED: f64 = 28.6;

/// Minimum-angle bound below which refinement terminates in practice.
/// Between the two bounds termination is highly likely but not provable;
/// above this one the engine refuses to refine.
pub const MIN_ANGLE_POSSIBLE: f64 = 33.8;

/// Angle bound applied when quality meshing is requested with no explicit
/// minimum angle.
pub const DEFAULT_MIN_ANGLE: f64 = 20.0;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the triangulation engine.
#[derive(Debug, Error)]
pub enum TrigenError {
    /// The input violates the point/segment/hole contract.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What the input violated.
        message: String,
    },
    /// A quality constraint exceeds the supported range.
    #[error("minimum angle {min_angle}° exceeds the {limit}° refinement limit")]
    ConstraintOutOfRange {
        /// The offending requested angle, in degrees.
        min_angle: f64,
        /// The limit that was exceeded, in degrees.
        limit: f64,
    },
    /// A query was made in the wrong state.
    #[error("operation requires the {expected} state, but the mesh is {actual}")]
    StateViolation {
        /// The state the operation needs.
        expected: &'static str,
        /// The state the mesh is in.
        actual: &'static str,
    },
    /// Arithmetic gave out: refinement overran its budget or produced
    /// sub-ULP geometry.
    #[error("numeric failure: {message}")]
    NumericFailure {
        /// What went numerically wrong.
        message: String,
    },
    /// Geomview export failed.
    #[error("geomview export failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Diagnostic emission volume. Has no effect on results.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TraceLevel {
    /// Emit nothing.
    #[default]
    None,
    /// Summaries per triangulation phase.
    Info,
    /// Per-vertex insertion messages as well.
    Vertex,
    /// Everything the engine can say.
    Debug,
}

/// Quality and carving options, settable individually on the
/// [`Triangulator`] or built up front with [`MeshingOptionsBuilder`].
///
/// # Examples
///
/// ```
/// use trigen::core::triangulator::MeshingOptionsBuilder;
///
/// let options = MeshingOptionsBuilder::default()
///     .min_angle(27.5)
///     .keep_convex_hull(true)
///     .build()
///     .unwrap();
/// assert_eq!(options.max_area, 0.0);
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default)]
pub struct MeshingOptions {
    /// Minimum resulting angle in degrees; `<= 0` clears the constraint.
    pub min_angle: f64,
    /// Maximum triangle area; `<= 0` clears the constraint.
    pub max_area: f64,
    /// Keep the convex hull even when segments would leave concavities.
    pub keep_convex_hull: bool,
}

impl Default for MeshingOptions {
    fn default() -> Self {
        Self {
            min_angle: 0.0,
            max_area: 0.0,
            keep_convex_hull: false,
        }
    }
}

/// Lifecycle state of a [`Triangulator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriangulationState {
    /// Points accepted, nothing triangulated yet.
    #[default]
    Empty,
    /// A triangulation exists; triangle queries are valid.
    Triangulated,
    /// The Voronoi dual has been computed as well.
    Tessellated,
}

impl TriangulationState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Triangulated => "Triangulated",
            Self::Tessellated => "Tessellated",
        }
    }
}

// =============================================================================
// TRIANGULATOR
// =============================================================================

/// Delaunay/CDT/Voronoi engine over one set of input points.
///
/// # Examples
///
/// ```
/// use trigen::core::triangulator::{TraceLevel, Triangulator};
/// use trigen::geometry::point::Point;
///
/// let mut tri = Triangulator::new(vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 1.0),
///     Point::new(0.0, 2.0),
///     Point::new(3.0, 3.0),
///     Point::new(1.5, 2.125),
/// ]);
/// tri.triangulate(false, TraceLevel::None).unwrap();
/// assert_eq!(tri.number_of_triangles(), 4);
/// ```
#[derive(Debug, Default)]
pub struct Triangulator {
    points: Vec<Point>,
    options: MeshingOptions,
    segments: Vec<[usize; 2]>,
    holes: Vec<Point>,
    mesh: Mesh,
    state: TriangulationState,
    duplicates: Vec<(usize, usize)>,
    vertex_of_input: Vec<VertexId>,
    voronoi: Option<VoronoiDiagram>,
}

impl Triangulator {
    /// Creates an engine over the given input points. Duplicate points are
    /// permitted; they are collapsed during triangulation and reported via
    /// [`Triangulator::duplicates`].
    #[must_use]
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Creates an engine with pre-built options.
    #[must_use]
    pub fn with_options(points: Vec<Point>, options: MeshingOptions) -> Self {
        Self {
            points,
            options,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Sets the minimum-angle quality constraint, in degrees. A value
    /// `<= 0` clears it.
    pub fn set_min_angle(&mut self, angle: f64) {
        self.options.min_angle = angle;
    }

    /// Sets the maximum-area quality constraint. A value `<= 0` clears it.
    pub fn set_max_area(&mut self, area: f64) {
        self.options.max_area = area;
    }

    /// Keeps the convex hull intact when triangulating with segments,
    /// instead of stripping concavities outside the outermost segment loop.
    pub fn use_convex_hull_with_segments(&mut self, keep: bool) {
        self.options.keep_convex_hull = keep;
    }

    /// Sets constraining segments given as point pairs: elements `2k` and
    /// `2k + 1` are the endpoints of segment `k`. Every endpoint must
    /// coincide with an input point.
    ///
    /// # Errors
    ///
    /// [`TrigenError::InvalidInput`] if the sequence has odd length, an
    /// endpoint matches no input point, or a segment's endpoints coincide.
    /// Nothing is stored on failure.
    pub fn set_segment_constraint(&mut self, endpoints: &[Point]) -> Result<(), TrigenError> {
        if endpoints.len() % 2 != 0 {
            return Err(TrigenError::InvalidInput {
                message: "segment endpoint list has odd length".to_string(),
            });
        }
        let mut lookup: FastHashMap<(u64, u64), usize> = FastHashMap::default();
        for (i, p) in self.points.iter().enumerate() {
            lookup.entry(point_bits(p)).or_insert(i);
        }
        let mut resolved = Vec::with_capacity(endpoints.len() / 2);
        for pair in endpoints.chunks_exact(2) {
            let a = *lookup
                .get(&point_bits(&pair[0]))
                .ok_or_else(|| unknown_endpoint(&pair[0]))?;
            let b = *lookup
                .get(&point_bits(&pair[1]))
                .ok_or_else(|| unknown_endpoint(&pair[1]))?;
            if self.points[a].coincides_with(&self.points[b]) {
                return Err(TrigenError::InvalidInput {
                    message: "segment endpoints coincide".to_string(),
                });
            }
            resolved.push([a, b]);
        }
        self.segments = resolved;
        Ok(())
    }

    /// Sets constraining segments given as indices into the input point
    /// array, interpreted pairwise like [`Triangulator::set_segment_constraint`].
    ///
    /// # Errors
    ///
    /// [`TrigenError::InvalidInput`] under the same conditions, plus
    /// out-of-range indices. Nothing is stored on failure.
    pub fn set_segment_constraint_indices(&mut self, indices: &[usize]) -> Result<(), TrigenError> {
        if indices.len() % 2 != 0 {
            return Err(TrigenError::InvalidInput {
                message: "segment index list has odd length".to_string(),
            });
        }
        let mut resolved = Vec::with_capacity(indices.len() / 2);
        for pair in indices.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            if a >= self.points.len() || b >= self.points.len() {
                return Err(TrigenError::InvalidInput {
                    message: format!("segment references vertex {} of {}", a.max(b), self.points.len()),
                });
            }
            if self.points[a].coincides_with(&self.points[b]) {
                return Err(TrigenError::InvalidInput {
                    message: "segment endpoints coincide".to_string(),
                });
            }
            resolved.push([a, b]);
        }
        self.segments = resolved;
        Ok(())
    }

    /// Sets hole markers. Each marker must lie inside the region to remove.
    ///
    /// # Errors
    ///
    /// [`TrigenError::InvalidInput`] for non-finite coordinates. A marker
    /// outside the triangulation is reported by the triangulate call.
    pub fn set_holes_constraint(&mut self, holes: &[Point]) -> Result<(), TrigenError> {
        for p in holes {
            p.validate().map_err(|e| TrigenError::InvalidInput {
                message: e.to_string(),
            })?;
        }
        self.holes = holes.to_vec();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Constraint sanity
    // -------------------------------------------------------------------------

    /// The static angle-bound contract: refinement is guaranteed to
    /// terminate up to the first value and highly likely to terminate up to
    /// the second.
    #[must_use]
    pub const fn min_angle_boundaries() -> (f64, f64) {
        (MIN_ANGLE_GUARANTEED, MIN_ANGLE_POSSIBLE)
    }

    /// Checks the configured minimum angle against the contract. Returns
    /// `(guaranteed, possible)`.
    #[must_use]
    pub fn check_constraints(&self) -> (bool, bool) {
        let angle = self.effective_min_angle();
        (angle <= MIN_ANGLE_GUARANTEED, angle <= MIN_ANGLE_POSSIBLE)
    }

    /// Single-answer form of [`Triangulator::check_constraints`]: strict
    /// acceptance requires the guaranteed bound, relaxed acceptance the
    /// possible one.
    #[must_use]
    pub fn check_constraints_opt(&self, relaxed: bool) -> bool {
        let (guaranteed, possible) = self.check_constraints();
        if relaxed {
            possible
        } else {
            guaranteed
        }
    }

    fn effective_min_angle(&self) -> f64 {
        if self.options.min_angle > 0.0 {
            self.options.min_angle
        } else {
            DEFAULT_MIN_ANGLE
        }
    }

    // -------------------------------------------------------------------------
    // Triangulation operations
    // -------------------------------------------------------------------------

    /// Builds the Delaunay triangulation, constrained by any configured
    /// segments (CDT) and carved by any hole markers. With `quality`,
    /// Ruppert refinement runs afterwards.
    ///
    /// # Errors
    ///
    /// See [`TrigenError`]; on failure the instance is reset to `Empty`.
    pub fn triangulate(&mut self, quality: bool, trace: TraceLevel) -> Result<(), TrigenError> {
        let strip = !self.segments.is_empty() && !self.options.keep_convex_hull;
        self.run_pipeline(false, quality, strip, trace)
    }

    /// Like [`Triangulator::triangulate`], but enforces segments by
    /// conforming subdivision: segments are split at Steiner midpoints
    /// until every piece is a Delaunay edge, so the result is a true
    /// Delaunay triangulation.
    ///
    /// # Errors
    ///
    /// See [`TrigenError`]; on failure the instance is reset to `Empty`.
    pub fn triangulate_conforming(
        &mut self,
        quality: bool,
        trace: TraceLevel,
    ) -> Result<(), TrigenError> {
        let strip = !self.segments.is_empty() && !self.options.keep_convex_hull;
        self.run_pipeline(true, quality, strip, trace)
    }

    /// Triangulates (conforming when `use_conforming` is set) and extracts
    /// the Voronoi dual.
    ///
    /// The dual is only defined on a convex, hole-free, true Delaunay
    /// triangulation: hole markers are rejected, plain constrained
    /// segments are rejected unless `use_conforming` is set, and the
    /// convex hull is kept regardless of the hull flag.
    ///
    /// # Errors
    ///
    /// See [`TrigenError`]; on failure the instance is reset to `Empty`.
    pub fn tessellate(&mut self, use_conforming: bool, trace: TraceLevel) -> Result<(), TrigenError> {
        if !self.holes.is_empty() {
            return Err(TrigenError::InvalidInput {
                message: "Voronoi tessellation requires a hole-free triangulation".to_string(),
            });
        }
        if !self.segments.is_empty() && !use_conforming {
            return Err(TrigenError::InvalidInput {
                message: "Voronoi tessellation with segments requires the conforming variant"
                    .to_string(),
            });
        }
        self.run_pipeline(use_conforming, false, false, trace)?;
        match voronoi::extract(&self.mesh) {
            Ok(diagram) => {
                if trace >= TraceLevel::Info {
                    info!(
                        "tessellated: {} Voronoi points, {} Voronoi edges",
                        diagram.points.len(),
                        diagram.edges.len()
                    );
                }
                self.voronoi = Some(diagram);
                self.state = TriangulationState::Tessellated;
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &mut self,
        conforming: bool,
        quality: bool,
        strip_outer: bool,
        trace: TraceLevel,
    ) -> Result<(), TrigenError> {
        self.reset();
        match self.build(conforming, quality, strip_outer, trace) {
            Ok(()) => {
                self.state = TriangulationState::Triangulated;
                if trace >= TraceLevel::Info {
                    info!(
                        "triangulated: {} triangles, {} vertices, {} hull edges",
                        self.mesh.finite_triangle_count(),
                        self.mesh.finite_vertex_count(),
                        self.mesh.hull_edge_count()
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        conforming: bool,
        quality: bool,
        strip_outer: bool,
        trace: TraceLevel,
    ) -> Result<(), TrigenError> {
        if quality {
            let angle = self.effective_min_angle();
            if angle > MIN_ANGLE_POSSIBLE {
                return Err(TrigenError::ConstraintOutOfRange {
                    min_angle: angle,
                    limit: MIN_ANGLE_POSSIBLE,
                });
            }
        }

        let output = build_delaunay(&mut self.mesh, &self.points, trace)?;
        self.duplicates = output.duplicates;
        self.vertex_of_input = output.vertex_of_input;

        if !self.segments.is_empty() {
            let pairs: Vec<[VertexId; 2]> = self
                .segments
                .iter()
                .map(|&[a, b]| [self.vertex_of_input[a], self.vertex_of_input[b]])
                .collect();
            for pair in &pairs {
                if pair[0] == pair[1] {
                    return Err(TrigenError::InvalidInput {
                        message: "segment endpoints collapsed onto one vertex".to_string(),
                    });
                }
            }
            insert_segments(&mut self.mesh, &pairs, conforming, trace)?;
        }

        if strip_outer || !self.holes.is_empty() {
            carve(&mut self.mesh, &self.holes, strip_outer, trace)?;
        }
        if quality || !self.segments.is_empty() {
            mark_hull_subsegments(&mut self.mesh);
        }
        if quality {
            let bounds = QualityBounds {
                min_angle_deg: self.effective_min_angle(),
                max_area: (self.options.max_area > 0.0).then_some(self.options.max_area),
            };
            refine(&mut self.mesh, &bounds, trace)?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.mesh = Mesh::new();
        self.state = TriangulationState::Empty;
        self.voronoi = None;
        self.duplicates.clear();
        self.vertex_of_input.clear();
    }

    // -------------------------------------------------------------------------
    // State and counts
    // -------------------------------------------------------------------------

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TriangulationState {
        self.state
    }

    /// Whether a triangulation currently exists.
    #[must_use]
    pub fn has_triangulation(&self) -> bool {
        self.state != TriangulationState::Empty
    }

    /// Number of triangles. Zero before triangulation.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.mesh.finite_triangle_count()
    }

    /// Number of undirected edges. Zero before triangulation.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.mesh.edge_count()
    }

    /// Number of vertices, Steiner points included.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.mesh.finite_vertex_count()
    }

    /// Number of convex-hull (boundary) edges.
    #[must_use]
    pub fn hull_size(&self) -> usize {
        self.mesh.hull_edge_count()
    }

    /// Number of configured hole markers.
    #[must_use]
    pub fn number_of_holes(&self) -> usize {
        self.holes.len()
    }

    /// Number of Voronoi vertices. Zero before tessellation.
    #[must_use]
    pub fn number_of_voronoi_points(&self) -> usize {
        self.voronoi.as_ref().map_or(0, |v| v.points.len())
    }

    /// Number of Voronoi edges. Zero before tessellation.
    #[must_use]
    pub fn number_of_voronoi_edges(&self) -> usize {
        self.voronoi.as_ref().map_or(0, |v| v.edges.len())
    }

    /// Advisory list of collapsed duplicate input points, as
    /// `(duplicate, survivor)` input indices.
    #[must_use]
    pub fn duplicates(&self) -> &[(usize, usize)] {
        &self.duplicates
    }

    /// Axis-aligned bounding box of the input point set.
    ///
    /// # Errors
    ///
    /// [`TrigenError::InvalidInput`] when there are no input points.
    pub fn bounding_box(&self) -> Result<BoundingBox, TrigenError> {
        BoundingBox::from_points(&self.points).ok_or_else(|| TrigenError::InvalidInput {
            message: "no input points".to_string(),
        })
    }

    fn require_triangulated(&self) -> Result<(), TrigenError> {
        if self.state == TriangulationState::Empty {
            return Err(TrigenError::StateViolation {
                expected: "Triangulated",
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    fn require_tessellated(&self) -> Result<&VoronoiDiagram, TrigenError> {
        self.voronoi.as_ref().ok_or(TrigenError::StateViolation {
            expected: "Tessellated",
            actual: self.state.as_str(),
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Iterates the mesh vertices in internal order.
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before triangulation.
    pub fn vertices(&self) -> Result<impl Iterator<Item = VertexView> + '_, TrigenError> {
        self.require_triangulated()?;
        Ok(self
            .mesh
            .vertices()
            .iter()
            .enumerate()
            .filter(|(_, v)| !matches!(v.kind, VertexKind::Bounding))
            .map(|(id, v)| VertexView {
                id,
                input_index: v.input_index(),
                point: v.point,
            }))
    }

    /// Iterates the faces as directed-edge handles.
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before triangulation.
    pub fn faces(&self) -> Result<impl Iterator<Item = Face<'_>> + '_, TrigenError> {
        self.require_triangulated()?;
        Ok(self.mesh.triangle_keys().map(move |key| Face {
            mesh: &self.mesh,
            handle: EdgeHandle::new(key, 0),
        }))
    }

    /// Iterates the Voronoi vertices.
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before tessellation.
    pub fn voronoi_points(&self) -> Result<impl Iterator<Item = Point> + '_, TrigenError> {
        let diagram = self.require_tessellated()?;
        Ok(diagram.points.iter().copied())
    }

    /// Iterates the Voronoi edges.
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before tessellation.
    pub fn voronoi_edges(&self) -> Result<impl Iterator<Item = VoronoiEdge> + '_, TrigenError> {
        let diagram = self.require_tessellated()?;
        Ok(diagram.edges.iter().copied())
    }

    /// Returns an outgoing directed-edge handle at the vertex with internal
    /// id `vertex_id` (as reported by [`Triangulator::vertices`]).
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before triangulation;
    /// [`TrigenError::InvalidInput`] for an unknown id or a vertex with no
    /// surviving triangle.
    pub fn locate_vertex(&self, vertex_id: usize) -> Result<Face<'_>, TrigenError> {
        self.require_triangulated()?;
        let edge = self.vertex_handle(vertex_id)?;
        Ok(Face {
            mesh: &self.mesh,
            handle: edge,
        })
    }

    /// The triangles incident to a vertex, in counterclockwise order.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Triangulator::locate_vertex`].
    pub fn triangles_around_vertex(&self, vertex_id: usize) -> Result<Vec<Face<'_>>, TrigenError> {
        self.require_triangulated()?;
        self.vertex_handle(vertex_id)?;
        let id = VertexId(u32::try_from(vertex_id).expect("checked range"));
        Ok(self
            .mesh
            .edges_around(id)
            .into_iter()
            .map(|h| Face {
                mesh: &self.mesh,
                handle: h,
            })
            .collect())
    }

    fn vertex_handle(&self, vertex_id: usize) -> Result<EdgeHandle, TrigenError> {
        if vertex_id >= self.mesh.vertices().len() {
            return Err(TrigenError::InvalidInput {
                message: format!("vertex id {vertex_id} is out of range"),
            });
        }
        let id = VertexId(u32::try_from(vertex_id).expect("checked range"));
        if matches!(self.mesh.vertex(id).kind, VertexKind::Bounding) {
            return Err(TrigenError::InvalidInput {
                message: format!("vertex id {vertex_id} is out of range"),
            });
        }
        self.mesh
            .vertex_edge(id)
            .ok_or_else(|| TrigenError::InvalidInput {
                message: format!("vertex {vertex_id} has no incident triangle"),
            })
    }

    /// Writes the triangulation as an ASCII Geomview OFF file.
    ///
    /// # Errors
    ///
    /// [`TrigenError::StateViolation`] before triangulation,
    /// [`TrigenError::Io`] when the file cannot be written.
    pub fn write_off<P: AsRef<Path>>(&self, path: P) -> Result<(), TrigenError> {
        self.require_triangulated()?;
        crate::io::off::write_off_file(&self.mesh, path)?;
        Ok(())
    }
}

fn point_bits(p: &Point) -> (u64, u64) {
    // Normalize signed zero so (0.0, -0.0) and (0.0, 0.0) resolve alike.
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

fn unknown_endpoint(p: &Point) -> TrigenError {
    TrigenError::InvalidInput {
        message: format!("segment endpoint ({}, {}) matches no input point", p.x, p.y),
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// A vertex as reported by [`Triangulator::vertices`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexView {
    /// Internal vertex id, stable for the life of the triangulation and
    /// accepted by [`Triangulator::locate_vertex`].
    pub id: usize,
    /// The index of this vertex in the input sequence, or `None` for a
    /// Steiner point.
    pub input_index: Option<usize>,
    /// Position of the vertex.
    pub point: Point,
}

/// One endpoint of a face, with provenance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceVertex {
    /// The index in the input sequence, or `None` for a Steiner point.
    pub input_index: Option<usize>,
    /// Position of the vertex.
    pub point: Point,
}

/// A directed-edge view of a face, borrowed from the triangulation.
///
/// Traversal may reach the dummy triangle standing in for "outside the
/// mesh"; check [`Face::is_dummy`] before reading vertices there.
#[derive(Clone, Copy)]
pub struct Face<'m> {
    mesh: &'m Mesh,
    handle: EdgeHandle,
}

impl<'m> Face<'m> {
    /// The underlying directed edge handle.
    #[must_use]
    pub fn handle(&self) -> EdgeHandle {
        self.handle
    }

    /// Whether this view sits on the dummy triangle.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.mesh.is_dummy(self.handle)
    }

    fn vertex(&self, id: VertexId) -> FaceVertex {
        let v = self.mesh.vertex(id);
        FaceVertex {
            input_index: v.input_index(),
            point: v.point,
        }
    }

    /// Origin of the directed edge.
    ///
    /// # Panics
    ///
    /// Panics on the dummy triangle; check [`Face::is_dummy`] first.
    #[must_use]
    pub fn org(&self) -> FaceVertex {
        assert!(!self.is_dummy(), "org() called on the dummy triangle");
        self.vertex(self.mesh.org(self.handle))
    }

    /// Destination of the directed edge.
    ///
    /// # Panics
    ///
    /// Panics on the dummy triangle; check [`Face::is_dummy`] first.
    #[must_use]
    pub fn dest(&self) -> FaceVertex {
        assert!(!self.is_dummy(), "dest() called on the dummy triangle");
        self.vertex(self.mesh.dest(self.handle))
    }

    /// Apex of the face: the corner facing the directed edge.
    ///
    /// # Panics
    ///
    /// Panics on the dummy triangle; check [`Face::is_dummy`] first.
    #[must_use]
    pub fn apex(&self) -> FaceVertex {
        assert!(!self.is_dummy(), "apex() called on the dummy triangle");
        self.vertex(self.mesh.apex(self.handle))
    }

    /// Whether this directed edge coincides with a constrained subsegment
    /// (a user segment, a conforming piece of one, or a boundary edge).
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        !self.is_dummy() && self.mesh.subseg(self.handle).is_some()
    }

    /// The opposite directed edge, across this one.
    #[must_use]
    pub fn sym(&self) -> Face<'m> {
        Face {
            mesh: self.mesh,
            handle: self.mesh.sym(self.handle),
        }
    }

    /// The next edge counterclockwise around this face.
    #[must_use]
    pub fn lnext(&self) -> Face<'m> {
        Face {
            mesh: self.mesh,
            handle: lnext(self.handle),
        }
    }

    /// The previous edge counterclockwise around this face.
    #[must_use]
    pub fn lprev(&self) -> Face<'m> {
        Face {
            mesh: self.mesh,
            handle: lprev(self.handle),
        }
    }

    /// The next edge counterclockwise around the origin vertex.
    #[must_use]
    pub fn onext(&self) -> Face<'m> {
        Face {
            mesh: self.mesh,
            handle: self.mesh.onext(self.handle),
        }
    }

    /// The next edge clockwise around the origin vertex.
    #[must_use]
    pub fn oprev(&self) -> Face<'m> {
        Face {
            mesh: self.mesh,
            handle: self.mesh.oprev(self.handle),
        }
    }

    /// Signed area of the face (positive: all real faces are
    /// counterclockwise).
    ///
    /// # Panics
    ///
    /// Panics on the dummy triangle; check [`Face::is_dummy`] first.
    #[must_use]
    pub fn area(&self) -> f64 {
        assert!(!self.is_dummy(), "area() called on the dummy triangle");
        let a = self.mesh.point_of(self.mesh.org(self.handle));
        let b = self.mesh.point_of(self.mesh.dest(self.handle));
        let c = self.mesh.point_of(self.mesh.apex(self.handle));
        signed_area(a, b, c)
    }
}

impl std::fmt::Debug for Face<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dummy() {
            return write!(f, "Face(dummy)");
        }
        write!(
            f,
            "Face({:?} -> {:?} / {:?})",
            self.mesh.org(self.handle),
            self.mesh.dest(self.handle),
            self.mesh.apex(self.handle)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
