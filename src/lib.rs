//! # trigen
//!
//! A 2D Delaunay triangulation and Voronoi tessellation engine.
//!
//! Given planar input points, optionally with constraining segments, hole
//! markers, and quality bounds, the engine produces:
//!
//! - an unconstrained Delaunay triangulation,
//! - a constrained Delaunay triangulation (CDT) in which every prescribed
//!   segment appears as a union of triangulation edges,
//! - a conforming Delaunay triangulation in which segments are subdivided
//!   at Steiner points until every edge is Delaunay in its own right,
//! - a quality mesh meeting minimum-angle and maximum-area bounds
//!   (Ruppert-style refinement), or
//! - the dual Voronoi diagram of the point set.
//!
//! All of these share a single edge-based mesh representation
//! ([`crate::core::mesh::Mesh`]) and a small set of primitive operators (`sym`,
//! `lnext`, `onext`, `bond`, `flip`, vertex splits), with every topological
//! decision made by exact adaptive predicates
//! ([`crate::geometry::predicates`]).
//!
//! # Basic usage
//!
//! ```
//! use trigen::prelude::*;
//!
//! let mut tri = Triangulator::new(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 2.0),
//!     Point::new(3.0, 3.0),
//!     Point::new(1.5, 2.125),
//! ]);
//!
//! // Plain Delaunay triangulation.
//! tri.triangulate(false, TraceLevel::None).unwrap();
//! assert_eq!(tri.number_of_triangles(), 4);
//!
//! // Iterate faces through directed-edge handles.
//! for face in tri.faces().unwrap() {
//!     assert!(face.area() > 0.0);
//!     let origin = face.org();
//!     assert!(origin.input_index.is_some()); // no Steiner points yet
//! }
//!
//! // Voronoi dual: one Voronoi vertex per triangle.
//! tri.tessellate(false, TraceLevel::None).unwrap();
//! assert_eq!(tri.number_of_voronoi_points(), 4);
//! ```
//!
//! # Quality meshing
//!
//! ```
//! use trigen::prelude::*;
//!
//! let mut tri = Triangulator::new(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 2.0),
//!     Point::new(3.0, 3.0),
//!     Point::new(1.5, 2.125),
//! ]);
//! tri.set_min_angle(27.5);
//! assert!(tri.check_constraints_opt(false)); // provably terminating
//!
//! tri.triangulate(true, TraceLevel::None).unwrap();
//! assert!(tri.number_of_triangles() > 4);
//! ```
//!
//! Refinement is guaranteed to terminate for angle bounds up to
//! [`crate::core::triangulator::MIN_ANGLE_GUARANTEED`] degrees and highly likely
//! to terminate up to [`crate::core::triangulator::MIN_ANGLE_POSSIBLE`]; bounds
//! beyond that are refused with
//! [`TrigenError::ConstraintOutOfRange`](crate::core::triangulator::TrigenError).
//!
//! # Robustness
//!
//! The orientation and in-circle predicates are exact in sign for all
//! finite double inputs (adaptive-precision expansions via the `robust`
//! crate). Plain floating-point predicates silently corrupt the mesh near
//! cocircular configurations; nothing in this crate decides topology with
//! them.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Mesh storage, primitive operators, triangulation algorithms, and the
/// public facade.
pub mod core {
    /// The triangulation pipeline stages.
    pub mod algorithms {
        pub mod carve;
        pub mod incremental;
        pub mod refine;
        pub mod segments;
    }
    pub mod collections;
    pub mod locate;
    pub mod mesh;
    pub mod triangulator;
    pub mod voronoi;

    pub use mesh::*;
    pub use triangulator::*;
    pub use voronoi::*;
}

/// Points, bounding boxes, and exact geometric predicates.
pub mod geometry {
    pub mod point;
    pub mod predicates;

    pub use point::*;
    pub use predicates::*;
}

/// File sinks (Geomview OFF).
pub mod io {
    pub mod off;
}

/// Commonly used types, re-exported for convenient glob import.
pub mod prelude {
    pub use crate::core::mesh::{EdgeHandle, Mesh, VertexKind};
    pub use crate::core::triangulator::{
        Face, FaceVertex, MeshingOptions, MeshingOptionsBuilder, TraceLevel, TriangulationState,
        Triangulator, TrigenError, VertexView,
    };
    pub use crate::core::voronoi::{VoronoiDiagram, VoronoiEdge, VoronoiEnd};
    pub use crate::geometry::point::{BoundingBox, Point};
    pub use crate::geometry::predicates::{incircle, orient2d, InCircle, Orientation};
}
