//! Geomview OFF export.
//!
//! Writes the triangulation as an ASCII OFF file: the header with vertex,
//! face and edge counts, the vertex list (z fixed at 0), and one face
//! record per triangle.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::core::mesh::{Mesh, VertexKind};

/// Writes the mesh to `path` as an ASCII OFF file.
pub(crate) fn write_off_file<P: AsRef<Path>>(mesh: &Mesh, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write_off(mesh, &mut out)?;
    out.flush()
}

/// Writes the mesh to any sink in OFF format.
pub fn write_off<W: Write>(mesh: &Mesh, out: &mut W) -> io::Result<()> {
    // OFF indexes vertices by position in the list; bounding corners are
    // not part of the triangulation and are skipped.
    let mut index_of: Vec<usize> = vec![usize::MAX; mesh.vertices().len()];
    let mut vertex_count = 0;
    for (i, v) in mesh.vertices().iter().enumerate() {
        if !matches!(v.kind, VertexKind::Bounding) {
            index_of[i] = vertex_count;
            vertex_count += 1;
        }
    }

    writeln!(out, "OFF")?;
    writeln!(
        out,
        "{} {} {}",
        vertex_count,
        mesh.finite_triangle_count(),
        mesh.edge_count()
    )?;
    for v in mesh.vertices() {
        if !matches!(v.kind, VertexKind::Bounding) {
            writeln!(out, "{} {} 0", v.point.x, v.point.y)?;
        }
    }
    for key in mesh.triangle_keys() {
        let [v0, v1, v2] = mesh.triangle_vertices(key);
        writeln!(
            out,
            "3 {} {} {}",
            index_of[v0.index()],
            index_of[v1.index()],
            index_of[v2.index()]
        )?;
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
    use crate::core::triangulator::TraceLevel;
    use crate::geometry::point::Point;

    #[test]
    fn off_output_has_header_counts_and_records() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(1.0, 0.7),
        ];
        let mut mesh = Mesh::new();
        build_delaunay(&mut mesh, &points, TraceLevel::None).unwrap();

        let mut buffer = Vec::new();
        write_off(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("OFF"));
        assert_eq!(lines.next(), Some("4 3 6"));

        let rest: Vec<&str> = lines.collect();
        assert_eq!(rest.len(), 7);
        // Four vertex rows with z = 0, then three triangle rows.
        for row in &rest[..4] {
            assert!(row.ends_with(" 0"));
        }
        for row in &rest[4..] {
            assert!(row.starts_with("3 "));
            let indices: Vec<usize> = row[2..]
                .split_whitespace()
                .map(|t| t.parse().unwrap())
                .collect();
            assert_eq!(indices.len(), 3);
            assert!(indices.iter().all(|&i| i < 4));
        }
    }
}
