//! Wavefront OBJ format support.
//!
//! Only vertex positions (`v`) and polygon faces (`f`) are read. Face corners
//! may use the `v/vt/vn` syntax; texture and normal indices are ignored.
//! Negative (relative) indices are supported.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{EmbedError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex_polygons, HalfEdgeMesh, MeshIndex};

/// Raw contents of an OBJ file.
#[derive(Debug, Clone, Default)]
pub struct ObjData {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
    /// Zero-based polygon corner indices.
    pub faces: Vec<Vec<usize>>,
}

/// Parse OBJ text. `path` is only used for error messages.
pub fn parse<R: BufRead>(reader: R, path: &Path) -> Result<ObjData> {
    let mut data = ObjData::default();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_nr = line_idx + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in &mut coords {
                    let token = tokens
                        .next()
                        .ok_or_else(|| EmbedError::parse(path, line_nr, "vertex needs three coordinates"))?;
                    *c = token
                        .parse()
                        .map_err(|_| EmbedError::parse(path, line_nr, format!("invalid coordinate '{}'", token)))?;
                }
                data.vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let mut face = Vec::new();
                for token in tokens {
                    let index_str = token.split('/').next().unwrap_or(token);
                    let index: i64 = index_str
                        .parse()
                        .map_err(|_| EmbedError::parse(path, line_nr, format!("invalid face index '{}'", token)))?;
                    let resolved = if index > 0 {
                        index - 1
                    } else {
                        data.vertices.len() as i64 + index
                    };
                    if index == 0 || resolved < 0 {
                        return Err(EmbedError::parse(path, line_nr, format!("face index {} out of range", index)));
                    }
                    face.push(resolved as usize);
                }
                if face.len() < 3 {
                    return Err(EmbedError::parse(path, line_nr, "face needs at least three corners"));
                }
                data.faces.push(face);
            }
            // Comments, normals, texture coordinates, groups, materials
            _ => {}
        }
    }

    Ok(data)
}

/// Load a polygon mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use lembed::io::obj;
/// use lembed::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("layout.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EmbedError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let data = parse(BufReader::new(file), path)?;
    build_from_polygons(&data.vertices, &data.faces)
}

/// Write a mesh as OBJ text.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex_polygons(mesh);
    for p in &vertices {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for face in &faces {
        write!(writer, "f")?;
        for &v in face {
            write!(writer, " {}", v + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Save a mesh to an OBJ file.
///
/// Vertex positions are written with full `f64` round-trip precision.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| EmbedError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_parse_polygons_and_slashes() {
        let text = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1 4//1\n";
        let data = parse(text.as_bytes(), Path::new("quad.obj")).unwrap();
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.faces, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_parse_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let data = parse(text.as_bytes(), Path::new("tri.obj")).unwrap();
        assert_eq!(data.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_parse_error_has_line() {
        let text = "v 0 0 0\nv 1 x 0\n";
        let err = parse(text.as_bytes(), Path::new("bad.obj")).unwrap_err();
        assert!(matches!(err, EmbedError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sphere.obj");
        let mesh: HalfEdgeMesh = primitives::icosphere(1);
        save(&mesh, &path).unwrap();

        let loaded: HalfEdgeMesh = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), mesh.num_vertices());
        assert_eq!(loaded.num_faces(), mesh.num_faces());
        for v in mesh.vertex_ids() {
            assert_eq!(loaded.position(v), mesh.position(v));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result: Result<HalfEdgeMesh> = load("/nonexistent/mesh.obj");
        assert!(matches!(result, Err(EmbedError::LoadError { .. })));
    }
}
