//! Procedural meshes.
//!
//! Small generators used by the tests, benches and demos: flat grids, an
//! octahedron, subdivided spheres and a few closed layout meshes.

use std::collections::HashMap;

use nalgebra::Point3;

use super::builder::{build_from_polygons, build_from_triangles};
use super::halfedge::HalfEdgeMesh;
use super::index::MeshIndex;

/// A flat `n x n` grid of unit squares in the XY plane, each split into two triangles.
///
/// Vertex `(i, j)` has index `j * (n + 1) + i` and position `(i, j, 0)`.
///
/// # Panics
/// If `n` is 0, since a grid without cells has no faces.
pub fn grid<I: MeshIndex>(n: usize) -> HalfEdgeMesh<I> {
    assert!(n > 0, "grid needs at least one cell per side");
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).expect("grid connectivity is valid")
}

fn octahedron_data() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    (vertices, faces)
}

/// The regular octahedron with vertices on the coordinate axes.
///
/// Vertex order: `+x, -x, +y, -y, +z, -z`.
pub fn octahedron<I: MeshIndex>() -> HalfEdgeMesh<I> {
    let (vertices, faces) = octahedron_data();
    build_from_triangles(&vertices, &faces).expect("octahedron connectivity is valid")
}

/// A unit sphere obtained by `level` rounds of 1-to-4 midpoint subdivision of
/// the octahedron, projecting new vertices onto the sphere.
///
/// The six octahedron vertices keep indices `0..6`.
pub fn icosphere<I: MeshIndex>(level: usize) -> HalfEdgeMesh<I> {
    let (mut vertices, mut faces) = octahedron_data();

    for _ in 0..level {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Point3<f64>>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = (vertices[a].coords + vertices[b].coords).normalize();
                vertices.push(Point3::from(p));
                vertices.len() - 1
            })
        };

        let mut refined = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            refined.push([a, ab, ca]);
            refined.push([ab, b, bc]);
            refined.push([ca, bc, c]);
            refined.push([ab, bc, ca]);
        }
        faces = refined;
    }

    build_from_triangles(&vertices, &faces).expect("sphere connectivity is valid")
}

/// A closed tetrahedral layout on four given positions.
///
/// Faces are oriented counter-clockwise when the positions are the corners of
/// a tetrahedron with vertex 3 above the triangle `0, 1, 2` (viewed from +z,
/// `0, 1, 2` counter-clockwise).
pub fn tetrahedron_layout<I: MeshIndex>(positions: [Point3<f64>; 4]) -> HalfEdgeMesh<I> {
    let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    build_from_triangles(&positions, &faces).expect("tetrahedron connectivity is valid")
}

/// A closed layout with three vertices, three edges and two triangular faces
/// (front and back of the same triangle).
pub fn double_triangle_layout<I: MeshIndex>(positions: [Point3<f64>; 3]) -> HalfEdgeMesh<I> {
    let faces = vec![vec![0, 1, 2], vec![0, 2, 1]];
    build_from_polygons(&positions, &faces).expect("double triangle connectivity is valid")
}
