//! Small embedding problems shared by the unit tests.

use super::{Embedding, EmbeddingInput};
use crate::mesh::{build_from_polygons, primitives, to_face_vertex_polygons, HalfEdgeMesh, VertexId};

/// Tetrahedral layout on a subdivided octahedron.
///
/// Layout vertices 0..4 are pinned to target vertices `+x (0)`, `+z (4)`,
/// `+y (2)` and `-x (1)`, which gives an outward-oriented layout.
pub(crate) fn sphere_tetrahedron(level: usize) -> Embedding {
    let target: HalfEdgeMesh = primitives::icosphere(level);
    let landmarks = [0, 4, 2, 1].map(VertexId::new);
    let positions = landmarks.map(|v| *target.position(v));
    let layout = primitives::tetrahedron_layout(positions);
    let input = EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap();
    Embedding::new(input).unwrap()
}

/// Two-faced triangle layout on a subdivided octahedron, pinned to
/// `+x (0)`, `+y (2)` and `+z (4)`.
pub(crate) fn sphere_triangle(level: usize) -> Embedding {
    let target: HalfEdgeMesh = primitives::icosphere(level);
    let landmarks = [0, 2, 4].map(VertexId::new);
    let positions = landmarks.map(|v| *target.position(v));
    let layout = primitives::double_triangle_layout(positions);
    let input = EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap();
    Embedding::new(input).unwrap()
}

/// Grid vertex index of `(i, j)` in [`primitives::grid`].
pub(crate) fn grid_vertex(n: usize, i: usize, j: usize) -> VertexId {
    VertexId::new(j * (n + 1) + i)
}

/// Tetrahedral layout on an `n x n` grid with landmarks at the given grid coordinates.
pub(crate) fn grid_tetrahedron(n: usize, corners: [(usize, usize); 4]) -> Embedding {
    tetrahedron_on_grid(primitives::grid(n), n, corners)
}

/// [`grid_tetrahedron`] with every X coordinate multiplied by `x_scale`.
///
/// Grid indices are unchanged; only the metric differs.
pub(crate) fn scaled_grid_tetrahedron(n: usize, x_scale: f64, corners: [(usize, usize); 4]) -> Embedding {
    let grid: HalfEdgeMesh = primitives::grid(n);
    let (mut positions, faces) = to_face_vertex_polygons(&grid);
    for p in &mut positions {
        p.x *= x_scale;
    }
    tetrahedron_on_grid(build_from_polygons(&positions, &faces).unwrap(), n, corners)
}

fn tetrahedron_on_grid(target: HalfEdgeMesh, n: usize, corners: [(usize, usize); 4]) -> Embedding {
    let landmarks = corners.map(|(i, j)| grid_vertex(n, i, j));
    let positions = landmarks.map(|v| *target.position(v));
    let layout = primitives::tetrahedron_layout(positions);
    let input = EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap();
    Embedding::new(input).unwrap()
}
