//! Append-only edge splits.
//!
//! Splitting edge `(a, b)` inserts a vertex `m` and re-triangulates the (up to
//! two) incident triangles:
//!
//! ```text
//!          c                       c
//!         / \                     /|\
//!        /   \                   / | \
//!       /     \                 /  |  \
//!      a-------b      ->       a---m---b
//!       \     /                 \  |  /
//!        \   /                   \ | /
//!         \ /                     \|/
//!          d                       d
//! ```
//!
//! The split edge keeps its ID and now runs `a -> m`; every other existing
//! vertex, half-edge and face keeps its ID and meaning, new elements are
//! appended. This is what allows attribute tables indexed by handles to simply
//! grow alongside the mesh.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, MeshIndex, VertexId};

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Split an edge at `position` and return the new vertex.
    ///
    /// Both incident faces must be triangles (or boundary). The A half-edge of
    /// `e` keeps its origin `a` and now ends at the new vertex; the rest of the
    /// original edge becomes a new edge `m -> b`.
    pub fn split_edge(&mut self, e: EdgeId<I>, position: Point3<f64>) -> VertexId<I> {
        let he0 = e.halfedge(0); // a -> b
        let he1 = e.halfedge(1); // b -> a
        let b = self.origin(he1);

        let f0 = self.face_of(he0);
        let f1 = self.face_of(he1);
        let n0 = self.next(he0);
        let p0 = self.prev(he0);
        let n1 = self.next(he1);
        let p1 = self.prev(he1);
        debug_assert!(!f0.is_valid() || self.next(n0) == p0, "split requires triangles");
        debug_assert!(!f1.is_valid() || self.next(n1) == p1, "split requires triangles");

        let m = self.add_vertex(position);

        // he0: a -> m, he1: m -> a, h2: m -> b, h3: b -> m
        self.halfedge_mut(he1).origin = m;
        let h2 = self.add_edge(m, b);
        let h3 = h2.opposite();

        if self.vertex(b).halfedge == he1 {
            self.vertex_mut(b).halfedge = h3;
        }

        if f0.is_valid() {
            // (a, b, c) -> (a, m, c) + (m, b, c)
            let c = self.origin(p0);
            let h4 = self.add_edge(m, c);
            let h5 = h4.opposite();

            self.link(he0, h4);
            self.link(h4, p0);
            self.link(p0, he0);
            self.halfedge_mut(h4).face = f0;
            self.face_mut(f0).halfedge = he0;

            let f2 = self.add_face(h2);
            self.link(h2, n0);
            self.link(n0, h5);
            self.link(h5, h2);
            for he in [h2, n0, h5] {
                self.halfedge_mut(he).face = f2;
            }
        } else {
            // boundary: ... p0 -> he0 -> h2 -> n0 ...
            self.link(he0, h2);
            self.link(h2, n0);
        }

        if f1.is_valid() {
            // (b, a, d) -> (m, a, d) + (b, m, d)
            let d = self.origin(p1);
            let h6 = self.add_edge(d, m);
            let h7 = h6.opposite();

            self.link(he1, n1);
            self.link(n1, h6);
            self.link(h6, he1);
            self.halfedge_mut(h6).face = f1;
            self.face_mut(f1).halfedge = he1;

            let f3 = self.add_face(h3);
            self.link(h3, h7);
            self.link(h7, p1);
            self.link(p1, h3);
            for he in [h3, h7, p1] {
                self.halfedge_mut(he).face = f3;
            }
        } else {
            // boundary: ... p1 -> h3 -> he1 -> n1 ...
            self.link(p1, h3);
            self.link(h3, he1);
        }

        // Boundary vertices point to a boundary half-edge
        self.vertex_mut(m).halfedge = if f1.is_valid() { h2 } else { he1 };

        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn two_triangles() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap()
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh = two_triangles();
        let he = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        let e = he.edge();
        let m = mesh.split_edge(e, mesh.edge_midpoint(e));

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 5 + 3);
        assert_eq!(mesh.valence(m), 4);

        for v in [0, 1, 2, 3] {
            assert!(mesh.find_halfedge(m, VertexId::new(v)).is_some());
        }
        assert!(mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).is_none());
        assert!(mesh.is_triangle_mesh());
        assert!(!mesh.is_boundary_vertex(m));
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh = two_triangles();
        let he = mesh.find_halfedge(VertexId::new(1), VertexId::new(2)).unwrap();
        let before_faces = mesh.num_faces();
        let m = mesh.split_edge(he.edge(), Point3::new(0.75, 0.5, 0.0));

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), before_faces + 1);
        assert_eq!(mesh.valence(m), 3);
        assert!(mesh.is_boundary_vertex(m));
        // The boundary half-edge out of m must be the stored one
        assert!(mesh.is_boundary_halfedge(mesh.vertex(m).halfedge));
    }

    #[test]
    fn test_split_preserves_existing_handles() {
        let mut mesh = two_triangles();
        let he02 = mesh.find_halfedge(VertexId::new(2), VertexId::new(0)).unwrap();
        let he = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        mesh.split_edge(he.edge(), mesh.edge_midpoint(he.edge()));

        assert_eq!(mesh.origin(he02), VertexId::new(2));
        assert_eq!(mesh.dest(he02), VertexId::new(0));
        assert_eq!(mesh.origin(he), VertexId::new(0));
    }

    #[test]
    fn test_repeated_splits() {
        let mut mesh = two_triangles();
        for _ in 0..10 {
            let e = EdgeId::new(0);
            let p = mesh.edge_midpoint(e);
            mesh.split_edge(e, p);
            assert!(mesh.is_valid());
        }
        assert_eq!(mesh.num_vertices(), 14);
    }
}
