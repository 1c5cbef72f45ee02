//! Virtual vertices: nodes of the path search graph.
//!
//! A virtual vertex is either a real target vertex or a target edge standing
//! for its (not yet materialized) midpoint. Equality is structural.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// A real target vertex or the midpoint of a target edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirtualVertex<I: MeshIndex = u32> {
    /// A vertex of the target mesh.
    Vertex(VertexId<I>),
    /// The midpoint of a target edge.
    Edge(EdgeId<I>),
}

impl<I: MeshIndex> VirtualVertex<I> {
    /// Whether this is a real target vertex.
    #[inline]
    pub fn is_real_vertex(&self) -> bool {
        matches!(self, VirtualVertex::Vertex(_))
    }

    /// Whether this is an edge midpoint.
    #[inline]
    pub fn is_real_edge(&self) -> bool {
        matches!(self, VirtualVertex::Edge(_))
    }

    /// The target vertex, if this is one.
    #[inline]
    pub fn real_vertex(&self) -> Option<VertexId<I>> {
        match *self {
            VirtualVertex::Vertex(v) => Some(v),
            VirtualVertex::Edge(_) => None,
        }
    }

    /// The target edge, if this is a midpoint.
    #[inline]
    pub fn real_edge(&self) -> Option<EdgeId<I>> {
        match *self {
            VirtualVertex::Edge(e) => Some(e),
            VirtualVertex::Vertex(_) => None,
        }
    }
}

impl<I: MeshIndex> From<VertexId<I>> for VirtualVertex<I> {
    fn from(v: VertexId<I>) -> Self {
        VirtualVertex::Vertex(v)
    }
}

impl<I: MeshIndex> From<EdgeId<I>> for VirtualVertex<I> {
    fn from(e: EdgeId<I>) -> Self {
        VirtualVertex::Edge(e)
    }
}

/// A sequence of virtual vertices from one landmark to another.
///
/// An empty path is the "no legal path" result of the search.
pub type VirtualPath<I = u32> = Vec<VirtualVertex<I>>;

/// Dense per-virtual-vertex storage, sized for a snapshot of the target mesh.
///
/// Vertices and edges live in two separate arrays so lookups are plain
/// indexing.
#[derive(Debug, Clone)]
pub struct VirtualVertexMap<T, I: MeshIndex = u32> {
    vertices: Vec<T>,
    edges: Vec<T>,
    _marker: PhantomData<I>,
}

impl<T: Clone, I: MeshIndex> VirtualVertexMap<T, I> {
    /// Create a map covering every vertex and edge of `mesh`, filled with `value`.
    pub fn new(mesh: &HalfEdgeMesh<I>, value: T) -> Self {
        Self {
            vertices: vec![value.clone(); mesh.num_vertices()],
            edges: vec![value; mesh.num_edges()],
            _marker: PhantomData,
        }
    }
}

impl<T, I: MeshIndex> Index<VirtualVertex<I>> for VirtualVertexMap<T, I> {
    type Output = T;

    #[inline]
    fn index(&self, vv: VirtualVertex<I>) -> &T {
        match vv {
            VirtualVertex::Vertex(v) => &self.vertices[v.index()],
            VirtualVertex::Edge(e) => &self.edges[e.index()],
        }
    }
}

impl<T, I: MeshIndex> IndexMut<VirtualVertex<I>> for VirtualVertexMap<T, I> {
    #[inline]
    fn index_mut(&mut self, vv: VirtualVertex<I>) -> &mut T {
        match vv {
            VirtualVertex::Vertex(v) => &mut self.vertices[v.index()],
            VirtualVertex::Edge(e) => &mut self.edges[e.index()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a: VirtualVertex = VertexId::new(3).into();
        let b: VirtualVertex = VirtualVertex::Vertex(VertexId::new(3));
        let e: VirtualVertex = EdgeId::new(3).into();
        assert_eq!(a, b);
        assert_ne!(a, e);

        let set: HashSet<_> = [a, b, e].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_classifiers() {
        let v: VirtualVertex = VertexId::new(1).into();
        let e: VirtualVertex = EdgeId::new(1).into();
        assert!(v.is_real_vertex() && !v.is_real_edge());
        assert!(e.is_real_edge() && !e.is_real_vertex());
        assert_eq!(v.real_vertex(), Some(VertexId::new(1)));
        assert_eq!(e.real_vertex(), None);
        assert_eq!(e.real_edge(), Some(EdgeId::new(1)));
    }

    #[test]
    fn test_map_separates_vertices_and_edges() {
        let mesh: HalfEdgeMesh = primitives::octahedron();
        let mut map = VirtualVertexMap::new(&mesh, 0usize);
        map[VertexId::new(2).into()] = 7;
        map[EdgeId::new(2).into()] = 9;
        assert_eq!(map[VirtualVertex::Vertex(VertexId::new(2))], 7);
        assert_eq!(map[VirtualVertex::Edge(EdgeId::new(2))], 9);
        assert_eq!(map[VirtualVertex::Edge(EdgeId::new(11))], 0);
    }
}
