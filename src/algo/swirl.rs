//! Swirl detection.
//!
//! A path that is short on its own can still wind around a landmark in a way
//! that forces later paths of the same layout face into long spirals. The test
//! marks the target vertices directly left and right of a candidate path and
//! grows a graph search from the landmarks of the layout face on the path's
//! left. Reaching the path from its right side first indicates a swirl.

use crate::algo::geodesic::dijkstra_until;
use crate::embed::{Embedding, VirtualVertex};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

const LEFT: i8 = -1;
const RIGHT: i8 = 1;

/// Whether `path`, a candidate embedding of the layout half-edge `l_he`, is
/// likely to produce a swirl.
///
/// Always `false` for half-edges without a layout face and for paths without
/// interior elements.
pub fn swirl_detection<I: MeshIndex>(
    em: &Embedding<I>,
    l_he: HalfEdgeId<I>,
    path: &[VirtualVertex<I>],
) -> bool {
    let l = em.layout();
    let l_f = l.face_of(l_he);
    if !l_f.is_valid() || path.len() < 3 {
        return false;
    }
    debug_assert!(path[0].is_real_vertex() && path[path.len() - 1].is_real_vertex());

    let indicator = side_indicator(em.target(), path);

    let l_from = l.origin(l_he);
    let l_to = l.dest(l_he);
    let seeds: Vec<VertexId<I>> = l
        .face_vertices(l_f)
        .filter(|&l_v| l_v != l_from && l_v != l_to)
        .map(|l_v| em.matching_target_vertex(l_v))
        .collect();

    match dijkstra_until(em.target(), &seeds, |t_v| indicator[t_v.index()] != 0) {
        Some(t_v) => indicator[t_v.index()] == RIGHT,
        None => false,
    }
}

/// [`swirl_detection`] for `l_he` and for its opposite with the reversed path.
pub fn swirl_detection_bidirectional<I: MeshIndex>(
    em: &Embedding<I>,
    l_he: HalfEdgeId<I>,
    path: &[VirtualVertex<I>],
) -> bool {
    if swirl_detection(em, l_he, path) {
        return true;
    }
    let reversed: Vec<VirtualVertex<I>> = path.iter().rev().copied().collect();
    swirl_detection(em, l_he.opposite(), &reversed)
}

/// Per target vertex: `-1` directly left of the path, `+1` directly right, `0` otherwise.
pub(crate) fn side_indicator<I: MeshIndex>(t: &HalfEdgeMesh<I>, path: &[VirtualVertex<I>]) -> Vec<i8> {
    let mut indicator = vec![0i8; t.num_vertices()];
    for w in path.windows(3) {
        let (prev, current, next) = (w[0], w[1], w[2]);
        match current {
            VirtualVertex::Vertex(t_v) => mark_around_vertex(t, t_v, prev, next, &mut indicator),
            VirtualVertex::Edge(t_e) => {
                if let Some(t_he) = crossing_halfedge(t, t_e, next) {
                    indicator[t.origin(t_he).index()] = LEFT;
                    indicator[t.dest(t_he).index()] = RIGHT;
                } else {
                    debug_assert!(false, "path leaves {:?} to a non-adjacent element", t_e);
                }
            }
        }
    }
    indicator
}

/// Virtual vertices one step away from `t_v`, in clockwise order.
fn port_ring<I: MeshIndex>(t: &HalfEdgeMesh<I>, t_v: VertexId<I>) -> Vec<VirtualVertex<I>> {
    let mut ring = Vec::with_capacity(2 * t.valence(t_v));
    for t_he in t.vertex_halfedges(t_v) {
        ring.push(VirtualVertex::Vertex(t.dest(t_he)));
        let t_he_in = t.twin(t_he);
        if !t.is_boundary_halfedge(t_he_in) {
            ring.push(VirtualVertex::Edge(t.prev(t_he_in).edge()));
        }
    }
    ring
}

/// Rotate clockwise from the incoming port: ports before the outgoing one are
/// on the left, the outgoing port and everything up to the incoming one on the right.
fn mark_around_vertex<I: MeshIndex>(
    t: &HalfEdgeMesh<I>,
    t_v: VertexId<I>,
    prev: VirtualVertex<I>,
    next: VirtualVertex<I>,
    indicator: &mut [i8],
) {
    let ring = port_ring(t, t_v);
    let (Some(start), Some(end)) = (
        ring.iter().position(|&p| p == prev),
        ring.iter().position(|&p| p == next),
    ) else {
        debug_assert!(false, "path passes {:?} through non-adjacent elements", t_v);
        return;
    };
    if start == end {
        return;
    }

    let n = ring.len();
    let mut k = (start + 1) % n;
    while k != end {
        if let VirtualVertex::Vertex(p) = ring[k] {
            indicator[p.index()] = LEFT;
        }
        k = (k + 1) % n;
    }
    while k != start {
        if let VirtualVertex::Vertex(p) = ring[k] {
            indicator[p.index()] = RIGHT;
        }
        k = (k + 1) % n;
    }
}

/// Half-edge of `t_e` whose triangle the path enters after crossing `t_e`.
fn crossing_halfedge<I: MeshIndex>(
    t: &HalfEdgeMesh<I>,
    t_e: EdgeId<I>,
    next: VirtualVertex<I>,
) -> Option<HalfEdgeId<I>> {
    t_e.halfedges().into_iter().find(|&t_he| {
        let face = t.face_of(t_he);
        if !face.is_valid() {
            return false;
        }
        match next {
            VirtualVertex::Vertex(t_v) => t.dest(t.next(t_he)) == t_v,
            VirtualVertex::Edge(t_e_next) => t_e_next.halfedges().iter().any(|&g| t.face_of(g) == face),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::fixtures::{self, grid_vertex};

    const N: usize = 6;

    fn row_path(j: usize, i0: usize, i1: usize) -> Vec<VirtualVertex> {
        (i0..=i1)
            .map(|i| VirtualVertex::Vertex(grid_vertex(N, i, j)))
            .collect()
    }

    fn layout_halfedge(em: &Embedding, from: usize, to: usize) -> HalfEdgeId {
        em.layout()
            .find_halfedge(VertexId::new(from), VertexId::new(to))
            .unwrap()
    }

    #[test]
    fn test_sides_of_straight_path() {
        let em = fixtures::grid_tetrahedron(N, [(1, 3), (5, 3), (3, 0), (3, 5)]);
        let path = row_path(3, 1, 5);
        let indicator = side_indicator(em.target(), &path);

        for i in 2..=5 {
            assert_eq!(indicator[grid_vertex(N, i, 4).index()], LEFT, "({}, 4)", i);
        }
        for i in 2..=4 {
            assert_eq!(indicator[grid_vertex(N, i, 2).index()], RIGHT, "({}, 2)", i);
        }
        assert_eq!(indicator[grid_vertex(N, 3, 5).index()], 0);
        assert_eq!(indicator[grid_vertex(N, 3, 0).index()], 0);
    }

    #[test]
    fn test_sides_of_crossed_edge() {
        let em = fixtures::grid_tetrahedron(N, [(0, 0), (6, 6), (6, 0), (0, 6)]);
        let t = em.target();
        let diagonal = t
            .find_halfedge(grid_vertex(N, 1, 1), grid_vertex(N, 2, 2))
            .unwrap()
            .edge();
        // Heading north-west across the diagonal.
        let path = vec![
            VirtualVertex::Vertex(grid_vertex(N, 2, 1)),
            VirtualVertex::Edge(diagonal),
            VirtualVertex::Vertex(grid_vertex(N, 1, 2)),
        ];
        let indicator = side_indicator(t, &path);
        assert_eq!(indicator[grid_vertex(N, 1, 1).index()], LEFT);
        assert_eq!(indicator[grid_vertex(N, 2, 2).index()], RIGHT);
    }

    #[test]
    fn test_face_on_the_left_is_no_swirl() {
        // Layout face (0, 1, 3) lies left of 0 -> 1, so landmark 3 north of the path is consistent.
        let em = fixtures::grid_tetrahedron(N, [(1, 3), (5, 3), (3, 0), (3, 5)]);
        let l_he = layout_halfedge(&em, 0, 1);
        let path = row_path(3, 1, 5);
        assert!(!swirl_detection(&em, l_he, &path));
        assert!(!swirl_detection_bidirectional(&em, l_he, &path));
    }

    #[test]
    fn test_face_on_the_right_is_a_swirl() {
        let em = fixtures::grid_tetrahedron(N, [(1, 3), (5, 3), (3, 6), (3, 1)]);
        let l_he = layout_halfedge(&em, 0, 1);
        let path = row_path(3, 1, 5);
        assert!(swirl_detection(&em, l_he, &path));
    }

    #[test]
    fn test_bidirectional_checks_the_opposite_face() {
        // Landmark 3 is consistent, landmark 2 of the opposite face is on the wrong side.
        let em = fixtures::grid_tetrahedron(N, [(1, 3), (5, 3), (3, 6), (3, 5)]);
        let l_he = layout_halfedge(&em, 0, 1);
        let path = row_path(3, 1, 5);
        assert!(!swirl_detection(&em, l_he, &path));
        assert!(swirl_detection_bidirectional(&em, l_he, &path));
    }

    #[test]
    fn test_direct_edge_is_never_a_swirl() {
        let em = fixtures::grid_tetrahedron(N, [(2, 2), (3, 2), (0, 6), (6, 0)]);
        let l_he = layout_halfedge(&em, 0, 1);
        let path = row_path(2, 2, 3);
        assert!(!swirl_detection_bidirectional(&em, l_he, &path));
    }
}
