//! Nearest-match search over the edge graph of a target mesh.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// Heap entry ordered as a min-heap on distance, lower vertex first on ties.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    vertex: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Grow a multi-source Dijkstra search until a settled vertex satisfies `stop`.
///
/// All sources start at distance 0 and are tested first. Vertices are settled
/// in order of increasing edge-length distance, so the returned vertex is the
/// accepted vertex closest to any source. `None` if no reachable vertex is
/// accepted.
pub fn dijkstra_until<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    sources: &[VertexId<I>],
    mut stop: impl FnMut(VertexId<I>) -> bool,
) -> Option<VertexId<I>> {
    let mut settled = vec![f64::INFINITY; mesh.num_vertices()];
    let mut heap: BinaryHeap<Frontier> = sources
        .iter()
        .filter(|s| s.index() < settled.len())
        .map(|s| Frontier {
            distance: 0.0,
            vertex: s.index(),
        })
        .collect();
    for entry in heap.iter() {
        settled[entry.vertex] = 0.0;
    }

    while let Some(Frontier { distance, vertex }) = heap.pop() {
        if distance > settled[vertex] {
            continue;
        }
        let v = VertexId::new(vertex);
        if stop(v) {
            return Some(v);
        }
        for he in mesh.vertex_halfedges(v) {
            let to = mesh.dest(he).index();
            let reached = distance + mesh.edge_length(he);
            if reached < settled[to] {
                settled[to] = reached;
                heap.push(Frontier {
                    distance: reached,
                    vertex: to,
                });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    fn v(n: usize, i: usize, j: usize) -> VertexId {
        VertexId::new(j * (n + 1) + i)
    }

    #[test]
    fn test_returns_closest_match() {
        let mesh: HalfEdgeMesh = primitives::grid(4);
        let near = v(4, 2, 0);
        let far = v(4, 4, 4);
        let hit = dijkstra_until(&mesh, &[v(4, 0, 0)], |x| x == near || x == far);
        assert_eq!(hit, Some(near));

        let sources = [v(4, 4, 3), v(4, 0, 0)];
        let hit = dijkstra_until(&mesh, &sources, |x| x == near || x == far);
        assert_eq!(hit, Some(far));
    }

    #[test]
    fn test_settles_by_edge_length() {
        // Diagonals run from (i, j) to (i + 1, j + 1); equal distances settle lower indices first.
        let mesh: HalfEdgeMesh = primitives::grid(3);
        let mut order = Vec::new();
        dijkstra_until(&mesh, &[v(3, 0, 0)], |x| {
            order.push(x);
            false
        });
        assert_eq!(order.len(), mesh.num_vertices());
        assert_eq!(order[0], v(3, 0, 0));
        assert_eq!(&order[1..3], &[v(3, 1, 0), v(3, 0, 1)]);
        assert_eq!(order.last(), Some(&v(3, 3, 3)));
    }

    #[test]
    fn test_no_match() {
        let mesh: HalfEdgeMesh = primitives::grid(2);
        assert_eq!(dijkstra_until(&mesh, &[v(2, 0, 0)], |_| false), None);
        assert_eq!(dijkstra_until(&mesh, &[], |_| true), None);
    }
}
