//! Shortest legal paths between landmarks.
//!
//! The search runs A* over virtual vertices: real target vertices and target
//! edge midpoints. From a vertex it can step to adjacent vertices and to the
//! opposite edge midpoint of each incident triangle; from a midpoint it can
//! step to the two opposite vertices and to the other edge midpoints of both
//! incident triangles, which lets a path cut diagonally through triangles.
//!
//! Blocked elements (landmarks and everything on embedded paths) are never
//! entered, except for the end landmark. The first and last steps are further
//! restricted to the free sector at each landmark so that the new path leaves
//! and enters its landmarks in the cyclic order prescribed by the layout.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point3;
use tracing::trace;

use super::embedding::Embedding;
use super::virtual_vertex::{VirtualPath, VirtualVertex, VirtualVertexMap};
use crate::mesh::{EdgeId, HalfEdgeId, MeshIndex, VertexId};

/// Step cost used by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortestPathMetric {
    /// Euclidean length of each step.
    #[default]
    Geodesic,
    /// Euclidean length, multiplied by the repulsion factor of the
    /// [`EmbeddingOptions`](super::EmbeddingOptions) for steps that end next
    /// to a landmark other than the two end points.
    VertexRepulsive,
}

/// Best known distance of a virtual vertex: accumulated cost, then edges crossed.
#[derive(Debug, Clone, Copy)]
struct Distance {
    cost: f64,
    edges_crossed: u32,
}

impl Distance {
    const UNREACHED: Self = Self {
        cost: f64::INFINITY,
        edges_crossed: u32::MAX,
    };

    fn key(&self) -> (f64, u32) {
        (self.cost, self.edges_crossed)
    }

    fn is_better_than(&self, other: &Self) -> bool {
        match self.cost.total_cmp(&other.cost) {
            Ordering::Less => true,
            Ordering::Equal => self.edges_crossed < other.edges_crossed,
            Ordering::Greater => false,
        }
    }
}

/// Entry in the A* priority queue.
#[derive(Debug, Clone)]
struct Candidate<I: MeshIndex> {
    vv: VirtualVertex<I>,
    position: Point3<f64>,
    dist: Distance,
    /// Accumulated cost plus straight-line distance to the end landmark.
    estimate: f64,
}

impl<I: MeshIndex> PartialEq for Candidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: MeshIndex> Eq for Candidate<I> {}

impl<I: MeshIndex> PartialOrd for Candidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: MeshIndex> Ord for Candidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on (estimate, edges crossed)
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.dist.edges_crossed.cmp(&self.dist.edges_crossed))
    }
}

impl<I: MeshIndex> Embedding<I> {
    /// Shortest legal path for an unembedded layout half-edge.
    ///
    /// The sectors at both landmarks are derived with
    /// [`Embedding::embeddable_sector`]. Returns an empty path if no legal
    /// path exists.
    pub fn find_shortest_path(&self, l_he: HalfEdgeId<I>, metric: ShortestPathMetric) -> VirtualPath<I> {
        debug_assert!(!self.is_embedded_halfedge(l_he));
        let t_sector_start = self.embeddable_sector(l_he);
        let t_sector_end = self.embeddable_sector(l_he.opposite());
        self.find_shortest_path_in_sectors(t_sector_start, t_sector_end, metric)
    }

    /// Shortest legal path for an unembedded layout edge, from its A side.
    pub fn find_shortest_path_for_edge(&self, l_e: EdgeId<I>, metric: ShortestPathMetric) -> VirtualPath<I> {
        self.find_shortest_path(l_e.halfedge(0), metric)
    }

    /// Shortest legal path between the origins of two sector half-edges.
    ///
    /// Returns an empty path if the end landmark cannot be reached.
    pub fn find_shortest_path_in_sectors(
        &self,
        t_sector_start: HalfEdgeId<I>,
        t_sector_end: HalfEdgeId<I>,
        metric: ShortestPathMetric,
    ) -> VirtualPath<I> {
        let t = self.target();
        let t_v_start = t.origin(t_sector_start);
        let t_v_end = t.origin(t_sector_end);
        let vv_start = VirtualVertex::Vertex(t_v_start);
        let vv_end = VirtualVertex::Vertex(t_v_end);
        let p_end = *t.position(t_v_end);

        let legal_first = self.sector_virtual_vertices(t_sector_start);
        let legal_last = self.sector_virtual_vertices(t_sector_end);

        let legal_step = |from: VirtualVertex<I>, to: VirtualVertex<I>| -> bool {
            if from == vv_start && !legal_first.contains(&to) {
                return false;
            }
            if to == vv_end {
                legal_last.contains(&from)
            } else {
                !self.is_blocked(to)
            }
        };

        let mut distance = VirtualVertexMap::new(t, Distance::UNREACHED);
        let mut prev: VirtualVertexMap<Option<VirtualVertex<I>>, I> = VirtualVertexMap::new(t, None);
        let mut closed = VirtualVertexMap::new(t, false);
        let mut heap = BinaryHeap::new();
        let mut neighbors: Vec<VirtualVertex<I>> = Vec::with_capacity(16);
        let mut popped = 0usize;

        let start_dist = Distance {
            cost: 0.0,
            edges_crossed: 0,
        };
        distance[vv_start] = start_dist;
        heap.push(Candidate {
            vv: vv_start,
            position: *t.position(t_v_start),
            dist: start_dist,
            estimate: 0.0,
        });

        while let Some(c) = heap.pop() {
            if closed[c.vv] {
                continue;
            }
            closed[c.vv] = true;
            popped += 1;

            neighbors.clear();
            match c.vv {
                VirtualVertex::Vertex(t_v) => {
                    if t_v == t_v_end {
                        break;
                    }
                    for t_he in t.vertex_halfedges(t_v) {
                        neighbors.push(VirtualVertex::Vertex(t.dest(t_he)));
                        if !t.is_boundary_halfedge(t_he) {
                            neighbors.push(VirtualVertex::Edge(t.next(t_he).edge()));
                        }
                    }
                }
                VirtualVertex::Edge(t_e) => {
                    let [t_he, t_he_opp] = t_e.halfedges();
                    for h in [t_he, t_he_opp] {
                        let t_v = t.opposite_vertex(h);
                        if t_v.is_valid() {
                            neighbors.push(VirtualVertex::Vertex(t_v));
                        }
                    }
                    if !t.is_boundary_halfedge(t_he) {
                        neighbors.push(VirtualVertex::Edge(t.next(t_he).edge()));
                        neighbors.push(VirtualVertex::Edge(t.prev(t_he).edge()));
                    }
                    if !t.is_boundary_halfedge(t_he_opp) {
                        neighbors.push(VirtualVertex::Edge(t.prev(t_he_opp).edge()));
                        neighbors.push(VirtualVertex::Edge(t.next(t_he_opp).edge()));
                    }
                }
            }

            for &vv in &neighbors {
                if closed[vv] || !legal_step(c.vv, vv) {
                    continue;
                }

                let position = self.element_pos(vv);
                let mut step = (position - c.position).norm();
                if metric == ShortestPathMetric::VertexRepulsive
                    && self.near_foreign_landmark(vv, t_v_start, t_v_end)
                {
                    step *= self.options().repulsion_factor;
                }

                let new_dist = Distance {
                    cost: c.dist.cost + step,
                    edges_crossed: c.dist.edges_crossed + u32::from(vv.is_real_edge()),
                };
                if new_dist.is_better_than(&distance[vv]) {
                    distance[vv] = new_dist;
                    prev[vv] = Some(c.vv);
                    heap.push(Candidate {
                        vv,
                        position,
                        dist: new_dist,
                        estimate: new_dist.cost + (p_end - position).norm(),
                    });
                }
            }
        }

        if !distance[vv_end].cost.is_finite() {
            trace!(
                from = t_v_start.index(),
                to = t_v_end.index(),
                popped,
                "no legal path"
            );
            return Vec::new();
        }

        let mut path = vec![vv_end];
        let mut current = vv_end;
        while let Some(p) = prev[current] {
            path.push(p);
            current = p;
        }
        path.reverse();
        debug_assert_eq!(path[0], vv_start);

        trace!(
            from = t_v_start.index(),
            to = t_v_end.index(),
            popped,
            elements = path.len(),
            cost = ?distance[vv_end].key(),
            "shortest path"
        );
        path
    }

    /// Virtual vertices reachable in one step from the origin of `t_sector`
    /// without crossing an embedded path.
    ///
    /// Starting from the sector half-edge (clockwise side) and its
    /// counter-clockwise neighbor, both sides are rotated away from each other
    /// until each hits a blocked edge. The edge midpoints of the triangles in
    /// between and the far ends of unblocked edges are collected.
    pub(crate) fn sector_virtual_vertices(&self, t_sector: HalfEdgeId<I>) -> Vec<VirtualVertex<I>> {
        let t = self.target();
        let mut t_he_start = t_sector;
        let mut t_he_end = t.rotate_ccw(t_sector);

        while t_he_start != t_he_end {
            if !self.is_blocked_edge(t_he_start.edge()) {
                t_he_start = t.rotate_cw(t_he_start);
            } else if !self.is_blocked_edge(t_he_end.edge()) {
                t_he_end = t.rotate_ccw(t_he_end);
            } else {
                break;
            }
        }

        let mut vvs = Vec::new();
        let mut t_he = t_he_start;
        loop {
            if !t.is_boundary_halfedge(t_he) {
                vvs.push(VirtualVertex::Edge(t.next(t_he).edge()));
            }
            if !self.is_blocked_edge(t_he.edge()) {
                vvs.push(VirtualVertex::Vertex(t.dest(t_he)));
            }
            t_he = t.rotate_ccw(t_he);
            if t_he == t_he_end {
                break;
            }
        }
        vvs
    }

    fn near_foreign_landmark(&self, vv: VirtualVertex<I>, t_v_start: VertexId<I>, t_v_end: VertexId<I>) -> bool {
        let foreign = |t_v: VertexId<I>| t_v != t_v_start && t_v != t_v_end && self.is_landmark(t_v);
        let t = self.target();
        match vv {
            VirtualVertex::Vertex(t_v) => t.vertex_neighbors(t_v).any(foreign),
            VirtualVertex::Edge(t_e) => t.edge_vertices(t_e).into_iter().any(foreign),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::fixtures::{self, grid_vertex};
    use crate::embed::EmbeddingOptions;

    fn layout_halfedge(em: &Embedding, from: usize, to: usize) -> HalfEdgeId {
        em.layout()
            .find_halfedge(VertexId::new(from), VertexId::new(to))
            .unwrap()
    }

    #[test]
    fn test_adjacent_landmarks_use_direct_edge() {
        let n = 6;
        let em = fixtures::grid_tetrahedron(n, [(2, 2), (3, 2), (0, 6), (6, 0)]);
        let path = em.find_shortest_path(layout_halfedge(&em, 0, 1), ShortestPathMetric::Geodesic);

        assert_eq!(
            path,
            vec![
                VirtualVertex::Vertex(grid_vertex(n, 2, 2)),
                VirtualVertex::Vertex(grid_vertex(n, 3, 2)),
            ]
        );
        assert!((em.path_length(&path) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_path_cuts_through_triangles() {
        // (1, 1) -> (3, 2) is not reachable along a straight run of grid edges.
        let n = 4;
        let em = fixtures::grid_tetrahedron(n, [(1, 1), (3, 2), (0, 4), (4, 0)]);
        let path = em.find_shortest_path(layout_halfedge(&em, 0, 1), ShortestPathMetric::Geodesic);

        assert!(path.len() >= 3);
        assert!(path.iter().any(|vv| vv.is_real_edge()));
        let straight = 5f64.sqrt();
        let length = em.path_length(&path);
        assert!(length >= straight - 1e-12);
        // Vertex-only routes cost at least 1 + sqrt(2)
        assert!(length < 1.0 + 2f64.sqrt());
    }

    #[test]
    fn test_blocked_route_yields_empty_path() {
        // C (top) to D (bottom) cuts the grid in two; A (left) and B (right) are separated.
        let n = 6;
        let mut em = fixtures::grid_tetrahedron(n, [(0, 3), (6, 3), (3, 6), (3, 0)]);
        let l_cd = layout_halfedge(&em, 2, 3);
        let wall = em.find_shortest_path(l_cd, ShortestPathMetric::Geodesic);
        assert!(!wall.is_empty());
        em.embed_path(l_cd, &wall).unwrap();

        let l_ab = layout_halfedge(&em, 0, 1);
        let path = em.find_shortest_path(l_ab, ShortestPathMetric::Geodesic);
        assert!(path.is_empty());
        assert_eq!(em.path_length(&path), f64::INFINITY);
    }

    #[test]
    fn test_embedded_path_forces_detour() {
        let n = 6;
        let mut em = fixtures::grid_tetrahedron(n, [(1, 3), (5, 3), (3, 2), (3, 4)]);
        let l_ab = layout_halfedge(&em, 0, 1);
        let direct = em.path_length(&em.find_shortest_path(l_ab, ShortestPathMetric::Geodesic));
        assert!((direct - 4.0).abs() < 1e-12);

        let l_wall = layout_halfedge(&em, 2, 3);
        let wall = em.find_shortest_path(l_wall, ShortestPathMetric::Geodesic);
        em.embed_path(l_wall, &wall).unwrap();

        let detour = em.find_shortest_path(l_ab, ShortestPathMetric::Geodesic);
        assert!(detour.len() >= 2);
        assert!(em.path_length(&detour) > direct + 1e-6);
        for &vv in &detour[1..detour.len() - 1] {
            assert!(!em.is_blocked(vv), "{:?} is blocked", vv);
        }
    }

    #[test]
    fn test_vertex_repulsive_metric_avoids_landmarks() {
        let n = 8;
        let em = fixtures::grid_tetrahedron(n, [(1, 4), (7, 4), (4, 4), (0, 0)]);
        let input = em.shared_input();
        let repulsive = Embedding::with_options(input, EmbeddingOptions::default().with_repulsion_factor(10.0)).unwrap();
        let l_ab = layout_halfedge(&em, 0, 1);
        let c = grid_vertex(n, 4, 4);

        let geodesic_path = em.find_shortest_path(l_ab, ShortestPathMetric::Geodesic);
        let repulsive_path = repulsive.find_shortest_path(l_ab, ShortestPathMetric::VertexRepulsive);
        assert!(!repulsive_path.is_empty());
        assert!(repulsive.path_length(&repulsive_path) >= em.path_length(&geodesic_path) - 1e-9);

        let a = grid_vertex(n, 1, 4);
        let b = grid_vertex(n, 7, 4);
        for &vv in &repulsive_path {
            assert!(!repulsive.near_foreign_landmark(vv, a, b), "{:?} touches the landmark at {:?}", vv, c);
        }
    }

    #[test]
    fn test_full_sector_without_embedded_edges() {
        let em = fixtures::sphere_tetrahedron(1);
        let t_v = em.matching_target_vertex(VertexId::new(0));
        let sector = em.embeddable_sector(layout_halfedge(&em, 0, 1));
        let vvs = em.sector_virtual_vertices(sector);
        // One vertex and one opposite midpoint per incident triangle
        assert_eq!(vvs.len(), 2 * em.target().valence(t_v));
    }

    #[test]
    fn test_sector_is_bounded_by_embedded_paths() {
        let mut em = fixtures::sphere_tetrahedron(2);
        let l_he = layout_halfedge(&em, 0, 1);
        let path = em.find_shortest_path(l_he, ShortestPathMetric::Geodesic);
        em.embed_path(l_he, &path).unwrap();

        let t_v = em.matching_target_vertex(VertexId::new(0));
        let other = layout_halfedge(&em, 0, 2);
        let vvs = em.sector_virtual_vertices(em.embeddable_sector(other));
        // Only the embedded edge is blocked, so all other neighbors stay available.
        let vertices = vvs.iter().filter(|vv| vv.is_real_vertex()).count();
        assert_eq!(vertices, em.target().valence(t_v) - 1);
    }
}
