//! Branch-and-bound search for a short simultaneous embedding.
//!
//! A search node fixes the paths of some layout edges. Its bound is the cost
//! of the fixed paths plus, for every open edge, the cost of its shortest
//! legal path in the node's state, where open edges do not block each other.
//!
//! Expanding a node picks the open edge whose shortest path collides with the
//! most other shortest paths and branches on candidate paths for it: its own
//! shortest path, and its shortest path after speculatively embedding one of
//! the colliding edges first. Candidates are materialized right away and
//! stored as target vertex chains, which stay valid while the target keeps
//! growing. Switching between nodes only clears and re-applies labels.
//!
//! The incumbent starts as a greedy embedding. The search stops when the
//! tree is exhausted, the relative gap between the incumbent and the best open
//! bound drops to the configured tolerance, or a time or node budget runs out.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use lembed::algo::branch_and_bound::{embed_branch_and_bound, BranchAndBoundSettings};
//! use lembed::embed::{Embedding, EmbeddingInput};
//! use lembed::mesh::{primitives, HalfEdgeMesh, VertexId};
//!
//! let target: HalfEdgeMesh = primitives::icosphere(2);
//! let landmarks = [0, 2, 4].map(VertexId::new);
//! let layout = primitives::double_triangle_layout(landmarks.map(|v| *target.position(v)));
//! let mut em = Embedding::new(EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap()).unwrap();
//!
//! let settings = BranchAndBoundSettings::default().with_time_limit(Duration::from_secs(10));
//! let result = embed_branch_and_bound(&mut em, &settings).unwrap();
//! assert!(em.is_complete());
//! assert!(result.gap >= 0.0);
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::greedy::{embed_greedy, GreedySettings};
use super::Progress;
use crate::embed::{Embedding, ShortestPathMetric, VirtualPath, VirtualVertex};
use crate::error::{EmbedError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, MeshIndex, VertexId};

/// Progress total used when no node limit is set.
const PROGRESS_SOFT_CAP: usize = 10_000;

/// Relative tolerance for comparing bounds against the incumbent.
const PRUNE_EPS: f64 = 1e-9;

/// Settings for [`embed_branch_and_bound`].
#[derive(Debug, Clone)]
pub struct BranchAndBoundSettings {
    /// Wall-clock budget, checked between node expansions. Default: unlimited
    pub time_limit: Option<Duration>,

    /// Accept the incumbent once `(best - bound) / best` is at most this. Default: 0.0
    pub optimality_gap: f64,

    /// Maximum number of children per node. Default: 4
    pub max_candidates: usize,

    /// Maximum number of expanded nodes. Default: unlimited
    pub max_nodes: Option<usize>,
}

impl Default for BranchAndBoundSettings {
    fn default() -> Self {
        Self {
            time_limit: None,
            optimality_gap: 0.0,
            max_candidates: 4,
            max_nodes: None,
        }
    }
}

impl BranchAndBoundSettings {
    /// Stop after `limit` of wall-clock time.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Set the relative gap at which the incumbent is accepted.
    pub fn with_optimality_gap(mut self, gap: f64) -> Self {
        self.optimality_gap = gap;
        self
    }

    /// Set the maximum number of children per node.
    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n;
        self
    }

    /// Stop after expanding `n` nodes.
    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = Some(n);
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.optimality_gap >= 0.0 && self.optimality_gap.is_finite()) {
            return Err(EmbedError::invalid_param(
                "optimality_gap",
                self.optimality_gap,
                "must be non-negative and finite",
            ));
        }
        if self.max_candidates == 0 {
            return Err(EmbedError::invalid_param(
                "max_candidates",
                self.max_candidates,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every open node was expanded or pruned.
    ///
    /// Each node branches into at most `max_candidates` paths for one edge,
    /// so this is optimal only with respect to the explored candidates, not a
    /// proof of global optimality.
    Exhausted,
    /// The gap dropped to the configured tolerance.
    GapReached,
    /// The time limit was hit.
    TimeLimit,
    /// The node limit was hit.
    NodeLimit,
}

/// Outcome of [`embed_branch_and_bound`].
#[derive(Debug, Clone)]
pub struct BranchAndBoundResult {
    /// Total path length of the returned embedding.
    pub cost: f64,
    /// Smallest bound of any node left open, capped at `cost`.
    ///
    /// Equal to `cost` after [`Termination::Exhausted`]; the bound then only
    /// covers the candidate paths the search generated.
    pub lower_bound: f64,
    /// `(cost - lower_bound) / cost`, 0 for an exhausted search.
    pub gap: f64,
    /// Why the search stopped.
    pub termination: Termination,
    /// Number of nodes taken off the queue and expanded.
    pub nodes_expanded: usize,
    /// Wall-clock time of the whole run, incumbent included.
    pub elapsed: Duration,
}

/// Fixed paths of a search node, in the order they were fixed.
#[derive(Debug, Clone)]
struct Node<I: MeshIndex> {
    assignments: Vec<(HalfEdgeId<I>, Vec<VertexId<I>>)>,
    cost: f64,
}

/// Heap entry; smallest key first, then deepest, then oldest.
struct OpenNode<I: MeshIndex> {
    key: f64,
    seq: u64,
    node: Node<I>,
}

impl<I: MeshIndex> PartialEq for OpenNode<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: MeshIndex> Eq for OpenNode<I> {}

impl<I: MeshIndex> PartialOrd for OpenNode<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: MeshIndex> Ord for OpenNode<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| self.node.assignments.len().cmp(&other.node.assignments.len()))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Shortest path of an open edge in some node state.
struct OpenEdge<I: MeshIndex> {
    l_e: EdgeId<I>,
    path: VirtualPath<I>,
    cost: f64,
    touched: HashSet<VertexId<I>>,
}

/// Embed all layout edges, searching for the shortest total path length.
///
/// Edges embedded before the call stay fixed. On success `em` holds the best
/// embedding found.
///
/// # Errors
/// - [`EmbedError::InvalidParameter`] for out-of-range settings
/// - [`EmbedError::EmbeddingFailed`] if neither the greedy incumbent nor the
///   search produce a complete embedding
pub fn embed_branch_and_bound<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &BranchAndBoundSettings,
) -> Result<BranchAndBoundResult> {
    embed_branch_and_bound_internal(em, settings, None)
}

/// [`embed_branch_and_bound`] with progress reporting (expanded nodes).
pub fn embed_branch_and_bound_with_progress<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &BranchAndBoundSettings,
    progress: &Progress,
) -> Result<BranchAndBoundResult> {
    embed_branch_and_bound_internal(em, settings, Some(progress))
}

fn embed_branch_and_bound_internal<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &BranchAndBoundSettings,
    progress: Option<&Progress>,
) -> Result<BranchAndBoundResult> {
    settings.validate()?;
    let start = Instant::now();
    let metric = ShortestPathMetric::Geodesic;
    let l_edges: Vec<EdgeId<I>> = em.layout().edge_ids().collect();

    let mut incumbent = em.clone();
    let mut best: Option<(f64, Embedding<I>)> = match embed_greedy(&mut incumbent, &GreedySettings::default()) {
        Ok(result) => Some((result.total_cost, incumbent)),
        Err(e) => {
            warn!(error = %e, "no greedy incumbent");
            None
        }
    };

    let root = Node {
        assignments: l_edges
            .iter()
            .filter(|&&l_e| em.is_embedded(l_e))
            .map(|&l_e| Ok((l_e.halfedge(0), em.embedded_path(l_e.halfedge(0))?)))
            .collect::<Result<Vec<_>>>()?,
        cost: em.total_embedded_path_length(),
    };

    info!(
        edges = l_edges.len(),
        fixed = root.assignments.len(),
        incumbent = ?best.as_ref().map(|b| b.0),
        time_limit = ?settings.time_limit,
        optimality_gap = settings.optimality_gap,
        "branch and bound"
    );

    let mut work = em.clone();
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;
    open.push(OpenNode {
        key: root.cost,
        seq,
        node: root,
    });

    let mut nodes_expanded = 0usize;
    let progress_total = settings.max_nodes.unwrap_or(PROGRESS_SOFT_CAP);

    let termination = loop {
        let best_cost = best.as_ref().map_or(f64::INFINITY, |b| b.0);
        while open
            .peek()
            .is_some_and(|top: &OpenNode<I>| is_pruned(top.key, best_cost))
        {
            open.pop();
        }
        let Some(min_key) = open.peek().map(|top| top.key) else {
            break Termination::Exhausted;
        };
        if settings.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
            break Termination::TimeLimit;
        }
        if settings.max_nodes.is_some_and(|max| nodes_expanded >= max) {
            break Termination::NodeLimit;
        }
        if relative_gap(best_cost, min_key) <= settings.optimality_gap {
            break Termination::GapReached;
        }

        let Some(OpenNode { key, node, .. }) = open.pop() else {
            break Termination::Exhausted;
        };
        restore(&mut work, &node)?;
        nodes_expanded += 1;
        if let Some(p) = progress {
            p.report(nodes_expanded, progress_total, "Branch and bound");
        }

        if work.is_complete() {
            if node.cost < best_cost {
                debug!(cost = node.cost, nodes = nodes_expanded, "new incumbent");
                best = Some((node.cost, work.clone()));
            }
            continue;
        }

        let Some(open_edges) = open_edge_paths(&work, &l_edges, metric) else {
            debug!(key, depth = node.assignments.len(), "pruned, open edge without path");
            continue;
        };
        let lower_bound = node.cost + open_edges.iter().map(|o| o.cost).sum::<f64>();
        if is_pruned(lower_bound, best_cost) {
            continue;
        }

        let branch = branching_edge(&open_edges);
        let children = candidate_chains(&mut work, &open_edges, branch, settings.max_candidates, metric)?;
        debug!(
            key,
            lower_bound,
            depth = node.assignments.len(),
            edge = open_edges[branch].l_e.index(),
            children = children.len(),
            "expanded node"
        );

        for (chain, cost) in children {
            let child_key = lower_bound - open_edges[branch].cost + cost;
            if is_pruned(child_key, best_cost) {
                continue;
            }
            let mut child = node.clone();
            child.assignments.push((open_edges[branch].l_e.halfedge(0), chain));
            child.cost += cost;
            seq += 1;
            open.push(OpenNode {
                key: child_key,
                seq,
                node: child,
            });
        }
    };

    let Some((cost, best_em)) = best else {
        return Err(EmbedError::EmbeddingFailed {
            edge: l_edges.iter().find(|&&l_e| !em.is_embedded(l_e)).map_or(0, |l_e| l_e.index()),
        });
    };

    let lower_bound = match termination {
        Termination::Exhausted => cost,
        _ => open.peek().map_or(cost, |top| top.key.min(cost)),
    };
    let gap = relative_gap(cost, lower_bound);
    let elapsed = start.elapsed();

    info!(
        cost,
        lower_bound,
        gap,
        ?termination,
        nodes = nodes_expanded,
        target_vertices = work.target().num_vertices(),
        elapsed_ms = elapsed.as_millis() as u64,
        "branch and bound done"
    );

    *em = best_em;
    Ok(BranchAndBoundResult {
        cost,
        lower_bound,
        gap,
        termination,
        nodes_expanded,
        elapsed,
    })
}

fn is_pruned(bound: f64, best_cost: f64) -> bool {
    best_cost.is_finite() && bound >= best_cost - PRUNE_EPS * best_cost.abs().max(1.0)
}

fn relative_gap(best_cost: f64, bound: f64) -> f64 {
    if !best_cost.is_finite() {
        f64::INFINITY
    } else if best_cost <= 0.0 {
        0.0
    } else {
        ((best_cost - bound) / best_cost).max(0.0)
    }
}

/// Re-apply the fixed paths of `node` on the shared working embedding.
fn restore<I: MeshIndex>(work: &mut Embedding<I>, node: &Node<I>) -> Result<()> {
    work.unembed_all();
    for (l_he, chain) in &node.assignments {
        work.restore_path(*l_he, chain)?;
    }
    Ok(())
}

/// Target vertices a path runs through or next to, landmarks excluded.
fn touched_vertices<I: MeshIndex>(em: &Embedding<I>, path: &[VirtualVertex<I>]) -> HashSet<VertexId<I>> {
    let mut touched = HashSet::new();
    for &vv in path {
        match vv {
            VirtualVertex::Vertex(t_v) => {
                touched.insert(t_v);
            }
            VirtualVertex::Edge(t_e) => touched.extend(em.target().edge_vertices(t_e)),
        }
    }
    touched.retain(|&t_v| !em.is_landmark(t_v));
    touched
}

/// Shortest paths of all open edges, `None` if one of them has none.
fn open_edge_paths<I: MeshIndex>(
    work: &Embedding<I>,
    l_edges: &[EdgeId<I>],
    metric: ShortestPathMetric,
) -> Option<Vec<OpenEdge<I>>> {
    l_edges
        .iter()
        .filter(|&&l_e| !work.is_embedded(l_e))
        .map(|&l_e| {
            let path = work.find_shortest_path_for_edge(l_e, metric);
            if path.is_empty() {
                return None;
            }
            Some(OpenEdge {
                l_e,
                cost: work.path_length(&path),
                touched: touched_vertices(work, &path),
                path,
            })
        })
        .collect()
}

/// Indices of the open edges whose shortest paths collide with edge `i`.
fn conflicts<I: MeshIndex>(open_edges: &[OpenEdge<I>], i: usize) -> Vec<usize> {
    (0..open_edges.len())
        .filter(|&j| j != i && !open_edges[i].touched.is_disjoint(&open_edges[j].touched))
        .collect()
}

/// Most collisions first, then the longest path, then the lowest edge index.
fn branching_edge<I: MeshIndex>(open_edges: &[OpenEdge<I>]) -> usize {
    (0..open_edges.len())
        .max_by(|&a, &b| {
            conflicts(open_edges, a)
                .len()
                .cmp(&conflicts(open_edges, b).len())
                .then_with(|| open_edges[a].cost.total_cmp(&open_edges[b].cost))
                .then_with(|| open_edges[b].l_e.cmp(&open_edges[a].l_e))
        })
        .unwrap_or(0)
}

/// Embed `path` for `l_he`, record the resulting chain and remove it again.
fn materialize<I: MeshIndex>(
    work: &mut Embedding<I>,
    l_he: HalfEdgeId<I>,
    path: &[VirtualVertex<I>],
) -> Result<(Vec<VertexId<I>>, f64)> {
    work.embed_path(l_he, path)?;
    let chain = work.embedded_path(l_he)?;
    let cost = work.chain_length(&chain);
    work.unembed_path(l_he)?;
    Ok((chain, cost))
}

/// Distinct candidate chains for the branching edge, cheapest first.
fn candidate_chains<I: MeshIndex>(
    work: &mut Embedding<I>,
    open_edges: &[OpenEdge<I>],
    branch: usize,
    max_candidates: usize,
    metric: ShortestPathMetric,
) -> Result<Vec<(Vec<VertexId<I>>, f64)>> {
    let l_he = open_edges[branch].l_e.halfedge(0);
    let mut candidates = vec![materialize(work, l_he, &open_edges[branch].path)?];

    let mut peers = conflicts(open_edges, branch);
    peers.sort_by(|&a, &b| open_edges[a].cost.total_cmp(&open_edges[b].cost));

    for peer in peers {
        if candidates.len() >= max_candidates {
            break;
        }
        let peer_he = open_edges[peer].l_e.halfedge(0);
        let peer_path = work.find_shortest_path(peer_he, metric);
        if peer_path.is_empty() {
            continue;
        }
        work.embed_path(peer_he, &peer_path)?;
        let path = work.find_shortest_path(l_he, metric);
        let candidate = if path.is_empty() {
            None
        } else {
            Some(materialize(work, l_he, &path)?)
        };
        work.unembed_path(peer_he)?;

        if let Some((chain, cost)) = candidate {
            if !candidates.iter().any(|(c, _)| *c == chain) {
                candidates.push((chain, cost));
            }
        }
    }

    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::greedy::embed_greedy;
    use crate::embed::fixtures;

    fn assert_valid(em: &Embedding) {
        assert!(em.is_complete());
        assert!(em.overlapping_elements().is_empty());
        for l_he in em.layout().halfedge_ids() {
            let chain = em.embedded_path(l_he).unwrap();
            assert_eq!(chain[0], em.matching_target_vertex(em.layout().origin(l_he)));
            assert_eq!(
                *chain.last().unwrap(),
                em.matching_target_vertex(em.layout().dest(l_he))
            );
        }
    }

    #[test]
    fn test_triangle_on_sphere_matches_greedy() {
        let gap = 0.05;
        let mut greedy_em = fixtures::sphere_triangle(3);
        let greedy = embed_greedy(&mut greedy_em, &GreedySettings::default()).unwrap();
        assert!(greedy_em.is_complete());

        let mut em = fixtures::sphere_triangle(3);
        let settings = BranchAndBoundSettings::default()
            .with_optimality_gap(gap)
            .with_time_limit(Duration::from_secs(30));
        let result = embed_branch_and_bound(&mut em, &settings).unwrap();

        assert_valid(&em);
        assert!((result.cost - em.total_embedded_path_length()).abs() < 1e-9);
        assert!(result.cost <= greedy.total_cost + 1e-9);
        assert!((greedy.total_cost - result.cost).abs() <= gap * greedy.total_cost);
        assert!(result.lower_bound <= result.cost + 1e-9);
    }

    #[test]
    fn test_zero_time_limit_returns_incumbent() {
        let mut em = fixtures::sphere_tetrahedron(2);
        let settings = BranchAndBoundSettings::default().with_time_limit(Duration::ZERO);
        let result = embed_branch_and_bound(&mut em, &settings).unwrap();

        assert_valid(&em);
        assert_eq!(result.termination, Termination::TimeLimit);
        assert_eq!(result.nodes_expanded, 0);
        assert!(result.gap >= 0.0);
    }

    #[test]
    fn test_tetrahedron_no_worse_than_greedy() {
        let mut greedy_em = fixtures::sphere_tetrahedron(2);
        let greedy = embed_greedy(&mut greedy_em, &GreedySettings::default()).unwrap();

        let mut em = fixtures::sphere_tetrahedron(2);
        let settings = BranchAndBoundSettings::default()
            .with_max_nodes(40)
            .with_time_limit(Duration::from_secs(30));
        let result = embed_branch_and_bound(&mut em, &settings).unwrap();

        assert_valid(&em);
        assert!(result.cost <= greedy.total_cost + 1e-9);
        assert!(result.nodes_expanded <= 40);
        if result.termination == Termination::Exhausted {
            assert_eq!(result.gap, 0.0);
        }
    }

    #[test]
    fn test_node_limit() {
        let mut em = fixtures::sphere_tetrahedron(1);
        let settings = BranchAndBoundSettings::default().with_max_nodes(1);
        let result = embed_branch_and_bound(&mut em, &settings).unwrap();
        assert_valid(&em);
        assert!(result.nodes_expanded <= 1);
        assert!(matches!(
            result.termination,
            Termination::NodeLimit | Termination::Exhausted | Termination::GapReached
        ));
    }

    #[test]
    fn test_full_gap_accepts_incumbent() {
        let mut greedy_em = fixtures::sphere_tetrahedron(1);
        let greedy = embed_greedy(&mut greedy_em, &GreedySettings::default()).unwrap();

        // The root bound is 0, so any incumbent is within a relative gap of 1.
        let mut em = fixtures::sphere_tetrahedron(1);
        let settings = BranchAndBoundSettings::default().with_optimality_gap(1.0);
        let result = embed_branch_and_bound(&mut em, &settings).unwrap();

        assert_valid(&em);
        assert_eq!(result.termination, Termination::GapReached);
        assert_eq!(result.nodes_expanded, 0);
        assert_eq!(result.lower_bound, 0.0);
        assert_eq!(result.gap, 1.0);
        assert!((result.cost - greedy.total_cost).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_settings() {
        let mut em = fixtures::sphere_triangle(1);
        let settings = BranchAndBoundSettings::default().with_optimality_gap(-0.1);
        assert!(matches!(
            embed_branch_and_bound(&mut em, &settings),
            Err(EmbedError::InvalidParameter { name: "optimality_gap", .. })
        ));
        let settings = BranchAndBoundSettings::default().with_max_candidates(0);
        assert!(embed_branch_and_bound(&mut em, &settings).is_err());
        assert_eq!(em.embedded_edge_count(), 0);
    }

    #[test]
    fn test_conflicting_shortest_paths_are_detected() {
        let em = fixtures::sphere_tetrahedron(2);
        let l_edges: Vec<_> = em.layout().edge_ids().collect();
        let open_edges = open_edge_paths(&em, &l_edges, ShortestPathMetric::Geodesic).unwrap();
        assert_eq!(open_edges.len(), 6);
        for (i, o) in open_edges.iter().enumerate() {
            assert!(o.cost.is_finite());
            for j in conflicts(&open_edges, i) {
                assert!(conflicts(&open_edges, j).contains(&i));
            }
        }
        let branch = branching_edge(&open_edges);
        let most = conflicts(&open_edges, branch).len();
        assert!((0..6).all(|i| conflicts(&open_edges, i).len() <= most));
    }

    #[test]
    fn test_gap_helpers() {
        assert_eq!(relative_gap(10.0, 10.0), 0.0);
        assert!((relative_gap(10.0, 9.0) - 0.1).abs() < 1e-12);
        assert_eq!(relative_gap(10.0, 11.0), 0.0);
        assert_eq!(relative_gap(f64::INFINITY, 1.0), f64::INFINITY);
        assert!(is_pruned(10.0, 10.0));
        assert!(!is_pruned(9.0, 10.0));
        assert!(!is_pruned(1e9, f64::INFINITY));
    }
}
