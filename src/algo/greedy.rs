//! Greedy sequential insertion of layout edges.
//!
//! Every iteration traces a shortest legal path for each unembedded layout
//! edge and embeds the cheapest one. Three heuristics steer the order:
//!
//! - **Spanning tree first**: until the embedded edges form a spanning tree of
//!   the layout vertices, edges that would close a cycle are not considered.
//! - **Swirl detection**: paths flagged by
//!   [`swirl_detection_bidirectional`] have their cost multiplied by a penalty.
//! - **Extremal vertices**: edges between layout vertices that are far from
//!   their neighbors are inserted before all others.
//!
//! # Example
//!
//! ```
//! use lembed::algo::greedy::{embed_greedy, GreedySettings};
//! use lembed::embed::{Embedding, EmbeddingInput};
//! use lembed::mesh::{primitives, HalfEdgeMesh, VertexId};
//!
//! let target: HalfEdgeMesh = primitives::icosphere(2);
//! let landmarks = [0, 4, 2, 1].map(VertexId::new);
//! let layout = primitives::tetrahedron_layout(landmarks.map(|v| *target.position(v)));
//! let mut em = Embedding::new(EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap()).unwrap();
//!
//! let result = embed_greedy(&mut em, &GreedySettings::praun()).unwrap();
//! assert!(em.is_complete());
//! assert_eq!(result.insertion_sequence.len(), 6);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::swirl::swirl_detection_bidirectional;
use super::Progress;
use crate::embed::{Embedding, ShortestPathMetric, VirtualPath};
use crate::error::{EmbedError, Result};
use crate::mesh::{EdgeId, MeshIndex};

/// Order in which candidate edges are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertionOrder {
    /// Embed the cheapest candidate of each iteration.
    #[default]
    BestFirst,
    /// Embed the first candidate that has a legal path.
    Arbitrary,
}

/// Settings for [`embed_greedy`].
#[derive(Debug, Clone, PartialEq)]
pub struct GreedySettings {
    /// Penalize candidate paths that are likely to cause swirls. Default: false
    pub use_swirl_detection: bool,

    /// Cost multiplier for paths flagged by swirl detection. Default: 1000.0
    pub swirl_penalty_factor: f64,

    /// Trace paths with [`ShortestPathMetric::VertexRepulsive`]. Default: false
    pub use_vertex_repulsive_tracing: bool,

    /// Insert edges between extremal layout vertices first. Default: false
    pub prefer_extremal_vertices: bool,

    /// Fraction of layout vertices, ranked by mean path length to their
    /// neighbors, treated as extremal. Default: 0.1
    pub extremal_vertex_ratio: f64,

    /// Candidate order. Default: [`InsertionOrder::BestFirst`]
    pub insertion_order: InsertionOrder,
}

impl Default for GreedySettings {
    fn default() -> Self {
        Self {
            use_swirl_detection: false,
            swirl_penalty_factor: 1e3,
            use_vertex_repulsive_tracing: false,
            prefer_extremal_vertices: false,
            extremal_vertex_ratio: 0.1,
            insertion_order: InsertionOrder::BestFirst,
        }
    }
}

impl GreedySettings {
    /// Shortest paths first, with swirl detection (Praun et al. 2001).
    pub fn praun() -> Self {
        Self::default().with_swirl_detection(true)
    }

    /// Vertex-repulsive tracing and extremal vertices first (Kraevoy et al. 2003).
    pub fn kraevoy() -> Self {
        Self::default()
            .with_vertex_repulsive_tracing(true)
            .with_extremal_vertices(true)
    }

    /// Vertex-repulsive tracing in arbitrary order (Schreiner et al. 2004).
    pub fn schreiner() -> Self {
        Self::default()
            .with_vertex_repulsive_tracing(true)
            .with_insertion_order(InsertionOrder::Arbitrary)
    }

    /// Enable or disable swirl detection.
    pub fn with_swirl_detection(mut self, enabled: bool) -> Self {
        self.use_swirl_detection = enabled;
        self
    }

    /// Set the cost multiplier for swirling paths.
    pub fn with_swirl_penalty_factor(mut self, factor: f64) -> Self {
        self.swirl_penalty_factor = factor;
        self
    }

    /// Trace with the vertex-repulsive metric.
    pub fn with_vertex_repulsive_tracing(mut self, enabled: bool) -> Self {
        self.use_vertex_repulsive_tracing = enabled;
        self
    }

    /// Insert edges between extremal vertices first.
    pub fn with_extremal_vertices(mut self, enabled: bool) -> Self {
        self.prefer_extremal_vertices = enabled;
        self
    }

    /// Set the fraction of layout vertices ranked as extremal candidates.
    pub fn with_extremal_vertex_ratio(mut self, ratio: f64) -> Self {
        self.extremal_vertex_ratio = ratio;
        self
    }

    /// Set the candidate order.
    pub fn with_insertion_order(mut self, order: InsertionOrder) -> Self {
        self.insertion_order = order;
        self
    }

    /// The metric used to trace candidate paths.
    pub fn metric(&self) -> ShortestPathMetric {
        if self.use_vertex_repulsive_tracing {
            ShortestPathMetric::VertexRepulsive
        } else {
            ShortestPathMetric::Geodesic
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.swirl_penalty_factor >= 1.0 && self.swirl_penalty_factor.is_finite()) {
            return Err(EmbedError::invalid_param(
                "swirl_penalty_factor",
                self.swirl_penalty_factor,
                "must be finite and at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.extremal_vertex_ratio) {
            return Err(EmbedError::invalid_param(
                "extremal_vertex_ratio",
                self.extremal_vertex_ratio,
                "must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

/// Outcome of a greedy run.
#[derive(Debug, Clone)]
pub struct GreedyResult<I: MeshIndex = u32> {
    /// Layout edges in the order they were embedded.
    pub insertion_sequence: Vec<EdgeId<I>>,
    /// Total embedded path length after the run.
    pub total_cost: f64,
}

/// Embed all remaining layout edges greedily.
///
/// Edges that are already embedded are kept and count towards the spanning tree.
///
/// # Errors
/// - [`EmbedError::InvalidParameter`] for out-of-range settings
/// - [`EmbedError::EmbeddingFailed`] if no remaining edge has a legal path
pub fn embed_greedy<I: MeshIndex>(em: &mut Embedding<I>, settings: &GreedySettings) -> Result<GreedyResult<I>> {
    embed_greedy_internal(em, settings, None)
}

/// [`embed_greedy`] with progress reporting (embedded edges / layout edges).
pub fn embed_greedy_with_progress<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &GreedySettings,
    progress: &Progress,
) -> Result<GreedyResult<I>> {
    embed_greedy_internal(em, settings, Some(progress))
}

fn embed_greedy_internal<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &GreedySettings,
    progress: Option<&Progress>,
) -> Result<GreedyResult<I>> {
    settings.validate()?;
    let start = Instant::now();
    let metric = settings.metric();

    let l_num_vertices = em.layout().num_vertices();
    let l_num_edges = em.layout().num_edges();
    let l_edges: Vec<EdgeId<I>> = em.layout().edge_ids().collect();

    let extremal = if settings.prefer_extremal_vertices {
        extremal_vertices(em, metric, settings.extremal_vertex_ratio)
    } else {
        vec![false; l_num_vertices]
    };
    let extremal_edge: Vec<bool> = l_edges
        .iter()
        .map(|&l_e| {
            let [a, b] = em.layout().edge_vertices(l_e);
            extremal[a.index()] && extremal[b.index()]
        })
        .collect();

    let mut components = UnionFind::<usize>::new(l_num_vertices);
    let mut num_embedded = 0;
    for &l_e in &l_edges {
        if em.is_embedded(l_e) {
            let [a, b] = em.layout().edge_vertices(l_e);
            components.union(a.index(), b.index());
            num_embedded += 1;
        }
    }

    info!(
        edges = l_num_edges,
        embedded = num_embedded,
        ?metric,
        swirl_detection = settings.use_swirl_detection,
        extremal = settings.prefer_extremal_vertices,
        order = ?settings.insertion_order,
        "greedy embedding"
    );

    let mut insertion_sequence = Vec::with_capacity(l_num_edges - num_embedded);

    while num_embedded < l_num_edges {
        let is_spanning_tree = num_embedded + 1 >= l_num_vertices;
        let mut best: Option<(EdgeId<I>, VirtualPath<I>, f64)> = None;

        for &l_e in &l_edges {
            if em.is_embedded(l_e) {
                continue;
            }
            let best_is_extremal = best.as_ref().is_some_and(|b| extremal_edge[b.0.index()]);
            let candidate_is_extremal = extremal_edge[l_e.index()];
            if best_is_extremal && !candidate_is_extremal {
                continue;
            }
            let [a, b] = em.layout().edge_vertices(l_e);
            if !is_spanning_tree && components.equiv(a.index(), b.index()) {
                continue;
            }

            let l_he = l_e.halfedge(0);
            let path = em.find_shortest_path(l_he, metric);
            if path.is_empty() {
                warn!(edge = l_e.index(), "no legal path for layout edge");
                continue;
            }
            let mut cost = em.path_length(&path);

            if settings.insertion_order == InsertionOrder::Arbitrary {
                best = Some((l_e, path, cost));
                break;
            }

            let best_cost = best.as_ref().map_or(f64::INFINITY, |b| b.2);
            if settings.use_swirl_detection
                && cost < best_cost
                && swirl_detection_bidirectional(em, l_he, &path)
            {
                debug!(edge = l_e.index(), cost, "swirl detected");
                cost *= settings.swirl_penalty_factor;
            }

            let key = (u8::from(!candidate_is_extremal), cost);
            let best_key = (u8::from(!best_is_extremal), best_cost);
            if key < best_key {
                best = Some((l_e, path, cost));
            }
        }

        let Some((l_e, path, cost)) = best else {
            let failed = l_edges
                .iter()
                .find(|&&l_e| !em.is_embedded(l_e))
                .map_or(0, |l_e| l_e.index());
            return Err(EmbedError::EmbeddingFailed { edge: failed });
        };

        em.embed_path(l_e.halfedge(0), &path)?;
        let [a, b] = em.layout().edge_vertices(l_e);
        components.union(a.index(), b.index());
        insertion_sequence.push(l_e);
        num_embedded += 1;

        debug!(
            edge = l_e.index(),
            cost,
            elements = path.len(),
            embedded = num_embedded,
            "inserted layout edge"
        );
        if let Some(p) = progress {
            p.report(num_embedded, l_num_edges, "Embedding layout edges");
        }
    }

    let total_cost = em.total_embedded_path_length();
    info!(
        total_cost,
        target_vertices = em.target().num_vertices(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "greedy embedding done"
    );

    Ok(GreedyResult {
        insertion_sequence,
        total_cost,
    })
}

/// Layout vertices whose mean path length to their neighbors lies strictly
/// above the value at rank `ratio * n` of the descending order.
fn extremal_vertices<I: MeshIndex>(em: &Embedding<I>, metric: ShortestPathMetric, ratio: f64) -> Vec<bool> {
    let l = em.layout();
    let mean_distance: Vec<f64> = l
        .vertex_ids()
        .map(|l_v| {
            let mut total = 0.0;
            let mut valence = 0;
            for l_he in l.vertex_halfedges(l_v) {
                total += if em.is_embedded_halfedge(l_he) {
                    em.embedded_path_length(l_he).unwrap_or(f64::INFINITY)
                } else {
                    em.path_length(&em.find_shortest_path(l_he, metric))
                };
                valence += 1;
            }
            if valence == 0 {
                0.0
            } else {
                total / valence as f64
            }
        })
        .collect();

    let mut sorted = mean_distance.clone();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let rank = ((sorted.len() as f64 * ratio) as usize).min(sorted.len().saturating_sub(1));
    let Some(&cutoff) = sorted.get(rank) else {
        return Vec::new();
    };

    let extremal: Vec<bool> = mean_distance.iter().map(|&d| d > cutoff).collect();
    debug!(
        cutoff,
        extremal = extremal.iter().filter(|&&e| e).count(),
        "extremal layout vertices"
    );
    extremal
}

/// Options for [`embed_greedy_brute_force`].
#[derive(Debug, Clone)]
pub struct BruteForceOptions {
    /// Run the variants on the rayon thread pool. Default: true
    pub parallel: bool,
}

impl Default for BruteForceOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl BruteForceOptions {
    /// Set parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the variants one after another.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Outcome of [`embed_greedy_brute_force`].
#[derive(Debug, Clone)]
pub struct BruteForceResult<I: MeshIndex = u32> {
    /// The variant that produced the cheapest embedding.
    pub settings: GreedySettings,
    /// Its greedy result.
    pub result: GreedyResult<I>,
}

/// The 8 combinations of swirl detection, vertex-repulsive tracing and
/// extremal vertex preference, other fields taken from `base`.
pub fn brute_force_variants(base: &GreedySettings) -> Vec<GreedySettings> {
    let mut variants = Vec::with_capacity(8);
    for swirl in [false, true] {
        for repulsive in [false, true] {
            for extremal in [false, true] {
                variants.push(
                    base.clone()
                        .with_swirl_detection(swirl)
                        .with_vertex_repulsive_tracing(repulsive)
                        .with_extremal_vertices(extremal),
                );
            }
        }
    }
    variants
}

/// Run every [`brute_force_variants`] setting on its own copy of `em` and keep
/// the cheapest embedding.
///
/// On success `em` holds the winning embedding. Variants that fail are logged
/// and ignored; ties go to the earlier variant.
///
/// # Errors
/// [`EmbedError::EmbeddingFailed`] if every variant fails.
pub fn embed_greedy_brute_force<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &GreedySettings,
    options: &BruteForceOptions,
) -> Result<BruteForceResult<I>> {
    embed_greedy_brute_force_internal(em, settings, options, None)
}

/// [`embed_greedy_brute_force`] with progress reporting (finished variants / 8).
pub fn embed_greedy_brute_force_with_progress<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &GreedySettings,
    options: &BruteForceOptions,
    progress: &Progress,
) -> Result<BruteForceResult<I>> {
    embed_greedy_brute_force_internal(em, settings, options, Some(progress))
}

fn embed_greedy_brute_force_internal<I: MeshIndex>(
    em: &mut Embedding<I>,
    settings: &GreedySettings,
    options: &BruteForceOptions,
    progress: Option<&Progress>,
) -> Result<BruteForceResult<I>> {
    settings.validate()?;
    let variants = brute_force_variants(settings);
    let finished = AtomicUsize::new(0);

    let base: &Embedding<I> = em;
    let run = |variant: &GreedySettings| {
        let mut copy = base.clone();
        let outcome = embed_greedy(&mut copy, variant);
        let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(p) = progress {
            p.report(done, variants.len(), "Greedy variants");
        }
        (copy, outcome)
    };
    let outcomes: Vec<(Embedding<I>, Result<GreedyResult<I>>)> = if options.parallel {
        variants.par_iter().map(run).collect()
    } else {
        variants.iter().map(run).collect()
    };

    let mut best: Option<(usize, Embedding<I>, GreedyResult<I>)> = None;
    let mut last_error = None;
    for (i, (copy, outcome)) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                debug!(variant = i, cost = result.total_cost, "brute force variant");
                if best.as_ref().map_or(true, |b| result.total_cost < b.2.total_cost) {
                    best = Some((i, copy, result));
                }
            }
            Err(e) => {
                warn!(variant = i, error = %e, "brute force variant failed");
                last_error = Some(e);
            }
        }
    }

    let Some((i, best_em, result)) = best else {
        return Err(last_error.unwrap_or(EmbedError::EmbeddingFailed { edge: 0 }));
    };
    let best_settings = variants[i].clone();
    info!(
        cost = result.total_cost,
        swirl_detection = best_settings.use_swirl_detection,
        vertex_repulsive = best_settings.use_vertex_repulsive_tracing,
        extremal = best_settings.prefer_extremal_vertices,
        "brute force best variant"
    );
    *em = best_em;
    Ok(BruteForceResult {
        settings: best_settings,
        result,
    })
}
