//! The mutable embedding state.
//!
//! An [`Embedding`] owns a working copy of the target mesh together with the
//! correspondence tables:
//!
//! - layout vertex -> target vertex (landmarks), and its inverse
//! - target half-edge -> layout half-edge, set along embedded paths
//!
//! Embedding a path splits the target edges whose midpoints it visits and then
//! labels the resulting half-edge chain. Unembedding only clears labels; the
//! refined target topology is kept, so undo is cheap and every handle stays
//! valid.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use nalgebra::Point3;
use tracing::trace;

use super::input::EmbeddingInput;
use super::virtual_vertex::{VirtualPath, VirtualVertex};
use crate::error::{EmbedError, Result};
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Options carried by an [`Embedding`].
#[derive(Debug, Clone)]
pub struct EmbeddingOptions {
    /// Exponent applied to the Euclidean length of a path to get its cost.
    ///
    /// Values above 1 penalize long paths super-linearly. Default: 1.0
    pub path_length_norm: f64,

    /// Cost multiplier for steps ending next to a foreign landmark when the
    /// vertex-repulsive metric is used. Must be at least 1. Default: 2.0
    pub repulsion_factor: f64,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            path_length_norm: 1.0,
            repulsion_factor: 2.0,
        }
    }
}

impl EmbeddingOptions {
    /// Set the path length exponent.
    pub fn with_path_length_norm(mut self, norm: f64) -> Self {
        self.path_length_norm = norm;
        self
    }

    /// Set the vertex-repulsive cost multiplier.
    pub fn with_repulsion_factor(mut self, factor: f64) -> Self {
        self.repulsion_factor = factor;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.path_length_norm > 0.0 && self.path_length_norm.is_finite()) {
            return Err(EmbedError::invalid_param(
                "path_length_norm",
                self.path_length_norm,
                "must be positive and finite",
            ));
        }
        if !(self.repulsion_factor >= 1.0 && self.repulsion_factor.is_finite()) {
            return Err(EmbedError::invalid_param(
                "repulsion_factor",
                self.repulsion_factor,
                "must be finite and at least 1",
            ));
        }
        Ok(())
    }
}

/// Embedding of a layout mesh into a (progressively refined) target mesh.
///
/// Cloning copies the target mesh and all tables; the input is shared.
#[derive(Debug, Clone)]
pub struct Embedding<I: MeshIndex = u32> {
    input: Arc<EmbeddingInput<I>>,
    target: HalfEdgeMesh<I>,
    l_matching_vertex: Vec<VertexId<I>>,
    t_matching_vertex: Vec<VertexId<I>>,
    t_matching_halfedge: Vec<HalfEdgeId<I>>,
    /// Unordered end points of every split edge -> the inserted vertex.
    split_log: HashMap<(VertexId<I>, VertexId<I>), VertexId<I>>,
    options: EmbeddingOptions,
}

impl<I: MeshIndex> Embedding<I> {
    /// Create an empty embedding with default options.
    pub fn new(input: impl Into<Arc<EmbeddingInput<I>>>) -> Result<Self> {
        Self::with_options(input, EmbeddingOptions::default())
    }

    /// Create an empty embedding.
    ///
    /// # Errors
    /// Fails if the input does not validate or the options are out of range.
    pub fn with_options(
        input: impl Into<Arc<EmbeddingInput<I>>>,
        options: EmbeddingOptions,
    ) -> Result<Self> {
        let input = input.into();
        input.validate()?;
        options.validate()?;

        let target = input.target.clone();
        let mut t_matching_vertex = vec![VertexId::invalid(); target.num_vertices()];
        for (l_v, &t_v) in input.landmarks.iter().enumerate() {
            t_matching_vertex[t_v.index()] = VertexId::new(l_v);
        }

        Ok(Self {
            l_matching_vertex: input.landmarks.clone(),
            t_matching_vertex,
            t_matching_halfedge: vec![HalfEdgeId::invalid(); target.num_halfedges()],
            split_log: HashMap::new(),
            target,
            input,
            options,
        })
    }

    /// Create an empty embedding on an already refined target.
    ///
    /// The refined target must keep the input's target vertices at their
    /// original indices, which holds for any mesh produced by midpoint splits.
    pub(crate) fn with_refined_target(
        input: impl Into<Arc<EmbeddingInput<I>>>,
        target: HalfEdgeMesh<I>,
        options: EmbeddingOptions,
    ) -> Result<Self> {
        let mut em = Self::with_options(input, options)?;
        if target.num_vertices() < em.target.num_vertices() {
            return Err(EmbedError::InvalidState(format!(
                "refined target has {} vertices, input target has {}",
                target.num_vertices(),
                em.target.num_vertices()
            )));
        }
        if !target.is_triangle_mesh() {
            return Err(EmbedError::InvalidState(
                "refined target is not a triangle mesh".to_string(),
            ));
        }
        em.t_matching_vertex
            .resize(target.num_vertices(), VertexId::invalid());
        em.t_matching_halfedge = vec![HalfEdgeId::invalid(); target.num_halfedges()];
        em.target = target;
        Ok(em)
    }

    /// Load an embedding from a `.lem` file, see [`crate::io::lem`].
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        crate::io::lem::load(path)
    }

    /// Save this embedding under a file stem, see [`crate::io::lem`].
    pub fn save<P: AsRef<std::path::Path>>(&self, stem: P) -> Result<()> {
        crate::io::lem::save(self, stem)
    }

    // ==================== Accessors ====================

    /// The input this embedding was created from.
    pub fn input(&self) -> &EmbeddingInput<I> {
        &self.input
    }

    /// Shared handle to the input.
    pub fn shared_input(&self) -> Arc<EmbeddingInput<I>> {
        Arc::clone(&self.input)
    }

    /// The layout mesh.
    #[inline]
    pub fn layout(&self) -> &HalfEdgeMesh<I> {
        &self.input.layout
    }

    /// The working (refined) target mesh.
    #[inline]
    pub fn target(&self) -> &HalfEdgeMesh<I> {
        &self.target
    }

    /// The options.
    pub fn options(&self) -> &EmbeddingOptions {
        &self.options
    }

    /// Target vertex pinned to a layout vertex.
    #[inline]
    pub fn matching_target_vertex(&self, l_v: VertexId<I>) -> VertexId<I> {
        self.l_matching_vertex[l_v.index()]
    }

    /// Layout vertex pinned to a target vertex, if it is a landmark.
    #[inline]
    pub fn matching_layout_vertex(&self, t_v: VertexId<I>) -> Option<VertexId<I>> {
        let l_v = self.t_matching_vertex[t_v.index()];
        l_v.is_valid().then_some(l_v)
    }

    /// Layout half-edge whose path runs along a target half-edge.
    #[inline]
    pub fn matching_layout_halfedge(&self, t_he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        let l_he = self.t_matching_halfedge[t_he.index()];
        l_he.is_valid().then_some(l_he)
    }

    /// Whether a target vertex is a landmark.
    #[inline]
    pub fn is_landmark(&self, t_v: VertexId<I>) -> bool {
        self.t_matching_vertex[t_v.index()].is_valid()
    }

    // ==================== Embedded paths ====================

    /// The first target half-edge of the path embedded for `l_he`.
    ///
    /// It leaves the landmark of the origin of `l_he`.
    pub fn embedded_target_halfedge(&self, l_he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        let t_v = self.matching_target_vertex(self.layout().origin(l_he));
        self.target
            .vertex_halfedges(t_v)
            .find(|&t_he| self.t_matching_halfedge[t_he.index()] == l_he)
    }

    /// Whether a layout half-edge has an embedded path.
    #[inline]
    pub fn is_embedded_halfedge(&self, l_he: HalfEdgeId<I>) -> bool {
        self.embedded_target_halfedge(l_he).is_some()
    }

    /// Whether a layout edge has an embedded path.
    #[inline]
    pub fn is_embedded(&self, l_e: EdgeId<I>) -> bool {
        self.is_embedded_halfedge(l_e.halfedge(0))
    }

    /// Number of embedded layout edges.
    pub fn embedded_edge_count(&self) -> usize {
        self.layout().edge_ids().filter(|&l_e| self.is_embedded(l_e)).count()
    }

    /// Whether every layout edge is embedded.
    pub fn is_complete(&self) -> bool {
        self.layout().edge_ids().all(|l_e| self.is_embedded(l_e))
    }

    /// Boundary of the sector in which a path for `l_he` may leave its landmark.
    ///
    /// Rotating clockwise from `l_he` around its origin, the first layout
    /// half-edge that is already embedded determines the sector through its
    /// first target half-edge. Without embedded neighbors any outgoing
    /// half-edge of the landmark is returned and the whole one-ring is open.
    pub fn embeddable_sector(&self, l_he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        debug_assert!(!self.is_embedded_halfedge(l_he));
        let layout = self.layout();

        let mut l_cur = layout.rotate_cw(l_he);
        while l_cur != l_he {
            if let Some(t_he) = self.embedded_target_halfedge(l_cur) {
                return t_he;
            }
            l_cur = layout.rotate_cw(l_cur);
        }

        let t_v = self.matching_target_vertex(layout.origin(l_he));
        self.target.vertex(t_v).halfedge
    }

    /// Real target vertices of the path embedded for `l_he`, from the landmark
    /// of its origin to the landmark of its destination.
    pub fn embedded_path(&self, l_he: HalfEdgeId<I>) -> Result<Vec<VertexId<I>>> {
        let first = self
            .embedded_target_halfedge(l_he)
            .ok_or(EmbedError::NotEmbedded { halfedge: l_he.index() })?;
        let t_v_end = self.matching_target_vertex(self.layout().dest(l_he));

        let mut chain = vec![self.target.origin(first)];
        let mut t_v = self.target.dest(first);
        while t_v != t_v_end {
            chain.push(t_v);
            let t_he = self
                .target
                .vertex_halfedges(t_v)
                .find(|&h| self.t_matching_halfedge[h.index()] == l_he)
                .ok_or_else(|| {
                    EmbedError::InvalidState(format!(
                        "path of layout halfedge {} ends at target vertex {}",
                        l_he.index(),
                        t_v.index()
                    ))
                })?;
            t_v = self.target.dest(t_he);
            if chain.len() > self.target.num_vertices() {
                return Err(EmbedError::InvalidState(format!(
                    "path of layout halfedge {} does not terminate",
                    l_he.index()
                )));
            }
        }
        chain.push(t_v_end);
        Ok(chain)
    }

    // ==================== Blocking ====================

    /// Whether a target edge is part of an embedded path.
    #[inline]
    pub fn is_blocked_edge(&self, t_e: EdgeId<I>) -> bool {
        let [a, b] = t_e.halfedges();
        self.t_matching_halfedge[a.index()].is_valid() || self.t_matching_halfedge[b.index()].is_valid()
    }

    /// Whether a target vertex is a landmark or lies on an embedded path.
    pub fn is_blocked_vertex(&self, t_v: VertexId<I>) -> bool {
        self.is_landmark(t_v) || self.target.vertex_edges(t_v).any(|t_e| self.is_blocked_edge(t_e))
    }

    /// Whether a virtual vertex is blocked.
    #[inline]
    pub fn is_blocked(&self, vv: VirtualVertex<I>) -> bool {
        match vv {
            VirtualVertex::Vertex(v) => self.is_blocked_vertex(v),
            VirtualVertex::Edge(e) => self.is_blocked_edge(e),
        }
    }

    /// Position of a virtual vertex (edge midpoints are centroids).
    #[inline]
    pub fn element_pos(&self, vv: VirtualVertex<I>) -> Point3<f64> {
        match vv {
            VirtualVertex::Vertex(v) => *self.target.position(v),
            VirtualVertex::Edge(e) => self.target.edge_midpoint(e),
        }
    }

    // ==================== Costs ====================

    fn apply_norm(&self, length: f64) -> f64 {
        length.powf(self.options.path_length_norm)
    }

    /// Cost of a virtual path: its Euclidean length raised to the path length norm.
    ///
    /// Paths with fewer than two elements (failed searches) cost infinity.
    pub fn path_length(&self, path: &[VirtualVertex<I>]) -> f64 {
        if path.len() < 2 {
            return f64::INFINITY;
        }
        let length: f64 = path
            .windows(2)
            .map(|w| (self.element_pos(w[1]) - self.element_pos(w[0])).norm())
            .sum();
        self.apply_norm(length)
    }

    /// Cost of a chain of real target vertices.
    pub fn chain_length(&self, chain: &[VertexId<I>]) -> f64 {
        if chain.len() < 2 {
            return f64::INFINITY;
        }
        let length: f64 = chain.windows(2).map(|w| self.target.distance(w[0], w[1])).sum();
        self.apply_norm(length)
    }

    /// Cost of the path embedded for a layout half-edge.
    pub fn embedded_path_length(&self, l_he: HalfEdgeId<I>) -> Result<f64> {
        Ok(self.chain_length(&self.embedded_path(l_he)?))
    }

    /// Sum of the costs of all embedded layout edges.
    pub fn total_embedded_path_length(&self) -> f64 {
        self.layout()
            .edge_ids()
            .filter_map(|l_e| self.embedded_path_length(l_e.halfedge(0)).ok())
            .sum()
    }

    // ==================== Mutation ====================

    /// Embed a virtual path for `l_he`.
    ///
    /// Edge midpoints on the path are materialized by splitting their edges,
    /// then the resulting half-edge chain is labeled with `l_he` (and the
    /// reverse chain with its opposite).
    ///
    /// # Errors
    /// - [`EmbedError::PathTooShort`] for paths with fewer than two elements
    /// - [`EmbedError::AlreadyEmbedded`] if the layout edge already has a path
    /// - [`EmbedError::LandmarkMismatch`] if the path does not connect the two landmarks
    /// - [`EmbedError::InvalidState`] if consecutive elements are not adjacent,
    ///   an interior element is a landmark or belongs to another embedded path,
    ///   or the path visits an element twice
    ///
    /// The target is only split and labeled once every check has passed, so a
    /// rejected path leaves the embedding untouched.
    pub fn embed_path(&mut self, l_he: HalfEdgeId<I>, path: &[VirtualVertex<I>]) -> Result<()> {
        if path.len() < 2 {
            return Err(EmbedError::PathTooShort { len: path.len() });
        }
        self.check_embeddable(l_he)?;

        let (first, last) = match (path[0], path[path.len() - 1]) {
            (VirtualVertex::Vertex(a), VirtualVertex::Vertex(b)) => (a, b),
            _ => {
                return Err(EmbedError::InvalidState(
                    "path must start and end at target vertices".to_string(),
                ))
            }
        };
        self.check_endpoints(l_he, first, last)?;

        for w in path.windows(2) {
            if !self.virtual_adjacent(w[0], w[1]) {
                return Err(EmbedError::InvalidState(format!(
                    "{:?} and {:?} are not adjacent in the target mesh",
                    w[0], w[1]
                )));
            }
            if let (VirtualVertex::Vertex(a), VirtualVertex::Vertex(b)) = (w[0], w[1]) {
                if self.target.find_halfedge(a, b).is_some_and(|h| self.is_blocked_edge(h.edge())) {
                    return Err(EmbedError::InvalidState(format!(
                        "target edge {}-{} is already part of an embedded path",
                        a.index(),
                        b.index()
                    )));
                }
            }
        }

        let mut visited = HashSet::with_capacity(path.len());
        for &vv in &path[1..path.len() - 1] {
            if self.is_blocked(vv) {
                return Err(EmbedError::InvalidState(format!(
                    "{:?} is a landmark or lies on an embedded path",
                    vv
                )));
            }
            if !visited.insert(vv) {
                return Err(EmbedError::InvalidState(format!("path visits {:?} twice", vv)));
            }
        }

        let chain: Vec<VertexId<I>> = path
            .iter()
            .map(|&vv| match vv {
                VirtualVertex::Vertex(v) => v,
                VirtualVertex::Edge(e) => self.split(e),
            })
            .collect();

        self.label_chain(l_he, &chain)?;
        trace!(
            halfedge = l_he.index(),
            elements = path.len(),
            vertices = chain.len(),
            "embedded path"
        );
        Ok(())
    }

    /// Label a previously recorded chain of real target vertices for `l_he`.
    ///
    /// Consecutive vertices whose connecting edge has been split since the
    /// chain was recorded are expanded through the inserted vertices.
    ///
    /// # Errors
    /// The same contract as [`Embedding::embed_path`], with
    /// [`EmbedError::BrokenPath`] for consecutive vertices that are neither
    /// adjacent nor the ends of a split edge. Nothing is labeled on error.
    pub fn restore_path(&mut self, l_he: HalfEdgeId<I>, chain: &[VertexId<I>]) -> Result<()> {
        if chain.len() < 2 {
            return Err(EmbedError::PathTooShort { len: chain.len() });
        }
        self.check_embeddable(l_he)?;
        self.check_endpoints(l_he, chain[0], chain[chain.len() - 1])?;

        let expanded = self.expand_chain(chain)?;
        self.label_chain(l_he, &expanded)
    }

    /// Remove the labels of the path embedded for `l_he`.
    ///
    /// The target mesh keeps every vertex inserted for the path.
    pub fn unembed_path(&mut self, l_he: HalfEdgeId<I>) -> Result<()> {
        let chain = self.embedded_path(l_he)?;
        for w in chain.windows(2) {
            let t_he = self.target.find_halfedge(w[0], w[1]).ok_or(EmbedError::BrokenPath {
                from: w[0].index(),
                to: w[1].index(),
            })?;
            debug_assert_eq!(self.t_matching_halfedge[t_he.index()], l_he);
            debug_assert_eq!(self.t_matching_halfedge[t_he.opposite().index()], l_he.opposite());
            self.t_matching_halfedge[t_he.index()] = HalfEdgeId::invalid();
            self.t_matching_halfedge[t_he.opposite().index()] = HalfEdgeId::invalid();
        }
        Ok(())
    }

    /// Remove the labels of the path embedded for a layout edge.
    pub fn unembed_edge(&mut self, l_e: EdgeId<I>) -> Result<()> {
        self.unembed_path(l_e.halfedge(0))
    }

    /// Remove every label.
    pub fn unembed_all(&mut self) {
        self.t_matching_halfedge.fill(HalfEdgeId::invalid());
    }

    /// Target elements claimed by more than one layout edge, or edges whose
    /// two half-edges disagree. Always empty for a consistent state.
    pub fn overlapping_elements(&self) -> Vec<VirtualVertex<I>> {
        let mut owner: Vec<Option<EdgeId<I>>> = vec![None; self.target.num_vertices()];
        let mut overlaps = Vec::new();

        for t_he in self.target.halfedge_ids() {
            let l_he = self.t_matching_halfedge[t_he.index()];
            if !l_he.is_valid() {
                continue;
            }
            if self.t_matching_halfedge[t_he.opposite().index()] != l_he.opposite() {
                overlaps.push(VirtualVertex::Edge(t_he.edge()));
            }

            let t_v = self.target.origin(t_he);
            if self.is_landmark(t_v) {
                // Only the landmark of the path's own start may be an origin.
                if t_v != self.matching_target_vertex(self.layout().origin(l_he)) {
                    overlaps.push(VirtualVertex::Vertex(t_v));
                }
                continue;
            }
            match owner[t_v.index()] {
                None => owner[t_v.index()] = Some(l_he.edge()),
                Some(l_e) if l_e != l_he.edge() => overlaps.push(VirtualVertex::Vertex(t_v)),
                Some(_) => {}
            }
        }

        overlaps.sort();
        overlaps.dedup();
        overlaps
    }

    // ==================== Internals ====================

    fn check_embeddable(&self, l_he: HalfEdgeId<I>) -> Result<()> {
        if !self.layout().contains_halfedge(l_he) {
            return Err(EmbedError::InvalidState(format!(
                "{:?} is not a layout halfedge",
                l_he
            )));
        }
        if self.is_embedded_halfedge(l_he) || self.is_embedded_halfedge(l_he.opposite()) {
            return Err(EmbedError::AlreadyEmbedded { halfedge: l_he.index() });
        }
        Ok(())
    }

    fn check_endpoints(&self, l_he: HalfEdgeId<I>, first: VertexId<I>, last: VertexId<I>) -> Result<()> {
        let l_from = self.layout().origin(l_he);
        let l_to = self.layout().dest(l_he);
        for (l_v, t_v) in [(l_from, first), (l_to, last)] {
            let expected = self.matching_target_vertex(l_v);
            if expected != t_v {
                return Err(EmbedError::LandmarkMismatch {
                    from: l_from.index(),
                    to: l_to.index(),
                    expected: expected.index(),
                    found: t_v.index(),
                });
            }
        }
        Ok(())
    }

    /// Whether the search graph connects `a` and `b`.
    fn virtual_adjacent(&self, a: VirtualVertex<I>, b: VirtualVertex<I>) -> bool {
        let t = &self.target;
        match (a, b) {
            (VirtualVertex::Vertex(x), VirtualVertex::Vertex(y)) => {
                t.contains_vertex(x) && t.contains_vertex(y) && t.find_halfedge(x, y).is_some()
            }
            (VirtualVertex::Vertex(x), VirtualVertex::Edge(e))
            | (VirtualVertex::Edge(e), VirtualVertex::Vertex(x)) => {
                e.index() < t.num_edges() && e.halfedges().iter().any(|&h| t.opposite_vertex(h) == x)
            }
            (VirtualVertex::Edge(e), VirtualVertex::Edge(f)) => {
                if e == f || e.index() >= t.num_edges() || f.index() >= t.num_edges() {
                    return false;
                }
                e.halfedges().iter().any(|&h| {
                    let face = t.face_of(h);
                    face.is_valid() && f.halfedges().iter().any(|&g| t.face_of(g) == face)
                })
            }
        }
    }

    /// Split a target edge at its midpoint and grow the tables.
    fn split(&mut self, t_e: EdgeId<I>) -> VertexId<I> {
        let [a, b] = self.target.edge_vertices(t_e);
        let [h_am, h_ma] = t_e.halfedges();
        let label = self.t_matching_halfedge[h_am.index()];
        let label_opp = self.t_matching_halfedge[h_ma.index()];

        let m = self.target.split_edge(t_e, self.target.edge_midpoint(t_e));
        self.t_matching_vertex.push(VertexId::invalid());
        self.t_matching_halfedge
            .resize(self.target.num_halfedges(), HalfEdgeId::invalid());
        self.split_log.insert(Self::split_key(a, b), m);

        // A labeled edge keeps its label on both halves.
        if label.is_valid() {
            if let Some(h_mb) = self.target.find_halfedge(m, b) {
                self.t_matching_halfedge[h_mb.index()] = label;
                self.t_matching_halfedge[h_mb.opposite().index()] = label_opp;
            }
        }
        m
    }

    fn split_key(a: VertexId<I>, b: VertexId<I>) -> (VertexId<I>, VertexId<I>) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn expand_chain(&self, chain: &[VertexId<I>]) -> Result<Vec<VertexId<I>>> {
        let mut expanded = vec![chain[0]];
        for w in chain.windows(2) {
            self.expand_segment(w[0], w[1], &mut expanded)?;
        }
        Ok(expanded)
    }

    fn expand_segment(&self, a: VertexId<I>, b: VertexId<I>, out: &mut Vec<VertexId<I>>) -> Result<()> {
        let broken = EmbedError::BrokenPath {
            from: a.index(),
            to: b.index(),
        };
        if !self.target.contains_vertex(a) || !self.target.contains_vertex(b) {
            return Err(broken);
        }
        if self.target.find_halfedge(a, b).is_some() {
            out.push(b);
            return Ok(());
        }
        match self.split_log.get(&Self::split_key(a, b)) {
            Some(&m) => {
                self.expand_segment(a, m, out)?;
                self.expand_segment(m, b, out)
            }
            None => Err(broken),
        }
    }

    fn label_chain(&mut self, l_he: HalfEdgeId<I>, chain: &[VertexId<I>]) -> Result<()> {
        let mut visited = HashSet::with_capacity(chain.len());
        for &t_v in &chain[1..chain.len() - 1] {
            if self.is_blocked_vertex(t_v) {
                return Err(EmbedError::InvalidState(format!(
                    "target vertex {} is a landmark or lies on an embedded path",
                    t_v.index()
                )));
            }
            if !visited.insert(t_v) {
                return Err(EmbedError::InvalidState(format!(
                    "chain visits target vertex {} twice",
                    t_v.index()
                )));
            }
        }

        let mut t_hes = Vec::with_capacity(chain.len() - 1);
        for w in chain.windows(2) {
            let t_he = self.target.find_halfedge(w[0], w[1]).ok_or(EmbedError::BrokenPath {
                from: w[0].index(),
                to: w[1].index(),
            })?;
            if self.is_blocked_edge(t_he.edge()) {
                return Err(EmbedError::InvalidState(format!(
                    "target edge {}-{} is already part of an embedded path",
                    w[0].index(),
                    w[1].index()
                )));
            }
            t_hes.push(t_he);
        }

        for t_he in t_hes {
            self.t_matching_halfedge[t_he.index()] = l_he;
            self.t_matching_halfedge[t_he.opposite().index()] = l_he.opposite();
        }
        Ok(())
    }

    /// Convert a real-vertex chain into a virtual path.
    pub fn chain_to_path(chain: &[VertexId<I>]) -> VirtualPath<I> {
        chain.iter().map(|&v| VirtualVertex::Vertex(v)).collect()
    }
}
