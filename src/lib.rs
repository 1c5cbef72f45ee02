//! # lembed
//!
//! Layout embedding: route the edges of a coarse polygonal *layout* mesh as
//! non-crossing paths over a dense triangulated *target* surface.
//!
//! Every layout vertex is pinned to a target vertex (a *landmark*). Every
//! layout edge becomes a simple path of target vertices and edge midpoints
//! between its two landmarks. Paths never cross, never share interior
//! elements and leave each landmark in the cyclic order of the layout, so the
//! finished embedding partitions the target into one patch per layout face.
//!
//! ## Features
//!
//! - **Half-edge meshes** with type-safe indices and append-only edge splits
//! - **Virtual-vertex A\*** search restricted to legal sectors at both landmarks
//! - **Greedy** solvers with the Praun, Kraevoy and Schreiner heuristics,
//!   swirl detection and a parallel brute-force sweep over their settings
//! - **Branch and bound** with time limit and optimality gap
//! - **File formats**: OBJ meshes, `.inp` inputs and `.lem` embeddings
//!
//! ## Quick Start
//!
//! ```
//! use lembed::prelude::*;
//!
//! let target: HalfEdgeMesh = primitives::icosphere(2);
//! let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
//! let layout = primitives::tetrahedron_layout(corners);
//!
//! let landmarks = match_by_proximity(&layout, &target).unwrap();
//! let input = EmbeddingInput::new(layout, target, landmarks).unwrap();
//! let mut em = Embedding::new(input).unwrap();
//!
//! let result = embed_greedy(&mut em, &GreedySettings::praun()).unwrap();
//! assert!(em.is_complete());
//! println!("total length {:.3}", result.total_cost);
//! ```
//!
//! ## Saving and Loading
//!
//! ```no_run
//! use lembed::prelude::*;
//!
//! let input: EmbeddingInput = EmbeddingInput::load("bunny.inp").unwrap();
//! let mut em = Embedding::new(input).unwrap();
//! embed_branch_and_bound(&mut em, &BranchAndBoundSettings::default()).unwrap();
//! em.save("out/bunny").unwrap();
//!
//! let reloaded: Embedding = Embedding::load("out/bunny.lem").unwrap();
//! assert!(reloaded.is_complete());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod embed;
pub mod error;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use lembed::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::branch_and_bound::{embed_branch_and_bound, BranchAndBoundSettings};
    pub use crate::algo::greedy::{embed_greedy, embed_greedy_brute_force, BruteForceOptions, GreedySettings};
    pub use crate::algo::landmarks::match_by_proximity;
    pub use crate::embed::{Embedding, EmbeddingInput, ShortestPathMetric, VirtualPath, VirtualVertex};
    pub use crate::error::{EmbedError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, primitives, EdgeId, FaceId, HalfEdgeId, HalfEdgeMesh,
        MeshIndex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_embedding_survives_save_and_load() {
        let target: HalfEdgeMesh = primitives::icosphere(2);
        let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
        let layout = primitives::tetrahedron_layout(corners);
        let landmarks = match_by_proximity(&layout, &target).unwrap();
        let mut em = Embedding::new(EmbeddingInput::new(layout, target, landmarks).unwrap()).unwrap();

        let result = embed_greedy(&mut em, &GreedySettings::default()).unwrap();
        assert!(em.is_complete());
        assert_eq!(result.insertion_sequence.len(), 6);

        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();
        let loaded: Embedding = Embedding::load(dir.path().join("tet.lem")).unwrap();
        assert!(loaded.is_complete());
        assert!((loaded.total_embedded_path_length() - result.total_cost).abs() < 1e-9);
    }
}
