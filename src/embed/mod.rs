//! The embedding engine.
//!
//! - [`EmbeddingInput`]: layout mesh, target mesh and landmark correspondence
//! - [`Embedding`]: mutable embedding state (target refinement + labels)
//! - [`VirtualVertex`] / [`VirtualPath`]: nodes and paths of the search graph
//! - [`ShortestPathMetric`]: step costs of the shortest-path search
//!
//! # Example
//!
//! ```
//! use lembed::embed::{Embedding, EmbeddingInput, ShortestPathMetric};
//! use lembed::mesh::{primitives, HalfEdgeMesh, VertexId};
//!
//! let target: HalfEdgeMesh = primitives::icosphere(2);
//! let landmarks = [0, 2, 4].map(VertexId::new);
//! let layout = primitives::double_triangle_layout(landmarks.map(|v| *target.position(v)));
//!
//! let input = EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap();
//! let mut em = Embedding::new(input).unwrap();
//!
//! let l_he = em.layout().find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
//! let path = em.find_shortest_path(l_he, ShortestPathMetric::Geodesic);
//! em.embed_path(l_he, &path).unwrap();
//! assert!(em.is_embedded(l_he.edge()));
//! ```

mod embedding;
mod input;
mod search;
mod virtual_vertex;

#[cfg(test)]
pub(crate) mod fixtures;

pub use embedding::{Embedding, EmbeddingOptions};
pub use input::EmbeddingInput;
pub use search::ShortestPathMetric;
pub use virtual_vertex::{VirtualPath, VirtualVertex, VirtualVertexMap};
