//! Input of an embedding problem.

use std::path::Path;

use crate::error::{EmbedError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

/// A layout mesh, a target mesh and the landmark correspondence between them.
///
/// `landmarks[i]` is the target vertex pinned to layout vertex `i`.
#[derive(Debug, Clone)]
pub struct EmbeddingInput<I: MeshIndex = u32> {
    /// The layout (base complex) mesh.
    pub layout: HalfEdgeMesh<I>,
    /// The triangulated target surface.
    pub target: HalfEdgeMesh<I>,
    /// Target vertex for every layout vertex.
    pub landmarks: Vec<VertexId<I>>,
}

impl<I: MeshIndex> EmbeddingInput<I> {
    /// Bundle and validate an input.
    pub fn new(
        layout: HalfEdgeMesh<I>,
        target: HalfEdgeMesh<I>,
        landmarks: Vec<VertexId<I>>,
    ) -> Result<Self> {
        let input = Self {
            layout,
            target,
            landmarks,
        };
        input.validate()?;
        Ok(input)
    }

    /// Check that the input describes a well-posed embedding problem.
    ///
    /// # Errors
    /// - [`EmbedError::EmptyMesh`] if either mesh has no faces
    /// - [`EmbedError::NotTriangleMesh`] if the target has a non-triangular face
    /// - [`EmbedError::InvalidLandmark`] if the correspondence is not total,
    ///   out of range, not injective or pins an isolated target vertex
    pub fn validate(&self) -> Result<()> {
        if self.layout.num_faces() == 0 || self.target.num_faces() == 0 {
            return Err(EmbedError::EmptyMesh);
        }

        if let Some(f) = self
            .target
            .face_ids()
            .find(|&f| self.target.face_vertex_count(f) != 3)
        {
            return Err(EmbedError::NotTriangleMesh {
                face: f.index(),
                corners: self.target.face_vertex_count(f),
            });
        }

        if self.landmarks.len() != self.layout.num_vertices() {
            return Err(EmbedError::InvalidLandmark {
                layout_vertex: self.landmarks.len().min(self.layout.num_vertices()),
                reason: format!(
                    "{} landmarks for {} layout vertices",
                    self.landmarks.len(),
                    self.layout.num_vertices()
                ),
            });
        }

        let mut used: Vec<Option<usize>> = vec![None; self.target.num_vertices()];
        for (l_v, &t_v) in self.landmarks.iter().enumerate() {
            if !self.target.contains_vertex(t_v) {
                return Err(EmbedError::InvalidLandmark {
                    layout_vertex: l_v,
                    reason: format!("target vertex {:?} out of range", t_v),
                });
            }
            if !self.target.vertex(t_v).halfedge.is_valid() {
                return Err(EmbedError::InvalidLandmark {
                    layout_vertex: l_v,
                    reason: format!("target vertex {} is isolated", t_v.index()),
                });
            }
            if let Some(other) = used[t_v.index()] {
                return Err(EmbedError::InvalidLandmark {
                    layout_vertex: l_v,
                    reason: format!("target vertex {} is already used by layout vertex {}", t_v.index(), other),
                });
            }
            used[t_v.index()] = Some(l_v);
        }

        Ok(())
    }

    /// Load an input from an `.inp` file. See [`crate::io::inp`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::inp::load(path)
    }

    /// Write `<stem>.inp`, `<stem>_layout.obj` and `<stem>_input_target.obj`.
    pub fn save<P: AsRef<Path>>(&self, stem: P) -> Result<()> {
        crate::io::inp::save(self, stem)
    }
}
