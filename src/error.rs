//! Error types for lembed.
//!
//! This module defines all error types used throughout the library. Failing to
//! find a legal path is *not* an error: the search reports it as an empty
//! [`VirtualPath`](crate::embed::VirtualPath) and the solvers decide what to do.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`EmbedError`].
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors that can occur while building meshes, embedding layouts or doing I/O.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices or fewer than three corners.
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A directed edge is used by more than one face.
    #[error("edge ({v0}, {v1}) is used by more than one face with the same orientation")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// The target mesh must consist of triangles only.
    #[error("target mesh is not a triangle mesh (face {face} has {corners} corners)")]
    NotTriangleMesh {
        /// The offending face.
        face: usize,
        /// Its number of corners.
        corners: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A text file could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// The file path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Error loading a file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// The landmark correspondence is not total, not injective or out of range.
    #[error("invalid landmark for layout vertex {layout_vertex}: {reason}")]
    InvalidLandmark {
        /// The layout vertex index.
        layout_vertex: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The layout halfedge already has an embedded path.
    #[error("layout halfedge {halfedge} is already embedded")]
    AlreadyEmbedded {
        /// The layout halfedge index.
        halfedge: usize,
    },

    /// The layout halfedge has no embedded path.
    #[error("layout halfedge {halfedge} is not embedded")]
    NotEmbedded {
        /// The layout halfedge index.
        halfedge: usize,
    },

    /// A path needs at least its two landmarks.
    #[error("path has {len} elements, at least 2 are required")]
    PathTooShort {
        /// The path length.
        len: usize,
    },

    /// Two consecutive path vertices are not connected by a target edge.
    #[error("target vertices {from} and {to} are not adjacent")]
    BrokenPath {
        /// First vertex.
        from: usize,
        /// Second vertex.
        to: usize,
    },

    /// A recorded path does not start or end at the expected landmark.
    #[error("layout halfedge {from} -> {to}: chain ends at target vertex {found}, landmark is {expected}")]
    LandmarkMismatch {
        /// Layout origin vertex.
        from: usize,
        /// Layout destination vertex.
        to: usize,
        /// The landmark target vertex.
        expected: usize,
        /// The vertex found in the chain.
        found: usize,
    },

    /// A solver could not find a legal path for a layout edge.
    #[error("no legal path exists for layout edge {edge}")]
    EmbeddingFailed {
        /// The layout edge index.
        edge: usize,
    },

    /// Invalid mesh or embedding state for the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl EmbedError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        EmbedError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn parse(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        EmbedError::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}
