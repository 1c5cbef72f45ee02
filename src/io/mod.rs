//! File I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Contents |
//! |--------|-----------|----------|
//! | Wavefront OBJ | `.obj` | Layout and target meshes |
//! | Embedding input | `.inp` | Mesh file names + landmark correspondence |
//! | Embedding | `.lem` | Input file, refined target file + one vertex chain per embedded half-edge |
//!
//! `.inp` and `.lem` files reference their meshes by file names relative to
//! their own directory, so a saved set of files can be moved as a unit.
//!
//! # Usage
//!
//! ```no_run
//! use lembed::io;
//! use lembed::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = io::load("target.obj").unwrap();
//! io::save(&mesh, "copy.obj").unwrap();
//! ```
//!
//! Embeddings are saved under a file stem:
//!
//! ```no_run
//! use lembed::embed::Embedding;
//!
//! let em: Embedding = Embedding::load("out/bunny.lem").unwrap();
//! em.save("out/bunny_copy").unwrap();
//! ```

pub mod inp;
pub mod lem;
pub mod obj;

use std::path::Path;

use crate::error::{EmbedError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// File formats understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ mesh.
    Obj,
    /// Embedding input.
    Inp,
    /// Layout embedding.
    Lem,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "inp" => Some(Format::Inp),
            "lem" => Some(Format::Lem),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn unsupported(path: &Path) -> EmbedError {
    EmbedError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    }
}

/// Load a mesh, choosing the reader by file extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    match Format::from_path(path) {
        Some(Format::Obj) => obj::load(path),
        _ => Err(unsupported(path)),
    }
}

/// Save a mesh, choosing the writer by file extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path) {
        Some(Format::Obj) => obj::save(mesh, path),
        _ => Err(unsupported(path)),
    }
}
