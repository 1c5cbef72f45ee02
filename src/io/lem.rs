//! `.lem` layout embedding files.
//!
//! Saving an embedding under the stem `out/bunny` writes
//!
//! - `out/bunny.inp`, `out/bunny_layout.obj`, `out/bunny_input_target.obj`
//!   (the input, see [`super::inp`])
//! - `out/bunny_target.obj` (the refined target mesh)
//! - `out/bunny.lem`
//!
//! The `.lem` file names the input and the refined target and lists the
//! target vertex chain of every embedded layout half-edge:
//!
//! ```text
//! inp bunny.inp
//! tf bunny_target.obj
//! ee 0 1 : 1532 2210 2211 87
//! ee 1 0 : 87 2211 2210 1532
//! ```
//!
//! Loading rebuilds the embedding on the refined target and re-labels every
//! chain, checking that the chain ends on the recorded landmarks and that
//! consecutive chain vertices are connected.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::inp::{self, parse_index, split_stem, with_suffix};
use super::obj;
use crate::embed::{Embedding, EmbeddingOptions};
use crate::error::{EmbedError, Result};
use crate::mesh::{MeshIndex, VertexId};

/// Save an embedding under a file stem.
///
/// Layout half-edges without an embedded path are not written.
///
/// # Errors
/// [`EmbedError::SaveError`] if the stem's directory does not exist or a file
/// cannot be created.
pub fn save<P: AsRef<Path>, I: MeshIndex>(em: &Embedding<I>, stem: P) -> Result<()> {
    let stem = stem.as_ref();
    let (dir, name) = split_stem(stem)?;

    let target_name = format!("{}_target.obj", name);
    obj::save(em.target(), dir.join(&target_name))?;
    inp::save(em.input(), stem)?;

    let lem_path = with_suffix(&dir, &name, ".lem");
    let file = File::create(&lem_path).map_err(|e| EmbedError::SaveError {
        path: lem_path.clone(),
        message: e.to_string(),
    })?;
    let mut w = BufWriter::new(file);
    writeln!(w, "# {}", name)?;
    writeln!(w)?;
    writeln!(w, "inp {}.inp", name)?;
    writeln!(w, "tf {}", target_name)?;
    writeln!(w)?;

    let layout = em.layout();
    let mut written = 0;
    for l_he in layout.halfedge_ids() {
        if !em.is_embedded_halfedge(l_he) {
            continue;
        }
        let chain = em.embedded_path(l_he)?;
        write!(w, "ee {} {} :", layout.origin(l_he).index(), layout.dest(l_he).index())?;
        for t_v in &chain {
            write!(w, " {}", t_v.index())?;
        }
        writeln!(w)?;
        written += 1;
    }
    w.flush()?;

    debug!(path = %lem_path.display(), halfedges = written, "saved embedding");
    Ok(())
}

/// Resolve `path` to a `.lem` file, appending the extension to a bare stem.
fn lem_path(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == "lem") {
        path.to_path_buf()
    } else {
        let mut os = path.as_os_str().to_owned();
        os.push(".lem");
        PathBuf::from(os)
    }
}

/// Load an embedding from a `.lem` file (or its stem).
///
/// # Errors
/// - [`EmbedError::LoadError`] / [`EmbedError::Parse`] for unreadable or malformed files
/// - [`EmbedError::LandmarkMismatch`] if a chain does not end on the landmarks
///   of its layout half-edge
/// - [`EmbedError::BrokenPath`] if consecutive chain vertices are not adjacent
/// - [`EmbedError::InvalidState`] if the two directions of an edge disagree or
///   chains overlap
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<Embedding<I>> {
    let path = lem_path(path.as_ref());
    let file = File::open(&path).map_err(|e| EmbedError::LoadError {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let mut inp_file: Option<String> = None;
    let mut target_file: Option<String> = None;
    let mut chains: Vec<(usize, usize, Vec<VertexId<I>>, usize)> = Vec::new();

    for (line_idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line_nr = line_idx + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None => {}
            Some(t) if t.starts_with('#') => {}
            Some("inp") => inp_file = tokens.next().map(str::to_string),
            Some("tf") => target_file = tokens.next().map(str::to_string),
            Some("ee") => {
                let from = parse_index(&mut tokens, &path, line_nr)?;
                let to = parse_index(&mut tokens, &path, line_nr)?;
                if tokens.next() != Some(":") {
                    return Err(EmbedError::parse(&path, line_nr, "expected ':' after layout half-edge"));
                }
                let chain = tokens
                    .map(|t| {
                        t.parse::<usize>()
                            .map(VertexId::new)
                            .map_err(|_| EmbedError::parse(&path, line_nr, format!("invalid vertex index '{}'", t)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                chains.push((from, to, chain, line_nr));
            }
            Some(other) => {
                return Err(EmbedError::parse(&path, line_nr, format!("unknown record '{}'", other)));
            }
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let inp_file = inp_file.ok_or_else(|| EmbedError::parse(&path, 0, "missing 'inp' record"))?;
    let target_file = target_file.ok_or_else(|| EmbedError::parse(&path, 0, "missing 'tf' record"))?;

    let input = inp::load(dir.join(inp_file))?;
    let target = obj::load(dir.join(target_file))?;
    let mut em = Embedding::with_refined_target(input, target, EmbeddingOptions::default())?;

    for (from, to, chain, line_nr) in chains {
        let l_he = em
            .layout()
            .find_halfedge(VertexId::new(from), VertexId::new(to))
            .ok_or_else(|| EmbedError::parse(&path, line_nr, format!("no layout half-edge {} -> {}", from, to)))?;
        for &t_v in &chain {
            if !em.target().contains_vertex(t_v) {
                return Err(EmbedError::parse(
                    &path,
                    line_nr,
                    format!("target vertex {} out of range", t_v.index()),
                ));
            }
        }

        if em.is_embedded_halfedge(l_he) {
            // Already labeled through the other direction.
            if em.embedded_path(l_he)? != chain {
                return Err(EmbedError::InvalidState(format!(
                    "chains of layout half-edges {} -> {} and {} -> {} disagree",
                    from, to, to, from
                )));
            }
            continue;
        }
        em.restore_path(l_he, &chain)?;
    }

    debug!(
        path = %path.display(),
        embedded = em.embedded_edge_count(),
        edges = em.layout().num_edges(),
        "loaded embedding"
    );
    Ok(em)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::embed::{fixtures, ShortestPathMetric};

    fn partially_embedded() -> Embedding {
        let mut em = fixtures::sphere_tetrahedron(2);
        let edges: Vec<_> = em.layout().edge_ids().collect();
        for l_e in edges {
            let path = em.find_shortest_path_for_edge(l_e, ShortestPathMetric::Geodesic);
            if !path.is_empty() {
                em.embed_path(l_e.halfedge(0), &path).unwrap();
            }
        }
        em
    }

    #[test]
    fn test_roundtrip_preserves_labels_and_chains() {
        let em = partially_embedded();
        assert!(em.embedded_edge_count() > 0);

        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("tet");
        em.save(&stem).unwrap();
        for file in ["tet.lem", "tet.inp", "tet_target.obj", "tet_layout.obj", "tet_input_target.obj"] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }

        let loaded: Embedding = Embedding::load(dir.path().join("tet.lem")).unwrap();
        assert_eq!(loaded.target().num_vertices(), em.target().num_vertices());
        assert_eq!(loaded.embedded_edge_count(), em.embedded_edge_count());

        for l_he in em.layout().halfedge_ids() {
            assert_eq!(loaded.is_embedded_halfedge(l_he), em.is_embedded_halfedge(l_he));
            if em.is_embedded_halfedge(l_he) {
                assert_eq!(loaded.embedded_path(l_he).unwrap(), em.embedded_path(l_he).unwrap());
            }
        }

        // Half-edge ids differ after reloading, labels are compared by end points.
        for t_he in em.target().halfedge_ids() {
            let from = em.target().origin(t_he);
            let to = em.target().dest(t_he);
            let loaded_he = loaded.target().find_halfedge(from, to).unwrap();
            assert_eq!(
                loaded.matching_layout_halfedge(loaded_he),
                em.matching_layout_halfedge(t_he)
            );
        }
        assert!(loaded.overlapping_elements().is_empty());
    }

    #[test]
    fn test_load_from_stem() {
        let em = partially_embedded();
        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();
        let loaded: Embedding = load(dir.path().join("tet")).unwrap();
        assert_eq!(loaded.embedded_edge_count(), em.embedded_edge_count());
    }

    #[test]
    fn test_chain_with_wrong_landmark_is_rejected() {
        let em = partially_embedded();
        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();

        let lem = dir.path().join("tet.lem");
        let text = fs::read_to_string(&lem).unwrap();
        let line = text.lines().find(|l| l.starts_with("ee ")).unwrap().to_string();
        let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        // tokens: "ee", from, to, ":", first chain vertex, ...
        let start = tokens[4].clone();
        let other = em
            .input()
            .landmarks
            .iter()
            .map(|v| v.index().to_string())
            .find(|v| *v != start)
            .unwrap();
        tokens[4] = other;
        let corrupted = text.replace(&line, &tokens.join(" "));
        fs::write(&lem, corrupted).unwrap();

        let result: Result<Embedding> = load(&lem);
        assert!(matches!(result, Err(EmbedError::LandmarkMismatch { .. })));
    }

    #[test]
    fn test_broken_chain_is_rejected() {
        let em = fixtures::sphere_tetrahedron(1);
        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();

        // +x (0) and -x (1) are antipodal and never adjacent.
        let lem = dir.path().join("tet.lem");
        let mut text = fs::read_to_string(&lem).unwrap();
        text.push_str("ee 0 3 : 0 1\n");
        fs::write(&lem, text).unwrap();

        let result: Result<Embedding> = load(&lem);
        assert!(matches!(result, Err(EmbedError::BrokenPath { from: 0, to: 1 })));
    }

    #[test]
    fn test_crossing_chains_are_rejected() {
        let em = fixtures::sphere_tetrahedron(0);
        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();

        // Both chains pass through -y (3) on the octahedron.
        let lem = dir.path().join("tet.lem");
        let mut text = fs::read_to_string(&lem).unwrap();
        text.push_str("ee 1 3 : 4 3 1\n");
        text.push_str("ee 2 0 : 2 5 3 0\n");
        fs::write(&lem, text).unwrap();

        let result: Result<Embedding> = load(&lem);
        assert!(matches!(result, Err(EmbedError::InvalidState(_))));

        // Either chain alone is accepted.
        let text = fs::read_to_string(&lem).unwrap().replace("ee 2 0 : 2 5 3 0\n", "");
        fs::write(&lem, text).unwrap();
        let loaded: Embedding = load(&lem).unwrap();
        assert_eq!(loaded.embedded_edge_count(), 1);
        assert!(loaded.overlapping_elements().is_empty());
    }

    #[test]
    fn test_chain_through_foreign_landmark_is_rejected() {
        let em = fixtures::sphere_tetrahedron(0);
        let dir = tempfile::tempdir().unwrap();
        em.save(dir.path().join("tet")).unwrap();

        // +z (4) is the landmark of layout vertex 1.
        let lem = dir.path().join("tet.lem");
        let mut text = fs::read_to_string(&lem).unwrap();
        text.push_str("ee 0 2 : 0 4 2\n");
        fs::write(&lem, text).unwrap();

        let result: Result<Embedding> = load(&lem);
        assert!(matches!(result, Err(EmbedError::InvalidState(_))));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let em = fixtures::sphere_tetrahedron(0);
        let dir = tempfile::tempdir().unwrap();
        let result = em.save(dir.path().join("nope").join("tet"));
        assert!(matches!(result, Err(EmbedError::SaveError { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Embedding> = load(dir.path().join("absent.lem"));
        assert!(matches!(result, Err(EmbedError::LoadError { .. })));
    }
}
