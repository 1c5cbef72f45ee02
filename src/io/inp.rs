//! `.inp` embedding input files.
//!
//! Plain text, one record per line, `#` starts a comment:
//!
//! ```text
//! lf bunny_layout.obj          # layout mesh, relative to the .inp file
//! tf bunny_input_target.obj    # target mesh, relative to the .inp file
//! lv 0 1532                    # layout vertex 0 is pinned to target vertex 1532
//! lv 1 87
//! ```
//!
//! There is one `lv` record per layout vertex.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::obj;
use crate::embed::EmbeddingInput;
use crate::error::{EmbedError, Result};
use crate::mesh::{MeshIndex, VertexId};

/// Split a file stem like `out/bunny` into its directory and bare name.
///
/// Fails if the directory does not exist.
pub(crate) fn split_stem(stem: &Path) -> Result<(PathBuf, String)> {
    let name = stem
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EmbedError::SaveError {
            path: stem.to_path_buf(),
            message: "path has no file name".to_string(),
        })?
        .to_string();
    let dir = match stem.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.is_dir() {
        return Err(EmbedError::SaveError {
            path: stem.to_path_buf(),
            message: format!("directory {} does not exist", dir.display()),
        });
    }
    Ok((dir, name))
}

/// `<dir>/<name><suffix>`
pub(crate) fn with_suffix(dir: &Path, name: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}", name, suffix))
}

/// Write `<stem>.inp`, `<stem>_layout.obj` and `<stem>_input_target.obj`.
pub fn save<P: AsRef<Path>, I: MeshIndex>(input: &EmbeddingInput<I>, stem: P) -> Result<()> {
    let stem = stem.as_ref();
    let (dir, name) = split_stem(stem)?;

    let layout_name = format!("{}_layout.obj", name);
    let target_name = format!("{}_input_target.obj", name);
    obj::save(&input.layout, dir.join(&layout_name))?;
    obj::save(&input.target, dir.join(&target_name))?;

    let inp_path = with_suffix(&dir, &name, ".inp");
    let file = File::create(&inp_path).map_err(|e| EmbedError::SaveError {
        path: inp_path.clone(),
        message: e.to_string(),
    })?;
    let mut w = BufWriter::new(file);
    writeln!(w, "# {}", name)?;
    writeln!(w)?;
    writeln!(w, "lf {}", layout_name)?;
    writeln!(w, "tf {}", target_name)?;
    writeln!(w)?;
    for (l_v, t_v) in input.landmarks.iter().enumerate() {
        writeln!(w, "lv {} {}", l_v, t_v.index())?;
    }
    w.flush()?;
    Ok(())
}

/// Load an embedding input from an `.inp` file.
///
/// Mesh paths are resolved relative to the directory of the `.inp` file. The
/// result is validated with [`EmbeddingInput::validate`].
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<EmbeddingInput<I>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EmbedError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut layout_file: Option<String> = None;
    let mut target_file: Option<String> = None;
    let mut pairs: Vec<(usize, usize, usize)> = Vec::new();

    for (line_idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line_nr = line_idx + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None => {}
            Some(t) if t.starts_with('#') => {}
            Some("lf") => layout_file = Some(expect_token(&mut tokens, path, line_nr, "layout file name")?),
            Some("tf") => target_file = Some(expect_token(&mut tokens, path, line_nr, "target file name")?),
            Some("lv") => {
                let l_v = parse_index(&mut tokens, path, line_nr)?;
                let t_v = parse_index(&mut tokens, path, line_nr)?;
                pairs.push((l_v, t_v, line_nr));
            }
            Some(other) => {
                return Err(EmbedError::parse(path, line_nr, format!("unknown record '{}'", other)));
            }
        }
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let layout_file = layout_file.ok_or_else(|| EmbedError::parse(path, 0, "missing 'lf' record"))?;
    let target_file = target_file.ok_or_else(|| EmbedError::parse(path, 0, "missing 'tf' record"))?;
    let layout = obj::load(dir.join(layout_file))?;
    let target = obj::load(dir.join(target_file))?;

    let mut landmarks: Vec<Option<VertexId<I>>> = vec![None; layout.num_vertices()];
    for (l_v, t_v, line_nr) in pairs {
        if l_v >= landmarks.len() {
            return Err(EmbedError::parse(path, line_nr, format!("layout vertex {} out of range", l_v)));
        }
        if landmarks[l_v].is_some() {
            return Err(EmbedError::InvalidLandmark {
                layout_vertex: l_v,
                reason: "landmark given more than once".to_string(),
            });
        }
        if t_v >= target.num_vertices() {
            return Err(EmbedError::InvalidLandmark {
                layout_vertex: l_v,
                reason: format!("target vertex {} out of range", t_v),
            });
        }
        landmarks[l_v] = Some(VertexId::new(t_v));
    }

    let landmarks = landmarks
        .into_iter()
        .enumerate()
        .map(|(l_v, t_v)| {
            t_v.ok_or_else(|| EmbedError::InvalidLandmark {
                layout_vertex: l_v,
                reason: "no landmark given".to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    EmbeddingInput::new(layout, target, landmarks)
}

fn expect_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
    what: &str,
) -> Result<String> {
    tokens
        .next()
        .map(str::to_string)
        .ok_or_else(|| EmbedError::parse(path, line, format!("missing {}", what)))
}

pub(crate) fn parse_index<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> Result<usize> {
    let token = tokens
        .next()
        .ok_or_else(|| EmbedError::parse(path, line, "missing index"))?;
    token
        .parse()
        .map_err(|_| EmbedError::parse(path, line, format!("invalid index '{}'", token)))
}

/// Remove the files written by [`save`]. Missing files are ignored.
pub fn remove<P: AsRef<Path>>(stem: P) -> Result<()> {
    let (dir, name) = split_stem(stem.as_ref())?;
    for suffix in [".inp", "_layout.obj", "_input_target.obj"] {
        let p = with_suffix(&dir, &name, suffix);
        if p.exists() {
            fs::remove_file(p)?;
        }
    }
    Ok(())
}
