//! Landmark placement.
//!
//! Helpers that produce or perturb the layout-to-target vertex correspondence
//! of an [`EmbeddingInput`]. All randomized helpers take an explicit seed and
//! are reproducible.
//!
//! # Example
//!
//! ```
//! use lembed::algo::landmarks::{jitter, match_by_proximity};
//! use lembed::embed::EmbeddingInput;
//! use lembed::mesh::{primitives, HalfEdgeMesh, VertexId};
//!
//! let target: HalfEdgeMesh = primitives::icosphere(2);
//! let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
//! let layout = primitives::tetrahedron_layout(corners);
//!
//! let landmarks = match_by_proximity(&layout, &target).unwrap();
//! let mut input = EmbeddingInput::new(layout, target, landmarks).unwrap();
//! jitter(&mut input, 3, 7);
//! input.validate().unwrap();
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::embed::EmbeddingInput;
use crate::error::{EmbedError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexId};

fn is_isolated<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> bool {
    !mesh.vertex(v).halfedge.is_valid()
}

/// Pin every layout vertex to the closest target vertex not taken by an
/// earlier layout vertex.
///
/// Layout vertices are processed in index order, so on ties the lower layout
/// vertex wins.
///
/// # Errors
/// [`EmbedError::InvalidLandmark`] if the target has fewer usable vertices than
/// the layout.
pub fn match_by_proximity<I: MeshIndex>(
    layout: &HalfEdgeMesh<I>,
    target: &HalfEdgeMesh<I>,
) -> Result<Vec<VertexId<I>>> {
    let mut taken = vec![false; target.num_vertices()];
    let mut landmarks = Vec::with_capacity(layout.num_vertices());

    for l_v in layout.vertex_ids() {
        let p = layout.position(l_v);
        let best = target
            .vertex_ids()
            .filter(|&t_v| !taken[t_v.index()] && !is_isolated(target, t_v))
            .map(|t_v| (t_v, (target.position(t_v) - p).norm_squared()))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((t_v, dist_sq)) = best else {
            return Err(EmbedError::InvalidLandmark {
                layout_vertex: l_v.index(),
                reason: "no free target vertex left".to_string(),
            });
        };
        taken[t_v.index()] = true;
        landmarks.push(t_v);
        debug!(layout_vertex = l_v.index(), target_vertex = t_v.index(), distance = dist_sq.sqrt(), "matched landmark");
    }

    Ok(landmarks)
}

/// Move every landmark `steps` times to a random neighbor, skipping moves onto
/// vertices occupied by another landmark.
pub fn jitter<I: MeshIndex>(input: &mut EmbeddingInput<I>, steps: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let target = &input.target;
    let mut occupied = vec![false; target.num_vertices()];
    for &t_v in &input.landmarks {
        occupied[t_v.index()] = true;
    }

    let mut moved = 0;
    for _ in 0..steps {
        for landmark in input.landmarks.iter_mut() {
            let neighbors: Vec<VertexId<I>> = target.vertex_neighbors(*landmark).collect();
            let Some(&t_v_new) = neighbors.choose(&mut rng) else {
                continue;
            };
            if !occupied[t_v_new.index()] {
                occupied[landmark.index()] = false;
                occupied[t_v_new.index()] = true;
                *landmark = t_v_new;
                moved += 1;
            }
        }
    }
    debug!(steps, seed, moved, "jittered landmarks");
}

/// Pin the layout vertices to a random set of distinct target vertices.
///
/// # Errors
/// [`EmbedError::InvalidLandmark`] if the target has fewer usable vertices than
/// the layout.
pub fn randomize<I: MeshIndex>(input: &mut EmbeddingInput<I>, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut candidates: Vec<VertexId<I>> = input
        .target
        .vertex_ids()
        .filter(|&t_v| !is_isolated(&input.target, t_v))
        .collect();

    let n = input.layout.num_vertices();
    if candidates.len() < n {
        return Err(EmbedError::InvalidLandmark {
            layout_vertex: candidates.len(),
            reason: format!("{} layout vertices but only {} target vertices", n, candidates.len()),
        });
    }

    candidates.shuffle(&mut rng);
    candidates.truncate(n);
    input.landmarks = candidates;
    debug!(seed, landmarks = n, "randomized landmarks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use nalgebra::Point3;

    fn sphere_input() -> EmbeddingInput {
        let target: HalfEdgeMesh = primitives::icosphere(2);
        let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
        let layout = primitives::tetrahedron_layout(corners);
        let landmarks = match_by_proximity(&layout, &target).unwrap();
        EmbeddingInput::new(layout, target, landmarks).unwrap()
    }

    #[test]
    fn test_proximity_finds_coincident_vertices() {
        let input = sphere_input();
        assert_eq!(input.landmarks, [0, 4, 2, 1].map(VertexId::new).to_vec());
    }

    #[test]
    fn test_proximity_is_injective() {
        let target: HalfEdgeMesh = primitives::icosphere(1);
        let p = *target.position(VertexId::new(0));
        let layout: HalfEdgeMesh = primitives::double_triangle_layout([p, p, Point3::new(0.0, 0.0, 1.0)]);
        let landmarks = match_by_proximity(&layout, &target).unwrap();
        assert_eq!(landmarks[0], VertexId::new(0));
        assert_ne!(landmarks[1], landmarks[0]);
        assert_eq!(landmarks[2], VertexId::new(4));
    }

    #[test]
    fn test_proximity_runs_out_of_vertices() {
        let target: HalfEdgeMesh = primitives::octahedron();
        let layout: HalfEdgeMesh = primitives::icosphere(1);
        let result = match_by_proximity(&layout, &target);
        assert!(matches!(result, Err(EmbedError::InvalidLandmark { layout_vertex: 6, .. })));
    }

    #[test]
    fn test_jitter_is_reproducible_and_valid() {
        let mut a = sphere_input();
        let mut b = sphere_input();
        jitter(&mut a, 5, 42);
        jitter(&mut b, 5, 42);
        assert_eq!(a.landmarks, b.landmarks);
        a.validate().unwrap();
        assert_ne!(a.landmarks, sphere_input().landmarks);
    }

    #[test]
    fn test_zero_steps_keep_landmarks() {
        let mut input = sphere_input();
        jitter(&mut input, 0, 1);
        assert_eq!(input.landmarks, sphere_input().landmarks);
    }

    #[test]
    fn test_randomize() {
        let mut a = sphere_input();
        let mut b = sphere_input();
        randomize(&mut a, 3).unwrap();
        randomize(&mut b, 3).unwrap();
        assert_eq!(a.landmarks, b.landmarks);
        assert_eq!(a.landmarks.len(), 4);
        a.validate().unwrap();
    }
}
