//! Embed a tetrahedral layout onto a subdivided sphere and compare solvers.
//!
//! Run with: cargo run --example embed_sphere

use std::time::Duration;

use lembed::algo::branch_and_bound::embed_branch_and_bound;
use lembed::algo::greedy::embed_greedy_brute_force;
use lembed::prelude::*;

fn main() {
    let target: HalfEdgeMesh = primitives::icosphere(3);
    let corners = [0, 4, 2, 1].map(|i| *target.position(VertexId::new(i)));
    let layout = primitives::tetrahedron_layout(corners);
    println!(
        "Target: {} vertices, {} faces",
        target.num_vertices(),
        target.num_faces()
    );

    let landmarks = match_by_proximity(&layout, &target).expect("Failed to place landmarks");
    let input = EmbeddingInput::new(layout, target, landmarks).expect("Invalid input");
    let base = Embedding::new(input).expect("Failed to create embedding");

    for (name, settings) in [
        ("greedy", GreedySettings::default()),
        ("praun", GreedySettings::praun()),
        ("kraevoy", GreedySettings::kraevoy()),
        ("schreiner", GreedySettings::schreiner()),
    ] {
        let mut em = base.clone();
        let result = embed_greedy(&mut em, &settings).expect("Greedy embedding failed");
        println!("{:>12}: {:.6}", name, result.total_cost);
    }

    let mut em = base.clone();
    let best = embed_greedy_brute_force(&mut em, &GreedySettings::default(), &BruteForceOptions::default())
        .expect("Brute force failed");
    println!("{:>12}: {:.6}", "brute force", best.result.total_cost);

    let mut em = base.clone();
    let settings = BranchAndBoundSettings::default().with_time_limit(Duration::from_secs(10));
    let result = embed_branch_and_bound(&mut em, &settings).expect("Branch and bound failed");
    println!(
        "{:>12}: {:.6} (bound {:.6}, {:?}, {} nodes)",
        "bnb", result.cost, result.lower_bound, result.termination, result.nodes_expanded
    );

    let stem = std::env::temp_dir().join("lembed_sphere");
    em.save(&stem).expect("Failed to save embedding");
    println!("Saved: {}.lem", stem.display());
}
