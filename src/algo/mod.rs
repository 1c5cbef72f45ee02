//! Embedding algorithms.
//!
//! - **Graph search**: nearest-match Dijkstra on the target mesh ([`geodesic`])
//! - **Swirl detection**: side-of-path test for candidate paths ([`swirl`])
//! - **Greedy**: spanning structure first, then cheapest path per step ([`greedy`])
//! - **Branch and bound**: best-first search over conflicting paths ([`branch_and_bound`])
//! - **Landmarks**: automatic placement and perturbation ([`landmarks`])
//!
//! Long-running solvers have a `_with_progress` variant taking a [`Progress`].

pub mod branch_and_bound;
pub mod geodesic;
pub mod greedy;
pub mod landmarks;
pub mod progress;
pub mod swirl;

pub use progress::Progress;
