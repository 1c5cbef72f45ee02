//! Progress callbacks for the solvers.
//!
//! Every solver with a `_with_progress` entry point calls
//! [`Progress::report`] after each finished unit of work: an inserted layout
//! edge for greedy, an expanded node for branch and bound, a finished variant
//! for the brute-force sweep. The callback may be invoked from rayon worker
//! threads.
//!
//! # Example
//!
//! ```
//! use lembed::algo::greedy::{embed_greedy_with_progress, GreedySettings};
//! use lembed::algo::Progress;
//! use lembed::embed::{Embedding, EmbeddingInput};
//! use lembed::mesh::{primitives, HalfEdgeMesh, VertexId};
//!
//! let target: HalfEdgeMesh = primitives::icosphere(1);
//! let landmarks = [0, 2, 4].map(VertexId::new);
//! let layout = primitives::double_triangle_layout(landmarks.map(|v| *target.position(v)));
//! let mut em = Embedding::new(EmbeddingInput::new(layout, target, landmarks.to_vec()).unwrap()).unwrap();
//!
//! let progress = Progress::new(|done, total, stage| eprintln!("{stage}: {done}/{total}"));
//! embed_greedy_with_progress(&mut em, &GreedySettings::default(), &progress).unwrap();
//! ```

use std::fmt;

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Receives `(done, total, stage)` updates from a running solver.
///
/// `done` never exceeds `total` within one stage. A solver that cannot know
/// its total in advance (branch and bound without a node limit) reports
/// against a fixed estimate.
pub struct Progress {
    callback: Box<Callback>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Forward one update to the callback.
    #[inline]
    pub fn report(&self, done: usize, total: usize, stage: &str) {
        (self.callback)(done.min(total), total, stage);
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Progress(..)")
    }
}
